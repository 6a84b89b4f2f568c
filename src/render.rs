//! Content Renderer - applies a content document to the page
//!
//! Each step touches one section and is skipped whole when its section is
//! absent, empty or malformed. Steps that move the booking URL run before
//! the list renders so new CTA anchors get the right base href.

use crate::config::{CtaDefaults, SiteConfig};
use crate::content::{BrandDistinction, CaseStudy, Capability, ContentDocument, CtaContent, ProcessStep, Seo, Site, TrustSignal};
use crate::dom::{escape_html, DomSurface, HeadSelector, Node};
use crate::links::{LinkBuilder, TrackedLink};

pub const BOOKING_LINK_CLASS: &str = "js-booking-link";
pub const CASE_CTA_CLASS: &str = "js-case-cta";
pub const STICKY_CTA_CLASS: &str = "js-sticky-cta";
pub const CASE_CARD_CLASS: &str = "case-card";

const DEFAULT_METRICS: &str = "Evidence is available on request.";
const DEFAULT_REDACTION: &str = "Sensitive implementation details are intentionally redacted.";
const DEFAULT_CASE_CTA: &str = "Discuss a similar challenge";

/// What a render pass left for the trackers to pick up.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Reveal keys of elements that were not watched before this pass.
    pub reveal_keys: Vec<String>,
    pub steps_applied: Vec<&'static str>,
}

pub struct ContentRenderer {
    builder: LinkBuilder,
    booking_url: String,
    cta: CtaDefaults,
    next_reveal: u64,
}

impl ContentRenderer {
    pub fn new(builder: LinkBuilder, config: &SiteConfig) -> Self {
        Self {
            builder,
            booking_url: config.booking_url.clone(),
            cta: config.cta.clone(),
            next_reveal: 0,
        }
    }

    pub fn apply<D: DomSurface>(&mut self, dom: &mut D, document: &ContentDocument) -> RenderReport {
        let mut report = RenderReport::default();
        let empty_site = Site::default();
        let site = document.site.as_ref().unwrap_or(&empty_site);

        self.apply_site_text(dom, site);
        report.steps_applied.push("site");

        self.apply_cta(dom, document.cta.as_ref(), site);
        report.steps_applied.push("cta");

        if let Some(brand) = &document.brand_distinction {
            self.apply_brand_distinction(dom, brand);
            report.steps_applied.push("brand_distinction");
        }

        if let Some(signals) = non_empty(&document.trust_signals) {
            if self.render_trust_signals(dom, signals) {
                report.steps_applied.push("trust_signals");
            }
        }

        if let Some(capabilities) = non_empty(&document.capabilities) {
            if self.render_capabilities(dom, capabilities) {
                report.steps_applied.push("capabilities");
            }
        }

        if let Some(steps) = non_empty(&document.process_steps) {
            if self.render_process_steps(dom, steps) {
                report.steps_applied.push("process_steps");
                report.reveal_keys.extend(self.register_reveals(dom));
            }
        }

        if let Some(cases) = non_empty(&document.case_studies) {
            if self.render_case_studies(dom, cases) {
                report.steps_applied.push("case_studies");
                report.reveal_keys.extend(self.register_reveals(dom));
            }
        }

        if let Some(seo) = &document.seo {
            apply_seo(dom, seo);
            report.steps_applied.push("seo");
        }

        if !site.studio_name.is_empty() {
            apply_studio_name(dom, &site.studio_name);
            report.steps_applied.push("studio_name");
        }

        report
    }

    fn apply_site_text<D: DomSurface>(&self, dom: &mut D, site: &Site) {
        dom.set_text("hero-headline", &site.hero_headline);
        dom.set_text("hero-subhead", &site.hero_subhead);
        dom.set_text("contact-email", &site.contact_email);

        if !site.contact_email.is_empty() {
            if let Some(link) = dom.element_mut("contact-email") {
                link.set_attr("href", &format!("mailto:{}", site.contact_email));
            }
        }
    }

    fn apply_cta<D: DomSurface>(&mut self, dom: &mut D, cta: Option<&CtaContent>, site: &Site) {
        if let Some(cta) = cta {
            merge(&mut self.cta.primary_label, &cta.primary_label);
            merge(&mut self.cta.secondary_label, &cta.secondary_label);
            merge(&mut self.cta.helper_text, &cta.helper_text);

            dom.set_text("hero-email-cta", &self.cta.primary_label);
            dom.set_text("final-email-cta", &self.cta.primary_label);
            dom.set_text("hero-secondary-cta", &self.cta.secondary_label);
            dom.set_text("hero-cta-helper", &self.cta.helper_text);
        }

        if !site.contact_email.is_empty() {
            let url = format!("mailto:{}", site.contact_email);
            self.set_booking_url(dom, &url);
        } else if !site.booking_url.is_empty() {
            let url = site.booking_url.clone();
            self.set_booking_url(dom, &url);
        }
    }

    fn apply_brand_distinction<D: DomSurface>(&self, dom: &mut D, brand: &BrandDistinction) {
        dom.set_text("brand-distinction-text", &brand.message);

        let Some(link) = dom.element_mut("hutech-tech-link") else { return };
        match brand.hutech_tech_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => {
                link.set_attr("href", url);
                link.remove_attr("hidden");
            }
            _ => link.set_attr("hidden", ""),
        }
    }

    /// Point every tracked anchor at `url`, recomputing href and target/rel.
    pub fn set_booking_url<D: DomSurface>(&mut self, dom: &mut D, url: &str) {
        self.booking_url = url.to_string();
        let builder = &self.builder;
        dom.for_each_mut(&|n: &Node| n.has_class(BOOKING_LINK_CLASS), &mut |link: &mut Node| {
            let mut tracked = read_tracked(builder, link);
            tracked.rebase(builder, url);
            write_tracked(link, &tracked);
            set_new_context(link, tracked.opens_new_context());
        });
    }

    /// Recompute one anchor's href from its base href and source.
    pub fn refresh_link(&self, link: &mut Node) {
        let mut tracked = read_tracked(&self.builder, link);
        tracked.refresh(&self.builder);
        write_tracked(link, &tracked);
    }

    fn render_trust_signals<D: DomSurface>(&self, dom: &mut D, signals: &[TrustSignal]) -> bool {
        let items = signals
            .iter()
            .map(|signal| {
                Node::new("li")
                    .with_class("trust-chip")
                    .with_child(Node::new("span").with_class("trust-label").with_text(&signal.label))
                    .with_child(Node::new("strong").with_text(&signal.value))
            })
            .collect();
        dom.replace_children("trust-signal-list", items)
    }

    fn render_capabilities<D: DomSurface>(&self, dom: &mut D, capabilities: &[Capability]) -> bool {
        let items = capabilities
            .iter()
            .map(|capability| {
                Node::new("li").with_html(format!(
                    "<strong>{}</strong> {}",
                    escape_html(or(&capability.title, "Capability")),
                    escape_html(&capability.description)
                ))
            })
            .collect();
        dom.replace_children("capability-list", items)
    }

    fn render_process_steps<D: DomSurface>(&self, dom: &mut D, steps: &[ProcessStep]) -> bool {
        let items = steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let number = if step.step.is_empty() {
                    format!("{:02}", index + 1)
                } else {
                    step.step.clone()
                };
                Node::new("article")
                    .with_class("process-step")
                    .with_attr("data-reveal", "")
                    .with_child(Node::new("p").with_class("step-number").with_text(&number))
                    .with_child(Node::new("h3").with_text(or(&step.title, "Step")))
                    .with_child(Node::new("p").with_text(&step.description))
            })
            .collect();
        dom.replace_children("process-grid", items)
    }

    fn render_case_studies<D: DomSurface>(&self, dom: &mut D, cases: &[CaseStudy]) -> bool {
        let cards = cases.iter().map(|case| self.case_card(case)).collect();
        dom.replace_children("case-grid", cards)
    }

    pub fn case_card(&self, case: &CaseStudy) -> Node {
        let mut card = Node::new("article")
            .with_class(CASE_CARD_CLASS)
            .with_attr("data-case-id", or(&case.id, "unknown-case"))
            .with_attr("data-reveal", "")
            .with_child(Node::new("p").with_class("case-type").with_text(or(&case.audience_type, "Internal")))
            .with_child(Node::new("h3").with_text(or(&case.title, "Case Study")))
            .with_child(labeled_paragraph("Problem", &case.problem))
            .with_child(labeled_paragraph("Prototype", &case.prototype))
            .with_child(labeled_paragraph("Outcome", &case.outcome))
            .with_child(labeled_paragraph("Metrics", or(&case.metrics, DEFAULT_METRICS)));

        if case.confidentiality != "public" || !case.redaction_note.is_empty() {
            card = card.with_child(
                Node::new("p")
                    .with_class("redaction-note")
                    .with_text(or(&case.redaction_note, DEFAULT_REDACTION)),
            );
        }

        let source = format!("case_card_{}", or(&case.id, "unknown"));
        let tracked = TrackedLink::new(&self.builder, &self.booking_url, &source);
        let mut cta = Node::new("a")
            .with_class(&format!("btn btn-secondary {} {}", BOOKING_LINK_CLASS, CASE_CTA_CLASS))
            .with_attr("data-source", &source)
            .with_text(or(&case.cta_label, DEFAULT_CASE_CTA));
        write_tracked(&mut cta, &tracked);
        set_new_context(&mut cta, tracked.opens_new_context());

        card.with_child(cta)
    }

    /// Mark reveal targets and hand out keys for the ones not yet watched.
    pub fn register_reveals<D: DomSurface>(&mut self, dom: &mut D) -> Vec<String> {
        let mut keys = vec![];
        let next = &mut self.next_reveal;
        dom.for_each_mut(&|n: &Node| n.attr("data-reveal").is_some(), &mut |target: &mut Node| {
            target.add_class("reveal");
            if target.data("reveal-observed").is_some() {
                return;
            }
            *next += 1;
            let key = format!("reveal-{}", next);
            target.set_data("reveal-observed", "1");
            target.set_data("reveal-key", &key);
            keys.push(key);
        });
        keys
    }
}

/// Tracking state of an anchor. A missing base href falls back to the
/// anchor's current href.
fn read_tracked(builder: &LinkBuilder, link: &Node) -> TrackedLink {
    let base = link
        .data("base-href")
        .filter(|s| !s.is_empty())
        .or(link.attr("href"))
        .unwrap_or("");
    TrackedLink::new(builder, base, link.data("source").unwrap_or("unknown"))
}

fn write_tracked(link: &mut Node, tracked: &TrackedLink) {
    link.set_data("base-href", &tracked.base_href);
    link.set_attr("href", &tracked.current_href);
}

fn non_empty<T>(items: &Option<Vec<T>>) -> Option<&[T]> {
    items.as_deref().filter(|items| !items.is_empty())
}

fn or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

fn merge(target: &mut String, value: &Option<String>) {
    if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
        *target = value.to_string();
    }
}

fn set_new_context(link: &mut Node, http: bool) {
    if http {
        link.set_attr("target", "_blank");
        link.set_attr("rel", "noopener");
    } else {
        link.remove_attr("target");
        link.remove_attr("rel");
    }
}

fn labeled_paragraph(label: &str, value: &str) -> Node {
    Node::new("p").with_html(format!(
        "<strong>{}:</strong> {}",
        escape_html(label),
        escape_html(value)
    ))
}

fn apply_seo<D: DomSurface>(dom: &mut D, seo: &Seo) {
    if !seo.title.is_empty() {
        dom.set_title(&seo.title);
    }

    dom.set_head_content(HeadSelector::MetaName("description"), &seo.description);
    dom.set_head_content(HeadSelector::MetaProperty("og:title"), &seo.og_title);
    dom.set_head_content(HeadSelector::MetaProperty("og:description"), &seo.og_description);
    dom.set_head_content(HeadSelector::MetaName("twitter:title"), &seo.og_title);
    dom.set_head_content(HeadSelector::MetaName("twitter:description"), &seo.og_description);

    if !seo.canonical_url.is_empty() {
        if let Some(canonical) = dom.head_mut(HeadSelector::LinkRel("canonical")) {
            canonical.set_attr("href", &seo.canonical_url);
        }
    }
}

fn apply_studio_name<D: DomSurface>(dom: &mut D, name: &str) {
    dom.for_each_mut(&|n: &Node| n.has_class("brand"), &mut |brand: &mut Node| {
        brand.for_each_mut(&|n: &Node| n.tag == "span", &mut |span: &mut Node| span.set_text(name));
    });
}
