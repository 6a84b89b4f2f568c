//! Home Page - single entry point for a page load
//!
//! Owns the per-load state: the rendered document, the booking URL (via the
//! renderer), the page-view guard (via the gateway) and one seen-set per
//! tracking concern. Observer callbacks and clicks arrive as method calls;
//! sightings travel over a channel and are drained by `pump`.

use chrono::Datelike;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use url::Url;

use crate::analytics::{AnalyticsGateway, PageViewConfig, Transport};
use crate::config::SiteConfig;
use crate::content::ContentDocument;
use crate::dom::{DomSurface, Node};
use crate::links::LinkBuilder;
use crate::loader::{ContentLoader, Fetcher};
use crate::render::{
    ContentRenderer, RenderReport, BOOKING_LINK_CLASS, CASE_CARD_CLASS, CASE_CTA_CLASS, STICKY_CTA_CLASS,
};
use crate::visibility::{Concern, IntersectionEntry, Rect, Sighting, StickyCta, Viewport, VisibilityTracker};

pub const CASE_SECTION_ID: &str = "case-studies";
pub const CASE_SECTION_KEY: &str = "case_studies";

#[derive(Debug, Clone, PartialEq, Eq)]
struct ClickedLink {
    href: String,
    source: String,
    label: String,
    case_cta: bool,
    sticky: bool,
}

pub struct HomePage<D> {
    dom: D,
    config: SiteConfig,
    renderer: ContentRenderer,
    gateway: AnalyticsGateway,
    case_cards: VisibilityTracker,
    case_section: VisibilityTracker,
    reveals: VisibilityTracker,
    sightings: UnboundedReceiver<Sighting>,
    sticky: StickyCta,
    next_link: u64,
}

impl<D: DomSurface> HomePage<D> {
    pub fn new(
        dom: D,
        config: SiteConfig,
        page_url: Url,
        transport: Option<Box<dyn Transport>>,
        viewport_height: f64,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let builder = LinkBuilder::new(page_url.clone(), config.attribution.clone());
        Self {
            renderer: ContentRenderer::new(builder, &config),
            gateway: AnalyticsGateway::new(transport, page_url, config.dev_hosts.clone()),
            case_cards: VisibilityTracker::new(Concern::CaseCard, tx.clone()),
            case_section: VisibilityTracker::new(Concern::CaseSection, tx.clone()),
            reveals: VisibilityTracker::new(Concern::Reveal, tx),
            sightings: rx,
            sticky: StickyCta::new(viewport_height),
            next_link: 0,
            dom,
            config,
        }
    }

    pub fn dom(&self) -> &D {
        &self.dom
    }

    pub fn renderer(&self) -> &ContentRenderer {
        &self.renderer
    }

    pub fn gateway(&self) -> &AnalyticsGateway {
        &self.gateway
    }

    pub fn tracker(&self, concern: Concern) -> &VisibilityTracker {
        match concern {
            Concern::CaseCard => &self.case_cards,
            Concern::CaseSection => &self.case_section,
            Concern::Reveal => &self.reveals,
        }
    }

    fn tracker_mut(&mut self, concern: Concern) -> &mut VisibilityTracker {
        match concern {
            Concern::CaseCard => &mut self.case_cards,
            Concern::CaseSection => &mut self.case_section,
            Concern::Reveal => &mut self.reveals,
        }
    }

    fn page_id(&self) -> String {
        self.dom
            .page_id()
            .filter(|p| !p.is_empty())
            .unwrap_or(self.config.default_page.as_str())
            .to_string()
    }

    /// Page-load sequence. The content fetch is the only suspension point.
    pub async fn start<F: Fetcher>(&mut self, loader: &ContentLoader<F>, referrer: &str) -> Option<RenderReport> {
        let page = self.page_id();
        self.gateway.init(&PageViewConfig {
            page: None,
            body_page: Some(page.clone()),
            referrer: referrer.to_string(),
        });

        self.set_current_year(chrono::Local::now().year());
        let keys = self.renderer.register_reveals(&mut self.dom);
        self.watch_reveals(keys);
        self.update_sticky(0.0);

        let mut report = None;
        if page == "home" {
            if let Some(content) = loader.load().await {
                report = Some(self.apply(&content));
            }
            self.setup_case_tracking();
            self.setup_case_section_tracking();
        }

        self.bind_booking_links();
        report
    }

    /// Apply a content document, then watch and bind whatever it inserted.
    pub fn apply(&mut self, content: &ContentDocument) -> RenderReport {
        let report = self.renderer.apply(&mut self.dom, content);
        self.watch_reveals(report.reveal_keys.clone());
        self.setup_case_tracking();
        self.bind_booking_links();
        report
    }

    pub fn set_booking_url(&mut self, url: &str) {
        self.renderer.set_booking_url(&mut self.dom, url);
    }

    fn watch_reveals(&mut self, keys: Vec<String>) {
        for key in keys {
            self.reveals.observe(&key, None);
        }
    }

    fn set_current_year(&mut self, year: i32) {
        let year = year.to_string();
        self.dom
            .for_each_mut(&|n: &Node| n.has_class("js-year"), &mut |n: &mut Node| n.set_text(&year));
    }

    fn setup_case_tracking(&mut self) {
        let mut cards = vec![];
        self.dom.for_each_mut(&|n: &Node| n.has_class(CASE_CARD_CLASS), &mut |card: &mut Node| {
            let id = card.data("case-id").unwrap_or("unknown").to_string();
            let title = card
                .children
                .iter()
                .find(|c| c.tag == "h3")
                .map(Node::text_content)
                .unwrap_or_default();
            cards.push((id, title));
        });
        for (id, title) in cards {
            self.case_cards.observe(&id, Some(title));
        }
    }

    fn setup_case_section_tracking(&mut self) {
        if self.dom.find_node(&|n: &Node| n.id() == Some(CASE_SECTION_ID)).is_some() {
            self.case_section.observe(CASE_SECTION_KEY, None);
        }
    }

    /// Bind every tracked anchor not bound yet: seed its base href, give it a
    /// link key and compute its href.
    pub fn bind_booking_links(&mut self) -> Vec<String> {
        let mut keys = vec![];
        let renderer = &self.renderer;
        let next = &mut self.next_link;
        self.dom.for_each_mut(&|n: &Node| n.has_class(BOOKING_LINK_CLASS), &mut |link: &mut Node| {
            if link.data("bound") == Some("1") {
                return;
            }
            link.set_data("bound", "1");
            if link.data("base-href").map_or(true, str::is_empty) {
                let base = link.attr("href").unwrap_or("").to_string();
                link.set_data("base-href", &base);
            }
            *next += 1;
            let key = format!("link-{}", next);
            link.set_data("link-key", &key);
            renderer.refresh_link(link);
            keys.push(key);
        });
        keys
    }

    /// Handle a click on the tracked anchor with `link_key`.
    pub fn click(&mut self, link_key: &str) -> bool {
        let is_link = |n: &Node| n.data("link-key") == Some(link_key);

        let Some(ancestors) = self.dom.ancestors(&is_link) else { return false };
        let case_id = ancestors
            .iter()
            .rev()
            .find(|n| n.has_class(CASE_CARD_CLASS))
            .and_then(|n| n.data("case-id"))
            .unwrap_or("")
            .to_string();
        let section = ancestors
            .iter()
            .rev()
            .find(|n| n.tag == "section")
            .and_then(|n| n.id())
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        let section = section.unwrap_or_else(|| {
            self.dom
                .page_id()
                .filter(|p| !p.is_empty())
                .unwrap_or("site")
                .to_string()
        });

        let renderer = &self.renderer;
        let mut clicked = None;
        self.dom.for_each_mut(&is_link, &mut |link: &mut Node| {
            renderer.refresh_link(link);
            clicked = Some(ClickedLink {
                href: link.attr("href").unwrap_or("").to_string(),
                source: link.data("source").unwrap_or("unknown").to_string(),
                label: link.text_content().trim().to_string(),
                case_cta: link.has_class(CASE_CTA_CLASS),
                sticky: link.has_class(STICKY_CTA_CLASS),
            });
        });
        let Some(clicked) = clicked else { return false };

        self.gateway.track_outbound_booking(&clicked.href, &clicked.source);
        if clicked.case_cta {
            self.gateway.track_case_cta_click(&case_id, &clicked.label);
        }
        if clicked.sticky {
            self.gateway.track_sticky_cta_click("floating", &section);
        }
        true
    }

    /// Observer callback for one concern. Returns how many targets fired.
    pub fn on_intersections(&mut self, concern: Concern, entries: &[IntersectionEntry]) -> usize {
        let fired = self.tracker_mut(concern).handle(entries);
        self.pump();
        fired
    }

    /// Layout pass: measure each target rect against the viewport and feed
    /// the ratios to the concern's tracker.
    pub fn on_layout(&mut self, concern: Concern, targets: &[(&str, Rect)], viewport: Viewport) -> usize {
        let entries: Vec<IntersectionEntry> = targets
            .iter()
            .map(|(key, rect)| IntersectionEntry::measure(key, *rect, viewport))
            .collect();
        self.on_intersections(concern, &entries)
    }

    /// Drain pending sightings into analytics and reveal state.
    pub fn pump(&mut self) {
        while let Ok(sighting) = self.sightings.try_recv() {
            match sighting.concern {
                Concern::CaseCard => {
                    let title = sighting.label.unwrap_or_default();
                    self.gateway.track_case_card_view(&sighting.key, &title);
                }
                Concern::CaseSection => self.gateway.track_section_view(&sighting.key),
                Concern::Reveal => {
                    let key = sighting.key;
                    self.dom.for_each_mut(
                        &|n: &Node| n.data("reveal-key") == Some(key.as_str()),
                        &mut |n: &mut Node| n.add_class("is-visible"),
                    );
                }
            }
        }
    }

    /// Scroll event. Returns true when an animation frame should be requested.
    pub fn on_scroll(&mut self) -> bool {
        self.sticky.on_scroll()
    }

    pub fn on_animation_frame(&mut self, scroll_y: f64) {
        let visible = self.sticky.on_frame(scroll_y);
        self.show_sticky(visible);
    }

    pub fn on_resize(&mut self, viewport_height: f64, scroll_y: f64) {
        let visible = self.sticky.on_resize(viewport_height, scroll_y);
        self.show_sticky(visible);
    }

    fn update_sticky(&mut self, scroll_y: f64) {
        let visible = self.sticky.update(scroll_y);
        self.show_sticky(visible);
    }

    fn show_sticky(&mut self, visible: bool) {
        self.dom.for_each_mut(&|n: &Node| n.has_class(STICKY_CTA_CLASS), &mut |n: &mut Node| {
            n.toggle_class("is-visible", visible)
        });
    }
}
