//! Contract Invariant Tests
//!
//! These tests verify the guarantees the page relies on.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;
use url::Url;

use studiosite_core::{
    loader::{FetchRequest, FetchResponse},
    validate, AttributionDefaults, Concern, ContentDocument, ContentLoader, ContentRenderer, Document,
    DomSurface, Fetcher, HomePage, IntersectionEntry, LinkBuilder, Node, Payload, Rect, SiteConfig, SiteResult,
    Transport, Viewport,
};

const FIXTURE: &str = include_str!("../assets/data/site-content.json");

fn fixture() -> Value {
    serde_json::from_str(FIXTURE).unwrap()
}

fn messages(document: &Value) -> Vec<String> {
    validate(document).violations.into_iter().map(|v| v.message).collect()
}

#[derive(Clone, Default)]
struct Recorder(Rc<RefCell<Vec<(String, Payload)>>>);

impl Recorder {
    fn events(&self) -> Vec<String> {
        self.0.borrow().iter().map(|(e, _)| e.clone()).collect()
    }

    fn last(&self, event: &str) -> Payload {
        self.0
            .borrow()
            .iter()
            .rev()
            .find(|(e, _)| e == event)
            .map(|(_, p)| p.clone())
            .unwrap()
    }
}

impl Transport for Recorder {
    fn send(&self, event: &str, payload: &Payload) {
        self.0.borrow_mut().push((event.to_string(), payload.clone()));
    }
}

struct StaticFetcher(Option<String>);

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, _request: FetchRequest) -> SiteResult<FetchResponse> {
        Ok(match &self.0 {
            Some(body) => FetchResponse { status: 200, body: body.clone() },
            None => FetchResponse { status: 503, body: String::new() },
        })
    }
}

fn builder() -> LinkBuilder {
    LinkBuilder::new(Url::parse("https://hutech.studio/").unwrap(), AttributionDefaults::default())
}

async fn started_page(body: Option<String>) -> (HomePage<Document>, Recorder) {
    let recorder = Recorder::default();
    let mut page = HomePage::new(
        Document::home_skeleton(),
        SiteConfig::default(),
        Url::parse("https://hutech.studio/?utm_source=newsletter").unwrap(),
        Some(Box::new(recorder.clone())),
        800.0,
    );
    let loader = ContentLoader::new(StaticFetcher(body), "assets/data/site-content.json");
    page.start(&loader, "https://news.example/").await;
    (page, recorder)
}

fn link_key(page: &HomePage<Document>, class: &str) -> String {
    page.dom()
        .find_node(&|n: &Node| n.has_class(class))
        .and_then(|n| n.data("link-key"))
        .unwrap()
        .to_string()
}

#[test]
fn invariant_fixture_is_valid() {
    let result = validate(&fixture());
    assert!(result.valid, "{:?}", result.violations);
}

#[test]
fn invariant_missing_root_key_reported_and_rest_checked() {
    let mut doc = fixture();
    doc.as_object_mut().unwrap().remove("seo");
    doc["site"]["contact_email"] = json!("nope");

    let found = messages(&doc);
    assert_eq!(found[0], "Missing required root key: seo");
    assert!(found.contains(&"site.contact_email must be a valid email address.".to_string()));
    assert!(!found.iter().any(|m| m.starts_with("seo.")));
}

#[test]
fn invariant_one_violation_per_duplicate_id() {
    let mut doc = fixture();
    let case = doc["case_studies"][0].clone();
    doc["case_studies"] = json!([case.clone(), case.clone(), case]);

    let duplicates: Vec<_> = messages(&doc)
        .into_iter()
        .filter(|m| m.contains("duplicate id 'ops-triage'"))
        .collect();
    assert_eq!(
        duplicates,
        vec![
            "case_studies[1].id must be unique; duplicate id 'ops-triage' found.",
            "case_studies[2].id must be unique; duplicate id 'ops-triage' found.",
        ]
    );
}

#[test]
fn invariant_process_steps_exactly_three() {
    let mut doc = fixture();
    let steps = doc["process_steps"].as_array().unwrap()[..2].to_vec();
    doc["process_steps"] = Value::Array(steps);

    let found = messages(&doc);
    assert_eq!(found, vec!["process_steps must include exactly 3 steps."]);
}

#[test]
fn invariant_email_format_isolated_from_booking_url() {
    let mut doc = fixture();
    doc["site"]["contact_email"] = json!("not-an-email");

    let result = validate(&doc);
    assert_eq!(result.violations.len(), 1);
    assert_eq!(result.violations[0].path, "site.contact_email");
}

#[test]
fn invariant_violations_in_traversal_order() {
    let doc = json!({
        "site": [],
        "trust_signals": {},
        "cta": 1,
        "capabilities": null,
        "process_steps": "x",
        "case_studies": true,
        "seo": []
    });
    assert_eq!(
        messages(&doc),
        vec![
            "site must be an object.",
            "trust_signals must be an array.",
            "cta must be an object.",
            "capabilities must be an array.",
            "process_steps must be an array.",
            "case_studies must be an array.",
            "seo must be an object.",
        ]
    );
}

#[test]
fn invariant_link_builder_idempotent() {
    let b = builder();
    for url in ["https://calendly.com/x", "https://calendly.com/x?ref=1&utm_content=old", "/book"] {
        let once = b.build(url, "hero_primary");
        assert_eq!(b.build(&once, "hero_primary"), once);
    }
}

#[test]
fn invariant_mailto_never_carries_utm() {
    let b = builder();
    assert_eq!(b.build("mailto:a@b.com?subject=x", "case_card_alpha"), "mailto:a@b.com");
}

#[test]
fn invariant_render_twice_no_duplication() {
    let content = ContentDocument::from_value(&fixture());
    let list_state = |doc: &Document| -> Vec<(usize, String)> {
        ["trust-signal-list", "capability-list", "process-grid", "case-grid"]
            .iter()
            .map(|id| {
                let node = doc.by_id(id).unwrap();
                (node.children.len(), node.to_html().replace(|c: char| c.is_ascii_digit(), ""))
            })
            .collect()
    };

    let mut once = Document::home_skeleton();
    ContentRenderer::new(builder(), &SiteConfig::default()).apply(&mut once, &content);

    let mut twice = Document::home_skeleton();
    let mut renderer = ContentRenderer::new(builder(), &SiteConfig::default());
    renderer.apply(&mut twice, &content);
    let second = renderer.apply(&mut twice, &content);

    assert_eq!(list_state(&once), list_state(&twice));
    assert_eq!(twice.by_id("process-grid").unwrap().children.len(), 3);
    assert_eq!(second.reveal_keys.len(), 4);
}

fn render(doc: &Value) -> (Document, Vec<&'static str>) {
    let mut page = Document::home_skeleton();
    let report = ContentRenderer::new(builder(), &SiteConfig::default())
        .apply(&mut page, &ContentDocument::from_value(doc));
    (page, report.steps_applied)
}

#[test]
fn invariant_null_site_field_keeps_site_text() {
    let mut doc = fixture();
    doc["site"]["booking_url"] = Value::Null;

    let (page, steps) = render(&doc);
    assert!(steps.contains(&"site"));
    assert_eq!(
        page.by_id("hero-headline").unwrap().text,
        "We turn hard operational problems into working prototypes."
    );
    assert_eq!(page.by_id("contact-email").unwrap().attr("href"), Some("mailto:as@hutech.ventures"));
    assert_eq!(page.by_id("hero-email-cta").unwrap().data("base-href"), Some("mailto:as@hutech.ventures"));
}

#[test]
fn invariant_null_case_field_keeps_case_card() {
    let mut doc = fixture();
    doc["case_studies"][0]["redaction_note"] = Value::Null;
    doc["case_studies"][0]["metrics"] = json!(92);

    let (page, steps) = render(&doc);
    assert!(steps.contains(&"case_studies"));
    let grid = page.by_id("case-grid").unwrap();
    assert_eq!(grid.children.len(), 1);

    let html = grid.to_html();
    assert!(html.contains("Operations triage assistant"));
    assert!(html.contains("Evidence is available on request."));
    assert!(html.contains("Sensitive implementation details are intentionally redacted."));
}

#[test]
fn invariant_malformed_section_skips_only_its_step() {
    let mut doc = fixture();
    doc["trust_signals"] = json!("oops");
    let first = doc["capabilities"][0].clone();
    doc["capabilities"] = json!([first, null, 7]);

    let (page, steps) = render(&doc);
    assert!(!steps.contains(&"trust_signals"));
    assert!(page.by_id("trust-signal-list").unwrap().children.is_empty());
    assert_eq!(page.by_id("capability-list").unwrap().children.len(), 1);
    for step in ["site", "cta", "brand_distinction", "capabilities", "process_steps", "case_studies", "seo"] {
        assert!(steps.contains(&step), "missing step {}", step);
    }
}

#[test]
fn invariant_redaction_notice_rules() {
    let mut doc = fixture();
    let mut public = doc["case_studies"][0].clone();
    public["id"] = json!("public-case");
    public["confidentiality"] = json!("public");
    public["redaction_note"] = json!("");
    let mut anonymized = public.clone();
    anonymized["id"] = json!("anon-case");
    anonymized["confidentiality"] = json!("anonymized");
    doc["case_studies"] = json!([public, anonymized]);

    let mut page = Document::home_skeleton();
    ContentRenderer::new(builder(), &SiteConfig::default()).apply(&mut page, &ContentDocument::from_value(&doc));

    let note = |id: &str| {
        page.find_node(&|n: &Node| n.data("case-id") == Some(id))
            .unwrap()
            .find(&|n: &Node| n.has_class("redaction-note"))
            .map(|n| n.text.clone())
    };
    assert_eq!(note("public-case"), None);
    assert_eq!(
        note("anon-case").as_deref(),
        Some("Sensitive implementation details are intentionally redacted.")
    );
}

#[tokio::test]
async fn invariant_tracker_fires_once_per_entity() {
    let (mut page, recorder) = started_page(Some(FIXTURE.to_string())).await;

    for _ in 0..5 {
        page.on_intersections(Concern::CaseCard, &[IntersectionEntry::new("ops-triage", true, 0.8)]);
        page.on_intersections(Concern::CaseCard, &[IntersectionEntry::new("ops-triage", false, 0.0)]);
    }

    let views = recorder.events().into_iter().filter(|e| e == "case_card_view").count();
    assert_eq!(views, 1);
    assert_eq!(recorder.last("case_card_view")["case_title"], "Operations triage assistant");
}

#[tokio::test]
async fn invariant_page_view_once_with_utm() {
    let (page, recorder) = started_page(Some(FIXTURE.to_string())).await;
    assert!(page.gateway().page_view_sent());
    assert_eq!(recorder.events().iter().filter(|e| *e == "page_view").count(), 1);

    let view = recorder.last("page_view");
    assert_eq!(view["page"], "home");
    assert_eq!(view["referrer"], "https://news.example/");
    assert_eq!(view["utm_source"], "newsletter");
    assert_eq!(view["utm_medium"], "");
}

#[tokio::test]
async fn invariant_booking_url_change_updates_anchors() {
    let (mut page, _recorder) = started_page(Some(FIXTURE.to_string())).await;
    let anchors = |page: &HomePage<Document>| -> Vec<Node> {
        page.dom().collect(&|n: &Node| n.has_class("js-booking-link")).into_iter().cloned().collect()
    };

    for anchor in anchors(&page) {
        assert!(anchor.attr("href").unwrap().starts_with("mailto:as@hutech.ventures"));
        assert_eq!(anchor.attr("target"), None);
    }

    page.set_booking_url("https://calendly.com/x");

    let updated = anchors(&page);
    assert_eq!(updated.len(), 4);
    for anchor in updated {
        let href = anchor.attr("href").unwrap();
        let source = anchor.data("source").unwrap();
        assert!(href.starts_with("https://calendly.com/x?utm_source=incubation_studio_site"));
        assert!(href.ends_with(&format!("utm_content={}", source)));
        assert_eq!(anchor.attr("target"), Some("_blank"));
        assert_eq!(anchor.attr("rel"), Some("noopener"));
    }
}

#[tokio::test]
async fn invariant_content_unavailable_keeps_static_markup() {
    let (page, recorder) = started_page(None).await;
    let headline = page.dom().by_id("hero-headline").unwrap();
    assert_eq!(headline.text, "We prototype what matters.");
    assert!(page.dom().by_id("case-grid").unwrap().children.is_empty());
    assert_eq!(recorder.events(), vec!["page_view"]);
}

#[tokio::test]
async fn invariant_case_cta_click_events() {
    let (mut page, recorder) = started_page(Some(FIXTURE.to_string())).await;

    let key = link_key(&page, "js-case-cta");
    assert!(page.click(&key));

    assert_eq!(recorder.events(), vec!["page_view", "outbound_booking_click", "case_cta_click"]);
    let outbound = recorder.last("outbound_booking_click");
    assert_eq!(outbound["destination"], "mailto:as@hutech.ventures");
    assert_eq!(outbound["source"], "case_card_ops-triage");
    let cta = recorder.last("case_cta_click");
    assert_eq!(cta["case_id"], "ops-triage");
    assert_eq!(cta["cta_label"], "Discuss a similar challenge");

    assert!(!page.click("link-missing"));
}

#[tokio::test]
async fn invariant_sticky_click_reports_page_section() {
    let (mut page, recorder) = started_page(Some(FIXTURE.to_string())).await;
    let key = link_key(&page, "js-sticky-cta");
    page.click(&key);

    let sticky = recorder.last("sticky_booking_cta_click");
    assert_eq!(sticky["location"], "floating");
    assert_eq!(sticky["source_section"], "home");
}

#[tokio::test]
async fn invariant_section_and_reveal_fire_once() {
    let (mut page, recorder) = started_page(Some(FIXTURE.to_string())).await;

    assert_eq!(page.on_intersections(Concern::CaseSection, &[IntersectionEntry::new("case_studies", true, 0.2)]), 0);
    assert_eq!(page.on_intersections(Concern::CaseSection, &[IntersectionEntry::new("case_studies", true, 0.35)]), 1);
    assert_eq!(page.on_intersections(Concern::CaseSection, &[IntersectionEntry::new("case_studies", true, 0.9)]), 0);
    assert_eq!(recorder.last("case_study_section_view")["section"], "case_studies");

    let reveal_key = page
        .dom()
        .find_node(&|n: &Node| n.has_class("case-card"))
        .and_then(|n| n.data("reveal-key"))
        .unwrap()
        .to_string();
    assert!(page.tracker(Concern::Reveal).is_observing(&reveal_key));

    page.on_intersections(Concern::Reveal, &[IntersectionEntry::new(&reveal_key, true, 0.5)]);
    let card = page.dom().find_node(&|n: &Node| n.has_class("case-card")).unwrap();
    assert!(card.has_class("reveal"));
    assert!(card.has_class("is-visible"));
    assert!(!page.tracker(Concern::Reveal).is_observing(&reveal_key));
}

#[tokio::test]
async fn invariant_sticky_cta_throttled() {
    let (mut page, _recorder) = started_page(None).await;
    assert!(page.on_scroll());
    assert!(!page.on_scroll());
    page.on_animation_frame(900.0);

    let sticky = page.dom().find_node(&|n: &Node| n.has_class("js-sticky-cta")).unwrap();
    assert!(sticky.has_class("is-visible"));
    assert!(page.on_scroll());
}

#[tokio::test]
async fn invariant_layout_measures_against_viewport() {
    let (mut page, recorder) = started_page(Some(FIXTURE.to_string())).await;
    let viewport = Viewport { width: 1280.0, height: 800.0, scroll_y: 1000.0 };

    // 40% of the card is on screen: below the case-card threshold.
    let partly = Rect::new(0.0, 1640.0, 400.0, 400.0);
    assert_eq!(page.on_layout(Concern::CaseCard, &[("ops-triage", partly)], viewport), 0);

    let inside = Rect::new(0.0, 1200.0, 400.0, 400.0);
    assert_eq!(page.on_layout(Concern::CaseCard, &[("ops-triage", inside)], viewport), 1);
    assert_eq!(page.on_layout(Concern::CaseCard, &[("ops-triage", inside)], viewport), 0);
    assert_eq!(recorder.events().iter().filter(|e| *e == "case_card_view").count(), 1);
}
