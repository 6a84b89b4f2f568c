//! Analytics Gateway - page view once, everything else fire-and-forget
//!
//! Delivery goes through an optional `Transport`. Without one, events are
//! logged on development hosts and dropped silently everywhere else.

use std::collections::BTreeMap;

use url::Url;

use crate::visibility::SeenSet;

pub type Payload = BTreeMap<String, String>;

/// Third-party beacon capability.
pub trait Transport {
    fn send(&self, event: &str, payload: &Payload);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsEvent {
    PageView,
    CaseCardView,
    CaseCtaClick,
    StickyBookingCtaClick,
    OutboundBookingClick,
    CaseStudySectionView,
}

impl AnalyticsEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PageView => "page_view",
            Self::CaseCardView => "case_card_view",
            Self::CaseCtaClick => "case_cta_click",
            Self::StickyBookingCtaClick => "sticky_booking_cta_click",
            Self::OutboundBookingClick => "outbound_booking_click",
            Self::CaseStudySectionView => "case_study_section_view",
        }
    }
}

fn payload<const N: usize>(pairs: [(&str, &str); N]) -> Payload {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

/// Inputs for the page-view event.
#[derive(Debug, Clone, Default)]
pub struct PageViewConfig {
    /// Explicit page id; wins over the body marker.
    pub page: Option<String>,
    /// Page id read from the body's page-identifier attribute.
    pub body_page: Option<String>,
    pub referrer: String,
}

pub struct AnalyticsGateway {
    transport: Option<Box<dyn Transport>>,
    page_url: Url,
    dev_hosts: Vec<String>,
    page_view_sent: bool,
    seen_case_cards: SeenSet,
    seen_sections: SeenSet,
}

impl AnalyticsGateway {
    pub fn new(transport: Option<Box<dyn Transport>>, page_url: Url, dev_hosts: Vec<String>) -> Self {
        Self {
            transport,
            page_url,
            dev_hosts,
            page_view_sent: false,
            seen_case_cards: SeenSet::new(),
            seen_sections: SeenSet::new(),
        }
    }

    pub fn page_view_sent(&self) -> bool {
        self.page_view_sent
    }

    fn is_dev_host(&self) -> bool {
        self.page_url
            .host_str()
            .map_or(false, |host| self.dev_hosts.iter().any(|h| h == host))
    }

    fn utm_param(&self, key: &str) -> String {
        self.page_url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default()
    }

    fn send(&self, event: &str, payload: &Payload) {
        match &self.transport {
            Some(transport) => transport.send(event, payload),
            None if self.is_dev_host() => {
                tracing::info!(target: "analytics", event, ?payload, "[analytics]");
            }
            None => {}
        }
    }

    /// Emit the page view. Only the first call per gateway has any effect.
    pub fn init(&mut self, config: &PageViewConfig) {
        if self.page_view_sent {
            return;
        }

        let page = [&config.page, &config.body_page]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .find(|p| !p.is_empty())
            .unwrap_or("unknown")
            .to_string();

        let mut data = payload([("page", page.as_str()), ("referrer", config.referrer.as_str())]);
        for key in ["utm_source", "utm_medium", "utm_campaign"] {
            data.insert(key.to_string(), self.utm_param(key));
        }

        self.send(AnalyticsEvent::PageView.as_str(), &data);
        self.page_view_sent = true;
    }

    pub fn track(&self, event: &str, payload: &Payload) {
        self.send(event, payload);
    }

    pub fn track_case_card_view(&mut self, case_id: &str, case_title: &str) {
        if case_id.is_empty() || !self.seen_case_cards.insert(case_id) {
            return;
        }
        self.send(
            AnalyticsEvent::CaseCardView.as_str(),
            &payload([("case_id", case_id), ("case_title", case_title)]),
        );
    }

    pub fn track_case_cta_click(&self, case_id: &str, cta_label: &str) {
        if case_id.is_empty() {
            return;
        }
        self.send(
            AnalyticsEvent::CaseCtaClick.as_str(),
            &payload([("case_id", case_id), ("cta_label", cta_label)]),
        );
    }

    pub fn track_sticky_cta_click(&self, location: &str, source_section: &str) {
        self.send(
            AnalyticsEvent::StickyBookingCtaClick.as_str(),
            &payload([
                ("location", or(location, "floating")),
                ("source_section", or(source_section, "unknown")),
            ]),
        );
    }

    pub fn track_outbound_booking(&self, destination: &str, source: &str) {
        self.send(
            AnalyticsEvent::OutboundBookingClick.as_str(),
            &payload([("destination", destination), ("source", or(source, "unknown"))]),
        );
    }

    pub fn track_section_view(&mut self, section_id: &str) {
        if section_id.is_empty() || !self.seen_sections.insert(section_id) {
            return;
        }
        self.send(
            AnalyticsEvent::CaseStudySectionView.as_str(),
            &payload([("section", section_id)]),
        );
    }
}
