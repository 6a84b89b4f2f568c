//! Attribution Links - campaign parameters on outbound booking links
//!
//! The href of a tracked anchor is always derived from `(base_href, source)`
//! and the shared defaults. It is recomputed, never patched.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{SiteError, SiteResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AttributionDefaults {
    #[serde(default = "default_utm_source")]
    pub utm_source: String,
    #[serde(default = "default_utm_medium")]
    pub utm_medium: String,
    #[serde(default = "default_utm_campaign")]
    pub utm_campaign: String,
}

fn default_utm_source() -> String { "incubation_studio_site".to_string() }
fn default_utm_medium() -> String { "website".to_string() }
fn default_utm_campaign() -> String { "studio_launch".to_string() }

impl Default for AttributionDefaults {
    fn default() -> Self {
        Self {
            utm_source: default_utm_source(),
            utm_medium: default_utm_medium(),
            utm_campaign: default_utm_campaign(),
        }
    }
}

impl AttributionDefaults {
    fn with_content<'a>(&'a self, source: &'a str) -> [(&'static str, &'a str); 4] {
        [
            ("utm_source", self.utm_source.as_str()),
            ("utm_medium", self.utm_medium.as_str()),
            ("utm_campaign", self.utm_campaign.as_str()),
            ("utm_content", source),
        ]
    }
}

pub fn is_mailto(url: &str) -> bool {
    url.get(..7).map_or(false, |p| p.eq_ignore_ascii_case("mailto:"))
}

pub fn is_http(url: &str) -> bool {
    let lower = url.get(..6).unwrap_or(url).to_ascii_lowercase();
    lower.starts_with("http:") || lower.starts_with("https:")
}

/// Builds attributed hrefs relative to the page they appear on.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    page_url: Url,
    defaults: AttributionDefaults,
}

impl LinkBuilder {
    pub fn new(page_url: Url, defaults: AttributionDefaults) -> Self {
        Self { page_url, defaults }
    }

    /// Decorate `url` for `source`. Never fails: malformed input comes back unchanged.
    pub fn build(&self, url: &str, source: &str) -> String {
        match self.try_build(url, source) {
            Ok(href) => href,
            Err(e) => {
                tracing::debug!(error = %e, "leaving link unchanged");
                url.to_string()
            }
        }
    }

    pub fn try_build(&self, url: &str, source: &str) -> SiteResult<String> {
        if url.is_empty() {
            return Ok(String::new());
        }
        if is_mailto(url) {
            return self.strip_mailto_query(url);
        }
        self.with_tracking_params(url, source)
    }

    fn resolve(&self, url: &str) -> SiteResult<Url> {
        self.page_url
            .join(url)
            .map_err(|e| SiteError::MalformedUrl(format!("{}: {}", url, e)))
    }

    fn strip_mailto_query(&self, url: &str) -> SiteResult<String> {
        let target = self.resolve(url)?;
        Ok(format!("mailto:{}", target.path()))
    }

    fn with_tracking_params(&self, url: &str, source: &str) -> SiteResult<String> {
        let mut target = self.resolve(url)?;

        let mut pairs: Vec<(String, String)> = target
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        for (key, value) in self.defaults.with_content(source) {
            if !value.is_empty() {
                set_param(&mut pairs, key, value);
            }
        }

        if pairs.is_empty() {
            target.set_query(None);
        } else {
            target.query_pairs_mut().clear().extend_pairs(pairs.iter());
        }
        Ok(target.to_string())
    }
}

/// Replace the first occurrence of `key` and drop any later duplicates,
/// or append when absent. Positions of other keys are preserved.
fn set_param(pairs: &mut Vec<(String, String)>, key: &str, value: &str) {
    match pairs.iter().position(|(k, _)| k == key) {
        Some(first) => {
            pairs[first].1 = value.to_string();
            let mut index = 0;
            pairs.retain(|(k, _)| {
                let keep = index <= first || k != key;
                index += 1;
                keep
            });
        }
        None => pairs.push((key.to_string(), value.to_string())),
    }
}

/// An anchor whose href is derived from a booking base URL and a source tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedLink {
    pub base_href: String,
    pub source: String,
    pub current_href: String,
}

impl TrackedLink {
    pub fn new(builder: &LinkBuilder, base_href: &str, source: &str) -> Self {
        Self {
            base_href: base_href.to_string(),
            source: source.to_string(),
            current_href: builder.build(base_href, source),
        }
    }

    pub fn rebase(&mut self, builder: &LinkBuilder, base_href: &str) {
        self.base_href = base_href.to_string();
        self.refresh(builder);
    }

    pub fn refresh(&mut self, builder: &LinkBuilder) {
        self.current_href = builder.build(&self.base_href, &self.source);
    }

    /// Outbound http(s) bookings open in a new browsing context.
    pub fn opens_new_context(&self) -> bool {
        is_http(&self.base_href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> LinkBuilder {
        LinkBuilder::new(
            Url::parse("https://hutech.studio/index.html").unwrap(),
            AttributionDefaults::default(),
        )
    }

    #[test]
    fn test_mailto_query_stripped() {
        let b = builder();
        assert_eq!(b.build("mailto:a@b.com?subject=x", "hero"), "mailto:a@b.com");
        assert_eq!(b.build("MAILTO:a@b.com", "hero"), "mailto:a@b.com");
    }

    #[test]
    fn test_http_params_merged() {
        let b = builder();
        let href = b.build("https://calendly.com/x?ref=abc&utm_source=old", "hero");
        let parsed = Url::parse(&href).unwrap();
        let pairs: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("ref".to_string(), "abc".to_string()));
        assert_eq!(pairs[1], ("utm_source".to_string(), "incubation_studio_site".to_string()));
        assert!(pairs.contains(&("utm_content".to_string(), "hero".to_string())));
        assert_eq!(pairs.len(), 5);
    }

    #[test]
    fn test_idempotent_and_source_swap() {
        let b = builder();
        let once = b.build("https://calendly.com/x", "hero");
        assert_eq!(b.build(&once, "hero"), once);

        let swapped = b.build(&once, "footer");
        assert_eq!(swapped, once.replace("utm_content=hero", "utm_content=footer"));
    }

    #[test]
    fn test_relative_resolved_against_page() {
        let b = builder();
        let href = b.build("/book", "nav");
        assert!(href.starts_with("https://hutech.studio/book?"));
    }

    #[test]
    fn test_malformed_returned_unchanged() {
        let b = builder();
        assert_eq!(b.build("http://[::1", "nav"), "http://[::1");
        assert_eq!(b.build("", "nav"), "");
    }

    #[test]
    fn test_duplicate_keys_collapsed() {
        let mut pairs = vec![
            ("a".to_string(), "1".to_string()),
            ("utm_content".to_string(), "x".to_string()),
            ("b".to_string(), "2".to_string()),
            ("utm_content".to_string(), "y".to_string()),
        ];
        set_param(&mut pairs, "utm_content", "z");
        let keys: Vec<&str> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["a", "utm_content", "b"]);
        assert_eq!(pairs[1].1, "z");
    }

    #[test]
    fn test_tracked_link_rebase() {
        let b = builder();
        let mut link = TrackedLink::new(&b, "mailto:as@hutech.ventures", "hero");
        assert!(!link.opens_new_context());
        assert_eq!(link.current_href, "mailto:as@hutech.ventures");

        link.rebase(&b, "https://calendly.com/x");
        assert!(link.opens_new_context());
        assert!(link.current_href.contains("utm_content=hero"));
    }
}
