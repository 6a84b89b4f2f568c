//! Site configuration - static fallbacks used before (or without) content

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::SiteResult;
use crate::links::AttributionDefaults;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_content_url")]
    pub content_url: String,
    #[serde(default = "default_booking_url")]
    pub booking_url: String,
    #[serde(default)]
    pub cta: CtaDefaults,
    #[serde(default)]
    pub attribution: AttributionDefaults,
    #[serde(default = "default_dev_hosts")]
    pub dev_hosts: Vec<String>,
    #[serde(default = "default_page")]
    pub default_page: String,
}

fn default_content_url() -> String { "assets/data/site-content.json".to_string() }
fn default_booking_url() -> String { "mailto:as@hutech.ventures".to_string() }
fn default_dev_hosts() -> Vec<String> { vec!["localhost".to_string(), "127.0.0.1".to_string()] }
fn default_page() -> String { "unknown".to_string() }

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            content_url: default_content_url(),
            booking_url: default_booking_url(),
            cta: CtaDefaults::default(),
            attribution: AttributionDefaults::default(),
            dev_hosts: default_dev_hosts(),
            default_page: default_page(),
        }
    }
}

impl SiteConfig {
    pub fn from_file(path: &Path) -> SiteResult<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Labels shown on call-to-action elements until content overrides them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CtaDefaults {
    #[serde(default = "default_primary_label")]
    pub primary_label: String,
    #[serde(default = "default_secondary_label")]
    pub secondary_label: String,
    #[serde(default = "default_helper_text")]
    pub helper_text: String,
}

fn default_primary_label() -> String { "Email us".to_string() }
fn default_secondary_label() -> String { "View case study".to_string() }
fn default_helper_text() -> String { "Email us only: as@hutech.ventures".to_string() }

impl Default for CtaDefaults {
    fn default() -> Self {
        Self {
            primary_label: default_primary_label(),
            secondary_label: default_secondary_label(),
            helper_text: default_helper_text(),
        }
    }
}
