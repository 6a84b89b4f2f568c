//! Content Document - the externally editable homepage content
//!
//! The document is parsed leniently: a section that is absent or has the
//! wrong shape becomes `None` and the renderer leaves the static markup in
//! place. Inside a section, a field of the wrong type reads as empty and a
//! non-object list entry is dropped. Strictness lives in `validation`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{SiteError, SiteResult};

/// Title the schema-metadata file must carry.
pub const EXPECTED_SCHEMA_TITLE: &str = "HuTech Studio Site Content";

/// Root keys every content document must have, in traversal order.
pub const REQUIRED_ROOT_KEYS: [&str; 7] = [
    "site",
    "trust_signals",
    "cta",
    "capabilities",
    "process_steps",
    "case_studies",
    "seo",
];

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ContentDocument {
    pub site: Option<Site>,
    pub trust_signals: Option<Vec<TrustSignal>>,
    pub cta: Option<CtaContent>,
    pub brand_distinction: Option<BrandDistinction>,
    pub capabilities: Option<Vec<Capability>>,
    pub process_steps: Option<Vec<ProcessStep>>,
    pub case_studies: Option<Vec<CaseStudy>>,
    pub seo: Option<Seo>,
}

impl ContentDocument {
    pub fn from_value(value: &Value) -> Self {
        Self {
            site: object_section(value, "site"),
            trust_signals: list_section(value, "trust_signals"),
            cta: object_section(value, "cta"),
            brand_distinction: object_section(value, "brand_distinction"),
            capabilities: list_section(value, "capabilities"),
            process_steps: list_section(value, "process_steps"),
            case_studies: list_section(value, "case_studies"),
            seo: object_section(value, "seo"),
        }
    }

    /// Parse raw JSON. Fails only when the text is not JSON at all.
    pub fn from_json_str(raw: &str) -> SiteResult<Self> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(Self::from_value(&value))
    }
}

fn decode<T: DeserializeOwned>(raw: &Value, path: &str) -> Option<T> {
    match serde_json::from_value(raw.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            tracing::debug!(path, error = %e, "ignoring malformed content");
            None
        }
    }
}

/// An object section. Anything but an object is dropped whole.
fn object_section<T: DeserializeOwned>(root: &Value, key: &str) -> Option<T> {
    let raw = root.get(key)?;
    if !raw.is_object() {
        tracing::debug!(section = key, "ignoring non-object content section");
        return None;
    }
    decode(raw, key)
}

/// A list section. Non-object entries are dropped one by one.
fn list_section<T: DeserializeOwned>(root: &Value, key: &str) -> Option<Vec<T>> {
    let Some(items) = root.get(key)?.as_array() else {
        tracing::debug!(section = key, "ignoring non-array content section");
        return None;
    };
    Some(
        items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.is_object())
            .filter_map(|(index, item)| decode(item, &format!("{}[{}]", key, index)))
            .collect(),
    )
}

/// Strings pass through; null and every other type read as empty.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Site {
    #[serde(default, deserialize_with = "lenient_string")]
    pub studio_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hero_headline: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub hero_subhead: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub booking_url: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub contact_email: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrustSignal {
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,
}

/// Call-to-action copy. Every field is optional here so that a partial
/// section can be merged over the configured defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CtaContent {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub primary_label: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub secondary_label: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub helper_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub email_subject: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub email_body_template: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BrandDistinction {
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub hutech_tech_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Capability {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProcessStep {
    #[serde(default, deserialize_with = "lenient_string")]
    pub step: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CaseStudy {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub audience_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub problem: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub prototype: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub outcome: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub metrics: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub confidentiality: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub redaction_note: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cta_label: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Seo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub og_title: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub og_description: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub canonical_url: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AudienceType {
    Internal,
    External,
}

impl AudienceType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Internal" => Some(Self::Internal),
            "External" => Some(Self::External),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidentiality {
    Public,
    Anonymized,
    Restricted,
}

impl Confidentiality {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "public" => Some(Self::Public),
            "anonymized" => Some(Self::Anonymized),
            "restricted" => Some(Self::Restricted),
            _ => None,
        }
    }
}

/// Identifying metadata of the schema file that ships next to the content.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaMetadata {
    #[serde(default)]
    pub title: Option<String>,
}

impl SchemaMetadata {
    pub fn check(schema: &Value) -> SiteResult<()> {
        let meta: SchemaMetadata = serde_json::from_value(schema.clone())
            .map_err(|e| SiteError::SchemaMetadata(e.to_string()))?;
        match meta.title.as_deref() {
            Some(EXPECTED_SCHEMA_TITLE) => Ok(()),
            Some(other) => Err(SiteError::SchemaMetadata(format!(
                "expected title '{}', found '{}'",
                EXPECTED_SCHEMA_TITLE, other
            ))),
            None => Err(SiteError::SchemaMetadata("schema title is missing".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_malformed_section_is_dropped() {
        let doc = ContentDocument::from_value(&json!({
            "site": {"studio_name": "Studio"},
            "trust_signals": "not a list",
            "cta": ["not", "an", "object"],
            "capabilities": [{"title": "Build", "description": "We build prototypes."}]
        }));
        assert_eq!(doc.site.unwrap().studio_name, "Studio");
        assert!(doc.trust_signals.is_none());
        assert!(doc.cta.is_none());
        assert_eq!(doc.capabilities.unwrap().len(), 1);
        assert!(doc.seo.is_none());
    }

    #[test]
    fn test_wrong_typed_fields_read_as_empty() {
        let doc = ContentDocument::from_value(&json!({
            "site": {"studio_name": "Studio", "booking_url": null, "contact_email": 42},
            "cta": {"primary_label": null, "secondary_label": "See work"},
            "case_studies": [
                {"id": "alpha", "title": "Alpha", "redaction_note": null, "metrics": ["x"]},
                "not an object",
                {"id": "beta", "confidentiality": false}
            ]
        }));

        let site = doc.site.unwrap();
        assert_eq!(site.studio_name, "Studio");
        assert_eq!(site.booking_url, "");
        assert_eq!(site.contact_email, "");

        let cta = doc.cta.unwrap();
        assert_eq!(cta.primary_label, None);
        assert_eq!(cta.secondary_label.as_deref(), Some("See work"));

        let cases = doc.case_studies.unwrap();
        let ids: Vec<&str> = cases.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "beta"]);
        assert_eq!(cases[0].redaction_note, "");
        assert_eq!(cases[0].metrics, "");
        assert_eq!(cases[1].confidentiality, "");
    }

    #[test]
    fn test_schema_metadata_check() {
        assert!(SchemaMetadata::check(&json!({"title": EXPECTED_SCHEMA_TITLE})).is_ok());
        assert!(SchemaMetadata::check(&json!({"title": "Other"})).is_err());
        assert!(SchemaMetadata::check(&json!({})).is_err());
        assert!(SchemaMetadata::check(&json!([1, 2])).is_err());
    }
}
