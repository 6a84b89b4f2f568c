//! Content Validation - one rule per document section
//!
//! Rules produce structured violations in document traversal order.
//! The validator never fails; a malformed parent yields one violation and
//! its child checks are skipped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

use crate::content::{AudienceType, Confidentiality, REQUIRED_ROOT_KEYS};
use crate::error::{SiteError, SiteResult};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static STEP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{2}$").unwrap());
static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationViolation {
    pub rule: String,
    pub path: String,
    pub message: String,
}

impl ValidationViolation {
    fn new(rule: &str, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule: rule.to_string(),
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<ValidationViolation>,
}

impl ValidationResult {
    pub fn from_violations(violations: Vec<ValidationViolation>) -> Self {
        Self {
            valid: violations.is_empty(),
            violations,
        }
    }

    pub fn ensure_valid(&self) -> SiteResult<()> {
        if self.valid {
            Ok(())
        } else {
            Err(SiteError::SchemaViolation(self.violations.len()))
        }
    }

    /// Numbered report lines, one per violation.
    pub fn numbered(&self) -> Vec<String> {
        self.violations
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{}. {}", i + 1, v.message))
            .collect()
    }
}

/// Validation rule trait - produces violations for one section of the root
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, root: &Map<String, Value>) -> Vec<ValidationViolation>;
}

// --- Value helpers ---

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn has_min_chars(value: Option<&Value>, min: usize) -> bool {
    value
        .and_then(Value::as_str)
        .map_or(false, |s| s.trim().chars().count() >= min)
}

fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

fn has_scheme(value: &str, schemes: &[&str]) -> bool {
    url::Url::parse(value).map_or(false, |u| schemes.contains(&u.scheme()))
}

/// Checks that `section` is an array, then hands each object entry to
/// `check_entry`. Non-object entries produce one violation each.
fn each_object<'a>(
    rule: &str,
    section: &'a Value,
    out: &mut Vec<ValidationViolation>,
    length_check: impl FnOnce(usize) -> Option<String>,
    mut check_entry: impl FnMut(&str, &'a Map<String, Value>, &mut Vec<ValidationViolation>),
) {
    let Some(items) = section.as_array() else {
        out.push(ValidationViolation::new(rule, rule, format!("{} must be an array.", rule)));
        return;
    };

    if let Some(message) = length_check(items.len()) {
        out.push(ValidationViolation::new(rule, rule, message));
    }

    for (index, item) in items.iter().enumerate() {
        let prefix = format!("{}[{}]", rule, index);
        match item.as_object() {
            Some(entry) => check_entry(&prefix, entry, out),
            None => out.push(ValidationViolation::new(rule, prefix.clone(), format!("{} must be an object.", prefix))),
        }
    }
}

fn require_min_chars(
    rule: &str,
    prefix: &str,
    entry: &Map<String, Value>,
    key: &str,
    min: usize,
    out: &mut Vec<ValidationViolation>,
) {
    if !has_min_chars(entry.get(key), min) {
        let path = format!("{}.{}", prefix, key);
        out.push(ValidationViolation::new(
            rule,
            path.clone(),
            format!("{} must be at least {} characters.", path, min),
        ));
    }
}

fn require_non_empty(
    rule: &str,
    prefix: &str,
    entry: &Map<String, Value>,
    keys: &[&str],
    out: &mut Vec<ValidationViolation>,
) {
    for key in keys {
        if non_empty_str(entry.get(*key)).is_none() {
            let path = format!("{}.{}", prefix, key);
            out.push(ValidationViolation::new(
                rule,
                path.clone(),
                format!("{} must be a non-empty string.", path),
            ));
        }
    }
}

fn object_section<'a>(
    rule: &str,
    section: &'a Value,
    out: &mut Vec<ValidationViolation>,
) -> Option<&'a Map<String, Value>> {
    let object = section.as_object();
    if object.is_none() {
        out.push(ValidationViolation::new(rule, rule, format!("{} must be an object.", rule)));
    }
    object
}

// --- Concrete Rules ---

pub struct RootKeysRule;

impl ValidationRule for RootKeysRule {
    fn name(&self) -> &'static str { "root" }

    fn validate(&self, root: &Map<String, Value>) -> Vec<ValidationViolation> {
        REQUIRED_ROOT_KEYS
            .iter()
            .filter(|key| !root.contains_key(**key))
            .map(|key| {
                ValidationViolation::new(self.name(), *key, format!("Missing required root key: {}", key))
            })
            .collect()
    }
}

pub struct SiteRule;

impl ValidationRule for SiteRule {
    fn name(&self) -> &'static str { "site" }

    fn validate(&self, root: &Map<String, Value>) -> Vec<ValidationViolation> {
        let mut violations = vec![];
        let Some(section) = root.get(self.name()) else { return violations };
        let Some(site) = object_section(self.name(), section, &mut violations) else {
            return violations;
        };

        require_non_empty(
            self.name(),
            self.name(),
            site,
            &["studio_name", "hero_headline", "hero_subhead", "booking_url", "contact_email"],
            &mut violations,
        );

        if let Some(booking_url) = non_empty_str(site.get("booking_url")) {
            if !has_scheme(booking_url, &["http", "https", "mailto"]) {
                violations.push(ValidationViolation::new(
                    self.name(),
                    "site.booking_url",
                    "site.booking_url must be a valid http(s) or mailto URI.",
                ));
            }
        }

        if let Some(email) = non_empty_str(site.get("contact_email")) {
            if !is_valid_email(email) {
                violations.push(ValidationViolation::new(
                    self.name(),
                    "site.contact_email",
                    "site.contact_email must be a valid email address.",
                ));
            }
        }

        violations
    }
}

pub struct TrustSignalsRule;

impl ValidationRule for TrustSignalsRule {
    fn name(&self) -> &'static str { "trust_signals" }

    fn validate(&self, root: &Map<String, Value>) -> Vec<ValidationViolation> {
        let mut violations = vec![];
        let Some(section) = root.get(self.name()) else { return violations };
        let rule = self.name();

        each_object(
            rule,
            section,
            &mut violations,
            |len| (len < 4).then(|| "trust_signals must include at least 4 entries.".to_string()),
            |prefix, entry, out| {
                require_min_chars(rule, prefix, entry, "label", 3, out);
                require_min_chars(rule, prefix, entry, "value", 3, out);
            },
        );

        violations
    }
}

pub struct CtaRule;

impl ValidationRule for CtaRule {
    fn name(&self) -> &'static str { "cta" }

    fn validate(&self, root: &Map<String, Value>) -> Vec<ValidationViolation> {
        let mut violations = vec![];
        let Some(section) = root.get(self.name()) else { return violations };
        let Some(cta) = object_section(self.name(), section, &mut violations) else {
            return violations;
        };

        require_non_empty(
            self.name(),
            self.name(),
            cta,
            &["primary_label", "secondary_label", "email_subject", "email_body_template"],
            &mut violations,
        );

        violations
    }
}

pub struct CapabilitiesRule;

impl ValidationRule for CapabilitiesRule {
    fn name(&self) -> &'static str { "capabilities" }

    fn validate(&self, root: &Map<String, Value>) -> Vec<ValidationViolation> {
        let mut violations = vec![];
        let Some(section) = root.get(self.name()) else { return violations };
        let rule = self.name();

        each_object(
            rule,
            section,
            &mut violations,
            |len| (len < 3).then(|| "capabilities must include at least 3 entries.".to_string()),
            |prefix, entry, out| {
                require_min_chars(rule, prefix, entry, "title", 3, out);
                require_min_chars(rule, prefix, entry, "description", 10, out);
            },
        );

        violations
    }
}

pub struct ProcessStepsRule;

impl ValidationRule for ProcessStepsRule {
    fn name(&self) -> &'static str { "process_steps" }

    fn validate(&self, root: &Map<String, Value>) -> Vec<ValidationViolation> {
        let mut violations = vec![];
        let Some(section) = root.get(self.name()) else { return violations };
        let rule = self.name();

        each_object(
            rule,
            section,
            &mut violations,
            |len| (len != 3).then(|| "process_steps must include exactly 3 steps.".to_string()),
            |prefix, entry, out| {
                let step_ok = entry
                    .get("step")
                    .and_then(Value::as_str)
                    .map_or(false, |s| STEP_RE.is_match(s));
                if !step_ok {
                    let path = format!("{}.step", prefix);
                    out.push(ValidationViolation::new(
                        rule,
                        path.clone(),
                        format!("{} must match two-digit format (01, 02, ...).", path),
                    ));
                }
                require_min_chars(rule, prefix, entry, "title", 3, out);
                require_min_chars(rule, prefix, entry, "description", 10, out);
            },
        );

        violations
    }
}

pub struct CaseStudiesRule;

const CASE_STUDY_KEYS: [&str; 10] = [
    "id",
    "title",
    "audience_type",
    "problem",
    "prototype",
    "outcome",
    "metrics",
    "confidentiality",
    "redaction_note",
    "cta_label",
];

impl ValidationRule for CaseStudiesRule {
    fn name(&self) -> &'static str { "case_studies" }

    fn validate(&self, root: &Map<String, Value>) -> Vec<ValidationViolation> {
        let mut violations = vec![];
        let Some(section) = root.get(self.name()) else { return violations };
        let rule = self.name();
        let mut seen_ids: HashSet<&str> = HashSet::new();

        each_object(
            rule,
            section,
            &mut violations,
            |len| (len < 1).then(|| "case_studies must include at least 1 entry.".to_string()),
            |prefix, entry, out| {
                require_non_empty(rule, prefix, entry, &CASE_STUDY_KEYS, out);

                if let Some(id) = non_empty_str(entry.get("id")) {
                    let path = format!("{}.id", prefix);
                    if !SLUG_RE.is_match(id) {
                        out.push(ValidationViolation::new(
                            rule,
                            path.clone(),
                            format!("{} must match /^[a-z0-9-]+$/.", path),
                        ));
                    }
                    if !seen_ids.insert(id) {
                        out.push(ValidationViolation::new(
                            rule,
                            path.clone(),
                            format!("{} must be unique; duplicate id '{}' found.", path, id),
                        ));
                    }
                }

                if let Some(audience) = non_empty_str(entry.get("audience_type")) {
                    if AudienceType::parse(audience).is_none() {
                        let path = format!("{}.audience_type", prefix);
                        out.push(ValidationViolation::new(
                            rule,
                            path.clone(),
                            format!("{} must be Internal or External.", path),
                        ));
                    }
                }

                if let Some(tier) = non_empty_str(entry.get("confidentiality")) {
                    if Confidentiality::parse(tier).is_none() {
                        let path = format!("{}.confidentiality", prefix);
                        out.push(ValidationViolation::new(
                            rule,
                            path.clone(),
                            format!("{} must be one of public|anonymized|restricted.", path),
                        ));
                    }
                }
            },
        );

        violations
    }
}

pub struct SeoRule;

impl ValidationRule for SeoRule {
    fn name(&self) -> &'static str { "seo" }

    fn validate(&self, root: &Map<String, Value>) -> Vec<ValidationViolation> {
        let mut violations = vec![];
        let Some(section) = root.get(self.name()) else { return violations };
        let Some(seo) = object_section(self.name(), section, &mut violations) else {
            return violations;
        };

        require_non_empty(
            self.name(),
            self.name(),
            seo,
            &["title", "description", "og_title", "og_description", "canonical_url"],
            &mut violations,
        );

        if let Some(canonical) = non_empty_str(seo.get("canonical_url")) {
            if !has_scheme(canonical, &["http", "https"]) {
                violations.push(ValidationViolation::new(
                    self.name(),
                    "seo.canonical_url",
                    "seo.canonical_url must be a valid http(s) URL.",
                ));
            }
        }

        violations
    }
}

/// Validator runs every section rule in traversal order
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(RootKeysRule),
                Box::new(SiteRule),
                Box::new(TrustSignalsRule),
                Box::new(CtaRule),
                Box::new(CapabilitiesRule),
                Box::new(ProcessStepsRule),
                Box::new(CaseStudiesRule),
                Box::new(SeoRule),
            ],
        }
    }

    pub fn validate(&self, document: &Value) -> ValidationResult {
        let Some(root) = document.as_object() else {
            return ValidationResult::from_violations(vec![ValidationViolation::new(
                "root",
                "",
                "Root content must be an object.",
            )]);
        };

        let mut all_violations = vec![];
        for rule in &self.rules {
            all_violations.extend(rule.validate(root));
        }

        ValidationResult::from_violations(all_violations)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a content document with the default rule set.
pub fn validate(document: &Value) -> ValidationResult {
    Validator::new().validate(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn messages(document: &Value) -> Vec<String> {
        validate(document).violations.into_iter().map(|v| v.message).collect()
    }

    #[test]
    fn test_root_must_be_object() {
        assert_eq!(messages(&json!([])), vec!["Root content must be an object."]);
    }

    #[test]
    fn test_malformed_parent_reports_once() {
        let found = messages(&json!({"trust_signals": "nope"}));
        assert_eq!(found.iter().filter(|m| m.starts_with("trust_signals")).count(), 1);
        assert!(found.contains(&"trust_signals must be an array.".to_string()));
    }

    #[test]
    fn test_non_object_entry() {
        let found = messages(&json!({"capabilities": [1, {"title": "Build", "description": "Shipping fast prototypes"}, {"title": "Run", "description": "Operating pilots"}]}));
        assert!(found.contains(&"capabilities[0] must be an object.".to_string()));
        assert!(!found.iter().any(|m| m.starts_with("capabilities[1]")));
    }

    #[test]
    fn test_booking_url_schemes() {
        assert!(has_scheme("mailto:a@b.com", &["http", "https", "mailto"]));
        assert!(has_scheme("https://calendly.com/x", &["http", "https", "mailto"]));
        assert!(!has_scheme("ftp://files.example.com", &["http", "https", "mailto"]));
        assert!(!has_scheme("not a url", &["http", "https"]));
    }

    #[test]
    fn test_trimmed_length() {
        assert!(!has_min_chars(Some(&json!("  ab  ")), 3));
        assert!(has_min_chars(Some(&json!(" abc ")), 3));
        assert!(!has_min_chars(Some(&json!(123)), 3));
    }

    #[test]
    fn test_numbered_report() {
        let result = validate(&json!({}));
        let lines = result.numbered();
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "1. Missing required root key: site");
        assert_eq!(lines[6], "7. Missing required root key: seo");
    }
}
