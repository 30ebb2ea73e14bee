//! Checks a caller can run on a request before printing it.
//!
//! Rendering never depends on this: the form prints whatever it is given and
//! leaves blanks where data is missing. Validation exists so the CLI can
//! warn (or refuse, with `--strict`) before producing a form an officer
//! would have to send back.

use std::fmt;

use chrono::NaiveDate;

use crate::model::RequestRecord;

const NATIONAL_ID_DIGITS: usize = 13;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// JSON field name of the offending value.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    fn missing(field: &'static str) -> Self {
        Self::new(field, "is required")
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Every problem found in one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn add(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    pub fn fields(&self) -> Vec<&'static str> {
        self.errors.iter().map(|e| e.field).collect()
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.errors.len())?;
        for error in &self.errors {
            write!(f, "; {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

fn require(value: &str, field: &'static str, errors: &mut ValidationErrors) -> bool {
    if value.trim().is_empty() {
        errors.add(ValidationError::missing(field));
        false
    } else {
        true
    }
}

fn validate_national_id(value: &str, errors: &mut ValidationErrors) {
    if !require(value, "id_card", errors) {
        return;
    }
    let trimmed = value.trim();
    if trimmed.len() != NATIONAL_ID_DIGITS || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        errors.add(ValidationError::new(
            "id_card",
            format!("must be {NATIONAL_ID_DIGITS} digits, got {trimmed:?}"),
        ));
    }
}

/// Ids end up in download filenames, so only `[A-Za-z0-9_-]` is accepted.
fn validate_request_id(value: &str, errors: &mut ValidationErrors) {
    if !require(value, "id", errors) {
        return;
    }
    if let Some(bad) = value.chars().find(|&c| !is_filename_safe(c)) {
        errors.add(ValidationError::new(
            "id",
            format!("{value:?} contains {bad:?}; only letters, digits, '-' and '_' are allowed"),
        ));
    }
}

pub(crate) fn is_filename_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn validate_birth_date(value: &str, errors: &mut ValidationErrors) {
    if !require(value, "date_of_birth", errors) {
        return;
    }
    if let Err(e) = NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d") {
        errors.add(ValidationError::new(
            "date_of_birth",
            format!("{:?} is not a YYYY-MM-DD date ({e})", value.trim()),
        ));
    }
}

/// Collect every problem with `record` instead of stopping at the first.
pub fn validate_request(record: &RequestRecord) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    validate_request_id(&record.id, &mut errors);
    require(&record.name, "name", &mut errors);
    validate_national_id(&record.id_card, &mut errors);
    validate_birth_date(&record.date_of_birth, &mut errors);
    require(&record.purpose, "purpose", &mut errors);
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> RequestRecord {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn complete_request_passes() {
        let r = record(
            r#"{"id": "1", "name": "สมชาย ใจดี", "id_card": "1103700012345",
                "date_of_birth": "2008-02-29", "purpose": "สมัครงาน",
                "created_at": "2025-01-15T03:00:00Z"}"#,
        );
        assert_eq!(validate_request(&r), Ok(()));
    }

    #[test]
    fn collects_all_problems() {
        let r = record(r#"{"id": "1", "name": " ", "created_at": "2025-01-15T03:00:00Z"}"#);
        let errors = validate_request(&r).unwrap_err();
        assert_eq!(
            errors.fields(),
            vec!["name", "id_card", "date_of_birth", "purpose"]
        );
        assert!(errors.to_string().starts_with("4 validation error(s)"));
    }

    #[test]
    fn national_id_must_be_thirteen_digits() {
        for bad in ["123", "11037000123456", "110370001234x", "๑๑๐๓๗๐๐๐๑๒๓๔๕"] {
            let r = record(&format!(
                r#"{{"id": "1", "name": "a", "id_card": "{bad}", "date_of_birth": "2008-01-01",
                    "purpose": "p", "created_at": "2025-01-15T03:00:00Z"}}"#
            ));
            let errors = validate_request(&r).unwrap_err();
            assert_eq!(errors.fields(), vec!["id_card"], "{bad}");
        }
    }

    #[test]
    fn birth_date_must_be_iso() {
        let r = record(
            r#"{"id": "1", "name": "a", "id_card": "1103700012345", "date_of_birth": "29/02/2008",
                "purpose": "p", "created_at": "2025-01-15T03:00:00Z"}"#,
        );
        let errors = validate_request(&r).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.iter().all(|e| e.field == "date_of_birth"));
    }

    #[test]
    fn request_id_must_be_filename_safe() {
        for bad in [
            "x/../../tmp/evil",
            "a\\b",
            "id\"; x=\"y",
            "two words",
            "ไทย",
            "a\r\nSet-Cookie: x",
        ] {
            let mut r = record(
                r#"{"id": "1", "name": "a", "id_card": "1103700012345", "date_of_birth": "2008-01-01",
                    "purpose": "p", "created_at": "2025-01-15T03:00:00Z"}"#,
            );
            r.id = bad.to_string();
            let errors = validate_request(&r).unwrap_err();
            assert_eq!(errors.fields(), vec!["id"], "{bad:?}");
        }
    }

    #[test]
    fn missing_request_id_is_reported_first() {
        let r = record(
            r#"{"id": "", "name": "a", "id_card": "1103700012345", "date_of_birth": "2008-01-01",
                "purpose": "", "created_at": "2025-01-15T03:00:00Z"}"#,
        );
        let errors = validate_request(&r).unwrap_err();
        assert_eq!(errors.fields(), vec!["id", "purpose"]);
    }

    #[test]
    fn store_style_ids_pass() {
        for good in ["65f0c1a2b3c4d5e6f7a8b9c0", "REQ-2567_001", "1"] {
            let mut r = record(
                r#"{"id": "1", "name": "a", "id_card": "1103700012345", "date_of_birth": "2008-01-01",
                    "purpose": "p", "created_at": "2025-01-15T03:00:00Z"}"#,
            );
            r.id = good.to_string();
            assert_eq!(validate_request(&r), Ok(()), "{good}");
        }
    }
}
