use serde::{Deserialize, Serialize};
use std::fmt;

/// One problem with one property of a candidate configuration.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub property: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            message: message.into(),
        }
    }

    /// `The '<property>' value is invalid: <reason>`
    pub fn invalid_value(property: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            property,
            format!("The '{property}' value is invalid: {reason}"),
        )
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.message)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
    Valid,
    Invalid,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::Valid => write!(f, "VALID"),
            ValidationStatus::Invalid => write!(f, "INVALID"),
        }
    }
}

/// Ordered verdict for one configuration.
///
/// The status is never stored: it is `INVALID` exactly when at least one
/// error was recorded. At most one error is kept per property; the first
/// one recorded wins.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(into = "ReportBody", try_from = "ReportBody")]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `error` unless its property already has one. Returns whether
    /// the error was kept.
    pub fn push(&mut self, error: ValidationError) -> bool {
        if self.has_error_for(&error.property) {
            return false;
        }
        self.errors.push(error);
        true
    }

    pub fn status(&self) -> ValidationStatus {
        if self.errors.is_empty() {
            ValidationStatus::Valid
        } else {
            ValidationStatus::Invalid
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status() == ValidationStatus::Valid
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn has_error_for(&self, property: &str) -> bool {
        self.errors.iter().any(|e| e.property == property)
    }

    pub fn error_for(&self, property: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.property == property)
    }
}

impl FromIterator<ValidationError> for ValidationReport {
    fn from_iter<I: IntoIterator<Item = ValidationError>>(iter: I) -> Self {
        let mut report = ValidationReport::new();
        for error in iter {
            report.push(error);
        }
        report
    }
}

impl Extend<ValidationError> for ValidationReport {
    fn extend<I: IntoIterator<Item = ValidationError>>(&mut self, iter: I) {
        for error in iter {
            self.push(error);
        }
    }
}

/// Wire shape: `{"status": "...", "validationResults": [...]}`.
#[derive(Serialize, Deserialize)]
struct ReportBody {
    status: ValidationStatus,
    #[serde(rename = "validationResults")]
    validation_results: Vec<ValidationError>,
}

impl From<ValidationReport> for ReportBody {
    fn from(report: ValidationReport) -> Self {
        Self {
            status: report.status(),
            validation_results: report.errors,
        }
    }
}

impl TryFrom<ReportBody> for ValidationReport {
    type Error = String;

    fn try_from(body: ReportBody) -> Result<Self, Self::Error> {
        let report: ValidationReport = body.validation_results.into_iter().collect();
        if report.status() != body.status {
            return Err(format!(
                "status {} does not match {} validation result(s)",
                body.status,
                report.errors().len()
            ));
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_report_is_valid() {
        let report = ValidationReport::new();
        assert_eq!(report.status(), ValidationStatus::Valid);
        assert_eq!(
            serde_json::to_value(&report).expect("serialize"),
            json!({ "status": "VALID", "validationResults": [] })
        );
    }

    #[test]
    fn keeps_first_error_per_property() {
        let mut report = ValidationReport::new();
        assert!(report.push(ValidationError::invalid_value("topic.prefix", "A value is required")));
        assert!(!report.push(ValidationError::new("topic.prefix", "something else")));
        assert!(report.push(ValidationError::new("mongodb.connection.string", "Unable to connect: x")));

        assert_eq!(report.status(), ValidationStatus::Invalid);
        assert_eq!(report.errors().len(), 2);
        assert_eq!(
            report.error_for("topic.prefix").map(|e| e.message.as_str()),
            Some("The 'topic.prefix' value is invalid: A value is required")
        );
    }

    #[test]
    fn serializes_in_recorded_order() {
        let report: ValidationReport = vec![
            ValidationError::new("b", "second"),
            ValidationError::new("a", "first"),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            serde_json::to_value(&report).expect("serialize"),
            json!({
                "status": "INVALID",
                "validationResults": [
                    { "property": "b", "message": "second" },
                    { "property": "a", "message": "first" }
                ]
            })
        );
    }

    #[test]
    fn rejects_inconsistent_status_on_read() {
        let body = json!({
            "status": "VALID",
            "validationResults": [{ "property": "a", "message": "broken" }]
        });
        assert!(serde_json::from_value::<ValidationReport>(body).is_err());

        let body = json!({ "status": "INVALID", "validationResults": [{ "property": "a", "message": "m" }] });
        let report: ValidationReport = serde_json::from_value(body).expect("consistent body");
        assert_eq!(report.errors().len(), 1);
    }
}
