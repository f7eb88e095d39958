//! The result vocabulary: severity-tagged findings aggregated into a
//! per-document report.

use serde::{Deserialize, Serialize};

/// `INPUT` and `SCHEMA` are the two non-pass diagnostic classes; every
/// semantic pass reports `RULE-NN`/`WARN-NN`.
pub const INPUT: &str = "INPUT";
pub const SCHEMA: &str = "SCHEMA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A JSON-Path-like position within the source document. `path` follows
/// the documented shape (`$`, `.field`, `[index]`) and is a human aid, not
/// a parser target; `line` is omitted from JSON output when unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub line: Option<u32>,
}

impl Location {
    pub fn new(file: impl Into<String>, path: impl Into<String>) -> Self {
        Location {
            file: file.into(),
            path: path.into(),
            line: None,
        }
    }
}

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub rule: String,
    pub severity: Severity,
    pub message: String,
    pub location: Location,
}

impl Finding {
    pub fn error(rule: impl Into<String>, message: impl Into<String>, location: Location) -> Self {
        Finding {
            rule: rule.into(),
            severity: Severity::Error,
            message: message.into(),
            location,
        }
    }

    pub fn warning(rule: impl Into<String>, message: impl Into<String>, location: Location) -> Self {
        Finding {
            rule: rule.into(),
            severity: Severity::Warning,
            message: message.into(),
            location,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Summary {
    pub error_count: usize,
    pub warning_count: usize,
}

/// The ordered aggregation of findings for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub file: String,
    pub schema_valid: bool,
    #[serde(default)]
    pub errors: Vec<Finding>,
    #[serde(default)]
    pub warnings: Vec<Finding>,
    pub summary: Summary,
}

impl Report {
    /// Build a report from a flat, pass-ordered sequence of findings,
    /// splitting by severity and deriving the summary counts.
    pub fn from_findings(file: impl Into<String>, schema_valid: bool, findings: Vec<Finding>) -> Self {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        for finding in findings {
            match finding.severity {
                Severity::Error => errors.push(finding),
                Severity::Warning => warnings.push(finding),
            }
        }
        let summary = Summary {
            error_count: errors.len(),
            warning_count: warnings.len(),
        };
        Report {
            file: file.into(),
            schema_valid,
            errors,
            warnings,
            summary,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_collections_serialize_as_empty_arrays() {
        let report = Report::from_findings("t.allium", true, Vec::new());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["errors"], serde_json::json!([]));
        assert_eq!(json["warnings"], serde_json::json!([]));
        assert_eq!(json["summary"]["error_count"], 0);
        assert_eq!(json["summary"]["warning_count"], 0);
    }

    #[test]
    fn line_omitted_when_absent() {
        let loc = Location::new("t.allium", "$.entities[0]");
        let json = serde_json::to_value(&loc).unwrap();
        assert!(json.get("line").is_none());
    }

    #[test]
    fn summary_matches_split_counts() {
        let findings = vec![
            Finding::error("RULE-01", "bad ref", Location::new("t.allium", "$")),
            Finding::warning("WARN-02", "open question", Location::new("t.allium", "$")),
        ];
        let report = Report::from_findings("t.allium", true, findings);
        assert_eq!(report.summary.error_count, report.errors.len());
        assert_eq!(report.summary.warning_count, report.warnings.len());
    }
}
