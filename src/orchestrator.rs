//! Ties the symbol table, pass registry, and schema seam together into a
//! single `analyze` entry point.

use crate::ast::Spec;
use crate::finding::{Finding, Report};
use crate::passes::{self, Pass};
use crate::schema::SchemaValidator;
use crate::symbol_table::SymbolTable;

/// Which rule numbers to run. Empty means "run everything."
#[derive(Debug, Clone, Default)]
pub struct RuleFilter(Vec<String>);

impl RuleFilter {
    pub fn all() -> Self {
        RuleFilter(Vec::new())
    }

    pub fn only<I, S>(rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RuleFilter(rules.into_iter().map(Into::into).collect())
    }

    fn matches(&self, pass: &dyn Pass) -> bool {
        self.0.is_empty() || pass.rule_numbers().iter().any(|r| self.0.iter().any(|f| f == r))
    }
}

/// Run the schema validator and, if it reports nothing, the pass registry
/// against `spec`/`raw`. When schema errors are present, semantic passes
/// are skipped per §7's short-circuit rule.
pub fn analyze(
    spec: &Spec,
    raw: &serde_json::Value,
    validator: &dyn SchemaValidator,
    filter: &RuleFilter,
    schema_only: bool,
) -> Report {
    let schema_findings = validator.check(raw);
    let schema_valid = schema_findings.is_empty();

    let mut findings: Vec<Finding> = schema_findings;

    if schema_valid && !schema_only {
        let symbols = SymbolTable::build(spec);
        for pass in passes::registry() {
            if filter.matches(pass.as_ref()) {
                findings.extend(pass.run(spec, &symbols));
            }
        }
    }

    Report::from_findings(spec.file.clone(), schema_valid, findings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::NullSchemaValidator;

    fn spec_from(json: serde_json::Value) -> Spec {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn clean_document_yields_no_findings() {
        let spec = spec_from(serde_json::json!({"version": "1", "file": "t.allium"}));
        let report = analyze(&spec, &serde_json::json!({}), &NullSchemaValidator, &RuleFilter::all(), false);
        assert!(report.schema_valid);
        assert!(!report.has_errors());
        assert!(!report.has_warnings());
    }

    #[test]
    fn schema_only_skips_semantic_passes() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "entities": [{
                "name": "A",
                "fields": [{"name": "owner", "type": {"kind": "entity_ref", "entity_name": "Missing"}}]
            }]
        }));
        let report = analyze(&spec, &serde_json::json!({}), &NullSchemaValidator, &RuleFilter::all(), true);
        assert!(!report.has_errors());
    }

    #[test]
    fn filter_restricts_to_requested_rules() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "entities": [{
                "name": "A",
                "fields": [{"name": "owner", "type": {"kind": "entity_ref", "entity_name": "Missing"}}]
            }],
            "open_questions": ["still deciding"]
        }));
        let report = analyze(&spec, &serde_json::json!({}), &NullSchemaValidator, &RuleFilter::only(["RULE-01"]), false);
        assert!(report.errors.iter().any(|f| f.rule == "RULE-01"));
        assert!(report.warnings.iter().all(|f| f.rule != "WARN-02"));
    }
}
