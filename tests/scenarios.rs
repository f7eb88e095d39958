//! End-to-end scenarios against the public `analyze_file` entry point.

use std::io::Write;

use allium_lint::{analyze_file, RuleFilter};
use tempfile::NamedTempFile;

fn document(json: serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{json}").unwrap();
    file
}

#[test]
fn clean_minimal_document_has_no_findings() {
    let file = document(serde_json::json!({"version": "1", "file": "t.allium"}));
    let report = analyze_file(file.path(), &RuleFilter::all(), false).unwrap();
    assert!(report.schema_valid);
    assert_eq!(report.summary.error_count, 0);
    assert_eq!(report.summary.warning_count, 0);
}

#[test]
fn undeclared_entity_ref_reports_single_rule_01() {
    let file = document(serde_json::json!({
        "version": "1",
        "file": "t.allium",
        "entities": [{
            "name": "A",
            "fields": [{"name": "owner", "type": {"kind": "entity_ref", "entity_name": "B"}}]
        }]
    }));
    let report = analyze_file(file.path(), &RuleFilter::all(), false).unwrap();
    let rule01: Vec<_> = report.errors.iter().filter(|f| f.rule == "RULE-01").collect();
    assert_eq!(rule01.len(), 1);
    assert_eq!(rule01[0].location.path, "$.entities[0].fields[0].type");
    assert!(rule01[0].message.contains('B'));
}

#[test]
fn derived_value_cycle_reports_single_rule_10() {
    let field = |name: &str| {
        serde_json::json!({
            "name": name,
            "parameters": null,
            "expression": {
                "kind": "arithmetic",
                "op": "+",
                "left": {"kind": "field_access", "object": null, "field": if name == "total" { "tax" } else { "total" }},
                "right": {"kind": "literal", "type": "integer", "value": 0}
            }
        })
    };
    let file = document(serde_json::json!({
        "version": "1",
        "file": "t.allium",
        "entities": [{
            "name": "Invoice",
            "derived_values": [field("total"), field("tax")]
        }]
    }));
    let report = analyze_file(file.path(), &RuleFilter::all(), false).unwrap();
    let rule10: Vec<_> = report.errors.iter().filter(|f| f.rule == "RULE-10").collect();
    assert_eq!(rule10.len(), 1);
    assert!(rule10[0].message.contains("total") && rule10[0].message.contains("tax"));
}

#[test]
fn unreachable_status_value_reports_single_rule_07() {
    let file = document(serde_json::json!({
        "version": "1",
        "file": "t.allium",
        "entities": [{
            "name": "Order",
            "fields": [{"name": "status", "type": {"kind": "inline_enum", "values": ["pending", "active", "done"]}}]
        }],
        "rules": [
            {
                "name": "CreateOrder",
                "trigger": {"kind": "entity_creation", "entity": "Order", "binding": "order"},
                "ensures": [{"kind": "entity_creation", "entity": "Order", "fields": {"status": {"kind": "literal", "type": "enum_value", "value": "pending"}}}]
            },
            {
                "name": "Ship",
                "trigger": {"kind": "state_transition", "entity": "Order", "field": "status", "binding": "order", "to_value": "done"},
                "ensures": [{"kind": "state_change", "target": {"kind": "field_access", "object": null, "field": "status"}, "value": {"kind": "literal", "type": "enum_value", "value": "done"}}]
            }
        ]
    }));
    let report = analyze_file(file.path(), &RuleFilter::all(), false).unwrap();
    let rule07: Vec<_> = report.errors.iter().filter(|f| f.rule == "RULE-07").collect();
    assert_eq!(rule07.len(), 1);
    assert!(rule07[0].message.contains("active"));
}

#[test]
fn sum_type_mis_creation_reports_single_rule_19() {
    let file = document(serde_json::json!({
        "version": "1",
        "file": "t.allium",
        "entities": [{
            "name": "Node",
            "fields": [{"name": "kind", "type": {"kind": "inline_enum", "values": ["Branch", "Leaf"]}}]
        }],
        "variants": [
            {"name": "Branch", "base_entity": "Node", "fields": []},
            {"name": "Leaf", "base_entity": "Node", "fields": []}
        ],
        "rules": [{
            "name": "MakeNode",
            "trigger": {"kind": "external_stimulus", "name": "make_node", "parameters": []},
            "ensures": [{"kind": "entity_creation", "entity": "Node", "fields": {}}]
        }]
    }));
    let report = analyze_file(file.path(), &RuleFilter::all(), false).unwrap();
    let rule19: Vec<_> = report.errors.iter().filter(|f| f.rule == "RULE-19").collect();
    assert_eq!(rule19.len(), 1);
}

#[test]
fn trigger_signature_clash_reports_single_rule_06_at_position_0() {
    let file = document(serde_json::json!({
        "version": "1",
        "file": "t.allium",
        "rules": [
            {
                "name": "LoginA",
                "trigger": {"kind": "external_stimulus", "name": "login", "parameters": [{"name": "user"}]},
                "ensures": []
            },
            {
                "name": "LoginB",
                "trigger": {"kind": "external_stimulus", "name": "login", "parameters": [{"name": "owner"}]},
                "ensures": []
            }
        ]
    }));
    let report = analyze_file(file.path(), &RuleFilter::all(), false).unwrap();
    let rule06: Vec<_> = report.errors.iter().filter(|f| f.rule == "RULE-06").collect();
    assert_eq!(rule06.len(), 1);
    assert!(rule06[0].message.contains('0'));
}

#[test]
fn findings_have_non_empty_rule_and_matching_location_file() {
    let file = document(serde_json::json!({
        "version": "1",
        "file": "t.allium",
        "entities": [{
            "name": "A",
            "fields": [{"name": "owner", "type": {"kind": "entity_ref", "entity_name": "Missing"}}]
        }]
    }));
    let report = analyze_file(file.path(), &RuleFilter::all(), false).unwrap();
    assert!(!report.errors.is_empty());
    for finding in report.errors.iter().chain(report.warnings.iter()) {
        assert!(!finding.rule.is_empty());
        assert_eq!(finding.location.file, report.file);
    }
}

#[test]
fn running_analysis_twice_is_deterministic() {
    let file = document(serde_json::json!({
        "version": "1",
        "file": "t.allium",
        "entities": [{
            "name": "A",
            "fields": [
                {"name": "owner", "type": {"kind": "entity_ref", "entity_name": "Missing"}},
                {"name": "friend", "type": {"kind": "entity_ref", "entity_name": "AlsoMissing"}}
            ]
        }]
    }));
    let first = analyze_file(file.path(), &RuleFilter::all(), false).unwrap();
    let second = analyze_file(file.path(), &RuleFilter::all(), false).unwrap();
    assert_eq!(first, second);
}

#[test]
fn report_round_trips_through_json() {
    let file = document(serde_json::json!({
        "version": "1",
        "file": "t.allium",
        "entities": [{
            "name": "A",
            "fields": [{"name": "owner", "type": {"kind": "entity_ref", "entity_name": "Missing"}}]
        }]
    }));
    let report = analyze_file(file.path(), &RuleFilter::all(), false).unwrap();
    let json = serde_json::to_value(&report).unwrap();
    let back: allium_lint::Report = serde_json::from_value(json).unwrap();
    assert_eq!(report, back);
}
