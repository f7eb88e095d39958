//! Duplicate declarations and trigger signature compatibility: R-06, R-23,
//! R-26.

use std::collections::HashMap;

use crate::ast::{Parameter, Spec};
use crate::finding::{Finding, Location};
use crate::passes::Pass;
use crate::path::Path;
use crate::symbol_table::SymbolTable;

pub struct UniquenessPass;

impl Pass for UniquenessPass {
    fn name(&self) -> &'static str {
        "uniqueness"
    }

    fn rule_numbers(&self) -> &'static [&'static str] {
        &["RULE-06", "RULE-23", "RULE-26"]
    }

    fn run(&self, spec: &Spec, _symbols: &SymbolTable) -> Vec<Finding> {
        let mut findings = Vec::new();
        let file = spec.file.as_str();

        check_trigger_signatures(spec, file, &mut findings);
        check_duplicate_names(
            spec.given.iter().map(|g| g.name.as_str()),
            "given",
            "RULE-23",
            file,
            &mut findings,
        );
        check_duplicate_names(
            spec.config.iter().map(|c| c.name.as_str()),
            "config",
            "RULE-26",
            file,
            &mut findings,
        );

        findings
    }
}

fn check_trigger_signatures(spec: &Spec, file: &str, findings: &mut Vec<Finding>) {
    let mut groups: HashMap<&str, Vec<usize>> = HashMap::new();
    for (i, rule) in spec.rules.iter().enumerate() {
        if let Some(name) = rule.trigger.shared_name() {
            groups.entry(name).or_default().push(i);
        }
    }

    for (trigger_name, indices) in groups {
        if indices.len() < 2 {
            continue;
        }
        let baseline: &[Parameter] = spec.rules[indices[0]].trigger.parameters();
        for &idx in &indices[1..] {
            let params = spec.rules[idx].trigger.parameters();
            if let Some(position) = first_mismatch(baseline, params) {
                findings.push(Finding::error(
                    "RULE-06",
                    format!(
                        "rule '{}' trigger '{trigger_name}' parameter list diverges from rule '{}' at position {position}",
                        spec.rules[idx].name, spec.rules[indices[0]].name
                    ),
                    Location::new(
                        file,
                        Path::root()
                            .field("rules")
                            .index(idx)
                            .field("trigger")
                            .field("parameters")
                            .index(position)
                            .as_str(),
                    ),
                ));
            }
        }
    }
}

fn first_mismatch(baseline: &[Parameter], other: &[Parameter]) -> Option<usize> {
    let max_len = baseline.len().max(other.len());
    for i in 0..max_len {
        match (baseline.get(i), other.get(i)) {
            (Some(a), Some(b)) if a.name == b.name => continue,
            _ => return Some(i),
        }
    }
    None
}

fn check_duplicate_names<'a>(
    names: impl Iterator<Item = &'a str>,
    collection: &str,
    rule: &'static str,
    file: &str,
    findings: &mut Vec<Finding>,
) {
    let mut first_seen: HashMap<&str, usize> = HashMap::new();
    for (i, name) in names.enumerate() {
        match first_seen.get(name) {
            Some(&first) => {
                findings.push(Finding::error(
                    rule,
                    format!("duplicate name '{name}' (first declared at index {first})"),
                    Location::new(file, Path::root().field(collection).index(i).field("name").as_str()),
                ));
            }
            None => {
                first_seen.insert(name, i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_from(json: serde_json::Value) -> Spec {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn trigger_signature_clash_cites_position_zero() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "rules": [
                {
                    "name": "LoginA",
                    "trigger": {"kind": "external_stimulus", "name": "login", "parameters": [{"name": "user", "optional": false}]},
                    "ensures": [{"kind": "trigger_emission", "name": "noop", "arguments": {}}]
                },
                {
                    "name": "LoginB",
                    "trigger": {"kind": "external_stimulus", "name": "login", "parameters": [{"name": "owner", "optional": false}]},
                    "ensures": [{"kind": "trigger_emission", "name": "noop", "arguments": {}}]
                }
            ]
        }));
        let table = SymbolTable::build(&spec);
        let findings = UniquenessPass.run(&spec, &table);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, "RULE-06");
        assert!(findings[0].location.path.ends_with("[0]"));
    }

    #[test]
    fn duplicate_given_binding_cites_first_index() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "given": [
                {"name": "admin", "type": {"kind": "primitive", "name": "String"}},
                {"name": "admin", "type": {"kind": "primitive", "name": "String"}}
            ]
        }));
        let table = SymbolTable::build(&spec);
        let findings = UniquenessPass.run(&spec, &table);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, "RULE-23");
        assert!(findings[0].message.contains("index 0"));
    }
}
