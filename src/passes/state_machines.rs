//! Reachability and dead-end analysis of enum-valued lifecycle fields:
//! R-07, R-08, R-09.

use std::collections::{HashSet, VecDeque};

use indexmap::IndexMap;

use crate::ast::*;
use crate::finding::{Finding, Location};
use crate::passes::Pass;
use crate::path::Path;
use crate::symbol_table::SymbolTable;

pub struct StateMachinesPass;

impl Pass for StateMachinesPass {
    fn name(&self) -> &'static str {
        "state_machines"
    }

    fn rule_numbers(&self) -> &'static [&'static str] {
        &["RULE-07", "RULE-08", "RULE-09"]
    }

    fn run(&self, spec: &Spec, symbols: &SymbolTable) -> Vec<Finding> {
        let mut findings = Vec::new();
        let file = spec.file.as_str();

        for (i, entity) in spec.entities.iter().enumerate() {
            let Some((field_index, values)) = status_field(entity, symbols) else {
                continue;
            };
            let entity_path = Path::root().field("entities").index(i).field("fields").index(field_index);

            let creation_values = collect_creation_values(spec, &entity.name, &entity.fields[field_index].name);
            let (transitions, r09) = collect_transitions(spec, &entity.name, &entity.fields[field_index].name, &values, file);
            findings.extend(r09);

            let reachable = bfs_reachable(&creation_values, &transitions);

            for value in &values {
                if !reachable.contains(value) {
                    findings.push(Finding::error(
                        "RULE-07",
                        format!("entity '{}' status value '{value}' is unreachable", entity.name),
                        Location::new(file, entity_path.as_str()),
                    ));
                }
            }
            for value in &values {
                if reachable.contains(value)
                    && !creation_values.contains(value)
                    && transitions.get(value).map_or(true, |out| out.is_empty())
                {
                    findings.push(Finding::error(
                        "RULE-08",
                        format!("entity '{}' status value '{value}' is a reachable dead end", entity.name),
                        Location::new(file, entity_path.as_str()),
                    ));
                }
            }
        }

        findings
    }
}

fn status_field(entity: &Entity, symbols: &SymbolTable) -> Option<(usize, Vec<String>)> {
    for (i, field) in entity.fields.iter().enumerate() {
        match &field.field_type {
            FieldType::InlineEnum { values } => return Some((i, values.clone())),
            FieldType::NamedEnum { name } => {
                if let Some(enumeration) = symbols.enumeration(name) {
                    return Some((i, enumeration.values.clone()));
                }
            }
            _ => {}
        }
    }
    None
}

fn collect_creation_values(spec: &Spec, entity_name: &str, field_name: &str) -> HashSet<String> {
    let mut values = HashSet::new();
    for rule in &spec.rules {
        let mut creations = Vec::new();
        walk_entity_creations(&rule.ensures, &mut creations);
        for creation in creations {
            if creation.entity != entity_name {
                continue;
            }
            if let Some(expr) = creation.fields.get(field_name) {
                if let Some(value) = literal_string(expr) {
                    values.insert(value);
                }
            }
        }
    }
    values
}

fn walk_entity_creations<'a>(clauses: &'a [EnsuresClause], out: &mut Vec<&'a EntityCreationClause>) {
    for clause in clauses {
        match clause {
            EnsuresClause::EntityCreation(creation) => out.push(creation),
            EnsuresClause::Conditional {
                then_branch,
                else_branch,
                ..
            } => {
                walk_entity_creations(then_branch, out);
                walk_entity_creations(else_branch, out);
            }
            EnsuresClause::Iteration { body, .. } => walk_entity_creations(body, out),
            EnsuresClause::LetBinding { value, body, .. } => {
                if let Value::EntityCreation(creation) = value {
                    out.push(creation);
                }
                walk_entity_creations(body, out);
            }
            _ => {}
        }
    }
}

fn literal_string(expr: &Expression) -> Option<String> {
    match expr {
        Expression::Literal { value, .. } => value.as_str().map(|s| s.to_string()),
        _ => None,
    }
}

fn value_literal_string(value: &Value) -> Option<String> {
    match value {
        Value::Expression(expr) => literal_string(expr),
        Value::EntityCreation(_) => None,
    }
}

/// `(field_name, confirmed_entity)` for a `state_change.target` that
/// addresses either a root status field or a one-level binding chain; any
/// other shape does not describe a status-field write.
fn classify_target(target: &Expression, rule: &Rule) -> Option<(String, Option<String>)> {
    match target {
        Expression::FieldAccess { object: None, field } => {
            Some((field.clone(), rule.trigger.entity().map(|e| e.to_string())))
        }
        Expression::FieldAccess {
            object: Some(inner),
            field,
        } => match inner.as_ref() {
            Expression::FieldAccess {
                object: None,
                field: binding_name,
            } => {
                let resolved = if rule.trigger.binding() == Some(binding_name.as_str()) {
                    rule.trigger.entity().map(|e| e.to_string())
                } else {
                    rule.let_bindings.iter().find(|lb| &lb.name == binding_name).and_then(|lb| {
                        if let Expression::JoinLookup { entity, .. } = &lb.expression {
                            Some(entity.clone())
                        } else {
                            None
                        }
                    })
                };
                Some((field.clone(), resolved))
            }
            _ => None,
        },
        _ => None,
    }
}

fn walk_state_changes<'a>(clauses: &'a [EnsuresClause], base: &Path, out: &mut Vec<(&'a Expression, &'a Value, Path)>) {
    for (i, clause) in clauses.iter().enumerate() {
        let p = base.index(i);
        match clause {
            EnsuresClause::StateChange { target, value } => out.push((target, value, p)),
            EnsuresClause::Conditional {
                then_branch,
                else_branch,
                ..
            } => {
                walk_state_changes(then_branch, &p.field("then"), out);
                walk_state_changes(else_branch, &p.field("else"), out);
            }
            EnsuresClause::Iteration { body, .. } => walk_state_changes(body, &p.field("body"), out),
            EnsuresClause::LetBinding { body, .. } => walk_state_changes(body, &p.field("body"), out),
            _ => {}
        }
    }
}

type Transitions = IndexMap<String, HashSet<String>>;

fn collect_transitions(
    spec: &Spec,
    entity_name: &str,
    field_name: &str,
    values: &[String],
    file: &str,
) -> (Transitions, Vec<Finding>) {
    let mut transitions: Transitions = IndexMap::new();
    let mut findings = Vec::new();

    for (i, rule) in spec.rules.iter().enumerate() {
        let base = Path::root().field("rules").index(i).field("ensures");
        let mut occurrences = Vec::new();
        walk_state_changes(&rule.ensures, &base, &mut occurrences);

        for (target, value, path) in occurrences {
            let Some((target_field, confirmed_entity)) = classify_target(target, rule) else {
                continue;
            };
            if target_field != field_name {
                continue;
            }
            let Some(to_value) = value_literal_string(value) else {
                continue;
            };
            let confirmed = confirmed_entity.as_deref() == Some(entity_name);
            if confirmed && !values.contains(&to_value) {
                findings.push(Finding::error(
                    "RULE-09",
                    format!("rule '{}' transitions '{entity_name}.{field_name}' to undeclared value '{to_value}'", rule.name),
                    Location::new(file, path.field("value").as_str()),
                ));
            }
            for from in values {
                transitions.entry(from.clone()).or_default().insert(to_value.clone());
            }
        }
    }

    (transitions, findings)
}

fn bfs_reachable(creation_values: &HashSet<String>, transitions: &Transitions) -> HashSet<String> {
    let mut visited: HashSet<String> = creation_values.clone();
    let mut queue: VecDeque<String> = creation_values.iter().cloned().collect();
    while let Some(current) = queue.pop_front() {
        if let Some(outgoing) = transitions.get(&current) {
            for next in outgoing {
                if visited.insert(next.clone()) {
                    queue.push_back(next.clone());
                }
            }
        }
    }
    visited
}
