//! Advisory diagnostics: W-01 through W-19, all emitted at warning
//! severity. W-07, W-08, W-10, W-11, W-13 are documented stubs that never
//! emit, matching the source material's own scoping note.

use std::collections::{HashMap, HashSet};

use crate::ast::*;
use crate::finding::{Finding, Location};
use crate::passes::Pass;
use crate::path::Path;
use crate::symbol_table::SymbolTable;

pub struct WarningsPass;

impl Pass for WarningsPass {
    fn name(&self) -> &'static str {
        "warnings"
    }

    fn rule_numbers(&self) -> &'static [&'static str] {
        &[
            "WARN-01", "WARN-02", "WARN-03", "WARN-04", "WARN-05", "WARN-06", "WARN-09", "WARN-12", "WARN-14",
            "WARN-15", "WARN-16", "WARN-17", "WARN-18", "WARN-19",
        ]
    }

    fn run(&self, spec: &Spec, symbols: &SymbolTable) -> Vec<Finding> {
        let mut findings = Vec::new();
        let file = spec.file.as_str();

        check_w01(spec, file, &mut findings);
        check_w02(spec, file, &mut findings);
        check_w03(spec, file, &mut findings);
        check_w04(spec, file, &mut findings);
        check_w05(spec, file, &mut findings);
        check_w06(spec, file, &mut findings);
        check_w09(spec, file, &mut findings);
        check_w12(spec, file, &mut findings);
        check_w14(spec, file, &mut findings);
        check_w15(spec, file, &mut findings);
        check_w16(spec, symbols, file, &mut findings);
        check_w17(spec, symbols, file, &mut findings);
        check_w18(spec, file, &mut findings);
        check_w19(spec, file, &mut findings);

        findings
    }
}

fn check_w01(spec: &Spec, file: &str, findings: &mut Vec<Finding>) {
    if spec.use_declarations.is_empty() {
        for (i, entity) in spec.external_entities.iter().enumerate() {
            findings.push(Finding::warning(
                "WARN-01",
                format!("external entity '{}' is declared but the document has no use_declarations", entity.name),
                Location::new(file, Path::root().field("external_entities").index(i).as_str()),
            ));
        }
    }
}

fn check_w02(spec: &Spec, file: &str, findings: &mut Vec<Finding>) {
    if !spec.open_questions.is_empty() {
        findings.push(Finding::warning(
            "WARN-02",
            format!("{} open question(s) remain unresolved", spec.open_questions.len()),
            Location::new(file, Path::root().field("open_questions").as_str()),
        ));
    }
}

fn check_w03(spec: &Spec, file: &str, findings: &mut Vec<Finding>) {
    for (i, deferred) in spec.deferred.iter().enumerate() {
        let empty = match &deferred.location_hint {
            None => true,
            Some(hint) => hint.is_empty(),
        };
        if empty {
            findings.push(Finding::warning(
                "WARN-03",
                format!("deferred item '{}' has no location hint", deferred.name),
                Location::new(file, Path::root().field("deferred").index(i).as_str()),
            ));
        }
    }
}

fn field_type_entity_refs<'a>(ft: &'a FieldType, out: &mut HashSet<&'a str>) {
    match ft {
        FieldType::EntityRef { entity_name } => {
            out.insert(entity_name.as_str());
        }
        FieldType::Optional { inner } | FieldType::Set { element: inner } | FieldType::List { element: inner } => {
            field_type_entity_refs(inner, out);
        }
        _ => {}
    }
}

fn entity_creation_names<'a>(clauses: &'a [EnsuresClause], out: &mut HashSet<&'a str>) {
    for clause in clauses {
        match clause {
            EnsuresClause::EntityCreation(creation) => {
                out.insert(creation.entity.as_str());
            }
            EnsuresClause::Conditional { then_branch, else_branch, .. } => {
                entity_creation_names(then_branch, out);
                entity_creation_names(else_branch, out);
            }
            EnsuresClause::Iteration { body, .. } => entity_creation_names(body, out),
            EnsuresClause::LetBinding { value, body, .. } => {
                if let Value::EntityCreation(creation) = value {
                    out.insert(creation.entity.as_str());
                }
                entity_creation_names(body, out);
            }
            _ => {}
        }
    }
}

fn referenced_entities(spec: &Spec) -> HashSet<&str> {
    let mut refs = HashSet::new();

    let all_fields = spec
        .entities
        .iter()
        .flat_map(|e| &e.fields)
        .chain(spec.external_entities.iter().flat_map(|e| &e.fields))
        .chain(spec.value_types.iter().flat_map(|v| &v.fields))
        .chain(spec.variants.iter().flat_map(|v| &v.fields));
    for field in all_fields {
        field_type_entity_refs(&field.field_type, &mut refs);
    }

    for entity in &spec.entities {
        for relationship in &entity.relationships {
            refs.insert(relationship.target_entity.as_str());
        }
    }
    for variant in &spec.variants {
        refs.insert(variant.base_entity.as_str());
    }
    for given in &spec.given {
        field_type_entity_refs(&given.binding_type, &mut refs);
    }
    for config in &spec.config {
        field_type_entity_refs(&config.param_type, &mut refs);
    }
    for default in &spec.defaults {
        refs.insert(default.entity.as_str());
    }
    for rule in &spec.rules {
        if let Some(entity) = rule.trigger.entity() {
            refs.insert(entity);
        }
        entity_creation_names(&rule.ensures, &mut refs);
    }
    for surface in &spec.surfaces {
        refs.insert(surface.facing.facing_type.as_str());
        if let Some(context) = &surface.context {
            refs.insert(context.context_type.as_str());
        }
    }
    for actor in &spec.actors {
        refs.insert(actor.identified_by.entity.as_str());
    }

    refs
}

fn check_w04(spec: &Spec, file: &str, findings: &mut Vec<Finding>) {
    let refs = referenced_entities(spec);
    for (i, entity) in spec.entities.iter().enumerate() {
        if !refs.contains(entity.name.as_str()) {
            findings.push(Finding::warning(
                "WARN-04",
                format!("entity '{}' is never referenced", entity.name),
                Location::new(file, Path::root().field("entities").index(i).as_str()),
            ));
        }
    }
}

fn literal_scalar(expr: &Expression) -> Option<String> {
    match expr {
        Expression::Literal { value, .. } => Some(value.to_string()),
        _ => None,
    }
}

fn check_w05(spec: &Spec, file: &str, findings: &mut Vec<Finding>) {
    for (i, rule) in spec.rules.iter().enumerate() {
        let mut seen: HashMap<&str, String> = HashMap::new();
        for req in &rule.requires {
            if let Expression::Comparison {
                op: ComparisonOp::Eq,
                left,
                right,
            } = req
            {
                if let (Expression::FieldAccess { object: None, field }, Some(value)) = (left.as_ref(), literal_scalar(right)) {
                    if let Some(prior) = seen.get(field.as_str()) {
                        if *prior != value {
                            findings.push(Finding::warning(
                                "WARN-05",
                                format!("rule '{}' requires '{field}' to equal two different literal values", rule.name),
                                Location::new(file, Path::root().field("rules").index(i).field("requires").as_str()),
                            ));
                        }
                    } else {
                        seen.insert(field.as_str(), value);
                    }
                }
            }
        }
    }
}

fn check_w06(spec: &Spec, file: &str, findings: &mut Vec<Finding>) {
    for (i, rule) in spec.rules.iter().enumerate() {
        if matches!(rule.trigger, Trigger::Temporal { .. }) && rule.requires.is_empty() {
            findings.push(Finding::warning(
                "WARN-06",
                format!("temporal rule '{}' has no requires", rule.name),
                Location::new(file, Path::root().field("rules").index(i).field("trigger").as_str()),
            ));
        }
    }
}

fn check_w09(spec: &Spec, file: &str, findings: &mut Vec<Finding>) {
    let facing_types: HashSet<&str> = spec.surfaces.iter().map(|s| s.facing.facing_type.as_str()).collect();
    for (i, actor) in spec.actors.iter().enumerate() {
        if !facing_types.contains(actor.name.as_str()) {
            findings.push(Finding::warning(
                "WARN-09",
                format!("actor '{}' is not any surface's facing type", actor.name),
                Location::new(file, Path::root().field("actors").index(i).as_str()),
            ));
        }
    }
}

fn check_w12(spec: &Spec, file: &str, findings: &mut Vec<Finding>) {
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
        let empty_requires = indices.iter().filter(|&&i| spec.rules[i].requires.is_empty()).count();
        if empty_requires >= 2 {
            findings.push(Finding::warning(
                "WARN-12",
                format!("trigger '{trigger_name}' is shared by {empty_requires} rules with empty requires"),
                Location::new(file, Path::root().field("rules").index(indices[0]).field("trigger").as_str()),
            ));
        }
    }
}

fn check_w14(spec: &Spec, file: &str, findings: &mut Vec<Finding>) {
    for (i, actor) in spec.actors.iter().enumerate() {
        if let Expression::Literal {
            literal_type: LiteralType::Boolean,
            ..
        } = &actor.identified_by.condition
        {
            findings.push(Finding::warning(
                "WARN-14",
                format!("actor '{}' is identified by a constant boolean condition", actor.name),
                Location::new(file, Path::root().field("actors").index(i).field("identified_by").field("condition").as_str()),
            ));
        }
    }
}

fn check_w15(spec: &Spec, file: &str, findings: &mut Vec<Finding>) {
    for (i, rule) in spec.rules.iter().enumerate() {
        if rule.ensures.is_empty() {
            continue;
        }
        let all_conditional = rule.ensures.iter().all(|c| matches!(c, EnsuresClause::Conditional { .. }));
        let any_empty_else = rule.ensures.iter().any(|c| matches!(c, EnsuresClause::Conditional { else_branch, .. } if else_branch.is_empty()));
        if all_conditional && any_empty_else {
            findings.push(Finding::warning(
                "WARN-15",
                format!("rule '{}' ensures only conditionals, at least one with an empty else", rule.name),
                Location::new(file, Path::root().field("rules").index(i).field("ensures").as_str()),
            ));
        }
    }
}

fn is_optional(ft: &FieldType) -> bool {
    matches!(ft, FieldType::Optional { .. })
}

fn check_w16(spec: &Spec, symbols: &SymbolTable, file: &str, findings: &mut Vec<Finding>) {
    for (i, rule) in spec.rules.iter().enumerate() {
        let Trigger::Temporal { entity, binding, field, condition } = &rule.trigger else {
            continue;
        };
        let mut flagged = false;
        if let Some(field_name) = field {
            if symbols
                .fields_of(entity)
                .and_then(|fields| fields.iter().find(|f| &f.name == field_name))
                .is_some_and(|f| is_optional(&f.field_type))
            {
                flagged = true;
            }
        }
        if !flagged {
            if let Some(condition) = condition {
                flagged = condition_accesses_optional_field(condition, binding, entity, symbols);
            }
        }
        if flagged {
            findings.push(Finding::warning(
                "WARN-16",
                format!("temporal trigger on rule '{}' reads an optional field without a null guard", rule.name),
                Location::new(file, Path::root().field("rules").index(i).field("trigger").as_str()),
            ));
        }
    }
}

fn condition_accesses_optional_field(expr: &Expression, binding: &str, entity: &str, symbols: &SymbolTable) -> bool {
    match expr {
        Expression::FieldAccess { object: Some(object), field } => {
            if let Expression::FieldAccess { object: None, field: root } = object.as_ref() {
                if root == binding {
                    return symbols
                        .fields_of(entity)
                        .and_then(|fields| fields.iter().find(|f| &f.name == field))
                        .is_some_and(|f| is_optional(&f.field_type));
                }
            }
            condition_accesses_optional_field(object, binding, entity, symbols)
        }
        Expression::Comparison { left, right, .. }
        | Expression::Arithmetic { left, right, .. }
        | Expression::BooleanLogic { left, right, .. }
        | Expression::NullCoalesce { left, right, .. } => {
            condition_accesses_optional_field(left, binding, entity, symbols)
                || condition_accesses_optional_field(right, binding, entity, symbols)
        }
        Expression::Not { operand } => condition_accesses_optional_field(operand, binding, entity, symbols),
        _ => false,
    }
}

fn check_w17(spec: &Spec, symbols: &SymbolTable, file: &str, findings: &mut Vec<Finding>) {
    for (i, surface) in spec.surfaces.iter().enumerate() {
        if symbols.entity(&surface.facing.facing_type).is_none() {
            continue;
        }
        if spec.actors.iter().any(|a| a.identified_by.entity == surface.facing.facing_type) {
            findings.push(Finding::warning(
                "WARN-17",
                format!("surface '{}' faces entity '{}', which also identifies an actor", surface.name, surface.facing.facing_type),
                Location::new(file, Path::root().field("surfaces").index(i).field("facing").as_str()),
            ));
        }
    }
}

fn check_w18(spec: &Spec, file: &str, findings: &mut Vec<Finding>) {
    let mut values_by_entity_field: HashMap<(String, String), HashSet<String>> = HashMap::new();
    for rule in &spec.rules {
        collect_creation_field_values(&rule.ensures, &mut values_by_entity_field);
    }

    for (i, rule) in spec.rules.iter().enumerate() {
        if let Trigger::StateTransition { entity, field, to_value, .. } = &rule.trigger {
            if let Some(values) = values_by_entity_field.get(&(entity.clone(), field.clone())) {
                if values.contains(to_value) {
                    findings.push(Finding::warning(
                        "WARN-18",
                        format!("state_transition to '{to_value}' duplicates a value already assigned at creation for '{entity}.{field}'"),
                        Location::new(file, Path::root().field("rules").index(i).field("trigger").field("to_value").as_str()),
                    ));
                }
            }
        }
    }
}

fn collect_creation_field_values(clauses: &[EnsuresClause], out: &mut HashMap<(String, String), HashSet<String>>) {
    for clause in clauses {
        match clause {
            EnsuresClause::EntityCreation(creation) => {
                for (field, expr) in &creation.fields {
                    if let Expression::Literal { value, .. } = expr {
                        if let Some(s) = value.as_str() {
                            out.entry((creation.entity.clone(), field.clone())).or_default().insert(s.to_string());
                        }
                    }
                }
            }
            EnsuresClause::Conditional { then_branch, else_branch, .. } => {
                collect_creation_field_values(then_branch, out);
                collect_creation_field_values(else_branch, out);
            }
            EnsuresClause::Iteration { body, .. } => collect_creation_field_values(body, out),
            EnsuresClause::LetBinding { body, .. } => collect_creation_field_values(body, out),
            _ => {}
        }
    }
}

fn check_w19(spec: &Spec, file: &str, findings: &mut Vec<Finding>) {
    for (i, entity) in spec.entities.iter().enumerate() {
        let mut seen: HashMap<Vec<String>, usize> = HashMap::new();
        for (j, field) in entity.fields.iter().enumerate() {
            if let FieldType::InlineEnum { values } = &field.field_type {
                let mut sorted = values.clone();
                sorted.sort();
                if let Some(&first) = seen.get(&sorted) {
                    findings.push(Finding::warning(
                        "WARN-19",
                        format!(
                            "entity '{}' fields '{}' and '{}' declare identical inline_enum value sets",
                            entity.name, entity.fields[first].name, field.name
                        ),
                        Location::new(file, Path::root().field("entities").index(i).field("fields").index(j).as_str()),
                    ));
                } else {
                    seen.insert(sorted, j);
                }
            }
        }
    }
}

// W-07, W-08, W-10, W-11, W-13 are out of scope; no emissions.

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_from(json: serde_json::Value) -> Spec {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn unreferenced_entity_triggers_w04() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "entities": [{"name": "Orphan", "fields": []}]
        }));
        let table = SymbolTable::build(&spec);
        let findings = WarningsPass.run(&spec, &table);
        assert!(findings.iter().any(|f| f.rule == "WARN-04"));
    }

    #[test]
    fn open_questions_triggers_w02() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "open_questions": ["what about refunds?"]
        }));
        let table = SymbolTable::build(&spec);
        let findings = WarningsPass.run(&spec, &table);
        assert!(findings.iter().any(|f| f.rule == "WARN-02"));
    }

    #[test]
    fn duplicate_enum_value_sets_trigger_w19() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "entities": [{
                "name": "Order",
                "fields": [
                    {"name": "status", "type": {"kind": "inline_enum", "values": ["a", "b"]}},
                    {"name": "mirror", "type": {"kind": "inline_enum", "values": ["b", "a"]}}
                ]
            }]
        }));
        let table = SymbolTable::build(&spec);
        let findings = WarningsPass.run(&spec, &table);
        assert!(findings.iter().any(|f| f.rule == "WARN-19"));
    }
}
