//! Surface binding hygiene and collection-typed `for_each` checks: R-29,
//! R-32, R-34.

use std::collections::{HashMap, HashSet};

use crate::ast::*;
use crate::finding::{Finding, Location};
use crate::passes::Pass;
use crate::path::Path;
use crate::symbol_table::SymbolTable;
use crate::walk::collect_root_field_accesses;

pub struct SurfacesPass;

impl Pass for SurfacesPass {
    fn name(&self) -> &'static str {
        "surfaces"
    }

    fn rule_numbers(&self) -> &'static [&'static str] {
        &["RULE-29", "RULE-32", "RULE-34"]
    }

    fn run(&self, spec: &Spec, symbols: &SymbolTable) -> Vec<Finding> {
        let mut findings = Vec::new();
        let file = spec.file.as_str();

        for (i, surface) in spec.surfaces.iter().enumerate() {
            let surface_path = Path::root().field("surfaces").index(i);
            let bindings = declared_bindings(surface);
            let used = used_bindings(surface);

            for (j, exposes) in surface.exposes.iter().enumerate() {
                if let Some(root) = root_of_chain(&exposes.expression) {
                    if !bindings.contains(root) {
                        findings.push(Finding::error(
                            "RULE-29",
                            format!("exposes expression roots at '{root}', which is not a declared binding"),
                            Location::new(file, surface_path.field("exposes").index(j).field("expression").as_str()),
                        ));
                    }
                }
            }

            if !used.contains(surface.facing.binding.as_str()) {
                findings.push(Finding::error(
                    "RULE-32",
                    format!("facing binding '{}' is never used", surface.facing.binding),
                    Location::new(file, surface_path.field("facing").field("binding").as_str()),
                ));
            }
            if let Some(context) = &surface.context {
                if !used.contains(context.binding.as_str()) {
                    findings.push(Finding::error(
                        "RULE-32",
                        format!("context binding '{}' is never used", context.binding),
                        Location::new(file, surface_path.field("context").field("binding").as_str()),
                    ));
                }
            }

            let binding_types = binding_types(surface);
            check_for_each(&surface.provides, &binding_types, symbols, file, &surface_path.field("provides"), &mut findings);
        }

        findings
    }
}

fn declared_bindings(surface: &Surface) -> HashSet<&str> {
    let mut bindings = HashSet::new();
    bindings.insert(surface.facing.binding.as_str());
    if let Some(context) = &surface.context {
        bindings.insert(context.binding.as_str());
    }
    bindings.extend(surface.let_bindings.iter().map(|lb| lb.name.as_str()));
    bindings
}

fn used_bindings(surface: &Surface) -> HashSet<&str> {
    let mut used = HashSet::new();
    for exposes in &surface.exposes {
        used.extend(collect_root_field_accesses(&exposes.expression));
        if let Some(when) = &exposes.when {
            used.extend(collect_root_field_accesses(when));
        }
    }
    for provides in &surface.provides {
        collect_provides_roots(provides, &mut used);
    }
    for related in &surface.related {
        used.extend(collect_root_field_accesses(&related.context_expression));
        if let Some(when) = &related.when {
            used.extend(collect_root_field_accesses(when));
        }
    }
    for timeout in &surface.timeout {
        if let Some(when) = &timeout.when {
            used.extend(collect_root_field_accesses(when));
        }
    }
    for lb in &surface.let_bindings {
        used.extend(collect_root_field_accesses(&lb.expression));
    }
    used
}

fn collect_provides_roots<'a>(clause: &'a ProvidesClause, out: &mut HashSet<&'a str>) {
    match clause {
        ProvidesClause::Action { arguments, when, .. } => {
            for value in arguments.values() {
                out.extend(collect_root_field_accesses(value));
            }
            if let Some(when) = when {
                out.extend(collect_root_field_accesses(when));
            }
        }
        ProvidesClause::ForEach { collection, items, .. } => {
            out.extend(collect_root_field_accesses(collection));
            for item in items {
                collect_provides_roots(item, out);
            }
        }
    }
}

/// The root name of a `field_access` chain, or `None` for any other
/// expression shape (R-29 only constrains chains, per the source note).
fn root_of_chain(expr: &Expression) -> Option<&str> {
    match expr {
        Expression::FieldAccess { object: None, field } => Some(field.as_str()),
        Expression::FieldAccess { object: Some(object), .. } => root_of_chain(object),
        _ => None,
    }
}

/// Maps a surface's declared bindings (`facing`, `context`, and any
/// let-binding resolved via a `join_lookup`) to the entity/variant type
/// they're bound to, for resolving a `for_each` chain root to a type.
fn binding_types(surface: &Surface) -> HashMap<String, String> {
    let mut types = HashMap::new();
    types.insert(surface.facing.binding.clone(), surface.facing.facing_type.clone());
    if let Some(context) = &surface.context {
        types.insert(context.binding.clone(), context.context_type.clone());
    }
    for lb in &surface.let_bindings {
        if let Expression::JoinLookup { entity, .. } = &lb.expression {
            types.insert(lb.name.clone(), entity.clone());
        }
    }
    types
}

fn check_for_each(
    clauses: &[ProvidesClause],
    bindings: &HashMap<String, String>,
    symbols: &SymbolTable,
    file: &str,
    base: &Path,
    findings: &mut Vec<Finding>,
) {
    for (i, clause) in clauses.iter().enumerate() {
        let p = base.index(i);
        match clause {
            ProvidesClause::ForEach { binding, collection, items } => {
                let mut inner = bindings.clone();
                if let Expression::FieldAccess {
                    object: Some(object),
                    field,
                } = collection
                {
                    if let Expression::FieldAccess { object: None, field: root } = object.as_ref() {
                        if let Some(entity_name) = bindings.get(root) {
                            if !is_collection_field(symbols, entity_name, field) {
                                findings.push(Finding::error(
                                    "RULE-34",
                                    format!("for_each collection '{root}.{field}' is not a set/list field or many-cardinality relationship"),
                                    Location::new(file, p.field("collection").as_str()),
                                ));
                            } else if let Some(element_type) = element_entity_type(symbols, entity_name, field) {
                                inner.insert(binding.clone(), element_type);
                            }
                        }
                    }
                }
                check_for_each(items, &inner, symbols, file, &p.field("items"), findings);
            }
            ProvidesClause::Action { .. } => {}
        }
    }
}

fn is_collection_field(symbols: &SymbolTable, entity_name: &str, field_name: &str) -> bool {
    if let Some(fields) = symbols.fields_of(entity_name) {
        if let Some(field) = fields.iter().find(|f| f.name == field_name) {
            return matches!(field.field_type, FieldType::Set { .. } | FieldType::List { .. });
        }
    }
    if let Some(entity) = symbols.entity(entity_name) {
        if entity
            .relationships
            .iter()
            .any(|r| r.name == field_name && r.cardinality == Cardinality::Many)
        {
            return true;
        }
    }
    false
}

/// The entity/variant type of the elements a collection-typed field or
/// many-cardinality relationship yields, when that's an entity reference
/// rather than a primitive — used to extend `bindings` for nested
/// `for_each` recursion.
fn element_entity_type(symbols: &SymbolTable, entity_name: &str, field_name: &str) -> Option<String> {
    if let Some(fields) = symbols.fields_of(entity_name) {
        if let Some(field) = fields.iter().find(|f| f.name == field_name) {
            if let FieldType::Set { element } | FieldType::List { element } = &field.field_type {
                if let FieldType::EntityRef { entity_name } = element.as_ref() {
                    return Some(entity_name.clone());
                }
            }
        }
    }
    if let Some(entity) = symbols.entity(entity_name) {
        if let Some(rel) = entity
            .relationships
            .iter()
            .find(|r| r.name == field_name && r.cardinality == Cardinality::Many)
        {
            return Some(rel.target_entity.clone());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_from(json: serde_json::Value) -> Spec {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn unused_facing_binding_is_flagged() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "surfaces": [{
                "name": "Dashboard",
                "facing": {"binding": "user", "type": "Customer"},
                "exposes": [{"expression": {"kind": "literal", "type": "integer", "value": 1}}]
            }]
        }));
        let table = SymbolTable::build(&spec);
        let findings = SurfacesPass.run(&spec, &table);
        assert!(findings.iter().any(|f| f.rule == "RULE-32"));
    }

    #[test]
    fn exposes_root_outside_bindings_is_flagged() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "surfaces": [{
                "name": "Dashboard",
                "facing": {"binding": "user", "type": "Customer"},
                "exposes": [{"expression": {"kind": "field_access", "object": null, "field": "stray"}}]
            }]
        }));
        let table = SymbolTable::build(&spec);
        let findings = SurfacesPass.run(&spec, &table);
        assert!(findings.iter().any(|f| f.rule == "RULE-29"));
    }

    #[test]
    fn for_each_over_scalar_field_is_flagged() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "entities": [{"name": "Order", "fields": [{"name": "total", "type": {"kind": "primitive", "name": "Integer"}}]}],
            "surfaces": [{
                "name": "Dashboard",
                "facing": {"binding": "order", "type": "Order"},
                "exposes": [{"expression": {"kind": "field_access", "object": null, "field": "order"}}],
                "provides": [{"kind": "for_each", "binding": "x", "collection": {"kind": "field_access", "object": {"kind": "field_access", "object": null, "field": "order"}, "field": "total"}, "items": []}]
            }]
        }));
        let table = SymbolTable::build(&spec);
        let findings = SurfacesPass.run(&spec, &table);
        assert!(findings.iter().any(|f| f.rule == "RULE-34"));
    }

    #[test]
    fn for_each_over_set_field_is_not_flagged() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "entities": [{
                "name": "Order",
                "fields": [{"name": "tags", "type": {"kind": "set", "element": {"kind": "primitive", "name": "String"}}}]
            }],
            "surfaces": [{
                "name": "Dashboard",
                "facing": {"binding": "order", "type": "Order"},
                "exposes": [{"expression": {"kind": "field_access", "object": null, "field": "order"}}],
                "provides": [{"kind": "for_each", "binding": "x", "collection": {"kind": "field_access", "object": {"kind": "field_access", "object": null, "field": "order"}, "field": "tags"}, "items": []}]
            }]
        }));
        let table = SymbolTable::build(&spec);
        let findings = SurfacesPass.run(&spec, &table);
        assert!(!findings.iter().any(|f| f.rule == "RULE-34"));
    }

    #[test]
    fn for_each_resolves_variant_binding_fields() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "entities": [{
                "name": "Payment",
                "fields": [{"name": "kind", "type": {"kind": "inline_enum", "values": ["card_payment"]}}]
            }],
            "variants": [{
                "name": "CardPayment",
                "base_entity": "Payment",
                "fields": [{"name": "installments", "type": {"kind": "list", "element": {"kind": "primitive", "name": "Integer"}}}]
            }],
            "surfaces": [{
                "name": "Checkout",
                "facing": {"binding": "payment", "type": "CardPayment"},
                "exposes": [{"expression": {"kind": "field_access", "object": null, "field": "payment"}}],
                "provides": [{"kind": "for_each", "binding": "n", "collection": {"kind": "field_access", "object": {"kind": "field_access", "object": null, "field": "payment"}, "field": "installments"}, "items": []}]
            }]
        }));
        let table = SymbolTable::build(&spec);
        let findings = SurfacesPass.run(&spec, &table);
        assert!(!findings.iter().any(|f| f.rule == "RULE-34"));
    }
}
