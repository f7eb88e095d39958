//! Name resolution: R-01, R-03, R-22, R-27, R-28, R-30, R-31, R-35.

use crate::ast::*;
use crate::finding::{Finding, Location};
use crate::passes::Pass;
use crate::path::Path;
use crate::symbol_table::SymbolTable;
use crate::walk::{EnsuresVisitor, ExprVisitor};

pub struct ReferencesPass;

impl Pass for ReferencesPass {
    fn name(&self) -> &'static str {
        "references"
    }

    fn rule_numbers(&self) -> &'static [&'static str] {
        &[
            "RULE-01", "RULE-03", "RULE-22", "RULE-27", "RULE-28", "RULE-30", "RULE-31", "RULE-35",
        ]
    }

    fn run(&self, spec: &Spec, symbols: &SymbolTable) -> Vec<Finding> {
        let mut findings = Vec::new();
        let file = spec.file.as_str();

        for (i, entity) in spec.entities.iter().enumerate() {
            let base = Path::root().field("entities").index(i);
            check_fields(&entity.fields, &base, "RULE-01", file, symbols, &mut findings);
            for (j, rel) in entity.relationships.iter().enumerate() {
                if !symbols.is_any_entity(&rel.target_entity) {
                    findings.push(Finding::error(
                        "RULE-03",
                        format!(
                            "relationship '{}' targets undeclared entity '{}'",
                            rel.name, rel.target_entity
                        ),
                        Location::new(file, base.field("relationships").index(j).field("target_entity").as_str()),
                    ));
                }
            }
        }

        for (i, entity) in spec.external_entities.iter().enumerate() {
            let base = Path::root().field("external_entities").index(i);
            check_fields(&entity.fields, &base, "RULE-01", file, symbols, &mut findings);
        }

        for (i, value_type) in spec.value_types.iter().enumerate() {
            let base = Path::root().field("value_types").index(i);
            check_fields(&value_type.fields, &base, "RULE-01", file, symbols, &mut findings);
        }

        for (i, variant) in spec.variants.iter().enumerate() {
            let base = Path::root().field("variants").index(i);
            check_fields(&variant.fields, &base, "RULE-01", file, symbols, &mut findings);
        }

        for (i, param) in spec.config.iter().enumerate() {
            let base = Path::root().field("config").index(i).field("type");
            check_field_type(&param.param_type, &base, "RULE-01", file, symbols, &mut findings);
        }

        for (i, given) in spec.given.iter().enumerate() {
            let base = Path::root().field("given").index(i).field("type");
            check_field_type(&given.binding_type, &base, "RULE-22", file, symbols, &mut findings);
        }

        check_config_references(spec, file, symbols, &mut findings);

        for (i, surface) in spec.surfaces.iter().enumerate() {
            let base = Path::root().field("surfaces").index(i);
            let facing_ok = symbols.entity(&surface.facing.facing_type).is_some()
                || symbols.actor(&surface.facing.facing_type).is_some();
            if !facing_ok {
                findings.push(Finding::error(
                    "RULE-28",
                    format!(
                        "surface '{}' faces undeclared entity or actor '{}'",
                        surface.name, surface.facing.facing_type
                    ),
                    Location::new(file, base.field("facing").field("type").as_str()),
                ));
            }
            if let Some(context) = &surface.context {
                if !symbols.is_any_entity(&context.context_type) {
                    findings.push(Finding::error(
                        "RULE-28",
                        format!(
                            "surface '{}' context references undeclared entity '{}'",
                            surface.name, context.context_type
                        ),
                        Location::new(file, base.field("context").field("type").as_str()),
                    ));
                }
            }

            for (j, provides) in surface.provides.iter().enumerate() {
                check_provides(
                    provides,
                    &base.field("provides").index(j),
                    &surface.name,
                    file,
                    symbols,
                    &mut findings,
                );
            }

            for (j, related) in surface.related.iter().enumerate() {
                if symbols.surface(&related.surface).is_none() {
                    findings.push(Finding::error(
                        "RULE-31",
                        format!(
                            "surface '{}' relates to undeclared surface '{}'",
                            surface.name, related.surface
                        ),
                        Location::new(file, base.field("related").index(j).field("surface").as_str()),
                    ));
                }
            }
        }

        for (i, use_decl) in spec.use_declarations.iter().enumerate() {
            if use_decl.coordinate.trim().is_empty() {
                findings.push(Finding::error(
                    "RULE-35",
                    format!("use declaration '{}' has an empty coordinate", use_decl.alias),
                    Location::new(file, Path::root().field("use_declarations").index(i).field("coordinate").as_str()),
                ));
            }
        }

        findings
    }
}

fn check_fields(
    fields: &[Field],
    base: &Path,
    rule: &'static str,
    file: &str,
    symbols: &SymbolTable,
    findings: &mut Vec<Finding>,
) {
    for (j, field) in fields.iter().enumerate() {
        let path = base.field("fields").index(j).field("type");
        check_field_type(&field.field_type, &path, rule, file, symbols, findings);
    }
}

fn check_field_type(
    field_type: &FieldType,
    path: &Path,
    rule: &'static str,
    file: &str,
    symbols: &SymbolTable,
    findings: &mut Vec<Finding>,
) {
    match field_type {
        FieldType::Primitive { .. } | FieldType::InlineEnum { .. } => {}
        FieldType::EntityRef { entity_name } => {
            if !symbols.is_any_entity(entity_name) {
                findings.push(Finding::error(
                    rule,
                    format!("reference to undeclared entity '{entity_name}'"),
                    Location::new(file, path.as_str()),
                ));
            }
        }
        FieldType::NamedEnum { name } => {
            if symbols.enumeration(name).is_none() {
                findings.push(Finding::error(
                    rule,
                    format!("reference to undeclared enumeration '{name}'"),
                    Location::new(file, path.as_str()),
                ));
            }
        }
        FieldType::Optional { inner } => {
            check_field_type(inner, &path.field("inner"), rule, file, symbols, findings);
        }
        FieldType::Set { element } | FieldType::List { element } => {
            check_field_type(element, &path.field("element"), rule, file, symbols, findings);
        }
    }
}

struct ConfigRefChecker<'s, 'a> {
    symbols: &'s SymbolTable<'a>,
    file: &'s str,
    path: Path,
    findings: Vec<Finding>,
}

impl<'s, 'a> ExprVisitor for ConfigRefChecker<'s, 'a> {
    fn visit_expr(&mut self, expr: &Expression) {
        if let Expression::FieldAccess {
            object: Some(object),
            field: param,
        } = expr
        {
            if let Expression::FieldAccess { object: None, field } = object.as_ref() {
                if field == "config" && self.symbols.config(param).is_none() {
                    self.findings.push(Finding::error(
                        "RULE-27",
                        format!("reference to undeclared config parameter '{param}'"),
                        Location::new(self.file, self.path.as_str()),
                    ));
                }
            }
        }
        crate::walk::walk_expr(self, expr);
    }
}

impl<'s, 'a> EnsuresVisitor for ConfigRefChecker<'s, 'a> {}

fn check_expr_config_refs(
    symbols: &SymbolTable,
    file: &str,
    path: Path,
    expr: &Expression,
    findings: &mut Vec<Finding>,
) {
    let mut checker = ConfigRefChecker {
        symbols,
        file,
        path,
        findings: Vec::new(),
    };
    checker.visit_expr(expr);
    findings.append(&mut checker.findings);
}

fn check_config_references(spec: &Spec, file: &str, symbols: &SymbolTable, findings: &mut Vec<Finding>) {
    for (i, rule) in spec.rules.iter().enumerate() {
        let base = Path::root().field("rules").index(i);
        for (j, req) in rule.requires.iter().enumerate() {
            check_expr_config_refs(symbols, file, base.field("requires").index(j), req, findings);
        }
        for (j, lb) in rule.let_bindings.iter().enumerate() {
            check_expr_config_refs(
                symbols,
                file,
                base.field("let_bindings").index(j).field("expression"),
                &lb.expression,
                findings,
            );
        }
        for (j, clause) in rule.ensures.iter().enumerate() {
            let path = base.field("ensures").index(j);
            let mut checker = ConfigRefChecker {
                symbols,
                file,
                path: path.clone(),
                findings: Vec::new(),
            };
            checker.visit_ensures(clause);
            findings.append(&mut checker.findings);
        }
    }

    for (i, entity) in spec.entities.iter().enumerate() {
        for (j, dv) in entity.derived_values.iter().enumerate() {
            check_expr_config_refs(
                symbols,
                file,
                Path::root().field("entities").index(i).field("derived_values").index(j).field("expression"),
                &dv.expression,
                findings,
            );
        }
    }
}

fn check_provides(
    clause: &ProvidesClause,
    path: &Path,
    surface_name: &str,
    file: &str,
    symbols: &SymbolTable,
    findings: &mut Vec<Finding>,
) {
    match clause {
        ProvidesClause::Action { trigger, .. } => {
            if symbols.rules_with_trigger(trigger).is_empty() {
                findings.push(Finding::error(
                    "RULE-30",
                    format!("surface '{surface_name}' invokes undeclared trigger '{trigger}'"),
                    Location::new(file, path.field("trigger").as_str()),
                ));
            }
        }
        ProvidesClause::ForEach { items, .. } => {
            for (k, item) in items.iter().enumerate() {
                check_provides(item, &path.field("items").index(k), surface_name, file, symbols, findings);
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
    fn undeclared_entity_ref_emits_rule_01() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "entities": [{
                "name": "A",
                "fields": [{"name": "owner", "type": {"kind": "entity_ref", "entity_name": "B"}}]
            }]
        }));
        let table = SymbolTable::build(&spec);
        let findings = ReferencesPass.run(&spec, &table);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, "RULE-01");
        assert_eq!(findings[0].location.path, "$.entities[0].fields[0].type");
        assert!(findings[0].message.contains('B'));
    }

    #[test]
    fn declared_entity_ref_is_clean() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "entities": [
                {"name": "B", "fields": []},
                {"name": "A", "fields": [{"name": "owner", "type": {"kind": "entity_ref", "entity_name": "B"}}]}
            ]
        }));
        let table = SymbolTable::build(&spec);
        assert!(ReferencesPass.run(&spec, &table).is_empty());
    }

    #[test]
    fn optional_and_set_wrappers_are_recursed_into() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "entities": [{
                "name": "A",
                "fields": [{"name": "tags", "type": {"kind": "set", "element": {"kind": "optional", "inner": {"kind": "named_enum", "name": "Missing"}}}}]
            }]
        }));
        let table = SymbolTable::build(&spec);
        let findings = ReferencesPass.run(&spec, &table);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location.path, "$.entities[0].fields[0].type.element.inner");
    }

    #[test]
    fn config_reference_resolves() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "config": [{"name": "tax_rate", "type": {"kind": "primitive", "name": "Integer"}, "default": {"kind": "literal", "type": "integer", "value": 0}}],
            "rules": [{
                "name": "R",
                "trigger": {"kind": "external_stimulus", "name": "go", "parameters": []},
                "requires": [{"kind": "field_access", "object": {"kind": "field_access", "object": null, "field": "config"}, "field": "missing_param"}],
                "ensures": [{"kind": "trigger_emission", "name": "noop", "arguments": {}}]
            }]
        }));
        let table = SymbolTable::build(&spec);
        let findings = ReferencesPass.run(&spec, &table);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, "RULE-27");
        assert!(findings[0].message.contains("missing_param"));
    }

    #[test]
    fn empty_use_declaration_coordinate_is_rejected() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "use_declarations": [{"coordinate": "", "alias": "Foo"}]
        }));
        let table = SymbolTable::build(&spec);
        let findings = ReferencesPass.run(&spec, &table);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].rule, "RULE-35");
    }
}
