//! Discriminated base-entity/variant correspondence: R-16, R-17, R-19.
//!
//! R-18 (variant-field access guarded by a discriminator equality check) is
//! documented in the source material but not implemented here; it would
//! require dominance analysis over `requires`/`conditional` guards that the
//! rest of this pass has no need for.

use crate::ast::*;
use crate::finding::{Finding, Location};
use crate::passes::Pass;
use crate::path::Path;
use crate::symbol_table::SymbolTable;

pub struct SumTypesPass;

impl Pass for SumTypesPass {
    fn name(&self) -> &'static str {
        "sum_types"
    }

    fn rule_numbers(&self) -> &'static [&'static str] {
        &["RULE-16", "RULE-17", "RULE-19"]
    }

    fn run(&self, spec: &Spec, _symbols: &SymbolTable) -> Vec<Finding> {
        let mut findings = Vec::new();
        let file = spec.file.as_str();

        for (i, entity) in spec.entities.iter().enumerate() {
            let variants: Vec<(usize, &Variant)> = spec
                .variants
                .iter()
                .enumerate()
                .filter(|(_, v)| v.base_entity == entity.name)
                .collect();
            if variants.is_empty() {
                continue;
            }
            let variant_refs: Vec<&Variant> = variants.iter().map(|(_, v)| *v).collect();
            let entity_path = Path::root().field("entities").index(i);
            let discriminator = find_discriminator(entity, &variant_refs);

            check_r16(entity, &discriminator, spec, &entity_path, file, &mut findings);
            check_r17(entity, &variants, &discriminator, file, &mut findings);
        }

        for (i, rule) in spec.rules.iter().enumerate() {
            let base = Path::root().field("rules").index(i).field("ensures");
            check_r19(&rule.ensures, spec, &base, file, &mut findings);
        }

        findings
    }
}

/// Splits on `_`, title-cases each segment, concatenates: `order_placed` ->
/// `OrderPlaced`.
fn snake_to_pascal(s: &str) -> String {
    s.split('_')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

fn corresponds(enum_value: &str, variant_name: &str) -> bool {
    enum_value == variant_name || snake_to_pascal(enum_value) == variant_name
}

struct Discriminator<'a> {
    field_index: usize,
    values: &'a [String],
}

fn find_discriminator<'a>(entity: &'a Entity, variants: &[&Variant]) -> Option<Discriminator<'a>> {
    for (i, field) in entity.fields.iter().enumerate() {
        if let FieldType::InlineEnum { values } = &field.field_type {
            if values.iter().any(|v| variants.iter().any(|variant| corresponds(v, &variant.name))) {
                return Some(Discriminator { field_index: i, values });
            }
        }
    }
    None
}

fn check_r16(
    entity: &Entity,
    discriminator: &Option<Discriminator>,
    spec: &Spec,
    entity_path: &Path,
    file: &str,
    findings: &mut Vec<Finding>,
) {
    let Some(discriminator) = discriminator else {
        return;
    };
    let field_path = entity_path.field("fields").index(discriminator.field_index);
    for value in discriminator.values {
        let resolved = spec.variants.iter().find(|v| corresponds(value, &v.name));
        match resolved {
            None => {
                findings.push(Finding::error(
                    "RULE-16",
                    format!("discriminator value '{value}' on entity '{}' does not resolve to any variant", entity.name),
                    Location::new(file, field_path.as_str()),
                ));
            }
            Some(variant) if variant.base_entity != entity.name => {
                findings.push(Finding::error(
                    "RULE-16",
                    format!(
                        "discriminator value '{value}' resolves to variant '{}' whose base entity is '{}', not '{}'",
                        variant.name, variant.base_entity, entity.name
                    ),
                    Location::new(file, field_path.as_str()),
                ));
            }
            Some(_) => {}
        }
    }
}

fn check_r17(
    entity: &Entity,
    variants: &[(usize, &Variant)],
    discriminator: &Option<Discriminator>,
    file: &str,
    findings: &mut Vec<Finding>,
) {
    for (variant_index, variant) in variants {
        let variant_path = Path::root().field("variants").index(*variant_index);
        match discriminator {
            None => {
                findings.push(Finding::error(
                    "RULE-17",
                    format!("variant '{}' has base entity '{}' with no discriminator field", variant.name, entity.name),
                    Location::new(file, variant_path.as_str()),
                ));
            }
            Some(discriminator) => {
                if !discriminator.values.iter().any(|v| corresponds(v, &variant.name)) {
                    findings.push(Finding::error(
                        "RULE-17",
                        format!(
                            "variant '{}' does not appear among the discriminator values of entity '{}'",
                            variant.name, entity.name
                        ),
                        Location::new(file, variant_path.as_str()),
                    ));
                }
            }
        }
    }
}

fn check_r19(clauses: &[EnsuresClause], spec: &Spec, base: &Path, file: &str, findings: &mut Vec<Finding>) {
    for (i, clause) in clauses.iter().enumerate() {
        let p = base.index(i);
        match clause {
            EnsuresClause::EntityCreation(creation) => {
                let has_discriminator = spec
                    .entities
                    .iter()
                    .find(|e| e.name == creation.entity)
                    .map(|e| {
                        let variants: Vec<&Variant> = spec.variants.iter().filter(|v| v.base_entity == e.name).collect();
                        !variants.is_empty() && find_discriminator(e, &variants).is_some()
                    })
                    .unwrap_or(false);
                if has_discriminator {
                    findings.push(Finding::error(
                        "RULE-19",
                        format!("entity_creation names base entity '{}' directly; a discriminated entity requires a variant name", creation.entity),
                        Location::new(file, p.field("entity").as_str()),
                    ));
                }
            }
            EnsuresClause::Conditional { then_branch, else_branch, .. } => {
                check_r19(then_branch, spec, &p.field("then"), file, findings);
                check_r19(else_branch, spec, &p.field("else"), file, findings);
            }
            EnsuresClause::Iteration { body, .. } => check_r19(body, spec, &p.field("body"), file, findings),
            EnsuresClause::LetBinding { body, .. } => check_r19(body, spec, &p.field("body"), file, findings),
            _ => {}
        }
    }
}
