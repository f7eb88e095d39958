//! Name resolution over a [`Spec`]: constant-time lookup of declarations by
//! name, plus the derived any-entity/any-type queries used throughout the
//! passes.
//!
//! The table borrows out of the `Spec` it was built from; its lifetime
//! cannot outlive the `Spec`. Construction runs in a single pass and never
//! fails — duplicate names are recorded (last occurrence wins, as the
//! Uniqueness pass reports the duplicate separately) rather than rejected.

use std::collections::HashMap;

use crate::ast::*;

#[derive(Debug)]
pub struct SymbolTable<'a> {
    spec: &'a Spec,
    entities: HashMap<&'a str, usize>,
    external_entities: HashMap<&'a str, usize>,
    variants: HashMap<&'a str, usize>,
    use_declarations: HashMap<&'a str, usize>,
    value_types: HashMap<&'a str, usize>,
    enumerations: HashMap<&'a str, usize>,
    given: HashMap<&'a str, usize>,
    config: HashMap<&'a str, usize>,
    actors: HashMap<&'a str, usize>,
    surfaces: HashMap<&'a str, usize>,
    rules: HashMap<&'a str, usize>,
    /// trigger-name -> rule indices, populated only for `external_stimulus`
    /// and `chained` triggers (the only kinds named globally).
    trigger_index: HashMap<&'a str, Vec<usize>>,
}

fn index_by_name<'a, T>(items: &'a [T], name: impl Fn(&'a T) -> &'a str) -> HashMap<&'a str, usize> {
    let mut map = HashMap::new();
    for (i, item) in items.iter().enumerate() {
        map.insert(name(item), i);
    }
    map
}

impl<'a> SymbolTable<'a> {
    pub fn build(spec: &'a Spec) -> Self {
        let mut trigger_index: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for (i, rule) in spec.rules.iter().enumerate() {
            if let Some(name) = rule.trigger.shared_name() {
                trigger_index.entry(name).or_default().push(i);
            }
        }

        SymbolTable {
            spec,
            entities: index_by_name(&spec.entities, |e| e.name.as_str()),
            external_entities: index_by_name(&spec.external_entities, |e| e.name.as_str()),
            variants: index_by_name(&spec.variants, |v| v.name.as_str()),
            use_declarations: index_by_name(&spec.use_declarations, |u| u.alias.as_str()),
            value_types: index_by_name(&spec.value_types, |v| v.name.as_str()),
            enumerations: index_by_name(&spec.enumerations, |e| e.name.as_str()),
            given: index_by_name(&spec.given, |g| g.name.as_str()),
            config: index_by_name(&spec.config, |c| c.name.as_str()),
            actors: index_by_name(&spec.actors, |a| a.name.as_str()),
            surfaces: index_by_name(&spec.surfaces, |s| s.name.as_str()),
            rules: index_by_name(&spec.rules, |r| r.name.as_str()),
            trigger_index,
        }
    }

    pub fn spec(&self) -> &'a Spec {
        self.spec
    }

    pub fn entity(&self, name: &str) -> Option<&'a Entity> {
        self.entities.get(name).map(|&i| &self.spec.entities[i])
    }

    pub fn external_entity(&self, name: &str) -> Option<&'a ExternalEntity> {
        self.external_entities.get(name).map(|&i| &self.spec.external_entities[i])
    }

    pub fn variant(&self, name: &str) -> Option<&'a Variant> {
        self.variants.get(name).map(|&i| &self.spec.variants[i])
    }

    pub fn use_declaration(&self, alias: &str) -> Option<&'a UseDeclaration> {
        self.use_declarations.get(alias).map(|&i| &self.spec.use_declarations[i])
    }

    pub fn value_type(&self, name: &str) -> Option<&'a ValueType> {
        self.value_types.get(name).map(|&i| &self.spec.value_types[i])
    }

    pub fn enumeration(&self, name: &str) -> Option<&'a Enumeration> {
        self.enumerations.get(name).map(|&i| &self.spec.enumerations[i])
    }

    pub fn given(&self, name: &str) -> Option<&'a GivenBinding> {
        self.given.get(name).map(|&i| &self.spec.given[i])
    }

    pub fn config(&self, name: &str) -> Option<&'a ConfigParam> {
        self.config.get(name).map(|&i| &self.spec.config[i])
    }

    pub fn actor(&self, name: &str) -> Option<&'a Actor> {
        self.actors.get(name).map(|&i| &self.spec.actors[i])
    }

    pub fn surface(&self, name: &str) -> Option<&'a Surface> {
        self.surfaces.get(name).map(|&i| &self.spec.surfaces[i])
    }

    pub fn rule(&self, name: &str) -> Option<&'a Rule> {
        self.rules.get(name).map(|&i| &self.spec.rules[i])
    }

    /// Rules whose trigger shares `name` as an `external_stimulus` or
    /// `chained` trigger.
    pub fn rules_with_trigger(&self, name: &str) -> Vec<&'a Rule> {
        self.trigger_index
            .get(name)
            .map(|indices| indices.iter().map(|&i| &self.spec.rules[i]).collect())
            .unwrap_or_default()
    }

    pub fn trigger_names(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.trigger_index.keys().copied()
    }

    /// True when `name` is known as an entity, external entity, variant, or
    /// use-declaration alias.
    pub fn is_any_entity(&self, name: &str) -> bool {
        self.entities.contains_key(name)
            || self.external_entities.contains_key(name)
            || self.variants.contains_key(name)
            || self.use_declarations.contains_key(name)
    }

    /// True when `name` is any-entity, or a value type or enumeration.
    pub fn is_any_type(&self, name: &str) -> bool {
        self.is_any_entity(name) || self.value_types.contains_key(name) || self.enumerations.contains_key(name)
    }

    /// Fields declared directly on an entity, external entity, value type,
    /// or variant, for callers that need to look a field up without caring
    /// which kind of declaration owns it.
    pub fn fields_of(&self, name: &str) -> Option<&'a [Field]> {
        if let Some(e) = self.entity(name) {
            Some(&e.fields)
        } else if let Some(e) = self.external_entity(name) {
            Some(&e.fields)
        } else if let Some(v) = self.value_type(name) {
            Some(&v.fields)
        } else if let Some(v) = self.variant(name) {
            Some(&v.fields)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_spec() -> Spec {
        serde_json::from_value(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "entities": [{"name": "Order", "fields": []}],
            "use_declarations": [{"coordinate": "other/spec", "alias": "Customer"}]
        }))
        .unwrap()
    }

    #[test]
    fn any_entity_includes_aliases() {
        let spec = sample_spec();
        let table = SymbolTable::build(&spec);
        assert!(table.is_any_entity("Order"));
        assert!(table.is_any_entity("Customer"));
        assert!(!table.is_any_entity("Unknown"));
    }

    #[test]
    fn duplicate_names_keep_last_occurrence() {
        let spec: Spec = serde_json::from_value(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "entities": [
                {"name": "Order", "fields": [], "derived_values": [{"name": "first", "expression": {"kind": "literal", "type": "integer", "value": 1}}]},
                {"name": "Order", "fields": [], "derived_values": [{"name": "second", "expression": {"kind": "literal", "type": "integer", "value": 2}}]}
            ]
        }))
        .unwrap();
        let table = SymbolTable::build(&spec);
        let order = table.entity("Order").unwrap();
        assert_eq!(order.derived_values[0].name, "second");
    }

    #[test]
    fn trigger_index_only_covers_named_triggers() {
        let spec: Spec = serde_json::from_value(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "rules": [{
                "name": "Login",
                "trigger": {"kind": "external_stimulus", "name": "login", "parameters": []},
                "ensures": [{"kind": "trigger_emission", "name": "noop", "arguments": {}}]
            }]
        }))
        .unwrap();
        let table = SymbolTable::build(&spec);
        assert_eq!(table.rules_with_trigger("login").len(), 1);
        assert!(table.rules_with_trigger("unused").is_empty());
    }

    #[test]
    fn fields_of_resolves_variant_fields() {
        let spec: Spec = serde_json::from_value(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "entities": [{"name": "Payment", "fields": []}],
            "variants": [{
                "name": "CardPayment",
                "base_entity": "Payment",
                "fields": [{"name": "card_number", "type": {"kind": "primitive", "name": "String"}}]
            }]
        }))
        .unwrap();
        let table = SymbolTable::build(&spec);
        let fields = table.fields_of("CardPayment").unwrap();
        assert_eq!(fields[0].name, "card_number");
    }
}
