//! Derived-value cycles, lexical scope, type compatibility, collection-op
//! lambda well-formedness, and enum-comparison discipline: R-10 through
//! R-14.

use std::collections::{BTreeSet, HashSet};

use crate::ast::*;
use crate::finding::{Finding, Location};
use crate::passes::Pass;
use crate::path::Path;
use crate::symbol_table::SymbolTable;
use crate::walk::{collect_root_field_accesses, walk_expr, EnsuresVisitor, ExprVisitor};

pub struct ExpressionsPass;

impl Pass for ExpressionsPass {
    fn name(&self) -> &'static str {
        "expressions"
    }

    fn rule_numbers(&self) -> &'static [&'static str] {
        &["RULE-10", "RULE-11", "RULE-12", "RULE-13", "RULE-14"]
    }

    fn run(&self, spec: &Spec, symbols: &SymbolTable) -> Vec<Finding> {
        let mut findings = Vec::new();
        let file = spec.file.as_str();

        for (i, entity) in spec.entities.iter().enumerate() {
            check_derived_value_cycles(
                &entity.derived_values,
                &Path::root().field("entities").index(i).field("derived_values"),
                file,
                &mut findings,
            );
        }
        for (i, value_type) in spec.value_types.iter().enumerate() {
            check_derived_value_cycles(
                &value_type.derived_values,
                &Path::root().field("value_types").index(i).field("derived_values"),
                file,
                &mut findings,
            );
        }

        let global_scope = base_scope(spec);
        for (i, rule) in spec.rules.iter().enumerate() {
            check_scope(rule, &global_scope, &Path::root().field("rules").index(i), file, &mut findings);
        }

        for (i, rule) in spec.rules.iter().enumerate() {
            let base = Path::root().field("rules").index(i);
            let entity_name = rule.trigger.entity().map(|s| s.to_string());
            let mut checker = TypeAndLambdaChecker {
                symbols,
                entity_name: entity_name.clone(),
                file,
                findings: Vec::new(),
                current_path: Path::root(),
            };
            for (j, req) in rule.requires.iter().enumerate() {
                checker.visit_expr_at(req, base.field("requires").index(j));
            }
            for (j, lb) in rule.let_bindings.iter().enumerate() {
                checker.visit_expr_at(&lb.expression, base.field("let_bindings").index(j).field("expression"));
            }
            for (j, clause) in rule.ensures.iter().enumerate() {
                checker.current_path = base.field("ensures").index(j);
                checker.visit_ensures(clause);
            }
            findings.append(&mut checker.findings);
        }

        for (i, entity) in spec.entities.iter().enumerate() {
            for (j, dv) in entity.derived_values.iter().enumerate() {
                let mut checker = TypeAndLambdaChecker {
                    symbols,
                    entity_name: Some(entity.name.clone()),
                    file,
                    findings: Vec::new(),
                    current_path: Path::root(),
                };
                checker.visit_expr_at(
                    &dv.expression,
                    Path::root().field("entities").index(i).field("derived_values").index(j).field("expression"),
                );
                findings.append(&mut checker.findings);
            }
        }
        for (i, value_type) in spec.value_types.iter().enumerate() {
            for (j, dv) in value_type.derived_values.iter().enumerate() {
                let mut checker = TypeAndLambdaChecker {
                    symbols,
                    entity_name: None,
                    file,
                    findings: Vec::new(),
                    current_path: Path::root(),
                };
                checker.visit_expr_at(
                    &dv.expression,
                    Path::root().field("value_types").index(i).field("derived_values").index(j).field("expression"),
                );
                findings.append(&mut checker.findings);
            }
        }

        findings
    }
}

// ---------------------------------------------------------------------
// R-10: derived-value cycles (Tarjan SCC)
// ---------------------------------------------------------------------

fn check_derived_value_cycles(derived_values: &[DerivedValue], path: &Path, file: &str, findings: &mut Vec<Finding>) {
    if derived_values.len() < 2 {
        return;
    }
    let names: BTreeSet<String> = derived_values.iter().map(|dv| dv.name.clone()).collect();
    let mut order = Vec::new();
    let mut graph: std::collections::HashMap<String, BTreeSet<String>> = std::collections::HashMap::new();
    for dv in derived_values {
        order.push(dv.name.clone());
        let edges: BTreeSet<String> = collect_root_field_accesses(&dv.expression)
            .into_iter()
            .filter(|name| names.contains(*name))
            .map(|s| s.to_string())
            .collect();
        graph.insert(dv.name.clone(), edges);
    }

    let sccs = tarjan(&order, &graph);
    for scc in sccs {
        let has_self_loop = scc.len() == 1 && graph.get(&scc[0]).is_some_and(|edges| edges.contains(&scc[0]));
        if scc.len() >= 2 || has_self_loop {
            let cycle_path = find_cycle_path(&scc, &graph);
            findings.push(Finding::error(
                "RULE-10",
                format!("derived-value cycle: {}", cycle_path.join(" -> ")),
                Location::new(file, path.as_str()),
            ));
        }
    }
}

fn tarjan(order: &[String], graph: &std::collections::HashMap<String, BTreeSet<String>>) -> Vec<Vec<String>> {
    struct State {
        index_counter: usize,
        indices: std::collections::HashMap<String, usize>,
        lowlink: std::collections::HashMap<String, usize>,
        on_stack: HashSet<String>,
        stack: Vec<String>,
        sccs: Vec<Vec<String>>,
    }

    fn strongconnect(v: &str, graph: &std::collections::HashMap<String, BTreeSet<String>>, state: &mut State) {
        let idx = state.index_counter;
        state.index_counter += 1;
        state.indices.insert(v.to_string(), idx);
        state.lowlink.insert(v.to_string(), idx);
        state.stack.push(v.to_string());
        state.on_stack.insert(v.to_string());

        if let Some(neighbors) = graph.get(v) {
            for w in neighbors {
                if !state.indices.contains_key(w) {
                    strongconnect(w, graph, state);
                    let wl = state.lowlink[w];
                    let vl = state.lowlink[v];
                    state.lowlink.insert(v.to_string(), vl.min(wl));
                } else if state.on_stack.contains(w) {
                    let wi = state.indices[w];
                    let vl = state.lowlink[v];
                    state.lowlink.insert(v.to_string(), vl.min(wi));
                }
            }
        }

        if state.lowlink[v] == state.indices[v] {
            let mut component = Vec::new();
            loop {
                let w = state.stack.pop().expect("tarjan stack underflow");
                state.on_stack.remove(&w);
                let is_v = w == v;
                component.push(w);
                if is_v {
                    break;
                }
            }
            state.sccs.push(component);
        }
    }

    let mut state = State {
        index_counter: 0,
        indices: std::collections::HashMap::new(),
        lowlink: std::collections::HashMap::new(),
        on_stack: HashSet::new(),
        stack: Vec::new(),
        sccs: Vec::new(),
    };
    for name in order {
        if !state.indices.contains_key(name) {
            strongconnect(name, graph, &mut state);
        }
    }
    state.sccs
}

fn find_cycle_path(scc: &[String], graph: &std::collections::HashMap<String, BTreeSet<String>>) -> Vec<String> {
    if scc.len() == 1 {
        return vec![scc[0].clone(), scc[0].clone()];
    }
    let in_scc: HashSet<&String> = scc.iter().collect();
    let start = scc[0].clone();
    let mut path = vec![start.clone()];
    let mut visited: HashSet<String> = [start.clone()].into_iter().collect();
    let mut current = start.clone();
    loop {
        let next = graph
            .get(&current)
            .into_iter()
            .flatten()
            .find(|n| in_scc.contains(*n) && (**n == start || !visited.contains(*n)));
        match next {
            Some(n) if *n == start => {
                path.push(n.clone());
                break;
            }
            Some(n) => {
                path.push(n.clone());
                visited.insert(n.clone());
                current = n.clone();
            }
            None => break,
        }
    }
    path
}

// ---------------------------------------------------------------------
// R-11: scope
// ---------------------------------------------------------------------

fn base_scope(spec: &Spec) -> HashSet<String> {
    let mut scope: HashSet<String> = HashSet::new();
    scope.extend(spec.given.iter().map(|g| g.name.clone()));
    scope.extend(spec.config.iter().map(|c| c.name.clone()));
    scope.extend(spec.defaults.iter().map(|d| d.name.clone()));
    scope.insert("config".to_string());
    scope
}

fn check_scope(rule: &Rule, global_scope: &HashSet<String>, base_path: &Path, file: &str, findings: &mut Vec<Finding>) {
    let mut rule_scope = global_scope.clone();
    if let Some(binding) = rule.trigger.binding() {
        rule_scope.insert(binding.to_string());
    }
    for param in rule.trigger.parameters() {
        rule_scope.insert(param.name.clone());
    }

    let mut let_scope = rule_scope.clone();
    let lb_path = base_path.field("let_bindings");
    for (i, lb) in rule.let_bindings.iter().enumerate() {
        check_expr_scope(&lb.expression, &let_scope, &lb_path.index(i).field("expression"), file, findings);
        let_scope.insert(lb.name.clone());
    }

    for (i, req) in rule.requires.iter().enumerate() {
        check_expr_scope(req, &let_scope, &base_path.field("requires").index(i), file, findings);
    }

    let mut ensures_scope = let_scope.clone();
    if let Some(for_clause) = &rule.for_clause {
        check_expr_scope(
            &for_clause.collection,
            &let_scope,
            &base_path.field("for_clause").field("collection"),
            file,
            findings,
        );
        let mut for_scope = let_scope.clone();
        for_scope.insert(for_clause.binding.clone());
        if let Some(condition) = &for_clause.condition {
            check_expr_scope(condition, &for_scope, &base_path.field("for_clause").field("condition"), file, findings);
        }
        ensures_scope = for_scope;
    }

    check_ensures_scope(&rule.ensures, &ensures_scope, &base_path.field("ensures"), file, findings);
}

fn check_expr_scope(expr: &Expression, scope: &HashSet<String>, path: &Path, file: &str, findings: &mut Vec<Finding>) {
    match expr {
        Expression::FieldAccess { object: None, field } => {
            if !scope.contains(field.as_str()) {
                findings.push(Finding::error(
                    "RULE-11",
                    format!("identifier '{field}' is not in scope"),
                    Location::new(file, path.as_str()),
                ));
            }
        }
        Expression::FieldAccess { object: Some(object), .. } => {
            check_expr_scope(object, scope, path, file, findings);
        }
        Expression::Comparison { left, right, .. }
        | Expression::Arithmetic { left, right, .. }
        | Expression::BooleanLogic { left, right, .. }
        | Expression::NullCoalesce { left, right, .. } => {
            check_expr_scope(left, scope, path, file, findings);
            check_expr_scope(right, scope, path, file, findings);
        }
        Expression::Not { operand } => check_expr_scope(operand, scope, path, file, findings),
        Expression::FunctionCall { arguments, .. } => {
            for arg in arguments {
                check_expr_scope(arg, scope, path, file, findings);
            }
        }
        Expression::CollectionOp {
            collection,
            lambda,
            condition,
            ..
        } => {
            check_expr_scope(collection, scope, path, file, findings);
            if let Some(lambda) = lambda {
                check_expr_scope(lambda, scope, path, file, findings);
            }
            if let Some(condition) = condition {
                check_expr_scope(condition, scope, path, file, findings);
            }
        }
        Expression::Lambda { parameter, body } => {
            let mut inner = scope.clone();
            inner.insert(parameter.clone());
            check_expr_scope(body, &inner, path, file, findings);
        }
        Expression::Exists { target } => check_expr_scope(target, scope, path, file, findings),
        Expression::SetLiteral { elements } => {
            for element in elements {
                check_expr_scope(element, scope, path, file, findings);
            }
        }
        Expression::Membership { element, collection } => {
            check_expr_scope(element, scope, path, file, findings);
            check_expr_scope(collection, scope, path, file, findings);
        }
        Expression::JoinLookup { fields, .. } => {
            for value in fields.values() {
                check_expr_scope(value, scope, path, file, findings);
            }
        }
        Expression::Literal { .. } => {}
    }
}

fn check_value_scope(value: &Value, scope: &HashSet<String>, path: &Path, file: &str, findings: &mut Vec<Finding>) {
    match value {
        Value::Expression(expr) => check_expr_scope(expr, scope, path, file, findings),
        Value::EntityCreation(clause) => {
            for (key, expr) in &clause.fields {
                check_expr_scope(expr, scope, &path.field("fields").field(key), file, findings);
            }
        }
    }
}

fn check_ensures_scope(clauses: &[EnsuresClause], scope: &HashSet<String>, base_path: &Path, file: &str, findings: &mut Vec<Finding>) {
    for (i, clause) in clauses.iter().enumerate() {
        let p = base_path.index(i);
        match clause {
            EnsuresClause::StateChange { target, value } => {
                check_expr_scope(target, scope, &p.field("target"), file, findings);
                check_value_scope(value, scope, &p.field("value"), file, findings);
            }
            EnsuresClause::EntityCreation(creation) => {
                for (key, expr) in &creation.fields {
                    check_expr_scope(expr, scope, &p.field("fields").field(key), file, findings);
                }
            }
            EnsuresClause::TriggerEmission { arguments, .. } => {
                for (key, expr) in arguments {
                    check_expr_scope(expr, scope, &p.field("arguments").field(key), file, findings);
                }
            }
            EnsuresClause::EntityRemoval { target } => check_expr_scope(target, scope, &p.field("target"), file, findings),
            EnsuresClause::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                check_expr_scope(condition, scope, &p.field("condition"), file, findings);
                check_ensures_scope(then_branch, scope, &p.field("then"), file, findings);
                check_ensures_scope(else_branch, scope, &p.field("else"), file, findings);
            }
            EnsuresClause::Iteration { binding, collection, body } => {
                check_expr_scope(collection, scope, &p.field("collection"), file, findings);
                let mut inner = scope.clone();
                inner.insert(binding.clone());
                check_ensures_scope(body, &inner, &p.field("body"), file, findings);
            }
            EnsuresClause::LetBinding { binding, value, body } => {
                check_value_scope(value, scope, &p.field("value"), file, findings);
                let mut inner = scope.clone();
                inner.insert(binding.clone());
                check_ensures_scope(body, &inner, &p.field("body"), file, findings);
            }
            EnsuresClause::SetMutation { target, value, .. } => {
                check_expr_scope(target, scope, &p.field("target"), file, findings);
                check_expr_scope(value, scope, &p.field("value"), file, findings);
            }
        }
    }
}

// ---------------------------------------------------------------------
// R-12 / R-13 / R-14: type compatibility, lambda well-formedness, enum
// comparison discipline.
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum TypeDescriptor {
    Integer,
    Str,
    Boolean,
    Timestamp,
    Duration,
    EnumValue,
    Null,
    InlineEnum,
    NamedEnum(String),
    Unknown,
}

impl TypeDescriptor {
    fn label(&self) -> String {
        match self {
            TypeDescriptor::Integer => "Integer".to_string(),
            TypeDescriptor::Str => "String".to_string(),
            TypeDescriptor::Boolean => "Boolean".to_string(),
            TypeDescriptor::Timestamp => "Timestamp".to_string(),
            TypeDescriptor::Duration => "Duration".to_string(),
            TypeDescriptor::EnumValue => "EnumValue".to_string(),
            TypeDescriptor::Null => "Null".to_string(),
            TypeDescriptor::InlineEnum => "InlineEnum".to_string(),
            TypeDescriptor::NamedEnum(name) => format!("NamedEnum:{name}"),
            TypeDescriptor::Unknown => "Unknown".to_string(),
        }
    }
}

fn literal_type_descriptor(literal_type: LiteralType) -> TypeDescriptor {
    match literal_type {
        LiteralType::Integer => TypeDescriptor::Integer,
        LiteralType::String => TypeDescriptor::Str,
        LiteralType::Boolean => TypeDescriptor::Boolean,
        LiteralType::Timestamp => TypeDescriptor::Timestamp,
        LiteralType::Duration => TypeDescriptor::Duration,
        LiteralType::EnumValue => TypeDescriptor::EnumValue,
        LiteralType::Null => TypeDescriptor::Null,
    }
}

fn field_type_descriptor(field_type: &FieldType) -> TypeDescriptor {
    match field_type {
        FieldType::Primitive { name } => match name {
            PrimitiveKind::String => TypeDescriptor::Str,
            PrimitiveKind::Integer => TypeDescriptor::Integer,
            PrimitiveKind::Boolean => TypeDescriptor::Boolean,
            PrimitiveKind::Timestamp => TypeDescriptor::Timestamp,
            PrimitiveKind::Duration => TypeDescriptor::Duration,
        },
        FieldType::InlineEnum { .. } => TypeDescriptor::InlineEnum,
        FieldType::NamedEnum { name } => TypeDescriptor::NamedEnum(name.clone()),
        FieldType::Optional { inner } => field_type_descriptor(inner),
        FieldType::EntityRef { .. } | FieldType::Set { .. } | FieldType::List { .. } => TypeDescriptor::Unknown,
    }
}

fn is_comparable(l: &TypeDescriptor, r: &TypeDescriptor) -> bool {
    l == r
        || *l == TypeDescriptor::Null
        || *r == TypeDescriptor::Null
        || *l == TypeDescriptor::EnumValue
        || *r == TypeDescriptor::EnumValue
        || (is_temporal(l) && is_temporal(r))
}

fn is_temporal(t: &TypeDescriptor) -> bool {
    matches!(t, TypeDescriptor::Timestamp | TypeDescriptor::Duration)
}

fn is_arithmetic_valid(op: ArithmeticOp, l: &TypeDescriptor, r: &TypeDescriptor) -> bool {
    use ArithmeticOp::*;
    use TypeDescriptor::*;
    match (l, r) {
        (Integer, Integer) => true,
        (Timestamp, Duration) if matches!(op, Add | Sub) => true,
        (Duration, Timestamp) if matches!(op, Add) => true,
        (Duration, Duration) if matches!(op, Add | Sub) => true,
        (Timestamp, Timestamp) if matches!(op, Sub) => true,
        _ => false,
    }
}

fn arithmetic_result(op: ArithmeticOp, l: &TypeDescriptor, r: &TypeDescriptor) -> TypeDescriptor {
    use ArithmeticOp::*;
    use TypeDescriptor::*;
    match (l, r) {
        (Integer, Integer) => Integer,
        (Timestamp, Duration) if matches!(op, Add | Sub) => Timestamp,
        (Duration, Timestamp) if matches!(op, Add) => Timestamp,
        (Duration, Duration) if matches!(op, Add | Sub) => Duration,
        (Timestamp, Timestamp) if matches!(op, Sub) => Duration,
        _ if *l == Unknown => r.clone(),
        _ => Unknown,
    }
}

struct TypeAndLambdaChecker<'s, 'a> {
    symbols: &'s SymbolTable<'a>,
    entity_name: Option<String>,
    file: &'s str,
    findings: Vec<Finding>,
    current_path: Path,
}

impl<'s, 'a> TypeAndLambdaChecker<'s, 'a> {
    fn visit_expr_at(&mut self, expr: &Expression, path: Path) {
        self.current_path = path;
        self.visit_expr(expr);
    }

    fn infer(&self, expr: &Expression) -> TypeDescriptor {
        match expr {
            Expression::Literal { literal_type, .. } => literal_type_descriptor(*literal_type),
            Expression::FieldAccess { object: None, field } => self
                .entity_name
                .as_deref()
                .and_then(|entity| self.symbols.fields_of(entity))
                .and_then(|fields| fields.iter().find(|f| &f.name == field))
                .map(|f| field_type_descriptor(&f.field_type))
                .unwrap_or(TypeDescriptor::Unknown),
            Expression::FieldAccess { object: Some(_), .. } => TypeDescriptor::Unknown,
            Expression::Arithmetic { op, left, right } => {
                arithmetic_result(*op, &self.infer(left), &self.infer(right))
            }
            Expression::CollectionOp { operation, .. } if operation == "count" => TypeDescriptor::Integer,
            _ => TypeDescriptor::Unknown,
        }
    }

    fn is_enum_typed_root(&self, expr: &Expression) -> Option<TypeDescriptor> {
        if !expr.is_root_field_access() {
            return None;
        }
        match self.infer(expr) {
            d @ (TypeDescriptor::InlineEnum | TypeDescriptor::NamedEnum(_)) => Some(d),
            _ => None,
        }
    }
}

impl<'s, 'a> ExprVisitor for TypeAndLambdaChecker<'s, 'a> {
    fn visit_expr(&mut self, expr: &Expression) {
        match expr {
            Expression::Comparison { left, right, .. } => {
                let l = self.infer(left);
                let r = self.infer(right);
                if l != TypeDescriptor::Unknown && r != TypeDescriptor::Unknown && !is_comparable(&l, &r) {
                    self.findings.push(Finding::error(
                        "RULE-12",
                        format!("comparison between incompatible types {} and {}", l.label(), r.label()),
                        Location::new(self.file, self.current_path.as_str()),
                    ));
                }
                if let (Some(le), Some(re)) = (self.is_enum_typed_root(left), self.is_enum_typed_root(right)) {
                    let clash = match (&le, &re) {
                        (TypeDescriptor::InlineEnum, _) | (_, TypeDescriptor::InlineEnum) => true,
                        (TypeDescriptor::NamedEnum(a), TypeDescriptor::NamedEnum(b)) => a != b,
                        _ => false,
                    };
                    if clash {
                        self.findings.push(Finding::error(
                            "RULE-14",
                            format!("incompatible enum comparison between {} and {}", le.label(), re.label()),
                            Location::new(self.file, self.current_path.as_str()),
                        ));
                    }
                }
            }
            Expression::Arithmetic { op, left, right } => {
                let l = self.infer(left);
                let r = self.infer(right);
                if l != TypeDescriptor::Unknown && r != TypeDescriptor::Unknown && !is_arithmetic_valid(*op, &l, &r) {
                    let offender = if !matches!(l, TypeDescriptor::Integer | TypeDescriptor::Timestamp | TypeDescriptor::Duration) {
                        l.label()
                    } else {
                        r.label()
                    };
                    self.findings.push(Finding::error(
                        "RULE-12",
                        format!("arithmetic operand has incompatible type {offender}"),
                        Location::new(self.file, self.current_path.as_str()),
                    ));
                }
            }
            Expression::CollectionOp {
                operation,
                lambda,
                ..
            } if operation == "any" || operation == "all" => {
                let ok = matches!(lambda.as_deref(), Some(Expression::Lambda { parameter, .. }) if !parameter.is_empty());
                if !ok {
                    self.findings.push(Finding::error(
                        "RULE-13",
                        format!("collection_op '{operation}' requires a lambda with a non-empty parameter"),
                        Location::new(self.file, self.current_path.as_str()),
                    ));
                }
            }
            _ => {}
        }
        walk_expr(self, expr);
    }
}

impl<'s, 'a> EnsuresVisitor for TypeAndLambdaChecker<'s, 'a> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec_from(json: serde_json::Value) -> Spec {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn derived_cycle_is_reported() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "entities": [{
                "name": "Invoice",
                "fields": [],
                "derived_values": [
                    {"name": "total", "expression": {"kind": "arithmetic", "op": "+", "left": {"kind": "field_access", "object": null, "field": "tax"}, "right": {"kind": "literal", "type": "integer", "value": 0}}},
                    {"name": "tax", "expression": {"kind": "arithmetic", "op": "+", "left": {"kind": "field_access", "object": null, "field": "total"}, "right": {"kind": "literal", "type": "integer", "value": 0}}}
                ]
            }]
        }));
        let table = SymbolTable::build(&spec);
        let findings = ExpressionsPass.run(&spec, &table);
        let cycle = findings.iter().find(|f| f.rule == "RULE-10").unwrap();
        assert!(cycle.message.contains("total -> tax -> total"));
    }

    #[test]
    fn scope_violation_is_reported() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "rules": [{
                "name": "R",
                "trigger": {"kind": "external_stimulus", "name": "go", "parameters": []},
                "requires": [{"kind": "field_access", "object": null, "field": "undeclared"}],
                "ensures": [{"kind": "trigger_emission", "name": "noop", "arguments": {}}]
            }]
        }));
        let table = SymbolTable::build(&spec);
        let findings = ExpressionsPass.run(&spec, &table);
        assert!(findings.iter().any(|f| f.rule == "RULE-11"));
    }

    #[test]
    fn lambda_required_for_any_all() {
        let spec = spec_from(serde_json::json!({
            "version": "1",
            "file": "t.allium",
            "entities": [{
                "name": "Order",
                "fields": [],
                "derived_values": [
                    {"name": "any_ready", "expression": {"kind": "collection_op", "operation": "any", "collection": {"kind": "set_literal", "elements": []}}},
                    {"name": "count_items", "expression": {"kind": "collection_op", "operation": "count", "collection": {"kind": "set_literal", "elements": []}}}
                ]
            }]
        }));
        let table = SymbolTable::build(&spec);
        let findings = ExpressionsPass.run(&spec, &table);
        assert_eq!(findings.iter().filter(|f| f.rule == "RULE-13").count(), 1);
    }
}
