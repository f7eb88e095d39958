//! Recursive visitors over the expression and ensures-clause trees.
//!
//! Mirrors a default-recursing visitor: `visit_expr`/`visit_ensures`
//! default to walking every child: a pass added later does not need to
//! know which fields a given expression or clause variant populates to
//! avoid missing a subtree. Overriding a `visit_*` method and calling the
//! matching `walk_*` function continues the recursion after handling the
//! current node. Missing optional children contribute nothing, never a
//! panic.

use crate::ast::{EnsuresClause, EntityCreationClause, Expression, Value};

pub trait ExprVisitor {
    fn visit_expr(&mut self, expr: &Expression) {
        walk_expr(self, expr);
    }
}

pub fn walk_expr<V: ExprVisitor + ?Sized>(visitor: &mut V, expr: &Expression) {
    match expr {
        Expression::Literal { .. } => {}
        Expression::FieldAccess { object, .. } => {
            if let Some(object) = object {
                visitor.visit_expr(object);
            }
        }
        Expression::Comparison { left, right, .. }
        | Expression::Arithmetic { left, right, .. }
        | Expression::BooleanLogic { left, right, .. }
        | Expression::NullCoalesce { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        Expression::Not { operand } => visitor.visit_expr(operand),
        Expression::FunctionCall { arguments, .. } => {
            for arg in arguments {
                visitor.visit_expr(arg);
            }
        }
        Expression::CollectionOp {
            collection,
            lambda,
            condition,
            ..
        } => {
            visitor.visit_expr(collection);
            if let Some(lambda) = lambda {
                visitor.visit_expr(lambda);
            }
            if let Some(condition) = condition {
                visitor.visit_expr(condition);
            }
        }
        Expression::Lambda { body, .. } => visitor.visit_expr(body),
        Expression::Exists { target } => visitor.visit_expr(target),
        Expression::SetLiteral { elements } => {
            for element in elements {
                visitor.visit_expr(element);
            }
        }
        Expression::Membership { element, collection } => {
            visitor.visit_expr(element);
            visitor.visit_expr(collection);
        }
        Expression::JoinLookup { fields, .. } => {
            for value in fields.values() {
                visitor.visit_expr(value);
            }
        }
    }
}

/// Walks the polymorphic `Value` sum: an `Expression`, or a nested
/// `entity_creation` clause whose field expressions are visited in turn.
pub fn walk_value<V: ExprVisitor + ?Sized>(visitor: &mut V, value: &Value) {
    match value {
        Value::Expression(expr) => visitor.visit_expr(expr),
        Value::EntityCreation(clause) => walk_entity_creation_fields(visitor, clause),
    }
}

fn walk_entity_creation_fields<V: ExprVisitor + ?Sized>(visitor: &mut V, clause: &EntityCreationClause) {
    for value in clause.fields.values() {
        visitor.visit_expr(value);
    }
}

pub trait EnsuresVisitor: ExprVisitor {
    fn visit_ensures(&mut self, clause: &EnsuresClause) {
        walk_ensures(self, clause);
    }
}

pub fn walk_ensures<V: EnsuresVisitor + ?Sized>(visitor: &mut V, clause: &EnsuresClause) {
    match clause {
        EnsuresClause::StateChange { target, value } => {
            visitor.visit_expr(target);
            walk_value(visitor, value);
        }
        EnsuresClause::EntityCreation(creation) => {
            walk_entity_creation_fields(visitor, creation);
        }
        EnsuresClause::TriggerEmission { arguments, .. } => {
            for value in arguments.values() {
                visitor.visit_expr(value);
            }
        }
        EnsuresClause::EntityRemoval { target } => visitor.visit_expr(target),
        EnsuresClause::Conditional {
            condition,
            then_branch,
            else_branch,
        } => {
            visitor.visit_expr(condition);
            for child in then_branch {
                visitor.visit_ensures(child);
            }
            for child in else_branch {
                visitor.visit_ensures(child);
            }
        }
        EnsuresClause::Iteration { collection, body, .. } => {
            visitor.visit_expr(collection);
            for child in body {
                visitor.visit_ensures(child);
            }
        }
        EnsuresClause::LetBinding { value, body, .. } => {
            walk_value(visitor, value);
            for child in body {
                visitor.visit_ensures(child);
            }
        }
        EnsuresClause::SetMutation { target, value, .. } => {
            visitor.visit_expr(target);
            visitor.visit_expr(value);
        }
    }
}

/// Collects every root (`object == null`) `field_access` reachable from an
/// expression tree. Convenience used by passes that only need the set of
/// referenced root names (scope checking, surface binding usage, ...).
pub fn collect_root_field_accesses(expr: &Expression) -> Vec<&str> {
    fn visit<'a>(expr: &'a Expression, out: &mut Vec<&'a str>) {
        if let Expression::FieldAccess { object: None, field } = expr {
            out.push(field);
        }
        match expr {
            Expression::Literal { .. } => {}
            Expression::FieldAccess { object, .. } => {
                if let Some(object) = object {
                    visit(object, out);
                }
            }
            Expression::Comparison { left, right, .. }
            | Expression::Arithmetic { left, right, .. }
            | Expression::BooleanLogic { left, right, .. }
            | Expression::NullCoalesce { left, right, .. } => {
                visit(left, out);
                visit(right, out);
            }
            Expression::Not { operand } => visit(operand, out),
            Expression::FunctionCall { arguments, .. } => {
                for arg in arguments {
                    visit(arg, out);
                }
            }
            Expression::CollectionOp {
                collection,
                lambda,
                condition,
                ..
            } => {
                visit(collection, out);
                if let Some(lambda) = lambda {
                    visit(lambda, out);
                }
                if let Some(condition) = condition {
                    visit(condition, out);
                }
            }
            Expression::Lambda { body, .. } => visit(body, out),
            Expression::Exists { target } => visit(target, out),
            Expression::SetLiteral { elements } => {
                for element in elements {
                    visit(element, out);
                }
            }
            Expression::Membership { element, collection } => {
                visit(element, out);
                visit(collection, out);
            }
            Expression::JoinLookup { fields, .. } => {
                for value in fields.values() {
                    visit(value, out);
                }
            }
        }
    }
    let mut out = Vec::new();
    visit(expr, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;

    fn field(name: &str) -> Expression {
        Expression::FieldAccess {
            object: None,
            field: name.into(),
        }
    }

    #[test]
    fn collects_nested_root_accesses() {
        let expr = Expression::Arithmetic {
            op: ArithmeticOp::Add,
            left: Box::new(field("tax")),
            right: Box::new(Expression::Not {
                operand: Box::new(field("exempt")),
            }),
        };
        let roots = collect_root_field_accesses(&expr);
        assert_eq!(roots, vec!["tax", "exempt"]);
    }

    #[test]
    fn chained_access_root_is_still_collected_once() {
        let expr = Expression::FieldAccess {
            object: Some(Box::new(field("order"))),
            field: "total".into(),
        };
        assert_eq!(collect_root_field_accesses(&expr), vec!["order"]);
    }

    #[test]
    fn join_lookup_fields_are_visited() {
        let mut fields = indexmap::IndexMap::new();
        fields.insert("owner".to_string(), field("customer"));
        let expr = Expression::JoinLookup {
            entity: "Order".into(),
            fields,
        };
        assert_eq!(collect_root_field_accesses(&expr), vec!["customer"]);
    }
}
