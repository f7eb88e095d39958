//! Rule passes: independent, read-only checks over an AST plus its symbol
//! table. Registration order (see [`crate::orchestrator`]) matches the
//! order findings are expected to appear in a report: References,
//! Uniqueness, State Machines, Expressions, Sum Types, Surfaces, Warnings.

pub mod expressions;
pub mod references;
pub mod state_machines;
pub mod sum_types;
pub mod surfaces;
pub mod uniqueness;
pub mod warnings;

use crate::ast::Spec;
use crate::finding::Finding;
use crate::symbol_table::SymbolTable;

/// A composable unit of semantic analysis bound to the rule numbers it
/// covers.
pub trait Pass {
    fn name(&self) -> &'static str;
    fn rule_numbers(&self) -> &'static [&'static str];
    fn run(&self, spec: &Spec, symbols: &SymbolTable) -> Vec<Finding>;
}

/// The passes in their fixed registration order.
pub fn registry() -> Vec<Box<dyn Pass>> {
    vec![
        Box::new(references::ReferencesPass),
        Box::new(uniqueness::UniquenessPass),
        Box::new(state_machines::StateMachinesPass),
        Box::new(expressions::ExpressionsPass),
        Box::new(sum_types::SumTypesPass),
        Box::new(surfaces::SurfacesPass),
        Box::new(warnings::WarningsPass),
    ]
}
