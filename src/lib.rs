//! # allium-lint
//!
//! A semantic validator for Allium specification documents.
//!
//! Allium specs are JSON documents describing entities, rules, and
//! surfaces in a declarative system model. A schema validator checks
//! document *shape*; this crate checks document *meaning*: dangling
//! references, unreachable lifecycle states, scope violations, type
//! mismatches, and the other semantic properties a shape check cannot
//! see.
//!
//! ## Quick start
//!
//! ```rust
//! use allium_lint::{analyze_file, RuleFilter};
//! use std::io::Write;
//!
//! let mut file = tempfile::NamedTempFile::new().unwrap();
//! write!(file, r#"{{"version": "1", "file": "demo.allium"}}"#).unwrap();
//!
//! let report = analyze_file(file.path(), &RuleFilter::all(), false).unwrap();
//! assert!(!report.has_errors());
//! ```
//!
//! ## Modules
//!
//! - [`ast`]: the parsed document tree
//! - [`loader`]: filesystem and JSON boundary
//! - [`schema`]: the upstream shape-validation seam
//! - [`symbol_table`]: name resolution over a [`ast::Spec`]
//! - [`walk`]: recursive visitors over expressions and ensures clauses
//! - [`passes`]: the independent semantic checks (`RULE-01`..`RULE-35`, `WARN-01`..`WARN-19`)
//! - [`orchestrator`]: wires the symbol table, schema seam, and pass registry together
//! - [`finding`]: the result vocabulary (`Finding`, `Report`)

pub mod ast;
pub mod error;
pub mod finding;
pub mod loader;
pub mod orchestrator;
pub mod passes;
pub mod path;
pub mod schema;
pub mod symbol_table;
pub mod walk;

use std::path::Path as FsPath;

pub use ast::Spec;
pub use error::LoadError;
pub use finding::{Finding, Report, Severity};
pub use orchestrator::{analyze, RuleFilter};
pub use schema::{NullSchemaValidator, SchemaValidator};
pub use symbol_table::SymbolTable;

/// Load `path`, validate it against `validator`, and run the semantic
/// pass registry, restricted to `filter`. Convenience wrapper around
/// [`loader::load_value`] + [`orchestrator::analyze`] for callers that
/// don't need the intermediate raw JSON value.
pub fn analyze_file_with(
    path: &FsPath,
    validator: &dyn SchemaValidator,
    filter: &RuleFilter,
    schema_only: bool,
) -> Result<Report, LoadError> {
    let raw = loader::load_value(path)?;
    let spec = loader::parse_spec(path, raw.clone())?;
    Ok(analyze(&spec, &raw, validator, filter, schema_only))
}

/// [`analyze_file_with`] against [`NullSchemaValidator`], for callers with
/// no external schema validator wired up yet.
pub fn analyze_file(path: &FsPath, filter: &RuleFilter, schema_only: bool) -> Result<Report, LoadError> {
    analyze_file_with(path, &NullSchemaValidator, filter, schema_only)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn analyze_file_reports_reference_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "version": "1",
                "file": "demo.allium",
                "entities": [{{
                    "name": "Order",
                    "fields": [{{"name": "owner", "type": {{"kind": "entity_ref", "entity_name": "Customer"}}}}]
                }}]
            }}"#
        )
        .unwrap();

        let report = analyze_file(file.path(), &RuleFilter::all(), false).unwrap();
        assert!(report.has_errors());
        assert!(report.errors.iter().any(|f| f.rule == "RULE-01"));
    }

    #[test]
    fn analyze_file_propagates_load_errors() {
        let err = analyze_file(FsPath::new("/nonexistent/allium/doc.json"), &RuleFilter::all(), false).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
