//! Seam for the upstream, out-of-core schema validator.
//!
//! The core assumes a schema-validated document; it never checks document
//! shape itself. `SchemaValidator` is the collaborator interface a real
//! shape-checker would implement. [`NullSchemaValidator`] is the default:
//! it reports the document clean, matching the documented stance that "the
//! core presumes cleanliness."

use crate::finding::Finding;

pub trait SchemaValidator {
    /// Inspect the raw, not-yet-typed document and return any shape
    /// errors, tagged `SCHEMA` by the caller.
    fn check(&self, raw: &serde_json::Value) -> Vec<Finding>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullSchemaValidator;

impl SchemaValidator for NullSchemaValidator {
    fn check(&self, _raw: &serde_json::Value) -> Vec<Finding> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_validator_reports_nothing() {
        let validator = NullSchemaValidator;
        let findings = validator.check(&serde_json::json!({"anything": true}));
        assert!(findings.is_empty());
    }
}
