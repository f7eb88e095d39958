//! Reads a document from disk and deserializes it into a [`Spec`].
//!
//! The core never touches the filesystem outside this module. Loading is
//! split into two steps — raw JSON, then typed [`Spec`] — so a caller can
//! run the external [`crate::schema::SchemaValidator`] against the raw
//! value before committing to the typed shape.

use std::fs;
use std::path::Path;

use crate::ast::Spec;
use crate::error::LoadError;

/// Read `path` and parse it as JSON, without interpreting it as a [`Spec`]
/// yet.
pub fn load_value(path: &Path) -> Result<serde_json::Value, LoadError> {
    let bytes = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&bytes).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Interpret an already-parsed JSON value as a [`Spec`].
pub fn parse_spec(path: &Path, raw: serde_json::Value) -> Result<Spec, LoadError> {
    serde_json::from_value(raw).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read and parse `path` directly into a [`Spec`], skipping the schema
/// validation seam. Used by tests and by callers that have no schema
/// validator to run.
pub fn load(path: &Path) -> Result<Spec, LoadError> {
    let raw = load_value(path)?;
    parse_spec(path, raw)
}
