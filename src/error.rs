//! Error types for the loader boundary.
//!
//! Semantic findings (`RULE-NN`/`WARN-NN`/`SCHEMA`) are never represented as
//! Rust errors — they are [`crate::finding::Finding`] values accumulated
//! into a [`crate::finding::Report`]. `LoadError` covers only the `INPUT`
//! diagnostic class: the document could not be read or parsed as JSON at
//! all.

use std::path::PathBuf;

use thiserror::Error;

/// Failure to obtain a [`crate::ast::Spec`] from a path.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// The path the failing load attempt targeted.
    pub fn path(&self) -> &PathBuf {
        match self {
            LoadError::Io { path, .. } => path,
            LoadError::Json { path, .. } => path,
        }
    }
}
