//! Error types for catalog-core

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Main error type for catalog operations
///
/// Only structural problems with the input document are errors. Records that
/// cannot be compared are excluded from clustering, never reported here.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Reading or writing a catalog/report file failed
    #[error("IO error on {path:?}: {message}")]
    Io { path: PathBuf, message: String },

    /// The document is not valid JSON
    #[error("JSON error: {0}")]
    Json(String),

    /// The document has no `products` array
    #[error("Catalog document has no `products` array")]
    MissingProducts,

    /// Two records share a source id
    #[error("Duplicate sourceId {0} in catalog")]
    DuplicateSourceId(i64),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("IO error: {0}")]
    Io(String),

    /// Config file is not valid TOML
    #[error("TOML parse error: {0}")]
    Parse(String),

    /// A value is out of range
    #[error("Invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Failures at the collaborator boundary (search, scrape, upload)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    /// Candidate search failed
    #[error("search failed: {0}")]
    Search(String),

    /// Scraping a candidate page failed
    #[error("scrape failed: {0}")]
    Scrape(String),

    /// Uploading images failed
    #[error("upload failed: {0}")]
    Upload(String),

    /// The collaborators returned nothing usable
    #[error("no candidates: {0}")]
    NoCandidates(String),
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Json(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err.to_string())
    }
}

impl CatalogError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        CatalogError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
