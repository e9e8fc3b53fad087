//! Catalog document envelope

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The on-disk catalog: `{generatedAt, count, products}`.
///
/// `products` stays untyped here; records are validated one by one at load
/// time so a single malformed entry never sinks the whole document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub count: usize,
    pub products: Vec<Value>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// A product entry that could not be read as a `ProductRecord`.
///
/// It never reaches the engine and is written back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectedRecord {
    /// Position in the input `products` array
    pub index: usize,
    pub reason: String,
    #[serde(skip)]
    pub raw: Value,
}
