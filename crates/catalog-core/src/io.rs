//! Reading and writing catalog and report documents

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::{CatalogDocument, ProductRecord, RejectedRecord};
use crate::error::{CatalogError, Result};
use crate::report::{DedupReport, ReportArtifact};

/// A catalog split into engine-ready records and rejected raw entries
#[derive(Debug, Clone)]
pub struct LoadedCatalog {
    /// The document with `products` emptied; other top-level fields survive
    pub envelope: CatalogDocument,
    pub records: Vec<ProductRecord>,
    pub rejected: Vec<RejectedRecord>,
}

/// Current time as an ISO-8601 UTC string with millisecond precision
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a catalog document
///
/// Fails only when the document itself is unusable: invalid JSON, no
/// `products` array, or two valid records sharing a `sourceId`. Entries that
/// do not fit `ProductRecord` are rejected individually.
pub fn parse_catalog(content: &str) -> Result<LoadedCatalog> {
    let root: Value = serde_json::from_str(content)?;
    if !root.get("products").is_some_and(Value::is_array) {
        return Err(CatalogError::MissingProducts);
    }

    let mut envelope: CatalogDocument = serde_json::from_value(root)?;
    let raw_products = std::mem::take(&mut envelope.products);

    let mut records = Vec::with_capacity(raw_products.len());
    let mut rejected = Vec::new();
    let mut seen: HashSet<i64> = HashSet::new();

    for (index, raw) in raw_products.into_iter().enumerate() {
        match serde_json::from_value::<ProductRecord>(raw.clone()) {
            Ok(record) => {
                if !seen.insert(record.source_id) {
                    return Err(CatalogError::DuplicateSourceId(record.source_id));
                }
                records.push(record);
            }
            Err(err) => {
                warn!(index, error = %err, "rejected malformed product record");
                rejected.push(RejectedRecord {
                    index,
                    reason: err.to_string(),
                    raw,
                });
            }
        }
    }

    Ok(LoadedCatalog {
        envelope,
        records,
        rejected,
    })
}

/// Read and parse a catalog file
pub fn load_catalog(path: impl AsRef<Path>) -> Result<LoadedCatalog> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| CatalogError::io(path, e))?;
    parse_catalog(&content)
}

/// Build the output document: records first, rejected entries verbatim after
pub fn render_catalog(
    envelope: &CatalogDocument,
    records: &[ProductRecord],
    rejected: &[RejectedRecord],
    generated_at: &str,
) -> Result<CatalogDocument> {
    let mut products = Vec::with_capacity(records.len() + rejected.len());
    for record in records {
        products.push(serde_json::to_value(record)?);
    }
    products.extend(rejected.iter().map(|r| r.raw.clone()));

    Ok(CatalogDocument {
        generated_at: Some(generated_at.to_string()),
        count: products.len(),
        products,
        extra: envelope.extra.clone(),
    })
}

/// Overwrite a catalog file with the deduplicated records
pub fn write_catalog(
    path: impl AsRef<Path>,
    envelope: &CatalogDocument,
    records: &[ProductRecord],
    rejected: &[RejectedRecord],
    generated_at: &str,
) -> Result<()> {
    let document = render_catalog(envelope, records, rejected, generated_at)?;
    write_json_atomic(path.as_ref(), &document)
}

/// Write the report artifact
pub fn write_report(path: impl AsRef<Path>, report: &DedupReport, run_at: &str) -> Result<()> {
    let artifact = ReportArtifact {
        run_at: run_at.to_string(),
        report,
    };
    write_json_atomic(path.as_ref(), &artifact)
}

/// Write pretty JSON to a sibling temp file, then rename over `path`
fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut content = serde_json::to_string_pretty(value)?;
    content.push('\n');

    let tmp = temp_path(path);
    std::fs::write(&tmp, content).map_err(|e| CatalogError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| CatalogError::io(path, e))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(matches!(parse_catalog("{"), Err(CatalogError::Json(_))));
    }

    #[test]
    fn test_parse_requires_products_array() {
        assert!(matches!(
            parse_catalog(r#"{"count": 0}"#),
            Err(CatalogError::MissingProducts)
        ));
        assert!(matches!(
            parse_catalog(r#"{"products": {}}"#),
            Err(CatalogError::MissingProducts)
        ));
    }

    #[test]
    fn test_parse_rejects_duplicate_ids() {
        let doc = json!({"products": [
            {"sourceId": 1, "name": "A", "price": 1},
            {"sourceId": 1, "name": "B", "price": 2}
        ]});
        assert!(matches!(
            parse_catalog(&doc.to_string()),
            Err(CatalogError::DuplicateSourceId(1))
        ));
    }

    #[test]
    fn test_malformed_records_are_rejected_not_fatal() {
        let doc = json!({
            "generatedAt": "2024-01-01T00:00:00.000Z",
            "count": 3,
            "source": "import",
            "products": [
                {"sourceId": 1, "name": "A", "price": 1},
                {"name": "no id", "price": 2},
                {"sourceId": 3, "name": "C", "price": "abc"}
            ]
        });
        let loaded = parse_catalog(&doc.to_string()).unwrap();
        assert_eq!(loaded.records.len(), 1);
        assert_eq!(loaded.rejected.len(), 2);
        assert_eq!(loaded.rejected[0].index, 1);
        assert_eq!(loaded.rejected[1].index, 2);
        assert_eq!(loaded.envelope.extra.get("source"), Some(&json!("import")));
    }

    #[test]
    fn test_render_appends_rejected_and_counts() {
        let doc = json!({"products": [
            {"sourceId": 2, "name": "B", "price": 1},
            {"broken": true}
        ]});
        let loaded = parse_catalog(&doc.to_string()).unwrap();
        let rendered = render_catalog(
            &loaded.envelope,
            &loaded.records,
            &loaded.rejected,
            "2024-06-01T00:00:00.000Z",
        )
        .unwrap();
        assert_eq!(rendered.count, 2);
        assert_eq!(rendered.products[1], json!({"broken": true}));
        assert_eq!(rendered.generated_at.as_deref(), Some("2024-06-01T00:00:00.000Z"));
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let tmp = temp_path(Path::new("/data/catalog.json"));
        assert_eq!(tmp, PathBuf::from("/data/catalog.json.tmp"));
    }
}
