//! catalog-core: deduplication engine for imported product catalogs.
//!
//! Product records scraped from several sources often describe the same
//! physical product under different names. This crate finds those groups and
//! collapses each into one canonical record, writing an audit report of every
//! decision.
//!
//! # Pipeline
//!
//! 1. Each record gets a structural key: normalized brand, pack count and
//!    unit, and potency. Records missing any part pass through untouched.
//! 2. Records sharing a key form a bucket; names within a bucket are compared
//!    by token-set similarity and grouped with union-find.
//! 3. A cluster whose members all share one price is merged into its
//!    highest-quality member. A cluster with conflicting prices is flagged for
//!    review and left as is.
//!
//! ```
//! use catalog_core::{dedupe_catalog, DedupConfig, ProductRecord};
//!
//! let mut a = ProductRecord::new(1, "Vitamin D3 5000 IU 120 Softgels", "NOW Foods", 15000);
//! a.potency = "5000 IU".to_string();
//! let mut b = ProductRecord::new(2, "Vitamin D3 5000iu NOW Foods 120 softgels", "NOW Foods", 15000);
//! b.potency = "5000 IU".to_string();
//!
//! let outcome = dedupe_catalog(&[a, b], &DedupConfig::default());
//! assert_eq!(outcome.catalog.len(), 1);
//! assert_eq!(outcome.report.auto_deleted_source_ids, vec![2]);
//! ```

pub mod config;
pub mod deduplication;
pub mod domain;
pub mod error;
pub mod healing;
pub mod io;
pub mod report;

pub use config::{DedupConfig, QualityWeights};
pub use deduplication::{dedupe_catalog, DedupOutcome};
pub use domain::{CatalogDocument, ProductImage, ProductRecord, RejectedRecord};
pub use error::{CatalogError, CollaboratorError, ConfigError, Result};
pub use healing::{dedupe_and_heal, heal_images, Collaborators, HealFailure, HealOutcome};
pub use io::{load_catalog, write_catalog, write_report, LoadedCatalog};
pub use report::DedupReport;
