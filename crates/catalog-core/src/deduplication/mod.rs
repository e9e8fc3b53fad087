//! Deduplication engine for product catalogs
//!
//! Records are bucketed by a structural key (brand, pack count, potency),
//! clustered within each bucket by name similarity, and each cluster is
//! either merged into one survivor or flagged for review.

mod clustering;
mod normalization;
mod orchestration;
mod selection;
mod similarity;
mod structural_key;

pub use clustering::{cluster_bucket, connected_components};
pub use normalization::{normalize_potency, normalize_text};
pub use orchestration::{bucket_sizes, dedupe_catalog, DedupOutcome};
pub use selection::{enrich_survivor, quality_score, resolve_cluster, FlagReason, MergeDecision};
pub use similarity::{
    compare_signatures, is_same_product, jaccard_similarity, name_tokens, MatchReason,
    NameSignature,
};
pub use structural_key::{build_structural_key, extract_count_unit, ExclusionReason, StructuralKey};
