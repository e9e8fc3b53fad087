//! Audit report of a deduplication run
//!
//! The report lists every decision the engine made, enough to audit or
//! reverse any merge by hand.

use serde::Serialize;

use crate::deduplication::{ExclusionReason, FlagReason};
use crate::domain::RejectedRecord;
use crate::healing::HealFailure;

/// Full record of one run (timestamp excluded, see [`ReportArtifact`])
///
/// `input_count` and `output_count` cover every product entry of the
/// document once [`DedupReport::record_rejected`] has run, so `output_count`
/// matches the `count` of the written catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DedupReport {
    pub input_count: usize,
    pub output_count: usize,
    /// Entries that never reached the engine and are written back verbatim
    pub rejected_count: usize,
    pub auto_deleted_count: usize,
    pub auto_deleted_source_ids: Vec<i64>,
    pub auto_deleted_groups: Vec<AutoMergeGroup>,
    pub flagged_for_review_count: usize,
    pub flagged_groups: Vec<FlaggedGroup>,
    pub excluded_count: usize,
    pub excluded: Vec<ExcludedRecord>,
    pub large_clusters: Vec<LargeCluster>,
    /// Pairwise name comparisons performed across all buckets
    pub pairs_compared: usize,
    pub rejected_records: Vec<RejectedRecord>,
    pub image_failures: Vec<HealFailure>,
}

impl DedupReport {
    /// Account for entries rejected at load time
    ///
    /// They pass through unchanged, so they count toward both input and output.
    pub fn record_rejected(&mut self, rejected: &[RejectedRecord]) {
        self.input_count += rejected.len();
        self.output_count += rejected.len();
        self.rejected_count += rejected.len();
        self.rejected_records.extend(rejected.iter().cloned());
    }
}

/// A cluster collapsed into one survivor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoMergeGroup {
    /// Strict key: brand|count-unit|potency|price
    pub key: String,
    pub kept: i64,
    pub deleted: Vec<i64>,
    /// Member names, survivor first
    pub names: Vec<String>,
    pub score: f64,
    /// Survivor fields filled from deleted members
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filled_fields: Vec<String>,
}

/// A cluster left untouched for manual review
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedGroup {
    pub key: String,
    pub reason: FlagReason,
    /// Distinct member prices, ascending
    pub prices: Vec<i64>,
    pub members: Vec<FlaggedMember>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlaggedMember {
    pub source_id: i64,
    pub price: i64,
    pub name: String,
    pub slug: Option<String>,
}

/// A record kept out of clustering
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcludedRecord {
    pub source_id: i64,
    pub reason: ExclusionReason,
}

/// A cluster above the spot-check size threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LargeCluster {
    pub key: String,
    pub source_ids: Vec<i64>,
}

/// The report as written to disk
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportArtifact<'a> {
    pub run_at: String,
    #[serde(flatten)]
    pub report: &'a DedupReport,
}
