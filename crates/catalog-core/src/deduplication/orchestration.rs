//! Catalog deduplication pipeline
//!
//! Buckets records by structural key, clusters each bucket by name
//! similarity, then merges or flags each cluster. Pure and single-threaded:
//! the same input and config always give the same catalog and report.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, info, warn};

use super::clustering::cluster_signatures;
use super::selection::{enrich_survivor, resolve_cluster, MergeDecision};
use super::similarity::NameSignature;
use super::structural_key::{build_structural_key, StructuralKey};
use crate::config::DedupConfig;
use crate::domain::ProductRecord;
use crate::report::{
    AutoMergeGroup, DedupReport, ExcludedRecord, FlaggedGroup, FlaggedMember, LargeCluster,
};

/// Result of a deduplication run
#[derive(Debug, Clone, PartialEq)]
pub struct DedupOutcome {
    /// Survivors, flagged members and unclustered records, by source id
    pub catalog: Vec<ProductRecord>,
    pub report: DedupReport,
}

/// One bucket: its key and the input indices of its members
struct Bucket {
    key: StructuralKey,
    members: Vec<usize>,
}

/// Partition records into buckets; unkeyed records go to the report
fn bucket_records(
    products: &[ProductRecord],
    config: &DedupConfig,
    report: &mut DedupReport,
) -> BTreeMap<String, Bucket> {
    let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();

    for (index, product) in products.iter().enumerate() {
        match build_structural_key(product) {
            Ok(key) => {
                let bucket_key = if config.partition_by_price {
                    key.merge_key(product.price)
                } else {
                    key.bucket_key()
                };
                buckets
                    .entry(bucket_key)
                    .or_insert_with(|| Bucket {
                        key,
                        members: Vec::new(),
                    })
                    .members
                    .push(index);
            }
            Err(reason) => {
                debug!(source_id = product.source_id, %reason, "excluded from clustering");
                report.excluded.push(ExcludedRecord {
                    source_id: product.source_id,
                    reason,
                });
            }
        }
    }

    buckets
}

/// Member count of every bucket, keyed by bucket key
///
/// Read-only view of the partition `dedupe_catalog` compares within.
pub fn bucket_sizes(products: &[ProductRecord], config: &DedupConfig) -> BTreeMap<String, usize> {
    let mut scratch = DedupReport::default();
    bucket_records(products, config, &mut scratch)
        .into_iter()
        .map(|(key, bucket)| (key, bucket.members.len()))
        .collect()
}

/// Deduplicate a catalog
///
/// Never fails: records without a structural key pass through untouched and
/// ambiguous clusters are flagged rather than merged.
pub fn dedupe_catalog(products: &[ProductRecord], config: &DedupConfig) -> DedupOutcome {
    let mut report = DedupReport {
        input_count: products.len(),
        ..Default::default()
    };

    let buckets = bucket_records(products, config, &mut report);

    let mut deleted = vec![false; products.len()];
    let mut enriched: HashMap<usize, ProductRecord> = HashMap::new();

    for (bucket_key, bucket) in &buckets {
        if bucket.members.len() < 2 {
            continue;
        }

        let signatures: Vec<NameSignature> = bucket
            .members
            .iter()
            .map(|&i| NameSignature::of(&products[i]))
            .collect();

        for group in cluster_signatures(&signatures, config, &mut report.pairs_compared) {
            let indices: Vec<usize> = group.iter().map(|&g| bucket.members[g]).collect();
            let cluster: Vec<&ProductRecord> = indices.iter().map(|&i| &products[i]).collect();

            if cluster.len() > config.large_cluster_threshold {
                warn!(
                    key = %bucket_key,
                    size = cluster.len(),
                    "large duplicate cluster, worth a manual spot check"
                );
                report.large_clusters.push(LargeCluster {
                    key: bucket_key.clone(),
                    source_ids: cluster.iter().map(|p| p.source_id).collect(),
                });
            }

            match resolve_cluster(&cluster, config) {
                MergeDecision::AutoMerge {
                    survivor,
                    survivor_position,
                    survivor_score,
                    ..
                } => {
                    let survivor_index = indices[survivor_position];
                    let losers: Vec<usize> = indices
                        .iter()
                        .copied()
                        .filter(|&i| i != survivor_index)
                        .collect();
                    let loser_records: Vec<&ProductRecord> =
                        losers.iter().map(|&i| &products[i]).collect();

                    let mut kept = products[survivor_index].clone();
                    let filled_fields = if config.enrich_survivor {
                        enrich_survivor(&mut kept, &loser_records, config)
                    } else {
                        Vec::new()
                    };
                    if !filled_fields.is_empty() {
                        enriched.insert(survivor_index, kept);
                    }

                    for &i in &losers {
                        deleted[i] = true;
                    }

                    let mut deleted_ids: Vec<i64> =
                        loser_records.iter().map(|p| p.source_id).collect();
                    deleted_ids.sort_unstable();

                    let mut names = vec![products[survivor_index].name.clone()];
                    names.extend(loser_records.iter().map(|p| p.name.clone()));

                    debug!(
                        key = %bucket_key,
                        kept = survivor,
                        deleted = ?deleted_ids,
                        "auto-merged duplicate cluster"
                    );

                    report.auto_deleted_groups.push(AutoMergeGroup {
                        key: bucket.key.merge_key(products[survivor_index].price),
                        kept: survivor,
                        deleted: deleted_ids,
                        names,
                        score: survivor_score,
                        filled_fields,
                    });
                }
                MergeDecision::Flagged { reason } => {
                    let prices: BTreeSet<i64> = cluster.iter().map(|p| p.price).collect();
                    debug!(
                        key = %bucket_key,
                        ?reason,
                        size = cluster.len(),
                        "flagged duplicate cluster for review"
                    );
                    report.flagged_groups.push(FlaggedGroup {
                        key: bucket_key.clone(),
                        reason,
                        prices: prices.into_iter().collect(),
                        members: cluster
                            .iter()
                            .map(|p| FlaggedMember {
                                source_id: p.source_id,
                                price: p.price,
                                name: p.name.clone(),
                                slug: p.slug.clone(),
                            })
                            .collect(),
                    });
                }
            }
        }
    }

    let mut catalog: Vec<ProductRecord> = products
        .iter()
        .enumerate()
        .filter(|(i, _)| !deleted[*i])
        .map(|(i, p)| enriched.remove(&i).unwrap_or_else(|| p.clone()))
        .collect();
    catalog.sort_by_key(|p| p.source_id);

    let mut deleted_ids: Vec<i64> = products
        .iter()
        .enumerate()
        .filter(|(i, _)| deleted[*i])
        .map(|(_, p)| p.source_id)
        .collect();
    deleted_ids.sort_unstable();

    report.output_count = catalog.len();
    report.auto_deleted_count = deleted_ids.len();
    report.auto_deleted_source_ids = deleted_ids;
    report.flagged_for_review_count = report.flagged_groups.len();
    report.excluded_count = report.excluded.len();

    info!(
        input = report.input_count,
        output = report.output_count,
        deleted = report.auto_deleted_count,
        flagged = report.flagged_for_review_count,
        excluded = report.excluded_count,
        buckets = buckets.len(),
        "deduplication complete"
    );

    DedupOutcome { catalog, report }
}
