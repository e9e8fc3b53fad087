//! Canonical survivor selection and merge decisions

use std::cmp::Ordering;

use serde::Serialize;

use crate::config::DedupConfig;
use crate::domain::ProductRecord;

/// Why a cluster was left for manual review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagReason {
    /// Members disagree on price, so they may be distinct variants
    PriceConflict,
    /// Cluster exceeds `max_auto_merge_size`
    OversizedCluster,
    /// No members, so no survivor to pick
    EmptyCluster,
}

/// Outcome of resolving one cluster
#[derive(Debug, Clone, PartialEq)]
pub enum MergeDecision {
    /// Same price everywhere: keep `survivor`, delete the rest
    AutoMerge {
        survivor: i64,
        /// Position of the survivor in the resolved cluster slice
        survivor_position: usize,
        deleted: Vec<i64>,
        survivor_score: f64,
    },
    /// Leave every member untouched and report the group
    Flagged { reason: FlagReason },
}

/// Score a record for survivor selection
///
/// Favors images already on owned storage and richer descriptions; images
/// still on an untrusted mirror cost a little.
pub fn quality_score(product: &ProductRecord, config: &DedupConfig) -> f64 {
    let weights = &config.quality;
    let trusted = product.images_on_hosts(&config.trusted_image_hosts) as f64;
    let untrusted = product.images_on_hosts(&config.untrusted_image_hosts) as f64;
    let total = product.images.len() as f64;
    let description = product.description_len() as f64;

    weights.trusted_image_weight * trusted + weights.image_weight * total
        + description / weights.description_divisor
        - weights.untrusted_image_penalty * untrusted
}

/// Decide what to do with a cluster of same-product records
///
/// Price disagreement always wins over merging.
pub fn resolve_cluster(cluster: &[&ProductRecord], config: &DedupConfig) -> MergeDecision {
    let Some(first) = cluster.first() else {
        return MergeDecision::Flagged {
            reason: FlagReason::EmptyCluster,
        };
    };

    if cluster.iter().any(|p| p.price != first.price) {
        return MergeDecision::Flagged {
            reason: FlagReason::PriceConflict,
        };
    }

    if config
        .max_auto_merge_size
        .is_some_and(|max| cluster.len() > max)
    {
        return MergeDecision::Flagged {
            reason: FlagReason::OversizedCluster,
        };
    }

    let (survivor_position, survivor_score) = select_survivor(cluster, config);
    let survivor = cluster[survivor_position];
    let mut deleted: Vec<i64> = cluster
        .iter()
        .map(|p| p.source_id)
        .filter(|id| *id != survivor.source_id)
        .collect();
    deleted.sort_unstable();

    MergeDecision::AutoMerge {
        survivor: survivor.source_id,
        survivor_position,
        deleted,
        survivor_score,
    }
}

/// Highest quality score wins; equal scores go to the lowest source id
///
/// Returns the winner's position in `cluster`. Callers pass a non-empty slice.
fn select_survivor(cluster: &[&ProductRecord], config: &DedupConfig) -> (usize, f64) {
    let mut best = (0, f64::NEG_INFINITY);
    for (position, candidate) in cluster.iter().enumerate() {
        let score = quality_score(candidate, config);
        let better = match score.total_cmp(&best.1) {
            Ordering::Greater => true,
            Ordering::Equal => candidate.source_id < cluster[best.0].source_id,
            Ordering::Less => false,
        };
        if better {
            best = (position, score);
        }
    }
    best
}

/// Fill empty survivor fields from the deleted duplicates
///
/// Returns the names of the fields that were filled.
pub fn enrich_survivor(
    survivor: &mut ProductRecord,
    deleted: &[&ProductRecord],
    config: &DedupConfig,
) -> Vec<String> {
    let mut filled = Vec::new();

    if is_blank(survivor.description.as_deref()) {
        if let Some(text) = longest_text(deleted.iter().map(|p| p.description.as_deref())) {
            survivor.description = Some(text.to_string());
            filled.push("description".to_string());
        }
    }

    if is_blank(survivor.seo_description.as_deref()) {
        if let Some(text) = longest_text(deleted.iter().map(|p| p.seo_description.as_deref())) {
            survivor.seo_description = Some(text.to_string());
            filled.push("seoDescription".to_string());
        }
    }

    if survivor.images.is_empty() {
        let donor = deleted
            .iter()
            .filter(|p| !p.images.is_empty())
            .map(|p| (*p, quality_score(p, config)))
            .fold(None::<(&ProductRecord, f64)>, |best, (p, score)| match best {
                Some((b, s)) if s > score || (s == score && b.source_id < p.source_id) => {
                    Some((b, s))
                }
                _ => Some((p, score)),
            });
        if let Some((donor, _)) = donor {
            survivor.images = donor.images.clone();
            filled.push("images".to_string());
        }
    }

    filled
}

fn is_blank(text: Option<&str>) -> bool {
    text.map_or(true, |t| t.trim().is_empty())
}

/// Longest non-blank text; the earliest wins ties
fn longest_text<'a>(texts: impl Iterator<Item = Option<&'a str>>) -> Option<&'a str> {
    texts
        .flatten()
        .filter(|t| !t.trim().is_empty())
        .fold(None, |best: Option<&str>, t| match best {
            Some(b) if b.chars().count() >= t.chars().count() => Some(b),
            _ => Some(t),
        })
}
