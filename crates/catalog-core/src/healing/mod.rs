//! Image healing: backfill missing images and re-host images that still
//! point at an untrusted mirror.
//!
//! Collaborator calls are I/O-bound and run on a bounded pool; each record
//! is handled independently and results are written back by index, so the
//! outcome does not depend on completion order.

mod collaborators;

pub use collaborators::{CandidateSearch, Collaborators, ImageScraper, ImageUploader};

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::DedupConfig;
use crate::deduplication::{dedupe_catalog, DedupOutcome};
use crate::domain::{images_from_urls, ProductRecord};
use crate::error::CollaboratorError;

/// A record whose images could not be healed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealFailure {
    pub source_id: i64,
    pub reason: String,
}

/// Result of a healing pass
#[derive(Debug, Clone, PartialEq)]
pub struct HealOutcome {
    pub records: Vec<ProductRecord>,
    /// Source ids whose images were replaced, in record order
    pub healed: Vec<i64>,
    pub failed: Vec<HealFailure>,
}

/// What a record needs
#[derive(Debug, Clone, PartialEq)]
enum HealPlan {
    /// No images at all: search, scrape, upload
    Backfill { query: String },
    /// Every image is on an untrusted host: upload the existing URLs
    Rehost { urls: Vec<String> },
}

fn plan_for(record: &ProductRecord, config: &DedupConfig) -> Option<HealPlan> {
    if record.images.is_empty() {
        let query = format!("{} {}", record.brand, record.name).trim().to_string();
        if query.is_empty() {
            return None;
        }
        return Some(HealPlan::Backfill { query });
    }

    let all_untrusted = record
        .images
        .iter()
        .all(|img| img.is_hosted_on(&config.untrusted_image_hosts));
    if all_untrusted {
        let urls = record.images.iter().map(|img| img.url.clone()).collect();
        return Some(HealPlan::Rehost { urls });
    }

    None
}

fn path_hint(record: &ProductRecord) -> String {
    match record.slug.as_deref().filter(|s| !s.is_empty()) {
        Some(slug) => format!("products/{slug}"),
        None => format!("products/{}", record.source_id),
    }
}

async fn run_plan(
    plan: &HealPlan,
    path_hint: &str,
    collaborators: Collaborators<'_>,
) -> Result<Vec<String>, CollaboratorError> {
    let source_urls = match plan {
        HealPlan::Backfill { query } => {
            let page = collaborators
                .search
                .search_candidate_url(query)
                .await?
                .ok_or_else(|| CollaboratorError::NoCandidates(format!("no page for {query:?}")))?;
            let candidates = collaborators.scraper.scrape_image_candidates(&page).await?;
            if candidates.is_empty() {
                return Err(CollaboratorError::NoCandidates(format!("no images on {page}")));
            }
            candidates
        }
        HealPlan::Rehost { urls } => urls.clone(),
    };

    let uploaded = collaborators
        .uploader
        .upload_images(&source_urls, path_hint)
        .await?;
    if uploaded.is_empty() {
        return Err(CollaboratorError::Upload("upload returned no URLs".to_string()));
    }
    Ok(uploaded)
}

/// Heal images across a catalog
///
/// At most `config.heal_concurrency` records are in flight. A failing record
/// keeps its original images and is listed in `failed`; the batch goes on.
pub async fn heal_images(
    mut records: Vec<ProductRecord>,
    collaborators: Collaborators<'_>,
    config: &DedupConfig,
) -> HealOutcome {
    let jobs: Vec<(usize, HealPlan, String)> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            plan_for(record, config).map(|plan| (index, plan, path_hint(record)))
        })
        .collect();

    debug!(jobs = jobs.len(), "healing images");

    let mut results: Vec<(usize, Result<Vec<String>, CollaboratorError>)> =
        stream::iter(jobs.iter().map(move |(index, plan, hint)| async move {
            (*index, run_plan(plan, hint, collaborators).await)
        }))
        .buffer_unordered(config.heal_concurrency.max(1))
        .collect()
        .await;
    results.sort_by_key(|(index, _)| *index);

    let mut healed = Vec::new();
    let mut failed = Vec::new();

    for (index, result) in results {
        let record = &mut records[index];
        match result {
            Ok(urls) => {
                record.images = images_from_urls(&urls);
                healed.push(record.source_id);
            }
            Err(err) => {
                warn!(source_id = record.source_id, error = %err, "image healing failed");
                failed.push(HealFailure {
                    source_id: record.source_id,
                    reason: err.to_string(),
                });
            }
        }
    }

    info!(
        healed = healed.len(),
        failed = failed.len(),
        "image healing complete"
    );

    HealOutcome {
        records,
        healed,
        failed,
    }
}

/// Deduplicate, then heal the images of the deduplicated catalog
///
/// Healing failures are recorded in the report's `image_failures`.
pub async fn dedupe_and_heal(
    products: &[ProductRecord],
    collaborators: Collaborators<'_>,
    config: &DedupConfig,
) -> DedupOutcome {
    let DedupOutcome {
        catalog,
        mut report,
    } = dedupe_catalog(products, config);

    let healed = heal_images(catalog, collaborators, config).await;
    report.image_failures = healed.failed;

    DedupOutcome {
        catalog: healed.records,
        report,
    }
}
