//! Image healing against in-memory collaborators

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use catalog_core::healing::{CandidateSearch, ImageScraper, ImageUploader};
use catalog_core::{
    dedupe_and_heal, heal_images, CollaboratorError, Collaborators, DedupConfig, ProductImage,
    ProductRecord,
};
use common::fixtures::supplement;

/// Finds a page for every query except obscure brands
struct ShopSearch;

#[async_trait]
impl CandidateSearch for ShopSearch {
    async fn search_candidate_url(&self, query: &str) -> Result<Option<String>, CollaboratorError> {
        if query.contains("Obscure") {
            return Ok(None);
        }
        Ok(Some(format!("https://shop.test/{}", query.replace(' ', "-"))))
    }
}

struct TwoImageScraper;

#[async_trait]
impl ImageScraper for TwoImageScraper {
    async fn scrape_image_candidates(&self, url: &str) -> Result<Vec<String>, CollaboratorError> {
        Ok(vec![format!("{url}/front.jpg"), format!("{url}/back.jpg")])
    }
}

/// Records every upload and tracks how many run at once
#[derive(Default)]
struct RecordingUploader {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    uploads: Mutex<Vec<(String, Vec<String>)>>,
    fail_hint: Option<String>,
}

#[async_trait]
impl ImageUploader for RecordingUploader {
    async fn upload_images(
        &self,
        urls: &[String],
        path_hint: &str,
    ) -> Result<Vec<String>, CollaboratorError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(10)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_hint.as_deref() == Some(path_hint) {
            return Err(CollaboratorError::Upload("storage unavailable".to_string()));
        }

        self.uploads
            .lock()
            .unwrap()
            .push((path_hint.to_string(), urls.to_vec()));
        Ok((0..urls.len())
            .map(|i| format!("https://cdn.example-shop.com/{path_hint}/{i}.jpg"))
            .collect())
    }
}

fn collaborators(uploader: &RecordingUploader) -> Collaborators<'_> {
    Collaborators {
        search: &ShopSearch,
        scraper: &TwoImageScraper,
        uploader,
    }
}

fn bare(id: i64, brand: &str, name: &str) -> ProductRecord {
    supplement(id, brand, name, "60 caps", "500mg", 1000)
}

#[tokio::test]
async fn test_backfills_missing_images() {
    let uploader = RecordingUploader::default();
    let mut record = bare(1, "Solgar", "Zinc Picolinate");
    record.slug = Some("solgar-zinc".to_string());

    let outcome = heal_images(vec![record], collaborators(&uploader), &DedupConfig::default()).await;

    assert_eq!(outcome.healed, vec![1]);
    assert!(outcome.failed.is_empty());

    let images = &outcome.records[0].images;
    assert_eq!(images.len(), 2);
    assert!(images[0].is_primary);
    assert!(!images[1].is_primary);
    assert_eq!(
        images[0].url,
        "https://cdn.example-shop.com/products/solgar-zinc/0.jpg"
    );

    let uploads = uploader.uploads.lock().unwrap();
    assert_eq!(
        uploads[0].1,
        vec![
            "https://shop.test/Solgar-Zinc-Picolinate/front.jpg",
            "https://shop.test/Solgar-Zinc-Picolinate/back.jpg",
        ]
    );
}

#[tokio::test]
async fn test_rehosts_only_untrusted_images() {
    let uploader = RecordingUploader::default();
    let mut mirrored = bare(1, "Solgar", "Zinc Picolinate");
    mirrored.images = vec![ProductImage::new(
        "https://cloudinary.images-iherb.com/sol/zinc.jpg",
        true,
    )];
    let mut owned = bare(2, "Solgar", "Vitamin C");
    owned.images = vec![ProductImage::new("https://cdn.example-shop.com/c.jpg", true)];

    let outcome = heal_images(
        vec![mirrored, owned.clone()],
        collaborators(&uploader),
        &DedupConfig::default(),
    )
    .await;

    assert_eq!(outcome.healed, vec![1]);
    assert_eq!(outcome.records[1], owned);

    let uploads = uploader.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].0, "products/1");
    assert_eq!(
        uploads[0].1,
        vec!["https://cloudinary.images-iherb.com/sol/zinc.jpg"]
    );
}

#[tokio::test]
async fn test_failures_keep_original_images() {
    let uploader = RecordingUploader {
        fail_hint: Some("products/3".to_string()),
        ..Default::default()
    };
    let mut mirrored = bare(3, "Solgar", "Vitamin C");
    mirrored.images = vec![ProductImage::new("https://s3.images-iherb.com/c.jpg", true)];
    let records = vec![
        bare(1, "Obscure Labs", "Mystery Blend"),
        bare(2, "Solgar", "Zinc Picolinate"),
        mirrored.clone(),
    ];

    let outcome = heal_images(records, collaborators(&uploader), &DedupConfig::default()).await;

    assert_eq!(outcome.healed, vec![2]);
    let failed: Vec<i64> = outcome.failed.iter().map(|f| f.source_id).collect();
    assert_eq!(failed, vec![1, 3]);
    assert!(outcome.failed[0].reason.contains("no page"));
    assert!(outcome.records[0].images.is_empty());
    assert_eq!(outcome.records[2], mirrored);
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let uploader = RecordingUploader::default();
    let records: Vec<ProductRecord> = (1..=10)
        .map(|id| bare(id, "Solgar", &format!("Formula {id}")))
        .collect();
    let config = DedupConfig {
        heal_concurrency: 3,
        ..DedupConfig::default()
    };

    let outcome = heal_images(records, collaborators(&uploader), &config).await;

    assert_eq!(outcome.healed, (1..=10).collect::<Vec<i64>>());
    let peak = uploader.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak {peak} exceeds bound");
    assert!(peak >= 2, "uploads never overlapped");
}

#[tokio::test]
async fn test_dedupe_and_heal_reports_failures() {
    let uploader = RecordingUploader::default();
    let products = vec![
        bare(1, "Obscure Labs", "Mystery Blend"),
        bare(2, "Obscure Labs", "Mystery Blend"),
        bare(3, "Solgar", "Zinc Picolinate"),
    ];

    let outcome = dedupe_and_heal(&products, collaborators(&uploader), &DedupConfig::default()).await;

    assert_eq!(outcome.report.auto_deleted_source_ids, vec![2]);
    assert_eq!(outcome.catalog.len(), 2);
    assert_eq!(outcome.report.image_failures.len(), 1);
    assert_eq!(outcome.report.image_failures[0].source_id, 1);
    assert_eq!(outcome.catalog[1].images.len(), 2);
}
