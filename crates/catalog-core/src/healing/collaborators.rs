//! Collaborator boundary for image healing
//!
//! Search, scraping and upload live outside this crate. They are consumed as
//! black boxes that may fail; the engine never retries or times them out.

use async_trait::async_trait;

use crate::error::CollaboratorError;

/// Finds a product page for a free-text query
#[async_trait]
pub trait CandidateSearch: Send + Sync {
    async fn search_candidate_url(&self, query: &str) -> Result<Option<String>, CollaboratorError>;
}

/// Extracts image URLs from a product page
#[async_trait]
pub trait ImageScraper: Send + Sync {
    async fn scrape_image_candidates(&self, url: &str) -> Result<Vec<String>, CollaboratorError>;
}

/// Copies images to owned storage, returning the new URLs in order
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload_images(
        &self,
        urls: &[String],
        path_hint: &str,
    ) -> Result<Vec<String>, CollaboratorError>;
}

/// The three collaborators a healing run needs
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub search: &'a dyn CandidateSearch,
    pub scraper: &'a dyn ImageScraper,
    pub uploader: &'a dyn ImageUploader,
}
