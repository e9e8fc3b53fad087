//! Engine configuration
//!
//! All decision thresholds and scoring weights live here so they can be tuned
//! against labeled data without touching the engine. Loaded from TOML:
//!
//! ```toml
//! similarity_threshold = 0.58
//! containment_min_shared_tokens = 4
//! containment_min_coverage = 0.72
//! trusted_image_hosts = ["cdn.example.com"]
//! untrusted_image_hosts = ["images-iherb.com"]
//! large_cluster_threshold = 4
//!
//! [quality]
//! trusted_image_weight = 10.0
//! image_weight = 2.0
//! description_divisor = 40.0
//! untrusted_image_penalty = 1.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration for a deduplication run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    /// Minimum Jaccard similarity for two names to match
    pub similarity_threshold: f64,
    /// Minimum shared tokens for the containment rule
    pub containment_min_shared_tokens: usize,
    /// Minimum share of *both* token sets covered by the intersection
    pub containment_min_coverage: f64,
    /// Survivor scoring weights
    pub quality: QualityWeights,
    /// Host fragments of owned image storage
    pub trusted_image_hosts: Vec<String>,
    /// Host fragments of third-party mirrors whose links are not durable
    pub untrusted_image_hosts: Vec<String>,
    /// Bucket by brand+count+potency+price instead of brand+count+potency
    pub partition_by_price: bool,
    /// Clusters larger than this are logged and listed for spot checks
    pub large_cluster_threshold: usize,
    /// Clusters larger than this are flagged instead of merged
    pub max_auto_merge_size: Option<usize>,
    /// Fill empty survivor fields from deleted duplicates
    pub enrich_survivor: bool,
    /// Maximum in-flight collaborator requests while healing images
    pub heal_concurrency: usize,
}

/// Weights for `quality_score`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub trusted_image_weight: f64,
    pub image_weight: f64,
    pub description_divisor: f64,
    pub untrusted_image_penalty: f64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.58,
            containment_min_shared_tokens: 4,
            containment_min_coverage: 0.72,
            quality: QualityWeights::default(),
            trusted_image_hosts: vec!["cdn.".to_string()],
            untrusted_image_hosts: vec!["images-iherb.com".to_string()],
            partition_by_price: false,
            large_cluster_threshold: 4,
            max_auto_merge_size: None,
            enrich_survivor: true,
            heal_concurrency: 8,
        }
    }
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            trusted_image_weight: 10.0,
            image_weight: 2.0,
            description_divisor: 40.0,
            untrusted_image_penalty: 1.0,
        }
    }
}

impl DedupConfig {
    /// Parse and validate a TOML document; missing keys take defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: DedupConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_interval("similarity_threshold", self.similarity_threshold)?;
        unit_interval("containment_min_coverage", self.containment_min_coverage)?;
        if self.containment_min_shared_tokens == 0 {
            return Err(ConfigError::Invalid {
                field: "containment_min_shared_tokens",
                reason: "must be at least 1".to_string(),
            });
        }
        let divisor = self.quality.description_divisor;
        if divisor.is_nan() || divisor <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "quality.description_divisor",
                reason: "must be positive".to_string(),
            });
        }
        if self.heal_concurrency == 0 {
            return Err(ConfigError::Invalid {
                field: "heal_concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_auto_merge_size.is_some_and(|max| max < 2) {
            return Err(ConfigError::Invalid {
                field: "max_auto_merge_size",
                reason: "must be at least 2".to_string(),
            });
        }
        Ok(())
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} is outside [0, 1]"),
        })
    }
}
