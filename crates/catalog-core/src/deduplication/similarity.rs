//! Name similarity scoring for deduplication

use std::collections::{BTreeSet, HashSet};

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::normalization::normalize_text;
use crate::config::DedupConfig;
use crate::domain::ProductRecord;

lazy_static! {
    /// Packaging, dosage and marketing words that say nothing about identity
    static ref STOPWORDS: HashSet<&'static str> = [
        "dietary", "supplement", "supplements", "capsule", "capsules", "cap", "caps",
        "vcaps", "vegcaps", "tablet", "tablets", "tab", "tabs", "softgel", "softgels",
        "soft", "gels", "gummy", "gummies", "veggie", "vegetarian", "with", "and", "plus",
        "for", "per", "serving", "servings", "formula", "strength", "maximum", "max",
        "extra", "support", "high", "potency", "count", "ct", "pack", "the", "of", "in",
        "non", "gmo", "gluten", "new", "improved", "iu", "mg", "mcg", "ug", "ml",
    ]
    .into_iter()
    .collect();

    // Dosage or pack-size glued to a number: "5000iu", "500mg", "120caps"
    static ref MEASUREMENT_TOKEN_REGEX: Regex = Regex::new(
        r"^\d+(?:iu|mg|mcg|ug|g|kg|ml|oz|ct|caps?|tabs?|softgels?)$"
    ).unwrap();
}

/// Which rule declared two records the same product
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "rule")]
pub enum MatchReason {
    /// Normalized names are identical
    ExactName,
    /// Jaccard similarity reached the threshold
    Similarity { score: f64 },
    /// The intersection covers enough of both token sets
    Containment { shared: usize },
}

/// Precomputed comparison inputs for one record
#[derive(Debug, Clone, PartialEq)]
pub struct NameSignature {
    pub normalized_name: String,
    pub tokens: BTreeSet<String>,
}

impl NameSignature {
    pub fn of(product: &ProductRecord) -> Self {
        Self {
            normalized_name: normalize_text(&product.name),
            tokens: name_tokens(&product.name, &product.brand),
        }
    }
}

/// Identity-bearing tokens of a product name
///
/// Drops one-character tokens, pure numbers, measurement tokens, stopwords
/// and any word that also appears in the brand.
pub fn name_tokens(name: &str, brand: &str) -> BTreeSet<String> {
    let normalized_brand = normalize_text(brand);
    let brand_tokens: HashSet<&str> = normalized_brand.split_whitespace().collect();

    normalize_text(name)
        .split_whitespace()
        .filter(|t| t.chars().count() > 1)
        .filter(|t| !t.chars().all(|c| c.is_ascii_digit()))
        .filter(|t| !MEASUREMENT_TOKEN_REGEX.is_match(t))
        .filter(|t| !STOPWORDS.contains(t))
        .filter(|t| !brand_tokens.contains(t))
        .map(str::to_string)
        .collect()
}

/// Intersection over union; 0 when either set is empty
pub fn jaccard_similarity(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;

    intersection as f64 / union as f64
}

/// Compare two signatures, returning the first rule that matches
pub fn compare_signatures(
    a: &NameSignature,
    b: &NameSignature,
    config: &DedupConfig,
) -> Option<MatchReason> {
    if !a.normalized_name.is_empty() && a.normalized_name == b.normalized_name {
        return Some(MatchReason::ExactName);
    }

    let score = jaccard_similarity(&a.tokens, &b.tokens);
    if score >= config.similarity_threshold {
        return Some(MatchReason::Similarity { score });
    }

    let shared = a.tokens.intersection(&b.tokens).count();
    if shared >= config.containment_min_shared_tokens {
        let coverage_a = shared as f64 / a.tokens.len() as f64;
        let coverage_b = shared as f64 / b.tokens.len() as f64;
        if coverage_a >= config.containment_min_coverage
            && coverage_b >= config.containment_min_coverage
        {
            return Some(MatchReason::Containment { shared });
        }
    }

    None
}

/// Whether two records describe the same physical product by name
pub fn is_same_product(a: &ProductRecord, b: &ProductRecord, config: &DedupConfig) -> bool {
    compare_signatures(&NameSignature::of(a), &NameSignature::of(b), config).is_some()
}
