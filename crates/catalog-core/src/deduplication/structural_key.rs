//! Structural bucketing keys
//!
//! A key is `(brand, count+unit, potency)`. Records are only ever compared
//! with records sharing a key, so cross-bucket merges cannot happen.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use super::normalization::{normalize_potency, normalize_text};
use crate::domain::ProductRecord;

lazy_static! {
    // 1-4 digit count directly followed by a pack unit: "120 caps", "60softgels", "90 soft gels"
    static ref COUNT_UNIT_REGEX: Regex = Regex::new(
        r"(?i)\b(?P<count>\d{1,4})\s*(?P<unit>capsules?|caps?|soft\s*gels?|tablets?|tabs?|gumm(?:y|ies))\b"
    ).unwrap();
}

/// Why a record has no structural key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    MissingBrand,
    MissingCountUnit,
    MissingPotency,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExclusionReason::MissingBrand => "missing brand",
            ExclusionReason::MissingCountUnit => "no count/unit",
            ExclusionReason::MissingPotency => "no usable potency",
        };
        f.write_str(label)
    }
}

/// Coarse fingerprint used to bucket duplicate candidates
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructuralKey {
    pub brand: String,
    pub count_unit: String,
    pub potency: String,
}

impl StructuralKey {
    /// Broad key: brand + count/unit + potency
    pub fn bucket_key(&self) -> String {
        format!("{}|{}|{}", self.brand, self.count_unit, self.potency)
    }

    /// Strict key used for auto-merge groups: the broad key plus price
    pub fn merge_key(&self, price: i64) -> String {
        format!("{}|{}", self.bucket_key(), price)
    }
}

impl fmt::Display for StructuralKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.bucket_key())
    }
}

/// Extract `"{count}-{unit}"` from pack-size text, or an empty string
///
/// The first match wins, so callers put the most specific text first.
pub fn extract_count_unit(text: &str) -> String {
    COUNT_UNIT_REGEX
        .captures(text)
        .and_then(|cap| {
            let count = cap.name("count")?.as_str().parse::<u32>().ok()?;
            let unit = canonical_unit(cap.name("unit")?.as_str())?;
            Some(format!("{count}-{unit}"))
        })
        .unwrap_or_default()
}

/// Map a matched unit word onto one of the four canonical labels
fn canonical_unit(word: &str) -> Option<&'static str> {
    let word = word.to_lowercase();
    if word.starts_with("soft") {
        Some("softgels")
    } else if word.starts_with("cap") {
        Some("capsules")
    } else if word.starts_with("tab") {
        Some("tablets")
    } else if word.starts_with("gumm") {
        Some("gummies")
    } else {
        None
    }
}

/// Build the structural key of a record
///
/// Fails with the first missing component; such records pass through the
/// pipeline unclustered.
pub fn build_structural_key(product: &ProductRecord) -> Result<StructuralKey, ExclusionReason> {
    let brand = normalize_text(&product.brand);
    if brand.is_empty() {
        return Err(ExclusionReason::MissingBrand);
    }

    let count_unit = extract_count_unit(&format!("{} {}", product.amount, product.name));
    if count_unit.is_empty() {
        return Err(ExclusionReason::MissingCountUnit);
    }

    let potency = normalize_potency(&product.potency);
    if potency.is_empty() {
        return Err(ExclusionReason::MissingPotency);
    }

    Ok(StructuralKey {
        brand,
        count_unit,
        potency,
    })
}
