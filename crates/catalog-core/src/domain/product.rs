//! Product record model

use std::collections::BTreeMap;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One catalog entry.
///
/// `source_id` is the only identity. Every other field is content the engine
/// may read; only a merge survivor is ever rewritten.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    #[serde(deserialize_with = "lenient_i64")]
    pub source_id: i64,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub brand: String,
    /// Pack-size text, e.g. "120 caps"
    #[serde(default, deserialize_with = "null_as_default")]
    pub amount: String,
    /// Strength text, e.g. "500mg"; may be "N/A"
    #[serde(default, deserialize_with = "null_as_default")]
    pub potency: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub price: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<ProductImage>,
    /// Fields the engine does not model, carried through untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// An image attached to a product
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_primary: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ProductRecord {
    pub fn new(source_id: i64, name: impl Into<String>, brand: impl Into<String>, price: i64) -> Self {
        Self {
            source_id,
            name: name.into(),
            brand: brand.into(),
            price,
            ..Default::default()
        }
    }

    /// The image flagged primary, falling back to the first image
    pub fn primary_image(&self) -> Option<&ProductImage> {
        self.images
            .iter()
            .find(|img| img.is_primary)
            .or_else(|| self.images.first())
    }

    /// Length of the description in characters (0 when absent)
    pub fn description_len(&self) -> usize {
        self.description
            .as_deref()
            .map(|d| d.chars().count())
            .unwrap_or(0)
    }

    /// Number of images whose URL contains any of `hosts`
    pub fn images_on_hosts(&self, hosts: &[String]) -> usize {
        self.images
            .iter()
            .filter(|img| img.is_hosted_on(hosts))
            .count()
    }
}

impl ProductImage {
    pub fn new(url: impl Into<String>, is_primary: bool) -> Self {
        Self {
            url: url.into(),
            is_primary,
            extra: BTreeMap::new(),
        }
    }

    /// True if the URL's host contains any of the given host fragments
    pub fn is_hosted_on(&self, hosts: &[String]) -> bool {
        let host = url_host(&self.url);
        !host.is_empty() && hosts.iter().any(|h| !h.is_empty() && host.contains(h.as_str()))
    }
}

/// Build an ordered image list from URLs; the first becomes primary
pub fn images_from_urls(urls: &[String]) -> Vec<ProductImage> {
    urls.iter()
        .enumerate()
        .map(|(i, url)| ProductImage::new(url.clone(), i == 0))
        .collect()
}

/// Lowercased host part of a URL, empty when there is none
fn url_host(url: &str) -> String {
    let rest = match url.find("://") {
        Some(pos) => &url[pos + 3..],
        None => url.trim_start_matches("//"),
    };
    rest.split(['/', '?', '#'])
        .next()
        .unwrap_or("")
        .to_lowercase()
}

/// Largest magnitude a float carries without losing integer precision (2^53)
const MAX_EXACT_FLOAT_INT: f64 = 9_007_199_254_740_992.0;

/// Integers arrive as numbers, integral floats, or numeric strings
#[derive(Deserialize)]
#[serde(untagged)]
enum LenientInt {
    Int(i64),
    Float(f64),
    Text(String),
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match LenientInt::deserialize(deserializer)? {
        LenientInt::Int(v) => Ok(v),
        LenientInt::Float(f)
            if f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT_INT =>
        {
            Ok(f as i64)
        }
        LenientInt::Float(f) => Err(de::Error::custom(format!("expected integer, got {f}"))),
        LenientInt::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| de::Error::custom(format!("expected integer, got {s:?}"))),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
