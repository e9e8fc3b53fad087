//! Test fixture loading utilities

use std::path::PathBuf;

use catalog_core::ProductRecord;

/// Get the path to a fixture file
#[allow(dead_code)]
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_fixtures")
        .join(name)
}

/// Load a fixture file as a string
#[allow(dead_code)]
pub fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name))
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", name))
}

/// A fully keyed supplement record
#[allow(dead_code)]
pub fn supplement(
    id: i64,
    brand: &str,
    name: &str,
    amount: &str,
    potency: &str,
    price: i64,
) -> ProductRecord {
    let mut p = ProductRecord::new(id, name, brand, price);
    p.amount = amount.to_string();
    p.potency = potency.to_string();
    p
}
