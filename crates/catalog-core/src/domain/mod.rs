//! Domain models for catalog documents

mod document;
mod product;

pub use document::{CatalogDocument, RejectedRecord};
pub use product::{images_from_urls, ProductImage, ProductRecord};
