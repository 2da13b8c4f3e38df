//! Remote catalog service access.

/// HTTP client for listing, detail and media endpoints.
pub mod client;
/// Wire records and normalization into the internal model.
pub mod records;

pub use client::{CatalogClient, FetchError, DEFAULT_BASE_URL, DEFAULT_REMOTE_PAGE_SIZE};
pub use records::{normalize, parse_release_year};
