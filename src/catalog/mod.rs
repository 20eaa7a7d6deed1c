//! Catalog client abstraction
//!
//! The pipeline talks to the remote product catalog through the narrow
//! [`CatalogClient`] trait: authenticate once, one query per tile, one
//! download per matched product. [`http::HttpCatalogClient`] is the concrete
//! implementation for Copernicus-style portals; tests substitute mocks.

use crate::Product;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

pub mod http;

/// Catalog errors, covering the failure modes the producer must survive
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Portal URL could not be parsed
    #[error("invalid portal URL: {0}")]
    InvalidUrl(String),

    /// Credentials were rejected by the portal
    #[error("authentication rejected: {0}")]
    AuthenticationRejected(String),

    /// Request timed out
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection could not be established
    #[error("connection failed: {0}")]
    Connection(String),

    /// Portal returned an unexpected HTTP status
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response body did not match the expected shape
    #[error("parse error: {0}")]
    Parse(String),

    /// Local filesystem failure while staging a download
    #[error("IO error: {0}")]
    Io(String),
}

/// Result type for catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Filters for one tile-scoped catalog query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    /// Platform name filter (e.g., "Sentinel-2")
    pub platform: String,
    /// Product type filter (e.g., "S2MSI1C")
    pub product_type: String,
    /// Inclusive start date, `YYYY-MM-DD`
    pub start_date: String,
    /// Inclusive end date, `YYYY-MM-DD`
    pub end_date: String,
    /// Tile grid reference this query is scoped to
    pub tile_id: String,
}

/// Narrow interface to the remote product catalog.
///
/// Implementations surface network failures through [`CatalogError`]; the
/// producer treats any of them as fatal to the remaining download loop but
/// still signals end-of-stream to the consumer.
#[async_trait]
pub trait CatalogClient: Send {
    /// Authenticate against the portal with the configured credentials.
    ///
    /// Called exactly once, before any query.
    async fn authenticate(&mut self, username: &str, password: &str) -> CatalogResult<()>;

    /// Run one tile-scoped query, returning matched products in catalog
    /// order.
    async fn query(&self, query: &ProductQuery) -> CatalogResult<Vec<Product>>;

    /// Download a product's archive into `dest_dir`, returning the local
    /// archive path.
    async fn download(&self, product: &Product, dest_dir: &Path) -> CatalogResult<PathBuf>;
}
