//! # Sentinel Tile Downloader Library
//!
//! A pipeline for acquiring Sentinel-2 satellite image archives from a
//! Copernicus-style catalog and unpacking the scientifically relevant bands
//! into a deterministic, date/tile-keyed directory layout.
//!
//! ## Features
//!
//! - **Catalog queries**: one query per configured tile, merged in catalog
//!   order with last-write-wins de-duplication
//! - **Bounded producer/consumer**: downloads and extraction overlap through
//!   a bounded work queue with explicit end-of-stream signaling
//! - **Band filtering**: only the configured band allow-list is extracted and
//!   renamed to canonical `{tile}_{date}_T{time}[_{band}].jp2` names
//! - **Browse previews**: the preview band is converted to PNG and its raw
//!   raster discarded
//! - **Idempotent layout**: re-running a pipeline reproduces the same files
//!
//! ## Architecture
//!
//! The library is organized into several core modules:
//!
//! - [`naming`] - Product title and band filename grammars (pure parsers)
//! - [`config`] - Typed pipeline configuration loaded from TOML
//! - [`catalog`] - Catalog client abstraction and HTTP implementation
//! - [`extractor`] - Archive band extraction and preview derivation
//! - [`workflow`] - Closed registry mapping workflow names to implementations
//! - [`pipeline`] - Producer/consumer orchestration over the work queue
//!
//! Data flows catalog → producer → work queue → consumer → extractor →
//! filesystem. The producer and consumer share nothing but the queue.

#![warn(missing_docs)]
#![warn(clippy::all)]

use std::collections::BTreeMap;

/// Catalog client abstraction and HTTP implementation
pub mod catalog;

/// Pipeline configuration loading and validation
pub mod config;

/// Archive band extraction and preview derivation
pub mod extractor;

/// Naming grammars for product titles and band filenames
pub mod naming;

/// Producer/consumer pipeline orchestration
pub mod pipeline;

/// Graceful shutdown coordination shared across tasks
pub mod shutdown;

/// Workflow registry and implementations
pub mod workflow;

// Re-export commonly used types
pub use config::PipelineConfig;
pub use pipeline::{run_pipeline, PipelineSummary, QueueItem};

/// One matched remote archive, as returned by a catalog query.
///
/// Immutable after construction: the producer creates a `Product` from a
/// catalog entry, the consumer processes it exactly once, and only its
/// derived files outlive the pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Opaque unique identifier assigned by the catalog.
    pub id: String,
    /// Canonical product name; embeds tile id, acquisition date/time and the
    /// processing baseline when it matches the title grammar.
    pub title: String,
    /// Tile grid reference derived from the title (or catalog metadata when
    /// the title does not match the grammar).
    pub tile_id: Option<String>,
    /// Acquisition date (`YYYYMMDD`) derived from the title.
    pub acquisition_date: Option<String>,
    /// Acquisition time (`HHMMSS`) derived from the title.
    pub acquisition_time: Option<String>,
    /// Catalog metadata (ingestion date, cloud cover, ...), preserved
    /// verbatim for the sidecar metadata file.
    pub attributes: BTreeMap<String, String>,
}

impl Product {
    /// Build a product from a catalog entry, deriving tile/date/time from the
    /// title where the title grammar matches.
    ///
    /// A title that fails the grammar is not an error; the derived fields
    /// fall back to catalog metadata (`tileid`) or stay empty, and the
    /// extractor uses raw-title output naming for such products.
    pub fn from_catalog(id: String, title: String, attributes: BTreeMap<String, String>) -> Self {
        let parsed = naming::ProductTitle::parse(&title);
        let tile_id = parsed
            .as_ref()
            .map(|t| t.tile_id.clone())
            .or_else(|| attributes.get("tileid").map(|t| t.to_uppercase()));
        let acquisition_date = parsed.as_ref().map(|t| t.date.clone());
        let acquisition_time = parsed.as_ref().map(|t| t.time.clone());

        Self {
            id,
            title,
            tile_id,
            acquisition_date,
            acquisition_time,
            attributes,
        }
    }

    /// Filename of this product's archive inside the staging directory.
    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.title)
    }
}
