//! Sentinel-2 band extraction workflow

use super::{Workflow, WorkflowResult};
use crate::config::PipelineConfig;
use crate::extractor::BandExtractor;
use crate::Product;
use std::path::PathBuf;
use tracing::{debug, info};

/// Workflow extracting the configured Sentinel-2 bands of each product.
pub struct Sentinel2Workflow {
    downloads_dir: PathBuf,
    extractor: BandExtractor,
}

impl Sentinel2Workflow {
    /// Build the workflow from the pipeline configuration.
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            downloads_dir: config.extraction.downloads_dir.clone(),
            extractor: BandExtractor::new(
                config.extraction.tiles_dir.clone(),
                config.extraction.previews_dir.clone(),
                &config.extraction.bands,
                &config.extraction.preview_band,
            ),
        }
    }
}

impl Workflow for Sentinel2Workflow {
    fn name(&self) -> &'static str {
        "sentinel2"
    }

    fn process(&self, product: &Product) -> WorkflowResult<()> {
        match product.attributes.get("ingestiondate") {
            Some(date) => debug!(title = %product.title, "processing tile ingested on {date}"),
            None => debug!(title = %product.title, "processing tile"),
        }

        let archive_path = self.downloads_dir.join(product.archive_name());
        let outcome = self.extractor.extract(&archive_path, product)?;

        info!(
            title = %product.title,
            bands_written = outcome.bands_written,
            entries_skipped = outcome.entries_skipped,
            preview_written = outcome.preview_written,
            "product extracted"
        );
        Ok(())
    }
}
