//! Archive band extraction
//!
//! Unpacks one product's ZIP archive into the tile layout:
//!
//! ```text
//! tiles_root/{tile}/{date}/T{time}/{tile}_{date}_T{time}[_{band}].jp2
//! tiles_root/{tile}/{date}/T{time}/metadata.txt
//! previews_root/{tile}/{tile}_{date}_T{time}.png
//! ```
//!
//! Only entries matching the band filename grammar AND the configured band
//! allow-list are written. A product title that fails the title grammar
//! falls back to a directory named after the raw title. Extraction is
//! idempotent: re-running with the same inputs overwrites the same files.

use crate::naming::{compose_output_name, EntryName, ProductTitle};
use crate::Product;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zip::ZipArchive;

mod preview;

/// Extraction errors
#[derive(Debug, thiserror::Error)]
pub enum ExtractorError {
    /// Archive file is missing from the staging directory
    #[error("archive missing: {0}")]
    ArchiveMissing(PathBuf),

    /// Archive exists but is not a readable ZIP container
    #[error("archive unreadable: {0}")]
    ArchiveUnreadable(String),

    /// Output file or directory could not be written
    #[error("IO error: {0}")]
    Io(String),

    /// Preview image could not be decoded or encoded
    #[error("preview error: {0}")]
    Preview(String),
}

/// Result type for extraction operations
pub type ExtractorResult<T> = Result<T, ExtractorError>;

/// Counters for one product's extraction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionOutcome {
    /// Band rasters written to the tile layout (preview included, even
    /// though its raster is later replaced by the PNG)
    pub bands_written: usize,
    /// Selected entries skipped because the archive index was inconsistent
    pub entries_skipped: usize,
    /// Whether a browse preview was derived
    pub preview_written: bool,
}

/// Extracts the configured bands of a product archive into the tile layout.
#[derive(Debug, Clone)]
pub struct BandExtractor {
    tiles_root: PathBuf,
    previews_root: PathBuf,
    bands: BTreeSet<String>,
    preview_band: String,
}

impl BandExtractor {
    /// Create an extractor for the given output roots and band allow-list.
    ///
    /// Band codes are normalized to uppercase to match the parsed entry
    /// names.
    pub fn new(
        tiles_root: impl Into<PathBuf>,
        previews_root: impl Into<PathBuf>,
        bands: &[String],
        preview_band: &str,
    ) -> Self {
        Self {
            tiles_root: tiles_root.into(),
            previews_root: previews_root.into(),
            bands: bands.iter().map(|b| b.to_uppercase()).collect(),
            preview_band: preview_band.to_uppercase(),
        }
    }

    /// Extract the selected bands of one product archive.
    ///
    /// A missing or unreadable archive aborts this product only; the
    /// returned error is logged by the consumer and the stream continues.
    /// An entry that cannot be re-read from the archive index is logged and
    /// skipped without aborting the remaining entries.
    pub fn extract(
        &self,
        archive_path: &Path,
        product: &Product,
    ) -> ExtractorResult<ExtractionOutcome> {
        if !archive_path.is_file() {
            return Err(ExtractorError::ArchiveMissing(archive_path.to_path_buf()));
        }

        let file = File::open(archive_path)
            .map_err(|e| ExtractorError::ArchiveUnreadable(e.to_string()))?;
        let mut archive =
            ZipArchive::new(file).map_err(|e| ExtractorError::ArchiveUnreadable(e.to_string()))?;

        let title_fields = ProductTitle::parse(&product.title);
        let output_dir = match &title_fields {
            Some(fields) => self
                .tiles_root
                .join(&fields.tile_id)
                .join(&fields.date)
                .join(format!("T{}", fields.time)),
            // Title grammar mismatch: keep the product under its raw title.
            None => self.tiles_root.join(&product.title),
        };
        std::fs::create_dir_all(&output_dir).map_err(|e| {
            ExtractorError::Io(format!("failed to create {}: {e}", output_dir.display()))
        })?;

        info!(title = %product.title, "extracting bands into {}", output_dir.display());

        let entry_paths: Vec<String> = archive.file_names().map(String::from).collect();
        let mut outcome = ExtractionOutcome::default();

        for entry_path in entry_paths {
            let base_name = entry_path.rsplit('/').next().unwrap_or(&entry_path);
            let Some(entry) = EntryName::parse(base_name) else {
                continue;
            };
            if !self.bands.contains(&entry.band) {
                continue;
            }

            // The output name carries the title's acquisition time when the
            // title parsed; the entry's own timestamp is the datatake start,
            // not the acquisition.
            let time_qualifier = title_fields
                .as_ref()
                .map(|fields| fields.time.as_str())
                .unwrap_or(&entry.time);
            let output_name =
                compose_output_name(&entry.tile_id, &entry.date, time_qualifier, &entry.band);
            let output_path = output_dir.join(&output_name);

            let mut bytes = Vec::new();
            match archive.by_name(&entry_path) {
                Ok(mut zip_entry) => {
                    zip_entry.read_to_end(&mut bytes).map_err(|e| {
                        ExtractorError::Io(format!("failed to read {entry_path}: {e}"))
                    })?;
                }
                Err(e) => {
                    warn!("could not find {entry_path} in archive: {e}");
                    outcome.entries_skipped += 1;
                    continue;
                }
            }

            std::fs::write(&output_path, &bytes).map_err(|e| {
                ExtractorError::Io(format!("failed to write {}: {e}", output_path.display()))
            })?;
            outcome.bands_written += 1;
            debug!("extracted band image {output_name}");

            if entry.band == self.preview_band {
                let preview_dir = self.previews_root.join(&entry.tile_id);
                match preview::derive_preview(&output_path, &preview_dir) {
                    Ok(preview_path) => {
                        // The raw preview raster is a disposable intermediate.
                        std::fs::remove_file(&output_path).map_err(|e| {
                            ExtractorError::Io(format!(
                                "failed to remove {}: {e}",
                                output_path.display()
                            ))
                        })?;
                        outcome.preview_written = true;
                        debug!("derived browse preview {}", preview_path.display());
                    }
                    Err(e) => {
                        // Keep the raster when no preview could be derived.
                        warn!(title = %product.title, "preview derivation failed: {e}");
                    }
                }
            }
        }

        self.write_metadata(&output_dir, product)?;
        Ok(outcome)
    }

    /// Write the `metadata.txt` sidecar, one `key : value` line per catalog
    /// attribute. The file is rewritten on every run, never appended.
    fn write_metadata(&self, output_dir: &Path, product: &Product) -> ExtractorResult<()> {
        let mut contents = String::new();
        for (key, value) in &product.attributes {
            contents.push_str(key);
            contents.push_str(" : ");
            contents.push_str(value);
            contents.push('\n');
        }

        let metadata_path = output_dir.join("metadata.txt");
        std::fs::write(&metadata_path, contents).map_err(|e| {
            ExtractorError::Io(format!("failed to write {}: {e}", metadata_path.display()))
        })
    }
}
