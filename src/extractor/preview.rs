//! Browse preview derivation
//!
//! The preview band ships as a low-resolution raster inside the archive; it
//! is converted to PNG for browsing and the raster itself is not retained.

use super::{ExtractorError, ExtractorResult};
use crate::naming::PREVIEW_EXTENSION;
use image::ImageReader;
use std::path::{Path, PathBuf};

/// Decode the extracted preview raster and write it as a PNG under
/// `preview_dir`, returning the preview path.
///
/// The format is sniffed from the file contents, not the `.jp2` extension.
/// The caller deletes the raster once the preview exists; on error the
/// raster is retained.
pub(super) fn derive_preview(raster_path: &Path, preview_dir: &Path) -> ExtractorResult<PathBuf> {
    std::fs::create_dir_all(preview_dir).map_err(|e| {
        ExtractorError::Io(format!("failed to create {}: {e}", preview_dir.display()))
    })?;

    let stem = raster_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            ExtractorError::Preview(format!("invalid raster filename: {}", raster_path.display()))
        })?;

    let image = ImageReader::open(raster_path)
        .map_err(|e| ExtractorError::Preview(format!("failed to open raster: {e}")))?
        .with_guessed_format()
        .map_err(|e| ExtractorError::Preview(format!("failed to sniff raster format: {e}")))?
        .decode()
        .map_err(|e| ExtractorError::Preview(format!("failed to decode raster: {e}")))?;

    let preview_path = preview_dir.join(format!("{stem}.{PREVIEW_EXTENSION}"));
    image
        .save(&preview_path)
        .map_err(|e| ExtractorError::Preview(format!("failed to encode preview: {e}")))?;

    Ok(preview_path)
}
