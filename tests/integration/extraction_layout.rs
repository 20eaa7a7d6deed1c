//! On-disk layout produced by a pipeline run: band filtering, preview
//! derivation, metadata sidecars and idempotent re-runs.

use super::common::{
    catalog_product, granule_entry, png_bytes, test_config, MockCatalogClient, TITLE_A,
};
use sentinel_tile_downloader::run_pipeline;
use sentinel_tile_downloader::shutdown::ShutdownCoordinator;
use std::path::PathBuf;
use tempfile::TempDir;

fn full_archive(title: &str) -> Vec<(String, Vec<u8>)> {
    vec![
        (granule_entry(title, "B01"), b"b01".to_vec()),
        (granule_entry(title, "B02"), b"b02".to_vec()),
        (granule_entry(title, "TCI"), b"tci".to_vec()),
        (granule_entry(title, "PVI"), png_bytes()),
        (format!("{title}.SAFE/MTD_MSIL1C.xml"), b"<xml/>".to_vec()),
    ]
}

fn output_dir(root: &TempDir) -> PathBuf {
    root.path()
        .join("tiles")
        .join("52JFS")
        .join("20181130")
        .join("T024335")
}

#[tokio::test]
async fn test_preview_band_becomes_png_and_raster_is_dropped() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &["B02", "PVI"]);
    let client = MockCatalogClient::new()
        .with_product(catalog_product("uuid-a", TITLE_A), full_archive(TITLE_A));

    let summary = run_pipeline(&config, client, ShutdownCoordinator::shared())
        .await
        .unwrap();
    assert_eq!(summary.products_extracted, 1);

    let output = output_dir(&dir);
    assert!(output.join("52JFS_20181130_T024335_B02.jp2").is_file());
    // Allow-listed bands only.
    assert!(!output.join("52JFS_20181130_T024335_B01.jp2").exists());
    assert!(!output.join("52JFS_20181130_T024335_TCI.jp2").exists());

    // The preview raster was converted and removed.
    assert!(!output.join("52JFS_20181130_T024335.jp2").exists());
    let preview = dir
        .path()
        .join("previews")
        .join("52JFS")
        .join("52JFS_20181130_T024335.png");
    assert!(preview.is_file());
}

#[tokio::test]
async fn test_undecodable_preview_retains_raster() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &["PVI"]);
    let client = MockCatalogClient::new().with_product(
        catalog_product("uuid-a", TITLE_A),
        vec![(granule_entry(TITLE_A, "PVI"), b"not an image".to_vec())],
    );

    let summary = run_pipeline(&config, client, ShutdownCoordinator::shared())
        .await
        .unwrap();
    assert_eq!(summary.products_extracted, 1);

    let output = output_dir(&dir);
    assert!(output.join("52JFS_20181130_T024335.jp2").is_file());
    assert!(!dir
        .path()
        .join("previews")
        .join("52JFS")
        .join("52JFS_20181130_T024335.png")
        .exists());
}

#[tokio::test]
async fn test_metadata_sidecar_lists_catalog_attributes() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &["B02"]);
    let client = MockCatalogClient::new()
        .with_product(catalog_product("uuid-a", TITLE_A), full_archive(TITLE_A));

    run_pipeline(&config, client, ShutdownCoordinator::shared())
        .await
        .unwrap();

    let contents = std::fs::read_to_string(output_dir(&dir).join("metadata.txt")).unwrap();
    assert!(contents.contains("ingestiondate : 2018-11-30T02:43:35.000Z"));
    assert!(contents.contains("cloudcoverpercentage : 3.07"));
}

#[tokio::test]
async fn test_rerun_reproduces_the_same_layout() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &["B02", "PVI"]);

    for _ in 0..2 {
        let client = MockCatalogClient::new()
            .with_product(catalog_product("uuid-a", TITLE_A), full_archive(TITLE_A));
        let summary = run_pipeline(&config, client, ShutdownCoordinator::shared())
            .await
            .unwrap();
        assert_eq!(summary.products_extracted, 1);
    }

    let output = output_dir(&dir);
    assert_eq!(
        std::fs::read(output.join("52JFS_20181130_T024335_B02.jp2")).unwrap(),
        b"b02"
    );
    assert!(!output.join("52JFS_20181130_T024335.jp2").exists());
    assert!(dir
        .path()
        .join("previews")
        .join("52JFS")
        .join("52JFS_20181130_T024335.png")
        .is_file());
}
