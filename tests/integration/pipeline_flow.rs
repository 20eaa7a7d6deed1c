//! End-to-end producer/consumer flow: queue ordering, termination and
//! degradation to partial results.

use super::common::{catalog_product, granule_entry, test_config, MockCatalogClient, TITLE_A, TITLE_B};
use sentinel_tile_downloader::pipeline::PipelineError;
use sentinel_tile_downloader::run_pipeline;
use sentinel_tile_downloader::shutdown::ShutdownCoordinator;
use tempfile::TempDir;

fn b02_archive(title: &str) -> Vec<(String, Vec<u8>)> {
    vec![(granule_entry(title, "B02"), b"raster".to_vec())]
}

#[tokio::test]
async fn test_pipeline_extracts_all_matched_products() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &["B02"]);
    let client = MockCatalogClient::new()
        .with_product(catalog_product("uuid-a", TITLE_A), b02_archive(TITLE_A))
        .with_product(catalog_product("uuid-b", TITLE_B), b02_archive(TITLE_B));

    let summary = run_pipeline(&config, client, ShutdownCoordinator::shared())
        .await
        .unwrap();
    assert_eq!(summary.products_attempted, 2);
    assert_eq!(summary.products_extracted, 2);

    let tiles = dir.path().join("tiles").join("52JFS");
    assert!(tiles
        .join("20181130")
        .join("T024335")
        .join("52JFS_20181130_T024335_B02.jp2")
        .is_file());
    assert!(tiles
        .join("20181125")
        .join("T024332")
        .join("52JFS_20181125_T024332_B02.jp2")
        .is_file());

    // Archives stay in the staging directory for later re-runs.
    assert!(dir
        .path()
        .join("downloads")
        .join(format!("{TITLE_A}.zip"))
        .is_file());
}

#[tokio::test]
async fn test_download_failure_yields_partial_results() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &["B02"]);
    let client = MockCatalogClient::new()
        .with_product(catalog_product("uuid-a", TITLE_A), b02_archive(TITLE_A))
        .with_product(catalog_product("uuid-b", TITLE_B), b02_archive(TITLE_B))
        .failing_download(TITLE_B);

    // The first product still flows through; the failure only cuts the
    // remaining downloads short.
    let summary = run_pipeline(&config, client, ShutdownCoordinator::shared())
        .await
        .unwrap();
    assert_eq!(summary.products_attempted, 1);
    assert_eq!(summary.products_extracted, 1);

    assert!(dir
        .path()
        .join("tiles")
        .join("52JFS")
        .join("20181130")
        .join("T024335")
        .join("52JFS_20181130_T024335_B02.jp2")
        .is_file());
}

#[tokio::test]
async fn test_query_failure_terminates_with_empty_summary() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &["B02"]);
    let client = MockCatalogClient::new()
        .with_product(catalog_product("uuid-a", TITLE_A), b02_archive(TITLE_A))
        .failing_queries();

    let summary = run_pipeline(&config, client, ShutdownCoordinator::shared())
        .await
        .unwrap();
    assert_eq!(summary.products_attempted, 0);
    assert_eq!(summary.products_extracted, 0);
}

#[tokio::test]
async fn test_missing_archive_counts_as_failed_extraction() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &["B02"]);
    let client = MockCatalogClient::new()
        .with_phantom_product(catalog_product("uuid-a", TITLE_A))
        .with_product(catalog_product("uuid-b", TITLE_B), b02_archive(TITLE_B));

    let summary = run_pipeline(&config, client, ShutdownCoordinator::shared())
        .await
        .unwrap();
    assert_eq!(summary.products_attempted, 2);
    assert_eq!(summary.products_extracted, 1);
}

#[tokio::test]
async fn test_missing_staging_directory_is_fatal() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path(), &["B02"]);
    config.extraction.downloads_dir = dir.path().join("nope");

    let err = run_pipeline(
        &config,
        MockCatalogClient::new(),
        ShutdownCoordinator::shared(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PipelineError::MissingStagingDirectory(_)));
}

#[tokio::test]
async fn test_unknown_workflow_is_fatal() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path(), &["B02"]);
    config.extraction.workflow = "landsat8".to_string();

    let err = run_pipeline(
        &config,
        MockCatalogClient::new(),
        ShutdownCoordinator::shared(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PipelineError::Workflow(_)));
}

#[tokio::test]
async fn test_shutdown_before_downloads_drains_cleanly() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), &["B02"]);
    let client = MockCatalogClient::new()
        .with_product(catalog_product("uuid-a", TITLE_A), b02_archive(TITLE_A));

    let shutdown = ShutdownCoordinator::shared();
    shutdown.request_shutdown();

    // Nothing is downloaded, but the end-of-stream marker still arrives and
    // the pipeline terminates instead of hanging.
    let summary = run_pipeline(&config, client, shutdown).await.unwrap();
    assert_eq!(summary.products_attempted, 0);
    assert_eq!(summary.products_extracted, 0);
}
