//! Shared fixtures: a mock catalog client backed by in-memory archives,
//! config builders rooted in a temp directory and ZIP/PNG helpers.

use async_trait::async_trait;
use sentinel_tile_downloader::catalog::{CatalogClient, CatalogError, CatalogResult, ProductQuery};
use sentinel_tile_downloader::config::{
    CatalogSection, ExtractionSection, PipelineConfig, PipelineSection,
};
use sentinel_tile_downloader::Product;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Acquisition 2018-11-30 on tile 52JFS, datatake start 011721.
pub const TITLE_A: &str = "S2A_MSIL1C_20181130T011721_N0207_R088_T52JFS_20181130T024335";

/// Acquisition 2018-11-25 on tile 52JFS, datatake start 011719.
pub const TITLE_B: &str = "S2B_MSIL1C_20181125T011719_N0207_R088_T52JFS_20181125T024332";

/// Build a pipeline config rooted in `root`, with the staging directory and
/// output roots created under it.
pub fn test_config(root: &Path, bands: &[&str]) -> PipelineConfig {
    let downloads_dir = root.join("downloads");
    let tiles_dir = root.join("tiles");
    let previews_dir = root.join("previews");
    for dir in [&downloads_dir, &tiles_dir, &previews_dir] {
        std::fs::create_dir_all(dir).unwrap();
    }

    PipelineConfig {
        catalog: CatalogSection {
            platform: "Sentinel-2".to_string(),
            product_type: "S2MSI1C".to_string(),
            username: "user".to_string(),
            password: "secret".to_string(),
            portal_url: "https://apihub.copernicus.eu/apihub".to_string(),
            tiles: vec!["52JFS".to_string()],
            start_date: "2018-11-01".to_string(),
            end_date: "2018-11-30".to_string(),
        },
        extraction: ExtractionSection {
            bands: bands.iter().map(|b| b.to_string()).collect(),
            preview_band: "PVI".to_string(),
            downloads_dir,
            tiles_dir,
            previews_dir,
            workflow: "sentinel2".to_string(),
        },
        pipeline: PipelineSection { queue_capacity: 2 },
    }
}

/// Build a product the way the catalog parser would, with a small attribute
/// set for the metadata sidecar.
pub fn catalog_product(id: &str, title: &str) -> Product {
    let mut attributes = BTreeMap::new();
    attributes.insert(
        "ingestiondate".to_string(),
        "2018-11-30T02:43:35.000Z".to_string(),
    );
    attributes.insert("cloudcoverpercentage".to_string(), "3.07".to_string());
    Product::from_catalog(id.to_string(), title.to_string(), attributes)
}

/// Granule entry path for a band inside a product archive.
///
/// The embedded timestamp is the datatake start from the title's third
/// segment, matching how real archives name their rasters.
pub fn granule_entry(title: &str, band: &str) -> String {
    let mut parts = title.split('_');
    let datatake = parts.nth(2).unwrap();
    let tile = parts.nth(2).unwrap();
    format!("{title}.SAFE/GRANULE/IMG_DATA/{tile}_{datatake}_{band}.jp2")
}

/// A tiny but valid PNG, used as preview band payload.
pub fn png_bytes() -> Vec<u8> {
    let mut buf = std::io::Cursor::new(Vec::new());
    let img = image::RgbImage::from_pixel(2, 2, image::Rgb([120, 80, 40]));
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// Catalog client serving canned products and writing ZIP archives from
/// in-memory entry lists on download.
#[derive(Default)]
pub struct MockCatalogClient {
    products: Vec<Product>,
    archives: HashMap<String, Vec<(String, Vec<u8>)>>,
    fail_download_on: Option<String>,
    fail_queries: bool,
}

impl MockCatalogClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product whose archive contains the given entries.
    pub fn with_product(mut self, product: Product, entries: Vec<(String, Vec<u8>)>) -> Self {
        self.archives.insert(product.title.clone(), entries);
        self.products.push(product);
        self
    }

    /// Register a product whose download "succeeds" without producing an
    /// archive on disk.
    pub fn with_phantom_product(mut self, product: Product) -> Self {
        self.products.push(product);
        self
    }

    /// Fail the download of the product with this title.
    pub fn failing_download(mut self, title: &str) -> Self {
        self.fail_download_on = Some(title.to_string());
        self
    }

    /// Fail every catalog query.
    pub fn failing_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }
}

#[async_trait]
impl CatalogClient for MockCatalogClient {
    async fn authenticate(&mut self, _username: &str, _password: &str) -> CatalogResult<()> {
        Ok(())
    }

    async fn query(&self, query: &ProductQuery) -> CatalogResult<Vec<Product>> {
        if self.fail_queries {
            return Err(CatalogError::Connection("connection refused".to_string()));
        }
        let tile = query.tile_id.to_uppercase();
        Ok(self
            .products
            .iter()
            .filter(|p| p.tile_id.as_deref() == Some(tile.as_str()))
            .cloned()
            .collect())
    }

    async fn download(&self, product: &Product, dest_dir: &Path) -> CatalogResult<PathBuf> {
        if self.fail_download_on.as_deref() == Some(product.title.as_str()) {
            return Err(CatalogError::Connection("connection reset".to_string()));
        }

        let path = dest_dir.join(product.archive_name());
        if let Some(entries) = self.archives.get(&product.title) {
            write_archive(&path, entries);
        }
        Ok(path)
    }
}

/// Write a ZIP archive with the given entries.
pub fn write_archive(path: &Path, entries: &[(String, Vec<u8>)]) {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    for (name, data) in entries {
        zip.start_file(name.as_str(), SimpleFileOptions::default())
            .unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}
