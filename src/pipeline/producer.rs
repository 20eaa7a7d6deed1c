//! Download producer
//!
//! Runs on its own task and communicates solely through the work queue.
//! Authenticates once, issues one catalog query per configured tile, merges
//! the results last-write-wins by product id, downloads each archive into
//! the staging directory and enqueues one product per successful download.
//!
//! Any catalog or network failure aborts the remaining download loop — there
//! is no per-item retry at this layer — but the end-of-stream marker is
//! enqueued on every exit path so the consumer always shuts down cleanly.

use super::QueueItem;
use crate::catalog::{CatalogClient, CatalogError, CatalogResult, ProductQuery};
use crate::config::CatalogSection;
use crate::shutdown::SharedShutdown;
use crate::Product;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::mpsc::Sender;
use tracing::{error, info, warn};

/// Producer side of the pipeline: catalog queries and archive downloads.
pub struct DownloadProducer<C> {
    client: C,
    catalog: CatalogSection,
    staging_dir: PathBuf,
    shutdown: SharedShutdown,
}

impl<C: CatalogClient> DownloadProducer<C> {
    /// Create a producer over the given catalog client.
    pub fn new(
        client: C,
        catalog: CatalogSection,
        staging_dir: PathBuf,
        shutdown: SharedShutdown,
    ) -> Self {
        Self {
            client,
            catalog,
            staging_dir,
            shutdown,
        }
    }

    /// Run the producer to completion.
    ///
    /// Failures are logged, not returned: the caller only observes the
    /// queue, and the end-of-stream marker is sent under all exit paths.
    pub async fn run(mut self, tx: Sender<QueueItem>) {
        if let Err(e) = self.produce(&tx).await {
            error!("download stage aborted: {e}");
        }
        if tx.send(QueueItem::EndOfStream).await.is_err() {
            warn!("consumer stopped before the end-of-stream marker was delivered");
        }
    }

    async fn produce(&mut self, tx: &Sender<QueueItem>) -> CatalogResult<()> {
        if !self.staging_dir.is_dir() {
            return Err(CatalogError::Io(format!(
                "download staging directory does not exist: {}",
                self.staging_dir.display()
            )));
        }

        self.client
            .authenticate(&self.catalog.username, &self.catalog.password)
            .await?;

        let mut products = ProductSet::default();
        for tile_id in &self.catalog.tiles {
            let query = ProductQuery {
                platform: self.catalog.platform.clone(),
                product_type: self.catalog.product_type.clone(),
                start_date: self.catalog.start_date.clone(),
                end_date: self.catalog.end_date.clone(),
                tile_id: tile_id.clone(),
            };
            let matches = self.client.query(&query).await?;
            info!(tile = %tile_id, matches = matches.len(), "catalog query done");
            products.merge(matches);
        }

        info!("proceeding to download {} products", products.len());

        for product in products.into_ordered() {
            if self.shutdown.is_shutdown_requested() {
                warn!("shutdown requested - stopping downloads");
                break;
            }

            self.client.download(&product, &self.staging_dir).await?;
            info!(
                tile = product.tile_id.as_deref().unwrap_or("unknown"),
                date = product.acquisition_date.as_deref().unwrap_or("unknown"),
                "tile archive downloaded"
            );

            if tx.send(QueueItem::Product(product)).await.is_err() {
                // Consumer is gone; nothing left to produce for.
                warn!("work queue closed - stopping downloads");
                break;
            }
        }

        Ok(())
    }
}

/// Insertion-ordered product collection with last-write-wins merging.
///
/// Duplicate ids across tile-scoped queries keep their first position but
/// take the latest record, matching how the merged catalog responses behave.
#[derive(Debug, Default)]
struct ProductSet {
    order: Vec<String>,
    by_id: HashMap<String, Product>,
}

impl ProductSet {
    fn merge(&mut self, products: Vec<Product>) {
        for product in products {
            if !self.by_id.contains_key(&product.id) {
                self.order.push(product.id.clone());
            }
            self.by_id.insert(product.id.clone(), product);
        }
    }

    fn len(&self) -> usize {
        self.order.len()
    }

    fn into_ordered(self) -> impl Iterator<Item = Product> {
        let mut by_id = self.by_id;
        self.order.into_iter().filter_map(move |id| by_id.remove(&id))
    }
}
