//! Producer/consumer pipeline orchestration
//!
//! Two tasks share nothing but a bounded FIFO work queue:
//!
//! 1. The [`producer::DownloadProducer`] queries the catalog, downloads each
//!    matched archive into the staging directory and enqueues one
//!    [`QueueItem::Product`] per successful download.
//! 2. The [`consumer::ExtractionConsumer`] drains the queue, dispatching each
//!    product to the configured workflow.
//!
//! The producer enqueues [`QueueItem::EndOfStream`] exactly once on every
//! exit path — success, catalog failure or shutdown request — so the
//! consumer always terminates instead of blocking forever. The bounded
//! channel provides backpressure: the producer suspends when the consumer
//! lags `queue_capacity` products behind.

use crate::catalog::CatalogClient;
use crate::config::PipelineConfig;
use crate::shutdown::SharedShutdown;
use crate::workflow::{self, WorkflowError};
use crate::Product;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub mod consumer;
pub mod producer;

pub use consumer::ExtractionConsumer;
pub use producer::DownloadProducer;

/// Pipeline errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The download staging directory is missing; aborts before the
    /// producer starts
    #[error("download staging directory does not exist: {0}")]
    MissingStagingDirectory(PathBuf),

    /// The configured workflow could not be resolved
    #[error("workflow error: {0}")]
    Workflow(#[from] WorkflowError),
}

/// One item on the work queue: a product to extract, or the end-of-stream
/// marker signaling that no more products will be enqueued.
#[derive(Debug, Clone)]
pub enum QueueItem {
    /// A downloaded product ready for extraction
    Product(Product),
    /// Terminal marker; enqueued exactly once, always last
    EndOfStream,
}

/// Counters reported after a pipeline run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Products dequeued by the consumer
    pub products_attempted: u64,
    /// Products whose extraction completed without error
    pub products_extracted: u64,
}

/// Run the complete acquisition and extraction pipeline.
///
/// The producer runs as its own task; the consumer is driven on the calling
/// task. The pipeline always terminates: every producer exit path enqueues
/// the end-of-stream marker the consumer stops on.
///
/// # Errors
///
/// Fails fast on a missing staging directory or an unknown workflow name;
/// everything else — catalog failures, bad archives, grammar mismatches —
/// degrades to partial results reported in the summary.
pub async fn run_pipeline<C>(
    config: &PipelineConfig,
    client: C,
    shutdown: SharedShutdown,
) -> Result<PipelineSummary, PipelineError>
where
    C: CatalogClient + 'static,
{
    let staging = &config.extraction.downloads_dir;
    if !staging.is_dir() {
        return Err(PipelineError::MissingStagingDirectory(staging.clone()));
    }

    let workflow = workflow::create_workflow(&config.extraction.workflow, config)?;
    let (tx, rx) = mpsc::channel(config.pipeline.queue_capacity);

    let producer = DownloadProducer::new(client, config.catalog.clone(), staging.clone(), shutdown);
    let producer_handle = tokio::spawn(producer.run(tx));

    let consumer = ExtractionConsumer::new(workflow);
    let summary = consumer.run(rx).await;

    if let Err(e) = producer_handle.await {
        warn!("download producer task failed to join: {e}");
    }

    info!(
        attempted = summary.products_attempted,
        extracted = summary.products_extracted,
        "done processing tile list"
    );
    Ok(summary)
}
