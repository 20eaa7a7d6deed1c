//! Extraction consumer
//!
//! Drains the work queue, dispatching each product to the configured
//! workflow. A per-product failure — missing archive, corrupt container,
//! malformed fields — is logged and swallowed so one bad item never stops
//! the stream; the loop ends strictly on the end-of-stream marker.

use super::{PipelineSummary, QueueItem};
use crate::workflow::Workflow;
use tokio::sync::mpsc::Receiver;
use tracing::{debug, warn};

/// Consumer side of the pipeline: queue draining and workflow dispatch.
pub struct ExtractionConsumer {
    workflow: Box<dyn Workflow>,
}

impl ExtractionConsumer {
    /// Create a consumer dispatching to the given workflow.
    pub fn new(workflow: Box<dyn Workflow>) -> Self {
        Self { workflow }
    }

    /// Drain the queue until the end-of-stream marker, returning per-run
    /// counters.
    pub async fn run(self, mut rx: Receiver<QueueItem>) -> PipelineSummary {
        let mut summary = PipelineSummary::default();

        while let Some(item) = rx.recv().await {
            let product = match item {
                QueueItem::EndOfStream => break,
                QueueItem::Product(product) => product,
            };

            summary.products_attempted += 1;
            match self.workflow.process(&product) {
                Ok(()) => summary.products_extracted += 1,
                Err(e) => warn!(title = %product.title, "error processing product: {e}"),
            }
            debug!("listening for the next product to process");
        }

        summary
    }
}
