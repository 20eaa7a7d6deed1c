//! Workflow registry
//!
//! The configuration names a workflow; [`create_workflow`] resolves that name
//! through a closed registry of statically known implementations at startup.
//! An unknown name is an explicit startup error, never a dynamic lookup.

use crate::config::PipelineConfig;
use crate::extractor::ExtractorError;
use crate::Product;

pub mod sentinel2;

pub use sentinel2::Sentinel2Workflow;

/// Workflow errors
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// The configured workflow name is not in the registry
    #[error("unknown workflow: {0}")]
    Unknown(String),

    /// Extraction of one product failed
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractorError),
}

/// Result type for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// One per-product processing strategy.
///
/// The consumer dispatches every dequeued product to the configured
/// workflow; a per-product error is logged by the consumer and never stops
/// the stream.
pub trait Workflow: Send + Sync {
    /// Registry name of this workflow.
    fn name(&self) -> &'static str;

    /// Process one downloaded product.
    fn process(&self, product: &Product) -> WorkflowResult<()>;
}

impl std::fmt::Debug for dyn Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow").field("name", &self.name()).finish()
    }
}

/// Resolve a configured workflow name to its implementation.
///
/// # Errors
///
/// Returns [`WorkflowError::Unknown`] for names outside the registry, so a
/// misconfigured workflow fails at startup rather than mid-stream.
pub fn create_workflow(
    name: &str,
    config: &PipelineConfig,
) -> WorkflowResult<Box<dyn Workflow>> {
    match name.to_ascii_lowercase().as_str() {
        "sentinel2" | "sentinel-2" => Ok(Box::new(Sentinel2Workflow::new(config))),
        other => Err(WorkflowError::Unknown(other.to_string())),
    }
}
