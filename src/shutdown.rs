//! Graceful shutdown coordination.
//!
//! A [`ShutdownCoordinator`] is constructed in `main`, armed by the Ctrl+C
//! handler, and passed explicitly to the pipeline. The producer polls it
//! between downloads: when shutdown is requested it stops fetching new
//! archives and still enqueues the end-of-stream marker, so the consumer
//! drains what was already downloaded and exits cleanly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared handle to a shutdown coordinator.
pub type SharedShutdown = Arc<ShutdownCoordinator>;

/// Coordinates early termination across the pipeline tasks.
#[derive(Debug, Default)]
pub struct ShutdownCoordinator {
    requested: AtomicBool,
}

impl ShutdownCoordinator {
    /// Create a new coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new shared coordinator wrapped in [`Arc`].
    pub fn shared() -> SharedShutdown {
        Arc::new(Self::new())
    }

    /// Request shutdown. Idempotent.
    pub fn request_shutdown(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    /// Whether shutdown has been requested.
    pub fn is_shutdown_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }
}
