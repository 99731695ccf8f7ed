//! Propagation signal adapter.
//!
//! The provisioning daemon polls for records in `toadd` status, so the panel
//! only has to announce that new work is waiting. This adapter records the
//! announcement in the structured log where the daemon supervisor picks it up.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::info;

use crate::domain::TraceId;
use crate::domain::ports::{PropagationError, PropagationSignal};

/// Logs a propagation request for every pending change.
#[derive(Debug, Default)]
pub struct LoggingPropagationSignal {
    sent: AtomicU64,
}

impl LoggingPropagationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of signals emitted since start-up.
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PropagationSignal for LoggingPropagationSignal {
    async fn request_propagation(&self) -> Result<(), PropagationError> {
        let sequence = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        let trace_id = TraceId::current().map(|id| id.to_string());
        info!(
            sequence,
            trace_id = trace_id.as_deref().unwrap_or("-"),
            "propagation requested"
        );
        Ok(())
    }
}
