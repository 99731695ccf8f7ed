//! Port notifying the provisioning daemon about pending records.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors raised when the daemon cannot be notified.
    pub enum PropagationError {
        /// The daemon could not be reached.
        Unreachable { message: String } => "provisioning daemon unreachable: {message}",
    }
}

/// Asks the daemon to apply records in pending status.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PropagationSignal: Send + Sync {
    /// Fire the signal. Callers never roll back on failure.
    async fn request_propagation(&self) -> Result<(), PropagationError>;
}
