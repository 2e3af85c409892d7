//! Storage Error Types
//!
//! This module defines the error raised when a call into the persistence
//! gateway fails or does not finish before its deadline.

use std::time::Duration;
use thiserror::Error;

/// Persistence gateway errors
///
/// Backends report failures as `anyhow::Error`; the cache attaches the
/// operation name so logs and callers can tell which step failed.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend returned an error
    #[error("Store operation '{operation}' failed: {source}")]
    Operation {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The backend did not answer before the configured deadline
    #[error("Store operation '{operation}' timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },
}

impl StoreError {
    /// Create an operation failed error
    pub fn operation(operation: &'static str, source: anyhow::Error) -> Self {
        Self::Operation { operation, source }
    }

    /// Create a timeout error
    pub fn timeout(operation: &'static str, timeout: Duration) -> Self {
        Self::Timeout { operation, timeout }
    }

    /// Name of the gateway operation that failed
    pub fn operation_name(&self) -> &'static str {
        match self {
            Self::Operation { operation, .. } | Self::Timeout { operation, .. } => operation,
        }
    }
}
