//! Error types for failures that end the dispatch loop.
//!
//! Everything a client caused is answered in-band with an error envelope.
//! Only stream failures and the `abort` malformed-line policy reach the caller
//! of [`Dispatcher::run`](super::Dispatcher::run).

use std::io;

use thiserror::Error;

/// Errors that terminate the dispatch loop.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Reading a request or writing a response failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A response envelope could not be encoded.
    #[error("failed to serialize response: {0}")]
    SerializeResponse(#[from] serde_json::Error),

    /// A request line was not valid JSON and the policy is to stop.
    #[error("malformed request on line {line}: {message}")]
    Malformed {
        /// One-based input line number.
        line: u64,
        /// Parser diagnostic.
        message: String,
    },
}

impl DispatchError {
    /// Creates a malformed request error.
    pub fn malformed(line: u64, message: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            message: message.into(),
        }
    }

    /// Returns the process exit status a host should use for this error.
    ///
    /// Protocol violations return status 1. Stream failures return status 2.
    #[must_use]
    pub const fn exit_status(&self) -> u8 {
        match self {
            Self::Malformed { .. } => 1,
            Self::Io(_) | Self::SerializeResponse(_) => 2,
        }
    }
}
