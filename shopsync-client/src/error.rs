//! Error types for shopsync-client.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from remote-platform and feed calls.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection-level failure (DNS, TLS, timeout) on a single request.
    #[error("transport error: {reason}")]
    Transport { reason: String },

    /// Transient failures persisted past the retry budget.
    #[error("retries exhausted after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    /// Non-retryable HTTP status from the remote.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The remote accepted the request but reported application errors
    /// (GraphQL `errors` or mutation `userErrors`).
    #[error("remote API error: {message}")]
    Api { message: String },

    /// Response body did not match the expected shape.
    #[error("unexpected response shape: {reason}")]
    Decode { reason: String },

    /// The configured CA bundle could not be loaded.
    #[error("cannot load CA bundle at {path}: {reason}")]
    CaBundle { path: PathBuf, reason: String },
}

impl ClientError {
    pub(crate) fn transport(err: &reqwest::Error) -> Self {
        Self::Transport {
            reason: err.to_string(),
        }
    }

    pub(crate) fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }
}
