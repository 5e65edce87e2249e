pub mod backend;
pub mod http;

pub use backend::{DecisionUpdate, RequestBackend};
pub use http::HttpBackend;

use thiserror::Error;

/// Failures at the external API boundary. Converted to `FlowError` before
/// they reach any caller outside the controller.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a shape we do not recognize. Decoding is
    /// strict: an unexpected payload is an error, never an empty list.
    #[error("unexpected response shape: {0}")]
    Decode(String),

    /// The request was no longer pending on the server (decided or cancelled
    /// by someone else first).
    #[error("request already processed")]
    Conflict,

    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },
}
