use thiserror::Error;

use crate::api::ApiError;

/// Errors surfaced to the screens. Raw transport errors never reach display
/// code; every failure from the API layer is converted to one of these at the
/// `LifecycleController` boundary.
#[derive(Debug, Error)]
pub enum FlowError {
    /// A required field is missing or malformed. Detected before any network
    /// call; `field` names the first invalid field.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// The acting role/subject is not permitted to perform this operation.
    #[error("not permitted: {0}")]
    Authorization(String),

    /// Transition attempted on a request that is already terminal, or one
    /// with an operation still in flight. The caller should reload and tell
    /// the user the request was already decided, not retry blindly.
    #[error("stale transition: {0}")]
    Transition(String),

    /// Network or backend failure. The previously known list stays on
    /// screen; only the very first load shows an empty state.
    #[error("backend unavailable: {0}")]
    Fetch(#[source] ApiError),
}

impl FlowError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        FlowError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

impl From<ApiError> for FlowError {
    fn from(err: ApiError) -> Self {
        FlowError::Fetch(err)
    }
}
