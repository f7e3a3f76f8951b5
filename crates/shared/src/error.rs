use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body the backend attaches to non-2xx responses.
///
/// The client treats the HTTP status as authoritative and only uses this
/// message opportunistically when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ApiException(pub String);

impl From<ApiErrorBody> for ApiException {
    fn from(value: ApiErrorBody) -> Self {
        Self(value.error)
    }
}
