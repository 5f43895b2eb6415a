//! RPC error types and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use siglink_store::StoreError;
use siglink_sync::SyncError;
use siglink_types::TypeError;
use siglink_verification::ChallengeError;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl RpcError {
    fn status(&self) -> StatusCode {
        match self {
            RpcError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RpcError::NotFound(_) => StatusCode::NOT_FOUND,
            RpcError::Conflict(_) => StatusCode::CONFLICT,
            RpcError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<TypeError> for RpcError {
    fn from(e: TypeError) -> Self {
        RpcError::InvalidRequest(e.to_string())
    }
}

impl From<StoreError> for RpcError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(key) => RpcError::NotFound(key),
            other => RpcError::Internal(other.to_string()),
        }
    }
}

impl From<ChallengeError> for RpcError {
    fn from(e: ChallengeError) -> Self {
        match e {
            ChallengeError::AddressOwned { .. } => RpcError::Conflict(e.to_string()),
            ChallengeError::Store(inner) => inner.into(),
        }
    }
}

impl From<SyncError> for RpcError {
    fn from(e: SyncError) -> Self {
        RpcError::Internal(e.to_string())
    }
}
