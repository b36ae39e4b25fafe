use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use ppp_core::errors::Error as CoreError;
use serde::Serialize;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Core(e) => match e {
                CoreError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
                CoreError::Fetch(_) => (StatusCode::BAD_GATEWAY, "fetch_failed"),
                CoreError::BulkWrite(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "bulk_write_failed")
                }
                CoreError::CacheTransaction(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "cache_transaction_failed")
                }
                CoreError::Remote(_) => (StatusCode::INTERNAL_SERVER_ERROR, "remote_error"),
                CoreError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
                CoreError::Unexpected(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
            },
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!("{}: {}", code, self);
        }
        let body = ErrorBody {
            code,
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
