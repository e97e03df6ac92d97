use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use khata_import::ImportError;
use khata_storage::StorageError;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ApiError>;

/// Whole-call failures. Per-row problems never reach this type — they ride
/// along inside a successful response as warnings or a skip count.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request-shape problem the caller can fix: bad fields, missing
    /// columns, empty upload.
    #[error("{0}")]
    Validation(String),

    #[error("No statement format saved for bank '{0}'")]
    FormatNotFound(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Unexpected reader/library failure.
    #[error("Failed to parse file: {0}")]
    ParseFailure(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        if err.is_request_error() {
            ApiError::Validation(err.to_string())
        } else {
            ApiError::ParseFailure(err.to_string())
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::Validation(_) | ApiError::FormatNotFound(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ParseFailure(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!("request failed: {self}");
        }

        let body = Json(json!({ "message": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_errors_map_to_422() {
        let resp = ApiError::from(ImportError::ColumnNotFound("Txn Date".to_string()))
            .into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn empty_file_maps_to_422() {
        let resp = ApiError::from(ImportError::EmptyFile).into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn reader_failures_map_to_500() {
        let resp = ApiError::from(ImportError::Sheet("broken".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn parse_failure_message_format() {
        let err = ApiError::from(ImportError::Sheet("broken".to_string()));
        assert_eq!(err.to_string(), "Failed to parse file: failed to read sheet: broken");
    }
}
