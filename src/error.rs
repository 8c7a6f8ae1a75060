use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Catalog snapshot unavailable: {0}")]
    SnapshotUnavailable(String),

    #[error("Assistant unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Query limit reached: {used}/{limit}")]
    QuotaExceeded { used: u32, limit: u32 },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::QuotaExceeded { used, limit } => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({
                    "error": "query limit reached for this session",
                    "queriesUsed": used,
                    "queryLimit": limit,
                    "requiresAuth": true,
                }),
            ),
            AppError::Unauthorized(ref msg) => {
                (StatusCode::UNAUTHORIZED, json!({ "error": msg }))
            }
            AppError::NotFound(ref msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::InvalidInput(ref msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::SnapshotUnavailable(_)
            | AppError::ModelUnavailable(_)
            | AppError::ExternalApi(_)
            | AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, json!({ "error": self.to_string() })),
            AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": self.to_string() }))
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_exceeded_maps_to_429() {
        let err = AppError::QuotaExceeded { used: 5, limit: 5 };
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn test_snapshot_unavailable_maps_to_502() {
        let err = AppError::SnapshotUnavailable("store unreachable".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err = AppError::NotFound("no such entry".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
