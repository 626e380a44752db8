//! Unified error handling for the dashboard API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chairside_core::AnalyticsError;
use serde_json::json;
use thiserror::Error;

/// Application-level error type for the dashboard API.
#[derive(Debug, Error)]
pub enum AppError {
    /// The analytics pipeline rejected the request or could not serve it.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Analytics(AnalyticsError::InvalidInput(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Analytics(AnalyticsError::DataUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Analytics(AnalyticsError::Configuration(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Dashboard request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Analytics(AnalyticsError::DataUnavailable(_)) => json!({ "status": "no_data" }),
            Self::Analytics(AnalyticsError::Configuration(_)) => {
                json!({ "error": "Internal server error" })
            }
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("tenant".to_string());
        assert_eq!(err.to_string(), "Bad request: tenant");

        let err = AppError::from(AnalyticsError::InvalidInput("negative".to_string()));
        assert_eq!(err.to_string(), "invalid input: negative");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AnalyticsError::InvalidInput("x".to_string()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AnalyticsError::DataUnavailable("db down".to_string()).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            get_status(AnalyticsError::Configuration("bad rate".to_string()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_configuration_error_hides_details() {
        let response =
            AppError::from(AnalyticsError::Configuration("rate 1.5".to_string())).into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }
}
