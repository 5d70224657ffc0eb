use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

use crate::application::usecases::{
    auth::AuthError, bookings::BookingError, estimates::EstimateError, packages::PackageError,
    posts::PostError, users::UserError,
};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub fn error_response(status: StatusCode, message: &str) -> Response {
    let body = Json(ErrorResponse {
        error: message.to_string(),
        details: None,
    });

    (status, body).into_response()
}

/// Client errors carry their message; server errors are logged and carry the cause as `details`.
fn usecase_error_response<E>(status: StatusCode, err: E) -> Response
where
    E: std::error::Error,
{
    if !status.is_server_error() {
        return error_response(status, &err.to_string());
    }

    error!(status = %status, error = %err, "http: request failed");

    let body = Json(ErrorResponse {
        error: "internal server error".to_string(),
        details: Some(err.to_string()),
    });

    (status, body).into_response()
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        usecase_error_response(self.status_code(), self)
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        usecase_error_response(self.status_code(), self)
    }
}

impl IntoResponse for PostError {
    fn into_response(self) -> Response {
        usecase_error_response(self.status_code(), self)
    }
}

impl IntoResponse for PackageError {
    fn into_response(self) -> Response {
        usecase_error_response(self.status_code(), self)
    }
}

impl IntoResponse for EstimateError {
    fn into_response(self) -> Response {
        usecase_error_response(self.status_code(), self)
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        usecase_error_response(self.status_code(), self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn client_errors_expose_only_the_message() {
        let response = AuthError::EmailTaken.into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["error"], "an account with this email already exists");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn upstream_failures_carry_details() {
        let response =
            PackageError::Upstream(anyhow::anyhow!("connection refused")).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "internal server error");
        assert_eq!(
            body["details"],
            "commerce catalog unavailable: connection refused"
        );
    }

    #[tokio::test]
    async fn forbidden_and_unauthenticated_stay_distinct() {
        assert_eq!(
            PackageError::Unauthenticated.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            PackageError::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
