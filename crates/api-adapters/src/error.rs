//! HTTP mapping for `DomainError`. Every error body is `{ "message": ... }`;
//! moderation hits also carry the `analysis`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use domains::DomainError;
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(DomainError::Validation(rejection.body_text()))
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            DomainError::InvalidId(_)
            | DomainError::Validation(_)
            | DomainError::Moderation { .. } => StatusCode::BAD_REQUEST,
            DomainError::Unauthenticated | DomainError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Conflict(_) | DomainError::VersionConflict => StatusCode::CONFLICT,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        let body = match self.0 {
            DomainError::Moderation { message, analysis } => {
                json!({ "message": message, "analysis": analysis })
            }
            other => json!({ "message": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domains::Analysis;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (DomainError::InvalidId("x".into()), StatusCode::BAD_REQUEST),
            (DomainError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (
                DomainError::Moderation { message: "x".into(), analysis: Analysis::clean() },
                StatusCode::BAD_REQUEST,
            ),
            (DomainError::Unauthenticated, StatusCode::UNAUTHORIZED),
            (DomainError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (DomainError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (DomainError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (DomainError::Conflict("x".into()), StatusCode::CONFLICT),
            (DomainError::VersionConflict, StatusCode::CONFLICT),
            (DomainError::Internal("db down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }
}
