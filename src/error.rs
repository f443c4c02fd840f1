/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - AuthorizationDecision (Unauthorized / SystemError) を HTTP に写像する
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::{AuthorizationDecision, Identity};

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // The body never says which layer denied the request.
        let (status, code) = match self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_SERVER_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code,
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl AuthorizationDecision {
    /// Boundary collapse: `Ok(identity)` to proceed, otherwise the HTTP error.
    pub fn into_result(self) -> Result<Identity, AppError> {
        match self {
            AuthorizationDecision::Authorized(identity) => Ok(identity),
            AuthorizationDecision::Unauthorized(_) => Err(AppError::Unauthorized),
            AuthorizationDecision::SystemError(_) => Err(AppError::Internal),
        }
    }
}
