//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Why the gate rejected a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    TokenMissing,
    InvalidToken,
    InsufficientRole,
    UserNotFound,
    TokenBlocked,
    /// Credential store or denylist could not be reached
    StoreUnavailable,
}

impl AuthErrorKind {
    pub fn message(&self) -> &'static str {
        match self {
            AuthErrorKind::TokenMissing => "Unauthenticated: token missing",
            AuthErrorKind::InvalidToken => "Unauthenticated: invalid token",
            AuthErrorKind::InsufficientRole => "Unauthorized: invalid token",
            AuthErrorKind::UserNotFound => "Unauthenticated: user no longer exists",
            AuthErrorKind::TokenBlocked => "Unauthenticated: token blocked",
            AuthErrorKind::StoreUnavailable => "Unauthenticated: session could not be verified",
        }
    }
}

impl std::fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for AuthErrorKind {}

/// API authentication errors (JSON body, always 401).
#[derive(Debug)]
pub struct ApiAuthError {
    pub kind: AuthErrorKind,
}

impl From<AuthErrorKind> for ApiAuthError {
    fn from(kind: AuthErrorKind) -> Self {
        Self { kind }
    }
}

impl IntoResponse for ApiAuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: self.kind.message(),
            }),
        )
            .into_response()
    }
}
