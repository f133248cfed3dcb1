//! Session revocation.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Serialize;

use crate::denylist::{self, DenylistError, TokenDenylist};
use crate::jwt::{JwtConfig, JwtError};

/// Why a logout could not be completed. Always answered with 503.
#[derive(Debug)]
pub enum LogoutError {
    TokenMissing,
    /// Token is not a decodable JWT
    Undecodable(JwtError),
    /// Token carries no `exp` claim to bound the denylist entry
    MissingExpiry,
    Denylist(DenylistError),
}

impl std::fmt::Display for LogoutError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogoutError::TokenMissing => write!(f, "Unauthenticated: token missing"),
            LogoutError::Undecodable(_) => write!(f, "Logout failed: invalid token"),
            LogoutError::MissingExpiry => write!(f, "Logout failed: token has no expiry"),
            LogoutError::Denylist(_) => write!(f, "Logout failed: please try again later"),
        }
    }
}

impl std::error::Error for LogoutError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LogoutError::Undecodable(e) => Some(e),
            LogoutError::Denylist(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DenylistError> for LogoutError {
    fn from(e: DenylistError) -> Self {
        LogoutError::Denylist(e)
    }
}

impl IntoResponse for LogoutError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Block a token until its own `exp`.
///
/// The token is decoded without signature or expiry checks. Returns the
/// number of seconds the denylist entry lives (zero for an already expired
/// token, whose entry is dropped at once).
pub async fn revoke_session(
    denylist: &dyn TokenDenylist,
    token: Option<&str>,
) -> Result<i64, LogoutError> {
    let token = token
        .filter(|t| !t.is_empty())
        .ok_or(LogoutError::TokenMissing)?;

    let claims = JwtConfig::decode_unverified(token).map_err(LogoutError::Undecodable)?;
    let expires_at = claims.exp.ok_or(LogoutError::MissingExpiry)?;

    denylist::block_token(denylist, token, expires_at).await?;

    Ok((expires_at - Utc::now().timestamp()).max(0))
}
