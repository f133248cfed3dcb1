//! Gate logic shared by every authenticated route.

use crate::db::UserRole;
use crate::denylist;

use super::errors::AuthErrorKind;
use super::state::HasAuthBackend;
use super::types::AuthenticatedUser;

/// Authenticate a raw session token.
///
/// Checks run in a fixed order: presence, signature and expiry, subject,
/// role (when `required_role` is set), user lookup, denylist. The role check
/// runs before any store is touched.
pub async fn authenticate<S>(
    state: &S,
    token: Option<&str>,
    required_role: Option<UserRole>,
) -> Result<AuthenticatedUser, AuthErrorKind>
where
    S: HasAuthBackend + ?Sized,
{
    let token = token
        .filter(|t| !t.is_empty())
        .ok_or(AuthErrorKind::TokenMissing)?;

    let claims = state
        .jwt()
        .verify(token)
        .map_err(|_| AuthErrorKind::InvalidToken)?;

    let user_id = claims.subject().ok_or(AuthErrorKind::InvalidToken)?;

    if let Some(required) = required_role {
        if claims.role() != Some(required) {
            return Err(AuthErrorKind::InsufficientRole);
        }
    }

    let user = state
        .users()
        .find_by_id(user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up user: {}", e);
            AuthErrorKind::StoreUnavailable
        })?
        .ok_or(AuthErrorKind::UserNotFound)?;

    let blocked = denylist::is_blocked(state.denylist(), token)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check token denylist: {}", e);
            AuthErrorKind::StoreUnavailable
        })?;
    if blocked {
        return Err(AuthErrorKind::TokenBlocked);
    }

    Ok(AuthenticatedUser {
        user,
        claims,
        token: token.to_string(),
    })
}
