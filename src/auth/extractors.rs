//! Axum extractors for authentication.

use std::marker::PhantomData;
use std::ops::Deref;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::db::UserRole;

use super::cookie::{TOKEN_COOKIE_NAME, get_cookie};
use super::errors::ApiAuthError;
use super::gate::authenticate;
use super::state::HasAuthBackend;
use super::types::AuthenticatedUser;

/// Role requirement checked by `Auth` before any store lookup.
pub trait RoleConstraint {
    const REQUIRED: Option<UserRole>;
}

/// Any signed-in user.
pub struct AnyRole;

impl RoleConstraint for AnyRole {
    const REQUIRED: Option<UserRole> = None;
}

/// Admins only.
pub struct AdminOnly;

impl RoleConstraint for AdminOnly {
    const REQUIRED: Option<UserRole> = Some(UserRole::Admin);
}

/// Extractor for API endpoints that require authentication.
/// Reads the `token` cookie, runs the gate and records the user in the
/// request extensions. Returns JSON errors.
pub struct Auth<R: RoleConstraint = AnyRole> {
    pub session: AuthenticatedUser,
    _role: PhantomData<R>,
}

impl<R: RoleConstraint> Deref for Auth<R> {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.session
    }
}

impl<S, R> FromRequestParts<S> for Auth<R>
where
    S: HasAuthBackend + Send + Sync,
    R: RoleConstraint,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = get_cookie(&parts.headers, TOKEN_COOKIE_NAME);
        let user = authenticate(state, token, R::REQUIRED).await.map_err(|kind| {
            tracing::debug!("Rejected request to {}: {}", parts.uri.path(), kind);
            ApiAuthError::from(kind)
        })?;

        parts.extensions.insert(user.clone());

        Ok(Auth {
            session: user,
            _role: PhantomData,
        })
    }
}
