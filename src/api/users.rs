use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use super::error::{ApiError, ResultExt};
use crate::auth::{
    AdminOnly, Auth, clear_session_cookie, revoke_session, session_cookie,
};
use crate::db::{CredentialStore, NewUser, StoreError, User, UserRole};
use crate::denylist::TokenDenylist;
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::password::{hash_password, verify_password};
use crate::validate::{RegistrationInput, validate_registration};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Clone)]
pub struct UsersState {
    pub jwt: Arc<JwtConfig>,
    pub users: Arc<dyn CredentialStore>,
    pub denylist: Arc<dyn TokenDenylist>,
    pub secure_cookies: bool,
}

impl_has_auth_backend!(UsersState);

pub fn router(state: UsersState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/admin/register", post(admin_register))
        .route("/deleteProfile", delete(delete_profile))
        .route("/check", get(check))
        .with_state(state)
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    first_name: Option<String>,
    last_name: Option<String>,
    email_id: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    email_id: Option<String>,
    password: Option<String>,
}

/// User fields exposed to clients.
#[derive(Serialize)]
struct PublicUser {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "firstName")]
    first_name: String,
    #[serde(rename = "emailId")]
    email: String,
    role: UserRole,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            first_name: user.first_name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

#[derive(Serialize)]
struct UserResponse {
    user: PublicUser,
    message: &'static str,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

/// Validate, hash and persist a new account.
async fn create_account(
    users: &dyn CredentialStore,
    payload: &RegisterRequest,
    role: UserRole,
) -> Result<User, ApiError> {
    let input = RegistrationInput {
        first_name: payload.first_name.as_deref(),
        last_name: payload.last_name.as_deref(),
        email: payload.email_id.as_deref(),
        password: payload.password.as_deref(),
    };
    let valid = validate_registration(&input).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let password_hash = hash_password(valid.password)
        .await
        .bad_request_err("Registration failed")?;

    let new_user = NewUser {
        first_name: valid.first_name.to_string(),
        last_name: valid.last_name.map(str::to_string),
        email: valid.email.to_string(),
        password_hash,
        role,
    };

    match users.create(new_user).await {
        Ok(user) => Ok(user),
        Err(StoreError::DuplicateEmail) => Err(ApiError::bad_request("Email already registered")),
        Err(e) => {
            tracing::error!("Failed to create user: {}", e);
            Err(ApiError::bad_request("Registration failed"))
        }
    }
}

/// Issue a session token and build the matching `Set-Cookie` value.
fn issue_session_cookie(state: &UsersState, user: &User) -> Result<String, ApiError> {
    let issued = state
        .jwt
        .issue(user)
        .map_err(|e| ApiError::db_error("Failed to sign session token", e))?;
    Ok(session_cookie(
        &issued.token,
        issued.duration,
        issued.expires_at,
        state.secure_cookies,
    ))
}

async fn register(
    State(state): State<UsersState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let user = create_account(state.users.as_ref(), &payload, UserRole::User).await?;
    let cookie = issue_session_cookie(&state, &user)?;

    info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(UserResponse {
            user: PublicUser::from(&user),
            message: "Registered successfully",
        }),
    ))
}

async fn login(
    State(state): State<UsersState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();

    let (Some(email), Some(password)) = (
        payload.email_id.as_deref().filter(|s| !s.trim().is_empty()),
        payload.password.as_deref().filter(|s| !s.is_empty()),
    ) else {
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    let user = state
        .users
        .find_by_email(email)
        .await
        .map_err(|e| {
            tracing::error!("Failed to look up user for login: {}", e);
            ApiError::unauthorized(INVALID_CREDENTIALS)
        })?;

    let Some(user) = user else {
        warn!("Login rejected: unknown email");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    };

    let matches = verify_password(password, &user.password_hash)
        .await
        .map_err(|e| {
            tracing::error!("Failed to verify password: {}", e);
            ApiError::unauthorized(INVALID_CREDENTIALS)
        })?;
    if !matches {
        warn!(user_id = %user.id, "Login rejected: wrong password");
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let cookie = issue_session_cookie(&state, &user)?;

    info!(user_id = %user.id, "User logged in");

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(UserResponse {
            user: PublicUser::from(&user),
            message: "Logged in successfully",
        }),
    ))
}

async fn logout(State(state): State<UsersState>, auth: Auth) -> impl IntoResponse {
    match revoke_session(state.denylist.as_ref(), Some(&auth.token)).await {
        Ok(ttl) => {
            info!(user_id = %auth.user.id, ttl, "User logged out");
            (
                StatusCode::OK,
                [(header::SET_COOKIE, clear_session_cookie(state.secure_cookies))],
                Json(MessageResponse {
                    message: "Logged out successfully",
                }),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!(user_id = %auth.user.id, "Logout failed: {}", e);
            e.into_response()
        }
    }
}

async fn admin_register(
    State(state): State<UsersState>,
    auth: Auth<AdminOnly>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let user = create_account(state.users.as_ref(), &payload, UserRole::Admin).await?;

    info!(user_id = %user.id, created_by = %auth.user.id, "Admin registered");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            user: PublicUser::from(&user),
            message: "Admin registered successfully",
        }),
    ))
}

async fn delete_profile(
    State(state): State<UsersState>,
    auth: Auth,
) -> Result<impl IntoResponse, ApiError> {
    let removed = state
        .users
        .delete_by_id(&auth.user.id)
        .await
        .db_err("Failed to delete user")?;

    if removed.is_some() {
        info!(user_id = %auth.user.id, "User deleted their profile");
    }

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Deleted successfully",
        }),
    ))
}

async fn check(auth: Auth) -> impl IntoResponse {
    Json(UserResponse {
        user: PublicUser::from(&auth.user),
        message: "Valid user",
    })
}
