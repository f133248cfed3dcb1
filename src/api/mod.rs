mod error;
mod users;

use axum::Router;
use std::sync::Arc;

use crate::db::CredentialStore;
use crate::denylist::TokenDenylist;
use crate::jwt::JwtConfig;

pub use error::{ApiError, ResultExt};
pub use users::UsersState;

/// Create the API router.
pub fn create_api_router(
    users: Arc<dyn CredentialStore>,
    denylist: Arc<dyn TokenDenylist>,
    jwt: Arc<JwtConfig>,
    secure_cookies: bool,
) -> Router {
    let users_state = users::UsersState {
        jwt,
        users,
        denylist,
        secure_cookies,
    };

    Router::new().nest("/user", users::router(users_state))
}
