//! CLI argument parsing, validation, and startup helpers.

use std::sync::Arc;

use crate::ServerConfig;
use crate::db::{CredentialStore, Database, NewUser, UserRole};
use crate::denylist::{MemoryDenylist, RedisDenylist, TokenDenylist};
use crate::password::hash_password;
use crate::validate::{is_strong_password, is_valid_email};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "codegate",
    about = "Account and session service for the coding practice platform"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, env = "DATABASE_PATH", default_value = "codegate.db")]
    pub database: String,

    /// Redis URL for the token denylist. Without it, revoked tokens are only
    /// remembered by this process
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Path to file containing the JWT key. Prefer using JWT_KEY env var instead
    #[arg(long)]
    pub jwt_key_file: Option<String>,

    /// Mark session cookies Secure (serve behind HTTPS)
    #[arg(long, env = "PRODUCTION")]
    pub production: bool,

    /// Origin allowed to send credentialed cross-origin requests (repeatable or comma separated)
    #[arg(long = "allowed-origin", env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Create an admin account with this email on startup, password from ADMIN_PASSWORD
    #[arg(long, value_name = "EMAIL")]
    pub create_admin: Option<String>,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format. `RUST_LOG` overrides the default `info` level.
pub fn init_logging(format: &LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

/// Read a secret from an environment variable and remove it from the environment.
fn take_env_secret(name: &str) -> Option<String> {
    let value = std::env::var(name).ok()?;
    // SAFETY: We're single-threaded at this point during startup,
    // and no other code is reading this environment variable.
    unsafe { std::env::remove_var(name) };
    Some(value)
}

/// Load JWT key from environment variable or file.
/// Returns None and logs an error if the key cannot be loaded.
pub fn load_jwt_secret(jwt_key_file: Option<&str>) -> Option<String> {
    let secret = if let Some(secret) = take_env_secret("JWT_KEY") {
        secret
    } else if let Some(path) = jwt_key_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT key file");
                return None;
            }
        }
    } else {
        error!("JWT key is required. Set JWT_KEY environment variable (recommended) or use --jwt-key-file");
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT key is shorter than {} characters. Use a longer key",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Handle the --create-admin flag: create the admin account unless the email is taken.
pub async fn handle_create_admin(users: &dyn CredentialStore, email: &str) {
    if !is_valid_email(email.trim()) {
        error!(email = %email, "Invalid admin email");
        std::process::exit(1);
    }

    match users.find_by_email(email).await {
        Ok(Some(existing)) => {
            info!(user_id = %existing.id, role = existing.role.as_str(), "Admin email already registered, skipping");
            return;
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Failed to check for existing admin");
            std::process::exit(1);
        }
    }

    let Some(password) = take_env_secret("ADMIN_PASSWORD") else {
        error!("ADMIN_PASSWORD must be set to create an admin");
        std::process::exit(1);
    };
    if !is_strong_password(&password) {
        error!("ADMIN_PASSWORD is too weak");
        std::process::exit(1);
    }

    let password_hash = match hash_password(&password).await {
        Ok(hash) => hash,
        Err(e) => {
            error!(error = %e, "Failed to hash admin password");
            std::process::exit(1);
        }
    };

    let new_user = NewUser {
        first_name: "Admin".to_string(),
        last_name: None,
        email: email.to_string(),
        password_hash,
        role: UserRole::Admin,
    };

    match users.create(new_user).await {
        Ok(user) => info!(user_id = %user.id, "Admin user created"),
        Err(e) => {
            error!(error = %e, "Failed to create admin user");
            std::process::exit(1);
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    denylist: Arc<dyn TokenDenylist>,
    jwt_secret: String,
    production: bool,
    allowed_origins: Vec<String>,
) -> ServerConfig {
    ServerConfig {
        users: Arc::new(db.users()),
        denylist,
        jwt_secret: jwt_secret.into_bytes(),
        secure_cookies: production,
        allowed_origins,
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

/// Connect the token denylist, falling back to process memory without a Redis URL.
pub async fn open_denylist(redis_url: Option<&str>) -> Option<Arc<dyn TokenDenylist>> {
    let Some(url) = redis_url else {
        warn!("REDIS_URL not set, revoked tokens are kept in memory and not shared between instances");
        return Some(Arc::new(MemoryDenylist::new()));
    };

    match RedisDenylist::connect(url).await {
        Ok(denylist) => {
            info!("Redis denylist connected");
            Some(Arc::new(denylist))
        }
        Err(e) => {
            error!(error = %e, "Failed to connect to Redis");
            None
        }
    }
}
