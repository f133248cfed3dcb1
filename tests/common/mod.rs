#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use codegate::db::{CredentialStore, Database, NewUser, StoreError, User, UserRole, UserStore};
use codegate::denylist::{DenylistError, MemoryDenylist, TokenDenylist};
use codegate::jwt::JwtConfig;
use codegate::password::hash_password;
use codegate::{ServerConfig, create_app};
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &[u8] = b"test-jwt-secret-that-is-at-least-32-bytes";

/// Credential store wrapper that counts every query and can be told to fail.
pub struct TestStore {
    inner: UserStore,
    queries: AtomicUsize,
    pub fail_reads: AtomicBool,
    pub fail_deletes: AtomicBool,
}

impl TestStore {
    pub fn new(inner: UserStore) -> Self {
        Self {
            inner,
            queries: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }

    fn read_guard(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for TestStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.record();
        self.read_guard()?;
        self.inner.find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.record();
        self.read_guard()?;
        self.inner.find_by_email(email).await
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        self.record();
        self.inner.create(new_user).await
    }

    async fn delete_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        self.record();
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolClosed));
        }
        self.inner.delete_by_id(id).await
    }
}

/// In-memory denylist whose reads and writes can be made to fail.
#[derive(Default)]
pub struct TestDenylist {
    pub inner: MemoryDenylist,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
}

impl TestDenylist {
    fn check(&self, flag: &AtomicBool) -> Result<(), DenylistError> {
        if flag.load(Ordering::SeqCst) {
            return Err(DenylistError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TokenDenylist for TestDenylist {
    async fn set(&self, key: &str, value: &str) -> Result<(), DenylistError> {
        self.check(&self.fail_writes)?;
        self.inner.set(key, value).await
    }

    async fn expire_at(&self, key: &str, unix_timestamp: i64) -> Result<bool, DenylistError> {
        self.check(&self.fail_writes)?;
        self.inner.expire_at(key, unix_timestamp).await
    }

    async fn exists(&self, key: &str) -> Result<bool, DenylistError> {
        self.check(&self.fail_reads)?;
        self.inner.exists(key).await
    }

    async fn set_until(
        &self,
        key: &str,
        value: &str,
        unix_timestamp: i64,
    ) -> Result<(), DenylistError> {
        self.check(&self.fail_writes)?;
        self.inner.set_until(key, value, unix_timestamp).await
    }
}

pub struct TestApp {
    pub app: Router,
    pub store: Arc<TestStore>,
    pub denylist: Arc<TestDenylist>,
    pub jwt: JwtConfig,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_secure_cookies(false).await
    }

    pub async fn with_secure_cookies(secure_cookies: bool) -> Self {
        let db = Database::open(":memory:")
            .await
            .expect("Failed to open test database");
        let store = Arc::new(TestStore::new(db.users()));
        let denylist = Arc::new(TestDenylist::default());

        let config = ServerConfig {
            users: store.clone(),
            denylist: denylist.clone(),
            jwt_secret: TEST_JWT_SECRET.to_vec(),
            secure_cookies,
            allowed_origins: vec!["http://localhost:5173".to_string()],
        };

        Self {
            app: create_app(&config),
            store,
            denylist,
            jwt: JwtConfig::new(TEST_JWT_SECRET),
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Create a user directly in the store and return it with a fresh session token.
    pub async fn seed_user(&self, email: &str, password: &str, role: UserRole) -> (User, String) {
        let user = self
            .store
            .create(NewUser {
                first_name: "Seed".to_string(),
                last_name: None,
                email: email.to_string(),
                password_hash: hash_password(password).await.unwrap(),
                role,
            })
            .await
            .unwrap();
        let token = self.jwt.issue(&user).unwrap().token;
        (user, token)
    }
}

pub fn json_request(method: &str, uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("token={}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("token={}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response<Body>) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

pub fn set_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .map(|v| v.to_str().unwrap().to_string())
}

/// The token value from a `Set-Cookie: token=...` header.
pub fn session_token(response: &Response<Body>) -> Option<String> {
    let cookie = set_cookie(response)?;
    let value = cookie.strip_prefix("token=")?.split(';').next()?;
    Some(value.to_string())
}
