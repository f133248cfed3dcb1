//! Denylist for session tokens revoked before their natural expiry.
//!
//! Key pattern: `token:{raw token}`, value `Blocked`. Every entry expires at
//! the `exp` of the token it blocks, so nothing outlives its token.

mod memory;
mod redis_store;

use async_trait::async_trait;

pub use memory::MemoryDenylist;
pub use redis_store::RedisDenylist;

/// Value stored for a blocked token.
pub const BLOCKED_VALUE: &str = "Blocked";

/// Denylist key for a raw token string.
pub fn token_key(token: &str) -> String {
    format!("token:{}", token)
}

/// Shared key-value store with per-key absolute expiry.
#[async_trait]
pub trait TokenDenylist: Send + Sync {
    async fn set(&self, key: &str, value: &str) -> Result<(), DenylistError>;

    /// Expire `key` at the given Unix timestamp. Returns false if the key does not exist.
    /// A timestamp in the past removes the key immediately.
    async fn expire_at(&self, key: &str, unix_timestamp: i64) -> Result<bool, DenylistError>;

    async fn exists(&self, key: &str) -> Result<bool, DenylistError>;

    /// Set a value that expires at `unix_timestamp`.
    async fn set_until(
        &self,
        key: &str,
        value: &str,
        unix_timestamp: i64,
    ) -> Result<(), DenylistError> {
        self.set(key, value).await?;
        self.expire_at(key, unix_timestamp).await?;
        Ok(())
    }
}

/// Block a token until its own expiry.
pub async fn block_token(
    denylist: &dyn TokenDenylist,
    token: &str,
    expires_at: i64,
) -> Result<(), DenylistError> {
    denylist
        .set_until(&token_key(token), BLOCKED_VALUE, expires_at)
        .await
}

/// Whether a token has been blocked.
pub async fn is_blocked(denylist: &dyn TokenDenylist, token: &str) -> Result<bool, DenylistError> {
    denylist.exists(&token_key(token)).await
}

/// Errors returned by a denylist backend.
#[derive(Debug)]
pub enum DenylistError {
    /// Redis command or connection failure
    Redis(redis::RedisError),
    /// Backend not reachable
    Unavailable(String),
}

impl std::fmt::Display for DenylistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenylistError::Redis(e) => write!(f, "Redis error: {}", e),
            DenylistError::Unavailable(msg) => write!(f, "Denylist unavailable: {}", msg),
        }
    }
}

impl std::error::Error for DenylistError {}

impl From<redis::RedisError> for DenylistError {
    fn from(e: redis::RedisError) -> Self {
        DenylistError::Redis(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_key() {
        assert_eq!(token_key("abc.def.ghi"), "token:abc.def.ghi");
    }

    #[tokio::test]
    async fn test_block_and_check() {
        let denylist = MemoryDenylist::new();
        let exp = chrono::Utc::now().timestamp() + 3600;

        assert!(!is_blocked(&denylist, "t1").await.unwrap());
        block_token(&denylist, "t1", exp).await.unwrap();
        assert!(is_blocked(&denylist, "t1").await.unwrap());
        assert!(!is_blocked(&denylist, "t2").await.unwrap());

        assert_eq!(
            denylist.get("token:t1").await.as_deref(),
            Some(BLOCKED_VALUE)
        );
    }
}
