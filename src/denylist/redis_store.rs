//! Redis-backed denylist shared by every server instance.

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;

use super::{DenylistError, TokenDenylist};

/// Denylist stored in Redis. Cloning shares the underlying multiplexed connection.
#[derive(Clone)]
pub struct RedisDenylist {
    con: MultiplexedConnection,
}

impl RedisDenylist {
    /// Connect to Redis and verify the server answers.
    pub async fn connect(url: &str) -> Result<Self, DenylistError> {
        let client = redis::Client::open(url)?;
        let mut con = client.get_multiplexed_async_connection().await?;

        let pong: String = redis::cmd("PING").query_async(&mut con).await?;
        if pong != "PONG" {
            return Err(DenylistError::Unavailable(format!(
                "unexpected PING reply: {}",
                pong
            )));
        }

        Ok(Self { con })
    }
}

#[async_trait]
impl TokenDenylist for RedisDenylist {
    async fn set(&self, key: &str, value: &str) -> Result<(), DenylistError> {
        let mut con = self.con.clone();
        con.set::<_, _, ()>(key, value).await?;
        Ok(())
    }

    async fn expire_at(&self, key: &str, unix_timestamp: i64) -> Result<bool, DenylistError> {
        let mut con = self.con.clone();
        let updated: bool = con.expire_at(key, unix_timestamp).await?;
        Ok(updated)
    }

    async fn exists(&self, key: &str) -> Result<bool, DenylistError> {
        let mut con = self.con.clone();
        let found: bool = con.exists(key).await?;
        Ok(found)
    }

    /// `SET` and `EXPIREAT` in one `MULTI` block so no entry is left without expiry.
    async fn set_until(
        &self,
        key: &str,
        value: &str,
        unix_timestamp: i64,
    ) -> Result<(), DenylistError> {
        let mut con = self.con.clone();
        let (): () = redis::pipe()
            .atomic()
            .set(key, value)
            .ignore()
            .expire_at(key, unix_timestamp)
            .ignore()
            .query_async(&mut con)
            .await?;
        Ok(())
    }
}
