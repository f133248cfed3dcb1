//! Process-local denylist.
//!
//! Mirrors Redis expiry semantics (passive expiry on read, `SET` clears any
//! expiry). Not shared between processes, so only suitable for a single
//! instance and for tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::{DenylistError, TokenDenylist};

struct Entry {
    value: String,
    expires_at: Option<i64>,
}

impl Entry {
    fn is_live(&self, now: i64) -> bool {
        self.expires_at.is_none_or(|exp| exp > now)
    }
}

#[derive(Default)]
pub struct MemoryDenylist {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryDenylist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of a live key.
    pub async fn get(&self, key: &str) -> Option<String> {
        let now = Utc::now().timestamp();
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone())
    }

    /// Remaining seconds before `key` expires, like Redis `TTL`.
    /// `None` if the key is missing or has no expiry.
    pub async fn ttl(&self, key: &str) -> Option<i64> {
        let now = Utc::now().timestamp();
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .filter(|e| e.is_live(now))
            .and_then(|e| e.expires_at)
            .map(|exp| exp - now)
    }

    /// Number of live entries.
    pub async fn len(&self) -> usize {
        let now = Utc::now().timestamp();
        let entries = self.entries.lock().await;
        entries.values().filter(|e| e.is_live(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl TokenDenylist for MemoryDenylist {
    async fn set(&self, key: &str, value: &str) -> Result<(), DenylistError> {
        let now = Utc::now().timestamp();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, e| e.is_live(now));
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
        );
        Ok(())
    }

    async fn expire_at(&self, key: &str, unix_timestamp: i64) -> Result<bool, DenylistError> {
        let now = Utc::now().timestamp();
        let mut entries = self.entries.lock().await;

        let live = entries.get(key).is_some_and(|e| e.is_live(now));
        if !live {
            entries.remove(key);
            return Ok(false);
        }

        if unix_timestamp <= now {
            entries.remove(key);
        } else if let Some(entry) = entries.get_mut(key) {
            entry.expires_at = Some(unix_timestamp);
        }
        Ok(true)
    }

    async fn exists(&self, key: &str) -> Result<bool, DenylistError> {
        let now = Utc::now().timestamp();
        let mut entries = self.entries.lock().await;

        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(true),
            Some(_) => {
                entries.remove(key);
                Ok(false)
            }
            None => Ok(false),
        }
    }

    async fn set_until(
        &self,
        key: &str,
        value: &str,
        unix_timestamp: i64,
    ) -> Result<(), DenylistError> {
        let now = Utc::now().timestamp();
        let mut entries = self.entries.lock().await;
        entries.retain(|_, e| e.is_live(now));

        if unix_timestamp <= now {
            entries.remove(key);
            return Ok(());
        }

        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(unix_timestamp),
            },
        );
        Ok(())
    }
}
