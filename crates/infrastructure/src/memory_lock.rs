//! In-process lock store for embedded deployments and tests.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reportd_core::ReportdResult;
use reportd_domain::LockStore;
use tokio::sync::Mutex;

struct LockEntry {
    token: String,
    expires_at: Instant,
}

/// Mutex-guarded map with deadline-based expiry. Semantics mirror the
/// Redis store: atomic create-if-absent, token-checked release.
#[derive(Default)]
pub struct InMemoryLockStore {
    entries: Mutex<HashMap<String, LockEntry>>,
}

impl InMemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockStore for InMemoryLockStore {
    async fn try_acquire(&self, key: &str, token: &str, ttl: Duration) -> ReportdResult<bool> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        if let Some(entry) = entries.get(key) {
            if entry.expires_at > now {
                return Ok(false);
            }
            // expired entry: the previous holder's TTL window has passed
        }

        entries.insert(
            key.to_string(),
            LockEntry {
                token: token.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn release(&self, key: &str, token: &str) -> ReportdResult<bool> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.token == token => {
                entries.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
