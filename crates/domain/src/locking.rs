//! Advisory lock handle over a [`LockStore`].

use std::sync::Arc;
use std::time::Duration;

use reportd_core::ReportdResult;
use uuid::Uuid;

use crate::ports::LockStore;

/// One acquisition attempt over a named lock.
///
/// The token is unique per instance (hostname + UUID), and `held` is
/// tracked locally, so a process can never release a lock another
/// instance acquired. If the holder crashes without releasing, the
/// store's TTL bounds the staleness window.
pub struct TaskLock {
    store: Arc<dyn LockStore>,
    key: String,
    token: String,
    ttl: Duration,
    held: bool,
}

impl TaskLock {
    pub fn new(store: Arc<dyn LockStore>, name: &str, ttl: Duration) -> Self {
        let host = hostname::get()
            .ok()
            .and_then(|h| h.into_string().ok())
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            store,
            key: name.to_string(),
            token: format!("{host}:{}", Uuid::new_v4()),
            ttl,
            held: false,
        }
    }

    /// Attempt to take the lock. Idempotent while held.
    pub async fn acquire(&mut self) -> ReportdResult<bool> {
        if self.held {
            return Ok(true);
        }
        self.held = self
            .store
            .try_acquire(&self.key, &self.token, self.ttl)
            .await?;
        Ok(self.held)
    }

    /// Release the lock if this instance holds it; a no-op otherwise.
    pub async fn release(&mut self) -> ReportdResult<()> {
        if !self.held {
            return Ok(());
        }
        self.store.release(&self.key, &self.token).await?;
        self.held = false;
        Ok(())
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}
