//! Redis-backed lock store.

use std::time::Duration;

use async_trait::async_trait;
use reportd_core::ReportdResult;
use reportd_domain::LockStore;
use tracing::info;

/// Delete the key only if it still carries the caller's token, so an
/// instance can never release a lock that expired and was re-acquired
/// by someone else.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

pub struct RedisLockStore {
    client: redis::Client,
    key_prefix: String,
}

impl RedisLockStore {
    /// Connects eagerly so a bad URL fails at startup, not on first use.
    pub async fn new(redis_url: &str, key_prefix: &str) -> ReportdResult<Self> {
        let client = redis::Client::open(redis_url)?;

        let mut conn = client.get_connection_manager().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        info!(key_prefix, "redis lock store connected");

        Ok(Self {
            client,
            key_prefix: key_prefix.to_string(),
        })
    }

    async fn connection(&self) -> ReportdResult<redis::aio::ConnectionManager> {
        Ok(self.client.get_connection_manager().await?)
    }

    fn build_key(&self, key: &str) -> String {
        if self.key_prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}:{}", self.key_prefix, key)
        }
    }
}

#[async_trait]
impl LockStore for RedisLockStore {
    async fn try_acquire(&self, key: &str, token: &str, ttl: Duration) -> ReportdResult<bool> {
        let mut conn = self.connection().await?;
        let ttl_ms = ttl.as_millis().max(1) as u64;

        // SET NX PX is the atomic create-if-absent this core relies on.
        let created: Option<String> = redis::cmd("SET")
            .arg(self.build_key(key))
            .arg(token)
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await?;

        Ok(created.is_some())
    }

    async fn release(&self, key: &str, token: &str) -> ReportdResult<bool> {
        let mut conn = self.connection().await?;

        let deleted: i64 = redis::Script::new(RELEASE_SCRIPT)
            .key(self.build_key(key))
            .arg(token)
            .invoke_async(&mut conn)
            .await?;

        Ok(deleted == 1)
    }
}
