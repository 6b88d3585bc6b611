//! Ports onto external collaborators: the shared lock backend and the
//! upstream report data source.

use std::time::Duration;

use async_trait::async_trait;
use reportd_core::ReportdResult;

/// Shared mutual-exclusion backend. The only concurrency-correctness
/// dependency of this core is `try_acquire` being an atomic
/// create-if-absent with expiry.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Returns true only if this call created the entry. A held,
    /// unexpired key makes the call return false immediately; there is
    /// no queueing.
    async fn try_acquire(&self, key: &str, token: &str, ttl: Duration) -> ReportdResult<bool>;

    /// Deletes the entry only when the stored token matches. Returns
    /// whether anything was deleted; mismatch or absence is a no-op.
    async fn release(&self, key: &str, token: &str) -> ReportdResult<bool>;
}

/// Upstream source of raw report data plus the business transformation
/// applied before persisting.
#[async_trait]
pub trait ReportSource: Send + Sync {
    async fn fetch(&self, report: &str) -> ReportdResult<serde_json::Value>;

    fn transform(
        &self,
        report: &str,
        raw: serde_json::Value,
    ) -> ReportdResult<serde_json::Value>;
}
