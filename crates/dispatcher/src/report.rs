//! Lock-guarded fetch → transform → persist pipeline for named reports.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reportd_domain::{LockStore, ReportRepository, ReportSource, TaskHandler, TaskLock};
use tracing::{debug, error, warn};

/// Outcome of one report run. Like dispatch, nothing propagates to the
/// trigger; overlapping runs are expected and skipping them is not an
/// error.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed,
    /// Another run holds the lock; this one exits without side effects.
    Skipped,
    NotFound,
    /// Report exists but is switched off.
    Disabled,
    Failed { error: String },
}

pub struct ReportPipeline {
    reports: Arc<dyn ReportRepository>,
    source: Arc<dyn ReportSource>,
    locks: Arc<dyn LockStore>,
    lock_ttl: Duration,
}

impl ReportPipeline {
    pub fn new(
        reports: Arc<dyn ReportRepository>,
        source: Arc<dyn ReportSource>,
        locks: Arc<dyn LockStore>,
        lock_ttl: Duration,
    ) -> Self {
        Self {
            reports,
            source,
            locks,
            lock_ttl,
        }
    }

    pub async fn run_report(&self, name: &str) -> RunOutcome {
        let mut lock = TaskLock::new(
            Arc::clone(&self.locks),
            &format!("report:{name}"),
            self.lock_ttl,
        );

        match lock.acquire().await {
            Ok(true) => {}
            Ok(false) => {
                debug!(report = name, "run already in progress, skipping");
                return RunOutcome::Skipped;
            }
            Err(e) => {
                let error = e.to_string();
                error!(report = name, error = %error, "lock backend unavailable");
                return RunOutcome::Failed { error };
            }
        }

        let outcome = self.execute(name).await;

        // released on every path; TTL expiry is only the crash backstop
        if let Err(e) = lock.release().await {
            warn!(report = name, error = %e, "failed to release report lock, TTL will reclaim it");
        }

        match &outcome {
            RunOutcome::NotFound => error!(report = name, "report does not exist"),
            RunOutcome::Failed { error } => {
                error!(report = name, error = %error, "report run failed, previous result kept");
            }
            _ => {}
        }
        outcome
    }

    async fn execute(&self, name: &str) -> RunOutcome {
        let record = match self.reports.get_by_name(name).await {
            Ok(Some(record)) => record,
            Ok(None) => return RunOutcome::NotFound,
            Err(e) => {
                return RunOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        if !record.active {
            return RunOutcome::Disabled;
        }

        let raw = match self.source.fetch(name).await {
            Ok(raw) => raw,
            Err(e) => {
                return RunOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        let payload = match self.source.transform(name, raw) {
            Ok(payload) => payload,
            Err(e) => {
                return RunOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        match self.reports.save_result(name, &payload, Utc::now()).await {
            Ok(()) => RunOutcome::Completed,
            Err(e) => RunOutcome::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Registry adapter: lets report runs be scheduled like any other task,
/// via a `{"report": "<name>"}` parameter set.
pub struct ReportRunHandler {
    pipeline: Arc<ReportPipeline>,
}

impl ReportRunHandler {
    pub fn new(pipeline: Arc<ReportPipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl TaskHandler for ReportRunHandler {
    async fn run(&self, params: &serde_json::Value) -> anyhow::Result<()> {
        let name = params
            .get("report")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("missing 'report' parameter"))?;

        match self.pipeline.run_report(name).await {
            RunOutcome::NotFound => Err(anyhow::anyhow!("report '{name}' does not exist")),
            RunOutcome::Failed { error } => Err(anyhow::anyhow!("report '{name}': {error}")),
            // Skipped and Disabled are expected, not handler failures
            _ => Ok(()),
        }
    }
}
