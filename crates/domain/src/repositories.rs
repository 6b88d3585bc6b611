//! Repository abstractions for the persistence layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reportd_core::ReportdResult;

use crate::entities::{NewTaskDefinition, ReportRecord, ScheduledTask, TaskDefinition};

#[async_trait]
pub trait TaskDefinitionRepository: Send + Sync {
    async fn create(&self, definition: &NewTaskDefinition) -> ReportdResult<TaskDefinition>;
    async fn get_by_id(&self, id: i64) -> ReportdResult<Option<TaskDefinition>>;
    async fn get_by_name(&self, name: &str) -> ReportdResult<Option<TaskDefinition>>;
    async fn update(&self, definition: &TaskDefinition) -> ReportdResult<()>;
    /// Fails while any scheduled task still references the definition.
    async fn delete(&self, id: i64) -> ReportdResult<()>;
    async fn list(&self) -> ReportdResult<Vec<TaskDefinition>>;
}

#[async_trait]
pub trait ScheduledTaskRepository: Send + Sync {
    /// Returns the task with its definition joined in.
    async fn get_by_id(&self, id: i64) -> ReportdResult<Option<ScheduledTask>>;
    async fn list_enabled(&self) -> ReportdResult<Vec<ScheduledTask>>;
    /// Runnable tasks whose `next_run` is unset or has passed.
    async fn find_due(&self, now: DateTime<Utc>) -> ReportdResult<Vec<ScheduledTask>>;
    async fn update_next_run(
        &self,
        id: i64,
        next_run: Option<DateTime<Utc>>,
    ) -> ReportdResult<()>;
}

#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn get_by_name(&self, name: &str) -> ReportdResult<Option<ReportRecord>>;
    /// Overwrites the last known-good payload of an existing report.
    async fn save_result(
        &self,
        name: &str,
        payload: &serde_json::Value,
        computed_at: DateTime<Utc>,
    ) -> ReportdResult<()>;
}
