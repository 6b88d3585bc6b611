use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reportd_core::ReportdResult;
use reportd_domain::{Recurrence, ScheduledTask, ScheduledTaskRepository, TaskDefinition};
use sqlx::{PgPool, Row};
use tracing::instrument;

const SELECT_TASK: &str = "
    SELECT st.id, st.minute, st.hour, st.day_of_week, st.parameters,
           st.enabled, st.next_run, st.created_at, st.updated_at,
           d.id AS definition_id, d.name AS definition_name,
           d.handler AS definition_handler,
           d.description AS definition_description,
           d.active AS definition_active,
           d.created_at AS definition_created_at,
           d.updated_at AS definition_updated_at
    FROM scheduled_tasks st
    JOIN task_definitions d ON d.id = st.definition_id";

pub struct PostgresScheduledTaskRepository {
    pool: PgPool,
}

impl PostgresScheduledTaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_task(row: &sqlx::postgres::PgRow) -> ReportdResult<ScheduledTask> {
        let definition = TaskDefinition {
            id: row.try_get("definition_id")?,
            name: row.try_get("definition_name")?,
            handler: row.try_get("definition_handler")?,
            description: row.try_get("definition_description")?,
            active: row.try_get("definition_active")?,
            created_at: row.try_get("definition_created_at")?,
            updated_at: row.try_get("definition_updated_at")?,
        };

        Ok(ScheduledTask {
            id: row.try_get("id")?,
            definition,
            recurrence: Recurrence {
                minute: row.try_get("minute")?,
                hour: row.try_get("hour")?,
                day_of_week: row.try_get("day_of_week")?,
            },
            parameters: row.try_get("parameters")?,
            enabled: row.try_get("enabled")?,
            next_run: row.try_get("next_run")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl ScheduledTaskRepository for PostgresScheduledTaskRepository {
    async fn get_by_id(&self, id: i64) -> ReportdResult<Option<ScheduledTask>> {
        let query = format!("{SELECT_TASK} WHERE st.id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_task).transpose()
    }

    async fn list_enabled(&self) -> ReportdResult<Vec<ScheduledTask>> {
        let query = format!("{SELECT_TASK} WHERE st.enabled AND d.active ORDER BY st.id");
        let rows = sqlx::query(&query).fetch_all(&self.pool).await?;

        rows.iter().map(Self::row_to_task).collect()
    }

    async fn find_due(&self, now: DateTime<Utc>) -> ReportdResult<Vec<ScheduledTask>> {
        let query = format!(
            "{SELECT_TASK}
             WHERE st.enabled AND d.active
               AND (st.next_run IS NULL OR st.next_run <= $1)
             ORDER BY st.id"
        );
        let rows = sqlx::query(&query).bind(now).fetch_all(&self.pool).await?;

        rows.iter().map(Self::row_to_task).collect()
    }

    #[instrument(skip(self))]
    async fn update_next_run(
        &self,
        id: i64,
        next_run: Option<DateTime<Utc>>,
    ) -> ReportdResult<()> {
        sqlx::query("UPDATE scheduled_tasks SET next_run = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(next_run)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
