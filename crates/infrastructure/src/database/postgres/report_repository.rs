use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reportd_core::{ReportdError, ReportdResult};
use reportd_domain::{ReportRecord, ReportRepository};
use sqlx::{PgPool, Row};
use tracing::instrument;

pub struct PostgresReportRepository {
    pool: PgPool,
}

impl PostgresReportRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_record(row: &sqlx::postgres::PgRow) -> ReportdResult<ReportRecord> {
        Ok(ReportRecord {
            name: row.try_get("name")?,
            payload: row.try_get("payload")?,
            active: row.try_get("active")?,
            computed_at: row.try_get("computed_at")?,
        })
    }
}

#[async_trait]
impl ReportRepository for PostgresReportRepository {
    async fn get_by_name(&self, name: &str) -> ReportdResult<Option<ReportRecord>> {
        let row = sqlx::query(
            "SELECT name, payload, active, computed_at FROM api_reports WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    #[instrument(skip(self, payload))]
    async fn save_result(
        &self,
        name: &str,
        payload: &serde_json::Value,
        computed_at: DateTime<Utc>,
    ) -> ReportdResult<()> {
        let result = sqlx::query(
            "UPDATE api_reports SET payload = $2, computed_at = $3 WHERE name = $1",
        )
        .bind(name)
        .bind(payload)
        .bind(computed_at)
        .execute(&self.pool)
        .await?;

        // results are only written for reports the admin surface created
        if result.rows_affected() == 0 {
            return Err(ReportdError::report_not_found(name));
        }
        Ok(())
    }
}
