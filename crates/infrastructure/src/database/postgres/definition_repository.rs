use async_trait::async_trait;
use reportd_core::ReportdResult;
use reportd_domain::{NewTaskDefinition, TaskDefinition, TaskDefinitionRepository};
use sqlx::{PgPool, Row};
use tracing::instrument;

pub struct PostgresDefinitionRepository {
    pool: PgPool,
}

impl PostgresDefinitionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn row_to_definition(row: &sqlx::postgres::PgRow) -> ReportdResult<TaskDefinition> {
        Ok(TaskDefinition {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            handler: row.try_get("handler")?,
            description: row.try_get("description")?,
            active: row.try_get("active")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[async_trait]
impl TaskDefinitionRepository for PostgresDefinitionRepository {
    #[instrument(skip(self, definition), fields(name = %definition.name))]
    async fn create(&self, definition: &NewTaskDefinition) -> ReportdResult<TaskDefinition> {
        let row = sqlx::query(
            "INSERT INTO task_definitions (name, handler, description, active)
             VALUES ($1, $2, $3, $4)
             RETURNING id, name, handler, description, active, created_at, updated_at",
        )
        .bind(&definition.name)
        .bind(&definition.handler)
        .bind(&definition.description)
        .bind(definition.active)
        .fetch_one(&self.pool)
        .await?;

        Self::row_to_definition(&row)
    }

    async fn get_by_id(&self, id: i64) -> ReportdResult<Option<TaskDefinition>> {
        let row = sqlx::query(
            "SELECT id, name, handler, description, active, created_at, updated_at
             FROM task_definitions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_definition).transpose()
    }

    async fn get_by_name(&self, name: &str) -> ReportdResult<Option<TaskDefinition>> {
        let row = sqlx::query(
            "SELECT id, name, handler, description, active, created_at, updated_at
             FROM task_definitions WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_definition).transpose()
    }

    #[instrument(skip(self, definition), fields(id = definition.id))]
    async fn update(&self, definition: &TaskDefinition) -> ReportdResult<()> {
        sqlx::query(
            "UPDATE task_definitions
             SET name = $2, handler = $3, description = $4, active = $5, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(definition.id)
        .bind(&definition.name)
        .bind(&definition.handler)
        .bind(&definition.description)
        .bind(definition.active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The FK on scheduled_tasks is ON DELETE RESTRICT; deleting a
    /// referenced definition surfaces as a Database error.
    async fn delete(&self, id: i64) -> ReportdResult<()> {
        sqlx::query("DELETE FROM task_definitions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self) -> ReportdResult<Vec<TaskDefinition>> {
        let rows = sqlx::query(
            "SELECT id, name, handler, description, active, created_at, updated_at
             FROM task_definitions ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_definition).collect()
    }
}
