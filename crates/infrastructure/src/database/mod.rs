pub mod postgres;

use std::time::Duration;

use reportd_core::config::DatabaseConfig;
use reportd_core::ReportdResult;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

pub async fn create_pool(config: &DatabaseConfig) -> ReportdResult<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
        .connect(&config.url)
        .await?;
    Ok(pool)
}
