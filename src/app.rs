use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reportd_core::AppConfig;
use reportd_dispatcher::{
    DispatchOutcome, ReportPipeline, ReportRunHandler, RunOutcome, ScheduleRunner, TaskDispatcher,
};
use reportd_domain::{
    HandlerRegistry, LockStore, ReportSource, ScheduledTaskRepository, TaskDefinitionRepository,
};
use reportd_infrastructure::{
    create_pool, HttpReportSource, InMemoryLockStore, PostgresDefinitionRepository,
    PostgresReportRepository, PostgresScheduledTaskRepository, RedisLockStore,
};
use tokio::sync::broadcast;
use tracing::{info, warn};

pub struct Application {
    config: AppConfig,
    definitions: Arc<dyn TaskDefinitionRepository>,
    tasks: Arc<dyn ScheduledTaskRepository>,
    registry: Arc<HandlerRegistry>,
    dispatcher: Arc<TaskDispatcher>,
    pipeline: Arc<ReportPipeline>,
}

impl Application {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let pool = create_pool(&config.database)
            .await
            .context("failed to connect to the database")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;

        let definitions: Arc<dyn TaskDefinitionRepository> =
            Arc::new(PostgresDefinitionRepository::new(pool.clone()));
        let tasks: Arc<dyn ScheduledTaskRepository> =
            Arc::new(PostgresScheduledTaskRepository::new(pool.clone()));
        let reports = Arc::new(PostgresReportRepository::new(pool));

        let locks: Arc<dyn LockStore> = match config.lock.backend.as_str() {
            "memory" => {
                warn!("using the in-process lock store, locks are not shared across instances");
                Arc::new(InMemoryLockStore::new())
            }
            _ => Arc::new(
                RedisLockStore::new(&config.lock.redis_url, &config.lock.key_prefix)
                    .await
                    .context("failed to connect to the lock backend")?,
            ),
        };

        let source: Arc<dyn ReportSource> = Arc::new(HttpReportSource::new(
            &config.upstream.base_url,
            Duration::from_secs(config.upstream.timeout_seconds),
        )?);

        let pipeline = Arc::new(ReportPipeline::new(
            reports,
            source,
            locks,
            Duration::from_secs(config.lock.default_ttl_seconds),
        ));

        let mut registry = HandlerRegistry::new();
        registry.register(
            "run_report",
            Arc::new(ReportRunHandler::new(Arc::clone(&pipeline))),
        );
        let registry = Arc::new(registry);

        let dispatcher = Arc::new(TaskDispatcher::new(
            Arc::clone(&tasks),
            Arc::clone(&registry),
        ));

        info!(handlers = registry.len(), "application wired up");

        Ok(Self {
            config,
            definitions,
            tasks,
            registry,
            dispatcher,
            pipeline,
        })
    }

    pub async fn run_task(&self, task_id: i64) -> DispatchOutcome {
        self.dispatcher.run(task_id).await
    }

    pub async fn run_report(&self, name: &str) -> RunOutcome {
        self.pipeline.run_report(name).await
    }

    /// Reports stored definitions whose handler no longer resolves.
    /// Drift happens when a handler is renamed or removed in code while
    /// rows created against it stay in the database.
    pub async fn validate_definitions(&self) -> Result<()> {
        let definitions = self.definitions.list().await?;
        let mut drifted = 0usize;

        for definition in &definitions {
            if self.registry.validate(&definition.handler).is_err() {
                warn!(
                    name = %definition.name,
                    handler = %definition.handler,
                    "definition references an unregistered handler"
                );
                drifted += 1;
            }
        }

        info!(
            total = definitions.len(),
            drifted, "definition validation finished"
        );
        Ok(())
    }

    pub async fn run(&self, shutdown: broadcast::Receiver<()>) {
        let runner = ScheduleRunner::new(Arc::clone(&self.tasks), Arc::clone(&self.dispatcher));
        runner
            .run(
                Duration::from_secs(self.config.scheduler.poll_interval_seconds),
                shutdown,
            )
            .await;
    }
}
