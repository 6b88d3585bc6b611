//! The trigger side: polls for due tasks and hands them to the
//! dispatcher. Recurrence is interpreted here, never in the dispatcher.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reportd_core::ReportdResult;
use reportd_domain::ScheduledTaskRepository;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::dispatcher::TaskDispatcher;
use crate::recurrence::RecurrenceSchedule;

pub struct ScheduleRunner {
    tasks: Arc<dyn ScheduledTaskRepository>,
    dispatcher: Arc<TaskDispatcher>,
}

impl ScheduleRunner {
    pub fn new(tasks: Arc<dyn ScheduledTaskRepository>, dispatcher: Arc<TaskDispatcher>) -> Self {
        Self { tasks, dispatcher }
    }

    /// Dispatch everything due at `now` and advance each task's
    /// `next_run`. Returns how many tasks were triggered.
    pub async fn tick(&self, now: DateTime<Utc>) -> ReportdResult<usize> {
        let due = self.tasks.find_due(now).await?;
        let count = due.len();

        for task in due {
            debug!(task_id = task.id, name = %task.definition.name, "triggering scheduled task");
            self.dispatcher.run(task.id).await;

            // a task with an unparsable recurrence gets next_run = None
            // and will fire again on the next tick; the bad expression
            // is worth an error line since admin input caused it
            let next = match RecurrenceSchedule::new(&task.recurrence) {
                Ok(schedule) => schedule.next_after(now),
                Err(e) => {
                    error!(task_id = task.id, error = %e, "invalid recurrence");
                    None
                }
            };

            if let Err(e) = self.tasks.update_next_run(task.id, next).await {
                error!(task_id = task.id, error = %e, "failed to store next run time");
            }
        }

        Ok(count)
    }

    /// Poll until a shutdown signal arrives.
    pub async fn run(&self, interval: Duration, mut shutdown: broadcast::Receiver<()>) {
        info!(interval_seconds = interval.as_secs(), "scheduler loop started");

        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {
                    if let Err(e) = self.tick(Utc::now()).await {
                        error!(error = %e, "scheduler tick failed");
                    }
                }
                _ = shutdown.recv() => {
                    info!("scheduler loop stopping");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportd_domain::{HandlerRegistry, Recurrence};
    use reportd_testing_utils::builders::{ScheduledTaskBuilder, TaskDefinitionBuilder};
    use reportd_testing_utils::mocks::{CountingHandler, MockScheduledTaskRepository};

    #[tokio::test]
    async fn tick_dispatches_due_tasks_and_advances_next_run() {
        let handler = CountingHandler::new();
        let mut registry = HandlerRegistry::new();
        registry.register("run_report", Arc::new(handler.clone()));

        let definition = TaskDefinitionBuilder::new(1, "sync_prices").build();
        let task = ScheduledTaskBuilder::new(1, definition)
            .recurrence(Recurrence::new("0", "3", "*"))
            .next_run(None)
            .build();

        let tasks = Arc::new(MockScheduledTaskRepository::with_tasks(vec![task]));
        let dispatcher = Arc::new(TaskDispatcher::new(tasks.clone(), Arc::new(registry)));
        let runner = ScheduleRunner::new(tasks.clone(), dispatcher);

        let now = Utc::now();
        let triggered = runner.tick(now).await.unwrap();

        assert_eq!(triggered, 1);
        assert_eq!(handler.call_count(), 1);

        let next = tasks.get_next_run(1).expect("next_run should be set");
        assert!(next > now);
    }

    #[tokio::test]
    async fn tick_ignores_tasks_scheduled_for_later() {
        let handler = CountingHandler::new();
        let mut registry = HandlerRegistry::new();
        registry.register("run_report", Arc::new(handler.clone()));

        let definition = TaskDefinitionBuilder::new(1, "sync_prices").build();
        let now = Utc::now();
        let task = ScheduledTaskBuilder::new(1, definition)
            .next_run(Some(now + chrono::Duration::hours(1)))
            .build();

        let tasks = Arc::new(MockScheduledTaskRepository::with_tasks(vec![task]));
        let dispatcher = Arc::new(TaskDispatcher::new(tasks.clone(), Arc::new(registry)));
        let runner = ScheduleRunner::new(tasks, dispatcher);

        assert_eq!(runner.tick(now).await.unwrap(), 0);
        assert_eq!(handler.call_count(), 0);
    }
}
