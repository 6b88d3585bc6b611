//! Resolution and invocation of scheduled tasks.
//!
//! The dispatcher runs inside a best-effort scheduler shared by many
//! unrelated jobs, so nothing here may panic or propagate an error to
//! the trigger: every failure is contained in the outcome.

use std::sync::Arc;

use reportd_domain::{HandlerRegistry, ScheduledTaskRepository};
use tracing::error;

/// What happened to a single dispatch. The scheduler adapter decides
/// how to log each case; the dispatcher itself stays silent.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Completed,
    /// No scheduled task with that id; benign (stale trigger entries).
    NotFound,
    /// Task or its definition is switched off; intentionally silent.
    Disabled,
    /// The definition references a handler nobody registered.
    Unresolvable { handler: String },
    /// The handler (or a lookup on its behalf) failed.
    Failed { error: String },
}

pub struct TaskDispatcher {
    tasks: Arc<dyn ScheduledTaskRepository>,
    registry: Arc<HandlerRegistry>,
}

impl TaskDispatcher {
    pub fn new(tasks: Arc<dyn ScheduledTaskRepository>, registry: Arc<HandlerRegistry>) -> Self {
        Self { tasks, registry }
    }

    /// Resolve and invoke the task, containing every failure.
    pub async fn dispatch(&self, task_id: i64) -> DispatchOutcome {
        let task = match self.tasks.get_by_id(task_id).await {
            Ok(Some(task)) => task,
            Ok(None) => return DispatchOutcome::NotFound,
            Err(e) => {
                return DispatchOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };

        if !task.is_runnable() {
            return DispatchOutcome::Disabled;
        }

        // resolved fresh on every dispatch, never cached on the task
        let handler = match self.registry.resolve(&task.definition.handler) {
            Some(handler) => handler,
            None => {
                return DispatchOutcome::Unresolvable {
                    handler: task.definition.handler.clone(),
                }
            }
        };

        match handler.run(&task.parameters).await {
            Ok(()) => DispatchOutcome::Completed,
            Err(e) => DispatchOutcome::Failed {
                error: format!("{e:#}"),
            },
        }
    }

    /// Scheduler-facing entry point: outcomes surface through logs only.
    /// Success and disabled tasks are deliberately silent.
    pub async fn run(&self, task_id: i64) -> DispatchOutcome {
        let outcome = self.dispatch(task_id).await;
        match &outcome {
            DispatchOutcome::Completed | DispatchOutcome::Disabled => {}
            DispatchOutcome::NotFound => {
                error!(task_id, "scheduled task does not exist");
            }
            DispatchOutcome::Unresolvable { handler } => {
                error!(task_id, handler = %handler, "task handler is not registered");
            }
            DispatchOutcome::Failed { error } => {
                error!(task_id, error = %error, "task execution failed");
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportd_testing_utils::builders::{ScheduledTaskBuilder, TaskDefinitionBuilder};
    use reportd_testing_utils::mocks::{
        CountingHandler, FailingHandler, MockScheduledTaskRepository,
    };
    use serde_json::json;

    fn registry_with(name: &str, handler: Arc<dyn reportd_domain::TaskHandler>) -> Arc<HandlerRegistry> {
        let mut registry = HandlerRegistry::new();
        registry.register(name, handler);
        Arc::new(registry)
    }

    #[tokio::test]
    async fn dispatch_on_missing_task_is_not_found() {
        let tasks = Arc::new(MockScheduledTaskRepository::new());
        let dispatcher = TaskDispatcher::new(tasks, Arc::new(HandlerRegistry::new()));

        assert_eq!(dispatcher.run(999).await, DispatchOutcome::NotFound);
    }

    #[tokio::test]
    async fn disabled_task_is_skipped_without_invoking_handler() {
        let handler = CountingHandler::new();
        let definition = TaskDefinitionBuilder::new(1, "sync_prices").build();
        let task = ScheduledTaskBuilder::new(1, definition).disabled().build();

        let tasks = Arc::new(MockScheduledTaskRepository::with_tasks(vec![task]));
        let dispatcher =
            TaskDispatcher::new(tasks, registry_with("run_report", Arc::new(handler.clone())));

        assert_eq!(dispatcher.dispatch(1).await, DispatchOutcome::Disabled);
        assert_eq!(handler.call_count(), 0);
    }

    #[tokio::test]
    async fn inactive_definition_is_skipped_without_invoking_handler() {
        let handler = CountingHandler::new();
        let definition = TaskDefinitionBuilder::new(1, "sync_prices").inactive().build();
        let task = ScheduledTaskBuilder::new(1, definition).build();

        let tasks = Arc::new(MockScheduledTaskRepository::with_tasks(vec![task]));
        let dispatcher =
            TaskDispatcher::new(tasks, registry_with("run_report", Arc::new(handler.clone())));

        assert_eq!(dispatcher.dispatch(1).await, DispatchOutcome::Disabled);
        assert_eq!(handler.call_count(), 0);
    }

    #[tokio::test]
    async fn runnable_task_invokes_handler_once_with_stored_parameters() {
        let handler = CountingHandler::new();
        let definition = TaskDefinitionBuilder::new(1, "sync_prices").build();
        let params = json!({"report": "daily_summary", "window_days": 7});
        let task = ScheduledTaskBuilder::new(1, definition)
            .parameters(params.clone())
            .build();

        let tasks = Arc::new(MockScheduledTaskRepository::with_tasks(vec![task]));
        let dispatcher =
            TaskDispatcher::new(tasks, registry_with("run_report", Arc::new(handler.clone())));

        assert_eq!(dispatcher.dispatch(1).await, DispatchOutcome::Completed);
        assert_eq!(handler.calls(), vec![params]);
    }

    #[tokio::test]
    async fn unregistered_handler_is_unresolvable() {
        let definition = TaskDefinitionBuilder::new(1, "sync_prices")
            .handler("dump_binance_orders")
            .build();
        let task = ScheduledTaskBuilder::new(1, definition).build();

        let tasks = Arc::new(MockScheduledTaskRepository::with_tasks(vec![task]));
        let dispatcher = TaskDispatcher::new(
            tasks,
            registry_with("run_report", Arc::new(CountingHandler::new())),
        );

        assert_eq!(
            dispatcher.dispatch(1).await,
            DispatchOutcome::Unresolvable {
                handler: "dump_binance_orders".to_string()
            }
        );
    }

    #[tokio::test]
    async fn handler_failure_is_contained() {
        let definition = TaskDefinitionBuilder::new(1, "sync_prices").build();
        let task = ScheduledTaskBuilder::new(1, definition).build();

        let tasks = Arc::new(MockScheduledTaskRepository::with_tasks(vec![task]));
        let dispatcher = TaskDispatcher::new(
            tasks,
            registry_with("run_report", Arc::new(FailingHandler::new("HANA timeout"))),
        );

        match dispatcher.run(1).await {
            DispatchOutcome::Failed { error } => assert!(error.contains("HANA timeout")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
