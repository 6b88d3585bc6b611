//! Builders for test entities with sensible defaults.

use chrono::{DateTime, Utc};
use reportd_domain::{Recurrence, ReportRecord, ScheduledTask, TaskDefinition};

pub struct TaskDefinitionBuilder {
    definition: TaskDefinition,
}

impl TaskDefinitionBuilder {
    pub fn new(id: i64, name: &str) -> Self {
        let now = Utc::now();
        Self {
            definition: TaskDefinition {
                id,
                name: name.to_string(),
                handler: "run_report".to_string(),
                description: None,
                active: true,
                created_at: now,
                updated_at: now,
            },
        }
    }

    pub fn handler(mut self, handler: &str) -> Self {
        self.definition.handler = handler.to_string();
        self
    }

    pub fn inactive(mut self) -> Self {
        self.definition.active = false;
        self
    }

    pub fn build(self) -> TaskDefinition {
        self.definition
    }
}

pub struct ScheduledTaskBuilder {
    task: ScheduledTask,
}

impl ScheduledTaskBuilder {
    pub fn new(id: i64, definition: TaskDefinition) -> Self {
        let now = Utc::now();
        Self {
            task: ScheduledTask {
                id,
                definition,
                recurrence: Recurrence::default(),
                parameters: serde_json::json!({}),
                enabled: true,
                next_run: None,
                created_at: now,
                updated_at: now,
            },
        }
    }

    pub fn parameters(mut self, parameters: serde_json::Value) -> Self {
        self.task.parameters = parameters;
        self
    }

    pub fn recurrence(mut self, recurrence: Recurrence) -> Self {
        self.task.recurrence = recurrence;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.task.enabled = false;
        self
    }

    pub fn next_run(mut self, next_run: Option<DateTime<Utc>>) -> Self {
        self.task.next_run = next_run;
        self
    }

    pub fn build(self) -> ScheduledTask {
        self.task
    }
}

pub fn report_record(name: &str) -> ReportRecord {
    ReportRecord {
        name: name.to_string(),
        payload: serde_json::json!({}),
        active: true,
        computed_at: None,
    }
}
