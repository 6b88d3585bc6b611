use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Named, administratively managed reference to a registered task handler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskDefinition {
    pub id: i64,
    pub name: String,
    /// Key into the process-wide handler registry.
    pub handler: String,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Write-side shape for creating a definition; the handler name is
/// validated against the registry before anything is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTaskDefinition {
    pub name: String,
    pub handler: String,
    pub description: Option<String>,
    pub active: bool,
}

/// Cron-like recurrence fields. Interpreted by the scheduler loop, never
/// by the dispatcher.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recurrence {
    pub minute: String,
    pub hour: String,
    pub day_of_week: String,
}

impl Recurrence {
    pub fn new<S: Into<String>>(minute: S, hour: S, day_of_week: S) -> Self {
        Self {
            minute: minute.into(),
            hour: hour.into(),
            day_of_week: day_of_week.into(),
        }
    }

    /// Render as a six-field cron expression (sec min hour dom month dow).
    pub fn to_cron_expression(&self) -> String {
        format!("0 {} {} * * {}", self.minute, self.hour, self.day_of_week)
    }
}

impl Default for Recurrence {
    fn default() -> Self {
        Self::new("*", "*", "*")
    }
}

/// A TaskDefinition bound to a recurrence and a parameter set.
///
/// Read-only from the dispatcher's perspective; only the administrative
/// surface and the scheduler loop (for `next_run`) mutate it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledTask {
    pub id: i64,
    pub definition: TaskDefinition,
    pub recurrence: Recurrence,
    /// JSON object of named arguments handed to the handler verbatim.
    pub parameters: serde_json::Value,
    pub enabled: bool,
    /// Scheduler bookkeeping; `None` means "due on the next tick".
    pub next_run: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScheduledTask {
    pub fn is_runnable(&self) -> bool {
        self.enabled && self.definition.active
    }
}

/// Last known-good result of a named report. A failed run never
/// overwrites `payload`; staleness is preferred over a broken result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportRecord {
    pub name: String,
    pub payload: serde_json::Value,
    pub active: bool,
    pub computed_at: Option<DateTime<Utc>>,
}
