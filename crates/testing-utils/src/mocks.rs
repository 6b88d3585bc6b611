//! Mock implementations of the repository and port traits.
//!
//! These are in-memory stand-ins usable without a database, a Redis
//! instance, or the upstream gateway.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reportd_core::{ReportdError, ReportdResult};
use reportd_domain::{
    NewTaskDefinition, ReportRecord, ReportRepository, ReportSource, ScheduledTask,
    ScheduledTaskRepository, TaskDefinition, TaskDefinitionRepository, TaskHandler,
};
use tokio::sync::Notify;

/// Mock implementation of TaskDefinitionRepository.
#[derive(Clone, Default)]
pub struct MockTaskDefinitionRepository {
    definitions: Arc<Mutex<HashMap<i64, TaskDefinition>>>,
    next_id: Arc<Mutex<i64>>,
}

impl MockTaskDefinitionRepository {
    pub fn new() -> Self {
        Self {
            definitions: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(1)),
        }
    }

    pub fn count(&self) -> usize {
        self.definitions.lock().unwrap().len()
    }
}

#[async_trait]
impl TaskDefinitionRepository for MockTaskDefinitionRepository {
    async fn create(&self, definition: &NewTaskDefinition) -> ReportdResult<TaskDefinition> {
        let mut definitions = self.definitions.lock().unwrap();
        let mut next_id = self.next_id.lock().unwrap();

        let now = Utc::now();
        let created = TaskDefinition {
            id: *next_id,
            name: definition.name.clone(),
            handler: definition.handler.clone(),
            description: definition.description.clone(),
            active: definition.active,
            created_at: now,
            updated_at: now,
        };
        *next_id += 1;

        definitions.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> ReportdResult<Option<TaskDefinition>> {
        Ok(self.definitions.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> ReportdResult<Option<TaskDefinition>> {
        Ok(self
            .definitions
            .lock()
            .unwrap()
            .values()
            .find(|d| d.name == name)
            .cloned())
    }

    async fn update(&self, definition: &TaskDefinition) -> ReportdResult<()> {
        self.definitions
            .lock()
            .unwrap()
            .insert(definition.id, definition.clone());
        Ok(())
    }

    async fn delete(&self, id: i64) -> ReportdResult<()> {
        self.definitions.lock().unwrap().remove(&id);
        Ok(())
    }

    async fn list(&self) -> ReportdResult<Vec<TaskDefinition>> {
        Ok(self.definitions.lock().unwrap().values().cloned().collect())
    }
}

/// Mock implementation of ScheduledTaskRepository.
#[derive(Clone, Default)]
pub struct MockScheduledTaskRepository {
    tasks: Arc<Mutex<HashMap<i64, ScheduledTask>>>,
}

impl MockScheduledTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<ScheduledTask>) -> Self {
        let map = tasks.into_iter().map(|t| (t.id, t)).collect();
        Self {
            tasks: Arc::new(Mutex::new(map)),
        }
    }

    pub fn get_next_run(&self, id: i64) -> Option<DateTime<Utc>> {
        self.tasks
            .lock()
            .unwrap()
            .get(&id)
            .and_then(|t| t.next_run)
    }
}

#[async_trait]
impl ScheduledTaskRepository for MockScheduledTaskRepository {
    async fn get_by_id(&self, id: i64) -> ReportdResult<Option<ScheduledTask>> {
        Ok(self.tasks.lock().unwrap().get(&id).cloned())
    }

    async fn list_enabled(&self) -> ReportdResult<Vec<ScheduledTask>> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.is_runnable())
            .cloned()
            .collect())
    }

    async fn find_due(&self, now: DateTime<Utc>) -> ReportdResult<Vec<ScheduledTask>> {
        Ok(self
            .tasks
            .lock()
            .unwrap()
            .values()
            .filter(|t| t.is_runnable() && t.next_run.map(|n| n <= now).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn update_next_run(
        &self,
        id: i64,
        next_run: Option<DateTime<Utc>>,
    ) -> ReportdResult<()> {
        if let Some(task) = self.tasks.lock().unwrap().get_mut(&id) {
            task.next_run = next_run;
            task.updated_at = Utc::now();
        }
        Ok(())
    }
}

/// Mock implementation of ReportRepository.
#[derive(Clone, Default)]
pub struct MockReportRepository {
    reports: Arc<Mutex<HashMap<String, ReportRecord>>>,
}

impl MockReportRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reports(reports: Vec<ReportRecord>) -> Self {
        let map = reports.into_iter().map(|r| (r.name.clone(), r)).collect();
        Self {
            reports: Arc::new(Mutex::new(map)),
        }
    }

    pub fn payload(&self, name: &str) -> Option<serde_json::Value> {
        self.reports
            .lock()
            .unwrap()
            .get(name)
            .map(|r| r.payload.clone())
    }
}

#[async_trait]
impl ReportRepository for MockReportRepository {
    async fn get_by_name(&self, name: &str) -> ReportdResult<Option<ReportRecord>> {
        Ok(self.reports.lock().unwrap().get(name).cloned())
    }

    async fn save_result(
        &self,
        name: &str,
        payload: &serde_json::Value,
        computed_at: DateTime<Utc>,
    ) -> ReportdResult<()> {
        let mut reports = self.reports.lock().unwrap();
        match reports.get_mut(name) {
            Some(record) => {
                record.payload = payload.clone();
                record.computed_at = Some(computed_at);
                Ok(())
            }
            None => Err(ReportdError::report_not_found(name)),
        }
    }
}

/// Mock report source. Optionally gated so a test can hold a run
/// mid-fetch while asserting on a concurrent invocation.
#[derive(Clone)]
pub struct MockReportSource {
    raw: serde_json::Value,
    fail_fetch: bool,
    fetch_count: Arc<AtomicUsize>,
    fetch_started: Arc<Notify>,
    gate: Option<Arc<Notify>>,
}

impl MockReportSource {
    pub fn new(raw: serde_json::Value) -> Self {
        Self {
            raw,
            fail_fetch: false,
            fetch_count: Arc::new(AtomicUsize::new(0)),
            fetch_started: Arc::new(Notify::new()),
            gate: None,
        }
    }

    pub fn failing() -> Self {
        let mut source = Self::new(serde_json::Value::Null);
        source.fail_fetch = true;
        source
    }

    /// Make `fetch` block until [`Self::open_gate`] is called.
    pub fn gated(raw: serde_json::Value) -> Self {
        let mut source = Self::new(raw);
        source.gate = Some(Arc::new(Notify::new()));
        source
    }

    /// Resolves once a gated fetch has started.
    pub async fn wait_for_fetch(&self) {
        self.fetch_started.notified().await;
    }

    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportSource for MockReportSource {
    async fn fetch(&self, report: &str) -> ReportdResult<serde_json::Value> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);

        if self.fail_fetch {
            return Err(ReportdError::upstream_error(format!(
                "{report}: connection refused"
            )));
        }

        if let Some(gate) = &self.gate {
            self.fetch_started.notify_one();
            gate.notified().await;
            // once opened, the gate stays open for subsequent fetches
            gate.notify_one();
        }

        Ok(self.raw.clone())
    }

    fn transform(
        &self,
        report: &str,
        raw: serde_json::Value,
    ) -> ReportdResult<serde_json::Value> {
        Ok(serde_json::json!({ "report": report, "rows": raw }))
    }
}

/// Handler that records every parameter set it was invoked with.
#[derive(Clone, Default)]
pub struct CountingHandler {
    calls: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl CountingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<serde_json::Value> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TaskHandler for CountingHandler {
    async fn run(&self, params: &serde_json::Value) -> anyhow::Result<()> {
        self.calls.lock().unwrap().push(params.clone());
        Ok(())
    }
}

/// Handler that always fails with the given message.
pub struct FailingHandler {
    pub message: String,
}

impl FailingHandler {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl TaskHandler for FailingHandler {
    async fn run(&self, _params: &serde_json::Value) -> anyhow::Result<()> {
        Err(anyhow::anyhow!(self.message.clone()))
    }
}
