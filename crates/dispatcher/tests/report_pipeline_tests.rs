//! Cross-component flows: report runs under lock contention, failure
//! containment, and dispatch-driven report execution.

use std::sync::Arc;
use std::time::Duration;

use reportd_dispatcher::{
    DispatchOutcome, ReportPipeline, ReportRunHandler, RunOutcome, TaskDispatcher,
};
use reportd_domain::{HandlerRegistry, LockStore, ReportRecord};
use reportd_infrastructure::InMemoryLockStore;
use reportd_testing_utils::builders::{report_record, ScheduledTaskBuilder, TaskDefinitionBuilder};
use reportd_testing_utils::mocks::{
    MockReportRepository, MockReportSource, MockScheduledTaskRepository,
};
use serde_json::json;

const LOCK_TTL: Duration = Duration::from_secs(60);

fn pipeline_with(
    reports: MockReportRepository,
    source: MockReportSource,
) -> Arc<ReportPipeline> {
    let locks: Arc<dyn LockStore> = Arc::new(InMemoryLockStore::new());
    Arc::new(ReportPipeline::new(
        Arc::new(reports),
        Arc::new(source),
        locks,
        LOCK_TTL,
    ))
}

#[tokio::test]
async fn successful_run_persists_the_transformed_payload() {
    let reports = MockReportRepository::with_reports(vec![report_record("daily_summary")]);
    let rows = json!([{"supplier": "ACME", "balance": 120.5}]);
    let source = MockReportSource::new(rows.clone());

    let pipeline = pipeline_with(reports.clone(), source);

    assert_eq!(pipeline.run_report("daily_summary").await, RunOutcome::Completed);
    assert_eq!(
        reports.payload("daily_summary").unwrap(),
        json!({"report": "daily_summary", "rows": rows})
    );
}

#[tokio::test]
async fn missing_report_is_not_found_and_nothing_is_fetched() {
    let reports = MockReportRepository::new();
    let source = MockReportSource::new(json!([]));

    let pipeline = pipeline_with(reports, source.clone());

    assert_eq!(pipeline.run_report("ghost_report").await, RunOutcome::NotFound);
    assert_eq!(source.fetch_count(), 0);
}

#[tokio::test]
async fn inactive_report_is_silently_skipped() {
    let mut record = report_record("daily_summary");
    record.active = false;
    let reports = MockReportRepository::with_reports(vec![record]);
    let source = MockReportSource::new(json!([]));

    let pipeline = pipeline_with(reports, source.clone());

    assert_eq!(pipeline.run_report("daily_summary").await, RunOutcome::Disabled);
    assert_eq!(source.fetch_count(), 0);
}

#[tokio::test]
async fn fetch_failure_keeps_the_previous_payload_and_releases_the_lock() {
    let previous = ReportRecord {
        name: "daily_summary".to_string(),
        payload: json!({"rows": [{"supplier": "OLD"}]}),
        active: true,
        computed_at: None,
    };
    let reports = MockReportRepository::with_reports(vec![previous.clone()]);

    let locks: Arc<dyn LockStore> = Arc::new(InMemoryLockStore::new());
    let failing = Arc::new(ReportPipeline::new(
        Arc::new(reports.clone()),
        Arc::new(MockReportSource::failing()),
        Arc::clone(&locks),
        LOCK_TTL,
    ));

    match failing.run_report("daily_summary").await {
        RunOutcome::Failed { error } => assert!(error.contains("connection refused")),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(reports.payload("daily_summary").unwrap(), previous.payload);

    // the failed run released its lock: a healthy run proceeds at once
    let healthy = ReportPipeline::new(
        Arc::new(reports.clone()),
        Arc::new(MockReportSource::new(json!([{"supplier": "NEW"}]))),
        locks,
        LOCK_TTL,
    );
    assert_eq!(healthy.run_report("daily_summary").await, RunOutcome::Completed);
}

#[tokio::test]
async fn concurrent_runs_of_the_same_report_serialize_to_one_fetch() {
    let reports = MockReportRepository::with_reports(vec![report_record("daily_summary")]);
    let rows = json!([{"supplier": "ACME", "balance": 120.5}]);
    let source = MockReportSource::gated(rows.clone());

    let pipeline = pipeline_with(reports.clone(), source.clone());

    let first = {
        let pipeline = Arc::clone(&pipeline);
        tokio::spawn(async move { pipeline.run_report("daily_summary").await })
    };

    // first run is now mid-fetch, holding the lock
    source.wait_for_fetch().await;

    let second = pipeline.run_report("daily_summary").await;
    assert_eq!(second, RunOutcome::Skipped);
    // no state mutated by the skipped run
    assert_eq!(reports.payload("daily_summary").unwrap(), json!({}));

    source.open_gate();
    assert_eq!(first.await.unwrap(), RunOutcome::Completed);

    assert_eq!(source.fetch_count(), 1);
    assert_eq!(
        reports.payload("daily_summary").unwrap(),
        json!({"report": "daily_summary", "rows": rows})
    );

    // with the lock released, a later run goes through again
    assert_eq!(pipeline.run_report("daily_summary").await, RunOutcome::Completed);
    assert_eq!(source.fetch_count(), 2);
}

#[tokio::test]
async fn report_runs_dispatch_like_any_scheduled_task() {
    let reports = MockReportRepository::with_reports(vec![report_record("daily_summary")]);
    let rows = json!([{"supplier": "ACME"}]);
    let pipeline = pipeline_with(reports.clone(), MockReportSource::new(rows.clone()));

    let mut registry = HandlerRegistry::new();
    registry.register("run_report", Arc::new(ReportRunHandler::new(pipeline)));

    let definition = TaskDefinitionBuilder::new(1, "daily_summary_refresh").build();
    let task = ScheduledTaskBuilder::new(1, definition)
        .parameters(json!({"report": "daily_summary"}))
        .build();

    let tasks = Arc::new(MockScheduledTaskRepository::with_tasks(vec![task]));
    let dispatcher = TaskDispatcher::new(tasks, Arc::new(registry));

    assert_eq!(dispatcher.dispatch(1).await, DispatchOutcome::Completed);
    assert_eq!(
        reports.payload("daily_summary").unwrap(),
        json!({"report": "daily_summary", "rows": rows})
    );
}

#[tokio::test]
async fn report_handler_rejects_a_missing_parameter() {
    let reports = MockReportRepository::new();
    let pipeline = pipeline_with(reports, MockReportSource::new(json!([])));

    let mut registry = HandlerRegistry::new();
    registry.register("run_report", Arc::new(ReportRunHandler::new(pipeline)));

    let definition = TaskDefinitionBuilder::new(1, "broken_schedule").build();
    let task = ScheduledTaskBuilder::new(1, definition)
        .parameters(json!({}))
        .build();

    let tasks = Arc::new(MockScheduledTaskRepository::with_tasks(vec![task]));
    let dispatcher = TaskDispatcher::new(tasks, Arc::new(registry));

    match dispatcher.dispatch(1).await {
        DispatchOutcome::Failed { error } => assert!(error.contains("missing 'report'")),
        other => panic!("expected Failed, got {other:?}"),
    }
}
