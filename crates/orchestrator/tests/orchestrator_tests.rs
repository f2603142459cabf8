//! Integration tests for the batch resolution orchestrator

use bioresolve_core::{EntityName, ResolutionContext};
use bioresolve_gateway::{CallHook, MockCall, MockResolutionGateway};
use bioresolve_orchestrator::{BatchSettings, Orchestrator, OrchestratorError, Phase, StopHandle};
use pretty_assertions::assert_eq;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::time::Instant;

fn names(items: &[&str]) -> Vec<EntityName> {
    items.iter().map(|s| EntityName::new(s).unwrap()).collect()
}

fn settings(limit: usize, delay_ms: u64) -> BatchSettings {
    BatchSettings::new(limit, Duration::from_millis(delay_ms), None).unwrap()
}

fn inputs(session: &Orchestrator) -> Vec<String> {
    session
        .results()
        .records()
        .iter()
        .map(|r| r.input_entity.to_string())
        .collect()
}

#[tokio::test(start_paused = true)]
async fn test_initial_phase_preserves_input_order() {
    // Later entities in each window finish first
    let gateway = MockResolutionGateway::new()
        .with_delay("E1", Duration::from_secs(3))
        .with_delay("E2", Duration::from_secs(2))
        .with_delay("E3", Duration::from_secs(1))
        .with_delay("E4", Duration::from_secs(2))
        .with_delay("E5", Duration::from_secs(1));
    let mut session = Orchestrator::new(Arc::new(gateway), settings(3, 800));

    let entities = names(&["E1", "E2", "E3", "E4", "E5"]);
    let report = session
        .start(entities, ResolutionContext::default())
        .await
        .unwrap();

    assert_eq!(report.phase, Phase::Complete);
    assert_eq!(report.processed, 5);
    assert!(!report.canceled);
    assert_eq!(inputs(&session), vec!["E1", "E2", "E3", "E4", "E5"]);
}

#[tokio::test(start_paused = true)]
async fn test_windows_bound_concurrency() {
    let mut gateway = MockResolutionGateway::new();
    for entity in ["A", "B", "C", "D", "E", "F", "G"] {
        gateway = gateway.with_delay(entity, Duration::from_millis(100));
    }
    let gateway = Arc::new(gateway);
    let mut session = Orchestrator::new(gateway.clone(), settings(3, 800));
    let updates = session.subscribe();

    session
        .start(
            names(&["A", "B", "C", "D", "E", "F", "G"]),
            ResolutionContext::default(),
        )
        .await
        .unwrap();

    assert_eq!(gateway.max_in_flight(), 3);
    assert_eq!(gateway.calls().len(), 7);

    let snapshot = updates.borrow().clone();
    assert_eq!(snapshot.progress, 7);
    assert_eq!(snapshot.total_for_progress, 7);
    assert_eq!(snapshot.phase, Phase::Complete);
    assert_eq!(
        snapshot
            .logs
            .iter()
            .filter(|line| line.starts_with("Window "))
            .count(),
        3
    );
}

#[tokio::test(start_paused = true)]
async fn test_inter_window_delay_between_windows_only() {
    let gateway = MockResolutionGateway::new();
    let mut session = Orchestrator::new(Arc::new(gateway), settings(3, 800));

    let started = Instant::now();
    session
        .start(
            names(&["A", "B", "C", "D", "E", "F", "G"]),
            ResolutionContext::default(),
        )
        .await
        .unwrap();

    // Three windows, two pauses
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(1600), "{elapsed:?}");
    assert!(elapsed < Duration::from_millis(1700), "{elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_second_window_skips_third() {
    let handle: Arc<OnceLock<StopHandle>> = Arc::new(OnceLock::new());
    let hook_handle = handle.clone();
    let hook: CallHook = Arc::new(move |entity: &EntityName, _: &ResolutionContext| {
        if entity.as_str() == "E4" {
            if let Some(stop) = hook_handle.get() {
                stop.stop();
            }
        }
    });
    let gateway = MockResolutionGateway::new().with_call_hook(hook);
    let gateway = Arc::new(gateway.with_delay("E5", Duration::from_secs(1)));
    let mut session = Orchestrator::new(gateway.clone(), settings(3, 800));
    handle.set(session.stop_handle()).unwrap();

    let report = session
        .start(
            names(&["E1", "E2", "E3", "E4", "E5", "E6", "E7"]),
            ResolutionContext::default(),
        )
        .await
        .unwrap();

    assert!(report.canceled);
    assert_eq!(report.phase, Phase::Complete);
    assert_eq!(report.processed, 6);
    // The in-flight window finishes, the third never launches
    assert_eq!(inputs(&session), vec!["E1", "E2", "E3", "E4", "E5", "E6"]);
    assert_eq!(gateway.calls().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_canceled_run_with_failures_skips_deep_search() {
    let handle: Arc<OnceLock<StopHandle>> = Arc::new(OnceLock::new());
    let hook_handle = handle.clone();
    let gateway = MockResolutionGateway::new()
        .with_failure("A", "HTTP 500")
        .with_call_hook(Arc::new(move |_: &EntityName, _: &ResolutionContext| {
            if let Some(stop) = hook_handle.get() {
                stop.stop();
            }
        }) as CallHook);
    let mut session = Orchestrator::new(Arc::new(gateway), settings(1, 800));
    handle.set(session.stop_handle()).unwrap();

    let report = session
        .start(names(&["A", "B"]), ResolutionContext::default())
        .await
        .unwrap();

    assert_eq!(report.phase, Phase::Complete);
    assert_eq!(report.metrics.failed, 1);
    assert_eq!(inputs(&session), vec!["A"]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_before_start_is_ignored() {
    let mut session = Orchestrator::new(Arc::new(MockResolutionGateway::new()), settings(3, 0));
    session.stop_handle().stop();

    let report = session
        .start(names(&["A", "B", "C", "D"]), ResolutionContext::default())
        .await
        .unwrap();

    assert!(!report.canceled);
    assert_eq!(session.results().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_failure_is_isolated() {
    let gateway = MockResolutionGateway::new().with_failure("E3", "Network error");
    let mut session = Orchestrator::new(Arc::new(gateway), settings(3, 800));

    let report = session
        .start(
            names(&["E1", "E2", "E3", "E4", "E5"]),
            ResolutionContext::default(),
        )
        .await
        .unwrap();

    assert_eq!(report.phase, Phase::DeepSearchPending);
    assert_eq!(report.metrics.total, 5);
    assert_eq!(report.metrics.resolved, 4);
    assert_eq!(report.metrics.failed, 1);

    let records = session.results().records();
    assert_eq!(records.len(), 5);
    assert!(records[2]
        .validation_issues
        .starts_with("Resolution failed: "));
    assert!(records[2].validation_issues.contains("Network error"));
    assert!(records
        .iter()
        .enumerate()
        .all(|(i, r)| i == 2 || r.is_resolved()));
}

#[tokio::test(start_paused = true)]
async fn test_no_failures_goes_straight_to_complete() {
    let gateway = Arc::new(MockResolutionGateway::new());
    let mut session = Orchestrator::new(gateway.clone(), settings(3, 0));

    let report = session
        .start(names(&["A", "B"]), ResolutionContext::default())
        .await
        .unwrap();

    assert_eq!(report.phase, Phase::Complete);
    let err = session.start_deep_search().await.unwrap_err();
    assert!(matches!(err, OrchestratorError::InvalidTransition { .. }));
    assert!(gateway.calls().iter().all(|c| !c.deep_search));
}

#[tokio::test(start_paused = true)]
async fn test_deep_search_replaces_failed_rows_in_place() {
    let gateway = Arc::new(
        MockResolutionGateway::new()
            .with_initial_failure("asprin", "unknown name")
            .with_partial("XYZ1", "No ontology term")
            .with_failure("??", "gibberish"),
    );
    let mut session = Orchestrator::new(gateway.clone(), settings(2, 800));

    let entities = names(&["TP53", "asprin", "XYZ1", "BRCA1", "??"]);
    let report = session
        .start(entities, ResolutionContext::default())
        .await
        .unwrap();
    assert_eq!(report.phase, Phase::DeepSearchPending);
    assert_eq!(report.metrics.failed, 3);
    let before = session.results().records().to_vec();

    let report = session.start_deep_search().await.unwrap();
    assert_eq!(report.phase, Phase::Complete);
    assert_eq!(report.processed, 3);
    assert_eq!(report.metrics.resolved, 4);
    assert_eq!(report.metrics.failed, 1);

    assert_eq!(inputs(&session), vec!["TP53", "asprin", "XYZ1", "BRCA1", "??"]);
    let records = session.results().records();
    assert!(records[1].is_resolved() && records[1].deep_search);
    assert!(records[2].is_resolved() && records[2].deep_search);
    // Rows without issues are untouched
    assert_eq!(records[0], before[0]);
    assert_eq!(records[3], before[3]);
    assert_ne!(records[1], before[1]);
    assert!(records[4].deep_search);
    assert_eq!(records[4].validation_issues, "Resolution failed: Malformed response: gibberish");

    let deep_calls: Vec<MockCall> = gateway
        .calls()
        .into_iter()
        .filter(|c| c.deep_search)
        .collect();
    assert_eq!(
        deep_calls.iter().map(|c| c.entity.as_str()).collect::<Vec<_>>(),
        vec!["asprin", "XYZ1", "??"]
    );
}

#[tokio::test(start_paused = true)]
async fn test_deep_search_progress_counts_candidates() {
    let gateway = MockResolutionGateway::new().with_failure("B", "x");
    let mut session = Orchestrator::new(Arc::new(gateway), settings(3, 0));
    let updates = session.subscribe();

    session
        .start(names(&["A", "B", "C", "D"]), ResolutionContext::default())
        .await
        .unwrap();
    assert_eq!(updates.borrow().total_for_progress, 4);

    session.start_deep_search().await.unwrap();
    let snapshot = updates.borrow().clone();
    assert_eq!(snapshot.progress, 1);
    assert_eq!(snapshot.total_for_progress, 1);
    assert_eq!(snapshot.results.len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_average_processing_time() {
    let gateway = MockResolutionGateway::new()
        .with_delay("A", Duration::from_secs(1))
        .with_delay("B", Duration::from_secs(2))
        .with_delay("C", Duration::from_secs(3));
    let mut session = Orchestrator::new(Arc::new(gateway), settings(3, 800));

    let report = session
        .start(names(&["A", "B", "C"]), ResolutionContext::default())
        .await
        .unwrap();

    assert!((report.metrics.average_processing_secs - 2.0).abs() < 0.01);
    assert_eq!(report.metrics, session.snapshot().metrics());
}

#[tokio::test(start_paused = true)]
async fn test_task_timeout_fails_only_slow_entity() {
    let gateway = MockResolutionGateway::new().with_delay("slow", Duration::from_secs(30));
    let settings = BatchSettings::new(3, Duration::ZERO, Some(Duration::from_secs(5))).unwrap();
    let mut session = Orchestrator::new(Arc::new(gateway), settings);

    let report = session
        .start(names(&["fast", "slow"]), ResolutionContext::default())
        .await
        .unwrap();

    assert_eq!(report.phase, Phase::DeepSearchPending);
    let records = session.results().records();
    assert!(records[0].is_resolved());
    assert_eq!(
        records[1].validation_issues,
        "Resolution failed: Resolution timed out after 5.0s"
    );
}

#[tokio::test]
async fn test_empty_list_rejected_without_state_change() {
    let mut session = Orchestrator::new(Arc::new(MockResolutionGateway::new()), settings(3, 0));

    let err = session
        .start(Vec::new(), ResolutionContext::default())
        .await
        .unwrap_err();

    assert_eq!(err, OrchestratorError::EmptyEntityList);
    assert_eq!(session.phase(), Phase::Idle);
    assert!(session.snapshot().logs.is_empty());
}

#[tokio::test]
async fn test_missing_credential_rejected_before_any_call() {
    let gateway = Arc::new(MockResolutionGateway::new().with_credential(false));
    let mut session = Orchestrator::new(gateway.clone(), settings(3, 0));

    let err = session
        .start(names(&["TP53"]), ResolutionContext::default())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        OrchestratorError::MissingCredential {
            provider: "mock".to_string()
        }
    );
    assert_eq!(session.phase(), Phase::Idle);
    assert!(gateway.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_duplicates_keep_one_row_each() {
    let gateway = MockResolutionGateway::new().with_initial_failure("X", "flaky");
    let mut session = Orchestrator::new(Arc::new(gateway), settings(3, 0));

    session
        .start(names(&["X", "Y", "X"]), ResolutionContext::default())
        .await
        .unwrap();
    assert_eq!(session.results().len(), 3);

    session.start_deep_search().await.unwrap();
    let records = session.results().records();
    assert_eq!(records.len(), 3);
    // Both deep-search outcomes land on the first occurrence
    assert!(records[0].is_resolved());
    assert!(!records[2].is_resolved());
}

#[tokio::test(start_paused = true)]
async fn test_reset_then_start_again() {
    let mut session = Orchestrator::new(Arc::new(MockResolutionGateway::new()), settings(3, 0));
    session
        .start(names(&["A"]), ResolutionContext::default())
        .await
        .unwrap();

    session.reset();
    assert_eq!(session.phase(), Phase::Idle);

    session
        .start(names(&["B", "C"]), ResolutionContext::default())
        .await
        .unwrap();
    assert_eq!(inputs(&session), vec!["B", "C"]);
}

#[tokio::test(start_paused = true)]
async fn test_restored_session_runs_deep_search_with_saved_context() {
    let gateway = Arc::new(MockResolutionGateway::new().with_initial_failure("B", "x"));
    let mut first = Orchestrator::new(gateway.clone(), settings(3, 0));
    let context = ResolutionContext::builder()
        .background("Human liver samples".to_string())
        .build()
        .unwrap();
    first.start(names(&["A", "B"]), context).await.unwrap();

    let json = serde_json::to_string(&first.snapshot()).unwrap();

    let mut second = Orchestrator::new(gateway, settings(3, 0));
    second.restore(serde_json::from_str(&json).unwrap());
    assert_eq!(second.phase(), Phase::DeepSearchPending);
    assert_eq!(
        second.snapshot().context.background.as_deref(),
        Some("Human liver samples")
    );

    let report = second.start_deep_search().await.unwrap();
    assert_eq!(report.metrics.failed, 0);
}
