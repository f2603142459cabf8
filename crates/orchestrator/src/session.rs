//! Session state machine driving the two resolution phases

use crate::aggregator::ResultSet;
use crate::config::BatchSettings;
use crate::error::{OrchestratorError, Result};
use crate::metrics::BatchMetrics;
use crate::scheduler::{BatchScheduler, BatchSummary};
use crate::types::{Phase, PhaseReport, SessionSnapshot};
use bioresolve_core::{Config, EntityName, ResolutionContext};
use bioresolve_gateway::{create_resolution_gateway, ResolutionGateway};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Cloneable handle that requests cancellation of the current run.
///
/// Each run arms a fresh token, so a stop issued while no run is in flight
/// has no effect on the next one.
#[derive(Clone, Default)]
pub struct StopHandle {
    token: Arc<Mutex<CancellationToken>>,
}

impl StopHandle {
    /// Stop after the in-flight window finishes
    pub fn stop(&self) {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_cancelled()
    }

    fn arm(&self) -> CancellationToken {
        let fresh = CancellationToken::new();
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = fresh.clone();
        fresh
    }
}

impl std::fmt::Debug for StopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopHandle")
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Owns one resolution session: results, phase, progress and activity log.
///
/// Commands take `&mut self`, so the session has a single writer. Observers
/// read snapshots through [`Orchestrator::subscribe`]; a new snapshot is
/// published after every window and every phase transition.
pub struct Orchestrator {
    scheduler: BatchScheduler,
    state: SessionSnapshot,
    stop: StopHandle,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl Orchestrator {
    pub fn new(gateway: Arc<dyn ResolutionGateway>, settings: BatchSettings) -> Self {
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::default());
        Self {
            scheduler: BatchScheduler::new(gateway, settings),
            state: SessionSnapshot::default(),
            stop: StopHandle::default(),
            snapshot_tx,
        }
    }

    /// Build an orchestrator with the configured gateway and batch settings
    pub fn from_config(config: &Config) -> bioresolve_core::Result<Self> {
        config.validate()?;
        let gateway = create_resolution_gateway(&config.gateway)?;
        let settings = BatchSettings::from_config(&config.batch)?;
        Ok(Self::new(gateway, settings))
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn results(&self) -> &ResultSet {
        &self.state.results
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.clone()
    }

    pub fn metrics(&self) -> BatchMetrics {
        self.state.metrics()
    }

    /// Receive a snapshot after every window and phase transition
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Run the initial phase over `entities`.
    ///
    /// Rejected without touching the session when not idle, when the list is
    /// empty, or when the provider needs a credential that is missing.
    pub async fn start(
        &mut self,
        entities: Vec<EntityName>,
        context: ResolutionContext,
    ) -> Result<PhaseReport> {
        self.require_phase("start", Phase::Idle)?;
        if entities.is_empty() {
            return Err(OrchestratorError::EmptyEntityList);
        }
        let gateway = self.scheduler.gateway();
        if gateway.requires_credential() && !gateway.has_credential() {
            return Err(OrchestratorError::MissingCredential {
                provider: gateway.provider_name().to_string(),
            });
        }

        let cancel = self.stop.arm();
        self.state.context = context.for_phase(false);
        self.state.results.clear();
        self.log(format!(
            "Starting resolution of {} entities with {}",
            entities.len(),
            self.scheduler.gateway().provider_name()
        ));
        self.enter_running(Phase::RunningInitial, entities.len());

        let summary = self.run_phase(&entities, false, &cancel).await;
        let failures = self.state.results.failed_entities().len();

        let next = if summary.canceled {
            self.log(format!(
                "Stopped after {} of {} entities",
                summary.processed,
                entities.len()
            ));
            Phase::Complete
        } else if failures == 0 {
            self.log("All entities resolved".to_string());
            Phase::Complete
        } else {
            self.log(format!(
                "{failures} entities unresolved, deep search available"
            ));
            Phase::DeepSearchPending
        };

        Ok(self.finish_phase(next, &summary))
    }

    /// Retry every row with validation issues using the deep-search strategy
    pub async fn start_deep_search(&mut self) -> Result<PhaseReport> {
        self.require_phase("start deep search", Phase::DeepSearchPending)?;

        let candidates = self.state.results.failed_entities();
        if candidates.is_empty() {
            self.log("No unresolved entities for deep search".to_string());
            return Ok(self.finish_phase(Phase::Complete, &BatchSummary::default()));
        }

        let cancel = self.stop.arm();
        self.log(format!(
            "Starting deep search for {} entities",
            candidates.len()
        ));
        self.enter_running(Phase::RunningDeepSearch, candidates.len());

        let summary = self.run_phase(&candidates, true, &cancel).await;
        if summary.canceled {
            self.log(format!(
                "Deep search stopped after {} of {} entities",
                summary.processed,
                candidates.len()
            ));
        } else {
            let still_failing = self.state.results.failed_entities().len();
            self.log(format!(
                "Deep search finished, {still_failing} entities still unresolved"
            ));
        }

        Ok(self.finish_phase(Phase::Complete, &summary))
    }

    /// Decline the fallback phase
    pub fn skip_deep_search(&mut self) -> Result<PhaseReport> {
        self.require_phase("skip deep search", Phase::DeepSearchPending)?;
        self.log("Deep search skipped".to_string());
        Ok(self.finish_phase(Phase::Complete, &BatchSummary::default()))
    }

    /// Return to idle, clearing results, progress and logs
    pub fn reset(&mut self) {
        if self.state.phase.is_running() {
            warn!(phase = %self.state.phase, "Resetting a session left in a running phase");
        }
        self.state = SessionSnapshot::default();
        info!("Session reset");
        self.publish();
    }

    /// Replace the session with a persisted snapshot.
    ///
    /// A snapshot saved mid-run is restored as complete since its run can
    /// no longer be resumed.
    pub fn restore(&mut self, mut snapshot: SessionSnapshot) {
        if snapshot.phase.is_running() {
            warn!(phase = %snapshot.phase, "Restored session was mid-run, marking complete");
            snapshot.phase = Phase::Complete;
        }
        self.state = snapshot;
        info!(
            phase = %self.state.phase,
            records = self.state.results.len(),
            "Session restored"
        );
        self.publish();
    }

    fn require_phase(&self, command: &'static str, expected: Phase) -> Result<()> {
        if self.state.phase == expected {
            Ok(())
        } else {
            Err(OrchestratorError::InvalidTransition {
                command,
                phase: self.state.phase,
            })
        }
    }

    fn enter_running(&mut self, phase: Phase, total: usize) {
        self.state.phase = phase;
        self.state.progress = 0;
        self.state.total_for_progress = total;
        info!(phase = %phase, total, "Phase started");
        self.publish();
    }

    async fn run_phase(
        &mut self,
        entities: &[EntityName],
        is_deep_search: bool,
        cancel: &CancellationToken,
    ) -> BatchSummary {
        let Self {
            scheduler,
            state,
            snapshot_tx,
            ..
        } = self;
        let SessionSnapshot {
            results,
            phase,
            progress,
            total_for_progress,
            logs,
            context,
        } = state;
        let phase = *phase;
        let total = *total_for_progress;
        let snapshot_context = context.clone();

        let summary = scheduler
            .run_batch(
                entities,
                context,
                is_deep_search,
                results,
                cancel,
                |window, current| {
                    *progress = window.completed;
                    logs.push(format!(
                        "Window {}/{} complete ({}/{})",
                        window.window_index + 1,
                        window.window_count,
                        window.completed,
                        window.total
                    ));
                    snapshot_tx.send_replace(SessionSnapshot {
                        results: current.clone(),
                        phase,
                        progress: window.completed,
                        total_for_progress: total,
                        logs: logs.clone(),
                        context: snapshot_context.clone(),
                    });
                },
            )
            .await;

        if summary.unmatched > 0 {
            self.log(format!(
                "{} deep-search results had no matching row and were appended",
                summary.unmatched
            ));
        }
        summary
    }

    fn finish_phase(&mut self, next: Phase, summary: &BatchSummary) -> PhaseReport {
        self.state.phase = next;
        let metrics = self.state.metrics();
        info!(
            phase = %next,
            resolved = metrics.resolved,
            failed = metrics.failed,
            average_processing_secs = metrics.average_processing_secs,
            "Phase finished"
        );
        self.publish();

        PhaseReport {
            phase: next,
            processed: summary.processed,
            canceled: summary.canceled,
            metrics,
        }
    }

    fn log(&mut self, line: String) {
        info!("{line}");
        self.state.logs.push(line);
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.state.clone());
    }
}
