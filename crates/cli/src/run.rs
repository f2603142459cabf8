//! Phase drivers shared by the `resolve` and `deep-search` commands

use crate::progress::PhaseMonitor;
use anyhow::{bail, Result};
use bioresolve_core::{EntityName, ResolutionContext};
use bioresolve_orchestrator::{Orchestrator, Phase, PhaseReport};
use tracing::info;

/// Run the initial phase, then deep search when requested and needed
pub async fn resolve_batch(
    session: &mut Orchestrator,
    entities: Vec<EntityName>,
    context: ResolutionContext,
    auto_deep_search: bool,
    show_progress: bool,
) -> Result<Vec<PhaseReport>> {
    let monitor = PhaseMonitor::attach(session, show_progress);
    let initial = session.start(entities, context).await;
    monitor.finish(&session.snapshot());
    let initial = initial?;

    let mut reports = vec![initial.clone()];
    if initial.phase == Phase::DeepSearchPending && auto_deep_search {
        reports.push(deep_search(session, show_progress).await?);
    }
    Ok(reports)
}

/// Run the deep-search phase of a session waiting for it
pub async fn deep_search(session: &mut Orchestrator, show_progress: bool) -> Result<PhaseReport> {
    if session.phase() != Phase::DeepSearchPending {
        bail!(
            "Session is {}, deep search needs a session with unresolved entities",
            session.phase()
        );
    }

    let monitor = PhaseMonitor::attach(session, show_progress);
    let report = session.start_deep_search().await;
    monitor.finish(&session.snapshot());
    Ok(report?)
}

/// One summary line per phase
pub fn summarize(report: &PhaseReport) -> String {
    let metrics = &report.metrics;
    let mut line = format!(
        "{} of {} resolved ({:.0}%), {} with issues, average {:.2}s per entity",
        metrics.resolved,
        metrics.total,
        metrics.success_rate() * 100.0,
        metrics.failed,
        metrics.average_processing_secs
    );
    if report.canceled {
        line.push_str(" (stopped early)");
    }
    if report.phase == Phase::DeepSearchPending {
        line.push_str("; deep search available");
    }
    info!(phase = %report.phase, "{line}");
    line
}
