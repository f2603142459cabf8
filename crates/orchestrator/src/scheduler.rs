//! Windowed batch scheduler with cooperative cancellation

use crate::aggregator::{merge, ResultSet};
use crate::config::BatchSettings;
use crate::task::resolve_entity_task;
use crate::types::WindowProgress;
use bioresolve_core::{EntityName, ResolutionContext};
use bioresolve_gateway::ResolutionGateway;
use futures::future::join_all;
use std::ops::Range;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Split `len` items into consecutive windows of at most `limit` items
pub fn partition_windows(len: usize, limit: usize) -> Vec<Range<usize>> {
    let limit = limit.max(1);
    (0..len)
        .step_by(limit)
        .map(|start| start..(start + limit).min(len))
        .collect()
}

/// How a batch run ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub window_count: usize,
    pub windows_completed: usize,
    /// Entities whose window completed
    pub processed: usize,
    /// The token was cancelled before the run ended
    pub canceled: bool,
    /// Deep-search outcomes that had no row to replace
    pub unmatched: usize,
}

/// Runs entity lists through the gateway one window at a time
pub struct BatchScheduler {
    gateway: Arc<dyn ResolutionGateway>,
    settings: BatchSettings,
}

impl BatchScheduler {
    pub fn new(gateway: Arc<dyn ResolutionGateway>, settings: BatchSettings) -> Self {
        Self { gateway, settings }
    }

    pub fn gateway(&self) -> &Arc<dyn ResolutionGateway> {
        &self.gateway
    }

    /// Resolve `entities` and merge the outcomes into `results`.
    ///
    /// Each window's tasks run concurrently on the calling task; the next
    /// window starts only after the previous one is merged and
    /// `on_window` has been called. Cancellation is checked before every
    /// window and interrupts the inter-window delay, but never aborts calls
    /// already in flight.
    pub async fn run_batch<F>(
        &self,
        entities: &[EntityName],
        context: &ResolutionContext,
        is_deep_search: bool,
        results: &mut ResultSet,
        cancel: &CancellationToken,
        mut on_window: F,
    ) -> BatchSummary
    where
        F: FnMut(&WindowProgress, &ResultSet),
    {
        let limit = self.settings.concurrency_limit();
        let windows = partition_windows(entities.len(), limit);
        let context = context.for_phase(is_deep_search);
        let total = entities.len();

        let mut summary = BatchSummary {
            window_count: windows.len(),
            ..Default::default()
        };

        info!(
            total,
            windows = windows.len(),
            concurrency_limit = limit,
            deep_search = is_deep_search,
            "Starting batch"
        );

        for (index, window) in windows.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(
                    window = index + 1,
                    "Batch canceled before window, skipping remaining"
                );
                break;
            }

            debug!(window = index + 1, size = window.len(), "Launching window");
            let tasks = entities[window.clone()].iter().map(|entity| {
                resolve_entity_task(
                    self.gateway.as_ref(),
                    entity.clone(),
                    &context,
                    self.settings.task_timeout(),
                )
            });
            // join_all yields outcomes in launch order regardless of completion order
            let outcomes = join_all(tasks).await;

            let report = merge(results, outcomes, is_deep_search);
            debug!(
                window = index + 1,
                appended = report.appended,
                replaced = report.replaced,
                "Window merged"
            );
            summary.unmatched += report.unmatched;
            summary.windows_completed += 1;
            summary.processed = total.min((index + 1) * limit);

            on_window(
                &WindowProgress {
                    window_index: index,
                    window_count: windows.len(),
                    completed: summary.processed,
                    total,
                },
                results,
            );

            let is_last = index + 1 == windows.len();
            if !is_last && !self.settings.inter_window_delay().is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(self.settings.inter_window_delay()) => {}
                    _ = cancel.cancelled() => {}
                }
            }
        }

        summary.canceled = cancel.is_cancelled();
        info!(
            processed = summary.processed,
            windows_completed = summary.windows_completed,
            canceled = summary.canceled,
            "Batch finished"
        );
        summary
    }
}
