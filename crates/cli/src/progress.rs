//! Terminal progress rendering and Ctrl-C handling for a session

use bioresolve_orchestrator::{Orchestrator, Phase, SessionSnapshot};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, warn};

/// Create a progress bar for resolution phases
pub fn create_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .map_err(|e| error!("Failed to set progress bar style: {}", e))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-"),
    );
    pb
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::RunningInitial => "resolving",
        Phase::RunningDeepSearch => "deep search",
        Phase::DeepSearchPending => "deep search pending",
        Phase::Complete => "complete",
        Phase::Idle => "idle",
    }
}

fn render(pb: &ProgressBar, snapshot: &SessionSnapshot) {
    pb.set_length(snapshot.total_for_progress as u64);
    pb.set_position(snapshot.progress as u64);
    pb.set_message(phase_label(snapshot.phase));
}

/// Renders every snapshot a session publishes while one of its phases runs
pub struct PhaseMonitor {
    pb: ProgressBar,
    renderer: JoinHandle<()>,
}

impl PhaseMonitor {
    pub fn attach(session: &Orchestrator, show_progress: bool) -> Self {
        let pb = if show_progress {
            create_progress_bar(0)
        } else {
            ProgressBar::hidden()
        };

        let mut updates: watch::Receiver<SessionSnapshot> = session.subscribe();
        let render_pb = pb.clone();
        let renderer = tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let snapshot = updates.borrow_and_update().clone();
                render(&render_pb, &snapshot);
            }
        });

        Self { pb, renderer }
    }

    /// Stop rendering and release the terminal line
    pub fn finish(self, final_snapshot: &SessionSnapshot) {
        self.renderer.abort();
        render(&self.pb, final_snapshot);
        self.pb.finish_and_clear();
    }
}

/// What a Ctrl-C press does given the session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Let the in-flight window finish, then stop the phase
    StopAfterWindow,
    /// Exit immediately with status 130
    Exit,
}

pub fn interrupt_action(phase: Phase, already_stopped: bool) -> InterruptAction {
    if phase.is_running() && !already_stopped {
        InterruptAction::StopAfterWindow
    } else {
        InterruptAction::Exit
    }
}

/// Handle Ctrl-C for the rest of the process.
///
/// The first press during a running phase requests a stop. A press while no
/// phase is running, or a second press, exits. Install once per process:
/// a listener keeps SIGINT captured until the process ends.
pub fn forward_interrupts(session: &Orchestrator) {
    let stop = session.stop_handle();
    let updates = session.subscribe();
    tokio::spawn(async move {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Error setting up signal handler: {e}");
                return;
            }
            let phase = updates.borrow().phase;
            match interrupt_action(phase, stop.is_stopped()) {
                InterruptAction::StopAfterWindow => {
                    warn!("Received Ctrl+C, stopping after the current window (press again to exit)");
                    stop.stop();
                }
                InterruptAction::Exit => {
                    warn!("Interrupted");
                    std::process::exit(130);
                }
            }
        }
    });
}
