//! Reconciliation scheduler
//!
//! Owns the run lifecycle. Triggers come from startup, a fixed interval,
//! the debounced filesystem watch and manual reloads; all of them go through
//! one driver task so at most one run is in flight.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::ScheduleConfig;
use crate::scheduler::gate::{Admission, RunGate};
use crate::scheduler::pipeline::{Pipeline, RunMode};
use crate::scheduler::snapshot::{ReconciliationResult, StatusView};
use crate::scheduler::watcher::spawn_watcher;
use crate::version::error::ReconcileError;

/// Why a run was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    Timer,
    FileChange,
    Manual,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Startup => "startup",
            Trigger::Timer => "timer",
            Trigger::FileChange => "file change",
            Trigger::Manual => "manual",
        }
    }

    /// Only the startup run publishes the inventory ahead of remote data
    pub fn mode(&self) -> RunMode {
        match self {
            Trigger::Startup => RunMode::Partial,
            _ => RunMode::Full,
        }
    }
}

/// Scheduling parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerOptions {
    pub refresh_interval: Duration,
    pub debounce: Duration,
    /// Directory to watch; `None` disables the filesystem trigger
    pub watch_dir: Option<PathBuf>,
}

impl SchedulerOptions {
    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self {
            refresh_interval: config.refresh_interval(),
            debounce: config.debounce(),
            watch_dir: config.watch.then(|| config.watch_dir.clone()),
        }
    }
}

type RunFuture = BoxFuture<'static, Result<Arc<ReconciliationResult>, ReconcileError>>;

/// Running scheduler; dropping it or calling [`Scheduler::shutdown`] stops all tasks
pub struct Scheduler {
    trigger_tx: mpsc::UnboundedSender<Trigger>,
    shutdown_tx: broadcast::Sender<()>,
    view: StatusView,
    tasks: Vec<(&'static str, JoinHandle<()>)>,
}

impl Scheduler {
    /// Start the driver, timer and watcher tasks and request the startup run
    pub fn start(pipeline: Arc<Pipeline>, options: SchedulerOptions) -> Self {
        let view = pipeline.board().view();
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, _) = broadcast::channel(4);

        let _ = trigger_tx.send(Trigger::Startup);

        let mut tasks = Vec::new();
        tasks.push((
            "driver",
            tokio::spawn(drive(pipeline, trigger_rx, shutdown_tx.subscribe())),
        ));
        tasks.push((
            "timer",
            tokio::spawn(timer_task(
                options.refresh_interval,
                trigger_tx.clone(),
                shutdown_tx.subscribe(),
            )),
        ));

        if let Some(dir) = &options.watch_dir {
            if dir.is_dir() {
                match spawn_watcher(
                    dir,
                    options.debounce,
                    trigger_tx.clone(),
                    shutdown_tx.subscribe(),
                ) {
                    Ok(task) => tasks.push(("watcher", task)),
                    Err(e) => warn!("Failed to watch {:?}: {}", dir, e),
                }
            } else {
                warn!("Watch directory {:?} does not exist, file watch disabled", dir);
            }
        }

        Self {
            trigger_tx,
            shutdown_tx,
            view,
            tasks,
        }
    }

    /// Request a run; coalesced with any run already in progress
    pub fn reload(&self) {
        self.handle().reload();
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            trigger_tx: self.trigger_tx.clone(),
        }
    }

    pub fn view(&self) -> StatusView {
        self.view.clone()
    }

    /// Stop all tasks and wait for them; an in-flight run is dropped
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        for (name, task) in self.tasks {
            if let Err(e) = task.await {
                error!("Scheduler {} task failed: {}", name, e);
            }
        }
        info!("Scheduler stopped");
    }
}

/// Cloneable handle for requesting manual reloads
#[derive(Clone)]
pub struct SchedulerHandle {
    trigger_tx: mpsc::UnboundedSender<Trigger>,
}

impl SchedulerHandle {
    pub fn reload(&self) {
        if self.trigger_tx.send(Trigger::Manual).is_err() {
            debug!("Scheduler stopped, ignoring reload");
        }
    }
}

fn start_run(pipeline: &Arc<Pipeline>, mode: RunMode) -> RunFuture {
    let pipeline = pipeline.clone();
    Box::pin(async move { pipeline.run(mode).await })
}

async fn wait_for(run: &mut Option<RunFuture>) -> Result<Arc<ReconciliationResult>, ReconcileError> {
    match run {
        Some(run) => run.await,
        None => std::future::pending().await,
    }
}

/// Single driver: admits triggers through the gate and awaits the current run
async fn drive(
    pipeline: Arc<Pipeline>,
    mut trigger_rx: mpsc::UnboundedReceiver<Trigger>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let board = pipeline.board().clone();
    let mut gate = RunGate::new();
    let mut current: Option<RunFuture> = None;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            trigger = trigger_rx.recv() => {
                let Some(trigger) = trigger else { break };
                match gate.request() {
                    Admission::Start => {
                        info!("Starting reconciliation ({})", trigger.as_str());
                        board.set_loading(true);
                        current = Some(start_run(&pipeline, trigger.mode()));
                    }
                    Admission::Coalesced => {
                        debug!("Reconciliation in progress, coalescing {} trigger", trigger.as_str());
                    }
                }
            }
            outcome = wait_for(&mut current), if current.is_some() => {
                current = None;
                match outcome {
                    Ok(result) => info!(
                        "Reconciliation finished: {} packages",
                        result.records.len()
                    ),
                    Err(e) => error!("Reconciliation failed: {}", e),
                }
                if gate.finish() {
                    info!("Starting coalesced reconciliation");
                    current = Some(start_run(&pipeline, RunMode::Full));
                } else {
                    board.set_loading(false);
                }
            }
        }
    }

    board.set_loading(false);
}

async fn timer_task(
    period: Duration,
    trigger_tx: mpsc::UnboundedSender<Trigger>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut interval = tokio::time::interval(period.max(Duration::from_millis(1)));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    interval.tick().await; // consume the first immediate tick

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            _ = interval.tick() => {
                if trigger_tx.send(Trigger::Timer).is_err() {
                    break;
                }
            }
        }
    }
}
