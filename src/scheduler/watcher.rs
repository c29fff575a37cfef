//! Debounced filesystem watch
//!
//! Raw change events restart a quiet-period timer; a trigger fires only once
//! the timer elapses without further events. A single `port install` touches
//! many registry files, and all of them end up as one trigger.

use std::path::Path;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher, recommended_watcher};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{info, warn};

use crate::scheduler::engine::Trigger;

/// Trailing-edge debounce state
#[derive(Debug)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            deadline: None,
        }
    }

    /// Register a raw event, pushing the deadline out
    pub fn bump(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Consume the pending deadline once it has elapsed
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Turn raw change notifications into debounced [`Trigger::FileChange`] triggers
pub async fn debounce_events(
    mut raw_rx: mpsc::UnboundedReceiver<()>,
    quiet: Duration,
    trigger_tx: mpsc::UnboundedSender<Trigger>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut debouncer = Debouncer::new(quiet);

    loop {
        let deadline = debouncer.deadline();
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            event = raw_rx.recv() => {
                let Some(()) = event else { break };
                debouncer.bump(Instant::now());
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if !debouncer.fire(Instant::now()) {
                    continue;
                }
                info!("Filesystem settled for {:?}, requesting reconciliation", quiet);
                if trigger_tx.send(Trigger::FileChange).is_err() {
                    break;
                }
            }
        }
    }
}

/// Start watching `dir` recursively
///
/// The returned task owns the watcher and runs until shutdown.
pub fn spawn_watcher(
    dir: &Path,
    quiet: Duration,
    trigger_tx: mpsc::UnboundedSender<Trigger>,
    shutdown_rx: broadcast::Receiver<()>,
) -> Result<JoinHandle<()>, notify::Error> {
    let (raw_tx, raw_rx) = mpsc::unbounded_channel::<()>();
    let mut watcher: RecommendedWatcher =
        recommended_watcher(move |event: notify::Result<Event>| match event {
            Ok(event) if is_relevant_event_kind(&event.kind) => {
                let _ = raw_tx.send(());
            }
            Ok(_) => {}
            Err(e) => warn!("Watcher event error: {}", e),
        })?;
    watcher.watch(dir, RecursiveMode::Recursive)?;
    info!("Watching package registry at {:?}", dir);

    Ok(tokio::spawn(async move {
        let _watcher = watcher;
        debounce_events(raw_rx, quiet, trigger_tx, shutdown_rx).await;
    }))
}

fn is_relevant_event_kind(kind: &EventKind) -> bool {
    !matches!(kind, EventKind::Access(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};

    struct Harness {
        raw_tx: mpsc::UnboundedSender<()>,
        trigger_rx: mpsc::UnboundedReceiver<Trigger>,
        shutdown_tx: broadcast::Sender<()>,
        task: JoinHandle<()>,
    }

    fn start(quiet: Duration) -> Harness {
        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(debounce_events(raw_rx, quiet, trigger_tx, shutdown_rx));
        Harness {
            raw_tx,
            trigger_rx,
            shutdown_tx,
            task,
        }
    }

    #[test]
    fn debouncer_fires_only_after_deadline() {
        let now = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_secs(30));

        assert!(!debouncer.fire(now));
        debouncer.bump(now);
        assert!(!debouncer.fire(now + Duration::from_secs(29)));
        assert!(debouncer.fire(now + Duration::from_secs(30)));
        assert!(!debouncer.fire(now + Duration::from_secs(31)));
    }

    #[test]
    fn debouncer_bump_pushes_deadline_out() {
        let now = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_secs(30));

        debouncer.bump(now);
        debouncer.bump(now + Duration::from_secs(20));

        assert_eq!(debouncer.deadline(), Some(now + Duration::from_secs(50)));
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_events_yields_single_trigger_after_quiet_period() {
        let mut harness = start(Duration::from_secs(30));

        for _ in 0..3 {
            harness.raw_tx.send(()).unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        }
        // last event at t=20s, quiet until t=50s
        tokio::time::sleep(Duration::from_secs(19)).await;
        assert!(harness.trigger_rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(harness.trigger_rx.try_recv().unwrap(), Trigger::FileChange);
        assert!(harness.trigger_rx.try_recv().is_err());

        let _ = harness.shutdown_tx.send(());
        harness.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn separated_bursts_yield_separate_triggers() {
        let mut harness = start(Duration::from_secs(30));

        harness.raw_tx.send(()).unwrap();
        tokio::time::sleep(Duration::from_secs(31)).await;
        harness.raw_tx.send(()).unwrap();
        tokio::time::sleep(Duration::from_secs(31)).await;

        assert_eq!(harness.trigger_rx.try_recv().unwrap(), Trigger::FileChange);
        assert_eq!(harness.trigger_rx.try_recv().unwrap(), Trigger::FileChange);
        assert!(harness.trigger_rx.try_recv().is_err());

        let _ = harness.shutdown_tx.send(());
        harness.task.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn no_events_means_no_trigger() {
        let mut harness = start(Duration::from_secs(30));

        tokio::time::sleep(Duration::from_secs(3600)).await;

        assert!(harness.trigger_rx.try_recv().is_err());
        let _ = harness.shutdown_tx.send(());
        harness.task.await.unwrap();
    }

    #[test]
    fn access_events_are_ignored() {
        assert!(!is_relevant_event_kind(&EventKind::Access(AccessKind::Any)));
        assert!(is_relevant_event_kind(&EventKind::Create(CreateKind::File)));
        assert!(is_relevant_event_kind(&EventKind::Modify(ModifyKind::Any)));
        assert!(is_relevant_event_kind(&EventKind::Any));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn spawn_watcher_triggers_on_file_change() {
        let dir = tempfile::tempdir().unwrap();
        let (trigger_tx, mut trigger_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let task = spawn_watcher(
            dir.path(),
            Duration::from_millis(50),
            trigger_tx,
            shutdown_rx,
        )
        .unwrap();
        std::fs::write(dir.path().join("registry.db"), b"changed").unwrap();

        let trigger = tokio::time::timeout(Duration::from_secs(5), trigger_rx.recv())
            .await
            .expect("watcher did not trigger");
        assert_eq!(trigger, Some(Trigger::FileChange));

        let _ = shutdown_tx.send(());
        task.await.unwrap();
    }
}
