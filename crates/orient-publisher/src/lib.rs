//! Fixed-cadence snapshot publishing for the angle sampler.
//!
//! [`SnapshotPublisher::tick`] copies the sampler state, tints each angle and
//! replaces the latest [`Snapshot`]. Subscribers observe the most recent value
//! only; a late subscriber never sees earlier snapshots.

pub mod color;
pub mod snapshot;

pub use color::{colorize, normalize, DisplayColor, Palette, MAX_ANGLE, MIN_ANGLE};
pub use snapshot::{AngleSnapshot, Snapshot};

use orient_sensor::{AngleSource, SamplerState};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Publish period used unless configured otherwise.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(100);

/// Reads the sampler on demand and republishes it as a [`Snapshot`].
pub struct SnapshotPublisher {
    source: Arc<dyn AngleSource>,
    palette: Palette,
    snapshot_tx: watch::Sender<Snapshot>,
}

impl SnapshotPublisher {
    pub fn new(source: Arc<dyn AngleSource>, palette: Palette) -> Self {
        let initial = Snapshot::empty(&palette, 0, SystemTime::now());
        let (snapshot_tx, _) = watch::channel(initial);
        Self {
            source,
            palette,
            snapshot_tx,
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Publish one snapshot of the current sampler state.
    ///
    /// Never fails: if the sampler cannot be read, a zeroed snapshot goes out
    /// in its place so subscribers keep their cadence.
    pub fn tick(&self) -> Snapshot {
        let state = match self.source.snapshot_state() {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Sampler unreadable, publishing default snapshot");
                SamplerState::default()
            }
        };

        let now = SystemTime::now();
        let mut published = None;
        self.snapshot_tx.send_modify(|current| {
            let sequence = current.sequence + 1;
            *current = Snapshot::from_state(state, &self.palette, sequence, now);
            published = Some(current.clone());
        });

        published.unwrap_or_else(|| self.latest())
    }

    /// Subscribe to snapshots. The subscription starts at the latest one.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            snapshot_rx: self.snapshot_tx.subscribe(),
        }
    }

    /// Most recently published snapshot.
    pub fn latest(&self) -> Snapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Number of snapshots published so far.
    pub fn published(&self) -> u64 {
        self.snapshot_tx.borrow().sequence
    }

    pub fn subscriber_count(&self) -> usize {
        self.snapshot_tx.receiver_count()
    }

    /// Start ticking every `period` on the current tokio runtime.
    pub fn spawn(self: &Arc<Self>, period: Duration) -> PublisherHandle {
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(publish_loop(self.clone(), period, stop_rx));
        info!(period_ms = period.as_millis() as u64, "Snapshot publisher started");
        PublisherHandle { stop_tx, task }
    }
}

/// A subscriber's view of the published snapshots.
pub struct Subscription {
    snapshot_rx: watch::Receiver<Snapshot>,
}

impl Subscription {
    /// Latest snapshot, without marking it as seen.
    pub fn latest(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Wait for a snapshot newer than the last one seen. Returns `None` once
    /// the publisher is gone.
    pub async fn changed(&mut self) -> Option<Snapshot> {
        self.snapshot_rx.changed().await.ok()?;
        Some(self.snapshot_rx.borrow_and_update().clone())
    }

    /// Whether a snapshot newer than the last one seen is waiting.
    pub fn has_changed(&self) -> bool {
        self.snapshot_rx.has_changed().unwrap_or(false)
    }

    pub fn unsubscribe(self) {}
}

/// Controls a running publish loop.
pub struct PublisherHandle {
    stop_tx: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl PublisherHandle {
    /// Ask the loop to stop before its next tick. Idempotent.
    pub fn shutdown(&self) {
        self.stop_tx.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Shut down and wait for any in-flight tick to complete.
    pub async fn stop(self) {
        self.shutdown();
        if let Err(e) = self.task.await {
            warn!(?e, "Snapshot publisher task ended abnormally");
        }
    }
}

async fn publish_loop(
    publisher: Arc<SnapshotPublisher>,
    period: Duration,
    mut stop_rx: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            _ = ticker.tick() => {
                // tick() is synchronous, so a shutdown can only land between ticks.
                let snapshot = publisher.tick();
                if snapshot.sequence % 100 == 0 {
                    debug!(
                        sequence = snapshot.sequence,
                        sample_count = snapshot.sample_count,
                        "Snapshot heartbeat"
                    );
                }
            }
        }
    }

    info!(published = publisher.published(), "Snapshot publisher stopped");
}
