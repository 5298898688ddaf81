use crate::types::{AngleSample, SensorAccuracy};
use glam::{EulerRot, Quat};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Receives samples pushed by a [`SensorSource`].
pub trait SampleListener: Send + Sync {
    fn on_sample(&self, sample: AngleSample);

    fn on_accuracy_changed(&self, _accuracy: SensorAccuracy) {}
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("Rotation sensor unavailable")]
    Unavailable,
    #[error("Sensor source already has a registered listener")]
    AlreadyRegistered,
    #[error("No async runtime available to drive the sensor feed")]
    NoRuntime,
}

/// Push-style rotation sensor feed.
pub trait SensorSource: Send {
    /// Start delivering samples to `listener`.
    fn register(&mut self, listener: Arc<dyn SampleListener>) -> Result<(), SourceError>;

    /// Stop delivering samples. Idempotent.
    fn unregister(&mut self);
}

/// Fastest delivery rate the simulated feed will run at.
pub const MAX_RATE_HZ: u32 = 1_000_000;

struct Feed {
    stop_tx: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

/// Stand-in rotation sensor for running without hardware.
///
/// Sweeps azimuth through a full turn every 20 seconds while pitch and tilt
/// wobble gently, delivered at a fixed rate on a tokio task.
pub struct SimulatedSource {
    rate_hz: u32,
    available: bool,
    feed: Option<Feed>,
}

impl SimulatedSource {
    pub fn new(rate_hz: u32) -> Self {
        Self {
            rate_hz: rate_hz.clamp(1, MAX_RATE_HZ),
            available: true,
            feed: None,
        }
    }

    /// A source whose sensor is missing; registration always fails.
    pub fn unavailable() -> Self {
        Self {
            rate_hz: 1,
            available: false,
            feed: None,
        }
    }

    pub fn is_registered(&self) -> bool {
        self.feed.is_some()
    }
}

impl SensorSource for SimulatedSource {
    fn register(&mut self, listener: Arc<dyn SampleListener>) -> Result<(), SourceError> {
        if !self.available {
            return Err(SourceError::Unavailable);
        }
        if self.feed.is_some() {
            return Err(SourceError::AlreadyRegistered);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SourceError::NoRuntime)?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = runtime.spawn(simulated_feed(listener, self.rate_hz, stop_rx));
        self.feed = Some(Feed { stop_tx, task });
        info!(rate_hz = self.rate_hz, "Simulated rotation sensor registered");
        Ok(())
    }

    fn unregister(&mut self) {
        if let Some(feed) = self.feed.take() {
            let _ = feed.stop_tx.send(true);
            feed.task.abort();
            info!("Simulated rotation sensor unregistered");
        }
    }
}

impl Drop for SimulatedSource {
    fn drop(&mut self) {
        self.unregister();
    }
}

async fn simulated_feed(
    listener: Arc<dyn SampleListener>,
    rate_hz: u32,
    mut stop_rx: watch::Receiver<bool>,
) {
    let period = sample_period(rate_hz);
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    listener.on_accuracy_changed(SensorAccuracy::High);

    let mut step: u64 = 0;
    loop {
        tokio::select! {
            biased;
            _ = stop_rx.changed() => break,
            _ = interval.tick() => {
                let t = step as f32 * period.as_secs_f32();
                listener.on_sample(simulated_sample(t));
                step += 1;
            }
        }
    }
    debug!(samples = step, "Simulated feed finished");
}

/// Delivery period for `rate_hz`, never shorter than one tick at [`MAX_RATE_HZ`].
fn sample_period(rate_hz: u32) -> Duration {
    Duration::from_nanos(1_000_000_000 / u64::from(rate_hz.clamp(1, MAX_RATE_HZ)))
}

fn simulated_sample(t: f32) -> AngleSample {
    use std::f32::consts::TAU;

    let yaw = -(t / 20.0 * TAU) % TAU;
    let pitch = 0.35 * (t * 0.5).sin();
    let roll = 0.25 * (t * 0.8).cos();
    let q = Quat::from_euler(EulerRot::ZXY, yaw, pitch, roll);
    AngleSample::from_quat(q, SensorAccuracy::High)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::{AngleSampler, AngleSource};

    #[test]
    fn unavailable_source_refuses_registration() {
        let mut source = SimulatedSource::unavailable();
        let sampler = Arc::new(AngleSampler::default());
        assert_eq!(sampler.start(&mut source), Err(SourceError::Unavailable));
        assert!(!source.is_registered());
    }

    #[test]
    fn registration_requires_runtime() {
        let mut source = SimulatedSource::new(100);
        let sampler = Arc::new(AngleSampler::default());
        assert_eq!(sampler.start(&mut source), Err(SourceError::NoRuntime));
    }

    #[test]
    fn simulated_samples_are_unit_rotations() {
        for i in 0..50 {
            let sample = simulated_sample(i as f32 * 0.37);
            let w = sample.scalar.unwrap();
            let norm = sample.vector.length_squared() + w * w;
            assert!((norm - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn sample_period_is_never_zero() {
        assert_eq!(sample_period(100), Duration::from_millis(10));
        assert_eq!(sample_period(0), Duration::from_secs(1));
        assert_eq!(sample_period(u32::MAX), Duration::from_micros(1));
    }

    #[tokio::test(start_paused = true)]
    async fn extreme_rate_still_delivers() {
        let mut source = SimulatedSource::new(u32::MAX);
        let sampler = Arc::new(AngleSampler::default());
        sampler.start(&mut source).unwrap();

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        let feed = source.feed.as_ref().unwrap();
        assert!(!feed.task.is_finished());
        assert!(sampler.snapshot_state().unwrap().sample_count > 0);
        sampler.stop(&mut source);
    }

    #[tokio::test(start_paused = true)]
    async fn feed_delivers_until_stopped() {
        let mut source = SimulatedSource::new(100);
        let sampler = Arc::new(AngleSampler::default());
        sampler.start(&mut source).unwrap();
        assert!(source.is_registered());
        assert_eq!(
            sampler.start(&mut source),
            Err(SourceError::AlreadyRegistered)
        );

        tokio::time::sleep(Duration::from_millis(95)).await;
        let delivered = sampler.snapshot_state().unwrap();
        assert!(delivered.sample_count > 0);
        assert_eq!(delivered.accuracy, SensorAccuracy::High);

        sampler.stop(&mut source);
        sampler.stop(&mut source);
        assert!(sampler.is_stopped());
        assert!(!source.is_registered());

        let after_stop = sampler.snapshot_state().unwrap().sample_count;
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(sampler.snapshot_state().unwrap().sample_count, after_stop);
    }
}
