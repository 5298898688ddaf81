use crate::buffer::RollingBuffer;
use crate::orientation::{orientation_from_matrix, rotation_matrix_from_vector, AxisRemap};
use crate::source::{SampleListener, SensorSource, SourceError};
use crate::types::{AngleKind, AngleReading, AngleSample, SensorAccuracy};
use std::sync::{Arc, RwLock, RwLockWriteGuard};
use thiserror::Error;
use tracing::{debug, info, warn};

/// History length kept per angle unless configured otherwise.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SamplerError {
    #[error("Sampler state is poisoned by a panicked writer")]
    Poisoned,
}

/// Point-in-time copy of one angle: its latest reading and history, oldest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AngleState {
    pub reading: AngleReading,
    pub history: Vec<AngleReading>,
}

/// Point-in-time copy of everything the sampler tracks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SamplerState {
    pub pitch: AngleState,
    pub tilt: AngleState,
    pub azimuth: AngleState,
    /// Most recent accuracy reported by the sensor.
    pub accuracy: SensorAccuracy,
    /// Samples ingested since the sampler was created.
    pub sample_count: u64,
}

impl SamplerState {
    pub fn angle(&self, kind: AngleKind) -> &AngleState {
        match kind {
            AngleKind::Pitch => &self.pitch,
            AngleKind::Tilt => &self.tilt,
            AngleKind::Azimuth => &self.azimuth,
        }
    }
}

/// Read side of the sampler as seen by snapshot consumers.
pub trait AngleSource: Send + Sync {
    fn snapshot_state(&self) -> Result<SamplerState, SamplerError>;
}

struct AngleTrack {
    current: AngleReading,
    history: RollingBuffer<AngleReading>,
}

impl AngleTrack {
    fn new(capacity: usize) -> Self {
        Self {
            current: AngleReading::ZERO,
            history: RollingBuffer::new(capacity),
        }
    }

    fn record(&mut self, reading: AngleReading) {
        self.current = reading;
        self.history.push(reading);
    }

    fn copy(&self) -> AngleState {
        AngleState {
            reading: self.current,
            history: self.history.to_vec(),
        }
    }
}

struct Tracks {
    pitch: AngleTrack,
    tilt: AngleTrack,
    azimuth: AngleTrack,
    accuracy: SensorAccuracy,
    sample_count: u64,
    stopped: bool,
}

/// Converts rotation-vector samples into pitch, tilt and azimuth readings and
/// keeps a fixed-capacity history of each.
///
/// Writers hold the lock for a single ingest; readers copy state under a
/// shared lock. After [`AngleSampler::stop`] returns no further samples are
/// applied until the sampler is started again.
pub struct AngleSampler {
    remap: AxisRemap,
    capacity: usize,
    tracks: RwLock<Tracks>,
}

impl AngleSampler {
    pub fn new(capacity: usize, remap: AxisRemap) -> Self {
        let capacity = capacity.max(1);
        Self {
            remap,
            capacity,
            tracks: RwLock::new(Tracks {
                pitch: AngleTrack::new(capacity),
                tilt: AngleTrack::new(capacity),
                azimuth: AngleTrack::new(capacity),
                accuracy: SensorAccuracy::default(),
                sample_count: 0,
                stopped: false,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Apply one rotation-vector sample.
    ///
    /// Degenerate vectors are not rejected; they decompose to whatever angles
    /// the matrix yields.
    pub fn ingest(&self, sample: AngleSample) {
        let matrix = self.remap.apply(&rotation_matrix_from_vector(&sample));
        let orientation = orientation_from_matrix(&matrix);

        let mut tracks = self.write();
        if tracks.stopped {
            return;
        }
        // Readings take the conventional angle names, not getOrientation's index order.
        tracks.pitch.record(AngleReading::from_radians(orientation.pitch));
        tracks.tilt.record(AngleReading::from_radians(orientation.roll));
        tracks.azimuth.record(AngleReading::from_radians(orientation.azimuth));
        tracks.accuracy = sample.accuracy;
        tracks.sample_count += 1;

        if tracks.sample_count % 1000 == 0 {
            debug!(sample_count = tracks.sample_count, "Angle samples ingested");
        }
    }

    /// Record an accuracy change reported outside of a sample.
    pub fn set_accuracy(&self, accuracy: SensorAccuracy) {
        let mut tracks = self.write();
        if tracks.stopped || tracks.accuracy == accuracy {
            return;
        }
        tracks.accuracy = accuracy;
        info!(?accuracy, "Rotation sensor accuracy changed");
    }

    /// Register with `source` and begin accepting samples.
    pub fn start(self: &Arc<Self>, source: &mut dyn SensorSource) -> Result<(), SourceError> {
        self.write().stopped = false;
        source.register(self.clone())?;
        info!(capacity = self.capacity, "Angle sampler started");
        Ok(())
    }

    /// Unregister from `source` and stop applying samples. Safe to call repeatedly.
    pub fn stop(&self, source: &mut dyn SensorSource) {
        source.unregister();
        let mut tracks = self.write();
        if !tracks.stopped {
            tracks.stopped = true;
            info!(sample_count = tracks.sample_count, "Angle sampler stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        match self.tracks.read() {
            Ok(tracks) => tracks.stopped,
            Err(poisoned) => poisoned.into_inner().stopped,
        }
    }

    /// Every write fully overwrites the current readings, so a poisoned lock is
    /// recovered and cleared by the next writer.
    fn write(&self) -> RwLockWriteGuard<'_, Tracks> {
        match self.tracks.write() {
            Ok(tracks) => tracks,
            Err(poisoned) => {
                warn!("Recovering sampler state after a panicked writer");
                self.tracks.clear_poison();
                poisoned.into_inner()
            }
        }
    }
}

impl Default for AngleSampler {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY, AxisRemap::IDENTITY)
    }
}

impl AngleSource for AngleSampler {
    fn snapshot_state(&self) -> Result<SamplerState, SamplerError> {
        let tracks = self.tracks.read().map_err(|_| SamplerError::Poisoned)?;
        Ok(SamplerState {
            pitch: tracks.pitch.copy(),
            tilt: tracks.tilt.copy(),
            azimuth: tracks.azimuth.copy(),
            accuracy: tracks.accuracy,
            sample_count: tracks.sample_count,
        })
    }
}

impl SampleListener for AngleSampler {
    fn on_sample(&self, sample: AngleSample) {
        self.ingest(sample);
    }

    fn on_accuracy_changed(&self, accuracy: SensorAccuracy) {
        self.set_accuracy(accuracy);
    }
}
