//! Rotation-vector sampling: turns pushed sensor samples into pitch/tilt/azimuth
//! readings and keeps a bounded history of each.

pub mod buffer;
pub mod orientation;
pub mod sampler;
pub mod source;
pub mod types;

pub use buffer::RollingBuffer;
pub use orientation::{Axis, AxisRemap, Orientation, RemapError};
pub use sampler::{
    AngleSampler, AngleSource, AngleState, SamplerError, SamplerState, DEFAULT_HISTORY_CAPACITY,
};
pub use source::{SampleListener, SensorSource, SimulatedSource, SourceError, MAX_RATE_HZ};
pub use types::{AngleKind, AngleReading, AngleSample, SampleError, SensorAccuracy};
