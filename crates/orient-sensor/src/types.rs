use glam::{Quat, Vec3};
use thiserror::Error;

/// Accuracy reported by the rotation sensor alongside its samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorAccuracy {
    /// Sensor is not in contact with what it measures.
    NoContact,
    /// Values cannot be trusted; calibration is needed.
    #[default]
    Unreliable,
    Low,
    Medium,
    High,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SampleError {
    #[error("Rotation vector must have 3 or 4 components, got {0}")]
    ComponentCount(usize),
}

/// Raw rotation vector as delivered by the sensor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleSample {
    /// Vector part of the rotation (axis * sin(θ/2)).
    pub vector: Vec3,
    /// Scalar part cos(θ/2). Derived from `vector` when the sensor omits it.
    pub scalar: Option<f32>,
    pub accuracy: SensorAccuracy,
}

impl AngleSample {
    pub fn new(vector: Vec3, scalar: Option<f32>, accuracy: SensorAccuracy) -> Self {
        Self {
            vector,
            scalar,
            accuracy,
        }
    }

    /// Build a sample from raw sensor components `[x, y, z]` or `[x, y, z, w]`.
    pub fn from_components(values: &[f32], accuracy: SensorAccuracy) -> Result<Self, SampleError> {
        match *values {
            [x, y, z] => Ok(Self::new(Vec3::new(x, y, z), None, accuracy)),
            [x, y, z, w] => Ok(Self::new(Vec3::new(x, y, z), Some(w), accuracy)),
            _ => Err(SampleError::ComponentCount(values.len())),
        }
    }

    pub fn from_quat(q: Quat, accuracy: SensorAccuracy) -> Self {
        Self::new(Vec3::new(q.x, q.y, q.z), Some(q.w), accuracy)
    }
}

/// The three angles tracked by the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AngleKind {
    Pitch,
    Tilt,
    Azimuth,
}

impl AngleKind {
    pub const ALL: [AngleKind; 3] = [AngleKind::Pitch, AngleKind::Tilt, AngleKind::Azimuth];

    pub fn name(self) -> &'static str {
        match self {
            AngleKind::Pitch => "pitch",
            AngleKind::Tilt => "tilt",
            AngleKind::Azimuth => "azimuth",
        }
    }
}

/// A single angle value in degrees.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct AngleReading {
    pub degrees: f64,
}

impl AngleReading {
    pub const ZERO: AngleReading = AngleReading { degrees: 0.0 };

    pub const fn new(degrees: f64) -> Self {
        Self { degrees }
    }

    pub fn from_radians(radians: f64) -> Self {
        Self {
            degrees: radians.to_degrees(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_accept_three_or_four() {
        let three = AngleSample::from_components(&[0.1, 0.2, 0.3], SensorAccuracy::High).unwrap();
        assert_eq!(three.scalar, None);

        let four =
            AngleSample::from_components(&[0.1, 0.2, 0.3, 0.9], SensorAccuracy::Low).unwrap();
        assert_eq!(four.scalar, Some(0.9));
        assert_eq!(four.accuracy, SensorAccuracy::Low);
    }

    #[test]
    fn components_reject_other_lengths() {
        assert_eq!(
            AngleSample::from_components(&[1.0, 0.0], SensorAccuracy::High),
            Err(SampleError::ComponentCount(2))
        );
        assert_eq!(
            AngleSample::from_components(&[0.0; 5], SensorAccuracy::High),
            Err(SampleError::ComponentCount(5))
        );
    }

    #[test]
    fn reading_from_radians() {
        let r = AngleReading::from_radians(std::f64::consts::FRAC_PI_2);
        assert!((r.degrees - 90.0).abs() < 1e-9);
    }
}
