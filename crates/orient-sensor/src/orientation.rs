use crate::types::AngleSample;
use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Signed coordinate axis used to describe a reference-frame remap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
    #[serde(rename = "-X")]
    MinusX,
    #[serde(rename = "-Y")]
    MinusY,
    #[serde(rename = "-Z")]
    MinusZ,
}

impl Axis {
    fn index(self) -> usize {
        match self {
            Axis::X | Axis::MinusX => 0,
            Axis::Y | Axis::MinusY => 1,
            Axis::Z | Axis::MinusZ => 2,
        }
    }

    fn is_negative(self) -> bool {
        matches!(self, Axis::MinusX | Axis::MinusY | Axis::MinusZ)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RemapError {
    #[error("Remap axes {x:?} and {y:?} share the same base axis")]
    SameBaseAxis { x: Axis, y: Axis },
}

/// Rotates a rotation matrix into a different reference frame by naming which
/// device axes the world X and Y axes map onto. Z follows as the remaining
/// axis, signed so the frame stays right-handed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisRemap {
    x: Axis,
    y: Axis,
}

impl AxisRemap {
    pub const IDENTITY: AxisRemap = AxisRemap {
        x: Axis::X,
        y: Axis::Y,
    };

    pub fn new(x: Axis, y: Axis) -> Result<Self, RemapError> {
        if x.index() == y.index() {
            return Err(RemapError::SameBaseAxis { x, y });
        }
        Ok(Self { x, y })
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn apply(&self, m: &DMat3) -> DMat3 {
        if self.is_identity() {
            return *m;
        }

        let xi = self.x.index();
        let yi = self.y.index();
        let zi = 3 - xi - yi;

        // (x, y, z) in cyclic order keeps handedness; otherwise Z flips.
        let cyclic = xi == (zi + 1) % 3 && yi == (zi + 2) % 3;
        let sx = self.x.is_negative();
        let sy = self.y.is_negative();
        let sz = sx ^ sy ^ !cyclic;

        let signed = |v: DVec3, negative: bool| if negative { -v } else { v };

        let mut cols = [DVec3::ZERO; 3];
        cols[xi] = signed(m.x_axis, sx);
        cols[yi] = signed(m.y_axis, sy);
        cols[zi] = signed(m.z_axis, sz);
        DMat3::from_cols(cols[0], cols[1], cols[2])
    }
}

impl Default for AxisRemap {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Orientation angles in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Orientation {
    /// Rotation about -Z; 0 when the device's Y axis points north.
    pub azimuth: f64,
    /// Rotation about X.
    pub pitch: f64,
    /// Rotation about Y.
    pub roll: f64,
}

/// Element at `row`, `col` of a column-major matrix.
fn at(m: &DMat3, row: usize, col: usize) -> f64 {
    m.col(col)[row]
}

/// Build the 3x3 rotation matrix for a rotation-vector sample.
///
/// The vector is not validated. A missing scalar part is reconstructed from the
/// vector assuming unit length, floored at zero, so an all-zero vector yields
/// the identity.
pub fn rotation_matrix_from_vector(sample: &AngleSample) -> DMat3 {
    let v = sample.vector.as_dvec3();
    let (q1, q2, q3) = (v.x, v.y, v.z);
    let q0 = match sample.scalar {
        Some(w) => w as f64,
        None => (1.0 - q1 * q1 - q2 * q2 - q3 * q3).max(0.0).sqrt(),
    };

    let sq_q1 = 2.0 * q1 * q1;
    let sq_q2 = 2.0 * q2 * q2;
    let sq_q3 = 2.0 * q3 * q3;
    let q1_q2 = 2.0 * q1 * q2;
    let q3_q0 = 2.0 * q3 * q0;
    let q1_q3 = 2.0 * q1 * q3;
    let q2_q0 = 2.0 * q2 * q0;
    let q2_q3 = 2.0 * q2 * q3;
    let q1_q0 = 2.0 * q1 * q0;

    let rows = [
        [1.0 - sq_q2 - sq_q3, q1_q2 - q3_q0, q1_q3 + q2_q0],
        [q1_q2 + q3_q0, 1.0 - sq_q1 - sq_q3, q2_q3 - q1_q0],
        [q1_q3 - q2_q0, q2_q3 + q1_q0, 1.0 - sq_q1 - sq_q2],
    ];
    DMat3::from_cols_array_2d(&rows).transpose()
}

/// Decompose a rotation matrix into azimuth, pitch and roll.
pub fn orientation_from_matrix(m: &DMat3) -> Orientation {
    Orientation {
        azimuth: at(m, 0, 1).atan2(at(m, 1, 1)),
        pitch: (-at(m, 2, 1)).clamp(-1.0, 1.0).asin(),
        roll: (-at(m, 2, 0)).atan2(at(m, 2, 2)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SensorAccuracy;
    use glam::{Quat, Vec3};

    const ALL_AXES: [Axis; 6] = [
        Axis::X,
        Axis::Y,
        Axis::Z,
        Axis::MinusX,
        Axis::MinusY,
        Axis::MinusZ,
    ];

    fn orientation_of(q: Quat) -> Orientation {
        let sample = AngleSample::from_quat(q, SensorAccuracy::High);
        orientation_from_matrix(&rotation_matrix_from_vector(&sample))
    }

    #[test]
    fn identity_quaternion_is_flat_north() {
        let o = orientation_of(Quat::IDENTITY);
        assert!(o.azimuth.abs() < 1e-9);
        assert!(o.pitch.abs() < 1e-9);
        assert!(o.roll.abs() < 1e-9);
    }

    #[test]
    fn zero_vector_is_identity() {
        let sample = AngleSample::new(Vec3::ZERO, None, SensorAccuracy::Unreliable);
        let m = rotation_matrix_from_vector(&sample);
        assert!(m.abs_diff_eq(DMat3::IDENTITY, 1e-12));
        assert_eq!(orientation_from_matrix(&m), Orientation::default());
    }

    #[test]
    fn scalar_part_is_reconstructed() {
        let q = Quat::from_rotation_x(0.4);
        let full = AngleSample::from_quat(q, SensorAccuracy::High);
        let partial = AngleSample::new(full.vector, None, SensorAccuracy::High);
        let a = rotation_matrix_from_vector(&full);
        let b = rotation_matrix_from_vector(&partial);
        assert!(a.abs_diff_eq(b, 1e-6));
    }

    #[test]
    fn single_axis_rotations() {
        let angle = 30.0_f32.to_radians();

        let yaw = orientation_of(Quat::from_rotation_z(angle));
        assert!((yaw.azimuth.to_degrees() + 30.0).abs() < 1e-3);
        assert!(yaw.pitch.abs() < 1e-6);

        let pitch = orientation_of(Quat::from_rotation_x(angle));
        assert!((pitch.pitch.to_degrees() + 30.0).abs() < 1e-3);
        assert!(pitch.roll.abs() < 1e-6);

        let roll = orientation_of(Quat::from_rotation_y(angle));
        assert!((roll.roll.to_degrees() - 30.0).abs() < 1e-3);
        assert!(roll.azimuth.abs() < 1e-6);
    }

    #[test]
    fn unnormalized_vector_does_not_produce_nan_pitch() {
        let sample = AngleSample::new(Vec3::new(3.0, 3.0, 3.0), Some(3.0), SensorAccuracy::Low);
        let o = orientation_from_matrix(&rotation_matrix_from_vector(&sample));
        assert!(o.pitch.is_finite());
    }

    #[test]
    fn remap_rejects_shared_base_axis() {
        assert_eq!(
            AxisRemap::new(Axis::X, Axis::MinusX),
            Err(RemapError::SameBaseAxis {
                x: Axis::X,
                y: Axis::MinusX
            })
        );
    }

    #[test]
    fn identity_remap_is_noop() {
        let m = rotation_matrix_from_vector(&AngleSample::from_quat(
            Quat::from_euler(glam::EulerRot::ZXY, 0.3, 0.2, 0.1),
            SensorAccuracy::High,
        ));
        assert_eq!(AxisRemap::IDENTITY.apply(&m), m);
    }

    #[test]
    fn every_valid_remap_stays_a_rotation() {
        let m = rotation_matrix_from_vector(&AngleSample::from_quat(
            Quat::from_euler(glam::EulerRot::ZXY, 1.1, -0.4, 0.7),
            SensorAccuracy::High,
        ));
        for x in ALL_AXES {
            for y in ALL_AXES {
                if let Ok(remap) = AxisRemap::new(x, y) {
                    let out = remap.apply(&m);
                    assert!(
                        (out.determinant() - 1.0).abs() < 1e-5,
                        "remap {x:?},{y:?} lost handedness"
                    );
                }
            }
        }
    }

    #[test]
    fn landscape_remap_moves_columns() {
        // World X onto device Y, world Y onto device -X.
        let remap = AxisRemap::new(Axis::Y, Axis::MinusX).unwrap();
        let out = remap.apply(&DMat3::IDENTITY);
        assert_eq!(out.y_axis, DVec3::X);
        assert_eq!(out.x_axis, -DVec3::Y);
        assert_eq!(out.z_axis, DVec3::Z);
    }
}
