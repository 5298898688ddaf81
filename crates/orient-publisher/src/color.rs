use orient_sensor::{AngleKind, AngleReading};

/// Lower bound of the range readings are normalized from.
pub const MIN_ANGLE: f64 = -180.0;
/// Upper bound of the range readings are normalized from.
pub const MAX_ANGLE: f64 = 180.0;

const FULL_INTENSITY: u8 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DisplayColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl DisplayColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Base colors each angle is tinted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub pitch: DisplayColor,
    pub tilt: DisplayColor,
    pub azimuth: DisplayColor,
}

impl Palette {
    pub fn base(&self, kind: AngleKind) -> DisplayColor {
        match kind {
            AngleKind::Pitch => self.pitch,
            AngleKind::Tilt => self.tilt,
            AngleKind::Azimuth => self.azimuth,
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            pitch: DisplayColor::new(255, 0, 0),
            tilt: DisplayColor::new(255, 255, 0),
            azimuth: DisplayColor::new(0, 0, 255),
        }
    }
}

/// Map `value` from `[min, max]` onto `[0, 1]`, clamping out-of-range input.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// Tint `base` by how far `reading` sits within [-180, 180].
///
/// Channels at full intensity are held; the rest scale with the normalized
/// reading.
pub fn colorize(reading: AngleReading, base: DisplayColor) -> DisplayColor {
    let scale = normalize(reading.degrees, MIN_ANGLE, MAX_ANGLE);
    let channel = |value: u8| {
        if value == FULL_INTENSITY {
            FULL_INTENSITY
        } else {
            (value as f64 * scale).round() as u8
        }
    };
    DisplayColor::new(channel(base.r), channel(base.g), channel(base.b))
}
