use crate::color::{colorize, normalize, DisplayColor, Palette, MAX_ANGLE, MIN_ANGLE};
use orient_sensor::{AngleKind, AngleReading, AngleState, SamplerState, SensorAccuracy};
use std::time::SystemTime;

/// One angle as published: current value, history (oldest first) and tint.
#[derive(Debug, Clone, PartialEq)]
pub struct AngleSnapshot {
    pub reading: AngleReading,
    pub history: Vec<AngleReading>,
    pub color: DisplayColor,
}

impl AngleSnapshot {
    fn from_state(state: AngleState, base: DisplayColor) -> Self {
        Self {
            color: colorize(state.reading, base),
            reading: state.reading,
            history: state.history,
        }
    }

    /// Current reading mapped onto [0, 1].
    pub fn normalized(&self) -> f64 {
        normalize(self.reading.degrees, MIN_ANGLE, MAX_ANGLE)
    }

    /// History mapped onto [0, 1], oldest first.
    pub fn normalized_history(&self) -> Vec<f64> {
        self.history
            .iter()
            .map(|r| normalize(r.degrees, MIN_ANGLE, MAX_ANGLE))
            .collect()
    }
}

/// Immutable view of the sampler published once per tick.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub pitch: AngleSnapshot,
    pub tilt: AngleSnapshot,
    pub azimuth: AngleSnapshot,
    pub accuracy: SensorAccuracy,
    /// Samples the sampler had ingested when this snapshot was taken.
    pub sample_count: u64,
    /// Number of the tick that produced this snapshot; 0 before the first tick.
    pub sequence: u64,
    pub published_at: SystemTime,
}

impl Snapshot {
    pub(crate) fn from_state(
        state: SamplerState,
        palette: &Palette,
        sequence: u64,
        published_at: SystemTime,
    ) -> Self {
        Self {
            pitch: AngleSnapshot::from_state(state.pitch, palette.pitch),
            tilt: AngleSnapshot::from_state(state.tilt, palette.tilt),
            azimuth: AngleSnapshot::from_state(state.azimuth, palette.azimuth),
            accuracy: state.accuracy,
            sample_count: state.sample_count,
            sequence,
            published_at,
        }
    }

    /// Zero readings, empty histories, colors derived from a zero reading.
    pub fn empty(palette: &Palette, sequence: u64, published_at: SystemTime) -> Self {
        Self::from_state(SamplerState::default(), palette, sequence, published_at)
    }

    pub fn angle(&self, kind: AngleKind) -> &AngleSnapshot {
        match kind {
            AngleKind::Pitch => &self.pitch,
            AngleKind::Tilt => &self.tilt,
            AngleKind::Azimuth => &self.azimuth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_uses_zero_colors() {
        let palette = Palette::default();
        let snapshot = Snapshot::empty(&palette, 0, SystemTime::UNIX_EPOCH);
        for kind in AngleKind::ALL {
            let angle = snapshot.angle(kind);
            assert_eq!(angle.reading, AngleReading::ZERO);
            assert!(angle.history.is_empty());
            assert_eq!(angle.color, colorize(AngleReading::ZERO, palette.base(kind)));
        }
        assert_eq!(snapshot.sample_count, 0);
    }

    #[test]
    fn normalized_history_follows_readings() {
        let angle = AngleSnapshot {
            reading: AngleReading::new(90.0),
            history: vec![
                AngleReading::new(-180.0),
                AngleReading::new(0.0),
                AngleReading::new(400.0),
            ],
            color: DisplayColor::default(),
        };
        assert_eq!(angle.normalized(), 0.75);
        assert_eq!(angle.normalized_history(), vec![0.0, 0.5, 1.0]);
    }
}
