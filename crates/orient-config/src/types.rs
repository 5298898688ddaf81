use anyhow::{ensure, Result};
use orient_sensor::{Axis, AxisRemap, MAX_RATE_HZ};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Angle sampling and history.
    pub sampler: SamplerConfig,
    /// Snapshot publishing cadence.
    pub publisher: PublisherConfig,
    /// Rotation sensor feed.
    pub sensor: SensorConfig,
}

impl AppConfig {
    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.sampler.history_capacity >= 1,
            "sampler.history_capacity must be at least 1"
        );
        ensure!(
            self.publisher.interval_ms >= 1,
            "publisher.interval_ms must be at least 1"
        );
        ensure!(
            (1..=MAX_RATE_HZ).contains(&self.sensor.rate_hz),
            "sensor.rate_hz must be between 1 and {MAX_RATE_HZ}"
        );
        self.sampler.remap.to_remap()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Number of readings kept per angle before the oldest is evicted.
    pub history_capacity: usize,
    /// Reference frame the rotation matrix is remapped into before decomposition.
    pub remap: AxisRemapConfig,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            remap: AxisRemapConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisRemapConfig {
    /// Device axis the world X axis is mapped onto.
    pub x: Axis,
    /// Device axis the world Y axis is mapped onto.
    pub y: Axis,
}

impl Default for AxisRemapConfig {
    fn default() -> Self {
        Self {
            x: Axis::X,
            y: Axis::Y,
        }
    }
}

impl AxisRemapConfig {
    pub fn to_remap(&self) -> Result<AxisRemap> {
        Ok(AxisRemap::new(self.x, self.y)?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublisherConfig {
    /// Snapshot publish period in milliseconds.
    pub interval_ms: u64,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self { interval_ms: 100 }
    }
}

impl PublisherConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Whether a rotation sensor is available. When false the publisher
    /// keeps emitting default snapshots.
    pub enabled: bool,
    /// Delivery rate of the simulated rotation sensor.
    pub rate_hz: u32,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rate_hz: 200,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: AppConfig = toml::from_str("[sensor]\nrate_hz = 500\n").unwrap();
        assert_eq!(config.sensor.rate_hz, 500);
        assert!(config.sensor.enabled);
        assert_eq!(config.sampler.history_capacity, 100);
        assert_eq!(config.publisher.interval(), Duration::from_millis(100));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut config = AppConfig::default();
        config.sampler.history_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn sensor_rate_is_bounded() {
        let mut config = AppConfig::default();
        config.sensor.rate_hz = 0;
        assert!(config.validate().is_err());
        config.sensor.rate_hz = MAX_RATE_HZ;
        assert!(config.validate().is_ok());
        config.sensor.rate_hz = u32::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn remap_onto_same_axis_is_rejected() {
        let mut config = AppConfig::default();
        config.sampler.remap = AxisRemapConfig {
            x: Axis::Y,
            y: Axis::MinusY,
        };
        assert!(config.validate().is_err());
    }
}
