//! Configuration for the disha-io rover core
//!
//! Loads calibration and tuning constants from a TOML file. Every value
//! here is commissioning-specific: transducer bias, IR curve fit, encoder
//! scale factors, and the floor-sensor signal bands all change with the
//! physical robot, so none of them live as literals in the algorithms.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub sonar: SonarConfig,
    pub ir: IrConfig,
    pub sweep: SweepConfig,
    pub drive: DriveConfig,
    pub boundary: BoundaryConfig,
    pub logging: LoggingConfig,
}

/// Sonar ranging calibration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SonarConfig {
    /// Capture timer resolution in microseconds per tick
    pub tick_period_us: f64,
    /// Tick span of one full counting period (overflow correction)
    pub period_ticks: u32,
    /// Speed of sound in cm per microsecond
    pub speed_of_sound_cm_per_us: f64,
    /// Additive calibration offset in cm, measured at commissioning.
    /// Transducer/mounting specific.
    pub bias_cm: f64,
    /// Maximum wait for a completed echo before giving up (ms)
    pub echo_timeout_ms: u64,
}

/// IR rangefinder calibration: `distance_cm = scale * reading^(-exponent)`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IrConfig {
    /// Inverse-power curve scale, sensor specific
    pub scale: f64,
    /// Inverse-power curve exponent, sensor specific
    pub exponent: f64,
    /// Consecutive ADC samples averaged per reading
    pub sample_count: u32,
}

/// Sweep and object segmentation tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SweepConfig {
    /// Last servo angle of the sweep, inclusive (degrees from 0)
    pub max_angle_deg: u32,
    /// Settle time after positioning the servo at the start angle (ms)
    pub settle_ms: u64,
    /// Near edge of the object-present band (cm). Readings at or below
    /// are treated as too close to be a true object.
    pub band_near_cm: f64,
    /// Far edge of the object-present band (cm)
    pub band_far_cm: f64,
    /// Maximum objects recorded per sweep before the sweep is rejected
    pub max_objects: usize,
}

/// Drive feedback-loop calibration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DriveConfig {
    /// Encoder-angle ticks per requested turn degree (empirical fit)
    pub ticks_per_degree: f64,
    /// A literal 180-degree turn bypasses the tick-scale conversion and
    /// uses the raw degree count as its target. Calibration exception
    /// carried over from commissioning; disable to scale 180 like any
    /// other angle.
    pub unscaled_half_turn: bool,
    /// Encoder-distance ticks per requested centimeter (empirical fit)
    pub ticks_per_cm: f64,
    /// Wheel speed magnitude for drive primitives (signed velocity units)
    pub drive_speed: i16,
    /// Wheel speed magnitude for in-place turns
    pub turn_speed: i16,
    /// Reverse distance of the automatic boundary recovery (cm)
    pub recovery_distance_cm: u32,
    /// Maximum wall-clock time for one feedback loop before a stuck
    /// encoder is reported (ms)
    pub feedback_timeout_ms: u64,
}

/// One analog signal band, exclusive at both bounds
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct SignalBand {
    pub min: u16,
    pub max: u16,
}

impl SignalBand {
    /// Exclusive-bounds membership, matching the commissioning thresholds
    pub fn contains(&self, value: u16) -> bool {
        value > self.min && value < self.max
    }
}

/// Floor-sensor signal bands for the boundary decision table.
///
/// Tape and destination bands overlap numerically across different
/// sensors: the same raw range means boundary tape on one channel and
/// docking target on another. The physical sensor channel, not the
/// number, carries the meaning.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BoundaryConfig {
    pub tape_left: SignalBand,
    pub tape_right: SignalBand,
    pub tape_front_left: SignalBand,
    pub tape_front_right: SignalBand,
    pub destination_left: SignalBand,
    pub destination_right: SignalBand,
    pub destination_front_left: SignalBand,
    pub destination_front_right: SignalBand,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Calibration values measured on the reference rover at
    /// commissioning. Suitable for testing and development; production
    /// deployments should load a TOML file.
    pub fn commissioning_defaults() -> Self {
        Self {
            sonar: SonarConfig {
                tick_period_us: 0.5,
                period_ticks: 65536,
                speed_of_sound_cm_per_us: 0.0343,
                bias_cm: -30.0,
                echo_timeout_ms: 100,
            },
            ir: IrConfig {
                scale: 34272.0,
                exponent: 1.376,
                sample_count: 5,
            },
            sweep: SweepConfig {
                max_angle_deg: 180,
                settle_ms: 1000,
                band_near_cm: 5.0,
                band_far_cm: 50.0,
                max_objects: 10,
            },
            drive: DriveConfig {
                ticks_per_degree: 0.6,
                unscaled_half_turn: true,
                ticks_per_cm: 0.45,
                drive_speed: 100,
                turn_speed: 100,
                recovery_distance_cm: 50,
                feedback_timeout_ms: 15_000,
            },
            boundary: BoundaryConfig {
                tape_left: SignalBand { min: 280, max: 370 },
                tape_right: SignalBand { min: 500, max: 600 },
                tape_front_left: SignalBand { min: 650, max: 780 },
                tape_front_right: SignalBand { min: 200, max: 250 },
                destination_left: SignalBand { min: 500, max: 650 },
                destination_right: SignalBand { min: 800, max: 950 },
                destination_front_left: SignalBand {
                    min: 1000,
                    max: 1420,
                },
                destination_front_right: SignalBand { min: 300, max: 400 },
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::commissioning_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::commissioning_defaults();
        assert_eq!(config.sonar.tick_period_us, 0.5);
        assert_eq!(config.sonar.period_ticks, 65536);
        assert_eq!(config.ir.sample_count, 5);
        assert_eq!(config.sweep.max_objects, 10);
        assert_eq!(config.drive.ticks_per_degree, 0.6);
        assert!(config.drive.unscaled_half_turn);
    }

    #[test]
    fn test_signal_band_bounds_exclusive() {
        let band = SignalBand { min: 280, max: 370 };
        assert!(!band.contains(280));
        assert!(band.contains(281));
        assert!(band.contains(369));
        assert!(!band.contains(370));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::commissioning_defaults();
        let toml_string = toml::to_string_pretty(&config).unwrap();

        assert!(toml_string.contains("[sonar]"));
        assert!(toml_string.contains("[ir]"));
        assert!(toml_string.contains("[sweep]"));
        assert!(toml_string.contains("[drive]"));
        assert!(toml_string.contains("[boundary]"));
        assert!(toml_string.contains("ticks_per_degree = 0.6"));

        let parsed: AppConfig = toml::from_str(&toml_string).unwrap();
        assert_eq!(parsed.sonar.bias_cm, config.sonar.bias_cm);
        assert_eq!(parsed.boundary.tape_left.min, 280);
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[sonar]
tick_period_us = 1.0
period_ticks = 32768
speed_of_sound_cm_per_us = 0.0343
bias_cm = -12.5
echo_timeout_ms = 50

[ir]
scale = 30000.0
exponent = 1.4
sample_count = 3

[sweep]
max_angle_deg = 160
settle_ms = 500
band_near_cm = 5.0
band_far_cm = 50.0
max_objects = 10

[drive]
ticks_per_degree = 0.6
unscaled_half_turn = false
ticks_per_cm = 0.45
drive_speed = 100
turn_speed = 100
recovery_distance_cm = 50
feedback_timeout_ms = 15000

[boundary]
tape_left = { min = 280, max = 370 }
tape_right = { min = 500, max = 600 }
tape_front_left = { min = 650, max = 780 }
tape_front_right = { min = 200, max = 250 }
destination_left = { min = 500, max = 650 }
destination_right = { min = 800, max = 950 }
destination_front_left = { min = 1000, max = 1420 }
destination_front_right = { min = 300, max = 400 }

[logging]
level = "debug"
"#;

        let config: AppConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.sonar.period_ticks, 32768);
        assert_eq!(config.ir.sample_count, 3);
        assert!(!config.drive.unscaled_half_turn);
        assert_eq!(config.logging.level, "debug");
    }
}
