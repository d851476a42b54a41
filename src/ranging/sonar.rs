//! Sonar ranging: trigger pulse, edge-pair capture, distance conversion

use crate::capture::EdgeTimer;
use crate::config::SonarConfig;
use crate::devices::SonarTransducer;
use crate::error::{Error, Result};

/// Pulse-echo rangefinder.
///
/// Owns the trigger line and the main-flow side of the edge timer. The
/// interrupt-side [`crate::capture::CaptureHandle`] is wired to the echo
/// line by whoever constructs the rig.
pub struct SonarRanger {
    transducer: Box<dyn SonarTransducer>,
    timer: EdgeTimer,
    config: SonarConfig,
}

impl SonarRanger {
    pub fn new(transducer: Box<dyn SonarTransducer>, timer: EdgeTimer, config: SonarConfig) -> Self {
        Self {
            transducer,
            timer,
            config,
        }
    }

    /// Measure distance in centimeters.
    ///
    /// Arms the capture before firing the trigger so the rising edge
    /// cannot be missed, blocks for the completed edge pair, then
    /// converts elapsed ticks through the configured timer resolution,
    /// speed of sound, and commissioning bias. Overflow ticks are folded
    /// in before the edge subtraction; without that, any echo longer than
    /// one counting period would convert to a silently wrong distance.
    pub fn measure_cm(&mut self) -> Result<f64> {
        self.timer.arm_for_rising_edge();
        self.transducer.send_trigger_pulse()?;
        let capture = self.timer.take_capture()?;

        let delta_ticks = capture.corrected_delta_ticks(self.config.period_ticks);
        if delta_ticks < 0 {
            return Err(Error::InvalidCapture {
                rising: capture.rising_ticks,
                falling: capture.falling_ticks,
                overflows: capture.overflow_count,
            });
        }

        let time_us = delta_ticks as f64 * self.config.tick_period_us;
        let distance_cm =
            self.config.speed_of_sound_cm_per_us * time_us / 2.0 + self.config.bias_cm;

        log::trace!(
            "SonarRanger: delta={} ticks, time={:.1}us, distance={:.2}cm",
            delta_ticks,
            time_us,
            distance_cm
        );

        Ok(distance_cm)
    }
}
