//! Movement controller: blocking drive primitives with encoder feedback
//!
//! Each primitive commands wheel speeds, then loops reading fresh
//! encoder increments until the accumulated feedback reaches its target.
//! The forward primitive additionally classifies every frame against the
//! boundary table and aborts early on a match. Dead-reckoned pose is
//! updated on every feedback iteration and reported when a primitive
//! completes.

use super::boundary;
use crate::config::{BoundaryConfig, DriveConfig};
use crate::core::types::{BoundaryEvent, Pose, SensorFrame, TurnDirection};
use crate::devices::DriveInterface;
use crate::error::{Error, Result};
use crate::status::{format_pose, StatusSink};
use std::time::Instant;

pub struct MovementController {
    drive: Box<dyn DriveInterface>,
    status: Box<dyn StatusSink>,
    config: DriveConfig,
    bands: BoundaryConfig,
    pose: Pose,
    // millimeter-resolution accumulators behind the integer pose fields
    x_acc_mm: f64,
    y_acc_mm: f64,
}

impl MovementController {
    pub fn new(
        drive: Box<dyn DriveInterface>,
        status: Box<dyn StatusSink>,
        config: DriveConfig,
        bands: BoundaryConfig,
    ) -> Self {
        Self {
            drive,
            status,
            config,
            bands,
            pose: Pose::default(),
            x_acc_mm: 0.0,
            y_acc_mm: 0.0,
        }
    }

    /// Current dead-reckoned pose. Reset only at process start.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Refresh and return the raw sensor frame without moving.
    pub fn read_sensors(&mut self) -> Result<SensorFrame> {
        self.drive.read_sensors()
    }

    /// Turn in place by `degrees` in the requested sense.
    ///
    /// The encoder target comes from the empirical ticks-per-degree fit,
    /// except a literal 180 which passes through unconverted when
    /// `unscaled_half_turn` is set (commissioning exception, see config).
    /// On completion the heading moves by exactly the requested degrees
    /// regardless of encoder noise inside the loop.
    pub fn turn(&mut self, direction: TurnDirection, degrees: u32) -> Result<()> {
        let target_ticks = if degrees == 180 && self.config.unscaled_half_turn {
            180.0
        } else {
            f64::from(degrees) * self.config.ticks_per_degree
        };

        let speed = self.config.turn_speed;
        let (left, right) = match direction {
            TurnDirection::Clockwise => (speed, -speed),
            TurnDirection::CounterClockwise => (-speed, speed),
        };

        log::debug!(
            "MovementController: turn {:?} {} deg, target {:.1} ticks",
            direction,
            degrees,
            target_ticks
        );

        let deadline = self.feedback_deadline();
        self.drive.set_wheel_speeds(left, right)?;

        let mut progress = 0.0f64;
        while progress < target_ticks {
            if Instant::now() >= deadline {
                self.drive.set_wheel_speeds(0, 0)?;
                return Err(Error::Timeout("turn encoder target"));
            }
            let frame = self.drive.read_sensors()?;
            // fold the commanded sense so progress grows positive
            progress += match direction {
                TurnDirection::CounterClockwise => f64::from(frame.angle_deg),
                TurnDirection::Clockwise => -f64::from(frame.angle_deg),
            };
        }
        self.drive.set_wheel_speeds(0, 0)?;

        match direction {
            TurnDirection::CounterClockwise => self.pose.heading_deg += degrees as i32,
            TurnDirection::Clockwise => self.pose.heading_deg -= degrees as i32,
        }

        self.report_pose();
        Ok(())
    }

    /// Drive forward `distance_cm`, checking the boundary table on every
    /// feedback iteration.
    ///
    /// Returns `Some(event)` when a boundary condition aborted the drive
    /// early (the automatic recovery, if any, has already run), `None`
    /// when the full distance completed.
    pub fn drive_forward(&mut self, distance_cm: u32) -> Result<Option<BoundaryEvent>> {
        self.drive_leg(distance_cm, true)
    }

    /// Drive backward `distance_cm` to completion, without boundary
    /// checks. Reversal is always a deliberate short recovery move away
    /// from whatever just fired.
    pub fn drive_backward(&mut self, distance_cm: u32) -> Result<()> {
        self.drive_leg(distance_cm, false)?;
        Ok(())
    }

    /// Classify one frame against the boundary table and run the
    /// automatic reaction: bumper/cliff/tape reverse a short recovery
    /// distance, destination matches stop the wheels in place.
    pub fn check_boundary(&mut self, frame: &SensorFrame) -> Result<BoundaryEvent> {
        let event = boundary::classify(frame, &self.bands);
        if event.is_none() {
            return Ok(event);
        }

        self.status.report(&format!("Boundary: {}", event.describe()));
        self.drive.set_wheel_speeds(0, 0)?;
        if event.requires_recovery() {
            self.drive_backward(self.config.recovery_distance_cm)?;
        }
        Ok(event)
    }

    fn drive_leg(&mut self, distance_cm: u32, forward: bool) -> Result<Option<BoundaryEvent>> {
        let target_ticks = f64::from(distance_cm) * self.config.ticks_per_cm;
        let speed = if forward {
            self.config.drive_speed
        } else {
            -self.config.drive_speed
        };

        log::debug!(
            "MovementController: drive {} {} cm, target {:.1} ticks",
            if forward { "forward" } else { "backward" },
            distance_cm,
            target_ticks
        );

        let deadline = self.feedback_deadline();
        self.drive.set_wheel_speeds(speed, speed)?;

        let mut progress = 0.0f64;
        let mut aborted = None;
        while progress < target_ticks {
            if Instant::now() >= deadline {
                self.drive.set_wheel_speeds(0, 0)?;
                return Err(Error::Timeout("drive encoder target"));
            }
            let frame = self.drive.read_sensors()?;
            let increment = f64::from(frame.distance_mm);
            progress += if forward { increment } else { -increment };
            self.integrate_position(frame.distance_mm);

            if forward {
                let event = self.check_boundary(&frame)?;
                if !event.is_none() {
                    aborted = Some(event);
                    break;
                }
            }
        }
        self.drive.set_wheel_speeds(0, 0)?;

        self.report_pose();
        Ok(aborted)
    }

    /// Fold one signed encoder-distance increment into the pose at the
    /// current heading. Heading is tracked in degrees and converted
    /// explicitly for the trigonometry.
    fn integrate_position(&mut self, distance_mm: i16) {
        if distance_mm == 0 {
            return;
        }
        let heading_rad = f64::from(self.pose.heading_deg).to_radians();
        self.x_acc_mm += f64::from(distance_mm) * heading_rad.cos();
        self.y_acc_mm += f64::from(distance_mm) * heading_rad.sin();
        self.pose.x_mm = self.x_acc_mm.round() as i32;
        self.pose.y_mm = self.y_acc_mm.round() as i32;
        self.pose.radial_distance_mm =
            (self.x_acc_mm * self.x_acc_mm + self.y_acc_mm * self.y_acc_mm).sqrt();
    }

    fn feedback_deadline(&self) -> Instant {
        Instant::now() + std::time::Duration::from_millis(self.config.feedback_timeout_ms)
    }

    fn report_pose(&mut self) {
        let line = format_pose(&self.pose);
        self.status.report(&line);
    }
}
