//! Core data types for ranging, sweeping, and movement.
//!
//! Key types for consumers:
//! - [`EdgeCapture`]: one completed pulse-echo edge pair from the capture timer
//! - [`DetectedObject`]: one segmented object from a rangefinder sweep
//! - [`Pose`]: dead-reckoned position estimate owned by the movement controller
//! - [`BoundaryEvent`]: bumper/cliff/tape/destination condition from one sensor frame

use serde::{Deserialize, Serialize};

/// Timestamps of one completed pulse-echo cycle.
///
/// Produced by the edge-timer service, consumed immediately by sonar
/// ranging. `overflow_count` records how many times the free-running
/// counter wrapped between the two edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeCapture {
    /// Timer value latched at the rising edge
    pub rising_ticks: u32,
    /// Timer value latched at the falling edge
    pub falling_ticks: u32,
    /// Counter wraparounds observed between the edges
    pub overflow_count: u32,
}

impl EdgeCapture {
    /// Elapsed ticks between rising and falling edge, with overflows
    /// folded in before the subtraction.
    ///
    /// An echo longer than one counting period makes the falling value
    /// numerically precede the rising one; the overflow count restores
    /// the true span. A negative result means the capture cannot
    /// represent a physical echo (missed overflow notification).
    pub fn corrected_delta_ticks(&self, period_ticks: u32) -> i64 {
        self.falling_ticks as i64 + self.overflow_count as i64 * period_ticks as i64
            - self.rising_ticks as i64
    }
}

/// One paired distance reading, ephemeral per sweep step or on-demand read.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RangeSample {
    /// Sonar-measured distance in centimeters
    pub sonar_distance_cm: f64,
    /// IR-measured distance in centimeters
    pub ir_distance_cm: f64,
}

/// One discrete object segmented out of a sweep trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedObject {
    /// 0-based order of detection within the sweep
    pub sequence_index: usize,
    /// Midpoint of the detection episode in degrees
    pub center_angle_deg: u32,
    /// Angular span of the episode in degrees
    pub angular_width_deg: u32,
    /// Sonar distance sampled when the episode closed (cm)
    pub sonar_distance_cm: f64,
    /// IR trace value at the center angle (cm)
    pub ir_distance_cm: f64,
    /// Chord width at the sonar distance (cm)
    pub linear_width_cm: f64,
}

impl DetectedObject {
    /// Chord width subtended by `angular_width_deg` at `sonar_distance_cm`.
    pub fn linear_width(sonar_distance_cm: f64, angular_width_deg: u32) -> f64 {
        2.0 * sonar_distance_cm * (f64::from(angular_width_deg).to_radians() / 2.0).tan()
    }
}

/// Dead-reckoned position estimate.
///
/// Mutated only by the movement controller on every encoder-feedback
/// iteration; persists for the operating session. Heading accumulates
/// without wraparound (a full circle reads 360, not 0).
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct Pose {
    /// X coordinate in millimeters relative to the start point
    pub x_mm: i32,
    /// Y coordinate in millimeters relative to the start point
    pub y_mm: i32,
    /// Signed heading in degrees, counterclockwise positive
    pub heading_deg: i32,
    /// Radial distance from the start point in millimeters
    pub radial_distance_mm: f64,
}

/// Rotational sense for turn commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnDirection {
    /// Heading decreases
    Clockwise,
    /// Heading increases
    CounterClockwise,
}

/// Boundary condition computed from one instantaneous sensor frame.
///
/// Recomputed fresh on every check, never persisted. These are control
/// flow outcomes, not errors: a drive primitive that hits one stops (and
/// for bumper/cliff/tape, reverses a short recovery distance) and returns
/// the event to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryEvent {
    None,
    BumperLeft,
    BumperRight,
    CliffLeft,
    CliffRight,
    CliffFrontLeft,
    CliffFrontRight,
    TapeLeft,
    TapeRight,
    TapeFrontLeft,
    TapeFrontRight,
    DestinationLeft,
    DestinationRight,
    DestinationFrontLeft,
    DestinationFrontRight,
}

impl BoundaryEvent {
    /// No condition fired
    pub fn is_none(&self) -> bool {
        matches!(self, BoundaryEvent::None)
    }

    /// Docking-target band matched (stop without reversing)
    pub fn is_destination(&self) -> bool {
        matches!(
            self,
            BoundaryEvent::DestinationLeft
                | BoundaryEvent::DestinationRight
                | BoundaryEvent::DestinationFrontLeft
                | BoundaryEvent::DestinationFrontRight
        )
    }

    /// Bumper, cliff, or tape: the controller reverses a short recovery
    /// distance before returning this event.
    pub fn requires_recovery(&self) -> bool {
        !self.is_none() && !self.is_destination()
    }

    /// Human-readable label for status reporting
    pub fn describe(&self) -> &'static str {
        match self {
            BoundaryEvent::None => "none",
            BoundaryEvent::BumperLeft => "left bumper",
            BoundaryEvent::BumperRight => "right bumper",
            BoundaryEvent::CliffLeft => "left cliff",
            BoundaryEvent::CliffRight => "right cliff",
            BoundaryEvent::CliffFrontLeft => "front left cliff",
            BoundaryEvent::CliffFrontRight => "front right cliff",
            BoundaryEvent::TapeLeft => "left boundary tape",
            BoundaryEvent::TapeRight => "right boundary tape",
            BoundaryEvent::TapeFrontLeft => "front left boundary tape",
            BoundaryEvent::TapeFrontRight => "front right boundary tape",
            BoundaryEvent::DestinationLeft => "destination on left",
            BoundaryEvent::DestinationRight => "destination on right",
            BoundaryEvent::DestinationFrontLeft => "destination front left",
            BoundaryEvent::DestinationFrontRight => "destination front right",
        }
    }
}

/// Refreshed drive/encoder sensor state.
///
/// `distance_mm` and `angle_deg` are signed increments since the last
/// read, not absolutes. The five analog signal strengths are raw
/// 10/12-bit floor-sensor readings; `wall_signal` travels with the frame
/// but is not consumed by the boundary decision table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorFrame {
    /// Incremental travel since last read (mm, negative when reversing)
    pub distance_mm: i16,
    /// Incremental rotation since last read (degrees, CCW positive)
    pub angle_deg: i16,
    pub bumper_left: bool,
    pub bumper_right: bool,
    pub cliff_left: bool,
    pub cliff_front_left: bool,
    pub cliff_front_right: bool,
    pub cliff_right: bool,
    pub wall_signal: u16,
    pub cliff_left_signal: u16,
    pub cliff_front_left_signal: u16,
    pub cliff_front_right_signal: u16,
    pub cliff_right_signal: u16,
}
