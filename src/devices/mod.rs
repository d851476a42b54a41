//! Hardware trait seams and device implementations
//!
//! Every peripheral the core algorithms touch sits behind one of these
//! traits. Register-level initialization lives with the implementations,
//! never in the algorithms. The [`mock`] module provides in-memory
//! implementations of all of them for hardware-free testing.

pub mod mock;

use crate::core::types::SensorFrame;
use crate::error::Result;

/// Differential drive base with incremental encoder feedback.
pub trait DriveInterface: Send {
    /// Command wheel velocities in signed velocity units.
    fn set_wheel_speeds(&mut self, left: i16, right: i16) -> Result<()>;

    /// Refresh and return sensor state. Distance and angle fields are
    /// increments since the previous read.
    fn read_sensors(&mut self) -> Result<SensorFrame>;
}

/// Rangefinder positioning servo.
pub trait ServoPositioner: Send {
    /// Move to `degrees` (0..=180) and return once positioned.
    fn set_angle(&mut self, degrees: u8) -> Result<()>;
}

/// Sonar transducer trigger line.
pub trait SonarTransducer: Send {
    /// Emit one brief trigger pulse. The echo comes back through the
    /// edge-timer capture handle, not through this trait.
    fn send_trigger_pulse(&mut self) -> Result<()>;
}

/// One analog-to-digital channel.
pub trait AdcChannel: Send {
    /// Start a conversion.
    fn start_conversion(&mut self) -> Result<()>;

    /// Block until the started conversion completes and return the raw
    /// reading. Implementations bound the wait and surface
    /// [`crate::Error::Timeout`] rather than spinning forever.
    fn read_blocking(&mut self) -> Result<u16>;
}
