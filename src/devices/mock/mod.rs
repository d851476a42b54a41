//! Mock devices for hardware-free testing
//!
//! Each mock follows the same shape: a clonable handle over shared
//! interior state, with inject/inspect methods for tests. Scripted
//! readings are consumed first; some mocks fall back to synthesized
//! values once the script runs dry.

mod adc;
mod drive;
mod servo;
mod sonar;

pub use adc::MockAdcChannel;
pub use drive::MockDrive;
pub use servo::MockServo;
pub use sonar::MockSonarTransducer;
