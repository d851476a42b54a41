//! DishaIO - Perception and motion core for a small differential-drive rover
//!
//! This library provides the building blocks for a teleoperated rover with
//! obstacle perception:
//!
//! - Edge-timed sonar and averaged-ADC infrared ranging
//! - Servo sweep with object segmentation over the paired range trace
//! - Encoder-fed movement primitives with boundary detection and
//!   dead-reckoned pose

pub mod capture;
pub mod config;
pub mod core;
pub mod devices;
pub mod error;
pub mod motion;
pub mod ranging;
pub mod status;
pub mod sweep;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{Error, Result};
