//! Rangefinders: sonar pulse-echo timing and IR analog conversion

mod ir;
mod sonar;

pub use ir::IrRanger;
pub use sonar::SonarRanger;
