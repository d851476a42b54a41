//! Status reporting: human-readable state lines for the operator link
//!
//! The format is for humans at the remote console and carries no
//! machine-parsed meaning.

use crate::core::types::{DetectedObject, Pose, SensorFrame};
use std::sync::{Arc, Mutex};

/// Receives human-readable status lines after each primitive completes.
pub trait StatusSink: Send {
    fn report(&mut self, line: &str);
}

/// Routes status lines to the log.
pub struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn report(&mut self, line: &str) {
        log::info!("{}", line);
    }
}

/// In-memory sink for tests: clonable, records every line.
#[derive(Clone, Default)]
pub struct MemoryStatusSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryStatusSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl StatusSink for MemoryStatusSink {
    fn report(&mut self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

/// One-line pose summary.
pub fn format_pose(pose: &Pose) -> String {
    format!(
        "Location: X: {}mm  Y: {}mm  R: {:.2}mm  Angle: {} deg",
        pose.x_mm, pose.y_mm, pose.radial_distance_mm, pose.heading_deg
    )
}

/// One-line detected-object summary.
pub fn format_object(obj: &DetectedObject) -> String {
    format!(
        "Object {}: center {} deg, width {} deg ({:.2}cm), sonar {:.2}cm, ir {:.2}cm",
        obj.sequence_index,
        obj.center_angle_deg,
        obj.angular_width_deg,
        obj.linear_width_cm,
        obj.sonar_distance_cm,
        obj.ir_distance_cm
    )
}

/// Raw sensor-frame dump for the read command.
pub fn format_frame(frame: &SensorFrame) -> String {
    format!(
        "Bumpers(L: {} R: {})  Cliffs(L: {} FL: {} FR: {} R: {})  \
         Signals(L: {} FL: {} FR: {} R: {} wall: {})",
        frame.bumper_left as u8,
        frame.bumper_right as u8,
        frame.cliff_left as u8,
        frame.cliff_front_left as u8,
        frame.cliff_front_right as u8,
        frame.cliff_right as u8,
        frame.cliff_left_signal,
        frame.cliff_front_left_signal,
        frame.cliff_front_right_signal,
        frame.cliff_right_signal,
        frame.wall_signal
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records() {
        let sink = MemoryStatusSink::new();
        let mut writer = sink.clone();
        writer.report("first");
        writer.report("second");
        assert_eq!(sink.lines(), vec!["first", "second"]);
    }

    #[test]
    fn test_format_pose() {
        let pose = Pose {
            x_mm: 120,
            y_mm: -45,
            heading_deg: 270,
            radial_distance_mm: 128.16,
        };
        let line = format_pose(&pose);
        assert!(line.contains("X: 120mm"));
        assert!(line.contains("Y: -45mm"));
        assert!(line.contains("Angle: 270 deg"));
    }
}
