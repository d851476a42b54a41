//! Mock differential drive with scripted or synthesized encoder feedback

use crate::core::types::SensorFrame;
use crate::devices::DriveInterface;
use crate::error::Result;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One synthesized read models a short fixed slice of travel at the
/// commanded speeds.
const DISTANCE_PER_SPEED: i16 = 10; // mm per read at full commissioning speed
const ANGLE_PER_SPEED: i16 = 20; // divisor for differential speed to degrees

struct MockDriveInner {
    left_speed: i16,
    right_speed: i16,
    scripted: VecDeque<SensorFrame>,
    synthesize: bool,
    speed_history: Vec<(i16, i16)>,
}

/// Mock drive base for unit and integration tests.
///
/// Scripted frames are returned first, in order. When the script is
/// empty and synthesis is on (the default), frames are derived from the
/// commanded wheel speeds with clean kinematics and clear boundary
/// sensors; with synthesis off, all-zero frames model a stuck encoder.
#[derive(Clone)]
pub struct MockDrive {
    inner: Arc<Mutex<MockDriveInner>>,
}

impl MockDrive {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockDriveInner {
                left_speed: 0,
                right_speed: 0,
                scripted: VecDeque::new(),
                synthesize: true,
                speed_history: Vec::new(),
            })),
        }
    }

    /// Queue one frame to be returned by the next unread `read_sensors`.
    pub fn script_frame(&self, frame: SensorFrame) {
        self.inner.lock().unwrap().scripted.push_back(frame);
    }

    /// Turn kinematic synthesis on or off for reads past the script.
    pub fn set_synthesize(&self, on: bool) {
        self.inner.lock().unwrap().synthesize = on;
    }

    /// Scripted frames not yet consumed.
    pub fn scripted_remaining(&self) -> usize {
        self.inner.lock().unwrap().scripted.len()
    }

    /// Most recently commanded wheel speeds.
    pub fn current_speeds(&self) -> (i16, i16) {
        let inner = self.inner.lock().unwrap();
        (inner.left_speed, inner.right_speed)
    }

    /// Every wheel-speed command in order.
    pub fn speed_history(&self) -> Vec<(i16, i16)> {
        self.inner.lock().unwrap().speed_history.clone()
    }
}

impl Default for MockDrive {
    fn default() -> Self {
        Self::new()
    }
}

impl DriveInterface for MockDrive {
    fn set_wheel_speeds(&mut self, left: i16, right: i16) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.left_speed = left;
        inner.right_speed = right;
        inner.speed_history.push((left, right));
        Ok(())
    }

    fn read_sensors(&mut self) -> Result<SensorFrame> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(frame) = inner.scripted.pop_front() {
            return Ok(frame);
        }
        if !inner.synthesize {
            return Ok(SensorFrame::default());
        }
        let avg = (i32::from(inner.left_speed) + i32::from(inner.right_speed)) / 2;
        let diff = i32::from(inner.right_speed) - i32::from(inner.left_speed);
        Ok(SensorFrame {
            distance_mm: (avg / i32::from(DISTANCE_PER_SPEED)) as i16,
            angle_deg: (diff / i32::from(ANGLE_PER_SPEED)) as i16,
            ..SensorFrame::default()
        })
    }
}
