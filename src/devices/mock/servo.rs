//! Mock servo that records every commanded angle

use crate::devices::ServoPositioner;
use crate::error::{Error, Result};
use std::sync::{Arc, Mutex};

/// Records commanded angles; positioning is instantaneous.
#[derive(Clone, Default)]
pub struct MockServo {
    angles: Arc<Mutex<Vec<u8>>>,
}

impl MockServo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every angle commanded so far, in order.
    pub fn angles(&self) -> Vec<u8> {
        self.angles.lock().unwrap().clone()
    }
}

impl ServoPositioner for MockServo {
    fn set_angle(&mut self, degrees: u8) -> Result<()> {
        if degrees > 180 {
            return Err(Error::InvalidParameter(format!(
                "servo angle {} out of range",
                degrees
            )));
        }
        self.angles.lock().unwrap().push(degrees);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_angles() {
        let mut servo = MockServo::new();
        servo.set_angle(0).unwrap();
        servo.set_angle(90).unwrap();
        servo.set_angle(180).unwrap();
        assert_eq!(servo.angles(), vec![0, 90, 180]);
    }

    #[test]
    fn test_rejects_out_of_range() {
        let mut servo = MockServo::new();
        assert!(servo.set_angle(181).is_err());
    }
}
