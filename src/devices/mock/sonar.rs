//! Mock sonar transducer that replays scripted echoes
//!
//! On each trigger pulse the mock feeds a scripted edge pair (plus any
//! overflow notifications between them) straight into the edge-timer
//! capture handle, standing in for the echo line's interrupt source.

use crate::capture::CaptureHandle;
use crate::devices::SonarTransducer;
use crate::error::Result;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type Echo = (u32, u32, u32); // rising ticks, falling ticks, overflows

struct MockSonarInner {
    scripted: VecDeque<Echo>,
    fallback: Option<Echo>,
    pulses: usize,
}

#[derive(Clone)]
pub struct MockSonarTransducer {
    handle: CaptureHandle,
    inner: Arc<Mutex<MockSonarInner>>,
}

impl MockSonarTransducer {
    pub fn new(handle: CaptureHandle) -> Self {
        Self {
            handle,
            inner: Arc::new(Mutex::new(MockSonarInner {
                scripted: VecDeque::new(),
                fallback: None,
                pulses: 0,
            })),
        }
    }

    /// Queue one echo for the next unanswered trigger pulse.
    pub fn script_echo(&self, rising: u32, falling: u32, overflows: u32) {
        self.inner
            .lock()
            .unwrap()
            .scripted
            .push_back((rising, falling, overflows));
    }

    /// Echo replayed whenever the script is empty. Without a fallback an
    /// unanswered pulse produces no edges at all (echo lost).
    pub fn set_fallback_echo(&self, rising: u32, falling: u32, overflows: u32) {
        self.inner.lock().unwrap().fallback = Some((rising, falling, overflows));
    }

    /// Trigger pulses fired so far.
    pub fn pulse_count(&self) -> usize {
        self.inner.lock().unwrap().pulses
    }
}

impl SonarTransducer for MockSonarTransducer {
    fn send_trigger_pulse(&mut self) -> Result<()> {
        let echo = {
            let mut inner = self.inner.lock().unwrap();
            inner.pulses += 1;
            inner.scripted.pop_front().or(inner.fallback)
        };
        if let Some((rising, falling, overflows)) = echo {
            self.handle.edge(rising);
            for _ in 0..overflows {
                self.handle.overflow();
            }
            self.handle.edge(falling);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::EdgeTimer;
    use std::time::Duration;

    #[test]
    fn test_scripted_echo_reaches_timer() {
        let (timer, handle) = EdgeTimer::new(Duration::from_millis(50));
        let mut transducer = MockSonarTransducer::new(handle);
        transducer.script_echo(100, 900, 0);

        timer.arm_for_rising_edge();
        transducer.send_trigger_pulse().unwrap();
        let cap = timer.take_capture().unwrap();
        assert_eq!(cap.rising_ticks, 100);
        assert_eq!(cap.falling_ticks, 900);
        assert_eq!(transducer.pulse_count(), 1);
    }

    #[test]
    fn test_unanswered_pulse_leaves_timer_blocked() {
        let (timer, handle) = EdgeTimer::new(Duration::from_millis(10));
        let mut transducer = MockSonarTransducer::new(handle);

        timer.arm_for_rising_edge();
        transducer.send_trigger_pulse().unwrap();
        assert!(timer.take_capture().is_err());
    }
}
