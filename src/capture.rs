//! Edge-timer service: capture peripheral abstraction for sonar timing
//!
//! The hardware side latches a timestamp on each signal transition and
//! wraps its free-running counter once per counting period. Those two
//! notification sources run in interrupt context; the main flow blocks
//! until a full rising/falling pair has been observed.
//!
//! The handoff between the two contexts is explicit: interrupt-side state
//! lives in atomics inside [`CaptureHandle`], and a completed pair crosses
//! to the main flow as one [`EdgeCapture`] over a bounded(1) channel. The
//! main flow never reads the raw fields mid-capture.
//!
//! Only one capture may be in flight at a time; callers serialize.

use crate::core::types::EdgeCapture;
use crate::error::{Error, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

const PHASE_IDLE: u8 = 0;
const PHASE_AWAIT_RISING: u8 = 1;
const PHASE_AWAIT_FALLING: u8 = 2;

struct CaptureShared {
    phase: AtomicU8,
    rising: AtomicU32,
    overflows: AtomicU32,
    completed: Sender<EdgeCapture>,
}

/// Interrupt-context side of the edge timer.
///
/// Clonable and Send: hand one to whatever delivers the hardware
/// notifications (an ISR trampoline on target, a simulator thread in
/// tests). Calls must be short; they only touch atomics and a
/// non-blocking channel send.
#[derive(Clone)]
pub struct CaptureHandle {
    shared: Arc<CaptureShared>,
}

impl CaptureHandle {
    /// Signal-transition notification with the latched timer value.
    ///
    /// First call after arming latches the rising edge and re-targets the
    /// falling edge; the second completes the capture and publishes it.
    /// Edges while disarmed are ignored.
    pub fn edge(&self, ticks: u32) {
        match self.shared.phase.load(Ordering::Acquire) {
            PHASE_AWAIT_RISING => {
                self.shared.rising.store(ticks, Ordering::Release);
                self.shared
                    .phase
                    .store(PHASE_AWAIT_FALLING, Ordering::Release);
            }
            PHASE_AWAIT_FALLING => {
                let capture = EdgeCapture {
                    rising_ticks: self.shared.rising.load(Ordering::Acquire),
                    falling_ticks: ticks,
                    overflow_count: self.shared.overflows.load(Ordering::Acquire),
                };
                self.shared.phase.store(PHASE_IDLE, Ordering::Release);
                // bounded(1), drained at arm time; a failed send means a
                // stale capture nobody collected, safe to drop
                let _ = self.shared.completed.try_send(capture);
            }
            _ => {
                log::trace!("EdgeTimer: edge at {} ticks while disarmed, ignored", ticks);
            }
        }
    }

    /// Counter-wraparound notification. Counted only while a capture is
    /// in flight.
    pub fn overflow(&self) {
        if self.shared.phase.load(Ordering::Acquire) != PHASE_IDLE {
            self.shared.overflows.fetch_add(1, Ordering::AcqRel);
        }
    }
}

/// Main-flow side of the edge timer.
pub struct EdgeTimer {
    shared: Arc<CaptureShared>,
    completed: Receiver<EdgeCapture>,
    timeout: Duration,
}

impl EdgeTimer {
    /// Create the timer and its interrupt-side handle.
    ///
    /// `timeout` bounds [`take_capture`](Self::take_capture); an echo that
    /// never returns surfaces as [`Error::Timeout`] instead of blocking
    /// forever.
    pub fn new(timeout: Duration) -> (Self, CaptureHandle) {
        let (tx, rx) = bounded(1);
        let shared = Arc::new(CaptureShared {
            phase: AtomicU8::new(PHASE_IDLE),
            rising: AtomicU32::new(0),
            overflows: AtomicU32::new(0),
            completed: tx,
        });
        let timer = EdgeTimer {
            shared: Arc::clone(&shared),
            completed: rx,
            timeout,
        };
        (timer, CaptureHandle { shared })
    }

    /// Arm for the next rising edge.
    ///
    /// Drains any stale capture, zeroes the overflow count, and puts the
    /// handle into the awaiting-rising phase. Call before triggering the
    /// pulse so no edge is missed.
    pub fn arm_for_rising_edge(&self) {
        while self.completed.try_recv().is_ok() {}
        self.shared.overflows.store(0, Ordering::Release);
        self.shared
            .phase
            .store(PHASE_AWAIT_RISING, Ordering::Release);
    }

    /// Block until both edges of the armed capture have been observed.
    pub fn take_capture(&self) -> Result<EdgeCapture> {
        match self.completed.recv_timeout(self.timeout) {
            Ok(capture) => {
                log::trace!(
                    "EdgeTimer: capture rising={} falling={} overflows={}",
                    capture.rising_ticks,
                    capture.falling_ticks,
                    capture.overflow_count
                );
                Ok(capture)
            }
            Err(RecvTimeoutError::Timeout) => {
                self.shared.phase.store(PHASE_IDLE, Ordering::Release);
                Err(Error::Timeout("sonar echo capture"))
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(Error::Other("capture handle dropped".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_capture_pair() {
        let (timer, handle) = EdgeTimer::new(Duration::from_millis(100));
        timer.arm_for_rising_edge();
        handle.edge(1000);
        handle.edge(5000);

        let cap = timer.take_capture().unwrap();
        assert_eq!(cap.rising_ticks, 1000);
        assert_eq!(cap.falling_ticks, 5000);
        assert_eq!(cap.overflow_count, 0);
    }

    #[test]
    fn test_overflow_counted_between_edges() {
        let (timer, handle) = EdgeTimer::new(Duration::from_millis(100));
        timer.arm_for_rising_edge();
        handle.edge(60000);
        handle.overflow();
        handle.edge(2000);

        let cap = timer.take_capture().unwrap();
        assert_eq!(cap.overflow_count, 1);
        assert_eq!(cap.corrected_delta_ticks(65536), (65536 - 60000 + 2000) as i64);
    }

    #[test]
    fn test_overflow_ignored_while_disarmed() {
        let (timer, handle) = EdgeTimer::new(Duration::from_millis(100));
        handle.overflow();
        handle.overflow();

        timer.arm_for_rising_edge();
        handle.edge(10);
        handle.edge(20);
        let cap = timer.take_capture().unwrap();
        assert_eq!(cap.overflow_count, 0);
    }

    #[test]
    fn test_edges_ignored_while_disarmed() {
        let (timer, handle) = EdgeTimer::new(Duration::from_millis(10));
        handle.edge(1);
        handle.edge(2);
        assert!(matches!(timer.take_capture(), Err(Error::Timeout(_))));
    }

    #[test]
    fn test_timeout_when_echo_never_completes() {
        let (timer, handle) = EdgeTimer::new(Duration::from_millis(10));
        timer.arm_for_rising_edge();
        handle.edge(1000); // falling edge never arrives
        assert!(matches!(timer.take_capture(), Err(Error::Timeout(_))));
    }

    #[test]
    fn test_rearm_clears_stale_state() {
        let (timer, handle) = EdgeTimer::new(Duration::from_millis(100));
        timer.arm_for_rising_edge();
        handle.edge(10);
        handle.overflow();
        handle.edge(20);
        // stale capture never taken; rearm must discard it
        timer.arm_for_rising_edge();
        handle.edge(100);
        handle.edge(200);
        let cap = timer.take_capture().unwrap();
        assert_eq!(cap.rising_ticks, 100);
        assert_eq!(cap.overflow_count, 0);
    }

    #[test]
    fn test_capture_from_other_thread() {
        let (timer, handle) = EdgeTimer::new(Duration::from_secs(1));
        timer.arm_for_rising_edge();

        let worker = thread::spawn(move || {
            handle.edge(500);
            handle.overflow();
            handle.edge(300);
        });

        let cap = timer.take_capture().unwrap();
        worker.join().unwrap();
        assert_eq!(cap.rising_ticks, 500);
        assert_eq!(cap.falling_ticks, 300);
        assert_eq!(cap.overflow_count, 1);
    }
}
