//! Mock ADC channel with scripted conversion results

use crate::devices::AdcChannel;
use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

struct MockAdcInner {
    scripted: VecDeque<u16>,
    fallback: Option<u16>,
    conversion_started: bool,
}

/// Scripted ADC: each started conversion returns the next queued
/// reading, or the fallback once the queue is dry. No queued reading and
/// no fallback models a conversion that never completes.
#[derive(Clone)]
pub struct MockAdcChannel {
    inner: Arc<Mutex<MockAdcInner>>,
}

impl MockAdcChannel {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockAdcInner {
                scripted: VecDeque::new(),
                fallback: None,
                conversion_started: false,
            })),
        }
    }

    /// Queue raw readings in conversion order.
    pub fn script_readings(&self, readings: &[u16]) {
        self.inner.lock().unwrap().scripted.extend(readings);
    }

    /// Reading returned whenever the script is empty.
    pub fn set_fallback_reading(&self, reading: u16) {
        self.inner.lock().unwrap().fallback = Some(reading);
    }
}

impl Default for MockAdcChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl AdcChannel for MockAdcChannel {
    fn start_conversion(&mut self) -> Result<()> {
        self.inner.lock().unwrap().conversion_started = true;
        Ok(())
    }

    fn read_blocking(&mut self) -> Result<u16> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.conversion_started {
            return Err(Error::Other("ADC read without started conversion".to_string()));
        }
        inner.conversion_started = false;
        match inner.scripted.pop_front().or(inner.fallback) {
            Some(reading) => Ok(reading),
            None => Err(Error::Timeout("adc conversion")),
        }
    }
}
