//! Blocking delay for ESP32.

use crate::traits::BlockingDelay;
use embedded_hal::delay::DelayNs;
use esp_idf_hal::delay::{Ets, FreeRtos};

/// Millisecond delay.
///
/// Short debounce delays busy-wait so they are not rounded up to a whole
/// RTOS tick; longer ones yield to FreeRTOS so the idle task keeps running.
#[derive(Default)]
pub struct Esp32Delay;

impl Esp32Delay {
    /// Delays below this busy-wait.
    const BUSY_WAIT_BELOW_MS: u32 = 10;

    /// Creates a delay.
    pub fn new() -> Self {
        Self
    }
}

impl BlockingDelay for Esp32Delay {
    fn delay_ms(&mut self, ms: u32) {
        if ms < Self::BUSY_WAIT_BELOW_MS {
            Ets.delay_ms(ms);
        } else {
            FreeRtos.delay_ms(ms);
        }
    }
}
