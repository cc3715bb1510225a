//! Task watchdog for ESP32.

use crate::traits::Watchdog;
use esp_idf_hal::sys::{
    esp, esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_delete, esp_task_wdt_reconfigure,
    esp_task_wdt_reset, EspError,
};

/// ESP-IDF task watchdog subscribed for the main task.
///
/// Reconfigures the task watchdog to the station's window and panics
/// (reboots) if the main loop stops feeding it.
pub struct Esp32Watchdog {
    _private: (),
}

impl Esp32Watchdog {
    /// Subscribes the calling task with a `timeout_secs` window.
    ///
    /// # Errors
    ///
    /// Returns an error if the task watchdog is not available.
    pub fn new(timeout_secs: u32) -> Result<Self, EspError> {
        let config = esp_task_wdt_config_t {
            timeout_ms: timeout_secs.saturating_mul(1000),
            idle_core_mask: 0,
            trigger_panic: true,
        };
        // SAFETY: plain ESP-IDF calls; a null handle means the current task
        unsafe {
            esp!(esp_task_wdt_reconfigure(&config))?;
            esp!(esp_task_wdt_add(core::ptr::null_mut()))?;
        }
        Ok(Self { _private: () })
    }
}

impl Watchdog for Esp32Watchdog {
    fn feed(&mut self) {
        // SAFETY: the current task was subscribed in `new`
        let result = unsafe { esp_task_wdt_reset() };
        if let Err(e) = esp!(result) {
            log::warn!("watchdog feed failed: {:?}", e);
        }
    }
}

impl Drop for Esp32Watchdog {
    fn drop(&mut self) {
        // SAFETY: removes the subscription added in `new`
        unsafe {
            esp_task_wdt_delete(core::ptr::null_mut());
        }
    }
}
