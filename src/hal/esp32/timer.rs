//! Periodic charge timer for ESP32.
//!
//! Replaces the 8-bit timer overflow interrupt: an `esp_timer` fires every
//! overflow period and raises a [`TimerOverflowFlag`] that the main loop
//! consumes.

use core::time::Duration;

use crate::context::TimerOverflowFlag;
use esp_idf_svc::timer::{EspTaskTimerService, EspTimer};

/// Periodic timer raising the update-pending flag.
///
/// # Example
///
/// ```ignore
/// use cst_base::TimerOverflowFlag;
/// use cst_base::hal::esp32::Esp32TickTimer;
///
/// static TICK: TimerOverflowFlag = TimerOverflowFlag::new();
///
/// let _timer = Esp32TickTimer::start(&TICK, 43_690)?;
/// loop {
///     if TICK.take() {
///         station.timer_overflow();
///     }
///     station.run_once()?;
/// }
/// ```
pub struct Esp32TickTimer {
    _timer: EspTimer<'static>,
}

impl Esp32TickTimer {
    /// Starts raising `flag` every `period_us` microseconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the timer service cannot create the timer.
    pub fn start(
        flag: &'static TimerOverflowFlag,
        period_us: u32,
    ) -> Result<Self, esp_idf_hal::sys::EspError> {
        let service = EspTaskTimerService::new()?;
        let timer = service.timer(move || flag.set())?;
        timer.every(Duration::from_micros(u64::from(period_us)))?;
        Ok(Self { _timer: timer })
    }
}
