//! Status LED on the ESP32 LEDC peripheral.

use crate::traits::LedPwm;
use esp_idf_hal::ledc::{config::TimerConfig, LedcDriver, LedcTimerDriver, Resolution};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;

/// Breathing LED driven by an 8-bit LEDC channel.
///
/// The duty register maps one to one onto the channel, as on the original
/// board's 8-bit PWM.
pub struct Esp32Led<'d> {
    pwm: LedcDriver<'d>,
}

impl<'d> Esp32Led<'d> {
    /// PWM frequency in Hz (well above visible flicker)
    const PWM_FREQ_HZ: u32 = 5_000;

    /// PWM resolution (8-bit = 256 steps)
    const PWM_RESOLUTION: Resolution = Resolution::Bits8;

    /// Creates the LED driver and switches the LED off.
    ///
    /// # Errors
    ///
    /// Returns an error if PWM initialization fails.
    pub fn new<T, TI, C, CI, P, PI>(pin: P, timer: T, channel: C) -> Result<Self, esp_idf_hal::sys::EspError>
    where
        TI: esp_idf_hal::ledc::LedcTimer + 'd,
        T: Peripheral<P = TI> + 'd,
        CI: esp_idf_hal::ledc::LedcChannel<SpeedMode = TI::SpeedMode> + 'd,
        C: Peripheral<P = CI> + 'd,
        PI: esp_idf_hal::gpio::OutputPin + 'd,
        P: Peripheral<P = PI> + 'd,
    {
        let timer_config = TimerConfig::default()
            .frequency(Self::PWM_FREQ_HZ.Hz())
            .resolution(Self::PWM_RESOLUTION);
        let timer_driver = LedcTimerDriver::new(timer, &timer_config)?;
        let mut pwm = LedcDriver::new(channel, &timer_driver, pin)?;
        pwm.set_duty(0)?;
        Ok(Self { pwm })
    }
}

impl LedPwm for Esp32Led<'_> {
    type Error = esp_idf_hal::sys::EspError;

    fn set_duty(&mut self, duty: u8) -> Result<(), Self::Error> {
        let max = self.pwm.get_max_duty();
        self.pwm.set_duty(u32::from(duty) * max / 255)
    }
}
