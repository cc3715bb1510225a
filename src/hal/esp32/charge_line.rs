//! Charge line output on an ESP32 GPIO.

use crate::traits::{ChargeLevel, ChargeLine};
use esp_idf_hal::gpio::{AnyOutputPin, Output, PinDriver};
use esp_idf_hal::peripheral::Peripheral;

/// Push-pull output selecting the supply towards the watch.
///
/// Low selects 12V charging, high selects the 5V measurement supply.
pub struct Esp32ChargeLine<'d> {
    pin: PinDriver<'d, AnyOutputPin, Output>,
}

impl<'d> Esp32ChargeLine<'d> {
    /// Configures the output and starts at 12V.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO initialization fails.
    pub fn new(pin: impl Peripheral<P = AnyOutputPin> + 'd) -> Result<Self, esp_idf_hal::sys::EspError> {
        let mut pin = PinDriver::output(pin)?;
        pin.set_low()?;
        Ok(Self { pin })
    }
}

impl ChargeLine for Esp32ChargeLine<'_> {
    type Error = esp_idf_hal::sys::EspError;

    fn set_level(&mut self, level: ChargeLevel) -> Result<(), Self::Error> {
        if level.pin_high() {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        }
    }
}
