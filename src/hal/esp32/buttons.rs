//! Three-button input on ESP32 GPIOs.
//!
//! # Wiring
//!
//! Each button shorts its GPIO to GND. The internal pull-ups keep released
//! lines high, matching the weak pull-ups of the original board.
//!
//! - "+" → GPIO5
//! - mode → GPIO6
//! - "-" → GPIO7

use crate::traits::{ButtonInput, ButtonSample};
use esp_idf_hal::gpio::{AnyIOPin, Input, PinDriver, Pull};
use esp_idf_hal::peripheral::Peripheral;

/// Active-low buttons with internal pull-ups.
///
/// # Example
///
/// ```ignore
/// use cst_base::hal::esp32::Esp32Buttons;
/// use cst_base::traits::ButtonInput;
///
/// let peripherals = Peripherals::take()?;
/// let buttons = Esp32Buttons::new(
///     peripherals.pins.gpio5.downgrade(),
///     peripherals.pins.gpio7.downgrade(),
///     peripherals.pins.gpio6.downgrade(),
/// )?;
///
/// if buttons.sample().is_plus_only() {
///     // ...
/// }
/// ```
pub struct Esp32Buttons<'d> {
    plus: PinDriver<'d, AnyIOPin, Input>,
    minus: PinDriver<'d, AnyIOPin, Input>,
    mode: PinDriver<'d, AnyIOPin, Input>,
}

impl<'d> Esp32Buttons<'d> {
    /// Configures the three inputs with pull-ups.
    ///
    /// # Errors
    ///
    /// Returns an error if GPIO initialization fails.
    pub fn new(
        plus: impl Peripheral<P = AnyIOPin> + 'd,
        minus: impl Peripheral<P = AnyIOPin> + 'd,
        mode: impl Peripheral<P = AnyIOPin> + 'd,
    ) -> Result<Self, esp_idf_hal::sys::EspError> {
        let mut plus = PinDriver::input(plus)?;
        let mut minus = PinDriver::input(minus)?;
        let mut mode = PinDriver::input(mode)?;

        plus.set_pull(Pull::Up)?;
        minus.set_pull(Pull::Up)?;
        mode.set_pull(Pull::Up)?;

        Ok(Self { plus, minus, mode })
    }
}

impl ButtonInput for Esp32Buttons<'_> {
    fn sample(&self) -> ButtonSample {
        ButtonSample::new(self.plus.is_low(), self.minus.is_low(), self.mode.is_low())
    }
}
