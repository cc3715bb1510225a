//! Watch UART on the ESP32 UART driver.

use crate::traits::WatchUart;
use esp_idf_hal::delay::NON_BLOCK;
use esp_idf_hal::gpio::{AnyIOPin, InputPin, OutputPin};
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::prelude::*;
use esp_idf_hal::uart::{config::Config, Uart, UartDriver};

/// Half-duplex byte link to the watch, 8N1, no flow control.
///
/// Both directions are non-blocking: a full TX FIFO or an empty RX FIFO
/// report `WouldBlock`.
pub struct Esp32Uart<'d> {
    driver: UartDriver<'d>,
}

impl<'d> Esp32Uart<'d> {
    /// Opens the UART at `baud`.
    ///
    /// # Errors
    ///
    /// Returns an error if the driver cannot be installed.
    pub fn new<U: Uart>(
        uart: impl Peripheral<P = U> + 'd,
        tx: impl Peripheral<P = impl OutputPin> + 'd,
        rx: impl Peripheral<P = impl InputPin> + 'd,
        baud: u32,
    ) -> Result<Self, esp_idf_hal::sys::EspError> {
        let config = Config::new().baudrate(Hertz(baud));
        let driver = UartDriver::new(
            uart,
            tx,
            rx,
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &config,
        )?;
        Ok(Self { driver })
    }
}

impl WatchUart for Esp32Uart<'_> {
    type Error = esp_idf_hal::sys::EspError;

    fn write(&mut self, byte: u8) -> nb::Result<(), Self::Error> {
        match self.driver.write(&[byte]) {
            Ok(0) => Err(nb::Error::WouldBlock),
            Ok(_) => Ok(()),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }

    fn read(&mut self) -> nb::Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        match self.driver.read(&mut buf, NON_BLOCK) {
            Ok(0) => Err(nb::Error::WouldBlock),
            Ok(_) => Ok(buf[0]),
            Err(e) => Err(nb::Error::Other(e)),
        }
    }
}
