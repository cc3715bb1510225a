//! Error type shared by the main-loop operations.
//!
//! Peripheral drivers each carry their own associated error type. Those
//! are logged where they are mapped into [`StationError`], which only names
//! the peripheral that failed so the main loop can stay generic over the
//! board.

use core::fmt;

/// A peripheral operation failed during a main-loop pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StationError {
    /// Writing to or reading from the watch UART failed.
    Uart,
    /// Setting the LED PWM duty failed.
    Led,
    /// Driving the charge line failed.
    ChargeLine,
}

impl StationError {
    /// Maps a UART driver error, logging it.
    pub fn uart<E: fmt::Debug>(err: E) -> Self {
        log::warn!("watch uart error: {:?}", err);
        Self::Uart
    }

    /// Maps an LED PWM driver error, logging it.
    pub fn led<E: fmt::Debug>(err: E) -> Self {
        log::warn!("led pwm error: {:?}", err);
        Self::Led
    }

    /// Maps a charge line driver error, logging it.
    pub fn charge_line<E: fmt::Debug>(err: E) -> Self {
        log::warn!("charge line error: {:?}", err);
        Self::ChargeLine
    }

    /// Returns the peripheral name as a short string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uart => "uart",
            Self::Led => "led",
            Self::ChargeLine => "charge_line",
        }
    }
}

impl fmt::Display for StationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} peripheral error", self.as_str())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for StationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_name_the_peripheral() {
        assert_eq!(StationError::uart("overrun"), StationError::Uart);
        assert_eq!(StationError::led(()), StationError::Led);
        assert_eq!(StationError::charge_line(7u8), StationError::ChargeLine);
    }

    #[test]
    fn display_message() {
        use alloc::string::ToString;
        assert_eq!(StationError::Uart.to_string(), "uart peripheral error");
        assert_eq!(
            StationError::ChargeLine.to_string(),
            "charge_line peripheral error"
        );
    }
}
