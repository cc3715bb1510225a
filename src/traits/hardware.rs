//! Hardware abstraction traits for the base station peripherals.
//!
//! This module defines the peripheral interfaces the firmware core drives,
//! so the same logic runs on the ESP32 backend and against desktop mocks.
//!
//! # Key Traits
//!
//! | Trait | Purpose |
//! |-------|---------|
//! | [`ButtonInput`] | Samples "+", "-" and "mode" (active-low) |
//! | [`LedPwm`] | Breathing LED duty cycle |
//! | [`ChargeLine`] | 12V charge / 5V measurement supply select |
//! | [`WatchUart`] | Half-duplex byte link to the watch |
//! | [`BlockingDelay`] | Busy-wait delays used for debounce and settling |
//! | [`Watchdog`] | Hardware watchdog reset |
//!
//! # Implementation
//!
//! For testing and desktop development, use the mock implementations
//! from [`crate::hal::mock`]. For ESP32 hardware, use the
//! implementations from `hal::esp32` (requires `esp32` feature).
//!
//! # Example
//!
//! ```rust
//! use cst_base::traits::{ChargeLevel, ChargeLine, LedPwm};
//! use cst_base::hal::{MockChargeLine, MockLed};
//!
//! let mut line = MockChargeLine::new();
//! line.set_level(ChargeLevel::FiveVolt).unwrap();
//! assert_eq!(line.level, ChargeLevel::FiveVolt);
//!
//! let mut led = MockLed::new();
//! led.set_duty(0x44).unwrap();
//! assert_eq!(led.duty, 0x44);
//! ```

/// Supply level on the charge line towards the watch.
///
/// # Default
///
/// Defaults to [`TwelveVolt`](Self::TwelveVolt): the fail-safe state is
/// always "keep charging".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ChargeLevel {
    /// Normal charging supply (output pin low).
    #[default]
    TwelveVolt,
    /// Measurement window supply (output pin high).
    ///
    /// The watch can only read its battery accurately while the 12V
    /// charger is not pulling it up.
    FiveVolt,
}

impl ChargeLevel {
    /// Returns the level as a short string.
    ///
    /// # Examples
    ///
    /// ```
    /// use cst_base::ChargeLevel;
    ///
    /// assert_eq!(ChargeLevel::TwelveVolt.as_str(), "12v");
    /// assert_eq!(ChargeLevel::FiveVolt.as_str(), "5v");
    /// ```
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ChargeLevel::TwelveVolt => "12v",
            ChargeLevel::FiveVolt => "5v",
        }
    }

    /// Logic level of the output pin driving the supply switch.
    #[inline]
    pub const fn pin_high(&self) -> bool {
        matches!(self, ChargeLevel::FiveVolt)
    }
}

/// Logical state of the three buttons at one instant.
///
/// `true` means pressed. The physical lines are active-low with weak
/// pull-ups, so a pressed button reads as a low pin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ButtonSample {
    /// "+" button.
    pub plus: bool,
    /// "-" button.
    pub minus: bool,
    /// "12/24 hour" mode button.
    pub mode: bool,
}

impl ButtonSample {
    /// Port bit carrying the "-" line.
    pub const MINUS_BIT: u8 = 3;
    /// Port bit carrying the mode line.
    pub const MODE_BIT: u8 = 4;
    /// Port bit carrying the "+" line.
    pub const PLUS_BIT: u8 = 5;

    /// All buttons released.
    pub const RELEASED: Self = Self {
        plus: false,
        minus: false,
        mode: false,
    };

    /// Builds a sample from pressed flags.
    pub const fn new(plus: bool, minus: bool, mode: bool) -> Self {
        Self { plus, minus, mode }
    }

    /// Only "+" pressed.
    pub const fn plus_only() -> Self {
        Self::new(true, false, false)
    }

    /// Only "-" pressed.
    pub const fn minus_only() -> Self {
        Self::new(false, true, false)
    }

    /// Only mode pressed.
    pub const fn mode_only() -> Self {
        Self::new(false, false, true)
    }

    /// All three pressed.
    pub const fn all() -> Self {
        Self::new(true, true, true)
    }

    /// "+" and "-" pressed, mode released.
    pub const fn plus_minus() -> Self {
        Self::new(true, true, false)
    }

    /// Returns true if only "+" is pressed.
    pub const fn is_plus_only(&self) -> bool {
        self.plus && !self.minus && !self.mode
    }

    /// Returns true if only "-" is pressed.
    pub const fn is_minus_only(&self) -> bool {
        !self.plus && self.minus && !self.mode
    }

    /// Returns true if all three are pressed.
    pub const fn is_all(&self) -> bool {
        self.plus && self.minus && self.mode
    }

    /// Returns true if "+" and "-" are pressed with mode released.
    pub const fn is_plus_minus(&self) -> bool {
        self.plus && self.minus && !self.mode
    }

    /// Returns true if nothing is pressed.
    pub const fn is_released(&self) -> bool {
        !self.plus && !self.minus && !self.mode
    }

    /// Raw port image: released lines read high, other bits zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use cst_base::ButtonSample;
    ///
    /// assert_eq!(ButtonSample::RELEASED.to_port(), 0b0011_1000);
    /// assert_eq!(ButtonSample::plus_only().to_port(), 0b0001_1000);
    /// assert_eq!(ButtonSample::all().to_port(), 0);
    /// ```
    pub const fn to_port(&self) -> u8 {
        let mut port = 0;
        if !self.minus {
            port |= 1 << Self::MINUS_BIT;
        }
        if !self.mode {
            port |= 1 << Self::MODE_BIT;
        }
        if !self.plus {
            port |= 1 << Self::PLUS_BIT;
        }
        port
    }

    /// Decodes a raw port image (active-low lines).
    pub const fn from_port(port: u8) -> Self {
        Self {
            plus: port & (1 << Self::PLUS_BIT) == 0,
            minus: port & (1 << Self::MINUS_BIT) == 0,
            mode: port & (1 << Self::MODE_BIT) == 0,
        }
    }
}

/// Three-button input.
///
/// Implementations sample the lines on every call; there is no latching.
/// Debounce is the decoder's job.
pub trait ButtonInput {
    /// Samples the current logical button state.
    fn sample(&self) -> ButtonSample;

    /// Raw port snapshot as reported to the host.
    ///
    /// Default implementation rebuilds it from [`sample`](Self::sample).
    /// Override if the hardware can read the whole port at once.
    fn port_snapshot(&self) -> u8 {
        self.sample().to_port()
    }
}

/// LED PWM output.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use cst_base::traits::LedPwm;
///
/// struct MyLed { /* PWM channel */ }
///
/// impl LedPwm for MyLed {
///     type Error = ();
///
///     fn set_duty(&mut self, duty: u8) -> Result<(), ()> {
///         // Write the PWM duty register...
///         Ok(())
///     }
/// }
/// ```
pub trait LedPwm {
    /// Error type for PWM operations.
    type Error: core::fmt::Debug;

    /// Sets the duty cycle, 0 = off, 255 = fully on.
    fn set_duty(&mut self, duty: u8) -> Result<(), Self::Error>;
}

/// Supply selector towards the watch.
pub trait ChargeLine {
    /// Error type for GPIO operations.
    type Error: core::fmt::Debug;

    /// Drives the line to the given level.
    fn set_level(&mut self, level: ChargeLevel) -> Result<(), Self::Error>;
}

/// Byte-wise UART to the watch.
///
/// Both directions follow the `nb` convention: return
/// `Err(nb::Error::WouldBlock)` while the transmit register is busy or no
/// byte has been received.
pub trait WatchUart {
    /// Error type for UART operations.
    type Error: core::fmt::Debug;

    /// Queues one byte for transmission.
    fn write(&mut self, byte: u8) -> nb::Result<(), Self::Error>;

    /// Reads one received byte.
    fn read(&mut self) -> nb::Result<u8, Self::Error>;
}

/// Busy-wait delay.
///
/// Nothing but interrupts runs during a delay. Callers keep every delay
/// short compared to the watchdog window.
pub trait BlockingDelay {
    /// Blocks for the given number of milliseconds.
    fn delay_ms(&mut self, ms: u32);
}

/// Hardware watchdog.
pub trait Watchdog {
    /// Resets the watchdog countdown.
    fn feed(&mut self);
}

/// One concrete implementation of every peripheral.
///
/// Lets [`BaseStation`](crate::BaseStation) take a single type parameter.
///
/// ```rust,ignore
/// struct MyBoard;
///
/// impl Board for MyBoard {
///     type Buttons = MyButtons;
///     type Led = MyLed;
///     type ChargeLine = MyChargeLine;
///     type Uart = MyUart;
///     type Delay = MyDelay;
///     type Watchdog = MyWatchdog;
/// }
/// ```
pub trait Board {
    /// Button input.
    type Buttons: ButtonInput;
    /// LED PWM.
    type Led: LedPwm;
    /// Charge line output.
    type ChargeLine: ChargeLine;
    /// Watch UART.
    type Uart: WatchUart;
    /// Blocking delay.
    type Delay: BlockingDelay;
    /// Hardware watchdog.
    type Watchdog: Watchdog;
}
