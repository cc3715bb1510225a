//! Station configuration shared by the desktop mocks and the ESP32 build.
//!
//! Every default matches the shipped base station firmware. Uses
//! `heapless::String` for the firmware name so the config stays `no_std`
//! friendly.
//!
//! # Example
//!
//! ```rust
//! use cst_base::config::{ButtonConfig, ChargeConfig, StationConfig};
//!
//! // Use defaults
//! let config = StationConfig::default();
//! assert!(config.validate().is_ok());
//!
//! // Or customize
//! let config = StationConfig::default()
//!     .with_charge(ChargeConfig::default().with_comm_timeout_ticks(250))
//!     .with_buttons(ButtonConfig::default().with_combo_hold_ms(3000));
//! assert_eq!(config.charge.comm_timeout_ticks, 250);
//! ```

use core::fmt;
use heapless::String as HString;

/// Maximum length for the firmware name
pub const MAX_NAME: usize = 32;

/// Type alias for short config strings
pub type ShortString = HString<MAX_NAME>;

/// Create a ShortString from a &str, truncating at a char boundary if too long
pub fn short_string(s: &str) -> ShortString {
    let mut hs = ShortString::new();
    let take = s.len().min(MAX_NAME);
    let valid_end = s
        .char_indices()
        .take_while(|(i, c)| i + c.len_utf8() <= take)
        .last()
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    let _ = hs.push_str(&s[..valid_end]);
    hs
}

// ============================================================================
// Main Config
// ============================================================================

/// Complete station configuration
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StationConfig {
    /// Charge/LED cycle timing
    pub charge: ChargeConfig,
    /// Gesture decoder timing
    pub buttons: ButtonConfig,
    /// Watch UART settings
    pub uart: UartConfig,
    /// Firmware identity reported to the host
    pub firmware: FirmwareConfig,
    /// Hardware watchdog window
    pub watchdog: WatchdogConfig,
}

impl StationConfig {
    /// Set charge configuration
    pub fn with_charge(mut self, charge: ChargeConfig) -> Self {
        self.charge = charge;
        self
    }

    /// Set button configuration
    pub fn with_buttons(mut self, buttons: ButtonConfig) -> Self {
        self.buttons = buttons;
        self
    }

    /// Set UART configuration
    pub fn with_uart(mut self, uart: UartConfig) -> Self {
        self.uart = uart;
        self
    }

    /// Set firmware configuration
    pub fn with_firmware(mut self, firmware: FirmwareConfig) -> Self {
        self.firmware = firmware;
        self
    }

    /// Set watchdog configuration
    pub fn with_watchdog(mut self, watchdog: WatchdogConfig) -> Self {
        self.watchdog = watchdog;
        self
    }

    /// Checks the configuration for values the firmware cannot run with.
    ///
    /// Besides ordering and non-zero checks, this verifies that the longest
    /// blocking main-loop pass still fits inside the watchdog window.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.charge.validate()?;
        self.buttons.validate()?;
        if self.uart.baud == 0 {
            return Err(ConfigError::Zero("uart.baud"));
        }
        let longest_pass_ms = self.buttons.longest_pass_ms();
        let watchdog_ms = self.watchdog.timeout_ms();
        if longest_pass_ms >= watchdog_ms {
            return Err(ConfigError::WatchdogTooShort {
                longest_pass_ms,
                watchdog_ms,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Charge Config
// ============================================================================

/// Charge/LED cycle configuration, in timer overflow ticks
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChargeConfig {
    /// Tick at which the line drops to 5V and `'T'` is sent
    pub voltage_check_tick: u16,
    /// Tick at which the line returns to 12V and the counter restarts
    pub measurement_end_tick: u16,
    /// Ticks without watch traffic before the cycle is disabled
    pub comm_timeout_ticks: u16,
    /// LED duty while the watch reports a charged battery
    pub charged_duty: u8,
    /// LED duty set by a handshake that re-enables the cycle
    pub handshake_duty: u8,
    /// Timer overflow period in microseconds
    pub overflow_period_us: u32,
}

impl Default for ChargeConfig {
    fn default() -> Self {
        Self {
            voltage_check_tick: 1000,
            measurement_end_tick: 2000,
            comm_timeout_ticks: 500,
            charged_duty: 0x44,
            handshake_duty: 0xFF,
            overflow_period_us: 43_690,
        }
    }
}

impl ChargeConfig {
    /// Set the voltage check tick
    pub fn with_voltage_check_tick(mut self, tick: u16) -> Self {
        self.voltage_check_tick = tick;
        self
    }

    /// Set the measurement end tick
    pub fn with_measurement_end_tick(mut self, tick: u16) -> Self {
        self.measurement_end_tick = tick;
        self
    }

    /// Set the communication timeout
    pub fn with_comm_timeout_ticks(mut self, ticks: u16) -> Self {
        self.comm_timeout_ticks = ticks;
        self
    }

    /// Set the charged LED duty
    pub fn with_charged_duty(mut self, duty: u8) -> Self {
        self.charged_duty = duty;
        self
    }

    /// Set the timer overflow period
    pub fn with_overflow_period_us(mut self, us: u32) -> Self {
        self.overflow_period_us = us;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.voltage_check_tick == 0 {
            return Err(ConfigError::Zero("charge.voltage_check_tick"));
        }
        if self.comm_timeout_ticks == 0 {
            return Err(ConfigError::Zero("charge.comm_timeout_ticks"));
        }
        if self.overflow_period_us == 0 {
            return Err(ConfigError::Zero("charge.overflow_period_us"));
        }
        if self.measurement_end_tick <= self.voltage_check_tick {
            return Err(ConfigError::ScheduleOrder);
        }
        Ok(())
    }
}

// ============================================================================
// Button Config
// ============================================================================

/// Gesture decoder configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ButtonConfig {
    /// Held iterations that still send single steps
    pub single_step_iterations: u16,
    /// Held iterations after which hour steps are sent
    pub hour_step_after: u16,
    /// Pacing delay after a ten step
    pub ten_step_pacing_ms: u32,
    /// Pacing delay after an hour step
    pub hour_step_pacing_ms: u32,
    /// Debounce block after every detected edge
    pub debounce_ms: u32,
    /// Length of the extra-press sub-poll
    pub extra_press_window_ms: u32,
    /// Hold time before a combo fires
    pub combo_hold_ms: u32,
    /// Delay per combo iteration
    pub combo_poll_ms: u32,
    /// One battery settle delay in diagnostic mode
    pub diagnostic_settle_ms: u32,
    /// Number of settle delays in diagnostic mode
    pub diagnostic_settle_repeats: u8,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            single_step_iterations: 10,
            hour_step_after: 22,
            ten_step_pacing_ms: 125,
            hour_step_pacing_ms: 250,
            debounce_ms: 10,
            extra_press_window_ms: 510,
            combo_hold_ms: 5000,
            combo_poll_ms: 1,
            diagnostic_settle_ms: 1000,
            diagnostic_settle_repeats: 3,
        }
    }
}

impl ButtonConfig {
    /// Set the single-step iteration count
    pub fn with_single_step_iterations(mut self, n: u16) -> Self {
        self.single_step_iterations = n;
        self
    }

    /// Set the hour-step threshold
    pub fn with_hour_step_after(mut self, n: u16) -> Self {
        self.hour_step_after = n;
        self
    }

    /// Set the debounce time
    pub fn with_debounce_ms(mut self, ms: u32) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Set the extra-press window
    pub fn with_extra_press_window_ms(mut self, ms: u32) -> Self {
        self.extra_press_window_ms = ms;
        self
    }

    /// Set the combo hold time
    pub fn with_combo_hold_ms(mut self, ms: u32) -> Self {
        self.combo_hold_ms = ms;
        self
    }

    /// Set the diagnostic settle delay
    pub fn with_diagnostic_settle_ms(mut self, ms: u32) -> Self {
        self.diagnostic_settle_ms = ms;
        self
    }

    /// Combo iterations needed before the combo fires, at least one
    pub fn combo_iterations(&self) -> u32 {
        (self.combo_hold_ms / self.combo_poll_ms.max(1)).max(1)
    }

    /// Upper bound on the blocking time of one decoder pass.
    ///
    /// Sums the worst case of every branch a single pass can take.
    pub fn longest_pass_ms(&self) -> u32 {
        let step = self.hour_step_pacing_ms.max(self.ten_step_pacing_ms)
            + self.extra_press_window_ms
            + self.debounce_ms;
        let mode = 2 * self.debounce_ms;
        let combo = self.combo_poll_ms;
        let diagnostic = self.diagnostic_settle_ms * u32::from(self.diagnostic_settle_repeats);
        2 * step + mode + combo + combo.max(diagnostic)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.combo_poll_ms == 0 {
            return Err(ConfigError::Zero("buttons.combo_poll_ms"));
        }
        if self.combo_hold_ms < self.combo_poll_ms {
            return Err(ConfigError::Zero("buttons.combo_hold_ms"));
        }
        if self.single_step_iterations > self.hour_step_after {
            return Err(ConfigError::StepOrder);
        }
        if self.debounce_ms >= self.extra_press_window_ms {
            return Err(ConfigError::DebounceWindow);
        }
        Ok(())
    }
}

// ============================================================================
// UART Config
// ============================================================================

/// Watch UART configuration (8N1, no flow control)
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UartConfig {
    /// Baud rate
    pub baud: u32,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self { baud: 2048 }
    }
}

impl UartConfig {
    /// Set the baud rate
    pub fn with_baud(mut self, baud: u32) -> Self {
        self.baud = baud;
        self
    }
}

// ============================================================================
// Firmware Config
// ============================================================================

/// Firmware identity reported to the host
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FirmwareConfig {
    /// HID report id expected in byte 0
    pub report_id: u8,
    /// Major version character
    pub version_major: u8,
    /// Minor version character
    pub version_minor: u8,
    /// Human-readable product name
    pub name: ShortString,
}

impl Default for FirmwareConfig {
    fn default() -> Self {
        Self {
            report_id: 0x01,
            version_major: b'1',
            version_minor: b'0',
            name: short_string("CST Base Station"),
        }
    }
}

impl FirmwareConfig {
    /// Set the version characters
    pub fn with_version(mut self, major: u8, minor: u8) -> Self {
        self.version_major = major;
        self.version_minor = minor;
        self
    }

    /// Set the product name
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = short_string(name);
        self
    }
}

// ============================================================================
// Watchdog Config
// ============================================================================

/// Hardware watchdog configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WatchdogConfig {
    /// Watchdog timeout in seconds
    pub timeout_secs: u32,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self { timeout_secs: 256 }
    }
}

impl WatchdogConfig {
    /// Set the timeout
    pub fn with_timeout_secs(mut self, secs: u32) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Timeout in milliseconds
    pub fn timeout_ms(&self) -> u32 {
        self.timeout_secs.saturating_mul(1000)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Invalid configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A value that must be non-zero is zero
    Zero(&'static str),
    /// The measurement window does not end after it starts
    ScheduleOrder,
    /// Single steps extend past the hour-step threshold
    StepOrder,
    /// The debounce block does not fit in the extra-press window
    DebounceWindow,
    /// A single main-loop pass can outlast the watchdog
    WatchdogTooShort {
        /// Worst-case blocking time of one pass
        longest_pass_ms: u32,
        /// Configured watchdog window
        watchdog_ms: u32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Zero(field) => write!(f, "{} must be non-zero", field),
            Self::ScheduleOrder => write!(f, "measurement_end_tick must exceed voltage_check_tick"),
            Self::StepOrder => write!(f, "single_step_iterations must not exceed hour_step_after"),
            Self::DebounceWindow => write!(f, "debounce_ms must be shorter than the extra-press window"),
            Self::WatchdogTooShort {
                longest_pass_ms,
                watchdog_ms,
            } => write!(
                f,
                "longest loop pass ({} ms) does not fit the watchdog window ({} ms)",
                longest_pass_ms, watchdog_ms
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

// ============================================================================
// Tests
// ============================================================================
