//! # cst-base
//!
//! Firmware core for a desk base station that charges a wrist watch and sets
//! its time over a 3-wire UART link, while answering a host computer through
//! 8-byte HID feature reports.
//!
//! ## Features
//!
//! - **Charge/LED cycle**: breathing LED, periodic 5V battery measurement window
//!   with automatic return to 12V charging
//! - **Communication watchdog**: the cycle shuts down when the watch stops talking
//!   and restarts on the next `'H'` handshake
//! - **Button gestures**: single steps, ten/hour auto-repeat, extra-press
//!   catch-up, mode toggle, color-swap and diagnostic combos
//! - **Host command router**: time set, raw byte relay, last-byte readback,
//!   button snapshot and firmware version
//!
//! ## Architecture
//!
//! The crate is structured to allow testing on desktop without hardware:
//!
//! - `traits` - Peripheral and host-link abstractions
//! - `context` - State shared between interrupt handlers and the main loop
//! - `interrupt` - The single interrupt vector (timer overflow, UART receive)
//! - `charge` - Charge/LED state machine advanced once per timer tick
//! - `gesture` - Polled button decoder
//! - `router` - Host report handling
//! - `station` - Main loop tying everything together
//! - `hal` - Concrete implementations (mock for testing, esp32 for hardware)
//!
//! ## Example
//!
//! ```rust
//! use cst_base::{BaseStation, StationConfig, ChargeLevel, hal::{MockBoard, SimClock}};
//!
//! let clock = SimClock::new();
//! let mut station = BaseStation::new(MockBoard::parts(&clock), StationConfig::default());
//!
//! // The watch says hello: the charge cycle starts breathing
//! station.uart_receive(b'H');
//!
//! // Timer interrupt fired, main loop consumes it
//! station.timer_overflow();
//! station.run_once().unwrap();
//!
//! assert_eq!(station.context().charge_level(), ChargeLevel::TwelveVolt);
//! assert_eq!(station.parts().watchdog.feeds, 1);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

/// Charge/LED state machine and output mirroring.
pub mod charge;
/// Configuration for timing, protocol and firmware identity.
pub mod config;
/// State shared between the interrupt handlers and the main loop.
pub mod context;
/// Error types.
pub mod error;
/// Polled button/gesture decoder.
pub mod gesture;
/// Hardware abstraction layer with mock implementations for testing.
pub mod hal;
/// Single interrupt vector dispatch.
pub mod interrupt;
/// Watch-side wire protocol: command bytes, replies, time codes.
pub mod protocol;
/// Host-side 8-byte HID report format.
pub mod report;
/// Host command router.
pub mod router;
/// Main loop.
pub mod station;
/// Communication watchdog counter.
pub mod timeout;
/// Core traits for hardware abstraction.
pub mod traits;
/// UART transport to the watch.
pub mod transport;

// Re-exports for convenience
pub use charge::{ChargeOutputs, ChargeState, CycleState, LedDirection, TickOutcome};
pub use config::{
    ButtonConfig, ChargeConfig, ConfigError, FirmwareConfig, StationConfig, UartConfig,
    WatchdogConfig,
};
pub use context::{DeviceContext, ReceiveRegister, TimerOverflowFlag};
pub use error::StationError;
pub use gesture::{ButtonDecoder, Emitted};
pub use interrupt::Interrupt;
pub use protocol::{TimeCode, WatchCommand, WatchReply};
pub use report::{HostCommand, Report};
pub use router::CommandRouter;
pub use station::{BaseStation, BoardParts, StationState};
pub use timeout::CommTimeout;
pub use traits::{
    BlockingDelay, Board, ButtonInput, ButtonSample, ChargeLevel, ChargeLine, HostLink, LedPwm,
    WatchUart, Watchdog,
};
pub use transport::WatchLink;
