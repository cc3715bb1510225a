//! Trait definitions for hardware abstraction and the host link.
//!
//! This module defines the core abstractions that allow cst-base to:
//! - Run on different hardware (ESP32, desktop mock)
//! - Be driven by a simulated clock in tests
//! - Stay independent of the USB HID stack that carries host reports
//!
//! # Submodules
//!
//! - `hardware`: Buttons, LED PWM, charge line, watch UART, delay, watchdog
//! - `host`: HID transport seam
//!
//! # Hardware Abstraction
//!
//! The key hardware traits are:
//!
//! - [`ButtonInput`]: The three active-low buttons
//! - [`LedPwm`]: 8-bit PWM duty for the breathing LED
//! - [`ChargeLine`]: 12V/5V supply selector towards the watch
//! - [`WatchUart`]: Byte-wise, non-blocking UART to the watch
//! - [`BlockingDelay`]: Busy-wait millisecond delays
//! - [`Watchdog`]: Hardware watchdog feed
//!
//! [`Board`] bundles one implementation of each so the main loop takes a
//! single type parameter.

pub mod hardware;
pub mod host;

pub use hardware::*;
pub use host::*;
