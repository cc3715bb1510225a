//! ESP32-C3 hardware abstraction layer for the watch base station.
//!
//! This module provides hardware implementations of the peripheral traits
//! for an ESP32-C3 board wired in place of the original 8-bit controller.
//!
//! # Hardware Configuration
//!
//! - **MCU**: ESP32-C3 SuperMini (RISC-V 160MHz, 4MB Flash)
//! - **Buttons**: three momentary switches to GND ("+", "-", mode)
//! - **LED**: status LED on an LEDC PWM channel
//! - **Charge line**: push-pull output driving the 12V/5V supply switch
//! - **Watch link**: UART1 at 2048 baud, 8N1
//!
//! # Pin Assignments
//!
//! See the [`pins`] module for GPIO assignments.

mod buttons;
mod charge_line;
mod delay;
mod led;
mod timer;
mod uart;
mod watchdog;

pub use buttons::Esp32Buttons;
pub use charge_line::Esp32ChargeLine;
pub use delay::Esp32Delay;
pub use led::Esp32Led;
pub use timer::Esp32TickTimer;
pub use uart::Esp32Uart;
pub use watchdog::Esp32Watchdog;

use core::marker::PhantomData;

use crate::traits::Board;

/// The ESP32-C3 base station board.
pub struct Esp32Board<'d>(PhantomData<&'d ()>);

impl<'d> Board for Esp32Board<'d> {
    type Buttons = Esp32Buttons<'d>;
    type Led = Esp32Led<'d>;
    type ChargeLine = Esp32ChargeLine<'d>;
    type Uart = Esp32Uart<'d>;
    type Delay = Esp32Delay;
    type Watchdog = Esp32Watchdog;
}

/// Pin assignments for SuperMini ESP32-C3.
pub mod pins {
    // =========================================================================
    // Buttons (active low, internal pull-ups)
    // =========================================================================

    /// "+" button
    pub const BUTTON_PLUS: i32 = 5;

    /// 12/24 hour mode button
    pub const BUTTON_MODE: i32 = 6;

    /// "-" button
    pub const BUTTON_MINUS: i32 = 7;

    // =========================================================================
    // Outputs
    // =========================================================================

    /// Status LED (LEDC PWM)
    pub const LED: i32 = 3;

    /// Charge line select: low = 12V, high = 5V
    pub const CHARGE_LINE: i32 = 4;

    // =========================================================================
    // Watch UART (UART1)
    // =========================================================================

    /// UART TX towards the watch
    pub const UART_TX: i32 = 0;

    /// UART RX from the watch
    pub const UART_RX: i32 = 1;
}
