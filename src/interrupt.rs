//! Single shared interrupt vector.
//!
//! The microcontroller routes every interrupt source through one handler,
//! which checks each source's flag in turn. Here the sources are named
//! explicitly and [`Interrupt::dispatch`] plays the role of that handler:
//! board integrations call it from the real vector, tests call it at
//! controlled points.

use crate::context::DeviceContext;
use crate::protocol::WatchReply;

/// A pending interrupt source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interrupt {
    /// The charge timer overflowed
    TimerOverflow,
    /// A byte arrived from the watch
    UartReceive(u8),
}

impl Interrupt {
    /// Services the interrupt with minimal work.
    ///
    /// Returns the classified reply for a receive interrupt. Never blocks,
    /// never transmits, never logs.
    pub fn dispatch(self, ctx: &mut DeviceContext) -> Option<WatchReply> {
        match self {
            Interrupt::TimerOverflow => {
                ctx.on_timer_overflow();
                None
            }
            Interrupt::UartReceive(byte) => Some(ctx.on_uart_receive(byte)),
        }
    }
}
