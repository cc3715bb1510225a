//! UART transport to the watch.
//!
//! Transmit spins until the hardware accepts the byte. Every successful
//! transmit counts as watch traffic and restarts the communication timeout.
//! Received bytes normally arrive through the receive interrupt; on targets
//! where the UART is polled, [`WatchLink::poll_receive`] hands them to the
//! same handler.

use crate::context::DeviceContext;
use crate::error::StationError;
use crate::interrupt::Interrupt;
use crate::protocol::{WatchCommand, WatchReply};
use crate::traits::WatchUart;

/// Half-duplex byte link to the watch.
#[derive(Debug)]
pub struct WatchLink<U> {
    uart: U,
    baud: u32,
}

impl<U: WatchUart> WatchLink<U> {
    /// Wraps a UART already configured for `baud`, 8N1.
    pub fn new(uart: U, baud: u32) -> Self {
        Self { uart, baud }
    }

    /// Sends one byte, spinning while the transmitter is busy.
    ///
    /// Does not touch the communication timeout; use
    /// [`put_byte`](Self::put_byte) when a context is at hand.
    pub fn transmit(&mut self, byte: u8) -> Result<(), StationError> {
        nb::block!(self.uart.write(byte)).map_err(StationError::uart)
    }

    /// Sends one byte and records it as watch traffic.
    pub fn put_byte(&mut self, ctx: &mut DeviceContext, byte: u8) -> Result<(), StationError> {
        self.transmit(byte)?;
        ctx.note_transmit();
        Ok(())
    }

    /// Sends a byte string, stopping at the first failure.
    pub fn put_bytes(&mut self, ctx: &mut DeviceContext, bytes: &[u8]) -> Result<(), StationError> {
        bytes.iter().try_for_each(|&b| self.put_byte(ctx, b))
    }

    /// Sends a watch command.
    pub fn send(&mut self, ctx: &mut DeviceContext, command: WatchCommand) -> Result<(), StationError> {
        self.put_byte(ctx, command.as_byte())
    }

    /// Reads one byte if the UART has one and runs it through the receive
    /// handler.
    ///
    /// Receive errors (framing, overrun) drop the byte and are logged.
    pub fn poll_receive(&mut self, ctx: &mut DeviceContext) -> Option<WatchReply> {
        match self.uart.read() {
            Ok(byte) => Interrupt::UartReceive(byte).dispatch(ctx),
            Err(nb::Error::WouldBlock) => None,
            Err(nb::Error::Other(e)) => {
                log::warn!("watch uart receive error: {:?}", e);
                None
            }
        }
    }

    /// Configured baud rate.
    pub fn baud(&self) -> u32 {
        self.baud
    }

    /// The underlying UART.
    pub fn uart(&self) -> &U {
        &self.uart
    }

    /// Mutable access to the underlying UART.
    pub fn uart_mut(&mut self) -> &mut U {
        &mut self.uart
    }
}
