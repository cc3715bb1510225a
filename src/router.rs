//! Host command router.
//!
//! Turns one host request into watch traffic or a status answer. The
//! response buffer always starts as a copy of the request; unknown tags are
//! answered with that echo and nothing else.

use crate::config::FirmwareConfig;
use crate::context::DeviceContext;
use crate::error::StationError;
use crate::protocol::TimeCode;
use crate::report::{HostCommand, Report};
use crate::traits::{ButtonInput, WatchUart};
use crate::transport::WatchLink;

/// Decodes host requests and fills the shared response buffer.
///
/// # Example
///
/// ```rust
/// use cst_base::{CommandRouter, DeviceContext, FirmwareConfig, Report, WatchLink};
/// use cst_base::hal::{MockButtons, MockUart, SimClock};
///
/// let mut router = CommandRouter::new(FirmwareConfig::default());
/// let mut ctx = DeviceContext::default();
/// let mut link = WatchLink::new(MockUart::new(), 2048);
/// let buttons = MockButtons::new(&SimClock::new());
///
/// let response = router
///     .handle(&Report::set_time(14, 30, 0), &mut ctx, &mut link, &buttons)
///     .unwrap();
/// assert_eq!(response, &Report::set_time(14, 30, 0));
/// assert_eq!(link.uart().sent, b"F14:30".to_vec());
/// ```
#[derive(Clone, Debug)]
pub struct CommandRouter {
    firmware: FirmwareConfig,
    response: Report,
}

impl CommandRouter {
    /// Creates a router reporting the given firmware identity.
    pub fn new(firmware: FirmwareConfig) -> Self {
        Self {
            firmware,
            response: Report::default(),
        }
    }

    /// Handles one request and returns the filled response.
    ///
    /// If forwarding to the watch fails the response still holds the echo;
    /// the error is returned so the caller can log it.
    pub fn handle<U, B>(
        &mut self,
        request: &Report,
        ctx: &mut DeviceContext,
        link: &mut WatchLink<U>,
        buttons: &B,
    ) -> Result<&Report, StationError>
    where
        U: WatchUart,
        B: ButtonInput + ?Sized,
    {
        self.response = *request;

        if request.report_id() != self.firmware.report_id {
            log::debug!("report id {:#04x} on request {:?}", request.report_id(), request.tag() as char);
        }

        match HostCommand::parse(request) {
            HostCommand::SetTime { hour, minute } => match TimeCode::new(hour, minute) {
                Some(code) => {
                    log::debug!("host set time {}", code.as_str());
                    link.put_bytes(ctx, code.as_bytes())?;
                }
                None => log::debug!("host time {}:{} out of range, not sent", hour, minute),
            },
            HostCommand::Relay(bytes) => {
                link.put_bytes(ctx, &bytes)?;
            }
            HostCommand::ReadByte => {
                self.response.set_byte(3, ctx.last_received());
            }
            HostCommand::Buttons => {
                self.response.set_byte(3, buttons.port_snapshot());
            }
            HostCommand::Version => {
                self.response.set_byte(3, self.firmware.version_major);
                self.response.set_byte(4, self.firmware.version_minor);
            }
            HostCommand::Unknown(_) => {}
        }

        Ok(&self.response)
    }

    /// The response buffer as last filled.
    pub fn response(&self) -> &Report {
        &self.response
    }

    /// Firmware identity in use.
    pub fn firmware(&self) -> &FirmwareConfig {
        &self.firmware
    }
}
