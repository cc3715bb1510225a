//! Host link seam.
//!
//! The USB HID stack (descriptors, enumeration, endpoint handling) lives
//! outside this crate. It talks to the firmware core through one feature
//! report at a time: the host writes a request, the station handles it, and
//! the host reads back the response buffer.
//!
//! ```text
//! host ──SET_REPORT──▶ take_request() ──▶ CommandRouter ──▶ publish_response() ──GET_REPORT──▶ host
//! ```

use crate::report::Report;

/// Transport carrying 8-byte reports between the host and the station.
///
/// This trait uses a **polling design**: the main loop asks for the next
/// pending request instead of being called back from the USB stack, so
/// request handling never runs in interrupt context.
///
/// # Example
///
/// ```rust
/// use cst_base::{HostLink, Report};
/// use cst_base::hal::MockHostLink;
///
/// let mut host = MockHostLink::new();
/// host.push_request(Report::version());
///
/// let request = host.take_request().unwrap();
/// host.publish_response(&request).unwrap();
/// assert_eq!(host.responses.len(), 1);
/// ```
pub trait HostLink {
    /// Error type for transport operations.
    type Error: core::fmt::Debug;

    /// Returns the next request written by the host, if any (non-blocking).
    ///
    /// At most one request is in flight; a new request replaces an
    /// unanswered one.
    fn take_request(&mut self) -> Option<Report>;

    /// Makes a response available for the host to read.
    fn publish_response(&mut self, response: &Report) -> Result<(), Self::Error>;
}
