//! Host-side 8-byte HID feature report.
//!
//! ```text
//! byte:  0          1     2 .. 7
//!        report id  tag   payload
//! ```
//!
//! The station copies every request into its response buffer before
//! filling in command-specific bytes, so the host can always match a
//! response to its request.
//!
//! # Tags
//!
//! | Tag | Request payload | Response |
//! |-----|-----------------|----------|
//! | `T` | hour, minute, second | echo |
//! | `S` | count, bytes... | echo |
//! | `R` | - | byte 3 = last byte from the watch |
//! | `b` | - | byte 3 = button port |
//! | `v` | - | bytes 3, 4 = version characters |
//!
//! The request builders and response decoders mirror what the host tools
//! do with the same format.

use heapless::Vec;

/// Default HID report id.
pub const REPORT_ID: u8 = 0x01;

/// Length of a report.
pub const REPORT_LEN: usize = 8;

/// Maximum relay payload: bytes 3..8 of the report.
pub const MAX_RELAY: usize = REPORT_LEN - 3;

/// One fixed-size HID report.
///
/// # Examples
///
/// ```
/// use cst_base::Report;
///
/// let request = Report::set_time(14, 30, 0);
/// assert_eq!(request.as_bytes(), &[1, b'T', 14, 30, 0, 0, 0, 0]);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Report([u8; REPORT_LEN]);

impl Report {
    /// Wraps raw report bytes.
    pub const fn from_bytes(bytes: [u8; REPORT_LEN]) -> Self {
        Self(bytes)
    }

    /// Builds an otherwise empty request with the default report id.
    pub const fn request(tag: u8) -> Self {
        let mut bytes = [0; REPORT_LEN];
        bytes[0] = REPORT_ID;
        bytes[1] = tag;
        Self(bytes)
    }

    /// Raw bytes.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; REPORT_LEN] {
        &self.0
    }

    /// Byte 0.
    #[inline]
    pub fn report_id(&self) -> u8 {
        self.0[0]
    }

    /// Byte 1.
    #[inline]
    pub fn tag(&self) -> u8 {
        self.0[1]
    }

    /// Byte at `index`, 0 if out of range.
    #[inline]
    pub fn byte(&self, index: usize) -> u8 {
        self.0.get(index).copied().unwrap_or(0)
    }

    /// Sets the byte at `index`; out of range writes are ignored.
    #[inline]
    pub fn set_byte(&mut self, index: usize, value: u8) {
        if let Some(slot) = self.0.get_mut(index) {
            *slot = value;
        }
    }

    // ------------------------------------------------------------------------
    // Request builders
    // ------------------------------------------------------------------------

    /// `T` request: set the watch time.
    pub fn set_time(hour: u8, minute: u8, second: u8) -> Self {
        let mut report = Self::request(b'T');
        report.0[2] = hour;
        report.0[3] = minute;
        report.0[4] = second;
        report
    }

    /// `S` request: relay raw bytes to the watch.
    ///
    /// Returns `None` if `bytes` does not fit in one report.
    pub fn send_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() > MAX_RELAY {
            return None;
        }
        let mut report = Self::request(b'S');
        report.0[2] = bytes.len() as u8;
        report.0[3..3 + bytes.len()].copy_from_slice(bytes);
        Some(report)
    }

    /// `R` request: read the last byte received from the watch.
    pub fn read_byte() -> Self {
        Self::request(b'R')
    }

    /// `b` request: read the button port.
    pub fn buttons() -> Self {
        Self::request(b'b')
    }

    /// `v` request: read the firmware version.
    pub fn version() -> Self {
        Self::request(b'v')
    }

    // ------------------------------------------------------------------------
    // Response decoders
    // ------------------------------------------------------------------------

    /// Version number from a `v` response, major * 100 + minor.
    ///
    /// Returns `None` unless both version bytes are ASCII digits.
    ///
    /// ```
    /// use cst_base::Report;
    ///
    /// let response = Report::from_bytes([1, b'v', 0, b'1', b'0', 0, 0, 0]);
    /// assert_eq!(response.version_number(), Some(100));
    /// ```
    pub fn version_number(&self) -> Option<u16> {
        let (major, minor) = (self.0[3], self.0[4]);
        if !major.is_ascii_digit() || !minor.is_ascii_digit() {
            return None;
        }
        Some(u16::from(major - b'0') * 100 + u16::from(minor - b'0'))
    }

    /// Button bits from a `b` response: bit 0 minus, bit 1 mode, bit 2
    /// plus; 1 = released.
    pub fn button_bits(&self) -> u8 {
        self.0[3] >> 3
    }

    /// Watch byte from an `R` response.
    pub fn received_byte(&self) -> u8 {
        self.0[3]
    }
}

impl From<[u8; REPORT_LEN]> for Report {
    fn from(bytes: [u8; REPORT_LEN]) -> Self {
        Self(bytes)
    }
}

/// A decoded host request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostCommand {
    /// `T`: set the watch time (seconds are not sent to the watch)
    SetTime {
        /// Hour, 0..=23
        hour: u8,
        /// Minute, 0..=59
        minute: u8,
    },
    /// `S`: relay raw bytes to the watch
    Relay(Vec<u8, MAX_RELAY>),
    /// `R`: report the last byte received from the watch
    ReadByte,
    /// `b`: report the button port
    Buttons,
    /// `v`: report the firmware version
    Version,
    /// Anything else: echo only
    Unknown(u8),
}

impl HostCommand {
    /// Decodes a request.
    ///
    /// A relay count larger than the report can carry is clamped to the
    /// payload that is actually present.
    pub fn parse(report: &Report) -> Self {
        let bytes = report.as_bytes();
        match report.tag() {
            b'T' => HostCommand::SetTime {
                hour: bytes[2],
                minute: bytes[3],
            },
            b'S' => {
                let count = usize::from(bytes[2]).min(MAX_RELAY);
                let mut payload = Vec::new();
                // count <= MAX_RELAY, so this always fits
                let _ = payload.extend_from_slice(&bytes[3..3 + count]);
                HostCommand::Relay(payload)
            }
            b'R' => HostCommand::ReadByte,
            b'b' => HostCommand::Buttons,
            b'v' => HostCommand::Version,
            other => HostCommand::Unknown(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Builder Tests
    // =========================================================================

    #[test]
    fn simple_requests() {
        assert_eq!(Report::read_byte().as_bytes(), &[1, b'R', 0, 0, 0, 0, 0, 0]);
        assert_eq!(Report::buttons().tag(), b'b');
        assert_eq!(Report::version().report_id(), REPORT_ID);
    }

    #[test]
    fn send_bytes_layout() {
        let report = Report::send_bytes(b"uuD").unwrap();
        assert_eq!(report.as_bytes(), &[1, b'S', 3, b'u', b'u', b'D', 0, 0]);
    }

    #[test]
    fn send_bytes_rejects_oversize() {
        assert!(Report::send_bytes(b"12345").is_some());
        assert!(Report::send_bytes(b"123456").is_none());
    }

    #[test]
    fn byte_access_out_of_range() {
        let mut report = Report::default();
        report.set_byte(9, 1);
        assert_eq!(report.byte(9), 0);
        report.set_byte(7, 0xAA);
        assert_eq!(report.byte(7), 0xAA);
    }

    // =========================================================================
    // Decoder Tests
    // =========================================================================

    #[test]
    fn version_number_rejects_non_digits() {
        let response = Report::from_bytes([1, b'v', 0, 0, 0, 0, 0, 0]);
        assert_eq!(response.version_number(), None);
        let response = Report::from_bytes([1, b'v', 0, b'2', b'7', 0, 0, 0]);
        assert_eq!(response.version_number(), Some(207));
    }

    #[test]
    fn button_bits_shift() {
        let response = Report::from_bytes([1, b'b', 0, 0b0011_1000, 0, 0, 0, 0]);
        assert_eq!(response.button_bits(), 0b111);
    }

    // =========================================================================
    // HostCommand Tests
    // =========================================================================

    #[test]
    fn parse_set_time() {
        assert_eq!(
            HostCommand::parse(&Report::set_time(14, 30, 59)),
            HostCommand::SetTime {
                hour: 14,
                minute: 30
            }
        );
    }

    #[test]
    fn parse_relay() {
        let report = Report::send_bytes(b"ab").unwrap();
        match HostCommand::parse(&report) {
            HostCommand::Relay(bytes) => assert_eq!(bytes.as_slice(), b"ab"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parse_relay_clamps_count() {
        let report = Report::from_bytes([1, b'S', 6, 1, 2, 3, 4, 5]);
        match HostCommand::parse(&report) {
            HostCommand::Relay(bytes) => assert_eq!(bytes.as_slice(), &[1, 2, 3, 4, 5]),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parse_zero_length_relay() {
        let report = Report::from_bytes([1, b'S', 0, 9, 9, 9, 9, 9]);
        assert_eq!(HostCommand::parse(&report), HostCommand::Relay(Vec::new()));
    }

    #[test]
    fn parse_superseded_tags_as_unknown() {
        for tag in [b'c', b'n', b'r', b'p', b'P', b'W', b'D'] {
            assert_eq!(
                HostCommand::parse(&Report::request(tag)),
                HostCommand::Unknown(tag)
            );
        }
    }
}
