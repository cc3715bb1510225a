//! Watch-side wire protocol.
//!
//! The link is half-duplex at 2048 baud, 8N1. The station sends single
//! ASCII command bytes and `F HH:MM` time strings; the watch answers with
//! single bytes.
//!
//! # Commands (station → watch)
//!
//! | Byte | Meaning |
//! |------|---------|
//! | `u` / `d` | One step forward / back |
//! | `U` / `D` | Ten steps forward / back |
//! | `P` / `W` | One hour forward / back |
//! | `a` / `z` | Two extra steps forward / back |
//! | `b` / `y` | Three extra steps forward / back |
//! | `M` | Toggle 12/24 hour display |
//! | `S` | Swap display colors |
//! | `X` | Diagnostic mode |
//! | `T` | Measure battery now |
//!
//! # Replies (watch → station)
//!
//! | Byte | Meaning |
//! |------|---------|
//! | `H` | Watch present |
//! | `B` | Battery charged |
//! | `N` | Battery not charged |

use core::fmt::Write;
use heapless::String;

/// Single-byte command sent to the watch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WatchCommand {
    /// `u`: one step forward
    StepUp,
    /// `U`: ten steps forward
    TenUp,
    /// `P`: one hour forward
    HourUp,
    /// `a`: two extra steps forward
    DoubleUp,
    /// `b`: three extra steps forward
    TripleUp,
    /// `d`: one step back
    StepDown,
    /// `D`: ten steps back
    TenDown,
    /// `W`: one hour back
    HourDown,
    /// `z`: two extra steps back
    DoubleDown,
    /// `y`: three extra steps back
    TripleDown,
    /// `M`: toggle 12/24 hour display
    ToggleMode,
    /// `S`: swap display colors
    SwapColors,
    /// `X`: diagnostic mode
    Diagnostic,
    /// `T`: measure battery
    VoltageCheck,
}

impl WatchCommand {
    /// Wire byte for this command.
    pub const fn as_byte(&self) -> u8 {
        match self {
            Self::StepUp => b'u',
            Self::TenUp => b'U',
            Self::HourUp => b'P',
            Self::DoubleUp => b'a',
            Self::TripleUp => b'b',
            Self::StepDown => b'd',
            Self::TenDown => b'D',
            Self::HourDown => b'W',
            Self::DoubleDown => b'z',
            Self::TripleDown => b'y',
            Self::ToggleMode => b'M',
            Self::SwapColors => b'S',
            Self::Diagnostic => b'X',
            Self::VoltageCheck => b'T',
        }
    }

    /// Parses a wire byte.
    pub const fn from_byte(byte: u8) -> Option<Self> {
        Some(match byte {
            b'u' => Self::StepUp,
            b'U' => Self::TenUp,
            b'P' => Self::HourUp,
            b'a' => Self::DoubleUp,
            b'b' => Self::TripleUp,
            b'd' => Self::StepDown,
            b'D' => Self::TenDown,
            b'W' => Self::HourDown,
            b'z' => Self::DoubleDown,
            b'y' => Self::TripleDown,
            b'M' => Self::ToggleMode,
            b'S' => Self::SwapColors,
            b'X' => Self::Diagnostic,
            b'T' => Self::VoltageCheck,
            _ => return None,
        })
    }

    /// Follow-up command for presses counted in the extra-press window.
    ///
    /// Returns `None` when no extra press was seen.
    ///
    /// ```
    /// use cst_base::WatchCommand;
    ///
    /// assert_eq!(WatchCommand::extra_presses(true, 0), None);
    /// assert_eq!(WatchCommand::extra_presses(true, 1), Some(WatchCommand::StepUp));
    /// assert_eq!(WatchCommand::extra_presses(false, 2), Some(WatchCommand::DoubleDown));
    /// assert_eq!(WatchCommand::extra_presses(false, 7), Some(WatchCommand::TripleDown));
    /// ```
    pub const fn extra_presses(up: bool, presses: u8) -> Option<Self> {
        match (up, presses) {
            (_, 0) => None,
            (true, 1) => Some(Self::StepUp),
            (true, 2) => Some(Self::DoubleUp),
            (true, _) => Some(Self::TripleUp),
            (false, 1) => Some(Self::StepDown),
            (false, 2) => Some(Self::DoubleDown),
            (false, _) => Some(Self::TripleDown),
        }
    }
}

/// Byte received from the watch, classified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WatchReply {
    /// `H`: watch present
    Hello,
    /// `B`: battery charged
    BatteryCharged,
    /// `N`: battery not charged
    NotCharged,
    /// Anything else: latched only
    Other(u8),
}

impl From<u8> for WatchReply {
    fn from(byte: u8) -> Self {
        match byte {
            b'H' => Self::Hello,
            b'B' => Self::BatteryCharged,
            b'N' => Self::NotCharged,
            other => Self::Other(other),
        }
    }
}

/// Time-set string, `F` + two-digit hour + `:` + two-digit minute.
///
/// # Examples
///
/// ```
/// use cst_base::TimeCode;
///
/// let code = TimeCode::new(14, 30).unwrap();
/// assert_eq!(code.as_bytes(), b"F14:30");
///
/// assert!(TimeCode::new(24, 0).is_none());
/// assert!(TimeCode::new(7, 60).is_none());
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimeCode {
    text: String<6>,
}

impl TimeCode {
    /// Wire length of a time code.
    pub const LEN: usize = 6;

    /// Formats a time code. Returns `None` for hours above 23 or minutes
    /// above 59.
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour > 23 || minute > 59 {
            return None;
        }
        let mut text = String::new();
        write!(text, "F{:02}:{:02}", hour, minute).ok()?;
        Some(Self { text })
    }

    /// Bytes to put on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    /// Text form.
    pub fn as_str(&self) -> &str {
        self.text.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [WatchCommand; 14] = [
        WatchCommand::StepUp,
        WatchCommand::TenUp,
        WatchCommand::HourUp,
        WatchCommand::DoubleUp,
        WatchCommand::TripleUp,
        WatchCommand::StepDown,
        WatchCommand::TenDown,
        WatchCommand::HourDown,
        WatchCommand::DoubleDown,
        WatchCommand::TripleDown,
        WatchCommand::ToggleMode,
        WatchCommand::SwapColors,
        WatchCommand::Diagnostic,
        WatchCommand::VoltageCheck,
    ];

    // =========================================================================
    // WatchCommand Tests
    // =========================================================================

    #[test]
    fn command_bytes_are_unique() {
        for (i, a) in ALL.iter().enumerate() {
            for b in &ALL[i + 1..] {
                assert_ne!(a.as_byte(), b.as_byte(), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn from_byte_inverts_as_byte() {
        for cmd in ALL {
            assert_eq!(WatchCommand::from_byte(cmd.as_byte()), Some(cmd));
        }
        assert_eq!(WatchCommand::from_byte(b'H'), None);
    }

    #[test]
    fn extra_press_mapping_mirrors() {
        assert_eq!(
            WatchCommand::extra_presses(true, 3),
            Some(WatchCommand::TripleUp)
        );
        assert_eq!(
            WatchCommand::extra_presses(false, 1),
            Some(WatchCommand::StepDown)
        );
        assert_eq!(WatchCommand::extra_presses(false, 0), None);
    }

    // =========================================================================
    // WatchReply Tests
    // =========================================================================

    #[test]
    fn reply_classification() {
        assert_eq!(WatchReply::from(b'H'), WatchReply::Hello);
        assert_eq!(WatchReply::from(b'B'), WatchReply::BatteryCharged);
        assert_eq!(WatchReply::from(b'N'), WatchReply::NotCharged);
        assert_eq!(WatchReply::from(0x00), WatchReply::Other(0x00));
        assert_eq!(WatchReply::from(b'h'), WatchReply::Other(b'h'));
    }

    // =========================================================================
    // TimeCode Tests
    // =========================================================================

    #[test]
    fn time_code_pads_single_digits() {
        let code = TimeCode::new(7, 5).unwrap();
        assert_eq!(code.as_str(), "F07:05");
        assert_eq!(code.as_bytes().len(), TimeCode::LEN);
    }

    #[test]
    fn time_code_bounds() {
        assert!(TimeCode::new(0, 0).is_some());
        assert!(TimeCode::new(23, 59).is_some());
        assert!(TimeCode::new(255, 0).is_none());
        assert!(TimeCode::new(0, 255).is_none());
    }
}
