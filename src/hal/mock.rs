//! Mock implementations for testing without hardware.
//!
//! This module provides test doubles for every peripheral trait and the
//! host link, so the whole station runs deterministically on desktop.
//! Time is simulated: [`MockDelay`] advances a shared [`SimClock`] and
//! [`MockButtons`] answers from a script keyed on that clock.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockButtons`] | [`ButtonInput`] | Time-scripted button levels |
//! | [`MockLed`] | [`LedPwm`] | Records duty writes |
//! | [`MockChargeLine`] | [`ChargeLine`] | Records level transitions |
//! | [`MockUart`] | [`WatchUart`] | Records sent bytes, injectable receive queue |
//! | [`MockDelay`] | [`BlockingDelay`] | Advances the simulated clock |
//! | [`MockWatchdog`] | [`Watchdog`] | Counts feeds |
//! | [`MockHostLink`] | [`HostLink`] | Queued requests, captured responses |
//!
//! # Example
//!
//! ```rust
//! use cst_base::{BaseStation, ButtonSample, StationConfig};
//! use cst_base::hal::{MockBoard, SimClock};
//!
//! let clock = SimClock::new();
//! let mut station = BaseStation::new(MockBoard::parts(&clock), StationConfig::default());
//!
//! // Hold "+" for one pass
//! station.parts_mut().buttons.set(ButtonSample::plus_only());
//! station.run_once().unwrap();
//!
//! assert_eq!(station.parts().uart.sent, b"u".to_vec());
//! assert!(clock.now_ms() >= 510); // extra-press window
//! ```
//!
//! [`ButtonInput`]: crate::traits::ButtonInput
//! [`LedPwm`]: crate::traits::LedPwm
//! [`ChargeLine`]: crate::traits::ChargeLine
//! [`WatchUart`]: crate::traits::WatchUart
//! [`BlockingDelay`]: crate::traits::BlockingDelay
//! [`Watchdog`]: crate::traits::Watchdog
//! [`HostLink`]: crate::traits::HostLink

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::Cell;

use crate::report::Report;
use crate::station::BoardParts;
use crate::traits::{
    BlockingDelay, Board, ButtonInput, ButtonSample, ChargeLevel, ChargeLine, HostLink, LedPwm,
    WatchUart, Watchdog,
};

// ============================================================================
// Simulated Time
// ============================================================================

/// Shared simulated millisecond clock.
///
/// Clones share the same time, so a delay in one mock is visible to all.
///
/// ```rust
/// use cst_base::hal::SimClock;
///
/// let clock = SimClock::new();
/// let view = clock.clone();
/// clock.advance(25);
/// assert_eq!(view.now_ms(), 25);
/// ```
#[derive(Clone, Debug, Default)]
pub struct SimClock(Rc<Cell<u64>>);

impl SimClock {
    /// Creates a clock at t = 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current simulated time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.0.get()
    }

    /// Moves time forward.
    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }

    /// Jumps to an absolute time.
    pub fn set(&self, ms: u64) {
        self.0.set(ms);
    }
}

// ============================================================================
// Hardware Mocks
// ============================================================================

/// Mock buttons driven by the simulated clock.
///
/// Returns the base level unless a scripted segment covers the current
/// time. Segments are half-open `[start, end)`; later segments win.
///
/// # Example
///
/// ```rust
/// use cst_base::hal::{MockButtons, SimClock};
/// use cst_base::traits::{ButtonInput, ButtonSample};
///
/// let clock = SimClock::new();
/// let mut buttons = MockButtons::new(&clock);
/// buttons.hold(10, 20, ButtonSample::mode_only());
///
/// assert!(buttons.sample().is_released());
/// clock.set(15);
/// assert!(buttons.sample().mode);
/// clock.set(20);
/// assert!(buttons.sample().is_released());
/// ```
#[derive(Debug)]
pub struct MockButtons {
    clock: SimClock,
    /// Level outside any scripted segment.
    pub base: ButtonSample,
    /// Scripted segments: start ms, end ms, level.
    pub script: Vec<(u64, u64, ButtonSample)>,
}

impl MockButtons {
    /// Creates released buttons on the given clock.
    pub fn new(clock: &SimClock) -> Self {
        Self {
            clock: clock.clone(),
            base: ButtonSample::RELEASED,
            script: Vec::new(),
        }
    }

    /// Sets the base level.
    pub fn set(&mut self, sample: ButtonSample) {
        self.base = sample;
    }

    /// Holds `sample` during `[start_ms, end_ms)`.
    pub fn hold(&mut self, start_ms: u64, end_ms: u64, sample: ButtonSample) {
        self.script.push((start_ms, end_ms, sample));
    }

    /// Drops all scripted segments.
    pub fn clear_script(&mut self) {
        self.script.clear();
    }
}

impl ButtonInput for MockButtons {
    fn sample(&self) -> ButtonSample {
        let now = self.clock.now_ms();
        self.script
            .iter()
            .rev()
            .find(|(start, end, _)| (*start..*end).contains(&now))
            .map(|(_, _, sample)| *sample)
            .unwrap_or(self.base)
    }
}

/// Mock LED PWM.
///
/// # Example
///
/// ```rust
/// use cst_base::hal::MockLed;
/// use cst_base::traits::LedPwm;
///
/// let mut led = MockLed::new();
/// led.set_duty(10).unwrap();
/// led.set_duty(11).unwrap();
/// assert_eq!(led.duty, 11);
/// assert_eq!(led.history, vec![10, 11]);
/// ```
#[derive(Debug, Default)]
pub struct MockLed {
    /// Current duty.
    pub duty: u8,
    /// Every duty written, in order.
    pub history: Vec<u8>,
    /// If true, writes fail.
    pub fail: bool,
}

impl MockLed {
    /// Creates an LED at duty 0.
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedPwm for MockLed {
    type Error = ();

    fn set_duty(&mut self, duty: u8) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.duty = duty;
        self.history.push(duty);
        Ok(())
    }
}

/// Mock charge line.
#[derive(Debug, Default)]
pub struct MockChargeLine {
    /// Current level.
    pub level: ChargeLevel,
    /// Every level written, in order.
    pub transitions: Vec<ChargeLevel>,
    /// If true, writes fail.
    pub fail: bool,
}

impl MockChargeLine {
    /// Creates a line at 12V.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChargeLine for MockChargeLine {
    type Error = ();

    fn set_level(&mut self, level: ChargeLevel) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.level = level;
        self.transitions.push(level);
        Ok(())
    }
}

/// Mock watch UART.
///
/// Transmit can be made to report "busy" for a number of polls, and to
/// fail outright. Received bytes are queued with [`inject`](Self::inject).
///
/// # Example
///
/// ```rust
/// use cst_base::hal::MockUart;
/// use cst_base::traits::WatchUart;
///
/// let mut uart = MockUart::new();
/// uart.busy_polls = 1;
/// assert!(uart.write(b'u').is_err()); // WouldBlock
/// uart.write(b'u').unwrap();
/// assert_eq!(uart.sent, vec![b'u']);
///
/// uart.inject(b'H');
/// assert_eq!(uart.read().unwrap(), b'H');
/// ```
#[derive(Debug, Default)]
pub struct MockUart {
    /// Every byte sent, in order.
    pub sent: Vec<u8>,
    /// Simulated send time of each byte (0 without a clock).
    pub sent_at: Vec<u64>,
    /// Bytes waiting to be read.
    pub rx: VecDeque<u8>,
    /// Number of upcoming writes that report busy.
    pub busy_polls: u32,
    /// If true, writes fail.
    pub fail: bool,
    clock: Option<SimClock>,
}

impl MockUart {
    /// Creates an idle UART.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamps sent bytes with the given clock.
    pub fn with_clock(mut self, clock: &SimClock) -> Self {
        self.clock = Some(clock.clone());
        self
    }

    /// Queues a byte as if the watch had sent it.
    pub fn inject(&mut self, byte: u8) {
        self.rx.push_back(byte);
    }

    /// Sent bytes as text, for readable assertions.
    pub fn sent_str(&self) -> &str {
        core::str::from_utf8(&self.sent).unwrap_or("<binary>")
    }

    /// Forgets everything sent so far.
    pub fn clear_sent(&mut self) {
        self.sent.clear();
        self.sent_at.clear();
    }
}

impl WatchUart for MockUart {
    type Error = ();

    fn write(&mut self, byte: u8) -> nb::Result<(), ()> {
        if self.fail {
            return Err(nb::Error::Other(()));
        }
        if self.busy_polls > 0 {
            self.busy_polls -= 1;
            return Err(nb::Error::WouldBlock);
        }
        self.sent.push(byte);
        self.sent_at
            .push(self.clock.as_ref().map(SimClock::now_ms).unwrap_or(0));
        Ok(())
    }

    fn read(&mut self) -> nb::Result<u8, ()> {
        self.rx.pop_front().ok_or(nb::Error::WouldBlock)
    }
}

/// Mock delay that advances the simulated clock.
#[derive(Debug)]
pub struct MockDelay {
    clock: SimClock,
    /// Every delay requested, in order.
    pub calls: Vec<u32>,
}

impl MockDelay {
    /// Creates a delay on the given clock.
    pub fn new(clock: &SimClock) -> Self {
        Self {
            clock: clock.clone(),
            calls: Vec::new(),
        }
    }

    /// Sum of all delays requested.
    pub fn total_ms(&self) -> u64 {
        self.calls.iter().map(|&ms| u64::from(ms)).sum()
    }
}

impl BlockingDelay for MockDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.calls.push(ms);
        self.clock.advance(u64::from(ms));
    }
}

/// Mock watchdog.
#[derive(Debug, Default)]
pub struct MockWatchdog {
    /// Number of feeds.
    pub feeds: u32,
}

impl MockWatchdog {
    /// Creates an unfed watchdog.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Watchdog for MockWatchdog {
    fn feed(&mut self) {
        self.feeds += 1;
    }
}

// ============================================================================
// Host Link Mock
// ============================================================================

/// Mock host link.
///
/// Queue requests with [`push_request`](Self::push_request); published
/// responses are collected in `responses`.
#[derive(Debug, Default)]
pub struct MockHostLink {
    /// Requests waiting to be taken.
    pub requests: VecDeque<Report>,
    /// Responses published so far.
    pub responses: Vec<Report>,
    /// If true, publishing fails.
    pub fail: bool,
}

impl MockHostLink {
    /// Creates an idle host link.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a request as if the host had written it.
    pub fn push_request(&mut self, request: Report) {
        self.requests.push_back(request);
    }

    /// Most recent response.
    pub fn last_response(&self) -> Option<&Report> {
        self.responses.last()
    }
}

impl HostLink for MockHostLink {
    type Error = ();

    fn take_request(&mut self) -> Option<Report> {
        self.requests.pop_front()
    }

    fn publish_response(&mut self, response: &Report) -> Result<(), ()> {
        if self.fail {
            return Err(());
        }
        self.responses.push(*response);
        Ok(())
    }
}

// ============================================================================
// Mock Board
// ============================================================================

/// Board made of mocks, all sharing one simulated clock.
#[derive(Debug)]
pub struct MockBoard;

impl Board for MockBoard {
    type Buttons = MockButtons;
    type Led = MockLed;
    type ChargeLine = MockChargeLine;
    type Uart = MockUart;
    type Delay = MockDelay;
    type Watchdog = MockWatchdog;
}

impl MockBoard {
    /// Builds a full set of mock peripherals on `clock`.
    pub fn parts(clock: &SimClock) -> BoardParts<MockBoard> {
        BoardParts {
            buttons: MockButtons::new(clock),
            led: MockLed::new(),
            charge_line: MockChargeLine::new(),
            uart: MockUart::new().with_clock(clock),
            delay: MockDelay::new(clock),
            watchdog: MockWatchdog::new(),
        }
    }
}
