//! Main loop.
//!
//! [`BaseStation`] owns the board peripherals and the shared
//! [`DeviceContext`], and runs one cooperative pass at a time:
//!
//! 1. Drain bytes the UART has received (polled targets)
//! 2. If the timer signaled, advance the charge/LED cycle
//! 3. Run one pass of the button decoder
//! 4. Mirror LED duty and charge level to hardware
//! 5. Feed the hardware watchdog
//!
//! Host reports are served separately through [`BaseStation::serve_host`],
//! as the HID stack delivers them.
//!
//! # Example
//!
//! ```rust
//! use cst_base::{BaseStation, CycleState, StationConfig};
//! use cst_base::hal::{MockBoard, SimClock};
//!
//! let clock = SimClock::new();
//! let mut station = BaseStation::new(MockBoard::parts(&clock), StationConfig::default());
//! station.boot().unwrap();
//!
//! station.parts_mut().uart.inject(b'H');
//! station.run_once().unwrap();
//! assert_eq!(station.state().cycle, CycleState::Breathing);
//! assert_eq!(station.parts().led.duty, 0xFF);
//! ```

use crate::charge::{ChargeOutputs, CycleState};
use crate::config::StationConfig;
use crate::context::DeviceContext;
use crate::error::StationError;
use crate::gesture::{ButtonDecoder, Emitted};
use crate::interrupt::Interrupt;
use crate::protocol::{WatchCommand, WatchReply};
use crate::report::Report;
use crate::router::CommandRouter;
use crate::traits::{BlockingDelay, Board, ChargeLevel, HostLink, Watchdog};
use crate::transport::WatchLink;

/// Boot blink: number of LED toggles.
const BOOT_BLINKS: u8 = 10;

/// Boot blink: time per toggle.
const BOOT_BLINK_MS: u32 = 200;

/// One implementation of every peripheral on a board.
pub struct BoardParts<B: Board> {
    /// Button input
    pub buttons: B::Buttons,
    /// LED PWM
    pub led: B::Led,
    /// Charge line output
    pub charge_line: B::ChargeLine,
    /// Watch UART
    pub uart: B::Uart,
    /// Blocking delay
    pub delay: B::Delay,
    /// Hardware watchdog
    pub watchdog: B::Watchdog,
}

/// Borrowed view of the peripherals owned by a station.
pub struct PartsRef<'a, B: Board> {
    /// Button input
    pub buttons: &'a B::Buttons,
    /// LED PWM
    pub led: &'a B::Led,
    /// Charge line output
    pub charge_line: &'a B::ChargeLine,
    /// Watch UART
    pub uart: &'a B::Uart,
    /// Blocking delay
    pub delay: &'a B::Delay,
    /// Hardware watchdog
    pub watchdog: &'a B::Watchdog,
}

/// Mutable view of the peripherals owned by a station.
pub struct PartsMut<'a, B: Board> {
    /// Button input
    pub buttons: &'a mut B::Buttons,
    /// LED PWM
    pub led: &'a mut B::Led,
    /// Charge line output
    pub charge_line: &'a mut B::ChargeLine,
    /// Watch UART
    pub uart: &'a mut B::Uart,
    /// Blocking delay
    pub delay: &'a mut B::Delay,
    /// Hardware watchdog
    pub watchdog: &'a mut B::Watchdog,
}

/// Snapshot of the station for logging and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StationState {
    /// Charge/LED cycle state
    pub cycle: CycleState,
    /// LED duty register
    pub duty: u8,
    /// Logical charge line level
    pub charge_level: ChargeLevel,
    /// Watch reported a charged battery
    pub battery_charged: bool,
    /// Ticks into the measurement schedule
    pub overflow_tick: u16,
    /// Ticks since the last watch traffic
    pub timeout_ticks: u16,
    /// Last byte received from the watch
    pub last_received: u8,
}

impl From<&DeviceContext> for StationState {
    fn from(ctx: &DeviceContext) -> Self {
        Self {
            cycle: ctx.cycle_state(),
            duty: ctx.duty(),
            charge_level: ctx.charge_level(),
            battery_charged: ctx.battery_charged(),
            overflow_tick: ctx.charge().overflow_tick(),
            timeout_ticks: ctx.timeout().count(),
            last_received: ctx.last_received(),
        }
    }
}

/// The base station: context, peripherals and the main loop.
pub struct BaseStation<B: Board> {
    ctx: DeviceContext,
    link: WatchLink<B::Uart>,
    outputs: ChargeOutputs<B::Led, B::ChargeLine>,
    buttons: B::Buttons,
    delay: B::Delay,
    watchdog: B::Watchdog,
    decoder: ButtonDecoder,
    router: CommandRouter,
    config: StationConfig,
}

impl<B: Board> BaseStation<B> {
    /// Assembles a station. An invalid configuration is logged, not
    /// rejected; call [`StationConfig::validate`] first to refuse it.
    pub fn new(parts: BoardParts<B>, config: StationConfig) -> Self {
        if let Err(e) = config.validate() {
            log::warn!("station config: {}", e);
        }
        let BoardParts {
            buttons,
            led,
            charge_line,
            uart,
            delay,
            watchdog,
        } = parts;
        Self {
            ctx: DeviceContext::new(&config.charge),
            link: WatchLink::new(uart, config.uart.baud),
            outputs: ChargeOutputs::new(led, charge_line),
            buttons,
            delay,
            watchdog,
            decoder: ButtonDecoder::new(config.buttons.clone()),
            router: CommandRouter::new(config.firmware.clone()),
            config,
        }
    }

    /// Power-up sequence: blink the LED, then put every output in its
    /// power-up state (LED off, line at 12V).
    pub fn boot(&mut self) -> Result<(), StationError> {
        log::info!(
            "{} v{}.{} booting, watch uart at {} baud",
            self.config.firmware.name,
            self.config.firmware.version_major as char,
            self.config.firmware.version_minor as char,
            self.link.baud()
        );
        for blink in 0..BOOT_BLINKS {
            let duty = if blink % 2 == 0 { 0xFF } else { 0x00 };
            self.outputs.force_duty(duty)?;
            self.delay.delay_ms(BOOT_BLINK_MS);
        }
        self.outputs.sync(&self.ctx)?;
        self.watchdog.feed();
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Interrupt entry points
    // ------------------------------------------------------------------------

    /// Timer overflow interrupt.
    pub fn timer_overflow(&self) {
        self.ctx.on_timer_overflow();
    }

    /// UART receive interrupt. Pin changes are mirrored on the next pass.
    pub fn uart_receive(&mut self, byte: u8) -> WatchReply {
        self.ctx.on_uart_receive(byte)
    }

    /// Services any interrupt source.
    pub fn interrupt(&mut self, irq: Interrupt) -> Option<WatchReply> {
        irq.dispatch(&mut self.ctx)
    }

    // ------------------------------------------------------------------------
    // Main loop
    // ------------------------------------------------------------------------

    /// Runs one main-loop pass.
    ///
    /// Every stage runs even if an earlier one failed, and the watchdog is
    /// always fed; the first error is returned for logging.
    pub fn run_once(&mut self) -> Result<Emitted, StationError> {
        let mut first_err: Option<StationError> = None;
        let mut note = |result: Result<(), StationError>| {
            if let Err(e) = result {
                first_err.get_or_insert(e);
            }
        };

        while let Some(reply) = self.link.poll_receive(&mut self.ctx) {
            log::debug!("watch -> {:?}", reply);
        }
        note(self.outputs.sync(&self.ctx));

        if self.ctx.take_tick() {
            let link = &mut self.link;
            let outcome = self
                .ctx
                .advance(|| link.transmit(WatchCommand::VoltageCheck.as_byte()));
            match outcome {
                Ok(outcome) => {
                    if outcome.request_voltage_check {
                        log::debug!("measurement window open, line at 5V");
                    }
                    if outcome.measurement_closed {
                        log::debug!("measurement window closed, line at 12V");
                    }
                }
                Err(e) => note(Err(e)),
            }
            note(self.outputs.sync(&self.ctx));
        }

        let emitted = match self.decoder.poll(
            &self.buttons,
            &mut self.delay,
            &mut self.link,
            &mut self.ctx,
            &mut self.outputs,
        ) {
            Ok(emitted) => emitted,
            Err(e) => {
                note(Err(e));
                Emitted::new()
            }
        };
        note(self.outputs.sync(&self.ctx));

        self.watchdog.feed();

        match first_err {
            Some(e) => Err(e),
            None => Ok(emitted),
        }
    }

    // ------------------------------------------------------------------------
    // Host
    // ------------------------------------------------------------------------

    /// Handles one host request and returns the response.
    pub fn handle_report(&mut self, request: &Report) -> Result<Report, StationError> {
        self.router
            .handle(request, &mut self.ctx, &mut self.link, &self.buttons)
            .copied()
    }

    /// Serves at most one pending host request.
    ///
    /// The response is published even when forwarding to the watch failed;
    /// it then holds the echo. Returns whether a request was served.
    pub fn serve_host<H: HostLink>(&mut self, host: &mut H) -> Result<bool, StationError> {
        let Some(request) = host.take_request() else {
            return Ok(false);
        };
        let handled = self.handle_report(&request);
        if let Err(e) = host.publish_response(self.router.response()) {
            log::warn!("host response dropped: {:?}", e);
        }
        handled.map(|_| true)
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Current state snapshot.
    pub fn state(&self) -> StationState {
        StationState::from(&self.ctx)
    }

    /// The shared device context.
    pub fn context(&self) -> &DeviceContext {
        &self.ctx
    }

    /// Mutable access to the shared device context.
    pub fn context_mut(&mut self) -> &mut DeviceContext {
        &mut self.ctx
    }

    /// The button decoder.
    pub fn decoder(&self) -> &ButtonDecoder {
        &self.decoder
    }

    /// The host command router.
    pub fn router(&self) -> &CommandRouter {
        &self.router
    }

    /// The configuration the station was built with.
    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Borrows the peripherals.
    pub fn parts(&self) -> PartsRef<'_, B> {
        PartsRef {
            buttons: &self.buttons,
            led: self.outputs.led(),
            charge_line: self.outputs.line(),
            uart: self.link.uart(),
            delay: &self.delay,
            watchdog: &self.watchdog,
        }
    }

    /// Mutably borrows the peripherals.
    pub fn parts_mut(&mut self) -> PartsMut<'_, B> {
        let (led, charge_line) = self.outputs.parts_mut();
        PartsMut {
            buttons: &mut self.buttons,
            led,
            charge_line,
            uart: self.link.uart_mut(),
            delay: &mut self.delay,
            watchdog: &mut self.watchdog,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockBoard, MockHostLink, SimClock};
    use crate::traits::ButtonSample;

    fn station() -> (SimClock, BaseStation<MockBoard>) {
        let clock = SimClock::new();
        let station = BaseStation::new(MockBoard::parts(&clock), StationConfig::default());
        (clock, station)
    }

    // =========================================================================
    // Boot Tests
    // =========================================================================

    #[test]
    fn boot_blinks_then_turns_led_off() {
        let (clock, mut station) = station();
        station.boot().unwrap();

        let history = &station.parts().led.history;
        assert_eq!(history.len(), 10);
        assert_eq!(history[0], 0xFF);
        assert_eq!(history[1], 0x00);
        // Context duty is already 0, so the final sync writes nothing
        assert_eq!(*history.last().unwrap(), 0x00);
        assert_eq!(station.parts().charge_line.level, ChargeLevel::TwelveVolt);
        assert_eq!(clock.now_ms(), 2000);
    }

    // =========================================================================
    // Main Loop Tests
    // =========================================================================

    #[test]
    fn idle_pass_feeds_watchdog() {
        let (_, mut station) = station();
        assert!(station.run_once().unwrap().is_empty());
        assert_eq!(station.parts().watchdog.feeds, 1);
    }

    #[test]
    fn tick_without_handshake_does_nothing() {
        let (_, mut station) = station();
        station.timer_overflow();
        station.run_once().unwrap();
        assert_eq!(station.state().cycle, CycleState::Disabled);
        assert_eq!(station.state().overflow_tick, 0);
    }

    #[test]
    fn handshake_mirrors_to_led() {
        let (_, mut station) = station();
        station.uart_receive(b'H');
        station.run_once().unwrap();
        assert_eq!(station.parts().led.duty, 0xFF);

        station.timer_overflow();
        station.run_once().unwrap();
        assert_eq!(station.parts().led.duty, 0xFE);
    }

    #[test]
    fn ticks_coalesce_per_pass() {
        let (_, mut station) = station();
        station.uart_receive(b'H');
        station.timer_overflow();
        station.timer_overflow();
        station.timer_overflow();
        station.run_once().unwrap();
        assert_eq!(station.state().overflow_tick, 1);
    }

    #[test]
    fn polled_receive_is_dispatched() {
        let (_, mut station) = station();
        station.parts_mut().uart.inject(b'H');
        station.parts_mut().uart.inject(b'B');
        station.run_once().unwrap();
        let state = station.state();
        assert_eq!(state.cycle, CycleState::Charged);
        assert_eq!(state.duty, 0x44);
        assert_eq!(state.last_received, b'B');
    }

    #[test]
    fn uart_failure_still_feeds_watchdog() {
        let (_, mut station) = station();
        station.parts_mut().uart.fail = true;
        station.parts_mut().buttons.set(ButtonSample::plus_only());
        assert_eq!(station.run_once(), Err(StationError::Uart));
        assert_eq!(station.parts().watchdog.feeds, 1);
    }

    #[test]
    fn interrupt_entry_point() {
        let (_, mut station) = station();
        assert_eq!(
            station.interrupt(Interrupt::UartReceive(b'H')),
            Some(WatchReply::Hello)
        );
        assert_eq!(station.interrupt(Interrupt::TimerOverflow), None);
        assert!(station.context().overflow_flag().test());
    }

    // =========================================================================
    // Host Tests
    // =========================================================================

    #[test]
    fn serve_host_publishes_response() {
        let (_, mut station) = station();
        let mut host = MockHostLink::new();
        assert!(!station.serve_host(&mut host).unwrap());

        host.push_request(Report::version());
        assert!(station.serve_host(&mut host).unwrap());
        assert_eq!(host.last_response().unwrap().version_number(), Some(100));
    }

    #[test]
    fn serve_host_publishes_echo_on_failure() {
        let (_, mut station) = station();
        station.parts_mut().uart.fail = true;
        let mut host = MockHostLink::new();
        let request = Report::send_bytes(b"u").unwrap();
        host.push_request(request);

        assert_eq!(station.serve_host(&mut host), Err(StationError::Uart));
        assert_eq!(host.responses, vec![request]);
    }
}
