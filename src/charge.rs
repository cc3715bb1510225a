//! Charge/LED controller.
//!
//! Advanced once per timer overflow from the main loop. While the battery
//! is not yet charged the LED "breathes": its duty ramps by one per tick
//! and bounces off 0x00 and 0xFF, a 510-tick triangle wave.
//!
//! On the same tick counter runs the battery measurement schedule:
//!
//! ```text
//! tick:    0 ........ 1000 ................ 2000
//! line:    12V        5V + send 'T'         12V, counter restarts
//! ```
//!
//! The watch answers the `'T'` with `'B'` or `'N'`, which return the line
//! to 12V early. Independently the communication timeout counts ticks and
//! shuts the whole cycle down when the watch goes quiet.
//!
//! The controller only updates the logical state in [`DeviceContext`];
//! [`ChargeOutputs`] mirrors it onto the PWM and GPIO.

use crate::context::DeviceContext;
use crate::error::StationError;
use crate::traits::{ChargeLevel, ChargeLine, LedPwm};

/// Ramp direction of the breathing LED.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LedDirection {
    /// Duty increasing
    #[default]
    Up,
    /// Duty decreasing
    Down,
}

/// Charge/LED cycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CycleState {
    /// LED ramping, measurement schedule running
    Breathing,
    /// Watch reported a charged battery: LED held dim, schedule running
    Charged,
    /// Watch went quiet: LED off, nothing advances until `'H'`
    Disabled,
}

impl CycleState {
    /// Returns the state as a short string.
    pub const fn as_str(&self) -> &'static str {
        match self {
            CycleState::Breathing => "breathing",
            CycleState::Charged => "charged",
            CycleState::Disabled => "disabled",
        }
    }
}

/// LED and measurement-schedule state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChargeState {
    duty: u8,
    direction: LedDirection,
    pub(crate) battery_charged: bool,
    pub(crate) overflow_tick: u16,
}

impl ChargeState {
    /// Power-up state: LED off, ramping up, battery not charged.
    pub const fn new() -> Self {
        Self {
            duty: 0,
            direction: LedDirection::Up,
            battery_charged: false,
            overflow_tick: 0,
        }
    }

    /// Sets the duty register. Landing on a boundary also points the ramp
    /// back into range.
    pub fn set_duty(&mut self, duty: u8) {
        self.duty = duty;
        match duty {
            0xFF => self.direction = LedDirection::Down,
            0x00 => self.direction = LedDirection::Up,
            _ => {}
        }
    }

    /// Moves the duty one step and flips direction on reaching a boundary.
    pub fn ramp(&mut self) {
        match self.direction {
            LedDirection::Up => {
                self.duty = self.duty.wrapping_add(1);
                if self.duty == 0xFF {
                    self.direction = LedDirection::Down;
                }
            }
            LedDirection::Down => {
                self.duty = self.duty.wrapping_sub(1);
                if self.duty == 0x00 {
                    self.direction = LedDirection::Up;
                }
            }
        }
    }

    /// LED duty register.
    #[inline]
    pub fn duty(&self) -> u8 {
        self.duty
    }

    /// Current ramp direction.
    #[inline]
    pub fn direction(&self) -> LedDirection {
        self.direction
    }

    /// Returns true once the watch reported a charged battery.
    #[inline]
    pub fn battery_charged(&self) -> bool {
        self.battery_charged
    }

    /// Ticks into the current measurement schedule.
    #[inline]
    pub fn overflow_tick(&self) -> u16 {
        self.overflow_tick
    }
}

/// What a single tick advance did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// The line went to 5V and `'T'` was sent
    pub request_voltage_check: bool,
    /// The measurement window closed and the line returned to 12V
    pub measurement_closed: bool,
    /// The communication timeout expired and the cycle shut down
    pub timed_out: bool,
}

impl DeviceContext {
    /// Advances the charge/LED cycle by one timer tick.
    ///
    /// Does nothing while the cycle is disabled. A timeout closes any open
    /// measurement window, leaving the line at 12V. `send_check` transmits the
    /// `'T'` measurement request; it runs after the line has gone to 5V and
    /// before the timeout is counted, so a successful request restarts the
    /// communication window. A failed request is returned after the rest of
    /// the tick has been applied.
    pub fn advance<F>(&mut self, mut send_check: F) -> Result<TickOutcome, StationError>
    where
        F: FnMut() -> Result<(), StationError>,
    {
        let mut outcome = TickOutcome::default();
        if !self.enabled {
            return Ok(outcome);
        }

        if !self.charge.battery_charged {
            self.charge.ramp();
        }

        let mut sent = Ok(());
        self.charge.overflow_tick = self.charge.overflow_tick.wrapping_add(1);
        if self.charge.overflow_tick == self.config.voltage_check_tick {
            self.line = ChargeLevel::FiveVolt;
            outcome.request_voltage_check = true;
            sent = send_check();
            if sent.is_ok() {
                self.note_transmit();
            }
        } else if self.charge.overflow_tick >= self.config.measurement_end_tick {
            self.line = ChargeLevel::TwelveVolt;
            self.charge.overflow_tick = 0;
            outcome.measurement_closed = true;
        }

        self.timeout.increment();
        if self.timeout.is_expired() {
            self.charge.set_duty(0);
            self.line = ChargeLevel::TwelveVolt;
            self.charge.overflow_tick = 0;
            self.enabled = false;
            self.timeout.reset();
            outcome.timed_out = true;
            log::info!("watch silent for {} ticks, charge cycle disabled", self.timeout.threshold());
        }

        sent.map(|()| outcome)
    }
}

/// Mirrors the logical LED duty and charge level onto the hardware.
///
/// Only writes a peripheral when its value changed since the last sync.
#[derive(Debug)]
pub struct ChargeOutputs<L, C> {
    led: L,
    line: C,
    applied_duty: Option<u8>,
    applied_level: Option<ChargeLevel>,
}

impl<L: LedPwm, C: ChargeLine> ChargeOutputs<L, C> {
    /// Wraps the two output peripherals. The first sync writes both.
    pub fn new(led: L, line: C) -> Self {
        Self {
            led,
            line,
            applied_duty: None,
            applied_level: None,
        }
    }

    /// Writes whatever changed in `ctx` since the last call.
    pub fn sync(&mut self, ctx: &DeviceContext) -> Result<(), StationError> {
        let duty = ctx.duty();
        if self.applied_duty != Some(duty) {
            self.led.set_duty(duty).map_err(StationError::led)?;
            self.applied_duty = Some(duty);
        }
        let level = ctx.charge_level();
        if self.applied_level != Some(level) {
            log::debug!("charge line -> {}", level.as_str());
            self.line.set_level(level).map_err(StationError::charge_line)?;
            self.applied_level = Some(level);
        }
        Ok(())
    }

    /// Writes the LED directly, bypassing the context. The next sync
    /// restores the context's duty.
    pub fn force_duty(&mut self, duty: u8) -> Result<(), StationError> {
        self.led.set_duty(duty).map_err(StationError::led)?;
        self.applied_duty = Some(duty);
        Ok(())
    }

    /// The LED peripheral.
    pub fn led(&self) -> &L {
        &self.led
    }

    /// The charge line peripheral.
    pub fn line(&self) -> &C {
        &self.line
    }

    /// Mutable access to the LED peripheral.
    pub fn led_mut(&mut self) -> &mut L {
        &mut self.led
    }

    /// Mutable access to the charge line peripheral.
    pub fn line_mut(&mut self) -> &mut C {
        &mut self.line
    }

    /// Mutable access to both peripherals at once.
    pub fn parts_mut(&mut self) -> (&mut L, &mut C) {
        (&mut self.led, &mut self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChargeConfig;
    use crate::hal::{MockChargeLine, MockLed};

    fn enabled() -> DeviceContext {
        let mut ctx = DeviceContext::default();
        ctx.on_uart_receive(b'H');
        ctx
    }

    fn tick(ctx: &mut DeviceContext) -> TickOutcome {
        ctx.advance(|| Ok(())).unwrap()
    }

    // =========================================================================
    // Ramp Tests
    // =========================================================================

    #[test]
    fn ramp_flips_exactly_at_boundaries() {
        let mut state = ChargeState::new();
        for expected in 1..=255u16 {
            state.ramp();
            assert_eq!(u16::from(state.duty()), expected);
        }
        assert_eq!(state.direction(), LedDirection::Down);
        for expected in (0..255u16).rev() {
            state.ramp();
            assert_eq!(u16::from(state.duty()), expected);
        }
        assert_eq!(state.direction(), LedDirection::Up);
    }

    #[test]
    fn ramp_period_is_510_ticks() {
        let mut state = ChargeState::new();
        state.ramp();
        let start = state;
        for _ in 0..510 {
            state.ramp();
        }
        assert_eq!(state, start);
    }

    #[test]
    fn set_duty_at_boundary_turns_ramp() {
        let mut state = ChargeState::new();
        state.set_duty(0xFF);
        assert_eq!(state.direction(), LedDirection::Down);
        state.ramp();
        assert_eq!(state.duty(), 0xFE);
    }

    // =========================================================================
    // Advance Tests
    // =========================================================================

    #[test]
    fn disabled_cycle_does_not_advance() {
        let mut ctx = DeviceContext::default();
        let outcome = tick(&mut ctx);
        assert_eq!(outcome, TickOutcome::default());
        assert_eq!(ctx.duty(), 0);
        assert_eq!(ctx.charge().overflow_tick(), 0);
        assert_eq!(ctx.timeout().count(), 0);
    }

    #[test]
    fn charged_battery_holds_duty() {
        let mut ctx = enabled();
        ctx.on_uart_receive(b'B');
        for _ in 0..10 {
            tick(&mut ctx);
        }
        assert_eq!(ctx.duty(), 0x44);
        assert_eq!(ctx.charge().overflow_tick(), 10);
    }

    #[test]
    fn measurement_schedule() {
        let config = ChargeConfig::default()
            .with_voltage_check_tick(10)
            .with_measurement_end_tick(20);
        let mut ctx = DeviceContext::new(&config);
        ctx.on_uart_receive(b'H');

        let mut checks = 0;
        for n in 1..=20u16 {
            let outcome = ctx
                .advance(|| {
                    checks += 1;
                    Ok(())
                })
                .unwrap();
            match n {
                10 => {
                    assert!(outcome.request_voltage_check);
                    assert_eq!(ctx.charge_level(), ChargeLevel::FiveVolt);
                    assert_eq!(ctx.timeout().count(), 1);
                }
                20 => {
                    assert!(outcome.measurement_closed);
                    assert_eq!(ctx.charge_level(), ChargeLevel::TwelveVolt);
                    assert_eq!(ctx.charge().overflow_tick(), 0);
                }
                _ => assert!(!outcome.request_voltage_check && !outcome.measurement_closed),
            }
        }
        assert_eq!(checks, 1);
    }

    #[test]
    fn timeout_disables_cycle() {
        let config = ChargeConfig::default().with_comm_timeout_ticks(5);
        let mut ctx = DeviceContext::new(&config);
        ctx.on_uart_receive(b'H');

        for _ in 0..4 {
            assert!(!tick(&mut ctx).timed_out);
        }
        let outcome = tick(&mut ctx);
        assert!(outcome.timed_out);
        assert_eq!(ctx.cycle_state(), CycleState::Disabled);
        assert_eq!(ctx.duty(), 0);

        // Disabled: further ticks change nothing
        tick(&mut ctx);
        assert_eq!(ctx.duty(), 0);

        ctx.on_uart_receive(b'H');
        assert_eq!(ctx.cycle_state(), CycleState::Breathing);
        assert_eq!(ctx.duty(), 0xFF);
    }

    #[test]
    fn timeout_inside_window_returns_to_twelve_volt() {
        let config = ChargeConfig::default()
            .with_voltage_check_tick(2)
            .with_measurement_end_tick(100)
            .with_comm_timeout_ticks(5);
        let mut ctx = DeviceContext::new(&config);
        ctx.on_uart_receive(b'H');

        tick(&mut ctx);
        assert!(tick(&mut ctx).request_voltage_check);
        assert_eq!(ctx.charge_level(), ChargeLevel::FiveVolt);

        for _ in 0..3 {
            assert!(!tick(&mut ctx).timed_out);
        }
        assert!(tick(&mut ctx).timed_out);
        assert_eq!(ctx.cycle_state(), CycleState::Disabled);
        assert_eq!(ctx.charge_level(), ChargeLevel::TwelveVolt);
        assert_eq!(ctx.charge().overflow_tick(), 0);
    }

    #[test]
    fn failed_check_still_completes_tick() {
        let config = ChargeConfig::default()
            .with_voltage_check_tick(1)
            .with_measurement_end_tick(2);
        let mut ctx = DeviceContext::new(&config);
        ctx.on_uart_receive(b'H');

        let result = ctx.advance(|| Err(StationError::Uart));
        assert_eq!(result, Err(StationError::Uart));
        assert_eq!(ctx.charge_level(), ChargeLevel::FiveVolt);
        assert_eq!(ctx.timeout().count(), 1);
        assert_eq!(ctx.charge().overflow_tick(), 1);
    }

    // =========================================================================
    // ChargeOutputs Tests
    // =========================================================================

    #[test]
    fn sync_writes_only_changes() {
        let mut outputs = ChargeOutputs::new(MockLed::new(), MockChargeLine::new());
        let mut ctx = enabled();

        outputs.sync(&ctx).unwrap();
        outputs.sync(&ctx).unwrap();
        assert_eq!(outputs.led().history, vec![0xFF]);
        assert_eq!(outputs.line().transitions, vec![ChargeLevel::TwelveVolt]);

        ctx.set_charge_level(ChargeLevel::FiveVolt);
        outputs.sync(&ctx).unwrap();
        assert_eq!(outputs.led().history.len(), 1);
        assert_eq!(outputs.line().level, ChargeLevel::FiveVolt);
    }

    #[test]
    fn force_duty_is_overwritten_by_sync() {
        let mut outputs = ChargeOutputs::new(MockLed::new(), MockChargeLine::new());
        let ctx = enabled();
        outputs.sync(&ctx).unwrap();
        outputs.force_duty(0).unwrap();
        outputs.sync(&ctx).unwrap();
        assert_eq!(outputs.led().history, vec![0xFF, 0, 0xFF]);
    }

    #[test]
    fn sync_maps_led_error() {
        let mut led = MockLed::new();
        led.fail = true;
        let mut outputs = ChargeOutputs::new(led, MockChargeLine::new());
        assert_eq!(outputs.sync(&enabled()), Err(StationError::Led));
    }
}
