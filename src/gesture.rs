//! Polled button/gesture decoder.
//!
//! Runs once per main-loop pass. Each gesture branch does at most one
//! iteration per pass and re-samples the buttons first, so no branch ever
//! holds the loop longer than one step plus its delays and the watchdog
//! keeps getting fed.
//!
//! # Gestures
//!
//! | Held | Emits |
//! |------|-------|
//! | "+" only | `u` for iterations 1..=10, `U` + 125 ms for 11..=22, `P` + 250 ms from 23 |
//! | "-" only | mirror: `d` / `D` / `W` |
//! | mode press edge | `M` once, 10 ms debounce on both edges |
//! | all three | `S` every ~5 s |
//! | "+" and "-", mode up | `X`, then 5V for 3 x 1 s, then back to 12V, every ~5 s |
//!
//! After every "+" or "-" iteration an extra-press window of ~510 ms counts
//! presses the user squeezed in before the watch caught up, and sends one
//! follow-up command (see [`WatchCommand::extra_presses`]).
//!
//! The iteration counter survives across passes while the same gesture is
//! held and restarts whenever the gesture changes.

use heapless::Vec;

use crate::charge::ChargeOutputs;
use crate::config::ButtonConfig;
use crate::context::DeviceContext;
use crate::error::StationError;
use crate::protocol::WatchCommand;
use crate::traits::{BlockingDelay, ButtonInput, ButtonSample, ChargeLevel, ChargeLine, LedPwm, WatchUart};
use crate::transport::WatchLink;

/// Commands sent during one decoder pass.
pub type Emitted = Vec<WatchCommand, 8>;

/// Gesture whose iteration counter is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
enum HeldGesture {
    #[default]
    None,
    Plus,
    Minus,
    AllThree,
    PlusMinus,
}

/// Button decoder state carried between passes.
#[derive(Clone, Debug)]
pub struct ButtonDecoder {
    config: ButtonConfig,
    held: HeldGesture,
    count: u32,
    mode_latched: bool,
}

impl ButtonDecoder {
    /// Creates a decoder with nothing held.
    pub fn new(config: ButtonConfig) -> Self {
        Self {
            config,
            held: HeldGesture::None,
            count: 0,
            mode_latched: false,
        }
    }

    /// Iterations counted for the gesture currently held.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Returns true while the mode button is latched as pressed.
    pub fn mode_latched(&self) -> bool {
        self.mode_latched
    }

    /// Runs one decoder pass.
    ///
    /// Branches run in a fixed order, each against a fresh sample:
    /// "+", "-", mode edge, all three, "+" and "-".
    pub fn poll<B, D, U, L, C>(
        &mut self,
        buttons: &B,
        delay: &mut D,
        link: &mut WatchLink<U>,
        ctx: &mut DeviceContext,
        outputs: &mut ChargeOutputs<L, C>,
    ) -> Result<Emitted, StationError>
    where
        B: ButtonInput + ?Sized,
        D: BlockingDelay + ?Sized,
        U: WatchUart,
        L: LedPwm,
        C: ChargeLine,
    {
        let mut emitted = Emitted::new();
        let mut active = false;

        if buttons.sample().is_plus_only() {
            active = true;
            self.step(true, buttons, delay, link, ctx, &mut emitted)?;
        }

        if buttons.sample().is_minus_only() {
            active = true;
            self.step(false, buttons, delay, link, ctx, &mut emitted)?;
        }

        let mode = buttons.sample().mode;
        if mode && !self.mode_latched {
            self.mode_latched = true;
            Self::emit(link, ctx, &mut emitted, WatchCommand::ToggleMode)?;
            // debounce press
            delay.delay_ms(self.config.debounce_ms);
        } else if !mode && self.mode_latched {
            self.mode_latched = false;
            // debounce release
            delay.delay_ms(self.config.debounce_ms);
        }

        if buttons.sample().is_all() {
            active = true;
            if self.combo(HeldGesture::AllThree, delay) {
                Self::emit(link, ctx, &mut emitted, WatchCommand::SwapColors)?;
            }
        }

        if buttons.sample().is_plus_minus() {
            active = true;
            if self.combo(HeldGesture::PlusMinus, delay) {
                self.diagnostic(delay, link, ctx, outputs, &mut emitted)?;
            }
        }

        if !active {
            self.held = HeldGesture::None;
            self.count = 0;
        }

        Ok(emitted)
    }

    fn enter(&mut self, gesture: HeldGesture) {
        if self.held != gesture {
            self.held = gesture;
            self.count = 0;
        }
    }

    fn emit<U: WatchUart>(
        link: &mut WatchLink<U>,
        ctx: &mut DeviceContext,
        emitted: &mut Emitted,
        command: WatchCommand,
    ) -> Result<(), StationError> {
        link.send(ctx, command)?;
        log::debug!("gesture -> {:?}", command);
        // capacity covers the most one pass can emit
        let _ = emitted.push(command);
        Ok(())
    }

    /// One "+" or "-" iteration followed by the extra-press window.
    fn step<B, D, U>(
        &mut self,
        up: bool,
        buttons: &B,
        delay: &mut D,
        link: &mut WatchLink<U>,
        ctx: &mut DeviceContext,
        emitted: &mut Emitted,
    ) -> Result<(), StationError>
    where
        B: ButtonInput + ?Sized,
        D: BlockingDelay + ?Sized,
        U: WatchUart,
    {
        self.enter(if up { HeldGesture::Plus } else { HeldGesture::Minus });
        self.count = self.count.saturating_add(1);

        let (single, ten, hour) = if up {
            (WatchCommand::StepUp, WatchCommand::TenUp, WatchCommand::HourUp)
        } else {
            (WatchCommand::StepDown, WatchCommand::TenDown, WatchCommand::HourDown)
        };

        if self.count <= u32::from(self.config.single_step_iterations) {
            Self::emit(link, ctx, emitted, single)?;
        } else if self.count > u32::from(self.config.hour_step_after) {
            Self::emit(link, ctx, emitted, hour)?;
            delay.delay_ms(self.config.hour_step_pacing_ms);
        } else {
            Self::emit(link, ctx, emitted, ten)?;
            delay.delay_ms(self.config.ten_step_pacing_ms);
        }

        let presses = self.count_extra_presses(up, buttons, delay);
        if let Some(follow_up) = WatchCommand::extra_presses(up, presses) {
            Self::emit(link, ctx, emitted, follow_up)?;
        }
        Ok(())
    }

    /// Counts debounced presses of one button during a fixed window.
    ///
    /// A press only counts after a release has been seen inside the
    /// window, so the press that started the iteration is not counted.
    fn count_extra_presses<B, D>(&self, up: bool, buttons: &B, delay: &mut D) -> u8
    where
        B: ButtonInput + ?Sized,
        D: BlockingDelay + ?Sized,
    {
        let pressed = |s: ButtonSample| if up { s.plus } else { s.minus };
        let mut presses: u8 = 0;
        let mut released = false;
        let mut elapsed = 0;

        while elapsed < self.config.extra_press_window_ms {
            let down = pressed(buttons.sample());
            if !down && !released {
                released = true;
                delay.delay_ms(self.config.debounce_ms);
                elapsed += self.config.debounce_ms;
            } else if down && released {
                released = false;
                presses = presses.saturating_add(1);
                delay.delay_ms(self.config.debounce_ms);
                elapsed += self.config.debounce_ms;
            }
            delay.delay_ms(1);
            elapsed += 1;
        }
        presses
    }

    /// One combo iteration. Returns true when the hold time is reached,
    /// restarting the counter.
    fn combo<D: BlockingDelay + ?Sized>(&mut self, gesture: HeldGesture, delay: &mut D) -> bool {
        self.enter(gesture);
        delay.delay_ms(self.config.combo_poll_ms);
        self.count = self.count.saturating_add(1);
        if self.count >= self.config.combo_iterations() {
            self.count = 0;
            true
        } else {
            false
        }
    }

    /// Diagnostic mode: let the watch read its battery on 5V for a few
    /// seconds, then resume charging.
    fn diagnostic<D, U, L, C>(
        &mut self,
        delay: &mut D,
        link: &mut WatchLink<U>,
        ctx: &mut DeviceContext,
        outputs: &mut ChargeOutputs<L, C>,
        emitted: &mut Emitted,
    ) -> Result<(), StationError>
    where
        D: BlockingDelay + ?Sized,
        U: WatchUart,
        L: LedPwm,
        C: ChargeLine,
    {
        Self::emit(link, ctx, emitted, WatchCommand::Diagnostic)?;
        log::info!("diagnostic mode, charge line at 5V");
        ctx.set_charge_level(ChargeLevel::FiveVolt);
        outputs.sync(ctx)?;
        for _ in 0..self.config.diagnostic_settle_repeats {
            delay.delay_ms(self.config.diagnostic_settle_ms);
        }
        ctx.set_charge_level(ChargeLevel::TwelveVolt);
        outputs.sync(ctx)?;
        Ok(())
    }
}

impl Default for ButtonDecoder {
    fn default() -> Self {
        Self::new(ButtonConfig::default())
    }
}
