//! State shared between the interrupt handlers and the main loop.
//!
//! The firmware runs one preemptive context (the interrupt vector) over a
//! cooperative main loop. Everything both sides touch lives in one
//! [`DeviceContext`], passed by reference instead of living in globals.
//!
//! # Sharing model
//!
//! | Field | Written by | Read by |
//! |-------|------------|---------|
//! | [`TimerOverflowFlag`] | timer interrupt (set), main loop (clear) | main loop |
//! | [`ReceiveRegister`] | UART receive handler | command router |
//! | charge state, line level | receive handler, tick advance | output mirroring |
//! | [`CommTimeout`] | receive handler, transmit path, tick advance | tick advance |
//!
//! Only the overflow flag is shared across a real preemption boundary; it
//! is a single atomic byte so no critical section is needed. The receive
//! handler takes `&mut DeviceContext`, so on targets where it runs from a
//! true interrupt the context must be handed over through a critical
//! section by the board integration. On ESP32 the receive side is polled
//! from the main loop instead.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::charge::{ChargeState, CycleState};
use crate::config::ChargeConfig;
use crate::protocol::WatchReply;
use crate::timeout::CommTimeout;
use crate::traits::ChargeLevel;

// ============================================================================
// Peripheral Register Models
// ============================================================================

/// One-slot "update pending" flag raised by the timer interrupt.
///
/// Single producer (the interrupt), single consumer (the main loop),
/// depth one. Overflows that arrive while the flag is still set coalesce
/// into one update.
///
/// Uses plain load/store so it also works on cores without atomic
/// read-modify-write instructions.
///
/// ```
/// use cst_base::TimerOverflowFlag;
///
/// static FLAG: TimerOverflowFlag = TimerOverflowFlag::new();
///
/// FLAG.set();
/// FLAG.set(); // coalesces
/// assert!(FLAG.take());
/// assert!(!FLAG.take());
/// ```
#[derive(Debug, Default)]
pub struct TimerOverflowFlag(AtomicBool);

impl TimerOverflowFlag {
    /// Creates a cleared flag.
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Raises the flag. Safe to call from interrupt context.
    #[inline]
    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Lowers the flag.
    #[inline]
    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Returns true if an update is pending.
    #[inline]
    pub fn test(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Consumes a pending update, returning whether there was one.
    pub fn take(&self) -> bool {
        let pending = self.test();
        if pending {
            self.clear();
        }
        pending
    }
}

/// Single-slot register holding the last byte received from the watch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReceiveRegister {
    last: u8,
    received: u32,
}

impl ReceiveRegister {
    /// Creates an empty register (reads as 0).
    pub const fn new() -> Self {
        Self {
            last: 0,
            received: 0,
        }
    }

    /// Latches a byte, replacing the previous one.
    #[inline]
    pub fn latch(&mut self, byte: u8) {
        self.last = byte;
        self.received = self.received.wrapping_add(1);
    }

    /// Last latched byte.
    #[inline]
    pub fn last(&self) -> u8 {
        self.last
    }

    /// Number of bytes latched since power-up (wrapping).
    #[inline]
    pub fn received(&self) -> u32 {
        self.received
    }
}

// ============================================================================
// Device Context
// ============================================================================

/// Everything the interrupt handlers and the main loop share.
///
/// The charge/LED cycle starts disabled: nothing breathes and no
/// measurement window opens until the watch announces itself with `'H'`.
#[derive(Debug)]
pub struct DeviceContext {
    pub(crate) charge: ChargeState,
    pub(crate) timeout: CommTimeout,
    pub(crate) line: ChargeLevel,
    pub(crate) enabled: bool,
    pub(crate) config: ChargeConfig,
    rx: ReceiveRegister,
    overflow: TimerOverflowFlag,
}

impl DeviceContext {
    /// Creates a context in the power-up state.
    pub fn new(config: &ChargeConfig) -> Self {
        Self {
            charge: ChargeState::new(),
            timeout: CommTimeout::new(config.comm_timeout_ticks),
            line: ChargeLevel::TwelveVolt,
            enabled: false,
            config: config.clone(),
            rx: ReceiveRegister::new(),
            overflow: TimerOverflowFlag::new(),
        }
    }

    // ------------------------------------------------------------------------
    // Interrupt handlers
    // ------------------------------------------------------------------------

    /// Timer overflow handler: raise the update-pending flag, nothing else.
    #[inline]
    pub fn on_timer_overflow(&self) {
        self.overflow.set();
    }

    /// UART receive handler.
    ///
    /// Latches the byte, then applies the watch reply:
    /// - `'H'` re-enables a disabled cycle at full brightness, and always
    ///   restarts the communication timeout
    /// - `'B'` marks the battery charged, dims the LED and returns to 12V
    /// - `'N'` marks the battery not charged and returns to 12V
    ///
    /// Never blocks, never transmits.
    pub fn on_uart_receive(&mut self, byte: u8) -> WatchReply {
        self.rx.latch(byte);
        let reply = WatchReply::from(byte);
        match reply {
            WatchReply::Hello => {
                if !self.enabled {
                    self.enabled = true;
                    self.charge.battery_charged = false;
                    self.charge.set_duty(self.config.handshake_duty);
                }
                self.timeout.reset();
            }
            WatchReply::BatteryCharged => {
                self.charge.battery_charged = true;
                self.charge.set_duty(self.config.charged_duty);
                self.line = ChargeLevel::TwelveVolt;
            }
            WatchReply::NotCharged => {
                self.charge.battery_charged = false;
                self.line = ChargeLevel::TwelveVolt;
            }
            WatchReply::Other(_) => {}
        }
        reply
    }

    // ------------------------------------------------------------------------
    // Main-loop side
    // ------------------------------------------------------------------------

    /// Consumes the update-pending flag.
    #[inline]
    pub fn take_tick(&self) -> bool {
        self.overflow.take()
    }

    /// Records a successful transmit to the watch.
    #[inline]
    pub fn note_transmit(&mut self) {
        self.timeout.reset();
    }

    /// Sets the logical charge line level. Mirrored to hardware by
    /// [`ChargeOutputs::sync`](crate::ChargeOutputs::sync).
    #[inline]
    pub fn set_charge_level(&mut self, level: ChargeLevel) {
        self.line = level;
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Current cycle state.
    pub fn cycle_state(&self) -> CycleState {
        if !self.enabled {
            CycleState::Disabled
        } else if self.charge.battery_charged {
            CycleState::Charged
        } else {
            CycleState::Breathing
        }
    }

    /// Logical charge line level.
    #[inline]
    pub fn charge_level(&self) -> ChargeLevel {
        self.line
    }

    /// LED duty register.
    #[inline]
    pub fn duty(&self) -> u8 {
        self.charge.duty()
    }

    /// Returns true once the watch reported a charged battery.
    #[inline]
    pub fn battery_charged(&self) -> bool {
        self.charge.battery_charged()
    }

    /// Returns true while timer-driven updates run.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Last byte received from the watch.
    #[inline]
    pub fn last_received(&self) -> u8 {
        self.rx.last()
    }

    /// The receive register.
    #[inline]
    pub fn receive_register(&self) -> &ReceiveRegister {
        &self.rx
    }

    /// Charge/LED state.
    #[inline]
    pub fn charge(&self) -> &ChargeState {
        &self.charge
    }

    /// Communication timeout counter.
    #[inline]
    pub fn timeout(&self) -> &CommTimeout {
        &self.timeout
    }

    /// The update-pending flag.
    #[inline]
    pub fn overflow_flag(&self) -> &TimerOverflowFlag {
        &self.overflow
    }

    /// Charge cycle configuration.
    #[inline]
    pub fn config(&self) -> &ChargeConfig {
        &self.config
    }
}

impl Default for DeviceContext {
    fn default() -> Self {
        Self::new(&ChargeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charge::LedDirection;

    // =========================================================================
    // TimerOverflowFlag Tests
    // =========================================================================

    #[test]
    fn flag_starts_clear() {
        let flag = TimerOverflowFlag::new();
        assert!(!flag.test());
        assert!(!flag.take());
    }

    #[test]
    fn flag_take_consumes() {
        let flag = TimerOverflowFlag::new();
        flag.set();
        assert!(flag.test());
        assert!(flag.take());
        assert!(!flag.test());
    }

    // =========================================================================
    // ReceiveRegister Tests
    // =========================================================================

    #[test]
    fn register_keeps_last_byte_only() {
        let mut rx = ReceiveRegister::new();
        rx.latch(b'x');
        rx.latch(b'y');
        assert_eq!(rx.last(), b'y');
        assert_eq!(rx.received(), 2);
    }

    // =========================================================================
    // Receive Handler Tests
    // =========================================================================

    #[test]
    fn power_up_state() {
        let ctx = DeviceContext::default();
        assert_eq!(ctx.cycle_state(), CycleState::Disabled);
        assert_eq!(ctx.duty(), 0);
        assert_eq!(ctx.charge_level(), ChargeLevel::TwelveVolt);
        assert_eq!(ctx.last_received(), 0);
    }

    #[test]
    fn hello_enables_cycle() {
        let mut ctx = DeviceContext::default();
        assert_eq!(ctx.on_uart_receive(b'H'), WatchReply::Hello);
        assert_eq!(ctx.cycle_state(), CycleState::Breathing);
        assert_eq!(ctx.duty(), 0xFF);
        assert_eq!(ctx.charge().direction(), LedDirection::Down);
        assert!(!ctx.battery_charged());
    }

    #[test]
    fn hello_while_enabled_only_resets_timeout() {
        let mut ctx = DeviceContext::default();
        ctx.on_uart_receive(b'H');
        ctx.charge.set_duty(0x20);
        ctx.charge.battery_charged = true;
        ctx.timeout.increment();
        ctx.timeout.increment();

        ctx.on_uart_receive(b'H');
        assert_eq!(ctx.duty(), 0x20);
        assert!(ctx.battery_charged());
        assert_eq!(ctx.timeout().count(), 0);
    }

    #[test]
    fn battery_charged_reply() {
        let mut ctx = DeviceContext::default();
        ctx.on_uart_receive(b'H');
        ctx.set_charge_level(ChargeLevel::FiveVolt);

        assert_eq!(ctx.on_uart_receive(b'B'), WatchReply::BatteryCharged);
        assert!(ctx.battery_charged());
        assert_eq!(ctx.duty(), 0x44);
        assert_eq!(ctx.charge_level(), ChargeLevel::TwelveVolt);
        assert_eq!(ctx.cycle_state(), CycleState::Charged);
    }

    #[test]
    fn not_charged_reply() {
        let mut ctx = DeviceContext::default();
        ctx.on_uart_receive(b'H');
        ctx.on_uart_receive(b'B');
        ctx.set_charge_level(ChargeLevel::FiveVolt);

        ctx.on_uart_receive(b'N');
        assert!(!ctx.battery_charged());
        assert_eq!(ctx.charge_level(), ChargeLevel::TwelveVolt);
        assert_eq!(ctx.cycle_state(), CycleState::Breathing);
    }

    #[test]
    fn unknown_byte_only_latched() {
        let mut ctx = DeviceContext::default();
        assert_eq!(ctx.on_uart_receive(0x7E), WatchReply::Other(0x7E));
        assert_eq!(ctx.last_received(), 0x7E);
        assert_eq!(ctx.cycle_state(), CycleState::Disabled);
        assert_eq!(ctx.duty(), 0);
    }

    #[test]
    fn replies_do_not_enable_cycle() {
        let mut ctx = DeviceContext::default();
        ctx.on_uart_receive(b'B');
        ctx.on_uart_receive(b'N');
        assert!(!ctx.is_enabled());
    }

    #[test]
    fn transmit_resets_timeout() {
        let mut ctx = DeviceContext::default();
        ctx.timeout.increment();
        ctx.note_transmit();
        assert_eq!(ctx.timeout().count(), 0);
    }

    #[test]
    fn timer_overflow_sets_flag() {
        let ctx = DeviceContext::default();
        ctx.on_timer_overflow();
        assert!(ctx.take_tick());
        assert!(!ctx.take_tick());
    }
}
