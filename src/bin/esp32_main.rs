//! ESP32-C3 watch base station firmware.
//!
//! This is the main entry point for the physical base station. After a
//! boot blink it runs the cooperative main loop forever:
//! - Forwards charge timer ticks to the station
//! - Drains bytes received from the watch
//! - Advances the charge/LED cycle
//! - Decodes button gestures into watch commands
//! - Feeds the task watchdog
//!
//! The USB HID host link is not wired up on this board.
//!
//! # Build
//!
//! ```bash
//! cargo build --release --features esp32 --bin esp32_main
//! espflash flash --monitor target/riscv32imc-esp-espidf/release/esp32_main
//! ```

use esp_idf_hal::gpio::IOPin;
use esp_idf_hal::gpio::OutputPin;
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::log::EspLogger;

use cst_base::hal::esp32::{
    Esp32Board, Esp32Buttons, Esp32ChargeLine, Esp32Delay, Esp32Led, Esp32TickTimer, Esp32Uart,
    Esp32Watchdog,
};
use cst_base::{BaseStation, BoardParts, StationConfig, TimerOverflowFlag};

/// Raised by the charge timer callback, consumed by the main loop.
static TICK: TimerOverflowFlag = TimerOverflowFlag::new();

fn main() -> anyhow::Result<()> {
    // Initialize ESP-IDF
    esp_idf_hal::sys::link_patches();
    EspLogger::initialize_default();

    let config = StationConfig::default();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("invalid station config: {}", e))?;

    let peripherals = Peripherals::take()?;

    // =========================================================================
    // Peripherals
    // =========================================================================

    let buttons = Esp32Buttons::new(
        peripherals.pins.gpio5.downgrade(),
        peripherals.pins.gpio7.downgrade(),
        peripherals.pins.gpio6.downgrade(),
    )?;
    log::info!("buttons on GPIO5/6/7");

    let led = Esp32Led::new(
        peripherals.pins.gpio3,
        peripherals.ledc.timer0,
        peripherals.ledc.channel0,
    )?;
    let charge_line = Esp32ChargeLine::new(peripherals.pins.gpio4.downgrade_output())?;
    log::info!("led on GPIO3, charge line on GPIO4");

    let uart = Esp32Uart::new(
        peripherals.uart1,
        peripherals.pins.gpio0,
        peripherals.pins.gpio1,
        config.uart.baud,
    )?;
    log::info!("watch uart on GPIO0/1 at {} baud", config.uart.baud);

    let watchdog = Esp32Watchdog::new(config.watchdog.timeout_secs)?;

    let parts: BoardParts<Esp32Board<'_>> = BoardParts {
        buttons,
        led,
        charge_line,
        uart,
        delay: Esp32Delay::new(),
        watchdog,
    };

    // =========================================================================
    // Station
    // =========================================================================

    let period_us = config.charge.overflow_period_us;
    let mut station = BaseStation::new(parts, config);
    station.boot()?;

    let _timer = Esp32TickTimer::start(&TICK, period_us)?;
    log::info!("charge timer every {} us, waiting for watch", period_us);

    // =========================================================================
    // Main Loop
    // =========================================================================

    loop {
        if TICK.take() {
            station.timer_overflow();
        }
        if let Err(e) = station.run_once() {
            log::warn!("main loop: {}", e);
        }
    }
}
