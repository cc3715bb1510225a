//! Charge/LED cycle and communication timeout, driven through the main loop

use cst_base::hal::{MockBoard, SimClock};
use cst_base::{BaseStation, ChargeConfig, ChargeLevel, CycleState, StationConfig};

fn station() -> BaseStation<MockBoard> {
    station_with(StationConfig::default())
}

fn station_with(config: StationConfig) -> BaseStation<MockBoard> {
    BaseStation::new(MockBoard::parts(&SimClock::new()), config)
}

/// One timer overflow followed by one main-loop pass.
fn tick(station: &mut BaseStation<MockBoard>) {
    station.timer_overflow();
    station.run_once().unwrap();
}

/// Ticks `n` times, with the watch saying hello every `hello_every` ticks.
fn run_ticks(station: &mut BaseStation<MockBoard>, n: u32, hello_every: u32) {
    for i in 1..=n {
        tick(station);
        if i % hello_every == 0 {
            station.uart_receive(b'H');
        }
    }
}

// ============================================================================
// Startup
// ============================================================================

#[test]
fn nothing_runs_before_handshake() {
    let mut station = station();
    for _ in 0..2500 {
        tick(&mut station);
    }
    let state = station.state();
    assert_eq!(state.cycle, CycleState::Disabled);
    assert_eq!(state.overflow_tick, 0);
    assert!(station.parts().uart.sent.is_empty());
    assert_eq!(station.parts().led.history, vec![0]);
    assert_eq!(station.parts().watchdog.feeds, 2500);
}

#[test]
fn handshake_starts_breathing_at_full_brightness() {
    let mut station = station();
    station.uart_receive(b'H');
    station.run_once().unwrap();
    assert_eq!(station.state().cycle, CycleState::Breathing);
    assert_eq!(station.parts().led.duty, 0xFF);
    assert!(!station.state().battery_charged);
}

// ============================================================================
// LED Breathing
// ============================================================================

#[test]
fn duty_is_a_triangle_wave() {
    let mut station = station();
    station.uart_receive(b'H');

    let mut duties = vec![station.state().duty];
    for i in 1..=1020u32 {
        tick(&mut station);
        duties.push(station.state().duty);
        if i % 100 == 0 {
            station.uart_receive(b'H');
        }
    }

    for pair in duties.windows(2) {
        let step = i16::from(pair[1]) - i16::from(pair[0]);
        assert_eq!(step.abs(), 1, "duty jumped from {} to {}", pair[0], pair[1]);
    }
    // Turning points only at the boundaries
    for w in duties.windows(3) {
        let turned = (w[1] > w[0]) != (w[2] > w[1]);
        if turned {
            assert!(w[1] == 0x00 || w[1] == 0xFF, "turned at {}", w[1]);
        }
    }
    // Period of 510 ticks
    assert_eq!(duties[0], duties[510]);
    assert_eq!(duties[1], duties[511]);
    assert_eq!(duties[255], 0x00);
}

#[test]
fn charged_battery_holds_led() {
    let mut station = station();
    station.uart_receive(b'H');
    run_ticks(&mut station, 10, 100);
    station.uart_receive(b'B');
    run_ticks(&mut station, 50, 100);
    assert_eq!(station.parts().led.duty, 0x44);
    assert_eq!(station.state().cycle, CycleState::Charged);
}

// ============================================================================
// Measurement Schedule
// ============================================================================

#[test]
fn measurement_window_opens_at_1000_and_closes_at_2000() {
    let mut station = station();
    station.uart_receive(b'H');

    run_ticks(&mut station, 999, 100);
    assert_eq!(station.parts().charge_line.level, ChargeLevel::TwelveVolt);
    assert!(station.parts().uart.sent.is_empty());

    tick(&mut station);
    assert_eq!(station.parts().charge_line.level, ChargeLevel::FiveVolt);
    assert_eq!(station.parts().uart.sent, b"T".to_vec());
    assert_eq!(station.state().timeout_ticks, 1);

    run_ticks(&mut station, 999, 100);
    assert_eq!(station.parts().charge_line.level, ChargeLevel::FiveVolt);

    tick(&mut station);
    assert_eq!(station.parts().charge_line.level, ChargeLevel::TwelveVolt);
    assert_eq!(station.state().overflow_tick, 0);
    assert_eq!(
        station.parts().charge_line.transitions,
        vec![
            ChargeLevel::TwelveVolt,
            ChargeLevel::FiveVolt,
            ChargeLevel::TwelveVolt
        ]
    );
}

#[test]
fn schedule_repeats() {
    let mut station = station();
    station.uart_receive(b'H');
    run_ticks(&mut station, 4000, 100);
    assert_eq!(station.parts().uart.sent, b"TT".to_vec());
}

#[test]
fn battery_reply_ends_window_early() {
    let mut station = station();
    station.uart_receive(b'H');
    run_ticks(&mut station, 1000, 100);
    assert_eq!(station.parts().charge_line.level, ChargeLevel::FiveVolt);

    station.uart_receive(b'B');
    station.run_once().unwrap();
    assert_eq!(station.parts().charge_line.level, ChargeLevel::TwelveVolt);
    assert_eq!(station.parts().led.duty, 0x44);
}

#[test]
fn not_charged_reply_ends_window_and_keeps_breathing() {
    let mut station = station();
    station.uart_receive(b'H');
    run_ticks(&mut station, 1000, 100);

    station.parts_mut().uart.inject(b'N');
    station.run_once().unwrap();
    assert_eq!(station.parts().charge_line.level, ChargeLevel::TwelveVolt);
    assert_eq!(station.state().cycle, CycleState::Breathing);

    let before = station.state().duty;
    tick(&mut station);
    assert_ne!(station.state().duty, before);
}

// ============================================================================
// Communication Timeout
// ============================================================================

#[test]
fn silence_disables_cycle_until_next_hello() {
    let mut station = station();
    station.uart_receive(b'H');

    run_ticks(&mut station, 499, u32::MAX);
    assert_eq!(station.state().cycle, CycleState::Breathing);

    tick(&mut station);
    assert_eq!(station.state().cycle, CycleState::Disabled);
    assert_eq!(station.parts().led.duty, 0);

    let tick_before = station.state().overflow_tick;
    run_ticks(&mut station, 100, u32::MAX);
    assert_eq!(station.state().overflow_tick, tick_before);
    assert_eq!(station.parts().led.duty, 0);

    station.uart_receive(b'H');
    station.run_once().unwrap();
    assert_eq!(station.state().cycle, CycleState::Breathing);
    assert_eq!(station.parts().led.duty, 0xFF);
}

#[test]
fn silence_during_window_returns_line_to_twelve_volt() {
    let mut station = station();
    station.uart_receive(b'H');
    run_ticks(&mut station, 1000, 100);
    assert_eq!(station.parts().charge_line.level, ChargeLevel::FiveVolt);

    // last hello right after tick 1000, then silence
    run_ticks(&mut station, 499, u32::MAX);
    assert_eq!(station.state().cycle, CycleState::Breathing);
    assert_eq!(station.parts().charge_line.level, ChargeLevel::FiveVolt);

    tick(&mut station);
    assert_eq!(station.state().cycle, CycleState::Disabled);
    assert_eq!(station.parts().charge_line.level, ChargeLevel::TwelveVolt);
    assert_eq!(station.state().overflow_tick, 0);

    run_ticks(&mut station, 20_000, u32::MAX);
    assert_eq!(station.parts().charge_line.level, ChargeLevel::TwelveVolt);

    // the next handshake starts a fresh schedule
    station.uart_receive(b'H');
    run_ticks(&mut station, 999, 100);
    assert_eq!(station.parts().uart.sent, b"T".to_vec());
    tick(&mut station);
    assert_eq!(station.parts().uart.sent, b"TT".to_vec());
    assert_eq!(station.parts().charge_line.level, ChargeLevel::FiveVolt);
}

#[test]
fn button_traffic_keeps_link_alive() {
    use cst_base::ButtonSample;

    let mut station = station();
    station.uart_receive(b'H');
    run_ticks(&mut station, 400, u32::MAX);

    station.parts_mut().buttons.set(ButtonSample::mode_only());
    station.run_once().unwrap();
    station.parts_mut().buttons.set(ButtonSample::RELEASED);
    assert_eq!(station.state().timeout_ticks, 0);

    run_ticks(&mut station, 400, u32::MAX);
    assert_eq!(station.state().cycle, CycleState::Breathing);
}

#[test]
fn custom_timeout_threshold() {
    let config = StationConfig::default()
        .with_charge(ChargeConfig::default().with_comm_timeout_ticks(20));
    let mut station = station_with(config);
    station.uart_receive(b'H');
    run_ticks(&mut station, 20, u32::MAX);
    assert_eq!(station.state().cycle, CycleState::Disabled);
}
