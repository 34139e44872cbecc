use std::sync::Arc;

use clap::Parser;
use tempfile::TempDir;

use tickwatch::{persistence::FileStore, AppState, Config, ManualClock, Mode};

fn boot(dir: &TempDir, clock: &Arc<ManualClock>, args: &[&str]) -> AppState {
    let config = Config::parse_from(std::iter::once("tickwatch").chain(args.iter().copied()));
    AppState::new(&config, clock.clone(), Arc::new(FileStore::new(dir.path())))
}

#[test]
fn running_stopwatch_survives_restart() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));

    let first = boot(&dir, &clock, &[]);
    first.start(Mode::Stopwatch);
    clock.advance(4_000);
    drop(first);

    // Time keeps passing while no process is alive
    clock.advance(60_000);
    let second = boot(&dir, &clock, &[]);
    assert!(second.stopwatch.is_running());
    assert_eq!(second.stopwatch.time_string(false), "00:01:04");
}

#[test]
fn paused_timer_and_duration_survive_restart() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(1_700_000_000_000));

    let first = boot(&dir, &clock, &["--timer", "10"]);
    first.set_timer_duration(90_000);
    first.start(Mode::Timer);
    clock.advance(30_000);
    first.pause(Mode::Timer);
    drop(first);

    clock.advance(3_600_000);
    // The stored duration wins over the command line default
    let second = boot(&dir, &clock, &["--timer", "10"]);
    let timer = second.timer.snapshot();
    assert!(!timer.running);
    assert_eq!(timer.duration, 90_000);
    assert_eq!(second.timer.time_string(false), "00:01:00");
}

#[test]
fn fresh_directory_uses_configured_timer() {
    let dir = TempDir::new().unwrap();
    let clock = Arc::new(ManualClock::new(0));

    let state = boot(&dir, &clock, &["--timer", "3"]);
    assert!(state.stopwatch.snapshot().reset);
    assert_eq!(state.timer.time_string(false), "00:03:00");
}

#[test]
fn corrupt_snapshot_falls_back_to_reset() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("tickwatch.stopwatch.json"), b"{not json").unwrap();
    let clock = Arc::new(ManualClock::new(0));

    let state = boot(&dir, &clock, &[]);
    assert!(state.stopwatch.snapshot().reset);
    assert_eq!(state.stopwatch.time_string(true), "00:00:00.00");
}
