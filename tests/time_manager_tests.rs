//! Wall-clock behaviour of timed searches.

use meridian::board::Board;
use meridian::search::iterative;
use meridian::search::observer::NullObserver;
use meridian::search::tt::TranspositionTable;
use meridian::search::{ResultKind, Search};
use meridian::time::{TimeControl, TimeManager};
use std::time::{Duration, Instant};

fn timed_search(control: TimeControl) -> (Duration, ResultKind) {
    let board = Board::new();
    let mut search = Search::new(board, TimeManager::new(control), 96, None);
    let mut tt = TranspositionTable::new(16);
    let started = Instant::now();
    let result = iterative::run(&mut search, &mut tt, &NullObserver);
    (started.elapsed(), result.kind)
}

#[test]
fn movetime_500_returns_close_to_the_budget() {
    // Warm up tables and caches so the measured run is representative.
    let _ = timed_search(TimeControl {
        move_time: Some(Duration::from_millis(100)),
        ..Default::default()
    });

    let (elapsed, kind) = timed_search(TimeControl {
        move_time: Some(Duration::from_millis(500)),
        ..Default::default()
    });
    // The last iteration is usually cut short, which still yields a usable
    // partial result.
    assert_ne!(kind, ResultKind::None);
    // The manager aims for the budget minus its safety buffer and may
    // overshoot by at most one node-check interval.
    assert!(elapsed >= Duration::from_millis(440), "stopped early: {:?}", elapsed);
    assert!(elapsed <= Duration::from_millis(750), "overran: {:?}", elapsed);
}

#[test]
fn tiny_clock_still_produces_a_move() {
    let (elapsed, kind) = timed_search(TimeControl {
        time_left: Some(Duration::from_millis(80)),
        ..Default::default()
    });
    // The minimum-depth rule beats the clock, so this may exceed the
    // allocation but must finish quickly with a usable result.
    assert!(elapsed < Duration::from_secs(5));
    assert_ne!(kind, ResultKind::None);
}

#[test]
fn depth_limited_search_ignores_the_clock() {
    let board = Board::new();
    let mut search = Search::new(
        board,
        TimeManager::new(TimeControl {
            infinite: true,
            ..Default::default()
        }),
        3,
        None,
    );
    let mut tt = TranspositionTable::new(16);
    let result = iterative::run(&mut search, &mut tt, &NullObserver);
    assert_eq!(result.kind, ResultKind::Complete);
}
