//! Time management: converts the `go` clock parameters into per-search
//! budgets and answers the search's "may I continue?" questions.
//!
//! The event hooks take `&self`: the manager is observed by the search that
//! concurrently borrows it for its per-node queries, so the iteration
//! bookkeeping lives in `Cell`s. All access stays on the worker thread.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Clock-related parameters of a `go` command, already reduced to the side
/// to move.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeControl {
    pub time_left: Option<Duration>,
    pub increment: Option<Duration>,
    pub moves_to_go: Option<u32>,
    pub move_time: Option<Duration>,
    pub infinite: bool,
}

const MIN_ITERATIONS: u32 = 3;
const MAX_OVERTARGET_FACTOR: f64 = 5.0;
const MAX_CLOCK_RATIO: f64 = 0.8;
const MOVES_TO_GO_ESTIMATE: u32 = 35;
const SAFETY_BUFFER: Duration = Duration::from_millis(50);
const MIN_CHECK_INTERVAL: Duration = Duration::from_millis(10);
const MAX_CHECK_INTERVAL: Duration = Duration::from_millis(250);

pub struct TimeManager {
    start: Cell<Instant>,
    iteration_start: Cell<Instant>,
    last_iteration: Cell<Duration>,
    second_last_iteration: Cell<Duration>,
    iterations_completed: Cell<u32>,

    /// The search may never stop before this much time has passed.
    min_duration: Duration,
    /// Best-effort per-move budget.
    target_duration: Duration,
    /// Hard ceiling checked at every node-check.
    max_duration: Duration,
}

impl TimeManager {
    pub fn new(control: TimeControl) -> Self {
        let (min, target, max) = if let Some(move_time) = control.move_time {
            let budget = move_time.saturating_sub(SAFETY_BUFFER);
            (budget, budget, budget)
        } else if control.infinite {
            (Duration::MAX, Duration::MAX, Duration::MAX)
        } else {
            let time_left = control.time_left.unwrap_or(Duration::ZERO);
            let increment = control.increment.unwrap_or(Duration::ZERO);
            let mtg = control.moves_to_go.unwrap_or(MOVES_TO_GO_ESTIMATE).max(1);

            let target = (time_left + increment * (mtg - 1)) / mtg;
            let max = target
                .mul_f64(MAX_OVERTARGET_FACTOR)
                .min(time_left.mul_f64(MAX_CLOCK_RATIO))
                .saturating_sub(SAFETY_BUFFER);
            (Duration::ZERO, target, max)
        };

        tracing::debug!(
            ?control,
            min_ms = min.as_millis() as u64,
            target_ms = target.as_millis() as u64,
            max_ms = if max == Duration::MAX { u64::MAX } else { max.as_millis() as u64 },
            "time budgets computed"
        );

        let now = Instant::now();
        TimeManager {
            start: Cell::new(now),
            iteration_start: Cell::new(now),
            last_iteration: Cell::new(Duration::ZERO),
            second_last_iteration: Cell::new(Duration::ZERO),
            iterations_completed: Cell::new(0),
            min_duration: min,
            target_duration: target,
            max_duration: max,
        }
    }

    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.start.get().elapsed()
    }

    /// The search is obliged to keep going: the minimum depth has not been
    /// reached, or the minimum duration has not elapsed.
    #[inline]
    fn must_continue(&self) -> bool {
        self.iterations_completed.get() < MIN_ITERATIONS || self.elapsed() < self.min_duration
    }

    /// Checked at every node-check interval.
    pub fn can_continue(&self) -> bool {
        self.must_continue() || self.elapsed() < self.max_duration
    }

    /// Checked between iterations: is starting another one worthwhile?
    pub fn can_start_new_iteration(&self) -> bool {
        if self.must_continue() {
            return true;
        }
        if !self.can_continue() {
            return false;
        }

        // Worth starting only if at least half the predicted iteration fits
        // before the target.
        let remaining = self.target_duration.saturating_sub(self.elapsed());
        self.next_iteration_estimate() / 2 < remaining
    }

    /// Quadratic effective-branching-factor prediction from the last two
    /// iteration durations.
    fn next_iteration_estimate(&self) -> Duration {
        let last = self.last_iteration.get();
        let second_last = self.second_last_iteration.get();
        let growth = if second_last.is_zero() {
            2.0
        } else {
            last.as_secs_f64() / second_last.as_secs_f64()
        };
        Duration::from_secs_f64((last.as_secs_f64() * growth).min(3600.0))
    }

    /// How many more nodes the search may visit before it must call
    /// `can_continue` again: the current speed times a check interval that
    /// halves the remaining budget, clamped to [10 ms, 250 ms].
    pub fn nodes_before_next_check(&self, nodes_searched: u64) -> u64 {
        let elapsed = self.elapsed();
        let nps = nodes_searched as f64 / elapsed.as_secs_f64().max(1e-6);

        let remaining = self.max_duration.saturating_sub(elapsed);
        let interval = (remaining / 2).clamp(MIN_CHECK_INTERVAL, MAX_CHECK_INTERVAL);

        (nps * interval.as_secs_f64()).max(1.0) as u64
    }

    // Search events the manager observes.

    pub fn on_search_started(&self) {
        let now = Instant::now();
        self.start.set(now);
        self.iteration_start.set(now);
    }

    pub fn on_iteration_started(&self) {
        self.iteration_start.set(Instant::now());
    }

    pub fn on_iteration_completed(&self) {
        self.second_last_iteration.set(self.last_iteration.get());
        self.last_iteration.set(self.iteration_start.get().elapsed());
        self.iterations_completed
            .set(self.iterations_completed.get() + 1);
        tracing::trace!(
            iteration = self.iterations_completed.get(),
            duration_ms = self.last_iteration.get().as_millis() as u64,
            "iteration completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_time_sets_all_three_budgets() {
        let tm = TimeManager::new(TimeControl {
            move_time: Some(Duration::from_millis(500)),
            ..Default::default()
        });
        assert_eq!(tm.min_duration, Duration::from_millis(450));
        assert_eq!(tm.target_duration, tm.min_duration);
        assert_eq!(tm.max_duration, tm.min_duration);
    }

    #[test]
    fn infinite_never_wants_to_stop() {
        let tm = TimeManager::new(TimeControl {
            infinite: true,
            ..Default::default()
        });
        assert!(tm.can_continue());
        assert!(tm.can_start_new_iteration());
    }

    #[test]
    fn conventional_budget_formula() {
        // 35 moves to go (default), no increment: target is 1/35 of the
        // clock, max is five targets capped by 80% of the clock.
        let tm = TimeManager::new(TimeControl {
            time_left: Some(Duration::from_secs(35)),
            ..Default::default()
        });
        assert_eq!(tm.target_duration, Duration::from_secs(1));
        assert_eq!(
            tm.max_duration,
            Duration::from_secs(5).saturating_sub(Duration::from_millis(50))
        );
        assert_eq!(tm.min_duration, Duration::ZERO);
    }

    #[test]
    fn increment_contributes_to_the_target() {
        let tm = TimeManager::new(TimeControl {
            time_left: Some(Duration::from_secs(10)),
            increment: Some(Duration::from_millis(100)),
            moves_to_go: Some(10),
            ..Default::default()
        });
        // (10s + 9 * 0.1s) / 10
        assert_eq!(tm.target_duration, Duration::from_millis(1090));
    }

    #[test]
    fn first_iterations_always_allowed() {
        let tm = TimeManager::new(TimeControl {
            time_left: Some(Duration::from_millis(1)),
            ..Default::default()
        });
        // Even with a hopeless clock the minimum depth must be reached.
        assert!(tm.can_start_new_iteration());
        assert!(tm.can_continue());
    }

    #[test]
    fn iteration_bookkeeping_feeds_the_prediction() {
        let tm = TimeManager::new(TimeControl {
            time_left: Some(Duration::from_secs(1)),
            ..Default::default()
        });
        tm.on_search_started();
        for _ in 0..4 {
            tm.on_iteration_started();
            tm.on_iteration_completed();
        }
        assert_eq!(tm.iterations_completed.get(), 4);
        // Prediction stays finite even with near-zero iteration times.
        let _ = tm.next_iteration_estimate();
    }

    #[test]
    fn node_check_stride_is_positive() {
        let tm = TimeManager::new(TimeControl {
            move_time: Some(Duration::from_millis(500)),
            ..Default::default()
        });
        assert!(tm.nodes_before_next_check(1_000_000) >= 1);
    }
}
