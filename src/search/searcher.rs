//! The searcher: owns the single worker thread, drives iterative deepening
//! on it, and fans search events out to subscribers with the `time` field
//! rewritten to wall-clock seconds since `start`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::eval::Eval;
use crate::moves::types::Move;
use crate::search::iterative;
use crate::search::observer::SearchObserver;
use crate::search::pv::Pv;
use crate::search::tt::TranspositionTable;
use crate::search::Search;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearcherState {
    Ready,
    Searching,
    Stopped,
}

struct Inner {
    state: SearcherState,
    pending: Option<Search>,
    abort: Option<Arc<AtomicBool>>,
    start_time: Instant,
    destroying: bool,
}

struct Shared {
    inner: Mutex<Inner>,
    work_available: Condvar,
    idle: Condvar,
    observers: Mutex<Vec<Arc<dyn SearchObserver>>>,
    tt: Arc<Mutex<TranspositionTable>>,
}

impl Shared {
    fn elapsed_seconds(&self) -> f64 {
        self.inner.lock().unwrap().start_time.elapsed().as_secs_f64()
    }

    fn each_observer(&self, f: impl Fn(&dyn SearchObserver)) {
        for observer in self.observers.lock().unwrap().iter() {
            f(observer.as_ref());
        }
    }
}

pub struct Searcher {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Searcher {
    /// Create the searcher and its worker thread. The transposition table is
    /// shared with the caller and must outlive every searcher using it.
    pub fn new(tt: Arc<Mutex<TranspositionTable>>) -> Self {
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                state: SearcherState::Ready,
                pending: None,
                abort: None,
                start_time: Instant::now(),
                destroying: false,
            }),
            work_available: Condvar::new(),
            idle: Condvar::new(),
            observers: Mutex::new(Vec::new()),
            tt,
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("search-worker".into())
            .spawn(move || run_worker(worker_shared))
            .expect("spawn search worker");

        Searcher {
            shared,
            worker: Some(worker),
        }
    }

    pub fn attach(&self, observer: Arc<dyn SearchObserver>) {
        self.shared.observers.lock().unwrap().push(observer);
    }

    pub fn state(&self) -> SearcherState {
        self.shared.inner.lock().unwrap().state
    }

    pub fn is_searching(&self) -> bool {
        self.state() == SearcherState::Searching
    }

    /// Hand a search to the worker. Ignored with a log if one is running.
    pub fn start(&self, search: Search) {
        {
            let mut inner = self.shared.inner.lock().unwrap();
            if inner.state != SearcherState::Ready {
                tracing::warn!("search requested while busy; ignored");
                return;
            }

            self.shared.tt.lock().unwrap().bump_generation();

            inner.state = SearcherState::Searching;
            inner.abort = Some(search.abort_handle());
            inner.start_time = Instant::now();
            inner.pending = Some(search);
        }
        self.shared.work_available.notify_one();
    }

    /// Cooperatively abort the running search; a no-op when idle. The worker
    /// observes the flag within one node-check interval.
    pub fn stop(&self) {
        let inner = self.shared.inner.lock().unwrap();
        if inner.state == SearcherState::Searching {
            if let Some(abort) = &inner.abort {
                abort.store(true, Ordering::Relaxed);
            }
        }
    }

    /// Block until the worker finished the current search, for tests and
    /// clean shutdown sequencing.
    pub fn wait_until_idle(&self) {
        let mut inner = self.shared.inner.lock().unwrap();
        while inner.state != SearcherState::Ready {
            inner = self.shared.idle.wait(inner).unwrap();
        }
    }
}

impl Drop for Searcher {
    fn drop(&mut self) {
        {
            let mut inner = self.shared.inner.lock().unwrap();
            inner.destroying = true;
            if let Some(abort) = &inner.abort {
                abort.store(true, Ordering::Relaxed);
            }
        }
        self.shared.work_available.notify_all();

        if let Some(handle) = self.worker.take() {
            if thread::current().id() == handle.thread().id() {
                // Dropped on the worker itself: joining would self-deadlock,
                // so the thread is detached instead.
                drop(handle);
            } else {
                let _ = handle.join();
            }
        }
    }
}

fn run_worker(shared: Arc<Shared>) {
    loop {
        let search = {
            let mut inner = shared.inner.lock().unwrap();
            loop {
                if inner.destroying {
                    return;
                }
                if inner.pending.is_some() {
                    break;
                }
                inner = shared.work_available.wait(inner).unwrap();
            }
            inner.pending.take()
        };

        if let Some(mut search) = search {
            let forwarder = Forwarder {
                shared: Arc::clone(&shared),
            };

            let result = {
                let mut tt = shared.tt.lock().unwrap();
                iterative::run(&mut search, &mut tt, &forwarder)
            };

            let elapsed = shared.elapsed_seconds();
            {
                let mut inner = shared.inner.lock().unwrap();
                inner.state = SearcherState::Stopped;
                inner.abort = None;
            }

            shared.each_observer(|o| o.on_search_completed(&result.pv, elapsed, &result.stats));

            {
                let mut inner = shared.inner.lock().unwrap();
                inner.state = SearcherState::Ready;
            }
            shared.idle.notify_all();
        }
    }
}

/// Relays events from the algorithm to the subscribers, substituting the
/// searcher's wall-clock for the zero the algorithm reports. The final
/// search-completed event is emitted by the worker loop instead, exactly
/// once per start.
struct Forwarder {
    shared: Arc<Shared>,
}

impl SearchObserver for Forwarder {
    fn on_search_started(&self) {
        self.shared.each_observer(|o| o.on_search_started());
    }

    fn on_searching_move_at_root(
        &self,
        depth: u8,
        _time: f64,
        move_number: u16,
        moves_count: u16,
        nodes: u64,
        mv: Move,
    ) {
        let elapsed = self.shared.elapsed_seconds();
        self.shared.each_observer(|o| {
            o.on_searching_move_at_root(depth, elapsed, move_number, moves_count, nodes, mv)
        });
    }

    fn on_new_best_move(&self, pv: &Pv, eval: Eval, depth: u8, _time: f64, nodes: u64) {
        let elapsed = self.shared.elapsed_seconds();
        self.shared
            .each_observer(|o| o.on_new_best_move(pv, eval, depth, elapsed, nodes));
    }

    fn on_iteration_started(&self) {
        self.shared.each_observer(|o| o.on_iteration_started());
    }

    fn on_iteration_completed(&self, pv: &Pv, eval: Eval, depth: u8, _time: f64, nodes: u64) {
        let elapsed = self.shared.elapsed_seconds();
        self.shared
            .each_observer(|o| o.on_iteration_completed(pv, eval, depth, elapsed, nodes));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::search::SearchStats;
    use crate::time::{TimeControl, TimeManager};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct Recorder {
        completed: AtomicUsize,
        iterations: AtomicUsize,
    }

    impl SearchObserver for Recorder {
        fn on_iteration_completed(&self, _: &Pv, _: Eval, _: u8, time: f64, _: u64) {
            assert!(time >= 0.0);
            self.iterations.fetch_add(1, Ordering::Relaxed);
        }

        fn on_search_completed(&self, _: &Pv, _: f64, _: &SearchStats) {
            self.completed.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn search_for(depth: u8) -> Search {
        Search::new(
            Board::new(),
            TimeManager::new(TimeControl {
                infinite: true,
                ..Default::default()
            }),
            depth,
            None,
        )
    }

    #[test]
    fn completes_a_search_and_returns_to_ready() {
        let tt = Arc::new(Mutex::new(TranspositionTable::new(8)));
        let searcher = Searcher::new(tt);
        let recorder = Arc::new(Recorder {
            completed: AtomicUsize::new(0),
            iterations: AtomicUsize::new(0),
        });
        searcher.attach(recorder.clone());

        searcher.start(search_for(4));
        searcher.wait_until_idle();

        assert_eq!(searcher.state(), SearcherState::Ready);
        assert_eq!(recorder.completed.load(Ordering::Relaxed), 1);
        assert_eq!(recorder.iterations.load(Ordering::Relaxed), 4);
    }

    #[test]
    fn stop_aborts_with_bounded_latency() {
        let tt = Arc::new(Mutex::new(TranspositionTable::new(8)));
        let searcher = Searcher::new(tt);
        let recorder = Arc::new(Recorder {
            completed: AtomicUsize::new(0),
            iterations: AtomicUsize::new(0),
        });
        searcher.attach(recorder.clone());

        searcher.start(search_for(96));
        std::thread::sleep(Duration::from_millis(50));
        searcher.stop();
        searcher.wait_until_idle();

        // Exactly one completion even though the search was cut short.
        assert_eq!(recorder.completed.load(Ordering::Relaxed), 1);
        assert_eq!(searcher.state(), SearcherState::Ready);
    }

    #[test]
    fn stop_while_idle_is_a_no_op() {
        let tt = Arc::new(Mutex::new(TranspositionTable::new(8)));
        let searcher = Searcher::new(tt);
        searcher.stop();
        assert_eq!(searcher.state(), SearcherState::Ready);
    }

    #[test]
    fn sequential_searches_reuse_the_worker() {
        let tt = Arc::new(Mutex::new(TranspositionTable::new(8)));
        let searcher = Searcher::new(tt);
        for _ in 0..3 {
            searcher.start(search_for(3));
            searcher.wait_until_idle();
        }
        assert_eq!(searcher.state(), SearcherState::Ready);
    }
}
