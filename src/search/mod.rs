//! The search stack: principal variation, alpha-beta with quiescence,
//! iterative deepening, the worker-thread searcher and the transposition
//! table.

pub mod alpha_beta;
pub mod iterative;
pub mod observer;
pub mod pv;
pub mod searcher;
pub mod tt;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::board::Board;
use crate::eval::Eval;
use crate::time::TimeManager;

use pv::Pv;

/// Counters accumulated over one search (all iterations).
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    pub nodes: u64,
    pub qnodes: u64,
    pub tt_probes: u64,
    pub tt_hits: u64,
    pub tt_hits_exact: u64,
    pub tt_hits_lower: u64,
    pub tt_hits_upper: u64,
}

impl SearchStats {
    #[inline(always)]
    pub fn all_nodes(&self) -> u64 {
        self.nodes + self.qnodes
    }
}

/// How much of a search result can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// Nothing useful was found before the abort; only the stats are valid.
    None,
    /// Some root moves were searched completely before the abort; the PV is
    /// usable but might have changed with more time.
    Partial,
    /// Every root move was searched.
    Complete,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub kind: ResultKind,
    pub pv: Pv,
    pub eval: Eval,
    pub stats: SearchStats,
}

impl SearchResult {
    pub fn empty() -> Self {
        SearchResult {
            kind: ResultKind::None,
            pv: Pv::new(),
            eval: 0,
            stats: SearchStats::default(),
        }
    }

    /// Fold a newer iteration's result into the accumulated one: a partial
    /// or complete result replaces the line and value, the stats always
    /// advance.
    pub fn merge(&mut self, rhs: &SearchResult) {
        if rhs.kind != ResultKind::None {
            self.kind = rhs.kind;
            self.eval = rhs.eval;
            self.pv = rhs.pv.clone();
        }
        self.stats = rhs.stats;
    }
}

/// One search assignment: the position, the clock budget and the limits.
/// Owns its board and time manager for the duration of the search; the
/// abort flag is the only part shared with the controlling thread.
pub struct Search {
    pub board: Board,
    pub time_manager: TimeManager,
    pub max_depth: u8,
    pub node_limit: Option<u64>,
    abort: Arc<AtomicBool>,
}

impl Search {
    pub fn new(
        board: Board,
        time_manager: TimeManager,
        max_depth: u8,
        node_limit: Option<u64>,
    ) -> Self {
        Search {
            board,
            time_manager,
            max_depth,
            node_limit,
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle the controlling thread keeps for cooperative cancellation.
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    #[inline(always)]
    pub fn is_aborted(&self) -> bool {
        self.abort.load(Ordering::Relaxed)
    }
}
