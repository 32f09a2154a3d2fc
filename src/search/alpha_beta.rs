//! Alpha-beta with a quiescence extension. Three specialised node shapes
//! (root, interior, quiescence) mirror the recursion's hot path; the abort
//! flag and the clock are only consulted every node-check stride.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::board::Board;
use crate::eval::{evaluate, mated_value, Eval, DRAW, MAX_EVAL, MIN_EVAL};
use crate::moves::execute::{make, unmake};
use crate::moves::movegen::{generate_captures, generate_quiets, order_captures};
use crate::moves::square_control::in_check;
use crate::moves::types::{Move, MoveList};
use crate::search::observer::SearchObserver;
use crate::search::pv::Pv;
use crate::search::tt::{EntryKind, TranspositionTable};
use crate::search::{ResultKind, SearchResult, SearchStats};
use crate::time::TimeManager;

/// Nodes searched before the first clock read; afterwards the time manager
/// sizes the stride from the measured speed.
const NODES_BEFORE_FIRST_CHECK: u64 = 20_000;

pub struct AlphaBeta<'a> {
    board: Board,
    root_moves: MoveList,
    tt: &'a mut TranspositionTable,
    time_manager: &'a TimeManager,
    abort: &'a AtomicBool,
    node_limit: Option<u64>,
    observer: &'a dyn SearchObserver,
    stats: SearchStats,
    keep_going: bool,
    nodes_next_check: u64,
}

impl<'a> AlphaBeta<'a> {
    pub fn new(
        board: Board,
        root_moves: MoveList,
        tt: &'a mut TranspositionTable,
        time_manager: &'a TimeManager,
        abort: &'a AtomicBool,
        node_limit: Option<u64>,
        observer: &'a dyn SearchObserver,
    ) -> Self {
        AlphaBeta {
            board,
            root_moves,
            tt,
            time_manager,
            abort,
            node_limit,
            observer,
            stats: SearchStats::default(),
            keep_going: true,
            nodes_next_check: NODES_BEFORE_FIRST_CHECK,
        }
    }

    /// Run one full-width iteration to `depth`.
    pub fn start(&mut self, depth: u8) -> SearchResult {
        let mut pv = Pv::new();
        let value = self.root_search(MIN_EVAL, MAX_EVAL, depth, &mut pv);

        let kind = if self.keep_going {
            ResultKind::Complete
        } else if !pv.is_empty() {
            ResultKind::Partial
        } else {
            ResultKind::None
        };

        SearchResult {
            kind,
            pv,
            eval: value,
            stats: self.stats,
        }
    }

    /// Bring a root move to the front so the next iteration searches it
    /// first.
    pub fn promote_root_move(&mut self, mv: Move) {
        if let Some(pos) = self.root_moves.iter().position(|&m| m == mv) {
            self.root_moves.remove(pos);
            self.root_moves.insert(0, mv);
        }
    }

    pub fn root_move_count(&self) -> usize {
        self.root_moves.len()
    }

    fn root_search(&mut self, mut alpha: Eval, beta: Eval, depth: u8, pv: &mut Pv) -> Eval {
        pv.clear();
        self.stats.nodes += 1;

        let mut local_pv = Pv::new();
        let original_alpha = alpha;
        let total = self.root_moves.len() as u16;

        for index in 0..self.root_moves.len() {
            let mv = self.root_moves[index];
            self.observer.on_searching_move_at_root(
                depth,
                0.0,
                index as u16 + 1,
                total,
                self.stats.all_nodes(),
                mv,
            );

            let info = make(&mut self.board, mv);
            let value = if depth > 1 {
                -self.interior(-beta, -alpha, depth - 1, 1, &mut local_pv)
            } else {
                -self.qsearch(-beta, -alpha, 1)
            };
            unmake(&mut self.board, mv, info);

            if !self.keep_going {
                return 0;
            }

            if value >= beta {
                // Even on a fail-high the root must report its new best move.
                pv.extend_from(mv, &local_pv);
                self.tt.insert(
                    self.board.zobrist,
                    mv,
                    EntryKind::LowerBound,
                    depth as u16,
                    0,
                    value,
                );
                return beta;
            }

            if value > alpha {
                alpha = value;
                pv.extend_from(mv, &local_pv);
                if index > 0 {
                    self.observer
                        .on_new_best_move(pv, alpha, depth, 0.0, self.stats.all_nodes());
                }
            }
        }

        if total == 0 {
            return if in_check(&self.board, self.board.side_to_move) {
                mated_value(0)
            } else {
                DRAW
            };
        }

        let kind = if alpha > original_alpha {
            EntryKind::Exact
        } else {
            EntryKind::UpperBound
        };
        self.tt.insert(
            self.board.zobrist,
            pv.first().unwrap_or(Move::NONE),
            kind,
            depth as u16,
            0,
            alpha,
        );
        alpha
    }

    fn interior(
        &mut self,
        mut alpha: Eval,
        beta: Eval,
        depth: u8,
        distance: u32,
        pv: &mut Pv,
    ) -> Eval {
        pv.clear();
        self.stats.nodes += 1;

        if self.nodes_next_check <= self.stats.all_nodes() {
            self.keep_going = !self.abort.load(Ordering::Relaxed)
                && self.time_manager.can_continue()
                && self
                    .node_limit
                    .map_or(true, |limit| self.stats.all_nodes() < limit);
            if !self.keep_going {
                return 0;
            }
            self.nodes_next_check = self.stats.all_nodes()
                + self.time_manager.nodes_before_next_check(self.stats.all_nodes());
        }

        // Repetitions are path-dependent; score them here and keep them out
        // of the transposition table.
        if self.board.is_draw() {
            return DRAW;
        }

        let mut tt_move = Move::NONE;
        self.stats.tt_probes += 1;
        if let Some(hit) = self.tt.probe(self.board.zobrist, distance) {
            self.stats.tt_hits += 1;
            if hit.depth >= depth as u16 {
                match hit.kind {
                    EntryKind::Exact => {
                        self.stats.tt_hits_exact += 1;
                        return hit.eval;
                    }
                    EntryKind::LowerBound if hit.eval >= beta => {
                        self.stats.tt_hits_lower += 1;
                        return beta;
                    }
                    EntryKind::UpperBound if hit.eval <= alpha => {
                        self.stats.tt_hits_upper += 1;
                        return alpha;
                    }
                    _ => {}
                }
            }
            tt_move = hit.mv;
        }

        let original_alpha = alpha;
        let mut local_pv = Pv::new();
        let mut found_a_move = false;
        let mut moves = StagedMoves::full_width(&self.board, tt_move);

        while let Some(mv) = moves.next(&self.board) {
            let mover = self.board.side_to_move;
            let info = make(&mut self.board, mv);

            // Castling was attack-checked at generation; everything else is
            // filtered here, after the make.
            if mv.castling().is_none() && in_check(&self.board, mover) {
                unmake(&mut self.board, mv, info);
                continue;
            }

            let value = if depth > 1 {
                -self.interior(-beta, -alpha, depth - 1, distance + 1, &mut local_pv)
            } else {
                // Hand over to the quiescence search without burning a ply.
                -self.qsearch(-beta, -alpha, distance + 1)
            };
            unmake(&mut self.board, mv, info);

            if !self.keep_going {
                return 0;
            }
            found_a_move = true;

            if value >= beta {
                self.tt.insert(
                    self.board.zobrist,
                    mv,
                    EntryKind::LowerBound,
                    depth as u16,
                    distance,
                    value,
                );
                return beta;
            }

            if value > alpha {
                alpha = value;
                pv.extend_from(mv, &local_pv);
            }
        }

        if !found_a_move {
            return if in_check(&self.board, self.board.side_to_move) {
                mated_value(distance)
            } else {
                DRAW
            };
        }

        let kind = if alpha > original_alpha {
            EntryKind::Exact
        } else {
            EntryKind::UpperBound
        };
        self.tt.insert(
            self.board.zobrist,
            pv.first().unwrap_or(Move::NONE),
            kind,
            depth as u16,
            distance,
            alpha,
        );
        alpha
    }

    fn qsearch(&mut self, mut alpha: Eval, beta: Eval, distance: u32) -> Eval {
        self.stats.qnodes += 1;

        if self.board.is_draw() {
            return DRAW;
        }

        // Stand pat: the side to move may decline every capture.
        let stand_pat = evaluate(&self.board);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let mut moves = StagedMoves::captures_only();
        while let Some(mv) = moves.next(&self.board) {
            let mover = self.board.side_to_move;
            let info = make(&mut self.board, mv);
            if in_check(&self.board, mover) {
                unmake(&mut self.board, mv, info);
                continue;
            }

            let value = -self.qsearch(-beta, -alpha, distance + 1);
            unmake(&mut self.board, mv, info);

            if !self.keep_going {
                return 0;
            }

            if value >= beta {
                return beta;
            }
            if value > alpha {
                alpha = value;
            }
        }

        alpha
    }
}

// ---- Staged move iteration: transposition move, captures in MVV/LVA
// ---- order, then quiets. Quiets are only generated if the node survives
// ---- the earlier stages. Killer/history stages would slot in between.

#[derive(PartialEq)]
enum Stage {
    TtMove,
    Captures,
    Quiets,
    Done,
}

struct StagedMoves {
    stage: Stage,
    tt_move: Move,
    list: MoveList,
    index: usize,
    include_quiets: bool,
}

impl StagedMoves {
    fn full_width(board: &Board, tt_move: Move) -> Self {
        let tt_move = if tt_move_usable(board, tt_move) {
            tt_move
        } else {
            Move::NONE
        };
        StagedMoves {
            stage: Stage::TtMove,
            tt_move,
            list: MoveList::new(),
            index: 0,
            include_quiets: true,
        }
    }

    fn captures_only() -> Self {
        StagedMoves {
            stage: Stage::TtMove,
            tt_move: Move::NONE,
            list: MoveList::new(),
            index: 0,
            include_quiets: false,
        }
    }

    fn next(&mut self, board: &Board) -> Option<Move> {
        loop {
            match self.stage {
                Stage::TtMove => {
                    self.stage = Stage::Captures;
                    self.list.clear();
                    generate_captures(board, &mut self.list);
                    order_captures(&mut self.list);
                    self.index = 0;
                    if !self.tt_move.is_none() {
                        return Some(self.tt_move);
                    }
                }
                Stage::Captures => {
                    while self.index < self.list.len() {
                        let mv = self.list[self.index];
                        self.index += 1;
                        if mv != self.tt_move {
                            return Some(mv);
                        }
                    }
                    if self.include_quiets {
                        self.stage = Stage::Quiets;
                        self.list.clear();
                        generate_quiets(board, &mut self.list);
                        self.index = 0;
                    } else {
                        self.stage = Stage::Done;
                    }
                }
                Stage::Quiets => {
                    while self.index < self.list.len() {
                        let mv = self.list[self.index];
                        self.index += 1;
                        if mv != self.tt_move {
                            return Some(mv);
                        }
                    }
                    self.stage = Stage::Done;
                }
                Stage::Done => return None,
            }
        }
    }
}

/// A transposition move is replayed before move generation, so it must at
/// least match the board it will be made on. Castling moves are left to the
/// quiet stage, which re-validates the king's path.
fn tt_move_usable(board: &Board, mv: Move) -> bool {
    if mv.is_none() || mv.castling().is_some() {
        return false;
    }
    if mv.piece().color() != board.side_to_move {
        return false;
    }
    if board.piece_at(mv.from()) != Some(mv.piece()) {
        return false;
    }
    match mv.captured() {
        None => board.piece_at(mv.to()).is_none(),
        Some(captured) => {
            if board.piece_at(mv.to()) == Some(captured) {
                true
            } else {
                // En passant: the victim is beside the empty target square.
                board.piece_at(mv.to()).is_none()
                    && mv.piece().kind() == crate::board::PieceKind::Pawn
                    && board.ep_file == Some(mv.to().file())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::moves::movegen::generate_legal;
    use crate::search::observer::NullObserver;
    use crate::time::{TimeControl, TimeManager};
    use std::sync::atomic::AtomicBool;

    fn run_fixed_depth(fen: &str, depth: u8) -> SearchResult {
        let mut board = Board::from_fen(fen).unwrap();
        let root_moves = generate_legal(&mut board);
        let mut tt = TranspositionTable::new(8);
        let tm = TimeManager::new(TimeControl {
            infinite: true,
            ..Default::default()
        });
        let abort = AtomicBool::new(false);
        let observer = NullObserver;
        let mut ab = AlphaBeta::new(board, root_moves, &mut tt, &tm, &abort, None, &observer);
        ab.start(depth)
    }

    #[test]
    fn finds_mate_in_one() {
        // Ra8 mates.
        let result = run_fixed_depth("6k1/5ppp/8/8/8/8/8/R3K3 w - - 0 1", 2);
        assert_eq!(result.kind, ResultKind::Complete);
        assert_eq!(result.pv.first().map(|m| m.to_uci()), Some("a1a8".into()));
        assert!(crate::eval::is_mate_eval(result.eval));
    }

    #[test]
    fn prefers_winning_a_queen() {
        // White can take a hanging queen.
        let result = run_fixed_depth("4k3/8/8/3q4/4P3/8/8/4K3 w - - 0 1", 3);
        assert_eq!(result.pv.first().map(|m| m.to_uci()), Some("e4d5".into()));
        assert!(result.eval > 500);
    }

    #[test]
    fn aborted_search_reports_partial_or_none() {
        let mut board = Board::from_fen(crate::board::START_FEN).unwrap();
        let root_moves = generate_legal(&mut board);
        let mut tt = TranspositionTable::new(8);
        let tm = TimeManager::new(TimeControl {
            infinite: true,
            ..Default::default()
        });
        let abort = AtomicBool::new(true);
        let observer = NullObserver;
        let mut ab = AlphaBeta::new(board, root_moves, &mut tt, &tm, &abort, None, &observer);
        // With the abort flag pre-set the first node check stops the search.
        ab.nodes_next_check = 0;
        let result = ab.start(6);
        assert_ne!(result.kind, ResultKind::Complete);
    }

    #[test]
    fn stalemate_scores_zero() {
        // Black to move, classic stalemate corner.
        let result = run_fixed_depth("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 3);
        assert_eq!(result.eval, 0);
        assert!(result.pv.is_empty());
    }

    #[test]
    fn tt_move_validation_rejects_stale_moves() {
        let board = Board::from_fen(crate::board::START_FEN).unwrap();
        // A move whose from-square holds no knight of the right color.
        let bogus = Move::quiet(
            crate::square::Square::parse("e4").unwrap(),
            crate::square::Square::parse("e5").unwrap(),
            crate::board::Piece::new(crate::board::Color::White, crate::board::PieceKind::Knight),
        );
        assert!(!tt_move_usable(&board, bogus));
        assert!(!tt_move_usable(&board, Move::NONE));
    }
}
