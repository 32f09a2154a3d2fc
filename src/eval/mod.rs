//! Static evaluation and the mate-score conventions shared by the search
//! and the transposition table.

pub mod psqt;

use crate::board::{Board, Color};

pub type Eval = i32;

/// Mate score magnitude; a position evaluated at `MATE - n` is a mate in
/// `n` plies.
pub const MATE: Eval = 30_000;
/// Evaluations within this band of `±MATE` are mate scores.
pub const MATE_BAND: Eval = 1_000;

pub const MIN_EVAL: Eval = -MATE - 1;
pub const MAX_EVAL: Eval = MATE + 1;

pub const DRAW: Eval = 0;

/// Evaluate the position from the side to move's point of view. The board
/// maintains the phase-tapered piece-square sums incrementally; the sign
/// flip is all that is left to do.
#[inline]
pub fn evaluate(board: &Board) -> Eval {
    let white_value = board.material_value();
    match board.side_to_move {
        Color::White => white_value,
        Color::Black => -white_value,
    }
}

/// Value of being checkmated `distance` plies from the root.
#[inline]
pub fn mated_value(distance: u32) -> Eval {
    -MATE + distance as Eval
}

#[inline]
pub fn is_mate_eval(eval: Eval) -> bool {
    eval > MATE - MATE_BAND || eval < -MATE + MATE_BAND
}

/// Rebase a mate score from root-relative to node-relative before storing it
/// in the transposition table.
#[inline]
pub fn remove_distance_from_mate(eval: Eval, distance: u32) -> Eval {
    if eval > MATE - MATE_BAND {
        eval + distance as Eval
    } else if eval < -MATE + MATE_BAND {
        eval - distance as Eval
    } else {
        eval
    }
}

/// Inverse of `remove_distance_from_mate`, applied on probe.
#[inline]
pub fn add_distance_to_mate(eval: Eval, distance: u32) -> Eval {
    if eval > MATE - MATE_BAND {
        eval - distance as Eval
    } else if eval < -MATE + MATE_BAND {
        eval + distance as Eval
    } else {
        eval
    }
}

/// Signed mate distance in moves for UCI `score mate` output: positive when
/// the side to move mates, negative when it is mated.
#[inline]
pub fn mate_in_moves(eval: Eval) -> i32 {
    debug_assert!(is_mate_eval(eval));
    if eval > 0 {
        (MATE - eval + 1) / 2
    } else {
        -((MATE + eval) / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, START_FEN};

    #[test]
    fn start_position_is_balanced() {
        let board = Board::from_fen(START_FEN).unwrap();
        assert_eq!(evaluate(&board), 0);
    }

    #[test]
    fn evaluation_is_symmetric_in_side_to_move() {
        let white = Board::from_fen("4k3/8/8/8/8/8/8/Q3K3 w - - 0 1").unwrap();
        let black = Board::from_fen("4k3/8/8/8/8/8/8/Q3K3 b - - 0 1").unwrap();
        assert_eq!(evaluate(&white), -evaluate(&black));
        assert!(evaluate(&white) > 0, "white is a queen up");
    }

    #[test]
    fn mate_distance_adjustment_round_trips() {
        let mate_in_3 = MATE - 3;
        let stored = remove_distance_from_mate(mate_in_3, 5);
        assert_eq!(add_distance_to_mate(stored, 5), mate_in_3);

        let mated_in_2 = -MATE + 2;
        let stored = remove_distance_from_mate(mated_in_2, 7);
        assert_eq!(add_distance_to_mate(stored, 7), mated_in_2);

        assert_eq!(remove_distance_from_mate(137, 9), 137);
    }

    #[test]
    fn mate_in_moves_matches_convention() {
        // Mate delivered at ply 5 from the root: mate in 3 moves.
        assert_eq!(mate_in_moves(MATE - 5), 3);
        assert_eq!(mate_in_moves(MATE - 1), 1);
        // Being mated at ply 4: mate in -2.
        assert_eq!(mate_in_moves(-MATE + 4), -2);
    }
}
