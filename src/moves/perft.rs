//! Perft: count the leaves of the legal move tree. The ground truth for the
//! generator and the make/unmake machinery.

use crate::board::Board;
use crate::moves::execute::{make, unmake};
use crate::moves::movegen::generate_all;
use crate::moves::square_control::in_check;
use crate::moves::types::{Move, MoveList};

pub fn perft(board: &mut Board, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut list = MoveList::new();
    generate_all(board, &mut list);

    let mover = board.side_to_move;
    let mut nodes = 0;
    for mv in list {
        let info = make(board, mv);
        // Castling legality is fully checked at generation time.
        if mv.castling().is_some() || !in_check(board, mover) {
            nodes += if depth == 1 {
                1
            } else {
                perft(board, depth - 1)
            };
        }
        unmake(board, mv, info);
    }
    nodes
}

/// Per-root-move subtree counts, for diffing against another engine.
pub fn divide(board: &mut Board, depth: u32) -> Vec<(Move, u64)> {
    assert!(depth >= 1);
    let mut list = MoveList::new();
    generate_all(board, &mut list);

    let mover = board.side_to_move;
    let mut counts = Vec::new();
    for mv in list {
        let info = make(board, mv);
        if mv.castling().is_some() || !in_check(board, mover) {
            counts.push((mv, perft(board, depth - 1)));
        }
        unmake(board, mv, info);
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, START_FEN};

    #[test]
    fn shallow_start_position_counts() {
        let mut board = Board::from_fen(START_FEN).unwrap();
        assert_eq!(perft(&mut board, 1), 20);
        assert_eq!(perft(&mut board, 2), 400);
        assert_eq!(perft(&mut board, 3), 8_902);
    }

    #[test]
    fn divide_sums_to_perft() {
        let mut board = Board::from_fen(START_FEN).unwrap();
        let total: u64 = divide(&mut board, 3).iter().map(|(_, n)| n).sum();
        assert_eq!(total, perft(&mut board, 3));
    }
}
