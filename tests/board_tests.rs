//! Board consistency over a FEN corpus: bitboards against the mailbox, the
//! incremental zobrist key against a scratch recomputation, and FEN
//! round-trips.

use meridian::board::Board;
use std::str::FromStr;

const CORPUS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
    "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1",
    "4k3/8/8/8/8/8/8/4K2R w K - 42 99",
    "1r2k1r1/8/8/8/8/8/8/1R2K1R1 w GBgb - 0 1",
];

#[test]
fn corpus_invariants_hold_after_parsing() {
    for fen in CORPUS {
        let board = Board::from_str(fen).unwrap();
        board.assert_consistent();
    }
}

#[test]
fn fen_round_trips_byte_for_byte() {
    for fen in CORPUS {
        let board = Board::from_str(fen).unwrap();
        assert_eq!(&board.to_fen(), fen, "round-trip of {}", fen);
    }
}

#[test]
fn reparsed_fen_preserves_the_hash() {
    for fen in CORPUS {
        let board = Board::from_str(fen).unwrap();
        let reparsed = Board::from_str(&board.to_fen()).unwrap();
        assert_eq!(board.zobrist, reparsed.zobrist, "hash of {}", fen);
        assert_eq!(board.zobrist, board.compute_zobrist_full());
    }
}

#[test]
fn side_to_move_changes_the_hash() {
    let white = Board::from_str("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
    let black = Board::from_str("4k3/8/8/8/8/8/8/4K3 b - - 0 1").unwrap();
    assert_ne!(white.zobrist, black.zobrist);
}

#[test]
fn castling_rights_change_the_hash() {
    let all = Board::from_str("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let none = Board::from_str("r3k2r/8/8/8/8/8/8/R3K2R w - - 0 1").unwrap();
    assert_ne!(all.zobrist, none.zobrist);
}
