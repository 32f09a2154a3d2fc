//! Reference perft counts: the ground truth for move generation, legality
//! filtering and make/unmake.

use meridian::board::Board;
use meridian::moves::perft::perft;
use std::str::FromStr;

fn assert_perft(fen: &str, depth: u32, expected: u64) {
    let mut board = Board::from_str(fen).unwrap();
    assert_eq!(perft(&mut board, depth), expected, "perft({}) of {}", depth, fen);
}

#[test]
fn start_position_depth_5() {
    assert_perft(
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        5,
        4_865_609,
    );
}

#[test]
fn kiwipete_depth_4() {
    assert_perft(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -",
        4,
        4_085_603,
    );
}

#[test]
fn endgame_depth_5() {
    assert_perft("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - -", 5, 674_624);
}

#[test]
fn promotion_heavy_depth_4() {
    assert_perft(
        "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
        4,
        422_333,
    );
}

#[test]
fn tactical_depth_4() {
    assert_perft(
        "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        4,
        2_103_487,
    );
}

#[test]
fn symmetric_middlegame_depth_4() {
    assert_perft(
        "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
        4,
        3_894_594,
    );
}

#[test]
fn shallow_cross_checks() {
    // Cheap counts that catch gross generator regressions quickly.
    assert_perft("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", 3, 8_902);
    assert_perft(
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq -",
        2,
        2_039,
    );
    assert_perft("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - -", 3, 2_812);
}
