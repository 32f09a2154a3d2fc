//! Piece-square tables, one set per game phase, built from configuration.
//! Stored per (color, kind, square) with white positive and black negated on
//! the mirrored square, so the board can accumulate material incrementally
//! with plain additions.

use once_cell::sync::OnceCell;

use crate::config::Config;

/// Game-phase weights per piece kind; the phase estimate saturates at
/// `PHASE_MAX` (the starting material).
pub const PHASE_WEIGHTS: [i32; 6] = [0, 1, 1, 2, 4, 0];
pub const PHASE_MAX: i32 = 24;

pub struct PsqTables {
    /// [color][kind][square], middlegame.
    pub mg: [[[i32; 64]; 6]; 2],
    /// [color][kind][square], endgame.
    pub eg: [[[i32; 64]; 6]; 2],
    /// [kind]
    pub phase: [i32; 6],
}

// Square bonuses from white's point of view, written rank 8 first so the
// literals read like a board diagram.

#[rustfmt::skip]
const PAWN_MG: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 25, 25, 10,  5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const PAWN_EG: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    80, 80, 80, 80, 80, 80, 80, 80,
    50, 50, 50, 50, 50, 50, 50, 50,
    30, 30, 30, 30, 30, 30, 30, 30,
    20, 20, 20, 20, 20, 20, 20, 20,
    10, 10, 10, 10, 10, 10, 10, 10,
    10, 10, 10, 10, 10, 10, 10, 10,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_MG: [i32; 64] = [
   -50,-40,-30,-30,-30,-30,-40,-50,
   -40,-20,  0,  0,  0,  0,-20,-40,
   -30,  0, 10, 15, 15, 10,  0,-30,
   -30,  5, 15, 20, 20, 15,  5,-30,
   -30,  0, 15, 20, 20, 15,  0,-30,
   -30,  5, 10, 15, 15, 10,  5,-30,
   -40,-20,  0,  5,  5,  0,-20,-40,
   -50,-40,-30,-30,-30,-30,-40,-50,
];

#[rustfmt::skip]
const BISHOP_MG: [i32; 64] = [
   -20,-10,-10,-10,-10,-10,-10,-20,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -10,  0,  5, 10, 10,  5,  0,-10,
   -10,  5,  5, 10, 10,  5,  5,-10,
   -10,  0, 10, 10, 10, 10,  0,-10,
   -10, 10, 10, 10, 10, 10, 10,-10,
   -10,  5,  0,  0,  0,  0,  5,-10,
   -20,-10,-10,-10,-10,-10,-10,-20,
];

#[rustfmt::skip]
const ROOK_MG: [i32; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
];

#[rustfmt::skip]
const QUEEN_MG: [i32; 64] = [
   -20,-10,-10, -5, -5,-10,-10,-20,
   -10,  0,  0,  0,  0,  0,  0,-10,
   -10,  0,  5,  5,  5,  5,  0,-10,
    -5,  0,  5,  5,  5,  5,  0, -5,
     0,  0,  5,  5,  5,  5,  0, -5,
   -10,  5,  5,  5,  5,  5,  0,-10,
   -10,  0,  5,  0,  0,  0,  0,-10,
   -20,-10,-10, -5, -5,-10,-10,-20,
];

#[rustfmt::skip]
const KING_MG: [i32; 64] = [
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -30,-40,-40,-50,-50,-40,-40,-30,
   -20,-30,-30,-40,-40,-30,-30,-20,
   -10,-20,-20,-20,-20,-20,-20,-10,
    20, 20,  0,  0,  0,  0, 20, 20,
    20, 30, 10,  0,  0, 10, 30, 20,
];

#[rustfmt::skip]
const KING_EG: [i32; 64] = [
   -50,-40,-30,-20,-20,-30,-40,-50,
   -30,-20,-10,  0,  0,-10,-20,-30,
   -30,-10, 20, 30, 30, 20,-10,-30,
   -30,-10, 30, 40, 40, 30,-10,-30,
   -30,-10, 30, 40, 40, 30,-10,-30,
   -30,-10, 20, 30, 30, 20,-10,-30,
   -30,-30,  0,  0,  0,  0,-30,-30,
   -50,-30,-30,-30,-30,-30,-30,-50,
];

fn default_square_table(kind: usize, endgame: bool) -> &'static [i32; 64] {
    match (kind, endgame) {
        (0, false) => &PAWN_MG,
        (0, true) => &PAWN_EG,
        (1, _) => &KNIGHT_MG,
        (2, _) => &BISHOP_MG,
        (3, _) => &ROOK_MG,
        (4, _) => &QUEEN_MG,
        (5, false) => &KING_MG,
        (5, true) => &KING_EG,
        _ => unreachable!(),
    }
}

fn build(config: &Config) -> PsqTables {
    let mut tables = PsqTables {
        mg: [[[0; 64]; 6]; 2],
        eg: [[[0; 64]; 6]; 2],
        phase: PHASE_WEIGHTS,
    };

    for kind in 0..6 {
        for visual in 0..64usize {
            // The literals read rank 8 first; convert to a1 = 0 indexing.
            let rank = 7 - visual / 8;
            let file = visual % 8;
            let white_sq = rank * 8 + file;
            let black_sq = white_sq ^ 56;

            // Configured tables have been shape-checked by validation.
            let mg_bonus = config
                .psqt_mg
                .as_ref()
                .map_or(default_square_table(kind, false)[visual], |t| {
                    t[kind][visual]
                });
            let eg_bonus = config
                .psqt_eg
                .as_ref()
                .map_or(default_square_table(kind, true)[visual], |t| {
                    t[kind][visual]
                });

            let mg = config.piece_values_mg[kind] + mg_bonus;
            let eg = config.piece_values_eg[kind] + eg_bonus;

            tables.mg[0][kind][white_sq] = mg;
            tables.eg[0][kind][white_sq] = eg;
            tables.mg[1][kind][black_sq] = -mg;
            tables.eg[1][kind][black_sq] = -eg;
        }
    }

    tables
}

static TABLES: OnceCell<PsqTables> = OnceCell::new();

/// Install tables derived from `config`. A no-op if a board has already
/// forced the defaults; call it before constructing any board.
pub fn configure(config: &Config) {
    if TABLES.set(build(config)).is_err() {
        tracing::warn!("piece-square tables already initialized; configuration ignored");
    }
}

pub fn tables() -> &'static PsqTables {
    TABLES.get_or_init(|| build(&Config::default()))
}
