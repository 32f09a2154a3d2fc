//! Ray relations between pairs of squares: the `between` and `direction`
//! tables, indexed by the 0x88 difference of the two squares (range
//! [-119, 119], offset by 120 into 240-entry arrays).
//!
//! Both tables are symmetric: `between(a, b) == between(b, a)` and likewise
//! for `direction`. Castling legality and pin detection rely on this.

use once_cell::sync::Lazy;

use crate::bitboard::{single_bb, Bitboard, EMPTY_BB};
use crate::square::Square;

/// Direction of the line through two squares, if they share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Horizontal,
    Vertical,
    Diagonal,
    AntiDiagonal,
}

const DELTA: usize = 120;

#[inline(always)]
fn ox88_diff(from: Square, to: Square) -> isize {
    let f = (from.rank() as isize) * 16 + from.file() as isize;
    let t = (to.rank() as isize) * 16 + to.file() as isize;
    t - f
}

struct Geometry {
    /// Direction of the relation, by 0x88 difference.
    direction: [Option<Direction>; 240],
    /// Squares strictly between `from` and `to`, by (from, to) pair. Empty
    /// when the squares do not share a ray.
    between: [[Bitboard; 64]; 64],
}

static GEOMETRY: Lazy<Geometry> = Lazy::new(|| {
    let mut direction = [None; 240];

    // One sweep per direction from a fixed origin covers every possible 0x88
    // difference for that direction, in both signs.
    let origin = Square::A1;
    for file in 1..8u8 {
        let to = Square::new(file, 0);
        direction[(ox88_diff(origin, to) + DELTA as isize) as usize] = Some(Direction::Horizontal);
        direction[(ox88_diff(to, origin) + DELTA as isize) as usize] = Some(Direction::Horizontal);
    }
    for rank in 1..8u8 {
        let to = Square::new(0, rank);
        direction[(ox88_diff(origin, to) + DELTA as isize) as usize] = Some(Direction::Vertical);
        direction[(ox88_diff(to, origin) + DELTA as isize) as usize] = Some(Direction::Vertical);
    }
    for step in 1..8u8 {
        let to = Square::new(step, step);
        direction[(ox88_diff(origin, to) + DELTA as isize) as usize] = Some(Direction::Diagonal);
        direction[(ox88_diff(to, origin) + DELTA as isize) as usize] = Some(Direction::Diagonal);
    }
    let top = Square::A8;
    for step in 1..8u8 {
        let to = Square::new(step, 7 - step);
        direction[(ox88_diff(top, to) + DELTA as isize) as usize] = Some(Direction::AntiDiagonal);
        direction[(ox88_diff(to, top) + DELTA as isize) as usize] = Some(Direction::AntiDiagonal);
    }

    let mut between = [[EMPTY_BB; 64]; 64];
    for from in 0..64u8 {
        for to in 0..64u8 {
            let f = Square::from_index(from);
            let t = Square::from_index(to);
            let diff = ox88_diff(f, t);
            if direction[(diff + DELTA as isize) as usize].is_none() {
                continue;
            }
            // Walk from `from` towards `to` one step at a time.
            let d_rank = (t.rank() as isize - f.rank() as isize).signum();
            let d_file = (t.file() as isize - f.file() as isize).signum();
            let mut rank = f.rank() as isize + d_rank;
            let mut file = f.file() as isize + d_file;
            let mut bb = EMPTY_BB;
            while (rank, file) != (t.rank() as isize, t.file() as isize) {
                bb |= single_bb((rank * 8 + file) as u8);
                rank += d_rank;
                file += d_file;
            }
            between[from as usize][to as usize] = bb;
        }
    }

    Geometry { direction, between }
});

pub fn init() {
    Lazy::force(&GEOMETRY);
}

/// Squares strictly between two squares sharing a ray; empty otherwise.
#[inline(always)]
pub fn between(from: Square, to: Square) -> Bitboard {
    GEOMETRY.between[from.index() as usize][to.index() as usize]
}

/// Direction of the line through two squares, or None.
#[inline(always)]
pub fn direction(from: Square, to: Square) -> Option<Direction> {
    GEOMETRY.direction[(ox88_diff(from, to) + DELTA as isize) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitboard::single_bb;

    #[test]
    fn between_is_symmetric() {
        for a in 0..64u8 {
            for b in 0..64u8 {
                let sa = Square::from_index(a);
                let sb = Square::from_index(b);
                assert_eq!(between(sa, sb), between(sb, sa));
            }
        }
    }

    #[test]
    fn between_on_a_file() {
        let bb = between(Square::A1, Square::A8);
        assert_eq!(bb.count_ones(), 6);
        assert!(bb & single_bb(8) != 0 && bb & single_bb(48) != 0);
    }

    #[test]
    fn between_adjacent_and_unrelated_is_empty() {
        assert_eq!(between(Square::E1, Square::from_index(5)), 0);
        // e1 and d3 share no ray.
        assert_eq!(between(Square::E1, Square::new(3, 2)), 0);
    }

    #[test]
    fn directions() {
        assert_eq!(
            direction(Square::A1, Square::H1),
            Some(Direction::Horizontal)
        );
        assert_eq!(direction(Square::A1, Square::A8), Some(Direction::Vertical));
        assert_eq!(direction(Square::A1, Square::H8), Some(Direction::Diagonal));
        assert_eq!(
            direction(Square::A8, Square::H1),
            Some(Direction::AntiDiagonal)
        );
        assert_eq!(direction(Square::A1, Square::new(2, 1)), None);
    }
}
