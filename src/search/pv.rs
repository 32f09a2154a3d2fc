//! The principal variation: the engine's expected line of play, rebuilt
//! bottom-up as the search unwinds.

use arrayvec::ArrayVec;
use std::fmt;

use crate::moves::types::Move;

/// Longer lines than this are truncated; deeper search than this is not
/// reachable anyway.
pub const MAX_PV_LEN: usize = 128;

#[derive(Debug, Clone, Default)]
pub struct Pv {
    moves: ArrayVec<Move, MAX_PV_LEN>,
}

impl Pv {
    pub fn new() -> Self {
        Pv {
            moves: ArrayVec::new(),
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    #[inline(always)]
    pub fn first(&self) -> Option<Move> {
        self.moves.first().copied()
    }

    #[inline(always)]
    pub fn clear(&mut self) {
        self.moves.clear();
    }

    /// Replace this line with `mv` followed by `tail`'s moves.
    pub fn extend_from(&mut self, mv: Move, tail: &Pv) {
        self.moves.clear();
        self.moves.push(mv);
        for &m in tail.moves.iter().take(MAX_PV_LEN - 1) {
            self.moves.push(m);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Move> {
        self.moves.iter()
    }
}

impl fmt::Display for Pv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for mv in &self.moves {
            if !first {
                write!(f, " ")?;
            }
            write!(f, "{}", mv)?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Color, Piece, PieceKind};
    use crate::square::Square;

    fn mv(uci_from: &str, uci_to: &str) -> Move {
        Move::quiet(
            Square::parse(uci_from).unwrap(),
            Square::parse(uci_to).unwrap(),
            Piece::new(Color::White, PieceKind::Knight),
        )
    }

    #[test]
    fn extend_prepends_the_move() {
        let mut tail = Pv::new();
        tail.extend_from(mv("g1", "f3"), &Pv::new());

        let mut line = Pv::new();
        line.extend_from(mv("e2", "e4"), &tail);

        assert_eq!(line.len(), 2);
        assert_eq!(line.first(), Some(mv("e2", "e4")));
        assert_eq!(line.to_string(), "e2e4 g1f3");
    }

    #[test]
    fn extend_truncates_at_capacity() {
        let mut long = Pv::new();
        let filler = mv("a1", "b3");
        for _ in 0..MAX_PV_LEN {
            let prev = long.clone();
            long.extend_from(filler, &prev);
        }
        let mut line = Pv::new();
        line.extend_from(filler, &long);
        assert_eq!(line.len(), MAX_PV_LEN);
    }
}
