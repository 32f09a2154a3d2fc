//! Make and unmake. Every mutation flows through the board's piece
//! primitives so the bitboards, mailbox, accumulators and hash stay in sync;
//! `UnmakeInfo` carries only the state a move cannot reconstruct.

use crate::board::{Board, CastleSide, Color, Piece, PieceKind};
use crate::moves::types::Move;
use crate::square::Square;

/// Prior en-passant file, castling rights and half-move clock, packed the
/// same way the board stores them: ep file (0xFF = none) in bits 24..32,
/// rights in bits 20..24, clock in bits 0..20.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnmakeInfo(u32);

impl UnmakeInfo {
    #[inline(always)]
    fn new(ep_file: Option<u8>, rights: u8, halfmove_clock: u32) -> Self {
        debug_assert!(halfmove_clock < 1 << 20);
        let ep = ep_file.map_or(0xFFu32, |f| f as u32);
        UnmakeInfo(ep << 24 | (rights as u32) << 20 | halfmove_clock)
    }

    #[inline(always)]
    fn ep_file(self) -> Option<u8> {
        match self.0 >> 24 {
            0xFF => None,
            f => Some(f as u8),
        }
    }

    #[inline(always)]
    fn rights(self) -> u8 {
        (self.0 >> 20 & 0xF) as u8
    }

    #[inline(always)]
    fn halfmove_clock(self) -> u32 {
        self.0 & 0xFFFFF
    }
}

/// King destination file for a castling side (c or g).
#[inline(always)]
pub fn king_castle_file(side: CastleSide) -> u8 {
    match side {
        CastleSide::Queen => 2,
        CastleSide::King => 6,
    }
}

/// Rook destination file for a castling side (d or f).
#[inline(always)]
pub fn rook_castle_file(side: CastleSide) -> u8 {
    match side {
        CastleSide::Queen => 3,
        CastleSide::King => 5,
    }
}

/// True when this pawn-takes-pawn move is an en-passant capture given the
/// en-passant file in effect before the move. The target square of an
/// available en-passant capture is always empty, so the test cannot mistake
/// an ordinary capture for one.
#[inline(always)]
fn is_en_passant(mv: Move, ep_file: Option<u8>, mover: Color) -> bool {
    mv.piece().kind() == PieceKind::Pawn
        && mv.captured().map(|p| p.kind()) == Some(PieceKind::Pawn)
        && ep_file == Some(mv.to().file())
        && mv.to().relative_rank(mover) == 5
}

pub fn make(board: &mut Board, mv: Move) -> UnmakeInfo {
    debug_assert_eq!(mv.piece().color(), board.side_to_move);

    board.history.push(board.zobrist);

    let color = board.side_to_move;
    let from = mv.from();
    let to = mv.to();
    let piece = mv.piece();
    let info = UnmakeInfo::new(board.ep_file, board.castling_rights, board.halfmove_clock);

    // Full-move counter ticks after black's move, per FEN conventions.
    board.fullmove_number += color as u32;

    let mut new_rights = board.castling_rights;

    if let Some(side) = mv.castling() {
        // The rook origin comes from the castle files, the destinations are
        // fixed; removing both pieces before adding either keeps the scheme
        // correct when Fischer-random squares overlap.
        let home = color.home_rank();
        let rook_from = Square::new(board.castle_file(side), home);
        let rook_to = Square::new(rook_castle_file(side), home);

        board.remove_piece(from);
        board.remove_piece(rook_from);
        board.add_piece(to, piece);
        board.add_piece(rook_to, Piece::new(color, PieceKind::Rook));

        new_rights &= !(CastleSide::Queen.flag(color) | CastleSide::King.flag(color));
        board.halfmove_clock += 1;
    } else {
        if let Some(captured) = mv.captured() {
            let capture_sq = if is_en_passant(mv, board.ep_file, color) {
                // The captured pawn sits beside the destination square.
                Square::new(to.file(), from.rank())
            } else {
                to
            };
            debug_assert_eq!(board.piece_at(capture_sq), Some(captured));
            board.remove_piece(capture_sq);
            board.halfmove_clock = 0;

            // Capturing a rook on its original castling square forfeits the
            // captured side's right there.
            if captured.kind() == PieceKind::Rook {
                new_rights &= !castle_right_on(board, captured.color(), capture_sq);
            }
        } else if piece.kind() == PieceKind::Pawn {
            board.halfmove_clock = 0;
        } else {
            board.halfmove_clock += 1;
        }

        if let Some(promote_to) = mv.promotion() {
            board.remove_piece(from);
            board.add_piece(to, promote_to);
        } else {
            board.move_piece(from, to);
        }

        match piece.kind() {
            PieceKind::King => {
                new_rights &= !(CastleSide::Queen.flag(color) | CastleSide::King.flag(color));
            }
            PieceKind::Rook => {
                new_rights &= !castle_right_on(board, color, from);
            }
            _ => {}
        }
    }

    // A double push exposes its file to en passant; every other move clears
    // the column.
    let double_push = piece.kind() == PieceKind::Pawn
        && (to.index() as i16 - from.index() as i16).unsigned_abs() == 16;
    board.set_ep_file(if double_push { Some(to.file()) } else { None });

    board.set_castling_rights(new_rights);
    board.flip_side_to_move();

    #[cfg(debug_assertions)]
    debug_assert_eq!(board.zobrist, board.compute_zobrist_full());

    info
}

pub fn unmake(board: &mut Board, mv: Move, info: UnmakeInfo) {
    let color = mv.piece().color();
    let from = mv.from();
    let to = mv.to();

    board.flip_side_to_move();
    board.fullmove_number -= color as u32;
    board.set_castling_rights(info.rights());
    board.set_ep_file(info.ep_file());
    board.halfmove_clock = info.halfmove_clock();

    if let Some(side) = mv.castling() {
        let home = color.home_rank();
        let rook_from = Square::new(board.castle_file(side), home);
        let rook_to = Square::new(rook_castle_file(side), home);

        board.remove_piece(to);
        board.remove_piece(rook_to);
        board.add_piece(from, mv.piece());
        board.add_piece(rook_from, Piece::new(color, PieceKind::Rook));
    } else {
        if mv.promotion().is_some() {
            board.remove_piece(to);
            board.add_piece(from, Piece::new(color, PieceKind::Pawn));
        } else {
            board.move_piece(to, from);
        }

        if let Some(captured) = mv.captured() {
            let capture_sq = if is_en_passant(mv, info.ep_file(), color) {
                Square::new(to.file(), from.rank())
            } else {
                to
            };
            board.add_piece(capture_sq, captured);
        }
    }

    board.history.pop();

    #[cfg(debug_assertions)]
    debug_assert_eq!(board.zobrist, board.compute_zobrist_full());
}

/// Castling-right flag forfeited by a rook of `color` leaving or being
/// captured on `sq`, or 0 when `sq` is not one of its castling squares.
#[inline]
fn castle_right_on(board: &Board, color: Color, sq: Square) -> u8 {
    if sq.rank() != color.home_rank() {
        return 0;
    }
    let mut flags = 0;
    if sq.file() == board.castle_file(CastleSide::Queen) {
        flags |= CastleSide::Queen.flag(color);
    }
    if sq.file() == board.castle_file(CastleSide::King) {
        flags |= CastleSide::King.flag(color);
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Color, Piece, PieceKind, START_FEN};
    use crate::moves::types::Move;
    use crate::square::Square;

    fn wp() -> Piece {
        Piece::new(Color::White, PieceKind::Pawn)
    }

    #[test]
    fn double_push_sets_ep_file_and_unmake_restores() {
        let mut board = Board::from_fen(START_FEN).unwrap();
        let before = board.clone();
        let mv = Move::quiet(
            Square::parse("e2").unwrap(),
            Square::parse("e4").unwrap(),
            wp(),
        );
        let info = make(&mut board, mv);
        assert_eq!(board.ep_file, Some(4));
        assert_eq!(board.side_to_move, Color::Black);
        assert_eq!(board.halfmove_clock, 0);
        unmake(&mut board, mv, info);
        assert_eq!(board, before);
    }

    #[test]
    fn en_passant_removes_the_bypassed_pawn() {
        let mut board =
            Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2").unwrap();
        let before = board.clone();
        let mv = Move::capture(
            Square::parse("e5").unwrap(),
            Square::parse("d6").unwrap(),
            wp(),
            Piece::new(Color::Black, PieceKind::Pawn),
        );
        let info = make(&mut board, mv);
        assert_eq!(board.piece_at(Square::parse("d5").unwrap()), None);
        assert_eq!(
            board.piece_at(Square::parse("d6").unwrap()),
            Some(wp())
        );
        unmake(&mut board, mv, info);
        assert_eq!(board, before);
    }

    #[test]
    fn capturing_a_castling_rook_clears_the_right() {
        let mut board =
            Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let mv = Move::capture(
            Square::parse("a1").unwrap(),
            Square::parse("a8").unwrap(),
            Piece::new(Color::White, PieceKind::Rook),
            Piece::new(Color::Black, PieceKind::Rook),
        );
        let info = make(&mut board, mv);
        // Both queen-side rights are gone: white's rook left a1, black's died on a8.
        assert!(!board.has_castle_right(Color::Black, crate::board::CastleSide::Queen));
        assert!(!board.has_castle_right(Color::White, crate::board::CastleSide::Queen));
        assert!(board.has_castle_right(Color::White, crate::board::CastleSide::King));
        unmake(&mut board, mv, info);
        assert_eq!(board.castling_rights, 0b1111);
    }

    #[test]
    fn castling_moves_both_pieces_and_clears_rights() {
        let mut board =
            Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let before = board.clone();
        let mv = Move::castle(
            Square::E1,
            Square::parse("g1").unwrap(),
            Piece::new(Color::White, PieceKind::King),
            crate::board::CastleSide::King,
        );
        let info = make(&mut board, mv);
        assert_eq!(
            board.piece_at(Square::parse("g1").unwrap()).map(|p| p.kind()),
            Some(PieceKind::King)
        );
        assert_eq!(
            board.piece_at(Square::parse("f1").unwrap()).map(|p| p.kind()),
            Some(PieceKind::Rook)
        );
        assert!(board.piece_at(Square::E1).is_none());
        assert!(!board.has_castle_right(Color::White, crate::board::CastleSide::King));
        assert!(board.has_castle_right(Color::Black, crate::board::CastleSide::King));
        unmake(&mut board, mv, info);
        assert_eq!(board, before);
    }

    #[test]
    fn promotion_with_capture_round_trips() {
        let mut board = Board::from_fen("rn2k3/1P6/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let before = board.clone();
        let mv = Move::promote(
            Square::parse("b7").unwrap(),
            Square::parse("a8").unwrap(),
            wp(),
            Piece::new(Color::White, PieceKind::Queen),
            Some(Piece::new(Color::Black, PieceKind::Rook)),
        );
        let info = make(&mut board, mv);
        assert_eq!(
            board.piece_at(Square::parse("a8").unwrap()).map(|p| p.kind()),
            Some(PieceKind::Queen)
        );
        unmake(&mut board, mv, info);
        assert_eq!(board, before);
    }

    #[test]
    fn fullmove_number_follows_black_moves() {
        let mut board = Board::from_fen(START_FEN).unwrap();
        let e4 = Move::quiet(
            Square::parse("e2").unwrap(),
            Square::parse("e4").unwrap(),
            wp(),
        );
        make(&mut board, e4);
        assert_eq!(board.fullmove_number, 1);
        let e5 = Move::quiet(
            Square::parse("e7").unwrap(),
            Square::parse("e5").unwrap(),
            Piece::new(Color::Black, PieceKind::Pawn),
        );
        make(&mut board, e5);
        assert_eq!(board.fullmove_number, 2);
    }
}
