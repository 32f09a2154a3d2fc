//! Attack queries: who controls a square, check detection, and x-ray pins.

use crate::bitboard::{Bitboard, EMPTY_BB};
use crate::board::{Board, Color, PieceKind};
use crate::moves::geometry::between;
use crate::moves::magic::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks,
};
use crate::square::Square;

/// Bitboard of every piece of either color attacking `sq`, computed by
/// asking back: generate each piece's attack pattern from `sq` and intersect
/// it with the matching piece bitboards.
pub fn attacks_to(board: &Board, sq: Square) -> Bitboard {
    let occ = board.occupied();

    let rooks_queens = board.pieces(Color::White, PieceKind::Rook)
        | board.pieces(Color::Black, PieceKind::Rook)
        | board.pieces(Color::White, PieceKind::Queen)
        | board.pieces(Color::Black, PieceKind::Queen);
    let bishops_queens = board.pieces(Color::White, PieceKind::Bishop)
        | board.pieces(Color::Black, PieceKind::Bishop)
        | board.pieces(Color::White, PieceKind::Queen)
        | board.pieces(Color::Black, PieceKind::Queen);
    let knights = board.pieces(Color::White, PieceKind::Knight)
        | board.pieces(Color::Black, PieceKind::Knight);
    let kings =
        board.pieces(Color::White, PieceKind::King) | board.pieces(Color::Black, PieceKind::King);

    // A white pawn attacks `sq` from where a black pawn on `sq` would attack.
    let white_pawns =
        pawn_attacks(Color::Black, sq) & board.pieces(Color::White, PieceKind::Pawn);
    let black_pawns =
        pawn_attacks(Color::White, sq) & board.pieces(Color::Black, PieceKind::Pawn);

    (rook_attacks(sq, occ) & rooks_queens)
        | (bishop_attacks(sq, occ) & bishops_queens)
        | (knight_attacks(sq) & knights)
        | (king_attacks(sq) & kings)
        | white_pawns
        | black_pawns
}

/// True when `color`'s king is attacked.
#[inline]
pub fn in_check(board: &Board, color: Color) -> bool {
    let king_sq = board.king_square(color);
    attacks_to(board, king_sq) & board.occupancy(color.opposite()) != EMPTY_BB
}

/// Pieces of `color` pinned against their own king: the slider attack from
/// the king is re-run with the first blockers removed (x-ray); own pieces
/// sitting between the king and a revealed enemy slider are pinned.
pub fn pinned_pieces(board: &Board, color: Color) -> Bitboard {
    let king_sq = board.king_square(color);
    let occ = board.occupied();
    let own = board.occupancy(color);
    let enemy = color.opposite();

    let mut pinned = EMPTY_BB;

    let rook_like =
        board.pieces(enemy, PieceKind::Rook) | board.pieces(enemy, PieceKind::Queen);
    let bishop_like =
        board.pieces(enemy, PieceKind::Bishop) | board.pieces(enemy, PieceKind::Queen);

    // Direct attack XOR the attack with the near blockers lifted gives the
    // squares seen only through one blocker.
    let direct_rook = rook_attacks(king_sq, occ);
    let xray_rook = rook_attacks(king_sq, occ ^ (direct_rook & occ)) ^ direct_rook;
    let mut pinners = xray_rook & rook_like;
    while pinners != EMPTY_BB {
        let pinner = crate::bitboard::BitboardExt::pop_lsb(&mut pinners);
        pinned |= between(king_sq, Square::from_index(pinner)) & own;
    }

    let direct_bishop = bishop_attacks(king_sq, occ);
    let xray_bishop = bishop_attacks(king_sq, occ ^ (direct_bishop & occ)) ^ direct_bishop;
    let mut pinners = xray_bishop & bishop_like;
    while pinners != EMPTY_BB {
        let pinner = crate::bitboard::BitboardExt::pop_lsb(&mut pinners);
        pinned |= between(king_sq, Square::from_index(pinner)) & own;
    }

    pinned
}
