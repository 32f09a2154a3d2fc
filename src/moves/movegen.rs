//! Pseudo-legal move generation, split into captures-and-promotions and
//! quiet moves. Legality (own king left in check) is the caller's concern,
//! except for castling whose attack check happens here.

use crate::bitboard::{single_bb, BitIter, Bitboard, EMPTY_BB, FILE_A_BB, FILE_H_BB};
use crate::board::{Board, CastleSide, Color, Piece, PieceKind};
use crate::moves::execute::{king_castle_file, rook_castle_file, make, unmake};
use crate::moves::geometry::between;
use crate::moves::magic::{
    bishop_attacks, king_attacks, knight_attacks, pawn_attacks, queen_attacks, rook_attacks,
};
use crate::moves::square_control::{attacks_to, in_check};
use crate::moves::types::{Move, MoveList};
use crate::square::Square;

/// Append every pseudo-legal capture and promotion for the side to move.
pub fn generate_captures(board: &Board, list: &mut MoveList) {
    let us = board.side_to_move;
    let enemy = board.occupancy(us.opposite());
    generate_pawn_captures_and_promotions(board, us, list);
    generate_piece_moves(board, us, enemy, list);
}

/// Append every pseudo-legal quiet move for the side to move, castling
/// included.
pub fn generate_quiets(board: &Board, list: &mut MoveList) {
    let us = board.side_to_move;
    let empty = !board.occupied();
    generate_pawn_pushes(board, us, list);
    generate_piece_moves(board, us, empty, list);
    generate_castling(board, us, list);
}

/// Captures first, then quiets.
pub fn generate_all(board: &Board, list: &mut MoveList) {
    generate_captures(board, list);
    generate_quiets(board, list);
}

/// Fully legal moves, for the root, UCI move application and SAN. The
/// post-make check filter is what the search itself uses move by move.
pub fn generate_legal(board: &mut Board) -> MoveList {
    let mut pseudo = MoveList::new();
    generate_all(board, &mut pseudo);

    let mut legal = MoveList::new();
    let mover = board.side_to_move;
    for mv in pseudo {
        if mv.castling().is_some() {
            // The generator already verified the king's path.
            legal.push(mv);
            continue;
        }
        let info = make(board, mv);
        if !in_check(board, mover) {
            legal.push(mv);
        }
        unmake(board, mv, info);
    }
    legal
}

/// MVV/LVA: most valuable victim first, least valuable attacker as the
/// tie-break, with promotions credited for the material swing.
#[inline]
pub fn mvv_lva_score(mv: Move) -> i32 {
    let victim = mv.captured().map_or(0, |p| p.kind().order_value());
    let promotion_gain = mv
        .promotion()
        .map_or(0, |p| p.kind().order_value() - PieceKind::Pawn.order_value());
    16 * victim + promotion_gain - mv.piece().kind().order_value()
}

/// Sort a capture list best-first by MVV/LVA.
pub fn order_captures(list: &mut [Move]) {
    list.sort_unstable_by_key(|&mv| -mvv_lva_score(mv));
}

// ---- Non-pawn pieces: attack pattern & target mask.

fn generate_piece_moves(board: &Board, us: Color, targets: Bitboard, list: &mut MoveList) {
    let occ = board.occupied();

    for kind in [
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ] {
        let piece = Piece::new(us, kind);
        for from_idx in BitIter(board.pieces(us, kind)) {
            let from = Square::from_index(from_idx);
            let attacks = match kind {
                PieceKind::Knight => knight_attacks(from),
                PieceKind::Bishop => bishop_attacks(from, occ),
                PieceKind::Rook => rook_attacks(from, occ),
                PieceKind::Queen => queen_attacks(from, occ),
                PieceKind::King => king_attacks(from),
                PieceKind::Pawn => unreachable!(),
            };
            for to_idx in BitIter(attacks & targets) {
                let to = Square::from_index(to_idx);
                match board.piece_at(to) {
                    Some(captured) => list.push(Move::capture(from, to, piece, captured)),
                    None => list.push(Move::quiet(from, to, piece)),
                }
            }
        }
    }
}

// ---- Pawns: whole-set shift arithmetic, color handled by the shift
// ---- direction.

#[inline(always)]
fn pawn_push(bb: Bitboard, us: Color) -> Bitboard {
    match us {
        Color::White => bb << 8,
        Color::Black => bb >> 8,
    }
}

/// Relative rank mask from `us`'s perspective.
#[inline(always)]
fn relative_rank_bb(us: Color, rank: u8) -> Bitboard {
    crate::bitboard::rank_bb(match us {
        Color::White => rank,
        Color::Black => 7 - rank,
    })
}

fn generate_pawn_pushes(board: &Board, us: Color, list: &mut MoveList) {
    let piece = Piece::new(us, PieceKind::Pawn);
    let pawns = board.pieces(us, PieceKind::Pawn) & !relative_rank_bb(us, 6);
    let empty = !board.occupied();
    let delta = us.pawn_delta() as i16;

    let single = pawn_push(pawns, us) & empty;
    for to_idx in BitIter(single) {
        let from = Square::from_index((to_idx as i16 - delta) as u8);
        list.push(Move::quiet(from, Square::from_index(to_idx), piece));
    }

    let double = pawn_push(single & relative_rank_bb(us, 2), us) & empty;
    for to_idx in BitIter(double) {
        let from = Square::from_index((to_idx as i16 - 2 * delta) as u8);
        list.push(Move::quiet(from, Square::from_index(to_idx), piece));
    }
}

fn generate_pawn_captures_and_promotions(board: &Board, us: Color, list: &mut MoveList) {
    let piece = Piece::new(us, PieceKind::Pawn);
    let pawns = board.pieces(us, PieceKind::Pawn);
    let on_seventh = pawns & relative_rank_bb(us, 6);
    let below_seventh = pawns & !on_seventh;
    let enemy = board.occupancy(us.opposite());
    let delta = us.pawn_delta() as i16;

    // Side captures, one shift per diagonal; the source-file mask stops
    // wrap-around at the board edge.
    let (left, right) = match us {
        Color::White => (
            ((below_seventh & !FILE_A_BB) << 7) & enemy,
            ((below_seventh & !FILE_H_BB) << 9) & enemy,
        ),
        Color::Black => (
            ((below_seventh & !FILE_H_BB) >> 7) & enemy,
            ((below_seventh & !FILE_A_BB) >> 9) & enemy,
        ),
    };
    let diagonals = match us {
        Color::White => [(left, 7i16), (right, 9)],
        Color::Black => [(left, -7), (right, -9)],
    };
    for (targets, shift) in diagonals {
        for to_idx in BitIter(targets) {
            let from = Square::from_index((to_idx as i16 - shift) as u8);
            let to = Square::from_index(to_idx);
            let captured = board.piece_at(to).expect("capture target occupied");
            list.push(Move::capture(from, to, piece, captured));
        }
    }

    // Promotions, push and capture, four under-promotions each.
    if on_seventh != EMPTY_BB {
        let empty = !board.occupied();
        let push = pawn_push(on_seventh, us) & empty;
        for to_idx in BitIter(push) {
            let from = Square::from_index((to_idx as i16 - delta) as u8);
            push_promotions(list, from, Square::from_index(to_idx), piece, us, None);
        }

        let (pleft, pright) = match us {
            Color::White => (
                ((on_seventh & !FILE_A_BB) << 7) & enemy,
                ((on_seventh & !FILE_H_BB) << 9) & enemy,
            ),
            Color::Black => (
                ((on_seventh & !FILE_H_BB) >> 7) & enemy,
                ((on_seventh & !FILE_A_BB) >> 9) & enemy,
            ),
        };
        let pdiagonals = match us {
            Color::White => [(pleft, 7i16), (pright, 9)],
            Color::Black => [(pleft, -7), (pright, -9)],
        };
        for (targets, shift) in pdiagonals {
            for to_idx in BitIter(targets) {
                let from = Square::from_index((to_idx as i16 - shift) as u8);
                let to = Square::from_index(to_idx);
                let captured = board.piece_at(to);
                push_promotions(list, from, to, piece, us, captured);
            }
        }
    }

    // En passant: the capturing pawns are the ones a pawn on the target
    // square would attack looking back.
    if let Some(ep_file) = board.ep_file {
        let target_rank = match us {
            Color::White => 5,
            Color::Black => 2,
        };
        let target = Square::new(ep_file, target_rank);
        let capturers = pawn_attacks(us.opposite(), target) & board.pieces(us, PieceKind::Pawn);
        for from_idx in BitIter(capturers) {
            list.push(Move::capture(
                Square::from_index(from_idx),
                target,
                piece,
                Piece::new(us.opposite(), PieceKind::Pawn),
            ));
        }
    }
}

fn push_promotions(
    list: &mut MoveList,
    from: Square,
    to: Square,
    piece: Piece,
    us: Color,
    captured: Option<Piece>,
) {
    for kind in [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Knight,
        PieceKind::Bishop,
    ] {
        list.push(Move::promote(from, to, piece, Piece::new(us, kind), captured));
    }
}

// ---- Castling. The rook origin comes from the board's castle files, so
// ---- Fischer-random positions generate through the same path.

fn generate_castling(board: &Board, us: Color, list: &mut MoveList) {
    for side in [CastleSide::King, CastleSide::Queen] {
        if !board.has_castle_right(us, side) {
            continue;
        }

        let home = us.home_rank();
        let king_from = board.king_square(us);
        let king_to = Square::new(king_castle_file(side), home);
        let rook_from = Square::new(board.castle_file(side), home);
        let rook_to = Square::new(rook_castle_file(side), home);

        // Every square either piece crosses or lands on must be free, the
        // king and rook themselves excepted.
        let travel = between(king_from, king_to)
            | single_bb(king_to.index())
            | between(rook_from, rook_to)
            | single_bb(rook_to.index());
        let others =
            board.occupied() ^ single_bb(king_from.index()) ^ single_bb(rook_from.index());
        if others & travel != EMPTY_BB {
            continue;
        }

        // No square the king stands on or passes through may be attacked.
        let enemy = board.occupancy(us.opposite());
        let king_path =
            between(king_from, king_to) | single_bb(king_from.index()) | single_bb(king_to.index());
        let mut attacked = false;
        for sq in BitIter(king_path) {
            if attacks_to(board, Square::from_index(sq)) & enemy != EMPTY_BB {
                attacked = true;
                break;
            }
        }
        if attacked {
            continue;
        }

        list.push(Move::castle(
            king_from,
            king_to,
            Piece::new(us, PieceKind::King),
            side,
        ));
    }
}
