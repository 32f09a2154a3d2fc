//! Standard algebraic notation, as pure functions over the board. Rendering
//! disambiguates with the attack and pin machinery; parsing matches against
//! the legal move list.

use crate::bitboard::{single_bb, BitIter, EMPTY_BB};
use crate::board::{Board, CastleSide, PieceKind};
use crate::moves::execute::{make, unmake};
use crate::moves::geometry::direction;
use crate::moves::movegen::generate_legal;
use crate::moves::square_control::{attacks_to, in_check, pinned_pieces};
use crate::moves::types::Move;
use crate::square::Square;

fn piece_letter(kind: PieceKind) -> Option<char> {
    match kind {
        PieceKind::Pawn => None,
        PieceKind::Knight => Some('N'),
        PieceKind::Bishop => Some('B'),
        PieceKind::Rook => Some('R'),
        PieceKind::Queen => Some('Q'),
        PieceKind::King => Some('K'),
    }
}

/// Render a legal move in SAN, including the `+`/`#` suffix.
pub fn render(board: &mut Board, mv: Move) -> String {
    let mut out = String::new();

    if let Some(side) = mv.castling() {
        out.push_str(match side {
            CastleSide::King => "O-O",
            CastleSide::Queen => "O-O-O",
        });
    } else {
        let kind = mv.piece().kind();
        if let Some(letter) = piece_letter(kind) {
            out.push(letter);
            out.push_str(&disambiguation(board, mv));
        } else if mv.is_capture() {
            // Pawn captures name the origin file.
            out.push((b'a' + mv.from().file()) as char);
        }

        if mv.is_capture() {
            out.push('x');
        }
        out.push_str(&mv.to().to_string());

        if let Some(promo) = mv.promotion() {
            out.push('=');
            out.push(piece_letter(promo.kind()).expect("promotion piece has a letter"));
        }
    }

    out.push_str(&check_suffix(board, mv));
    out
}

/// Parse SAN (or long-algebraic as a convenience) against the position's
/// legal moves. Returns None when the text matches no legal move.
pub fn parse(board: &mut Board, text: &str) -> Option<Move> {
    let wanted: String = text
        .chars()
        .filter(|c| !matches!(c, '+' | '#' | '!' | '?'))
        .collect();
    if wanted.is_empty() {
        return None;
    }

    let moves = generate_legal(board);
    for &mv in moves.iter() {
        let rendered = render(board, mv);
        let stripped: String = rendered
            .chars()
            .filter(|c| !matches!(c, '+' | '#'))
            .collect();
        if stripped == wanted || mv.to_uci() == wanted {
            return Some(mv);
        }
    }
    None
}

/// Origin file/rank qualifier needed to make the move unique among peers of
/// the same kind that also attack the destination and are free to move there.
fn disambiguation(board: &Board, mv: Move) -> String {
    let us = mv.piece().color();
    let kind = mv.piece().kind();
    let to = mv.to();
    let king_sq = board.king_square(us);

    let peers = attacks_to(board, to) & board.pieces(us, kind) & !single_bb(mv.from().index());
    let pinned = pinned_pieces(board, us);

    let mut rivals = EMPTY_BB;
    for sq in BitIter(peers) {
        let from = Square::from_index(sq);
        // A pinned rival can only move along the line through its king, so
        // it competes for the destination only when that square shares the
        // pin line.
        if pinned & single_bb(sq) != EMPTY_BB {
            let pin_line = direction(king_sq, from);
            if pin_line.is_none() || direction(king_sq, to) != pin_line {
                continue;
            }
        }
        rivals |= single_bb(sq);
    }

    if rivals == EMPTY_BB {
        return String::new();
    }

    let same_file = BitIter(rivals).any(|sq| Square::from_index(sq).file() == mv.from().file());
    let same_rank = BitIter(rivals).any(|sq| Square::from_index(sq).rank() == mv.from().rank());

    let mut out = String::new();
    if !same_file {
        out.push((b'a' + mv.from().file()) as char);
    } else if !same_rank {
        out.push((b'1' + mv.from().rank()) as char);
    } else {
        out.push_str(&mv.from().to_string());
    }
    out
}

fn check_suffix(board: &mut Board, mv: Move) -> String {
    let info = make(board, mv);
    let suffix = if in_check(board, board.side_to_move) {
        if generate_legal(board).is_empty() {
            "#"
        } else {
            "+"
        }
    } else {
        ""
    };
    unmake(board, mv, info);
    suffix.to_string()
}
