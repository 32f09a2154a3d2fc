//! FEN / X-FEN parsing and emission. Castling uses the usual KQkq letters
//! for standard rook files and file letters (X-FEN) for Fischer-random
//! positions.

use thiserror::Error;

use crate::bitboard::BitboardExt;
use crate::board::{Board, CastleSide, Color, Piece, PieceKind};
use crate::square::Square;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("FEN must have at least 4 fields, found {0}")]
    MissingFields(usize),
    #[error("invalid piece placement: {0}")]
    InvalidPlacement(String),
    #[error("invalid active color: {0}")]
    InvalidActiveColor(String),
    #[error("invalid castling field: {0}")]
    InvalidCastling(String),
    #[error("invalid en passant target: {0}")]
    InvalidEnPassant(String),
    #[error("invalid clock field: {0}")]
    InvalidClock(String),
    #[error("each side must have exactly one king")]
    KingCount,
}

pub(super) fn parse(fen: &str) -> Result<Board, FenError> {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(FenError::MissingFields(fields.len()));
    }

    let mut board = Board::new_empty();

    // 1. Piece placement, rank 8 down to rank 1.
    let ranks: Vec<&str> = fields[0].split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::InvalidPlacement(fields[0].to_string()));
    }
    for (i, rank_str) in ranks.iter().enumerate() {
        let rank = 7 - i as u8;
        let mut file = 0u8;
        for c in rank_str.chars() {
            if let Some(skip) = c.to_digit(10) {
                file += skip as u8;
            } else {
                let piece = Piece::from_char(c)
                    .ok_or_else(|| FenError::InvalidPlacement(fields[0].to_string()))?;
                if file > 7 {
                    return Err(FenError::InvalidPlacement(fields[0].to_string()));
                }
                board.add_piece(Square::new(file, rank), piece);
                file += 1;
            }
        }
        if file != 8 {
            return Err(FenError::InvalidPlacement(fields[0].to_string()));
        }
    }

    if board.pieces(Color::White, PieceKind::King).popcount() != 1
        || board.pieces(Color::Black, PieceKind::King).popcount() != 1
    {
        return Err(FenError::KingCount);
    }

    // 2. Active color.
    board.side_to_move = match fields[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(FenError::InvalidActiveColor(other.to_string())),
    };

    // 3. Castling availability.
    board.castling_rights = 0;
    if fields[2] != "-" {
        for c in fields[2].chars() {
            let (color, spec) = if c.is_ascii_uppercase() {
                (Color::White, c.to_ascii_lowercase())
            } else {
                (Color::Black, c)
            };
            let king_file = board.king_square(color).file();
            let (side, rook_file) = match spec {
                'k' => (
                    CastleSide::King,
                    outermost_rook(&board, color, king_file, true)
                        .ok_or_else(|| FenError::InvalidCastling(fields[2].to_string()))?,
                ),
                'q' => (
                    CastleSide::Queen,
                    outermost_rook(&board, color, king_file, false)
                        .ok_or_else(|| FenError::InvalidCastling(fields[2].to_string()))?,
                ),
                'a'..='h' => {
                    let file = spec as u8 - b'a';
                    let side = if file > king_file {
                        CastleSide::King
                    } else {
                        CastleSide::Queen
                    };
                    (side, file)
                }
                _ => return Err(FenError::InvalidCastling(fields[2].to_string())),
            };
            board.castling_rights |= side.flag(color);
            board.castle_files[side as usize] = rook_file;
        }
    }

    // 4. En passant target square.
    board.ep_file = match fields[3] {
        "-" => None,
        s => {
            let sq = Square::parse(s).ok_or_else(|| FenError::InvalidEnPassant(s.to_string()))?;
            Some(sq.file())
        }
    };

    // 5-6. Clocks, optional.
    board.halfmove_clock = match fields.get(4) {
        Some(s) => s
            .parse()
            .map_err(|_| FenError::InvalidClock(s.to_string()))?,
        None => 0,
    };
    board.fullmove_number = match fields.get(5) {
        Some(s) => s
            .parse()
            .map_err(|_| FenError::InvalidClock(s.to_string()))?,
        None => 1,
    };

    board.zobrist = board.compute_zobrist_full();
    board.history.clear();

    Ok(board)
}

/// File of the rook closest to the board edge on the given side of the king,
/// on that color's home rank.
fn outermost_rook(board: &Board, color: Color, king_file: u8, king_side: bool) -> Option<u8> {
    let home = color.home_rank();
    let rooks = board.pieces(color, PieceKind::Rook);
    let files: Vec<u8> = (0..8u8)
        .filter(|&f| rooks & crate::bitboard::single_bb(Square::new(f, home).index()) != 0)
        .collect();
    if king_side {
        files.into_iter().filter(|&f| f > king_file).max()
    } else {
        files.into_iter().filter(|&f| f < king_file).min()
    }
}

pub(super) fn emit(board: &Board) -> String {
    let mut out = String::with_capacity(90);

    for rank in (0..8u8).rev() {
        let mut empty = 0;
        for file in 0..8u8 {
            match board.piece_at(Square::new(file, rank)) {
                Some(piece) => {
                    if empty > 0 {
                        out.push((b'0' + empty) as char);
                        empty = 0;
                    }
                    out.push(piece.to_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            out.push((b'0' + empty) as char);
        }
        if rank > 0 {
            out.push('/');
        }
    }

    out.push(' ');
    out.push(match board.side_to_move {
        Color::White => 'w',
        Color::Black => 'b',
    });

    out.push(' ');
    if board.castling_rights == 0 {
        out.push('-');
    } else {
        for (color, side) in [
            (Color::White, CastleSide::King),
            (Color::White, CastleSide::Queen),
            (Color::Black, CastleSide::King),
            (Color::Black, CastleSide::Queen),
        ] {
            if board.has_castle_right(color, side) {
                let file = board.castle_file(side);
                let standard = match side {
                    CastleSide::King => file == 7,
                    CastleSide::Queen => file == 0,
                };
                let c = if standard {
                    match side {
                        CastleSide::King => 'k',
                        CastleSide::Queen => 'q',
                    }
                } else {
                    (b'a' + file) as char
                };
                out.push(match color {
                    Color::White => c.to_ascii_uppercase(),
                    Color::Black => c,
                });
            }
        }
    }

    out.push(' ');
    match board.ep_file {
        Some(file) => {
            // The target square sits behind the pawn that just double-pushed.
            let rank = match board.side_to_move {
                Color::White => 5,
                Color::Black => 2,
            };
            out.push_str(&Square::new(file, rank).to_string());
        }
        None => out.push('-'),
    }

    out.push_str(&format!(
        " {} {}",
        board.halfmove_clock, board.fullmove_number
    ));
    out
}
