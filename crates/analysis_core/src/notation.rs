//! SAN and UCI text conversion for oracle moves.
//!
//! The oracle encodes castling as king-takes-own-rook, while SAN and the
//! engine wire protocol use the king's two-square hop. All conversion
//! between the two conventions is concentrated here.

use cozy_chess::{Board, File, Move, Piece, Square};

use crate::rules::{collect_legal, standard_castle_target};

fn is_castling(board: &Board, mv: Move) -> bool {
    board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to) == Some(board.side_to_move())
        && board.piece_on(mv.to) == Some(Piece::Rook)
}

fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

fn piece_from_letter(letter: char) -> Option<Piece> {
    match letter.to_ascii_uppercase() {
        'P' => Some(Piece::Pawn),
        'N' => Some(Piece::Knight),
        'B' => Some(Piece::Bishop),
        'R' => Some(Piece::Rook),
        'Q' => Some(Piece::Queen),
        'K' => Some(Piece::King),
        _ => None,
    }
}

fn file_char(file: File) -> char {
    (b'a' + file as u8) as char
}

fn rank_char(rank: cozy_chess::Rank) -> char {
    (b'1' + rank as u8) as char
}

/// Standard UCI text for a move whose castling status is already known.
pub(crate) fn standard_uci(
    from: Square,
    to: Square,
    promotion: Option<Piece>,
    is_castle: bool,
) -> String {
    let to = if is_castle {
        standard_castle_target(Move {
            from,
            to,
            promotion: None,
        })
    } else {
        to
    };
    let mut out = format!("{from}{to}");
    if let Some(piece) = promotion {
        out.push(piece_letter(piece).to_ascii_lowercase());
    }
    out
}

/// Render an oracle move as standard UCI text (`e2e4`, `e7e8q`, `e1g1`).
pub fn move_to_uci(board: &Board, mv: Move) -> String {
    standard_uci(mv.from, mv.to, mv.promotion, is_castling(board, mv))
}

/// Parse standard UCI text into a legal oracle move. Accepts both castling
/// conventions; returns `None` when the text is malformed or the move is
/// not legal in this position.
pub fn move_from_uci(board: &Board, text: &str) -> Option<Move> {
    let text = text.trim().to_ascii_lowercase();
    if text.len() < 4 {
        return None;
    }
    let from: Square = text[0..2].parse().ok()?;
    let to: Square = text[2..4].parse().ok()?;
    let promotion = match text.as_bytes().get(4) {
        Some(&b) => Some(piece_from_letter(b as char)?),
        None => None,
    };

    let direct = Move {
        from,
        to,
        promotion,
    };
    if board.is_legal(direct) {
        return Some(direct);
    }

    // Standard castle text names the king's destination, not the rook.
    collect_legal(board)
        .into_iter()
        .find(|mv| mv.from == from && is_castling(board, *mv) && standard_castle_target(*mv) == to)
}

/// Standard algebraic notation for a legal move, including `+`/`#` suffix.
pub fn san(board: &Board, mv: Move) -> String {
    let mut out = san_body(board, mv);
    let mut after = board.clone();
    after.play(mv);
    if !after.checkers().is_empty() {
        out.push(if collect_legal(&after).is_empty() {
            '#'
        } else {
            '+'
        });
    }
    out
}

fn san_body(board: &Board, mv: Move) -> String {
    if is_castling(board, mv) {
        return if (mv.to.file() as usize) > (mv.from.file() as usize) {
            "O-O".to_string()
        } else {
            "O-O-O".to_string()
        };
    }

    let piece = match board.piece_on(mv.from) {
        Some(piece) => piece,
        // Not reachable for legal moves; fall back to coordinates.
        None => return standard_uci(mv.from, mv.to, mv.promotion, false),
    };
    let stm = board.side_to_move();
    let is_capture =
        board.colors(!stm).has(mv.to) || (piece == Piece::Pawn && mv.from.file() != mv.to.file());

    let mut out = String::new();
    if piece != Piece::Pawn {
        out.push(piece_letter(piece));

        // Disambiguate against other pieces of the same kind that can reach
        // the same square: file first, then rank, then both.
        let rivals: Vec<Move> = collect_legal(board)
            .into_iter()
            .filter(|other| {
                other.from != mv.from
                    && other.to == mv.to
                    && board.piece_on(other.from) == Some(piece)
            })
            .collect();
        if !rivals.is_empty() {
            let file_taken = rivals.iter().any(|o| o.from.file() == mv.from.file());
            let rank_taken = rivals.iter().any(|o| o.from.rank() == mv.from.rank());
            if !file_taken {
                out.push(file_char(mv.from.file()));
            } else if !rank_taken {
                out.push(rank_char(mv.from.rank()));
            } else {
                out.push(file_char(mv.from.file()));
                out.push(rank_char(mv.from.rank()));
            }
        }
    }

    if is_capture {
        if piece == Piece::Pawn {
            out.push(file_char(mv.from.file()));
        }
        out.push('x');
    }
    out.push_str(&mv.to.to_string());
    if let Some(promo) = mv.promotion {
        out.push('=');
        out.push(piece_letter(promo));
    }
    out
}

/// Parse a SAN token against the current position. Returns `None` when the
/// token is malformed, matches no legal move, or is ambiguous.
pub fn parse_san(board: &Board, text: &str) -> Option<Move> {
    let clean = text
        .trim()
        .trim_end_matches(['+', '#', '!', '?'])
        .to_string();
    if clean.is_empty() {
        return None;
    }

    if clean == "O-O-O" || clean == "0-0-0" {
        return find_castle(board, File::C);
    }
    if clean == "O-O" || clean == "0-0" {
        return find_castle(board, File::G);
    }

    let mut rest = clean.as_str();
    let piece = match rest.chars().next() {
        Some(c) if c.is_ascii_uppercase() => {
            let piece = piece_from_letter(c)?;
            rest = &rest[1..];
            piece
        }
        _ => Piece::Pawn,
    };

    let mut promotion = None;
    if let Some(eq) = rest.find('=') {
        promotion = Some(piece_from_letter(rest[eq + 1..].chars().next()?)?);
        rest = &rest[..eq];
    } else if piece == Piece::Pawn {
        // Some sources write promotions without the '=' (e8Q).
        if let Some(last) = rest.chars().last() {
            if last.is_ascii_uppercase() {
                promotion = Some(piece_from_letter(last)?);
                rest = &rest[..rest.len() - 1];
            }
        }
    }

    let rest = rest.replace('x', "");
    if rest.len() < 2 {
        return None;
    }
    let (disambig, dest) = rest.split_at(rest.len() - 2);
    let dest: Square = dest.to_ascii_lowercase().parse().ok()?;

    let mut candidates: Vec<Move> = collect_legal(board)
        .into_iter()
        .filter(|mv| {
            mv.to == dest
                && mv.promotion == promotion
                && board.piece_on(mv.from) == Some(piece)
                && !is_castling(board, *mv)
        })
        .collect();

    for c in disambig.chars() {
        match c {
            'a'..='h' => candidates.retain(|mv| mv.from.file() as u8 == c as u8 - b'a'),
            '1'..='8' => candidates.retain(|mv| mv.from.rank() as u8 == c as u8 - b'1'),
            _ => return None,
        }
    }

    match candidates.as_slice() {
        [only] => Some(*only),
        _ => None,
    }
}

fn find_castle(board: &Board, king_file: File) -> Option<Move> {
    collect_legal(board)
        .into_iter()
        .find(|mv| is_castling(board, *mv) && standard_castle_target(*mv).file() == king_file)
}

#[cfg(test)]
#[path = "notation_tests.rs"]
mod notation_tests;
