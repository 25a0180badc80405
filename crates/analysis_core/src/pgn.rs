//! PGN movetext reader.
//!
//! Reads a single game: tag pairs, then movetext. Comments, variations and
//! numeric annotation glyphs are skipped; a `FEN` tag sets the starting
//! position. Any token that fails to apply aborts the whole load, so a
//! malformed PGN never leaves partially applied state behind.

use crate::error::GameError;
use crate::rules::{PlayedMove, RulesBoard};

/// A fully replayed PGN game.
#[derive(Debug, Clone)]
pub struct PgnGame {
    /// FEN of the starting position (standard start unless a FEN tag said
    /// otherwise).
    pub start_fen: String,
    /// The verbose move list, in game order.
    pub moves: Vec<PlayedMove>,
    /// Position after the last move.
    pub board: RulesBoard,
}

/// Parse and replay PGN text through the rules oracle.
pub fn load_pgn(text: &str) -> Result<PgnGame, GameError> {
    let mut start_fen = None;
    let mut movetext = String::new();

    for line in text.lines() {
        // ';' comments run to end of line.
        let trimmed = match line.split_once(';') {
            Some((head, _)) => head.trim(),
            None => line.trim(),
        };
        if let Some(rest) = trimmed.strip_prefix('[') {
            if let Some((name, value)) = parse_tag(rest) {
                if name.eq_ignore_ascii_case("fen") && !value.is_empty() {
                    start_fen = Some(value);
                }
                continue;
            }
            // Not a well-formed tag pair; treat the line as movetext.
        }
        movetext.push_str(trimmed);
        movetext.push(' ');
    }

    let mut board = match &start_fen {
        Some(fen) => RulesBoard::from_fen(fen)?,
        None => RulesBoard::startpos(),
    };
    let start_fen = board.fen();

    let mut moves = Vec::new();
    for token in tokens(&movetext)? {
        moves.push(board.apply_san(&token)?);
    }

    Ok(PgnGame {
        start_fen,
        moves,
        board,
    })
}

/// Extract `(name, value)` from the inside of a `[Name "value"]` tag pair.
fn parse_tag(rest: &str) -> Option<(String, String)> {
    let rest = rest.strip_suffix(']')?;
    let (name, value) = rest.split_once('"')?;
    let value = value.strip_suffix('"')?;
    Some((name.trim().to_string(), value.to_string()))
}

/// Split movetext into SAN tokens, dropping comments, variations, NAGs,
/// move numbers and game results.
fn tokens(movetext: &str) -> Result<Vec<String>, GameError> {
    // Strip `{}` comments and `()` variations first; both may open and
    // close mid-token.
    let mut stripped = String::with_capacity(movetext.len());
    let mut depth = 0usize;
    let mut in_comment = false;
    for c in movetext.chars() {
        match c {
            '{' if !in_comment => {
                in_comment = true;
                stripped.push(' ');
            }
            '}' if in_comment => in_comment = false,
            _ if in_comment => {}
            '(' => {
                depth += 1;
                stripped.push(' ');
            }
            ')' => {
                if depth == 0 {
                    return Err(GameError::MalformedLoad(
                        "unbalanced variation parentheses".into(),
                    ));
                }
                depth -= 1;
            }
            _ if depth > 0 => {}
            // Stray close-brace outside any comment; skip it.
            '}' => {}
            _ => stripped.push(c),
        }
    }
    if in_comment {
        return Err(GameError::MalformedLoad("unterminated comment".into()));
    }
    if depth != 0 {
        return Err(GameError::MalformedLoad(
            "unbalanced variation parentheses".into(),
        ));
    }

    let mut out = Vec::new();
    for token in stripped.split_whitespace() {
        if let Some(san) = san_token(token)? {
            out.push(san.to_string());
        }
    }
    Ok(out)
}

/// Reduce one whitespace-separated token to its SAN part, or `None` for
/// results, NAGs and bare move numbers.
fn san_token(token: &str) -> Result<Option<&str>, GameError> {
    if matches!(token, "1-0" | "0-1" | "1/2-1/2" | "*") || token.starts_with('$') {
        return Ok(None);
    }
    // "12." / "12..." / "12.e4" — keep whatever follows the last dot.
    let token = match token.rfind('.') {
        Some(dot) if token[..dot].chars().all(|c| c.is_ascii_digit() || c == '.') => {
            &token[dot + 1..]
        }
        Some(_) => {
            return Err(GameError::MalformedLoad(format!(
                "unrecognised movetext token {token:?}"
            )))
        }
        None => token,
    };
    if token.is_empty() {
        return Ok(None);
    }
    if token.chars().all(|c| c.is_ascii_digit()) {
        return Err(GameError::MalformedLoad(format!(
            "unrecognised movetext token {token:?}"
        )));
    }
    Ok(Some(token))
}

#[cfg(test)]
#[path = "pgn_tests.rs"]
mod pgn_tests;
