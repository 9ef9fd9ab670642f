//! Move notation: resolving hand-typed SAN and coordinate tokens to legal moves, and writing SAN.
//!
//! Two grammars are understood:
//!
//! - SAN: an optional piece letter, an optional disambiguating file, rank or square, an optional
//!   capture marker, the destination square and an optional promotion (`Nf3`, `exd5`, `Rad1`,
//!   `e8=Q`, `O-O`).
//! - Coordinate notation: origin and destination squares with an optional promotion letter
//!   (`e2e4`, `e7e8q`). The moving piece is implied by the origin square.
//!
//! Check and checkmate suffixes are always ignored. [`Strictness::Sloppy`] is forgiving about the
//! rest of the decoration; [`Strictness::Strict`] insists on it being right.

use alloc::string::{String, ToString};
use smallvec::SmallVec;

use crate::{board::CastleSide, ChessError, Move, MoveList, Piece, Position, Square};

/// How forgiving the resolver is with hand-typed tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strictness {
    /// Capture markers must be right, SAN piece moves never stand in for castling, and no
    /// annotation glyphs, lowercase piece letters or `-` separators are accepted.
    Strict,
    /// Ignores capture markers and accepts `!`/`?` annotations, lowercase piece letters (except
    /// `b`, which is a file), `P` for pawns and `e2-e4` style separators.
    #[default]
    Sloppy,
}

/// A token resolved against a position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedMove {
    /// The legal move the token names.
    pub chess_move: Move,
    /// The move in long algebraic notation: origin, destination and lowercase promotion letter.
    pub canonical: String,
}

/// What a parsed token says about the move it names.
enum Token {
    /// `O-O` or `O-O-O`.
    Castle(CastleSide),
    /// Anything else.
    Pattern(Pattern),
}

/// The constraints a non-castling token puts on a move.
struct Pattern {
    /// The moving piece, `None` when any piece may move (coordinate notation).
    piece: Option<Piece>,
    /// Whether the token was origin and destination squares without a piece letter.
    coordinate: bool,
    /// The origin square, possibly partial.
    from: Option<Square>,
    /// The destination square.
    to: Square,
    /// Whether the token carried a capture marker.
    capture: bool,
    /// The promotion piece.
    promotion: Option<Piece>,
}

impl Token {
    /// Does `mv` fit this token?
    fn matches(&self, mv: Move, strictness: Strictness) -> bool {
        match self {
            Self::Castle(side) => mv.castle_side() == Some(*side),
            Self::Pattern(pattern) => {
                let decoration_ok = strictness == Strictness::Sloppy
                    || pattern.coordinate
                    || (pattern.capture == mv.is_capture() && !mv.is_castle());
                pattern.piece.is_none_or(|piece| piece == mv.piece())
                    && pattern.from.is_none_or(|from| from.contains(mv.from()))
                    && pattern.to == mv.to()
                    && pattern.promotion == mv.promotion()
                    && decoration_ok
            }
        }
    }
}

/// Is this character a capture marker?
fn character_is_capturing(ch: char) -> bool {
    ['x', '×', ':'].contains(&ch)
}

/// Parse a token into what it says about its move, or `None` if it fits neither grammar.
fn parse_token(token: &str, strictness: Strictness) -> Option<Token> {
    let sloppy = strictness == Strictness::Sloppy;
    let chars: SmallVec<[char; 16]> = token.chars().collect();
    let mut s = chars.as_slice();

    if sloppy {
        while let [rest @ .., '!' | '?'] = s {
            s = rest;
        }
    }

    if let [rest @ .., '+', '+'] = s {
        s = rest;
    } else if let [rest @ .., '+' | '#' | '†' | '‡'] = s {
        s = rest;
    }

    match s {
        ['O', '-', 'O'] | ['0', '-', '0'] => return Some(Token::Castle(CastleSide::Kingside)),
        ['O', '-', 'O', '-', 'O'] | ['0', '-', '0', '-', '0'] => {
            return Some(Token::Castle(CastleSide::Queenside));
        }
        _ => {}
    }

    let piece = match s.first() {
        // strict since B is both bishop and file B.
        Some(&ch) if Piece::is_valid_piece_char_strict(ch) => {
            s = &s[1..];
            Piece::from_piece_char_strict(ch).map(|(piece, _)| piece)
        }
        Some(&ch) if sloppy && matches!(ch, 'P' | 'p' | 'n' | 'r' | 'q' | 'k') => {
            s = &s[1..];
            Piece::from_fen_byte(ch as u8).map(|(piece, _)| piece)
        }
        _ => None,
    };

    let mut promotion = None;
    if let [rest @ .., last] = s {
        if let Some(piece) = Piece::from_promotion_char(*last) {
            if rest.last().is_some_and(|ch| ch.is_ascii_digit() || *ch == '=') {
                promotion = Some(piece);
                s = rest;
                if let [rest @ .., '='] = s {
                    s = rest;
                }
            }
        }
    }

    let [rest @ .., file, rank] = s else {
        return None;
    };
    let to = Square::try_from([*file, *rank]).ok()?;
    s = rest;

    let mut capture = false;
    match s {
        [rest @ .., ch] if character_is_capturing(*ch) => {
            capture = true;
            s = rest;
        }
        [rest @ .., '-'] if sloppy => s = rest,
        _ => {}
    }

    let from = match s {
        [] => None,
        [file @ 'a'..='h'] => Some(Square::try_from((Some(*file as u8 - b'a'), None::<u8>)).ok()?),
        [rank @ '1'..='8'] => Some(Square::try_from((None::<u8>, Some(*rank as u8 - b'1'))).ok()?),
        [file, rank] => Some(Square::try_from([*file, *rank]).ok()?),
        _ => return None,
    };

    let coordinate = piece.is_none() && from.is_some_and(Square::is_full);
    if coordinate && capture && !sloppy {
        return None;
    }

    Some(Token::Pattern(Pattern {
        piece: if coordinate {
            None
        } else {
            Some(piece.unwrap_or(Piece::Pawn))
        },
        coordinate,
        from,
        to,
        capture,
        promotion,
    }))
}

/// Resolve a hand-typed move token against `position` in [`Strictness::Sloppy`] mode.
///
/// # Errors
/// See [`resolve_with`].
pub fn resolve(position: &Position, token: &str) -> Result<ResolvedMove, ChessError> {
    resolve_with(position, token, Strictness::default())
}

/// Resolve a move token (SAN or coordinate notation) to the unique legal move it names.
///
/// # Errors
/// - [`ChessError::UnparseableToken`] if the token fits neither grammar.
/// - [`ChessError::IllegalMove`] if no legal move fits it, including a pawn reaching the last rank
///   without a promotion piece.
/// - [`ChessError::AmbiguousMove`] if several legal moves fit it.
pub fn resolve_with(
    position: &Position,
    token: &str,
    strictness: Strictness,
) -> Result<ResolvedMove, ChessError> {
    let token = token.trim();
    let parsed = parse_token(token, strictness)
        .ok_or_else(|| ChessError::UnparseableToken(token.to_string()))?;

    let candidates: MoveList = position
        .legal_moves()
        .into_iter()
        .filter(|mv| parsed.matches(*mv, strictness))
        .collect();

    match candidates.as_slice() {
        [] => Err(ChessError::IllegalMove(token.to_string())),
        [mv] => {
            log::trace!("resolved {token:?} to {mv} at {position}");
            Ok(ResolvedMove {
                chess_move: *mv,
                canonical: mv.to_string(),
            })
        }
        _ => Err(ChessError::AmbiguousMove(token.to_string())),
    }
}

/// Write `mv` in SAN, with the least disambiguation needed and a `+` or `#` suffix.
///
/// # Errors
/// If `mv` is not legal at `position`, [`ChessError::IllegalMove`] is returned.
pub fn to_san(position: &Position, mv: Move) -> Result<String, ChessError> {
    let legal = position.legal_moves();
    if !legal.contains(&mv) {
        return Err(ChessError::IllegalMove(mv.to_string()));
    }

    let file_char = |square: Square| char::from(b'a' + square.file0());
    let rank_char = |square: Square| char::from(b'1' + square.rank0());

    let mut san = String::new();
    match mv.castle_side() {
        Some(CastleSide::Kingside) => san.push_str("O-O"),
        Some(CastleSide::Queenside) => san.push_str("O-O-O"),
        None => {
            if mv.piece() == Piece::Pawn {
                if mv.is_capture() {
                    san.push(file_char(mv.from()));
                }
            } else {
                san.push(mv.piece().to_char());
                let rivals: MoveList = legal
                    .iter()
                    .copied()
                    .filter(|other| {
                        other.piece() == mv.piece()
                            && other.to() == mv.to()
                            && other.from() != mv.from()
                    })
                    .collect();
                if !rivals.is_empty() {
                    let (from_file, from_rank) = (mv.from().file0(), mv.from().rank0());
                    let shares_file = rivals.iter().any(|other| other.from().file0() == from_file);
                    let shares_rank = rivals.iter().any(|other| other.from().rank0() == from_rank);
                    if !shares_file {
                        san.push(file_char(mv.from()));
                    } else if !shares_rank {
                        san.push(rank_char(mv.from()));
                    } else {
                        san.push_str(&mv.from().to_string());
                    }
                }
            }
            if mv.is_capture() {
                san.push('x');
            }
            san.push_str(&mv.to().to_string());
            if let Some(promotion) = mv.promotion() {
                san.push('=');
                san.push(promotion.to_char());
            }
        }
    }

    let next = position.make_unchecked(mv);
    if next.in_check() {
        san.push(if next.legal_moves().is_empty() { '#' } else { '+' });
    }
    Ok(san)
}

impl Position {
    /// Resolve `token` in [`Strictness::Sloppy`] mode and play it.
    ///
    /// # Errors
    /// See [`resolve_with`].
    pub fn play(&self, token: &str) -> Result<(Position, ResolvedMove), ChessError> {
        let resolved = resolve(self, token)?;
        Ok((self.make_unchecked(resolved.chess_move), resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ErrorKind, STARTING_FEN};

    fn position(fen: &str) -> Position {
        Position::parse_fen(fen).unwrap()
    }

    fn canonical(position: &Position, token: &str, strictness: Strictness) -> String {
        resolve_with(position, token, strictness).unwrap().canonical
    }

    fn failure(position: &Position, token: &str, strictness: Strictness) -> ErrorKind {
        resolve_with(position, token, strictness).unwrap_err().kind()
    }

    const KNIGHTS: &str = "4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1";
    const CASTLES: &str = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
    const PROMOTION: &str = "8/4P3/8/8/8/8/k7/4K3 w - - 0 1";
    const CENTER: &str = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2";

    #[test]
    fn san_and_coordinates_agree() {
        let start = Position::default();
        for strictness in [Strictness::Strict, Strictness::Sloppy] {
            assert_eq!(canonical(&start, "Nf3", strictness), "g1f3");
            assert_eq!(canonical(&start, "g1f3", strictness), "g1f3");
            assert_eq!(canonical(&start, "Ng1f3", strictness), "g1f3");
            assert_eq!(canonical(&start, "e4", strictness), "e2e4");
            assert_eq!(canonical(&start, "e2e4", strictness), "e2e4");
            assert_eq!(canonical(&start, "Nc3+", strictness), "b1c3");
            assert_eq!(canonical(&start, "♘f3", strictness), "g1f3");
            assert_eq!(canonical(&start, " d4 ", strictness), "d2d4");
        }
    }

    #[test]
    fn sloppy_decoration() {
        let start = Position::default();
        assert_eq!(canonical(&start, "e2-e4", Strictness::Sloppy), "e2e4");
        assert_eq!(canonical(&start, "Nf3!?", Strictness::Sloppy), "g1f3");
        assert_eq!(canonical(&start, "nf3", Strictness::Sloppy), "g1f3");
        assert_eq!(canonical(&start, "Pe2e4", Strictness::Sloppy), "e2e4");
        assert_eq!(canonical(&start, "Nxf3", Strictness::Sloppy), "g1f3");

        assert_eq!(failure(&start, "e2-e4", Strictness::Strict), ErrorKind::UnparseableToken);
        assert_eq!(failure(&start, "Nf3!?", Strictness::Strict), ErrorKind::UnparseableToken);
        assert_eq!(failure(&start, "nf3", Strictness::Strict), ErrorKind::UnparseableToken);
        assert_eq!(failure(&start, "Nxf3", Strictness::Strict), ErrorKind::IllegalMove);
    }

    #[test]
    fn captures() {
        let p = position(CENTER);
        assert_eq!(canonical(&p, "exd5", Strictness::Strict), "e4d5");
        assert_eq!(canonical(&p, "e4d5", Strictness::Strict), "e4d5");
        assert_eq!(canonical(&p, "ed5", Strictness::Sloppy), "e4d5");
        assert_eq!(failure(&p, "ed5", Strictness::Strict), ErrorKind::IllegalMove);
        assert_eq!(failure(&p, "e4xd5", Strictness::Strict), ErrorKind::UnparseableToken);
        assert_eq!(canonical(&p, "e4xd5", Strictness::Sloppy), "e4d5");
    }

    #[test]
    fn unparseable_and_illegal() {
        let start = Position::default();
        for token in ["", "zz", "Nf9", "N", "e", "Xe4", "O-O-O-O", "e8=K", "1."] {
            assert_eq!(
                failure(&start, token, Strictness::Sloppy),
                ErrorKind::UnparseableToken,
                "{token}"
            );
        }
        for token in ["Nf4", "e5", "e2e5", "Ke2", "O-O", "O-O-O", "a1a2"] {
            assert_eq!(failure(&start, token, Strictness::Sloppy), ErrorKind::IllegalMove, "{token}");
        }
        let err = resolve(&start, "Nf4").unwrap_err();
        assert_eq!(err.to_string(), "Illegal move: Nf4");
    }

    #[test]
    fn ambiguity_and_disambiguation() {
        let p = position(KNIGHTS);
        assert_eq!(failure(&p, "Nd2", Strictness::Sloppy), ErrorKind::AmbiguousMove);
        assert_eq!(canonical(&p, "Nbd2", Strictness::Sloppy), "b1d2");
        assert_eq!(canonical(&p, "Nfd2", Strictness::Sloppy), "f3d2");
        assert_eq!(canonical(&p, "N1d2", Strictness::Sloppy), "b1d2");
        assert_eq!(canonical(&p, "N3d2", Strictness::Sloppy), "f3d2");
        assert_eq!(canonical(&p, "Nf3d2", Strictness::Strict), "f3d2");
        assert_eq!(canonical(&p, "b1d2", Strictness::Strict), "b1d2");
        assert_eq!(failure(&p, "Ncd2", Strictness::Sloppy), ErrorKind::IllegalMove);
    }

    #[test]
    fn castling_tokens() {
        let p = position(CASTLES);
        for strictness in [Strictness::Strict, Strictness::Sloppy] {
            assert_eq!(canonical(&p, "O-O", strictness), "e1g1");
            assert_eq!(canonical(&p, "0-0", strictness), "e1g1");
            assert_eq!(canonical(&p, "O-O-O+", strictness), "e1c1");
            assert_eq!(canonical(&p, "e1g1", strictness), "e1g1");
        }
        assert_eq!(canonical(&p, "Kg1", Strictness::Sloppy), "e1g1");
        assert_eq!(failure(&p, "Kg1", Strictness::Strict), ErrorKind::IllegalMove);

        let moved = position("r3k2r/8/8/8/8/8/8/R3K2R w - - 0 1");
        assert_eq!(failure(&moved, "O-O", Strictness::Sloppy), ErrorKind::IllegalMove);
        let attacked = position("r3k2r/8/8/8/2b5/8/8/R3K2R w KQkq - 0 1");
        assert_eq!(failure(&attacked, "O-O", Strictness::Sloppy), ErrorKind::IllegalMove);
    }

    #[test]
    fn promotions() {
        let p = position(PROMOTION);
        assert_eq!(canonical(&p, "e8=Q", Strictness::Strict), "e7e8q");
        assert_eq!(canonical(&p, "e8Q", Strictness::Strict), "e7e8q");
        assert_eq!(canonical(&p, "e8=N+", Strictness::Strict), "e7e8n");
        assert_eq!(canonical(&p, "e7e8q", Strictness::Strict), "e7e8q");
        assert_eq!(canonical(&p, "e7e8R", Strictness::Strict), "e7e8r");
        assert_eq!(failure(&p, "e8", Strictness::Sloppy), ErrorKind::IllegalMove);
        assert_eq!(failure(&p, "e7e8", Strictness::Sloppy), ErrorKind::IllegalMove);
        assert_eq!(failure(&p, "e6e7q", Strictness::Sloppy), ErrorKind::IllegalMove);
    }

    #[test]
    fn writes_san() {
        let start = Position::default();
        let (_, nf3) = start.play("g1f3").unwrap();
        assert_eq!(to_san(&start, nf3.chess_move).unwrap(), "Nf3");

        let p = position(KNIGHTS);
        let (_, nbd2) = p.play("b1d2").unwrap();
        assert_eq!(to_san(&p, nbd2.chess_move).unwrap(), "Nbd2");

        let rooks = position("4k3/8/8/R7/8/8/8/R6K w - - 0 1");
        let (_, r1a3) = rooks.play("a1a3").unwrap();
        assert_eq!(to_san(&rooks, r1a3.chess_move).unwrap(), "R1a3");
        assert_eq!(failure(&rooks, "Ra3", Strictness::Sloppy), ErrorKind::AmbiguousMove);

        let center = position(CENTER);
        let (_, exd5) = center.play("e4d5").unwrap();
        assert_eq!(to_san(&center, exd5.chess_move).unwrap(), "exd5");

        let castles = position(CASTLES);
        let (_, short) = castles.play("e1g1").unwrap();
        assert_eq!(to_san(&castles, short.chess_move).unwrap(), "O-O");

        let promotion = position(PROMOTION);
        let (_, queen) = promotion.play("e7e8q").unwrap();
        assert_eq!(to_san(&promotion, queen.chess_move).unwrap(), "e8=Q");

        let back_rank = position("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1");
        let (_, mate) = back_rank.play("a1a8").unwrap();
        assert_eq!(to_san(&back_rank, mate.chess_move).unwrap(), "Ra8#");

        let check = position("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
        let (_, ra8) = check.play("a1a8").unwrap();
        assert_eq!(to_san(&check, ra8.chess_move).unwrap(), "Ra8+");
    }

    #[test]
    fn to_san_rejects_foreign_moves() {
        let start = Position::default();
        let (after, e4) = start.play("e4").unwrap();
        assert_eq!(after.turn(), crate::Color::Black);
        assert_eq!(
            to_san(&after, e4.chess_move).unwrap_err().kind(),
            ErrorKind::IllegalMove
        );
        assert_eq!(start.into_fen(), STARTING_FEN);
    }
}
