//! Chess rules library for validating and grading puzzle solutions.
//!
//! The crate parses positions from FEN, generates fully legal moves, applies them to produce new
//! positions, resolves hand-typed move tokens (SAN or coordinate notation) to legal moves, and
//! normalizes whole puzzle solutions into canonical long algebraic notation (`e2e4`, `e7e8q`).
//!
//! ```
//! use puzzlechess::puzzle::build_solution;
//!
//! let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
//! let solution = build_solution(fen, "e4 e7e5 Nf3")?;
//! assert_eq!(solution.to_string(), "e2e4 e7e5 g1f3");
//! assert!(solution.check_attempt("g1f3"));
//! # Ok::<_, puzzlechess::ChessError>(())
//! ```
#![warn(
    missing_docs,
    clippy::missing_docs_in_private_items,
    clippy::pedantic,
    clippy::all,
    clippy::ignore_without_reason
)]
#![no_std]

extern crate alloc;
#[cfg(test)]
extern crate std;

use alloc::string::String;
use core::{
    error::Error,
    fmt::{Debug, Display},
};

use anyhow::{bail, ensure};

#[cfg(test)]
use proptest_derive::Arbitrary;

pub mod apply;
pub mod board;
pub mod movegen;
pub mod notation;
pub mod puzzle;


pub use board::{Board, CastleSide, Castling, Position, STARTING_FEN};
pub use movegen::MoveList;
pub use notation::{resolve, resolve_with, to_san, ResolvedMove, Strictness};
pub use puzzle::{build_solution, check_attempt, check_stored_attempt, split_moves, PuzzleSolution};

/// The color of a piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(Arbitrary))]
#[expect(missing_docs, reason = "people know what colors are")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Is this piece white?
    #[must_use]
    pub fn white(self) -> bool {
        matches!(self, Self::White)
    }
    /// Is this piece black?
    #[must_use]
    pub fn black(self) -> bool {
        matches!(self, Self::Black)
    }
    /// The other color.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
    /// Rank direction in which this color's pawns advance.
    pub(crate) fn forward(self) -> i8 {
        match self {
            Self::White => 1,
            Self::Black => -1,
        }
    }
    /// Zero-based rank this color's pawns start on.
    pub(crate) fn pawn_rank(self) -> u8 {
        match self {
            Self::White => 1,
            Self::Black => 6,
        }
    }
    /// Zero-based rank the king and rooks start on.
    pub(crate) fn back_rank(self) -> u8 {
        match self {
            Self::White => 0,
            Self::Black => 7,
        }
    }
}

impl core::ops::Not for Color {
    type Output = Self;
    fn not(self) -> Self::Output {
        self.opposite()
    }
}

/// A piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(Arbitrary))]
#[expect(missing_docs, reason = "people know what pieces are")]
pub enum Piece {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl Piece {
    /// The pieces a pawn may promote to, in the order moves are generated.
    pub const PROMOTIONS: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

    /// Whether the character matches the standard uppercase english acronyms 'KQRBN' or is within
    /// "♔♕♖♗♘♙♚♛♜♝♞♟".
    #[must_use]
    pub fn is_valid_piece_char_strict(ch: char) -> bool {
        ['K', 'Q', 'R', 'B', 'N'].contains(&ch) || ('\u{2654}'..='\u{265F}').contains(&ch)
    }
    /// Get the piece and possibly color from the provided character. Matches the characters from
    /// [`is_valid_piece_char_strict`](Self::is_valid_piece_char_strict).
    #[must_use]
    pub fn from_piece_char_strict(ch: char) -> Option<(Self, Option<Color>)> {
        match ch {
            'K' => Some((Self::King, None)),
            'Q' => Some((Self::Queen, None)),
            'R' => Some((Self::Rook, None)),
            'B' => Some((Self::Bishop, None)),
            'N' => Some((Self::Knight, None)),
            '♔' => Some((Self::King, Some(Color::White))),
            '♕' => Some((Self::Queen, Some(Color::White))),
            '♖' => Some((Self::Rook, Some(Color::White))),
            '♗' => Some((Self::Bishop, Some(Color::White))),
            '♘' => Some((Self::Knight, Some(Color::White))),
            '♙' => Some((Self::Pawn, Some(Color::White))),
            '♚' => Some((Self::King, Some(Color::Black))),
            '♛' => Some((Self::Queen, Some(Color::Black))),
            '♜' => Some((Self::Rook, Some(Color::Black))),
            '♝' => Some((Self::Bishop, Some(Color::Black))),
            '♞' => Some((Self::Knight, Some(Color::Black))),
            '♟' => Some((Self::Pawn, Some(Color::Black))),
            _ => None,
        }
    }
    /// Get the piece named by a promotion letter, either case. Only 'QRBN' are accepted.
    #[must_use]
    pub fn from_promotion_char(ch: char) -> Option<Self> {
        match ch.to_ascii_uppercase() {
            'Q' => Some(Self::Queen),
            'R' => Some(Self::Rook),
            'B' => Some(Self::Bishop),
            'N' => Some(Self::Knight),
            _ => None,
        }
    }
    /// Get the piece and color from a FEN placement byte (uppercase is white).
    #[must_use]
    pub fn from_fen_byte(b: u8) -> Option<(Self, Color)> {
        let color = if b.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let piece = match b.to_ascii_uppercase() {
            b'K' => Self::King,
            b'Q' => Self::Queen,
            b'R' => Self::Rook,
            b'B' => Self::Bishop,
            b'N' => Self::Knight,
            b'P' => Self::Pawn,
            _ => return None,
        };
        Some((piece, color))
    }
    /// The uppercase english letter for this piece, 'P' for pawns.
    #[must_use]
    pub fn to_char(self) -> char {
        match self {
            Self::King => 'K',
            Self::Queen => 'Q',
            Self::Rook => 'R',
            Self::Bishop => 'B',
            Self::Knight => 'N',
            Self::Pawn => 'P',
        }
    }
    /// The FEN letter for this piece: uppercase for white, lowercase for black.
    #[must_use]
    pub fn fen_char(self, color: Color) -> char {
        match color {
            Color::White => self.to_char(),
            Color::Black => self.to_char().to_ascii_lowercase(),
        }
    }
}

impl Display for Piece {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.to_char())
    }
}

/// Packed flag for a square that knows its file.
const HAS_FILE: u8 = 0b1000_0000;
/// Packed flag for a square that knows its rank.
const HAS_RANK: u8 = 0b0100_0000;

/// A square on the board, or a partial square (just a file or just a rank) as used by SAN
/// disambiguators.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    /// The packed square. 0bghrrrfff where r is rank, f is file, g is whether it has file,
    /// and h is whether it has rank. Rank and file are zero-based.
    packed: u8,
}

impl Square {
    /// The full square with the given zero-based index, where a1 is 0, h1 is 7 and h8 is 63.
    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        Self {
            packed: HAS_FILE | HAS_RANK | (index & 0b11_1111),
        }
    }
    /// The full square with the given zero-based file and rank.
    pub(crate) const fn at(file: u8, rank: u8) -> Self {
        Self::from_index((rank & 0b111) << 3 | (file & 0b111))
    }
    /// Does this square have rank?
    #[must_use]
    pub fn has_rank(self) -> bool {
        self.packed & HAS_RANK == HAS_RANK
    }
    /// Does this square have file?
    #[must_use]
    pub fn has_file(self) -> bool {
        self.packed & HAS_FILE == HAS_FILE
    }
    /// Is this a full square (both file and rank known)?
    #[must_use]
    pub fn is_full(self) -> bool {
        self.has_file() && self.has_rank()
    }
    /// Get the rank of this square. One-based.
    #[must_use]
    pub fn rank(self) -> Option<u8> {
        self.has_rank().then(|| self.rank0() + 1)
    }
    /// Get the file of this square. One-based.
    #[must_use]
    pub fn file(self) -> Option<u8> {
        self.has_file().then(|| self.file0() + 1)
    }
    /// Get the index of this square. Zero-based, perfect for arrays.
    #[must_use]
    pub fn index(self) -> Option<usize> {
        self.is_full().then(|| self.idx())
    }
    /// Whether `other` lies on this (possibly partial) square.
    #[must_use]
    pub fn contains(self, other: Square) -> bool {
        (!self.has_file() || other.file() == self.file())
            && (!self.has_rank() || other.rank() == self.rank())
    }
    /// Board index, only meaningful for full squares.
    pub(crate) fn idx(self) -> usize {
        usize::from(self.packed & 0b11_1111)
    }
    /// Zero-based file.
    pub(crate) fn file0(self) -> u8 {
        self.packed & 0b111
    }
    /// Zero-based rank.
    pub(crate) fn rank0(self) -> u8 {
        (self.packed >> 3) & 0b111
    }
    /// The full square `df` files and `dr` ranks away, if still on the board.
    pub(crate) fn offset(self, df: i8, dr: i8) -> Option<Self> {
        let file = u8::try_from(i16::from(self.file0()) + i16::from(df)).ok()?;
        let rank = u8::try_from(i16::from(self.rank0()) + i16::from(dr)).ok()?;
        (file < 8 && rank < 8).then(|| Self::at(file, rank))
    }
}

/// An error with the size of a square.
pub enum SquareError {
    /// Too large rank.
    TooLargeRank,
    /// Too large file.
    TooLargeFile,
    /// Too large rank and file.
    TooLargeRankAndFile,
}

impl Display for SquareError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match *self {
            Self::TooLargeFile => f.write_str("file should be between 0 and 7"),
            Self::TooLargeRank => f.write_str("rank should be between 0 and 7"),
            Self::TooLargeRankAndFile => f.write_str("rank and file should be between 0 and 7"),
        }
    }
}

impl Debug for SquareError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{self}"))
    }
}

impl Error for SquareError {}

impl TryFrom<(Option<u8>, Option<u8>)> for Square {
    type Error = SquareError;
    /// Build a (possibly partial) square from a zero-based `(file, rank)` pair.
    fn try_from(value: (Option<u8>, Option<u8>)) -> Result<Self, Self::Error> {
        let (file, rank) = value;
        match (file.unwrap_or(0) >= 8, rank.unwrap_or(0) >= 8) {
            (true, true) => return Err(SquareError::TooLargeRankAndFile),
            (true, false) => return Err(SquareError::TooLargeFile),
            (false, true) => return Err(SquareError::TooLargeRank),
            (false, false) => {}
        }

        Ok(Self {
            packed: file.unwrap_or(0)
                | (rank.unwrap_or(0) << 3)
                | if file.is_some() { HAS_FILE } else { 0 }
                | if rank.is_some() { HAS_RANK } else { 0 },
        })
    }
}

impl TryFrom<(u8, u8)> for Square {
    type Error = SquareError;
    /// Build a full square from a zero-based `(file, rank)` pair.
    fn try_from(value: (u8, u8)) -> Result<Self, Self::Error> {
        Self::try_from((Some(value.0), Some(value.1)))
    }
}

impl TryFrom<[char; 2]> for Square {
    type Error = anyhow::Error;
    fn try_from(value: [char; 2]) -> Result<Self, Self::Error> {
        let file = match value[0] {
            f @ 'a'..='h' => f as u8 - b'a',
            _ => bail!("bad file"),
        };
        let rank = match value[1] {
            r @ '1'..='8' => r as u8 - b'1',
            _ => bail!("bad rank"),
        };
        Ok(Self::at(file, rank))
    }
}

impl TryFrom<&str> for Square {
    type Error = anyhow::Error;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let mut iter = value.chars();
        let (Some(file), Some(rank), None) = (iter.next(), iter.next(), iter.next()) else {
            bail!("square should be exactly two characters");
        };
        ensure!(file.is_ascii() && rank.is_ascii(), "square should be ascii");
        Self::try_from([file, rank])
    }
}

impl Display for Square {
    /// Writes the known parts: `e4` for a full square, `e` or `4` for a partial one.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        if self.has_file() {
            write!(f, "{}", char::from(b'a' + self.file0()))?;
        }
        if self.has_rank() {
            write!(f, "{}", char::from(b'1' + self.rank0()))?;
        }
        Ok(())
    }
}

impl Debug for Square {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Square({self})")
    }
}

/// Convenience macro for creating a [`Square`] from something like "a4".
#[macro_export]
macro_rules! square {
    ($sq:literal) => {
        <$crate::Square as ::core::convert::TryFrom<&str>>::try_from($sq).unwrap()
    };
}

/// A legal move, as produced by the move generator for one particular [`Position`].
///
/// Fields are private: capture, castling and en passant flags are derived from the board the
/// move was generated on and cannot be set independently.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    /// The square the piece is moving from.
    from: Square,
    /// The square the piece is moving to. For castling, this is the king's destination.
    to: Square,
    /// The type of piece that is moving.
    piece: Piece,
    /// The color of the moving piece.
    color: Color,
    /// The piece being captured, if any. A pawn for en passant.
    captured: Option<Piece>,
    /// If this is a pawn promoting, the piece it is promoting to.
    promotion: Option<Piece>,
    /// Which side this move castles to, if it is a castling move.
    castling: Option<CastleSide>,
    /// Whether this is an en passant capture.
    en_passant: bool,
}

impl Move {
    /// A plain move or capture.
    pub(crate) fn new(
        from: Square,
        to: Square,
        (piece, color): (Piece, Color),
        captured: Option<Piece>,
    ) -> Self {
        Self {
            from,
            to,
            piece,
            color,
            captured,
            promotion: None,
            castling: None,
            en_passant: false,
        }
    }
    /// This move, promoting to `piece`.
    pub(crate) fn promoting(self, piece: Piece) -> Self {
        Self {
            promotion: Some(piece),
            ..self
        }
    }
    /// An en passant capture.
    pub(crate) fn en_passant(from: Square, to: Square, color: Color) -> Self {
        Self {
            en_passant: true,
            ..Self::new(from, to, (Piece::Pawn, color), Some(Piece::Pawn))
        }
    }
    /// A castling move, expressed as the king's movement.
    pub(crate) fn castle(from: Square, to: Square, color: Color, side: CastleSide) -> Self {
        Self {
            castling: Some(side),
            ..Self::new(from, to, (Piece::King, color), None)
        }
    }

    /// The square the piece is moving from.
    #[must_use]
    pub fn from(self) -> Square {
        self.from
    }
    /// The square the piece is moving to.
    #[must_use]
    pub fn to(self) -> Square {
        self.to
    }
    /// The type of piece that is moving.
    #[must_use]
    pub fn piece(self) -> Piece {
        self.piece
    }
    /// The color of the moving piece.
    #[must_use]
    pub fn color(self) -> Color {
        self.color
    }
    /// The piece being captured, if any.
    #[must_use]
    pub fn captured(self) -> Option<Piece> {
        self.captured
    }
    /// The piece a pawn promotes to, if any.
    #[must_use]
    pub fn promotion(self) -> Option<Piece> {
        self.promotion
    }
    /// Is this a capture (en passant included)?
    #[must_use]
    pub fn is_capture(self) -> bool {
        self.captured.is_some()
    }
    /// Is this a castling move?
    #[must_use]
    pub fn is_castle(self) -> bool {
        self.castling.is_some()
    }
    /// The side this move castles to, if any.
    #[must_use]
    pub fn castle_side(self) -> Option<CastleSide> {
        self.castling
    }
    /// Is this an en passant capture?
    #[must_use]
    pub fn is_en_passant(self) -> bool {
        self.en_passant
    }
}

impl Display for Move {
    /// Long algebraic notation: `e2e4`, `e7e8q`, `e1g1` for castling.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.to_char().to_ascii_lowercase())?;
        }
        Ok(())
    }
}

/// Everything that can go wrong while validating a position, a move or a puzzle solution.
pub enum ChessError {
    /// The FEN string does not follow the grammar. The inner error says which rule was broken.
    MalformedFen(anyhow::Error),
    /// The move token matches neither SAN nor coordinate notation.
    UnparseableToken(String),
    /// The move token matches more than one legal move.
    AmbiguousMove(String),
    /// The move token, or move, matches no legal move.
    IllegalMove(String),
    /// The solution contains no moves.
    EmptySolution,
}

/// The kind of a [`ChessError`], for comparisons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[expect(missing_docs, reason = "mirrors the variants of ChessError")]
pub enum ErrorKind {
    MalformedFen,
    UnparseableToken,
    AmbiguousMove,
    IllegalMove,
    EmptySolution,
}

impl ChessError {
    /// The kind of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedFen(_) => ErrorKind::MalformedFen,
            Self::UnparseableToken(_) => ErrorKind::UnparseableToken,
            Self::AmbiguousMove(_) => ErrorKind::AmbiguousMove,
            Self::IllegalMove(_) => ErrorKind::IllegalMove,
            Self::EmptySolution => ErrorKind::EmptySolution,
        }
    }
}

impl Display for ChessError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MalformedFen(err) => write!(f, "Malformed FEN: {err:#}"),
            Self::UnparseableToken(token) => write!(f, "Unparseable move: {token}"),
            Self::AmbiguousMove(token) => write!(f, "Ambiguous move: {token}"),
            Self::IllegalMove(token) => write!(f, "Illegal move: {token}"),
            Self::EmptySolution => f.write_str("Empty solution"),
        }
    }
}

impl Debug for ChessError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_fmt(format_args!("{self}"))
    }
}

impl Error for ChessError {}

/// Parse an ascii decimal number that must fit in a `u16`.
pub(crate) fn from_decimal_u16(s: impl AsRef<[u8]>) -> Result<u16, anyhow::Error> {
    let s = s.as_ref();
    ensure!(!s.is_empty(), "expected a decimal number");
    s.iter().try_fold(0u16, |acc, &b| {
        ensure!(b.is_ascii_digit(), "unexpected character in decimal number");
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add(u16::from(b - b'0')))
            .ok_or_else(|| anyhow::anyhow!("decimal number too large"))
    })
}
