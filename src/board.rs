//! Board-related stuff: piece placement, castling rights and FEN.

use core::{
    iter,
    ops::{Add, AddAssign, Deref, Sub, SubAssign},
    str::FromStr,
};

use alloc::string::{String, ToString};
use anyhow::{Context, anyhow, bail, ensure};
use bstr::ByteSlice;
use smallvec::SmallVec;

use crate::{ChessError, Color, Piece, Square, from_decimal_u16};

#[cfg(test)]
use proptest_derive::Arbitrary;

use core::fmt::{Debug, Display};

/// Convenience constant for the width of a chess board.
pub const BOARD_WIDTH: usize = 8;
/// Convenience constant for the height of a chess board.
pub const BOARD_HEIGHT: usize = 8;

/// FEN of the standard starting position.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A chess board. Index 0 is a1, index 7 is h1 and index 63 is h8.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board(pub [Option<(Piece, Color)>; BOARD_WIDTH * BOARD_HEIGHT]);

impl Debug for Board {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.into_fen_board())
    }
}

impl Deref for Board {
    type Target = [Option<(Piece, Color)>; BOARD_WIDTH * BOARD_HEIGHT];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::EMPTY_BOARD
    }
}

impl Board {
    /// The empty board.
    pub const EMPTY_BOARD: Board = Board([None; BOARD_WIDTH * BOARD_HEIGHT]);

    /// The piece standing on `square`, if any. Partial squares never hold a piece.
    #[must_use]
    pub fn get(&self, square: Square) -> Option<(Piece, Color)> {
        self.0[square.index()?]
    }

    /// Parse the piece placement field of a FEN string.
    ///
    /// # Errors
    /// If the field does not describe exactly eight ranks of eight squares, an error saying why is
    /// returned.
    pub fn from_fen_board(s: impl AsRef<[u8]>) -> Result<Self, anyhow::Error> {
        let s = s.as_ref();

        ensure!(
            bytecount::count(s, b'/') == 7,
            "board in FEN must have exactly seven slashes"
        );

        // FEN order: a8 first, h1 last.
        let mut cells: SmallVec<[Option<(Piece, Color)>; BOARD_WIDTH * BOARD_HEIGHT]> =
            SmallVec::new();

        for row in s.split(|v| *v == b'/') {
            let old_len = cells.len();
            let mut previous_was_digit = false;
            for &ch in row {
                if let b'1'..=b'8' = ch {
                    ensure!(
                        !previous_was_digit,
                        "consecutive digits in FEN row {:?}",
                        row.as_bstr()
                    );
                    cells.extend(iter::repeat_n(None, usize::from(ch - b'0')));
                    previous_was_digit = true;
                } else {
                    let piece = Piece::from_fen_byte(ch).ok_or_else(|| {
                        anyhow!("unknown character {:?} in FEN board", [ch].as_bstr())
                    })?;
                    cells.push(Some(piece));
                    previous_was_digit = false;
                }
            }
            ensure!(
                cells.len() - old_len == BOARD_WIDTH,
                "FEN row {:?} does not describe exactly eight squares",
                row.as_bstr()
            );
        }

        let mut board = Self::EMPTY_BOARD;
        for (i, cell) in cells.into_iter().enumerate() {
            let rank = BOARD_HEIGHT - 1 - i / BOARD_WIDTH;
            board.0[rank * BOARD_WIDTH + i % BOARD_WIDTH] = cell;
        }
        Ok(board)
    }

    /// Get the FEN-formatted board for this `Board`.
    #[must_use]
    pub fn into_fen_board(self) -> String {
        let mut out = String::new();

        let add_empties = |contiguous_empty: &mut u8, out: &mut String| {
            if *contiguous_empty > 0 {
                out.push(char::from(b'0' + *contiguous_empty));
                *contiguous_empty = 0;
            }
        };

        for rank in (0..BOARD_HEIGHT).rev() {
            let mut contiguous_empty = 0u8;
            for cell in &self.0[rank * BOARD_WIDTH..(rank + 1) * BOARD_WIDTH] {
                if let Some((piece, color)) = cell {
                    add_empties(&mut contiguous_empty, &mut out);
                    out.push(piece.fen_char(*color));
                } else {
                    contiguous_empty += 1;
                }
            }
            add_empties(&mut contiguous_empty, &mut out);
            if rank > 0 {
                out.push('/');
            }
        }

        out
    }
}

/// The two directions a player can castle in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(Arbitrary))]
pub enum CastleSide {
    /// Towards the h-file (`O-O`).
    Kingside,
    /// Towards the a-file (`O-O-O`).
    Queenside,
}

impl CastleSide {
    /// Zero-based file of the rook this side castles with.
    pub(crate) fn rook_file(self) -> u8 {
        match self {
            Self::Kingside => 7,
            Self::Queenside => 0,
        }
    }
    /// Zero-based file the king lands on.
    pub(crate) fn king_file(self) -> u8 {
        match self {
            Self::Kingside => 6,
            Self::Queenside => 2,
        }
    }
    /// Zero-based file the rook lands on.
    pub(crate) fn rook_target_file(self) -> u8 {
        match self {
            Self::Kingside => 5,
            Self::Queenside => 3,
        }
    }
}

/// Which direction(s) can the player castle?
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(test, derive(Arbitrary))]
#[cfg_attr(test, proptest(no_params))]
pub enum Castling {
    /// Neither side.
    Neither,
    /// Just kingside.
    Kingside,
    /// Just queenside.
    Queenside,
    /// Both sides.
    Both,
}

impl Castling {
    /// Can this player castle kingside?
    #[must_use]
    pub fn kingside(self) -> bool {
        matches!(self, Castling::Kingside | Castling::Both)
    }
    /// Can this player castle queenside?
    #[must_use]
    pub fn queenside(self) -> bool {
        matches!(self, Castling::Queenside | Castling::Both)
    }
    /// Can this player castle neither side?
    #[must_use]
    pub fn neither(self) -> bool {
        matches!(self, Castling::Neither)
    }
    /// Can this player castle towards `side`?
    #[must_use]
    pub fn allows(self, side: CastleSide) -> bool {
        match side {
            CastleSide::Kingside => self.kingside(),
            CastleSide::Queenside => self.queenside(),
        }
    }
    /// Get the "castling spec" in FEN format for this enum. Lowercase.
    #[must_use]
    pub fn into_fen_castle_spec(self) -> &'static str {
        match self {
            Self::Neither => "",
            Self::Kingside => "k",
            Self::Queenside => "q",
            Self::Both => "kq",
        }
    }
}

impl From<CastleSide> for Castling {
    fn from(side: CastleSide) -> Self {
        match side {
            CastleSide::Kingside => Self::Kingside,
            CastleSide::Queenside => Self::Queenside,
        }
    }
}

impl Add for Castling {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (_, Castling::Neither)
            | (Castling::Kingside, Castling::Kingside)
            | (Castling::Queenside, Castling::Queenside) => self,

            (Castling::Neither, _) => rhs,

            (Castling::Kingside, Castling::Queenside)
            | (Castling::Queenside, Castling::Kingside)
            | (Castling::Both, _)
            | (_, Castling::Both) => Castling::Both,
        }
    }
}

impl AddAssign for Castling {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Castling {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (_, Castling::Both) | (Castling::Neither, _) => Castling::Neither,
            (_, Castling::Neither) => self,
            (Castling::Both, Castling::Kingside) => Castling::Queenside,
            (Castling::Both, Castling::Queenside) => Castling::Kingside,
            (Castling::Kingside, Castling::Kingside)
            | (Castling::Queenside, Castling::Queenside) => Castling::Neither,
            (Castling::Kingside, Castling::Queenside)
            | (Castling::Queenside, Castling::Kingside) => self,
        }
    }
}

impl SubAssign for Castling {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

/// A chess position: everything a FEN string records.
///
/// Positions are values. Applying a move returns a new `Position` and leaves the old one untouched,
/// so a starting position can be reused across any number of validation attempts.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// The current board.
    pub(crate) board: Board,
    /// The current player's turn.
    pub(crate) turn: Color,
    /// The castling status for black.
    pub(crate) black_castling: Castling,
    /// The castling status for white.
    pub(crate) white_castling: Castling,
    /// The square over which a pawn has just passed while moving two squares if there is one.
    pub(crate) en_passant: Option<Square>,
    /// The number of half-moves since the last capture or pawn advance, used for the fifty-move rule.
    pub(crate) halfmove_clock: u16,
    /// The number of full moves. Starts at one and is incremented after black's turn.
    pub(crate) move_number: u16,
}

impl Debug for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.into_fen())
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.into_fen())
    }
}

impl Default for Position {
    /// The standard starting position.
    fn default() -> Self {
        let mut board = Board::EMPTY_BOARD;
        let back = [
            Piece::Rook,
            Piece::Knight,
            Piece::Bishop,
            Piece::Queen,
            Piece::King,
            Piece::Bishop,
            Piece::Knight,
            Piece::Rook,
        ];
        for (file, piece) in back.into_iter().enumerate() {
            board.0[file] = Some((piece, Color::White));
            board.0[BOARD_WIDTH + file] = Some((Piece::Pawn, Color::White));
            board.0[6 * BOARD_WIDTH + file] = Some((Piece::Pawn, Color::Black));
            board.0[7 * BOARD_WIDTH + file] = Some((piece, Color::Black));
        }
        Self {
            board,
            turn: Color::White,
            black_castling: Castling::Both,
            white_castling: Castling::Both,
            en_passant: None,
            halfmove_clock: 0,
            move_number: 1,
        }
    }
}

impl FromStr for Position {
    type Err = ChessError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_fen(s)
    }
}

impl Position {
    /// Get a `Position` from a FEN string.
    ///
    /// # Errors
    /// If the string is not a valid six-field FEN, [`ChessError::MalformedFen`] is returned.
    pub fn from_fen_u8_slice(s: impl AsRef<[u8]>) -> Result<Self, ChessError> {
        Self::parse_fen_sections(s.as_ref()).map_err(ChessError::MalformedFen)
    }
    /// Get a `Position` from a FEN string.
    ///
    /// # Errors
    /// If the string is not a valid six-field FEN, [`ChessError::MalformedFen`] is returned.
    pub fn parse_fen(s: impl AsRef<str>) -> Result<Self, ChessError> {
        Self::from_fen_u8_slice(s.as_ref().as_bytes())
    }

    /// Split a FEN string into its fields and parse each of them.
    fn parse_fen_sections(s: &[u8]) -> Result<Self, anyhow::Error> {
        let sections: SmallVec<[&[u8]; 6]> = s
            .split(u8::is_ascii_whitespace)
            .filter(|section| !section.is_empty())
            .collect();

        ensure!(
            sections.len() == 6,
            "FEN must have exactly six space-separated fields, found {}",
            sections.len()
        );

        let board = Board::from_fen_board(sections[0]).context("invalid piece placement")?;

        let turn = match sections[1] {
            b"w" => Color::White,
            b"b" => Color::Black,
            b"W" | b"B" => bail!("color in FEN must be lowercase"),
            other => bail!(
                "unknown FEN color string {:?}, should be either 'w' or 'b'",
                other.as_bstr()
            ),
        };

        let mut white_castling = Castling::Neither;
        let mut black_castling = Castling::Neither;

        if sections[2] != b"-" {
            for b in sections[2] {
                let (castling, side) = match b {
                    b'K' => (&mut white_castling, Castling::Kingside),
                    b'Q' => (&mut white_castling, Castling::Queenside),
                    b'k' => (&mut black_castling, Castling::Kingside),
                    b'q' => (&mut black_castling, Castling::Queenside),
                    _ => bail!(
                        "unknown character in allowed castling positions {:?}",
                        sections[2].as_bstr()
                    ),
                };
                ensure!(
                    *castling + side != *castling,
                    "repeated castling right in {:?}",
                    sections[2].as_bstr()
                );
                *castling += side;
            }
        }

        let en_passant = if sections[3] == b"-" {
            None
        } else {
            let square = sections[3]
                .to_str()
                .map_err(|_| anyhow!("en passant field is not ascii"))
                .and_then(Square::try_from)
                .context("en passant field should either be '-' or a valid square")?;
            let expected_rank = match turn {
                Color::White => 5,
                Color::Black => 2,
            };
            ensure!(
                square.rank0() == expected_rank,
                "en passant square {square} is on the wrong rank for the side to move"
            );
            Some(square)
        };

        let halfmove_clock = from_decimal_u16(sections[4]).context("invalid halfmove clock value")?;
        let move_number = from_decimal_u16(sections[5]).context("invalid fullmove number value")?;
        ensure!(move_number >= 1, "fullmove number starts at one");

        for color in [Color::White, Color::Black] {
            ensure!(
                board.iter().filter(|cell| **cell == Some((Piece::King, color))).count() <= 1,
                "more than one {color:?} king"
            );
        }
        ensure!(
            !board[..BOARD_WIDTH]
                .iter()
                .chain(&board[(BOARD_HEIGHT - 1) * BOARD_WIDTH..])
                .any(|cell| matches!(cell, Some((Piece::Pawn, _)))),
            "pawns cannot stand on the first or eighth rank"
        );

        Ok(Self {
            board,
            turn,
            black_castling,
            white_castling,
            en_passant,
            halfmove_clock,
            move_number,
        })
    }

    /// Get the FEN string for this `Position`.
    #[must_use]
    pub fn into_fen(self) -> String {
        let mut out = self.board.into_fen_board();

        out.push(' ');

        match self.turn {
            Color::Black => out.push('b'),
            Color::White => out.push('w'),
        }

        out.push(' ');

        let castling_spec = self.white_castling.into_fen_castle_spec().to_uppercase()
            + self.black_castling.into_fen_castle_spec();

        if castling_spec.is_empty() {
            out.push('-');
        } else {
            out.push_str(&castling_spec);
        }

        out.push(' ');

        match self.en_passant {
            None => out.push('-'),
            Some(square) => out.push_str(&square.to_string()),
        }

        out.push(' ');
        out.push_str(&self.halfmove_clock.to_string());
        out.push(' ');
        out.push_str(&self.move_number.to_string());

        out
    }

    /// The piece placement.
    #[must_use]
    pub fn board(&self) -> &Board {
        &self.board
    }
    /// The piece standing on `square`, if any.
    #[must_use]
    pub fn piece_at(&self, square: Square) -> Option<(Piece, Color)> {
        self.board.get(square)
    }
    /// The player to move.
    #[must_use]
    pub fn turn(&self) -> Color {
        self.turn
    }
    /// The castling rights `color` still has.
    #[must_use]
    pub fn castling(&self, color: Color) -> Castling {
        match color {
            Color::White => self.white_castling,
            Color::Black => self.black_castling,
        }
    }
    /// Mutable access to the castling rights of `color`.
    pub(crate) fn castling_mut(&mut self, color: Color) -> &mut Castling {
        match color {
            Color::White => &mut self.white_castling,
            Color::Black => &mut self.black_castling,
        }
    }
    /// The en passant target square, set only right after a double pawn push.
    #[must_use]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }
    /// The number of half-moves since the last capture or pawn advance.
    #[must_use]
    pub fn halfmove_clock(&self) -> u16 {
        self.halfmove_clock
    }
    /// The full move number.
    #[must_use]
    pub fn move_number(&self) -> u16 {
        self.move_number
    }
    /// The square of `color`'s king, if it has one.
    #[must_use]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.board
            .iter()
            .position(|cell| *cell == Some((Piece::King, color)))
            .and_then(|index| u8::try_from(index).ok())
            .map(Square::from_index)
    }
}
