//! Applying moves to positions.

use alloc::string::ToString;

use crate::{board::Castling, ChessError, Color, Move, Piece, Position, Square};

/// The castling right lost when something moves from or to a rook's original corner.
fn corner_right(square: Square) -> Option<(Color, Castling)> {
    match square.index()? {
        0 => Some((Color::White, Castling::Queenside)),
        7 => Some((Color::White, Castling::Kingside)),
        56 => Some((Color::Black, Castling::Queenside)),
        63 => Some((Color::Black, Castling::Kingside)),
        _ => None,
    }
}

impl Position {
    /// Apply a legal move, returning the resulting position. `self` is left untouched.
    ///
    /// # Errors
    /// If `mv` is not one of [`legal_moves`](Self::legal_moves), [`ChessError::IllegalMove`] is
    /// returned.
    pub fn apply(&self, mv: Move) -> Result<Position, ChessError> {
        if !self.legal_moves().contains(&mv) {
            return Err(ChessError::IllegalMove(mv.to_string()));
        }
        Ok(self.make_unchecked(mv))
    }

    /// Play a pseudo-legal move without checking it. Used by the generator to test candidates.
    pub(crate) fn make_unchecked(&self, mv: Move) -> Position {
        let mut next = *self;
        let us = mv.color();
        let (from, to) = (mv.from(), mv.to());

        next.board.0[from.idx()] = None;
        if mv.is_en_passant() {
            // The captured pawn sits beside the mover, not on the target square.
            next.board.0[Square::at(to.file0(), from.rank0()).idx()] = None;
        }
        next.board.0[to.idx()] = Some((mv.promotion().unwrap_or(mv.piece()), us));

        if let Some(side) = mv.castle_side() {
            let rank = us.back_rank();
            let rook = next.board.0[Square::at(side.rook_file(), rank).idx()].take();
            next.board.0[Square::at(side.rook_target_file(), rank).idx()] = rook;
        }

        if mv.piece() == Piece::King {
            *next.castling_mut(us) = Castling::Neither;
        }
        for square in [from, to] {
            if let Some((color, right)) = corner_right(square) {
                *next.castling_mut(color) -= right;
            }
        }

        next.en_passant = if mv.piece() == Piece::Pawn && from.rank0().abs_diff(to.rank0()) == 2 {
            from.offset(0, us.forward())
        } else {
            None
        };

        next.halfmove_clock = if mv.piece() == Piece::Pawn || mv.is_capture() {
            0
        } else {
            self.halfmove_clock.saturating_add(1)
        };
        if us == Color::Black {
            next.move_number = self.move_number.saturating_add(1);
        }
        next.turn = us.opposite();

        next
    }
}
