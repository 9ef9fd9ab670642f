//! Puzzle solutions: validating an author's move list and grading attempts against it.
//!
//! A solution is typed by hand, in SAN, coordinate notation or a mix of both. It is accepted only
//! if every move is legal in turn from the puzzle's starting position, and is then stored in
//! canonical long algebraic notation so that grading is a plain string comparison.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use core::fmt::Display;

use crate::{
    notation::{resolve_with, Strictness},
    ChessError, Position,
};

/// A validated puzzle solution.
///
/// The canonical moves are never empty, and applying them in order from the starting position
/// only ever plays legal moves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PuzzleSolution {
    /// Where the puzzle starts.
    starting_position: Position,
    /// Long algebraic moves, in order.
    canonical_moves: Vec<String>,
}

impl PuzzleSolution {
    /// Validate a hand-typed solution in [`Strictness::Sloppy`] mode.
    ///
    /// # Errors
    /// See [`build_with`](Self::build_with).
    pub fn build(fen: &str, raw_solution: &str) -> Result<Self, ChessError> {
        Self::build_with(fen, raw_solution, Strictness::Sloppy)
    }

    /// Validate a whitespace-separated solution starting from `fen`.
    ///
    /// Nothing is returned unless every token resolves: the first token that does not aborts the
    /// whole solution.
    ///
    /// # Errors
    /// - [`ChessError::MalformedFen`] if `fen` does not parse.
    /// - [`ChessError::UnparseableToken`], [`ChessError::IllegalMove`] or
    ///   [`ChessError::AmbiguousMove`] naming the first token that does not resolve.
    /// - [`ChessError::EmptySolution`] if there are no tokens at all.
    pub fn build_with(
        fen: &str,
        raw_solution: &str,
        strictness: Strictness,
    ) -> Result<Self, ChessError> {
        let starting_position = Position::parse_fen(fen)?;

        let mut position = starting_position;
        let mut canonical_moves = Vec::new();
        for token in raw_solution.split_whitespace() {
            let resolved = resolve_with(&position, token, strictness).inspect_err(|err| {
                log::debug!("rejecting solution {raw_solution:?} from {fen:?}: {err}");
            })?;
            position = position.apply(resolved.chess_move)?;
            canonical_moves.push(resolved.canonical);
        }

        if canonical_moves.is_empty() {
            return Err(ChessError::EmptySolution);
        }

        log::debug!(
            "accepted {} move solution {:?} from {fen:?}",
            canonical_moves.len(),
            canonical_moves
        );
        Ok(Self {
            starting_position,
            canonical_moves,
        })
    }

    /// Rebuild a solution from a stored record, checking it again.
    ///
    /// # Errors
    /// Same as [`build_with`](Self::build_with) in [`Strictness::Strict`] mode.
    pub fn from_stored(fen: &str, stored_solution: &str) -> Result<Self, ChessError> {
        Self::build_with(fen, stored_solution, Strictness::Strict)
    }

    /// Where the puzzle starts.
    #[must_use]
    pub fn starting_position(&self) -> &Position {
        &self.starting_position
    }

    /// The solution in long algebraic notation.
    #[must_use]
    pub fn canonical_moves(&self) -> &[String] {
        &self.canonical_moves
    }

    /// Grade a learner's move (`from` + `to`, e.g. `e2e4`).
    ///
    /// This is a substring test against the whole stored solution, exactly as the academy's
    /// grading endpoint has always done it. Any move that appears anywhere in the solution counts,
    /// not just the one expected at the learner's current step, and a move without its promotion
    /// letter matches the promoting move. See [`is_expected_move`](Self::is_expected_move) for a
    /// per-step check. An empty move is never correct.
    #[must_use]
    pub fn check_attempt(&self, user_move: &str) -> bool {
        check_stored_attempt(&self.to_string(), user_move)
    }

    /// The canonical move expected at zero-based `ply` of the solution.
    #[must_use]
    pub fn expected_move(&self, ply: usize) -> Option<&str> {
        self.canonical_moves.get(ply).map(String::as_str)
    }

    /// Is `user_move` exactly the move expected at `ply`?
    #[must_use]
    pub fn is_expected_move(&self, ply: usize, user_move: &str) -> bool {
        self.expected_move(ply) == Some(user_move.trim())
    }

    /// The position reached after playing the whole solution.
    #[must_use]
    pub fn final_position(&self) -> Position {
        self.canonical_moves
            .iter()
            .try_fold(self.starting_position, |position, token| {
                position.play(token).map(|(next, _)| next)
            })
            .unwrap_or(self.starting_position)
    }

    /// The shape the creation handler persists.
    #[must_use]
    pub fn to_record(&self) -> PuzzleRecord {
        PuzzleRecord {
            fen: self.starting_position.into_fen(),
            solution: self.to_string(),
        }
    }
}

impl Display for PuzzleSolution {
    /// The canonical moves joined by single spaces, as stored.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for (i, canonical) in self.canonical_moves.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            f.write_str(canonical)?;
        }
        Ok(())
    }
}

/// A puzzle as persisted: the starting FEN and the space-joined canonical solution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PuzzleRecord {
    /// The starting position.
    pub fen: String,
    /// The canonical solution, moves separated by single spaces.
    pub solution: String,
}

/// A puzzle as sent to the board client by the listing handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PuzzleListing {
    /// The starting position.
    pub fen: String,
    /// The canonical solution split into moves.
    pub moves: Vec<String>,
}

impl PuzzleRecord {
    /// Split the stored solution for the listing handler.
    #[must_use]
    pub fn listing(&self) -> PuzzleListing {
        PuzzleListing {
            fen: self.fen.clone(),
            moves: split_moves(&self.solution)
                .into_iter()
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// Grade a learner's move against this record. See [`check_stored_attempt`].
    #[must_use]
    pub fn check_attempt(&self, user_move: &str) -> bool {
        check_stored_attempt(&self.solution, user_move)
    }
}

/// Validate a hand-typed solution in [`Strictness::Sloppy`] mode.
///
/// # Errors
/// See [`PuzzleSolution::build_with`].
pub fn build_solution(fen: &str, raw_solution: &str) -> Result<PuzzleSolution, ChessError> {
    PuzzleSolution::build(fen, raw_solution)
}

/// Grade a learner's move against a validated solution. See [`PuzzleSolution::check_attempt`].
#[must_use]
pub fn check_attempt(solution: &PuzzleSolution, user_move: &str) -> bool {
    solution.check_attempt(user_move)
}

/// Grade a learner's move against a stored solution string by substring containment. Never fails:
/// anything unrecognized is simply incorrect.
#[must_use]
pub fn check_stored_attempt(stored_solution: &str, user_move: &str) -> bool {
    let user_move = user_move.trim();
    !user_move.is_empty() && stored_solution.contains(user_move)
}

/// Split a stored solution into its moves.
#[must_use]
pub fn split_moves(stored_solution: &str) -> Vec<&str> {
    stored_solution.split_whitespace().collect()
}
