//! Legal move generation and attack detection.

use smallvec::SmallVec;

use crate::{board::CastleSide, Color, Move, Piece, Position, Square};

/// A list of moves. Sized so that almost every real position fits without allocating.
pub type MoveList = SmallVec<[Move; 64]>;

/// Knight jumps as `(file, rank)` offsets.
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];
/// King steps, which are also the union of the sliding directions.
const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];
/// Rook directions.
const ORTHOGONALS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
/// Bishop directions.
const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

impl Position {
    /// Every legal move for the side to move.
    ///
    /// The order is deterministic: origin squares from a1 to h8, then each piece's direction table,
    /// with promotions listed queen, rook, bishop, knight.
    #[must_use]
    pub fn legal_moves(&self) -> MoveList {
        let mut moves = MoveList::new();
        self.pseudo_legal_moves(&mut moves);
        let us = self.turn;
        moves.retain(|mv| !self.make_unchecked(*mv).king_attacked(us));
        moves
    }

    /// Is `square` attacked by any piece of color `by`? Pins are ignored, and the square does not
    /// need to be empty.
    #[must_use]
    pub fn is_attacked(&self, square: Square, by: Color) -> bool {
        let holds = |target: Option<Square>, pieces: &[Piece]| {
            target
                .and_then(|target| self.board.get(target))
                .is_some_and(|(piece, color)| color == by && pieces.contains(&piece))
        };

        // Pawns of `by` attacking `square` stand one rank behind it from their point of view.
        if [-1, 1]
            .into_iter()
            .any(|df| holds(square.offset(df, -by.forward()), &[Piece::Pawn]))
        {
            return true;
        }
        if KNIGHT_OFFSETS
            .into_iter()
            .any(|(df, dr)| holds(square.offset(df, dr), &[Piece::Knight]))
        {
            return true;
        }
        if KING_OFFSETS
            .into_iter()
            .any(|(df, dr)| holds(square.offset(df, dr), &[Piece::King]))
        {
            return true;
        }

        let slider_hits = |directions: [(i8, i8); 4], pieces: &[Piece]| {
            directions
                .into_iter()
                .any(|(df, dr)| holds(self.first_occupied(square, df, dr), pieces))
        };
        slider_hits(ORTHOGONALS, &[Piece::Rook, Piece::Queen])
            || slider_hits(DIAGONALS, &[Piece::Bishop, Piece::Queen])
    }

    /// Is `color`'s king attacked? A side without a king is never in check.
    pub(crate) fn king_attacked(&self, color: Color) -> bool {
        self.king_square(color)
            .is_some_and(|king| self.is_attacked(king, color.opposite()))
    }

    /// Is the side to move in check?
    #[must_use]
    pub fn in_check(&self) -> bool {
        self.king_attacked(self.turn)
    }

    /// Is the side to move checkmated?
    #[must_use]
    pub fn is_checkmate(&self) -> bool {
        self.in_check() && self.legal_moves().is_empty()
    }

    /// Is the side to move stalemated?
    #[must_use]
    pub fn is_stalemate(&self) -> bool {
        !self.in_check() && self.legal_moves().is_empty()
    }

    /// Count the leaf nodes of the legal move tree `depth` plies deep.
    #[must_use]
    pub fn perft(&self, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }
        let moves = self.legal_moves();
        if depth == 1 {
            return moves.len() as u64;
        }
        moves
            .into_iter()
            .map(|mv| self.make_unchecked(mv).perft(depth - 1))
            .sum()
    }

    /// The first occupied square walking from `from` in direction `(df, dr)`, not counting `from`.
    fn first_occupied(&self, from: Square, df: i8, dr: i8) -> Option<Square> {
        let mut current = from;
        loop {
            current = current.offset(df, dr)?;
            if self.board.get(current).is_some() {
                return Some(current);
            }
        }
    }

    /// Every move for the side to move that obeys piece movement, ignoring whether it leaves the
    /// king in check. Castling is the exception: its check conditions are verified here.
    fn pseudo_legal_moves(&self, moves: &mut MoveList) {
        let us = self.turn;
        for index in 0..64u8 {
            let from = Square::from_index(index);
            let Some((piece, color)) = self.board.get(from) else {
                continue;
            };
            if color != us {
                continue;
            }
            match piece {
                Piece::Pawn => self.pawn_moves(from, moves),
                Piece::Knight => self.step_moves(from, piece, &KNIGHT_OFFSETS, moves),
                Piece::King => {
                    self.step_moves(from, piece, &KING_OFFSETS, moves);
                    self.castling_moves(from, moves);
                }
                Piece::Bishop => self.slide_moves(from, piece, &DIAGONALS, moves),
                Piece::Rook => self.slide_moves(from, piece, &ORTHOGONALS, moves),
                Piece::Queen => {
                    self.slide_moves(from, piece, &ORTHOGONALS, moves);
                    self.slide_moves(from, piece, &DIAGONALS, moves);
                }
            }
        }
    }

    /// Moves to `to` unless it holds a piece of our own, capturing otherwise.
    fn push_unless_own(&self, from: Square, to: Square, piece: Piece, moves: &mut MoveList) {
        match self.board.get(to) {
            None => moves.push(Move::new(from, to, (piece, self.turn), None)),
            Some((captured, color)) if color != self.turn => {
                moves.push(Move::new(from, to, (piece, self.turn), Some(captured)));
            }
            Some(_) => {}
        }
    }

    /// Knight and king steps.
    fn step_moves(&self, from: Square, piece: Piece, offsets: &[(i8, i8)], moves: &mut MoveList) {
        for &(df, dr) in offsets {
            if let Some(to) = from.offset(df, dr) {
                self.push_unless_own(from, to, piece, moves);
            }
        }
    }

    /// Sliding pieces stop at the first occupied square, capturing it if it is an enemy.
    fn slide_moves(
        &self,
        from: Square,
        piece: Piece,
        directions: &[(i8, i8)],
        moves: &mut MoveList,
    ) {
        for &(df, dr) in directions {
            let mut current = from;
            while let Some(to) = current.offset(df, dr) {
                self.push_unless_own(from, to, piece, moves);
                if self.board.get(to).is_some() {
                    break;
                }
                current = to;
            }
        }
    }

    /// Pushes a pawn move, expanded into the four promotions when it reaches the last rank.
    fn push_pawn_move(&self, mv: Move, moves: &mut MoveList) {
        if mv.to().rank0() == self.turn.opposite().back_rank() {
            moves.extend(Piece::PROMOTIONS.into_iter().map(|piece| mv.promoting(piece)));
        } else {
            moves.push(mv);
        }
    }

    /// Single and double advances, diagonal captures and en passant.
    fn pawn_moves(&self, from: Square, moves: &mut MoveList) {
        let us = self.turn;
        let forward = us.forward();
        let pawn = (Piece::Pawn, us);

        if let Some(one) = from.offset(0, forward) {
            if self.board.get(one).is_none() {
                self.push_pawn_move(Move::new(from, one, pawn, None), moves);

                if from.rank0() == us.pawn_rank() {
                    if let Some(two) = one.offset(0, forward) {
                        if self.board.get(two).is_none() {
                            moves.push(Move::new(from, two, pawn, None));
                        }
                    }
                }
            }
        }

        for df in [-1, 1] {
            let Some(to) = from.offset(df, forward) else {
                continue;
            };
            match self.board.get(to) {
                Some((captured, color)) if color != us => {
                    self.push_pawn_move(Move::new(from, to, pawn, Some(captured)), moves);
                }
                None if self.en_passant == Some(to) => {
                    // The pawn that just double-pushed sits beside us, behind the target square.
                    let victim = to.offset(0, -forward);
                    if victim.and_then(|victim| self.board.get(victim))
                        == Some((Piece::Pawn, us.opposite()))
                    {
                        moves.push(Move::en_passant(from, to, us));
                    }
                }
                _ => {}
            }
        }
    }

    /// Castling moves for the king on `from`.
    ///
    /// Requires the right, the king and rook on their original squares, empty squares between them,
    /// and that the king is not in check and does not pass through or land on an attacked square.
    fn castling_moves(&self, from: Square, moves: &mut MoveList) {
        let us = self.turn;
        let rank = us.back_rank();
        let rights = self.castling(us);
        if rights.neither() || from != Square::at(4, rank) {
            return;
        }

        for side in [CastleSide::Kingside, CastleSide::Queenside] {
            if !rights.allows(side)
                || self.board.get(Square::at(side.rook_file(), rank)) != Some((Piece::Rook, us))
            {
                continue;
            }
            let (low, high) = match side {
                CastleSide::Kingside => (5, 6),
                CastleSide::Queenside => (1, 3),
            };
            if (low..=high).any(|file| self.board.get(Square::at(file, rank)).is_some()) {
                continue;
            }
            // The king's path: its own square, the square it crosses and the square it lands on.
            let king_to = side.king_file();
            let (path_low, path_high) = (king_to.min(4), king_to.max(4));
            if (path_low..=path_high).any(|file| self.is_attacked(Square::at(file, rank), !us)) {
                continue;
            }
            moves.push(Move::castle(from, Square::at(king_to, rank), us, side));
        }
    }
}

/// Every legal move at `position`.
#[must_use]
pub fn legal_moves(position: &Position) -> MoveList {
    position.legal_moves()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square;
    use alloc::{string::ToString, vec::Vec};

    fn position(fen: &str) -> Position {
        Position::parse_fen(fen).unwrap()
    }

    fn canonical(position: &Position) -> Vec<alloc::string::String> {
        let mut moves: Vec<_> = position.legal_moves().iter().map(ToString::to_string).collect();
        moves.sort();
        moves
    }

    #[test]
    fn perft_start_position() {
        let start = Position::default();
        assert_eq!(start.perft(1), 20);
        assert_eq!(start.perft(2), 400);
        assert_eq!(start.perft(3), 8902);
    }

    #[test]
    fn perft_kiwipete() {
        let kiwipete =
            position("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        assert_eq!(kiwipete.perft(1), 48);
        assert_eq!(kiwipete.perft(2), 2039);
        assert_eq!(kiwipete.perft(3), 97862);
    }

    #[test]
    fn perft_en_passant_pins() {
        let endgame = position("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1");
        assert_eq!(endgame.perft(1), 14);
        assert_eq!(endgame.perft(2), 191);
        assert_eq!(endgame.perft(3), 2812);
        assert_eq!(endgame.perft(4), 43238);
    }

    #[test]
    fn perft_promotions_and_castling() {
        let mirrored =
            position("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1");
        assert_eq!(mirrored.perft(1), 6);
        assert_eq!(mirrored.perft(2), 264);
        assert_eq!(mirrored.perft(3), 9467);

        let talkchess = position("rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8");
        assert_eq!(talkchess.perft(1), 44);
        assert_eq!(talkchess.perft(2), 1486);
    }

    #[test]
    fn moves_are_deterministic() {
        let start = Position::default();
        assert_eq!(start.legal_moves(), start.legal_moves());
    }

    #[test]
    fn attacks_and_check() {
        let p = position("4k3/8/8/8/8/8/8/R3K3 b Q - 0 1");
        assert!(p.is_attacked(square!("a8"), Color::White));
        assert!(p.is_attacked(square!("d1"), Color::White));
        assert!(!p.is_attacked(square!("b2"), Color::White));
        assert!(!p.in_check());

        let check = position("4k3/8/8/8/8/8/8/4R1K1 b - - 0 1");
        assert!(check.in_check());
        assert!(check.legal_moves().iter().all(|mv| mv.piece() == Piece::King));
    }

    #[test]
    fn pawn_attacks_point_forward() {
        let p = position("4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");
        assert!(p.is_attacked(square!("d3"), Color::White));
        assert!(p.is_attacked(square!("f3"), Color::White));
        assert!(!p.is_attacked(square!("e3"), Color::White));
        assert!(!p.is_attacked(square!("e4"), Color::White));
        assert!(p.is_attacked(square!("d7"), Color::Black));
    }

    #[test]
    fn pinned_piece_cannot_move() {
        let p = position("4k3/4r3/8/8/8/8/4N3/4K3 w - - 0 1");
        assert!(p.legal_moves().iter().all(|mv| mv.piece() != Piece::Knight));
    }

    #[test]
    fn mate_and_stalemate() {
        let mate = position("R5k1/5ppp/8/8/8/8/5PPP/6K1 b - - 1 1");
        assert!(mate.is_checkmate());
        assert!(!mate.is_stalemate());

        let stalemate = position("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert!(stalemate.is_stalemate());
        assert!(!stalemate.is_checkmate());

        let back_rank = position("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1");
        assert!(!back_rank.is_checkmate());
        assert!(canonical(&back_rank).contains(&"a1a8".to_string()));
    }

    #[test]
    fn castling_needs_empty_safe_path() {
        let open = position("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let moves = canonical(&open);
        assert!(moves.contains(&"e1g1".to_string()));
        assert!(moves.contains(&"e1c1".to_string()));

        let blocked = position("r3k2r/8/8/8/8/8/8/RN2K1NR w KQkq - 0 1");
        let moves = canonical(&blocked);
        assert!(!moves.contains(&"e1g1".to_string()));
        assert!(!moves.contains(&"e1c1".to_string()));

        // The f1 square is covered by the bishop on c4.
        let through_check = position("r3k2r/8/8/8/2b5/8/8/R3K2R w KQkq - 0 1");
        let moves = canonical(&through_check);
        assert!(!moves.contains(&"e1g1".to_string()));
        assert!(moves.contains(&"e1c1".to_string()));

        let in_check = position("r3k2r/8/8/8/8/8/4r3/R3K2R w KQ - 0 1");
        let moves = canonical(&in_check);
        assert!(!moves.contains(&"e1g1".to_string()));
        assert!(!moves.contains(&"e1c1".to_string()));

        // b1 may be attacked, only the king's path matters.
        let b1_attacked = position("1r2k3/8/8/8/8/8/8/R3K3 w Q - 0 1");
        assert!(canonical(&b1_attacked).contains(&"e1c1".to_string()));

        let no_rights = position("r3k2r/8/8/8/8/8/8/R3K2R w kq - 0 1");
        assert!(!canonical(&no_rights).contains(&"e1g1".to_string()));

        let rook_missing = position("r3k2r/8/8/8/8/8/8/R3K3 w KQkq - 0 1");
        assert!(!canonical(&rook_missing).contains(&"e1g1".to_string()));
    }

    #[test]
    fn en_passant_capture() {
        let p = position("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2");
        let ep = p
            .legal_moves()
            .into_iter()
            .find(|mv| mv.is_en_passant())
            .unwrap();
        assert_eq!(ep.to_string(), "e5d6");
        assert_eq!(ep.captured(), Some(Piece::Pawn));

        let stale_target = position("4k3/8/8/4P3/8/8/8/4K3 w - d6 0 2");
        assert!(stale_target.legal_moves().iter().all(|mv| !mv.is_en_passant()));
    }

    #[test]
    fn promotions_come_in_fours() {
        let p = position("8/4P3/8/8/8/8/k7/4K3 w - - 0 1");
        let promotions: Vec<_> = p
            .legal_moves()
            .into_iter()
            .filter(|mv| mv.piece() == Piece::Pawn)
            .map(|mv| mv.to_string())
            .collect();
        assert_eq!(promotions, ["e7e8q", "e7e8r", "e7e8b", "e7e8n"]);
    }

    #[test]
    fn double_push_only_from_start_rank() {
        let p = position("4k3/8/8/8/8/4P3/3P4/4K3 w - - 0 1");
        let moves = canonical(&p);
        assert!(moves.contains(&"d2d4".to_string()));
        assert!(!moves.contains(&"e3e5".to_string()));

        let black = position("4k3/3p4/8/8/8/8/8/4K3 b - - 0 1");
        assert!(canonical(&black).contains(&"d7d5".to_string()));
    }
}
