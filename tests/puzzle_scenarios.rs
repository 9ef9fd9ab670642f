//! End-to-end puzzle flows through the public API.

use puzzlechess::{
    build_solution, check_attempt, check_stored_attempt, resolve, ErrorKind, Position,
    PuzzleSolution, Strictness, STARTING_FEN,
};

const BACK_RANK: &str = "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1";
const PROMOTION: &str = "8/4P3/8/8/8/8/k7/4K3 w - - 0 1";
const KNIGHTS: &str = "4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1";
const CASTLES: &str = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";

fn canonical(fen: &str, raw: &str) -> String {
    build_solution(fen, raw).unwrap().to_string()
}

fn error_kind(fen: &str, raw: &str) -> ErrorKind {
    build_solution(fen, raw).unwrap_err().kind()
}

#[test]
fn coordinate_solution_is_kept() {
    assert_eq!(canonical(STARTING_FEN, "e2e4 e7e5"), "e2e4 e7e5");
}

#[test]
fn san_is_normalized_to_coordinates() {
    let solution = build_solution(STARTING_FEN, "e2e4 e7e5 Nf3").unwrap();
    assert_eq!(solution.to_string(), "e2e4 e7e5 g1f3");
    assert!(check_attempt(&solution, "g1f3"));
    assert!(!check_attempt(&solution, "b1c3"));
}

#[test]
fn mating_move_is_accepted() {
    let solution = build_solution(BACK_RANK, "a1a8").unwrap();
    assert_eq!(solution.to_string(), "a1a8");
    assert!(solution.final_position().is_checkmate());
    assert_eq!(canonical(BACK_RANK, "Ra8#"), "a1a8");
}

#[test]
fn promotion_needs_a_piece() {
    assert_eq!(canonical(PROMOTION, "e7e8q"), "e7e8q");
    assert_eq!(canonical(PROMOTION, "e8=Q"), "e7e8q");
    assert_eq!(canonical(PROMOTION, "e8N"), "e7e8n");

    let err = build_solution(PROMOTION, "e7e8").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IllegalMove);
    assert_eq!(err.to_string(), "Illegal move: e7e8");
}

#[test]
fn ambiguous_knight_move_is_rejected() {
    let err = build_solution(KNIGHTS, "Nd2").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AmbiguousMove);
    assert_eq!(err.to_string(), "Ambiguous move: Nd2");
    assert_eq!(canonical(KNIGHTS, "Nbd2"), "b1d2");
    assert_eq!(canonical(KNIGHTS, "Nfd2"), "f3d2");
    assert_eq!(canonical(KNIGHTS, "f3d2"), "f3d2");
}

#[test]
fn castling_follows_the_rules() {
    assert_eq!(canonical(CASTLES, "O-O"), "e1g1");
    assert_eq!(canonical(CASTLES, "e1c1"), "e1c1");
    assert_eq!(canonical(CASTLES, "O-O O-O-O"), "e1g1 e8c8");

    // The rook on f8 covers f1.
    let guarded = "4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1";
    assert_eq!(error_kind(guarded, "O-O"), ErrorKind::IllegalMove);
    assert_eq!(canonical(guarded, "O-O-O"), "e1c1");

    let no_rights = "4k3/8/8/8/8/8/8/R3K2R w - - 0 1";
    assert_eq!(error_kind(no_rights, "O-O"), ErrorKind::IllegalMove);
    assert_eq!(error_kind(no_rights, "e1g1"), ErrorKind::IllegalMove);
}

#[test]
fn one_bad_token_rejects_the_whole_solution() {
    assert_eq!(error_kind(STARTING_FEN, "e2e4 e7e5 Nf6"), ErrorKind::IllegalMove);
    assert_eq!(error_kind(STARTING_FEN, "e2e4 zz9 e7e5"), ErrorKind::UnparseableToken);
    assert_eq!(error_kind(STARTING_FEN, "   "), ErrorKind::EmptySolution);
    assert_eq!(error_kind("8/8/8 w - - 0 1", "e2e4"), ErrorKind::MalformedFen);
}

#[test]
fn attempts_are_graded_by_containment() {
    let stored = canonical(STARTING_FEN, "e4 e5 Nf3 Nc6");
    assert_eq!(stored, "e2e4 e7e5 g1f3 b8c6");

    assert!(check_stored_attempt(&stored, "g1f3"));
    assert!(check_stored_attempt(&stored, " b8c6 "));
    // A fragment of the stored line also counts.
    assert!(check_stored_attempt(&stored, "e7e5 g1"));
    assert!(!check_stored_attempt(&stored, "d2d4"));
    assert!(!check_stored_attempt(&stored, ""));
    assert!(!check_stored_attempt(&stored, "  "));
}

#[test]
fn stored_solutions_load_strictly() {
    let stored = canonical(STARTING_FEN, "e4 e5");
    let solution = PuzzleSolution::from_stored(STARTING_FEN, &stored).unwrap();
    assert_eq!(solution.canonical_moves(), ["e2e4", "e7e5"]);
    assert_eq!(solution.expected_move(1), Some("e7e5"));
    assert!(solution.is_expected_move(0, "e2e4"));
    assert!(!solution.is_expected_move(1, "e2e4"));
}

#[test]
fn strict_resolution_rejects_sloppy_tokens() {
    let start = Position::default();
    assert_eq!(resolve(&start, "Pe4").unwrap().canonical, "e2e4");
    let err = puzzlechess::resolve_with(&start, "Pe4", Strictness::Strict).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnparseableToken);
}
