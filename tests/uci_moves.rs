use cozy_chess::Color;
use lumen::board::Position;

#[test]
fn startpos_move_sequence_applies() {
    let moves: Vec<String> =
        ["e2e4", "e7e5", "g1f3"].iter().map(|s| s.to_string()).collect();
    let pos = Position::set_from_start_and_moves(&moves).expect("legal move sequence");
    assert_eq!(pos.board().side_to_move(), Color::Black, "black to move after 3 plies");
    assert_eq!(pos.history().len(), 4, "start position plus three moves");
}

#[test]
fn castling_in_standard_notation_applies() {
    let moves: Vec<String> = ["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "f8c5", "e1g1"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let pos = Position::set_from_start_and_moves(&moves).expect("castling must apply");
    let b = pos.board();
    assert_eq!(b.piece_on(cozy_chess::Square::G1), Some(cozy_chess::Piece::King));
    assert_eq!(b.piece_on(cozy_chess::Square::F1), Some(cozy_chess::Piece::Rook));
}

#[test]
fn fen_with_moves_applies_from_that_position() {
    let pos = Position::set_from_fen_and_moves(
        "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 2 3",
        &["e1g1".to_string()],
    )
    .expect("white castles short");
    assert_eq!(pos.board().side_to_move(), Color::Black);
}

#[test]
fn illegal_move_is_rejected() {
    let err = Position::set_from_start_and_moves(&["e2e5".to_string()]);
    assert!(err.is_err(), "a pawn cannot jump three squares");
}

#[test]
fn repeated_position_shows_up_in_history() {
    let moves: Vec<String> = ["g1f3", "g8f6", "f3g1", "f6g8"].iter().map(|s| s.to_string()).collect();
    let pos = Position::set_from_start_and_moves(&moves).expect("legal shuffle");
    let first = pos.history()[0];
    let last = *pos.history().last().expect("non-empty history");
    assert_eq!(first, last, "knights returned home, the position repeats");
}
