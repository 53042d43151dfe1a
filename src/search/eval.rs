use cozy_chess::{Board, Color, Piece, Square};

pub const PAWN_VALUE: i32 = 100;
pub const KNIGHT_VALUE: i32 = 320;
pub const BISHOP_VALUE: i32 = 330;
pub const ROOK_VALUE: i32 = 500;
pub const QUEEN_VALUE: i32 = 900;

/// Larger than any score the search can legitimately produce.
pub const INFTY: i32 = 32_767;
/// Mate in n plies scores MATE_SCORE - n for the mater.
pub const MATE_SCORE: i32 = 32_000;
pub const DRAW_SCORE: i32 = 0;
pub const MAX_DEPTH: i32 = 99;

/// Cap on the positional swing of the evaluation, used by pruning margins.
pub const MAX_POS_SCORE: i32 = 200;

pub fn piece_value(piece: Piece) -> i32 {
    match piece {
        Piece::Pawn => PAWN_VALUE,
        Piece::Knight => KNIGHT_VALUE,
        Piece::Bishop => BISHOP_VALUE,
        Piece::Rook => ROOK_VALUE,
        Piece::Queen => QUEEN_VALUE,
        Piece::King => 20_000,
    }
}

pub fn is_mate_score(score: i32) -> bool {
    score.abs() >= MATE_SCORE - MAX_DEPTH
}

// Piece-square tables, written rank 8 first so they read like a board from
// White's side. White pieces index with sq ^ 56, Black with sq as-is.
#[rustfmt::skip]
const PAWN_PST: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
     50,  50,  50,  50,  50,  50,  50,  50,
     10,  10,  20,  30,  30,  20,  10,  10,
      5,   5,  10,  25,  25,  10,   5,   5,
      0,   0,   0,  20,  20,   0,   0,   0,
      5,  -5, -10,   0,   0, -10,  -5,   5,
      5,  10,  10, -20, -20,  10,  10,   5,
      0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT_PST: [i32; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOP_PST: [i32; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOK_PST: [i32; 64] = [
      0,   0,   0,   0,   0,   0,   0,   0,
      5,  10,  10,  10,  10,  10,  10,   5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
     -5,   0,   0,   0,   0,   0,   0,  -5,
      0,   0,   0,   5,   5,   0,   0,   0,
];

#[rustfmt::skip]
const QUEEN_PST: [i32; 64] = [
    -20, -10, -10,  -5,  -5, -10, -10, -20,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,   5,   5,   5,   0, -10,
     -5,   0,   5,   5,   5,   5,   0,  -5,
     -5,   0,   5,   5,   5,   5,   0,  -5,
    -10,   0,   5,   5,   5,   5,   0, -10,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -20, -10, -10,  -5,  -5, -10, -10, -20,
];

#[rustfmt::skip]
const KING_PST: [i32; 64] = [
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -10, -20, -20, -20, -20, -20, -20, -10,
     20,  20,   0,   0,   0,   0,  20,  20,
     20,  30,  10,   0,   0,  10,  30,  20,
];

fn pst(piece: Piece) -> &'static [i32; 64] {
    match piece {
        Piece::Pawn => &PAWN_PST,
        Piece::Knight => &KNIGHT_PST,
        Piece::Bishop => &BISHOP_PST,
        Piece::Rook => &ROOK_PST,
        Piece::Queen => &QUEEN_PST,
        Piece::King => &KING_PST,
    }
}

fn pst_value(piece: Piece, sq: Square, color: Color) -> i32 {
    let idx = match color {
        Color::White => sq as usize ^ 56,
        Color::Black => sq as usize,
    };
    pst(piece)[idx]
}

/// Material balance in centipawns, positive when White is ahead.
pub fn evaluate_material(board: &Board) -> i32 {
    let mut score = 0;
    for &piece in &[Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
        let bb = board.pieces(piece);
        let white = (bb & board.colors(Color::White)).len() as i32;
        let black = (bb & board.colors(Color::Black)).len() as i32;
        score += (white - black) * piece_value(piece);
    }
    score
}

/// Positional residual from piece placement, positive when White is ahead.
pub fn evaluate_positional(board: &Board) -> i32 {
    let mut score = 0;
    for &color in &[Color::White, Color::Black] {
        let sign = if color == Color::White { 1 } else { -1 };
        let own = board.colors(color);
        for &piece in
            &[Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen, Piece::King]
        {
            for sq in own & board.pieces(piece) {
                score += sign * pst_value(piece, sq, color);
            }
        }
    }
    score
}

/// Full static evaluation from White's perspective. The search negates
/// this when Black is to move.
pub fn evaluate(board: &Board) -> i32 {
    evaluate_material(board) + evaluate_positional(board)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cozy_chess::Board;

    #[test]
    fn startpos_is_balanced() {
        let b = Board::default();
        assert_eq!(evaluate_material(&b), 0);
        assert_eq!(evaluate_positional(&b), 0);
    }

    #[test]
    fn extra_queen_dominates_eval() {
        let b = Board::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1", false).unwrap();
        assert!(evaluate(&b) > QUEEN_VALUE - MAX_POS_SCORE);
    }

    #[test]
    fn pst_is_color_symmetric() {
        // Mirrored knights must cancel out
        let b = Board::from_fen("4k3/8/2n5/8/8/2N5/8/4K3 w - - 0 1", false).unwrap();
        assert_eq!(evaluate(&b), 0);
    }

    #[test]
    fn central_pawn_beats_rim_pawn() {
        let center = Board::from_fen("4k3/8/8/8/3P4/8/8/4K3 w - - 0 1", false).unwrap();
        let rim = Board::from_fen("4k3/8/8/8/P7/8/8/4K3 w - - 0 1", false).unwrap();
        assert!(evaluate(&center) > evaluate(&rim));
    }
}
