use cozy_chess::{Board, File, Move, Piece, Rank, Square};

/// A game position: the current board plus the Zobrist keys of every
/// position reached since the start of the game (the current one included).
/// The history seeds repetition detection in the search.
#[derive(Clone, Debug)]
pub struct Position {
    board: Board,
    history: Vec<u64>,
}

impl Position {
    pub fn startpos() -> Self {
        let board = Board::default();
        let history = vec![board.hash()];
        Self { board, history }
    }

    pub fn from_fen(fen: &str) -> Result<Self, String> {
        let board = Board::from_fen(fen, false).map_err(|e| format!("FEN error: {e:?}"))?;
        let history = vec![board.hash()];
        Ok(Self { board, history })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Zobrist keys of all positions played so far, oldest first.
    pub fn history(&self) -> &[u64] {
        &self.history
    }

    /// Play a move given in UCI notation ("e2e4", "e7e8q", "e1g1").
    pub fn make_move_uci(&mut self, mv_uci: &str) -> Result<(), String> {
        let mv = uci_to_move(&self.board, mv_uci)
            .ok_or_else(|| format!("illegal or unparsable move: {mv_uci}"))?;
        self.board.play(mv);
        self.history.push(self.board.hash());
        Ok(())
    }

    pub fn set_from_start_and_moves(moves: &[String]) -> Result<Self, String> {
        let mut pos = Self::startpos();
        for m in moves {
            pos.make_move_uci(m)?;
        }
        Ok(pos)
    }

    pub fn set_from_fen_and_moves(fen: &str, moves: &[String]) -> Result<Self, String> {
        let mut pos = Self::from_fen(fen)?;
        for m in moves {
            pos.make_move_uci(m)?;
        }
        Ok(pos)
    }
}

/// Square a pawn lands on when capturing en passant, if available.
pub fn en_passant_square(board: &Board) -> Option<Square> {
    board
        .en_passant()
        .map(|file| Square::new(file, Rank::Sixth.relative_to(board.side_to_move())))
}

/// True if `mv` takes an enemy piece (en passant included). Castling is
/// encoded as king-takes-own-rook and is not a capture.
pub fn is_capture(board: &Board, mv: Move) -> bool {
    let stm = board.side_to_move();
    if board.color_on(mv.to) == Some(!stm) {
        return true;
    }
    board.piece_on(mv.from) == Some(Piece::Pawn) && en_passant_square(board) == Some(mv.to)
}

/// Value of the piece captured by `mv`, zero for quiet moves.
pub fn victim_value(board: &Board, mv: Move) -> i32 {
    use crate::search::eval::piece_value;
    let stm = board.side_to_move();
    if board.color_on(mv.to) == Some(!stm) {
        if let Some(p) = board.piece_on(mv.to) {
            return piece_value(p);
        }
    }
    if board.piece_on(mv.from) == Some(Piece::Pawn) && en_passant_square(board) == Some(mv.to) {
        return piece_value(Piece::Pawn);
    }
    0
}

pub fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    board.generate_moves(|ml| {
        moves.extend(ml);
        false
    });
    moves
}

/// All capturing moves, capture-promotions and en passant included.
pub fn captures(board: &Board) -> Vec<Move> {
    let enemy = board.colors(!board.side_to_move());
    let ep = en_passant_square(board);
    let mut moves = Vec::with_capacity(16);
    board.generate_moves(|mut ml| {
        let mut targets = enemy;
        if ml.piece == Piece::Pawn {
            if let Some(sq) = ep {
                targets |= sq.bitboard();
            }
        }
        ml.to &= targets;
        moves.extend(ml);
        false
    });
    moves
}

/// Non-capturing promotions.
pub fn quiet_promotions(board: &Board) -> Vec<Move> {
    let enemy = board.colors(!board.side_to_move());
    let mut moves = Vec::new();
    board.generate_moves(|mut ml| {
        if ml.piece == Piece::Pawn {
            ml.to &= !enemy;
            for m in ml {
                if m.promotion.is_some() {
                    moves.push(m);
                }
            }
        }
        false
    });
    moves
}

/// Non-capturing, non-promoting moves that give check.
pub fn quiet_checks(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    for m in legal_moves(board) {
        if is_capture(board, m) || m.promotion.is_some() {
            continue;
        }
        let mut child = board.clone();
        child.play(m);
        if !child.checkers().is_empty() {
            moves.push(m);
        }
    }
    moves
}

/// True when `color` still has a piece other than pawns and the king.
pub fn has_non_pawn_material(board: &Board, color: cozy_chess::Color) -> bool {
    let own = board.colors(color);
    let minors_and_majors = board.pieces(Piece::Knight)
        | board.pieces(Piece::Bishop)
        | board.pieces(Piece::Rook)
        | board.pieces(Piece::Queen);
    !(own & minors_and_majors).is_empty()
}

fn insufficient_material(board: &Board) -> bool {
    let heavy = board.pieces(Piece::Pawn) | board.pieces(Piece::Rook) | board.pieces(Piece::Queen);
    if !heavy.is_empty() {
        return false;
    }
    let minors = board.pieces(Piece::Knight) | board.pieces(Piece::Bishop);
    minors.len() <= 1
}

/// Rule-based draws decidable from the board alone: fifty-move rule and
/// insufficient material. Repetition needs history and lives in the search.
pub fn is_draw(board: &Board) -> bool {
    board.halfmove_clock() >= 100 || insufficient_material(board)
}

/// Parse a UCI move against a position. Standard castling notation
/// (e1g1/e1c1) is translated to the internal king-takes-rook encoding.
/// Returns None if the move does not parse or is illegal here.
pub fn uci_to_move(board: &Board, s: &str) -> Option<Move> {
    let mut mv: Move = s.parse().ok()?;
    if board.piece_on(mv.from) == Some(Piece::King) {
        let back = Rank::First.relative_to(board.side_to_move());
        if mv.from == Square::new(File::E, back) && mv.to.rank() == back {
            if mv.to.file() == File::G {
                mv = Move { from: mv.from, to: Square::new(File::H, back), promotion: None };
            } else if mv.to.file() == File::C {
                mv = Move { from: mv.from, to: Square::new(File::A, back), promotion: None };
            }
        }
    }
    let mut probe = board.clone();
    probe.try_play(mv).ok().map(|_| mv)
}

/// Render a move in UCI notation; the king-takes-rook castling encoding
/// comes out as the standard two-square king move.
pub fn move_to_uci(board: &Board, mv: Move) -> String {
    if board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to) == Some(board.side_to_move())
    {
        let back = mv.from.rank();
        let file = if (mv.to.file() as usize) > (mv.from.file() as usize) {
            File::G
        } else {
            File::C
        };
        return format!("{}{}", mv.from, Square::new(file, back));
    }
    format!("{mv}")
}

/// Render a principal variation, walking the line to keep castling
/// conversion correct. Stops early if a stale move no longer applies.
pub fn pv_to_uci(board: &Board, pv: &[Move]) -> String {
    let mut cur = board.clone();
    let mut out: Vec<String> = Vec::with_capacity(pv.len());
    for &m in pv {
        let s = move_to_uci(&cur, m);
        if cur.try_play(m).is_err() {
            break;
        }
        out.push(s);
    }
    out.join(" ")
}
