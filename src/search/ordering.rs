use cozy_chess::{Board, Move};

use crate::board::{self, is_capture};
use crate::search::eval::piece_value;
use crate::search::params::SearchParams;
use crate::search::see::see_gain_cp;

// Score bands. History is capped below the killer band, so the yield order
// is: good captures, quiet promotions, killers, quiets, losing tacticals.
const GOOD_CAPTURE_BAND: i32 = 10_000;
const PROMOTION_BAND: i32 = 9_500;
const KILLER_0: i32 = 8_900;
const KILLER_1: i32 = 8_800;
const LOSING_CAPTURE_BAND: i32 = -10_000;

/// Most Valuable Victim / Least Valuable Attacker.
pub fn mvv_lva_score(board: &Board, m: Move) -> i32 {
    let victim = board::victim_value(board, m);
    let attacker = board.piece_on(m.from).map(piece_value).unwrap_or(0);
    victim * 10 - attacker
}

/// Ordered enumeration of the moves at a node, staged by category.
///
/// The hash move is excluded: the TT probe has already searched it.
/// Yields via partial selection sort, so an early cutoff never pays for
/// sorting the tail.
pub struct MovePicker {
    moves: Vec<Move>,
    scores: Vec<i32>,
    cursor: usize,
    last_score: i32,
    in_check: bool,
    is_pv: bool,
}

impl MovePicker {
    pub fn new(
        board: &Board,
        hash_move: Option<Move>,
        params: &SearchParams,
        is_pv: bool,
    ) -> Self {
        let in_check = !board.checkers().is_empty();
        let color = board.side_to_move();
        let killers = params.killers_at(params.ply);

        let all = board::legal_moves(board);
        let mut moves = Vec::with_capacity(all.len());
        let mut scores = Vec::with_capacity(all.len());
        for m in all {
            if Some(m) == hash_move {
                continue;
            }
            let score = if is_capture(board, m) {
                let see = see_gain_cp(board, m);
                if see >= 0 {
                    GOOD_CAPTURE_BAND + mvv_lva_score(board, m)
                } else {
                    LOSING_CAPTURE_BAND + see
                }
            } else if let Some(promo) = m.promotion {
                let see = see_gain_cp(board, m);
                if see >= 0 {
                    PROMOTION_BAND + piece_value(promo) / 100
                } else {
                    LOSING_CAPTURE_BAND + see
                }
            } else if killers[0] == Some(m) {
                KILLER_0
            } else if killers[1] == Some(m) {
                KILLER_1
            } else {
                let piece = board.piece_on(m.from).unwrap_or(cozy_chess::Piece::Pawn);
                params.history_score(color, piece, m.to)
            };
            moves.push(m);
            scores.push(score);
        }

        Self { moves, scores, cursor: 0, last_score: i32::MAX, in_check, is_pv }
    }

    /// Next move in priority order, or None when exhausted.
    pub fn next_move(&mut self) -> Option<Move> {
        if self.cursor >= self.moves.len() {
            return None;
        }
        let mut best = self.cursor;
        for i in (self.cursor + 1)..self.moves.len() {
            if self.scores[i] > self.scores[best] {
                best = i;
            }
        }
        self.moves.swap(self.cursor, best);
        self.scores.swap(self.cursor, best);
        let m = self.moves[self.cursor];
        self.last_score = self.scores[self.cursor];
        self.cursor += 1;
        Some(m)
    }

    /// True once the picker has moved past the tactical stages (hash move,
    /// good captures, promotions) at a non-PV node not in check. Gates
    /// futility pruning and LMR.
    pub fn node_is_reducible(&self) -> bool {
        !self.is_pv && !self.in_check && self.last_score < PROMOTION_BAND
    }

    /// Moves already yielded, in yield order.
    pub fn tried(&self) -> &[Move] {
        &self.moves[..self.cursor]
    }
}
