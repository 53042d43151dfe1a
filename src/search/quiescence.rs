use cozy_chess::{Board, Color};

use crate::board::{self, victim_value};
use crate::search::alphabeta::Searcher;
use crate::search::eval::{
    evaluate_material, evaluate_positional, MATE_SCORE, MAX_POS_SCORE, QUEEN_VALUE,
};
use crate::search::ordering::mvv_lva_score;
use crate::search::see::{exchange_score, see_gain_cp};

impl Searcher {
    /// Tactical extension: search captures, promotions and (at the first
    /// quiescence ply) quiet checks until the position goes quiet.
    /// Fail-hard: the result always lies in [alpha, beta].
    pub(crate) fn quiescence(&mut self, board: &Board, plies: i32, mut alpha: i32, beta: i32) -> i32 {
        if !board.checkers().is_empty() {
            return self.check_quiescence(board, plies, alpha, beta);
        }
        let sign = if board.side_to_move() == Color::White { 1 } else { -1 };

        // Cheap material stand-pat first; bail out of hopeless windows
        // before paying for the positional terms.
        let mut stand_pat = sign * evaluate_material(board);
        if stand_pat >= beta + MAX_POS_SCORE {
            return beta;
        }
        if stand_pat < alpha - 2 * MAX_POS_SCORE - QUEEN_VALUE {
            return alpha;
        }

        stand_pat += sign * evaluate_positional(board);
        if stand_pat > alpha {
            alpha = stand_pat;
        }
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat < alpha - MAX_POS_SCORE - QUEEN_VALUE {
            return alpha;
        }

        let mut searched = 0u32;

        let mut captures = board::captures(board);
        captures.sort_by_key(|&m| -mvv_lva_score(board, m));
        for m in captures {
            // Delta prune: even winning this piece cannot rescue alpha
            if stand_pat + victim_value(board, m) < alpha - MAX_POS_SCORE {
                continue;
            }
            if exchange_score(board, m) < 0 && see_gain_cp(board, m) < -MAX_POS_SCORE {
                continue;
            }
            let mut child = board.clone();
            child.play(m);
            self.stats.nodes += 1;
            self.stats.qs_nodes += 1;
            let score = -self.quiescence(&child, plies + 1, -beta, -alpha);
            if score >= beta {
                self.stats.qs_fail_highs += 1;
                if searched == 0 {
                    self.stats.qs_first_fail_highs += 1;
                }
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
            searched += 1;
        }

        for m in board::quiet_promotions(board) {
            if see_gain_cp(board, m) < 0 {
                continue;
            }
            let mut child = board.clone();
            child.play(m);
            self.stats.nodes += 1;
            self.stats.qs_nodes += 1;
            let score = -self.quiescence(&child, plies + 1, -beta, -alpha);
            if score >= beta {
                self.stats.qs_fail_highs += 1;
                if searched == 0 {
                    self.stats.qs_first_fail_highs += 1;
                }
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
            searched += 1;
        }

        // Quiet checks only at the entry ply, so check chains stay bounded
        if plies <= 0 {
            for m in board::quiet_checks(board) {
                let mut child = board.clone();
                child.play(m);
                self.stats.nodes += 1;
                self.stats.qs_nodes += 1;
                let score = -self.check_quiescence(&child, plies + 1, -beta, -alpha);
                if score >= beta {
                    self.stats.qs_fail_highs += 1;
                    if searched == 0 {
                        self.stats.qs_first_fail_highs += 1;
                    }
                    return beta;
                }
                if score > alpha {
                    alpha = score;
                }
                searched += 1;
            }
        }

        alpha
    }

    /// Quiescence when the side to move is in check: every evasion must be
    /// considered, not just captures. No legal evasion means checkmate.
    pub(crate) fn check_quiescence(
        &mut self,
        board: &Board,
        plies: i32,
        mut alpha: i32,
        beta: i32,
    ) -> i32 {
        let mut searched = 0u32;
        for m in board::legal_moves(board) {
            let mut child = board.clone();
            child.play(m);
            self.stats.nodes += 1;
            self.stats.qs_nodes += 1;
            let score = -self.quiescence(&child, plies + 1, -beta, -alpha);
            if score >= beta {
                self.stats.qs_fail_highs += 1;
                if searched == 0 {
                    self.stats.qs_first_fail_highs += 1;
                }
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
            searched += 1;
        }

        if searched == 0 {
            // Deeper mates score closer to zero
            let score = -MATE_SCORE + self.ply() as i32 + plies;
            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }
        alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::eval::{evaluate, INFTY};
    use crate::search::tt::DEFAULT_SIZE_MB;

    #[test]
    fn quiet_position_returns_static_eval() {
        let board = Board::from_fen("k7/8/8/8/8/8/8/7K w - - 0 1", false).unwrap();
        let mut s = Searcher::new(DEFAULT_SIZE_MB);
        assert_eq!(s.qsearch_eval_cp(&board), evaluate(&board));
    }

    #[test]
    fn hanging_queen_is_taken() {
        // Black to move captures the undefended queen
        let board = Board::from_fen("4k3/8/8/8/5q2/8/8/2Q4K b - - 0 1", false).unwrap();
        let mut s = Searcher::new(DEFAULT_SIZE_MB);
        let stand = -evaluate(&board);
        let qs = s.qsearch_eval_cp(&board);
        assert!(qs > stand, "resolving the capture must improve on stand pat: {qs} vs {stand}");
    }

    #[test]
    fn result_stays_inside_the_window() {
        let board =
            Board::from_fen("r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4", false)
                .unwrap();
        let mut s = Searcher::new(DEFAULT_SIZE_MB);
        let (alpha, beta) = (-50, 50);
        let score = s.quiescence(&board, 0, alpha, beta);
        assert!(score >= alpha && score <= beta, "fail-hard violated: {score}");
        let wide = s.quiescence(&board, 0, -INFTY, INFTY);
        assert!(!crate::search::eval::is_mate_score(wide));
    }

    #[test]
    fn checkmate_is_recognized_in_check_quiescence() {
        // Back-rank mate, black to move with no evasions
        let board = Board::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1", false).unwrap();
        let mut s = Searcher::new(DEFAULT_SIZE_MB);
        let score = s.quiescence(&board, 0, -INFTY, INFTY);
        assert!(score <= -MATE_SCORE + 64, "mated side must see a mate score, got {score}");
    }
}
