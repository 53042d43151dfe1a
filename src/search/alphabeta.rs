use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use cozy_chess::{Board, Color, Move, Piece};
use log::warn;

use crate::board::{self, has_non_pawn_material, is_capture, move_to_uci, pv_to_uci};
use crate::search::eval::{
    evaluate, DRAW_SCORE, INFTY, KNIGHT_VALUE, MATE_SCORE, MAX_DEPTH, MAX_POS_SCORE, PAWN_VALUE,
    QUEEN_VALUE,
};
use crate::search::ordering::MovePicker;
use crate::search::params::SearchParams;
use crate::search::stats::SearchStats;
use crate::search::tt::{Entry, NodeType, Tt};

// Margins below alpha at which shallow quiet moves are not worth searching,
// indexed by remaining depth.
const FUTILITY_MARGIN: [i32; 4] =
    [0, MAX_POS_SCORE, MAX_POS_SCORE + KNIGHT_VALUE, MAX_POS_SCORE + QUEEN_VALUE];

// Margins above beta at which a shallow node is cut outright.
const REVERSE_FUTILITY_MARGIN: [i32; 3] = [0, MAX_POS_SCORE, MAX_POS_SCORE + 2 * PAWN_VALUE];

// A new iteration starts only while elapsed < budget * TIME_FACTOR; the
// hard cap is budget * MAX_TIME_FACTOR.
const TIME_FACTOR: f64 = 0.5;
const MAX_TIME_FACTOR: f64 = 1.5;

/// Search budget: wall-clock milliseconds or a fixed depth in plies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLimit {
    MoveTime(u64),
    Depth(i32),
}

/// Principal variation found at a node. Updated only when a move raises
/// alpha at a PV node.
#[derive(Default, Clone, Debug)]
pub struct PvLine {
    moves: Vec<Move>,
}

impl PvLine {
    pub fn clear(&mut self) {
        self.moves.clear();
    }

    pub fn update(&mut self, best: Move, child: &PvLine) {
        self.moves.clear();
        self.moves.push(best);
        self.moves.extend_from_slice(&child.moves);
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }
}

/// Outcome of the last completed iteration.
#[derive(Debug, Clone, Default)]
pub struct SearchReport {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: i32,
    pub nodes: u64,
    pub pv: Vec<Move>,
}

/// The search core: owns the transposition table, the per-search scratch
/// state, the statistics, and the cooperative stop flag. One search runs
/// at a time.
pub struct Searcher {
    tt: Tt,
    pub(crate) params: SearchParams,
    pub(crate) stats: SearchStats,
    stop: Arc<AtomicBool>,
}

impl Searcher {
    pub fn new(hash_mb: usize) -> Self {
        Self {
            tt: Tt::new(hash_mb),
            params: SearchParams::default(),
            stats: SearchStats::default(),
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared stop flag; the front-end sets it to interrupt a search.
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn set_hash_size_mb(&mut self, megabytes: usize) {
        self.tt = Tt::new(megabytes);
    }

    /// Forget everything learned: transposition table and history.
    pub fn clear_tables(&mut self) {
        self.tt.clear();
        self.params.reset_history();
        self.params.set_game_history(&[]);
    }

    /// Seed repetition detection with the game's position hashes
    /// (oldest first, root position last).
    pub fn set_game_history(&mut self, hashes: &[u64]) {
        self.params.set_game_history(hashes);
    }

    /// Quiescence value of a position over the full window; test hook.
    pub fn qsearch_eval_cp(&mut self, board: &Board) -> i32 {
        self.quiescence(board, 0, -INFTY, INFTY)
    }

    pub(crate) fn ply(&self) -> usize {
        self.params.ply
    }

    /// Depth and bound kind of the stored entry for a position, if any.
    pub fn tt_probe(&self, board: &Board) -> Option<(i32, NodeType)> {
        self.tt.get(board.hash()).map(|e| (e.depth, e.node_type))
    }

    /// Iterative-deepening driver. Emits one UCI info line per completed
    /// depth and a final `bestmove`; returns the last completed iteration.
    pub fn get_best_move(&mut self, root: &Board, limit: SearchLimit) -> SearchReport {
        self.stop.store(false, Ordering::Relaxed);
        self.stats.reset();
        self.params.reset();
        self.params.root_move_number = root.fullmove_number();
        self.params.start_time = Instant::now();
        self.params.time_limit = match limit {
            SearchLimit::MoveTime(ms) => {
                Some(Duration::from_millis((ms as f64 * MAX_TIME_FACTOR) as u64))
            }
            SearchLimit::Depth(_) => None,
        };

        let mut moves = board::legal_moves(root);
        if moves.is_empty() {
            println!("bestmove 0000");
            self.stop.store(true, Ordering::Relaxed);
            return SearchReport::default();
        }
        let mut best_move = moves[0];
        let mut report = SearchReport {
            best_move: Some(best_move),
            score: 0,
            depth: 0,
            nodes: 0,
            pv: Vec::new(),
        };

        let mut root_depth = 1;
        loop {
            self.params.reset();
            let mut pv_line = PvLine::default();
            let (index, score) = self.root_search(root, &moves, root_depth, &mut pv_line);
            let Some(index) = index else { break };
            // Search the new PV first next iteration
            moves.swap(0, index);
            best_move = moves[0];
            self.tt.put(Entry {
                key: root.hash(),
                m: Some(best_move),
                score,
                depth: root_depth,
                node_type: NodeType::Pv,
                age: self.params.root_move_number,
            });

            let elapsed = self.params.elapsed();
            let ms = elapsed.as_millis() as u64;
            let nps = self.stats.nodes * 1000 / ms.max(1);
            println!(
                "info depth {} score {} time {} nodes {} nps {} hashfull {} pv {}",
                root_depth,
                format_score(score),
                ms,
                self.stats.nodes,
                nps,
                self.tt.hashfull(),
                pv_to_uci(root, pv_line.moves()),
            );
            report = SearchReport {
                best_move: Some(best_move),
                score,
                depth: root_depth,
                nodes: self.stats.nodes,
                pv: pv_line.moves().to_vec(),
            };

            if self.stop.load(Ordering::Relaxed) {
                break;
            }
            root_depth += 1;
            let keep_going = match limit {
                SearchLimit::MoveTime(ms_budget) => {
                    elapsed.as_secs_f64() * 1000.0 < ms_budget as f64 * TIME_FACTOR
                        && root_depth <= MAX_DEPTH
                }
                SearchLimit::Depth(d) => root_depth <= d.min(MAX_DEPTH),
            };
            if !keep_going {
                break;
            }
        }

        self.stats.log_summary();
        self.params.age_history();
        self.stop.store(true, Ordering::Relaxed);
        println!("bestmove {}", move_to_uci(root, best_move));
        report
    }

    /// One root iteration over the externally held legal move list.
    /// Returns the index of the best move, or None if the search was
    /// stopped before any move completed.
    fn root_search(
        &mut self,
        root: &Board,
        moves: &[Move],
        depth: i32,
        pv_line: &mut PvLine,
    ) -> (Option<usize>, i32) {
        let mut line = PvLine::default();
        let mut alpha = -MATE_SCORE;
        let beta = MATE_SCORE;
        let mut best: Option<usize> = None;

        for (i, &m) in moves.iter().enumerate() {
            if self.stop.load(Ordering::Relaxed) {
                break;
            }
            let mut child = root.clone();
            child.play(m);
            self.stats.nodes += 1;

            let score = if i == 0 {
                self.params.ply += 1;
                let s = -self.pvs(&child, depth - 1, -beta, -alpha, &mut line);
                self.params.ply -= 1;
                s
            } else {
                self.params.ply += 1;
                let mut s = -self.pvs(&child, depth - 1, -alpha - 1, -alpha, &mut line);
                self.params.ply -= 1;
                if alpha < s && s < beta {
                    self.params.ply += 1;
                    s = -self.pvs(&child, depth - 1, -beta, -alpha, &mut line);
                    self.params.ply -= 1;
                }
                s
            };
            // An interrupted recursion returns a garbage bound; never
            // commit it.
            if self.stop.load(Ordering::Relaxed) {
                break;
            }
            if score > alpha {
                alpha = score;
                best = Some(i);
                pv_line.update(m, &line);
            }
        }
        (best, alpha)
    }

    /// Fail-hard principal-variation search: the result lies in
    /// [alpha, beta]. Draw detection and path bookkeeping live here; the
    /// node body is in `pvs_main`.
    pub fn pvs(
        &mut self,
        board: &Board,
        depth: i32,
        alpha: i32,
        beta: i32,
        pv_line: &mut PvLine,
    ) -> i32 {
        if depth <= 0 {
            pv_line.clear();
            return self.quiescence(board, 0, alpha, beta);
        }
        let key = board.hash();
        if board::is_draw(board) || self.params.is_repetition(key) {
            return DRAW_SCORE.clamp(alpha, beta);
        }
        self.params.rep_push(key);
        let score = self.pvs_main(board, key, depth, alpha, beta, pv_line);
        self.params.rep_pop();
        score
    }

    fn pvs_main(
        &mut self,
        board: &Board,
        key: u64,
        depth: i32,
        mut alpha: i32,
        beta: i32,
        pv_line: &mut PvLine,
    ) -> i32 {
        let prev_alpha = alpha;
        let color = board.side_to_move();
        let mut line = PvLine::default();

        // The probe may cut off outright, or search the hash move and
        // raise alpha without cutting.
        let mut hash_move: Option<Move> = None;
        self.stats.hash_probes += 1;
        if let Some(cutoff) =
            self.probe_tt(board, key, &mut hash_move, depth, &mut alpha, beta, pv_line)
        {
            return cutoff;
        }

        let is_pv_node = beta - alpha != 1;
        let in_check = !board.checkers().is_empty();
        let static_eval = if color == Color::White { evaluate(board) } else { -evaluate(board) };

        // Null move: if passing still beats beta, the real position will
        // too. Skipped in check, at PV nodes, with pawns only, and after
        // two consecutive nulls.
        if depth >= 3
            && !is_pv_node
            && !in_check
            && self.params.null_move_count < 2
            && static_eval >= beta
            && has_non_pawn_material(board, color)
        {
            if let Some(null_board) = board.null_move() {
                let mut reduction = if depth >= 11 {
                    4
                } else if depth >= 6 {
                    3
                } else {
                    2
                };
                // Reduce more when far ahead, but never straight into
                // quiescence
                reduction = (reduction + (static_eval - beta) / PAWN_VALUE).min(depth - 2);

                self.params.null_move_count += 1;
                self.params.ply += 1;
                let null_score =
                    -self.pvs(&null_board, depth - 1 - reduction, -beta, -beta + 1, &mut line);
                self.params.ply -= 1;
                self.params.null_move_count -= 1;
                if null_score >= beta {
                    return beta;
                }
            }
        }

        // Reverse futility: already so far above beta that the opponent
        // would not have allowed this position
        if !is_pv_node
            && !in_check
            && depth <= 2
            && static_eval - REVERSE_FUTILITY_MARGIN[depth as usize] >= beta
            && has_non_pawn_material(board, color)
        {
            return beta;
        }

        let mut picker = MovePicker::new(board, hash_move, &self.params, is_pv_node);
        let mut to_hash: Option<Move> = None;
        let mut moves_searched: u32 = if hash_move.is_some() { 1 } else { 0 };
        let mut searched_any = hash_move.is_some();
        let mut pruned_any = false;

        while let Some(m) = picker.next_move() {
            if self.params.time_up() {
                self.stop.store(true, Ordering::Relaxed);
            }
            if self.stop.load(Ordering::Relaxed) {
                return -INFTY;
            }

            let mut child = board.clone();
            child.play(m);
            let gives_check = !child.checkers().is_empty();
            let capture = is_capture(board, m);
            let promotion = m.promotion.is_some();

            // Futility: deep in material deficit, a quiet move will not
            // recover alpha at this depth
            if depth <= 3
                && static_eval <= alpha - FUTILITY_MARGIN[depth as usize]
                && picker.node_is_reducible()
                && !capture
                && !promotion
                && !gives_check
                && alpha.abs() < QUEEN_VALUE
            {
                pruned_any = true;
                continue;
            }
            self.stats.nodes += 1;

            // Late move reduction: quiet late moves below an unraised
            // alpha are likely worse; search them shallower first
            let mut reduction = 0;
            if picker.node_is_reducible()
                && !capture
                && depth >= 3
                && moves_searched > 2
                && alpha <= prev_alpha
                && !self.params.is_killer(self.params.ply, m)
                && !promotion
                && !gives_check
            {
                reduction = ((depth - 3) as f64 / 4.0 + moves_searched as f64 / 9.5) as i32;
                reduction = reduction.min(depth - 2);
            }

            let score = if moves_searched != 0 {
                self.params.ply += 1;
                let mut s = -self.pvs(&child, depth - 1 - reduction, -alpha - 1, -alpha, &mut line);
                self.params.ply -= 1;
                // Re-search at full depth and window
                if alpha < s && s < beta {
                    self.params.ply += 1;
                    s = -self.pvs(&child, depth - 1, -beta, -alpha, &mut line);
                    self.params.ply -= 1;
                }
                s
            } else {
                self.params.ply += 1;
                let s = -self.pvs(&child, depth - 1, -beta, -alpha, &mut line);
                self.params.ply -= 1;
                s
            };
            searched_any = true;

            if score >= beta {
                self.stats.fail_highs += 1;
                if moves_searched == 0 {
                    self.stats.first_fail_highs += 1;
                }
                self.tt.put(Entry {
                    key,
                    m: Some(m),
                    score: beta,
                    depth,
                    node_type: NodeType::Cut,
                    age: self.params.root_move_number,
                });
                if !capture {
                    self.params.update_killers(m);
                    let piece = board.piece_on(m.from).unwrap_or(Piece::Pawn);
                    self.params.bump_history(color, piece, m.to, depth);
                    self.reduce_bad_histories(board, &picker, m, depth);
                }
                return beta;
            }
            if score > alpha {
                alpha = score;
                to_hash = Some(m);
                pv_line.update(m, &line);
            }
            moves_searched += 1;
        }

        // No playable move at all: mate or stalemate. Reached only when
        // nothing was pruned either, so futility cannot fake a stalemate.
        if !searched_any && !pruned_any {
            return self.score_mate(in_check, alpha, beta);
        }

        if let Some(m) = to_hash.filter(|_| prev_alpha < alpha && alpha < beta) {
            // Exact score on the principal variation
            self.tt.put(Entry {
                key,
                m: Some(m),
                score: alpha,
                depth,
                node_type: NodeType::Pv,
                age: self.params.root_move_number,
            });
            if !is_capture(board, m) {
                let piece = board.piece_on(m.from).unwrap_or(Piece::Pawn);
                self.params.bump_history(color, piece, m.to, depth);
                self.reduce_bad_histories(board, &picker, m, depth);
            }
        } else if alpha <= prev_alpha {
            // All-node: the upper bound alone is worth keeping
            self.tt.put(Entry {
                key,
                m: None,
                score: alpha,
                depth,
                node_type: NodeType::All,
                age: self.params.root_move_number,
            });
        }

        alpha
    }

    /// Probe the transposition table. Returns a definitive score when a
    /// stored bound confirms a cutoff, after possibly searching the stored
    /// move at full window. May raise alpha and set `hash_move` without
    /// cutting off.
    fn probe_tt(
        &mut self,
        board: &Board,
        key: u64,
        hash_move: &mut Option<Move>,
        depth: i32,
        alpha: &mut i32,
        beta: i32,
        pv_line: &mut PvLine,
    ) -> Option<i32> {
        let entry = self.tt.get(key)?;
        self.stats.hash_hits += 1;

        if entry.node_type == NodeType::All {
            // Upper bound: can only confirm a fail-low
            if entry.depth >= depth && entry.score <= *alpha {
                self.stats.hash_score_cuts += 1;
                return Some(*alpha);
            }
            return None;
        }

        *hash_move = entry.m;
        if entry.node_type == NodeType::Cut && entry.depth >= depth && entry.score >= beta {
            self.stats.hash_score_cuts += 1;
            self.stats.fail_highs += 1;
            self.stats.first_fail_highs += 1;
            return Some(beta);
        }
        // PV entries are not trusted for their exact score, only for
        // their move.

        if let Some(m) = entry.m {
            let mut child = board.clone();
            if child.try_play(m).is_ok() {
                self.stats.hash_move_attempts += 1;
                self.stats.nodes += 1;
                let mut line = PvLine::default();
                self.params.ply += 1;
                let score = -self.pvs(&child, depth - 1, -beta, -*alpha, &mut line);
                self.params.ply -= 1;
                if score >= beta {
                    self.stats.hash_move_cuts += 1;
                    return Some(beta);
                }
                if score > *alpha {
                    *alpha = score;
                    pv_line.update(m, &line);
                }
            } else {
                // Type-1 collision: two positions share a table slot
                warn!("hash collision: stored move {m} is illegal here, dropping it");
                *hash_move = None;
            }
        }
        None
    }

    /// Terminal scoring with no legal moves: mate if in check, else
    /// stalemate. Quicker mates score further from zero.
    fn score_mate(&self, in_check: bool, alpha: i32, beta: i32) -> i32 {
        let score = if in_check { -MATE_SCORE + self.params.ply as i32 } else { DRAW_SCORE };
        score.clamp(alpha, beta)
    }

    /// Quiet moves tried before the chosen one lose history, so siblings
    /// that keep failing sink in future ordering.
    fn reduce_bad_histories(&mut self, board: &Board, picker: &MovePicker, best: Move, depth: i32) {
        let color = board.side_to_move();
        for &m in picker.tried() {
            if m == best || is_capture(board, m) || m.promotion.is_some() {
                continue;
            }
            let piece = board.piece_on(m.from).unwrap_or(Piece::Pawn);
            self.params.penalize_history(color, piece, m.to, depth);
        }
    }
}

fn format_score(score: i32) -> String {
    if score >= MATE_SCORE - MAX_DEPTH {
        // Our move ends the game: plies / 2 + 1 full moves
        format!("mate {}", (MATE_SCORE - score) / 2 + 1)
    } else if score <= -MATE_SCORE + MAX_DEPTH {
        // The opponent's move ends the game: plies / 2 full moves
        format!("mate {}", (-MATE_SCORE - score) / 2)
    } else {
        format!("cp {}", score * 100 / PAWN_VALUE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::tt::DEFAULT_SIZE_MB;

    #[test]
    fn score_formatting_follows_uci_conventions() {
        assert_eq!(format_score(150), "cp 150");
        assert_eq!(format_score(MATE_SCORE - 1), "mate 1");
        assert_eq!(format_score(MATE_SCORE - 3), "mate 2");
        assert_eq!(format_score(-MATE_SCORE + 2), "mate -1");
        assert_eq!(format_score(-MATE_SCORE + 4), "mate -2");
    }

    #[test]
    fn pv_line_update_prepends_best_move() {
        let mut child = PvLine::default();
        let e7e5: Move = "e7e5".parse().unwrap();
        let g1f3: Move = "g1f3".parse().unwrap();
        child.update(e7e5, &PvLine::default());
        let mut parent = PvLine::default();
        parent.update(g1f3, &child);
        assert_eq!(parent.moves(), &[g1f3, e7e5]);
    }

    #[test]
    fn pvs_respects_the_window() {
        let board = Board::default();
        let mut s = Searcher::new(DEFAULT_SIZE_MB);
        let mut pv = PvLine::default();
        for &(alpha, beta) in &[(-50, 50), (0, 1), (-300, -100)] {
            let score = s.pvs(&board, 3, alpha, beta, &mut pv);
            assert!(score >= alpha && score <= beta, "({alpha},{beta}) gave {score}");
        }
    }

    #[test]
    fn stalemate_scores_zero() {
        let board = Board::from_fen("k7/8/1Q6/8/8/8/8/K7 b - - 0 1", false).unwrap();
        let mut s = Searcher::new(DEFAULT_SIZE_MB);
        let mut pv = PvLine::default();
        assert_eq!(s.pvs(&board, 4, -INFTY, INFTY, &mut pv), 0);
    }

    #[test]
    fn checkmated_side_sees_mate_at_current_ply() {
        let board = Board::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b - - 0 1", false).unwrap();
        let mut s = Searcher::new(DEFAULT_SIZE_MB);
        let mut pv = PvLine::default();
        assert_eq!(s.pvs(&board, 2, -INFTY, INFTY, &mut pv), -MATE_SCORE);
    }
}
