use cozy_chess::{Board, Move};

use crate::board::victim_value;
use crate::search::eval::piece_value;

/// Immediate exchange balance of a capture: victim value minus attacker
/// value, before considering recaptures.
pub fn exchange_score(board: &Board, mv: Move) -> i32 {
    let attacker = match board.piece_on(mv.from) {
        Some(p) => piece_value(p),
        None => return 0,
    };
    victim_value(board, mv) - attacker
}

/// Net material swing of the exchange sequence opened by `mv`, in
/// centipawns from the mover's perspective. Each side recaptures on the
/// destination square with its least valuable legal attacker; the swap-off
/// list is folded from the end so either side may stop when continuing
/// loses material. Quiet promotions enter with a zero first gain, so the
/// result is negative exactly when the promoted piece is lost.
pub fn see_gain_cp(board: &Board, mv: Move) -> i32 {
    let to = mv.to;
    let attacker = match board.piece_on(mv.from) {
        Some(p) => p,
        None => return 0,
    };
    let mut gains = vec![victim_value(board, mv)];
    let mut occupant_value = mv.promotion.map(piece_value).unwrap_or(piece_value(attacker));

    let mut cur = board.clone();
    cur.play(mv);
    loop {
        // Least valuable legal recapture on the exchange square
        let mut best: Option<(Move, i32)> = None;
        cur.generate_moves(|ml| {
            for m in ml {
                if m.to != to {
                    continue;
                }
                if let Some(p) = cur.piece_on(m.from) {
                    let v = piece_value(p);
                    if best.map_or(true, |(_, bv)| v < bv) {
                        best = Some((m, v));
                    }
                }
            }
            false
        });
        let Some((m, attacker_value)) = best else { break };
        let last = *gains.last().unwrap_or(&0);
        gains.push(occupant_value - last);
        occupant_value = m.promotion.map(piece_value).unwrap_or(attacker_value);
        cur.play(m);
    }

    for i in (0..gains.len().saturating_sub(1)).rev() {
        gains[i] = -((-gains[i]).max(gains[i + 1]));
    }
    gains[0]
}
