use std::time::{Duration, Instant};

use cozy_chess::Board;
use lumen::search::alphabeta::{SearchLimit, Searcher};

#[test]
fn movetime_budget_is_respected() {
    let b = Board::default();
    let mut s = Searcher::new(16);
    let t0 = Instant::now();
    let r = s.get_best_move(&b, SearchLimit::MoveTime(100));
    let elapsed = t0.elapsed();
    assert!(r.best_move.is_some(), "a move must come out of a timed search");
    assert!(
        elapsed < Duration::from_millis(250),
        "100ms budget overran its hard cap: {elapsed:?}"
    );
    assert_eq!(
        r.pv.first().copied(),
        r.best_move,
        "bestmove must come from the last completed iteration's pv"
    );
}

#[test]
fn tiny_budget_still_completes_depth_one() {
    let b = Board::default();
    let mut s = Searcher::new(16);
    let r = s.get_best_move(&b, SearchLimit::MoveTime(1));
    assert!(r.best_move.is_some());
    assert!(r.depth >= 1, "the first iteration always completes, got {}", r.depth);
}

#[test]
fn external_stop_flag_interrupts_the_search() {
    let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 2 3";
    let b = Board::from_fen(fen, false).unwrap();
    let mut s = Searcher::new(16);
    let stop = s.stop_flag();
    let t0 = Instant::now();
    let handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        stop.store(true, std::sync::atomic::Ordering::Relaxed);
    });
    let r = s.get_best_move(&b, SearchLimit::Depth(64));
    let elapsed = t0.elapsed();
    handle.join().expect("stopper thread");
    assert!(r.best_move.is_some());
    assert!(
        elapsed < Duration::from_secs(5),
        "stop flag must cut a depth-64 search short: {elapsed:?}"
    );
}
