use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use cozy_chess::Color;
use log::warn;

use crate::board::Position;
use crate::search::alphabeta::{SearchLimit, Searcher};
use crate::search::eval::MAX_DEPTH;

const ENGINE_NAME: &str = "Lumen";
const ENGINE_AUTHOR: &str = "the Lumen authors";

/// UCI front-end. Searches run on a worker thread so `stop` can interrupt
/// them through the shared flag; everything else is answered inline.
pub struct UciEngine {
    pos: Position,
    searcher: Arc<Mutex<Searcher>>,
    stop: Arc<AtomicBool>,
    search_thread: Option<JoinHandle<()>>,
}

impl UciEngine {
    pub fn new(hash_mb: usize) -> Self {
        let searcher = Searcher::new(hash_mb);
        let stop = searcher.stop_flag();
        Self {
            pos: Position::startpos(),
            searcher: Arc::new(Mutex::new(searcher)),
            stop,
            search_thread: None,
        }
    }

    fn cmd_uci(&self) {
        println!("id name {} {}", ENGINE_NAME, env!("CARGO_PKG_VERSION"));
        println!("id author {ENGINE_AUTHOR}");
        println!("option name Hash type spin default 16 min 1 max 16384");
        println!("uciok");
    }

    fn cmd_ucinewgame(&mut self) {
        self.stop_search();
        self.searcher.lock().expect("searcher mutex poisoned").clear_tables();
        self.pos = Position::startpos();
    }

    // Supports 'position startpos [moves ...]' and
    // 'position fen <fen> [moves ...]'
    fn cmd_position(&mut self, args: &str) {
        let mut tokens = args.split_whitespace();
        let parsed = match tokens.next() {
            Some("startpos") => {
                let moves = match tokens.next() {
                    Some("moves") => tokens.map(|s| s.to_string()).collect(),
                    _ => Vec::new(),
                };
                Position::set_from_start_and_moves(&moves)
            }
            Some("fen") => {
                let fen_fields: Vec<&str> = tokens.by_ref().take(6).collect();
                let fen = fen_fields.join(" ");
                let moves = match tokens.next() {
                    Some("moves") => tokens.map(|s| s.to_string()).collect(),
                    _ => Vec::new(),
                };
                Position::set_from_fen_and_moves(&fen, &moves)
            }
            _ => return,
        };
        match parsed {
            Ok(pos) => self.pos = pos,
            Err(e) => warn!("ignoring position command: {e}"),
        }
    }

    fn cmd_setoption(&mut self, args: &str) {
        let mut tokens = args.split_whitespace();
        if tokens.next() != Some("name") {
            return;
        }
        let name: Vec<&str> = tokens.by_ref().take_while(|&t| t != "value").collect();
        let value = tokens.next();
        if name == ["Hash"] {
            if let Some(mb) = value.and_then(|v| v.parse::<usize>().ok()) {
                self.stop_search();
                self.searcher
                    .lock()
                    .expect("searcher mutex poisoned")
                    .set_hash_size_mb(mb.clamp(1, 16_384));
            }
        }
    }

    fn cmd_go(&mut self, args: &str) {
        self.stop_search();
        let limit = parse_go(args, self.pos.board().side_to_move());
        let searcher = Arc::clone(&self.searcher);
        let pos = self.pos.clone();
        self.search_thread = Some(std::thread::spawn(move || {
            let mut s = searcher.lock().expect("searcher mutex poisoned");
            s.set_game_history(pos.history());
            s.get_best_move(pos.board(), limit);
        }));
    }

    fn stop_search(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.search_thread.take() {
            let _ = handle.join();
        }
    }

    pub fn run_loop(&mut self) {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let line = match line {
                Ok(s) => s.trim().to_string(),
                Err(_) => break,
            };
            if line.is_empty() {
                continue;
            }
            if line == "uci" {
                self.cmd_uci();
                continue;
            }
            if line == "isready" {
                println!("readyok");
                continue;
            }
            if line == "ucinewgame" {
                self.cmd_ucinewgame();
                continue;
            }
            if line == "stop" {
                self.stop_search();
                continue;
            }
            if line == "quit" {
                break;
            }
            if let Some(rest) = line.strip_prefix("position ") {
                self.cmd_position(rest);
                continue;
            }
            if let Some(rest) = line.strip_prefix("setoption ") {
                self.cmd_setoption(rest);
                continue;
            }
            if let Some(rest) = line.strip_prefix("go") {
                self.cmd_go(rest.trim());
                continue;
            }
        }
        self.stop_search();
    }
}

/// Map `go` arguments to a search budget. `movetime` and `depth` pass
/// through; a running clock gets a slice of the remaining time; anything
/// else (e.g. `go infinite`) searches to the depth cap until stopped.
fn parse_go(args: &str, side_to_move: Color) -> SearchLimit {
    let mut depth: Option<i32> = None;
    let mut movetime: Option<u64> = None;
    let mut wtime: Option<u64> = None;
    let mut btime: Option<u64> = None;
    let mut winc: Option<u64> = None;
    let mut binc: Option<u64> = None;

    let mut tokens = args.split_whitespace();
    while let Some(tok) = tokens.next() {
        match tok {
            "depth" => depth = tokens.next().and_then(|s| s.parse().ok()),
            "movetime" => movetime = tokens.next().and_then(|s| s.parse().ok()),
            "wtime" => wtime = tokens.next().and_then(|s| s.parse().ok()),
            "btime" => btime = tokens.next().and_then(|s| s.parse().ok()),
            "winc" => winc = tokens.next().and_then(|s| s.parse().ok()),
            "binc" => binc = tokens.next().and_then(|s| s.parse().ok()),
            _ => {}
        }
    }

    if let Some(ms) = movetime {
        return SearchLimit::MoveTime(ms);
    }
    if let Some(d) = depth {
        return SearchLimit::Depth(d);
    }
    let (time, inc) = match side_to_move {
        Color::White => (wtime, winc),
        Color::Black => (btime, binc),
    };
    if let Some(remaining) = time {
        let budget = remaining / 40 + inc.unwrap_or(0) * 3 / 4;
        return SearchLimit::MoveTime(budget.max(1));
    }
    SearchLimit::Depth(MAX_DEPTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_movetime_wins_over_clock() {
        let limit = parse_go("movetime 250 wtime 60000", Color::White);
        assert_eq!(limit, SearchLimit::MoveTime(250));
    }

    #[test]
    fn go_depth_parses() {
        assert_eq!(parse_go("depth 7", Color::Black), SearchLimit::Depth(7));
    }

    #[test]
    fn go_clock_allocates_a_slice() {
        let limit = parse_go("wtime 40000 btime 30000 winc 1000 binc 500", Color::Black);
        assert_eq!(limit, SearchLimit::MoveTime(30_000 / 40 + 375));
    }

    #[test]
    fn go_infinite_searches_to_depth_cap() {
        assert_eq!(parse_go("infinite", Color::White), SearchLimit::Depth(MAX_DEPTH));
    }
}
