use anyhow::Result;
use clap::Parser;

use lumen::board::Position;
use lumen::search::alphabeta::{SearchLimit, Searcher};
use lumen::uci::UciEngine;

#[derive(Parser, Debug)]
#[command(author, version, about = "UCI chess engine", long_about = None)]
struct Args {
    /// Transposition table size in megabytes
    #[arg(long, default_value_t = 16)]
    hash: usize,

    /// Analyze this FEN once and exit instead of running the UCI loop
    #[arg(long)]
    fen: Option<String>,

    /// Search depth for one-shot analysis
    #[arg(long)]
    depth: Option<i32>,

    /// Time budget in milliseconds for one-shot analysis
    #[arg(long)]
    movetime: Option<u64>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Some(fen) = args.fen {
        let pos = Position::from_fen(&fen).map_err(|e| anyhow::anyhow!(e))?;
        let limit = match (args.depth, args.movetime) {
            (Some(d), _) => SearchLimit::Depth(d),
            (None, Some(ms)) => SearchLimit::MoveTime(ms),
            (None, None) => anyhow::bail!("one-shot analysis needs --depth or --movetime"),
        };
        let mut searcher = Searcher::new(args.hash);
        searcher.set_game_history(pos.history());
        searcher.get_best_move(pos.board(), limit);
        return Ok(());
    }

    UciEngine::new(args.hash).run_loop();
    Ok(())
}
