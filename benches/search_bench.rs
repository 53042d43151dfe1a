use criterion::{black_box, criterion_group, criterion_main, Criterion};

use cozy_chess::Board;
use lumen::search::alphabeta::{PvLine, Searcher};
use lumen::search::eval::INFTY;

fn bench_pvs_depth4(c: &mut Criterion) {
    let board = Board::default();
    c.bench_function("pvs startpos depth 4", |b| {
        b.iter(|| {
            let mut s = Searcher::new(16);
            let mut pv = PvLine::default();
            s.pvs(black_box(&board), 4, -INFTY, INFTY, &mut pv)
        })
    });
}

fn bench_qsearch_tactical(c: &mut Criterion) {
    let board = Board::from_fen(
        "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
        false,
    )
    .unwrap();
    c.bench_function("qsearch italian", |b| {
        let mut s = Searcher::new(16);
        b.iter(|| s.qsearch_eval_cp(black_box(&board)))
    });
}

criterion_group!(benches, bench_pvs_depth4, bench_qsearch_tactical);
criterion_main!(benches);
