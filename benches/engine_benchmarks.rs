//! Benchmarks for move generation, static exchange evaluation, and search.

use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use corvid::board::Position;
use corvid::movegen::{generate_moves, perft};
use corvid::moves::MoveList;
use corvid::nnue::NnueNetwork;
use corvid::search::{SearchLimits, SearchWorker};
use corvid::tt::TranspositionTable;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const MIDDLEGAME: &str = "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4";

fn bench_perft(c: &mut Criterion) {
    let mut group = c.benchmark_group("perft");

    let startpos = Position::startpos();
    for depth in 1..=4 {
        group.bench_with_input(BenchmarkId::new("startpos", depth), &depth, |b, &depth| b.iter(|| perft(&startpos, black_box(depth))));
    }

    let kiwipete = Position::new_from_fen(KIWIPETE, false).unwrap();
    for depth in 1..=3 {
        group.bench_with_input(BenchmarkId::new("kiwipete", depth), &depth, |b, &depth| b.iter(|| perft(&kiwipete, black_box(depth))));
    }

    group.finish();
}

fn bench_movegen(c: &mut Criterion) {
    let mut group = c.benchmark_group("movegen");

    let startpos = Position::startpos();
    group.bench_function("startpos", |b| {
        b.iter(|| {
            let mut list = MoveList::new();
            generate_moves(black_box(&startpos), &mut list, false);
            list
        })
    });

    let middlegame = Position::new_from_fen(MIDDLEGAME, false).unwrap();
    group.bench_function("middlegame", |b| {
        b.iter(|| {
            let mut list = MoveList::new();
            generate_moves(black_box(&middlegame), &mut list, false);
            list
        })
    });

    let kiwipete = Position::new_from_fen(KIWIPETE, false).unwrap();
    group.bench_function("kiwipete", |b| {
        b.iter(|| {
            let mut list = MoveList::new();
            generate_moves(black_box(&kiwipete), &mut list, false);
            list
        })
    });

    group.finish();
}

fn search_to_depth(fen: &str, depth: u32) {
    let pos = Position::new_from_fen(fen, false).unwrap();
    let network = Arc::new(NnueNetwork::zeroed());
    let tt = Arc::new(TranspositionTable::new(16));
    let stop = Arc::new(AtomicBool::new(false));
    let global_nodes = Arc::new(AtomicU64::new(0));
    let mut worker = SearchWorker::new(pos, network, tt, stop, global_nodes, true);
    worker.search(SearchLimits::fixed_depth(depth));
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    group.sample_size(10);

    for depth in [3, 4, 5] {
        group.bench_with_input(BenchmarkId::new("startpos", depth), &depth, |b, &depth| {
            b.iter(|| search_to_depth("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1", depth));
        });
    }

    for depth in [3, 4] {
        group.bench_with_input(BenchmarkId::new("kiwipete", depth), &depth, |b, &depth| {
            b.iter(|| search_to_depth(KIWIPETE, depth));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_perft, bench_movegen, bench_search);
criterion_main!(benches);
