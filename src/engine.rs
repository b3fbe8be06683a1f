//! Lazy-SMP launcher (spec.md §4.K, §5 "Concurrency & resource model").
//!
//! Workers share only a transposition table and an NNUE network, both
//! read-mostly/read-only once a search starts; everything else (position,
//! accumulator stack, ordering tables, per-ply search stack) is owned
//! per-worker, grounded in how `board/search/smp.rs`'s `SharedSearchState`
//! splits shared-vs-per-thread state.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::board::Position;
use crate::moves::Move;
use crate::nnue::NnueNetwork;
use crate::ordering::OrderingTables;
use crate::search::{SearchLimits, SearchStats, SearchWorker};
use crate::tt::TranspositionTable;

/// Stack size for search worker threads: deep PVS recursion plus the
/// per-node `MovePicker` scratch easily outgrows the platform default.
const SEARCH_STACK_SIZE: usize = 16 * 1024 * 1024;

/// A finished search, reported to the UCI layer as `bestmove ... [ponder ...]`.
pub struct EngineResult {
    pub best_move: Move,
    pub ponder_move: Option<Move>,
    pub stats: SearchStats,
}

/// Owns the resources shared across a `go`: the transposition table, the
/// NNUE network, and the stop flag/global node counter workers poll.
///
/// `ordering_pool` holds one [`OrderingTables`] per worker slot, carried
/// from one `go` to the next on the same slot so history/killers/counter-
/// moves accumulate across the moves of a game (spec.md §3 "History
/// lifecycle") instead of resetting every move; it is only cleared on
/// `ucinewgame`.
pub struct Engine {
    tt: Arc<TranspositionTable>,
    network: Arc<NnueNetwork>,
    threads: AtomicUsize,
    ordering_pool: Mutex<Vec<OrderingTables>>,
}

impl Engine {
    #[must_use]
    pub fn new(tt: Arc<TranspositionTable>, network: Arc<NnueNetwork>, threads: usize) -> Self {
        Engine { tt, network, threads: AtomicUsize::new(threads.max(1)), ordering_pool: Mutex::new(Vec::new()) }
    }

    pub fn set_threads(&self, threads: usize) {
        self.threads.store(threads.max(1), Ordering::Relaxed);
    }

    /// Resets the shared transposition table and every worker slot's
    /// ordering tables (spec.md §3 "reset on `ucinewgame`").
    pub fn new_game(&self) {
        self.tt.clear();
        self.ordering_pool.lock().unwrap().clear();
    }

    /// Takes slot `worker_id`'s carried-over ordering tables, or a fresh
    /// set the first time a slot is used.
    fn take_ordering(&self, worker_id: usize) -> OrderingTables {
        let mut pool = self.ordering_pool.lock().unwrap();
        if worker_id < pool.len() {
            std::mem::replace(&mut pool[worker_id], OrderingTables::new())
        } else {
            OrderingTables::new()
        }
    }

    /// Stores `worker_id`'s ordering tables back for the next `go`.
    fn return_ordering(&self, worker_id: usize, ordering: OrderingTables) {
        let mut pool = self.ordering_pool.lock().unwrap();
        while pool.len() <= worker_id {
            pool.push(OrderingTables::new());
        }
        pool[worker_id] = ordering;
    }

    /// Launches `self.threads` workers on `pos`, blocks until they all
    /// stop (either the time manager/node limit tripped, or `stop` was
    /// set externally), and returns the main worker's result — a helper
    /// thread's deeper-but-unreported search only ever contributes TT
    /// entries, never the final move (spec.md §4.K "only the main
    /// worker's result is reported").
    pub fn search(&self, pos: &Position, limits: SearchLimits, stop: Arc<AtomicBool>, info_sink: Option<Box<dyn FnMut(&SearchStats, &[Move]) + Send>>) -> EngineResult {
        let global_nodes = Arc::new(AtomicU64::new(0));
        let threads = self.threads.load(Ordering::Relaxed);
        let mut handles: Vec<JoinHandle<(Move, SearchStats, OrderingTables)>> = Vec::with_capacity(threads);
        let mut main_sink = info_sink;

        for worker_id in 0..threads {
            let is_main = worker_id == 0;
            let pos = pos.clone();
            let network = Arc::clone(&self.network);
            let tt = Arc::clone(&self.tt);
            let stop = Arc::clone(&stop);
            let global_nodes = Arc::clone(&global_nodes);
            let sink = if is_main { main_sink.take() } else { None };
            let ordering = self.take_ordering(worker_id);

            let handle = thread::Builder::new()
                .name(format!("search-{worker_id}"))
                .stack_size(SEARCH_STACK_SIZE)
                .spawn(move || {
                    let mut worker = SearchWorker::new(pos, network, tt, stop, global_nodes, is_main);
                    worker.set_ordering(ordering);
                    if let Some(sink) = sink {
                        worker.set_info_sink(sink);
                    }
                    let (best_move, stats) = worker.search(limits);
                    (best_move, stats, worker.into_ordering())
                })
                .expect("failed to spawn search worker");
            handles.push(handle);
        }

        let mut main_result = None;
        for (worker_id, handle) in handles.into_iter().enumerate() {
            if let Ok((best_move, stats, ordering)) = handle.join() {
                self.return_ordering(worker_id, ordering);
                if worker_id == 0 {
                    main_result = Some((best_move, stats));
                }
            }
        }
        stop.store(true, Ordering::Relaxed);

        let (best_move, stats) = main_result.unwrap_or((Move::NULL, SearchStats::default()));
        let ponder_move = self.ponder_move(pos, best_move);
        EngineResult { best_move, ponder_move, stats }
    }

    /// Looks up the principal continuation's reply from the TT entry left
    /// behind at the position reached after `best_move`.
    fn ponder_move(&self, pos: &Position, best_move: Move) -> Option<Move> {
        if best_move.is_null() {
            return None;
        }
        let mut after = pos.clone();
        if !after.do_move(best_move) {
            return None;
        }
        self.tt.get(after.z_key(), 0).and_then(|e| e.best_move).filter(|&m| after.move_is_pseudo_legal(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchLimits;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn ordering_tables_persist_across_searches_on_the_same_slot() {
        let tt = Arc::new(TranspositionTable::new(1));
        let network = Arc::new(NnueNetwork::zeroed());
        let engine = Engine::new(tt, network, 1);
        let pos = Position::startpos();

        // Each `go` gets its own fresh stop flag, same as `UciLoop` resets
        // `self.stop` before every search (the flag latches `true` once a
        // search completes).
        engine.search(&pos, SearchLimits::fixed_depth(4), Arc::new(AtomicBool::new(false)), None);
        assert_eq!(engine.ordering_pool.lock().unwrap().len(), 1);
        let after_first = engine.ordering_pool.lock().unwrap()[0].history(crate::types::Color::White, crate::types::Square::new(12), crate::types::Square::new(28));

        engine.search(&pos, SearchLimits::fixed_depth(4), Arc::new(AtomicBool::new(false)), None);
        let after_second = engine.ordering_pool.lock().unwrap()[0].history(crate::types::Color::White, crate::types::Square::new(12), crate::types::Square::new(28));

        // A repeated shallow search from the same position on a persistent
        // slot never resets history between calls, so its magnitude only
        // grows (or stays put, never snaps back to zero).
        assert!(after_second.abs() >= after_first.abs() || after_first == 0);
    }

    #[test]
    fn new_game_clears_the_ordering_pool() {
        let tt = Arc::new(TranspositionTable::new(1));
        let network = Arc::new(NnueNetwork::zeroed());
        let engine = Engine::new(tt, network, 1);
        let pos = Position::startpos();
        let stop = Arc::new(AtomicBool::new(false));

        engine.search(&pos, SearchLimits::fixed_depth(4), stop, None);
        assert!(!engine.ordering_pool.lock().unwrap().is_empty());
        engine.new_game();
        assert!(engine.ordering_pool.lock().unwrap().is_empty());
    }
}
