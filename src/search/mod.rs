//! Iterative deepening / PVS search (spec.md §4.J) and the lazy-SMP
//! worker that drives it (§4.K).
//!
//! One [`SearchWorker`] owns everything the search touches that must stay
//! thread-local (spec.md §5 "Shared resources"): the position, its
//! accumulator stack, its ordering tables, the node counter, and the
//! per-ply search stack. It borrows the transposition table and the NNUE
//! network, both shared read-mostly/read-only across workers.

pub mod constants;
mod negamax;
mod qsearch;
mod root;
pub mod time_manager;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crate::board::Position;
use crate::moves::Move;
use crate::nnue::{AccumulatorStack, NnueNetwork};
use crate::ordering::OrderingTables;
use crate::picker::PreviousMove;
use crate::tt::TranspositionTable;

pub use time_manager::{SearchLimits, TimeManager};

/// Per-ply scratch the search needs across recursive calls: the static
/// eval at this ply (for `improving`), the move played to reach the
/// child, whether a null move here would leave the *mover* "behind", and
/// the PV line rooted at this ply (spec.md §3 "Search stack (per ply)").
#[derive(Clone, Default)]
pub struct PlyState {
    pub static_eval: i32,
    pub played: Move,
    pub behind_before_null: bool,
    pub pv: Vec<Move>,
}

/// Aggregate counters reported back to the UCI layer after a search.
#[derive(Clone, Copy, Default, Debug)]
pub struct SearchStats {
    pub depth: u32,
    pub seldepth: u32,
    pub nodes: u64,
    pub score: i32,
}

pub struct SearchWorker {
    pub(crate) pos: Position,
    pub(crate) accumulators: AccumulatorStack,
    pub(crate) ordering: OrderingTables,
    pub(crate) tt: Arc<TranspositionTable>,
    pub(crate) stop: Arc<AtomicBool>,
    pub(crate) global_nodes: Arc<AtomicU64>,
    pub(crate) stack: Vec<PlyState>,
    pub(crate) nodes: u64,
    pub(crate) seldepth: u32,
    pub(crate) root_ply: u32,
    pub(crate) is_main: bool,
    pub(crate) time_manager: Option<TimeManager>,
    pub(crate) node_limit: Option<u64>,
    pub(crate) interrupted: bool,
    pub(crate) root_best_move: Option<Move>,
    pub(crate) root_best_score: i32,
    pub(crate) root_move_nodes: Vec<(Move, u64)>,
    pub(crate) info_sink: Option<Box<dyn FnMut(&SearchStats, &[Move]) + Send>>,
    pos_stack: Vec<Position>,
}

impl SearchWorker {
    #[must_use]
    pub fn new(pos: Position, network: Arc<NnueNetwork>, tt: Arc<TranspositionTable>, stop: Arc<AtomicBool>, global_nodes: Arc<AtomicU64>, is_main: bool) -> Self {
        let accumulators = AccumulatorStack::new(network, &pos);
        let root_ply = pos.ply();
        SearchWorker {
            pos,
            accumulators,
            ordering: OrderingTables::new(),
            tt,
            stop,
            global_nodes,
            stack: vec![PlyState::default(); constants::MAX_INT_PLY + 8],
            nodes: 0,
            seldepth: 0,
            root_ply,
            is_main,
            time_manager: None,
            node_limit: None,
            interrupted: false,
            root_best_move: None,
            root_best_score: 0,
            root_move_nodes: Vec::new(),
            info_sink: None,
            pos_stack: Vec::new(),
        }
    }

    pub fn set_info_sink(&mut self, sink: Box<dyn FnMut(&SearchStats, &[Move]) + Send>) {
        self.info_sink = Some(sink);
    }

    /// Swaps in ordering tables carried over from a previous `go` on the
    /// same worker slot (spec.md §3 "History lifecycle": tables persist
    /// across the moves of a game, reset only on `ucinewgame`).
    pub fn set_ordering(&mut self, ordering: OrderingTables) {
        self.ordering = ordering;
    }

    /// Hands the (possibly game-long) ordering tables back to the caller
    /// so they can be carried into the next `go` on this worker slot.
    #[must_use]
    pub fn into_ordering(self) -> OrderingTables {
        self.ordering
    }

    fn prev_move(&self, ply: usize) -> PreviousMove {
        if ply == 0 {
            return PreviousMove::default();
        }
        PreviousMove::from_move(self.stack[ply - 1].played)
    }

    /// Cooperative stop check: polled every [`constants::NODE_CHECK_INTERVAL`]
    /// nodes (spec.md §5 "Suspension / cancellation").
    fn should_stop(&mut self) -> bool {
        if self.interrupted {
            return true;
        }
        if self.stop.load(Ordering::Relaxed) {
            self.interrupted = true;
            return true;
        }
        if self.nodes % constants::NODE_CHECK_INTERVAL != 0 {
            return false;
        }
        if let Some(limit) = self.node_limit {
            if self.global_nodes.load(Ordering::Relaxed) >= limit {
                self.interrupted = true;
                self.stop.store(true, Ordering::Relaxed);
                return true;
            }
        }
        if let Some(tm) = &self.time_manager {
            if self.is_main && tm.check_limits(self.global_nodes.load(Ordering::Relaxed)) {
                self.interrupted = true;
                self.stop.store(true, Ordering::Relaxed);
                return true;
            }
        }
        false
    }

    fn count_node(&mut self) {
        self.nodes += 1;
        self.global_nodes.fetch_add(1, Ordering::Relaxed);
    }

    /// Plays `m`. Returns `false` if it leaves the mover's own king in
    /// check (the picker only guarantees pseudo-legality) — in that case
    /// `self.pos` is already back to its pre-move state and there is
    /// nothing to undo, so the caller must skip straight to the next
    /// move without calling [`Self::unmake_move`].
    fn make_move(&mut self, m: Move, ply: usize) -> bool {
        self.pos_stack.push(self.pos.clone());
        if !self.pos.do_move(m) {
            self.pos_stack.pop();
            return false;
        }
        self.accumulators.push(&self.pos, self.pos.pending_update());
        self.stack[ply].played = m;
        true
    }

    /// Undoes the most recent successful [`Self::make_move`] (board/make_move.rs:
    /// "the caller clones before descending and simply drops the clone to undo").
    fn unmake_move(&mut self) {
        self.accumulators.pop();
        self.pos = self.pos_stack.pop().expect("unmake_move without a matching make_move");
    }

    fn static_eval(&self) -> i32 {
        self.accumulators.evaluate(self.pos.side_to_move())
    }

    fn ply_from_root(&self) -> usize {
        (self.pos.ply() - self.root_ply) as usize
    }

    fn is_draw(&self) -> bool {
        self.pos.is_fifty_move_draw() || self.pos.is_repetition_draw() || self.pos.is_insufficient_material()
    }

    /// spec.md §4.J "Terminal checks": a small, node-count-derived score
    /// instead of a flat 0, so two draws reached by different node counts
    /// within the same search don't alias to an identical value the
    /// move-ordering history formula could latch onto.
    fn draw_score(&self) -> i32 {
        (self.nodes & 3) as i32 - 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Position;
    use std::sync::atomic::AtomicU64;

    fn new_worker(fen: &str) -> SearchWorker {
        let pos = Position::new_from_fen(fen, false).unwrap();
        let network = Arc::new(NnueNetwork::zeroed());
        let tt = Arc::new(TranspositionTable::new(1));
        let stop = Arc::new(AtomicBool::new(false));
        let global_nodes = Arc::new(AtomicU64::new(0));
        SearchWorker::new(pos, network, tt, stop, global_nodes, true)
    }

    #[test]
    fn zero_network_static_eval_is_zero() {
        let w = new_worker("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
        assert_eq!(w.static_eval(), 0);
    }
}
