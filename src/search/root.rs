//! Iterative deepening driver (spec.md §4.J steps 1-3): aspiration
//! windows around the previous iteration's score, and the root move loop
//! that PVS-searches the first move with a full window and every other
//! move with a null-window probe.

use std::time::Instant;

use crate::moves::Move;
use crate::ordering::MAX_INT_PLY;
use crate::picker::{MovePicker, PreviousMove};

use super::constants::*;
use super::{SearchLimits, SearchStats, SearchWorker};

impl SearchWorker {
    /// Runs iterative deepening to completion (or until stopped) and
    /// returns the best move found and the stats for the last completed
    /// iteration. Only the main worker should drive UCI `info` output
    /// through the info sink; helper workers just race the same search.
    pub fn search(&mut self, limits: SearchLimits) -> (Move, SearchStats) {
        let start = Instant::now();
        self.node_limit = limits.nodes;
        if self.is_main {
            self.time_manager = Some(super::TimeManager::new(limits, start));
        }

        let max_depth = limits.depth.unwrap_or(MAX_INT_PLY as u32).min(MAX_INT_PLY as u32);
        let mut last_stats = SearchStats::default();
        let mut best_move = None;
        self.ordering.clear_killers();

        let mut score = 0;
        let mut depth = 1;
        while depth <= max_depth {
            self.seldepth = 0;

            let iteration_score = if depth < ASPIRATION_MIN_DEPTH as u32 {
                self.root_search(depth as i32, -MATE_SCORE, MATE_SCORE)
            } else {
                self.aspiration_search(depth as i32, score)
            };

            if self.interrupted && depth > 1 {
                break;
            }

            score = iteration_score;
            best_move = self.root_best_move;
            last_stats = SearchStats { depth, seldepth: self.seldepth, nodes: self.nodes, score };

            if let Some(sink) = &mut self.info_sink {
                let pv = self.stack[0].pv.clone();
                sink(&last_stats, &pv);
            }

            if let Some(tm) = &self.time_manager {
                let best_nodes = self.root_move_nodes.iter().find(|(m, _)| Some(*m) == best_move).map_or(0, |(_, n)| *n);
                if self.is_main && tm.should_stop_iteration(depth, self.nodes, best_nodes) {
                    break;
                }
            }
            if self.should_stop() {
                break;
            }
            depth += 1;
        }

        (best_move.unwrap_or(Move::NULL), last_stats)
    }

    /// Widens an aspiration window around `prev_score` by
    /// `ASPIRATION_GROWTH_NUM/DEN` each time the root search fails high
    /// or low, falling back to a full window once it's widened enough
    /// that the narrow window bought nothing (spec.md §4.J step 2).
    fn aspiration_search(&mut self, depth: i32, prev_score: i32) -> i32 {
        let mut window = ASPIRATION_INITIAL_WINDOW;
        let mut alpha = (prev_score - window).max(-MATE_SCORE);
        let mut beta = (prev_score + window).min(MATE_SCORE);

        loop {
            let score = self.root_search(depth, alpha, beta);
            if self.interrupted {
                return score;
            }
            if score <= alpha {
                beta = (alpha + beta) / 2;
                alpha = (alpha - window).max(-MATE_SCORE);
            } else if score >= beta {
                beta = (beta + window).min(MATE_SCORE);
            } else {
                return score;
            }
            window = window * ASPIRATION_GROWTH_NUM / ASPIRATION_GROWTH_DEN;
            if window > MATE_SCORE {
                alpha = -MATE_SCORE;
                beta = MATE_SCORE;
            }
        }
    }

    /// One root search at a fixed window: full-width PVS on the first
    /// move, null-window probe (with re-search on fail-high) on the rest.
    fn root_search(&mut self, depth: i32, alpha: i32, beta: i32) -> i32 {
        let key = self.pos.z_key();
        let tt_move = self.tt.get(key, 0).and_then(|e| e.best_move).filter(|&m| self.pos.move_is_pseudo_legal(m));
        let tt_move = tt_move.or(self.root_best_move);

        let mut picker = MovePicker::new(&self.pos, &self.ordering, 0, tt_move, PreviousMove::default(), false);
        let mut best_score = -MATE_SCORE - 1;
        let mut best_move = None;
        let mut move_index = 0;
        let mut alpha = alpha;
        self.root_move_nodes.clear();

        while let Some(m) = picker.next(&self.pos, &self.ordering) {
            let nodes_before = self.nodes;
            if !self.make_move(m, 0) {
                continue;
            }
            move_index += 1;

            let score = if move_index == 1 {
                -self.negamax(depth - 1, -beta, -alpha, 1, false, None)
            } else {
                let probe = -self.negamax(depth - 1, -alpha - 1, -alpha, 1, true, None);
                if probe > alpha && probe < beta {
                    -self.negamax(depth - 1, -beta, -alpha, 1, false, None)
                } else {
                    probe
                }
            };

            self.unmake_move();
            self.root_move_nodes.push((m, self.nodes - nodes_before));

            if self.should_stop() {
                if best_move.is_none() {
                    best_move = Some(m);
                    best_score = score;
                }
                break;
            }

            if score > best_score {
                best_score = score;
                best_move = Some(m);
                if score > alpha {
                    alpha = score;
                    let child_pv = self.stack[1].pv.clone();
                    let mut pv = vec![m];
                    pv.extend(child_pv);
                    self.stack[0].pv = pv;
                }
            }
            if alpha >= beta {
                break;
            }
        }

        if let Some(m) = best_move {
            self.root_best_move = Some(m);
            self.root_best_score = best_score;
        }
        best_score
    }
}
