//! Quiescence search (spec.md §4.J "Quiescence(α, β)"): resolves tactical
//! sequences at the leaves of the main search so the static evaluator is
//! never asked to judge a position with a hanging piece on the board.

use crate::ordering::MAX_PLY;
use crate::picker::MovePicker;
use crate::tt::Bound;

use super::constants::{mated_in, QSEARCH_DELTA_MARGIN};
use super::SearchWorker;

impl SearchWorker {
    pub fn quiescence(&mut self, mut alpha: i32, beta: i32, ply: usize) -> i32 {
        self.count_node();
        self.seldepth = self.seldepth.max(ply as u32);

        if ply >= MAX_PLY {
            return self.static_eval();
        }

        let in_check = self.pos.is_in_check(self.pos.side_to_move());
        let key = self.pos.z_key();
        let tt_entry = self.tt.get(key, MAX_PLY as u32);
        let tt_move = tt_entry.and_then(|e| e.best_move).filter(|&m| self.pos.move_is_pseudo_legal(m));

        if let Some(entry) = tt_entry {
            let usable = match entry.bound {
                Bound::Exact => true,
                Bound::LowerBound => entry.score >= beta,
                Bound::UpperBound => entry.score <= alpha,
            };
            if usable {
                return entry.score;
            }
        }

        let stand_pat = if in_check { mated_in(ply as i32) } else { self.static_eval() };

        if !in_check {
            if stand_pat >= beta {
                return stand_pat;
            }
            if stand_pat > alpha {
                alpha = stand_pat;
            }
        }

        let mut best_score = stand_pat;

        if in_check {
            // In check: the picker still needs quiet evasions, so fall
            // back to the full move generator via the non-captures-only
            // picker, but it is bounded by the same recursion depth.
            let prev = self.prev_move(ply);
            let mut picker = MovePicker::new(&self.pos, &self.ordering, ply, tt_move, prev, false);
            let mut moves_tried = 0;
            while let Some(m) = picker.next(&self.pos, &self.ordering) {
                if !self.make_move(m, ply) {
                    continue;
                }
                moves_tried += 1;
                let score = -self.quiescence(-beta, -alpha, ply + 1);
                self.unmake_move();
                if self.should_stop() {
                    return 0;
                }
                if score > best_score {
                    best_score = score;
                    if score > alpha {
                        alpha = score;
                    }
                    if alpha >= beta {
                        break;
                    }
                }
            }
            if moves_tried == 0 {
                return mated_in(ply as i32);
            }
            return best_score;
        }

        let prev = self.prev_move(ply);
        let mut picker = MovePicker::new(&self.pos, &self.ordering, ply, tt_move, prev, true);

        while let Some(m) = picker.next(&self.pos, &self.ordering) {
            if !self.pos.see_ge(m, alpha - stand_pat - QSEARCH_DELTA_MARGIN) {
                continue;
            }

            if !self.make_move(m, ply) {
                continue;
            }
            let score = -self.quiescence(-beta, -alpha, ply + 1);
            self.unmake_move();

            if self.should_stop() {
                return 0;
            }

            if score > best_score {
                best_score = score;
                if score > alpha {
                    alpha = score;
                }
                if alpha >= beta {
                    self.tt.store(key, Some(m), Bound::LowerBound, best_score, 0, ply as u32);
                    return best_score;
                }
            }
        }

        best_score
    }
}
