//! The negamax/PVS core (spec.md §4.J "Negamax(depth, α, β)").

use crate::moves::Move;
use crate::ordering::{self, cutoff_bonus, non_cutoff_penalty, HISTORY_MAX};
use crate::picker::MovePicker;
use crate::tt::Bound;
use crate::types::PieceType;

use super::constants::*;
use super::SearchWorker;

impl SearchWorker {
    /// `pv_node` iff `alpha != beta - 1` (spec.md GLOSSARY).
    #[allow(clippy::too_many_lines)]
    pub fn negamax(&mut self, mut depth: i32, mut alpha: i32, beta: i32, ply: usize, cut_node: bool, excluded: Option<Move>) -> i32 {
        let pv_node = beta - alpha > 1;
        self.count_node();
        self.ordering.preclear_killers_ahead(ply);
        self.seldepth = self.seldepth.max(ply as u32);

        if ply > 0 && self.is_draw() {
            return self.draw_score();
        }

        let in_check = self.pos.is_in_check(self.pos.side_to_move());
        if depth <= 0 && !in_check {
            return self.quiescence(alpha, beta, ply);
        }
        depth = depth.max(1);

        if ply >= MAX_PLY {
            return self.static_eval();
        }

        // Mate-distance pruning: no line through this node can beat a
        // shorter forced mate already proven above it.
        let mate_alpha = mated_in(ply as i32).max(alpha);
        let mate_beta = mate_in(ply as i32 + 1).min(beta);
        if mate_alpha >= mate_beta {
            return mate_alpha;
        }

        let key = self.pos.z_key();
        self.tt.prefetch(key);
        let tt_entry = if excluded.is_none() { self.tt.get(key, ply as u32) } else { None };
        let tt_move = tt_entry.and_then(|e| e.best_move).filter(|&m| self.pos.move_is_pseudo_legal(m));

        if let Some(entry) = tt_entry {
            if !pv_node && entry.depth as i32 >= depth {
                let usable = match entry.bound {
                    Bound::Exact => true,
                    Bound::LowerBound => entry.score >= beta,
                    Bound::UpperBound => entry.score <= alpha,
                };
                if usable {
                    if entry.bound != Bound::UpperBound {
                        if let Some(m) = tt_move {
                            if m.is_quiet() {
                                self.apply_cutoff_bonus(m, ply, depth);
                            }
                        }
                    }
                    return entry.score;
                }
            }
        }

        let eval = if in_check {
            -MATE_SCORE
        } else {
            self.static_eval()
        };
        self.stack[ply].static_eval = eval;
        let improving = !in_check && ply >= 2 && eval > self.stack[ply - 2].static_eval;

        if !pv_node && !in_check && excluded.is_none() {
            if depth <= RFP_MAX_DEPTH && eval - RFP_MARGIN_PER_DEPTH * depth + RFP_IMPROVING_BONUS * i32::from(improving) >= beta {
                return beta;
            }

            let prev_was_null = ply > 0 && self.stack[ply - 1].played.is_null();
            if !prev_was_null
                && self.has_non_pawn_material()
                && eval >= beta + (NMP_MARGIN_BASE - NMP_MARGIN_PER_DEPTH * depth).max(0)
            {
                let r = NMP_BASE + depth / 4 + ((eval - beta) / 128).min(5);
                self.make_move(Move::NULL, ply);
                self.stack[ply].behind_before_null = true;
                let score = -self.negamax((depth - 1 - r).max(0), -beta, -beta + 1, ply + 1, !cut_node, None);
                self.unmake_move();
                if self.should_stop() {
                    return 0;
                }
                if score >= beta {
                    return beta;
                }
            }

            if depth >= PROBCUT_MIN_DEPTH && alpha < mate_in(MAX_PLY as i32) {
                if let Some(score) = self.try_probcut(depth, beta, improving, ply) {
                    return score;
                }
            }
        }

        if depth >= IIR_MIN_DEPTH && tt_entry.is_none() && !(ply > 0 && self.stack[ply - 1].played.is_null()) {
            depth -= 1;
        }

        let alpha_orig = alpha;
        let prev = self.prev_move(ply);
        let mut picker = MovePicker::new(&self.pos, &self.ordering, ply, tt_move, prev, false);

        let mut best_score = -MATE_SCORE - 1;
        let mut best_move = None;
        let mut moves_tried = 0i32;
        let mut quiets_tried: Vec<Move> = Vec::new();
        let mut captures_tried: Vec<Move> = Vec::new();
        let endgame = self.pos.phase() >= 16;

        while let Some(m) = picker.next(&self.pos, &self.ordering) {
            if Some(m) == excluded {
                continue;
            }

            let is_quiet = m.is_quiet();
            let hist = if is_quiet {
                self.ordering.history(self.pos.side_to_move(), m.from(), m.to())
            } else {
                0
            };

            if !pv_node && !in_check && best_score > -MATE_SCORE + MAX_PLY as i32 {
                if is_quiet && moves_tried >= lmp_quiet_limit(depth, improving, pv_node) && hist <= 0 {
                    break;
                }
                if is_quiet && depth <= LMP_QUIET_SEE_MAX_DEPTH && !self.pos.see_ge(m, -LMP_QUIET_SEE_SLOPE * depth + LMP_QUIET_SEE_BASE) {
                    continue;
                }
                if !is_quiet
                    && depth <= LMP_CAPTURE_SEE_MAX_DEPTH
                    && !self.pos.see_ge(m, -LMP_CAPTURE_SEE_SLOPE * depth + LMP_CAPTURE_SEE_BASE)
                {
                    continue;
                }
                if is_quiet && depth <= CMH_PRUNE_MAX_DEPTH {
                    let cmh = self.counter_move_history_for(m, ply);
                    if cmh <= -CMH_PRUNE_SLOPE * depth + CMH_PRUNE_BASE {
                        continue;
                    }
                }
            }

            let mut extension = 0;
            if Some(m) == tt_move && excluded.is_none() {
                if let Some(entry) = tt_entry {
                    if entry.bound != Bound::UpperBound
                        && entry.depth as i32 >= depth - SINGULAR_MIN_TT_DEPTH_DEFICIT
                        && entry.score.abs() < WON_IN_X / 4
                    {
                        extension = self.singular_extension(m, entry.score, depth, ply, cut_node);
                    }
                }
            }
            if extension == 0 && depth <= EXTENSION_MAX_DEPTH {
                if endgame && !is_quiet {
                    extension = 1;
                } else if is_quiet && self.is_passed_pawn_push(m) {
                    extension = 1;
                }
            }

            if !self.make_move(m, ply) {
                continue;
            }
            moves_tried += 1;
            if is_quiet {
                quiets_tried.push(m);
            } else {
                captures_tried.push(m);
            }

            let gives_check = self.pos.is_in_check(self.pos.side_to_move());
            let child_depth = depth - 1 + extension;
            let mut score;

            if moves_tried == 1 {
                score = -self.negamax(child_depth, -beta, -alpha, ply + 1, false, None);
            } else {
                let mut r = if is_quiet { self.lmr_reduction(depth, moves_tried, m, in_check, gives_check, improving, cut_node, ply, tt_move, hist) } else { 0 };
                r = r.clamp(if is_quiet { -2 } else { 0 }, child_depth.max(0));
                let reduced = (child_depth - r).max(0);
                score = -self.negamax(reduced, -alpha - 1, -alpha, ply + 1, true, None);
                if score > alpha && r > 0 {
                    score = -self.negamax(child_depth, -alpha - 1, -alpha, ply + 1, !cut_node, None);
                }
                if pv_node && score > alpha {
                    score = -self.negamax(child_depth, -beta, -alpha, ply + 1, false, None);
                }
            }

            self.unmake_move();

            if self.should_stop() {
                return 0;
            }

            if score > best_score {
                best_score = score;
                best_move = Some(m);
                if score > alpha {
                    alpha = score;
                    let child_pv = self.stack[ply + 1].pv.clone();
                    let mut pv = vec![m];
                    pv.extend(child_pv);
                    self.stack[ply].pv = pv;
                }
                if alpha >= beta {
                    if is_quiet {
                        self.on_beta_cutoff(m, ply, depth, &quiets_tried);
                    } else {
                        self.update_capture_history(m, cutoff_bonus(depth));
                    }
                    break;
                }
            }
        }

        if moves_tried == 0 {
            return if excluded.is_some() {
                alpha
            } else if in_check {
                mated_in(ply as i32)
            } else {
                self.draw_score()
            };
        }

        self.penalize_unsuccessful(&quiets_tried, &captures_tried, best_move, depth);

        if excluded.is_none() {
            let bound = if best_score >= beta {
                Bound::LowerBound
            } else if best_score > alpha_orig {
                Bound::Exact
            } else {
                Bound::UpperBound
            };
            self.tt.store(key, best_move, bound, best_score, depth as u32, ply as u32);
        }

        best_score
    }

    fn has_non_pawn_material(&self) -> bool {
        let color = self.pos.side_to_move();
        let pawns_and_king = self.pos.pieces(color, PieceType::Pawn) | self.pos.pieces(color, PieceType::King);
        self.pos.occupied_by(color) != pawns_and_king
    }

    fn counter_move_history_for(&self, m: Move, ply: usize) -> i32 {
        let prev = self.prev_move(ply);
        match (prev.piece, prev.to) {
            (Some(p), Some(t)) => {
                let idx = ordering::prev_index(p, t);
                self.ordering.counter_move_history(self.pos.side_to_move(), idx, m.piece(), m.to())
            }
            _ => 0,
        }
    }

    fn is_passed_pawn_push(&self, m: Move) -> bool {
        if m.piece() != PieceType::Pawn {
            return false;
        }
        let color = self.pos.side_to_move();
        let to = m.to();
        let file = to.file();
        let enemy_pawns = self.pos.pieces(color.opposite(), PieceType::Pawn);
        for f in file.saturating_sub(1)..=(file + 1).min(7) {
            let mut bb = enemy_pawns;
            while let Some(sq) = bb.pop_lsb() {
                if sq.file() == f {
                    let blocks = if color == crate::types::Color::White { sq.rank() > to.rank() } else { sq.rank() < to.rank() };
                    if blocks {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn try_probcut(&mut self, depth: i32, beta: i32, improving: bool, ply: usize) -> Option<i32> {
        let pc_beta = beta + PROBCUT_MARGIN - PROBCUT_IMPROVING_PENALTY * i32::from(improving);
        let prev = self.prev_move(ply);
        let mut picker = MovePicker::new(&self.pos, &self.ordering, ply, None, prev, true);
        while let Some(m) = picker.next(&self.pos, &self.ordering) {
            if !self.pos.see_ge(m, pc_beta - self.stack[ply].static_eval) {
                continue;
            }
            if !self.make_move(m, ply) {
                continue;
            }
            let qscore = -self.quiescence(-pc_beta, -pc_beta + 1, ply + 1);
            let score = if qscore >= pc_beta {
                -self.negamax(depth - PROBCUT_DEPTH_REDUCTION, -pc_beta, -pc_beta + 1, ply + 1, true, None)
            } else {
                qscore
            };
            self.unmake_move();
            if self.should_stop() {
                return None;
            }
            if score >= pc_beta {
                return Some(beta);
            }
        }
        None
    }

    /// Verification search excluding the TT move; returns the extension
    /// (0, 1, or 2) to apply to it (spec.md §4.J "Singular extension").
    fn singular_extension(&mut self, tt_move: Move, tt_score: i32, depth: i32, ply: usize, cut_node: bool) -> i32 {
        if depth <= SINGULAR_DEEP_THRESHOLD {
            return if self.stack[ply].static_eval < tt_score - depth { 1 } else { 0 };
        }
        let singular_beta = tt_score - depth;
        let singular_depth = depth / 2;
        let score = self.negamax(singular_depth, singular_beta - 1, singular_beta, ply, cut_node, Some(tt_move));
        if self.interrupted {
            return 0;
        }
        if score < singular_beta {
            if !cut_node && score < singular_beta - 16 {
                2
            } else {
                1
            }
        } else if singular_beta >= self.stack[ply].static_eval.max(singular_beta) && score >= singular_beta {
            if cut_node {
                -1
            } else {
                0
            }
        } else {
            0
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn lmr_reduction(&self, depth: i32, move_index: i32, m: Move, in_check: bool, gives_check: bool, improving: bool, cut_node: bool, ply: usize, tt_move: Option<Move>, hist: i32) -> i32 {
        let mut r = lmr_base_reduction(depth, move_index);
        r += 1; // quiet move
        if in_check {
            r += 1;
        }
        if tt_move.is_some_and(Move::is_capture) {
            r += 1;
        }
        if ply > 0 && self.stack[ply - 1].behind_before_null {
            r += 1;
        }
        if cut_node {
            r += 1;
        }
        if ply > 0 {
            let prev_hist = self.ordering.history(self.pos.side_to_move().opposite(), self.stack[ply - 1].played.from(), self.stack[ply - 1].played.to());
            if prev_hist < -HISTORY_MAX / 2 {
                r -= 1;
            }
        }
        if improving {
            r -= 1;
        }
        if gives_check {
            r -= 1;
        }
        r -= hist / (HISTORY_MAX / 2).max(1);
        let cmh = self.counter_move_history_for(m, ply);
        r -= cmh / (HISTORY_MAX / 2).max(1);
        if m.promotion() == Some(PieceType::Queen) {
            r -= 1;
        }
        let killers = self.ordering.killers(ply);
        let prev = self.prev_move(ply);
        let counter = prev.piece.zip(prev.to).and_then(|(p, t)| self.ordering.counter_move(self.pos.side_to_move(), p, t));
        if killers[0] == Some(m) || killers[1] == Some(m) || counter == Some(m) {
            r -= 2;
        }
        r
    }

    fn apply_cutoff_bonus(&mut self, m: Move, ply: usize, depth: i32) {
        self.ordering.record_killer(ply, m);
        self.ordering.update_history(self.pos.side_to_move(), m.from(), m.to(), cutoff_bonus(depth));
    }

    fn update_capture_history(&mut self, m: Move, bonus: i32) {
        if let Some(captured) = m.captured() {
            self.ordering.update_capture_history(m.piece(), captured, m.to(), bonus);
        }
    }

    fn on_beta_cutoff(&mut self, m: Move, ply: usize, depth: i32, quiets_tried: &[Move]) {
        let color = self.pos.side_to_move();
        let bonus = cutoff_bonus(depth);
        self.ordering.record_killer(ply, m);
        self.ordering.update_history(color, m.from(), m.to(), bonus);

        let prev = self.prev_move(ply);
        if let (Some(p), Some(t)) = (prev.piece, prev.to) {
            self.ordering.record_counter_move(color, p, t, m);
            let idx = ordering::prev_index(p, t);
            let was_counter_special = self.ordering.counter_move(color, p, t) == Some(m);
            let cmh_bonus = if was_counter_special { bonus * 4 } else { bonus };
            self.ordering.update_counter_move_history(color, idx, m.piece(), m.to(), cmh_bonus);
        }

        for &q in quiets_tried {
            if q != m {
                self.ordering.update_history(color, q.from(), q.to(), non_cutoff_penalty(depth));
            }
        }
    }

    fn penalize_unsuccessful(&mut self, quiets_tried: &[Move], captures_tried: &[Move], best_move: Option<Move>, depth: i32) {
        let color = self.pos.side_to_move();
        let penalty = non_cutoff_penalty(depth);
        for &q in quiets_tried {
            if Some(q) != best_move {
                self.ordering.update_history(color, q.from(), q.to(), penalty);
            }
        }
        for &c in captures_tried {
            if Some(c) != best_move {
                if let Some(captured) = c.captured() {
                    self.ordering.update_capture_history(c.piece(), captured, c.to(), penalty);
                }
            }
        }
    }
}
