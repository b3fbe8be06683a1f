//! Search-owned accumulator stack (spec.md §4.E, §9).
//!
//! `Position` never touches accumulator memory; it only queues an
//! [`NnueUpdate`] on `do_move`. This stack is what actually consumes
//! that descriptor, one entry per ply, so a search backtrack is just a
//! `pop` rather than a second pass over the move.

use std::sync::Arc;

use crate::board::Position;
use crate::types::{Bitboard, Color, PieceType, Square, ALL_PIECE_TYPES};

use super::accumulator::Accumulator;
use super::finny::FinnyCache;
use super::network::NnueNetwork;
use super::update::NnueUpdate;

pub struct AccumulatorStack {
    network: Arc<NnueNetwork>,
    stack: Vec<Accumulator>,
    finny: [FinnyCache; 2],
}

impl AccumulatorStack {
    #[must_use]
    pub fn new(network: Arc<NnueNetwork>, pos: &Position) -> Self {
        let mut acc = Accumulator::from_bias(&network);
        acc.full_refresh(&network, pos);
        AccumulatorStack { network, stack: vec![acc], finny: [FinnyCache::new(), FinnyCache::new()] }
    }

    fn top(&self) -> &Accumulator {
        self.stack.last().expect("accumulator stack is never empty")
    }

    /// Applies `update` on top of the current accumulator and pushes the
    /// result, given the position *after* the move that produced it.
    pub fn push(&mut self, pos_after: &Position, update: NnueUpdate) {
        let mut next = self.top().clone();
        for view in [Color::White, Color::Black] {
            self.apply_for_view(&mut next, pos_after, view, update);
        }
        self.stack.push(next);
    }

    /// Undoes the most recent `push`, mirroring the search's clone-based
    /// backtracking in [`Position::do_move`](crate::board::Position::do_move).
    pub fn pop(&mut self) {
        debug_assert!(self.stack.len() > 1, "cannot pop the root accumulator");
        self.stack.pop();
    }

    /// Evaluates the current top of stack from `stm`'s perspective.
    #[must_use]
    pub fn evaluate(&self, stm: Color) -> i32 {
        let acc = self.top();
        match stm {
            Color::White => self.network.evaluate(&acc.white, &acc.black),
            Color::Black => self.network.evaluate(&acc.black, &acc.white),
        }
    }

    fn apply_for_view(&mut self, acc: &mut Accumulator, pos_after: &Position, view: Color, update: NnueUpdate) {
        if matches!(update, NnueUpdate::Null) {
            return;
        }
        if update.king_color() == Some(view) {
            let (_, king_to) = update.king_from_to().expect("king_color implies king_from_to");
            let pieces = piece_bitboards(pos_after);
            let half = self.finny[view.index()].half_accumulator(&self.network, view, king_to, &pieces);
            *acc.half_mut(view) = half;
            return;
        }
        let king_sq = pos_after.king_square(view);
        apply_regular(acc, &self.network, view, king_sq, update);
    }
}

fn piece_bitboards(pos: &Position) -> [[Bitboard; 6]; 2] {
    let mut out = [[Bitboard::default(); 6]; 2];
    for color in [Color::White, Color::Black] {
        for piece in ALL_PIECE_TYPES {
            out[color.index()][piece.index()] = pos.pieces(color, piece);
        }
    }
    out
}

fn apply_regular(acc: &mut Accumulator, net: &NnueNetwork, view: Color, king_sq: Square, update: NnueUpdate) {
    match update {
        NnueUpdate::Null => {}
        NnueUpdate::Move { color, piece, from, to } => {
            acc.sub(net, view, king_sq, color, piece, from);
            acc.add(net, view, king_sq, color, piece, to);
        }
        NnueUpdate::Capture { color, piece, from, to, captured } => {
            acc.sub(net, view, king_sq, color.opposite(), captured, to);
            acc.sub(net, view, king_sq, color, piece, from);
            acc.add(net, view, king_sq, color, piece, to);
        }
        NnueUpdate::Promotion { color, from, to, promo } => {
            acc.sub(net, view, king_sq, color, PieceType::Pawn, from);
            acc.add(net, view, king_sq, color, promo, to);
        }
        NnueUpdate::CapturePromotion { color, from, to, promo, captured } => {
            acc.sub(net, view, king_sq, color.opposite(), captured, to);
            acc.sub(net, view, king_sq, color, PieceType::Pawn, from);
            acc.add(net, view, king_sq, color, promo, to);
        }
        NnueUpdate::EnPassant { color, from, to, captured_sq } => {
            acc.sub(net, view, king_sq, color.opposite(), PieceType::Pawn, captured_sq);
            acc.sub(net, view, king_sq, color, PieceType::Pawn, from);
            acc.add(net, view, king_sq, color, PieceType::Pawn, to);
        }
        NnueUpdate::Castle { color, king_from, king_to, rook_from, rook_to } => {
            acc.sub(net, view, king_sq, color, PieceType::King, king_from);
            acc.add(net, view, king_sq, color, PieceType::King, king_to);
            acc.sub(net, view, king_sq, color, PieceType::Rook, rook_from);
            acc.add(net, view, king_sq, color, PieceType::Rook, rook_to);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::{Move, FLAG_DOUBLE_PAWN_PUSH};

    #[test]
    fn push_then_pop_restores_the_previous_accumulator() {
        let net = Arc::new(NnueNetwork::zeroed());
        let pos = Position::startpos();
        let mut stack = AccumulatorStack::new(net, &pos);
        let before = stack.top().white;

        let mut next = pos.clone();
        let m = Move::new(Square::new(12), Square::new(28), PieceType::Pawn, None, None, FLAG_DOUBLE_PAWN_PUSH);
        assert!(next.do_move(m));
        stack.push(&next, next.pending_update());
        stack.pop();

        assert_eq!(stack.top().white, before);
    }

    #[test]
    fn evaluate_on_zero_network_is_always_zero() {
        let net = Arc::new(NnueNetwork::zeroed());
        let pos = Position::startpos();
        let stack = AccumulatorStack::new(net, &pos);
        assert_eq!(stack.evaluate(Color::White), 0);
    }

    /// spec.md P5: incremental `evaluate` must equal `full_refresh` on the
    /// same position, including across a king move that changes its
    /// bucket/mirror — here via a king *capture* (`Kd1xe2`), which used to
    /// be misrouted through `apply_regular` instead of the finny
    /// half-refresh because `NnueUpdate::king_color` didn't recognize
    /// `Capture { piece: King, .. }` as a king move.
    #[test]
    fn king_capture_matches_a_full_refresh_even_across_a_bucket_change() {
        let net = Arc::new(NnueNetwork::from_bytes(&random_weights()).unwrap());
        let before = Position::new_from_fen("4k3/8/8/8/8/8/4n3/3K4 w - - 0 1", false).unwrap();
        let mut stack = AccumulatorStack::new(Arc::clone(&net), &before);

        let mut after = before.clone();
        let m = Move::new(Square::new(3), Square::new(12), PieceType::King, Some(PieceType::Knight), None, crate::moves::FLAG_CAPTURE);
        assert!(after.do_move(m));
        stack.push(&after, after.pending_update());

        let incremental = stack.evaluate(Color::White);
        let fresh = AccumulatorStack::new(net, &after).evaluate(Color::White);
        assert_eq!(incremental, fresh);
    }

    /// Deterministic non-zero weights so the regression above can't pass
    /// vacuously the way an all-zero network would.
    fn random_weights() -> Vec<u8> {
        use super::super::network::{HIDDEN, INPUT_SIZE};
        let mut bytes = Vec::new();
        let mut x: u32 = 0x1234_5678;
        let mut next = || {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            x
        };
        for _ in 0..(INPUT_SIZE * HIDDEN + HIDDEN + HIDDEN + HIDDEN) {
            bytes.extend_from_slice(&(next() as i16).to_le_bytes());
        }
        bytes.extend_from_slice(&0i32.to_le_bytes());
        bytes
    }
}
