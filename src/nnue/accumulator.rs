//! The dual-perspective hidden-layer accumulator and full/half refresh.

use crate::board::Position;
use crate::types::{Color, PieceType, ALL_PIECE_TYPES};

use super::network::{feature_index, NnueNetwork, HIDDEN};

#[derive(Clone)]
pub struct Accumulator {
    pub white: [i16; HIDDEN],
    pub black: [i16; HIDDEN],
}

impl Accumulator {
    #[must_use]
    pub fn from_bias(net: &NnueNetwork) -> Self {
        Accumulator { white: net.hidden_bias, black: net.hidden_bias }
    }

    #[must_use]
    pub fn half(&self, view: Color) -> &[i16; HIDDEN] {
        match view {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    pub fn half_mut(&mut self, view: Color) -> &mut [i16; HIDDEN] {
        match view {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    pub fn add(&mut self, net: &NnueNetwork, view: Color, king_sq: crate::types::Square, piece_color: Color, piece: PieceType, sq: crate::types::Square) {
        let idx = feature_index(view, king_sq, piece_color, piece, sq);
        let row = &net.feature_weights[idx];
        let acc = self.half_mut(view);
        for (a, w) in acc.iter_mut().zip(row.iter()) {
            *a += *w;
        }
    }

    pub fn sub(&mut self, net: &NnueNetwork, view: Color, king_sq: crate::types::Square, piece_color: Color, piece: PieceType, sq: crate::types::Square) {
        let idx = feature_index(view, king_sq, piece_color, piece, sq);
        let row = &net.feature_weights[idx];
        let acc = self.half_mut(view);
        for (a, w) in acc.iter_mut().zip(row.iter()) {
            *a -= *w;
        }
    }

    /// Rebuilds one perspective from scratch against `pos` (spec.md §4.E
    /// `half_refresh`).
    pub fn half_refresh(&mut self, net: &NnueNetwork, pos: &Position, view: Color) {
        let king_sq = pos.king_square(view);
        *self.half_mut(view) = net.hidden_bias;
        for color in [Color::White, Color::Black] {
            for piece in ALL_PIECE_TYPES {
                let mut bb = pos.pieces(color, piece);
                while let Some(sq) = bb.pop_lsb() {
                    self.add(net, view, king_sq, color, piece, sq);
                }
            }
        }
    }

    /// Rebuilds both perspectives from scratch (spec.md §4.E `full_refresh`).
    pub fn full_refresh(&mut self, net: &NnueNetwork, pos: &Position) {
        self.half_refresh(net, pos, Color::White);
        self.half_refresh(net, pos, Color::Black);
    }
}
