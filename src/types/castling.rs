//! Castling-rights representation (FRC-capable).
//!
//! spec.md §3: `castling_rights` is a bitboard over rank-1/rank-8 squares
//! naming the *rook* squares that still grant castling. Kingside/queenside
//! is not baked into the bit position (Chess960 rook files vary); callers
//! compare a set rook's file against the king's file to classify it.

use super::{Bitboard, Color};

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct CastlingRights(pub Bitboard);

impl CastlingRights {
    #[must_use]
    pub const fn empty() -> Self {
        CastlingRights(Bitboard(0))
    }

    #[must_use]
    pub fn rook_squares(self, color: Color) -> Bitboard {
        let rank_mask = if color == Color::White {
            super::bitboard::RANK_1
        } else {
            super::bitboard::RANK_8
        };
        self.0 & rank_mask
    }

    pub fn clear_square(&mut self, sq: super::Square) {
        self.0.clear(sq);
    }

    pub fn set_square(&mut self, sq: super::Square) {
        self.0.set(sq);
    }

    #[must_use]
    pub fn has_any(self, color: Color) -> bool {
        !self.rook_squares(color).is_empty()
    }
}
