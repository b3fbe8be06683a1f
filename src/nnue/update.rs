//! The deferred accumulator-update descriptor queued by `do_move`.
//!
//! spec.md §9 "lazy accumulator update": the position doesn't touch
//! accumulator memory itself; it records what changed and hands the
//! descriptor to whoever owns the accumulator stack (the search worker).
//! This breaks the aliasing the original engine had between position and
//! evaluator state.

use crate::types::{Color, PieceType, Square};

#[derive(Clone, Copy, Debug)]
pub enum NnueUpdate {
    Null,
    Move {
        color: Color,
        piece: PieceType,
        from: Square,
        to: Square,
    },
    Promotion {
        color: Color,
        from: Square,
        to: Square,
        promo: PieceType,
    },
    Capture {
        color: Color,
        piece: PieceType,
        from: Square,
        to: Square,
        captured: PieceType,
    },
    CapturePromotion {
        color: Color,
        from: Square,
        to: Square,
        promo: PieceType,
        captured: PieceType,
    },
    EnPassant {
        color: Color,
        from: Square,
        to: Square,
        captured_sq: Square,
    },
    /// Castling: the king and its own rook both relocate in one step.
    Castle {
        color: Color,
        king_from: Square,
        king_to: Square,
        rook_from: Square,
        rook_to: Square,
    },
}

impl Default for NnueUpdate {
    fn default() -> Self {
        NnueUpdate::Null
    }
}

impl NnueUpdate {
    /// True when this update moves the king: triggers a bucket/mirror
    /// check in the accumulator stack (spec.md §4.E "Reset trigger").
    /// A king *capture* (`Capture { piece: King, .. }`) moves the king
    /// just as plainly as a quiet king move, so it counts here too.
    #[must_use]
    pub fn moves_king(&self) -> bool {
        matches!(
            self,
            NnueUpdate::Move { piece: PieceType::King, .. }
                | NnueUpdate::Capture { piece: PieceType::King, .. }
                | NnueUpdate::Castle { .. }
        )
    }

    #[must_use]
    pub fn king_color(&self) -> Option<Color> {
        match self {
            NnueUpdate::Move { piece: PieceType::King, color, .. } => Some(*color),
            NnueUpdate::Capture { piece: PieceType::King, color, .. } => Some(*color),
            NnueUpdate::Castle { color, .. } => Some(*color),
            _ => None,
        }
    }

    #[must_use]
    pub fn king_from_to(&self) -> Option<(Square, Square)> {
        match self {
            NnueUpdate::Move { piece: PieceType::King, from, to, .. } => Some((*from, *to)),
            NnueUpdate::Capture { piece: PieceType::King, from, to, .. } => Some((*from, *to)),
            NnueUpdate::Castle { king_from, king_to, .. } => Some((*king_from, *king_to)),
            _ => None,
        }
    }
}
