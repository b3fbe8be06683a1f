//! Move application (spec.md §4.C "Make-move").
//!
//! `do_move` uses the copy-make strategy the design notes call out
//! ("do_move/undo-by-copy"): it snapshots the position, applies the move
//! in place, and restores the snapshot if the mover's own king ends up
//! attacked. Search backtracking works the same way one level up — the
//! caller clones before descending and simply drops the clone to undo.

use crate::moves::{Move, FLAG_CASTLE_KINGSIDE};
use crate::nnue::update::NnueUpdate;
use crate::types::{Bitboard, Color, PieceType, Square};

use super::Position;

impl Position {
    /// Applies `m`. Returns `false` iff it leaves the mover's own king in
    /// check, in which case the position is left exactly as it was.
    pub fn do_move(&mut self, m: Move) -> bool {
        if m.is_null() {
            self.apply_move(m);
            return true;
        }
        let mover = self.side_to_move;
        let before = self.clone();
        self.apply_move(m);
        if self.is_in_check(mover) {
            *self = before;
            return false;
        }
        true
    }

    fn apply_move(&mut self, m: Move) {
        if m.is_null() {
            self.set_en_passant(Bitboard::default());
            self.halfmove_clock += 1;
            self.ply += 1;
            self.flip_side_to_move();
            self.pending_update = NnueUpdate::Null;
            return;
        }

        let color = self.side_to_move;
        let opp = color.opposite();
        let from = m.from();
        let to = m.to();
        let piece = m.piece();

        self.set_en_passant(Bitboard::default());

        let mut halfmove_reset = piece == PieceType::Pawn;

        self.pending_update = if m.is_castle() {
            self.apply_castle(color, m)
        } else if m.is_en_passant() {
            halfmove_reset = true;
            self.apply_en_passant(color, from, to)
        } else if let Some(promo) = m.promotion() {
            halfmove_reset = true;
            self.apply_promotion(color, opp, from, to, promo, m.captured())
        } else if let Some(captured) = m.captured() {
            halfmove_reset = true;
            self.apply_capture(color, opp, piece, from, to, captured)
        } else {
            self.apply_quiet(color, piece, from, to)
        };

        if m.is_double_pawn_push() {
            let ep_index = (from.index() + to.index()) / 2;
            self.set_en_passant(Bitboard::from_square(Square::new(ep_index as u8)));
        }

        if halfmove_reset {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }
        self.ply += 1;
        self.flip_side_to_move();
        self.repetitions.increment(self.z_key);
    }

    fn apply_quiet(&mut self, color: Color, piece: PieceType, from: Square, to: Square) -> NnueUpdate {
        self.remove_piece(color, piece, from);
        self.add_piece(color, piece, to);
        self.update_castling_rights_on_move_from(color, piece, from);
        NnueUpdate::Move { color, piece, from, to }
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_capture(
        &mut self,
        color: Color,
        opp: Color,
        piece: PieceType,
        from: Square,
        to: Square,
        captured: PieceType,
    ) -> NnueUpdate {
        self.clear_castling_right(to);
        self.remove_piece(opp, captured, to);
        self.remove_piece(color, piece, from);
        self.add_piece(color, piece, to);
        self.update_castling_rights_on_move_from(color, piece, from);
        NnueUpdate::Capture { color, piece, from, to, captured }
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_promotion(
        &mut self,
        color: Color,
        opp: Color,
        from: Square,
        to: Square,
        promo: PieceType,
        captured: Option<PieceType>,
    ) -> NnueUpdate {
        if let Some(cap) = captured {
            self.clear_castling_right(to);
            self.remove_piece(opp, cap, to);
        }
        self.remove_piece(color, PieceType::Pawn, from);
        self.add_piece(color, promo, to);
        match captured {
            Some(cap) => NnueUpdate::CapturePromotion { color, from, to, promo, captured: cap },
            None => NnueUpdate::Promotion { color, from, to, promo },
        }
    }

    fn apply_en_passant(&mut self, color: Color, from: Square, to: Square) -> NnueUpdate {
        let captured_sq = Square::from_rank_file(from.rank(), to.file());
        self.remove_piece(color.opposite(), PieceType::Pawn, captured_sq);
        self.remove_piece(color, PieceType::Pawn, from);
        self.add_piece(color, PieceType::Pawn, to);
        NnueUpdate::EnPassant { color, from, to, captured_sq }
    }

    fn apply_castle(&mut self, color: Color, m: Move) -> NnueUpdate {
        let king_from = m.from();
        let rook_from = m.to();
        let rank = king_from.rank();
        let (king_file, rook_file) = if m.has_flag(FLAG_CASTLE_KINGSIDE) { (6, 5) } else { (2, 3) };
        let king_to = Square::from_rank_file(rank, king_file);
        let rook_to = Square::from_rank_file(rank, rook_file);

        self.remove_piece(color, PieceType::King, king_from);
        self.remove_piece(color, PieceType::Rook, rook_from);
        self.add_piece(color, PieceType::King, king_to);
        self.add_piece(color, PieceType::Rook, rook_to);

        let rights: Vec<Square> = self.castling_rights.rook_squares(color).into_iter().collect();
        for sq in rights {
            self.clear_castling_right(sq);
        }

        NnueUpdate::Castle { color, king_from, king_to, rook_from, rook_to }
    }

    fn update_castling_rights_on_move_from(&mut self, color: Color, piece: PieceType, from: Square) {
        if piece == PieceType::King {
            let rights: Vec<Square> = self.castling_rights.rook_squares(color).into_iter().collect();
            for sq in rights {
                self.clear_castling_right(sq);
            }
        } else if piece == PieceType::Rook {
            self.clear_castling_right(from);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::{FLAG_CAPTURE, FLAG_DOUBLE_PAWN_PUSH, FLAG_EN_PASSANT, FLAG_PROMOTION};

    #[test]
    fn double_pawn_push_sets_en_passant_target() {
        let mut pos = Position::startpos();
        let m = Move::new(Square::new(12), Square::new(28), PieceType::Pawn, None, None, FLAG_DOUBLE_PAWN_PUSH);
        assert!(pos.do_move(m));
        assert_eq!(pos.en_passant_target(), Bitboard::from_square(Square::new(20)));
        assert_eq!(pos.halfmove_clock(), 0);
    }

    #[test]
    fn en_passant_capture_removes_captured_pawn() {
        let mut pos = Position::new_from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1", false).unwrap();
        let m = Move::new(Square::new(36), Square::new(43), PieceType::Pawn, Some(PieceType::Pawn), None, FLAG_CAPTURE | FLAG_EN_PASSANT);
        assert!(pos.do_move(m));
        assert!(pos.piece_at(Square::new(35)).is_none());
        assert_eq!(pos.piece_at(Square::new(43)), Some((Color::White, PieceType::Pawn)));
    }

    #[test]
    fn illegal_move_leaving_king_in_check_is_rejected() {
        let mut pos = Position::new_from_fen("4k3/8/8/8/8/8/4r3/4K3 w - - 0 1", false).unwrap();
        let before = pos.to_fen();
        let m = Move::new(Square::new(3), Square::new(11), PieceType::King, None, None, 0);
        assert!(!pos.do_move(m));
        assert_eq!(pos.to_fen(), before);
    }

    #[test]
    fn rook_move_clears_its_castling_right() {
        let mut pos = Position::new_from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", false).unwrap();
        let m = Move::new(Square::new(0), Square::new(8), PieceType::Rook, None, None, 0);
        assert!(pos.do_move(m));
        assert_eq!(pos.to_fen().split(' ').nth(2).unwrap(), "Kkq");
    }

    #[test]
    fn promotion_replaces_pawn() {
        let mut pos = Position::new_from_fen("8/4P3/8/8/8/8/4k3/4K3 w - - 0 1", false).unwrap();
        let m = Move::new(Square::new(52), Square::new(60), PieceType::Pawn, None, Some(PieceType::Queen), FLAG_PROMOTION);
        assert!(pos.do_move(m));
        assert_eq!(pos.piece_at(Square::new(60)), Some((Color::White, PieceType::Queen)));
    }
}
