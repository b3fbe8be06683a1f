//! Pseudo-legality validation for an already-encoded [`Move`], used to
//! vet transposition-table hint moves without regenerating the move list
//! (spec.md §4.C `move_is_pseudo_legal`).

use crate::moves::{Move, FLAG_CASTLE_KINGSIDE, FLAG_CASTLE_QUEENSIDE, FLAG_DOUBLE_PAWN_PUSH, FLAG_EN_PASSANT};
use crate::types::{Bitboard, Color, PieceType, Square};

use super::Position;

impl Position {
    #[must_use]
    pub fn move_is_pseudo_legal(&self, m: Move) -> bool {
        if m.is_null() {
            return false;
        }
        let from = m.from();
        let to = m.to();
        let Some((color, piece)) = self.piece_at(from) else { return false };
        if color != self.side_to_move || piece != m.piece() {
            return false;
        }

        if m.is_capture() && !m.is_en_passant() {
            match self.piece_at(to) {
                Some((cap_color, cap_piece)) if cap_color != color && Some(cap_piece) == m.captured() => {}
                _ => return false,
            }
        } else if !m.is_capture() && self.piece_at(to).is_some() && !m.is_castle() {
            return false;
        }

        if m.is_promotion() {
            let Some(promo) = m.promotion() else { return false };
            if matches!(promo, PieceType::Pawn | PieceType::King) || piece != PieceType::Pawn {
                return false;
            }
        }

        if m.is_castle() {
            return self.castle_is_pseudo_legal(color, m);
        }

        match piece {
            PieceType::Pawn => self.pawn_move_is_pseudo_legal(color, m),
            _ => self.attacks_from(piece, color, from).contains(to),
        }
    }

    fn pawn_move_is_pseudo_legal(&self, color: Color, m: Move) -> bool {
        let from = m.from();
        let to = m.to();
        let forward: i32 = if color == Color::White { 8 } else { -8 };
        let single = from.index() as i32 + forward;
        if m.is_en_passant() {
            return m.is_capture()
                && Bitboard::from_square(to) == self.en_passant_target
                && (self.attacks_from(PieceType::Pawn, color, from).contains(to));
        }
        if m.is_capture() {
            return self.attacks_from(PieceType::Pawn, color, from).contains(to);
        }
        if m.has_flag(FLAG_DOUBLE_PAWN_PUSH) {
            let start_rank = if color == Color::White { 1 } else { 6 };
            if from.rank() != start_rank {
                return false;
            }
            let double = single + forward;
            if to.index() as i32 != double {
                return false;
            }
            let mid = Square::new(single as u8);
            return self.piece_at(mid).is_none() && self.piece_at(to).is_none();
        }
        to.index() as i32 == single && self.piece_at(to).is_none()
    }

    fn castle_is_pseudo_legal(&self, color: Color, m: Move) -> bool {
        let kingside = m.has_flag(FLAG_CASTLE_KINGSIDE);
        let queenside = m.has_flag(FLAG_CASTLE_QUEENSIDE);
        if kingside == queenside {
            return false;
        }
        let rook_from = m.to();
        if !self.castling_rights.0.contains(rook_from) {
            return false;
        }
        if self.piece_at(rook_from) != Some((color, PieceType::Rook)) {
            return false;
        }
        let king_from = m.from();
        let rank = king_from.rank();
        let (king_dest_file, rook_dest_file) = if kingside { (6, 5) } else { (2, 3) };
        let king_to = Square::from_rank_file(rank, king_dest_file);
        let rook_to = Square::from_rank_file(rank, rook_dest_file);

        if self.is_square_attacked(color.opposite(), king_from) {
            return false;
        }

        let mut transit = squares_between(king_from, king_to);
        transit |= squares_between(rook_from, rook_to);
        transit |= Bitboard::from_square(king_to);
        transit |= Bitboard::from_square(rook_to);
        transit.clear(king_from);
        transit.clear(rook_from);

        let occ_without_movers = {
            let mut occ = self.all_occupied;
            occ.clear(king_from);
            occ.clear(rook_from);
            occ
        };
        if !(transit & occ_without_movers).is_empty() {
            return false;
        }

        let mut sq = king_from;
        loop {
            if self.is_square_attacked(color.opposite(), sq) {
                return false;
            }
            if sq == king_to {
                break;
            }
            sq = step_toward(sq, king_to);
        }
        true
    }
}

fn step_toward(from: Square, to: Square) -> Square {
    let delta = (to.file() as i8 - from.file() as i8).signum();
    Square::from_rank_file(from.rank(), (from.file() as i8 + delta) as u8)
}

fn squares_between(a: Square, b: Square) -> Bitboard {
    let mut bb = Bitboard::default();
    if a.rank() != b.rank() {
        return bb;
    }
    let (lo, hi) = if a.file() < b.file() { (a.file(), b.file()) } else { (b.file(), a.file()) };
    for file in lo..=hi {
        bb.set(Square::from_rank_file(a.rank(), file));
    }
    bb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::FLAG_CAPTURE;

    #[test]
    fn tt_move_referencing_empty_from_square_is_rejected() {
        let pos = Position::startpos();
        let bogus = Move::new(Square::new(20), Square::new(28), PieceType::Pawn, None, None, 0);
        assert!(!pos.move_is_pseudo_legal(bogus));
    }

    #[test]
    fn quiet_pawn_push_is_accepted() {
        let pos = Position::startpos();
        let m = Move::new(Square::new(12), Square::new(20), PieceType::Pawn, None, None, 0);
        assert!(pos.move_is_pseudo_legal(m));
    }

    #[test]
    fn capture_without_matching_target_is_rejected() {
        let pos = Position::startpos();
        let m = Move::new(Square::new(12), Square::new(20), PieceType::Pawn, Some(PieceType::Pawn), None, FLAG_CAPTURE);
        assert!(!pos.move_is_pseudo_legal(m));
    }
}
