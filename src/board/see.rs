//! Static Exchange Evaluation: material outcome of a forced capture
//! sequence on one square, including discovered (x-ray) attackers.

use crate::moves::Move;
use crate::types::{Bitboard, Color, PieceType, Square};

use super::Position;

impl Position {
    fn attackers_to(&self, sq: Square, occ: Bitboard) -> Bitboard {
        self.square_attacked_by(Color::White, sq, occ) | self.square_attacked_by(Color::Black, sq, occ)
    }

    fn diagonal_xray(&self, sq: Square, occ: Bitboard) -> Bitboard {
        let diag = self.pieces(Color::White, PieceType::Bishop)
            | self.pieces(Color::Black, PieceType::Bishop)
            | self.pieces(Color::White, PieceType::Queen)
            | self.pieces(Color::Black, PieceType::Queen);
        super::bishop_attacks(sq, occ) & diag
    }

    fn orthogonal_xray(&self, sq: Square, occ: Bitboard) -> Bitboard {
        let ortho = self.pieces(Color::White, PieceType::Rook)
            | self.pieces(Color::Black, PieceType::Rook)
            | self.pieces(Color::White, PieceType::Queen)
            | self.pieces(Color::Black, PieceType::Queen);
        super::rook_attacks(sq, occ) & ortho
    }

    /// En-passant-captured pawn square for a capturing pawn move `from -> to`.
    fn en_passant_captured_square(from: Square, to: Square) -> Square {
        Square::from_rank_file(from.rank(), to.file())
    }

    /// Full material outcome of the exchange sequence starting with `m`,
    /// from the perspective of the side making `m` (spec.md §4.C). Castling
    /// and en passant are never losing trades for the mover by construction,
    /// so they report the sentinel `1024` required by the picker/pruning
    /// contract ("special moves... treated as ≥1024").
    #[must_use]
    pub fn calculate_see(&self, m: Move) -> i32 {
        if m.is_castle() {
            return 1024;
        }

        let from = m.from();
        let to = m.to();
        let mut occupied = self.all_occupied;
        occupied.clear(from);

        let mut gain = [0i32; 32];
        let mut depth = 0usize;

        if m.is_en_passant() {
            occupied.clear(Self::en_passant_captured_square(from, to));
            gain[0] = PieceType::Pawn.see_value();
        } else if let Some(promo) = m.promotion() {
            gain[0] = m.captured().map_or(0, PieceType::see_value) + promo.see_value()
                - PieceType::Pawn.see_value();
        } else {
            gain[0] = m.captured().map_or(0, PieceType::see_value);
        }

        let mut attacker_value = m.promotion().map_or(m.piece().see_value(), |p| p.see_value());
        let mut color = self.side_to_move.opposite();
        let mut attackers = self.attackers_to(to, occupied);

        loop {
            let stm_attackers = attackers & self.occupied_by(color) & occupied;
            let Some((sq, pt)) = least_valuable(self, stm_attackers, color) else { break };
            depth += 1;
            gain[depth] = attacker_value - gain[depth - 1];
            attacker_value = pt.see_value();
            occupied.clear(sq);
            if matches!(pt, PieceType::Pawn | PieceType::Bishop | PieceType::Queen) {
                attackers |= self.diagonal_xray(to, occupied);
            }
            if matches!(pt, PieceType::Rook | PieceType::Queen) {
                attackers |= self.orthogonal_xray(to, occupied);
            }
            color = color.opposite();
            if depth == 31 {
                break;
            }
        }

        for i in (0..depth).rev() {
            gain[i] = -(-gain[i]).max(gain[i + 1]);
        }
        gain[0]
    }

    /// True iff the exchange starting with `m` nets at least `threshold`
    /// for the mover. Short-circuits as soon as the sign can no longer
    /// change, per spec.md §4.C.
    #[must_use]
    pub fn see_ge(&self, m: Move, threshold: i32) -> bool {
        if m.is_castle() || m.is_en_passant() {
            return threshold <= 1024;
        }

        let from = m.from();
        let to = m.to();

        let mut swap = m.captured().map_or(0, PieceType::see_value) - threshold;
        if let Some(promo) = m.promotion() {
            swap += promo.see_value() - PieceType::Pawn.see_value();
        }
        if swap < 0 {
            return false;
        }

        let moving_value = m.promotion().map_or(m.piece().see_value(), |p| p.see_value());
        swap = moving_value - swap;
        if swap <= 0 {
            return true;
        }

        let mut occupied = self.all_occupied;
        occupied.clear(from);
        occupied.clear(to);

        let mut stm = self.side_to_move;
        let mut attackers = self.attackers_to(to, occupied);
        let mut res = 1i32;

        loop {
            stm = stm.opposite();
            attackers &= occupied;
            let stm_attackers = attackers & self.occupied_by(stm);
            if stm_attackers.is_empty() {
                break;
            }
            res ^= 1;

            let mut matched = None;
            for pt in [PieceType::Pawn, PieceType::Knight, PieceType::Bishop, PieceType::Rook, PieceType::Queen] {
                let bb = stm_attackers & self.pieces(stm, pt);
                if !bb.is_empty() {
                    matched = Some((pt, bb));
                    break;
                }
            }

            let Some((pt, bb)) = matched else {
                // Only the king remains: it may not capture into an attacked
                // square, so the exchange stops here unless the opponent has
                // no attacker of their own left on the square either.
                let opponent_left = attackers & !self.occupied_by(stm);
                return if !opponent_left.is_empty() { res ^ 1 != 0 } else { res != 0 };
            };

            swap = pt.see_value() - swap;
            if swap < res {
                break;
            }
            let sq = bb.lsb().expect("bb is non-empty");
            occupied.clear(sq);
            if matches!(pt, PieceType::Pawn | PieceType::Bishop | PieceType::Queen) {
                attackers |= self.diagonal_xray(to, occupied);
            }
            if matches!(pt, PieceType::Rook | PieceType::Queen) {
                attackers |= self.orthogonal_xray(to, occupied);
            }
        }

        res != 0
    }
}

fn least_valuable(pos: &Position, attackers: Bitboard, color: Color) -> Option<(Square, PieceType)> {
    for pt in crate::types::ALL_PIECE_TYPES {
        let bb = attackers & pos.pieces(color, pt);
        if let Some(sq) = bb.lsb() {
            return Some((sq, pt));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::{FLAG_CAPTURE, FLAG_EN_PASSANT};
    use crate::types::Square;

    #[test]
    fn simple_pawn_takes_pawn_is_equal_trade() {
        let pos = Position::new_from_fen(
            "4k3/8/8/3p4/4P3/8/8/4K3 w - - 0 1",
            false,
        )
        .unwrap();
        let m = Move::new(
            Square::new(28),
            Square::new(35),
            PieceType::Pawn,
            Some(PieceType::Pawn),
            None,
            FLAG_CAPTURE,
        );
        assert_eq!(pos.calculate_see(m), PieceType::Pawn.see_value());
        assert!(pos.see_ge(m, 0));
        assert!(!pos.see_ge(m, PieceType::Pawn.see_value() + 1));
    }

    #[test]
    fn defended_pawn_loses_the_attacker() {
        // White knight takes a pawn defended by a black pawn: nets pawn - knight.
        let pos = Position::new_from_fen(
            "4k3/8/8/3p4/8/4N3/8/4K3 w - - 0 1",
            false,
        )
        .unwrap();
        let m = Move::new(
            Square::new(20),
            Square::new(35),
            PieceType::Knight,
            Some(PieceType::Pawn),
            None,
            FLAG_CAPTURE,
        );
        let expected = PieceType::Pawn.see_value() - PieceType::Knight.see_value();
        assert_eq!(pos.calculate_see(m), expected);
        assert!(!pos.see_ge(m, 0));
    }

    #[test]
    fn en_passant_is_never_negative() {
        let pos = Position::new_from_fen(
            "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1",
            false,
        )
        .unwrap();
        let m = Move::new(
            Square::new(36),
            Square::new(43),
            PieceType::Pawn,
            Some(PieceType::Pawn),
            None,
            FLAG_CAPTURE | FLAG_EN_PASSANT,
        );
        assert!(pos.see_ge(m, 0));
    }
}
