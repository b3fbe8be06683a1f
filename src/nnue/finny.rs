//! Finny tables: per-(king bucket, mirror) cached half-accumulators
//! (spec.md §4.E "Finny cache").
//!
//! A king move that stays inside the same bucket and doesn't cross the
//! file-4 mirror line touches no feature weights at all. One that
//! crosses either boundary would otherwise force a full half-refresh;
//! instead we keep one accumulator snapshot per slot and only apply the
//! symmetric difference between the pieces on the board now and the
//! pieces recorded the last time that slot was filled.

use crate::types::{Bitboard, Color, PieceType, Square, ALL_PIECE_TYPES};

use super::network::{feature_index, king_bucket, NnueNetwork, HIDDEN};

type PieceSet = [[Bitboard; 6]; 2];

#[derive(Clone)]
struct FinnyEntry {
    acc: [i16; HIDDEN],
    pieces: PieceSet,
}

impl FinnyEntry {
    fn blank(net: &NnueNetwork) -> Self {
        FinnyEntry { acc: net.hidden_bias, pieces: [[Bitboard::default(); 6]; 2] }
    }
}

/// One cache per perspective. `bucket * 2 + mirror as usize` indexes the
/// flat slot array.
pub struct FinnyCache {
    slots: Vec<Option<FinnyEntry>>,
}

impl FinnyCache {
    #[must_use]
    pub fn new() -> Self {
        FinnyCache { slots: vec![None; super::network::BUCKETS * 2] }
    }

    /// Returns the half-accumulator for `view` given `king_sq` and the
    /// board's current piece bitboards, updating the cached slot in
    /// place by applying only the squares that changed since it was last
    /// filled.
    pub fn half_accumulator(&mut self, net: &NnueNetwork, view: Color, king_sq: Square, pieces: &PieceSet) -> [i16; HIDDEN] {
        let rel_king = if view == Color::White { king_sq } else { king_sq.flip_rank() };
        let mirror = king_sq.file() > 3;
        let slot_index = king_bucket(rel_king) * 2 + usize::from(mirror);
        let entry = self.slots[slot_index].get_or_insert_with(|| FinnyEntry::blank(net));

        for color in [Color::White, Color::Black] {
            for piece in ALL_PIECE_TYPES {
                let before = entry.pieces[color.index()][piece.index()];
                let after = pieces[color.index()][piece.index()];
                let mut added = after & !before;
                while let Some(sq) = added.pop_lsb() {
                    apply_row(net, &mut entry.acc, view, king_sq, color, piece, sq, true);
                }
                let mut removed = before & !after;
                while let Some(sq) = removed.pop_lsb() {
                    apply_row(net, &mut entry.acc, view, king_sq, color, piece, sq, false);
                }
            }
        }
        entry.pieces = *pieces;
        entry.acc
    }
}

impl Default for FinnyCache {
    fn default() -> Self {
        Self::new()
    }
}

#[allow(clippy::too_many_arguments)]
fn apply_row(net: &NnueNetwork, acc: &mut [i16; HIDDEN], view: Color, king_sq: Square, piece_color: Color, piece: PieceType, sq: Square, add: bool) {
    let idx = feature_index(view, king_sq, piece_color, piece, sq);
    let row = &net.feature_weights[idx];
    if add {
        for (a, w) in acc.iter_mut().zip(row.iter()) {
            *a += *w;
        }
    } else {
        for (a, w) in acc.iter_mut().zip(row.iter()) {
            *a -= *w;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Square;

    fn pieces_with(color: Color, piece: PieceType, squares: &[u8]) -> PieceSet {
        let mut set: PieceSet = [[Bitboard::default(); 6]; 2];
        for &s in squares {
            set[color.index()][piece.index()].set(Square::new(s));
        }
        set
    }

    #[test]
    fn repeated_refresh_with_same_pieces_is_a_no_op() {
        let net = NnueNetwork::zeroed();
        let mut cache = FinnyCache::new();
        let pieces = pieces_with(Color::White, PieceType::Knight, &[1, 6]);
        let king = Square::new(4);
        let first = cache.half_accumulator(&net, Color::White, king, &pieces);
        let second = cache.half_accumulator(&net, Color::White, king, &pieces);
        assert_eq!(first, second);
    }

    #[test]
    fn adding_a_piece_changes_the_cached_accumulator_on_a_nonzero_network() {
        let mut net = NnueNetwork::zeroed();
        net.feature_weights[0][0] = 37;
        let mut cache = FinnyCache::new();
        let king = Square::new(4);
        let empty: PieceSet = [[Bitboard::default(); 6]; 2];
        let with_knight = pieces_with(Color::White, PieceType::Knight, &[0]);
        let before = cache.half_accumulator(&net, Color::White, king, &empty);
        let after = cache.half_accumulator(&net, Color::White, king, &with_knight);
        assert_ne!(before, after);
    }
}
