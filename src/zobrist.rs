//! Zobrist hashing: incrementally-maintained position hashes.
//!
//! spec.md §3 I4: `z_key` XORs piece-square, castling, en-passant, and
//! side-to-move constants. `pawn_key` restricts to pawns and kings (so pawn
//! structure can be cached independent of piece placement elsewhere).
//! `piece_count_key` is indexed by per-color/per-type piece counts, used to
//! detect material changes cheaply (e.g. for draw/phase bookkeeping).

use rand::prelude::*;
use rand::rngs::StdRng;

use crate::types::{Color, PieceType, Square};

pub(crate) struct ZobristKeys {
    /// `piece_square[color][piece][square]`
    piece_square: [[[u64; 64]; 6]; 2],
    pub(crate) side_to_move: u64,
    /// One key per rook-castling-rights square (rank 1 and rank 8 only used).
    castling: [u64; 64],
    /// One key per en-passant target file.
    en_passant_file: [u64; 8],
    /// `piece_count[color][piece][count]`, count in 0..=10 (never more pawns-promoted pieces than that in practice, clamp higher counts to 10).
    piece_count: [[[u64; 11]; 6]; 2],
}

const COUNT_CLAMP: usize = 10;

impl ZobristKeys {
    fn new() -> Self {
        // Fixed seed: required for P3/P7 reproducibility across builds.
        let mut rng = StdRng::seed_from_u64(0x5354_4F43_4B46_4953);
        let mut piece_square = [[[0u64; 64]; 6]; 2];
        for color in piece_square.iter_mut() {
            for piece in color.iter_mut() {
                for key in piece.iter_mut() {
                    *key = rng.gen();
                }
            }
        }
        let side_to_move = rng.gen();
        let mut castling = [0u64; 64];
        for key in castling.iter_mut() {
            *key = rng.gen();
        }
        let mut en_passant_file = [0u64; 8];
        for key in en_passant_file.iter_mut() {
            *key = rng.gen();
        }
        let mut piece_count = [[[0u64; 11]; 6]; 2];
        for color in piece_count.iter_mut() {
            for piece in color.iter_mut() {
                for key in piece.iter_mut() {
                    *key = rng.gen();
                }
            }
        }
        ZobristKeys {
            piece_square,
            side_to_move,
            castling,
            en_passant_file,
            piece_count,
        }
    }

    #[inline]
    pub(crate) fn piece_square_key(&self, color: Color, piece: PieceType, sq: Square) -> u64 {
        self.piece_square[color.index()][piece.index()][sq.index()]
    }

    #[inline]
    pub(crate) fn castling_key(&self, rook_square: Square) -> u64 {
        self.castling[rook_square.index()]
    }

    #[inline]
    pub(crate) fn en_passant_key(&self, file: u8) -> u64 {
        self.en_passant_file[file as usize]
    }

    #[inline]
    pub(crate) fn piece_count_key(&self, color: Color, piece: PieceType, count: u32) -> u64 {
        self.piece_count[color.index()][piece.index()][(count as usize).min(COUNT_CLAMP)]
    }
}

pub(crate) static ZOBRIST: std::sync::LazyLock<ZobristKeys> = std::sync::LazyLock::new(ZobristKeys::new);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_deterministic_across_instantiations() {
        let a = ZobristKeys::new();
        let b = ZobristKeys::new();
        assert_eq!(a.side_to_move, b.side_to_move);
        assert_eq!(
            a.piece_square_key(Color::White, PieceType::Pawn, Square::new(12)),
            b.piece_square_key(Color::White, PieceType::Pawn, Square::new(12))
        );
    }
}
