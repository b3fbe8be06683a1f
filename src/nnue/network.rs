//! NNUE network weights and evaluation (spec.md §4.E).
//!
//! Architecture: `(768 inputs × 15 king buckets) -> HIDDEN` per
//! perspective, two output-weight vectors (one per perspective), plain
//! ReLU activation — matching the reference network this spec was
//! distilled from, not the flat single-bucket SCReLU net this crate
//! started from.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::types::{Color, PieceType, Square};

pub const HIDDEN: usize = 1024;
pub const BUCKETS: usize = 15;
const INPUT_PER_BUCKET: usize = 768; // 64 squares * 12 (piece, perspective) categories
pub const INPUT_SIZE: usize = INPUT_PER_BUCKET * BUCKETS;

/// Evaluation scale: divides the raw output dot product down to centipawns.
pub const SCALE: i32 = 16 * 512;

/// King-square -> bucket index, mirrored onto the a-d files before lookup.
const KING_BUCKETS: [usize; 64] = [
    0, 1, 2, 3, 3, 2, 1, 0, //
    4, 5, 5, 6, 6, 5, 5, 4, //
    7, 8, 9, 10, 10, 9, 8, 7, //
    7, 8, 9, 10, 10, 9, 8, 7, //
    7, 14, 13, 12, 12, 13, 14, 7, //
    11, 14, 13, 12, 12, 13, 14, 11, //
    11, 14, 13, 12, 12, 13, 14, 11, //
    11, 11, 11, 11, 11, 11, 11, 11,
];

#[must_use]
pub fn king_bucket(king_sq: Square) -> usize {
    KING_BUCKETS[king_sq.index()]
}

/// Feature index for `piece`/`piece_color` on `sq`, seen from `view`'s
/// king on `king_sq` (spec.md §4.E). `king_sq` is `view`'s own king, not
/// flipped — the mirror test uses its real file.
#[must_use]
pub fn feature_index(view: Color, king_sq: Square, piece_color: Color, piece: PieceType, sq: Square) -> usize {
    let rel_king = if view == Color::White { king_sq } else { king_sq.flip_rank() };
    let mut rel_sq = if view == Color::White { sq } else { sq.flip_rank() };
    let bucket = king_bucket(rel_king);
    if king_sq.file() > 3 {
        rel_sq = rel_sq.flip_file();
    }
    let own = if view == piece_color { 1 } else { 0 };
    let piece_offset = piece.index() + own * 6;
    rel_sq.index() + piece_offset * 64 + bucket * INPUT_PER_BUCKET
}

/// Weights for one perspective-folded NNUE evaluator.
pub struct NnueNetwork {
    pub feature_weights: Box<[[i16; HIDDEN]; INPUT_SIZE]>,
    pub hidden_bias: [i16; HIDDEN],
    pub output_weights_us: [i16; HIDDEN],
    pub output_weights_them: [i16; HIDDEN],
    pub output_bias: i32,
}

impl NnueNetwork {
    /// An all-zero network: deterministic, used by tests and as the
    /// fallback when no trained net is configured.
    #[must_use]
    pub fn zeroed() -> Self {
        NnueNetwork {
            feature_weights: vec![[0i16; HIDDEN]; INPUT_SIZE]
                .into_boxed_slice()
                .try_into()
                .unwrap_or_else(|_| unreachable!("fixed-size allocation")),
            hidden_bias: [0; HIDDEN],
            output_weights_us: [0; HIDDEN],
            output_weights_them: [0; HIDDEN],
            output_bias: 0,
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(&mut BufReader::new(file))
    }

    #[cfg(feature = "embedded_nnue")]
    #[must_use]
    pub fn from_embedded() -> Self {
        Self::from_bytes(EMBEDDED_NETWORK).expect("embedded NNUE weights are malformed")
    }

    pub fn from_bytes(data: &[u8]) -> io::Result<Self> {
        let mut cursor = io::Cursor::new(data);
        Self::from_reader(&mut cursor)
    }

    fn from_reader<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut net = Self::zeroed();
        let mut buf2 = [0u8; 2];
        for row in net.feature_weights.iter_mut() {
            for w in row.iter_mut() {
                reader.read_exact(&mut buf2)?;
                *w = i16::from_le_bytes(buf2);
            }
        }
        for b in net.hidden_bias.iter_mut() {
            reader.read_exact(&mut buf2)?;
            *b = i16::from_le_bytes(buf2);
        }
        for w in net.output_weights_us.iter_mut() {
            reader.read_exact(&mut buf2)?;
            *w = i16::from_le_bytes(buf2);
        }
        for w in net.output_weights_them.iter_mut() {
            reader.read_exact(&mut buf2)?;
            *w = i16::from_le_bytes(buf2);
        }
        let mut buf4 = [0u8; 4];
        reader.read_exact(&mut buf4)?;
        net.output_bias = i32::from_le_bytes(buf4);
        Ok(net)
    }

    /// Evaluates from `stm`'s perspective given its current accumulator
    /// pair (spec.md §4.E `evaluate`).
    #[inline]
    #[must_use]
    pub fn evaluate(&self, us_hidden: &[i16; HIDDEN], them_hidden: &[i16; HIDDEN]) -> i32 {
        let us: i32 = us_hidden
            .iter()
            .zip(self.output_weights_us.iter())
            .map(|(&h, &w)| relu(h) * i32::from(w))
            .sum();
        let them: i32 = them_hidden
            .iter()
            .zip(self.output_weights_them.iter())
            .map(|(&h, &w)| relu(h) * i32::from(w))
            .sum();
        (self.output_bias + us + them) / SCALE
    }
}

#[inline]
fn relu(v: i16) -> i32 {
    i32::from(v).max(0)
}

#[cfg(feature = "embedded_nnue")]
pub static EMBEDDED_NETWORK: &[u8] = include_bytes!("nets/default.nnue");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_network_evaluates_to_bias_over_scale() {
        let net = NnueNetwork::zeroed();
        let acc = [0i16; HIDDEN];
        assert_eq!(net.evaluate(&acc, &acc), 0);
    }

    #[test]
    fn king_bucket_table_is_symmetric_within_a_row() {
        // a1 and h1 share bucket 0 (mirrored onto the queenside files).
        assert_eq!(king_bucket(Square::new(0)), king_bucket(Square::new(7)));
    }

    #[test]
    fn feature_index_stays_in_bounds() {
        for view in [Color::White, Color::Black] {
            for king_idx in 0u8..64 {
                for sq_idx in 0u8..64 {
                    let idx = feature_index(
                        view,
                        Square::new(king_idx),
                        Color::Black,
                        PieceType::Queen,
                        Square::new(sq_idx),
                    );
                    assert!(idx < INPUT_SIZE);
                }
            }
        }
    }
}
