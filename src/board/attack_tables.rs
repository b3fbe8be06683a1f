//! Precomputed non-sliding attack tables and sliding-piece attack lookup.
//!
//! Sliding attacks use the classic "occupancy-indexed" variant of magic
//! bitboards: instead of a multiplicative magic hash we index directly by
//! the relevant occupancy bits (spec.md §4.D allows "magic or hyperbola
//! quintessence"); this trades a little memory for a simpler, allocation-free
//! table build with no need to search for magic numbers at startup.

use once_cell::sync::Lazy;

use crate::types::{Bitboard, Square};

fn in_bounds(rank: isize, file: isize) -> bool {
    (0..8).contains(&rank) && (0..8).contains(&file)
}

fn ray_table(deltas: &[(isize, isize)]) -> [u64; 64] {
    let mut table = [0u64; 64];
    for sq in 0..64 {
        let rank = (sq / 8) as isize;
        let file = (sq % 8) as isize;
        let mut mask = 0u64;
        for &(dr, df) in deltas {
            let nr = rank + dr;
            let nf = file + df;
            if in_bounds(nr, nf) {
                mask |= 1u64 << (nr * 8 + nf);
            }
        }
        table[sq] = mask;
    }
    table
}

pub static KNIGHT_ATTACKS: Lazy<[u64; 64]> = Lazy::new(|| {
    ray_table(&[
        (2, 1),
        (1, 2),
        (-1, 2),
        (-2, 1),
        (-2, -1),
        (-1, -2),
        (1, -2),
        (2, -1),
    ])
});

pub static KING_ATTACKS: Lazy<[u64; 64]> = Lazy::new(|| {
    ray_table(&[
        (1, 0),
        (-1, 0),
        (0, 1),
        (0, -1),
        (1, 1),
        (1, -1),
        (-1, 1),
        (-1, -1),
    ])
});

/// `PAWN_ATTACKS[color_index][square]`
pub static PAWN_ATTACKS: Lazy<[[u64; 64]; 2]> = Lazy::new(|| {
    let mut attacks = [[0u64; 64]; 2];
    for sq in 0..64 {
        let rank = (sq / 8) as isize;
        let file = (sq % 8) as isize;
        for (color, dr) in [(0usize, 1isize), (1usize, -1isize)] {
            let mut mask = 0u64;
            let nr = rank + dr;
            if (0..8).contains(&nr) {
                for df in [-1isize, 1] {
                    let nf = file + df;
                    if in_bounds(nr, nf) {
                        mask |= 1u64 << (nr * 8 + nf);
                    }
                }
            }
            attacks[color][sq] = mask;
        }
    }
    attacks
});

const DIR_N: usize = 0;
const DIR_S: usize = 1;
const DIR_E: usize = 2;
const DIR_W: usize = 3;
const DIR_NE: usize = 4;
const DIR_NW: usize = 5;
const DIR_SE: usize = 6;
const DIR_SW: usize = 7;

static RAYS: Lazy<[[u64; 64]; 8]> = Lazy::new(|| {
    let dirs: [(isize, isize); 8] = [
        (1, 0),
        (-1, 0),
        (0, 1),
        (0, -1),
        (1, 1),
        (1, -1),
        (-1, 1),
        (-1, -1),
    ];
    let mut rays = [[0u64; 64]; 8];
    for sq in 0..64 {
        let rank = (sq / 8) as isize;
        let file = (sq % 8) as isize;
        for (d, &(dr, df)) in dirs.iter().enumerate() {
            let mut mask = 0u64;
            let mut nr = rank + dr;
            let mut nf = file + df;
            while in_bounds(nr, nf) {
                mask |= 1u64 << (nr * 8 + nf);
                nr += dr;
                nf += df;
            }
            rays[d][sq] = mask;
        }
    }
    rays
});

static ROOK_MASKS: Lazy<[u64; 64]> = Lazy::new(|| {
    let mut masks = [0u64; 64];
    for sq in 0..64 {
        masks[sq] = RAYS[DIR_N][sq] | RAYS[DIR_S][sq] | RAYS[DIR_E][sq] | RAYS[DIR_W][sq];
    }
    masks
});

static BISHOP_MASKS: Lazy<[u64; 64]> = Lazy::new(|| {
    let mut masks = [0u64; 64];
    for sq in 0..64 {
        masks[sq] = RAYS[DIR_NE][sq] | RAYS[DIR_NW][sq] | RAYS[DIR_SE][sq] | RAYS[DIR_SW][sq];
    }
    masks
});

fn is_increasing_dir(dir: usize) -> bool {
    matches!(dir, DIR_N | DIR_E | DIR_NE | DIR_NW)
}

fn ray_attacks(from_idx: usize, dir: usize, occupancy: u64) -> u64 {
    let ray = RAYS[dir][from_idx];
    let blockers = ray & occupancy;
    if blockers == 0 {
        return ray;
    }
    let blocker_idx = if is_increasing_dir(dir) {
        blockers.trailing_zeros() as usize
    } else {
        63 - blockers.leading_zeros() as usize
    };
    ray ^ RAYS[dir][blocker_idx]
}

fn gen_slider_attacks(from_idx: usize, occupancy: u64, bishop: bool) -> u64 {
    let dirs: &[usize] = if bishop {
        &[DIR_NE, DIR_NW, DIR_SE, DIR_SW]
    } else {
        &[DIR_N, DIR_S, DIR_E, DIR_W]
    };
    dirs.iter().map(|&d| ray_attacks(from_idx, d, occupancy)).fold(0, |a, b| a | b)
}

fn occupancy_from_index(mut index: usize, mask: u64) -> u64 {
    let mut result = 0u64;
    let mut m = mask;
    while m != 0 {
        let sq = m.trailing_zeros();
        m &= m - 1;
        if index & 1 != 0 {
            result |= 1u64 << sq;
        }
        index >>= 1;
    }
    result
}

fn index_from_occupancy(occ: u64, mask: u64) -> usize {
    let mut index = 0usize;
    let mut bit = 0usize;
    let mut m = mask;
    while m != 0 {
        let sq = m.trailing_zeros();
        m &= m - 1;
        if occ & (1u64 << sq) != 0 {
            index |= 1usize << bit;
        }
        bit += 1;
    }
    index
}

fn build_slider_table(bishop: bool) -> Vec<Vec<u64>> {
    let masks = if bishop { &BISHOP_MASKS } else { &ROOK_MASKS };
    let mut tables = Vec::with_capacity(64);
    for sq in 0..64 {
        let mask = masks[sq];
        let size = 1usize << mask.count_ones();
        let mut table = vec![0u64; size];
        for (index, slot) in table.iter_mut().enumerate() {
            let occ = occupancy_from_index(index, mask);
            *slot = gen_slider_attacks(sq, occ, bishop);
        }
        tables.push(table);
    }
    tables
}

static ROOK_ATTACKS: Lazy<Vec<Vec<u64>>> = Lazy::new(|| build_slider_table(false));
static BISHOP_ATTACKS: Lazy<Vec<Vec<u64>>> = Lazy::new(|| build_slider_table(true));

#[inline]
#[must_use]
pub fn knight_attacks(sq: Square) -> Bitboard {
    Bitboard(KNIGHT_ATTACKS[sq.index()])
}

#[inline]
#[must_use]
pub fn king_attacks(sq: Square) -> Bitboard {
    Bitboard(KING_ATTACKS[sq.index()])
}

#[inline]
#[must_use]
pub fn pawn_attacks(color_idx: usize, sq: Square) -> Bitboard {
    Bitboard(PAWN_ATTACKS[color_idx][sq.index()])
}

#[inline]
#[must_use]
pub fn bishop_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    let mask = BISHOP_MASKS[sq.index()];
    let index = index_from_occupancy(occupied.0, mask);
    Bitboard(BISHOP_ATTACKS[sq.index()][index])
}

#[inline]
#[must_use]
pub fn rook_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    let mask = ROOK_MASKS[sq.index()];
    let index = index_from_occupancy(occupied.0, mask);
    Bitboard(ROOK_ATTACKS[sq.index()][index])
}

#[inline]
#[must_use]
pub fn queen_attacks(sq: Square, occupied: Bitboard) -> Bitboard {
    bishop_attacks(sq, occupied) | rook_attacks(sq, occupied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_on_empty_board_sees_full_rank_and_file() {
        let attacks = rook_attacks(Square::new(0), Bitboard(0));
        // a1: entire a-file + entire rank 1, minus itself.
        assert_eq!(attacks.popcount(), 14);
    }

    #[test]
    fn bishop_blocked_by_occupancy() {
        let occ = Bitboard::from_square(Square::new(18)); // c3
        let attacks = bishop_attacks(Square::new(0), occ); // a1 bishop
        assert!(attacks.contains(Square::new(18)));
        assert!(!attacks.contains(Square::new(27))); // d4, beyond blocker
    }

    #[test]
    fn knight_corner_has_two_targets() {
        assert_eq!(knight_attacks(Square::new(0)).popcount(), 2);
    }
}
