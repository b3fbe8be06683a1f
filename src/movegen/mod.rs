//! Pseudo-legal move generation (spec.md §4.D).
//!
//! Non-sliding attacks come from the precomputed tables in
//! [`crate::board`]; sliding attacks use the occupancy-indexed lookup
//! there too. Generated moves are pseudo-legal only — [`Position::do_move`]
//! is the legality filter, rejecting anything that leaves the mover's own
//! king in check.

use crate::board::Position;
use crate::moves::{
    Move, MoveList, FLAG_CAPTURE, FLAG_CASTLE_KINGSIDE, FLAG_CASTLE_QUEENSIDE, FLAG_DOUBLE_PAWN_PUSH,
    FLAG_EN_PASSANT, FLAG_PROMOTION,
};
use crate::types::{Color, PieceType, Square};

const PROMOTION_PIECES: [PieceType; 4] = [PieceType::Queen, PieceType::Rook, PieceType::Bishop, PieceType::Knight];

/// Generates every pseudo-legal move for the side to move into `list`.
/// When `captures_only` is set (quiescence search), quiet moves are
/// skipped except quiet promotions, which are still generated.
pub fn generate_moves(pos: &Position, list: &mut MoveList, captures_only: bool) {
    let color = pos.side_to_move();
    generate_pawn_moves(pos, color, list, captures_only);
    for pt in [PieceType::Knight, PieceType::Bishop, PieceType::Rook, PieceType::Queen] {
        generate_piece_moves(pos, color, pt, list, captures_only);
    }
    generate_king_moves(pos, color, list, captures_only);
    if !captures_only {
        generate_castling_moves(pos, color, list);
    }
}

fn generate_piece_moves(pos: &Position, color: Color, pt: PieceType, list: &mut MoveList, captures_only: bool) {
    let own = pos.occupied_by(color);
    let enemy = pos.occupied_by(color.opposite());
    let mut pieces = pos.pieces(color, pt);
    while let Some(from) = pieces.pop_lsb() {
        let attacks = pos.attacks_from(pt, color, from) & !own;
        let mut targets = if captures_only { attacks & enemy } else { attacks };
        while let Some(to) = targets.pop_lsb() {
            let captured = pos.piece_at(to).map(|(_, p)| p);
            let flags = if captured.is_some() { FLAG_CAPTURE } else { 0 };
            list.push(Move::new(from, to, pt, captured, None, flags));
        }
    }
}

fn generate_king_moves(pos: &Position, color: Color, list: &mut MoveList, captures_only: bool) {
    generate_piece_moves(pos, color, PieceType::King, list, captures_only);
}

fn generate_pawn_moves(pos: &Position, color: Color, list: &mut MoveList, captures_only: bool) {
    let own = pos.occupied_by(color);
    let enemy = pos.occupied_by(color.opposite());
    let empty = !pos.all_occupied();
    let forward: i32 = if color == Color::White { 8 } else { -8 };
    let start_rank = if color == Color::White { 1 } else { 6 };
    let promo_rank = if color == Color::White { 7 } else { 0 };

    let mut pawns = pos.pieces(color, PieceType::Pawn);
    while let Some(from) = pawns.pop_lsb() {
        let single_idx = from.index() as i32 + forward;
        if (0..64).contains(&single_idx) {
            let single = Square::new(single_idx as u8);
            if empty.contains(single) {
                if !captures_only || single.rank() == promo_rank {
                    push_pawn_move(list, from, single, promo_rank, None, 0);
                }
                if from.rank() == start_rank {
                    let double_idx = single_idx + forward;
                    let double = Square::new(double_idx as u8);
                    if empty.contains(double) && !captures_only {
                        list.push(Move::new(from, double, PieceType::Pawn, None, None, FLAG_DOUBLE_PAWN_PUSH));
                    }
                }
            }
        }

        let mut captures = pos.attacks_from(PieceType::Pawn, color, from) & enemy;
        while let Some(to) = captures.pop_lsb() {
            let captured = pos.piece_at(to).map(|(_, p)| p);
            push_pawn_move(list, from, to, promo_rank, captured, FLAG_CAPTURE);
        }

        let ep = pos.en_passant_target();
        if !ep.is_empty() {
            let ep_sq = ep.lsb().expect("checked non-empty");
            if pos.attacks_from(PieceType::Pawn, color, from).contains(ep_sq) {
                list.push(Move::new(
                    from,
                    ep_sq,
                    PieceType::Pawn,
                    Some(PieceType::Pawn),
                    None,
                    FLAG_CAPTURE | FLAG_EN_PASSANT,
                ));
            }
        }
    }
}

fn push_pawn_move(list: &mut MoveList, from: Square, to: Square, promo_rank: u8, captured: Option<PieceType>, base_flags: u32) {
    if to.rank() == promo_rank {
        for &promo in &PROMOTION_PIECES {
            list.push(Move::new(from, to, PieceType::Pawn, captured, Some(promo), base_flags | FLAG_PROMOTION));
        }
    } else {
        list.push(Move::new(from, to, PieceType::Pawn, captured, None, base_flags));
    }
}

fn generate_castling_moves(pos: &Position, color: Color, list: &mut MoveList) {
    if pos.is_in_check(color) {
        return;
    }
    let king_from = pos.king_square(color);
    let rooks: Vec<Square> = pos.castling_rights().rook_squares(color).into_iter().collect();
    for rook_from in rooks {
        let kingside = pos.is_kingside_rook(color, rook_from);
        let flag = if kingside { FLAG_CASTLE_KINGSIDE } else { FLAG_CASTLE_QUEENSIDE };
        let m = Move::new(king_from, rook_from, PieceType::King, None, None, flag);
        if pos.move_is_pseudo_legal(m) {
            list.push(m);
        }
    }
}

/// Counts reachable leaf positions at `depth`, used for perft testing.
pub fn perft(pos: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let mut list = MoveList::new();
    generate_moves(pos, &mut list, false);
    let mut nodes = 0u64;
    for &m in list.as_slice() {
        let mut next = pos.clone();
        if next.do_move(m) {
            nodes += perft(&next, depth - 1);
        }
    }
    nodes
}

/// Perft with a per-root-move breakdown, useful for `go perft` and
/// diagnosing divergence against a reference.
pub fn perft_divide(pos: &Position, depth: u32) -> Vec<(Move, u64)> {
    let mut list = MoveList::new();
    generate_moves(pos, &mut list, false);
    let mut out = Vec::new();
    for &m in list.as_slice() {
        let mut next = pos.clone();
        if next.do_move(m) {
            let count = if depth == 0 { 1 } else { perft(&next, depth - 1) };
            out.push((m, count));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Position;

    #[test]
    fn startpos_has_twenty_moves() {
        let pos = Position::startpos();
        let mut list = MoveList::new();
        generate_moves(&pos, &mut list, false);
        assert_eq!(list.len(), 20);
    }

    #[test]
    fn perft_startpos_depth_1_through_3() {
        let pos = Position::startpos();
        assert_eq!(perft(&pos, 1), 20);
        assert_eq!(perft(&pos, 2), 400);
        assert_eq!(perft(&pos, 3), 8902);
    }

    #[test]
    fn perft_kiwipete_depth_1_and_2() {
        let pos = Position::new_from_fen(
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            false,
        )
        .unwrap();
        assert_eq!(perft(&pos, 1), 48);
        assert_eq!(perft(&pos, 2), 2039);
    }

    #[test]
    fn perft_position_3_endgame_depth_1_and_2() {
        let pos = Position::new_from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1", false).unwrap();
        assert_eq!(perft(&pos, 1), 14);
        assert_eq!(perft(&pos, 2), 191);
    }

    #[test]
    fn en_passant_is_generated_when_available() {
        let pos = Position::new_from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1", false).unwrap();
        let mut list = MoveList::new();
        generate_moves(&pos, &mut list, false);
        assert!(list.as_slice().iter().any(|m| m.is_en_passant()));
    }

    #[test]
    fn castling_requires_clear_and_unattacked_path() {
        let pos = Position::new_from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", false).unwrap();
        let mut list = MoveList::new();
        generate_moves(&pos, &mut list, false);
        assert_eq!(list.as_slice().iter().filter(|m| m.is_castle()).count(), 2);
    }

    #[test]
    fn castling_through_check_is_excluded() {
        let pos = Position::new_from_fen("4k3/8/8/8/8/5b2/8/4K2R w K - 0 1", false).unwrap();
        let mut list = MoveList::new();
        generate_moves(&pos, &mut list, false);
        assert!(!list.as_slice().iter().any(|m| m.is_castle()));
    }
}
