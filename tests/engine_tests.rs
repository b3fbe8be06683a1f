//! End-to-end tests exercising the public crate surface: move generation
//! node counts, incremental-hash-vs-rebuilt-from-FEN agreement, and a
//! handful of the concrete scenarios a UCI-driven game would hit.

use corvid::board::Position;
use corvid::movegen::{generate_moves, perft};
use corvid::moves::MoveList;
use corvid::uci::{parse_uci_move, try_parse_position_command};

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
const ENDGAME: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";

#[test]
fn startpos_has_twenty_legal_moves_at_depth_one() {
    let pos = Position::startpos();
    assert_eq!(perft(&pos, 1), 20);
}

#[test]
fn kiwipete_perft_depth_three_matches_the_known_node_count() {
    let pos = Position::new_from_fen(KIWIPETE, false).unwrap();
    assert_eq!(perft(&pos, 3), 97862);
}

#[test]
fn endgame_position_perft_depth_three_matches_the_known_node_count() {
    let pos = Position::new_from_fen(ENDGAME, false).unwrap();
    assert_eq!(perft(&pos, 3), 2812);
}

#[test]
fn zobrist_key_after_a_move_sequence_matches_a_key_rebuilt_from_fen() {
    let parts: Vec<&str> = "position startpos moves e2e4 c7c5 g1f3 d7d6 d2d4 c5d4".split_whitespace().collect();
    let pos = try_parse_position_command(&parts, false).unwrap();
    let rebuilt = Position::new_from_fen(&pos.to_fen(), false).unwrap();
    assert_eq!(pos.z_key(), rebuilt.z_key());
    assert_eq!(pos.pawn_key(), rebuilt.pawn_key());
    assert_eq!(pos.piece_count_key(), rebuilt.piece_count_key());
}

#[test]
fn halfmove_clock_resets_on_pawn_push_and_increments_otherwise() {
    let parts: Vec<&str> = "position startpos moves g1f3 g8f6 f3g1 f6g8".split_whitespace().collect();
    let pos = try_parse_position_command(&parts, false).unwrap();
    assert_eq!(pos.halfmove_clock(), 4);

    let parts: Vec<&str> = "position startpos moves e2e4".split_whitespace().collect();
    let pos = try_parse_position_command(&parts, false).unwrap();
    assert_eq!(pos.halfmove_clock(), 0);
}

#[test]
fn bare_kings_is_detected_as_insufficient_material() {
    let pos = Position::new_from_fen("8/8/4k3/8/8/3K4/8/8 w - - 0 1", false).unwrap();
    assert!(pos.is_insufficient_material());
}

#[test]
fn en_passant_target_does_not_imply_a_legal_capture_exists() {
    // After 1. e4 a6 2. e5 f5, the en passant target square is set but no
    // black pawn sits on an adjacent file able to capture onto it.
    let parts: Vec<&str> = "position startpos moves e2e4 a7a6 e4e5 f7f5".split_whitespace().collect();
    let pos = try_parse_position_command(&parts, false).unwrap();
    assert!(!pos.en_passant_target().is_empty());

    let mut list = MoveList::new();
    generate_moves(&pos, &mut list, false);
    assert!(list.as_slice().iter().all(|m| !m.is_en_passant()));
}

#[test]
fn frc_castling_move_uses_the_rooks_origin_square_in_its_notation() {
    // King on e1, rook on h1: an FRC-notation kingside castle is "e1h1".
    let pos = Position::new_from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", true).unwrap();
    let mv = parse_uci_move(&pos, "e1h1").expect("frc kingside castle should parse");
    assert!(mv.is_castle());
}

#[test]
fn move_picker_and_move_generator_agree_on_the_legal_move_count() {
    let pos = Position::new_from_fen(KIWIPETE, false).unwrap();
    let mut list = MoveList::new();
    generate_moves(&pos, &mut list, false);
    assert_eq!(list.len(), 48);
}
