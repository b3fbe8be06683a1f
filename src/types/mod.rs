//! Core chess primitives: squares, colors, piece types, bitboards.

pub mod bitboard;
mod castling;
mod piece;
mod square;

pub use bitboard::Bitboard;
pub use castling::CastlingRights;
pub use piece::{Color, PieceType, ALL_PIECE_TYPES, PHASE_SUM};
pub use square::{Square, SquareParseError};
