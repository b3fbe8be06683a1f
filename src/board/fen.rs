//! FEN parsing and serialization, including Chess960 castling letters.

use crate::types::{Bitboard, Color, PieceType, Square};

use super::error::FenError;
use super::Position;

impl Position {
    /// Parses a FEN string. `frc` selects Chess960 castling-field
    /// interpretation: `KQkq` is parsed the same way in both modes (scan
    /// for the outermost rook on each side of the king), but `frc` also
    /// accepts file letters `A`-`H` / `a`-`h` naming the castling rook's
    /// file directly (spec.md §4.C).
    pub fn new_from_fen(fen: &str, frc: bool) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(FenError::TooFewParts { found: parts.len() });
        }

        let mut pos = Position::empty(frc);

        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::InvalidRank { rank: ranks.len() });
        }
        for (rank_from_top, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - rank_from_top as u8;
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10) {
                    file += skip as u8;
                } else {
                    if file >= 8 {
                        return Err(FenError::TooManyFiles {
                            rank: rank as usize,
                            files: file as usize + 1,
                        });
                    }
                    let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
                    let piece = PieceType::from_char(c).ok_or(FenError::InvalidPiece { char: c })?;
                    pos.add_piece(color, piece, Square::from_rank_file(rank, file));
                    file += 1;
                }
            }
            if file != 8 {
                return Err(FenError::TooManyFiles { rank: rank as usize, files: file as usize });
            }
        }

        match parts[1] {
            "w" => {}
            "b" => pos.flip_side_to_move(),
            other => return Err(FenError::InvalidSideToMove { found: other.to_string() }),
        }

        parse_castling(&mut pos, parts[2])?;

        if parts[3] != "-" {
            let sq: Square = parts[3]
                .parse()
                .map_err(|_| FenError::InvalidEnPassant { found: parts[3].to_string() })?;
            pos.set_en_passant(Bitboard::from_square(sq));
        }

        pos.halfmove_clock = parts.get(4).and_then(|s| s.parse().ok()).unwrap_or(0);
        let fullmove: u32 = parts.get(5).and_then(|s| s.parse().ok()).unwrap_or(1);
        pos.ply = fullmove.saturating_sub(1) * 2 + if pos.side_to_move == Color::Black { 1 } else { 0 };

        if pos.pieces(Color::White, PieceType::King).is_empty() {
            return Err(FenError::MissingKing { color: "white" });
        }
        if pos.pieces(Color::Black, PieceType::King).is_empty() {
            return Err(FenError::MissingKing { color: "black" });
        }

        pos.repetitions.increment(pos.z_key);
        Ok(pos)
    }

    #[must_use]
    pub fn to_fen(&self) -> String {
        let mut s = String::new();
        for rank_from_top in 0..8u8 {
            let rank = 7 - rank_from_top;
            let mut empty_run = 0u32;
            for file in 0..8u8 {
                match self.piece_at(Square::from_rank_file(rank, file)) {
                    None => empty_run += 1,
                    Some((color, piece)) => {
                        if empty_run > 0 {
                            s.push_str(&empty_run.to_string());
                            empty_run = 0;
                        }
                        let ch = piece.to_char();
                        s.push(if color == Color::White { ch.to_ascii_uppercase() } else { ch });
                    }
                }
            }
            if empty_run > 0 {
                s.push_str(&empty_run.to_string());
            }
            if rank_from_top != 7 {
                s.push('/');
            }
        }
        s.push(' ');
        s.push(if self.side_to_move == Color::White { 'w' } else { 'b' });
        s.push(' ');
        s.push_str(&self.castling_field());
        s.push(' ');
        match self.en_passant_target.lsb() {
            Some(sq) => s.push_str(&sq.to_string()),
            None => s.push('-'),
        }
        s.push_str(&format!(" {} {}", self.halfmove_clock, self.ply / 2 + 1));
        s
    }

    fn castling_field(&self) -> String {
        let mut field = String::new();
        for (color, upper) in [(Color::White, true), (Color::Black, false)] {
            let mut rooks: Vec<Square> = self.castling_rights.rook_squares(color).into_iter().collect();
            rooks.sort_by_key(|sq| sq.file());
            let king_file = self.king_square(color).file();
            let kingside = rooks.iter().rev().find(|sq| sq.file() > king_file);
            let queenside = rooks.iter().find(|sq| sq.file() < king_file);
            if let Some(sq) = kingside {
                field.push(letter_for(*sq, self.frc_mode, upper, true));
            }
            if let Some(sq) = queenside {
                field.push(letter_for(*sq, self.frc_mode, upper, false));
            }
        }
        if field.is_empty() {
            field.push('-');
        }
        field
    }
}

fn letter_for(sq: Square, frc: bool, upper: bool, kingside: bool) -> char {
    let c = if frc {
        (b'a' + sq.file()) as char
    } else if kingside {
        'k'
    } else {
        'q'
    };
    if upper {
        c.to_ascii_uppercase()
    } else {
        c
    }
}

fn parse_castling(pos: &mut Position, field: &str) -> Result<(), FenError> {
    if field == "-" {
        return Ok(());
    }
    for c in field.chars() {
        let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
        let king_file = pos.king_square(color).file();
        let rank = if color == Color::White { 0 } else { 7 };
        let rook_sq = match c.to_ascii_lowercase() {
            'k' => find_rook(pos, color, rank, king_file, true).ok_or(FenError::InvalidCastling { char: c })?,
            'q' => find_rook(pos, color, rank, king_file, false).ok_or(FenError::InvalidCastling { char: c })?,
            letter @ 'a'..='h' => Square::from_rank_file(rank, letter as u8 - b'a'),
            _ => return Err(FenError::InvalidCastling { char: c }),
        };
        pos.set_castling_right(rook_sq);
    }
    Ok(())
}

fn find_rook(pos: &Position, color: Color, rank: u8, king_file: u8, kingside: bool) -> Option<Square> {
    let rooks = pos.pieces(color, PieceType::Rook);
    let mut candidates: Vec<Square> = rooks
        .into_iter()
        .filter(|sq| sq.rank() == rank)
        .filter(|sq| if kingside { sq.file() > king_file } else { sq.file() < king_file })
        .collect();
    candidates.sort_by_key(|sq| sq.file());
    if kingside {
        candidates.into_iter().next_back()
    } else {
        candidates.into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_round_trips() {
        let pos = Position::startpos();
        assert_eq!(pos.to_fen(), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    }

    #[test]
    fn kiwipete_round_trips() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let pos = Position::new_from_fen(fen, false).unwrap();
        assert_eq!(pos.to_fen(), fen);
    }

    #[test]
    fn missing_king_is_rejected() {
        let err = Position::new_from_fen("8/8/8/8/8/8/8/8 w - - 0 1", false).unwrap_err();
        assert_eq!(err, FenError::MissingKing { color: "white" });
    }
}
