//! Standalone `perft divide` utility, for verifying the move generator
//! against known node counts outside the UCI loop.

use std::env;
use std::time::Instant;

use corvid::board::Position;
use corvid::movegen::perft_divide;

fn main() {
    let args: Vec<String> = env::args().collect();
    let depth: u32 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(5);
    let fen = args.get(2).map(String::as_str).unwrap_or("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    let frc = args.iter().any(|a| a == "--frc");

    let pos = match Position::new_from_fen(fen, frc) {
        Ok(pos) => pos,
        Err(e) => {
            eprintln!("invalid FEN '{fen}': {e}");
            std::process::exit(1);
        }
    };

    println!("perft divide depth {depth}");
    let start = Instant::now();
    let mut divide = perft_divide(&pos, depth);
    divide.sort_by_key(|(m, _)| m.bits());
    let mut total = 0u64;
    for (m, count) in &divide {
        println!("  {}: {}", m.to_uci(frc), count);
        total += count;
    }
    let elapsed = start.elapsed();
    println!("Total: {total} in {elapsed:?}");
}
