//! Universal Chess Interface loop (spec.md §6 "External Interfaces").
//!
//! Reads commands from stdin on the main thread and runs each `go` on a
//! dedicated thread so `stop`/`quit` keep working while a search is in
//! flight — `Engine::search` itself blocks until every worker stops.

pub mod command;
pub mod options;

use std::fmt;
use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::board::{FenError, Position};
use crate::engine::Engine;
use crate::moves::{Move, MoveList};
use crate::movegen::generate_moves;
use crate::nnue::NnueNetwork;
use crate::search::constants::{is_mate_score, mate_in, MATE_SCORE};
use crate::search::{SearchLimits, SearchStats};
use crate::tt::TranspositionTable;

use command::{parse_go_params, parse_uci_command, UciCommand};
use options::{EngineOptions, OptionAction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveParseError {
    InvalidLength { len: usize },
    IllegalMove { notation: String },
}

impl fmt::Display for MoveParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveParseError::InvalidLength { len } => write!(f, "move must be 4-5 characters, found {len}"),
            MoveParseError::IllegalMove { notation } => write!(f, "illegal move '{notation}'"),
        }
    }
}

impl std::error::Error for MoveParseError {}

#[derive(Debug, Clone)]
pub enum UciError {
    InvalidFen(FenError),
    InvalidMove { move_str: String, error: MoveParseError },
    MissingParts,
}

impl fmt::Display for UciError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UciError::InvalidFen(e) => write!(f, "invalid FEN: {e}"),
            UciError::InvalidMove { move_str, error } => write!(f, "invalid move '{move_str}': {error}"),
            UciError::MissingParts => write!(f, "missing required parts in command"),
        }
    }
}

impl std::error::Error for UciError {}

impl From<FenError> for UciError {
    fn from(e: FenError) -> Self {
        UciError::InvalidFen(e)
    }
}

/// Parses a UCI move string by generating every legal move from `pos`
/// and matching its own notation against `s` — avoids duplicating the
/// castling/FRC encoding rules that [`Move::to_uci`] already knows.
pub fn parse_uci_move(pos: &Position, s: &str) -> Result<Move, MoveParseError> {
    if !(4..=5).contains(&s.len()) {
        return Err(MoveParseError::InvalidLength { len: s.len() });
    }
    let mut list = MoveList::new();
    generate_moves(pos, &mut list, false);
    for &m in list.as_slice() {
        if m.to_uci(pos.frc_mode()) == s {
            let mut after = pos.clone();
            if after.do_move(m) {
                return Ok(m);
            }
        }
    }
    Err(MoveParseError::IllegalMove { notation: s.to_string() })
}

#[must_use]
pub fn format_uci_move(m: Move, frc: bool) -> String {
    m.to_uci(frc)
}

/// Parses `position [startpos|fen ...] [moves ...]`.
pub fn try_parse_position_command(parts: &[&str], frc: bool) -> Result<Position, UciError> {
    let mut i = 1;
    if i >= parts.len() {
        return Err(UciError::MissingParts);
    }
    let mut pos = if parts[i] == "startpos" {
        i += 1;
        Position::startpos()
    } else if parts[i] == "fen" {
        if i + 6 >= parts.len() {
            return Err(UciError::MissingParts);
        }
        let fen = parts[i + 1..i + 7].join(" ");
        i += 7;
        Position::new_from_fen(&fen, frc)?
    } else {
        return Err(UciError::MissingParts);
    };

    if i < parts.len() && parts[i] == "moves" {
        i += 1;
        while i < parts.len() {
            let mv = parse_uci_move(&pos, parts[i]).map_err(|e| UciError::InvalidMove { move_str: parts[i].to_string(), error: e })?;
            pos.do_move(mv);
            i += 1;
        }
    }
    Ok(pos)
}

fn format_score(score: i32) -> String {
    if is_mate_score(score) {
        let ply_to_mate = MATE_SCORE - score.abs();
        let moves_to_mate = (ply_to_mate + 1) / 2;
        if score > 0 {
            format!("mate {moves_to_mate}")
        } else {
            format!("mate -{moves_to_mate}")
        }
    } else {
        format!("cp {score}")
    }
}

fn print_info(stats: &SearchStats, pv: &[Move], frc: bool, start: Instant) {
    let elapsed = start.elapsed();
    let nps = if elapsed.as_secs_f64() > 0.0 { (stats.nodes as f64 / elapsed.as_secs_f64()) as u64 } else { 0 };
    let pv_str = pv.iter().map(|m| m.to_uci(frc)).collect::<Vec<_>>().join(" ");
    println!(
        "info depth {} seldepth {} nodes {} score {} nps {} time {} pv {}",
        stats.depth,
        stats.seldepth,
        stats.nodes,
        format_score(stats.score),
        nps,
        elapsed.as_millis(),
        pv_str
    );
}

fn go_limits(params: &command::GoParams, side_white: bool) -> SearchLimits {
    SearchLimits {
        depth: params.depth,
        nodes: params.nodes,
        movetime: params.movetime,
        time_left: if side_white { params.wtime } else { params.btime },
        increment: (if side_white { params.winc } else { params.binc }).unwrap_or_default(),
        moves_to_go: params.movestogo,
        infinite: params.infinite,
    }
}

const BENCH_FENS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
    "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
];

/// Runs the supplemented `bench` command (SPEC_FULL.md §B, grounded in
/// `original_source/src/bench.cc`): a fixed-depth, single-threaded search
/// over a small, deterministic position set, reporting total nodes and
/// nodes/second. Used to spot node-count regressions between builds.
pub fn run_bench(depth: u32, network: Arc<NnueNetwork>) {
    let start = Instant::now();
    let mut total_nodes = 0u64;
    for fen in BENCH_FENS {
        let pos = Position::new_from_fen(fen, false).expect("bench FEN is well-formed");
        let tt = Arc::new(TranspositionTable::new(options::DEFAULT_HASH_MB));
        let engine = Engine::new(tt, Arc::clone(&network), 1);
        let stop = Arc::new(AtomicBool::new(false));
        let result = engine.search(&pos, SearchLimits::fixed_depth(depth), stop, None);
        total_nodes += result.stats.nodes;
    }
    let elapsed = start.elapsed();
    let nps = if elapsed.as_secs_f64() > 0.0 { (total_nodes as f64 / elapsed.as_secs_f64()) as u64 } else { 0 };
    println!("Nodes searched: {total_nodes}");
    println!("Nodes/second: {nps}");
}

pub struct UciLoop {
    pos: Position,
    options: EngineOptions,
    tt: Arc<TranspositionTable>,
    network: Arc<NnueNetwork>,
    /// Owns the ordering-table pool across successive `go`s so history,
    /// killers, and counter-moves persist for the life of a game (spec.md
    /// §3 "History lifecycle"). Shared with the search thread via `Arc`
    /// since `handle_go` hands it off rather than blocking on it.
    engine: Arc<Engine>,
    stop: Arc<AtomicBool>,
    search_thread: Option<JoinHandle<()>>,
}

impl UciLoop {
    #[must_use]
    pub fn new(network: Arc<NnueNetwork>) -> Self {
        let options = EngineOptions::new();
        let tt = Arc::new(TranspositionTable::new(options.hash_mb));
        let engine = Arc::new(Engine::new(Arc::clone(&tt), Arc::clone(&network), options.threads));
        UciLoop { pos: Position::startpos(), options, tt, network, engine, stop: Arc::new(AtomicBool::new(false)), search_thread: None }
    }

    fn join_search(&mut self) {
        if let Some(handle) = self.search_thread.take() {
            let _ = handle.join();
        }
    }

    /// Reads commands from stdin until `quit` or EOF.
    pub fn run(&mut self) {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let Some(cmd) = parse_uci_command(&line) else { continue };
            match cmd {
                UciCommand::Uci => self.options.print_uci_info(),
                UciCommand::IsReady => println!("readyok"),
                UciCommand::UciNewGame => {
                    self.join_search();
                    self.engine.new_game();
                    self.pos = Position::startpos();
                }
                UciCommand::Position(parts) => {
                    let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
                    match try_parse_position_command(&refs, self.options.chess960) {
                        Ok(pos) => self.pos = pos,
                        Err(e) => eprintln!("info string {e}"),
                    }
                }
                UciCommand::Go(parts) => self.handle_go(&parts),
                UciCommand::SetOption(parts) => self.handle_setoption(&parts),
                UciCommand::Bench(parts) => {
                    let depth = parts.get(1).and_then(|s| s.parse::<u32>().ok()).unwrap_or(10);
                    run_bench(depth, Arc::clone(&self.network));
                }
                UciCommand::Stop => self.stop.store(true, Ordering::Relaxed),
                UciCommand::Quit => {
                    self.stop.store(true, Ordering::Relaxed);
                    self.join_search();
                    break;
                }
                UciCommand::Unknown(s) => eprintln!("info string unknown command '{s}'"),
            }
        }
    }

    fn handle_setoption(&mut self, parts: &[String]) {
        let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
        match self.options.apply(&refs) {
            Some(OptionAction::ReinitHash(mb)) => {
                self.tt = Arc::new(TranspositionTable::new(mb));
                // A hash resize rebuilds the engine on the new table; its
                // ordering pool starts fresh too, same as `ucinewgame`.
                self.engine = Arc::new(Engine::new(Arc::clone(&self.tt), Arc::clone(&self.network), self.options.threads));
            }
            Some(OptionAction::SetThreads(n)) => self.engine.set_threads(n),
            None => {}
        }
    }

    fn handle_go(&mut self, parts: &[String]) {
        self.join_search();
        self.stop.store(false, Ordering::Relaxed);

        let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
        let params = parse_go_params(&refs);
        let side_white = self.pos.side_to_move() == crate::types::Color::White;
        let limits = go_limits(&params, side_white);
        let frc = self.options.chess960;

        let pos = self.pos.clone();
        let engine = Arc::clone(&self.engine);
        let stop = Arc::clone(&self.stop);

        self.search_thread = Some(thread::spawn(move || {
            let start = Instant::now();
            let sink: Box<dyn FnMut(&SearchStats, &[Move]) + Send> = Box::new(move |stats, pv| print_info(stats, pv, frc, start));
            let result = engine.search(&pos, limits, stop, Some(sink));
            let best = format_uci_move(result.best_move, frc);
            match result.ponder_move {
                Some(p) => println!("bestmove {best} ponder {}", format_uci_move(p, frc)),
                None => println!("bestmove {best}"),
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn startpos_with_moves_reaches_the_expected_position() {
        let parts: Vec<&str> = "position startpos moves e2e4 e7e5".split_whitespace().collect();
        let pos = try_parse_position_command(&parts, false).unwrap();
        assert_eq!(pos.ply(), 2);
    }

    #[test]
    fn illegal_move_in_move_list_is_rejected() {
        let parts: Vec<&str> = "position startpos moves e2e5".split_whitespace().collect();
        assert!(try_parse_position_command(&parts, false).is_err());
    }

    #[test]
    fn mate_score_formats_as_mate_in_moves() {
        assert_eq!(format_score(mate_in(1)), "mate 1");
    }

    #[test]
    fn cp_score_formats_as_centipawns() {
        assert_eq!(format_score(37), "cp 37");
    }
}
