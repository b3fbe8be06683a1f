//! UCI command-line parsing (spec.md §6 "Commands consumed").

use std::time::Duration;

#[derive(Debug, Clone)]
pub enum UciCommand {
    Uci,
    IsReady,
    UciNewGame,
    Position(Vec<String>),
    Go(Vec<String>),
    SetOption(Vec<String>),
    Bench(Vec<String>),
    Stop,
    Quit,
    Unknown(String),
}

#[derive(Default, Debug, Clone)]
pub struct GoParams {
    pub wtime: Option<Duration>,
    pub btime: Option<Duration>,
    pub winc: Option<Duration>,
    pub binc: Option<Duration>,
    pub movetime: Option<Duration>,
    pub movestogo: Option<u32>,
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
    pub infinite: bool,
}

#[inline]
fn parse_next<T: std::str::FromStr>(parts: &[&str], i: usize) -> Option<T> {
    parts.get(i + 1).and_then(|v| v.parse::<T>().ok())
}

fn parse_next_ms(parts: &[&str], i: usize) -> Option<Duration> {
    parse_next::<u64>(parts, i).map(Duration::from_millis)
}

#[must_use]
pub fn parse_go_params(parts: &[&str]) -> GoParams {
    let mut params = GoParams::default();
    let mut i = 1;
    while i < parts.len() {
        let consumed = match parts[i] {
            "wtime" => {
                params.wtime = parse_next_ms(parts, i);
                2
            }
            "btime" => {
                params.btime = parse_next_ms(parts, i);
                2
            }
            "winc" => {
                params.winc = parse_next_ms(parts, i);
                2
            }
            "binc" => {
                params.binc = parse_next_ms(parts, i);
                2
            }
            "movetime" => {
                params.movetime = parse_next_ms(parts, i);
                2
            }
            "movestogo" => {
                params.movestogo = parse_next(parts, i);
                2
            }
            "nodes" => {
                params.nodes = parse_next(parts, i);
                2
            }
            "depth" => {
                params.depth = parse_next(parts, i);
                2
            }
            "infinite" => {
                params.infinite = true;
                1
            }
            _ => 1,
        };
        i += consumed;
    }
    params
}

#[must_use]
pub fn parse_uci_command(line: &str) -> Option<UciCommand> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    if parts.is_empty() {
        return None;
    }
    let owned_parts = || parts.iter().map(|p| (*p).to_string()).collect::<Vec<String>>();

    let cmd = match parts[0] {
        "uci" => UciCommand::Uci,
        "isready" => UciCommand::IsReady,
        "ucinewgame" => UciCommand::UciNewGame,
        "position" => UciCommand::Position(owned_parts()),
        "go" => UciCommand::Go(owned_parts()),
        "setoption" => UciCommand::SetOption(owned_parts()),
        "bench" => UciCommand::Bench(owned_parts()),
        "stop" => UciCommand::Stop,
        "quit" => UciCommand::Quit,
        _ => UciCommand::Unknown(trimmed.to_string()),
    };
    Some(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn go_params_parses_time_controls() {
        let parts: Vec<&str> = "go wtime 1000 btime 2000 winc 5 binc 10 movestogo 30".split_whitespace().collect();
        let params = parse_go_params(&parts);
        assert_eq!(params.wtime, Some(Duration::from_millis(1000)));
        assert_eq!(params.btime, Some(Duration::from_millis(2000)));
        assert_eq!(params.movestogo, Some(30));
    }

    #[test]
    fn unknown_command_is_preserved_verbatim() {
        match parse_uci_command("xyzzy 1 2 3") {
            Some(UciCommand::Unknown(s)) => assert_eq!(s, "xyzzy 1 2 3"),
            other => panic!("expected Unknown, got {other:?}"),
        }
    }
}
