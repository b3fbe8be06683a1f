//! UCI `option` declarations and `setoption` handling (spec.md §6
//! "Options"; bounds from SPEC_FULL.md §A / `original_source/src/defs.h`).

pub const MIN_HASH_MB: usize = 8;
pub const MAX_HASH_MB: usize = 65536;
pub const DEFAULT_HASH_MB: usize = 16;
pub const MIN_THREADS: usize = 1;
pub const MAX_THREADS: usize = 256;

fn print_spin(name: &str, default: impl std::fmt::Display, min: impl std::fmt::Display, max: impl std::fmt::Display) {
    println!("option name {name} type spin default {default} min {min} max {max}");
}

fn print_check(name: &str, default: bool) {
    println!("option name {name} type check default {}", if default { "true" } else { "false" });
}

fn print_string(name: &str, default: &str) {
    println!("option name {name} type string default {default}");
}

pub enum OptionAction {
    ReinitHash(usize),
    SetThreads(usize),
}

/// `OwnBook`/`BookPath` are declared for UCI-compatibility but never
/// consulted — the opening book is out of scope (spec.md §1 Non-goals).
pub struct EngineOptions {
    pub hash_mb: usize,
    pub threads: usize,
    pub chess960: bool,
    pub own_book: bool,
    pub book_path: String,
}

impl EngineOptions {
    #[must_use]
    pub fn new() -> Self {
        EngineOptions { hash_mb: DEFAULT_HASH_MB, threads: MIN_THREADS, chess960: false, own_book: false, book_path: String::new() }
    }

    pub fn print_uci_info(&self) {
        println!("id name Corvid");
        println!("id author the corvid authors");
        print_spin("Hash", self.hash_mb, MIN_HASH_MB, MAX_HASH_MB);
        print_spin("Threads", self.threads, MIN_THREADS, MAX_THREADS);
        print_check("OwnBook", self.own_book);
        print_string("BookPath", &self.book_path);
        print_check("UCI_Chess960", self.chess960);
        println!("uciok");
    }

    /// Applies `setoption name <name> value <value>`; `parts` is the full
    /// whitespace-split command including the leading `setoption` token.
    pub fn apply(&mut self, parts: &[&str]) -> Option<OptionAction> {
        let name_idx = parts.iter().position(|&p| p == "name")? + 1;
        let value_idx = parts.iter().position(|&p| p == "value");
        let name_end = value_idx.unwrap_or(parts.len());
        if name_idx >= name_end {
            return None;
        }
        let name = parts[name_idx..name_end].join(" ");
        let value = value_idx.map(|i| parts[i + 1..].join(" "));

        match name.to_ascii_lowercase().as_str() {
            "hash" => {
                let mb = value.as_deref().and_then(|v| v.parse::<usize>().ok()).unwrap_or(DEFAULT_HASH_MB).clamp(MIN_HASH_MB, MAX_HASH_MB);
                if mb != self.hash_mb {
                    self.hash_mb = mb;
                    return Some(OptionAction::ReinitHash(mb));
                }
            }
            "threads" => {
                let threads = value.as_deref().and_then(|v| v.parse::<usize>().ok()).unwrap_or(MIN_THREADS).clamp(MIN_THREADS, MAX_THREADS);
                if threads != self.threads {
                    self.threads = threads;
                    return Some(OptionAction::SetThreads(threads));
                }
            }
            "ownbook" => {
                self.own_book = value.as_deref() == Some("true");
            }
            "bookpath" => {
                self.book_path = value.unwrap_or_default();
            }
            "uci_chess960" => {
                self.chess960 = value.as_deref() == Some("true");
            }
            _ => {}
        }
        None
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_clamped_to_the_documented_range() {
        let mut opts = EngineOptions::new();
        let parts: Vec<&str> = "setoption name Hash value 999999".split_whitespace().collect();
        let action = opts.apply(&parts);
        assert_eq!(opts.hash_mb, MAX_HASH_MB);
        assert!(matches!(action, Some(OptionAction::ReinitHash(mb)) if mb == MAX_HASH_MB));
    }

    #[test]
    fn threads_below_one_clamps_to_one() {
        let mut opts = EngineOptions::new();
        let parts: Vec<&str> = "setoption name Threads value 0".split_whitespace().collect();
        opts.apply(&parts);
        assert_eq!(opts.threads, MIN_THREADS);
    }

    #[test]
    fn unknown_option_is_ignored() {
        let mut opts = EngineOptions::new();
        let parts: Vec<&str> = "setoption name Ponder value true".split_whitespace().collect();
        assert!(opts.apply(&parts).is_none());
    }
}
