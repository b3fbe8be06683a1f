//! Minimal time manager (spec.md §1 Non-goals: "the time manager beyond
//! the contract it presents to the search"). This implements only the
//! `check_limits`/`should_stop_iteration` contract with simple,
//! non-authoritative heuristics — not a faithful reproduction of any
//! particular engine's time management, which is explicitly out of scope.

use std::time::{Duration, Instant};

/// Per-`go` search limits, translated from the UCI `go` parameters
/// (spec.md §6) into a form the time manager can budget against.
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchLimits {
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
    pub movetime: Option<Duration>,
    pub time_left: Option<Duration>,
    pub increment: Duration,
    pub moves_to_go: Option<u32>,
    pub infinite: bool,
}

impl SearchLimits {
    #[must_use]
    pub fn fixed_depth(depth: u32) -> Self {
        SearchLimits { depth: Some(depth), ..Default::default() }
    }
}

pub struct TimeManager {
    start: Instant,
    hard_deadline: Option<Instant>,
    soft_budget: Option<Duration>,
    limits: SearchLimits,
}

impl TimeManager {
    #[must_use]
    pub fn new(limits: SearchLimits, start: Instant) -> Self {
        let hard_deadline = if limits.infinite {
            None
        } else if let Some(mt) = limits.movetime {
            Some(start + mt)
        } else {
            limits.time_left.map(|t| start + Self::allotment(t, limits.increment, limits.moves_to_go))
        };
        let soft_budget = hard_deadline.map(|d| d.saturating_duration_since(start) * 6 / 10);
        TimeManager { start, hard_deadline, soft_budget, limits }
    }

    fn allotment(time_left: Duration, increment: Duration, moves_to_go: Option<u32>) -> Duration {
        let divisor = moves_to_go.unwrap_or(30).max(1);
        let base = time_left / divisor;
        (base + increment / 2).min(time_left.saturating_sub(Duration::from_millis(50)))
    }

    /// Hard stop: called roughly every `NODE_CHECK_INTERVAL` nodes mid-search.
    #[must_use]
    pub fn check_limits(&self, nodes: u64) -> bool {
        if let Some(n) = self.limits.nodes {
            if nodes >= n {
                return true;
            }
        }
        if let Some(deadline) = self.hard_deadline {
            return Instant::now() >= deadline;
        }
        false
    }

    /// Soft stop between iterative-deepening iterations: given the depth
    /// just completed, total elapsed time, nodes searched, and nodes spent
    /// on the current best move, should the next iteration even start?
    /// (spec.md §4.J step 3 / §5 "advisory" timer contract.)
    #[must_use]
    pub fn should_stop_iteration(&self, depth: u32, nodes: u64, nodes_on_best_move: u64) -> bool {
        if let Some(target) = self.limits.depth {
            if depth >= target {
                return true;
            }
        }
        if let Some(n) = self.limits.nodes {
            if nodes >= n {
                return true;
            }
        }
        if self.limits.infinite {
            return false;
        }
        let Some(soft) = self.soft_budget else { return false };
        let elapsed = self.start.elapsed();
        if elapsed >= soft {
            return true;
        }
        // A move that swallowed most of the node budget ("sticky" best
        // move) is unlikely to need the full next iteration's time; scale
        // the remaining soft budget down proportionally.
        if nodes > 0 {
            let fraction = nodes_on_best_move as f64 / nodes as f64;
            if fraction > 0.9 && elapsed.as_secs_f64() > soft.as_secs_f64() * 0.4 {
                return true;
            }
        }
        false
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_depth_stops_exactly_at_target() {
        let tm = TimeManager::new(SearchLimits::fixed_depth(5), Instant::now());
        assert!(!tm.should_stop_iteration(4, 1000, 100));
        assert!(tm.should_stop_iteration(5, 1000, 100));
    }

    #[test]
    fn node_limit_triggers_hard_stop() {
        let limits = SearchLimits { nodes: Some(1000), ..Default::default() };
        let tm = TimeManager::new(limits, Instant::now());
        assert!(!tm.check_limits(999));
        assert!(tm.check_limits(1000));
    }

    #[test]
    fn infinite_search_never_soft_stops_without_depth_or_node_cap() {
        let limits = SearchLimits { infinite: true, ..Default::default() };
        let tm = TimeManager::new(limits, Instant::now());
        assert!(!tm.should_stop_iteration(50, 10_000_000, 1));
    }
}
