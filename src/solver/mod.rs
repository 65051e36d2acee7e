use crate::board::Connectivity;
use crate::error::SearchError;
use crate::heuristic::HeuristicKind;
use crate::path::Path;
use core::fmt;
use std::time::Duration;

pub mod astar;
pub mod incremental;

pub use astar::SearchEngine;
pub use incremental::{IncrementalSearch, StepResult};

/// Per-run search settings.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct SearchConfig {
    pub heuristic: HeuristicKind,
    pub connectivity: Connectivity,
    /// Consult connected components before searching and report an unreachable goal without
    /// expanding any cell.
    pub reachability_precheck: bool,
}

impl SearchConfig {
    pub fn new(heuristic: HeuristicKind, connectivity: Connectivity) -> SearchConfig {
        SearchConfig {
            heuristic,
            connectivity,
            reachability_precheck: false,
        }
    }

    pub fn with_heuristic(mut self, heuristic: HeuristicKind) -> SearchConfig {
        self.heuristic = heuristic;
        self
    }

    pub fn with_connectivity(mut self, connectivity: Connectivity) -> SearchConfig {
        self.connectivity = connectivity;
        self
    }

    pub fn with_reachability_precheck(mut self, precheck: bool) -> SearchConfig {
        self.reachability_precheck = precheck;
        self
    }

    /// Rejects heuristics that may overestimate under the configured connectivity, which would
    /// void the optimality of the returned path.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.heuristic.is_admissible_for(self.connectivity) {
            Ok(())
        } else {
            Err(SearchError::InadmissibleHeuristic {
                heuristic: self.heuristic,
                connectivity: self.connectivity,
            })
        }
    }
}

/// Lifecycle of a search run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SearchState {
    #[default]
    Idle,
    Running,
    Found,
    Exhausted,
    Cancelled,
}

impl SearchState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SearchState::Found | SearchState::Exhausted | SearchState::Cancelled
        )
    }
}

/// Counters collected during a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SearchStatistics {
    /// Cells popped from the open set and expanded (or path heads advanced, incrementally).
    pub nodes_expanded: usize,
    /// Pushes onto the open set, reopenings included.
    pub nodes_generated: usize,
    /// Open cells whose f-score was lowered in place after a cheaper route was found.
    pub nodes_updated: usize,
    /// Closed cells moved back to the open set after a cheaper route was found.
    pub nodes_reopened: usize,
    pub elapsed: Duration,
}

impl fmt::Display for SearchStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Search Statistics:")?;
        writeln!(f, "  Nodes Expanded: {}", self.nodes_expanded)?;
        writeln!(f, "  Nodes Generated: {}", self.nodes_generated)?;
        writeln!(f, "  Nodes Updated: {}", self.nodes_updated)?;
        writeln!(f, "  Nodes Reopened: {}", self.nodes_reopened)?;
        writeln!(f, "  Elapsed (secs): {:.6}", self.elapsed.as_secs_f64())
    }
}

/// Terminal result of a search run.
#[derive(Clone, Debug, PartialEq)]
pub enum SearchOutcome {
    Found {
        path: Path,
        statistics: SearchStatistics,
    },
    /// The open set emptied without reaching the goal: no path exists.
    Exhausted { statistics: SearchStatistics },
    Cancelled { statistics: SearchStatistics },
}

impl SearchOutcome {
    pub fn path(&self) -> Option<&Path> {
        match self {
            SearchOutcome::Found { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn cost(&self) -> Option<f64> {
        self.path().map(|p| p.cost)
    }

    pub fn is_found(&self) -> bool {
        matches!(self, SearchOutcome::Found { .. })
    }

    pub fn statistics(&self) -> &SearchStatistics {
        match self {
            SearchOutcome::Found { statistics, .. }
            | SearchOutcome::Exhausted { statistics }
            | SearchOutcome::Cancelled { statistics } => statistics,
        }
    }

    pub fn nodes_expanded(&self) -> usize {
        self.statistics().nodes_expanded
    }

    pub fn state(&self) -> SearchState {
        match self {
            SearchOutcome::Found { .. } => SearchState::Found,
            SearchOutcome::Exhausted { .. } => SearchState::Exhausted,
            SearchOutcome::Cancelled { .. } => SearchState::Cancelled,
        }
    }
}
