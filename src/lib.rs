//! # grid_astar
//!
//! Shortest path search on a rectangular grid of start, goal, empty and obstacle cells. Implements
//! [A*](https://en.wikipedia.org/wiki/A*_search_algorithm) with a choice of
//! [HeuristicKind]s (the zero heuristic turns it into Dijkstra's algorithm) under 4- or
//! 8-connectivity, where every move costs one. Besides the canonical run-to-completion
//! [SearchEngine], an [IncrementalSearch] over a queue of partial paths can be advanced one move at
//! a time for animation. [Pathfinder] bundles a [Board] with both and is the intended entry point
//! for a presentation layer.
//!
//! ```
//! use grid_astar::{CellKind, GridPoint, Pathfinder};
//!
//! let mut pathfinder = Pathfinder::new(3, 3);
//! pathfinder.set_cell_kind(GridPoint::new(0, 0), CellKind::Start).unwrap();
//! pathfinder.set_cell_kind(GridPoint::new(2, 2), CellKind::Goal).unwrap();
//! let outcome = pathfinder.run_to_completion().unwrap();
//! assert_eq!(outcome.cost(), Some(4.0));
//! ```
pub mod board;
pub mod error;
pub mod heuristic;
pub mod path;
pub mod pathfinder;
pub mod queue;
pub mod scaler;
pub mod solver;

pub use board::{Board, Cell, CellClass, CellKind, Connectivity, GridPoint};
pub use error::{Endpoint, SearchError};
pub use heuristic::HeuristicKind;
pub use path::{reconstruct, Path};
pub use pathfinder::{CellView, Pathfinder};
pub use queue::PriorityQueue;
pub use scaler::scale;
pub use solver::{
    IncrementalSearch, SearchConfig, SearchEngine, SearchOutcome, SearchState, SearchStatistics,
    StepResult,
};

/// Cost of a single move, straight or diagonal.
pub const MOVE_COST: f64 = 1.0;
/// Largest number of cells a board may be created or scaled to.
pub const MAX_CELLS: usize = 1 << 22;
/// Inline capacity for neighbour lists; a cell has at most 8 neighbours.
pub(crate) const N_SMALLVEC_SIZE: usize = 8;
