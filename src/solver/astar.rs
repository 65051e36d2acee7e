use crate::board::Board;
use crate::error::SearchError;
use crate::path::reconstruct_from;
use crate::queue::PriorityQueue;
use crate::solver::{SearchConfig, SearchOutcome, SearchState, SearchStatistics};
use crate::MOVE_COST;
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Canonical A* over the cells of a [Board].
///
/// Scratch state (g, h, f, open/closed flags, parents) lives in the board's cells, and the open
/// set is an indexed [PriorityQueue] of cell indices so that cheaper routes can lower the
/// priority of an open cell in place. Closed cells are reopened when a cheaper route to them
/// appears, which keeps the result optimal even if the heuristic is admissible but not
/// consistent. The engine keeps its queue allocation between runs.
#[derive(Clone, Debug)]
pub struct SearchEngine {
    config: SearchConfig,
    open: PriorityQueue<usize>,
    state: SearchState,
    statistics: SearchStatistics,
}

impl Default for SearchEngine {
    fn default() -> SearchEngine {
        SearchEngine {
            config: SearchConfig::default(),
            open: PriorityQueue::new(),
            state: SearchState::Idle,
            statistics: SearchStatistics::default(),
        }
    }
}

impl SearchEngine {
    pub fn new(config: SearchConfig) -> Result<SearchEngine, SearchError> {
        config.validate()?;
        Ok(SearchEngine {
            config,
            open: PriorityQueue::new(),
            state: SearchState::Idle,
            statistics: SearchStatistics::default(),
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    /// Statistics of the last run.
    pub fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    /// Runs to completion or exhaustion. The path of a [SearchOutcome::Found] runs from the
    /// board's start to its goal inclusive.
    pub fn run(&mut self, board: &mut Board) -> Result<SearchOutcome, SearchError> {
        self.run_cancellable(board, &AtomicBool::new(false))
    }

    /// Like [run](Self::run), but polls `cancel` once per expansion and stops with
    /// [SearchOutcome::Cancelled] once it is set.
    pub fn run_cancellable(
        &mut self,
        board: &mut Board,
        cancel: &AtomicBool,
    ) -> Result<SearchOutcome, SearchError> {
        let (start, goal) = board.endpoints()?;
        let timer = Instant::now();
        let heuristic = self.config.heuristic;
        let connectivity = self.config.connectivity;
        let start_point = board.point_of(start);
        let goal_point = board.point_of(goal);

        self.state = SearchState::Running;
        self.statistics = SearchStatistics::default();
        self.open.clear();
        board.reset_search();
        info!(
            "Searching from {:?} to {:?} using the {} heuristic on a {}x{} {} board",
            start_point,
            goal_point,
            heuristic,
            board.width(),
            board.height(),
            connectivity
        );

        if self.config.reachability_precheck
            && !board.reachable(start_point, goal_point, connectivity)
        {
            info!("{:?} is not reachable from {:?}", goal_point, start_point);
            return Ok(self.conclude(timer, |statistics| SearchOutcome::Exhausted {
                statistics,
            }));
        }

        let h = heuristic.estimate(start_point, goal_point);
        let cell = board.cell_mut(start);
        cell.g = 0.0;
        cell.h = h;
        cell.f = h;
        cell.parent = None;
        cell.in_open = true;
        self.open.push(start, h);
        self.statistics.nodes_generated += 1;

        loop {
            if cancel.load(Ordering::Relaxed) {
                info!(
                    "Search cancelled after expanding {} cells",
                    self.statistics.nodes_expanded
                );
                return Ok(self.conclude(timer, |statistics| SearchOutcome::Cancelled {
                    statistics,
                }));
            }
            let Some((current, _)) = self.open.pop_min() else {
                break;
            };
            board.cell_mut(current).in_open = false;

            if current == goal {
                let Some(path) = reconstruct_from(board, start, goal) else {
                    error!("Reached {:?} but its parent chain is corrupt", goal_point);
                    self.state = SearchState::Idle;
                    return Err(SearchError::InvariantViolation(
                        "parent chain of the goal does not lead back to the start",
                    ));
                };
                info!(
                    "Found path of cost {} after expanding {} cells",
                    path.cost, self.statistics.nodes_expanded
                );
                return Ok(self.conclude(timer, |statistics| SearchOutcome::Found {
                    path,
                    statistics,
                }));
            }

            let cell = board.cell_mut(current);
            cell.in_closed = true;
            cell.visited = true;
            let g = cell.g;
            self.statistics.nodes_expanded += 1;

            for n in board.neighbor_indices(current, connectivity) {
                let tentative_g = g + MOVE_COST;
                let point = board.point_of(n);
                let neighbor = board.cell_mut(n);
                if !neighbor.in_open && !neighbor.in_closed {
                    neighbor.g = tentative_g;
                    neighbor.h = heuristic.estimate(point, goal_point);
                    neighbor.f = tentative_g + neighbor.h;
                    neighbor.parent = Some(current);
                    neighbor.in_open = true;
                    self.open.push(n, neighbor.f);
                    self.statistics.nodes_generated += 1;
                } else if tentative_g < neighbor.g {
                    neighbor.g = tentative_g;
                    neighbor.f = tentative_g + neighbor.h;
                    neighbor.parent = Some(current);
                    if neighbor.in_open {
                        self.open.decrease_priority(&n, neighbor.f);
                        self.statistics.nodes_updated += 1;
                    } else {
                        debug!("Reopening {:?} with g = {}", point, tentative_g);
                        neighbor.in_closed = false;
                        neighbor.in_open = true;
                        self.open.push(n, neighbor.f);
                        self.statistics.nodes_generated += 1;
                        self.statistics.nodes_reopened += 1;
                    }
                }
            }
        }

        warn!(
            "Open set exhausted after expanding {} cells: {:?} cannot be reached from {:?}",
            self.statistics.nodes_expanded, goal_point, start_point
        );
        Ok(self.conclude(timer, |statistics| SearchOutcome::Exhausted {
            statistics,
        }))
    }

    fn conclude<F>(&mut self, timer: Instant, outcome: F) -> SearchOutcome
    where
        F: FnOnce(SearchStatistics) -> SearchOutcome,
    {
        self.statistics.elapsed = timer.elapsed();
        let outcome = outcome(self.statistics);
        self.state = outcome.state();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{CellKind, Connectivity};
    use crate::heuristic::HeuristicKind;
    use grid_util::point::Point;

    fn board(width: usize, height: usize, start: Point, goal: Point, walls: &[Point]) -> Board {
        let mut board = Board::new(width, height);
        for wall in walls {
            board.set_kind(*wall, CellKind::Obstacle).unwrap();
        }
        board.set_kind(start, CellKind::Start).unwrap();
        board.set_kind(goal, CellKind::Goal).unwrap();
        board
    }

    fn engine(heuristic: HeuristicKind, connectivity: Connectivity) -> SearchEngine {
        SearchEngine::new(SearchConfig::new(heuristic, connectivity)).unwrap()
    }

    #[test]
    fn rejects_inadmissible_configuration() {
        let config = SearchConfig::new(HeuristicKind::Euclidean, Connectivity::Eight);
        assert!(SearchEngine::new(config).is_err());
    }

    #[test]
    fn missing_endpoints() {
        let mut engine = engine(HeuristicKind::Manhattan, Connectivity::Four);
        let mut b = Board::new(2, 2);
        assert_eq!(
            engine.run(&mut b),
            Err(SearchError::MissingEndpoint(crate::error::Endpoint::Start))
        );
        b.set_kind(Point::new(0, 0), CellKind::Start).unwrap();
        assert_eq!(
            engine.run(&mut b),
            Err(SearchError::MissingEndpoint(crate::error::Endpoint::Goal))
        );
        assert_eq!(engine.state(), SearchState::Idle);
    }

    /// Asserts that the optimal 4 step solution is found around a central obstacle.
    #[test]
    fn solve_simple_problem() {
        for (connectivity, heuristic, expected) in [
            (Connectivity::Four, HeuristicKind::Manhattan, 5),
            (Connectivity::Eight, HeuristicKind::Chebyshev, 4),
        ] {
            let mut b = board(3, 3, Point::new(0, 0), Point::new(2, 2), &[Point::new(1, 1)]);
            let mut engine = engine(heuristic, connectivity);
            let outcome = engine.run(&mut b).unwrap();
            let path = outcome.path().unwrap();
            assert_eq!(path.len(), expected);
            assert!(path.is_contiguous(connectivity));
            assert!(!path.contains(Point::new(1, 1)));
            assert_eq!(engine.state(), SearchState::Found);
        }
    }

    #[test]
    fn flags_after_search() {
        let mut b = board(4, 1, Point::new(0, 0), Point::new(3, 0), &[]);
        let mut engine = engine(HeuristicKind::Zero, Connectivity::Four);
        let outcome = engine.run(&mut b).unwrap();
        assert_eq!(outcome.cost(), Some(3.0));
        assert_eq!(outcome.nodes_expanded(), 3);
        for x in 0..3 {
            let cell = b.get(Point::new(x, 0)).unwrap();
            assert!(cell.in_closed());
            assert_eq!(cell.g(), x as f64);
        }
        let goal = b.get(Point::new(3, 0)).unwrap();
        assert!(!goal.in_open());
        assert_eq!(goal.parent(), b.index_of(Point::new(2, 0)));
    }

    #[test]
    fn rerun_resets_scratch_state() {
        let mut b = board(3, 3, Point::new(0, 0), Point::new(2, 2), &[]);
        let mut engine = engine(HeuristicKind::Manhattan, Connectivity::Four);
        let first = engine.run(&mut b).unwrap();
        let second = engine.run(&mut b).unwrap();
        assert_eq!(first.path(), second.path());
        assert_eq!(first.nodes_expanded(), second.nodes_expanded());
    }

    #[test]
    fn reachability_precheck_skips_expansion() {
        let walls = [Point::new(1, 0), Point::new(1, 1), Point::new(1, 2)];
        let mut b = board(3, 3, Point::new(0, 0), Point::new(2, 0), &walls);
        let config = SearchConfig::new(HeuristicKind::Manhattan, Connectivity::Four)
            .with_reachability_precheck(true);
        let mut engine = SearchEngine::new(config).unwrap();
        let outcome = engine.run(&mut b).unwrap();
        assert!(matches!(outcome, SearchOutcome::Exhausted { .. }));
        assert_eq!(outcome.nodes_expanded(), 0);
        assert_eq!(engine.state(), SearchState::Exhausted);
    }

    #[test]
    fn cancelled_before_first_expansion() {
        let mut b = board(5, 5, Point::new(0, 0), Point::new(4, 4), &[]);
        let mut engine = engine(HeuristicKind::Manhattan, Connectivity::Four);
        let cancel = AtomicBool::new(true);
        let outcome = engine.run_cancellable(&mut b, &cancel).unwrap();
        assert!(matches!(outcome, SearchOutcome::Cancelled { .. }));
        assert_eq!(engine.state(), SearchState::Cancelled);
        assert_eq!(outcome.nodes_expanded(), 0);
    }

    /// Asserts that the case in which start and goal are equal is handled correctly.
    #[test]
    fn equal_start_goal() {
        let mut b = Board::new(1, 1);
        b.set_kind(Point::new(0, 0), CellKind::Start).unwrap();
        let mut engine = engine(HeuristicKind::Chebyshev, Connectivity::Eight);
        // A single cell cannot hold both endpoints.
        assert!(engine.run(&mut b).is_err());

        let mut b = board(2, 1, Point::new(0, 0), Point::new(1, 0), &[]);
        let outcome = engine.run(&mut b).unwrap();
        assert_eq!(outcome.path().unwrap().len(), 2);
    }

    #[test]
    fn consistent_heuristic_never_reopens() {
        let mut b = board(3, 1, Point::new(0, 0), Point::new(2, 0), &[]);
        let mut engine = engine(HeuristicKind::Zero, Connectivity::Four);
        engine.run(&mut b).unwrap();
        assert_eq!(engine.statistics().nodes_reopened, 0);
        assert_eq!(engine.statistics().nodes_generated, 3);
    }

    /// Manhattan overestimates diagonal moves, so a cell can be closed before its cheapest route
    /// is known. The engine must reopen it and still return the optimal cost here.
    ///
    /// ```text
    /// ##...#
    /// G#....
    /// ....#.
    /// .....S
    /// ```
    #[test]
    fn inconsistent_heuristic_reopens_closed_cell() {
        let walls = [
            Point::new(0, 3),
            Point::new(1, 2),
            Point::new(1, 3),
            Point::new(4, 1),
            Point::new(5, 3),
        ];
        let (start, goal) = (Point::new(5, 0), Point::new(0, 2));
        let mut b = board(6, 4, start, goal, &walls);
        // Bypasses the admissibility validator on purpose.
        let mut unchecked = SearchEngine {
            config: SearchConfig::new(HeuristicKind::Manhattan, Connectivity::Eight),
            ..Default::default()
        };
        let outcome = unchecked.run(&mut b).unwrap();
        let stats = *outcome.statistics();
        assert_eq!(stats.nodes_reopened, 1);
        assert_eq!(stats.nodes_updated, 3);
        let path = outcome.path().unwrap().clone();
        assert!(path.is_contiguous(Connectivity::Eight));
        assert!(path.contains(Point::new(2, 2)));
        assert_eq!(path.first(), Some(start));
        assert_eq!(path.last(), Some(goal));

        let mut dijkstra = engine(HeuristicKind::Zero, Connectivity::Eight);
        let baseline = dijkstra.run(&mut b).unwrap();
        assert_eq!(path.cost, 5.0);
        assert_eq!(baseline.cost(), Some(path.cost));
    }

    /// A cheaper route to an open cell lowers its priority in place instead of queueing it twice.
    ///
    /// ```text
    /// .....
    /// .#..S
    /// G#.#.
    /// .#...
    /// ```
    #[test]
    fn cheaper_route_updates_open_cell() {
        let walls = [
            Point::new(1, 0),
            Point::new(1, 1),
            Point::new(1, 2),
            Point::new(3, 1),
        ];
        let mut b = board(5, 4, Point::new(4, 2), Point::new(0, 1), &walls);
        let mut engine = engine(HeuristicKind::Chebyshev, Connectivity::Eight);
        let outcome = engine.run(&mut b).unwrap();
        let stats = outcome.statistics();
        assert_eq!(outcome.cost(), Some(5.0));
        assert_eq!(stats.nodes_updated, 1);
        assert_eq!(stats.nodes_reopened, 0);
        // (3, 0) is first reached from (2, 1) at g = 3, then from (4, 1) at g = 2.
        let updated = b.get(Point::new(3, 0)).unwrap();
        assert_eq!(updated.parent(), b.index_of(Point::new(4, 1)));
        assert_eq!(updated.g(), 2.0);
    }
}
