//! Step-at-a-time search over a queue of partial paths.
//!
//! Each [step](IncrementalSearch::step) advances the most promising partial path by one greedy
//! move toward the neighbour with the smallest heuristic value, and queues a forked path for
//! every other eligible neighbour. Partial paths are ordered by `cost + h(head)`. A path, or a
//! fork, is only retained while its own bound does not exceed the cost of the best complete path
//! found so far, and while it reaches its head more cheaply than any earlier path did. When the
//! queue runs dry the best complete path is optimal for an admissible heuristic.
use crate::board::{Board, GridPoint};
use crate::error::SearchError;
use crate::path::Path;
use crate::queue::PriorityQueue;
use crate::solver::{SearchConfig, SearchOutcome, SearchState, SearchStatistics};
use crate::{MOVE_COST, N_SMALLVEC_SIZE};
use fxhash::FxBuildHasher;
use indexmap::IndexMap;
use log::{debug, info};
use smallvec::SmallVec;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

type PathId = u64;

/// What a single [IncrementalSearch::step] did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StepResult {
    /// The active path moved onto `head`.
    Advanced { head: GridPoint },
    /// A partial path was discarded: it hit a dead end, was dominated by a cheaper path to its
    /// head, or its bound exceeded the best complete path.
    Pruned,
    /// The active path reached the goal and became the best complete path.
    Completed { cost: f64 },
    /// Nothing is left to explore. Repeated calls keep returning this.
    Finished,
}

#[derive(Clone, Debug)]
pub struct IncrementalSearch {
    config: SearchConfig,
    goal: usize,
    goal_point: GridPoint,
    queue: PriorityQueue<PathId>,
    paths: FxIndexMap<PathId, Path>,
    next_id: PathId,
    active: Option<Path>,
    best: Option<Path>,
    // Cheapest cost at which any path has reached each cell.
    best_g: Vec<f64>,
    // Number of queued paths ending on each cell.
    queued_heads: Vec<u32>,
    state: SearchState,
    statistics: SearchStatistics,
}

impl IncrementalSearch {
    /// Clears the board's scratch state and queues the single-cell path at the start.
    pub fn new(config: SearchConfig, board: &mut Board) -> Result<IncrementalSearch, SearchError> {
        config.validate()?;
        let (start, goal) = board.endpoints()?;
        board.reset_search();
        let start_point = board.point_of(start);
        let goal_point = board.point_of(goal);
        info!(
            "Starting incremental search from {:?} to {:?} using the {} heuristic",
            start_point, goal_point, config.heuristic
        );
        let mut search = IncrementalSearch {
            config,
            goal,
            goal_point,
            queue: PriorityQueue::new(),
            paths: FxIndexMap::default(),
            next_id: 0,
            active: None,
            best: None,
            best_g: vec![f64::INFINITY; board.len()],
            queued_heads: vec![0; board.len()],
            state: SearchState::Running,
            statistics: SearchStatistics::default(),
        };
        search.best_g[start] = 0.0;
        let h = config.heuristic.estimate(start_point, goal_point);
        let cell = board.cell_mut(start);
        cell.g = 0.0;
        cell.h = h;
        cell.f = h;
        search.enqueue(board, Path::new(start_point), start, h);
        Ok(search)
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    /// The partial path currently being advanced.
    pub fn current_path(&self) -> Option<&Path> {
        self.active.as_ref()
    }

    /// The cheapest complete path found so far.
    pub fn best_path(&self) -> Option<&Path> {
        self.best.as_ref()
    }

    /// Partial paths waiting in the queue, in the order they were forked.
    pub fn queued_paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.paths.values()
    }

    /// Performs one unit of work and reports what happened.
    pub fn step(&mut self, board: &mut Board) -> Result<StepResult, SearchError> {
        if board.len() != self.best_g.len() {
            return Err(SearchError::InvariantViolation(
                "board was rebuilt during an incremental search",
            ));
        }
        let timer = Instant::now();
        let result = self.advance(board);
        self.statistics.elapsed += timer.elapsed();
        debug!("Incremental step: {:?}", result);
        Ok(result)
    }

    /// Steps until the queue is exhausted.
    pub fn run(&mut self, board: &mut Board) -> Result<SearchOutcome, SearchError> {
        self.run_cancellable(board, &AtomicBool::new(false))
    }

    /// Like [run](Self::run), but polls `cancel` before every step. A cancelled search stays
    /// resumable.
    pub fn run_cancellable(
        &mut self,
        board: &mut Board,
        cancel: &AtomicBool,
    ) -> Result<SearchOutcome, SearchError> {
        loop {
            if cancel.load(Ordering::Relaxed) {
                return Ok(SearchOutcome::Cancelled {
                    statistics: self.statistics,
                });
            }
            if self.step(board)? == StepResult::Finished {
                break;
            }
        }
        let statistics = self.statistics;
        Ok(match &self.best {
            Some(path) => SearchOutcome::Found {
                path: path.clone(),
                statistics,
            },
            None => SearchOutcome::Exhausted { statistics },
        })
    }

    fn bound(&self, cost: f64, h: f64) -> f64 {
        cost + h
    }

    fn exceeds_best(&self, bound: f64) -> bool {
        self.best.as_ref().map_or(false, |best| bound > best.cost)
    }

    fn enqueue(&mut self, board: &mut Board, path: Path, head: usize, h: f64) {
        let id = self.next_id;
        self.next_id += 1;
        let bound = self.bound(path.cost, h);
        self.queued_heads[head] += 1;
        board.cell_mut(head).in_open = true;
        self.queue.push(id, bound);
        self.paths.insert(id, path);
        self.statistics.nodes_generated += 1;
    }

    fn advance(&mut self, board: &mut Board) -> StepResult {
        if self.state.is_terminal() {
            return StepResult::Finished;
        }
        let heuristic = self.config.heuristic;
        let mut path = match self.active.take() {
            Some(path) => path,
            None => {
                let Some((id, bound)) = self.queue.pop_min() else {
                    self.state = if self.best.is_some() {
                        SearchState::Found
                    } else {
                        SearchState::Exhausted
                    };
                    info!(
                        "Incremental search finished in state {:?} after {} advances",
                        self.state, self.statistics.nodes_expanded
                    );
                    return StepResult::Finished;
                };
                let Some(path) = self.paths.swap_remove(&id) else {
                    return StepResult::Pruned;
                };
                let Some(head) = path.last().and_then(|p| board.index_of(p)) else {
                    return StepResult::Pruned;
                };
                self.queued_heads[head] = self.queued_heads[head].saturating_sub(1);
                board.cell_mut(head).in_open = self.queued_heads[head] > 0;
                if path.cost > self.best_g[head] || self.exceeds_best(bound) {
                    return StepResult::Pruned;
                }
                if head == self.goal {
                    return self.complete(path);
                }
                path
            }
        };

        let Some(head) = path.last().and_then(|p| board.index_of(p)) else {
            return StepResult::Pruned;
        };
        board.cell_mut(head).in_closed = true;
        let g = path.cost + MOVE_COST;
        let candidates = board
            .neighbor_indices(head, self.config.connectivity)
            .into_iter()
            .filter(|&n| g < self.best_g[n])
            .map(|n| (n, heuristic.estimate(board.point_of(n), self.goal_point)))
            .filter(|&(_, h)| !self.exceeds_best(self.bound(g, h)))
            .collect::<SmallVec<[(usize, f64); N_SMALLVEC_SIZE]>>();
        let Some(&(chosen, chosen_h)) = candidates.iter().min_by(|a, b| a.1.total_cmp(&b.1)) else {
            return StepResult::Pruned;
        };

        for &(n, h) in candidates.iter().filter(|(n, _)| *n != chosen) {
            let fork = path.extended(board.point_of(n));
            self.best_g[n] = g;
            let cell = board.cell_mut(n);
            cell.g = g;
            cell.h = h;
            cell.f = g + h;
            self.enqueue(board, fork, n, h);
        }

        let head_point = board.point_of(chosen);
        path.push(head_point);
        self.best_g[chosen] = g;
        let cell = board.cell_mut(chosen);
        cell.g = g;
        cell.h = chosen_h;
        cell.f = g + chosen_h;
        cell.visited = true;
        self.statistics.nodes_expanded += 1;

        if chosen == self.goal {
            return self.complete(path);
        }
        self.active = Some(path);
        StepResult::Advanced { head: head_point }
    }

    fn complete(&mut self, path: Path) -> StepResult {
        let cost = path.cost;
        info!("Reached {:?} with a path of cost {}", self.goal_point, cost);
        self.best = Some(path);
        StepResult::Completed { cost }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{CellClass, CellKind, Connectivity};
    use crate::heuristic::HeuristicKind;
    use grid_util::point::Point;

    fn corridor(length: usize) -> Board {
        let mut board = Board::new(length, 1);
        board.set_kind(Point::new(0, 0), CellKind::Start).unwrap();
        board
            .set_kind(Point::new(length as i32 - 1, 0), CellKind::Goal)
            .unwrap();
        board
    }

    #[test]
    fn corridor_advances_one_cell_per_step() {
        let mut board = corridor(4);
        let config = SearchConfig::new(HeuristicKind::Manhattan, Connectivity::Four);
        let mut search = IncrementalSearch::new(config, &mut board).unwrap();
        assert_eq!(
            search.step(&mut board).unwrap(),
            StepResult::Advanced {
                head: Point::new(1, 0)
            }
        );
        assert_eq!(search.current_path().unwrap().len(), 2);
        assert_eq!(
            search.step(&mut board).unwrap(),
            StepResult::Advanced {
                head: Point::new(2, 0)
            }
        );
        assert_eq!(
            search.step(&mut board).unwrap(),
            StepResult::Completed { cost: 3.0 }
        );
        assert_eq!(search.step(&mut board).unwrap(), StepResult::Finished);
        assert_eq!(search.step(&mut board).unwrap(), StepResult::Finished);
        assert_eq!(search.state(), SearchState::Found);
        assert_eq!(search.best_path().unwrap().len(), 4);
        assert!(board.get(Point::new(2, 0)).unwrap().visited());
    }

    #[test]
    fn greedy_move_forks_other_neighbours() {
        // Start in the middle of an open 3x3 board, goal on the right edge.
        let mut board = Board::new(3, 3);
        board.set_kind(Point::new(1, 1), CellKind::Start).unwrap();
        board.set_kind(Point::new(2, 1), CellKind::Goal).unwrap();
        let config = SearchConfig::new(HeuristicKind::Manhattan, Connectivity::Four);
        let mut search = IncrementalSearch::new(config, &mut board).unwrap();
        assert_eq!(
            search.step(&mut board).unwrap(),
            StepResult::Completed { cost: 1.0 }
        );
        // North, south and west were forked.
        assert_eq!(search.queued_paths().count(), 3);
        assert!(board.get(Point::new(1, 2)).unwrap().in_open());
        // Every fork is bounded by 1 + h > 1 and is pruned on pop.
        for _ in 0..3 {
            assert_eq!(search.step(&mut board).unwrap(), StepResult::Pruned);
        }
        assert_eq!(search.step(&mut board).unwrap(), StepResult::Finished);
    }

    /// Forks are judged by their own bound at the point of the fork, not the bound of the path
    /// they were forked from.
    #[test]
    fn fork_is_pruned_by_its_own_bound() {
        // S . G
        // . . .
        let mut board = Board::new(3, 2);
        board.set_kind(Point::new(0, 1), CellKind::Start).unwrap();
        board.set_kind(Point::new(2, 1), CellKind::Goal).unwrap();
        let config = SearchConfig::new(HeuristicKind::Manhattan, Connectivity::Four);
        let mut search = IncrementalSearch::new(config, &mut board).unwrap();
        search.best = Some(Path::from_points(vec![], 2.0));
        // The forking path at S has bound 0 + 2, within the best. Its fork to (0,0) has bound
        // 1 + 3 = 4 and must not be retained.
        assert_eq!(
            search.step(&mut board).unwrap(),
            StepResult::Advanced {
                head: Point::new(1, 1)
            }
        );
        assert_eq!(search.queued_paths().count(), 0);
    }

    #[test]
    fn cell_stays_open_while_another_path_ends_there() {
        let mut board = corridor(5);
        let config = SearchConfig::new(HeuristicKind::Manhattan, Connectivity::Four);
        let mut search = IncrementalSearch::new(config, &mut board).unwrap();
        // Two paths ending on (2, 0), both ahead of the start path in the queue.
        let mid = Point::new(2, 0);
        let ix = board.index_of(mid).unwrap();
        search.best_g[ix] = 0.0;
        search.enqueue(&mut board, Path::new(mid), ix, 2.0);
        search.enqueue(&mut board, Path::new(mid), ix, 2.0);

        assert_eq!(
            search.step(&mut board).unwrap(),
            StepResult::Advanced {
                head: Point::new(3, 0)
            }
        );
        let cell = board.cell(ix);
        assert!(cell.in_open());
        assert!(cell.in_closed());
        assert_eq!(cell.classify(), CellClass::Frontier);

        assert_eq!(
            search.step(&mut board).unwrap(),
            StepResult::Completed { cost: 2.0 }
        );
        // The second path has nowhere cheaper to go.
        assert_eq!(search.step(&mut board).unwrap(), StepResult::Pruned);
        assert!(!board.cell(ix).in_open());
        assert_eq!(board.cell(ix).classify(), CellClass::Visited);
    }

    #[test]
    fn unreachable_goal_is_exhausted() {
        let mut board = corridor(3);
        board.set_kind(Point::new(1, 0), CellKind::Obstacle).unwrap();
        let config = SearchConfig::new(HeuristicKind::Zero, Connectivity::Eight);
        let mut search = IncrementalSearch::new(config, &mut board).unwrap();
        let outcome = search.run(&mut board).unwrap();
        assert!(matches!(outcome, SearchOutcome::Exhausted { .. }));
        assert_eq!(search.state(), SearchState::Exhausted);
    }

    #[test]
    fn detects_rebuilt_board() {
        let mut board = corridor(3);
        let config = SearchConfig::default();
        let mut search = IncrementalSearch::new(config, &mut board).unwrap();
        let mut other = corridor(5);
        assert!(matches!(
            search.step(&mut other),
            Err(SearchError::InvariantViolation(_))
        ));
    }

    #[test]
    fn cancelled_run_is_resumable() {
        let mut board = corridor(6);
        let mut search = IncrementalSearch::new(SearchConfig::default(), &mut board).unwrap();
        let cancel = AtomicBool::new(true);
        let outcome = search.run_cancellable(&mut board, &cancel).unwrap();
        assert!(matches!(outcome, SearchOutcome::Cancelled { .. }));
        assert_eq!(search.state(), SearchState::Running);
        let outcome = search.run(&mut board).unwrap();
        assert_eq!(outcome.cost(), Some(5.0));
    }
}
