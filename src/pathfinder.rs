use crate::board::{checked_cell_count, Board, CellClass, CellKind, Connectivity, GridPoint};
use crate::error::SearchError;
use crate::heuristic::HeuristicKind;
use crate::path::Path;
use crate::scaler::scale;
use crate::solver::{
    IncrementalSearch, SearchConfig, SearchEngine, SearchOutcome, SearchState, SearchStatistics,
    StepResult,
};
use core::fmt;
use log::info;
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Read-only rendering state of one cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellView {
    pub kind: CellKind,
    pub class: CellClass,
    pub in_open: bool,
    pub in_closed: bool,
    pub visited: bool,
}

/// [Pathfinder] owns a [Board] together with the search settings and the results of the last
/// run. It is the single entry point for a presentation layer: configuration goes in through
/// setters, state comes out through read-only accessors after every call.
///
/// While an incremental search is in progress all configuration calls and
/// [run_to_completion](Self::run_to_completion) fail with [SearchError::AlreadyRunning]; finish
/// it by stepping or drop it with [abort](Self::abort).
#[derive(Debug)]
pub struct Pathfinder {
    board: Board,
    config: SearchConfig,
    engine: SearchEngine,
    incremental: Option<IncrementalSearch>,
    state: SearchState,
    best_path: Option<Path>,
    statistics: SearchStatistics,
    cancel: Arc<AtomicBool>,
}

impl Pathfinder {
    /// An empty `width x height` board with the default [SearchConfig].
    pub fn new(width: usize, height: usize) -> Pathfinder {
        Pathfinder {
            board: Board::new(width, height),
            config: SearchConfig::default(),
            engine: SearchEngine::default(),
            incremental: None,
            state: SearchState::Idle,
            best_path: None,
            statistics: SearchStatistics::default(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Replaces the board with an empty one of the given size, at most
    /// [MAX_CELLS](crate::MAX_CELLS) cells.
    pub fn create_board(&mut self, width: usize, height: usize) -> Result<(), SearchError> {
        self.ensure_idle()?;
        if checked_cell_count(width, height).is_none() {
            return Err(SearchError::InvalidDimensions { width, height });
        }
        info!("Creating {}x{} board", width, height);
        self.board = Board::new(width, height);
        self.invalidate();
        Ok(())
    }

    /// Replaces the board with a random one of the same size.
    pub fn randomize<R: Rng + ?Sized>(
        &mut self,
        obstacle_density: f64,
        rng: &mut R,
    ) -> Result<(), SearchError> {
        self.ensure_idle()?;
        self.board = Board::random(
            self.board.width(),
            self.board.height(),
            obstacle_density,
            rng,
        )?;
        self.invalidate();
        Ok(())
    }

    pub fn set_cell_kind(&mut self, point: GridPoint, kind: CellKind) -> Result<(), SearchError> {
        self.ensure_idle()?;
        self.board.set_kind(point, kind)?;
        self.invalidate();
        Ok(())
    }

    pub fn set_heuristic(&mut self, heuristic: HeuristicKind) -> Result<(), SearchError> {
        self.configure(self.config.with_heuristic(heuristic))
    }

    /// Accepts 4 or 8.
    pub fn set_connectivity(&mut self, degree: u8) -> Result<(), SearchError> {
        let connectivity = Connectivity::try_from(degree)?;
        self.configure(self.config.with_connectivity(connectivity))
    }

    /// Replaces the whole configuration at once, which allows switching heuristic and
    /// connectivity together when neither change is admissible on its own.
    pub fn configure(&mut self, config: SearchConfig) -> Result<(), SearchError> {
        self.ensure_idle()?;
        self.engine = SearchEngine::new(config)?;
        self.config = config;
        self.invalidate();
        Ok(())
    }

    /// Rebuilds the board at `factor` times its resolution.
    pub fn scale(&mut self, factor: usize) -> Result<(), SearchError> {
        self.ensure_idle()?;
        let (board, _, _) = scale(&self.board, factor)?;
        self.board = board;
        self.invalidate();
        Ok(())
    }

    /// Runs canonical A* on the current board.
    pub fn run_to_completion(&mut self) -> Result<SearchOutcome, SearchError> {
        self.ensure_idle()?;
        self.invalidate();
        self.cancel.store(false, Ordering::Relaxed);
        let outcome = self.engine.run_cancellable(&mut self.board, &self.cancel)?;
        self.record(&outcome);
        Ok(outcome)
    }

    /// Advances the incremental path-queue search by one step, starting a new session if none
    /// exists.
    pub fn step(&mut self) -> Result<StepResult, SearchError> {
        self.start_incremental()?;
        let Some(search) = self.incremental.as_mut() else {
            return Err(SearchError::InvariantViolation("incremental session missing"));
        };
        let result = search.step(&mut self.board)?;
        self.sync_incremental();
        Ok(result)
    }

    /// Steps the incremental search until it finishes or the cancel flag is raised.
    pub fn run_incremental(&mut self) -> Result<SearchOutcome, SearchError> {
        self.cancel.store(false, Ordering::Relaxed);
        self.start_incremental()?;
        let Some(search) = self.incremental.as_mut() else {
            return Err(SearchError::InvariantViolation("incremental session missing"));
        };
        let outcome = search.run_cancellable(&mut self.board, &self.cancel)?;
        self.sync_incremental();
        Ok(outcome)
    }

    /// Drops any incremental session and clears search state.
    pub fn abort(&mut self) {
        self.invalidate();
    }

    /// A flag that cancels the current run when set from another thread.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn cell_view(&self, point: GridPoint) -> Option<CellView> {
        self.board.get(point).map(|cell| CellView {
            kind: cell.kind(),
            class: cell.classify(),
            in_open: cell.in_open(),
            in_closed: cell.in_closed(),
            visited: cell.visited(),
        })
    }

    /// The shortest path of the last completed run, or the best complete path found so far by the
    /// incremental search.
    pub fn best_path(&self) -> Option<&Path> {
        self.best_path.as_ref()
    }

    /// The partial path the incremental search is advancing.
    pub fn current_path(&self) -> Option<&Path> {
        self.incremental
            .as_ref()
            .and_then(IncrementalSearch::current_path)
    }

    pub fn last_statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    pub fn elapsed(&self) -> Duration {
        self.statistics.elapsed
    }

    fn ensure_idle(&self) -> Result<(), SearchError> {
        if self.state == SearchState::Running {
            Err(SearchError::AlreadyRunning)
        } else {
            Ok(())
        }
    }

    fn invalidate(&mut self) {
        self.incremental = None;
        self.state = SearchState::Idle;
        self.best_path = None;
        self.statistics = SearchStatistics::default();
        self.board.reset_search();
    }

    fn start_incremental(&mut self) -> Result<(), SearchError> {
        if self.incremental.is_none() {
            self.invalidate();
            let search = IncrementalSearch::new(self.config, &mut self.board)?;
            self.state = SearchState::Running;
            self.incremental = Some(search);
        }
        Ok(())
    }

    fn sync_incremental(&mut self) {
        let Some(search) = self.incremental.as_ref() else {
            return;
        };
        self.state = search.state();
        self.statistics = *search.statistics();
        self.best_path = search.best_path().cloned();
        if self.state == SearchState::Found {
            if let Some(path) = &self.best_path {
                self.board.highlight_path(path);
            }
        }
    }

    fn record(&mut self, outcome: &SearchOutcome) {
        self.state = outcome.state();
        self.statistics = *outcome.statistics();
        self.best_path = outcome.path().cloned();
        if let Some(path) = &self.best_path {
            self.board.highlight_path(path);
        }
    }
}

impl fmt::Display for Pathfinder {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "{} heuristic, {} ({:?})",
            self.config.heuristic, self.config.connectivity, self.state
        )?;
        write!(f, "{}", self.board)
    }
}
