use crate::error::{Endpoint, SearchError};
use crate::path::Path;
use crate::{MAX_CELLS, N_SMALLVEC_SIZE};
use core::fmt;
use grid_util::point::Point;
use log::info;
use petgraph::unionfind::UnionFind;
use rand::Rng;
use smallvec::SmallVec;

/// Number of cells of a `width x height` board, if it stays within [MAX_CELLS].
pub(crate) fn checked_cell_count(width: usize, height: usize) -> Option<usize> {
    width.checked_mul(height).filter(|&n| n <= MAX_CELLS)
}

/// A coordinate on the board. Together with the board width it doubles as a dense index,
/// `y * width + x`.
pub type GridPoint = Point;

/// The set of moves considered adjacent during search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Connectivity {
    /// North, east, south, west.
    #[default]
    Four,
    /// The four orthogonal moves followed by the four diagonals.
    Eight,
}

const ORTHOGONAL: [(i32, i32); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];
const DIAGONAL: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

impl Connectivity {
    /// Neighbour offsets in the fixed order used for enumeration and tie-breaking.
    pub fn offsets(self) -> impl Iterator<Item = (i32, i32)> {
        let diagonals = match self {
            Connectivity::Four => 0,
            Connectivity::Eight => DIAGONAL.len(),
        };
        ORTHOGONAL
            .into_iter()
            .chain(DIAGONAL.into_iter().take(diagonals))
    }

    pub fn degree(self) -> u8 {
        match self {
            Connectivity::Four => 4,
            Connectivity::Eight => 8,
        }
    }

    /// Whether `a` and `b` are one move apart.
    pub fn adjacent(self, a: GridPoint, b: GridPoint) -> bool {
        self.offsets()
            .any(|(dx, dy)| a.x + dx == b.x && a.y + dy == b.y)
    }
}

impl TryFrom<u8> for Connectivity {
    type Error = SearchError;

    fn try_from(degree: u8) -> Result<Self, Self::Error> {
        match degree {
            4 => Ok(Connectivity::Four),
            8 => Ok(Connectivity::Eight),
            n => Err(SearchError::InvalidConnectivity(n)),
        }
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-connected", self.degree())
    }
}

/// The configured role of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum CellKind {
    Start,
    Goal,
    #[default]
    Empty,
    Obstacle,
}

/// Display state of a cell derived from its kind and its search flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellClass {
    Start,
    Goal,
    Obstacle,
    Empty,
    Visited,
    Frontier,
    OnPath,
}

/// One grid position. The search scratch fields are only meaningful during or after a run and
/// are reset by [Board::reset_search].
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    position: GridPoint,
    pub(crate) kind: CellKind,
    pub(crate) g: f64,
    pub(crate) h: f64,
    pub(crate) f: f64,
    pub(crate) in_open: bool,
    pub(crate) in_closed: bool,
    pub(crate) parent: Option<usize>,
    pub(crate) visited: bool,
    pub(crate) on_path: bool,
}

impl Cell {
    fn new(position: GridPoint, kind: CellKind) -> Cell {
        Cell {
            position,
            kind,
            g: f64::INFINITY,
            h: 0.0,
            f: f64::INFINITY,
            in_open: false,
            in_closed: false,
            parent: None,
            visited: false,
            on_path: false,
        }
    }

    fn reset_search(&mut self) {
        self.g = f64::INFINITY;
        self.h = 0.0;
        self.f = f64::INFINITY;
        self.in_open = false;
        self.in_closed = false;
        self.parent = None;
        self.visited = false;
        self.on_path = false;
    }

    pub fn position(&self) -> GridPoint {
        self.position
    }
    pub fn kind(&self) -> CellKind {
        self.kind
    }
    pub fn is_obstacle(&self) -> bool {
        self.kind == CellKind::Obstacle
    }
    /// Cost from the start along the best path found so far, infinite if unreached.
    pub fn g(&self) -> f64 {
        self.g
    }
    pub fn h(&self) -> f64 {
        self.h
    }
    pub fn f(&self) -> f64 {
        self.f
    }
    pub fn in_open(&self) -> bool {
        self.in_open
    }
    pub fn in_closed(&self) -> bool {
        self.in_closed
    }
    /// Board index of the predecessor on the best known path.
    pub fn parent(&self) -> Option<usize> {
        self.parent
    }
    pub fn visited(&self) -> bool {
        self.visited
    }
    pub fn on_path(&self) -> bool {
        self.on_path
    }

    /// Collapses kind and search flags into the single state a renderer needs.
    pub fn classify(&self) -> CellClass {
        match self.kind {
            CellKind::Start => CellClass::Start,
            CellKind::Goal => CellClass::Goal,
            CellKind::Obstacle => CellClass::Obstacle,
            CellKind::Empty if self.on_path => CellClass::OnPath,
            CellKind::Empty if self.in_open => CellClass::Frontier,
            CellKind::Empty if self.in_closed || self.visited => CellClass::Visited,
            CellKind::Empty => CellClass::Empty,
        }
    }
}

/// [Board] is a dense arena of `width * height` [Cell]s. Predecessors are stored as indices into
/// this arena. At most one cell is the start and at most one is the goal; configuration demotes
/// the previous holder before promoting a new one.
#[derive(Clone, Debug)]
pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    start: Option<usize>,
    goal: Option<usize>,
}

impl Board {
    /// A board with every cell empty and no endpoints.
    pub fn new(width: usize, height: usize) -> Board {
        let cells = (0..height)
            .flat_map(|y| {
                (0..width).map(move |x| Cell::new(Point::new(x as i32, y as i32), CellKind::Empty))
            })
            .collect();
        Board {
            width,
            height,
            cells,
            start: None,
            goal: None,
        }
    }

    /// A board with a random start, a distinct random goal and each remaining cell blocked with
    /// probability `obstacle_density`. Needs at least two cells and at most [MAX_CELLS].
    pub fn random<R: Rng + ?Sized>(
        width: usize,
        height: usize,
        obstacle_density: f64,
        rng: &mut R,
    ) -> Result<Board, SearchError> {
        let n = match checked_cell_count(width, height) {
            Some(n) if n >= 2 => n,
            _ => return Err(SearchError::InvalidDimensions { width, height }),
        };
        let mut board = Board::new(width, height);
        let start = rng.gen_range(0..n);
        let mut goal = rng.gen_range(0..n - 1);
        if goal >= start {
            goal += 1;
        }
        // NaN places no obstacles.
        let density = if obstacle_density.is_nan() {
            0.0
        } else {
            obstacle_density.clamp(0.0, 1.0)
        };
        for ix in 0..n {
            if ix != start && ix != goal && rng.gen_bool(density) {
                board.cells[ix].kind = CellKind::Obstacle;
            }
        }
        board.cells[start].kind = CellKind::Start;
        board.cells[goal].kind = CellKind::Goal;
        board.start = Some(start);
        board.goal = Some(goal);
        info!(
            "Generated random {}x{} board with {} obstacles",
            width,
            height,
            board.obstacle_count()
        );
        Ok(board)
    }

    pub fn width(&self) -> usize {
        self.width
    }
    pub fn height(&self) -> usize {
        self.height
    }
    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, point: GridPoint) -> bool {
        point.x >= 0
            && point.y >= 0
            && (point.x as usize) < self.width
            && (point.y as usize) < self.height
    }

    pub fn index_of(&self, point: GridPoint) -> Option<usize> {
        if self.contains(point) {
            Some(point.y as usize * self.width + point.x as usize)
        } else {
            None
        }
    }

    pub fn point_of(&self, index: usize) -> GridPoint {
        Point::new((index % self.width) as i32, (index / self.width) as i32)
    }

    /// Looks up the cell at `point`, returning [None] off the board.
    pub fn get(&self, point: GridPoint) -> Option<&Cell> {
        self.index_of(point).map(|ix| &self.cells[ix])
    }

    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    pub(crate) fn cell_mut(&mut self, index: usize) -> &mut Cell {
        &mut self.cells[index]
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter()
    }

    pub fn start(&self) -> Option<GridPoint> {
        self.start.map(|ix| self.point_of(ix))
    }
    pub fn goal(&self) -> Option<GridPoint> {
        self.goal.map(|ix| self.point_of(ix))
    }
    pub(crate) fn start_index(&self) -> Option<usize> {
        self.start
    }
    pub(crate) fn goal_index(&self) -> Option<usize> {
        self.goal
    }

    /// Both endpoints, or the first one missing.
    pub(crate) fn endpoints(&self) -> Result<(usize, usize), SearchError> {
        let start = self
            .start
            .ok_or(SearchError::MissingEndpoint(Endpoint::Start))?;
        let goal = self
            .goal
            .ok_or(SearchError::MissingEndpoint(Endpoint::Goal))?;
        Ok((start, goal))
    }

    pub fn obstacle_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_obstacle()).count()
    }

    /// Sets the kind of the cell at `point`. Placing a start or goal demotes the previous holder
    /// to empty, and overwriting an endpoint with any other kind clears that endpoint.
    pub fn set_kind(&mut self, point: GridPoint, kind: CellKind) -> Result<(), SearchError> {
        let ix = self.index_of(point).ok_or(SearchError::OutOfBounds {
            point,
            width: self.width,
            height: self.height,
        })?;
        if self.start == Some(ix) {
            self.clear_start();
        }
        if self.goal == Some(ix) {
            self.clear_goal();
        }
        match kind {
            CellKind::Start => {
                self.clear_start();
                self.start = Some(ix);
            }
            CellKind::Goal => {
                self.clear_goal();
                self.goal = Some(ix);
            }
            CellKind::Empty | CellKind::Obstacle => {}
        }
        self.cells[ix].kind = kind;
        Ok(())
    }

    fn clear_start(&mut self) {
        if let Some(ix) = self.start.take() {
            self.cells[ix].kind = CellKind::Empty;
        }
    }

    fn clear_goal(&mut self) {
        if let Some(ix) = self.goal.take() {
            self.cells[ix].kind = CellKind::Empty;
        }
    }

    /// Indices of the passable neighbours of `index` in [Connectivity::offsets] order.
    pub fn neighbor_indices(
        &self,
        index: usize,
        connectivity: Connectivity,
    ) -> SmallVec<[usize; N_SMALLVEC_SIZE]> {
        let p = self.point_of(index);
        connectivity
            .offsets()
            .filter_map(|(dx, dy)| self.index_of(Point::new(p.x + dx, p.y + dy)))
            .filter(|&n| !self.cells[n].is_obstacle())
            .collect()
    }

    /// The in-bounds, non-obstacle neighbours of `point`. Empty when `point` is off the board.
    pub fn neighbors(
        &self,
        point: GridPoint,
        connectivity: Connectivity,
    ) -> impl Iterator<Item = &Cell> + '_ {
        self.index_of(point)
            .map(|ix| self.neighbor_indices(ix, connectivity))
            .unwrap_or_default()
            .into_iter()
            .map(move |n| &self.cells[n])
    }

    /// Clears the search scratch state of every cell.
    pub fn reset_search(&mut self) {
        self.cells.iter_mut().for_each(Cell::reset_search);
    }

    /// Marks the cells of `path` between its endpoints for display.
    pub fn highlight_path(&mut self, path: &Path) {
        let n = path.len();
        for point in path.points().iter().skip(1).take(n.saturating_sub(2)) {
            if let Some(ix) = self.index_of(*point) {
                self.cells[ix].on_path = true;
            }
        }
    }

    /// Links every pair of adjacent passable cells into one component.
    pub fn components(&self, connectivity: Connectivity) -> UnionFind<usize> {
        let mut components = UnionFind::new(self.cells.len());
        for ix in 0..self.cells.len() {
            if self.cells[ix].is_obstacle() {
                continue;
            }
            for n in self.neighbor_indices(ix, connectivity) {
                components.union(ix, n);
            }
        }
        components
    }

    /// Checks if `start` and `goal` are on the same connected component.
    pub fn reachable(&self, start: GridPoint, goal: GridPoint, connectivity: Connectivity) -> bool {
        match (self.index_of(start), self.index_of(goal)) {
            (Some(s), Some(g)) => self.components(connectivity).equiv(s, g),
            _ => false,
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for y in (0..self.height).rev() {
            let row = (0..self.width)
                .map(|x| match self.cells[y * self.width + x].classify() {
                    CellClass::Start => 'S',
                    CellClass::Goal => 'G',
                    CellClass::Obstacle => '#',
                    CellClass::OnPath => '*',
                    _ => '.',
                })
                .collect::<String>();
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}
