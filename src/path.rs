use crate::board::{Board, Connectivity, GridPoint};
use crate::MOVE_COST;
use itertools::Itertools;
use log::error;

/// An ordered run of cells from the start, with the accumulated cost of its moves. During
/// incremental search a [Path] may be a partial prefix that has not reached the goal yet.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    points: Vec<GridPoint>,
    pub cost: f64,
}

impl Path {
    /// A zero-cost path consisting of `start` alone.
    pub fn new(start: GridPoint) -> Path {
        Path {
            points: vec![start],
            cost: 0.0,
        }
    }

    pub(crate) fn from_points(points: Vec<GridPoint>, cost: f64) -> Path {
        Path { points, cost }
    }

    pub fn points(&self) -> &[GridPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<GridPoint> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<GridPoint> {
        self.points.last().copied()
    }

    pub fn contains(&self, point: GridPoint) -> bool {
        self.points.contains(&point)
    }

    /// Appends one unit-cost move.
    pub fn push(&mut self, point: GridPoint) {
        self.points.push(point);
        self.cost += MOVE_COST;
    }

    /// A copy of this path extended by one move to `point`.
    pub fn extended(&self, point: GridPoint) -> Path {
        let mut path = self.clone();
        path.push(point);
        path
    }

    /// Whether every consecutive pair of points is one move apart under `connectivity`.
    pub fn is_contiguous(&self, connectivity: Connectivity) -> bool {
        self.points
            .iter()
            .tuple_windows()
            .all(|(a, b)| connectivity.adjacent(*a, *b))
    }
}

/// Follows the parent chain from `goal` back to the board's start and returns the path in start
/// to goal order.
///
/// Returns [None] if `goal` is off the board, the board has no start, or the chain does not reach
/// the start within `width * height` steps, which indicates corrupt search state.
pub fn reconstruct(board: &Board, goal: GridPoint) -> Option<Path> {
    let goal_ix = board.index_of(goal)?;
    let start_ix = board.start_index()?;
    reconstruct_from(board, start_ix, goal_ix)
}

pub(crate) fn reconstruct_from(board: &Board, start: usize, goal: usize) -> Option<Path> {
    let mut indices = vec![goal];
    let mut current = goal;
    while current != start {
        if indices.len() > board.len() {
            error!(
                "Parent chain from {:?} did not reach {:?} within {} steps",
                board.point_of(goal),
                board.point_of(start),
                board.len()
            );
            return None;
        }
        current = board.cell(current).parent()?;
        indices.push(current);
    }
    let points: Vec<GridPoint> = indices.into_iter().rev().map(|ix| board.point_of(ix)).collect();
    let cost = (points.len() - 1) as f64 * MOVE_COST;
    Some(Path::from_points(points, cost))
}
