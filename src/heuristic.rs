use crate::board::{Connectivity, GridPoint};
use core::fmt;

/// The closed set of distance estimates the engine can order its open set by.
///
/// A heuristic is selected once per run and applied uniformly to every cell. Every variant is
/// non-negative; whether it is admissible depends on the [Connectivity] it is paired with, see
/// [is_admissible_for](Self::is_admissible_for).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum HeuristicKind {
    /// Always zero, which reduces A* to Dijkstra's algorithm.
    Zero,
    /// `|dx| + |dy|`.
    #[default]
    Manhattan,
    /// `sqrt(dx² + dy²)`.
    Euclidean,
    /// `max(|dx|, |dy|)`.
    Chebyshev,
}

impl HeuristicKind {
    pub const ALL: [HeuristicKind; 4] = [
        HeuristicKind::Zero,
        HeuristicKind::Manhattan,
        HeuristicKind::Euclidean,
        HeuristicKind::Chebyshev,
    ];

    /// Estimates the remaining cost of moving from `from` to `to` with unit cost moves.
    pub fn estimate(self, from: GridPoint, to: GridPoint) -> f64 {
        let dx = (from.x - to.x).abs() as f64;
        let dy = (from.y - to.y).abs() as f64;
        match self {
            HeuristicKind::Zero => 0.0,
            HeuristicKind::Manhattan => dx + dy,
            HeuristicKind::Euclidean => dx.hypot(dy),
            HeuristicKind::Chebyshev => dx.max(dy),
        }
    }

    /// Whether the estimate never exceeds the true remaining cost under `connectivity`.
    ///
    /// With 8-connectivity a diagonal move costs the same as a straight one, so both Manhattan
    /// (counts it as 2) and Euclidean (counts it as √2) overestimate it.
    pub fn is_admissible_for(self, connectivity: Connectivity) -> bool {
        match (self, connectivity) {
            (HeuristicKind::Zero, _) | (HeuristicKind::Chebyshev, _) => true,
            (HeuristicKind::Manhattan, c) | (HeuristicKind::Euclidean, c) => {
                c == Connectivity::Four
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HeuristicKind::Zero => "Dijkstra",
            HeuristicKind::Manhattan => "Manhattan",
            HeuristicKind::Euclidean => "Euclidean",
            HeuristicKind::Chebyshev => "Chebyshev",
        }
    }
}

impl fmt::Display for HeuristicKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
