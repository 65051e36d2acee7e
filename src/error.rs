use crate::board::{Connectivity, GridPoint};
use crate::heuristic::HeuristicKind;
use core::fmt;

/// The endpoint that was missing when a run was requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Start,
    Goal,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Endpoint::Start => write!(f, "start"),
            Endpoint::Goal => write!(f, "goal"),
        }
    }
}

/// Errors surfaced to the caller of the search engine.
///
/// An exhausted search is not an error: it is reported as
/// [SearchOutcome::Exhausted](crate::solver::SearchOutcome::Exhausted).
#[derive(Clone, Debug, PartialEq)]
pub enum SearchError {
    /// A run was requested without both endpoints on the board.
    MissingEndpoint(Endpoint),
    /// A configuration call addressed a point outside the board.
    OutOfBounds {
        point: GridPoint,
        width: usize,
        height: usize,
    },
    /// A run or configuration change was requested while a search is in flight.
    AlreadyRunning,
    /// Search scratch state is corrupt. Should never occur under correct use.
    InvariantViolation(&'static str),
    /// The heuristic may overestimate under the requested connectivity.
    InadmissibleHeuristic {
        heuristic: HeuristicKind,
        connectivity: Connectivity,
    },
    /// Connectivity other than 4 or 8 was requested.
    InvalidConnectivity(u8),
    /// Scale factor is zero or the scaled board would exceed [MAX_CELLS](crate::MAX_CELLS).
    InvalidScaleFactor(usize),
    /// The board is too small for the requested operation or exceeds
    /// [MAX_CELLS](crate::MAX_CELLS).
    InvalidDimensions { width: usize, height: usize },
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SearchError::MissingEndpoint(endpoint) => {
                write!(f, "no {} has been placed on the board", endpoint)
            }
            SearchError::OutOfBounds {
                point,
                width,
                height,
            } => write!(f, "{:?} lies outside the {}x{} board", point, width, height),
            SearchError::AlreadyRunning => write!(f, "a search is already running"),
            SearchError::InvariantViolation(what) => {
                write!(f, "search state invariant violated: {}", what)
            }
            SearchError::InadmissibleHeuristic {
                heuristic,
                connectivity,
            } => write!(
                f,
                "{} heuristic overestimates under {} movement",
                heuristic, connectivity
            ),
            SearchError::InvalidConnectivity(n) => {
                write!(f, "connectivity must be 4 or 8, got {}", n)
            }
            SearchError::InvalidScaleFactor(factor) => {
                write!(f, "invalid scale factor {}", factor)
            }
            SearchError::InvalidDimensions { width, height } => {
                write!(f, "a {}x{} board is not supported", width, height)
            }
        }
    }
}

impl std::error::Error for SearchError {}
