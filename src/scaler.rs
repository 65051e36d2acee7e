use crate::board::{checked_cell_count, Board, CellKind, GridPoint};
use crate::error::SearchError;
use grid_util::point::Point;
use itertools::iproduct;
use log::info;

/// Rebuilds `board` at `factor` times its resolution.
///
/// Every cell becomes a `factor x factor` block. Obstacles fill their whole block, while the start
/// and goal move to the block's smallest sub-cell (smallest x, then smallest y) so that exactly
/// one cell inherits each endpoint. The result carries no search state. Returns the new board with
/// its start and goal. Fails with [SearchError::InvalidScaleFactor] when the factor is zero or the
/// result would exceed [MAX_CELLS](crate::MAX_CELLS).
pub fn scale(
    board: &Board,
    factor: usize,
) -> Result<(Board, Option<GridPoint>, Option<GridPoint>), SearchError> {
    // Coordinates are i32, so each side must stay addressable.
    let scaled_side = |n: usize| {
        n.checked_mul(factor)
            .filter(|&side| side <= i32::MAX as usize)
    };
    let (width, height) = match (scaled_side(board.width()), scaled_side(board.height())) {
        (Some(w), Some(h)) if factor > 0 && checked_cell_count(w, h).is_some() => (w, h),
        _ => return Err(SearchError::InvalidScaleFactor(factor)),
    };
    let mut scaled = Board::new(width, height);
    let f = factor as i32;
    for cell in board.cells() {
        let origin = cell.position();
        let anchor = Point::new(origin.x * f, origin.y * f);
        match cell.kind() {
            CellKind::Empty => {}
            CellKind::Obstacle => {
                for (dx, dy) in iproduct!(0..f, 0..f) {
                    scaled.set_kind(Point::new(anchor.x + dx, anchor.y + dy), CellKind::Obstacle)?;
                }
            }
            kind @ (CellKind::Start | CellKind::Goal) => scaled.set_kind(anchor, kind)?,
        }
    }
    info!(
        "Scaled {}x{} board by {} to {}x{}",
        board.width(),
        board.height(),
        factor,
        width,
        height
    );
    let (start, goal) = (scaled.start(), scaled.goal());
    Ok((scaled, start, goal))
}
