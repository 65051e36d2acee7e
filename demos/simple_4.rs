use grid_astar::{CellKind, GridPoint, Pathfinder};

// In this example a path is found on a 3x3 board with shape
//   G
//  #
// S
// S marks the start
// G marks the goal
// Only the four orthogonal moves are allowed, so the path must walk around the obstacle.
fn main() {
    let mut pathfinder = Pathfinder::new(3, 3);
    pathfinder
        .set_cell_kind(GridPoint::new(0, 0), CellKind::Start)
        .unwrap();
    pathfinder
        .set_cell_kind(GridPoint::new(2, 2), CellKind::Goal)
        .unwrap();
    pathfinder
        .set_cell_kind(GridPoint::new(1, 1), CellKind::Obstacle)
        .unwrap();
    let outcome = pathfinder.run_to_completion().unwrap();
    match outcome.path() {
        Some(path) => {
            println!("Path of cost {}:", path.cost);
            for point in path.points() {
                println!("{:?}", point);
            }
        }
        None => println!("No path"),
    }
    println!("{}", pathfinder);
    print!("{}", outcome.statistics());
}
