use grid_astar::{CellKind, GridPoint, HeuristicKind, Pathfinder, StepResult};

// Advances the path-queue search one move at a time on a 5x4 board with shape
// ....G
// .###.
// .....
// S....
// printing the board after every step, as an animation would.
fn main() {
    let mut pathfinder = Pathfinder::new(5, 4);
    pathfinder
        .set_cell_kind(GridPoint::new(0, 0), CellKind::Start)
        .unwrap();
    pathfinder
        .set_cell_kind(GridPoint::new(4, 3), CellKind::Goal)
        .unwrap();
    for x in 1..4 {
        pathfinder
            .set_cell_kind(GridPoint::new(x, 2), CellKind::Obstacle)
            .unwrap();
    }
    pathfinder.set_heuristic(HeuristicKind::Manhattan).unwrap();

    let mut steps = 0;
    loop {
        let result = pathfinder.step().unwrap();
        steps += 1;
        match result {
            StepResult::Advanced { head } => println!("Step {}: head at {:?}", steps, head),
            StepResult::Pruned => println!("Step {}: pruned a path", steps),
            StepResult::Completed { cost } => println!("Step {}: reached goal, cost {}", steps, cost),
            StepResult::Finished => break,
        }
        println!("{}", pathfinder);
    }
    match pathfinder.best_path() {
        Some(path) => println!("Best path has cost {} after {} steps", path.cost, steps),
        None => println!("No path after {} steps", steps),
    }
}
