use grid_astar::{Connectivity, HeuristicKind, Pathfinder, SearchConfig};
use rand::prelude::*;

// Generates a random 8x8 board, solves it, then solves the same board scaled up by 4 and compares
// the costs and the number of expanded cells.
fn main() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut pathfinder = Pathfinder::new(8, 8);
    pathfinder
        .configure(SearchConfig::new(HeuristicKind::Chebyshev, Connectivity::Eight))
        .unwrap();
    pathfinder.randomize(0.25, &mut rng).unwrap();
    let coarse = pathfinder.run_to_completion().unwrap();
    println!("{}", pathfinder);
    println!("8x8: cost {:?}, expanded {}", coarse.cost(), coarse.nodes_expanded());

    pathfinder.scale(4).unwrap();
    let fine = pathfinder.run_to_completion().unwrap();
    println!(
        "32x32: cost {:?}, expanded {}",
        fine.cost(),
        fine.nodes_expanded()
    );
}
