// Headless pursuit scenario exercising every planner on one map

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use pursuit_planning::common::{GridCell, PathPlanner, StepPlanner, Point2D};
use pursuit_planning::localization::{BeliefConfig, BeliefTracker};
use pursuit_planning::path_planning::{
    ApfConfig, ApfPlanner, Bug1Planner, Bug2Planner, PrmConfig, PrmPlanner, RrtConfig,
    RrtPlanner, TangentBugPlanner,
};
use pursuit_planning::utils::{DebugPlot, GridMap, Tile};

const MAX_STEPS: usize = 400;

/// Test map: bordered arena with two wall segments and a pillar
fn build_map() -> GridMap {
    let mut grid = GridMap::new(40, 30);

    for x in 0..40 {
        grid.set_tile(GridCell::new(x, 0), Tile::Wall);
        grid.set_tile(GridCell::new(x, 29), Tile::Wall);
    }
    for y in 0..30 {
        grid.set_tile(GridCell::new(0, y), Tile::Wall);
        grid.set_tile(GridCell::new(39, y), Tile::Wall);
    }

    for y in 5..20 {
        grid.set_tile(GridCell::new(14, y), Tile::Wall);
    }
    for y in 12..25 {
        grid.set_tile(GridCell::new(26, y), Tile::Wall);
    }
    for d in 0..3 {
        grid.set_tile(GridCell::new(20 + d, 8), Tile::Wall);
    }

    grid
}

fn run_step_planner(name: &str, planner: &mut dyn StepPlanner, grid: &GridMap) {
    let goal = GridCell::new(35, 15);
    let mut current = GridCell::new(3, 15);

    for step in 0..MAX_STEPS {
        current = planner.plan_step(current, goal, grid);
        if current == goal {
            println!("{}: goal reached in {} steps", name, step + 1);
            return;
        }
    }

    println!(
        "{}: still at ({}, {}) after {} steps",
        name, current.x, current.y, MAX_STEPS
    );
}

fn run_belief_tracker(grid: &GridMap) -> BeliefTracker {
    let mut tracker = BeliefTracker::new(BeliefConfig::default(), grid)
        .expect("tracker configuration is valid");

    let mut rng = StdRng::seed_from_u64(17);
    let noise = Normal::new(0.0, tracker.config().sensor_noise).expect("valid sigma");

    let tracker_pos = Point2D::new(200.0, 300.0);
    let true_target = Point2D::new(380.0, 420.0);

    for _ in 0..20 {
        tracker.predict((0, 0));
        let measurement = Point2D::new(
            true_target.x + noise.sample(&mut rng),
            true_target.y + noise.sample(&mut rng),
        );
        tracker.update(measurement, grid, tracker_pos);
    }

    let est = tracker.estimated_position();
    let mean = tracker.mean_position();
    println!(
        "belief: target at ({:.0}, {:.0}), estimate ({:.0}, {:.0}), mean ({:.0}, {:.0})",
        true_target.x, true_target.y, est.x, est.y, mean.x, mean.y
    );

    tracker
}

fn main() {
    let grid = build_map();
    let start = GridCell::new(3, 15);
    let goal = GridCell::new(35, 15);

    println!("pursuit planning demo: {}x{} map", grid.width(), grid.height());

    let mut apf = ApfPlanner::with_seed(ApfConfig::default(), 1);
    run_step_planner("potential-field", &mut apf, &grid);

    let mut bug1 = Bug1Planner::new();
    run_step_planner("bug1", &mut bug1, &grid);

    let mut bug2 = Bug2Planner::new(start);
    run_step_planner("bug2", &mut bug2, &grid);

    let mut tangent = TangentBugPlanner::default();
    run_step_planner("tangent-bug", &mut tangent, &grid);

    let mut prm = PrmPlanner::with_seed(PrmConfig::default(), 2);
    let prm_path = prm.plan_path(start, goal, &grid);
    println!("roadmap: path of {} cells", prm_path.len());

    let mut rrt = RrtPlanner::with_seed(RrtConfig::default(), 3);
    let rrt_path = rrt.plan_path(start, goal, &grid);
    println!(
        "tree: path of {} cells, goal reached: {}",
        rrt_path.len(),
        rrt.reached_goal()
    );

    let tracker = run_belief_tracker(&grid);

    let mut plot = DebugPlot::new("Pursuit planning demo");
    plot.plot_grid(&grid)
        .plot_roadmap(&grid, &prm)
        .plot_tree(&grid, &rrt)
        .plot_belief(&tracker)
        .plot_path(&grid, &prm_path, "Roadmap path")
        .plot_cell(&grid, start, "Start", pursuit_planning::utils::visualization::colors::START)
        .plot_cell(&grid, goal, "Goal", pursuit_planning::utils::visualization::colors::GOAL);

    match plot.save_svg("pursuit_demo.svg") {
        Ok(()) => println!("plot saved to pursuit_demo.svg"),
        Err(e) => println!("plot skipped: {}", e),
    }
}
