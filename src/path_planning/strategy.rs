//! Construction-time strategy selection for pursuing agents
//!
//! Each pursuing agent owns one strategy variant; the game picks the
//! variant when the agent spawns and drives it through one uniform
//! call per tick.

use crate::common::{GridCell, PathPlanner, StepPlanner};
use crate::path_planning::{
    ApfPlanner, Bug1Planner, Bug2Planner, PrmPlanner, RrtPlanner, TangentBugPlanner,
};
use crate::utils::GridMap;

/// Result of one planning call
///
/// Step planners answer with a single next cell; sequence planners
/// answer with an ordered path (possibly empty when no route exists).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    Step(GridCell),
    Path(Vec<GridCell>),
}

/// Tagged planner variant owned by one pursuing agent
pub enum PursuitStrategy {
    PotentialField(ApfPlanner),
    Bug1(Bug1Planner),
    Bug2(Bug2Planner),
    TangentBug(TangentBugPlanner),
    Roadmap(PrmPlanner),
    Tree(RrtPlanner),
}

impl PursuitStrategy {
    /// Run one planning call against the grid snapshot
    pub fn plan(&mut self, current: GridCell, goal: GridCell, grid: &GridMap) -> PlanOutcome {
        match self {
            PursuitStrategy::PotentialField(p) => PlanOutcome::Step(p.plan_step(current, goal, grid)),
            PursuitStrategy::Bug1(p) => PlanOutcome::Step(p.plan_step(current, goal, grid)),
            PursuitStrategy::Bug2(p) => PlanOutcome::Step(p.plan_step(current, goal, grid)),
            PursuitStrategy::TangentBug(p) => PlanOutcome::Step(p.plan_step(current, goal, grid)),
            PursuitStrategy::Roadmap(p) => PlanOutcome::Path(p.plan_path(current, goal, grid)),
            PursuitStrategy::Tree(p) => PlanOutcome::Path(p.plan_path(current, goal, grid)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PursuitStrategy::PotentialField(_) => "potential-field",
            PursuitStrategy::Bug1(_) => "bug1",
            PursuitStrategy::Bug2(_) => "bug2",
            PursuitStrategy::TangentBug(_) => "tangent-bug",
            PursuitStrategy::Roadmap(_) => "roadmap",
            PursuitStrategy::Tree(_) => "tree",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_planning::{ApfConfig, PrmConfig, RrtConfig};

    fn all_strategies() -> Vec<PursuitStrategy> {
        vec![
            PursuitStrategy::PotentialField(ApfPlanner::with_seed(ApfConfig::default(), 1)),
            PursuitStrategy::Bug1(Bug1Planner::new()),
            PursuitStrategy::Bug2(Bug2Planner::new(GridCell::new(5, 5))),
            PursuitStrategy::TangentBug(TangentBugPlanner::default()),
            PursuitStrategy::Roadmap(PrmPlanner::with_seed(PrmConfig::default(), 1)),
            PursuitStrategy::Tree(RrtPlanner::with_seed(RrtConfig::default(), 1)),
        ]
    }

    #[test]
    fn test_every_strategy_is_idle_at_goal() {
        let grid = GridMap::new(10, 10);
        let cell = GridCell::new(5, 5);

        for mut strategy in all_strategies() {
            match strategy.plan(cell, cell, &grid) {
                PlanOutcome::Step(next) => assert_eq!(next, cell, "{}", strategy.name()),
                PlanOutcome::Path(path) => assert_eq!(path, vec![cell], "{}", strategy.name()),
            }
        }
    }

    #[test]
    fn test_every_strategy_makes_progress_in_the_open() {
        let grid = GridMap::new(20, 20);
        let current = GridCell::new(3, 10);
        let goal = GridCell::new(16, 10);

        for mut strategy in all_strategies() {
            match strategy.plan(current, goal, &grid) {
                PlanOutcome::Step(next) => {
                    assert_ne!(next, current, "{}", strategy.name());
                    assert!(grid.is_walkable(next), "{}", strategy.name());
                }
                PlanOutcome::Path(path) => {
                    assert!(path.len() >= 2, "{}", strategy.name());
                    assert_eq!(path[0], current, "{}", strategy.name());
                }
            }
        }
    }
}
