//! Common traits defining the planner interfaces

use crate::common::types::GridCell;
use crate::utils::GridMap;

/// Trait for planners that produce one step per invocation
///
/// A step planner is called once per simulation tick with the agent's
/// current cell and the pursuit goal, and answers with the next cell to
/// move to. Planners keep per-agent state between calls (state machines,
/// force history), so the receiver is mutable.
pub trait StepPlanner {
    /// Compute the next grid cell to move to
    fn plan_step(&mut self, current: GridCell, goal: GridCell, grid: &GridMap) -> GridCell;
}

/// Trait for planners that produce a full cell sequence per invocation
///
/// An empty sequence means no path was found; callers fall back to
/// direct pursuit or stay put.
pub trait PathPlanner {
    /// Plan an ordered cell sequence from start to goal
    fn plan_path(&mut self, start: GridCell, goal: GridCell, grid: &GridMap) -> Vec<GridCell>;
}
