//! Tangent bug pursuit
//!
//! Travels straight at the goal whenever line-of-sight holds. When the
//! view is blocked, a bounded sensor window is scanned for tangent
//! points: visible free cells hugging the blocking obstacles. The
//! candidate making the most progress along the goal direction wins.

use itertools::iproduct;
use ordered_float::OrderedFloat;

use crate::common::{GridCell, StepPlanner};
use crate::utils::GridMap;

/// Default half-width of the square sensor window [tiles]
pub const DEFAULT_SENSOR_RANGE: i32 = 10;

/// Tangent bug planner
pub struct TangentBugPlanner {
    sensor_range: i32,
    last_tangent_point: Option<GridCell>,
}

impl TangentBugPlanner {
    pub fn new(sensor_range: i32) -> Self {
        TangentBugPlanner {
            sensor_range,
            last_tangent_point: None,
        }
    }

    pub fn sensor_range(&self) -> i32 {
        self.sensor_range
    }

    /// Most recent tangent point, for visualization only
    pub fn last_tangent_point(&self) -> Option<GridCell> {
        self.last_tangent_point
    }

    /// Best tangent point visible from `current`
    ///
    /// Scans the sensor window for blocked cells, gathers their
    /// walkable neighbors that are visible from the agent, and keeps
    /// the candidate maximizing progress toward the goal: the
    /// projection of the candidate offset onto the goal direction.
    fn find_tangent_point(
        &self,
        current: GridCell,
        goal: GridCell,
        grid: &GridMap,
    ) -> Option<GridCell> {
        let goal_dist = current.distance(goal);
        if goal_dist == 0.0 {
            return None;
        }
        let dir_x = (goal.x - current.x) as f64 / goal_dist;
        let dir_y = (goal.y - current.y) as f64 / goal_dist;

        let r = self.sensor_range;
        let mut best: Option<(f64, GridCell)> = None;

        for (dy, dx) in iproduct!(-r..=r, -r..=r) {
            let cell = GridCell::new(current.x + dx, current.y + dy);
            if grid.is_walkable(cell) {
                continue;
            }

            for candidate in grid.neighbors(cell, true) {
                if !grid.line_of_sight(current, candidate) {
                    continue;
                }

                let progress = (candidate.x - current.x) as f64 * dir_x
                    + (candidate.y - current.y) as f64 * dir_y;

                match best {
                    Some((best_progress, _)) if best_progress >= progress => {}
                    _ => best = Some((progress, candidate)),
                }
            }
        }

        best.map(|(_, cell)| cell)
    }

    /// Whether a walkable cell borders a blocking tile (8-adjacency)
    fn hugs_obstacle(cell: GridCell, grid: &GridMap) -> bool {
        iproduct!(-1..=1, -1..=1)
            .filter(|&(dx, dy)| (dx, dy) != (0, 0))
            .map(|(dx, dy)| GridCell::new(cell.x + dx, cell.y + dy))
            .any(|n| grid.is_valid(n) && !grid.is_walkable(n))
    }
}

impl Default for TangentBugPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_SENSOR_RANGE)
    }
}

impl StepPlanner for TangentBugPlanner {
    fn plan_step(&mut self, current: GridCell, goal: GridCell, grid: &GridMap) -> GridCell {
        if current == goal {
            return current;
        }

        if grid.line_of_sight(current, goal) {
            let next = current.step_towards(goal);
            if grid.is_walkable(next) {
                return next;
            }
            // Direct cell momentarily blocked; fall through to the
            // neighbor fallback below
        } else if let Some(tangent) = self.find_tangent_point(current, goal, grid) {
            self.last_tangent_point = Some(tangent);
            let next = current.step_towards(tangent);
            if grid.is_walkable(next) {
                return next;
            }
        }

        // No usable tangent point: greedy neighbor, preferring cells
        // that keep hugging a wall
        grid.neighbors(current, true)
            .into_iter()
            .min_by_key(|&n| {
                let hugging = if Self::hugs_obstacle(n, grid) { 0 } else { 1 };
                (OrderedFloat(n.distance(goal)), hugging)
            })
            .unwrap_or(current)
    }
}
