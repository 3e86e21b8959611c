//! Bug1 boundary following with the hit-point leave rule
//!
//! The agent walks straight at the goal until a step would land inside
//! an obstacle, circumnavigates that specific obstacle while recording
//! the boundary point closest to the goal, and leaves the boundary from
//! that point once the loop closes back near the hit point.

use std::collections::HashSet;

use ordered_float::OrderedFloat;

use crate::common::{GridCell, StepPlanner};
use crate::path_planning::boundary;
use crate::utils::GridMap;

/// Boundary cells that must be visited before a circumnavigation may end
const MIN_BOUNDARY_VISITS: usize = 10;
/// Loop closure distance back to the hit point [tiles]
const HIT_RETURN_RADIUS: f64 = 1.5;

/// Phases of the hit-point state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bug1State {
    SeekGoal,
    FollowBoundary,
    ReturnToLeavePoint,
}

/// Bug1 planner, one instance per pursuing agent
pub struct Bug1Planner {
    state: Bug1State,
    hit_point: Option<GridCell>,
    leave_point: Option<GridCell>,
    min_goal_distance: f64,
    visited: Vec<GridCell>,
    obstacle: HashSet<GridCell>,
}

impl Bug1Planner {
    pub fn new() -> Self {
        Bug1Planner {
            state: Bug1State::SeekGoal,
            hit_point: None,
            leave_point: None,
            min_goal_distance: f64::INFINITY,
            visited: Vec::new(),
            obstacle: HashSet::new(),
        }
    }

    pub fn state(&self) -> Bug1State {
        self.state
    }

    pub fn hit_point(&self) -> Option<GridCell> {
        self.hit_point
    }

    pub fn leave_point(&self) -> Option<GridCell> {
        self.leave_point
    }

    /// Boundary cells visited during the current circumnavigation
    pub fn visited_cells(&self) -> &[GridCell] {
        &self.visited
    }

    /// Cells of the obstacle being circumnavigated
    pub fn obstacle_cells(&self) -> &HashSet<GridCell> {
        &self.obstacle
    }

    fn reset_episode(&mut self) {
        self.state = Bug1State::SeekGoal;
        self.hit_point = None;
        self.leave_point = None;
        self.min_goal_distance = f64::INFINITY;
        self.visited.clear();
        self.obstacle.clear();
    }

    fn seek_step(&mut self, current: GridCell, goal: GridCell, grid: &GridMap) -> GridCell {
        let next = current.step_towards(goal);
        if grid.is_walkable(next) {
            return next;
        }

        let obstacle = boundary::identify_obstacle(grid, next);
        if obstacle.is_empty() {
            // Blocked by the border or a transient entity, not an
            // obstacle worth circumnavigating
            return boundary::sidestep_towards(grid, current, goal);
        }

        log::debug!(
            "bug1: hit obstacle of {} cells at ({}, {})",
            obstacle.len(),
            current.x,
            current.y
        );
        self.state = Bug1State::FollowBoundary;
        self.hit_point = Some(current);
        self.leave_point = Some(current);
        self.min_goal_distance = current.distance(goal);
        self.visited.clear();
        self.obstacle = obstacle;

        self.follow_phase(current, goal, grid)
    }

    fn follow_phase(&mut self, current: GridCell, goal: GridCell, grid: &GridMap) -> GridCell {
        let dist_goal = current.distance(goal);
        if dist_goal < self.min_goal_distance {
            self.min_goal_distance = dist_goal;
            self.leave_point = Some(current);
        }

        if let Some(hit) = self.hit_point {
            if self.visited.len() >= MIN_BOUNDARY_VISITS
                && current.distance(hit) < HIT_RETURN_RADIUS
            {
                log::debug!("bug1: circumnavigation closed, returning to leave point");
                self.state = Bug1State::ReturnToLeavePoint;
                return self.return_phase(current, goal, grid);
            }
        }

        self.visited.push(current);
        self.follow_step(current, goal, grid)
    }

    /// Next boundary cell, keeping the established turning sense
    ///
    /// Candidates are walkable neighbors that stay adjacent to the
    /// obstacle. Backtracking is avoided first, then already visited
    /// cells, then candidates that would reverse the turning sense of
    /// the previous two steps; remaining ties go to the straightest
    /// continuation. The first step of an episode has no history and
    /// simply leans toward the goal.
    fn follow_step(&self, current: GridCell, goal: GridCell, grid: &GridMap) -> GridCell {
        let candidates = boundary::boundary_candidates(grid, current, &self.obstacle);
        if candidates.is_empty() {
            return boundary::sidestep_towards(grid, current, goal);
        }

        // `visited` ends with `current`; the cell before it gives the
        // incoming direction, one further back the previous turn.
        let n = self.visited.len();
        let prev_cell = if n >= 2 { Some(self.visited[n - 2]) } else { None };
        let prev_dir = prev_cell
            .map(|p| (current.x - p.x, current.y - p.y))
            .filter(|&d| d != (0, 0));
        let turn_sign = if n >= 3 {
            let before = self.visited[n - 3];
            let a = (
                self.visited[n - 2].x - before.x,
                self.visited[n - 2].y - before.y,
            );
            let b = prev_dir.unwrap_or((0, 0));
            (a.0 * b.1 - a.1 * b.0).signum()
        } else {
            0
        };

        candidates
            .into_iter()
            .min_by_key(|&c| {
                let backtrack = prev_cell == Some(c);
                let revisit = self.visited.contains(&c);

                match prev_dir {
                    Some(d) => {
                        let dc = (c.x - current.x, c.y - current.y);
                        let cross = d.0 * dc.1 - d.1 * dc.0;
                        let sense_break =
                            turn_sign != 0 && cross != 0 && cross.signum() != turn_sign;

                        let d_norm = ((d.0 * d.0 + d.1 * d.1) as f64).sqrt();
                        let dc_norm = ((dc.0 * dc.0 + dc.1 * dc.1) as f64).sqrt();
                        let cos = (d.0 * dc.0 + d.1 * dc.1) as f64 / (d_norm * dc_norm);

                        (backtrack, revisit, sense_break, OrderedFloat(-cos))
                    }
                    None => (backtrack, revisit, false, OrderedFloat(c.distance(goal))),
                }
            })
            .unwrap_or(current)
    }

    fn return_phase(&mut self, current: GridCell, goal: GridCell, grid: &GridMap) -> GridCell {
        if grid.line_of_sight(current, goal) {
            self.reset_episode();
            return self.seek_step(current, goal, grid);
        }

        let target = match self.leave_point {
            Some(target) => target,
            None => {
                self.reset_episode();
                return self.seek_step(current, goal, grid);
            }
        };

        if current == target {
            // Arrived without regaining sight; start a fresh episode
            self.reset_episode();
            return self.seek_step(current, goal, grid);
        }

        let next = current.step_towards(target);
        if grid.is_walkable(next) {
            return next;
        }

        grid.neighbors(current, true)
            .into_iter()
            .min_by_key(|n| OrderedFloat(n.distance(target)))
            .unwrap_or(current)
    }
}

impl Default for Bug1Planner {
    fn default() -> Self {
        Self::new()
    }
}

impl StepPlanner for Bug1Planner {
    fn plan_step(&mut self, current: GridCell, goal: GridCell, grid: &GridMap) -> GridCell {
        if current == goal {
            return current;
        }

        match self.state {
            Bug1State::SeekGoal => self.seek_step(current, goal, grid),
            Bug1State::FollowBoundary => self.follow_phase(current, goal, grid),
            Bug1State::ReturnToLeavePoint => self.return_phase(current, goal, grid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Tile;

    #[test]
    fn test_goal_cell_returned_unchanged() {
        let mut planner = Bug1Planner::new();
        let grid = GridMap::new(10, 10);
        let cell = GridCell::new(5, 5);
        assert_eq!(planner.plan_step(cell, cell, &grid), cell);
        assert_eq!(planner.state(), Bug1State::SeekGoal);
    }

    #[test]
    fn test_open_grid_walks_straight() {
        let mut planner = Bug1Planner::new();
        let grid = GridMap::new(10, 10);
        let next = planner.plan_step(GridCell::new(1, 4), GridCell::new(7, 4), &grid);
        assert_eq!(next, GridCell::new(2, 4));
        assert_eq!(planner.state(), Bug1State::SeekGoal);
    }

    #[test]
    fn test_border_blockage_sidesteps_without_following() {
        // The struck cell sits on the map border, so the flood fill
        // finds no interior obstacle and the planner stays seeking
        let mut grid = GridMap::new(10, 10);
        grid.set_tile(GridCell::new(5, 0), Tile::Wall);

        let mut planner = Bug1Planner::new();
        let next = planner.plan_step(GridCell::new(4, 0), GridCell::new(8, 0), &grid);
        assert_eq!(planner.state(), Bug1State::SeekGoal);
        assert!(planner.obstacle_cells().is_empty());
        assert!(grid.is_walkable(next));
        assert_ne!(next, GridCell::new(4, 0));
    }

    #[test]
    fn test_single_obstacle_circumnavigation() {
        let mut grid = GridMap::new(10, 10);
        grid.set_tile(GridCell::new(4, 4), Tile::Wall);

        let goal = GridCell::new(7, 4);
        let mut current = GridCell::new(1, 4);
        let mut planner = Bug1Planner::new();

        let mut followed = false;
        let mut frozen_obstacle = None;
        let perimeter = 2 * (10 + 10);

        for _ in 0..perimeter {
            current = planner.plan_step(current, goal, &grid);

            if planner.state() == Bug1State::FollowBoundary {
                followed = true;
                let obstacle = planner.obstacle_cells().clone();
                assert_eq!(obstacle.len(), 1);
                assert!(obstacle.contains(&GridCell::new(4, 4)));

                // The chosen obstacle never changes mid-episode
                if let Some(ref frozen) = frozen_obstacle {
                    assert_eq!(*frozen, obstacle);
                }
                frozen_obstacle = Some(obstacle);
            }

            assert!(grid.is_walkable(current));
            if current == goal {
                break;
            }
        }

        assert!(followed);
        assert_eq!(current, goal);
    }

    #[test]
    fn test_leave_point_tracks_minimum_goal_distance() {
        let mut grid = GridMap::new(12, 12);
        grid.set_tile(GridCell::new(5, 5), Tile::Wall);

        let goal = GridCell::new(9, 5);
        let mut current = GridCell::new(2, 5);
        let mut planner = Bug1Planner::new();

        for _ in 0..30 {
            current = planner.plan_step(current, goal, &grid);
            if planner.state() != Bug1State::FollowBoundary {
                continue;
            }

            // The leave point is never farther from the goal than any
            // boundary cell visited so far
            if let Some(leave) = planner.leave_point() {
                let leave_d = leave.distance(goal);
                for v in planner.visited_cells() {
                    assert!(leave_d <= v.distance(goal) + 1e-9);
                }
            }
        }
    }
}
