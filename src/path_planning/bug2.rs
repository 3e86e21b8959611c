//! Bug2 boundary following with the M-line leave rule
//!
//! A guiding line is fixed between the agent's start point and the
//! pursuit goal. The agent walks the line toward the goal, follows the
//! boundary of any obstacle it strikes, and leaves the boundary as soon
//! as it regains the line at a point strictly closer to the goal than
//! where it hit.

use std::collections::HashSet;

use ordered_float::OrderedFloat;

use crate::common::{point_to_line_distance, GridCell, StepPlanner};
use crate::path_planning::boundary;
use crate::utils::GridMap;

/// Distance to the guiding line that counts as being back on it [tiles]
const LINE_LEAVE_DISTANCE: f64 = 1.5;

/// Phases of the M-line state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bug2State {
    SeekGoal,
    FollowBoundary,
}

/// Bug2 planner, one instance per pursuing agent
///
/// The guiding line runs from the fixed `start` captured at
/// construction to whatever goal the current call provides.
pub struct Bug2Planner {
    state: Bug2State,
    start: GridCell,
    hit_point: Option<GridCell>,
    obstacle: HashSet<GridCell>,
}

impl Bug2Planner {
    pub fn new(start: GridCell) -> Self {
        Bug2Planner {
            state: Bug2State::SeekGoal,
            start,
            hit_point: None,
            obstacle: HashSet::new(),
        }
    }

    pub fn state(&self) -> Bug2State {
        self.state
    }

    pub fn hit_point(&self) -> Option<GridCell> {
        self.hit_point
    }

    /// Fixed origin of the guiding line
    pub fn line_start(&self) -> GridCell {
        self.start
    }

    /// Cells of the obstacle being circumnavigated
    pub fn obstacle_cells(&self) -> &HashSet<GridCell> {
        &self.obstacle
    }

    /// Distance from a cell to the guiding line toward `goal` [tiles]
    pub fn distance_to_line(&self, cell: GridCell, goal: GridCell) -> f64 {
        point_to_line_distance(cell, self.start, goal)
    }

    fn seek_step(&mut self, current: GridCell, goal: GridCell, grid: &GridMap) -> GridCell {
        let next = current.step_towards(goal);
        if grid.is_walkable(next) {
            return next;
        }

        let obstacle = boundary::identify_obstacle(grid, next);
        if obstacle.is_empty() {
            return boundary::sidestep_towards(grid, current, goal);
        }

        log::debug!(
            "bug2: hit obstacle of {} cells at ({}, {})",
            obstacle.len(),
            current.x,
            current.y
        );
        self.state = Bug2State::FollowBoundary;
        self.hit_point = Some(current);
        self.obstacle = obstacle;

        self.follow_step(current, goal, grid)
    }

    fn follow_phase(&mut self, current: GridCell, goal: GridCell, grid: &GridMap) -> GridCell {
        let hit = match self.hit_point {
            Some(hit) => hit,
            None => {
                self.state = Bug2State::SeekGoal;
                return self.seek_step(current, goal, grid);
            }
        };

        let next_direct = current.step_towards(goal);
        if self.distance_to_line(current, goal) < LINE_LEAVE_DISTANCE
            && current.distance(goal) < hit.distance(goal)
            && grid.is_walkable(next_direct)
        {
            log::debug!("bug2: regained the guiding line, leaving boundary");
            self.state = Bug2State::SeekGoal;
            self.hit_point = None;
            self.obstacle.clear();
            return next_direct;
        }

        self.follow_step(current, goal, grid)
    }

    /// Next boundary cell, preferring proximity to the guiding line
    /// with a light pull toward the goal to break symmetric ties
    fn follow_step(&self, current: GridCell, goal: GridCell, grid: &GridMap) -> GridCell {
        let candidates = boundary::boundary_candidates(grid, current, &self.obstacle);
        if candidates.is_empty() {
            return boundary::sidestep_towards(grid, current, goal);
        }

        candidates
            .into_iter()
            .min_by_key(|&c| {
                OrderedFloat(self.distance_to_line(c, goal) + 0.1 * c.distance(goal))
            })
            .unwrap_or(current)
    }
}

impl StepPlanner for Bug2Planner {
    fn plan_step(&mut self, current: GridCell, goal: GridCell, grid: &GridMap) -> GridCell {
        if current == goal {
            return current;
        }

        match self.state {
            Bug2State::SeekGoal => self.seek_step(current, goal, grid),
            Bug2State::FollowBoundary => self.follow_phase(current, goal, grid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Tile;

    #[test]
    fn test_goal_cell_returned_unchanged() {
        let mut planner = Bug2Planner::new(GridCell::new(1, 1));
        let grid = GridMap::new(10, 10);
        let cell = GridCell::new(5, 5);
        assert_eq!(planner.plan_step(cell, cell, &grid), cell);
    }

    #[test]
    fn test_open_grid_walks_straight() {
        let mut planner = Bug2Planner::new(GridCell::new(1, 4));
        let grid = GridMap::new(10, 10);
        let next = planner.plan_step(GridCell::new(1, 4), GridCell::new(7, 4), &grid);
        assert_eq!(next, GridCell::new(2, 4));
        assert_eq!(planner.state(), Bug2State::SeekGoal);
    }

    #[test]
    fn test_border_blockage_sidesteps_without_following() {
        let mut grid = GridMap::new(10, 10);
        grid.set_tile(GridCell::new(5, 0), Tile::Wall);

        let mut planner = Bug2Planner::new(GridCell::new(1, 0));
        let next = planner.plan_step(GridCell::new(4, 0), GridCell::new(8, 0), &grid);
        assert_eq!(planner.state(), Bug2State::SeekGoal);
        assert!(planner.obstacle_cells().is_empty());
        assert!(grid.is_walkable(next));
        assert_ne!(next, GridCell::new(4, 0));
    }

    #[test]
    fn test_single_obstacle_circumnavigation() {
        let mut grid = GridMap::new(10, 10);
        grid.set_tile(GridCell::new(4, 4), Tile::Wall);

        let start = GridCell::new(1, 4);
        let goal = GridCell::new(7, 4);
        let mut current = start;
        let mut planner = Bug2Planner::new(start);

        let mut followed = false;
        let perimeter = 2 * (10 + 10);

        for _ in 0..perimeter {
            current = planner.plan_step(current, goal, &grid);

            if planner.state() == Bug2State::FollowBoundary {
                followed = true;
                assert_eq!(planner.obstacle_cells().len(), 1);
                assert!(planner.obstacle_cells().contains(&GridCell::new(4, 4)));
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
    fn test_leave_requires_progress_past_hit_point() {
        let mut grid = GridMap::new(10, 10);
        grid.set_tile(GridCell::new(4, 4), Tile::Wall);

        let start = GridCell::new(1, 4);
        let goal = GridCell::new(7, 4);
        let mut current = start;
        let mut planner = Bug2Planner::new(start);

        for _ in 0..40 {
            let was_following = planner.state() == Bug2State::FollowBoundary;
            let hit = planner.hit_point();
            let before = current;

            current = planner.plan_step(current, goal, &grid);

            if was_following && planner.state() == Bug2State::SeekGoal {
                // The leave decision was taken at `before`
                let hit = hit.expect("hit point must exist while following");
                assert!(planner.distance_to_line(before, goal) < LINE_LEAVE_DISTANCE);
                assert!(before.distance(goal) < hit.distance(goal));
                return;
            }

            if current == goal {
                panic!("reached goal without ever leaving the boundary");
            }
        }

        panic!("never left the boundary");
    }
}
