//! Artificial potential field pursuit
//!
//! The agent is pulled toward the goal and pushed away from nearby
//! obstacle tiles; one planning call advances one grid cell along the
//! net force. Near-zero net force means the attractive and repulsive
//! terms cancel (a local minimum) and triggers a random-walk escape.

use std::collections::VecDeque;

use itertools::iproduct;
use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::{GridCell, Point2D, StepPlanner};
use crate::utils::GridMap;

/// Force magnitudes kept for local-minimum detection
const FORCE_HISTORY_LEN: usize = 20;
/// Net force below this magnitude counts as a stall
const STALL_FORCE: f64 = 0.01;

/// Configuration for the potential field planner
#[derive(Debug, Clone)]
pub struct ApfConfig {
    /// Attractive gain toward the goal
    pub attract_gain: f64,
    /// Repulsive gain away from obstacles
    pub repulse_gain: f64,
    /// Obstacles farther than this exert no force [world units]
    pub influence_distance: f64,
    /// Obstacle gathering radius around the agent [tiles]
    pub scan_radius: i32,
    /// Average force below this over the window flags a local minimum
    pub local_min_threshold: f64,
    /// Number of recent force samples averaged by the detector
    pub local_min_window: usize,
}

impl Default for ApfConfig {
    fn default() -> Self {
        Self {
            attract_gain: 1.5,
            repulse_gain: 150.0,
            influence_distance: 60.0,
            scan_radius: 5,
            local_min_threshold: 0.3,
            local_min_window: 10,
        }
    }
}

/// Potential field planner with per-agent escape state
pub struct ApfPlanner {
    config: ApfConfig,
    rng: StdRng,
    force_history: VecDeque<f64>,
    escape_direction: Option<Vector2<f64>>,
    escape_timer: f64,
}

impl ApfPlanner {
    pub fn new(config: ApfConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a planner with a deterministic escape sequence
    pub fn with_seed(config: ApfConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: ApfConfig, rng: StdRng) -> Self {
        ApfPlanner {
            config,
            rng,
            force_history: VecDeque::new(),
            escape_direction: None,
            escape_timer: 0.0,
        }
    }

    pub fn config(&self) -> &ApfConfig {
        &self.config
    }

    /// Net force at `pos` from goal attraction and obstacle repulsion
    pub fn compute_force(&self, pos: Point2D, goal: Point2D, obstacles: &[Point2D]) -> Vector2<f64> {
        self.attractive_force(pos, goal) + self.repulsive_force(pos, obstacles)
    }

    fn attractive_force(&self, pos: Point2D, goal: Point2D) -> Vector2<f64> {
        let diff = goal.to_vector() - pos.to_vector();
        let dist = diff.norm();

        // Inside one world unit the direction is meaningless
        if dist < 1.0 {
            return Vector2::zeros();
        }

        diff * (self.config.attract_gain / dist)
    }

    fn repulsive_force(&self, pos: Point2D, obstacles: &[Point2D]) -> Vector2<f64> {
        let mut total = Vector2::zeros();

        for obs in obstacles {
            let diff = pos.to_vector() - obs.to_vector();
            let dist = diff.norm();

            if dist > self.config.influence_distance || dist < 1.0 {
                continue;
            }

            let magnitude = self.config.repulse_gain
                * (1.0 / dist - 1.0 / self.config.influence_distance)
                / (dist * dist);

            total += diff * (magnitude / dist);
        }

        total
    }

    /// World centers of blocked tiles within the scan radius
    pub fn nearby_obstacles(&self, center: GridCell, grid: &GridMap) -> Vec<Point2D> {
        let r = self.config.scan_radius;

        iproduct!(-r..=r, -r..=r)
            .map(|(dx, dy)| GridCell::new(center.x + dx, center.y + dy))
            .filter(|&cell| grid.is_valid(cell) && !grid.is_walkable(cell))
            .map(|cell| grid.grid_to_world(cell))
            .collect()
    }

    /// Record a force magnitude for the local-minimum detector
    pub fn record_force(&mut self, magnitude: f64) {
        self.force_history.push_back(magnitude);
        if self.force_history.len() > FORCE_HISTORY_LEN {
            self.force_history.pop_front();
        }
    }

    /// Whether the recent force average has collapsed below threshold
    pub fn local_minimum_detected(&self) -> bool {
        let window = self.config.local_min_window;
        if self.force_history.len() < window {
            return false;
        }

        let recent: f64 = self.force_history.iter().rev().take(window).sum();
        recent / window as f64 < self.config.local_min_threshold
    }

    /// Begin a timed escape in a uniformly random direction
    pub fn start_escape(&mut self, duration: f64) {
        let angle = self.rng.gen_range(0.0..std::f64::consts::TAU);
        self.escape_direction = Some(Vector2::new(angle.cos(), angle.sin()));
        self.escape_timer = duration;
    }

    /// Direction of the active escape, if any
    pub fn escape_direction(&self) -> Option<Vector2<f64>> {
        self.escape_direction
    }

    /// Advance the escape timer; the escape ends when it expires
    pub fn tick_escape(&mut self, dt: f64) {
        if self.escape_direction.is_none() {
            return;
        }

        self.escape_timer -= dt;
        if self.escape_timer <= 0.0 {
            self.escape_direction = None;
            self.escape_timer = 0.0;
        }
    }
}

impl StepPlanner for ApfPlanner {
    fn plan_step(&mut self, current: GridCell, goal: GridCell, grid: &GridMap) -> GridCell {
        if current == goal {
            return current;
        }

        let pos = grid.grid_to_world(current);
        let goal_pos = grid.grid_to_world(goal);
        let obstacles = self.nearby_obstacles(current, grid);

        let force = self.compute_force(pos, goal_pos, &obstacles);

        if force.norm() < STALL_FORCE {
            // Local minimum: try a random walkable neighbor
            let neighbors = grid.neighbors(current, true);
            if neighbors.is_empty() {
                return current;
            }
            return neighbors[self.rng.gen_range(0..neighbors.len())];
        }

        // Advance half a tile along the force and snap to that cell
        let step = force * (grid.tile_size() * 0.5);
        let next = grid.world_to_grid(Point2D::new(pos.x + step.x, pos.y + step.y));

        if grid.is_walkable(next) {
            next
        } else {
            current
        }
    }
}
