//! Rapidly-exploring random tree pursuit planning
//!
//! The tree is grown from scratch on every planning call, which keeps
//! the planner naturally adaptive to a changing map at the price of
//! recomputation. Sampling is goal-biased; steering is capped at a
//! fixed step size and every extension must hold line-of-sight.

use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::{GridCell, PathPlanner};
use crate::utils::GridMap;

/// Configuration for the tree planner
#[derive(Debug, Clone)]
pub struct RrtConfig {
    /// Maximum growth iterations per call
    pub max_iterations: usize,
    /// Maximum extension per step [tiles]
    pub step_size: f64,
    /// Probability of sampling the goal instead of a random point
    pub goal_sample_rate: f64,
}

impl Default for RrtConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            step_size: 2.0,
            goal_sample_rate: 0.15,
        }
    }
}

/// Tree planner; the tree never survives across calls
pub struct RrtPlanner {
    config: RrtConfig,
    rng: StdRng,
    nodes: Vec<GridCell>,
    parents: Vec<Option<usize>>,
    goal_index: Option<usize>,
}

impl RrtPlanner {
    pub fn new(config: RrtConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a planner with deterministic tree growth
    pub fn with_seed(config: RrtConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: RrtConfig, rng: StdRng) -> Self {
        RrtPlanner {
            config,
            rng,
            nodes: Vec::new(),
            parents: Vec::new(),
            goal_index: None,
        }
    }

    /// Nodes of the last grown tree
    pub fn nodes(&self) -> &[GridCell] {
        &self.nodes
    }

    /// Parent index per node; the root has none
    pub fn parents(&self) -> &[Option<usize>] {
        &self.parents
    }

    /// Parent-child edges of the last grown tree
    pub fn edges(&self) -> Vec<(GridCell, GridCell)> {
        self.parents
            .iter()
            .enumerate()
            .filter_map(|(i, parent)| parent.map(|p| (self.nodes[p], self.nodes[i])))
            .collect()
    }

    /// Whether the last call connected all the way to the goal
    pub fn reached_goal(&self) -> bool {
        self.goal_index.is_some()
    }

    fn nearest(&self, target: GridCell) -> usize {
        (0..self.nodes.len())
            .min_by_key(|&i| OrderedFloat(self.nodes[i].distance(target)))
            .unwrap_or(0)
    }

    /// Move from `from` toward `to`, at most `step_size` tiles
    fn steer(&self, from: GridCell, to: GridCell) -> GridCell {
        let dist = from.distance(to);
        if dist < self.config.step_size {
            return to;
        }

        let ratio = self.config.step_size / dist;
        GridCell::new(
            (from.x as f64 + (to.x - from.x) as f64 * ratio) as i32,
            (from.y as f64 + (to.y - from.y) as f64 * ratio) as i32,
        )
    }

    fn sample(&mut self, goal: GridCell, grid: &GridMap) -> GridCell {
        if self.rng.gen::<f64>() < self.config.goal_sample_rate {
            return goal;
        }

        let (width, height) = (grid.width() as i32, grid.height() as i32);
        if width < 3 || height < 3 {
            return goal;
        }

        GridCell::new(
            self.rng.gen_range(1..width - 1),
            self.rng.gen_range(1..height - 1),
        )
    }

    fn extract_path(&self, target: usize) -> Vec<GridCell> {
        let mut path = Vec::new();
        let mut current = Some(target);

        while let Some(i) = current {
            path.push(self.nodes[i]);
            current = self.parents[i];
        }

        path.reverse();
        path
    }
}

impl PathPlanner for RrtPlanner {
    /// Grow a fresh tree from `start` and extract a path
    ///
    /// On iteration exhaustion the path leads to the tree node nearest
    /// the goal; callers must not assume the final cell is the goal.
    fn plan_path(&mut self, start: GridCell, goal: GridCell, grid: &GridMap) -> Vec<GridCell> {
        self.nodes = vec![start];
        self.parents = vec![None];
        self.goal_index = None;

        if start == goal {
            return vec![start];
        }

        for _ in 0..self.config.max_iterations {
            let sample = self.sample(goal, grid);
            let nearest_idx = self.nearest(sample);
            let new_node = self.steer(self.nodes[nearest_idx], sample);

            if !grid.is_walkable(new_node) {
                continue;
            }
            if !grid.line_of_sight(self.nodes[nearest_idx], new_node) {
                continue;
            }

            let new_idx = self.nodes.len();
            self.nodes.push(new_node);
            self.parents.push(Some(nearest_idx));

            // Close enough to try a direct goal connection
            if new_node.distance(goal) < self.config.step_size * 2.0
                && grid.line_of_sight(new_node, goal)
            {
                self.nodes.push(goal);
                self.parents.push(Some(new_idx));
                self.goal_index = Some(self.nodes.len() - 1);
                break;
            }
        }

        match self.goal_index {
            Some(idx) => self.extract_path(idx),
            None => {
                log::debug!("rrt: goal not reached, returning best-effort path");
                self.extract_path(self.nearest(goal))
            }
        }
    }
}
