//! Probabilistic roadmap pursuit planning
//!
//! A roadmap of randomly sampled walkable cells is built once per map
//! and connected under mutual line-of-sight. Queries snap start and
//! goal to their nearest roadmap nodes and run A* over the graph. The
//! cached graph is reused until the caller explicitly invalidates it;
//! there is no internal map-change detection.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::{GridCell, PathPlanner};
use crate::utils::GridMap;

/// Sampling attempts per requested node before giving up
const SAMPLE_ATTEMPT_FACTOR: usize = 10;

/// Configuration for the roadmap planner
#[derive(Debug, Clone)]
pub struct PrmConfig {
    /// Number of nodes to sample
    pub num_samples: usize,
    /// Maximum edge length [tiles]
    pub connection_radius: f64,
    /// Maximum edges per node
    pub max_neighbors: usize,
}

impl Default for PrmConfig {
    fn default() -> Self {
        Self {
            num_samples: 150,
            connection_radius: 8.0,
            max_neighbors: 8,
        }
    }
}

/// Priority queue item for A* over the roadmap
///
/// Ordered by f-score; equal scores pop in insertion order.
#[derive(Clone)]
struct QueueItem {
    f_score: f64,
    order: usize,
    index: usize,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.f_score == other.f_score && self.order == other.order
    }
}

impl Eq for QueueItem {}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse for min-heap, earlier insertion wins ties
        other
            .f_score
            .partial_cmp(&self.f_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Roadmap planner with a cached per-map graph
pub struct PrmPlanner {
    config: PrmConfig,
    rng: StdRng,
    nodes: Vec<GridCell>,
    graph: Vec<Vec<usize>>,
    built: bool,
}

impl PrmPlanner {
    pub fn new(config: PrmConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Create a planner with deterministic sampling
    pub fn with_seed(config: PrmConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: PrmConfig, rng: StdRng) -> Self {
        PrmPlanner {
            config,
            rng,
            nodes: Vec::new(),
            graph: Vec::new(),
            built: false,
        }
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Sampled roadmap nodes
    pub fn nodes(&self) -> &[GridCell] {
        &self.nodes
    }

    /// Undirected edges of the roadmap, each reported once
    pub fn edges(&self) -> Vec<(GridCell, GridCell)> {
        let mut edges = Vec::new();
        for (i, neighbors) in self.graph.iter().enumerate() {
            for &j in neighbors {
                if i < j {
                    edges.push((self.nodes[i], self.nodes[j]));
                }
            }
        }
        edges
    }

    /// Adjacency list of the roadmap
    pub fn graph(&self) -> &[Vec<usize>] {
        &self.graph
    }

    /// Drop the cached roadmap; the next query rebuilds it.
    ///
    /// Must be called by the owner whenever the map changes, e.g. when
    /// a temporary wall appears or expires.
    pub fn invalidate(&mut self) {
        self.built = false;
    }

    /// Sample nodes and connect them under mutual line-of-sight
    pub fn build_roadmap(&mut self, grid: &GridMap) {
        self.nodes.clear();
        self.graph.clear();

        self.sample_nodes(grid);
        self.connect_nodes(grid);
        self.built = true;

        log::debug!(
            "prm: roadmap built with {} nodes, {} edges",
            self.nodes.len(),
            self.edges().len()
        );
    }

    /// Rejection-sample walkable interior cells
    ///
    /// A grid without interior cells, or an unlucky attempt budget,
    /// yields fewer nodes than requested; that is not a failure.
    fn sample_nodes(&mut self, grid: &GridMap) {
        let (width, height) = (grid.width() as i32, grid.height() as i32);
        if width < 3 || height < 3 || self.config.num_samples == 0 {
            return;
        }

        let max_attempts = self.config.num_samples * SAMPLE_ATTEMPT_FACTOR;
        let mut attempts = 0;

        while self.nodes.len() < self.config.num_samples && attempts < max_attempts {
            let cell = GridCell::new(
                self.rng.gen_range(1..width - 1),
                self.rng.gen_range(1..height - 1),
            );

            if grid.is_walkable(cell) {
                self.nodes.push(cell);
            }

            attempts += 1;
        }
    }

    /// Connect each node to its nearest neighbors within radius
    fn connect_nodes(&mut self, grid: &GridMap) {
        self.graph = vec![Vec::new(); self.nodes.len()];

        for i in 0..self.nodes.len() {
            let mut in_range: Vec<(f64, usize)> = self
                .nodes
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(j, &other)| (self.nodes[i].distance(other), j))
                .filter(|&(dist, _)| dist <= self.config.connection_radius)
                .collect();

            in_range.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

            for &(_, j) in in_range.iter().take(self.config.max_neighbors) {
                if self.graph[i].contains(&j) {
                    continue;
                }
                if grid.line_of_sight(self.nodes[i], self.nodes[j]) {
                    self.graph[i].push(j);
                    self.graph[j].push(i);
                }
            }
        }
    }

    fn nearest_node(&self, cell: GridCell) -> Option<usize> {
        (0..self.nodes.len()).min_by_key(|&i| OrderedFloat(self.nodes[i].distance(cell)))
    }

    /// A* over the roadmap with Euclidean heuristic and edge weights
    fn search(&self, start_idx: usize, goal_idx: usize) -> Vec<GridCell> {
        let n = self.nodes.len();
        let goal_node = self.nodes[goal_idx];

        let mut g_score = vec![f64::INFINITY; n];
        let mut came_from: Vec<Option<usize>> = vec![None; n];
        let mut closed = vec![false; n];

        let mut open = BinaryHeap::new();
        let mut order = 0;

        g_score[start_idx] = 0.0;
        open.push(QueueItem {
            f_score: self.nodes[start_idx].distance(goal_node),
            order,
            index: start_idx,
        });

        while let Some(current) = open.pop() {
            let i = current.index;

            if i == goal_idx {
                return self.reconstruct(&came_from, goal_idx);
            }

            if closed[i] {
                continue;
            }
            closed[i] = true;

            for &j in &self.graph[i] {
                if closed[j] {
                    continue;
                }

                let tentative = g_score[i] + self.nodes[i].distance(self.nodes[j]);
                if tentative < g_score[j] {
                    g_score[j] = tentative;
                    came_from[j] = Some(i);
                    order += 1;
                    open.push(QueueItem {
                        f_score: tentative + self.nodes[j].distance(goal_node),
                        order,
                        index: j,
                    });
                }
            }
        }

        Vec::new()
    }

    fn reconstruct(&self, came_from: &[Option<usize>], goal_idx: usize) -> Vec<GridCell> {
        let mut path = Vec::new();
        let mut current = Some(goal_idx);

        while let Some(i) = current {
            path.push(self.nodes[i]);
            current = came_from[i];
        }

        path.reverse();
        path
    }
}

impl PathPlanner for PrmPlanner {
    /// Plan over the cached roadmap, building it on first use
    ///
    /// The returned sequence starts at the exact `start` cell and ends
    /// at the exact `goal` cell; an empty sequence means no route
    /// exists through the roadmap.
    fn plan_path(&mut self, start: GridCell, goal: GridCell, grid: &GridMap) -> Vec<GridCell> {
        if start == goal {
            return vec![start];
        }

        if !self.built {
            self.build_roadmap(grid);
        }

        let start_idx = match self.nearest_node(start) {
            Some(i) => i,
            None => return Vec::new(),
        };
        let goal_idx = match self.nearest_node(goal) {
            Some(i) => i,
            None => return Vec::new(),
        };

        let node_path = self.search(start_idx, goal_idx);
        if node_path.is_empty() {
            return Vec::new();
        }

        let mut full = Vec::with_capacity(node_path.len() + 2);
        full.push(start);
        full.extend(node_path);
        full.push(goal);
        full
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Tile;

    fn planner(samples: usize) -> PrmPlanner {
        let config = PrmConfig {
            num_samples: samples,
            ..PrmConfig::default()
        };
        PrmPlanner::with_seed(config, 99)
    }

    #[test]
    fn test_zero_samples_yields_empty_plan() {
        let grid = GridMap::new(10, 10);
        let mut prm = planner(0);
        let path = prm.plan_path(GridCell::new(1, 1), GridCell::new(8, 8), &grid);
        assert!(prm.nodes().is_empty());
        assert!(path.is_empty());
    }

    #[test]
    fn test_start_equals_goal() {
        let grid = GridMap::new(10, 10);
        let mut prm = planner(50);
        let cell = GridCell::new(5, 5);
        assert_eq!(prm.plan_path(cell, cell, &grid), vec![cell]);
    }

    #[test]
    fn test_edges_have_line_of_sight_and_symmetry() {
        let mut grid = GridMap::new(20, 20);
        for y in 3..17 {
            grid.set_tile(GridCell::new(9, y), Tile::Wall);
        }

        let mut prm = planner(80);
        prm.build_roadmap(&grid);

        let graph = prm.graph();
        for (i, neighbors) in graph.iter().enumerate() {
            for &j in neighbors {
                assert!(grid.line_of_sight(prm.nodes()[i], prm.nodes()[j]));
                assert!(graph[j].contains(&i), "edge {}->{} missing reverse", i, j);
            }
        }
    }

    #[test]
    fn test_nodes_are_walkable_interior_cells() {
        let mut grid = GridMap::new(15, 15);
        for y in 0..15 {
            grid.set_tile(GridCell::new(7, y), Tile::Wall);
        }

        let mut prm = planner(60);
        prm.build_roadmap(&grid);

        assert!(!prm.nodes().is_empty());
        for &node in prm.nodes() {
            assert!(grid.is_walkable(node));
            assert!(!grid.is_border(node));
        }
    }

    #[test]
    fn test_path_connects_exact_endpoints() {
        let grid = GridMap::new(20, 20);
        let mut prm = planner(120);

        let start = GridCell::new(2, 2);
        let goal = GridCell::new(17, 17);
        let path = prm.plan_path(start, goal, &grid);

        assert!(path.len() >= 2);
        assert_eq!(path[0], start);
        assert_eq!(*path.last().unwrap(), goal);
    }

    #[test]
    fn test_cache_survives_until_invalidated() {
        let grid = GridMap::new(20, 20);
        let mut prm = planner(60);

        prm.plan_path(GridCell::new(1, 1), GridCell::new(18, 18), &grid);
        assert!(prm.is_built());
        let nodes_before = prm.nodes().to_vec();

        // Another query does not resample
        prm.plan_path(GridCell::new(3, 3), GridCell::new(15, 15), &grid);
        assert_eq!(prm.nodes(), nodes_before.as_slice());

        prm.invalidate();
        assert!(!prm.is_built());
        prm.plan_path(GridCell::new(1, 1), GridCell::new(18, 18), &grid);
        assert!(prm.is_built());
    }
}
