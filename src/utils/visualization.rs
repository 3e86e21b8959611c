//! Debug plotting for pursuit planners
//!
//! Renders occupancy grids, planned cell sequences, roadmap graphs,
//! trees, and belief heatmaps through gnuplot. Everything here reads
//! only the documented planner accessors; nothing feeds back into
//! planning.

use gnuplot::{AutoOption, AxesCommon, Caption, Color, Figure, LineWidth, PointSize, PointSymbol};

use crate::common::GridCell;
use crate::localization::BeliefTracker;
use crate::path_planning::{PrmPlanner, RrtPlanner};
use crate::utils::GridMap;

/// Color palette for consistent styling
pub mod colors {
    pub const WALL: &str = "#000000";
    pub const PATH: &str = "#FF0000";
    pub const START: &str = "#00FF00";
    pub const GOAL: &str = "#0000FF";
    pub const GRAPH: &str = "#B0B0B0";
    pub const NODE: &str = "#808080";
    pub const BELIEF: &str = "#800080";
}

/// Debug plot builder over one gnuplot figure
pub struct DebugPlot {
    figure: Figure,
    title: String,
}

impl DebugPlot {
    pub fn new(title: &str) -> Self {
        DebugPlot {
            figure: Figure::new(),
            title: title.to_string(),
        }
    }

    fn cells_to_xy(grid: &GridMap, cells: &[GridCell]) -> (Vec<f64>, Vec<f64>) {
        let points: Vec<_> = cells.iter().map(|&c| grid.grid_to_world(c)).collect();
        (
            points.iter().map(|p| p.x).collect(),
            points.iter().map(|p| p.y).collect(),
        )
    }

    /// Plot all blocking tiles of the grid
    pub fn plot_grid(&mut self, grid: &GridMap) -> &mut Self {
        let mut blocked = Vec::new();
        for x in 0..grid.width() as i32 {
            for y in 0..grid.height() as i32 {
                let cell = GridCell::new(x, y);
                if !grid.is_walkable(cell) {
                    blocked.push(cell);
                }
            }
        }

        let (x, y) = Self::cells_to_xy(grid, &blocked);
        self.figure.axes2d().points(
            &x,
            &y,
            &[
                Caption("Walls"),
                Color(colors::WALL),
                PointSymbol('S'),
                PointSize(0.8),
            ],
        );
        self
    }

    /// Plot a planned cell sequence as a line through cell centers
    pub fn plot_path(&mut self, grid: &GridMap, path: &[GridCell], caption: &str) -> &mut Self {
        let (x, y) = Self::cells_to_xy(grid, path);
        self.figure.axes2d().lines(
            &x,
            &y,
            &[Caption(caption), Color(colors::PATH), LineWidth(2.0)],
        );
        self
    }

    /// Plot a single marked cell (start, goal, tangent point)
    pub fn plot_cell(&mut self, grid: &GridMap, cell: GridCell, caption: &str, color: &str) -> &mut Self {
        let p = grid.grid_to_world(cell);
        self.figure.axes2d().points(
            &[p.x],
            &[p.y],
            &[
                Caption(caption),
                Color(color),
                PointSymbol('O'),
                PointSize(2.0),
            ],
        );
        self
    }

    /// Plot the roadmap graph: edges first, nodes on top
    pub fn plot_roadmap(&mut self, grid: &GridMap, prm: &PrmPlanner) -> &mut Self {
        for (a, b) in prm.edges() {
            let pa = grid.grid_to_world(a);
            let pb = grid.grid_to_world(b);
            self.figure
                .axes2d()
                .lines(&[pa.x, pb.x], &[pa.y, pb.y], &[Color(colors::GRAPH)]);
        }

        let (x, y) = Self::cells_to_xy(grid, prm.nodes());
        self.figure.axes2d().points(
            &x,
            &y,
            &[
                Caption("Roadmap"),
                Color(colors::NODE),
                PointSymbol('.'),
                PointSize(1.0),
            ],
        );
        self
    }

    /// Plot the tree grown by the last planning call
    pub fn plot_tree(&mut self, grid: &GridMap, rrt: &RrtPlanner) -> &mut Self {
        for (parent, child) in rrt.edges() {
            let pa = grid.grid_to_world(parent);
            let pb = grid.grid_to_world(child);
            self.figure
                .axes2d()
                .lines(&[pa.x, pb.x], &[pa.y, pb.y], &[Color(colors::GRAPH)]);
        }
        self
    }

    /// Plot the belief distribution as points sized by probability
    pub fn plot_belief(&mut self, tracker: &BeliefTracker) -> &mut Self {
        let belief = tracker.belief();
        let peak = belief.iter().cloned().fold(0.0, f64::max);
        if peak <= 0.0 {
            return self;
        }

        let mut x = Vec::new();
        let mut y = Vec::new();
        let mut size = Vec::new();

        for bx in 0..belief.nrows() {
            for by in 0..belief.ncols() {
                let relative = belief[(bx, by)] / peak;
                if relative < 0.1 {
                    continue;
                }
                let center = tracker.cell_center(bx, by);
                x.push(center.x);
                y.push(center.y);
                size.push(relative);
            }
        }

        // One series per magnitude bucket keeps the API simple
        for (i, bucket) in [0.1, 0.4, 0.7].iter().enumerate() {
            let xs: Vec<f64> = x
                .iter()
                .zip(&size)
                .filter(|&(_, s)| s >= bucket)
                .map(|(v, _)| *v)
                .collect();
            let ys: Vec<f64> = y
                .iter()
                .zip(&size)
                .filter(|&(_, s)| s >= bucket)
                .map(|(v, _)| *v)
                .collect();

            self.figure.axes2d().points(
                &xs,
                &ys,
                &[
                    Color(colors::BELIEF),
                    PointSymbol('O'),
                    PointSize(0.5 + i as f64 * 0.5),
                ],
            );
        }
        self
    }

    /// Finalize and show the plot
    pub fn show(&mut self) -> Result<(), String> {
        self.apply_settings();
        self.figure.show().map_err(|e| e.to_string()).map(|_| ())
    }

    /// Save plot to PNG file
    pub fn save_png(&mut self, path: &str, width: u32, height: u32) -> Result<(), String> {
        self.apply_settings();
        self.figure
            .save_to_png(path, width, height)
            .map_err(|e| e.to_string())
    }

    /// Save plot to SVG file
    pub fn save_svg(&mut self, path: &str) -> Result<(), String> {
        self.apply_settings();
        self.figure
            .save_to_svg(path, 800, 600)
            .map_err(|e| e.to_string())
    }

    fn apply_settings(&mut self) {
        let axes = self.figure.axes2d();
        if !self.title.is_empty() {
            axes.set_title(&self.title, &[]);
        }
        axes.set_x_label("x [world]", &[]);
        axes.set_y_label("y [world]", &[]);
        axes.set_aspect_ratio(AutoOption::Fix(1.0));
    }
}
