//! Bayesian belief tracking over a coarse probability grid
//!
//! Maintains a discrete distribution over the target's position at a
//! lower resolution than the navigation grid. Prediction spreads mass
//! with a Gaussian motion kernel; the sensor update multiplies in a
//! Gaussian likelihood centered on a noisy measurement, widened when
//! the tracker has no line of sight to it.

use itertools::iproduct;
use nalgebra::DMatrix;

use crate::common::{Point2D, PursuitError, PursuitResult};
use crate::utils::GridMap;

/// Cells below this mass are skipped during prediction
const NEGLIGIBLE_MASS: f64 = 1e-3;
/// Total probability below this triggers a uniform reset on update
const UNDERFLOW_EPS: f64 = 1e-10;

/// Configuration for the belief tracker
#[derive(Debug, Clone)]
pub struct BeliefConfig {
    /// Downsampling factor from the navigation grid
    pub resolution: usize,
    /// Measurements farther than this from the tracker are dropped [world units]
    pub sensor_range: f64,
    /// Sensor noise standard deviation [world units]
    pub sensor_noise: f64,
}

impl Default for BeliefConfig {
    fn default() -> Self {
        Self {
            resolution: 4,
            sensor_range: 300.0,
            sensor_noise: 40.0,
        }
    }
}

/// Discretized Bayesian filter over the target's position
pub struct BeliefTracker {
    config: BeliefConfig,
    belief: DMatrix<f64>,
    width: usize,
    height: usize,
    tile_size: f64,
    last_measurement: Option<Point2D>,
}

impl BeliefTracker {
    /// Create a tracker sized to the navigation grid
    pub fn new(config: BeliefConfig, grid: &GridMap) -> PursuitResult<Self> {
        if config.resolution == 0 {
            return Err(PursuitError::InvalidParameter(
                "belief resolution must be >= 1".to_string(),
            ));
        }

        let width = grid.width() / config.resolution;
        let height = grid.height() / config.resolution;
        if width == 0 || height == 0 {
            return Err(PursuitError::InvalidParameter(format!(
                "belief grid degenerates to {}x{} at resolution {}",
                width, height, config.resolution
            )));
        }

        let uniform = 1.0 / (width * height) as f64;

        Ok(BeliefTracker {
            config,
            belief: DMatrix::from_element(width, height, uniform),
            width,
            height,
            tile_size: grid.tile_size(),
            last_measurement: None,
        })
    }

    pub fn config(&self) -> &BeliefConfig {
        &self.config
    }

    /// Raw probability grid, indexed `(bx, by)`
    pub fn belief(&self) -> &DMatrix<f64> {
        &self.belief
    }

    pub fn last_measurement(&self) -> Option<Point2D> {
        self.last_measurement
    }

    /// Restore the uniform distribution
    pub fn reset(&mut self) {
        let uniform = 1.0 / (self.width * self.height) as f64;
        self.belief.fill(uniform);
        self.last_measurement = None;
    }

    /// Motion prediction step
    ///
    /// Shifts each cell's mass by `motion` (coarse-grid units) and
    /// spreads it over the 3x3 neighborhood with a unit-variance
    /// Gaussian kernel. Mass pushed off the grid is lost to the
    /// renormalization; a fully degenerate result is left as-is.
    pub fn predict(&mut self, motion: (i32, i32)) {
        let mut next = DMatrix::from_element(self.width, self.height, 0.0);

        for (x, y) in iproduct!(0..self.width, 0..self.height) {
            let mass = self.belief[(x, y)];
            if mass < NEGLIGIBLE_MASS {
                continue;
            }

            for (noise_dx, noise_dy) in iproduct!(-1i32..=1, -1i32..=1) {
                let nx = x as i32 + motion.0 + noise_dx;
                let ny = y as i32 + motion.1 + noise_dy;

                if nx >= 0 && (nx as usize) < self.width && ny >= 0 && (ny as usize) < self.height
                {
                    next[(nx as usize, ny as usize)] +=
                        mass * gaussian_2d(noise_dx as f64, noise_dy as f64, 1.0);
                }
            }
        }

        let total: f64 = next.iter().sum();
        next /= total + 1e-10;
        self.belief = next;
    }

    /// Sensor update step
    ///
    /// Ignores measurements beyond the sensor range. Otherwise weights
    /// every belief cell by a Gaussian likelihood around the measured
    /// coarse cell; occlusion between tracker and measurement (checked
    /// on the fine grid) doubles the standard deviation. Underflow of
    /// the total probability resets the belief to uniform.
    pub fn update(&mut self, measurement: Point2D, grid: &GridMap, tracker_pos: Point2D) {
        if tracker_pos.distance(&measurement) > self.config.sensor_range {
            return;
        }

        let coarse = self.config.resolution as f64;
        let meas_bx = (measurement.x / self.tile_size / coarse).floor();
        let meas_by = (measurement.y / self.tile_size / coarse).floor();

        let visible = grid.line_of_sight(
            grid.world_to_grid(tracker_pos),
            grid.world_to_grid(measurement),
        );

        let mut sigma = self.config.sensor_noise / (self.tile_size * coarse);
        if !visible {
            sigma *= 2.0;
        }

        for (x, y) in iproduct!(0..self.width, 0..self.height) {
            let dx = x as f64 - meas_bx;
            let dy = y as f64 - meas_by;
            self.belief[(x, y)] *= gaussian_2d(dx, dy, sigma);
        }

        let total: f64 = self.belief.iter().sum();
        if total > UNDERFLOW_EPS {
            self.belief /= total;
        } else {
            log::warn!("belief underflow after update, resetting to uniform");
            self.reset();
        }

        self.last_measurement = Some(measurement);
    }

    /// World coordinate of the most probable cell
    pub fn estimated_position(&self) -> Point2D {
        let mut best = (0, 0);
        let mut best_prob = f64::NEG_INFINITY;

        for (x, y) in iproduct!(0..self.width, 0..self.height) {
            if self.belief[(x, y)] > best_prob {
                best_prob = self.belief[(x, y)];
                best = (x, y);
            }
        }

        self.coarse_to_world(best.0 as f64, best.1 as f64)
    }

    /// Probability-weighted mean position in world coordinates
    ///
    /// Falls back to the arg-max estimate when the distribution has no
    /// mass.
    pub fn mean_position(&self) -> Point2D {
        let mut total = 0.0;
        let mut sum_x = 0.0;
        let mut sum_y = 0.0;

        for (x, y) in iproduct!(0..self.width, 0..self.height) {
            let prob = self.belief[(x, y)];
            total += prob;
            sum_x += x as f64 * prob;
            sum_y += y as f64 * prob;
        }

        if total > 0.0 {
            self.coarse_to_world(sum_x / total, sum_y / total)
        } else {
            self.estimated_position()
        }
    }

    /// World coordinate of a coarse cell center, for visualization
    pub fn cell_center(&self, bx: usize, by: usize) -> Point2D {
        self.coarse_to_world(bx as f64, by as f64)
    }

    fn coarse_to_world(&self, bx: f64, by: f64) -> Point2D {
        let coarse = self.config.resolution as f64;
        Point2D::new(
            (bx * coarse + coarse / 2.0) * self.tile_size,
            (by * coarse + coarse / 2.0) * self.tile_size,
        )
    }
}

/// Zero-mean 2D Gaussian density at `(dx, dy)`
fn gaussian_2d(dx: f64, dy: f64, sigma: f64) -> f64 {
    (-(dx * dx + dy * dy) / (2.0 * sigma * sigma)).exp()
        / (2.0 * std::f64::consts::PI * sigma * sigma)
}
