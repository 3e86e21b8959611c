//! pursuit_planning - grid-based pursuit planners for arcade agents
//!
//! This crate provides the motion-planning strategies used to drive
//! pursuing agents over a tile grid: an artificial potential field,
//! two boundary-following bug variants, a tangent bug, a probabilistic
//! roadmap, a rapidly-exploring random tree, and a Bayesian belief
//! tracker for a target that is only observed through a noisy sensor.
//!
//! All planners operate on an immutable [`utils::GridMap`] snapshot and
//! either return the next grid cell to move to or a full cell sequence.

// Core modules
pub mod common;
pub mod utils;

// Algorithm modules
pub mod path_planning;
pub mod localization;

// Re-export common types for convenience
pub use common::{GridCell, Point2D};
pub use common::{PathPlanner, StepPlanner};
pub use common::{PursuitError, PursuitResult};
pub use utils::{GridMap, Tile};
pub use path_planning::{PlanOutcome, PursuitStrategy};
