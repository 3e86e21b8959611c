//! Utility modules for pursuit_planning

pub mod grid_map;
pub mod visualization;

pub use grid_map::*;
pub use visualization::DebugPlot;
