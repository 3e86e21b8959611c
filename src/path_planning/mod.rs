// Pursuit planning algorithms module

pub mod potential_field;
pub mod bug1;
pub mod bug2;
pub mod tangent_bug;
pub mod prm;
pub mod rrt;
pub mod strategy;

mod boundary;

pub use potential_field::*;
pub use bug1::*;
pub use bug2::*;
pub use tangent_bug::*;
pub use prm::*;
pub use rrt::*;
pub use strategy::*;
