// Target localization module

pub mod belief_tracker;

pub use belief_tracker::*;
