//! Error types for pursuit_planning

use std::fmt;

/// Main error type for pursuit planning
///
/// A planner that cannot find a path is not an error case; planners
/// return an empty sequence instead. Errors are reserved for invalid
/// construction input.
#[derive(Debug)]
pub enum PursuitError {
    /// Invalid parameter
    InvalidParameter(String),
    /// Grid construction or dimension mismatch
    GridError(String),
}

impl fmt::Display for PursuitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PursuitError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            PursuitError::GridError(msg) => write!(f, "Grid error: {}", msg),
        }
    }
}

impl std::error::Error for PursuitError {}

/// Result type alias for pursuit planning operations
pub type PursuitResult<T> = Result<T, PursuitError>;
