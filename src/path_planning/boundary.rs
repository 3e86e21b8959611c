//! Shared machinery for the boundary-following planners

use std::collections::HashSet;

use ordered_float::OrderedFloat;

use crate::common::GridCell;
use crate::utils::GridMap;

/// Connected obstacle struck by a blocked step
///
/// Flood-fills 4-connected blocked cells from the cell the direct step
/// would have landed on, excluding the map border ring so a perimeter
/// wall is never mistaken for a finite obstacle. An empty set means
/// there is no interior obstacle to circumnavigate (the blockage is the
/// border itself, or a transient entity).
pub fn identify_obstacle(grid: &GridMap, struck: GridCell) -> HashSet<GridCell> {
    grid.blocked_component(struck, |cell| grid.is_border(cell))
}

/// Whether `cell` touches the obstacle set (8-adjacency)
pub fn touches_obstacle(cell: GridCell, obstacle: &HashSet<GridCell>) -> bool {
    for dy in -1..=1 {
        for dx in -1..=1 {
            if (dx, dy) == (0, 0) {
                continue;
            }
            if obstacle.contains(&GridCell::new(cell.x + dx, cell.y + dy)) {
                return true;
            }
        }
    }
    false
}

/// Walkable neighbors of `current` that stay on the obstacle boundary
pub fn boundary_candidates(
    grid: &GridMap,
    current: GridCell,
    obstacle: &HashSet<GridCell>,
) -> Vec<GridCell> {
    grid.neighbors(current, true)
        .into_iter()
        .filter(|&n| touches_obstacle(n, obstacle))
        .collect()
}

/// Sidestep used when a direct step is blocked by something that is not
/// an interior obstacle: move to the walkable neighbor nearest the goal.
pub fn sidestep_towards(grid: &GridMap, current: GridCell, goal: GridCell) -> GridCell {
    grid.neighbors(current, true)
        .into_iter()
        .min_by_key(|n| OrderedFloat(n.distance(goal)))
        .unwrap_or(current)
}
