//! Occupancy grid and the query surface shared by all planners
//!
//! The grid is owned by the caller (level loading, temporary-wall
//! lifecycle) and handed to planners as an immutable snapshot for the
//! duration of one planning call. All queries fail closed: anything
//! outside the map counts as non-walkable.

use std::collections::{HashSet, VecDeque};

use nalgebra::DMatrix;

use crate::common::{GridCell, Point2D, PursuitError, PursuitResult};

/// World units per grid tile
pub const DEFAULT_TILE_SIZE: f64 = 32.0;

/// Cell state codes of the occupancy grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Floor,
    Wall,
    TempWall,
    Key,
    Exit,
}

impl Tile {
    /// Walls and temporary walls block movement; pickups do not
    pub fn is_blocking(&self) -> bool {
        matches!(self, Tile::Wall | Tile::TempWall)
    }
}

/// Fixed-size occupancy grid with world-coordinate conversion
pub struct GridMap {
    tiles: DMatrix<Tile>,
    width: usize,
    height: usize,
    tile_size: f64,
}

impl GridMap {
    /// Create an all-floor grid with the default tile size
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_tile_size(width, height, DEFAULT_TILE_SIZE)
    }

    /// Create an all-floor grid with an explicit tile size
    pub fn with_tile_size(width: usize, height: usize, tile_size: f64) -> Self {
        GridMap {
            tiles: DMatrix::from_element(width, height, Tile::Floor),
            width,
            height,
            tile_size,
        }
    }

    /// Build a grid from row-major tile data (`tiles[y * width + x]`)
    pub fn from_tiles(width: usize, height: usize, tiles: &[Tile]) -> PursuitResult<Self> {
        if tiles.len() != width * height {
            return Err(PursuitError::GridError(format!(
                "expected {} tiles for a {}x{} grid, got {}",
                width * height,
                width,
                height,
                tiles.len()
            )));
        }

        Ok(GridMap {
            tiles: DMatrix::from_fn(width, height, |x, y| tiles[y * width + x]),
            width,
            height,
            tile_size: DEFAULT_TILE_SIZE,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn tile_size(&self) -> f64 {
        self.tile_size
    }

    /// Whether the cell lies inside `[0, width) x [0, height)`
    pub fn is_valid(&self, cell: GridCell) -> bool {
        cell.x >= 0 && (cell.x as usize) < self.width && cell.y >= 0 && (cell.y as usize) < self.height
    }

    /// Whether the cell is on the outermost ring of the map
    pub fn is_border(&self, cell: GridCell) -> bool {
        cell.x == 0
            || cell.y == 0
            || cell.x == self.width as i32 - 1
            || cell.y == self.height as i32 - 1
    }

    pub fn tile(&self, cell: GridCell) -> Option<Tile> {
        if self.is_valid(cell) {
            Some(self.tiles[(cell.x as usize, cell.y as usize)])
        } else {
            None
        }
    }

    /// Set a tile; out-of-range cells are ignored.
    ///
    /// Only external collaborators mutate the grid, and only between
    /// planning calls.
    pub fn set_tile(&mut self, cell: GridCell, tile: Tile) {
        if self.is_valid(cell) {
            self.tiles[(cell.x as usize, cell.y as usize)] = tile;
        }
    }

    /// Whether the cell can be traversed; out-of-range cells cannot
    pub fn is_walkable(&self, cell: GridCell) -> bool {
        match self.tile(cell) {
            Some(tile) => !tile.is_blocking(),
            None => false,
        }
    }

    /// Walkable neighbors of a cell, 4- or 8-connected
    pub fn neighbors(&self, cell: GridCell, diagonal: bool) -> Vec<GridCell> {
        let mut directions: Vec<(i32, i32)> = vec![(-1, 0), (1, 0), (0, -1), (0, 1)];

        if diagonal {
            directions.extend([(-1, -1), (-1, 1), (1, -1), (1, 1)]);
        }

        directions
            .into_iter()
            .map(|(dx, dy)| GridCell::new(cell.x + dx, cell.y + dy))
            .filter(|&n| self.is_walkable(n))
            .collect()
    }

    /// Bresenham line-of-sight between two cells
    ///
    /// Steps the discrete line from `start` to `end` and reports false
    /// the instant a traversed cell (endpoints included) is not
    /// walkable.
    pub fn line_of_sight(&self, start: GridCell, end: GridCell) -> bool {
        let dx = (end.x - start.x).abs();
        let dy = (end.y - start.y).abs();
        let sx = if start.x < end.x { 1 } else { -1 };
        let sy = if start.y < end.y { 1 } else { -1 };
        let mut err = dx - dy;

        let mut x = start.x;
        let mut y = start.y;

        loop {
            if !self.is_walkable(GridCell::new(x, y)) {
                return false;
            }

            if x == end.x && y == end.y {
                return true;
            }

            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// World coordinate of the cell center
    pub fn grid_to_world(&self, cell: GridCell) -> Point2D {
        Point2D::new(
            cell.x as f64 * self.tile_size + self.tile_size / 2.0,
            cell.y as f64 * self.tile_size + self.tile_size / 2.0,
        )
    }

    /// Grid cell containing a world coordinate
    pub fn world_to_grid(&self, point: Point2D) -> GridCell {
        GridCell::new(
            (point.x / self.tile_size).floor() as i32,
            (point.y / self.tile_size).floor() as i32,
        )
    }

    /// Connected component of blocked cells around `seed`
    ///
    /// Runs a 4-connected BFS over non-walkable cells, skipping every
    /// cell for which `exclude` returns true. Returns an empty set when
    /// the seed itself is walkable, invalid, or excluded, which lets
    /// callers distinguish a real obstacle from a transient blockage.
    pub fn blocked_component<F>(&self, seed: GridCell, exclude: F) -> HashSet<GridCell>
    where
        F: Fn(GridCell) -> bool,
    {
        let mut component = HashSet::new();

        if !self.is_valid(seed) || self.is_walkable(seed) || exclude(seed) {
            return component;
        }

        let mut queue = VecDeque::new();
        queue.push_back(seed);
        component.insert(seed);

        while let Some(cell) = queue.pop_front() {
            for (dx, dy) in [(-1, 0), (1, 0), (0, -1), (0, 1)] {
                let next = GridCell::new(cell.x + dx, cell.y + dy);

                if !self.is_valid(next)
                    || self.is_walkable(next)
                    || exclude(next)
                    || component.contains(&next)
                {
                    continue;
                }

                component.insert(next);
                queue.push_back(next);
            }
        }

        component
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walled_grid() -> GridMap {
        // 10x10, single wall cell at (4, 4) and a temp wall at (4, 5)
        let mut grid = GridMap::new(10, 10);
        grid.set_tile(GridCell::new(4, 4), Tile::Wall);
        grid.set_tile(GridCell::new(4, 5), Tile::TempWall);
        grid
    }

    #[test]
    fn test_out_of_range_is_not_walkable() {
        let grid = GridMap::new(10, 10);
        assert!(!grid.is_walkable(GridCell::new(-1, 0)));
        assert!(!grid.is_walkable(GridCell::new(0, -1)));
        assert!(!grid.is_walkable(GridCell::new(10, 0)));
        assert!(!grid.is_walkable(GridCell::new(0, 10)));
        assert!(grid.is_walkable(GridCell::new(0, 0)));
        assert!(grid.is_walkable(GridCell::new(9, 9)));
    }

    #[test]
    fn test_walls_block_pickups_do_not() {
        let mut grid = walled_grid();
        grid.set_tile(GridCell::new(2, 2), Tile::Key);
        grid.set_tile(GridCell::new(3, 2), Tile::Exit);

        assert!(!grid.is_walkable(GridCell::new(4, 4)));
        assert!(!grid.is_walkable(GridCell::new(4, 5)));
        assert!(grid.is_walkable(GridCell::new(2, 2)));
        assert!(grid.is_walkable(GridCell::new(3, 2)));
    }

    #[test]
    fn test_from_tiles_rejects_bad_length() {
        assert!(GridMap::from_tiles(3, 3, &[Tile::Floor; 8]).is_err());
        assert!(GridMap::from_tiles(3, 3, &[Tile::Floor; 9]).is_ok());
    }

    #[test]
    fn test_from_tiles_row_major() {
        let mut tiles = vec![Tile::Floor; 9];
        tiles[1 * 3 + 2] = Tile::Wall; // (x=2, y=1)
        let grid = GridMap::from_tiles(3, 3, &tiles).unwrap();
        assert_eq!(grid.tile(GridCell::new(2, 1)), Some(Tile::Wall));
        assert!(!grid.is_walkable(GridCell::new(2, 1)));
    }

    #[test]
    fn test_neighbors_connectivity() {
        let grid = walled_grid();
        let four = grid.neighbors(GridCell::new(1, 1), false);
        let eight = grid.neighbors(GridCell::new(1, 1), true);
        assert_eq!(four.len(), 4);
        assert_eq!(eight.len(), 8);

        // Corner cell loses the off-map neighbors
        let corner = grid.neighbors(GridCell::new(0, 0), true);
        assert_eq!(corner.len(), 3);

        // Blocked cells are filtered out
        let near_wall = grid.neighbors(GridCell::new(3, 4), false);
        assert!(!near_wall.contains(&GridCell::new(4, 4)));
    }

    #[test]
    fn test_line_of_sight_to_self() {
        let grid = walled_grid();
        let p = GridCell::new(2, 7);
        assert!(grid.line_of_sight(p, p));

        // A blocked endpoint has no line of sight, even to itself
        let wall = GridCell::new(4, 4);
        assert!(!grid.line_of_sight(wall, wall));
    }

    #[test]
    fn test_line_of_sight_blocked_by_wall() {
        let grid = walled_grid();
        assert!(!grid.line_of_sight(GridCell::new(0, 4), GridCell::new(9, 4)));
        assert!(grid.line_of_sight(GridCell::new(0, 0), GridCell::new(9, 0)));
        assert!(grid.line_of_sight(GridCell::new(0, 9), GridCell::new(9, 9)));
    }

    #[test]
    fn test_coordinate_conversion_roundtrip() {
        let grid = GridMap::new(10, 10);
        let cell = GridCell::new(3, 7);
        let world = grid.grid_to_world(cell);
        assert!((world.x - 3.0 * 32.0 - 16.0).abs() < 1e-10);
        assert_eq!(grid.world_to_grid(world), cell);
    }

    #[test]
    fn test_blocked_component_single_cell() {
        let grid = walled_grid();
        let component = grid.blocked_component(GridCell::new(4, 4), |c| grid.is_border(c));
        assert_eq!(component.len(), 2); // wall + adjacent temp wall
        assert!(component.contains(&GridCell::new(4, 4)));
        assert!(component.contains(&GridCell::new(4, 5)));
    }

    #[test]
    fn test_blocked_component_empty_for_walkable_seed() {
        let grid = walled_grid();
        let component = grid.blocked_component(GridCell::new(1, 1), |c| grid.is_border(c));
        assert!(component.is_empty());
    }

    #[test]
    fn test_blocked_component_respects_exclusion() {
        let mut grid = GridMap::new(10, 10);
        // Wall segment running onto the border
        for y in 0..5 {
            grid.set_tile(GridCell::new(5, y), Tile::Wall);
        }

        // Border cell (5, 0) is excluded; the rest of the segment is found
        let component = grid.blocked_component(GridCell::new(5, 2), |c| grid.is_border(c));
        assert_eq!(component.len(), 4);
        assert!(!component.contains(&GridCell::new(5, 0)));

        // Seeding on the border finds nothing
        let border = grid.blocked_component(GridCell::new(5, 0), |c| grid.is_border(c));
        assert!(border.is_empty());
    }
}
