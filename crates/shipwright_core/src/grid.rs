//! Build grid used while placing blocks.
//!
//! Cell `(0, 0)` is centered on the ship origin; a grid `width` cells wide
//! spans columns `-width/2 .. width - width/2`. Each cell holds at most one
//! block.

use std::collections::BTreeMap;

use crate::block::BlockId;
use crate::config::GridConfig;
use crate::error::{Result, ShipError};
use crate::math::{Fixed, Vec2Fixed};

/// Grid cell coordinates `(column, row)`.
pub type Cell = (i32, i32);

/// Placement grid with per-cell occupancy.
#[derive(Debug, Clone)]
pub struct BuildGrid {
    config: GridConfig,
    occupants: BTreeMap<Cell, BlockId>,
}

impl BuildGrid {
    /// Create an empty grid.
    #[must_use]
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            occupants: BTreeMap::new(),
        }
    }

    /// Grid settings.
    #[must_use]
    pub const fn config(&self) -> &GridConfig {
        &self.config
    }

    fn column_range(extent: u32) -> (i32, i32) {
        let extent = extent as i32;
        let min = -(extent / 2);
        (min, min + extent)
    }

    /// Check if a cell lies inside the grid.
    #[must_use]
    pub fn in_bounds(&self, (x, y): Cell) -> bool {
        let (min_x, max_x) = Self::column_range(self.config.width);
        let (min_y, max_y) = Self::column_range(self.config.height);
        x >= min_x && x < max_x && y >= min_y && y < max_y
    }

    /// World position of a cell center.
    #[must_use]
    pub fn cell_to_world(&self, (x, y): Cell) -> Vec2Fixed {
        Vec2Fixed::new(
            Fixed::from_num(x) * self.config.cell_size,
            Fixed::from_num(y) * self.config.cell_size,
        )
    }

    /// Cell whose center is nearest to a world position. A grid with a
    /// zero cell size maps everything to `(0, 0)`.
    #[must_use]
    pub fn world_to_cell(&self, position: Vec2Fixed) -> Cell {
        let size = self.config.cell_size;
        let half = size / Fixed::from_num(2);
        let axis = |v: Fixed| {
            (v + half)
                .checked_div(size)
                .map_or(0, |c| c.floor().saturating_to_num::<i32>())
        };
        (axis(position.x), axis(position.y))
    }

    /// Snap a free position to the nearest cell center when snapping is on.
    #[must_use]
    pub fn snap(&self, position: Vec2Fixed) -> Vec2Fixed {
        if self.config.snap_to_grid {
            self.cell_to_world(self.world_to_cell(position))
        } else {
            position
        }
    }

    /// Block occupying a cell.
    #[must_use]
    pub fn occupant(&self, cell: Cell) -> Option<BlockId> {
        self.occupants.get(&cell).copied()
    }

    /// Check that a cell is inside the grid and empty.
    ///
    /// # Errors
    ///
    /// [`ShipError::OutOfGrid`] or [`ShipError::CellOccupied`].
    pub fn check_free(&self, cell: Cell) -> Result<()> {
        if !self.in_bounds(cell) {
            return Err(ShipError::OutOfGrid {
                x: cell.0,
                y: cell.1,
            });
        }
        if let Some(block) = self.occupant(cell) {
            return Err(ShipError::CellOccupied {
                x: cell.0,
                y: cell.1,
                block,
            });
        }
        Ok(())
    }

    /// Record a block in a cell.
    ///
    /// # Errors
    ///
    /// Same as [`check_free`](Self::check_free).
    pub fn place(&mut self, cell: Cell, block: BlockId) -> Result<()> {
        self.check_free(cell)?;
        self.occupants.insert(cell, block);
        Ok(())
    }

    /// Free whichever cell holds `block`. Returns that cell.
    pub fn vacate(&mut self, block: BlockId) -> Option<Cell> {
        let cell = self
            .occupants
            .iter()
            .find(|(_, occupant)| **occupant == block)
            .map(|(cell, _)| *cell)?;
        self.occupants.remove(&cell);
        Some(cell)
    }

    /// Number of occupied cells.
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.occupants.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> BuildGrid {
        BuildGrid::new(GridConfig {
            width: 4,
            height: 4,
            ..GridConfig::default()
        })
    }

    #[test]
    fn test_bounds_centered_on_origin() {
        let grid = grid();
        assert!(grid.in_bounds((-2, -2)));
        assert!(grid.in_bounds((1, 1)));
        assert!(!grid.in_bounds((2, 0)));
        assert!(!grid.in_bounds((0, -3)));
    }

    #[test]
    fn test_world_cell_conversion() {
        let grid = grid();
        assert_eq!(grid.cell_to_world((-1, 1)), Vec2Fixed::from_ints(-32, 32));
        assert_eq!(grid.world_to_cell(Vec2Fixed::from_ints(-20, 40)), (-1, 1));
        assert_eq!(grid.world_to_cell(Vec2Fixed::from_ints(15, -15)), (0, 0));
        assert_eq!(grid.world_to_cell(Vec2Fixed::from_ints(16, 0)), (1, 0));
    }

    #[test]
    fn test_zero_cell_size_does_not_divide() {
        let grid = BuildGrid::new(GridConfig {
            cell_size: Fixed::ZERO,
            ..GridConfig::default()
        });
        assert_eq!(grid.world_to_cell(Vec2Fixed::from_ints(10, -40)), (0, 0));
    }

    #[test]
    fn test_snap_respects_toggle() {
        let mut grid = grid();
        let free = Vec2Fixed::from_ints(37, -5);
        assert_eq!(grid.snap(free), Vec2Fixed::from_ints(32, 0));

        grid.config.snap_to_grid = false;
        assert_eq!(grid.snap(free), free);
    }

    #[test]
    fn test_place_and_vacate() {
        let mut grid = grid();
        grid.place((0, 0), BlockId(1)).unwrap();
        assert!(matches!(
            grid.place((0, 0), BlockId(2)),
            Err(ShipError::CellOccupied { block: BlockId(1), .. })
        ));
        assert!(matches!(
            grid.place((5, 0), BlockId(2)),
            Err(ShipError::OutOfGrid { x: 5, y: 0 })
        ));
        assert_eq!(grid.vacate(BlockId(1)), Some((0, 0)));
        assert_eq!(grid.occupied_count(), 0);
    }
}
