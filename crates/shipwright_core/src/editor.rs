//! Build-mode facade used by palette and grid-placement UI.
//!
//! Wraps a [`Ship`] being designed together with a [`BuildGrid`] that keeps
//! one block per cell. UI code selects a block type, places it, wires it up
//! and reads back the validator report for feedback.

use std::sync::Arc;

use crate::block::{BlockId, PortIndex};
use crate::config::ShipyardConfig;
use crate::data::ShipBlueprint;
use crate::error::{Result, ShipError};
use crate::graph::ConnectionId;
use crate::grid::{BuildGrid, Cell};
use crate::math::{Rotation, Vec2Fixed};
use crate::registry::BlockRegistry;
use crate::ship::Ship;
use crate::validation::StructuralReport;

/// Interactive ship builder.
#[derive(Debug, Clone)]
pub struct ShipEditor {
    registry: Arc<BlockRegistry>,
    grid: BuildGrid,
    ship: Ship,
    selected: Option<String>,
}

impl ShipEditor {
    /// Start an empty design.
    ///
    /// # Errors
    ///
    /// [`ShipError::InvalidConfig`] if `config` is inconsistent.
    pub fn new(
        registry: Arc<BlockRegistry>,
        name: impl Into<String>,
        config: ShipyardConfig,
    ) -> Result<Self> {
        config.ensure_valid()?;
        Ok(Self {
            registry,
            grid: BuildGrid::new(config.grid),
            ship: Ship::new(name, config),
            selected: None,
        })
    }

    /// Open an existing blueprint for editing.
    ///
    /// # Errors
    ///
    /// Any error from [`ShipBlueprint::assemble`].
    pub fn from_blueprint(
        registry: Arc<BlockRegistry>,
        blueprint: &ShipBlueprint,
        config: ShipyardConfig,
    ) -> Result<Self> {
        let ship = blueprint.assemble(&registry, config)?;
        let mut grid = BuildGrid::new(config.grid);
        for block in ship.blocks().iter() {
            grid.place(grid.world_to_cell(block.position()), block.id())?;
        }
        Ok(Self {
            registry,
            grid,
            ship,
            selected: None,
        })
    }

    /// Choose the block type the next placement uses.
    ///
    /// # Errors
    ///
    /// [`ShipError::UnknownBlockType`] if the registry has no such type.
    pub fn select_block_type(&mut self, block_type: &str) -> Result<()> {
        if !self.registry.contains(block_type) {
            return Err(ShipError::UnknownBlockType(block_type.to_string()));
        }
        self.selected = Some(block_type.to_string());
        Ok(())
    }

    /// Drop the current selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Currently selected block type.
    #[must_use]
    pub fn selected_block_type(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Place the selected type at a world position, snapped to the grid
    /// when snapping is on.
    ///
    /// # Errors
    ///
    /// [`ShipError::NothingSelected`], or any error from
    /// [`add_block_at`](Self::add_block_at).
    pub fn place_selected(&mut self, position: Vec2Fixed, rotation: Rotation) -> Result<BlockId> {
        let block_type = self.selected.clone().ok_or(ShipError::NothingSelected)?;
        self.add_block_at(&block_type, self.grid.snap(position), rotation)
    }

    /// Place a block in a grid cell.
    ///
    /// # Errors
    ///
    /// Unknown type, cell outside the grid or cell already taken.
    pub fn add_block(
        &mut self,
        block_type: &str,
        cell: Cell,
        rotation: Rotation,
    ) -> Result<BlockId> {
        let position = self.grid.cell_to_world(cell);
        self.add_block_at(block_type, position, rotation)
    }

    /// Place a block at a world position; it claims the cell that position
    /// falls in.
    ///
    /// # Errors
    ///
    /// Unknown type, cell outside the grid or cell already taken.
    pub fn add_block_at(
        &mut self,
        block_type: &str,
        position: Vec2Fixed,
        rotation: Rotation,
    ) -> Result<BlockId> {
        let definition = self.registry.definition(block_type)?;
        let cell = self.grid.world_to_cell(position);
        self.grid.check_free(cell)?;
        let id = self.ship.add_block(definition, position, rotation);
        self.grid.place(cell, id)?;
        Ok(id)
    }

    /// Remove a block and every connection it had.
    ///
    /// # Errors
    ///
    /// [`ShipError::Structural`] if the block is not part of the design.
    pub fn remove_block(&mut self, id: BlockId) -> Result<()> {
        self.ship.remove_block(id)?;
        self.grid.vacate(id);
        Ok(())
    }

    /// Connect two ports.
    ///
    /// # Errors
    ///
    /// Any structural error from [`Ship::connect`].
    pub fn connect_blocks(
        &mut self,
        a: BlockId,
        port_a: PortIndex,
        b: BlockId,
        port_b: PortIndex,
    ) -> Result<ConnectionId> {
        self.ship.connect(a, port_a, b, port_b)
    }

    /// Remove every connection between two blocks.
    pub fn disconnect_blocks(&mut self, a: BlockId, b: BlockId) -> usize {
        self.ship.disconnect(a, b)
    }

    /// Wire up nearby blocks automatically.
    pub fn auto_connect(&mut self) -> Vec<ConnectionId> {
        self.ship.auto_connect()
    }

    /// Validator feedback for the current design.
    #[must_use]
    pub fn validate_structural_integrity(&self) -> StructuralReport {
        self.ship.validate_structural_integrity()
    }

    /// Block occupying a cell.
    #[must_use]
    pub fn block_at_cell(&self, cell: Cell) -> Option<BlockId> {
        self.grid.occupant(cell)
    }

    /// The build grid.
    #[must_use]
    pub const fn grid(&self) -> &BuildGrid {
        &self.grid
    }

    /// The ship under construction.
    #[must_use]
    pub const fn ship(&self) -> &Ship {
        &self.ship
    }

    /// Finish editing and take the ship, fully supplied.
    #[must_use]
    pub fn into_ship(mut self) -> Ship {
        self.ship.resupply();
        self.ship
    }

    /// Current design as a blueprint.
    #[must_use]
    pub fn to_blueprint(&self) -> ShipBlueprint {
        self.ship.to_blueprint()
    }
}
