//! Loading, saving and assembling ship blueprints.

use crate::block::{BlockId, BlockProperties};
use crate::config::ShipyardConfig;
use crate::data::ShipBlueprint;
use crate::error::{Result, ShipError};
use crate::grid::BuildGrid;
use crate::registry::BlockRegistry;
use crate::ship::Ship;

impl ShipBlueprint {
    /// Parse a blueprint from RON.
    ///
    /// # Errors
    ///
    /// [`ShipError::DataParse`] on malformed input.
    pub fn from_ron_str(src: &str, label: &str) -> Result<Self> {
        ron::from_str(src).map_err(|e| ShipError::DataParse {
            path: label.to_string(),
            message: e.to_string(),
        })
    }

    /// Serialize to pretty-printed RON.
    ///
    /// # Errors
    ///
    /// [`ShipError::Snapshot`] if serialization fails.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| ShipError::Snapshot(e.to_string()))
    }

    /// Encode a compact binary snapshot.
    ///
    /// # Errors
    ///
    /// [`ShipError::Snapshot`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| ShipError::Snapshot(e.to_string()))
    }

    /// Decode a binary snapshot.
    ///
    /// # Errors
    ///
    /// [`ShipError::Snapshot`] if the bytes are not a valid snapshot.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        bincode::deserialize(data).map_err(|e| ShipError::Snapshot(e.to_string()))
    }

    /// Build a ship from this blueprint.
    ///
    /// Blocks are placed at their cell centers in list order, overrides are
    /// applied, explicit connections are made, and then the auto-connector
    /// runs if requested. The resulting ship starts fully supplied.
    ///
    /// # Errors
    ///
    /// - [`ShipError::InvalidConfig`] if `config` is inconsistent.
    /// - [`ShipError::UnknownBlockType`] for a type missing from the registry.
    /// - [`ShipError::OutOfGrid`] / [`ShipError::CellOccupied`] for bad cells.
    /// - [`ShipError::InvalidBlueprint`] for a connection naming a block index
    ///   that does not exist.
    /// - [`ShipError::Structural`] for a rejected connection.
    pub fn assemble(&self, registry: &BlockRegistry, config: ShipyardConfig) -> Result<Ship> {
        config.ensure_valid()?;
        let mut grid = BuildGrid::new(config.grid);
        let mut ship = Ship::new(self.name.clone(), config);
        let mut ids: Vec<BlockId> = Vec::with_capacity(self.blocks.len());

        for placed in &self.blocks {
            let definition = registry.definition(&placed.block_type)?;
            grid.check_free(placed.cell)?;
            let position = grid.cell_to_world(placed.cell);
            let id = ship.add_block(definition, position, placed.rotation);
            grid.place(placed.cell, id)?;

            if !placed.overrides.is_empty() {
                let block = ship.require_block(id)?;
                let defaults = BlockProperties::from_definition(block.definition());
                ship.set_block_properties(id, defaults.with_overrides(&placed.overrides))?;
            }
            ids.push(id);
        }

        for (n, link) in self.connections.iter().enumerate() {
            let lookup = |index: usize| {
                ids.get(index).copied().ok_or_else(|| ShipError::InvalidBlueprint {
                    name: self.name.clone(),
                    message: format!("connection {n} refers to missing block {index}"),
                })
            };
            let (a, b) = (lookup(link.a)?, lookup(link.b)?);
            ship.connect(a, link.port_a, b, link.port_b)?;
        }

        if self.auto_connect {
            ship.auto_connect();
        }
        ship.resupply();

        tracing::info!(
            ship = %self.name,
            blocks = ship.block_count(),
            connections = ship.graph().edge_count(),
            constructed = ship.is_constructed(),
            "Blueprint assembled"
        );
        Ok(ship)
    }
}
