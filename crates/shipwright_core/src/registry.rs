//! Read-only registry of block definitions.
//!
//! The embedding application builds one registry at startup and shares it.
//! Instances never copy a definition: they hold an `Arc` handle handed out by
//! [`BlockRegistry::definition`], so every hull plate on every ship points at
//! the same data.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::data::BlockDefinition;
use crate::error::{Result, ShipError};

/// All known block types, keyed by type id.
#[derive(Debug, Clone, Default)]
pub struct BlockRegistry {
    definitions: BTreeMap<String, Arc<BlockDefinition>>,
}

impl BlockRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            definitions: BTreeMap::new(),
        }
    }

    /// Build a registry from a list of definitions.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid or duplicate definition.
    pub fn from_definitions(definitions: impl IntoIterator<Item = BlockDefinition>) -> Result<Self> {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register(definition)?;
        }
        Ok(registry)
    }

    /// Parse a RON catalog (a list of `BlockDefinition`s).
    ///
    /// `label` names the source in error messages, typically a file path.
    ///
    /// # Errors
    ///
    /// Returns [`ShipError::DataParse`] for malformed RON, or the first
    /// registration error.
    pub fn from_ron_str(src: &str, label: &str) -> Result<Self> {
        let definitions: Vec<BlockDefinition> =
            ron::from_str(src).map_err(|e| ShipError::DataParse {
                path: label.to_string(),
                message: e.to_string(),
            })?;
        let registry = Self::from_definitions(definitions)?;
        tracing::info!(
            source = label,
            block_types = registry.len(),
            "Loaded block catalog"
        );
        Ok(registry)
    }

    /// Register a definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the definition is invalid or its id is taken.
    pub fn register(&mut self, definition: BlockDefinition) -> Result<()> {
        let errors = definition.validate();
        if !errors.is_empty() {
            return Err(ShipError::InvalidDefinition {
                block_type: definition.id,
                errors,
            });
        }
        if self.definitions.contains_key(&definition.id) {
            return Err(ShipError::DuplicateBlockType(definition.id));
        }
        self.definitions
            .insert(definition.id.clone(), Arc::new(definition));
        Ok(())
    }

    /// Get a shared handle to a definition.
    ///
    /// # Errors
    ///
    /// Returns [`ShipError::UnknownBlockType`] if the id is not registered.
    pub fn definition(&self, block_type: &str) -> Result<Arc<BlockDefinition>> {
        self.definitions
            .get(block_type)
            .cloned()
            .ok_or_else(|| ShipError::UnknownBlockType(block_type.to_string()))
    }

    /// Borrow a definition.
    #[must_use]
    pub fn get(&self, block_type: &str) -> Option<&BlockDefinition> {
        self.definitions.get(block_type).map(|d| &**d)
    }

    /// Check if a block type is registered.
    #[must_use]
    pub fn contains(&self, block_type: &str) -> bool {
        self.definitions.contains_key(block_type)
    }

    /// Registered type ids in sorted order.
    pub fn type_ids(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Number of registered block types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
