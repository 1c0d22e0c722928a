//! Data validation utilities.
//!
//! A data directory holds:
//!
//! ```text
//! blocks.ron       block catalog (required)
//! shipyard.ron     ShipyardConfig overrides (optional)
//! ships/*.ron      ship blueprints
//! ```
//!
//! Every blueprint is assembled against the catalog and must come out as a
//! single connected structure.

use std::path::{Path, PathBuf};

use shipwright_core::config::ShipyardConfig;
use shipwright_core::data::ShipBlueprint;
use shipwright_core::error::ShipError;
use shipwright_core::registry::BlockRegistry;
use shipwright_core::ship::Ship;
use thiserror::Error;

use crate::report::ShipReport;

/// Catalog file name inside a data directory.
pub const CATALOG_FILE: &str = "blocks.ron";
/// Config file name inside a data directory.
pub const CONFIG_FILE: &str = "shipyard.ron";
/// Blueprint directory inside a data directory.
pub const SHIPS_DIR: &str = "ships";

/// Errors that can occur while loading or checking data files.
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// Failed to read a file or directory.
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// Path that could not be read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The engine rejected the file's contents.
    #[error("Invalid data in '{path}': {source}")]
    Data {
        /// File the data came from.
        path: String,
        /// Engine error.
        #[source]
        source: ShipError,
    },

    /// The data directory has no block catalog.
    #[error("Block catalog not found: {0}")]
    MissingCatalog(String),

    /// A blueprint assembled but does not form one structure.
    #[error("Ship '{ship}' is not structurally sound: {issues:?}")]
    Unsound {
        /// Blueprint name.
        ship: String,
        /// Validator issues.
        issues: Vec<String>,
    },
}

/// Result type for data loading operations.
pub type DataLoadResult<T> = Result<T, DataLoadError>;

/// Everything loaded from a data directory.
#[derive(Debug)]
pub struct LoadedData {
    /// Block catalog.
    pub registry: BlockRegistry,
    /// Engine settings.
    pub config: ShipyardConfig,
    /// Blueprints with the files they came from, sorted by path.
    pub blueprints: Vec<(PathBuf, ShipBlueprint)>,
}

fn read(path: &Path) -> DataLoadResult<String> {
    std::fs::read_to_string(path).map_err(|e| DataLoadError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn data_error(path: &Path) -> impl FnOnce(ShipError) -> DataLoadError + '_ {
    move |source| DataLoadError::Data {
        path: path.display().to_string(),
        source,
    }
}

/// Load a block catalog file.
///
/// # Errors
///
/// IO failures, malformed RON or invalid definitions.
pub fn load_catalog(path: &Path) -> DataLoadResult<BlockRegistry> {
    let text = read(path)?;
    BlockRegistry::from_ron_str(&text, &path.display().to_string()).map_err(data_error(path))
}

/// Load a config file.
///
/// # Errors
///
/// IO failures, malformed RON or inconsistent values.
pub fn load_config(path: &Path) -> DataLoadResult<ShipyardConfig> {
    let text = read(path)?;
    ShipyardConfig::from_ron_str(&text, &path.display().to_string()).map_err(data_error(path))
}

/// Load one blueprint file.
///
/// # Errors
///
/// IO failures or malformed RON.
pub fn load_blueprint(path: &Path) -> DataLoadResult<ShipBlueprint> {
    let text = read(path)?;
    ShipBlueprint::from_ron_str(&text, &path.display().to_string()).map_err(data_error(path))
}

/// Load every `.ron` blueprint in a directory, sorted by path. A missing
/// directory yields no blueprints.
///
/// # Errors
///
/// Fails on the first file that cannot be read or parsed.
pub fn load_blueprints(dir: &Path) -> DataLoadResult<Vec<(PathBuf, ShipBlueprint)>> {
    if !dir.exists() {
        tracing::warn!("Blueprint directory does not exist: {}", dir.display());
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| DataLoadError::Io {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| DataLoadError::Io {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "ron") {
            paths.push(path);
        }
    }
    paths.sort();

    paths
        .into_iter()
        .map(|path| load_blueprint(&path).map(|bp| (path, bp)))
        .collect()
}

/// Load catalog, config and blueprints from a data directory.
///
/// # Errors
///
/// [`DataLoadError::MissingCatalog`] if `blocks.ron` is absent, or any
/// load error.
pub fn load_data_directory(dir: &Path) -> DataLoadResult<LoadedData> {
    let catalog = dir.join(CATALOG_FILE);
    if !catalog.exists() {
        return Err(DataLoadError::MissingCatalog(catalog.display().to_string()));
    }
    let registry = load_catalog(&catalog)?;

    let config_path = dir.join(CONFIG_FILE);
    let config = if config_path.exists() {
        load_config(&config_path)?
    } else {
        ShipyardConfig::default()
    };

    let blueprints = load_blueprints(&dir.join(SHIPS_DIR))?;
    tracing::info!(
        "Loaded {} block types and {} blueprints from {}",
        registry.len(),
        blueprints.len(),
        dir.display()
    );

    Ok(LoadedData {
        registry,
        config,
        blueprints,
    })
}

/// Assemble a blueprint and require a sound structure.
///
/// # Errors
///
/// Assembly errors, or [`DataLoadError::Unsound`] if the ship is split.
pub fn assemble_checked(
    path: &Path,
    blueprint: &ShipBlueprint,
    registry: &BlockRegistry,
    config: ShipyardConfig,
) -> DataLoadResult<Ship> {
    let ship = blueprint
        .assemble(registry, config)
        .map_err(data_error(path))?;
    let report = ship.validate_structural_integrity();
    if !report.is_valid {
        return Err(DataLoadError::Unsound {
            ship: blueprint.name.clone(),
            issues: report.issues,
        });
    }
    for warning in &report.warnings {
        tracing::warn!(ship = %blueprint.name, "{warning}");
    }
    Ok(ship)
}

/// Validate all data files in a directory and report on every ship.
///
/// # Errors
///
/// Returns the first error found.
pub fn validate_data_directory(dir: &Path) -> DataLoadResult<Vec<ShipReport>> {
    let data = load_data_directory(dir)?;
    data.blueprints
        .iter()
        .map(|(path, blueprint)| {
            let mut ship = assemble_checked(path, blueprint, &data.registry, data.config)?;
            Ok(ShipReport::new(&mut ship))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_catalog() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            validate_data_directory(dir.path()),
            Err(DataLoadError::MissingCatalog(_))
        ));
    }

    #[test]
    fn test_missing_ships_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_blueprints(&dir.path().join("ships")).unwrap().is_empty());
    }

    #[test]
    fn test_bad_ron_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocks.ron");
        std::fs::write(&path, "[ (id: ").unwrap();
        let err = load_catalog(&path).unwrap_err();
        assert!(matches!(err, DataLoadError::Data { .. }));
        assert!(err.to_string().contains("blocks.ron"));
    }
}
