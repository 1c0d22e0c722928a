//! Tunable settings for the build grid, auto-connect and regeneration.
//!
//! Every field has a default, so a RON file only needs the values it
//! changes:
//!
//! ```ron
//! ShipyardConfig(
//!     grid: (width: 16, height: 12),
//!     auto_connect_threshold: 64,
//! )
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShipError};
use crate::math::{fixed_serde, Fixed};

/// Build grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Side length of one cell in world units.
    #[serde(with = "fixed_serde")]
    pub cell_size: Fixed,
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// Snap free placements to the nearest cell center.
    pub snap_to_grid: bool,
}

impl GridConfig {
    /// Default cell size in world units.
    pub const DEFAULT_CELL_SIZE: i32 = 32;
    /// Default grid width and height in cells.
    pub const DEFAULT_DIMENSION: u32 = 32;
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size: Fixed::from_num(Self::DEFAULT_CELL_SIZE),
            width: Self::DEFAULT_DIMENSION,
            height: Self::DEFAULT_DIMENSION,
            snap_to_grid: true,
        }
    }
}

/// Engine-wide settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipyardConfig {
    /// Build grid.
    pub grid: GridConfig,
    /// Maximum block-center distance for auto-connect.
    #[serde(with = "fixed_serde")]
    pub auto_connect_threshold: Fixed,
    /// Passive shield regeneration per second.
    #[serde(with = "fixed_serde")]
    pub shield_regen_per_second: Fixed,
    /// Passive power regeneration per second.
    #[serde(with = "fixed_serde")]
    pub power_regen_per_second: Fixed,
    /// Slack allowed when checking that connected ports face each other.
    #[serde(with = "fixed_serde")]
    pub port_alignment_tolerance: Fixed,
}

impl ShipyardConfig {
    /// Default auto-connect distance.
    pub const DEFAULT_AUTO_CONNECT_THRESHOLD: i32 = 50;
    /// Default shield regeneration per second.
    pub const DEFAULT_SHIELD_REGEN: i32 = 2;
    /// Default power regeneration per second.
    pub const DEFAULT_POWER_REGEN: i32 = 5;
    /// Default port alignment tolerance.
    pub const DEFAULT_ALIGNMENT_TOLERANCE: i32 = 4;

    /// Parse a RON config.
    ///
    /// # Errors
    ///
    /// Fails on malformed RON or if [`validate`](Self::validate) reports
    /// problems.
    pub fn from_ron_str(src: &str, label: &str) -> Result<Self> {
        let config: Self = ron::from_str(src).map_err(|e| ShipError::DataParse {
            path: label.to_string(),
            message: e.to_string(),
        })?;
        config.ensure_valid()?;
        Ok(config)
    }

    /// Reject inconsistent values.
    ///
    /// # Errors
    ///
    /// [`ShipError::InvalidConfig`] listing everything
    /// [`validate`](Self::validate) found.
    pub fn ensure_valid(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ShipError::InvalidConfig(errors))
        }
    }

    /// List every inconsistent value; empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.grid.cell_size <= Fixed::ZERO {
            errors.push("grid.cell_size must be positive".to_string());
        }
        if self.grid.width == 0 || self.grid.height == 0 {
            errors.push("grid dimensions must be non-zero".to_string());
        }
        for (label, value) in [
            ("auto_connect_threshold", self.auto_connect_threshold),
            ("shield_regen_per_second", self.shield_regen_per_second),
            ("power_regen_per_second", self.power_regen_per_second),
            ("port_alignment_tolerance", self.port_alignment_tolerance),
        ] {
            if value < Fixed::ZERO {
                errors.push(format!("{label} must not be negative"));
            }
        }
        errors
    }
}

impl Default for ShipyardConfig {
    fn default() -> Self {
        Self {
            grid: GridConfig::default(),
            auto_connect_threshold: Fixed::from_num(Self::DEFAULT_AUTO_CONNECT_THRESHOLD),
            shield_regen_per_second: Fixed::from_num(Self::DEFAULT_SHIELD_REGEN),
            power_regen_per_second: Fixed::from_num(Self::DEFAULT_POWER_REGEN),
            port_alignment_tolerance: Fixed::from_num(Self::DEFAULT_ALIGNMENT_TOLERANCE),
        }
    }
}
