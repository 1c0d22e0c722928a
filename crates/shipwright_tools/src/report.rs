//! Stats reports for assembled ships.

use std::fmt::Write as _;

use serde::Serialize;
use shipwright_core::resources::ShipResources;
use shipwright_core::ship::{Ship, ShipStats};
use shipwright_core::validation::StructuralReport;

/// Summary of one assembled ship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShipReport {
    /// Ship name.
    pub name: String,
    /// Whether the ship is eligible for simulation.
    pub constructed: bool,
    /// Number of connections.
    pub connections: usize,
    /// Derived stats.
    pub stats: ShipStats,
    /// Resource pools.
    pub resources: ShipResources,
    /// Validator output.
    pub structural: StructuralReport,
}

impl ShipReport {
    /// Build a report, computing stats if needed.
    #[must_use]
    pub fn new(ship: &mut Ship) -> Self {
        Self {
            name: ship.name().to_string(),
            constructed: ship.is_constructed(),
            connections: ship.graph().edge_count(),
            stats: ship.stats(),
            resources: *ship.resources(),
            structural: ship.validate_structural_integrity(),
        }
    }

    /// Human-readable multi-line summary.
    #[must_use]
    pub fn to_text(&self) -> String {
        let s = &self.stats;
        let r = &self.resources;
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{}", self.name);
        let _ = writeln!(
            out,
            "  blocks: {}  connections: {}  constructed: {}",
            s.block_count, self.connections, self.constructed
        );
        let _ = writeln!(
            out,
            "  mass: {}  thrust: {}  armor: {}",
            s.total_mass, s.total_thrust, s.total_armor
        );
        let _ = writeln!(
            out,
            "  center of mass: ({}, {})  inertia: {}",
            s.center_of_mass.x, s.center_of_mass.y, s.moment_of_inertia
        );
        let _ = writeln!(
            out,
            "  acceleration: {}  max speed: {}  maneuverability: {}",
            s.acceleration, s.max_speed, s.maneuverability
        );
        let _ = writeln!(
            out,
            "  fuel: {}/{}  power: {}/{}  shield: {}/{}",
            r.fuel, r.max_fuel, r.power, r.max_power, r.shield, r.max_shield
        );
        for issue in &self.structural.issues {
            let _ = writeln!(out, "  issue: {issue}");
        }
        for warning in &self.structural.warnings {
            let _ = writeln!(out, "  warning: {warning}");
        }
        out
    }
}

/// Render reports as a pretty JSON array.
///
/// # Errors
///
/// Propagates serialization failures.
pub fn to_json(reports: &[ShipReport]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipwright_test_utils::fixtures::three_hull_line;

    #[test]
    fn test_text_report() {
        let report = ShipReport::new(&mut three_hull_line());
        let text = report.to_text();
        assert!(text.starts_with("three\n"));
        assert!(text.contains("blocks: 3  connections: 2  constructed: true"));
        assert!(text.contains("inertia: 20480"));
    }

    #[test]
    fn test_json_report() {
        let report = ShipReport::new(&mut three_hull_line());
        let json = to_json(&[report]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value[0]["name"], "three");
        assert_eq!(value[0]["stats"]["moment_of_inertia"], 20480.0);
        assert_eq!(value[0]["structural"]["is_valid"], true);
    }
}
