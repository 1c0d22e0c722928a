//! Ship-level fuel, power and shield pools.
//!
//! Consume-style calls never partially consume: they either take the whole
//! amount and return `true`, or leave the pool untouched and return `false`.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, Fixed};

/// Current and maximum resource levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipResources {
    /// Current fuel.
    #[serde(with = "fixed_serde")]
    pub fuel: Fixed,
    /// Fuel capacity.
    #[serde(with = "fixed_serde")]
    pub max_fuel: Fixed,
    /// Current power.
    #[serde(with = "fixed_serde")]
    pub power: Fixed,
    /// Power capacity.
    #[serde(with = "fixed_serde")]
    pub max_power: Fixed,
    /// Current shield.
    #[serde(with = "fixed_serde")]
    pub shield: Fixed,
    /// Shield capacity.
    #[serde(with = "fixed_serde")]
    pub max_shield: Fixed,
}

impl ShipResources {
    /// Pools filled to the given capacities.
    #[must_use]
    pub fn full(max_fuel: Fixed, max_power: Fixed, max_shield: Fixed) -> Self {
        Self {
            fuel: max_fuel,
            max_fuel,
            power: max_power,
            max_power,
            shield: max_shield,
            max_shield,
        }
    }

    /// Deduct fuel if at least `amount` is available.
    #[must_use = "thrust only happens if fuel was actually consumed"]
    pub fn consume_fuel(&mut self, amount: Fixed) -> bool {
        consume(&mut self.fuel, amount)
    }

    /// Deduct power if at least `amount` is available.
    #[must_use = "an ability only fires if power was actually consumed"]
    pub fn consume_power(&mut self, amount: Fixed) -> bool {
        consume(&mut self.power, amount)
    }

    /// Add fuel, clamped to capacity.
    pub fn refuel(&mut self, amount: Fixed) {
        self.fuel = (self.fuel + amount.max(Fixed::ZERO)).min(self.max_fuel);
    }

    /// Add power, clamped to capacity.
    pub fn recharge(&mut self, amount: Fixed) {
        self.power = (self.power + amount.max(Fixed::ZERO)).min(self.max_power);
    }

    /// Fill every pool.
    pub fn replenish(&mut self) {
        self.fuel = self.max_fuel;
        self.power = self.max_power;
        self.shield = self.max_shield;
    }

    /// Passive regeneration over `delta` seconds.
    ///
    /// Shield and power move toward their maximum at the given per-second
    /// rates and never pass it. Pools already full are left as they are.
    pub fn regenerate(&mut self, delta: Fixed, shield_rate: Fixed, power_rate: Fixed) {
        if self.shield < self.max_shield {
            self.shield = (self.shield + shield_rate * delta).min(self.max_shield);
        }
        if self.power < self.max_power {
            self.power = (self.power + power_rate * delta).min(self.max_power);
        }
    }

    /// Install new capacities; current levels are clamped to them.
    pub fn set_capacities(&mut self, max_fuel: Fixed, max_power: Fixed, max_shield: Fixed) {
        self.max_fuel = max_fuel;
        self.max_power = max_power;
        self.max_shield = max_shield;
        self.fuel = self.fuel.min(max_fuel);
        self.power = self.power.min(max_power);
        self.shield = self.shield.min(max_shield);
    }
}

fn consume(pool: &mut Fixed, amount: Fixed) -> bool {
    if amount < Fixed::ZERO || *pool < amount {
        return false;
    }
    *pool = (*pool - amount).max(Fixed::ZERO);
    true
}

impl Hash for ShipResources {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for value in [
            self.fuel,
            self.max_fuel,
            self.power,
            self.max_power,
            self.shield,
            self.max_shield,
        ] {
            value.to_bits().hash(state);
        }
    }
}
