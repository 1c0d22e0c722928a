//! Shield-then-armor damage mitigation.
//!
//! Incoming damage first drains shields 1:1. Whatever gets through is then
//! reduced by armor: each point of armor removes 5% of a point, but the
//! reduction never exceeds 10% of the post-shield damage. Small hits are
//! blunted proportionally; large hits mostly ignore armor.

use crate::math::Fixed;

/// Cap on armor reduction, as a percentage of post-shield damage.
pub const ARMOR_REDUCTION_CAP_PERCENT: i32 = 10;

/// Damage removed per point of armor, as a percentage of a point.
pub const ARMOR_EFFICIENCY_PERCENT: i32 = 5;

/// Breakdown of one hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageOutcome {
    /// Damage soaked by shields.
    pub absorbed_by_shield: Fixed,
    /// Damage removed by armor.
    pub reduced_by_armor: Fixed,
    /// Damage that reaches the structure.
    pub passed_through: Fixed,
}

fn percent_of(value: Fixed, percent: i32) -> Fixed {
    value * Fixed::from_num(percent) / Fixed::from_num(100)
}

/// Armor reduction for post-shield damage: `min(damage * 0.1, armor * 0.05)`.
#[must_use]
pub fn armor_reduction(damage: Fixed, armor: Fixed) -> Fixed {
    let cap = percent_of(damage, ARMOR_REDUCTION_CAP_PERCENT);
    let from_armor = percent_of(armor, ARMOR_EFFICIENCY_PERCENT);
    cap.min(from_armor).max(Fixed::ZERO)
}

/// Resolve a hit against a shield pool and an armor value.
///
/// Negative damage is treated as zero.
#[must_use]
pub fn mitigate_damage(incoming: Fixed, shield: Fixed, armor: Fixed) -> DamageOutcome {
    let incoming = incoming.max(Fixed::ZERO);
    let shield = shield.max(Fixed::ZERO);

    if incoming <= shield {
        return DamageOutcome {
            absorbed_by_shield: incoming,
            reduced_by_armor: Fixed::ZERO,
            passed_through: Fixed::ZERO,
        };
    }

    let remaining = incoming - shield;
    let reduction = armor_reduction(remaining, armor);
    DamageOutcome {
        absorbed_by_shield: shield,
        reduced_by_armor: reduction,
        passed_through: (remaining - reduction).max(Fixed::ZERO),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f(n: i32) -> Fixed {
        Fixed::from_num(n)
    }

    #[test]
    fn test_shield_absorbs_small_hit() {
        let out = mitigate_damage(f(30), f(50), f(100));
        assert_eq!(out.absorbed_by_shield, f(30));
        assert_eq!(out.passed_through, Fixed::ZERO);
    }

    #[test]
    fn test_armor_capped_by_damage() {
        // 100 past shields, armor 1000: armor alone would remove 50, cap is 10.
        let out = mitigate_damage(f(100), Fixed::ZERO, f(1000));
        assert_eq!(out.reduced_by_armor, f(10));
        assert_eq!(out.passed_through, f(90));
    }

    #[test]
    fn test_armor_limited_by_armor_value() {
        // 100 past shields, armor 100: min(10, 5) = 5.
        let out = mitigate_damage(f(150), f(50), f(100));
        assert_eq!(out.absorbed_by_shield, f(50));
        assert_eq!(out.reduced_by_armor, f(5));
        assert_eq!(out.passed_through, f(95));
    }

    #[test]
    fn test_no_armor_no_shield() {
        let out = mitigate_damage(f(42), Fixed::ZERO, Fixed::ZERO);
        assert_eq!(out.passed_through, f(42));
    }

    #[test]
    fn test_negative_damage_is_ignored() {
        let out = mitigate_damage(f(-10), f(5), f(5));
        assert_eq!(out.absorbed_by_shield, Fixed::ZERO);
        assert_eq!(out.passed_through, Fixed::ZERO);
    }
}
