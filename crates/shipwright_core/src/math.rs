//! Fixed-point math utilities for deterministic simulation.
//!
//! Ship stats feed a lockstep physics step, so every derived quantity
//! (center of mass, inertia, drag, max speed) is computed in fixed-point
//! and is bit-identical on every platform.

use fixed::types::I48F16;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// 48 integer bits leave room for `mass * distance²` summed over a few
/// hundred blocks spread across a full build grid.
/// Range: approximately ±1.4e14. Precision: approximately 0.000015.
pub type Fixed = I48F16;

/// Build a [`Fixed`] from an integer ratio `num / den`.
///
/// Used for the tuning constants so they never pass through floats.
#[must_use]
pub fn ratio(num: i32, den: i32) -> Fixed {
    Fixed::from_num(num) / Fixed::from_num(den)
}

/// Serde support for fixed-point numbers as plain decimals.
///
/// Catalogs and blueprints are authored by hand, so values are written as
/// `12.5` rather than raw bits. Parsing goes through `f64` once at load time;
/// the simulation itself never touches floats.
pub mod fixed_serde {
    use super::Fixed;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_num::<f64>().serialize(serializer)
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(raw)
            .ok_or_else(|| D::Error::custom(format!("{raw} is outside the fixed-point range")))
    }
}

/// Serde support for `Option<Fixed>` written as an optional decimal.
pub mod option_fixed_serde {
    use super::Fixed;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize an optional fixed-point number.
    pub fn serialize<S>(value: &Option<Fixed>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.map(|v| v.to_num::<f64>()).serialize(serializer)
    }

    /// Deserialize an optional fixed-point number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Fixed>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<f64>::deserialize(deserializer)? {
            Some(raw) => Fixed::checked_from_num(raw)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("{raw} is outside the fixed-point range"))),
            None => Ok(None),
        }
    }
}

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

impl Vec2Fixed {
    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from integer coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Squared length (avoids sqrt for comparisons).
    #[must_use]
    pub fn length_squared(self) -> Fixed {
        self.dot(self)
    }

    /// Euclidean length.
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.length_squared())
    }

    /// Squared distance to another point.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        (self - other).length_squared()
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Dot product of two vectors.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product (signed parallelogram area).
    #[must_use]
    pub fn cross(self, other: Self) -> Fixed {
        self.x * other.y - self.y * other.x
    }

    /// Multiply both components by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Unit vector in the same direction, or zero for the zero vector.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len == Fixed::ZERO {
            return Self::ZERO;
        }
        Self::new(self.x / len, self.y / len)
    }
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::AddAssign for Vec2Fixed {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Neg for Vec2Fixed {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

/// Computes the square root of a fixed-point number by bisection.
///
/// Returns zero for non-positive input. The result is the largest
/// representable value whose square does not exceed `value`.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    let one = Fixed::from_num(1);

    let mut low = Fixed::ZERO;
    // Exclusive upper bound: `high * high > value` holds from the start.
    let mut high = value.max(one).saturating_add(Fixed::DELTA);

    // 48 integer + 16 fractional bits: 64 halvings exhaust the search space.
    for _ in 0..64 {
        if high - low <= Fixed::DELTA {
            break;
        }
        let mid = low + (high - low) / Fixed::from_num(2);
        if mid.saturating_mul(mid) <= value {
            low = mid;
        } else {
            high = mid;
        }
    }

    low
}

/// Quarter-turn rotation of a block on the build grid.
///
/// Rotations are exact: offsets swap and negate components instead of
/// going through trigonometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    /// No rotation.
    #[default]
    Deg0,
    /// 90 degrees counter-clockwise.
    Deg90,
    /// 180 degrees.
    Deg180,
    /// 270 degrees counter-clockwise.
    Deg270,
}

impl Rotation {
    /// Number of counter-clockwise quarter turns.
    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 1,
            Self::Deg180 => 2,
            Self::Deg270 => 3,
        }
    }

    /// Build a rotation from a quarter-turn count (wraps modulo 4).
    #[must_use]
    pub const fn from_quarter_turns(turns: u8) -> Self {
        match turns % 4 {
            0 => Self::Deg0,
            1 => Self::Deg90,
            2 => Self::Deg180,
            _ => Self::Deg270,
        }
    }

    /// Rotate a vector about the origin.
    #[must_use]
    pub fn apply(self, v: Vec2Fixed) -> Vec2Fixed {
        match self {
            Self::Deg0 => v,
            Self::Deg90 => Vec2Fixed::new(-v.y, v.x),
            Self::Deg180 => Vec2Fixed::new(-v.x, -v.y),
            Self::Deg270 => Vec2Fixed::new(v.y, -v.x),
        }
    }
}
