//! Fixed-point math utilities for deterministic simulation.
//!
//! Entity positions and velocities are fixed-point so that two matches fed
//! the same intent stream land on bit-identical positions on every CPU.
//! Float math is confined to the pure score and wave formulas, whose
//! results are floored back to integers before they touch the state.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all positional math.
///
/// 32 integer bits and 32 fractional bits.
pub type Fixed = I32F32;

/// Build a fixed-point constant from whole units.
#[must_use]
pub const fn units(n: i64) -> Fixed {
    Fixed::from_bits(n << 32)
}

/// Build a fixed-point constant from thousandths of a unit.
#[must_use]
pub const fn milli(n: i64) -> Fixed {
    Fixed::from_bits((n << 32) / 1000)
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

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Serde support for `Option<Fixed>`.
pub mod option_fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize an optional fixed-point number.
    pub fn serialize<S>(value: &Option<Fixed>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(v) => v.to_bits().serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize an optional fixed-point number.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Fixed>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt = Option::<i64>::deserialize(deserializer)?;
        Ok(opt.map(Fixed::from_bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Convert from floats. Non-finite components become zero.
    #[must_use]
    pub fn from_f64(x: f64, y: f64) -> Self {
        Self::new(finite_or_zero(x), finite_or_zero(y))
    }

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Clamp both components into `[-limit, limit]`.
    #[must_use]
    pub fn clamp_symmetric(self, limit: Fixed) -> Self {
        Self {
            x: self.x.clamp(-limit, limit),
            y: self.y.clamp(-limit, limit),
        }
    }

    /// Scale both components by a fixed-point factor.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// Convert to a float pair for display layers.
    #[must_use]
    pub fn to_f64(self) -> (f64, f64) {
        (self.x.to_num(), self.y.to_num())
    }
}

fn finite_or_zero(value: f64) -> Fixed {
    if value.is_finite() {
        Fixed::saturating_from_num(value)
    } else {
        Fixed::ZERO
    }
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
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
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_const_constructors() {
        assert_eq!(units(3), Fixed::from_num(3));
        assert_eq!(units(-4), Fixed::from_num(-4));
        assert_eq!(milli(250), Fixed::from_num(0.25));
        assert_eq!(milli(62_500), Fixed::from_num(62.5));
    }

    #[test]
    fn test_distance_squared() {
        let a = Vec2Fixed::new(units(0), units(0));
        let b = Vec2Fixed::new(units(3), units(4));
        assert_eq!(a.distance_squared(b), units(25));
    }

    #[test]
    fn test_clamp_symmetric() {
        let v = Vec2Fixed::new(units(5), units(-7)).clamp_symmetric(units(3));
        assert_eq!(v, Vec2Fixed::new(units(3), units(-3)));
    }

    #[test]
    fn test_from_f64_rejects_non_finite() {
        let v = Vec2Fixed::from_f64(f64::NAN, f64::INFINITY);
        assert_eq!(v, Vec2Fixed::ZERO);
    }

    #[test]
    fn test_serde_preserves_bits() {
        let v = Vec2Fixed::new(milli(160), milli(-2500));
        let bytes = bincode::serialize(&v).unwrap();
        let restored: Vec2Fixed = bincode::deserialize(&bytes).unwrap();
        assert_eq!(v, restored);
    }
}
