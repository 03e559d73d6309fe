// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Four-axis position vector used for offsets and motion deltas.

use core::fmt;
use core::ops::{Add, Neg, Sub};
use serde::{Deserialize, Serialize};

/// Machine axes carried by a [`Position`], in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Linear X axis.
    X,
    /// Linear Y axis.
    Y,
    /// Linear Z axis.
    Z,
    /// Extruder / auxiliary axis.
    E,
}

impl Axis {
    /// All axes in canonical order.
    pub const ALL: [Self; 4] = [Self::X, Self::Y, Self::Z, Self::E];

    /// G-code parameter letter for this axis.
    pub const fn letter(self) -> char {
        match self {
            Self::X => 'X',
            Self::Y => 'Y',
            Self::Z => 'Z',
            Self::E => 'E',
        }
    }
}

/// Offset or delta in machine units.
///
/// Plain value type: equality is component-wise, there is no identity beyond
/// the four components. All four fields are required when deserializing;
/// unknown extra fields are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
    /// E component.
    pub e: f64,
}

impl Position {
    /// The zero vector (machine space carries no offset).
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Creates a position from its four components.
    pub const fn new(x: f64, y: f64, z: f64, e: f64) -> Self {
        Self { x, y, z, e }
    }

    /// Builds a position from a fallible axis lookup.
    ///
    /// Axes yielding `Ok(None)` default to `0.0`; the first error stops the walk.
    pub fn try_from_axes<E, F>(mut lookup: F) -> Result<Self, E>
    where
        F: FnMut(Axis) -> Result<Option<f64>, E>,
    {
        let mut values = [0.0; 4];
        for (value, axis) in values.iter_mut().zip(Axis::ALL) {
            if let Some(v) = lookup(axis)? {
                *value = v;
            }
        }
        let [x, y, z, e] = values;
        Ok(Self { x, y, z, e })
    }

    /// Components as an array in canonical order.
    pub const fn to_array(self) -> [f64; 4] {
        [self.x, self.y, self.z, self.e]
    }

    /// `true` when every component is finite.
    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|c| c.is_finite())
    }

    /// Largest absolute per-axis difference to `other`.
    pub fn max_abs_diff(&self, other: &Self) -> f64 {
        let a = self.to_array();
        let b = other.to_array();
        a.iter()
            .zip(b.iter())
            .map(|(l, r)| (l - r).abs())
            .fold(0.0, f64::max)
    }
}

impl Add for Position {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(
            self.x + rhs.x,
            self.y + rhs.y,
            self.z + rhs.z,
            self.e + rhs.e,
        )
    }
}

impl Sub for Position {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl Neg for Position {
    type Output = Self;
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, -self.e)
    }
}

impl fmt::Display for Position {
    /// Formats as `X.. Y.. Z.. E..` with three decimals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "X{:.3} Y{:.3} Z{:.3} E{:.3}",
            self.x, self.y, self.z, self.e
        )
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn negation_undoes_addition() {
        let p = Position::new(10.0, -5.5, 0.25, 3.0);
        assert_eq!(p + (-p), Position::ZERO);
        assert_eq!(Position::ZERO - p, -p);
    }

    #[test]
    fn try_from_axes_defaults_missing_to_zero() {
        let p = Position::try_from_axes(|axis| {
            Ok::<_, ()>(match axis {
                Axis::X => Some(10.0),
                Axis::Y => Some(5.0),
                _ => None,
            })
        });
        assert_eq!(p, Ok(Position::new(10.0, 5.0, 0.0, 0.0)));
    }

    #[test]
    fn try_from_axes_stops_at_first_error() {
        let mut seen = Vec::new();
        let p = Position::try_from_axes(|axis| {
            seen.push(axis);
            if axis == Axis::Y {
                Err(axis.letter())
            } else {
                Ok(Some(1.0))
            }
        });
        assert_eq!(p, Err('Y'));
        assert_eq!(seen, vec![Axis::X, Axis::Y]);
    }

    #[test]
    fn deserializing_requires_every_axis() {
        let full: Position =
            serde_json::from_str(r#"{"x":1.0,"y":2.0,"z":3.0,"e":4.0,"a":9.0}"#).unwrap();
        assert_eq!(full, Position::new(1.0, 2.0, 3.0, 4.0));
        assert!(serde_json::from_str::<Position>(r#"{"x":1.0,"y":2.0,"z":3.0}"#).is_err());
        assert!(serde_json::from_str::<Position>("{}").is_err());
    }

    #[test]
    fn display_uses_three_decimals() {
        let p = Position::new(1.0, -2.5, 0.0, 0.12345);
        assert_eq!(p.to_string(), "X1.000 Y-2.500 Z0.000 E0.123");
    }

    #[test]
    fn non_finite_components_are_detected() {
        assert!(Position::new(1.0, 2.0, 3.0, 4.0).is_finite());
        assert!(!Position::new(f64::NAN, 0.0, 0.0, 0.0).is_finite());
        assert!(!Position::new(0.0, 0.0, f64::INFINITY, 0.0).is_finite());
    }

    #[test]
    fn max_abs_diff_picks_worst_axis() {
        let a = Position::new(1.0, 2.0, 3.0, 4.0);
        let b = Position::new(1.5, 2.0, 0.0, 4.0);
        assert!((a.max_abs_diff(&b) - 3.0).abs() < f64::EPSILON);
    }
}
