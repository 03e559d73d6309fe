// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Work coordinate system slots and the controller's coordinate-system state.

use core::fmt;
use serde::{Deserialize, Serialize};

/// One of the six work coordinate systems (G54..G59).
///
/// Invariant: the wrapped index is always in `1..=6`. Index 0 (machine space)
/// is not a slot; it is represented by [`CoordinateSystem::MachineSpace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Slot(u8);

impl Slot {
    /// Number of work coordinate systems.
    pub const COUNT: usize = 6;
    /// Lowest valid slot index.
    pub const MIN: u8 = 1;
    /// Highest valid slot index.
    pub const MAX: u8 = 6;

    /// G-code number of slot 1 (G54).
    const FIRST_GCODE: u8 = 54;

    /// Returns the slot for `index`, or `None` outside `1..=6`.
    pub const fn new(index: u8) -> Option<Self> {
        if index >= Self::MIN && index <= Self::MAX {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Slot index in `1..=6`.
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Zero-based position, handy for array storage.
    pub const fn ordinal(self) -> usize {
        (self.0 - Self::MIN) as usize
    }

    /// All slots in ascending order.
    pub fn all() -> impl Iterator<Item = Self> + Clone {
        (Self::MIN..=Self::MAX).map(Self)
    }

    /// Conventional G-code number (54..=59).
    pub const fn gcode(self) -> u8 {
        Self::FIRST_GCODE + self.0 - Self::MIN
    }

    /// Conventional name, e.g. `G55` for slot 2.
    pub fn name(self) -> String {
        format!("G{}", self.gcode())
    }

    /// Maps a G-code number in `54..=59` to its slot.
    pub const fn from_gcode(code: u8) -> Option<Self> {
        match code.checked_sub(Self::FIRST_GCODE) {
            Some(rel) => Self::new(rel + Self::MIN),
            None => None,
        }
    }
}

impl TryFrom<u8> for Slot {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| format!("slot {value} outside 1..=6"))
    }
}

impl From<Slot> for u8 {
    fn from(slot: Slot) -> Self {
        slot.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which coordinate system is in effect on the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoordinateSystem {
    /// No work offset applied (active slot 0).
    #[default]
    MachineSpace,
    /// The given work offset is applied.
    InSystem(Slot),
}

impl CoordinateSystem {
    /// Active slot, if any.
    pub const fn slot(self) -> Option<Slot> {
        match self {
            Self::MachineSpace => None,
            Self::InSystem(slot) => Some(slot),
        }
    }
}

impl fmt::Display for CoordinateSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MachineSpace => f.write_str("machine space"),
            Self::InSystem(slot) => write!(f, "coordinate system {} ({})", slot, slot.name()),
        }
    }
}
