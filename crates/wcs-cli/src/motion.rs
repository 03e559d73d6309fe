// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Stand-in motion layer for the operator CLI.

use tracing::info;
use wcs_core::{MotionTransform, Position};

/// Keeps the additive coordinate offset a real toolhead would carry.
#[derive(Debug, Default)]
pub struct SimulatedMotion {
    applied: Position,
}

impl MotionTransform for SimulatedMotion {
    fn apply_offset(&mut self, delta: Position) {
        self.applied = self.applied + delta;
        info!(%delta, applied = %self.applied, "motion offset adjusted");
    }

    fn applied_offset(&self) -> Option<Position> {
        Some(self.applied)
    }
}
