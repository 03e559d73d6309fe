// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Port to the motion layer's coordinate transform.
//!
//! The motion layer owns stepping, planning and homing. The offset controller
//! only ever adds deltas to its live additive offset, and is the sole caller
//! of [`MotionTransform::apply_offset`].

use crate::position::Position;

/// Additive offset sink exposed by the motion layer.
pub trait MotionTransform {
    /// Adds `delta` to the currently applied additive offset.
    fn apply_offset(&mut self, delta: Position);

    /// Offset currently applied, when the motion layer can report it.
    ///
    /// Used to detect controller/motion disagreement. Implementations that
    /// cannot observe their own offset return `None`.
    fn applied_offset(&self) -> Option<Position> {
        None
    }
}
