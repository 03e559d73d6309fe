// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Recording motion transform.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use wcs_core::{MotionTransform, Position};

/// Motion layer fake that records every `apply_offset` delta.
///
/// Clones share the log. `applied_offset` reports the running sum, so the
/// controller's invariant check runs against it.
#[derive(Clone, Default)]
pub struct RecordingMotion {
    deltas: Arc<Mutex<Vec<Position>>>,
}

impl RecordingMotion {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Position>> {
        self.deltas.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// All deltas applied so far, in call order.
    pub fn deltas(&self) -> Vec<Position> {
        self.lock().clone()
    }

    /// Number of `apply_offset` calls.
    pub fn call_count(&self) -> usize {
        self.lock().len()
    }

    /// Sum of every delta: the net additive offset on the machine.
    pub fn net_offset(&self) -> Position {
        self.lock().iter().fold(Position::ZERO, |acc, d| acc + *d)
    }
}

impl MotionTransform for RecordingMotion {
    fn apply_offset(&mut self, delta: Position) {
        self.lock().push(delta);
    }

    fn applied_offset(&self) -> Option<Position> {
        Some(self.net_offset())
    }
}
