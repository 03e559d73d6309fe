// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Offset controller: the coordinate-system state machine.
//!
//! States are [`CoordinateSystem::MachineSpace`] and
//! [`CoordinateSystem::InSystem`]. The controller is the only writer of the
//! motion layer's additive offset, and after every transition the net offset
//! it has applied equals the active slot's stored offset (zero in machine
//! space).
//!
//! Transition order is fixed: persist (when the store changes), remove the old
//! delta, apply the new delta, update the state. Storage failures abort before
//! the motion layer is touched.

use crate::error::OffsetError;
use crate::motion::MotionTransform;
use crate::position::Position;
use crate::slot::{CoordinateSystem, Slot};
use crate::store::{OffsetBackend, OffsetTable};
use core::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info};

/// Largest per-axis disagreement tolerated between the controller and a
/// motion layer that reports its applied offset.
const APPLIED_OFFSET_TOLERANCE: f64 = 1e-6;

/// Slot addressed by a redefine (`G10 L2 P..`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedefineTarget {
    /// `P0`: whichever slot is currently active.
    Active,
    /// `P1`..`P6`: an explicit slot, active or not.
    Slot(Slot),
}

impl RedefineTarget {
    /// Maps a `P` value in `0..=6` to a target.
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(Self::Active),
            n => u8::try_from(n).ok().and_then(Slot::new).map(Self::Slot),
        }
    }
}

/// One line of the offsets report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReportEntry {
    /// Slot described by this line.
    pub slot: Slot,
    /// Stored offset.
    pub offset: Position,
    /// Whether this slot is the active coordinate system.
    pub active: bool,
}

/// Snapshot of all stored offsets plus the active marker.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetReport {
    /// Coordinate system in effect when the report was taken.
    pub state: CoordinateSystem,
    /// Entries in ascending slot order.
    pub entries: Vec<ReportEntry>,
}

impl fmt::Display for OffsetReport {
    /// One line per slot: `[G54: x,y,z,e]` with `*` on the active slot.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            let p = entry.offset;
            write!(
                f,
                "[{}: {:.3},{:.3},{:.3},{:.3}]{}",
                entry.slot.name(),
                p.x,
                p.y,
                p.z,
                p.e,
                if entry.active { "*" } else { "" }
            )?;
        }
        Ok(())
    }
}

/// State machine tracking the active coordinate system.
///
/// Constructed with its store and motion layer explicitly. The active slot is
/// volatile: a fresh controller always starts in machine space.
pub struct OffsetController<B, M> {
    table: OffsetTable<B>,
    motion: M,
    state: CoordinateSystem,
}

impl<B, M> OffsetController<B, M>
where
    B: OffsetBackend,
    M: MotionTransform,
{
    /// Creates a controller in machine space.
    ///
    /// `motion` must not carry a work offset yet; the controller assumes the
    /// applied additive offset starts at zero.
    pub fn new(table: OffsetTable<B>, motion: M) -> Self {
        Self {
            table,
            motion,
            state: CoordinateSystem::MachineSpace,
        }
    }

    /// Current coordinate system.
    pub const fn state(&self) -> CoordinateSystem {
        self.state
    }

    /// Offset the motion layer is expected to carry right now.
    pub fn active_offset(&self) -> Position {
        self.state
            .slot()
            .map_or(Position::ZERO, |slot| self.table.get(slot))
    }

    /// Borrow the offset store.
    pub fn table(&self) -> &OffsetTable<B> {
        &self.table
    }

    /// Borrow the motion layer.
    pub fn motion(&self) -> &M {
        &self.motion
    }

    /// Activates `target` (G54..G59).
    ///
    /// Valid from any state, including re-selecting the active slot.
    pub fn select(&mut self, target: Slot) -> Result<Slot, OffsetError> {
        if let CoordinateSystem::InSystem(old) = self.state {
            self.push_delta(-self.table.get(old));
        }
        self.push_delta(self.table.get(target));
        self.state = CoordinateSystem::InSystem(target);
        info!(slot = target.index(), name = %target.name(), "coordinate system selected");
        self.verify_applied()?;
        Ok(target)
    }

    /// Drops back to machine space (G53).
    ///
    /// Returns the slot that was active, or `None` if already in machine
    /// space (no-op). The previous slot is not remembered for later.
    pub fn suspend(&mut self) -> Result<Option<Slot>, OffsetError> {
        let CoordinateSystem::InSystem(old) = self.state else {
            debug!("already in machine space");
            return Ok(None);
        };
        self.push_delta(-self.table.get(old));
        self.state = CoordinateSystem::MachineSpace;
        info!(slot = old.index(), "machine coordinates active");
        self.verify_applied()?;
        Ok(Some(old))
    }

    /// Stores a new offset for `target` (G10 L2).
    ///
    /// When the target is the active slot the motion layer is moved from the
    /// old offset to the new one; otherwise only the store changes. Fails
    /// without side effects when `target` is [`RedefineTarget::Active`] in
    /// machine space, when `offset` is not finite, or when persisting fails.
    pub fn redefine(
        &mut self,
        target: RedefineTarget,
        offset: Position,
    ) -> Result<Slot, OffsetError> {
        if !offset.is_finite() {
            return Err(OffsetError::NonFiniteOffset(offset));
        }
        let slot = match target {
            RedefineTarget::Active => self.state.slot().ok_or(OffsetError::MachineSpaceOffset)?,
            RedefineTarget::Slot(slot) => slot,
        };
        let old = self.table.get(slot);
        self.table.set(slot, offset)?;

        if self.state.slot() == Some(slot) {
            self.push_delta(-old);
            self.push_delta(offset);
            info!(slot = slot.index(), %offset, "active work offset redefined");
            self.verify_applied()?;
        } else {
            info!(slot = slot.index(), %offset, "inactive work offset redefined");
        }
        Ok(slot)
    }

    /// Read-only listing of every slot with the active marker.
    pub fn list(&self) -> OffsetReport {
        let active = self.state.slot();
        OffsetReport {
            state: self.state,
            entries: self
                .table
                .all()
                .map(|(slot, offset)| ReportEntry {
                    slot,
                    offset,
                    active: active == Some(slot),
                })
                .collect(),
        }
    }

    fn push_delta(&mut self, delta: Position) {
        debug!(%delta, "apply_offset");
        self.motion.apply_offset(delta);
    }

    fn verify_applied(&self) -> Result<(), OffsetError> {
        let Some(observed) = self.motion.applied_offset() else {
            return Ok(());
        };
        let expected = self.active_offset();
        if observed.max_abs_diff(&expected) > APPLIED_OFFSET_TOLERANCE {
            error!(%expected, %observed, state = %self.state, "motion layer offset mismatch");
            return Err(OffsetError::InvariantViolation { expected, observed });
        }
        Ok(())
    }
}

/// Cloneable handle serializing every transition behind one lock.
///
/// For hosts where commands arrive from several channels; "remove old, apply
/// new" never interleaves with another transition.
pub struct SharedController<B, M> {
    inner: Arc<Mutex<OffsetController<B, M>>>,
}

impl<B, M> Clone for SharedController<B, M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B, M> SharedController<B, M>
where
    B: OffsetBackend,
    M: MotionTransform,
{
    /// Wrap a controller.
    pub fn new(controller: OffsetController<B, M>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    /// Exclusive access for a multi-step operation.
    ///
    /// A poisoned lock means an earlier transition panicked part way; the
    /// applied offset can no longer be trusted, so it is reported instead of
    /// recovered.
    pub fn lock(&self) -> Result<MutexGuard<'_, OffsetController<B, M>>, OffsetError> {
        self.inner.lock().map_err(|_| OffsetError::Poisoned)
    }

    /// See [`OffsetController::select`].
    pub fn select(&self, target: Slot) -> Result<Slot, OffsetError> {
        self.lock()?.select(target)
    }

    /// See [`OffsetController::suspend`].
    pub fn suspend(&self) -> Result<Option<Slot>, OffsetError> {
        self.lock()?.suspend()
    }

    /// See [`OffsetController::redefine`].
    pub fn redefine(&self, target: RedefineTarget, offset: Position) -> Result<Slot, OffsetError> {
        self.lock()?.redefine(target, offset)
    }

    /// See [`OffsetController::list`].
    pub fn list(&self) -> Result<OffsetReport, OffsetError> {
        Ok(self.lock()?.list())
    }

    /// See [`OffsetController::state`].
    pub fn state(&self) -> Result<CoordinateSystem, OffsetError> {
        Ok(self.lock()?.state())
    }
}
