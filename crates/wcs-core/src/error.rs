// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Error taxonomy for offset storage, controller transitions and commands.

use crate::position::Position;
use thiserror::Error;

/// Failures of the durable offset store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Key not present in the backend.
    #[error("not found")]
    NotFound,
    /// I/O error while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization/deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Persisted document parsed but violates the store invariants.
    #[error("corrupt offsets file: {0}")]
    Corrupt(String),
    /// Persisted document uses a schema version this build cannot read.
    #[error("unsupported offsets file version {found} (supported: {supported})")]
    UnsupportedVersion {
        /// Version found in the document.
        found: u32,
        /// Highest version understood by this build.
        supported: u32,
    },
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// Failures of controller transitions.
#[derive(Debug, Error)]
pub enum OffsetError {
    /// Redefining "the active slot" while in machine space.
    #[error("Offsets in machine space are not supported")]
    MachineSpaceOffset,
    /// Offsets must be finite to be stored and applied.
    #[error("offset must be finite, got {0}")]
    NonFiniteOffset(Position),
    /// The store could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The motion layer's applied offset disagrees with the active slot.
    #[error("applied offset mismatch: expected {expected}, motion layer reports {observed}")]
    InvariantViolation {
        /// Offset the controller believes is applied.
        expected: Position,
        /// Offset reported by the motion layer.
        observed: Position,
    },
    /// A previous holder of the controller lock panicked mid-transition.
    #[error("offset controller lock poisoned")]
    Poisoned,
}

/// Failures turning an operator line into a controller call.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Nothing to execute on the line.
    #[error("empty command")]
    Empty,
    /// Command name not handled here.
    #[error("unknown command: {0}")]
    Unknown(String),
    /// A parameter word could not be parsed.
    #[error("malformed parameter '{0}'")]
    MalformedParameter(String),
    /// `G10` without `L2`.
    #[error("L2 must be specified")]
    MissingL2,
    /// `G10` without a `P` word in `0..=6`.
    #[error("P0-6 must be specified")]
    BadSlot,
    /// Axis word carried NaN or infinity.
    #[error("axis {0} must be a finite number")]
    NonFinite(char),
    /// The controller rejected the transition.
    #[error(transparent)]
    Offset(#[from] OffsetError),
}

impl From<StoreError> for CommandError {
    fn from(err: StoreError) -> Self {
        Self::Offset(OffsetError::Store(err))
    }
}
