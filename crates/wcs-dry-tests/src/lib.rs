// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for wcs crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`backend`] - In-memory offset backend fake for testing without filesystem
//! - [`motion`] - Recording motion transform that keeps every applied delta

pub mod backend;
pub mod motion;

pub use backend::InMemoryOffsetBackend;
pub use motion::RecordingMotion;

use wcs_core::{OffsetController, OffsetTable};

/// Controller over fresh in-memory fakes, plus handles to inspect them.
///
/// # Errors
/// Propagates bootstrap failures of the in-memory backend.
pub fn fresh_controller() -> Result<
    (
        OffsetController<InMemoryOffsetBackend, RecordingMotion>,
        InMemoryOffsetBackend,
        RecordingMotion,
    ),
    wcs_core::StoreError,
> {
    let backend = InMemoryOffsetBackend::new();
    let motion = RecordingMotion::new();
    let table = OffsetTable::load(backend.clone())?;
    Ok((
        OffsetController::new(table, motion.clone()),
        backend,
        motion,
    ))
}
