// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! wcs-core: work coordinate system offsets for a motion-control host.
//!
//! Operators define up to six work offsets (G54..G59), switch between them,
//! suspend to machine space (G53) and redefine offsets in place (G10 L2).
//! The [`controller::OffsetController`] guarantees that exactly one offset is
//! additively applied to the motion layer at any time, and the
//! [`store::OffsetTable`] keeps the offset values durable across restarts.
//!
//! Storage and motion are ports ([`store::OffsetBackend`],
//! [`motion::MotionTransform`]); adapters live in other crates.
#![forbid(unsafe_code)]

pub mod command;
pub mod controller;
pub mod error;
pub mod motion;
pub mod position;
pub mod slot;
pub mod store;

pub use command::{Dispatcher, GCodeCommand, OffsetCommand, WorkOffsetsMode};
pub use controller::{OffsetController, OffsetReport, RedefineTarget, ReportEntry, SharedController};
pub use error::{CommandError, OffsetError, StoreError};
pub use motion::MotionTransform;
pub use position::{Axis, Position};
pub use slot::{CoordinateSystem, Slot};
pub use store::{OffsetBackend, OffsetTable, OffsetsDocument, SlotRecord, STATE_KEY};
