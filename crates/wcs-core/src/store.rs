// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Durable offset store: slot → offset mapping over a raw storage port.
//!
//! The table always holds exactly one offset per slot `1..=6`. Every mutation
//! rewrites the full document through the backend before the in-memory copy
//! changes, so memory never runs ahead of disk.

use crate::error::StoreError;
use crate::position::Position;
use crate::slot::Slot;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Backend key under which the offsets document is stored.
pub const STATE_KEY: &str = "work_offsets";

/// Schema version written by this build.
pub const FORMAT_VERSION: u32 = 1;

/// Storage port for raw offset blobs (keyed by logical name).
pub trait OffsetBackend {
    /// Load a raw blob. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, StoreError>;
    /// Persist a raw blob, replacing any previous contents.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), StoreError>;
}

/// Versioned on-disk representation of the offset table.
///
/// Unknown fields are ignored on read so newer writers stay loadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetsDocument {
    /// Schema version.
    pub version: u32,
    /// One record per slot, ascending.
    pub offsets: Vec<SlotRecord>,
}

/// A single persisted slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotRecord {
    /// Slot index (`1..=6`).
    pub slot: u8,
    /// Conventional name (`G54`..`G59`); informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Stored offset.
    pub offset: Position,
}

impl OffsetsDocument {
    /// Builds a current-version document from a full table.
    pub fn from_offsets(offsets: &[Position; Slot::COUNT]) -> Self {
        Self {
            version: FORMAT_VERSION,
            offsets: Slot::all()
                .map(|slot| SlotRecord {
                    slot: slot.index(),
                    name: Some(slot.name()),
                    offset: offsets[slot.ordinal()],
                })
                .collect(),
        }
    }

    /// Parses and validates a persisted document.
    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(StoreError::Corrupt("file is empty".into()));
        }
        let doc: Self = serde_json::from_slice(bytes)?;
        if doc.version == 0 || doc.version > FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: doc.version,
                supported: FORMAT_VERSION,
            });
        }
        Ok(doc)
    }

    /// Serializes the document as pretty JSON.
    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Converts the records into a dense table, checking every slot appears exactly once.
    pub fn into_offsets(self) -> Result<[Position; Slot::COUNT], StoreError> {
        let mut table: [Option<Position>; Slot::COUNT] = [None; Slot::COUNT];
        for record in self.offsets {
            let slot = Slot::new(record.slot).ok_or_else(|| {
                StoreError::Corrupt(format!("slot {} outside 1..=6", record.slot))
            })?;
            if !record.offset.is_finite() {
                return Err(StoreError::Corrupt(format!(
                    "slot {slot} holds a non-finite offset"
                )));
            }
            let cell = &mut table[slot.ordinal()];
            if cell.is_some() {
                return Err(StoreError::Corrupt(format!("slot {slot} appears twice")));
            }
            *cell = Some(record.offset);
        }
        let mut out = [Position::ZERO; Slot::COUNT];
        for slot in Slot::all() {
            out[slot.ordinal()] = table[slot.ordinal()]
                .ok_or_else(|| StoreError::Corrupt(format!("slot {slot} missing")))?;
        }
        Ok(out)
    }
}

/// The offset store service: typed table backed by an [`OffsetBackend`].
pub struct OffsetTable<B> {
    backend: B,
    offsets: [Position; Slot::COUNT],
}

impl<B> OffsetTable<B> {
    /// Returns the offset stored for `slot`.
    pub fn get(&self, slot: Slot) -> Position {
        self.offsets[slot.ordinal()]
    }

    /// Iterates `(slot, offset)` pairs in ascending slot order.
    ///
    /// The iterator borrows the table; call again to restart.
    pub fn all(&self) -> impl Iterator<Item = (Slot, Position)> + '_ {
        Slot::all().map(move |slot| (slot, self.offsets[slot.ordinal()]))
    }

    /// Borrow the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Consume the table and return the backend.
    pub fn into_inner(self) -> B {
        self.backend
    }
}

impl<B> OffsetTable<B>
where
    B: OffsetBackend,
{
    /// Loads the table from `backend`.
    ///
    /// A missing document bootstraps all six slots to zero and persists them
    /// immediately. An unreadable or invalid document is returned as an error;
    /// it is never replaced with defaults.
    #[instrument(skip(backend))]
    pub fn load(backend: B) -> Result<Self, StoreError> {
        match backend.load_raw(STATE_KEY) {
            Ok(bytes) => {
                let offsets = OffsetsDocument::decode(&bytes)?.into_offsets()?;
                info!("loaded work offsets");
                Ok(Self { backend, offsets })
            }
            Err(StoreError::NotFound) => {
                let table = Self {
                    backend,
                    offsets: [Position::ZERO; Slot::COUNT],
                };
                table.persist(&table.offsets)?;
                info!("no stored work offsets; initialized all slots to zero");
                Ok(table)
            }
            Err(err) => Err(err),
        }
    }

    /// Replaces the offset for `slot` and persists the full table.
    ///
    /// Blocking I/O. On failure neither memory nor storage changes.
    pub fn set(&mut self, slot: Slot, offset: Position) -> Result<(), StoreError> {
        let mut next = self.offsets;
        next[slot.ordinal()] = offset;
        self.persist(&next)?;
        self.offsets = next;
        debug!(slot = slot.index(), %offset, "stored work offset");
        Ok(())
    }

    fn persist(&self, offsets: &[Position; Slot::COUNT]) -> Result<(), StoreError> {
        let data = OffsetsDocument::from_offsets(offsets).encode()?;
        self.backend.save_raw(STATE_KEY, &data)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::expect_used)]

    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct CellBackend {
        data: RefCell<Option<Vec<u8>>>,
    }

    impl OffsetBackend for CellBackend {
        fn load_raw(&self, _key: &str) -> Result<Vec<u8>, StoreError> {
            self.data.borrow().clone().ok_or(StoreError::NotFound)
        }

        fn save_raw(&self, _key: &str, data: &[u8]) -> Result<(), StoreError> {
            *self.data.borrow_mut() = Some(data.to_vec());
            Ok(())
        }
    }

    fn slot(i: u8) -> Slot {
        Slot::new(i).unwrap()
    }

    #[test]
    fn bootstrap_writes_six_zero_slots() {
        let table = OffsetTable::load(CellBackend::default()).unwrap();
        assert!(table.all().all(|(_, p)| p == Position::ZERO));
        assert_eq!(table.all().count(), 6);

        let bytes = table.backend().data.borrow().clone().expect("persisted");
        let doc = OffsetsDocument::decode(&bytes).unwrap();
        assert_eq!(doc.version, FORMAT_VERSION);
        assert_eq!(doc.offsets.len(), 6);
        assert_eq!(doc.offsets[0].name.as_deref(), Some("G54"));
    }

    #[test]
    fn set_is_visible_after_reload() {
        let mut table = OffsetTable::load(CellBackend::default()).unwrap();
        table.set(slot(2), Position::new(10.0, 5.0, 0.0, 0.0)).unwrap();
        let reloaded = OffsetTable::load(table.into_inner()).unwrap();
        assert_eq!(reloaded.get(slot(2)), Position::new(10.0, 5.0, 0.0, 0.0));
        assert_eq!(reloaded.get(slot(1)), Position::ZERO);
    }

    #[test]
    fn all_is_ascending_and_restartable() {
        let table = OffsetTable::load(CellBackend::default()).unwrap();
        let first: Vec<u8> = table.all().map(|(s, _)| s.index()).collect();
        let second: Vec<u8> = table.all().map(|(s, _)| s.index()).collect();
        assert_eq!(first, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(first, second);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let json = br#"{
            "version": 1,
            "written_by": "future build",
            "offsets": [
                {"slot": 1, "offset": {"x": 1.0, "y": 2.0, "z": 3.0, "e": 4.0, "a": 9.0}},
                {"slot": 2, "name": "G55", "offset": {"x": 0.0, "y": 0.0, "z": 0.0, "e": 0.0}},
                {"slot": 3, "offset": {"x": 0.0, "y": 0.0, "z": 0.0, "e": 0.0}},
                {"slot": 4, "offset": {"x": 0.0, "y": 0.0, "z": 0.0, "e": 0.0}},
                {"slot": 5, "offset": {"x": 0.0, "y": 0.0, "z": 0.0, "e": 0.0}},
                {"slot": 6, "offset": {"x": 0.0, "y": 0.0, "z": 0.0, "e": 0.0}, "note": "spindle fixture"}
            ]
        }"#;
        let offsets = OffsetsDocument::decode(json).unwrap().into_offsets().unwrap();
        assert_eq!(offsets[0], Position::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(offsets[5], Position::ZERO);
    }

    #[test]
    fn missing_axis_fails_to_load() {
        let zero = r#"{"x": 0.0, "y": 0.0, "z": 0.0, "e": 0.0}"#;
        for partial in [r#"{"y": 2.0}"#, "{}"] {
            let records: Vec<String> = (1..=6)
                .map(|i| {
                    let offset = if i == 1 { partial } else { zero };
                    format!(r#"{{"slot": {i}, "offset": {offset}}}"#)
                })
                .collect();
            let json = format!(r#"{{"version": 1, "offsets": [{}]}}"#, records.join(","));
            let backend = CellBackend::default();
            *backend.data.borrow_mut() = Some(json.into_bytes());

            let err = OffsetTable::load(backend).err().expect("partial offset rejected");
            assert!(matches!(err, StoreError::Serde(_)), "{partial}: {err}");
        }
    }

    #[test]
    fn missing_slot_is_corrupt() {
        let mut doc = OffsetsDocument::from_offsets(&[Position::ZERO; 6]);
        doc.offsets.remove(3);
        assert!(matches!(doc.into_offsets(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn duplicate_slot_is_corrupt() {
        let mut doc = OffsetsDocument::from_offsets(&[Position::ZERO; 6]);
        doc.offsets[1].slot = 1;
        assert!(matches!(doc.into_offsets(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn slot_zero_is_corrupt() {
        let mut doc = OffsetsDocument::from_offsets(&[Position::ZERO; 6]);
        doc.offsets[0].slot = 0;
        assert!(matches!(doc.into_offsets(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn newer_version_is_rejected() {
        let mut doc = OffsetsDocument::from_offsets(&[Position::ZERO; 6]);
        doc.version = FORMAT_VERSION + 1;
        let bytes = doc.encode().unwrap();
        assert!(matches!(
            OffsetsDocument::decode(&bytes),
            Err(StoreError::UnsupportedVersion { found: 2, supported: 1 })
        ));
    }

    #[test]
    fn empty_or_garbage_files_do_not_reset() {
        let backend = CellBackend::default();
        *backend.data.borrow_mut() = Some(Vec::new());
        assert!(matches!(
            OffsetTable::load(backend),
            Err(StoreError::Corrupt(_))
        ));

        let backend = CellBackend::default();
        *backend.data.borrow_mut() = Some(b"\x80\x02}q\x00".to_vec());
        let err = OffsetTable::load(backend).err().expect("garbage rejected");
        assert!(matches!(err, StoreError::Serde(_)));
    }
}
