//! # Reference Persistence Hosts
//!
//! The SQL round trip is the host framework's business, not this crate's.
//! What lives here is the minimum host needed to drive the full record
//! lifecycle — save, find, reload — against real encoded rows, for tests
//! and for embedding in small applications.
//!
//! A row is one record's containers, encoded per-container by the layout's
//! codecs, keyed by record id. [`RecordStore`] implementations only ever
//! see opaque column text; all casting and dirty tracking stays in the
//! record.
//!
//! ## Implementations
//!
//! - [`memory::MemoryStore`]: no persistence, fast isolated tests
//! - [`fs::FileStore`]: rows in a `data.json` map on disk

use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use crate::error::Result;
use crate::layout::StoreLayout;
use crate::record::Record;

pub mod fs;
pub mod memory;

/// One record's persisted shape: container name → encoded column value.
pub type Row = HashMap<String, String>;

/// Abstract host persistence for records.
///
/// `save` and `reload` drive the record's lifecycle hooks so snapshots
/// stay consistent with what is actually on disk (or in memory).
pub trait RecordStore {
    /// Persist the record's encoded containers, then reset its dirty
    /// state via `on_saved`.
    fn save(&mut self, record: &mut Record) -> Result<()>;

    /// Fetch the raw row for a record id.
    fn load(&self, id: Uuid) -> Result<Row>;

    /// Delete a row permanently.
    fn delete(&mut self, id: Uuid) -> Result<()>;

    /// Re-fetch the record's row and discard uncommitted in-memory
    /// changes via `on_reloaded`.
    fn reload(&self, record: &mut Record) -> Result<()> {
        let row = self.load(record.id())?;
        let rows = row.into_iter().map(|(k, v)| (k, Some(v))).collect();
        record.on_reloaded(&rows)
    }
}

/// Fetch a row and materialize it as a record, via `on_loaded`.
pub fn find(store: &dyn RecordStore, layout: Arc<StoreLayout>, id: Uuid) -> Result<Record> {
    let row = store.load(id)?;
    let rows = row.into_iter().map(|(k, v)| (k, Some(v))).collect();
    let mut record = Record::new(layout).with_id(id);
    record.on_loaded(&rows)?;
    Ok(record)
}
