use std::collections::HashMap;

use uuid::Uuid;

use super::{RecordStore, Row};
use crate::error::{Result, StowageError};
use crate::record::Record;

/// In-memory row storage for testing and development.
/// Does NOT persist data.
#[derive(Default)]
pub struct MemoryStore {
    rows: HashMap<Uuid, Row>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RecordStore for MemoryStore {
    fn save(&mut self, record: &mut Record) -> Result<()> {
        let row = record.encoded()?;
        self.rows.insert(record.id(), row);
        record.on_saved();
        Ok(())
    }

    fn load(&self, id: Uuid) -> Result<Row> {
        self.rows
            .get(&id)
            .cloned()
            .ok_or(StowageError::RecordNotFound(id))
    }

    fn delete(&mut self, id: Uuid) -> Result<()> {
        if self.rows.remove(&id).is_none() {
            return Err(StowageError::RecordNotFound(id));
        }
        Ok(())
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::layout::StoreLayout;
    use std::sync::Arc;

    pub struct StoreFixture {
        pub store: MemoryStore,
        pub layout: Arc<StoreLayout>,
    }

    impl StoreFixture {
        pub fn new(layout: Arc<StoreLayout>) -> Self {
            Self {
                store: MemoryStore::new(),
                layout,
            }
        }

        /// Seed a saved record from accessor/value pairs, returning its id.
        pub fn with_record(&mut self, attrs: Vec<(&str, serde_json::Value)>) -> Uuid {
            let mut record = Record::with_attrs(self.layout.clone(), attrs).unwrap();
            self.store.save(&mut record).unwrap();
            record.id()
        }
    }
}
