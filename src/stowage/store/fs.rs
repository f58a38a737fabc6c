use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::{RecordStore, Row};
use crate::error::{Result, StowageError};
use crate::record::Record;

const DATA_FILENAME: &str = "data.json";

/// File-based row storage: every row lives in a single `data.json` map
/// keyed by record id. Suited to small embedded uses and to exercising
/// the lifecycle against real disk round trips.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn data_path(&self) -> PathBuf {
        self.root.join(DATA_FILENAME)
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(StowageError::Io)?;
        }
        Ok(())
    }

    fn load_rows(&self) -> Result<HashMap<Uuid, Row>> {
        let path = self.data_path();
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(path).map_err(StowageError::Io)?;
        let rows: HashMap<Uuid, Row> =
            serde_json::from_str(&content).map_err(StowageError::Codec)?;
        Ok(rows)
    }

    fn save_rows(&self, rows: &HashMap<Uuid, Row>) -> Result<()> {
        let content = serde_json::to_string_pretty(rows).map_err(StowageError::Codec)?;
        fs::write(self.data_path(), content).map_err(StowageError::Io)?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl RecordStore for FileStore {
    fn save(&mut self, record: &mut Record) -> Result<()> {
        self.ensure_dir()?;
        let mut rows = self.load_rows()?;
        rows.insert(record.id(), record.encoded()?);
        self.save_rows(&rows)?;
        record.on_saved();
        Ok(())
    }

    fn load(&self, id: Uuid) -> Result<Row> {
        let rows = self.load_rows()?;
        rows.get(&id)
            .cloned()
            .ok_or(StowageError::RecordNotFound(id))
    }

    fn delete(&mut self, id: Uuid) -> Result<()> {
        let mut rows = self.load_rows()?;
        if rows.remove(&id).is_none() {
            return Err(StowageError::RecordNotFound(id));
        }
        self.save_rows(&rows)
    }
}
