use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use order_spec::Target;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store io error: {0}")]
    Io(#[from] io::Error),
    #[error("store contents are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Rejected(String),
}

/// Field access on the host record that holds the encoded answer set.
pub trait RecordStore {
    /// Previously stored tokens for `target`, if any.
    fn read(&self, target: &Target) -> Result<Option<Vec<String>>, StoreError>;

    /// Stores `tokens` for `target`; `None` clears the field.
    fn write(&mut self, target: &Target, tokens: Option<&[String]>) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: BTreeMap<Target, Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(mut self, target: Target, tokens: Vec<String>) -> Self {
        self.records.insert(target, tokens);
        self
    }

    pub fn get(&self, target: &Target) -> Option<&[String]> {
        self.records.get(target).map(Vec::as_slice)
    }
}

impl RecordStore for MemoryStore {
    fn read(&self, target: &Target) -> Result<Option<Vec<String>>, StoreError> {
        Ok(self.records.get(target).cloned())
    }

    fn write(&mut self, target: &Target, tokens: Option<&[String]>) -> Result<(), StoreError> {
        match tokens {
            Some(tokens) => {
                self.records.insert(target.clone(), tokens.to_vec());
            }
            None => {
                self.records.remove(target);
            }
        }
        Ok(())
    }
}

type Tables = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// JSON object on disk: table id, then record id, then the stored tokens.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Tables, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }
}

impl RecordStore for JsonFileStore {
    fn read(&self, target: &Target) -> Result<Option<Vec<String>>, StoreError> {
        Ok(self
            .load()?
            .remove(&target.table_id)
            .and_then(|mut records| records.remove(&target.record_id)))
    }

    fn write(&mut self, target: &Target, tokens: Option<&[String]>) -> Result<(), StoreError> {
        let mut tables = self.load()?;
        match tokens {
            Some(tokens) => {
                tables
                    .entry(target.table_id.clone())
                    .or_default()
                    .insert(target.record_id.clone(), tokens.to_vec());
            }
            None => {
                if let Some(records) = tables.get_mut(&target.table_id) {
                    records.remove(&target.record_id);
                    if records.is_empty() {
                        tables.remove(&target.table_id);
                    }
                }
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&tables)?)?;
        Ok(())
    }
}
