//! Persisted apply records keyed by section identity.
//!
//! Each applied section gets `<write_dir>/state/<typename>-<name>.json`
//! holding the paths revert needs. Writes use the same `.tmp` + rename
//! pattern as the config writer, so a revert after a process restart sees
//! exactly what the last apply produced.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pdconf_core::types::{RecordedPaths, SectionId};

use crate::error::{io_err, CompileError};
use crate::writer::safe_remove;

/// On-disk apply record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StateRecord {
    pub section: SectionId,
    pub applied_at: DateTime<Utc>,
    pub paths: RecordedPaths,
}

#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<dir>/<typename>-<name>.json`
    pub fn path_for(&self, id: &SectionId) -> PathBuf {
        self.dir.join(format!("{}.json", id.file_key()))
    }

    /// Load the record for `id`; `None` if the section was never applied.
    pub fn load(&self, id: &SectionId) -> Result<Option<StateRecord>, CompileError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    pub fn save(&self, id: &SectionId, paths: &RecordedPaths) -> Result<StateRecord, CompileError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| io_err(&self.dir, e))?;

        let record = StateRecord {
            section: id.clone(),
            applied_at: Utc::now(),
            paths: paths.clone(),
        };
        let path = self.path_for(id);
        let json = serde_json::to_string_pretty(&record)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
        Ok(record)
    }

    pub fn remove(&self, id: &SectionId) -> Result<(), CompileError> {
        let path = self.path_for(id);
        safe_remove(&path).map_err(|e| io_err(&path, e))
    }
}
