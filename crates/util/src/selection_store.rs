//! JSON-backed persistence for serialized selections.
//!
//! Each parameter owns one slot holding the exact string the widget produced.
//! The store never interprets that string; decoding belongs to the widget.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::serde::ts_seconds;
use chrono::{DateTime, Utc};
use fileselect_types::{ParameterId, PersistenceBridge};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::SELECTIONS_FILE_NAME;
use crate::path_processing::app_config_path;

#[derive(Debug, Error)]
pub enum SelectionStoreError {
    #[error("selection store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("selection store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredSelection {
    pub serialized: String,
    #[serde(with = "ts_seconds")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SelectionFile {
    #[serde(default)]
    selections: BTreeMap<String, StoredSelection>,
}

/// Thread-safe selection store backed by a JSON file.
#[derive(Debug)]
pub struct JsonSelectionStore {
    path: PathBuf,
    file: Mutex<SelectionFile>,
    persist_to_disk: bool,
}

impl JsonSelectionStore {
    /// Open the store at `path`, or at `<config_dir>/fileselect/selections.json`
    /// when `None`. A corrupt file is logged and treated as empty.
    pub fn new<P: Into<Option<PathBuf>>>(path: P) -> Result<Self, SelectionStoreError> {
        let path = path.into().unwrap_or_else(|| app_config_path(SELECTIONS_FILE_NAME));
        let file = load_selection_file(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
            persist_to_disk: true,
        })
    }

    /// In-memory store that never touches disk.
    pub fn ephemeral() -> Self {
        Self {
            path: PathBuf::new(),
            file: Mutex::new(SelectionFile::default()),
            persist_to_disk: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored string for `parameter_id`, or `""` when nothing was saved.
    pub fn load(&self, parameter_id: ParameterId) -> String {
        self.get(parameter_id).map(|stored| stored.serialized).unwrap_or_default()
    }

    pub fn get(&self, parameter_id: ParameterId) -> Option<StoredSelection> {
        let file = self.file.lock().expect("selection store lock");
        file.selections.get(&parameter_id.to_string()).cloned()
    }

    pub fn save(&self, parameter_id: ParameterId, serialized: &str) -> Result<(), SelectionStoreError> {
        let mut file = self.file.lock().expect("selection store lock");
        file.selections.insert(
            parameter_id.to_string(),
            StoredSelection {
                serialized: serialized.to_string(),
                updated_at: Utc::now(),
            },
        );
        if self.persist_to_disk {
            self.save_locked(&file)?;
        }
        debug!(%parameter_id, path = %self.path.display(), "selection stored");
        Ok(())
    }

    fn save_locked(&self, file: &SelectionFile) -> Result<(), SelectionStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(file)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

fn load_selection_file(path: &Path) -> Result<SelectionFile, SelectionStoreError> {
    match fs::read_to_string(path) {
        Ok(data) if data.trim().is_empty() => Ok(SelectionFile::default()),
        Ok(data) => match serde_json::from_str(&data) {
            Ok(file) => Ok(file),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse selection store; starting empty"
                );
                Ok(SelectionFile::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(SelectionFile::default()),
        Err(error) => Err(SelectionStoreError::Io(error)),
    }
}

/// [`PersistenceBridge`] for one parameter's slot in a shared store.
#[derive(Debug, Clone)]
pub struct StoredSelectionBridge {
    store: Arc<JsonSelectionStore>,
    parameter_id: ParameterId,
}

impl StoredSelectionBridge {
    pub fn new(store: Arc<JsonSelectionStore>, parameter_id: ParameterId) -> Self {
        Self { store, parameter_id }
    }
}

impl PersistenceBridge for StoredSelectionBridge {
    fn load_serialized_selection(&self) -> String {
        self.store.load(self.parameter_id)
    }

    fn save_serialized_selection(&self, serialized: &str) {
        if let Err(error) = self.store.save(self.parameter_id, serialized) {
            warn!(parameter_id = %self.parameter_id, %error, "failed to persist selection");
        }
    }
}
