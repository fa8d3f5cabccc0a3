//! Local key-value storage for the sender cache.
//!
//! The form never reaches for storage on its own: a [`Storage`] is handed to
//! the session when it is created and whenever sender details change. Reads
//! and writes are best-effort. A missing or unreadable record is treated as
//! "nothing saved", and a failed write is logged and otherwise ignored.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::model::SenderDetails;

/// Key of the single record the application keeps.
pub const SENDER_KEY: &str = "invoice-maker-sender";

/// On-disk layout of the sender record. Missing keys read as empty.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct SenderRecord {
    sender_name: String,
    sender_address: String,
    sender_email: String,
    sender_phone: String,
}

impl From<&SenderDetails> for SenderRecord {
    fn from(sender: &SenderDetails) -> Self {
        Self {
            sender_name: sender.name.clone(),
            sender_address: sender.address.clone(),
            sender_email: sender.email.clone(),
            sender_phone: sender.phone.clone(),
        }
    }
}

impl From<SenderRecord> for SenderDetails {
    fn from(record: SenderRecord) -> Self {
        Self {
            name: record.sender_name,
            address: record.sender_address,
            email: record.sender_email,
            phone: record.sender_phone,
        }
    }
}

pub trait Storage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One `<key>.toml` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.toml"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;
        fs::write(&path, value).map_err(|source| StorageError::Io { path, source })
    }
}

/// Process-local storage; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Strict load: distinguishes "nothing saved" from a broken record.
pub fn try_load_sender(storage: &dyn Storage) -> Result<Option<SenderDetails>, StorageError> {
    match storage.read(SENDER_KEY)? {
        Some(content) => {
            let record: SenderRecord = toml::from_str(&content)?;
            Ok(Some(record.into()))
        }
        None => Ok(None),
    }
}

/// Rehydrates saved sender details, or empty ones if nothing usable is stored.
pub fn load_sender(storage: &dyn Storage) -> SenderDetails {
    match try_load_sender(storage) {
        Ok(Some(sender)) => {
            tracing::debug!("restored saved sender details");
            sender
        }
        Ok(None) => SenderDetails::default(),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable sender record");
            SenderDetails::default()
        }
    }
}

/// Overwrites the stored record with all four sender fields.
pub fn save_sender(storage: &dyn Storage, sender: &SenderDetails) -> Result<(), StorageError> {
    let content = toml::to_string_pretty(&SenderRecord::from(sender))?;
    storage.write(SENDER_KEY, &content)?;
    tracing::debug!("sender details saved");
    Ok(())
}
