use chrono::Utc;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::common::EntryId;
use crate::services::store::MetadataStore;

// Row stored in the CSV
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MetaRecord {
    pub entry_id: u64,
    pub meta_key: String,
    pub meta_value: String,
    pub updated_at: String, // RFC 3339
}

const HEADERS: [&str; 4] = ["entry_id", "meta_key", "meta_value", "updated_at"];

/// Entry metadata persisted in a CSV file.
pub struct MetadataDatabase {
    csv_path: PathBuf,
    file_mutex: Mutex<()>,
}

impl MetadataDatabase {
    /// Open the database, creating the file with its header row when missing.
    pub fn open(csv_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let csv_path = csv_path.as_ref().to_path_buf();

        if !csv_path.exists() {
            info!("Creating new entry metadata file at {}", csv_path.display());

            if let Some(dir) = csv_path.parent().filter(|d| !d.as_os_str().is_empty()) {
                fs::create_dir_all(dir)?;
            }

            let file = File::create(&csv_path)?;
            let mut writer = WriterBuilder::new().has_headers(true).from_writer(file);
            writer.write_record(HEADERS)?;
            writer.flush()?;
        }

        Ok(Self {
            csv_path,
            file_mutex: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.csv_path
    }

    // Caller must hold the file lock
    fn read_records(&self) -> Result<Vec<MetaRecord>, StoreError> {
        let file = match File::open(&self.csv_path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(file);
        let mut records = Vec::new();
        for result in reader.deserialize() {
            let record: MetaRecord = result?;
            records.push(record);
        }
        Ok(records)
    }

    // Caller must hold the file lock
    fn write_records(&self, records: &[MetaRecord]) -> Result<(), StoreError> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.csv_path)?;

        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(HEADERS)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// All metadata rows stored for one entry
    pub fn entry_meta(&self, entry_id: EntryId) -> Result<Vec<MetaRecord>, StoreError> {
        let _lock = self.file_mutex.lock().map_err(|_| StoreError::Lock)?;

        Ok(self
            .read_records()?
            .into_iter()
            .filter(|record| record.entry_id == entry_id.0)
            .collect())
    }
}

impl MetadataStore for MetadataDatabase {
    fn get_entry_meta(&self, entry_id: EntryId, key: &str) -> Result<Option<String>, StoreError> {
        let _lock = self.file_mutex.lock().map_err(|_| StoreError::Lock)?;

        let value = self
            .read_records()?
            .into_iter()
            .find(|record| record.entry_id == entry_id.0 && record.meta_key == key)
            .map(|record| record.meta_value);

        debug!(
            "Metadata lookup for entry {} key {}: {}",
            entry_id,
            key,
            if value.is_some() { "found" } else { "absent" }
        );

        Ok(value)
    }

    fn set_entry_meta(&self, entry_id: EntryId, key: &str, value: &str) -> Result<(), StoreError> {
        let _lock = self.file_mutex.lock().map_err(|_| StoreError::Lock)?;

        let mut records = self.read_records()?;
        let now = Utc::now().to_rfc3339();

        match records
            .iter_mut()
            .find(|record| record.entry_id == entry_id.0 && record.meta_key == key)
        {
            Some(existing) => {
                existing.meta_value = value.to_string();
                existing.updated_at = now;
                info!("Replaced metadata {} for entry {}", key, entry_id);
            }
            None => {
                records.push(MetaRecord {
                    entry_id: entry_id.0,
                    meta_key: key.to_string(),
                    meta_value: value.to_string(),
                    updated_at: now,
                });
                info!("Stored metadata {} for entry {}", key, entry_id);
            }
        }

        self.write_records(&records)
    }
}

// Open the metadata database at the configured path
pub fn create_metadata_database(csv_path: &Path) -> Result<Arc<MetadataDatabase>, StoreError> {
    MetadataDatabase::open(csv_path).map(Arc::new)
}

#[cfg(test)]
#[path = "database_test.rs"]
mod database_test;
