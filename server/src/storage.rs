use std::path::{Path, PathBuf};

use async_trait::async_trait;
use routesketch_shared::MapRecord;
use thiserror::Error;

const RECORD_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode map record {path:?}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode map {id}")]
    Encode {
        id: i64,
        #[source]
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait Storage: Send + Sync {
    async fn load_all(&self) -> Result<Vec<MapRecord>, StorageError>;
    async fn save(&self, record: &MapRecord) -> Result<(), StorageError>;
}

pub struct FileStorage {
    data_dir: PathBuf,
}

impl FileStorage {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    fn record_path(&self, id: i64) -> PathBuf {
        self.data_dir.join(format!("{id}.{RECORD_EXTENSION}"))
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

async fn read_record(path: &Path) -> Result<MapRecord, StorageError> {
    let payload = tokio::fs::read(path).await.map_err(io_error(path))?;
    serde_json::from_slice(&payload).map_err(|source| StorageError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

#[async_trait]
impl Storage for FileStorage {
    async fn load_all(&self) -> Result<Vec<MapRecord>, StorageError> {
        let mut entries = tokio::fs::read_dir(&self.data_dir)
            .await
            .map_err(io_error(&self.data_dir))?;
        let mut records = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(io_error(&self.data_dir))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            match read_record(&path).await {
                Ok(record) => records.push(record),
                Err(error) => tracing::warn!(?path, %error, "skipping unreadable map record"),
            }
        }
        records.sort_by_key(|record| record.id);
        Ok(records)
    }

    async fn save(&self, record: &MapRecord) -> Result<(), StorageError> {
        let payload = serde_json::to_vec_pretty(record).map_err(|source| StorageError::Encode {
            id: record.id,
            source,
        })?;
        let path = self.record_path(record.id);
        // Readers must never observe a partially written record.
        let partial = path.with_extension("json.partial");
        tokio::fs::write(&partial, payload)
            .await
            .map_err(io_error(&partial))?;
        tokio::fs::rename(&partial, &path)
            .await
            .map_err(io_error(&path))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use routesketch_shared::FeatureCollection;

    use super::*;

    fn record(id: i64, name: &str) -> MapRecord {
        MapRecord {
            id,
            name: name.to_string(),
            description: None,
            lat: 51.05,
            lng: 13.74,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap(),
            features: FeatureCollection::new(),
        }
    }

    #[tokio::test]
    async fn saved_records_load_back_in_id_order() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());
        storage.save(&record(2, "Elbe")).await.unwrap();
        storage.save(&record(1, "Neustadt")).await.unwrap();

        let loaded = storage.load_all().await.unwrap();
        assert_eq!(loaded, vec![record(1, "Neustadt"), record(2, "Elbe")]);
        assert!(dir.path().join("1.json").exists());
        assert!(!dir.path().join("1.json.partial").exists());
    }

    #[tokio::test]
    async fn saving_again_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());
        storage.save(&record(1, "Draft")).await.unwrap();
        storage.save(&record(1, "Final")).await.unwrap();
        let loaded = storage.load_all().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Final");
    }

    #[tokio::test]
    async fn unreadable_and_foreign_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());
        storage.save(&record(3, "Kept")).await.unwrap();
        std::fs::write(dir.path().join("4.json"), b"{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"hello").unwrap();

        let loaded = storage.load_all().await.unwrap();
        assert_eq!(loaded, vec![record(3, "Kept")]);
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("absent"));
        assert!(matches!(
            storage.load_all().await,
            Err(StorageError::Io { .. })
        ));
    }
}
