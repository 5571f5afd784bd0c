//! Append-only JSON store for finalized responses
//!
//! The whole array is read, extended and rewritten on every append. Appends
//! go through a single writer lock so concurrent finalizations never drop
//! each other's records.

use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::record::ResponseRecord;
use crate::{Result, SurveyError};

pub struct ResponseStore {
    path: PathBuf,
    writer: Mutex<()>,
}

impl ResponseStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every stored record, oldest first.
    ///
    /// A missing or unreadable file reads as an empty store.
    pub async fn load(&self) -> Vec<ResponseRecord> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", self.path.display(), e);
                return Vec::new();
            }
        };

        match serde_json::from_str(&content) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("Ignoring malformed store {}: {}", self.path.display(), e);
                Vec::new()
            }
        }
    }

    /// Append one record and return the new record count
    pub async fn append(&self, record: &ResponseRecord) -> Result<usize> {
        let _guard = self.writer.lock().await;

        let mut records = self.load().await;
        records.push(record.clone());
        self.write_all(&records).await?;

        tracing::debug!("Stored response #{} in {}", records.len(), self.path.display());
        Ok(records.len())
    }

    /// Number of stored records
    pub async fn count(&self) -> usize {
        self.load().await.len()
    }

    async fn write_all(&self, records: &[ResponseRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await.map_err(|e| {
            SurveyError::Storage(format!("Failed to replace {}: {}", self.path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Rating;
    use crate::event::UserId;

    fn record(user: i64) -> ResponseRecord {
        ResponseRecord {
            user_id: UserId(user),
            photo: "p".into(),
            rating: Rating::Dislike,
            details: vec!["❌ Просто не зашёл".into()],
            city: "Гомель".into(),
            deep: None,
        }
    }

    #[tokio::test]
    async fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResponseStore::new(dir.path().join("absent.json"));
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = ResponseStore::new(&path);
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_append_preserves_prior_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResponseStore::new(dir.path().join("nested/results.json"));

        assert_eq!(store.append(&record(1)).await.unwrap(), 1);
        assert_eq!(store.append(&record(2)).await.unwrap(), 2);
        assert_eq!(store.append(&record(3)).await.unwrap(), 3);

        let loaded = store.load().await;
        assert_eq!(loaded, vec![record(1), record(2), record(3)]);
    }

    #[tokio::test]
    async fn test_file_keeps_cyrillic_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResponseStore::new(dir.path().join("results.json"));
        store.append(&record(1)).await.unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("Гомель"));
        assert!(raw.contains("\"deep\": null"));
    }
}
