use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::{Source, Transcription};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Backend(String),
}

// Document store for transcription records
#[async_trait]
pub trait TranscriptionStore: Send + Sync {
    async fn create(
        &self,
        audio_url: &str,
        transcription: &str,
        source: Source,
    ) -> Result<Transcription, StoreError>;

    // Records created at or after `since`, newest first
    async fn recent(&self, since: DateTime<Utc>) -> Result<Vec<Transcription>, StoreError>;

    async fn get(&self, id: &str) -> Result<Option<Transcription>, StoreError>;

    fn is_connected(&self) -> bool;
}

// Process-local store, lost on restart
#[derive(Default)]
pub struct InMemoryTranscriptionStore {
    records: DashMap<String, Transcription>,
}

impl InMemoryTranscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Inserts a record as-is, keeping its id and timestamp
    pub fn insert(&self, record: Transcription) {
        self.records.insert(record.id.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl TranscriptionStore for InMemoryTranscriptionStore {
    async fn create(
        &self,
        audio_url: &str,
        transcription: &str,
        source: Source,
    ) -> Result<Transcription, StoreError> {
        let record = Transcription {
            id: Uuid::new_v4().to_string(),
            audio_url: audio_url.to_string(),
            transcription: transcription.to_string(),
            source,
            created_at: Utc::now(),
        };
        self.insert(record.clone());
        Ok(record)
    }

    async fn recent(&self, since: DateTime<Utc>) -> Result<Vec<Transcription>, StoreError> {
        let mut found: Vec<Transcription> = self
            .records
            .iter()
            .filter(|r| r.created_at >= since)
            .map(|r| r.value().clone())
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn get(&self, id: &str) -> Result<Option<Transcription>, StoreError> {
        Ok(self.records.get(id).map(|r| r.value().clone()))
    }

    fn is_connected(&self) -> bool {
        true
    }
}
