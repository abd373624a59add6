use std::sync::Arc;

use async_trait::async_trait;
use common::storage::{BoxReader, FileStorage, StorageError};
use sea_orm::DatabaseConnection;

use crate::config::DatabaseConfig;
use crate::database::init_db;

/// Fresh in-memory SQLite database with the full schema.
pub async fn memory_db() -> DatabaseConnection {
    init_db(&DatabaseConfig {
        url: "sqlite::memory:".into(),
        // One connection, otherwise every pool member gets its own database.
        max_connections: 1,
        min_connections: 1,
    })
    .await
    .expect("in-memory database")
}

/// Storage whose `delete` always fails; everything else is delegated.
pub struct FailingDeleteStorage {
    inner: Arc<dyn FileStorage>,
}

impl FailingDeleteStorage {
    pub fn new(inner: Arc<dyn FileStorage>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl FileStorage for FailingDeleteStorage {
    async fn save_stream(&self, name: &str, reader: BoxReader) -> Result<String, StorageError> {
        self.inner.save_stream(name, reader).await
    }

    async fn open(&self, name: &str) -> Result<BoxReader, StorageError> {
        self.inner.open(name).await
    }

    async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        self.inner.exists(name).await
    }

    async fn delete(&self, _name: &str) -> Result<bool, StorageError> {
        Err(StorageError::Io(std::io::Error::other("read-only file system")))
    }

    async fn size(&self, name: &str) -> Result<u64, StorageError> {
        self.inner.size(name).await
    }
}
