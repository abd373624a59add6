use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Name-addressed file storage.
///
/// Names are relative, `/`-separated paths. The name passed to `save` is a
/// request; the backend may pick a different one to avoid overwriting an
/// existing file and returns the name it actually used.
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Store bytes under (approximately) `name` and return the stored name.
    async fn save(&self, name: &str, data: &[u8]) -> Result<String, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.save_stream(name, reader).await
    }

    /// Store data from an async reader and return the stored name.
    async fn save_stream(&self, name: &str, reader: BoxReader) -> Result<String, StorageError>;

    /// Retrieve all bytes of a stored file.
    async fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.open(name).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Open a stored file as a streaming async reader.
    async fn open(&self, name: &str) -> Result<BoxReader, StorageError>;

    /// Check whether a file exists.
    async fn exists(&self, name: &str) -> Result<bool, StorageError>;

    /// Delete a stored file.
    ///
    /// Returns `true` if the file was deleted, `false` if it did not exist.
    async fn delete(&self, name: &str) -> Result<bool, StorageError>;

    /// Get the size of a stored file in bytes.
    async fn size(&self, name: &str) -> Result<u64, StorageError>;
}
