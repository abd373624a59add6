use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rand::Rng;
use rand::distr::Alphanumeric;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::traits::{BoxReader, FileStorage};

/// How many times `save` retries with a fresh suffix before giving up.
const MAX_NAME_ATTEMPTS: usize = 16;

/// Filesystem-backed file store.
///
/// Files live at `{base_path}/{name}`. Writes go to `{base_path}/.tmp` first
/// and are linked into place once fully written.
pub struct FilesystemStorage {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemStorage {
    /// Create a new filesystem store, creating the base directory if needed.
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    /// Resolve a storage name to a path under the base directory.
    fn file_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        validate_name(name)?;
        Ok(self.base_path.join(name))
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    /// Copy `reader` into `temp_path`, enforcing the size limit.
    async fn write_temp(&self, temp_path: &Path, mut reader: BoxReader) -> Result<u64, StorageError> {
        let mut total_bytes: u64 = 0;
        let mut buf = vec![0u8; 64 * 1024]; // 64KB read buffer
        let mut temp_file = fs::File::create(temp_path).await?;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        Ok(total_bytes)
    }

    /// Link the finished temp file under `name`, or under a suffixed variant
    /// if `name` is taken. Linking fails on an existing target, so two
    /// concurrent writers can never claim the same name.
    async fn link_into_place(&self, temp_path: &Path, name: &str) -> Result<String, StorageError> {
        let mut candidate = name.to_string();
        for _ in 0..MAX_NAME_ATTEMPTS {
            let target = self.file_path(&candidate)?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).await?;
            }
            match fs::hard_link(temp_path, &target).await {
                Ok(()) => return Ok(candidate),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    candidate = with_suffix(name, &random_suffix());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(StorageError::InvalidName(format!(
            "no free name found for {name}"
        )))
    }
}

/// Reject names that could escape the base directory.
fn validate_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() {
        return Err(StorageError::InvalidName("name is empty".into()));
    }
    if name.starts_with('/') {
        return Err(StorageError::InvalidName(format!("absolute name: {name}")));
    }
    if name.contains('\\') || name.contains('\0') {
        return Err(StorageError::InvalidName(format!(
            "forbidden character in {name}"
        )));
    }
    if name
        .split('/')
        .any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        return Err(StorageError::InvalidName(format!(
            "bad path segment in {name}"
        )));
    }
    if name.split('/').next() == Some(".tmp") {
        return Err(StorageError::InvalidName(format!("reserved name: {name}")));
    }
    Ok(())
}

fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(char::from)
        .collect()
}

/// Insert `_{suffix}` before the extension of the final path segment.
fn with_suffix(name: &str, suffix: &str) -> String {
    let (dir, file) = match name.rfind('/') {
        Some(pos) => (&name[..=pos], &name[pos + 1..]),
        None => ("", name),
    };
    match file.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{dir}{stem}_{suffix}.{ext}"),
        _ => format!("{dir}{file}_{suffix}"),
    }
}

#[async_trait]
impl FileStorage for FilesystemStorage {
    async fn save_stream(&self, name: &str, reader: BoxReader) -> Result<String, StorageError> {
        validate_name(name)?;

        let temp_path = self.temp_path();
        let result = match self.write_temp(&temp_path, reader).await {
            Ok(size) => self
                .link_into_place(&temp_path, name)
                .await
                .map(|stored| (stored, size)),
            Err(e) => Err(e),
        };
        // The stored copy is a separate link; the temp entry always goes.
        let _ = fs::remove_file(&temp_path).await;
        let (stored_name, total_bytes) = result?;

        tracing::debug!(name = %stored_name, size = total_bytes, "Stored file");
        Ok(stored_name)
    }

    async fn open(&self, name: &str) -> Result<BoxReader, StorageError> {
        let file_path = self.file_path(name)?;
        match fs::File::open(&file_path).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool, StorageError> {
        let file_path = self.file_path(name)?;
        Ok(fs::try_exists(&file_path).await?)
    }

    async fn delete(&self, name: &str) -> Result<bool, StorageError> {
        let file_path = self.file_path(name)?;
        match fs::remove_file(&file_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn size(&self, name: &str) -> Result<u64, StorageError> {
        let file_path = self.file_path(name)?;
        match fs::metadata(&file_path).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
