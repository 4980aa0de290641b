//! Filesystem capability used by the file manager
//!
//! [`LogFs`] is the seam between the lifecycle state machine and the disk.
//! [`TokioFs`] is the real implementation; tests can substitute a failing
//! one to drive the buffering paths.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::archive::gzip_file;
use crate::error::StorageError;

/// Metadata of one directory entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub path: PathBuf,
    pub len: u64,
    pub modified: SystemTime,
}

/// An open append-mode byte sink
#[async_trait]
pub trait LogSink: Send + Sync {
    fn path(&self) -> &Path;

    async fn append(&mut self, bytes: &[u8]) -> Result<(), StorageError>;

    /// Flush buffered bytes and release the handle
    async fn close(&mut self) -> Result<(), StorageError>;
}

/// Directory, stat, delete and compression operations on log files
#[async_trait]
pub trait LogFs: Send + Sync {
    async fn dir_exists(&self, dir: &Path) -> bool;

    async fn create_dir(&self, dir: &Path) -> Result<(), StorageError>;

    async fn open_append(&self, path: &Path) -> Result<Box<dyn LogSink>, StorageError>;

    /// File names (not paths) in `dir`
    async fn list(&self, dir: &Path) -> Result<Vec<String>, StorageError>;

    async fn stat(&self, path: &Path) -> Result<FileMeta, StorageError>;

    async fn exists(&self, path: &Path) -> bool;

    async fn remove(&self, path: &Path) -> Result<(), StorageError>;

    /// Gzip `src` into `dst`, leaving `src` in place
    async fn compress(&self, src: &Path, dst: &Path) -> Result<(), StorageError>;
}

/// [`LogSink`] over a tokio file opened for append
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: Option<File>,
}

#[async_trait]
impl LogSink for FileSink {
    fn path(&self) -> &Path {
        &self.path
    }

    async fn append(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        let file = self.file.as_mut().ok_or(StorageError::NoStream)?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StorageError> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        Ok(())
    }
}

/// [`LogFs`] backed by `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFs;

#[async_trait]
impl LogFs for TokioFs {
    async fn dir_exists(&self, dir: &Path) -> bool {
        tokio::fs::metadata(dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false)
    }

    async fn create_dir(&self, dir: &Path) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(dir).await?;
        Ok(())
    }

    async fn open_append(&self, path: &Path) -> Result<Box<dyn LogSink>, StorageError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        Ok(Box::new(FileSink {
            path: path.to_path_buf(),
            file: Some(file),
        }))
    }

    async fn list(&self, dir: &Path) -> Result<Vec<String>, StorageError> {
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    async fn stat(&self, path: &Path) -> Result<FileMeta, StorageError> {
        let metadata = tokio::fs::metadata(path).await?;
        Ok(FileMeta {
            path: path.to_path_buf(),
            len: metadata.len(),
            modified: metadata.modified()?,
        })
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    async fn remove(&self, path: &Path) -> Result<(), StorageError> {
        tokio::fs::remove_file(path).await?;
        Ok(())
    }

    async fn compress(&self, src: &Path, dst: &Path) -> Result<(), StorageError> {
        gzip_file(src, dst).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_append_list_stat_remove() {
        let dir = TempDir::new().unwrap();
        let fs = TokioFs;
        let path = dir.path().join("a.log");

        let mut sink = fs.open_append(&path).await.unwrap();
        sink.append(b"hello ").await.unwrap();
        sink.append(b"world").await.unwrap();
        sink.close().await.unwrap();
        assert!(sink.append(b"!").await.is_err());

        // Reopening appends rather than truncating
        let mut sink = fs.open_append(&path).await.unwrap();
        sink.append(b"!").await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello world!");
        assert_eq!(fs.list(dir.path()).await.unwrap(), vec!["a.log".to_string()]);
        assert_eq!(fs.stat(&path).await.unwrap().len, 12);

        fs.remove(&path).await.unwrap();
        assert!(!fs.exists(&path).await);
    }

    #[tokio::test]
    async fn test_create_dir() {
        let dir = TempDir::new().unwrap();
        let fs = TokioFs;
        let nested = dir.path().join("x").join("y");

        assert!(!fs.dir_exists(&nested).await);
        fs.create_dir(&nested).await.unwrap();
        assert!(fs.dir_exists(&nested).await);
    }
}
