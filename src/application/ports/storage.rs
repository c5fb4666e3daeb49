//! Storage port interfaces

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::catalog::CatalogEntry;

/// Storage errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("Storage medium unavailable: {0}")]
    Unavailable(String),

    #[error("No such file or directory: {0}")]
    NotFound(String),

    #[error("Failed to open {path}: {message}")]
    OpenFailed { path: String, message: String },

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Failed to delete {path}: {message}")]
    DeleteFailed { path: String, message: String },
}

/// An open write handle. Bytes are appended in call order.
#[async_trait]
pub trait StorageWriter: Send {
    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), StorageError>;

    /// Flush and release the handle
    async fn close(&mut self) -> Result<(), StorageError>;
}

/// An open read handle
#[async_trait]
pub trait StorageReader: Send {
    /// Read into `buf`; `Ok(0)` means end of file
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError>;
}

/// Lazy directory enumeration, one entry at a time
#[async_trait]
pub trait CatalogCursor: Send {
    async fn next_entry(&mut self) -> Result<Option<CatalogEntry>, StorageError>;
}

/// Port for the hierarchical file store.
///
/// Paths are absolute within the store (`/name`, `/dir/name`).
#[async_trait]
pub trait Storage: Send + Sync {
    type Writer: StorageWriter;
    type Reader: StorageReader;
    type Cursor: CatalogCursor;

    /// Create (or truncate) a file for writing
    async fn create(&self, path: &str) -> Result<Self::Writer, StorageError>;

    async fn open_read(&self, path: &str) -> Result<Self::Reader, StorageError>;

    /// Enumerate the direct children of a directory
    async fn open_dir(&self, path: &str) -> Result<Self::Cursor, StorageError>;

    async fn remove(&self, path: &str) -> Result<(), StorageError>;

    async fn exists(&self, path: &str) -> bool;

    /// True if `path` exists and is a regular file
    async fn is_file(&self, path: &str) -> bool;
}
