//! Storage namespace mapped onto a local directory

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use log::{debug, info};
use tokio::fs::{self, File, ReadDir};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};

use crate::application::ports::{
    CatalogCursor, Storage, StorageError, StorageReader, StorageWriter,
};
use crate::domain::catalog::CatalogEntry;

/// Maps `/name` to `<root>/name`
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root if needed and check that it is a directory
    pub async fn probe(&self) -> Result<(), StorageError> {
        let unavailable = |e: std::io::Error| {
            StorageError::Unavailable(format!("{}: {}", self.root.display(), e))
        };

        fs::create_dir_all(&self.root).await.map_err(unavailable)?;
        let metadata = fs::metadata(&self.root).await.map_err(unavailable)?;
        if !metadata.is_dir() {
            return Err(StorageError::Unavailable(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }

        info!("Storage ready at {}", self.root.display());
        Ok(())
    }

    /// Resolve a namespace path; `..` and prefixes never leave the root
    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let mut resolved = self.root.clone();
        for component in Path::new(path.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                _ => return Err(StorageError::NotFound(path.to_string())),
            }
        }
        Ok(resolved)
    }
}

pub struct LocalWriter {
    file: Option<BufWriter<File>>,
    path: String,
}

#[async_trait]
impl StorageWriter for LocalWriter {
    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| StorageError::WriteFailed(format!("{} is closed", self.path)))?;
        file.write_all(bytes)
            .await
            .map_err(|e| StorageError::WriteFailed(format!("{}: {}", self.path, e)))
    }

    async fn close(&mut self) -> Result<(), StorageError> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };
        file.flush()
            .await
            .map_err(|e| StorageError::WriteFailed(format!("{}: {}", self.path, e)))?;
        file.get_mut()
            .sync_all()
            .await
            .map_err(|e| StorageError::WriteFailed(format!("{}: {}", self.path, e)))
    }
}

pub struct LocalReader {
    file: File,
    path: String,
}

#[async_trait]
impl StorageReader for LocalReader {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        self.file
            .read(buf)
            .await
            .map_err(|e| StorageError::ReadFailed(format!("{}: {}", self.path, e)))
    }
}

pub struct LocalCursor {
    entries: ReadDir,
}

#[async_trait]
impl CatalogCursor for LocalCursor {
    async fn next_entry(&mut self) -> Result<Option<CatalogEntry>, StorageError> {
        let Some(entry) = self
            .entries
            .next_entry()
            .await
            .map_err(|e| StorageError::ReadFailed(e.to_string()))?
        else {
            return Ok(None);
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        let is_directory = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .map_err(|e| StorageError::ReadFailed(format!("{}: {}", name, e)))?;

        Ok(Some(CatalogEntry { name, is_directory }))
    }
}

#[async_trait]
impl Storage for LocalStorage {
    type Writer = LocalWriter;
    type Reader = LocalReader;
    type Cursor = LocalCursor;

    async fn create(&self, path: &str) -> Result<LocalWriter, StorageError> {
        let full = self.resolve(path)?;
        let file = File::create(&full).await.map_err(|e| StorageError::OpenFailed {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        debug!("Opened {} for writing", full.display());
        Ok(LocalWriter {
            file: Some(BufWriter::new(file)),
            path: path.to_string(),
        })
    }

    async fn open_read(&self, path: &str) -> Result<LocalReader, StorageError> {
        let full = self.resolve(path)?;
        let file = File::open(&full).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StorageError::NotFound(path.to_string()),
            _ => StorageError::OpenFailed {
                path: path.to_string(),
                message: e.to_string(),
            },
        })?;
        Ok(LocalReader {
            file,
            path: path.to_string(),
        })
    }

    async fn open_dir(&self, path: &str) -> Result<LocalCursor, StorageError> {
        let full = self.resolve(path)?;
        let entries = fs::read_dir(&full).await.map_err(|e| StorageError::OpenFailed {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(LocalCursor { entries })
    }

    async fn remove(&self, path: &str) -> Result<(), StorageError> {
        let full = self.resolve(path)?;
        fs::remove_file(&full)
            .await
            .map_err(|e| StorageError::DeleteFailed {
                path: path.to_string(),
                message: e.to_string(),
            })
    }

    async fn exists(&self, path: &str) -> bool {
        match self.resolve(path) {
            Ok(full) => fs::try_exists(&full).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn is_file(&self, path: &str) -> bool {
        match self.resolve(path) {
            Ok(full) => fs::metadata(&full)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false),
            Err(_) => false,
        }
    }
}
