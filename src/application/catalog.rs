//! File catalog and bulk eraser

use log::{error, info, warn};

use crate::domain::catalog::{ErasePolicy, EraseReport};

use super::ports::{CatalogCursor, Storage, StorageError};

/// Root of the storage namespace
pub const ROOT: &str = "/";

fn join(dir: &str, name: &str) -> String {
    if dir.ends_with('/') {
        format!("{}{}", dir, name)
    } else {
        format!("{}/{}", dir, name)
    }
}

/// Read-only view plus bulk erase over a storage namespace
pub struct FileCatalog<'a, S: Storage> {
    storage: &'a S,
}

impl<'a, S: Storage> FileCatalog<'a, S> {
    pub fn new(storage: &'a S) -> Self {
        Self { storage }
    }

    /// Lazily enumerate the top-level entries
    pub async fn list(&self) -> Result<S::Cursor, StorageError> {
        self.storage.open_dir(ROOT).await
    }

    /// Delete every file selected by `policy`.
    ///
    /// `keep` names a path that must survive (the file being recorded).
    /// Failures are logged and recorded in the report; the remaining entries
    /// are still processed.
    pub async fn erase_all(&self, policy: &ErasePolicy, keep: Option<&str>) -> EraseReport {
        let mut report = EraseReport::default();
        let mut pending = vec![ROOT.to_string()];

        while let Some(dir) = pending.pop() {
            let mut cursor = match self.storage.open_dir(&dir).await {
                Ok(cursor) => cursor,
                Err(e) => {
                    error!("Failed to open directory {}: {}", dir, e);
                    report.failed.push(dir);
                    continue;
                }
            };

            loop {
                let entry = match cursor.next_entry().await {
                    Ok(Some(entry)) => entry,
                    Ok(None) => break,
                    Err(e) => {
                        error!("Failed to enumerate {}: {}", dir, e);
                        break;
                    }
                };
                let path = join(&dir, &entry.name);

                if entry.is_directory {
                    if policy.recursive {
                        pending.push(path);
                    }
                    continue;
                }
                if !policy.selects(&entry) {
                    continue;
                }
                if keep == Some(path.as_str()) {
                    warn!("Not deleting {}: recording in progress", path);
                    report.skipped.push(path);
                    continue;
                }

                match self.storage.remove(&path).await {
                    Ok(()) => {
                        info!("Deleted {}", path);
                        report.deleted.push(path);
                    }
                    Err(e) => {
                        error!("{}", e);
                        report.failed.push(path);
                    }
                }
            }
        }

        info!(
            "Erase finished: {} deleted, {} failed",
            report.deleted.len(),
            report.failed.len()
        );
        report
    }
}
