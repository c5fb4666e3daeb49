//! Storage catalog entries and erase policy

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Entry name without any directory prefix
    pub name: String,
    pub is_directory: bool,
}

impl CatalogEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
        }
    }
}

/// Which entries a bulk erase removes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErasePolicy {
    /// Only files whose name ends with this suffix. `None` selects every file.
    pub suffix: Option<String>,
    /// Descend into subdirectories (directories themselves are kept)
    pub recursive: bool,
}

impl ErasePolicy {
    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: Some(suffix.into()),
            recursive: false,
        }
    }

    /// True if a file entry is selected for deletion. Directories never are.
    pub fn selects(&self, entry: &CatalogEntry) -> bool {
        if entry.is_directory {
            return false;
        }
        match &self.suffix {
            Some(suffix) => entry.name.ends_with(suffix.as_str()),
            None => true,
        }
    }
}

/// Outcome of a bulk erase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EraseReport {
    pub deleted: Vec<String>,
    pub failed: Vec<String>,
    pub skipped: Vec<String>,
}

impl EraseReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}
