//! In-memory port implementations shared by the application tests

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::catalog::CatalogEntry;

use super::ports::{
    AcquisitionError, AudioSource, CatalogCursor, Clock, Indicator, IndicatorError, Storage,
    StorageError, StorageReader, StorageWriter,
};

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &path[..idx],
    }
}

fn name_of(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[derive(Default)]
struct MemoryFs {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    fail_create: bool,
    fail_write: bool,
    fail_remove: HashSet<String>,
    open_writers: usize,
    creates: usize,
    writes: usize,
}

/// Storage backed by a shared map; clones see the same files
#[derive(Clone, Default)]
pub struct MemoryStorage {
    fs: Arc<Mutex<MemoryFs>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn fs(&self) -> std::sync::MutexGuard<'_, MemoryFs> {
        self.fs.lock().unwrap()
    }

    pub fn add_file(&self, path: &str, contents: &[u8]) {
        self.fs().files.insert(path.to_string(), contents.to_vec());
    }

    pub fn add_dir(&self, path: &str) {
        self.fs().dirs.insert(path.to_string());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.fs().files.contains_key(path)
    }

    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        self.fs().files.get(path).cloned()
    }

    pub fn file_paths(&self) -> Vec<String> {
        self.fs().files.keys().cloned().collect()
    }

    pub fn fail_creates(&self, fail: bool) {
        self.fs().fail_create = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fs().fail_write = fail;
    }

    pub fn fail_remove_of(&self, path: &str) {
        self.fs().fail_remove.insert(path.to_string());
    }

    pub fn open_writers(&self) -> usize {
        self.fs().open_writers
    }

    pub fn creates(&self) -> usize {
        self.fs().creates
    }

    pub fn writes(&self) -> usize {
        self.fs().writes
    }
}

pub struct MemoryWriter {
    fs: Arc<Mutex<MemoryFs>>,
    path: String,
    open: bool,
}

#[async_trait]
impl StorageWriter for MemoryWriter {
    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), StorageError> {
        let mut fs = self.fs.lock().unwrap();
        if fs.fail_write {
            return Err(StorageError::WriteFailed("medium full".to_string()));
        }
        fs.writes += 1;
        fs.files
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(bytes);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), StorageError> {
        if self.open {
            self.open = false;
            self.fs.lock().unwrap().open_writers -= 1;
        }
        Ok(())
    }
}

pub struct MemoryReader {
    data: Vec<u8>,
    pos: usize,
}

#[async_trait]
impl StorageReader for MemoryReader {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, StorageError> {
        let n = buf.len().min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

pub struct MemoryCursor {
    entries: VecDeque<CatalogEntry>,
}

#[async_trait]
impl CatalogCursor for MemoryCursor {
    async fn next_entry(&mut self) -> Result<Option<CatalogEntry>, StorageError> {
        Ok(self.entries.pop_front())
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    type Writer = MemoryWriter;
    type Reader = MemoryReader;
    type Cursor = MemoryCursor;

    async fn create(&self, path: &str) -> Result<MemoryWriter, StorageError> {
        let mut fs = self.fs();
        if fs.fail_create {
            return Err(StorageError::OpenFailed {
                path: path.to_string(),
                message: "no medium".to_string(),
            });
        }
        fs.files.insert(path.to_string(), Vec::new());
        fs.open_writers += 1;
        fs.creates += 1;
        Ok(MemoryWriter {
            fs: Arc::clone(&self.fs),
            path: path.to_string(),
            open: true,
        })
    }

    async fn open_read(&self, path: &str) -> Result<MemoryReader, StorageError> {
        let data = self
            .read(path)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))?;
        Ok(MemoryReader { data, pos: 0 })
    }

    async fn open_dir(&self, path: &str) -> Result<MemoryCursor, StorageError> {
        let fs = self.fs();
        if path != "/" && !fs.dirs.contains(path) {
            return Err(StorageError::NotFound(path.to_string()));
        }
        let dirs = fs
            .dirs
            .iter()
            .filter(|d| parent_of(d) == path)
            .map(|d| CatalogEntry::directory(name_of(d)));
        let files = fs
            .files
            .keys()
            .filter(|f| parent_of(f) == path)
            .map(|f| CatalogEntry::file(name_of(f)));
        Ok(MemoryCursor {
            entries: dirs.chain(files).collect(),
        })
    }

    async fn remove(&self, path: &str) -> Result<(), StorageError> {
        let mut fs = self.fs();
        if fs.fail_remove.contains(path) {
            return Err(StorageError::DeleteFailed {
                path: path.to_string(),
                message: "write protected".to_string(),
            });
        }
        fs.files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| StorageError::NotFound(path.to_string()))
    }

    async fn exists(&self, path: &str) -> bool {
        let fs = self.fs();
        fs.files.contains_key(path) || fs.dirs.contains(path)
    }

    async fn is_file(&self, path: &str) -> bool {
        self.contains(path)
    }
}

#[derive(Default)]
struct Script {
    chunks: VecDeque<Result<Vec<i16>, AcquisitionError>>,
    reads: usize,
    discards: usize,
}

/// Audio source replaying queued chunks; an empty queue times out
#[derive(Clone, Default)]
pub struct ScriptedSource {
    script: Arc<Mutex<Script>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_samples(&self, samples: &[i16]) {
        self.script
            .lock()
            .unwrap()
            .chunks
            .push_back(Ok(samples.to_vec()));
    }

    pub fn push_error(&self, error: AcquisitionError) {
        self.script.lock().unwrap().chunks.push_back(Err(error));
    }

    pub fn reads(&self) -> usize {
        self.script.lock().unwrap().reads
    }

    pub fn discards(&self) -> usize {
        self.script.lock().unwrap().discards
    }
}

#[async_trait]
impl AudioSource for ScriptedSource {
    async fn read(&mut self, buf: &mut [i16], timeout: Duration) -> Result<usize, AcquisitionError> {
        let mut script = self.script.lock().unwrap();
        script.reads += 1;
        match script.chunks.pop_front() {
            None => Err(AcquisitionError::Timeout(timeout)),
            Some(Err(e)) => Err(e),
            Some(Ok(mut chunk)) => {
                let n = chunk.len().min(buf.len());
                buf[..n].copy_from_slice(&chunk[..n]);
                if n < chunk.len() {
                    script.chunks.push_front(Ok(chunk.split_off(n)));
                }
                Ok(n)
            }
        }
    }

    async fn discard_pending(&mut self) {
        let mut script = self.script.lock().unwrap();
        script.chunks.clear();
        script.discards += 1;
    }
}

/// Clock frozen at a settable instant
#[derive(Clone, Default)]
pub struct FixedClock {
    now: Arc<AtomicU64>,
}

impl FixedClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(now)),
        }
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_epoch(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Indicator recording its last state
#[derive(Clone, Default)]
pub struct MockIndicator {
    on: Arc<AtomicBool>,
    switches: Arc<AtomicUsize>,
    failing: bool,
}

impl MockIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    pub fn switches(&self) -> usize {
        self.switches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Indicator for MockIndicator {
    async fn set(&self, on: bool) -> Result<(), IndicatorError> {
        if self.failing {
            return Err(IndicatorError::SwitchFailed("no such LED".to_string()));
        }
        self.on.store(on, Ordering::SeqCst);
        self.switches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
