//! Recording controller: the single session and the drain step

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, info, warn};

use crate::domain::recording::{
    DeviceId, RecordingFileName, RecordingSession, RecordingSummary, SampleBuffer, SessionState,
};

use super::ports::{AcquisitionError, AudioSource, Clock, Indicator, Storage, StorageWriter};

/// Per-deployment recorder settings
#[derive(Debug, Clone)]
pub struct RecorderSettings {
    pub device_id: DeviceId,
    /// Recording file extension, without the dot
    pub extension: String,
    /// Upper bound for one acquisition read
    pub read_timeout: Duration,
    /// Sample buffer capacity
    pub buffer_samples: usize,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            device_id: DeviceId::default(),
            extension: "bin".to_string(),
            read_timeout: Duration::from_millis(20),
            buffer_samples: SampleBuffer::DEFAULT_CAPACITY,
        }
    }
}

/// Result of one drain step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Not recording; nothing was read or written
    Idle,
    /// Bytes appended to the recording
    Written(usize),
    /// The read timed out or returned no samples
    NoData,
    /// The acquisition pipeline reported an error
    ReadFailed,
    /// Samples were read but could not be stored
    WriteFailed,
}

/// Start/stop surface shared by every trigger source
#[async_trait]
pub trait RecorderControl: Send {
    fn is_recording(&self) -> bool;

    /// Open a new recording. Returns false if already recording or the
    /// file could not be opened.
    async fn start_recording(&mut self) -> bool;

    /// Close the current recording. Returns false if nothing was recording.
    async fn stop_recording(&mut self) -> bool;
}

/// Owns the one recording session and moves samples into it.
pub struct RecordingController<S, A, I, C>
where
    S: Storage,
    A: AudioSource,
    I: Indicator,
    C: Clock,
{
    storage: S,
    source: A,
    indicator: I,
    clock: C,
    settings: RecorderSettings,
    session: RecordingSession<S::Writer>,
    buffer: SampleBuffer,
}

impl<S, A, I, C> RecordingController<S, A, I, C>
where
    S: Storage,
    A: AudioSource,
    I: Indicator,
    C: Clock,
{
    /// Create a new idle controller
    pub fn new(storage: S, source: A, indicator: I, clock: C, settings: RecorderSettings) -> Self {
        let buffer = SampleBuffer::new(settings.buffer_samples);
        Self {
            storage,
            source,
            indicator,
            clock,
            settings,
            session: RecordingSession::new(),
            buffer,
        }
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    /// Path of the file being recorded
    pub fn current_file(&self) -> Option<&str> {
        self.session.file_name()
    }

    pub fn bytes_written(&self) -> u64 {
        self.session.bytes_written()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn now_epoch(&self) -> u64 {
        self.clock.now_epoch()
    }

    /// Open `/<deviceId>_<epoch>.<ext>` and start recording into it.
    ///
    /// Never fails loudly: open errors are logged and reported as `false`
    /// with the session left idle.
    pub async fn start(&mut self) -> bool {
        if let Some(file) = self.session.file_name() {
            warn!("Recording already in progress: {}", file);
            return false;
        }

        let now = self.clock.now_epoch();
        let path = RecordingFileName::new(self.settings.device_id.clone(), now, &self.settings.extension)
            .path();

        let writer = match self.storage.create(&path).await {
            Ok(writer) => writer,
            Err(e) => {
                error!("Failed to open file for recording: {}", e);
                return false;
            }
        };

        if let Err(e) = self.session.begin(writer, path.clone(), now) {
            error!("{}", e);
            return false;
        }

        // Audio captured while idle must not lead the new file
        self.source.discard_pending().await;
        switch_indicator(&self.indicator, true).await;
        info!("Recording started: {}", path);
        true
    }

    /// Close the current recording. Safe to call when idle.
    pub async fn stop(&mut self) -> Option<RecordingSummary> {
        let (mut writer, summary) = self.session.finish()?;

        if let Err(e) = writer.close().await {
            error!("Failed to close {}: {}", summary.file_name, e);
        }
        switch_indicator(&self.indicator, false).await;

        info!(
            "Recording stopped and file saved: {} ({} bytes)",
            summary.file_name, summary.bytes_written
        );
        Some(summary)
    }

    /// One bounded read-and-append cycle.
    ///
    /// Idle: returns immediately without touching the source or storage.
    pub async fn drain(&mut self) -> DrainOutcome {
        if !self.session.is_active() {
            return DrainOutcome::Idle;
        }

        self.buffer.clear();
        let count = match self
            .source
            .read(self.buffer.spare_mut(), self.settings.read_timeout)
            .await
        {
            Ok(count) => count,
            Err(AcquisitionError::Timeout(waited)) => {
                debug!("No samples within {:?}", waited);
                return DrainOutcome::NoData;
            }
            Err(e) => {
                warn!("Audio read error: {}", e);
                return DrainOutcome::ReadFailed;
            }
        };

        if count == 0 {
            return DrainOutcome::NoData;
        }
        self.buffer.set_filled(count);

        let Some(writer) = self.session.writer_mut() else {
            return DrainOutcome::Idle;
        };
        let bytes = self.buffer.as_le_bytes();
        let written = bytes.len();
        match writer.write_all(bytes).await {
            Ok(()) => {
                self.session.record_written(written);
                DrainOutcome::Written(written)
            }
            Err(e) => {
                error!("Failed to append samples: {}", e);
                DrainOutcome::WriteFailed
            }
        }
    }

}

/// Switch the indicator, logging failures. Takes only the indicator: the
/// controller itself is not `Sync`.
async fn switch_indicator<I: Indicator>(indicator: &I, on: bool) {
    if let Err(e) = indicator.set(on).await {
        warn!("{}", e);
    }
}

#[async_trait]
impl<S, A, I, C> RecorderControl for RecordingController<S, A, I, C>
where
    S: Storage,
    A: AudioSource,
    I: Indicator,
    C: Clock,
{
    fn is_recording(&self) -> bool {
        self.is_active()
    }

    async fn start_recording(&mut self) -> bool {
        self.start().await
    }

    async fn stop_recording(&mut self) -> bool {
        self.stop().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{
        FixedClock, MemoryStorage, MockIndicator, ScriptedSource,
    };

    type TestController = RecordingController<MemoryStorage, ScriptedSource, MockIndicator, FixedClock>;

    fn controller(
        storage: &MemoryStorage,
        source: &ScriptedSource,
        indicator: &MockIndicator,
    ) -> TestController {
        RecordingController::new(
            storage.clone(),
            source.clone(),
            indicator.clone(),
            FixedClock::new(1_700_000_000),
            RecorderSettings {
                device_id: "unit".parse().unwrap(),
                extension: "bin".to_string(),
                read_timeout: Duration::from_millis(5),
                buffer_samples: 4,
            },
        )
    }

    #[tokio::test]
    async fn start_opens_named_file() {
        let storage = MemoryStorage::new();
        let source = ScriptedSource::new();
        let indicator = MockIndicator::new();
        let mut recorder = controller(&storage, &source, &indicator);

        assert!(recorder.start().await);
        assert!(recorder.is_active());
        assert_eq!(recorder.current_file(), Some("/unit_1700000000.bin"));
        assert!(storage.contains("/unit_1700000000.bin"));
        assert!(indicator.is_on());
        assert_eq!(storage.open_writers(), 1);
    }

    #[tokio::test]
    async fn start_while_active_opens_no_second_handle() {
        let storage = MemoryStorage::new();
        let source = ScriptedSource::new();
        let indicator = MockIndicator::new();
        let mut recorder = controller(&storage, &source, &indicator);

        assert!(recorder.start().await);
        assert!(!recorder.start().await);
        assert_eq!(storage.open_writers(), 1);
        assert_eq!(storage.creates(), 1);
    }

    #[tokio::test]
    async fn start_failure_leaves_idle() {
        let storage = MemoryStorage::new();
        storage.fail_creates(true);
        let source = ScriptedSource::new();
        let indicator = MockIndicator::new();
        let mut recorder = controller(&storage, &source, &indicator);

        assert!(!recorder.start().await);
        assert!(!recorder.is_active());
        assert!(!indicator.is_on());
        assert_eq!(storage.open_writers(), 0);
    }

    #[tokio::test]
    async fn stop_closes_handle() {
        let storage = MemoryStorage::new();
        let source = ScriptedSource::new();
        let indicator = MockIndicator::new();
        let mut recorder = controller(&storage, &source, &indicator);

        recorder.start().await;
        let summary = recorder.stop().await.unwrap();
        assert_eq!(summary.file_name, "/unit_1700000000.bin");
        assert!(!recorder.is_active());
        assert!(!indicator.is_on());
        assert_eq!(storage.open_writers(), 0);
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let storage = MemoryStorage::new();
        let source = ScriptedSource::new();
        let indicator = MockIndicator::new();
        let mut recorder = controller(&storage, &source, &indicator);

        assert!(recorder.stop().await.is_none());
        recorder.start().await;
        assert!(recorder.stop().await.is_some());
        assert!(recorder.stop().await.is_none());
        assert_eq!(indicator.switches(), 2);
    }

    #[tokio::test]
    async fn active_flag_tracks_open_handle_for_any_sequence() {
        let storage = MemoryStorage::new();
        let source = ScriptedSource::new();
        let indicator = MockIndicator::new();
        let mut recorder = controller(&storage, &source, &indicator);

        let ops = [true, true, false, false, true, false, true, true, false];
        for (i, start) in ops.iter().enumerate() {
            // Distinct names so every start could open a fresh file
            recorder.clock.set(1_700_000_000 + i as u64);
            if *start {
                recorder.start().await;
            } else {
                recorder.stop().await;
            }
            let open = storage.open_writers();
            assert!(open <= 1);
            assert_eq!(recorder.is_active(), open == 1);
        }
    }

    #[tokio::test]
    async fn drain_while_idle_never_reads_or_writes() {
        let storage = MemoryStorage::new();
        let source = ScriptedSource::new();
        source.push_samples(&[1, 2, 3]);
        let indicator = MockIndicator::new();
        let mut recorder = controller(&storage, &source, &indicator);

        for _ in 0..3 {
            assert_eq!(recorder.drain().await, DrainOutcome::Idle);
        }
        assert_eq!(source.reads(), 0);
        assert_eq!(storage.writes(), 0);
    }

    #[tokio::test]
    async fn drain_appends_little_endian_samples() {
        let storage = MemoryStorage::new();
        let source = ScriptedSource::new();
        let indicator = MockIndicator::new();
        let mut recorder = controller(&storage, &source, &indicator);

        recorder.start().await;
        source.push_samples(&[1, -1]);
        source.push_samples(&[0x0203]);
        assert_eq!(recorder.drain().await, DrainOutcome::Written(4));
        assert_eq!(recorder.drain().await, DrainOutcome::Written(2));
        assert_eq!(recorder.bytes_written(), 6);
        recorder.stop().await;

        assert_eq!(
            storage.read("/unit_1700000000.bin").unwrap(),
            vec![0x01, 0x00, 0xFF, 0xFF, 0x03, 0x02]
        );
    }

    #[tokio::test]
    async fn drain_timeout_is_skipped() {
        let storage = MemoryStorage::new();
        let source = ScriptedSource::new();
        let indicator = MockIndicator::new();
        let mut recorder = controller(&storage, &source, &indicator);

        recorder.start().await;
        assert_eq!(recorder.drain().await, DrainOutcome::NoData);
        assert!(recorder.is_active());
        assert_eq!(storage.writes(), 0);
    }

    #[tokio::test]
    async fn drain_read_error_is_not_fatal() {
        let storage = MemoryStorage::new();
        let source = ScriptedSource::new();
        let indicator = MockIndicator::new();
        let mut recorder = controller(&storage, &source, &indicator);

        recorder.start().await;
        source.push_error(AcquisitionError::StreamClosed);
        source.push_samples(&[5]);
        assert_eq!(recorder.drain().await, DrainOutcome::ReadFailed);
        assert_eq!(recorder.drain().await, DrainOutcome::Written(2));
    }

    #[tokio::test]
    async fn drain_write_error_keeps_session() {
        let storage = MemoryStorage::new();
        let source = ScriptedSource::new();
        let indicator = MockIndicator::new();
        let mut recorder = controller(&storage, &source, &indicator);

        recorder.start().await;
        source.push_samples(&[5]);
        storage.fail_writes(true);
        assert_eq!(recorder.drain().await, DrainOutcome::WriteFailed);
        assert!(recorder.is_active());

        // Recoverable by an explicit stop
        assert!(recorder.stop().await.is_some());
        assert_eq!(storage.open_writers(), 0);
    }

    #[tokio::test]
    async fn read_is_bounded_by_buffer_capacity() {
        let storage = MemoryStorage::new();
        let source = ScriptedSource::new();
        let indicator = MockIndicator::new();
        let mut recorder = controller(&storage, &source, &indicator);

        recorder.start().await;
        source.push_samples(&[1, 2, 3, 4, 5, 6]);
        assert_eq!(recorder.drain().await, DrainOutcome::Written(8));
        assert_eq!(recorder.drain().await, DrainOutcome::Written(4));
    }

    #[tokio::test]
    async fn indicator_failure_does_not_block_start() {
        let storage = MemoryStorage::new();
        let source = ScriptedSource::new();
        let indicator = MockIndicator::failing();
        let mut recorder = controller(&storage, &source, &indicator);

        assert!(recorder.start().await);
        assert!(recorder.is_active());
    }

    #[tokio::test]
    async fn samples_captured_before_start_are_dropped() {
        let storage = MemoryStorage::new();
        let source = ScriptedSource::new();
        source.push_samples(&[9, 9, 9]);
        let indicator = MockIndicator::new();
        let mut recorder = controller(&storage, &source, &indicator);

        recorder.start().await;
        assert_eq!(source.discards(), 1);
        source.push_samples(&[1]);
        assert_eq!(recorder.drain().await, DrainOutcome::Written(2));
        assert_eq!(recorder.drain().await, DrainOutcome::NoData);
        recorder.stop().await;

        assert_eq!(storage.read("/unit_1700000000.bin").unwrap(), vec![0x01, 0x00]);
    }

    #[tokio::test]
    async fn failed_start_keeps_pending_samples() {
        let storage = MemoryStorage::new();
        storage.fail_creates(true);
        let source = ScriptedSource::new();
        let indicator = MockIndicator::new();
        let mut recorder = controller(&storage, &source, &indicator);

        assert!(!recorder.start().await);
        assert_eq!(source.discards(), 0);
    }

    #[test]
    fn controller_futures_are_send() {
        fn assert_send<T: Send>(_: &T) {}

        let storage = MemoryStorage::new();
        let source = ScriptedSource::new();
        let indicator = MockIndicator::new();
        let mut recorder = controller(&storage, &source, &indicator);

        assert_send(&recorder.start());
        assert_send(&recorder.stop());
        assert_send(&recorder.drain());
    }
}
