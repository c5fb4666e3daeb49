//! Station context: the recorder, its schedule and the catalog policy
//!
//! Every trigger source (schedule, datagram, request) goes through this
//! object, which is owned by the control loop.

use log::info;

use crate::domain::catalog::{ErasePolicy, EraseReport};
use crate::domain::recording::{RecordingSummary, SessionState};
use crate::domain::schedule::{Schedule, ScheduleState};

use super::catalog::FileCatalog;
use super::ports::{AudioSource, Clock, Indicator, Storage, StorageError};
use super::recorder::{DrainOutcome, RecordingController};
use super::scheduler::{ScheduleEvaluator, ScheduleTransition};

/// Policies that span components
#[derive(Debug, Clone, Default)]
pub struct StationSettings {
    pub erase_policy: ErasePolicy,
    /// A manual stop (datagram or request) also disarms the schedule
    pub stop_disarms_schedule: bool,
}

pub struct Station<S, A, I, C>
where
    S: Storage,
    A: AudioSource,
    I: Indicator,
    C: Clock,
{
    recorder: RecordingController<S, A, I, C>,
    evaluator: ScheduleEvaluator,
    settings: StationSettings,
}

impl<S, A, I, C> Station<S, A, I, C>
where
    S: Storage,
    A: AudioSource,
    I: Indicator,
    C: Clock,
{
    pub fn new(
        recorder: RecordingController<S, A, I, C>,
        schedule: Schedule,
        settings: StationSettings,
    ) -> Self {
        Self {
            recorder,
            evaluator: ScheduleEvaluator::new(schedule),
            settings,
        }
    }

    pub fn recorder(&self) -> &RecordingController<S, A, I, C> {
        &self.recorder
    }

    pub fn storage(&self) -> &S {
        self.recorder.storage()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_active()
    }

    pub fn session_state(&self) -> SessionState {
        self.recorder.state()
    }

    pub fn schedule(&self) -> &Schedule {
        self.evaluator.schedule()
    }

    pub fn schedule_state(&self) -> ScheduleState {
        self.evaluator.state(self.recorder.is_active())
    }

    pub fn arm(&mut self, schedule: Schedule) {
        info!(
            "Schedule armed: {} -> {}",
            schedule.start_epoch(),
            schedule.stop_epoch()
        );
        self.evaluator.arm(schedule);
    }

    /// Evaluate the schedule against the recorder's clock
    pub async fn tick(&mut self) -> ScheduleTransition {
        let now = self.recorder.now_epoch();
        self.tick_at(now).await
    }

    pub async fn tick_at(&mut self, now_epoch: u64) -> ScheduleTransition {
        self.evaluator.tick(now_epoch, &mut self.recorder).await
    }

    pub async fn start(&mut self) -> bool {
        self.recorder.start().await
    }

    pub async fn stop(&mut self) -> Option<RecordingSummary> {
        let summary = self.recorder.stop().await;
        if self.settings.stop_disarms_schedule && self.evaluator.schedule().is_enabled() {
            info!("Manual stop disarmed the schedule");
            self.evaluator.disarm();
        }
        summary
    }

    pub async fn drain(&mut self) -> DrainOutcome {
        self.recorder.drain().await
    }

    /// Lazily enumerate the top-level catalog
    pub async fn list(&self) -> Result<S::Cursor, StorageError> {
        FileCatalog::new(self.recorder.storage()).list().await
    }

    /// Bulk erase with the configured policy, sparing the live recording
    pub async fn erase_all(&self) -> EraseReport {
        FileCatalog::new(self.recorder.storage())
            .erase_all(&self.settings.erase_policy, self.recorder.current_file())
            .await
    }

    /// Close any open recording before the process exits
    pub async fn shutdown(&mut self) -> Option<RecordingSummary> {
        self.recorder.stop().await
    }
}
