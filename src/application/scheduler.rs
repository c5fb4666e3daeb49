//! Schedule evaluator: drives the recorder from a one-shot window

use log::info;

use crate::domain::schedule::{Schedule, ScheduleState};

use super::recorder::RecorderControl;

/// What a tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleTransition {
    /// Nothing to do (disarmed, waiting, or already recording)
    None,
    /// The window opened and recording started
    Started,
    /// The window opened but the recorder could not start
    StartFailed,
    /// The window closed; recording stopped and the schedule disarmed
    Stopped,
    /// The window closed with nothing recording; the schedule disarmed
    Disarmed,
}

/// Evaluates one schedule against the clock.
#[derive(Debug, Default)]
pub struct ScheduleEvaluator {
    schedule: Schedule,
}

impl ScheduleEvaluator {
    pub fn new(schedule: Schedule) -> Self {
        Self { schedule }
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Replace the schedule (re-arm)
    pub fn arm(&mut self, schedule: Schedule) {
        self.schedule = schedule;
    }

    pub fn disarm(&mut self) {
        self.schedule.disarm();
    }

    pub fn state(&self, recording: bool) -> ScheduleState {
        self.schedule.state(recording)
    }

    /// One evaluation pass.
    ///
    /// The stop check runs after the start check, so a window that has
    /// already elapsed on first observation never starts and just disarms.
    pub async fn tick<R: RecorderControl>(&mut self, now_epoch: u64, recorder: &mut R) -> ScheduleTransition {
        if !self.schedule.is_enabled() {
            return ScheduleTransition::None;
        }

        let mut transition = ScheduleTransition::None;

        if self.schedule.contains(now_epoch) && !recorder.is_recording() {
            transition = if recorder.start_recording().await {
                info!("Scheduled recording started at {}", now_epoch);
                ScheduleTransition::Started
            } else {
                ScheduleTransition::StartFailed
            };
        }

        if self.schedule.has_elapsed(now_epoch) {
            transition = if recorder.is_recording() && recorder.stop_recording().await {
                info!("Scheduled recording stopped at {}", now_epoch);
                ScheduleTransition::Stopped
            } else {
                info!("Schedule window ended at {}, disarming", self.schedule.stop_epoch());
                ScheduleTransition::Disarmed
            };
            self.schedule.disarm();
        }

        transition
    }
}
