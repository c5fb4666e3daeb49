//! Continuous audio acquisition using cpal
//!
//! The cpal stream is not `Send`, so it lives on a dedicated thread for the
//! lifetime of the source. The device callback converts each block to signed
//! 16-bit samples and hands it over through a bounded channel; a full
//! channel drops the block and counts it.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc as std_mpsc, Arc};
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use log::{debug, error, info, warn};
use tokio::sync::mpsc;

use crate::application::ports::{AcquisitionError, AudioSource};

/// Blocks buffered between the device callback and the control loop
pub const DEFAULT_QUEUE_BLOCKS: usize = 64;

const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Requested capture format
#[derive(Debug, Clone, Copy)]
pub struct CaptureSettings {
    pub sample_rate: u32,
    /// 1 mixes every device channel down to mono
    pub channels: u16,
    pub queue_blocks: usize,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            sample_rate: 16_000,
            channels: 1,
            queue_blocks: DEFAULT_QUEUE_BLOCKS,
        }
    }
}

/// Audio source fed by the default input device
pub struct CpalAudioSource {
    rx: mpsc::Receiver<Vec<i16>>,
    pending: VecDeque<i16>,
    running: Arc<AtomicBool>,
    dropped_blocks: Arc<AtomicU64>,
    reported_drops: u64,
    sample_rate: u32,
}

impl CpalAudioSource {
    /// Open the default input device and start streaming
    pub fn open(settings: CaptureSettings) -> Result<Self, AcquisitionError> {
        let (tx, rx) = mpsc::channel(settings.queue_blocks.max(1));
        let (ready_tx, ready_rx) = std_mpsc::sync_channel(1);
        let running = Arc::new(AtomicBool::new(true));
        let dropped_blocks = Arc::new(AtomicU64::new(0));

        let thread_running = Arc::clone(&running);
        let thread_dropped = Arc::clone(&dropped_blocks);

        std::thread::Builder::new()
            .name("audio-capture".to_string())
            .spawn(move || {
                let stream = match build_stream(settings, tx, Arc::clone(&thread_dropped)) {
                    Ok((stream, rate)) => {
                        let _ = ready_tx.send(Ok(rate));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                while thread_running.load(Ordering::SeqCst) {
                    std::thread::sleep(Duration::from_millis(100));
                }

                drop(stream);
                debug!(
                    "Audio capture stopped ({} blocks dropped)",
                    thread_dropped.load(Ordering::SeqCst)
                );
            })
            .map_err(|e| AcquisitionError::StartFailed(e.to_string()))?;

        let sample_rate = ready_rx
            .recv_timeout(STARTUP_TIMEOUT)
            .map_err(|_| AcquisitionError::StartFailed("audio thread did not start".into()))??;

        info!("Audio capture running at {} Hz", sample_rate);
        Ok(Self {
            rx,
            pending: VecDeque::new(),
            running,
            dropped_blocks,
            reported_drops: 0,
            sample_rate,
        })
    }

    /// Source fed by `rx` instead of a device
    #[cfg(test)]
    fn detached(rx: mpsc::Receiver<Vec<i16>>, dropped_blocks: Arc<AtomicU64>) -> Self {
        Self {
            rx,
            pending: VecDeque::new(),
            running: Arc::new(AtomicBool::new(true)),
            dropped_blocks,
            reported_drops: 0,
            sample_rate: 16_000,
        }
    }

    /// Actual device sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Blocks discarded because the control loop fell behind
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped_blocks.load(Ordering::SeqCst)
    }
}

impl Drop for CpalAudioSource {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[async_trait]
impl AudioSource for CpalAudioSource {
    async fn read(&mut self, buf: &mut [i16], timeout: Duration) -> Result<usize, AcquisitionError> {
        if buf.is_empty() {
            return Ok(0);
        }

        let dropped = self.dropped_blocks();
        if dropped > self.reported_drops {
            warn!(
                "Acquisition overran: {} audio blocks dropped",
                dropped - self.reported_drops
            );
            self.reported_drops = dropped;
        }

        if self.pending.is_empty() {
            match tokio::time::timeout(timeout, self.rx.recv()).await {
                Ok(Some(block)) => self.pending.extend(block),
                Ok(None) => return Err(AcquisitionError::StreamClosed),
                Err(_) => return Err(AcquisitionError::Timeout(timeout)),
            }
        }

        // Top up from whatever else is already queued
        while self.pending.len() < buf.len() {
            match self.rx.try_recv() {
                Ok(block) => self.pending.extend(block),
                Err(_) => break,
            }
        }

        Ok(fill_from(&mut self.pending, buf))
    }

    async fn discard_pending(&mut self) {
        let mut blocks = 0usize;
        while self.rx.try_recv().is_ok() {
            blocks += 1;
        }
        self.pending.clear();
        // Blocks dropped while nobody was reading are not an overrun
        self.reported_drops = self.dropped_blocks();
        if blocks > 0 {
            debug!("Discarded {} stale audio blocks", blocks);
        }
    }
}

/// Move samples from the front of `pending` into `buf`
fn fill_from(pending: &mut VecDeque<i16>, buf: &mut [i16]) -> usize {
    let n = pending.len().min(buf.len());
    for (slot, sample) in buf.iter_mut().zip(pending.drain(..n)) {
        *slot = sample;
    }
    n
}

/// Mix interleaved frames down to mono when asked to. Any other target
/// equals the device channel count (see [`choose_config`]) and passes through.
fn downmix(samples: &[i16], device_channels: u16, target_channels: u16) -> Vec<i16> {
    if target_channels != 1 || device_channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(device_channels as usize)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| s as i32).sum();
            (sum / frame.len() as i32) as i16
        })
        .collect()
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

fn hand_over(tx: &mpsc::Sender<Vec<i16>>, dropped: &AtomicU64, block: Vec<i16>) {
    if tx.try_send(block).is_err() {
        dropped.fetch_add(1, Ordering::Relaxed);
    }
}

/// The parts of a supported config range that decide the pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ConfigShape {
    channels: u16,
    min_rate: u32,
    max_rate: u32,
}

impl ConfigShape {
    fn includes_rate(&self, rate: u32) -> bool {
        self.min_rate <= rate && self.max_rate >= rate
    }
}

/// Index of the best shape for `settings`.
///
/// Mono accepts any channel count (mixed down); any other count must match
/// exactly. Among usable shapes, one covering the target rate wins, then an
/// exact channel match, then fewer channels.
fn choose_config(shapes: &[ConfigShape], settings: CaptureSettings) -> Option<usize> {
    shapes
        .iter()
        .enumerate()
        .filter(|(_, shape)| settings.channels == 1 || shape.channels == settings.channels)
        .max_by_key(|(_, shape)| {
            (
                shape.includes_rate(settings.sample_rate),
                shape.channels == settings.channels,
                std::cmp::Reverse(shape.channels),
            )
        })
        .map(|(index, _)| index)
}

fn input_config(
    device: &cpal::Device,
    settings: CaptureSettings,
) -> Result<(StreamConfig, SampleFormat), AcquisitionError> {
    let ranges: Vec<cpal::SupportedStreamConfigRange> = device
        .supported_input_configs()
        .map_err(|e| AcquisitionError::StartFailed(format!("Failed to get configs: {}", e)))?
        .filter(|range| matches!(range.sample_format(), SampleFormat::I16 | SampleFormat::F32))
        .collect();

    let shapes: Vec<ConfigShape> = ranges
        .iter()
        .map(|range| ConfigShape {
            channels: range.channels(),
            min_rate: range.min_sample_rate().0,
            max_rate: range.max_sample_rate().0,
        })
        .collect();

    let index = choose_config(&shapes, settings).ok_or_else(|| {
        AcquisitionError::StartFailed(format!(
            "No {}-channel i16/f32 input config",
            settings.channels
        ))
    })?;
    let range = &ranges[index];

    let target = settings.sample_rate;
    let sample_rate = if shapes[index].includes_rate(target) {
        SampleRate(target)
    } else {
        warn!(
            "Device does not support {} Hz, using {} Hz",
            target,
            range.min_sample_rate().0
        );
        range.min_sample_rate()
    };

    Ok((
        StreamConfig {
            channels: range.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        },
        range.sample_format(),
    ))
}

fn build_stream(
    settings: CaptureSettings,
    tx: mpsc::Sender<Vec<i16>>,
    dropped: Arc<AtomicU64>,
) -> Result<(cpal::Stream, u32), AcquisitionError> {
    let device = cpal::default_host()
        .default_input_device()
        .ok_or(AcquisitionError::NoAudioDevice)?;
    let (config, sample_format) = input_config(&device, settings)?;
    let device_channels = config.channels;
    let target_channels = settings.channels;
    let on_error = |err: cpal::StreamError| error!("Audio stream error: {}", err);

    let stream = match sample_format {
        SampleFormat::I16 => device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                hand_over(&tx, &dropped, downmix(data, device_channels, target_channels));
            },
            on_error,
            None,
        ),
        SampleFormat::F32 => device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                let converted: Vec<i16> = data.iter().map(|&s| f32_to_i16(s)).collect();
                hand_over(&tx, &dropped, downmix(&converted, device_channels, target_channels));
            },
            on_error,
            None,
        ),
        other => {
            return Err(AcquisitionError::StartFailed(format!(
                "Unsupported sample format {:?}",
                other
            )))
        }
    }
    .map_err(|e| AcquisitionError::StartFailed(e.to_string()))?;

    stream
        .play()
        .map_err(|e| AcquisitionError::StartFailed(e.to_string()))?;

    Ok((stream, config.sample_rate.0))
}
