//! Station runner: wires the adapters and drives the control loop

use std::net::Ipv4Addr;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::{debug, info, warn};

use crate::application::ports::{AudioSource, Clock, Indicator, Storage};
use crate::application::{
    CommandDispatcher, RecorderSettings, RecordingController, Station, StationSettings,
};
use crate::domain::command::MAX_DATAGRAM_LEN;
use crate::domain::config::AppConfig;
use crate::domain::schedule::Schedule;
use crate::infrastructure::{
    CaptureSettings, CpalAudioSource, LocalStorage, StationIndicator, SystemClock,
};

use super::app::{EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR};
use super::channels::{ChannelSettings, CommandChannels};
use super::presenter::{format_bytes, Presenter};
use super::signals::ShutdownSignal;

/// Run the station until SIGINT/SIGTERM
pub async fn run_station(config: AppConfig) -> ExitCode {
    let presenter = Presenter::new();

    let multicast_group = match config.multicast_group.as_deref().map(str::parse::<Ipv4Addr>) {
        None => None,
        Some(Ok(group)) if group.is_multicast() => Some(group),
        Some(_) => {
            presenter.error("multicast_group must be an IPv4 multicast address");
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let clock = SystemClock::new(config.utc_offset_or_default());

    let schedule = match (config.schedule.as_ref(), config.schedule_window()) {
        (_, Some((start, stop))) => Schedule::for_day(start, stop, clock.now_epoch()),
        (Some(s), None) if s.start.is_some() || s.stop.is_some() => {
            presenter.error("Schedule needs valid start and stop times (hh:mm:ss)");
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
        _ => Schedule::disarmed(),
    };

    let storage = LocalStorage::new(config.storage_root_or_default());
    if let Err(e) = storage.probe().await {
        presenter.warn(&format!("{} (recording will fail until it is fixed)", e));
    }

    let source = match CpalAudioSource::open(CaptureSettings {
        sample_rate: config.sample_rate_or_default(),
        channels: config.channels_or_default(),
        ..Default::default()
    }) {
        Ok(source) => source,
        Err(e) => {
            presenter.error(&format!("Audio capture unavailable: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let channels = match CommandChannels::bind(ChannelSettings {
        bind_addr: Ipv4Addr::UNSPECIFIED,
        udp_port: config.udp_port_or_default(),
        http_port: config.http_port_or_default(),
        multicast_group,
    })
    .await
    {
        Ok(channels) => channels,
        Err(e) => {
            presenter.error(&format!("Failed to open network channels: {}", e));
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.setup().await {
        presenter.error(&format!("Failed to setup signal handler: {}", e));
        return ExitCode::from(EXIT_ERROR);
    }

    let indicator = StationIndicator::from_config(config.indicator_led.as_deref());
    let recorder = RecordingController::new(
        storage,
        source,
        indicator,
        clock,
        RecorderSettings {
            device_id: config.device_id_or_default(),
            extension: config.file_extension_or_default().to_string(),
            read_timeout: config.read_timeout_or_default(),
            buffer_samples: config.buffer_samples_or_default(),
        },
    );
    let settings = StationSettings {
        erase_policy: config.erase_policy(),
        stop_disarms_schedule: config.stop_disarms_schedule_or_default(),
    };
    let mut station = Station::new(recorder, schedule, settings);

    presenter.station_status(&format!(
        "{} ready, storing to {}",
        config.device_id_or_default(),
        station.storage().root().display()
    ));
    if schedule.is_enabled() {
        presenter.info(&format!(
            "Scheduled window: epoch {} to {}",
            schedule.start_epoch(),
            schedule.stop_epoch()
        ));
    }

    let flag = shutdown.flag();
    serve(
        &mut station,
        &channels,
        &CommandDispatcher::default(),
        &flag,
        config.idle_interval_or_default(),
    )
    .await;

    presenter.success("Station stopped");
    ExitCode::from(EXIT_SUCCESS)
}

/// The control loop.
///
/// Each pass evaluates the schedule, handles at most one datagram and one
/// request, then drains audio while recording or idles otherwise. Returns
/// after closing any open recording once `shutdown` is raised.
pub async fn serve<S, A, I, C>(
    station: &mut Station<S, A, I, C>,
    channels: &CommandChannels,
    dispatcher: &CommandDispatcher,
    shutdown: &AtomicBool,
    idle_interval: Duration,
) where
    S: Storage,
    A: AudioSource,
    I: Indicator,
    C: Clock,
{
    let mut datagram = [0u8; MAX_DATAGRAM_LEN];

    while !shutdown.load(Ordering::SeqCst) {
        station.tick().await;

        if let Some((len, peer)) = channels.try_datagram(&mut datagram) {
            debug!("Datagram from {}", peer);
            dispatcher.handle_datagram(station, &datagram[..len]).await;
        }

        if let Some((stream, peer)) = channels.try_accept().await {
            debug!("Connection from {}", peer);
            if let Err(e) = dispatcher.handle_connection(station, stream).await {
                warn!("Request from {} failed: {}", peer, e);
            }
        }

        if station.is_recording() {
            station.drain().await;
            // Let the reactor run even when samples are always ready
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(idle_interval).await;
        }
    }

    if let Some(summary) = station.shutdown().await {
        info!(
            "Closed {} on shutdown ({})",
            summary.file_name,
            format_bytes(summary.bytes_written)
        );
    }
}
