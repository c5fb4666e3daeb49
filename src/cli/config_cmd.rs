//! Config command handler

use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::application::ports::ConfigStore;
use crate::domain::config::{AppConfig, AudioConfig, ScheduleConfig};
use crate::domain::error::ConfigError;
use crate::domain::recording::DeviceId;
use crate::domain::schedule::ClockTime;

use super::args::{is_valid_config_key, ConfigAction, VALID_CONFIG_KEYS};
use super::presenter::Presenter;

const NOT_SET: &str = "(not set)";

/// Handle config subcommand
pub async fn handle_config_command<S: ConfigStore>(
    action: ConfigAction,
    store: &S,
    presenter: &Presenter,
) -> Result<(), ConfigError> {
    match action {
        ConfigAction::Init => handle_init(store, presenter).await,
        ConfigAction::Set { key, value } => handle_set(store, presenter, &key, &value).await,
        ConfigAction::Get { key } => handle_get(store, presenter, &key).await,
        ConfigAction::List => handle_list(store, presenter).await,
        ConfigAction::Path => handle_path(store, presenter),
    }
}

async fn handle_init<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    store.init().await?;
    presenter.success(&format!(
        "Config file created at: {}",
        store.path().display()
    ));
    Ok(())
}

async fn handle_set<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
    value: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let mut config = store.load().await?;
    set_value(&mut config, key, value)?;

    store.save(&config).await?;
    presenter.success(&format!("{} = {}", key, value));

    Ok(())
}

async fn handle_get<S: ConfigStore>(
    store: &S,
    presenter: &Presenter,
    key: &str,
) -> Result<(), ConfigError> {
    check_key(key)?;

    let config = store.load().await?;
    match get_value(&config, key) {
        Some(v) => presenter.output(&v),
        None => presenter.output(NOT_SET),
    }

    Ok(())
}

async fn handle_list<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    let config = store.load().await?;

    for key in VALID_CONFIG_KEYS {
        let value = get_value(&config, key).unwrap_or_else(|| NOT_SET.to_string());
        presenter.key_value(key, &value);
    }

    Ok(())
}

fn handle_path<S: ConfigStore>(store: &S, presenter: &Presenter) -> Result<(), ConfigError> {
    presenter.output(&store.path().to_string_lossy());
    Ok(())
}

fn check_key(key: &str) -> Result<(), ConfigError> {
    if is_valid_config_key(key) {
        return Ok(());
    }
    Err(ConfigError::ValidationError {
        key: key.to_string(),
        message: format!("Unknown key. Valid keys: {}", VALID_CONFIG_KEYS.join(", ")),
    })
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        key: key.to_string(),
        message: message.into(),
    }
}

/// Parse a number, rejecting zero when `nonzero` is set
fn parse_number<T>(key: &str, value: &str, nonzero: bool) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq,
{
    let parsed: T = value
        .trim()
        .parse()
        .map_err(|_| invalid(key, format!("'{}' is not a valid number", value)))?;
    if nonzero && parsed == T::default() {
        return Err(invalid(key, "Value must be greater than zero"));
    }
    Ok(parsed)
}

/// Parse a boolean value
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(invalid(key, "Value must be 'true' or 'false'")),
    }
}

fn parse_clock_time(key: &str, value: &str) -> Result<String, ConfigError> {
    value
        .parse::<ClockTime>()
        .map(|t| t.to_string())
        .map_err(|e| invalid(key, e.to_string()))
}

fn audio_mut(config: &mut AppConfig) -> &mut AudioConfig {
    config.audio.get_or_insert_with(AudioConfig::default)
}

fn schedule_mut(config: &mut AppConfig) -> &mut ScheduleConfig {
    config.schedule.get_or_insert_with(ScheduleConfig::default)
}

/// Validate `value` and store it under `key`
fn set_value(config: &mut AppConfig, key: &str, value: &str) -> Result<(), ConfigError> {
    match key {
        "device_id" => {
            let id = value
                .parse::<DeviceId>()
                .map_err(|e| invalid(key, e.to_string()))?;
            config.device_id = Some(id.to_string());
        }
        "storage_root" => {
            if value.trim().is_empty() {
                return Err(invalid(key, "Path must not be empty"));
            }
            config.storage_root = Some(value.to_string());
        }
        "file_extension" => {
            if value.contains('/') {
                return Err(invalid(key, "Extension must not contain '/'"));
            }
            config.file_extension = Some(value.trim_start_matches('.').to_string());
        }
        "erase_suffix" => config.erase_suffix = Some(value.to_string()),
        "recursive_erase" => config.recursive_erase = Some(parse_bool(key, value)?),
        "udp_port" => config.udp_port = Some(parse_number(key, value, true)?),
        "http_port" => config.http_port = Some(parse_number(key, value, true)?),
        "multicast_group" => {
            let addr: Ipv4Addr = value
                .parse()
                .map_err(|_| invalid(key, format!("'{}' is not an IPv4 address", value)))?;
            if !addr.is_multicast() {
                return Err(invalid(key, format!("{} is not a multicast address", addr)));
            }
            config.multicast_group = Some(addr.to_string());
        }
        "utc_offset_secs" => {
            let offset: i64 = parse_number(key, value, false)?;
            if offset.abs() > 14 * 3600 {
                return Err(invalid(key, "Offset must be within +/-14 hours"));
            }
            config.utc_offset_secs = Some(offset);
        }
        "stop_disarms_schedule" => config.stop_disarms_schedule = Some(parse_bool(key, value)?),
        "indicator_led" => config.indicator_led = Some(value.to_string()),
        "schedule.start" => schedule_mut(config).start = Some(parse_clock_time(key, value)?),
        "schedule.stop" => schedule_mut(config).stop = Some(parse_clock_time(key, value)?),
        "audio.sample_rate" => audio_mut(config).sample_rate = Some(parse_number(key, value, true)?),
        "audio.channels" => audio_mut(config).channels = Some(parse_number(key, value, true)?),
        "audio.buffer_samples" => {
            audio_mut(config).buffer_samples = Some(parse_number(key, value, true)?)
        }
        "audio.read_timeout_ms" => {
            audio_mut(config).read_timeout_ms = Some(parse_number(key, value, true)?)
        }
        "audio.idle_interval_ms" => {
            audio_mut(config).idle_interval_ms = Some(parse_number(key, value, false)?)
        }
        _ => return Err(invalid(key, "Unknown key")),
    }
    Ok(())
}

fn get_value(config: &AppConfig, key: &str) -> Option<String> {
    let audio = config.audio.as_ref();
    let schedule = config.schedule.as_ref();
    match key {
        "device_id" => config.device_id.clone(),
        "storage_root" => config.storage_root.clone(),
        "file_extension" => config.file_extension.clone(),
        "erase_suffix" => config.erase_suffix.clone(),
        "recursive_erase" => config.recursive_erase.map(|b| b.to_string()),
        "udp_port" => config.udp_port.map(|p| p.to_string()),
        "http_port" => config.http_port.map(|p| p.to_string()),
        "multicast_group" => config.multicast_group.clone(),
        "utc_offset_secs" => config.utc_offset_secs.map(|o| o.to_string()),
        "stop_disarms_schedule" => config.stop_disarms_schedule.map(|b| b.to_string()),
        "indicator_led" => config.indicator_led.clone(),
        "schedule.start" => schedule.and_then(|s| s.start.clone()),
        "schedule.stop" => schedule.and_then(|s| s.stop.clone()),
        "audio.sample_rate" => audio.and_then(|a| a.sample_rate).map(|v| v.to_string()),
        "audio.channels" => audio.and_then(|a| a.channels).map(|v| v.to_string()),
        "audio.buffer_samples" => audio.and_then(|a| a.buffer_samples).map(|v| v.to_string()),
        "audio.read_timeout_ms" => audio.and_then(|a| a.read_timeout_ms).map(|v| v.to_string()),
        "audio.idle_interval_ms" => audio.and_then(|a| a.idle_interval_ms).map(|v| v.to_string()),
        _ => None,
    }
}
