//! Config layering shared by the runners

use std::env;

use log::warn;

use crate::application::ports::ConfigStore;
use crate::domain::config::AppConfig;
use crate::infrastructure::XdgConfigStore;

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

pub const ENV_DEVICE_ID: &str = "AUDIO_STATION_DEVICE_ID";
pub const ENV_ROOT: &str = "AUDIO_STATION_ROOT";

/// Config layer taken from the environment; empty values are ignored
pub fn env_config() -> AppConfig {
    let var = |name: &str| env::var(name).ok().filter(|s| !s.is_empty());
    AppConfig {
        device_id: var(ENV_DEVICE_ID),
        storage_root: var(ENV_ROOT),
        ..Default::default()
    }
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    merge_layers(&XdgConfigStore::new(), env_config(), cli_config).await
}

/// Merge: defaults < file < env < cli
pub async fn merge_layers<S: ConfigStore>(
    store: &S,
    env_config: AppConfig,
    cli_config: AppConfig,
) -> AppConfig {
    let file_config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring config file {}: {}", store.path().display(), e);
            AppConfig::empty()
        }
    };

    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}
