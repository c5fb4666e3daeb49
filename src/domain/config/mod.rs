//! Configuration value objects

mod app_config;

pub use app_config::{
    AppConfig, AudioConfig, ScheduleConfig, DEFAULT_HTTP_PORT, DEFAULT_UDP_PORT,
};
