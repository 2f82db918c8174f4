use std::path::PathBuf;
use std::time::Duration;

use crate::config::Config;
use crate::notifier::Notifier;

/// shared application state
#[derive(Clone)]
pub struct AppState {
    pub files_dir: PathBuf,
    /// owner reported by the listing
    pub file_owner: String,
    /// throttle window for progress events
    pub message_time_delay: Duration,
    /// realtime connections by session id
    pub notifier: Notifier,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            files_dir: config.files_dir.clone(),
            file_owner: config.file_owner.clone(),
            message_time_delay: config.message_time_delay(),
            notifier: Notifier::new(config.event_buffer),
        }
    }
}
