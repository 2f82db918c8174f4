use std::path::PathBuf;
use std::time::Duration;

/// application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// directory uploads are written to and listed from
    pub files_dir: PathBuf,
    /// listen address
    pub host: String,
    /// listen port
    pub port: u16,
    /// maximum upload size in bytes
    pub max_upload_size: usize,
    /// number of tokio worker threads
    pub worker_threads: usize,
    /// minimum time between two progress events of one file, in milliseconds
    pub message_time_delay_ms: u64,
    /// owner reported for every listed file
    pub file_owner: String,
    /// per-connection capacity of the progress event queue
    pub event_buffer: usize,
}

impl Config {
    /// load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            files_dir: std::env::var("FILES_DIR")
                .unwrap_or_else(|_| "./downloads".to_string())
                .into(),
            host: std::env::var("HOST")
                .unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            max_upload_size: std::env::var("MAX_UPLOAD_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10 * 1024 * 1024 * 1024), // 10GB default
            worker_threads: std::env::var("WORKER_THREADS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(8),
            message_time_delay_ms: std::env::var("MESSAGE_TIME_DELAY_MS")
                .ok()
                .and_then(|d| d.parse().ok())
                .unwrap_or(200),
            file_owner: std::env::var("FILE_OWNER")
                .ok()
                .filter(|o| !o.trim().is_empty())
                .unwrap_or_else(|| "system_user".to_string()),
            event_buffer: std::env::var("EVENT_BUFFER")
                .ok()
                .and_then(|b| b.parse().ok())
                .filter(|b: &usize| *b > 0)
                .unwrap_or(64),
        }
    }

    /// throttle window for progress events
    pub fn message_time_delay(&self) -> Duration {
        Duration::from_millis(self.message_time_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            files_dir: PathBuf::from("./downloads"),
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_upload_size: 10 * 1024 * 1024 * 1024,
            worker_threads: 8,
            message_time_delay_ms: 200,
            file_owner: "system_user".to_string(),
            event_buffer: 64,
        }
    }
}
