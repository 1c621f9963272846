//! Configuration loaded from TOML.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub alert: AlertConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub commands: CommandConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Phase lengths and countdown polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Used when the start command gives no work length.
    #[serde(default = "default_work_minutes")]
    pub work_minutes: i64,
    /// Used when the start command gives no break length.
    #[serde(default = "default_break_minutes")]
    pub break_minutes: i64,
    /// Countdown polling granularity.
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
}

impl TimerConfig {
    /// Countdown tick, clamped to at most one second.
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis.clamp(1, 1000))
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            break_minutes: default_break_minutes(),
            tick_millis: default_tick_millis(),
        }
    }
}

/// End-of-phase alert settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Name of the local audio asset played over voice.
    #[serde(default = "default_asset")]
    pub asset: String,
    /// How often to check whether playback has finished.
    #[serde(default = "default_alert_poll_millis")]
    pub poll_millis: u64,
    /// Text sent when audio is unavailable.
    #[serde(default = "default_alert_text")]
    pub text: String,
}

impl AlertConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_millis.max(1))
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            asset: default_asset(),
            poll_millis: default_alert_poll_millis(),
            text: default_alert_text(),
        }
    }
}

/// Bounds on how long stop and leave wait for the session to settle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    #[serde(default = "default_stop_timeout_secs")]
    pub stop_timeout_secs: u64,
    #[serde(default = "default_leave_timeout_secs")]
    pub leave_timeout_secs: u64,
}

impl LifecycleConfig {
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    pub fn leave_timeout(&self) -> Duration {
        Duration::from_secs(self.leave_timeout_secs)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            stop_timeout_secs: default_stop_timeout_secs(),
            leave_timeout_secs: default_leave_timeout_secs(),
        }
    }
}

/// Chat command settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Also write logs to this file, truncated at startup.
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_work_minutes() -> i64 {
    30
}

fn default_break_minutes() -> i64 {
    10
}

fn default_tick_millis() -> u64 {
    1000
}

fn default_asset() -> String {
    "alarm.mp3".to_string()
}

fn default_alert_poll_millis() -> u64 {
    500
}

fn default_alert_text() -> String {
    "@here ⏰ **Alarm!**".to_string()
}

fn default_stop_timeout_secs() -> u64 {
    10
}

fn default_leave_timeout_secs() -> u64 {
    5
}

fn default_prefix() -> String {
    "!".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
