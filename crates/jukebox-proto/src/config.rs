use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub labels: LabelsConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Result rows visible on one page.
    #[serde(default = "default_num_rows")]
    pub num_rows: usize,
    /// How long to wait for a key before emitting a "no event" tick.
    #[serde(default = "default_key_timeout_ms")]
    pub key_timeout_ms: u64,
    /// Idle time after which the panel is switched off.
    #[serde(default = "default_idle_sleep_secs")]
    pub idle_sleep_secs: u64,
    /// Volume change per VOLUMEUP / VOLUMEDOWN press, in percent.
    #[serde(default = "default_volume_step")]
    pub volume_step: i8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Http,
    Mock,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,
    /// Base URL of the speaker bridge.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DisplayKind {
    #[default]
    Terminal,
    Framebuffer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default)]
    pub kind: DisplayKind,
    /// Framebuffer device of the panel (fbtft exposes the ST7735 as /dev/fb1).
    #[serde(default = "default_framebuffer")]
    pub framebuffer: PathBuf,
    /// sysfs `bl_power` file; panel power is left alone when unset.
    #[serde(default)]
    pub backlight: Option<PathBuf>,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

/// Literal strings shown in dialogues. Swap these to localize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelsConfig {
    #[serde(default = "default_replace_label")]
    pub replace: String,
    #[serde(default = "default_enqueue_label")]
    pub enqueue: String,
    #[serde(default = "default_cycle_repeat_label")]
    pub cycle_repeat: String,
    #[serde(default = "default_reindex_label")]
    pub reindex: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "platform::log_path")]
    pub log_file: PathBuf,
    #[serde(default = "platform::failure_log_path")]
    pub failure_log: PathBuf,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            num_rows: default_num_rows(),
            key_timeout_ms: default_key_timeout_ms(),
            idle_sleep_secs: default_idle_sleep_secs(),
            volume_step: default_volume_step(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::default(),
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            kind: DisplayKind::default(),
            framebuffer: default_framebuffer(),
            backlight: None,
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for LabelsConfig {
    fn default() -> Self {
        Self {
            replace: default_replace_label(),
            enqueue: default_enqueue_label(),
            cycle_repeat: default_cycle_repeat_label(),
            reindex: default_reindex_label(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_file: platform::log_path(),
            failure_log: platform::failure_log_path(),
        }
    }
}

fn default_num_rows() -> usize {
    7
}

fn default_key_timeout_ms() -> u64 {
    5000
}

fn default_idle_sleep_secs() -> u64 {
    300
}

fn default_volume_step() -> i8 {
    2
}

fn default_base_url() -> String {
    "http://127.0.0.1:5005".to_string()
}

fn default_request_timeout_ms() -> u64 {
    4000
}

fn default_framebuffer() -> PathBuf {
    PathBuf::from("/dev/fb1")
}

fn default_width() -> u32 {
    160
}

fn default_height() -> u32 {
    128
}

fn default_replace_label() -> String {
    "replace".to_string()
}

fn default_enqueue_label() -> String {
    "add to end of queue".to_string()
}

fn default_cycle_repeat_label() -> String {
    "cycle repeat".to_string()
}

fn default_reindex_label() -> String {
    "reindex library".to_string()
}

impl UiConfig {
    pub fn key_timeout(&self) -> Duration {
        Duration::from_millis(self.key_timeout_ms)
    }

    pub fn idle_sleep_after(&self) -> Duration {
        Duration::from_secs(self.idle_sleep_secs)
    }
}

impl BackendConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Config {
    /// Load from the default location, writing a default file on first run.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(config_path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ui.num_rows == 0 {
            anyhow::bail!("ui.num_rows must be at least 1");
        }
        if self.ui.key_timeout_ms == 0 {
            anyhow::bail!("ui.key_timeout_ms must be positive");
        }
        if self.ui.volume_step == 0 {
            anyhow::bail!("ui.volume_step must not be zero");
        }
        if self.display.width == 0 || self.display.height == 0 {
            anyhow::bail!(
                "display size {}x{} is empty",
                self.display.width,
                self.display.height
            );
        }
        if self.backend.kind == BackendKind::Http && self.backend.base_url.is_empty() {
            anyhow::bail!("backend.base_url is required for the http backend");
        }
        Ok(())
    }
}
