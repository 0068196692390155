use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub notification: NotificationConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub replay: ReplayConfig,
}

/// Notification channel and template settings.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_channel_id")]
    pub channel_id: String,
    /// Human-readable channel name shown in the platform settings.
    #[serde(default = "default_channel_name")]
    pub channel_name: String,
    #[serde(default = "default_notification_id")]
    pub notification_id: i32,
    #[serde(default = "default_small_icon")]
    pub small_icon: String,
    /// Background color as `#RRGGBB`. Unset keeps the platform default style.
    #[serde(default)]
    pub color: Option<String>,
    /// Action fired when the user taps the notification.
    #[serde(default = "default_tap_action")]
    pub tap_action: String,
}

fn default_channel_id() -> String {
    "LOCATION_CHANNEL".into()
}
fn default_channel_name() -> String {
    "Route".into()
}
fn default_notification_id() -> i32 {
    12345678
}
fn default_small_icon() -> String {
    "ic_notification".into()
}
fn default_tap_action() -> String {
    "open-map".into()
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            channel_id: default_channel_id(),
            channel_name: default_channel_name(),
            notification_id: default_notification_id(),
            small_icon: default_small_icon(),
            color: None,
            tap_action: default_tap_action(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_piper_binary")]
    pub piper_binary: String,
    #[serde(default)]
    pub piper_model: String,
    #[serde(default)]
    pub piper_config: String,
    /// Raw PCM player fed by piper's stdout.
    #[serde(default = "default_player_binary")]
    pub player_binary: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_piper_binary() -> String {
    "piper".into()
}
fn default_player_binary() -> String {
    "aplay".into()
}
fn default_sample_rate() -> u32 {
    22050
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            piper_binary: default_piper_binary(),
            piper_model: String::new(),
            piper_config: String::new(),
            player_binary: default_player_binary(),
            sample_rate: default_sample_rate(),
        }
    }
}

/// Pacing for scripted navigation sessions.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

fn default_interval_ms() -> u64 {
    1000
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback chain: explicit path → ./config/default.toml → hardcoded defaults.
    pub fn load_or_default(explicit_path: Option<&Path>) -> Self {
        if let Some(path) = explicit_path {
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {e}", path.display());
                }
            }
        }

        let default_path = Path::new("config/default.toml");
        if default_path.exists() {
            match Self::load(default_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!("Failed to load default config: {e}");
                }
            }
        }

        tracing::info!("Using hardcoded default configuration");
        Self::default()
    }
}
