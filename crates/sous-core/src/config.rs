use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, SousError};

/// Top-level configuration for the Sous application.
///
/// Loaded from `~/.sous/config.toml` by default. Each section corresponds
/// to one subsystem of the cooking session engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SousConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub timers: TimerConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub narration: NarrationConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl SousConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SousConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SousError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the session database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.sous/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Tick loop and timer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimerConfig {
    /// Wall-clock period of the tick loop. Each tick removes one second.
    pub tick_interval_ms: u64,
    /// Flush the session to the store every N ticks.
    pub persist_every_ticks: u32,
    /// Seconds added by the "add one minute" command.
    pub add_time_seconds: i64,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            persist_every_ticks: 10,
            add_time_seconds: 60,
        }
    }
}

impl TimerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

/// Voice command settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Whether voice input is enabled at all.
    pub enabled: bool,
    /// Locale passed to the recognizer.
    pub locale: String,
    /// Window after a matched command during which input is ignored.
    pub command_cooldown_ms: u64,
    /// Delay before restarting the recognizer after it ends or fails.
    pub restart_delay_ms: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            locale: "en-US".to_string(),
            command_cooldown_ms: 1500,
            restart_delay_ms: 500,
        }
    }
}

impl VoiceConfig {
    pub fn command_cooldown(&self) -> Duration {
        Duration::from_millis(self.command_cooldown_ms)
    }

    pub fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

/// Spoken instruction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationConfig {
    /// Whether instructions are spoken at all.
    pub enabled: bool,
    /// Read the new step aloud whenever the current step changes.
    pub read_step_on_change: bool,
}

impl Default for NarrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            read_step_on_change: true,
        }
    }
}

/// Session persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite file name, relative to `general.data_dir`.
    pub database_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_file: "sous.db".to_string(),
        }
    }
}
