//! Client configuration, loaded from `<config dir>/gridchat/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use gridchat_protocol::{SheetTarget, DEFAULT_PORT};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// Settings for the chat client. Every field has a default, so a partial (or
/// missing) config file is fine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the local bridge backend
    pub backend_url: String,
    /// Base URL of the OpenAI-compatible completion API
    pub ai_endpoint: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Let the assistant write back into the spreadsheet
    pub write_mode: bool,
    /// Workbook to read from and write to; `None` means the active one
    pub workbook: Option<String>,
    /// Sheet to read from and write to; `None` means the active one
    pub sheet: Option<String>,
    pub health_interval_secs: u64,
    /// Attempts made to fetch spreadsheet context before giving up
    pub context_attempts: u32,
    /// How long the health monitor stays paused after a write completes
    pub write_quiescence_ms: u64,
    /// Rows of sheet data included in the prompt
    pub context_row_limit: usize,
    /// Replaces the built-in system prompt
    pub system_prompt: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: format!("http://127.0.0.1:{DEFAULT_PORT}"),
            ai_endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            write_mode: false,
            workbook: None,
            sheet: None,
            health_interval_secs: 30,
            context_attempts: 3,
            write_quiescence_ms: 2000,
            context_row_limit: 100,
            system_prompt: None,
        }
    }
}

impl ClientConfig {
    /// Directory holding the config file and the persisted client state.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|c| c.join("gridchat"))
    }

    /// Default location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Load from the default path, falling back to defaults if there is no
    /// file. A file that exists but does not parse is an error.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "loaded client config");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ClientError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Explicit workbook/sheet targeting.
    pub fn target(&self) -> SheetTarget {
        SheetTarget::new(self.workbook.clone(), self.sheet.clone())
    }

    pub fn health_interval(&self) -> Duration {
        Duration::from_secs(self.health_interval_secs)
    }

    pub fn write_quiescence(&self) -> Duration {
        Duration::from_millis(self.write_quiescence_ms)
    }
}
