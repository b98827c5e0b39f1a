//! Application configuration management

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use eframe::egui;
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the configured GitHub token
pub const TOKEN_ENV_VAR: &str = "INKPAD_GITHUB_TOKEN";

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Editor settings
    pub editor: EditorConfig,
    /// UI settings
    pub ui: UiConfig,
    /// Whiteboard settings
    pub whiteboard: WhiteboardConfig,
    /// Remote repository settings
    pub github: GitHubSettings,
    /// Slug of the notebook that was open when the app last closed
    pub last_notebook: Option<String>,
}

/// Editor-specific settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Font size in pixels
    pub font_size: f32,
    /// Draft autosave delay in milliseconds after the last keystroke
    pub autosave_delay_ms: u64,
}

/// UI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub theme: Theme,
    /// Fraction of the width given to the editor in split view
    pub split_ratio: f32,
    pub show_outline: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    #[default]
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn visuals(self) -> egui::Visuals {
        match self {
            Theme::Light => egui::Visuals::light(),
            Theme::Dark => egui::Visuals::dark(),
        }
    }
}

/// Whiteboard settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhiteboardConfig {
    /// Maximum number of undo snapshots kept
    pub history_capacity: usize,
    /// Default pen width in points
    pub pen_width: f32,
    /// Default pen color as `#rrggbb`
    pub pen_color: String,
}

/// Remote repository the notes are published to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubSettings {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    /// Directory inside the repository holding the notes
    pub notes_dir: String,
    /// Personal access token. Overridden by `INKPAD_GITHUB_TOKEN`.
    pub token: String,
    pub api_base: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            font_size: 14.0,
            autosave_delay_ms: 1000,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            split_ratio: 0.5,
            show_outline: false,
        }
    }
}

impl Default for WhiteboardConfig {
    fn default() -> Self {
        Self {
            history_capacity: 50,
            pen_width: 3.0,
            pen_color: "#e0e0e0".to_string(),
        }
    }
}

impl Default for GitHubSettings {
    fn default() -> Self {
        Self {
            owner: String::new(),
            repo: String::new(),
            branch: "main".to_string(),
            notes_dir: "notes".to_string(),
            token: String::new(),
            api_base: "https://api.github.com".to_string(),
        }
    }
}

impl GitHubSettings {
    /// Whether enough is configured to talk to the remote
    pub fn is_configured(&self) -> bool {
        !self.owner.trim().is_empty()
            && !self.repo.trim().is_empty()
            && !self.effective_token().is_empty()
    }

    /// Token from the environment if set, otherwise the configured one
    pub fn effective_token(&self) -> String {
        std::env::var(TOKEN_ENV_VAR)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.token.clone())
    }
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "inkpad", "Inkpad")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Directory for persistent application data (drafts, whiteboards)
    pub fn data_dir() -> PathBuf {
        ProjectDirs::from("com", "inkpad", "Inkpad")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("inkpad-data"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"ui": {"theme": "light"}}"#).unwrap();
        assert_eq!(config.ui.theme, Theme::Light);
        assert_eq!(config.ui.split_ratio, 0.5);
        assert_eq!(config.whiteboard.history_capacity, 50);
        assert_eq!(config.github.branch, "main");
    }

    #[test]
    fn test_github_requires_owner_repo_and_token() {
        let mut gh = GitHubSettings {
            owner: "me".into(),
            repo: "notes".into(),
            ..Default::default()
        };
        if std::env::var(TOKEN_ENV_VAR).is_err() {
            assert!(!gh.is_configured());
        }
        gh.token = "ghp_x".into();
        assert!(gh.is_configured());
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
    }
}
