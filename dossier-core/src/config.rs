//! Configuration system for Dossier.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> overrides.
//! Configuration is loaded from `~/.config/dossier/config.toml` and/or `.dossier/config.toml`
//! in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::history::DEFAULT_CAPACITY;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DossierConfig {
    pub pipeline: PipelineConfig,
    pub history: HistoryConfig,
    pub sources: SourcesConfig,
    pub render: RenderConfig,
}

/// Orchestrator behavior.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory for temporary cover and chart images. Defaults to the OS temp dir.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_dir: Option<PathBuf>,
    /// Fail instead of rendering when nothing at all was gathered.
    pub fail_on_empty: bool,
}

impl PipelineConfig {
    pub fn resolved_temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// History store location and size.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: None,
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl HistoryConfig {
    /// Configured path, else `search_history.json` in the project data directory.
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        directories::ProjectDirs::from("dev", "dossier", "dossier")
            .map(|d| d.data_dir().join("search_history.json"))
            .unwrap_or_else(|| PathBuf::from("search_history.json"))
    }
}

/// Remote collaborators: endpoints, identity, timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// `User-Agent` sent with every request.
    pub user_agent: String,
    pub scrape_timeout_secs: u64,
    pub image_timeout_secs: u64,
    pub api_timeout_secs: u64,
    /// How many of the page's images are considered for the cover.
    pub max_image_candidates: usize,
    /// MediaWiki API endpoint; `{lang}` is replaced by the language code.
    pub wikipedia_base_url: String,
    pub search_url: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0".into(),
            scrape_timeout_secs: 4,
            image_timeout_secs: 5,
            api_timeout_secs: 10,
            max_image_candidates: 5,
            wikipedia_base_url: "https://{lang}.wikipedia.org/w/api.php".into(),
            search_url: "https://html.duckduckgo.com/html/".into(),
        }
    }
}

/// Document rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Directories searched in order for a TrueType font family.
    pub font_dirs: Vec<PathBuf>,
    /// Family names tried in each directory, e.g. `LiberationSans`.
    pub font_families: Vec<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            font_dirs: vec![
                PathBuf::from("fonts"),
                PathBuf::from("/usr/share/fonts/truetype/liberation"),
                PathBuf::from("/usr/share/fonts/liberation"),
                PathBuf::from("/usr/share/fonts/truetype/dejavu"),
                PathBuf::from("/System/Library/Fonts/Supplemental"),
                PathBuf::from("/Library/Fonts"),
                PathBuf::from("C:\\Windows\\Fonts"),
            ],
            font_families: vec![
                "LiberationSans".into(),
                "DejaVuSans".into(),
                "Arial".into(),
            ],
        }
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `DOSSIER_`)
/// 3. Workspace-local config (`.dossier/config.toml`)
/// 4. User config (`~/.config/dossier/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&DossierConfig>,
) -> Result<DossierConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(DossierConfig::default()));

    if let Some(config_dir) = directories::ProjectDirs::from("dev", "dossier", "dossier") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".dossier").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // DOSSIER_HISTORY__CAPACITY, DOSSIER_PIPELINE__FAIL_ON_EMPTY, etc.
    figment = figment.merge(Env::prefixed("DOSSIER_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    Ok(figment.extract()?)
}
