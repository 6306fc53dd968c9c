use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const APP_NAME: &str = "pdfhub";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CONFIG_DIR_ENV: &str = "PDFHUB_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "config.json";
const INDEX_FILE_NAME: &str = "pdf_index.json";
const PREVIEW_FILE_NAME: &str = "preview.png";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Location of the remote version document. Empty disables the check.
    pub update_url: String,
    pub update_timeout_secs: u64,
    pub refresh_interval_ms: u64,
    /// Tracked file extension, without the dot.
    pub extension: String,
    pub preview_scale: f32,
    pub preview_max_width: u32,
    pub preview_max_height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            update_url: String::new(),
            update_timeout_secs: 5,
            refresh_interval_ms: 3000,
            extension: "pdf".to_string(),
            preview_scale: 2.0,
            preview_max_width: 900,
            preview_max_height: 1200,
        }
    }
}

impl AppConfig {
    /// Reads `config.json` from `config_dir`. A missing file yields defaults.
    pub fn load(config_dir: &Path) -> Result<Self, AppError> {
        let path = config_dir.join(CONFIG_FILE_NAME);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let mut config: Self = serde_json::from_str(&content)?;
        config.extension = config.extension.trim_start_matches('.').to_string();
        if config.extension.is_empty() {
            return Err(AppError::General(format!(
                "{}: extension must not be empty",
                path.display()
            )));
        }
        if config.refresh_interval_ms == 0 {
            return Err(AppError::General(format!(
                "{}: refresh_interval_ms must be greater than zero",
                path.display()
            )));
        }
        Ok(config)
    }
}

/// Resolved per-installation paths.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
}

impl AppPaths {
    /// Explicit override, then `$PDFHUB_CONFIG_DIR`, then the platform config dir.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, AppError> {
        let config_dir = match explicit {
            Some(dir) => dir.to_path_buf(),
            None => match std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
                Some(dir) => PathBuf::from(dir),
                None => directories::ProjectDirs::from("", "", APP_NAME)
                    .map(|dirs| dirs.config_dir().to_path_buf())
                    .ok_or_else(|| {
                        AppError::General("could not resolve a config directory".to_string())
                    })?,
            },
        };
        std::fs::create_dir_all(&config_dir)?;
        Ok(Self { config_dir })
    }

    pub fn index_file(&self) -> PathBuf {
        self.config_dir.join(INDEX_FILE_NAME)
    }

    pub fn preview_file(&self) -> PathBuf {
        self.config_dir.join(PREVIEW_FILE_NAME)
    }
}
