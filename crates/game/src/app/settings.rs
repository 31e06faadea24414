use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

pub(crate) const SETTINGS_ENV_VAR: &str = "MAZE_SETTINGS";
const SETTINGS_FILE_NAME: &str = "settings.json";

/// Optional `settings.json` overrides. Every field has a default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct GameSettings {
    pub(crate) window_width: u32,
    pub(crate) window_height: u32,
    pub(crate) window_title: String,
    pub(crate) camera_zoom: f32,
    pub(crate) start_level: PathBuf,
    pub(crate) levels: Vec<PathBuf>,
    pub(crate) muted: bool,
    pub(crate) max_render_fps: Option<u32>,
    pub(crate) rng_seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            window_width: 960,
            window_height: 720,
            window_title: "Escape The Maze".to_string(),
            camera_zoom: 3.0,
            start_level: PathBuf::from("maps/level1.tmx"),
            levels: vec![
                PathBuf::from("maps/level1.tmx"),
                PathBuf::from("maps/level2.tmx"),
            ],
            muted: false,
            max_render_fps: Some(60),
            rng_seed: None,
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum SettingsError {
    #[error("failed to read settings '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid settings '{path}' at {field}: {source}")]
    Parse {
        path: PathBuf,
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

impl GameSettings {
    /// Parses settings JSON; `path` is only used for error messages.
    pub(crate) fn parse(raw: &str, path: &Path) -> Result<Self, SettingsError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let field = error.path().to_string();
            SettingsError::Parse {
                path: path.to_path_buf(),
                field: if field.is_empty() {
                    ".".to_string()
                } else {
                    field
                },
                source: error.into_inner(),
            }
        })
    }

    /// `Ok(None)` when the file does not exist.
    pub(crate) fn load(path: &Path) -> Result<Option<Self>, SettingsError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&raw, path).map(Some)
    }

    /// Loads from `MAZE_SETTINGS` or `<root>/settings.json`, falling back
    /// to defaults when the file is absent or invalid.
    pub(crate) fn load_or_default(root: &Path) -> Self {
        let path = std::env::var_os(SETTINGS_ENV_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|| root.join(SETTINGS_FILE_NAME));
        match Self::load(&path) {
            Ok(Some(settings)) => {
                info!(path = %path.display(), "settings_loaded");
                settings
            }
            Ok(None) => Self::default(),
            Err(error) => {
                warn!(error = %error, "settings_invalid_using_defaults");
                Self::default()
            }
        }
    }
}
