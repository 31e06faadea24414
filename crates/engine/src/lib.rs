use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod app;
pub mod tmx;

pub use app::{
    run_app, text_height, text_width, AppError, Camera, Color, DrawCommand, DrawList,
    InputAction, InputSnapshot, LoopConfig, LoopMetricsSnapshot, PixelRect, Renderer, Scene,
    SceneCommand, SpriteFlip, SpriteRef, TextAlign, Vec2, RENDER_FPS_CAP_ENV_VAR,
    SLOW_FRAME_ENV_VAR,
};
pub use tmx::{
    MapObject, ObjectGroup, PropertyValue, TileAnimator, TileImage, TileLayer, TmxError, TmxMap,
};

pub const ROOT_ENV_VAR: &str = "MAZE_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub maps_dir: PathBuf,
    pub assets_dir: PathBuf,
}

impl AppPaths {
    pub fn from_root(root: PathBuf) -> Self {
        let maps_dir = root.join("maps");
        let assets_dir = root.join("assets");
        Self {
            root,
            maps_dir,
            assets_dir,
        }
    }

    /// Resolves a root-relative path such as `maps/level1.tmx`. Absolute paths pass through.
    pub fn resolve(&self, relative: impl AsRef<Path>) -> PathBuf {
        let relative = relative.as_ref();
        if relative.is_absolute() {
            relative.to_path_buf()
        } else {
            self.root.join(relative)
        }
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "MAZE_ROOT is set but does not point to a valid game root: {path}\n\
A valid root must contain Cargo.toml and crates/, or a maps/ directory."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect game root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and crates/, or a maps/ directory.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/escape-the-maze\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    Ok(AppPaths::from_root(root))
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_root_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            exe_dir
                .ancestors()
                .find(|candidate| is_root_marker(candidate))
                .map(normalize_path)
                .ok_or_else(|| StartupError::RootNotFound {
                    start_dir: normalize_path(&exe_dir),
                    env_var: ROOT_ENV_VAR,
                })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_root_marker(path: &Path) -> bool {
    let workspace = path.join("Cargo.toml").is_file() && path.join("crates").is_dir();
    workspace || path.join("maps").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_marker_rejects_plain_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(!is_root_marker(dir.path()));
    }

    #[test]
    fn root_marker_accepts_maps_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("maps")).expect("create maps");
        assert!(is_root_marker(dir.path()));
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let paths = AppPaths::from_root(PathBuf::from("/game"));
        assert_eq!(
            paths.resolve("maps/level1.tmx"),
            PathBuf::from("/game/maps/level1.tmx")
        );
        assert_eq!(paths.resolve("/tmp/x.tmx"), PathBuf::from("/tmp/x.tmx"));
        assert_eq!(paths.maps_dir, PathBuf::from("/game/maps"));
    }
}
