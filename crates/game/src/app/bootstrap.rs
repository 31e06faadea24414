use std::time::Duration;

use maze_engine::{resolve_app_paths, LoopConfig, Scene, StartupError};
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::audio::DeviceAudio;
use super::settings::GameSettings;
use super::shell::MazeScene;

const METRICS_LOG_INTERVAL: Duration = Duration::from_secs(5);

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) scene: Box<dyn Scene>,
}

pub(crate) fn build_app() -> Result<AppWiring, StartupError> {
    init_tracing();
    info!("=== Escape The Maze Startup ===");

    let paths = resolve_app_paths()?;
    let settings = GameSettings::load_or_default(&paths.root);
    info!(
        root = %paths.root.display(),
        start_level = %settings.start_level.display(),
        width = settings.window_width,
        height = settings.window_height,
        "app_paths_resolved"
    );

    let config = LoopConfig {
        window_title: settings.window_title.clone(),
        window_width: settings.window_width,
        window_height: settings.window_height,
        asset_root: paths.root.clone(),
        metrics_log_interval: METRICS_LOG_INTERVAL,
        max_render_fps: settings.max_render_fps,
        ..LoopConfig::default()
    };
    let audio = Box::new(DeviceAudio::new(
        paths.assets_dir.join("sounds"),
        settings.muted,
    ));
    let scene = Box::new(MazeScene::new(paths, settings, audio));

    Ok(AppWiring { config, scene })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
