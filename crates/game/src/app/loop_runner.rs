use std::process::ExitCode;

use maze_engine::run_app;
use tracing::error;

use super::bootstrap::build_app;

pub(crate) fn run() -> ExitCode {
    let app = match build_app() {
        Ok(app) => app,
        Err(err) => {
            error!(error = %err, "startup_failed");
            return ExitCode::FAILURE;
        }
    };
    if let Err(err) = run_app(app.config, app.scene) {
        error!(error = %err, "app_failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
