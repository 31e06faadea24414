mod camera;
mod geometry;
mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod scene;

pub use camera::{Camera, CAMERA_ZOOM_DEFAULT, CAMERA_ZOOM_MAX, CAMERA_ZOOM_MIN};
pub use geometry::{PixelRect, Vec2};
pub use input::InputAction;
pub use loop_runner::{run_app, AppError, LoopConfig, RENDER_FPS_CAP_ENV_VAR, SLOW_FRAME_ENV_VAR};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{
    glyph_advance, text_height, text_width, Color, DrawCommand, DrawList, Renderer, SpriteFlip,
    SpriteRef, TextAlign, Viewport,
};
pub use scene::{InputSnapshot, Scene, SceneCommand};
