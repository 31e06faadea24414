use super::geometry::Vec2;

pub const CAMERA_ZOOM_DEFAULT: f32 = 3.0;
pub const CAMERA_ZOOM_MIN: f32 = 0.5;
pub const CAMERA_ZOOM_MAX: f32 = 8.0;

/// Follow camera over a bounded map. `position` is the world-space top-left
/// of the visible area; the viewport is in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec2,
    viewport_width: f32,
    viewport_height: f32,
    map_width: f32,
    map_height: f32,
    zoom: f32,
}

impl Camera {
    pub fn new(viewport_width: u32, viewport_height: u32, map_width: u32, map_height: u32) -> Self {
        Self {
            position: Vec2::default(),
            viewport_width: viewport_width as f32,
            viewport_height: viewport_height as f32,
            map_width: map_width as f32,
            map_height: map_height as f32,
            zoom: CAMERA_ZOOM_DEFAULT,
        }
    }

    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.set_zoom_clamped(zoom);
        self
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn set_zoom_clamped(&mut self, zoom: f32) {
        self.zoom = clamp_camera_zoom(zoom);
    }

    pub fn viewport_size(&self) -> (f32, f32) {
        (self.viewport_width, self.viewport_height)
    }

    /// World-space size of the visible area.
    pub fn visible_world_size(&self) -> (f32, f32) {
        (
            self.viewport_width / self.zoom,
            self.viewport_height / self.zoom,
        )
    }

    pub fn follow(&mut self, target_x: f32, target_y: f32) {
        let (visible_w, visible_h) = self.visible_world_size();
        let x = target_x - visible_w / 2.0;
        let y = target_y - visible_h / 2.0;
        let max_x = self.map_width - visible_w;
        let max_y = self.map_height - visible_h;
        self.position = Vec2 {
            x: x.min(max_x).max(0.0),
            y: y.min(max_y).max(0.0),
        };
    }

    /// Converts a world rectangle to screen space: `(x, y, w, h)` in pixels.
    pub fn apply(&self, x: f32, y: f32, w: f32, h: f32) -> (f32, f32, f32, f32) {
        (
            (x - self.position.x) * self.zoom,
            (y - self.position.y) * self.zoom,
            w * self.zoom,
            h * self.zoom,
        )
    }

    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        Vec2 {
            x: (world.x - self.position.x) * self.zoom,
            y: (world.y - self.position.y) * self.zoom,
        }
    }
}

fn clamp_camera_zoom(zoom: f32) -> f32 {
    if !zoom.is_finite() {
        return CAMERA_ZOOM_DEFAULT;
    }
    zoom.clamp(CAMERA_ZOOM_MIN, CAMERA_ZOOM_MAX)
}
