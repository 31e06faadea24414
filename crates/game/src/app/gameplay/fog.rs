use maze_engine::{Camera, Vec2};

use super::{FOG_MAX_ALPHA, TILE_SIZE};

/// Darkness per map tile around the player. Only the tiles the camera can
/// see are recomputed each frame.
#[derive(Debug, Clone)]
pub(crate) struct FogOfWar {
    cols: usize,
    rows: usize,
    radius: f32,
    alpha: Vec<u8>,
}

impl FogOfWar {
    pub(crate) fn new(map_width: u32, map_height: u32, radius: f32) -> Self {
        let cols = (map_width as f32 / TILE_SIZE) as usize + 1;
        let rows = (map_height as f32 / TILE_SIZE) as usize + 1;
        Self {
            cols,
            rows,
            radius,
            alpha: vec![FOG_MAX_ALPHA; cols * rows],
        }
    }

    pub(crate) fn radius(&self) -> f32 {
        self.radius
    }

    pub(crate) fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Column and row ranges (end exclusive) visible through `camera`, with
    /// a one tile margin before and two after.
    pub(crate) fn visible_range(&self, camera: &Camera) -> ((usize, usize), (usize, usize)) {
        let (visible_w, visible_h) = camera.visible_world_size();
        let origin = camera.position;
        let start_col = ((origin.x / TILE_SIZE) as i32 - 1).max(0) as usize;
        let end_col = (((origin.x + visible_w) / TILE_SIZE) as i32 + 2).max(0) as usize;
        let start_row = ((origin.y / TILE_SIZE) as i32 - 1).max(0) as usize;
        let end_row = (((origin.y + visible_h) / TILE_SIZE) as i32 + 2).max(0) as usize;
        (
            (start_col, end_col.min(self.cols)),
            (start_row, end_row.min(self.rows)),
        )
    }

    pub(crate) fn update(&mut self, player: Vec2, camera: &Camera) {
        let player_col = (player.x / TILE_SIZE) as i32;
        let player_row = (player.y / TILE_SIZE) as i32;
        let radius_tiles = self.radius / TILE_SIZE;
        let ((start_col, end_col), (start_row, end_row)) = self.visible_range(camera);
        for row in start_row..end_row {
            for col in start_col..end_col {
                let dx = (col as i32 - player_col) as f32;
                let dy = (row as i32 - player_row) as f32;
                let distance = (dx * dx + dy * dy).sqrt();
                self.alpha[row * self.cols + col] = alpha_for_distance(distance, radius_tiles);
            }
        }
    }

    pub(crate) fn alpha_at(&self, col: usize, row: usize) -> u8 {
        if col >= self.cols || row >= self.rows {
            return FOG_MAX_ALPHA;
        }
        self.alpha[row * self.cols + col]
    }
}

/// Fully dark past the radius, clear inside 70% of it, a linear fade between.
pub(crate) fn alpha_for_distance(distance: f32, radius_tiles: f32) -> u8 {
    if distance > radius_tiles {
        FOG_MAX_ALPHA
    } else if distance > radius_tiles * 0.7 {
        let fade = (distance - radius_tiles * 0.7) / (radius_tiles * 0.3);
        (FOG_MAX_ALPHA as f32 * fade) as u8
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_bands_follow_radius() {
        assert_eq!(alpha_for_distance(0.0, 6.0), 0);
        assert_eq!(alpha_for_distance(4.2, 6.0), 0);
        assert_eq!(alpha_for_distance(6.5, 6.0), FOG_MAX_ALPHA);
        let mid = alpha_for_distance(5.1, 6.0);
        assert!(mid > 0 && mid < FOG_MAX_ALPHA);
    }

    #[test]
    fn grid_is_one_tile_larger_than_map() {
        let fog = FogOfWar::new(320, 240, 96.0);
        assert_eq!(fog.dimensions(), (21, 16));
    }

    #[test]
    fn update_clears_tiles_around_player() {
        let mut fog = FogOfWar::new(640, 640, 96.0);
        let mut camera = Camera::new(960, 720, 640, 640);
        camera.follow(320.0, 320.0);
        fog.update(Vec2::new(320.0, 320.0), &camera);
        assert_eq!(fog.alpha_at(20, 20), 0);
        assert_eq!(fog.alpha_at(20, 27), FOG_MAX_ALPHA);
        assert_eq!(fog.alpha_at(28, 20), FOG_MAX_ALPHA);
    }

    #[test]
    fn tiles_outside_view_keep_their_value() {
        let mut fog = FogOfWar::new(1600, 1600, 96.0);
        let camera = Camera::new(960, 720, 1600, 1600);
        fog.update(Vec2::new(16.0, 16.0), &camera);
        assert_eq!(fog.alpha_at(1, 1), 0);
        let ((_, end_col), _) = fog.visible_range(&camera);
        assert_eq!(end_col, 22);
        assert_eq!(fog.alpha_at(60, 60), FOG_MAX_ALPHA);
    }
}
