use maze_engine::tmx::strip_flip_flags;
use maze_engine::{PixelRect, TileLayer, TmxMap};
use thiserror::Error;

use super::{ENEMY_COLLISION_SIZE, TILE_SIZE, TILE_SIZE_PX};

const COLLISION_LAYER: &str = "Collision";

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum CollisionGridError {
    #[error("collision grid expects {expected} cells for {cols}x{rows}, got {actual}")]
    CellCountMismatch {
        cols: usize,
        rows: usize,
        expected: usize,
        actual: usize,
    },
}

/// Solid/walkable flags per map tile, row-major.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct CollisionGrid {
    cols: usize,
    rows: usize,
    solid: Vec<bool>,
}

impl CollisionGrid {
    pub(crate) fn new(
        cols: usize,
        rows: usize,
        solid: Vec<bool>,
    ) -> Result<Self, CollisionGridError> {
        let expected = cols * rows;
        if solid.len() != expected {
            return Err(CollisionGridError::CellCountMismatch {
                cols,
                rows,
                expected,
                actual: solid.len(),
            });
        }
        Ok(Self { cols, rows, solid })
    }

    pub(crate) fn open(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            solid: vec![false; cols * rows],
        }
    }

    pub(crate) fn from_map(map: &TmxMap) -> Self {
        let cols = map.width as usize;
        let rows = map.height as usize;
        match map.tile_layer(COLLISION_LAYER) {
            Some(layer) => Self::from_layer(layer, cols, rows),
            None => Self::open(cols, rows),
        }
    }

    fn from_layer(layer: &TileLayer, cols: usize, rows: usize) -> Self {
        let mut solid = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                let raw = layer.raw_gid_at(col as u32, row as u32);
                solid.push(strip_flip_flags(raw) != 0);
            }
        }
        Self { cols, rows, solid }
    }

    pub(crate) fn cols(&self) -> usize {
        self.cols
    }

    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cols == 0 || self.rows == 0
    }

    /// Out-of-range cells are walkable.
    pub(crate) fn is_solid(&self, col: i32, row: i32) -> bool {
        if col < 0 || row < 0 {
            return false;
        }
        let (col, row) = (col as usize, row as usize);
        if col >= self.cols || row >= self.rows {
            return false;
        }
        self.solid[row * self.cols + col]
    }

    /// Player feet query. The tile range is clamped to the grid, so a rect
    /// lying wholly past the right or bottom edge never collides.
    pub(crate) fn blocks_feet(&self, feet: PixelRect) -> bool {
        if self.is_empty() {
            return false;
        }
        let last_col = self.cols as i32 - 1;
        let last_row = self.rows as i32 - 1;
        let start_col = feet.left().div_euclid(TILE_SIZE_PX).max(0);
        let end_col = (feet.right() - 1)
            .div_euclid(TILE_SIZE_PX)
            .max(0)
            .min(last_col);
        let start_row = feet.top().div_euclid(TILE_SIZE_PX).max(0);
        let end_row = (feet.bottom() - 1)
            .div_euclid(TILE_SIZE_PX)
            .max(0)
            .min(last_row);

        (start_row..=end_row)
            .any(|row| (start_col..=end_col).any(|col| self.is_solid(col, row)))
    }

    /// Enemy query for the 16x16 collision box at `(x, y)`. The range is
    /// inclusive of the tile under the right/bottom edge.
    pub(crate) fn blocks_hitbox(&self, x: f32, y: f32) -> bool {
        let start_col = ((x / TILE_SIZE) as i32).max(0);
        let end_col = ((x + ENEMY_COLLISION_SIZE) / TILE_SIZE) as i32;
        let start_row = ((y / TILE_SIZE) as i32).max(0);
        let end_row = ((y + ENEMY_COLLISION_SIZE) / TILE_SIZE) as i32;

        (start_row..=end_row)
            .any(|row| (start_col..=end_col).any(|col| self.is_solid(col, row)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from_rows(rows: &[&str]) -> CollisionGrid {
        let cols = rows[0].len();
        let solid = rows
            .iter()
            .flat_map(|row| row.chars().map(|cell| cell == '#'))
            .collect();
        CollisionGrid::new(cols, rows.len(), solid).expect("grid")
    }

    #[test]
    fn new_rejects_wrong_cell_count() {
        let error = CollisionGrid::new(3, 2, vec![false; 5]).expect_err("mismatch");
        assert_eq!(
            error,
            CollisionGridError::CellCountMismatch {
                cols: 3,
                rows: 2,
                expected: 6,
                actual: 5,
            }
        );
    }

    #[test]
    fn feet_query_hits_solid_tile() {
        let grid = grid_from_rows(&["...", ".#.", "..."]);
        assert!(grid.blocks_feet(PixelRect::new(20, 20, 10, 8)));
        assert!(!grid.blocks_feet(PixelRect::new(2, 2, 10, 8)));
    }

    #[test]
    fn feet_query_right_edge_is_exclusive() {
        let grid = grid_from_rows(&[".#"]);
        assert!(!grid.blocks_feet(PixelRect::new(6, 0, 10, 8)));
        assert!(grid.blocks_feet(PixelRect::new(7, 0, 10, 8)));
    }

    #[test]
    fn feet_query_clamps_negative_coordinates() {
        let grid = grid_from_rows(&["#."]);
        assert!(grid.blocks_feet(PixelRect::new(-30, -30, 10, 8)));
    }

    #[test]
    fn feet_query_past_grid_is_permeable() {
        let grid = grid_from_rows(&["##", "##"]);
        assert!(!grid.blocks_feet(PixelRect::new(64, 0, 10, 8)));
        assert!(!CollisionGrid::default().blocks_feet(PixelRect::new(0, 0, 10, 8)));
    }

    #[test]
    fn hitbox_query_reaches_tile_under_far_edge() {
        let grid = grid_from_rows(&[".#", ".."]);
        assert!(grid.blocks_hitbox(0.0, 0.0));
        assert!(!grid.blocks_hitbox(0.0, 17.0));
    }

    #[test]
    fn hitbox_query_skips_outside_tiles() {
        let grid = grid_from_rows(&["..", ".."]);
        assert!(!grid.blocks_hitbox(-40.0, -40.0));
        assert!(!grid.blocks_hitbox(100.0, 100.0));
    }

    #[test]
    fn from_map_without_collision_layer_is_open() {
        let map = TmxMap {
            width: 3,
            height: 2,
            tile_width: 16,
            tile_height: 16,
            tile_layers: Vec::new(),
            object_groups: Vec::new(),
            tilesets: Vec::new(),
        };
        let grid = CollisionGrid::from_map(&map);
        assert_eq!((grid.cols(), grid.rows()), (3, 2));
        assert!(!grid.blocks_feet(PixelRect::new(0, 0, 48, 32)));
    }

    #[test]
    fn from_map_strips_flip_flags() {
        let map = TmxMap {
            width: 2,
            height: 1,
            tile_width: 16,
            tile_height: 16,
            tile_layers: vec![TileLayer {
                name: "Collision".to_string(),
                width: 2,
                height: 1,
                visible: true,
                gids: vec![0x8000_0000, 7 | 0x4000_0000],
            }],
            object_groups: Vec::new(),
            tilesets: Vec::new(),
        };
        let grid = CollisionGrid::from_map(&map);
        assert!(!grid.is_solid(0, 0));
        assert!(grid.is_solid(1, 0));
    }
}
