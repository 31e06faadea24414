use std::collections::HashMap;

use super::types::{strip_flip_flags, AnimationFrame, TmxMap};

#[derive(Debug, Clone)]
struct AnimationState {
    first_gid: u32,
    frames: Vec<AnimationFrame>,
    frame_index: usize,
    elapsed_ms: f32,
}

/// Advances every animated tile of a map and maps base gids to the gid of
/// their current frame.
#[derive(Debug, Clone, Default)]
pub struct TileAnimator {
    states: HashMap<u32, AnimationState>,
}

impl TileAnimator {
    pub fn for_map(map: &TmxMap) -> Self {
        let mut states = HashMap::new();
        for tileset in &map.tilesets {
            for (local_id, frames) in &tileset.animations {
                if frames.iter().all(|frame| frame.duration_ms == 0) {
                    continue;
                }
                states.insert(
                    tileset.first_gid + local_id,
                    AnimationState {
                        first_gid: tileset.first_gid,
                        frames: frames.clone(),
                        frame_index: 0,
                        elapsed_ms: 0.0,
                    },
                );
            }
        }
        Self { states }
    }

    pub fn animated_tile_count(&self) -> usize {
        self.states.len()
    }

    pub fn update(&mut self, dt_seconds: f32) {
        let dt_ms = dt_seconds.max(0.0) * 1000.0;
        for state in self.states.values_mut() {
            state.elapsed_ms += dt_ms;
            loop {
                let duration = state.frames[state.frame_index].duration_ms as f32;
                if state.elapsed_ms < duration {
                    break;
                }
                state.elapsed_ms -= duration;
                state.frame_index = (state.frame_index + 1) % state.frames.len();
            }
        }
    }

    /// Current display gid for `raw_gid`, flip flags preserved.
    pub fn current_gid(&self, raw_gid: u32) -> u32 {
        let gid = strip_flip_flags(raw_gid);
        let Some(state) = self.states.get(&gid) else {
            return raw_gid;
        };
        let flags = raw_gid & !gid;
        (state.first_gid + state.frames[state.frame_index].tile_id) | flags
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::tmx::types::{Tileset, FLIPPED_VERTICALLY_FLAG};

    fn torch_map() -> TmxMap {
        let mut animations = HashMap::new();
        animations.insert(
            35,
            vec![
                AnimationFrame {
                    tile_id: 35,
                    duration_ms: 150,
                },
                AnimationFrame {
                    tile_id: 36,
                    duration_ms: 150,
                },
                AnimationFrame {
                    tile_id: 41,
                    duration_ms: 300,
                },
            ],
        );
        TmxMap {
            width: 1,
            height: 1,
            tile_width: 16,
            tile_height: 16,
            tile_layers: Vec::new(),
            object_groups: Vec::new(),
            tilesets: vec![Tileset {
                first_gid: 1,
                name: "props".to_string(),
                tile_width: 16,
                tile_height: 16,
                tile_count: 64,
                columns: 8,
                spacing: 0,
                margin: 0,
                image: None,
                tile_images: HashMap::new(),
                animations,
            }],
        }
    }

    #[test]
    fn frames_advance_by_their_own_durations() {
        let mut animator = TileAnimator::for_map(&torch_map());
        assert_eq!(animator.animated_tile_count(), 1);
        assert_eq!(animator.current_gid(36), 36);
        animator.update(0.16);
        assert_eq!(animator.current_gid(36), 37);
        animator.update(0.16);
        assert_eq!(animator.current_gid(36), 42);
        animator.update(0.29);
        assert_eq!(animator.current_gid(36), 36);
    }

    #[test]
    fn large_step_wraps_through_several_frames() {
        let mut animator = TileAnimator::for_map(&torch_map());
        animator.update(0.61);
        assert_eq!(animator.current_gid(36), 36);
    }

    #[test]
    fn static_tiles_and_flags_pass_through() {
        let mut animator = TileAnimator::for_map(&torch_map());
        assert_eq!(animator.current_gid(5), 5);
        animator.update(0.2);
        let flipped = 36 | FLIPPED_VERTICALLY_FLAG;
        assert_eq!(animator.current_gid(flipped), 37 | FLIPPED_VERTICALLY_FLAG);
    }
}
