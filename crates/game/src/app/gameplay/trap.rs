use std::collections::HashMap;

use maze_engine::PixelRect;

use super::{
    INTERACTABLE_SIZE, PEAKS_ACTIVE_FRAME_FACTOR, PEAKS_SAFE_FRAME, PEAKS_SAFE_FRAME_FACTOR,
    TRAP_FRAME_SECONDS, TRAP_HIT_INTERVAL_SECONDS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TrapKind {
    Peaks,
    Arrow,
    Flamethrower,
}

impl TrapKind {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "peaks" => Some(Self::Peaks),
            "arrow" => Some(Self::Arrow),
            "flamethrower" => Some(Self::Flamethrower),
            _ => None,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Peaks => "peaks",
            Self::Arrow => "arrow",
            Self::Flamethrower => "flamethrower",
        }
    }
}

/// Identity of something a trap can hurt, for per-target rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum HitTarget {
    Player,
}

#[derive(Debug, Clone)]
pub(crate) struct Trap {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) kind: TrapKind,
    pub(crate) damage: i32,
    pub(crate) frames: usize,
    pub(crate) frame_index: usize,
    animation_timer: f32,
    last_hit_at: HashMap<HitTarget, f32>,
}

impl Trap {
    pub(crate) fn new(x: f32, y: f32, kind: TrapKind, damage: i32, frames: usize) -> Self {
        Self {
            x,
            y,
            kind,
            damage,
            frames: frames.max(1),
            frame_index: 0,
            animation_timer: 0.0,
            last_hit_at: HashMap::new(),
        }
    }

    pub(crate) fn rect(&self) -> PixelRect {
        PixelRect::from_world(
            self.x,
            self.y,
            INTERACTABLE_SIZE as f32,
            INTERACTABLE_SIZE as f32,
        )
    }

    fn current_frame_seconds(&self) -> f32 {
        match self.kind {
            TrapKind::Peaks if self.frame_index == PEAKS_SAFE_FRAME => {
                TRAP_FRAME_SECONDS * PEAKS_SAFE_FRAME_FACTOR
            }
            TrapKind::Peaks => TRAP_FRAME_SECONDS * PEAKS_ACTIVE_FRAME_FACTOR,
            TrapKind::Arrow | TrapKind::Flamethrower => TRAP_FRAME_SECONDS,
        }
    }

    pub(crate) fn update(&mut self, dt_seconds: f32) {
        self.animation_timer += dt_seconds;
        if self.animation_timer >= self.current_frame_seconds() {
            self.animation_timer = 0.0;
            self.frame_index = (self.frame_index + 1) % self.frames;
        }
    }

    /// Peaks are harmless while retracted; other traps always hurt.
    pub(crate) fn is_dangerous(&self) -> bool {
        !(self.kind == TrapKind::Peaks && self.frame_index == PEAKS_SAFE_FRAME)
    }

    /// Damage to apply to `target` at level time `now`, if any.
    pub(crate) fn check_hit(
        &mut self,
        target: HitTarget,
        target_rect: PixelRect,
        now: f32,
    ) -> Option<i32> {
        if !self.rect().overlaps(&target_rect) || !self.is_dangerous() {
            return None;
        }
        if let Some(last) = self.last_hit_at.get(&target) {
            if now - last < TRAP_HIT_INTERVAL_SECONDS {
                return None;
            }
        }
        self.last_hit_at.insert(target, now);
        Some(self.damage)
    }
}
