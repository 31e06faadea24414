use maze_engine::PixelRect;

use super::events::{GameEvent, GameEventBus};
use super::player::{KeyKind, Player};
use super::{COLLECTIBLE_FRAME_SECONDS, INTERACTABLE_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum ItemKind {
    Coin,
    Key,
    Potion,
}

impl ItemKind {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "coin" => Some(Self::Coin),
            "key" => Some(Self::Key),
            "potion" => Some(Self::Potion),
            _ => None,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Coin => "coin",
            Self::Key => "key",
            Self::Potion => "potion",
        }
    }
}

/// What picking the item up does. A key of an unknown kind does nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ItemEffect {
    Score(u32),
    Key(Option<KeyKind>),
    Heal(i32),
}

impl ItemEffect {
    pub(crate) fn kind(self) -> ItemKind {
        match self {
            Self::Score(_) => ItemKind::Coin,
            Self::Key(_) => ItemKind::Key,
            Self::Heal(_) => ItemKind::Potion,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Collectible {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) effect: ItemEffect,
    pub(crate) frames: usize,
    pub(crate) frame_index: usize,
    pub(crate) collected: bool,
    animation_timer: f32,
}

impl Collectible {
    pub(crate) fn new(x: f32, y: f32, effect: ItemEffect, frames: usize) -> Self {
        Self {
            x,
            y,
            effect,
            frames: frames.max(1),
            frame_index: 0,
            collected: false,
            animation_timer: 0.0,
        }
    }

    pub(crate) fn kind(&self) -> ItemKind {
        self.effect.kind()
    }

    pub(crate) fn rect(&self) -> PixelRect {
        PixelRect::from_world(
            self.x,
            self.y,
            INTERACTABLE_SIZE as f32,
            INTERACTABLE_SIZE as f32,
        )
    }

    pub(crate) fn update(&mut self, dt_seconds: f32) {
        self.animation_timer += dt_seconds;
        if self.animation_timer >= COLLECTIBLE_FRAME_SECONDS {
            self.animation_timer = 0.0;
            self.frame_index = (self.frame_index + 1) % self.frames;
        }
    }

    /// Applies the effect once; later calls are ignored.
    pub(crate) fn collect(&mut self, player: &mut Player, events: &mut GameEventBus) {
        if self.collected {
            return;
        }
        match self.effect {
            ItemEffect::Score(value) => player.score += value,
            ItemEffect::Key(Some(kind)) => player.add_keys(kind, 1),
            ItemEffect::Key(None) => {}
            ItemEffect::Heal(amount) => player.heal(amount),
        }
        self.collected = true;
        events.emit(GameEvent::ItemCollected { kind: self.kind() });
    }
}
