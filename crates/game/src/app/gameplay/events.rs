use std::path::PathBuf;

use super::collectible::ItemKind;
use super::door::DoorId;
use super::enemy::Species;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum GameEvent {
    AttackStarted,
    ItemCollected { kind: ItemKind },
    DoorOpened { door: DoorId, paired: Option<DoorId> },
    PlayerHit { damage: i32 },
    EnemyDied { species: Species },
    PlayerDied,
    StageComplete,
    LevelChanged { path: PathBuf },
    Victory,
}

/// Events raised during one frame. The shell drains it after every update.
#[derive(Debug, Default)]
pub(crate) struct GameEventBus {
    current_frame_events: Vec<GameEvent>,
}

impl GameEventBus {
    pub(crate) fn emit(&mut self, event: GameEvent) {
        self.current_frame_events.push(event);
    }

    #[cfg(test)]
    pub(crate) fn iter_emitted_so_far(&self) -> impl Iterator<Item = &GameEvent> {
        self.current_frame_events.iter()
    }

    pub(crate) fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.current_frame_events)
    }

    #[cfg(test)]
    pub(crate) fn count_matching(&self, predicate: impl Fn(&GameEvent) -> bool) -> usize {
        self.current_frame_events
            .iter()
            .filter(|event| predicate(event))
            .count()
    }
}
