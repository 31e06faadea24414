use std::path::PathBuf;

use maze_engine::PixelRect;

use super::events::{GameEvent, GameEventBus};
use super::{INTERACTABLE_SIZE, INTERACTION_MARGIN, LADDER_HINT_SECONDS, MESSAGE_SECONDS};

pub(crate) const LADDER_HINT: &str = "Press E to exit to next level";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Destination {
    Victory,
    Level(PathBuf),
}

/// Interprets a ladder's `destination` property. Returns `None` for values
/// that name neither the finish nor a `.tmx` file.
pub(crate) fn resolve_destination(raw: &str) -> Option<Destination> {
    let cleaned = raw
        .trim()
        .trim_matches(|ch| ch == '"' || ch == '\'')
        .trim();
    if cleaned.eq_ignore_ascii_case("finish") || cleaned.eq_ignore_ascii_case("victory") {
        return Some(Destination::Victory);
    }
    if !cleaned.to_ascii_lowercase().ends_with(".tmx") {
        return None;
    }
    if cleaned.contains('/') || cleaned.contains('\\') {
        Some(Destination::Level(PathBuf::from(cleaned)))
    } else {
        Some(Destination::Level(PathBuf::from("maps").join(cleaned)))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Ladder {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) destination: String,
    pub(crate) gid: u32,
    message_seconds: f32,
}

impl Ladder {
    pub(crate) fn new(x: f32, y: f32, destination: String, gid: u32) -> Self {
        Self {
            x,
            y,
            destination,
            gid,
            message_seconds: 0.0,
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

    pub(crate) fn interaction_rect(&self) -> PixelRect {
        self.rect().inflate(INTERACTION_MARGIN, INTERACTION_MARGIN)
    }

    pub(crate) fn update(&mut self, dt_seconds: f32) {
        self.message_seconds = (self.message_seconds - dt_seconds).max(0.0);
    }

    /// Keeps the hint up while the player stands in reach.
    pub(crate) fn arm_hint(&mut self) {
        self.message_seconds = self.message_seconds.max(LADDER_HINT_SECONDS);
    }

    pub(crate) fn message(&self) -> Option<&'static str> {
        (self.message_seconds > 0.0).then_some(LADDER_HINT)
    }

    pub(crate) fn interact(&mut self, events: &mut GameEventBus) -> Option<Destination> {
        self.message_seconds = MESSAGE_SECONDS;
        events.emit(GameEvent::StageComplete);
        resolve_destination(&self.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_file_names_resolve_under_maps() {
        assert_eq!(
            resolve_destination(" \"level2.tmx\" "),
            Some(Destination::Level(PathBuf::from("maps/level2.tmx")))
        );
        assert_eq!(
            resolve_destination("custom/Level3.TMX"),
            Some(Destination::Level(PathBuf::from("custom/Level3.TMX")))
        );
    }

    #[test]
    fn finish_words_mean_victory() {
        assert_eq!(resolve_destination("Finish"), Some(Destination::Victory));
        assert_eq!(resolve_destination("'VICTORY'"), Some(Destination::Victory));
    }

    #[test]
    fn other_destinations_are_ignored() {
        assert_eq!(resolve_destination("level2"), None);
        assert_eq!(resolve_destination(""), None);
    }

    #[test]
    fn hint_lasts_while_armed() {
        let mut ladder = Ladder::new(0.0, 0.0, "level2.tmx".to_string(), 40);
        assert_eq!(ladder.message(), None);
        ladder.arm_hint();
        assert_eq!(ladder.message(), Some(LADDER_HINT));
        ladder.update(0.2);
        assert_eq!(ladder.message(), None);
    }

    #[test]
    fn interact_emits_stage_complete() {
        let mut ladder = Ladder::new(0.0, 0.0, "finish".to_string(), 40);
        let mut events = GameEventBus::default();
        assert_eq!(ladder.interact(&mut events), Some(Destination::Victory));
        assert_eq!(
            events.count_matching(|event| *event == GameEvent::StageComplete),
            1
        );
        ladder.update(1.9);
        assert!(ladder.message().is_some());
    }
}
