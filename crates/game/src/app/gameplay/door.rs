use std::collections::HashMap;

use maze_engine::{PixelRect, Vec2};
use tracing::{debug, info};

use super::events::{GameEvent, GameEventBus};
use super::player::{KeyKind, Player};
use super::{DOOR_PAIR_DISTANCE, INTERACTABLE_SIZE, INTERACTION_MARGIN, MESSAGE_SECONDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct DoorId(pub(crate) usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DoorOrientation {
    Left,
    Right,
}

impl DoorOrientation {
    pub(crate) fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("right") {
            Self::Right
        } else {
            Self::Left
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct DoorMessage {
    text: String,
    opened: bool,
    remaining_seconds: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Door {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) required_key: KeyKind,
    pub(crate) key_count: u32,
    pub(crate) orientation: DoorOrientation,
    pub(crate) gid: u32,
    pub(crate) is_open: bool,
    message: Option<DoorMessage>,
}

impl Door {
    pub(crate) fn new(
        x: f32,
        y: f32,
        required_key: KeyKind,
        key_count: u32,
        orientation: DoorOrientation,
        gid: u32,
    ) -> Self {
        Self {
            x,
            y,
            required_key,
            key_count,
            orientation,
            gid,
            is_open: false,
            message: None,
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

    /// Active message text and whether it reports a successful open.
    pub(crate) fn message(&self) -> Option<(&str, bool)> {
        self.message
            .as_ref()
            .map(|message| (message.text.as_str(), message.opened))
    }

    fn show_message(&mut self, text: String, opened: bool) {
        self.message = Some(DoorMessage {
            text,
            opened,
            remaining_seconds: MESSAGE_SECONDS,
        });
    }

    fn update(&mut self, dt_seconds: f32) {
        if let Some(message) = self.message.as_mut() {
            message.remaining_seconds -= dt_seconds;
            if message.remaining_seconds <= 0.0 {
                self.message = None;
            }
        }
    }

    fn open(&mut self) {
        self.is_open = true;
        self.show_message("Door Opened!".to_string(), true);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DoorAttempt {
    AlreadyOpen,
    Opened,
    Locked,
}

/// Doors of one level plus the pairing relation between double doors.
#[derive(Debug, Clone, Default)]
pub(crate) struct DoorSet {
    doors: Vec<Door>,
    pairs: HashMap<DoorId, DoorId>,
}

impl DoorSet {
    pub(crate) fn new(doors: Vec<Door>) -> Self {
        let mut set = Self {
            doors,
            pairs: HashMap::new(),
        };
        set.pair_adjacent();
        set
    }

    /// Each unpaired left door takes the first unpaired right door with the
    /// same key that sits closer than the pairing distance.
    fn pair_adjacent(&mut self) {
        for index in 0..self.doors.len() {
            let id = DoorId(index);
            let door = &self.doors[index];
            if self.pairs.contains_key(&id) || door.orientation != DoorOrientation::Left {
                continue;
            }
            let origin = Vec2::new(door.x, door.y);
            let partner = self.doors.iter().enumerate().position(|(other, candidate)| {
                other != index
                    && candidate.orientation == DoorOrientation::Right
                    && !self.pairs.contains_key(&DoorId(other))
                    && candidate.required_key == door.required_key
                    && origin.distance(Vec2::new(candidate.x, candidate.y)) < DOOR_PAIR_DISTANCE
            });
            if let Some(other) = partner {
                self.pairs.insert(id, DoorId(other));
                self.pairs.insert(DoorId(other), id);
                debug!(
                    left = index,
                    right = other,
                    key = door.required_key.name(),
                    "doors_paired"
                );
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.doors.len()
    }

    pub(crate) fn get(&self, id: DoorId) -> Option<&Door> {
        self.doors.get(id.0)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (DoorId, &Door)> {
        self.doors
            .iter()
            .enumerate()
            .map(|(index, door)| (DoorId(index), door))
    }

    pub(crate) fn paired_with(&self, id: DoorId) -> Option<DoorId> {
        self.pairs.get(&id).copied()
    }

    /// Closed doors overlapping `rect` block movement.
    pub(crate) fn blocks(&self, rect: PixelRect) -> bool {
        self.doors
            .iter()
            .any(|door| !door.is_open && door.rect().overlaps(&rect))
    }

    pub(crate) fn update(&mut self, dt_seconds: f32) {
        for door in &mut self.doors {
            door.update(dt_seconds);
        }
    }

    /// Doors whose interaction area overlaps `rect`, in level order.
    pub(crate) fn in_reach(&self, rect: PixelRect) -> Vec<DoorId> {
        self.iter()
            .filter(|(_, door)| door.interaction_rect().overlaps(&rect))
            .map(|(id, _)| id)
            .collect()
    }

    pub(crate) fn try_open(
        &mut self,
        id: DoorId,
        player: &mut Player,
        events: &mut GameEventBus,
    ) -> DoorAttempt {
        let Some(door) = self.doors.get_mut(id.0) else {
            return DoorAttempt::Locked;
        };
        if door.is_open {
            return DoorAttempt::AlreadyOpen;
        }
        if !player.remove_keys(door.required_key, door.key_count) {
            let text = format!(
                "Need {} {} keys",
                door.key_count,
                door.required_key.name()
            );
            door.show_message(text, false);
            return DoorAttempt::Locked;
        }

        door.open();
        info!(
            door = id.0,
            key = door.required_key.name(),
            count = door.key_count,
            "door_opened"
        );
        let paired = self.paired_with(id);
        if let Some(pair) = paired.and_then(|pair| self.doors.get_mut(pair.0)) {
            if !pair.is_open {
                pair.open();
            }
        }
        events.emit(GameEvent::DoorOpened { door: id, paired });
        DoorAttempt::Opened
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn door(x: f32, key: KeyKind, count: u32, orientation: DoorOrientation) -> Door {
        Door::new(x, 32.0, key, count, orientation, 67)
    }

    #[test]
    fn adjacent_left_right_doors_pair_up() {
        let set = DoorSet::new(vec![
            door(32.0, KeyKind::Silver, 1, DoorOrientation::Left),
            door(48.0, KeyKind::Silver, 1, DoorOrientation::Right),
            door(64.0, KeyKind::Silver, 1, DoorOrientation::Right),
        ]);
        assert_eq!(set.paired_with(DoorId(0)), Some(DoorId(1)));
        assert_eq!(set.paired_with(DoorId(1)), Some(DoorId(0)));
        assert_eq!(set.paired_with(DoorId(2)), None);
    }

    #[test]
    fn pairing_requires_same_key_and_distance() {
        let set = DoorSet::new(vec![
            door(32.0, KeyKind::Silver, 1, DoorOrientation::Left),
            door(48.0, KeyKind::Golden, 1, DoorOrientation::Right),
            door(100.0, KeyKind::Silver, 1, DoorOrientation::Right),
        ]);
        assert_eq!(set.paired_with(DoorId(0)), None);
    }

    #[test]
    fn locked_door_shows_requirement_and_keeps_keys() {
        let mut set = DoorSet::new(vec![door(32.0, KeyKind::Golden, 2, DoorOrientation::Left)]);
        let mut player = Player::new(0.0, 0.0);
        player.add_keys(KeyKind::Golden, 1);
        let mut events = GameEventBus::default();

        let attempt = set.try_open(DoorId(0), &mut player, &mut events);

        assert_eq!(attempt, DoorAttempt::Locked);
        let door = set.get(DoorId(0)).expect("door");
        assert!(!door.is_open);
        assert_eq!(door.message(), Some(("Need 2 golden keys", false)));
        assert_eq!(player.inventory.count(KeyKind::Golden), 1);
        assert_eq!(events.iter_emitted_so_far().count(), 0);
    }

    #[test]
    fn opening_spends_keys_once_and_opens_pair() {
        let mut set = DoorSet::new(vec![
            door(32.0, KeyKind::Golden, 2, DoorOrientation::Left),
            door(48.0, KeyKind::Golden, 2, DoorOrientation::Right),
        ]);
        let mut player = Player::new(0.0, 0.0);
        player.add_keys(KeyKind::Golden, 3);
        let mut events = GameEventBus::default();

        assert_eq!(
            set.try_open(DoorId(0), &mut player, &mut events),
            DoorAttempt::Opened
        );
        assert_eq!(player.inventory.count(KeyKind::Golden), 1);
        assert!(set.iter().all(|(_, door)| door.is_open));
        assert_eq!(
            set.try_open(DoorId(1), &mut player, &mut events),
            DoorAttempt::AlreadyOpen
        );
        assert_eq!(player.inventory.count(KeyKind::Golden), 1);
        assert_eq!(
            events.count_matching(|event| matches!(event, GameEvent::DoorOpened { .. })),
            1
        );
    }

    #[test]
    fn open_doors_stop_blocking() {
        let mut set = DoorSet::new(vec![door(32.0, KeyKind::Silver, 1, DoorOrientation::Left)]);
        let feet = PixelRect::new(30, 36, 10, 8);
        assert!(set.blocks(feet));
        let mut player = Player::new(0.0, 0.0);
        player.add_keys(KeyKind::Silver, 1);
        set.try_open(DoorId(0), &mut player, &mut GameEventBus::default());
        assert!(!set.blocks(feet));
    }

    #[test]
    fn messages_expire() {
        let mut set = DoorSet::new(vec![door(32.0, KeyKind::Silver, 1, DoorOrientation::Left)]);
        let mut player = Player::new(0.0, 0.0);
        set.try_open(DoorId(0), &mut player, &mut GameEventBus::default());
        set.update(1.5);
        assert!(set.get(DoorId(0)).and_then(Door::message).is_some());
        set.update(0.6);
        assert!(set.get(DoorId(0)).and_then(Door::message).is_none());
    }

    #[test]
    fn reach_uses_inflated_rect() {
        let set = DoorSet::new(vec![door(32.0, KeyKind::Silver, 1, DoorOrientation::Left)]);
        assert_eq!(set.in_reach(PixelRect::new(49, 32, 16, 24)), vec![DoorId(0)]);
        assert!(set.in_reach(PixelRect::new(53, 32, 16, 24)).is_empty());
    }
}
