#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Attack,
    Interact,
    Pause,
    Confirm,
    Back,
    CheatSilverKeys,
    CheatGoldenKeys,
    CheatHeal,
    CheatInvincible,
    CheatKillEnemies,
    CheatTeleport,
}

const ACTION_COUNT: usize = 15;

/// Held state plus the press edges collected since the previous tick.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
    pressed: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        let index = action.index();
        if is_down && !self.down[index] {
            self.pressed[index] = true;
        }
        self.down[index] = is_down;
    }

    pub(crate) fn mark_pressed(&mut self, action: InputAction) {
        self.pressed[action.index()] = true;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    pub(crate) fn was_pressed(&self, action: InputAction) -> bool {
        self.pressed[action.index()]
    }

    pub(crate) fn clear_edges(&mut self) {
        self.pressed = [false; ACTION_COUNT];
    }
}

impl InputAction {
    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
            InputAction::Attack => 4,
            InputAction::Interact => 5,
            InputAction::Pause => 6,
            InputAction::Confirm => 7,
            InputAction::Back => 8,
            InputAction::CheatSilverKeys => 9,
            InputAction::CheatGoldenKeys => 10,
            InputAction::CheatHeal => 11,
            InputAction::CheatInvincible => 12,
            InputAction::CheatKillEnemies => 13,
            InputAction::CheatTeleport => 14,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_edge_fires_once_per_transition() {
        let mut states = ActionStates::default();
        states.set(InputAction::Attack, true);
        assert!(states.was_pressed(InputAction::Attack));
        states.clear_edges();
        states.set(InputAction::Attack, true);
        assert!(states.is_down(InputAction::Attack));
        assert!(!states.was_pressed(InputAction::Attack));
        states.set(InputAction::Attack, false);
        states.set(InputAction::Attack, true);
        assert!(states.was_pressed(InputAction::Attack));
    }
}
