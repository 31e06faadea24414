use super::input::{ActionStates, InputAction};
use super::rendering::DrawList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

/// Input state handed to a scene once per frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputSnapshot {
    quit_requested: bool,
    actions: ActionStates,
    window_width: u32,
    window_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn new(
        quit_requested: bool,
        actions: ActionStates,
        window_width: u32,
        window_height: u32,
    ) -> Self {
        Self {
            quit_requested,
            actions,
            window_width,
            window_height,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Held this frame.
    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    /// Went down since the previous frame.
    pub fn was_pressed(&self, action: InputAction) -> bool {
        self.actions.was_pressed(action)
    }

    pub fn with_action_down(mut self, action: InputAction, is_down: bool) -> Self {
        self.actions.set(action, is_down);
        self
    }

    /// Marks a press edge without changing the held state.
    pub fn with_action_pressed(mut self, action: InputAction) -> Self {
        self.actions.mark_pressed(action);
        self
    }

    pub fn with_quit_requested(mut self, quit_requested: bool) -> Self {
        self.quit_requested = quit_requested;
        self
    }

    pub fn with_window_size(mut self, window_size: (u32, u32)) -> Self {
        self.window_width = window_size.0;
        self.window_height = window_size.1;
        self
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }
}

pub trait Scene {
    fn load(&mut self);
    fn update(&mut self, dt_seconds: f32, input: &InputSnapshot) -> SceneCommand;
    fn render(&mut self, draw_list: &mut DrawList);
    fn unload(&mut self);
    fn debug_title(&self) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_action_down_records_press_edge() {
        let input = InputSnapshot::empty().with_action_down(InputAction::Interact, true);
        assert!(input.is_down(InputAction::Interact));
        assert!(input.was_pressed(InputAction::Interact));
        assert!(!input.is_down(InputAction::Attack));
    }

    #[test]
    fn with_action_pressed_leaves_held_state() {
        let input = InputSnapshot::empty().with_action_pressed(InputAction::Confirm);
        assert!(input.was_pressed(InputAction::Confirm));
        assert!(!input.is_down(InputAction::Confirm));
    }
}
