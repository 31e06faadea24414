use std::path::PathBuf;

use maze_engine::{Color, DrawCommand, DrawList, InputAction, InputSnapshot, PixelRect};

const TITLE_SCALE: i32 = 6;
const OPTION_SCALE: i32 = 3;
const HINT_SCALE: i32 = 2;
const OPTION_SPACING: i32 = 44;
const SELECTED_COLOR: Color = Color::rgb(255, 215, 0);
const OPTION_COLOR: Color = Color::rgb(220, 220, 220);
const HINT_COLOR: Color = Color::rgb(200, 200, 200);
pub(crate) const NAVIGATION_HINT: &str = "Use W/S or Up/Down, Enter/Space to select";

const INSTRUCTION_LINES: [&str; 14] = [
    "Goal: Find the exit ladder and escape the maze.",
    "Avoid enemies or defeat them when needed.",
    "",
    "Controls:",
    "- Move: W/A/S/D or Arrow Keys",
    "- Attack: Space",
    "- Interact / Use: E",
    "- Pause / Exit to Menu: Esc",
    "",
    "Tips:",
    "- Watch your health. Use potions when you find them.",
    "- Coins are for score. Pick them up!",
    "- Some traps are subtle. Move carefully.",
    "- Sound cues can warn you about threats.",
];

/// Vertical option list with wrap-around selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MenuList {
    options: Vec<String>,
    index: usize,
}

impl MenuList {
    pub(crate) fn new<S: Into<String>>(options: impl IntoIterator<Item = S>) -> Self {
        Self {
            options: options.into_iter().map(Into::into).collect(),
            index: 0,
        }
    }

    pub(crate) fn options(&self) -> &[String] {
        &self.options
    }

    #[cfg(test)]
    pub(crate) fn index(&self) -> usize {
        self.index
    }

    #[cfg(test)]
    pub(crate) fn selected(&self) -> Option<&str> {
        self.options.get(self.index).map(String::as_str)
    }

    pub(crate) fn reset(&mut self) {
        self.index = 0;
    }

    pub(crate) fn move_up(&mut self) {
        if !self.options.is_empty() {
            self.index = (self.index + self.options.len() - 1) % self.options.len();
        }
    }

    pub(crate) fn move_down(&mut self) {
        if !self.options.is_empty() {
            self.index = (self.index + 1) % self.options.len();
        }
    }

    pub(crate) fn set_label(&mut self, index: usize, label: impl Into<String>) {
        if let Some(option) = self.options.get_mut(index) {
            *option = label.into();
        }
    }

    /// Applies up/down navigation and returns the index confirmed this frame.
    pub(crate) fn handle_input(&mut self, input: &InputSnapshot) -> Option<usize> {
        if input.was_pressed(InputAction::MoveUp) {
            self.move_up();
        } else if input.was_pressed(InputAction::MoveDown) {
            self.move_down();
        } else if input.was_pressed(InputAction::Confirm) && !self.options.is_empty() {
            return Some(self.index);
        }
        None
    }

    /// Draws the options centered on `center_x`, one every `spacing` pixels.
    pub(crate) fn render(&self, draw_list: &mut DrawList, center_x: i32, top: i32, spacing: i32) {
        for (index, option) in self.options.iter().enumerate() {
            let selected = index == self.index;
            let prefix = if selected { "> " } else { "  " };
            let color = if selected { SELECTED_COLOR } else { OPTION_COLOR };
            draw_list.text_centered(
                format!("{prefix}{option}"),
                center_x,
                top + index as i32 * spacing,
                OPTION_SCALE,
                color,
            );
        }
    }
}

fn mute_label(muted: bool) -> String {
    format!("Mute: {}", if muted { "ON" } else { "OFF" })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MenuScreen {
    Main,
    LevelSelect,
    Instructions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MenuAction {
    None,
    StartLevel(PathBuf),
    ToggleMute,
    Quit,
}

const MAIN_START: usize = 0;
const MAIN_LEVEL_SELECT: usize = 1;
const MAIN_INSTRUCTIONS: usize = 2;
const MAIN_MUTE: usize = 3;
const MAIN_QUIT: usize = 4;

/// Title screen, level select and instructions.
#[derive(Debug, Clone)]
pub(crate) struct MainMenus {
    screen: MenuScreen,
    start_level: PathBuf,
    levels: Vec<PathBuf>,
    main: MenuList,
    level_select: MenuList,
    instructions: MenuList,
}

impl MainMenus {
    pub(crate) fn new(start_level: PathBuf, levels: Vec<PathBuf>, muted: bool) -> Self {
        let main = MenuList::new([
            "Start Game (Level 1)".to_string(),
            "Level Select".to_string(),
            "Instructions".to_string(),
            mute_label(muted),
            "Quit".to_string(),
        ]);
        let level_select = MenuList::new(
            levels
                .iter()
                .map(|level| level.display().to_string())
                .chain(std::iter::once("Back".to_string())),
        );
        Self {
            screen: MenuScreen::Main,
            start_level,
            levels,
            main,
            level_select,
            instructions: MenuList::new(["Back"]),
        }
    }

    #[cfg(test)]
    pub(crate) fn screen(&self) -> MenuScreen {
        self.screen
    }

    pub(crate) fn show_main(&mut self) {
        self.screen = MenuScreen::Main;
    }

    pub(crate) fn set_muted(&mut self, muted: bool) {
        self.main.set_label(MAIN_MUTE, mute_label(muted));
    }

    fn active_list(&self) -> &MenuList {
        match self.screen {
            MenuScreen::Main => &self.main,
            MenuScreen::LevelSelect => &self.level_select,
            MenuScreen::Instructions => &self.instructions,
        }
    }

    pub(crate) fn handle_input(&mut self, input: &InputSnapshot) -> MenuAction {
        match self.screen {
            MenuScreen::Main => match self.main.handle_input(input) {
                Some(MAIN_START) => MenuAction::StartLevel(self.start_level.clone()),
                Some(MAIN_LEVEL_SELECT) => {
                    self.screen = MenuScreen::LevelSelect;
                    MenuAction::None
                }
                Some(MAIN_INSTRUCTIONS) => {
                    self.screen = MenuScreen::Instructions;
                    MenuAction::None
                }
                Some(MAIN_MUTE) => MenuAction::ToggleMute,
                Some(MAIN_QUIT) => MenuAction::Quit,
                _ => MenuAction::None,
            },
            MenuScreen::LevelSelect => match self.level_select.handle_input(input) {
                Some(index) => match self.levels.get(index) {
                    Some(level) => MenuAction::StartLevel(level.clone()),
                    None => {
                        self.screen = MenuScreen::Main;
                        MenuAction::None
                    }
                },
                None => MenuAction::None,
            },
            MenuScreen::Instructions => {
                if input.was_pressed(InputAction::Back)
                    || self.instructions.handle_input(input).is_some()
                {
                    self.screen = MenuScreen::Main;
                }
                MenuAction::None
            }
        }
    }

    pub(crate) fn render(&self, draw_list: &mut DrawList, width: i32, height: i32) {
        draw_list.push(DrawCommand::VerticalGradient {
            rect: PixelRect::new(0, 0, width, height),
            top: Color::rgb(24, 18, 34),
            bottom: Color::rgb(6, 4, 10),
        });
        let center_x = width / 2;
        match self.screen {
            MenuScreen::Main | MenuScreen::LevelSelect => {
                let title = if self.screen == MenuScreen::Main {
                    "Escape The Maze"
                } else {
                    "Select Level"
                };
                draw_list.text_centered(title, center_x, height / 2 - 180, TITLE_SCALE, Color::WHITE);
                self.active_list()
                    .render(draw_list, center_x, height / 2 - 60, OPTION_SPACING);
                draw_list.text_centered(NAVIGATION_HINT, center_x, height - 40, HINT_SCALE, HINT_COLOR);
            }
            MenuScreen::Instructions => {
                draw_list.text_centered("Instructions", center_x, 80, TITLE_SCALE, Color::WHITE);
                for (line_index, line) in INSTRUCTION_LINES.iter().enumerate() {
                    let color = if line.ends_with(':') {
                        SELECTED_COLOR
                    } else {
                        Color::rgb(230, 230, 230)
                    };
                    draw_list.text(*line, 120, 150 + line_index as i32 * 30, HINT_SCALE, color);
                }
                draw_list.text_centered(
                    "> Back",
                    center_x,
                    height - 100,
                    OPTION_SCALE,
                    SELECTED_COLOR,
                );
                draw_list.text_centered(
                    "Press Esc to go Back or select: Back",
                    center_x,
                    height - 60,
                    HINT_SCALE,
                    HINT_COLOR,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pressed(action: InputAction) -> InputSnapshot {
        InputSnapshot::empty().with_action_pressed(action)
    }

    fn menus() -> MainMenus {
        MainMenus::new(
            PathBuf::from("maps/level1.tmx"),
            vec![PathBuf::from("maps/level1.tmx"), PathBuf::from("maps/level2.tmx")],
            false,
        )
    }

    #[test]
    fn selection_wraps_both_ways() {
        let mut list = MenuList::new(["Resume", "Retry", "Quit"]);
        list.handle_input(&pressed(InputAction::MoveUp));
        assert_eq!(list.selected(), Some("Quit"));
        list.handle_input(&pressed(InputAction::MoveDown));
        assert_eq!(list.index(), 0);
        assert_eq!(list.handle_input(&pressed(InputAction::Confirm)), Some(0));
    }

    #[test]
    fn start_game_uses_start_level() {
        let mut menus = menus();
        assert_eq!(
            menus.handle_input(&pressed(InputAction::Confirm)),
            MenuAction::StartLevel(PathBuf::from("maps/level1.tmx"))
        );
    }

    #[test]
    fn level_select_lists_levels_then_back() {
        let mut menus = menus();
        menus.handle_input(&pressed(InputAction::MoveDown));
        menus.handle_input(&pressed(InputAction::Confirm));
        assert_eq!(menus.screen(), MenuScreen::LevelSelect);
        assert_eq!(menus.level_select.options().len(), 3);

        menus.handle_input(&pressed(InputAction::MoveDown));
        assert_eq!(
            menus.handle_input(&pressed(InputAction::Confirm)),
            MenuAction::StartLevel(PathBuf::from("maps/level2.tmx"))
        );

        menus.handle_input(&pressed(InputAction::MoveDown));
        assert_eq!(
            menus.handle_input(&pressed(InputAction::Confirm)),
            MenuAction::None
        );
        assert_eq!(menus.screen(), MenuScreen::Main);
    }

    #[test]
    fn instructions_close_on_back() {
        let mut menus = menus();
        menus.handle_input(&pressed(InputAction::MoveDown));
        menus.handle_input(&pressed(InputAction::MoveDown));
        menus.handle_input(&pressed(InputAction::Confirm));
        assert_eq!(menus.screen(), MenuScreen::Instructions);
        menus.handle_input(&pressed(InputAction::Back));
        assert_eq!(menus.screen(), MenuScreen::Main);
    }

    #[test]
    fn mute_label_tracks_state() {
        let mut menus = menus();
        assert_eq!(menus.main.options()[MAIN_MUTE], "Mute: OFF");
        menus.set_muted(true);
        assert_eq!(menus.main.options()[MAIN_MUTE], "Mute: ON");
        menus.main.move_up();
        menus.main.move_up();
        assert_eq!(
            menus.handle_input(&pressed(InputAction::Confirm)),
            MenuAction::ToggleMute
        );
    }
}
