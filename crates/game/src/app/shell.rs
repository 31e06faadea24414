use std::path::Path;

use maze_engine::{AppPaths, DrawList, InputSnapshot, Scene, SceneCommand};
use tracing::info;

use super::audio::{AudioService, SoundCue, MENU_MUSIC_VOLUME};
use super::gameplay::{build_frame, Game, GameOptions, MenuOutcome};
use super::menu::{MainMenus, MenuAction};
use super::settings::GameSettings;

/// Top-level scene: the main menus until a level starts, then the game.
pub(crate) struct MazeScene {
    paths: AppPaths,
    settings: GameSettings,
    menus: MainMenus,
    game: Option<Game>,
    audio: Box<dyn AudioService>,
}

impl MazeScene {
    pub(crate) fn new(
        paths: AppPaths,
        settings: GameSettings,
        mut audio: Box<dyn AudioService>,
    ) -> Self {
        audio.set_muted(settings.muted);
        let menus = MainMenus::new(
            settings.start_level.clone(),
            settings.levels.clone(),
            audio.is_muted(),
        );
        Self {
            paths,
            settings,
            menus,
            game: None,
            audio,
        }
    }

    pub(crate) fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    fn game_options(&self) -> GameOptions {
        GameOptions {
            viewport_width: self.settings.window_width,
            viewport_height: self.settings.window_height,
            camera_zoom: self.settings.camera_zoom,
            rng_seed: self.settings.rng_seed,
        }
    }

    fn start_game(&mut self, level: &Path) {
        info!(level = %level.display(), "game_started");
        self.audio.stop_music();
        self.game = Some(Game::new(self.paths.clone(), level, self.game_options()));
    }

    fn return_to_menu(&mut self) {
        info!("returned_to_main_menu");
        self.game = None;
        self.menus.show_main();
        self.audio
            .play_music(SoundCue::DungeonMusic, MENU_MUSIC_VOLUME);
    }

    fn update_menus(&mut self, input: &InputSnapshot) -> SceneCommand {
        match self.menus.handle_input(input) {
            MenuAction::StartLevel(level) => self.start_game(&level),
            MenuAction::ToggleMute => {
                let muted = self.audio.toggle_mute();
                self.menus.set_muted(muted);
            }
            MenuAction::Quit => return SceneCommand::Quit,
            MenuAction::None => {}
        }
        SceneCommand::None
    }
}

impl Scene for MazeScene {
    fn load(&mut self) {
        self.audio.init();
        self.audio
            .play_music(SoundCue::DungeonMusic, MENU_MUSIC_VOLUME);
        info!(
            root = %self.paths.root.display(),
            levels = self.settings.levels.len(),
            "scene_loaded"
        );
    }

    fn update(&mut self, dt_seconds: f32, input: &InputSnapshot) -> SceneCommand {
        if input.quit_requested() {
            return SceneCommand::Quit;
        }
        let Some(game) = self.game.as_mut() else {
            return self.update_menus(input);
        };

        let outcome = game.handle_input(input);
        game.update(dt_seconds, input);
        for event in game.drain_events() {
            self.audio.play_event(&event);
        }
        match outcome {
            MenuOutcome::None => SceneCommand::None,
            MenuOutcome::ExitToMainMenu => {
                self.return_to_menu();
                SceneCommand::None
            }
            MenuOutcome::Quit => SceneCommand::Quit,
        }
    }

    fn render(&mut self, draw_list: &mut DrawList) {
        match self.game.as_ref() {
            Some(game) => build_frame(game, draw_list),
            None => self.menus.render(
                draw_list,
                self.settings.window_width as i32,
                self.settings.window_height as i32,
            ),
        }
    }

    fn unload(&mut self) {
        self.game = None;
        self.audio.shutdown();
        info!("scene_unloaded");
    }

    fn debug_title(&self) -> Option<String> {
        let game = self.game.as_ref()?;
        let player = game.player();
        Some(format!(
            "{} | {} | HP {}/{} | Score {}",
            self.settings.window_title,
            game.level().path.display(),
            player.hp,
            player.max_hp,
            player.score
        ))
    }
}

#[cfg(test)]
mod tests {
    use maze_engine::InputAction;

    use super::*;
    use crate::app::audio::NoopAudio;

    fn scene() -> (tempfile::TempDir, MazeScene) {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = GameSettings {
            rng_seed: Some(1),
            ..GameSettings::default()
        };
        let mut scene = MazeScene::new(
            AppPaths::from_root(dir.path().to_path_buf()),
            settings,
            Box::new(NoopAudio::default()),
        );
        scene.load();
        (dir, scene)
    }

    fn pressed(action: InputAction) -> InputSnapshot {
        InputSnapshot::empty().with_action_pressed(action)
    }

    #[test]
    fn start_then_exit_to_menu() {
        let (_dir, mut scene) = scene();
        assert_eq!(
            scene.update(1.0 / 60.0, &pressed(InputAction::Confirm)),
            SceneCommand::None
        );
        assert!(scene.game().is_some());
        assert!(scene.debug_title().is_some());

        scene.update(1.0 / 60.0, &pressed(InputAction::Pause));
        assert!(scene.game().map(Game::is_paused).unwrap_or(false));
        scene.update(1.0 / 60.0, &pressed(InputAction::MoveDown));
        scene.update(1.0 / 60.0, &pressed(InputAction::MoveDown));
        scene.update(1.0 / 60.0, &pressed(InputAction::Confirm));
        assert!(scene.game().is_none());
        assert!(scene.debug_title().is_none());
    }

    #[test]
    fn mute_toggle_updates_audio_and_label() {
        let (_dir, mut scene) = scene();
        for _ in 0..3 {
            scene.update(1.0 / 60.0, &pressed(InputAction::MoveDown));
        }
        scene.update(1.0 / 60.0, &pressed(InputAction::Confirm));
        assert!(scene.audio.is_muted());
    }

    #[test]
    fn quit_paths_end_the_scene() {
        let (_dir, mut scene) = scene();
        assert_eq!(
            scene.update(0.0, &InputSnapshot::empty().with_quit_requested(true)),
            SceneCommand::Quit
        );
        scene.update(0.0, &pressed(InputAction::MoveUp));
        assert_eq!(
            scene.update(0.0, &pressed(InputAction::Confirm)),
            SceneCommand::Quit
        );
    }

    #[test]
    fn menu_renders_without_a_game() {
        let (_dir, mut scene) = scene();
        let mut draw_list = DrawList::new();
        scene.render(&mut draw_list);
        assert!(!draw_list.is_empty());
    }
}
