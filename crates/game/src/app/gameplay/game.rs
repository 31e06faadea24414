use std::path::{Path, PathBuf};

use maze_engine::{AppPaths, Camera, InputAction, InputSnapshot, Vec2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use super::collectible::{ItemEffect, ItemKind};
use super::door::DoorSet;
use super::enemy::{Enemy, EnemyState, EnemyStrike, Species};
use super::events::{GameEvent, GameEventBus};
use super::fog::FogOfWar;
use super::ladder::{Destination, Ladder};
use super::level::Level;
use super::player::{Facing, KeyKind, MoveIntent, Player, PlayerState};
use super::trap::{HitTarget, TrapKind};
use super::{
    CHEAT_GOLDEN_KEYS, CHEAT_SILVER_KEYS, DEFAULT_SPAWN_X, DEFAULT_SPAWN_Y, FOG_INITIAL_RADIUS,
    FOG_LEVEL_RADIUS, INTERACTABLE_SIZE, PLAYER_HEIGHT, PLAYER_WIDTH, TELEPORT_LADDER_OFFSET_Y,
};
use crate::app::menu::MenuList;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StepPhase {
    Player,
    Enemies,
    Triggers,
    Combat,
    Cleanup,
    View,
}

impl StepPhase {
    #[cfg(test)]
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Player => "Player",
            Self::Enemies => "Enemies",
            Self::Triggers => "Triggers",
            Self::Combat => "Combat",
            Self::Cleanup => "Cleanup",
            Self::View => "View",
        }
    }
}

const STEP_ORDER: [StepPhase; 6] = [
    StepPhase::Player,
    StepPhase::Enemies,
    StepPhase::Triggers,
    StepPhase::Combat,
    StepPhase::Cleanup,
    StepPhase::View,
];

const PAUSE_RESUME: usize = 0;
const PAUSE_RETRY: usize = 1;
const PAUSE_MAIN_MENU: usize = 2;
const PAUSE_QUIT: usize = 3;
const GAME_OVER_RETRY: usize = 0;
const GAME_OVER_QUIT: usize = 1;
const VICTORY_MAIN_MENU: usize = 0;
const VICTORY_QUIT: usize = 1;

/// What the surrounding shell has to do after the game handled input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MenuOutcome {
    None,
    ExitToMainMenu,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct GameOptions {
    pub(crate) viewport_width: u32,
    pub(crate) viewport_height: u32,
    pub(crate) camera_zoom: f32,
    pub(crate) rng_seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum RenderKind {
    Door {
        gid: u32,
    },
    Ladder {
        gid: u32,
    },
    Trap {
        kind: TrapKind,
        frame: usize,
    },
    Collectible {
        kind: ItemKind,
        key: Option<KeyKind>,
        frame: usize,
    },
    Enemy {
        species: Species,
        state: EnemyState,
        frame: usize,
        facing_left: bool,
        hp: i32,
        max_hp: i32,
    },
    Player {
        state: PlayerState,
        facing: Facing,
        frame: usize,
    },
}

/// One drawable entity in world space, in draw order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RenderItem {
    pub(crate) kind: RenderKind,
    pub(crate) position: Vec2,
    pub(crate) size: Vec2,
}

pub(crate) struct Game {
    paths: AppPaths,
    options: GameOptions,
    level: Level,
    player: Player,
    camera: Camera,
    fog: FogOfWar,
    rng: StdRng,
    events: GameEventBus,
    paused: bool,
    game_over: bool,
    victory: bool,
    pause_menu: MenuList,
    game_over_menu: MenuList,
    victory_menu: MenuList,
    level_start_score: u32,
    level_start_hp: i32,
    level_clock: f32,
    pending_strikes: Vec<EnemyStrike>,
    #[cfg(test)]
    last_step_order: Vec<StepPhase>,
}

impl Game {
    /// Builds the game on `start_level`. An unreadable map is replaced by an
    /// empty walkable level so the session still starts.
    pub(crate) fn new(paths: AppPaths, start_level: &Path, options: GameOptions) -> Self {
        let mut rng = match options.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let resolved = paths.resolve(start_level);
        let level = match Level::load(start_level, &resolved, &mut rng) {
            Ok(level) => level,
            Err(error) => {
                warn!(
                    path = %resolved.display(),
                    error = %error,
                    "start_level_load_failed_using_empty_level"
                );
                Level::fallback(start_level.to_path_buf())
            }
        };
        Self::with_level(paths, level, options, rng)
    }

    pub(crate) fn with_level(
        paths: AppPaths,
        level: Level,
        options: GameOptions,
        rng: StdRng,
    ) -> Self {
        let spawn = spawn_point(&level);
        let player = Player::new(spawn.x, spawn.y);
        let (map_width, map_height) = level.pixel_size();
        let camera = Camera::new(
            options.viewport_width,
            options.viewport_height,
            map_width,
            map_height,
        )
        .with_zoom(options.camera_zoom);
        let mut game = Self {
            paths,
            options,
            fog: FogOfWar::new(map_width, map_height, FOG_INITIAL_RADIUS),
            level,
            level_start_score: player.score,
            level_start_hp: player.hp,
            player,
            camera,
            rng,
            events: GameEventBus::default(),
            paused: false,
            game_over: false,
            victory: false,
            pause_menu: MenuList::new(["Resume", "Retry", "Main Menu", "Quit"]),
            game_over_menu: MenuList::new(["Retry", "Quit"]),
            victory_menu: MenuList::new(["Main Menu", "Quit"]),
            level_clock: 0.0,
            pending_strikes: Vec::new(),
            #[cfg(test)]
            last_step_order: Vec::new(),
        };
        game.refresh_view();
        game
    }

    pub(crate) fn player(&self) -> &Player {
        &self.player
    }

    #[cfg(test)]
    pub(crate) fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    pub(crate) fn level(&self) -> &Level {
        &self.level
    }

    #[cfg(test)]
    pub(crate) fn level_mut(&mut self) -> &mut Level {
        &mut self.level
    }

    pub(crate) fn camera(&self) -> &Camera {
        &self.camera
    }

    pub(crate) fn fog(&self) -> &FogOfWar {
        &self.fog
    }

    pub(crate) fn is_paused(&self) -> bool {
        self.paused
    }

    pub(crate) fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub(crate) fn is_victory(&self) -> bool {
        self.victory
    }

    pub(crate) fn pause_menu(&self) -> &MenuList {
        &self.pause_menu
    }

    pub(crate) fn game_over_menu(&self) -> &MenuList {
        &self.game_over_menu
    }

    pub(crate) fn victory_menu(&self) -> &MenuList {
        &self.victory_menu
    }

    #[cfg(test)]
    pub(crate) fn level_start(&self) -> (u32, i32) {
        (self.level_start_score, self.level_start_hp)
    }

    #[cfg(test)]
    pub(crate) fn level_clock(&self) -> f32 {
        self.level_clock
    }

    #[cfg(test)]
    pub(crate) fn last_step_order(&self) -> &[StepPhase] {
        &self.last_step_order
    }

    pub(crate) fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }

    #[cfg(test)]
    pub(crate) fn events(&self) -> &GameEventBus {
        &self.events
    }

    /// Menu navigation, pause toggling, cheats and ladder interaction.
    pub(crate) fn handle_input(&mut self, input: &InputSnapshot) -> MenuOutcome {
        if self.victory {
            return match self.victory_menu.handle_input(input) {
                Some(VICTORY_MAIN_MENU) => {
                    self.victory = false;
                    MenuOutcome::ExitToMainMenu
                }
                Some(VICTORY_QUIT) => MenuOutcome::Quit,
                _ => MenuOutcome::None,
            };
        }

        if self.game_over {
            return match self.game_over_menu.handle_input(input) {
                Some(GAME_OVER_RETRY) => {
                    self.reload_level(true);
                    MenuOutcome::None
                }
                Some(GAME_OVER_QUIT) => MenuOutcome::Quit,
                _ => MenuOutcome::None,
            };
        }

        if input.was_pressed(InputAction::Pause) {
            self.paused = !self.paused;
            if self.paused {
                self.pause_menu.reset();
            }
        }

        if self.paused {
            return match self.pause_menu.handle_input(input) {
                Some(PAUSE_RESUME) => {
                    self.paused = false;
                    MenuOutcome::None
                }
                Some(PAUSE_RETRY) => {
                    self.reload_level(false);
                    MenuOutcome::None
                }
                Some(PAUSE_MAIN_MENU) => {
                    self.paused = false;
                    MenuOutcome::ExitToMainMenu
                }
                Some(PAUSE_QUIT) => MenuOutcome::Quit,
                _ => MenuOutcome::None,
            };
        }

        self.apply_cheats(input);

        if input.was_pressed(InputAction::Interact) {
            self.interact_with_ladder();
        }
        MenuOutcome::None
    }

    fn apply_cheats(&mut self, input: &InputSnapshot) {
        if input.was_pressed(InputAction::CheatSilverKeys) {
            self.player.add_keys(KeyKind::Silver, CHEAT_SILVER_KEYS);
            info!(count = CHEAT_SILVER_KEYS, "cheat_silver_keys");
        }
        if input.was_pressed(InputAction::CheatGoldenKeys) {
            self.player.add_keys(KeyKind::Golden, CHEAT_GOLDEN_KEYS);
            info!(count = CHEAT_GOLDEN_KEYS, "cheat_golden_keys");
        }
        if input.was_pressed(InputAction::CheatHeal) {
            self.player.heal_full();
            info!(hp = self.player.hp, "cheat_full_heal");
        }
        if input.was_pressed(InputAction::CheatInvincible) {
            let enabled = self.player.toggle_invincibility();
            info!(enabled, "cheat_invincibility");
        }
        if input.was_pressed(InputAction::CheatKillEnemies) {
            self.kill_all_enemies();
        }
        if input.was_pressed(InputAction::CheatTeleport) {
            self.teleport_to_exit();
        }
    }

    pub(crate) fn kill_all_enemies(&mut self) {
        let mut killed = 0;
        for enemy in self.level.enemies.iter_mut().filter(|enemy| enemy.is_alive()) {
            enemy.kill(&mut self.events);
            killed += 1;
        }
        info!(killed, "cheat_kill_enemies");
    }

    pub(crate) fn teleport_to_exit(&mut self) {
        let Some(ladder) = self.level.ladders.first() else {
            debug!("cheat_teleport_without_ladder");
            return;
        };
        let (x, y) = (ladder.x, ladder.y - TELEPORT_LADDER_OFFSET_Y);
        self.player.teleport(x, y);
        info!(x, y, "cheat_teleport");
    }

    /// Uses the first ladder in reach. Victory ends the run; a level
    /// destination loads that map.
    pub(crate) fn interact_with_ladder(&mut self) {
        let player_rect = self.player.bounds();
        let Some(ladder) = self
            .level
            .ladders
            .iter_mut()
            .find(|ladder| ladder.interaction_rect().overlaps(&player_rect))
        else {
            return;
        };
        match ladder.interact(&mut self.events) {
            Some(Destination::Victory) => {
                self.victory = true;
                self.victory_menu.reset();
                self.events.emit(GameEvent::Victory);
                info!(score = self.player.score, "victory");
            }
            Some(Destination::Level(path)) => {
                self.change_level(&path);
            }
            None => {
                debug!(destination = %ladder.destination, "ladder_destination_ignored");
            }
        }
    }

    /// Loads `path` and moves the player there. On failure the current level stays.
    pub(crate) fn change_level(&mut self, path: &Path) -> bool {
        let resolved = self.paths.resolve(path);
        let level = match Level::load(path, &resolved, &mut self.rng) {
            Ok(level) => level,
            Err(error) => {
                warn!(path = %resolved.display(), error = %error, "level_change_failed");
                return false;
            }
        };
        self.install_level(level);
        self.level_start_score = self.player.score;
        self.level_start_hp = self.player.hp;
        self.events.emit(GameEvent::LevelChanged {
            path: path.to_path_buf(),
        });
        info!(
            path = %path.display(),
            score = self.player.score,
            hp = self.player.hp,
            "level_changed"
        );
        true
    }

    /// Rebuilds the current level and restores the level-start baseline.
    /// `heal` restores full hp instead of the level-start hp.
    pub(crate) fn reload_level(&mut self, heal: bool) {
        let path = self.level.path.clone();
        let resolved = self.paths.resolve(&path);
        let level = match Level::load(&path, &resolved, &mut self.rng) {
            Ok(level) => level,
            Err(error) => {
                warn!(
                    path = %resolved.display(),
                    error = %error,
                    "level_reload_failed_rebuilding_from_memory"
                );
                Level::from_map(path.clone(), self.level.map.clone(), &mut self.rng)
            }
        };
        self.paused = false;
        self.game_over = false;
        self.victory = false;
        self.install_level(level);

        if heal {
            self.player.heal_full();
            self.level_start_hp = self.player.hp;
        } else {
            self.player.hp = self.level_start_hp.clamp(0, self.player.max_hp);
        }
        self.player.score = self.level_start_score;
        self.player.reset_transient_state();
        info!(
            path = %path.display(),
            heal,
            hp = self.player.hp,
            score = self.player.score,
            "level_reloaded"
        );
    }

    fn install_level(&mut self, level: Level) {
        self.player.inventory.clear();
        let spawn = spawn_point(&level);
        self.player.teleport(spawn.x, spawn.y);
        let (map_width, map_height) = level.pixel_size();
        self.camera = Camera::new(
            self.options.viewport_width,
            self.options.viewport_height,
            map_width,
            map_height,
        )
        .with_zoom(self.camera.zoom());
        self.fog = FogOfWar::new(map_width, map_height, FOG_LEVEL_RADIUS);
        self.level = level;
        self.level_clock = 0.0;
        self.pending_strikes.clear();
        self.refresh_view();
    }

    fn refresh_view(&mut self) {
        self.camera.follow(self.player.x, self.player.y);
        self.fog.update(self.player.position(), &self.camera);
    }

    /// Advances the simulation one frame. Does nothing while a menu is up.
    pub(crate) fn update(&mut self, dt_seconds: f32, input: &InputSnapshot) {
        if self.paused || self.game_over || self.victory {
            return;
        }
        self.level_clock += dt_seconds;
        #[cfg(test)]
        self.last_step_order.clear();
        for phase in STEP_ORDER {
            #[cfg(test)]
            self.last_step_order.push(phase);
            match phase {
                StepPhase::Player => self.step_player(dt_seconds, input),
                StepPhase::Enemies => self.step_enemies(dt_seconds),
                StepPhase::Triggers => self.step_triggers(dt_seconds),
                StepPhase::Combat => self.step_combat(),
                StepPhase::Cleanup => self.step_cleanup(),
                StepPhase::View => self.refresh_view(),
            }
        }
    }

    fn step_player(&mut self, dt_seconds: f32, input: &InputSnapshot) {
        let intent = MoveIntent::from_input(input);
        self.player.update(
            dt_seconds,
            intent,
            &self.level.grid,
            &self.level.doors,
            &mut self.events,
        );
    }

    fn step_enemies(&mut self, dt_seconds: f32) {
        let target = self.player.position();
        for enemy in &mut self.level.enemies {
            if let Some(strike) = enemy.update(dt_seconds, target, &self.level.grid, &mut self.rng)
            {
                self.pending_strikes.push(strike);
            }
        }
    }

    fn step_triggers(&mut self, dt_seconds: f32) {
        let player_rect = self.player.bounds();
        self.level.animator.update(dt_seconds);

        for collectible in &mut self.level.collectibles {
            collectible.update(dt_seconds);
            if !collectible.collected && collectible.rect().overlaps(&player_rect) {
                collectible.collect(&mut self.player, &mut self.events);
            }
        }

        let now = self.level_clock;
        for trap in &mut self.level.traps {
            trap.update(dt_seconds);
            if let Some(damage) = trap.check_hit(HitTarget::Player, player_rect, now) {
                if self.player.take_damage(damage) {
                    self.events.emit(GameEvent::PlayerHit { damage });
                }
            }
        }

        self.level.doors.update(dt_seconds);
        for id in self.level.doors.in_reach(player_rect) {
            self.level
                .doors
                .try_open(id, &mut self.player, &mut self.events);
        }

        for ladder in &mut self.level.ladders {
            ladder.update(dt_seconds);
            if ladder.interaction_rect().overlaps(&player_rect) {
                ladder.arm_hint();
            }
        }
    }

    fn step_combat(&mut self) {
        for strike in self.pending_strikes.drain(..) {
            if self.player.take_damage(strike.damage) {
                self.events.emit(GameEvent::PlayerHit {
                    damage: strike.damage,
                });
            }
        }

        if self.player.attacking && !self.player.attack_damage_applied {
            let player_rect = self.player.bounds();
            let target = self
                .level
                .enemies
                .iter_mut()
                .find(|enemy| enemy.is_alive() && enemy.swing_target().overlaps(&player_rect));
            if let Some(enemy) = target {
                enemy.take_damage(self.player.attack_damage, &mut self.events);
                self.player.attack_damage_applied = true;
            }
        }

        if !self.player.is_alive() && !self.game_over {
            self.game_over = true;
            self.game_over_menu.reset();
            self.events.emit(GameEvent::PlayerDied);
            info!(score = self.player.score, "player_died");
        }
    }

    fn step_cleanup(&mut self) {
        self.level.collectibles.retain(|collectible| !collectible.collected);
        self.level.enemies.retain(|enemy| !enemy.is_removable());
    }

    /// Entities to draw this frame, in draw order.
    pub(crate) fn render_items(&self) -> Vec<RenderItem> {
        let tile = Vec2::new(INTERACTABLE_SIZE as f32, INTERACTABLE_SIZE as f32);
        let mut items = Vec::new();
        items.extend(door_items(&self.level.doors, tile));
        items.extend(self.level.ladders.iter().map(|ladder| ladder_item(ladder, tile)));
        items.extend(self.level.traps.iter().map(|trap| RenderItem {
            kind: RenderKind::Trap {
                kind: trap.kind,
                frame: trap.frame_index,
            },
            position: Vec2::new(trap.x, trap.y),
            size: tile,
        }));
        items.extend(self.level.collectibles.iter().map(|item| RenderItem {
            kind: RenderKind::Collectible {
                kind: item.kind(),
                key: match item.effect {
                    ItemEffect::Key(key) => key,
                    _ => None,
                },
                frame: item.frame_index,
            },
            position: Vec2::new(item.x, item.y),
            size: tile,
        }));
        items.extend(self.level.enemies.iter().map(enemy_item));
        items.push(RenderItem {
            kind: RenderKind::Player {
                state: self.player.state,
                facing: self.player.facing,
                frame: self.player.frame_index,
            },
            position: self.player.position(),
            size: Vec2::new(PLAYER_WIDTH as f32, PLAYER_HEIGHT as f32),
        });
        items
    }
}

fn spawn_point(level: &Level) -> Vec2 {
    level
        .spawn
        .unwrap_or(Vec2::new(DEFAULT_SPAWN_X, DEFAULT_SPAWN_Y))
}

fn door_items(doors: &DoorSet, tile: Vec2) -> impl Iterator<Item = RenderItem> + '_ {
    doors
        .iter()
        .filter(|(_, door)| !door.is_open)
        .map(move |(_, door)| RenderItem {
            kind: RenderKind::Door { gid: door.gid },
            position: Vec2::new(door.x, door.y),
            size: tile,
        })
}

fn ladder_item(ladder: &Ladder, tile: Vec2) -> RenderItem {
    RenderItem {
        kind: RenderKind::Ladder { gid: ladder.gid },
        position: Vec2::new(ladder.x, ladder.y),
        size: tile,
    }
}

fn enemy_item(enemy: &Enemy) -> RenderItem {
    let size = enemy.hitbox();
    RenderItem {
        kind: RenderKind::Enemy {
            species: enemy.species,
            state: enemy.state,
            frame: enemy.frame_index,
            facing_left: enemy.facing_left,
            hp: enemy.hp,
            max_hp: enemy.max_hp,
        },
        position: enemy.position(),
        size: Vec2::new(size.w as f32, size.h as f32),
    }
}

#[cfg(test)]
pub(crate) fn test_game(level: Level, seed: u64) -> Game {
    let options = GameOptions {
        viewport_width: 960,
        viewport_height: 720,
        camera_zoom: 3.0,
        rng_seed: Some(seed),
    };
    Game::with_level(
        AppPaths::from_root(PathBuf::from("/nonexistent-maze-root")),
        level,
        options,
        StdRng::seed_from_u64(seed),
    )
}
