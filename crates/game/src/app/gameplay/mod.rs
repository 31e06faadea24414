mod collectible;
mod collision;
mod door;
mod enemy;
mod events;
mod fog;
mod game;
mod ladder;
mod level;
mod player;
mod render;
mod trap;

pub(crate) use collectible::ItemKind;
pub(crate) use events::GameEvent;
pub(crate) use game::{Game, GameOptions, MenuOutcome};
pub(crate) use render::build_frame;

const TILE_SIZE: f32 = 16.0;
const TILE_SIZE_PX: i32 = 16;

const PLAYER_WIDTH: i32 = 16;
const PLAYER_HEIGHT: i32 = 24;
const PLAYER_FEET_OFFSET_X: f32 = 3.0;
const PLAYER_FEET_OFFSET_Y: f32 = 16.0;
const PLAYER_FEET_WIDTH: i32 = 10;
const PLAYER_FEET_HEIGHT: i32 = 8;
const PLAYER_SPEED: f32 = 80.0;
const PLAYER_DIAGONAL_FACTOR: f32 = 0.707;
const PLAYER_ATTACK_DAMAGE: i32 = 30;
const PLAYER_MAX_HP: i32 = 100;
const PLAYER_ATTACK_DURATION_SECONDS: f32 = 0.3;
const PLAYER_INVINCIBLE_SECONDS: f32 = 1.0;
const DEFAULT_SPAWN_X: f32 = 100.0;
const DEFAULT_SPAWN_Y: f32 = 100.0;

const ENEMY_SIZE: i32 = 24;
const ENEMY_COLLISION_SIZE: f32 = 16.0;
const ENEMY_PATROL_INTERVAL_SECONDS: f32 = 2.0;
const ENEMY_AGGRO_RANGE: f32 = 80.0;
const ENEMY_ATTACK_RANGE: f32 = 20.0;
const ENEMY_WINDUP_CANCEL_MARGIN: f32 = 4.0;
const ENEMY_ATTACK_COOLDOWN_SECONDS: f32 = 0.6;
const ENEMY_WINDUP_SECONDS: f32 = 0.25;
const ENEMY_IMPACT_FRAME: usize = 6;
const PLAYER_ATTACK_REACH: i32 = 16;

const INTERACTABLE_SIZE: i32 = 16;
const INTERACTION_MARGIN: i32 = 8;
const MESSAGE_SECONDS: f32 = 2.0;
const LADDER_HINT_SECONDS: f32 = 0.1;
const DOOR_PAIR_DISTANCE: f32 = 20.0;
const DEFAULT_DOOR_GID: u32 = 67;
const DEFAULT_LADDER_GID: u32 = 40;
const DEFAULT_LADDER_DESTINATION: &str = "level2.tmx";

const TRAP_DAMAGE: i32 = 25;
const TRAP_FRAMES: usize = 4;
const TRAP_FRAME_SECONDS: f32 = 0.15;
const TRAP_HIT_INTERVAL_SECONDS: f32 = 1.0;
const PEAKS_SAFE_FRAME: usize = 2;
const PEAKS_SAFE_FRAME_FACTOR: f32 = 10.0;
const PEAKS_ACTIVE_FRAME_FACTOR: f32 = 0.5;

const COIN_VALUE: u32 = 10;
const POTION_HEAL: i32 = 25;
const COLLECTIBLE_FRAMES: usize = 4;
const COLLECTIBLE_FRAME_SECONDS: f32 = 0.15;

const FOG_INITIAL_RADIUS: f32 = 96.0;
const FOG_LEVEL_RADIUS: f32 = 128.0;
const FOG_MAX_ALPHA: u8 = 180;

const CHEAT_SILVER_KEYS: u32 = 4;
const CHEAT_GOLDEN_KEYS: u32 = 2;
const TELEPORT_LADDER_OFFSET_Y: f32 = 8.0;

const FALLBACK_MAP_COLS: usize = 20;
const FALLBACK_MAP_ROWS: usize = 15;
