use maze_engine::{InputAction, InputSnapshot, PixelRect, Vec2};

use super::collision::CollisionGrid;
use super::door::DoorSet;
use super::events::{GameEvent, GameEventBus};
use super::{
    PLAYER_ATTACK_DAMAGE, PLAYER_ATTACK_DURATION_SECONDS, PLAYER_DIAGONAL_FACTOR,
    PLAYER_FEET_HEIGHT, PLAYER_FEET_OFFSET_X, PLAYER_FEET_OFFSET_Y, PLAYER_FEET_WIDTH,
    PLAYER_HEIGHT, PLAYER_INVINCIBLE_SECONDS, PLAYER_MAX_HP, PLAYER_SPEED, PLAYER_WIDTH,
    TILE_SIZE_PX,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum KeyKind {
    Silver,
    Golden,
}

impl KeyKind {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "silver" => Some(Self::Silver),
            "golden" | "gold" => Some(Self::Golden),
            _ => None,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Silver => "silver",
            Self::Golden => "golden",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Inventory {
    silver: u32,
    golden: u32,
}

impl Inventory {
    pub(crate) fn count(&self, kind: KeyKind) -> u32 {
        match kind {
            KeyKind::Silver => self.silver,
            KeyKind::Golden => self.golden,
        }
    }

    fn slot_mut(&mut self, kind: KeyKind) -> &mut u32 {
        match kind {
            KeyKind::Silver => &mut self.silver,
            KeyKind::Golden => &mut self.golden,
        }
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Facing {
    Up,
    Down,
    Left,
    Right,
}

impl Facing {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlayerState {
    Idle,
    Run,
    Attack,
    Death,
}

impl PlayerState {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Run => "run",
            Self::Attack => "attack",
            Self::Death => "death",
        }
    }

    pub(crate) fn frame_count(self) -> usize {
        match self {
            Self::Idle => 4,
            Self::Run => 6,
            Self::Attack => 7,
            Self::Death => 9,
        }
    }

    fn frame_seconds(self) -> f32 {
        match self {
            Self::Run => 0.1,
            Self::Attack => PLAYER_ATTACK_DURATION_SECONDS / Self::Attack.frame_count() as f32,
            Self::Idle | Self::Death => 0.15,
        }
    }
}

/// Directional and attack input for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct MoveIntent {
    pub(crate) left: bool,
    pub(crate) right: bool,
    pub(crate) up: bool,
    pub(crate) down: bool,
    pub(crate) attack: bool,
}

impl MoveIntent {
    pub(crate) fn from_input(input: &InputSnapshot) -> Self {
        Self {
            left: input.is_down(InputAction::MoveLeft),
            right: input.is_down(InputAction::MoveRight),
            up: input.is_down(InputAction::MoveUp),
            down: input.is_down(InputAction::MoveDown),
            attack: input.is_down(InputAction::Attack),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Player {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) facing: Facing,
    pub(crate) state: PlayerState,
    pub(crate) hp: i32,
    pub(crate) max_hp: i32,
    pub(crate) score: u32,
    pub(crate) inventory: Inventory,
    pub(crate) attack_damage: i32,
    pub(crate) attacking: bool,
    pub(crate) attack_damage_applied: bool,
    pub(crate) invincible: bool,
    pub(crate) frame_index: usize,
    speed: f32,
    attack_timer: f32,
    invincible_timer: f32,
    invincible_duration: f32,
    animation_timer: f32,
}

impl Player {
    pub(crate) fn new(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            facing: Facing::Down,
            state: PlayerState::Idle,
            hp: PLAYER_MAX_HP,
            max_hp: PLAYER_MAX_HP,
            score: 0,
            inventory: Inventory::default(),
            attack_damage: PLAYER_ATTACK_DAMAGE,
            attacking: false,
            attack_damage_applied: false,
            invincible: false,
            frame_index: 0,
            speed: PLAYER_SPEED,
            attack_timer: 0.0,
            invincible_timer: 0.0,
            invincible_duration: PLAYER_INVINCIBLE_SECONDS,
            animation_timer: 0.0,
        }
    }

    pub(crate) fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// Full 16x24 box used for pickups, triggers and combat.
    pub(crate) fn bounds(&self) -> PixelRect {
        PixelRect::from_world(self.x, self.y, PLAYER_WIDTH as f32, PLAYER_HEIGHT as f32)
    }

    pub(crate) fn feet_rect(&self) -> PixelRect {
        feet_rect_at(self.x, self.y)
    }

    pub(crate) fn update(
        &mut self,
        dt_seconds: f32,
        intent: MoveIntent,
        grid: &CollisionGrid,
        doors: &DoorSet,
        events: &mut GameEventBus,
    ) {
        if !self.is_alive() {
            return;
        }

        if self.invincible {
            self.invincible_timer += dt_seconds;
            if self.invincible_timer >= self.invincible_duration {
                self.invincible = false;
                self.invincible_timer = 0.0;
            }
        }

        if self.attacking {
            self.attack_timer += dt_seconds;
            if self.attack_timer >= PLAYER_ATTACK_DURATION_SECONDS {
                self.attacking = false;
                self.attack_timer = 0.0;
                self.attack_damage_applied = false;
                self.state = PlayerState::Idle;
            }
        }

        if !self.attacking {
            let (vx, vy) = self.apply_intent(intent, events);
            if !self.attacking {
                self.move_by(vx, vy, dt_seconds, grid, doors);
            }
        }

        self.advance_animation(dt_seconds);
    }

    fn apply_intent(&mut self, intent: MoveIntent, events: &mut GameEventBus) -> (f32, f32) {
        let mut vx = 0.0;
        let mut vy = 0.0;
        if intent.left {
            vx = -1.0;
            self.facing = Facing::Left;
        } else if intent.right {
            vx = 1.0;
            self.facing = Facing::Right;
        }
        if intent.up {
            vy = -1.0;
            self.facing = Facing::Up;
        } else if intent.down {
            vy = 1.0;
            self.facing = Facing::Down;
        }
        if vx != 0.0 && vy != 0.0 {
            vx *= PLAYER_DIAGONAL_FACTOR;
            vy *= PLAYER_DIAGONAL_FACTOR;
        }
        self.state = if vx != 0.0 || vy != 0.0 {
            PlayerState::Run
        } else {
            PlayerState::Idle
        };

        if intent.attack && !self.attacking {
            self.attacking = true;
            self.attack_timer = 0.0;
            self.attack_damage_applied = false;
            self.state = PlayerState::Attack;
            self.frame_index = 0;
            self.animation_timer = 0.0;
            events.emit(GameEvent::AttackStarted);
        }
        (vx, vy)
    }

    /// Sub-stepped move with axis sliding. Each sub-step moves at most one
    /// world unit so thin walls cannot be skipped at low frame rates.
    fn move_by(
        &mut self,
        vx: f32,
        vy: f32,
        dt_seconds: f32,
        grid: &CollisionGrid,
        doors: &DoorSet,
    ) {
        let dx = vx * self.speed * dt_seconds;
        let dy = vy * self.speed * dt_seconds;
        if dx == 0.0 && dy == 0.0 {
            return;
        }

        let steps = (dx.abs().max(dy.abs()).ceil() as usize).max(1);
        let step_x = dx / steps as f32;
        let step_y = dy / steps as f32;
        let blocked = |x: f32, y: f32| {
            let feet = feet_rect_at(x, y);
            grid.blocks_feet(feet) || doors.blocks(feet)
        };

        for _ in 0..steps {
            let new_x = self.x + step_x;
            let new_y = self.y + step_y;
            if !blocked(new_x, new_y) {
                self.x = new_x;
                self.y = new_y;
            } else if step_x != 0.0 && !blocked(new_x, self.y) {
                self.x = new_x;
            } else if step_y != 0.0 && !blocked(self.x, new_y) {
                self.y = new_y;
            } else {
                if step_y > 0.0 {
                    let feet_bottom = feet_rect_at(new_x, new_y).bottom();
                    let row = (feet_bottom - 1).div_euclid(TILE_SIZE_PX).max(0);
                    self.y = (row * TILE_SIZE_PX - PLAYER_HEIGHT) as f32;
                }
                break;
            }
        }
    }

    fn advance_animation(&mut self, dt_seconds: f32) {
        self.animation_timer += dt_seconds;
        if self.animation_timer >= self.state.frame_seconds() {
            self.animation_timer = 0.0;
            self.frame_index = (self.frame_index + 1) % self.state.frame_count();
        }
    }

    /// Returns whether the hit landed.
    pub(crate) fn take_damage(&mut self, amount: i32) -> bool {
        if self.invincible || self.hp <= 0 {
            return false;
        }
        self.hp = (self.hp - amount).max(0);
        self.invincible = true;
        self.invincible_timer = 0.0;
        if self.hp == 0 {
            self.state = PlayerState::Death;
            self.attacking = false;
            self.attack_timer = 0.0;
            self.frame_index = 0;
            self.animation_timer = 0.0;
        }
        true
    }

    pub(crate) fn heal(&mut self, amount: i32) {
        self.hp = (self.hp + amount.max(0)).min(self.max_hp);
    }

    pub(crate) fn heal_full(&mut self) {
        self.hp = self.max_hp;
    }

    pub(crate) fn add_keys(&mut self, kind: KeyKind, count: u32) {
        *self.inventory.slot_mut(kind) += count;
    }

    pub(crate) fn has_keys(&self, kind: KeyKind, count: u32) -> bool {
        self.inventory.count(kind) >= count
    }

    /// Removes `count` keys when available; returns false and leaves the
    /// inventory untouched otherwise.
    pub(crate) fn remove_keys(&mut self, kind: KeyKind, count: u32) -> bool {
        let slot = self.inventory.slot_mut(kind);
        if *slot < count {
            return false;
        }
        *slot -= count;
        true
    }

    /// Flips permanent invincibility. Returns the new state.
    pub(crate) fn toggle_invincibility(&mut self) -> bool {
        self.invincible = !self.invincible;
        self.invincible_timer = 0.0;
        self.invincible_duration = if self.invincible {
            f32::INFINITY
        } else {
            PLAYER_INVINCIBLE_SECONDS
        };
        self.invincible
    }

    pub(crate) fn teleport(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
    }

    /// Clears every transient combat and animation state.
    pub(crate) fn reset_transient_state(&mut self) {
        self.invincible = false;
        self.invincible_timer = 0.0;
        self.invincible_duration = PLAYER_INVINCIBLE_SECONDS;
        self.attacking = false;
        self.attack_timer = 0.0;
        self.attack_damage_applied = false;
        self.state = PlayerState::Idle;
        self.frame_index = 0;
        self.animation_timer = 0.0;
    }
}

pub(crate) fn feet_rect_at(x: f32, y: f32) -> PixelRect {
    PixelRect::from_world(
        x + PLAYER_FEET_OFFSET_X,
        y + PLAYER_FEET_OFFSET_Y,
        PLAYER_FEET_WIDTH as f32,
        PLAYER_FEET_HEIGHT as f32,
    )
}
