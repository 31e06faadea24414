use maze_engine::{PixelRect, Vec2};
use rand::Rng;

use super::collision::CollisionGrid;
use super::events::{GameEvent, GameEventBus};
use super::{
    ENEMY_AGGRO_RANGE, ENEMY_ATTACK_COOLDOWN_SECONDS, ENEMY_ATTACK_RANGE, ENEMY_IMPACT_FRAME,
    ENEMY_PATROL_INTERVAL_SECONDS, ENEMY_SIZE, ENEMY_WINDUP_CANCEL_MARGIN, ENEMY_WINDUP_SECONDS,
    PLAYER_ATTACK_REACH,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Species {
    Skeleton1,
    Skeleton2,
    Vampire,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct SpeciesStats {
    pub(crate) max_hp: i32,
    pub(crate) speed: f32,
    pub(crate) damage: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameCounts {
    pub(crate) idle: usize,
    pub(crate) movement: usize,
    pub(crate) attack: usize,
    pub(crate) death: usize,
}

impl Species {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "skeleton1" => Some(Self::Skeleton1),
            "skeleton2" => Some(Self::Skeleton2),
            "vampire" => Some(Self::Vampire),
            _ => None,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Skeleton1 => "skeleton1",
            Self::Skeleton2 => "skeleton2",
            Self::Vampire => "vampire",
        }
    }

    pub(crate) fn stats(self) -> SpeciesStats {
        match self {
            Self::Skeleton1 => SpeciesStats {
                max_hp: 50,
                speed: 40.0,
                damage: 15,
            },
            Self::Skeleton2 => SpeciesStats {
                max_hp: 75,
                speed: 30.0,
                damage: 20,
            },
            Self::Vampire => SpeciesStats {
                max_hp: 100,
                speed: 50.0,
                damage: 30,
            },
        }
    }

    pub(crate) fn frames(self) -> FrameCounts {
        match self {
            Self::Skeleton1 => FrameCounts {
                idle: 6,
                movement: 10,
                attack: 9,
                death: 17,
            },
            Self::Skeleton2 => FrameCounts {
                idle: 6,
                movement: 10,
                attack: 15,
                death: 15,
            },
            Self::Vampire => FrameCounts {
                idle: 6,
                movement: 8,
                attack: 16,
                death: 14,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EnemyState {
    Idle,
    Movement,
    AttackWindup,
    Attack,
    Death,
}

impl EnemyState {
    /// Sprite sheet suffix. The windup telegraph reuses the attack sheet.
    pub(crate) fn sheet_name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Movement => "movement",
            Self::AttackWindup | Self::Attack => "attack",
            Self::Death => "death",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PatrolDirection {
    Left,
    Right,
    Idle,
}

/// Damage an enemy lands on the player this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EnemyStrike {
    pub(crate) damage: i32,
}

#[derive(Debug, Clone)]
pub(crate) struct Enemy {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) species: Species,
    pub(crate) hp: i32,
    pub(crate) max_hp: i32,
    pub(crate) state: EnemyState,
    pub(crate) is_aggroed: bool,
    pub(crate) is_attacking: bool,
    pub(crate) has_dealt_damage: bool,
    pub(crate) frame_index: usize,
    pub(crate) facing_left: bool,
    speed: f32,
    damage: i32,
    frames: FrameCounts,
    attack_cooldown: f32,
    windup_timer: f32,
    patrol_timer: f32,
    patrol_direction: PatrolDirection,
    animation_timer: f32,
    death_reported: bool,
}

impl Enemy {
    pub(crate) fn new<R: Rng + ?Sized>(x: f32, y: f32, species: Species, rng: &mut R) -> Self {
        let stats = species.stats();
        let patrol_direction = if rng.gen_bool(0.5) {
            PatrolDirection::Left
        } else {
            PatrolDirection::Right
        };
        Self {
            x,
            y,
            species,
            hp: stats.max_hp,
            max_hp: stats.max_hp,
            state: EnemyState::Idle,
            is_aggroed: false,
            is_attacking: false,
            has_dealt_damage: false,
            frame_index: 0,
            facing_left: patrol_direction == PatrolDirection::Left,
            speed: stats.speed,
            damage: stats.damage,
            frames: species.frames(),
            attack_cooldown: 0.0,
            windup_timer: 0.0,
            patrol_timer: 0.0,
            patrol_direction,
            animation_timer: 0.0,
            death_reported: false,
        }
    }

    pub(crate) fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub(crate) fn hitbox(&self) -> PixelRect {
        PixelRect::from_world(self.x, self.y, ENEMY_SIZE as f32, ENEMY_SIZE as f32)
    }

    /// Area the player's swing has to overlap.
    pub(crate) fn swing_target(&self) -> PixelRect {
        self.hitbox().inflate(PLAYER_ATTACK_REACH, PLAYER_ATTACK_REACH)
    }

    pub(crate) fn frame_count(&self, state: EnemyState) -> usize {
        match state {
            EnemyState::Idle => self.frames.idle,
            EnemyState::Movement => self.frames.movement,
            EnemyState::AttackWindup | EnemyState::Attack => self.frames.attack,
            EnemyState::Death => self.frames.death,
        }
    }

    /// Death animation has reached its last frame.
    pub(crate) fn is_removable(&self) -> bool {
        self.hp <= 0
            && self.state == EnemyState::Death
            && self.frame_index + 1 >= self.frames.death
    }

    pub(crate) fn update<R: Rng + ?Sized>(
        &mut self,
        dt_seconds: f32,
        player: Vec2,
        grid: &CollisionGrid,
        rng: &mut R,
    ) -> Option<EnemyStrike> {
        if !self.is_alive() {
            self.advance_animation(dt_seconds);
            return None;
        }

        if self.attack_cooldown > 0.0 {
            self.attack_cooldown -= dt_seconds;
        }

        let distance = self.position().distance(player);

        if self.state == EnemyState::AttackWindup {
            self.windup_timer += dt_seconds;
            if distance > ENEMY_ATTACK_RANGE + ENEMY_WINDUP_CANCEL_MARGIN {
                self.state = EnemyState::Idle;
                self.windup_timer = 0.0;
            } else if self.windup_timer >= ENEMY_WINDUP_SECONDS {
                self.state = EnemyState::Attack;
                self.is_attacking = true;
                self.has_dealt_damage = false;
                self.windup_timer = 0.0;
                self.frame_index = 0;
                self.animation_timer = 0.0;
            }
            return None;
        }

        if distance < ENEMY_AGGRO_RANGE {
            self.is_aggroed = true;
        }

        if self.is_aggroed {
            if distance < ENEMY_ATTACK_RANGE {
                if !self.is_attacking && self.attack_cooldown <= 0.0 {
                    self.state = EnemyState::AttackWindup;
                    self.windup_timer = 0.0;
                } else if self.is_attacking {
                    self.state = EnemyState::Attack;
                } else {
                    self.state = EnemyState::Idle;
                }
            } else {
                self.state = EnemyState::Movement;
                self.chase(player, dt_seconds, grid);
            }
        } else {
            self.patrol(dt_seconds, grid, rng);
        }

        self.advance_animation(dt_seconds);

        let mut strike = None;
        if self.is_attacking
            && !self.has_dealt_damage
            && self.frame_index % self.frames.attack == ENEMY_IMPACT_FRAME
        {
            if self.attack_cooldown <= 0.0 {
                strike = Some(EnemyStrike {
                    damage: self.damage,
                });
                self.attack_cooldown = ENEMY_ATTACK_COOLDOWN_SECONDS;
            }
            self.has_dealt_damage = true;
        }
        strike
    }

    fn chase(&mut self, player: Vec2, dt_seconds: f32, grid: &CollisionGrid) {
        let dx = player.x - self.x;
        let dy = player.y - self.y;
        let length = (dx * dx + dy * dy).sqrt();
        if length <= 0.0 {
            return;
        }
        let step = self.speed * dt_seconds;
        let move_x = dx / length * step;
        let move_y = dy / length * step;
        if move_x != 0.0 {
            self.facing_left = move_x < 0.0;
        }
        self.try_move(move_x, move_y, grid);
    }

    fn patrol<R: Rng + ?Sized>(&mut self, dt_seconds: f32, grid: &CollisionGrid, rng: &mut R) {
        self.patrol_timer += dt_seconds;
        if self.patrol_timer >= ENEMY_PATROL_INTERVAL_SECONDS {
            self.patrol_timer = 0.0;
            self.patrol_direction = match rng.gen_range(0..3) {
                0 => PatrolDirection::Left,
                1 => PatrolDirection::Right,
                _ => PatrolDirection::Idle,
            };
        }

        let step = self.speed * dt_seconds;
        match self.patrol_direction {
            PatrolDirection::Left => {
                self.state = EnemyState::Movement;
                self.facing_left = true;
                self.try_move(-step, 0.0, grid);
            }
            PatrolDirection::Right => {
                self.state = EnemyState::Movement;
                self.facing_left = false;
                self.try_move(step, 0.0, grid);
            }
            PatrolDirection::Idle => self.state = EnemyState::Idle,
        }
    }

    /// Axis-separated move against the 16x16 collision box.
    fn try_move(&mut self, dx: f32, dy: f32, grid: &CollisionGrid) {
        let new_x = self.x + dx;
        if !grid.blocks_hitbox(new_x, self.y) {
            self.x = new_x;
        }
        let new_y = self.y + dy;
        if !grid.blocks_hitbox(self.x, new_y) {
            self.y = new_y;
        }
    }

    fn advance_animation(&mut self, dt_seconds: f32) {
        let frame_seconds = match self.state {
            EnemyState::Attack => 0.08,
            EnemyState::Death => 0.12,
            _ => 0.15,
        };
        self.animation_timer += dt_seconds;
        if self.animation_timer < frame_seconds {
            return;
        }
        self.animation_timer = 0.0;

        if self.state == EnemyState::Death {
            if self.frame_index + 1 < self.frames.death {
                self.frame_index += 1;
            }
            return;
        }

        self.frame_index += 1;
        if self.state == EnemyState::Attack && self.is_attacking {
            if self.frame_index >= self.frames.attack {
                self.is_attacking = false;
                self.attack_cooldown = ENEMY_ATTACK_COOLDOWN_SECONDS;
                self.frame_index = 0;
                self.state = EnemyState::Idle;
            }
        } else if self.frame_index >= self.frame_count(self.state) {
            self.frame_index = 0;
        }
    }

    /// Applies damage. The death transition and its event happen once.
    pub(crate) fn take_damage(&mut self, amount: i32, events: &mut GameEventBus) {
        self.hp = (self.hp - amount).max(0);
        if self.hp > 0 {
            return;
        }
        if self.state != EnemyState::Death {
            self.state = EnemyState::Death;
            self.frame_index = 0;
            self.animation_timer = 0.0;
            self.is_attacking = false;
            self.windup_timer = 0.0;
        }
        if !self.death_reported {
            self.death_reported = true;
            events.emit(GameEvent::EnemyDied {
                species: self.species,
            });
        }
    }

    pub(crate) fn kill(&mut self, events: &mut GameEventBus) {
        let remaining = self.hp;
        self.take_damage(remaining.max(1), events);
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    const FRAME: f32 = 1.0 / 60.0;

    fn skeleton_at(x: f32, y: f32) -> (Enemy, StdRng) {
        let mut rng = StdRng::seed_from_u64(7);
        let enemy = Enemy::new(x, y, Species::Skeleton1, &mut rng);
        (enemy, rng)
    }

    #[test]
    fn species_table_matches_parse() {
        assert_eq!(Species::parse("Vampire"), Some(Species::Vampire));
        assert_eq!(Species::parse("zombie"), None);
        assert_eq!(Species::Skeleton2.stats().max_hp, 75);
        assert_eq!(Species::Vampire.stats().damage, 30);
    }

    #[test]
    fn player_in_range_starts_windup() {
        let grid = CollisionGrid::open(20, 20);
        let (mut enemy, mut rng) = skeleton_at(100.0, 100.0);
        let player = Vec2::new(110.0, 100.0);
        enemy.update(FRAME, player, &grid, &mut rng);
        assert!(enemy.is_aggroed);
        assert_eq!(enemy.state, EnemyState::AttackWindup);
        assert!(!enemy.is_attacking);
    }

    #[test]
    fn windup_completes_into_attack() {
        let grid = CollisionGrid::open(20, 20);
        let (mut enemy, mut rng) = skeleton_at(100.0, 100.0);
        let player = Vec2::new(110.0, 100.0);
        for _ in 0..17 {
            enemy.update(FRAME, player, &grid, &mut rng);
        }
        assert_eq!(enemy.state, EnemyState::Attack);
        assert!(enemy.is_attacking);
        assert_eq!(enemy.frame_index, 0);
    }

    #[test]
    fn attack_strikes_once_at_impact_frame() {
        let grid = CollisionGrid::open(20, 20);
        let (mut enemy, mut rng) = skeleton_at(100.0, 100.0);
        let player = Vec2::new(110.0, 100.0);
        let mut strikes = Vec::new();
        for _ in 0..90 {
            if let Some(strike) = enemy.update(FRAME, player, &grid, &mut rng) {
                strikes.push(strike);
            }
            if !enemy.is_attacking && enemy.has_dealt_damage {
                break;
            }
        }
        assert_eq!(strikes, vec![EnemyStrike { damage: 15 }]);
        assert!(enemy.attack_cooldown > 0.0);
    }

    #[test]
    fn aggro_latches_and_enemy_chases() {
        let grid = CollisionGrid::open(40, 40);
        let (mut enemy, mut rng) = skeleton_at(100.0, 100.0);
        enemy.update(FRAME, Vec2::new(160.0, 100.0), &grid, &mut rng);
        assert!(enemy.is_aggroed);
        assert_eq!(enemy.state, EnemyState::Movement);
        assert!(enemy.x > 100.0);
        enemy.update(FRAME, Vec2::new(400.0, 100.0), &grid, &mut rng);
        assert!(enemy.is_aggroed);
        assert_eq!(enemy.state, EnemyState::Movement);
    }

    #[test]
    fn patrol_moves_only_horizontally() {
        let grid = CollisionGrid::open(40, 40);
        let (mut enemy, mut rng) = skeleton_at(300.0, 300.0);
        for _ in 0..30 {
            enemy.update(FRAME, Vec2::new(0.0, 0.0), &grid, &mut rng);
        }
        assert!(!enemy.is_aggroed);
        assert_eq!(enemy.y, 300.0);
        assert_ne!(enemy.x, 300.0);
    }

    #[test]
    fn walls_stop_movement() {
        let mut solid = vec![false; 10 * 10];
        for row in 0..10 {
            solid[row * 10 + 3] = true;
        }
        let grid = CollisionGrid::new(10, 10, solid).expect("grid");
        let (mut enemy, mut rng) = skeleton_at(16.0, 64.0);
        for _ in 0..120 {
            enemy.update(FRAME, Vec2::new(90.0, 64.0), &grid, &mut rng);
        }
        assert!(enemy.x > 16.0 && enemy.x < 32.0);
    }

    #[test]
    fn death_is_reported_once_and_animation_clamps() {
        let grid = CollisionGrid::open(20, 20);
        let (mut enemy, mut rng) = skeleton_at(100.0, 100.0);
        let mut events = GameEventBus::default();
        enemy.take_damage(30, &mut events);
        assert!(enemy.is_alive());
        enemy.take_damage(30, &mut events);
        enemy.take_damage(30, &mut events);
        assert_eq!(enemy.hp, 0);
        assert_eq!(enemy.state, EnemyState::Death);
        assert_eq!(
            events.count_matching(|event| matches!(event, GameEvent::EnemyDied { .. })),
            1
        );

        let player = Vec2::new(105.0, 100.0);
        for _ in 0..600 {
            assert_eq!(enemy.update(FRAME, player, &grid, &mut rng), None);
        }
        assert_eq!(enemy.frame_index, Species::Skeleton1.frames().death - 1);
        assert!(enemy.is_removable());
        assert_eq!(enemy.x, 100.0);
    }

    #[test]
    fn kill_goes_through_death_path() {
        let (mut enemy, _) = skeleton_at(0.0, 0.0);
        let mut events = GameEventBus::default();
        enemy.kill(&mut events);
        assert_eq!(enemy.hp, 0);
        assert_eq!(enemy.state, EnemyState::Death);
        assert!(!enemy.is_removable());
        assert_eq!(events.iter_emitted_so_far().count(), 1);
    }
}
