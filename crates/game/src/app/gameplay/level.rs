use std::path::{Path, PathBuf};

use maze_engine::{MapObject, TileAnimator, TmxError, TmxMap, Vec2};
use rand::Rng;
use thiserror::Error;
use tracing::{info, warn};

use super::collectible::{Collectible, ItemEffect, ItemKind};
use super::collision::CollisionGrid;
use super::door::{Door, DoorOrientation, DoorSet};
use super::enemy::{Enemy, Species};
use super::ladder::Ladder;
use super::player::KeyKind;
use super::trap::{Trap, TrapKind};
use super::{
    COIN_VALUE, COLLECTIBLE_FRAMES, DEFAULT_DOOR_GID, DEFAULT_LADDER_DESTINATION,
    DEFAULT_LADDER_GID, FALLBACK_MAP_COLS, FALLBACK_MAP_ROWS, POTION_HEAL, TILE_SIZE_PX,
    TRAP_DAMAGE, TRAP_FRAMES,
};

const PLAYER_SPAWN_NAME: &str = "player_spawn";

#[derive(Debug, Error)]
pub(crate) enum LevelLoadError {
    #[error(transparent)]
    Map(#[from] TmxError),
}

/// Everything built from one map file. Rebuilt from scratch on level change
/// and on retry.
#[derive(Debug)]
pub(crate) struct Level {
    pub(crate) path: PathBuf,
    pub(crate) map: TmxMap,
    pub(crate) grid: CollisionGrid,
    pub(crate) animator: TileAnimator,
    pub(crate) spawn: Option<Vec2>,
    pub(crate) enemies: Vec<Enemy>,
    pub(crate) collectibles: Vec<Collectible>,
    pub(crate) traps: Vec<Trap>,
    pub(crate) doors: DoorSet,
    pub(crate) ladders: Vec<Ladder>,
}

impl Level {
    /// `path` is kept for retries and level labels; `resolved` is the file on disk.
    pub(crate) fn load<R: Rng + ?Sized>(
        path: &Path,
        resolved: &Path,
        rng: &mut R,
    ) -> Result<Self, LevelLoadError> {
        let map = TmxMap::load(resolved)?;
        let level = Self::from_map(path.to_path_buf(), map, rng);
        info!(
            path = %path.display(),
            enemies = level.enemies.len(),
            collectibles = level.collectibles.len(),
            traps = level.traps.len(),
            doors = level.doors.len(),
            ladders = level.ladders.len(),
            "level_loaded"
        );
        Ok(level)
    }

    /// Empty walkable level used when the start map cannot be read.
    pub(crate) fn fallback(path: PathBuf) -> Self {
        let map = TmxMap {
            width: FALLBACK_MAP_COLS as u32,
            height: FALLBACK_MAP_ROWS as u32,
            tile_width: TILE_SIZE_PX as u32,
            tile_height: TILE_SIZE_PX as u32,
            tile_layers: Vec::new(),
            object_groups: Vec::new(),
            tilesets: Vec::new(),
        };
        Self {
            path,
            grid: CollisionGrid::open(FALLBACK_MAP_COLS, FALLBACK_MAP_ROWS),
            animator: TileAnimator::default(),
            map,
            spawn: None,
            enemies: Vec::new(),
            collectibles: Vec::new(),
            traps: Vec::new(),
            doors: DoorSet::default(),
            ladders: Vec::new(),
        }
    }

    pub(crate) fn from_map<R: Rng + ?Sized>(path: PathBuf, map: TmxMap, rng: &mut R) -> Self {
        let mut spawn = None;
        let mut enemies = Vec::new();
        let mut collectibles = Vec::new();
        let mut traps = Vec::new();
        let mut doors = Vec::new();
        let mut ladders = Vec::new();

        for object in map.objects() {
            match object.object_type.trim().to_ascii_lowercase().as_str() {
                "spawn" if object.name == PLAYER_SPAWN_NAME => {
                    spawn = Some(Vec2::new(object.x, object.y));
                }
                "enemy" => enemies.push(build_enemy(object, rng)),
                "collectible" => collectibles.extend(build_collectible(object)),
                "trap" => traps.push(build_trap(object)),
                "door" => doors.push(build_door(object)),
                "ladder" => ladders.push(build_ladder(object)),
                _ => {}
            }
        }

        Self {
            path,
            grid: CollisionGrid::from_map(&map),
            animator: TileAnimator::for_map(&map),
            map,
            spawn,
            enemies,
            collectibles,
            traps,
            doors: DoorSet::new(doors),
            ladders,
        }
    }

    pub(crate) fn pixel_size(&self) -> (u32, u32) {
        (self.map.pixel_width(), self.map.pixel_height())
    }
}

fn text_or(object: &MapObject, names: &[&str], default: &str) -> String {
    names
        .iter()
        .find_map(|name| object.property_text(name))
        .unwrap_or_else(|| default.to_string())
}

fn count_or(object: &MapObject, names: &[&str], default: i64) -> i64 {
    names
        .iter()
        .find_map(|name| object.property_i64(name))
        .unwrap_or(default)
}

fn gid_or(object: &MapObject, default: u32) -> u32 {
    object
        .gid
        .or_else(|| {
            object
                .property_i64("gid")
                .and_then(|gid| u32::try_from(gid).ok())
        })
        .unwrap_or(default)
}

fn key_kind_or_silver(raw: &str, object: &MapObject) -> KeyKind {
    KeyKind::parse(raw).unwrap_or_else(|| {
        warn!(object = object.id, key = raw, "unknown_key_type_defaulting_to_silver");
        KeyKind::Silver
    })
}

fn build_enemy<R: Rng + ?Sized>(object: &MapObject, rng: &mut R) -> Enemy {
    let raw = if object.name.trim().is_empty() {
        Species::Skeleton1.name()
    } else {
        object.name.as_str()
    };
    let species = Species::parse(raw).unwrap_or_else(|| {
        warn!(object = object.id, species = raw, "unknown_enemy_species_defaulting_to_skeleton1");
        Species::Skeleton1
    });
    Enemy::new(object.x, object.y, species, rng)
}

fn build_collectible(object: &MapObject) -> Option<Collectible> {
    let raw = text_or(object, &["item_type", "item"], ItemKind::Coin.name());
    let Some(kind) = ItemKind::parse(&raw) else {
        warn!(object = object.id, item = %raw, "unknown_item_type_skipped");
        return None;
    };
    let effect = match kind {
        ItemKind::Coin => {
            let value = count_or(object, &["value"], COIN_VALUE as i64);
            ItemEffect::Score(u32::try_from(value).unwrap_or(0))
        }
        ItemKind::Key => {
            let key = text_or(object, &["key_type"], KeyKind::Silver.name());
            ItemEffect::Key(KeyKind::parse(&key))
        }
        ItemKind::Potion => {
            let heal = count_or(object, &["heal"], POTION_HEAL as i64);
            let heal = i32::try_from(heal)
                .ok()
                .filter(|heal| *heal > 0)
                .unwrap_or_else(|| {
                    warn!(object = object.id, heal, "invalid_potion_heal_using_default");
                    POTION_HEAL
                });
            ItemEffect::Heal(heal)
        }
    };
    let frames = count_or(object, &["frames"], COLLECTIBLE_FRAMES as i64);
    Some(Collectible::new(
        object.x,
        object.y,
        effect,
        usize::try_from(frames).unwrap_or(COLLECTIBLE_FRAMES),
    ))
}

fn build_trap(object: &MapObject) -> Trap {
    let raw = object
        .property_text("trap_type")
        .unwrap_or_else(|| object.name.clone());
    let kind = if raw.trim().is_empty() {
        TrapKind::Peaks
    } else {
        TrapKind::parse(&raw).unwrap_or_else(|| {
            warn!(object = object.id, trap = %raw, "unknown_trap_type_defaulting_to_peaks");
            TrapKind::Peaks
        })
    };
    let damage = count_or(object, &["damage"], TRAP_DAMAGE as i64);
    let frames = count_or(object, &["frames"], TRAP_FRAMES as i64);
    Trap::new(
        object.x,
        object.y,
        kind,
        i32::try_from(damage).unwrap_or(TRAP_DAMAGE),
        usize::try_from(frames).unwrap_or(TRAP_FRAMES),
    )
}

fn build_door(object: &MapObject) -> Door {
    let key_raw = text_or(object, &["required_key"], KeyKind::Silver.name());
    let required_key = key_kind_or_silver(&key_raw, object);
    let count = count_or(object, &["key_count", "count"], 1);
    let orientation = DoorOrientation::parse(&text_or(object, &["orientation"], "left"));
    Door::new(
        object.x,
        object.y,
        required_key,
        u32::try_from(count).unwrap_or(1),
        orientation,
        gid_or(object, DEFAULT_DOOR_GID),
    )
}

fn build_ladder(object: &MapObject) -> Ladder {
    Ladder::new(
        object.x,
        object.y,
        text_or(object, &["destination"], DEFAULT_LADDER_DESTINATION),
        gid_or(object, DEFAULT_LADDER_GID),
    )
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::app::gameplay::door::DoorId;

    const OBJECTS_MAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" width="4" height="3" tilewidth="16" tileheight="16">
 <layer id="1" name="Collision" width="4" height="3">
  <data encoding="csv">
1,1,1,1,
0,0,0,0,
1,1,1,1
</data>
 </layer>
 <objectgroup id="2" name="Objects">
  <object id="1" name="player_spawn" type="spawn" x="20" y="18"/>
  <object id="2" name="vampire" type="enemy" x="40" y="16"/>
  <object id="3" name="ghoul" type="enemy" x="44" y="16"/>
  <object id="4" type="collectible" x="8" y="16">
   <properties><property name="item" value="key"/><property name="key_type" value="golden"/></properties>
  </object>
  <object id="5" type="collectible" x="8" y="16">
   <properties><property name="item" value="gem"/></properties>
  </object>
  <object id="6" type="door" x="32" y="16">
   <properties>
    <property name="required_key" value="mithril"/>
    <property name="count" type="int" value="2"/>
   </properties>
  </object>
  <object id="7" type="door" x="48" y="16">
   <properties><property name="orientation" value="right"/></properties>
  </object>
  <object id="8" name="arrow" type="trap" x="0" y="16"/>
  <object id="9" type="ladder" x="56" y="16"/>
 </objectgroup>
</map>
"#;

    fn build() -> Level {
        let map = TmxMap::parse_str(OBJECTS_MAP, Path::new("objects.tmx")).expect("parse map");
        let mut rng = StdRng::seed_from_u64(1);
        Level::from_map(PathBuf::from("maps/objects.tmx"), map, &mut rng)
    }

    #[test]
    fn objects_become_entities() {
        let level = build();
        assert_eq!(level.spawn, Some(Vec2::new(20.0, 18.0)));
        assert_eq!(level.enemies.len(), 2);
        assert_eq!(level.enemies[0].species, Species::Vampire);
        assert_eq!(level.enemies[1].species, Species::Skeleton1);
        assert_eq!(level.collectibles.len(), 1);
        assert_eq!(
            level.collectibles[0].effect,
            ItemEffect::Key(Some(KeyKind::Golden))
        );
        assert_eq!(level.traps[0].kind, TrapKind::Arrow);
        assert_eq!(level.ladders[0].destination, "level2.tmx");
        assert_eq!(level.ladders[0].gid, 40);
    }

    #[test]
    fn door_defaults_and_fallbacks_apply() {
        let level = build();
        let first = level.doors.get(DoorId(0)).expect("door");
        assert_eq!(first.required_key, KeyKind::Silver);
        assert_eq!(first.key_count, 2);
        assert_eq!(first.gid, 67);
        let second = level.doors.get(DoorId(1)).expect("door");
        assert_eq!(second.orientation, DoorOrientation::Right);
        assert_eq!(level.doors.paired_with(DoorId(0)), Some(DoorId(1)));
    }

    #[test]
    fn collision_layer_feeds_the_grid() {
        let level = build();
        assert!(level.grid.is_solid(0, 0));
        assert!(!level.grid.is_solid(0, 1));
        assert_eq!(level.pixel_size(), (64, 48));
    }

    #[test]
    fn non_positive_potion_heal_uses_default() {
        let raw = r#"<map width="2" height="1" tilewidth="16" tileheight="16">
 <objectgroup name="Objects">
  <object id="1" type="collectible" x="0" y="0">
   <properties><property name="item_type" value="potion"/><property name="heal" type="int" value="-40"/></properties>
  </object>
  <object id="2" type="collectible" x="16" y="0">
   <properties><property name="item_type" value="potion"/><property name="heal" type="int" value="10"/></properties>
  </object>
 </objectgroup>
</map>"#;
        let map = TmxMap::parse_str(raw, Path::new("potions.tmx")).expect("parse map");
        let mut rng = StdRng::seed_from_u64(1);
        let level = Level::from_map(PathBuf::from("maps/potions.tmx"), map, &mut rng);
        assert_eq!(level.collectibles[0].effect, ItemEffect::Heal(POTION_HEAL));
        assert_eq!(level.collectibles[1].effect, ItemEffect::Heal(10));
    }

    #[test]
    fn fallback_level_is_open_and_empty() {
        let level = Level::fallback(PathBuf::from("maps/missing.tmx"));
        assert_eq!(level.pixel_size(), (320, 240));
        assert!(level.enemies.is_empty());
        assert!(level.spawn.is_none());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut rng = StdRng::seed_from_u64(1);
        let result = Level::load(
            Path::new("maps/nope.tmx"),
            &dir.path().join("nope.tmx"),
            &mut rng,
        );
        assert!(matches!(result, Err(LevelLoadError::Map(TmxError::Io { .. }))));
    }
}
