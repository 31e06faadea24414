use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::app::{PixelRect, SpriteFlip};

pub const FLIPPED_HORIZONTALLY_FLAG: u32 = 0x8000_0000;
pub const FLIPPED_VERTICALLY_FLAG: u32 = 0x4000_0000;
pub const FLIPPED_DIAGONALLY_FLAG: u32 = 0x2000_0000;
pub const FLIP_FLAGS_MASK: u32 =
    FLIPPED_HORIZONTALLY_FLAG | FLIPPED_VERTICALLY_FLAG | FLIPPED_DIAGONALLY_FLAG;

/// Global tile id with the flip flags removed.
pub const fn strip_flip_flags(raw_gid: u32) -> u32 {
    raw_gid & !FLIP_FLAGS_MASK
}

pub const fn flip_of(raw_gid: u32) -> SpriteFlip {
    SpriteFlip {
        horizontal: raw_gid & FLIPPED_HORIZONTALLY_FLAG != 0,
        vertical: raw_gid & FLIPPED_VERTICALLY_FLAG != 0,
        diagonal: raw_gid & FLIPPED_DIAGONALLY_FLAG != 0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl PropertyValue {
    /// String form of any value, the way level data is usually read back.
    pub fn to_text(&self) -> String {
        match self {
            PropertyValue::String(value) => value.clone(),
            PropertyValue::Int(value) => value.to_string(),
            PropertyValue::Float(value) => value.to_string(),
            PropertyValue::Bool(value) => value.to_string(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(value) => Some(*value),
            PropertyValue::Float(value) if value.fract() == 0.0 => Some(*value as i64),
            PropertyValue::String(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Int(value) => Some(*value as f64),
            PropertyValue::Float(value) => Some(*value),
            PropertyValue::String(value) => value.trim().parse().ok(),
            PropertyValue::Bool(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapObject {
    pub id: u32,
    pub name: String,
    pub object_type: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Tile reference with flip flags stripped.
    pub gid: Option<u32>,
    pub properties: BTreeMap<String, PropertyValue>,
}

impl MapObject {
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn property_text(&self, name: &str) -> Option<String> {
        self.property(name).map(PropertyValue::to_text)
    }

    pub fn property_i64(&self, name: &str) -> Option<i64> {
        self.property(name).and_then(PropertyValue::as_i64)
    }

    pub fn property_f32(&self, name: &str) -> Option<f32> {
        self.property(name)
            .and_then(PropertyValue::as_f64)
            .map(|value| value as f32)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectGroup {
    pub name: String,
    pub visible: bool,
    pub objects: Vec<MapObject>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub visible: bool,
    /// Row-major raw gids, flip flags included.
    pub gids: Vec<u32>,
}

impl TileLayer {
    pub fn raw_gid_at(&self, col: u32, row: u32) -> u32 {
        if col >= self.width || row >= self.height {
            return 0;
        }
        self.gids
            .get((row * self.width + col) as usize)
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TilesetImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationFrame {
    pub tile_id: u32,
    pub duration_ms: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tileset {
    pub first_gid: u32,
    pub name: String,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_count: u32,
    pub columns: u32,
    pub spacing: u32,
    pub margin: u32,
    pub image: Option<TilesetImage>,
    /// Per-tile images of an image-collection tileset, by local id.
    pub tile_images: HashMap<u32, TilesetImage>,
    pub animations: HashMap<u32, Vec<AnimationFrame>>,
}

impl Tileset {
    pub fn contains_gid(&self, gid: u32) -> bool {
        gid >= self.first_gid && gid - self.first_gid < self.tile_count.max(1)
    }

    fn local_image(&self, local_id: u32) -> Option<(PathBuf, PixelRect)> {
        if let Some(image) = self.tile_images.get(&local_id) {
            let source = PixelRect::new(0, 0, image.width as i32, image.height as i32);
            return Some((image.path.clone(), source));
        }
        let image = self.image.as_ref()?;
        let columns = if self.columns > 0 {
            self.columns
        } else {
            let stride = self.tile_width + self.spacing;
            ((image.width.saturating_sub(self.margin) + self.spacing) / stride.max(1)).max(1)
        };
        let col = local_id % columns;
        let row = local_id / columns;
        let x = self.margin + col * (self.tile_width + self.spacing);
        let y = self.margin + row * (self.tile_height + self.spacing);
        let source = PixelRect::new(
            x as i32,
            y as i32,
            self.tile_width as i32,
            self.tile_height as i32,
        );
        Some((image.path.clone(), source))
    }
}

/// Resolved image region for one gid.
#[derive(Debug, Clone, PartialEq)]
pub struct TileImage {
    pub path: PathBuf,
    pub source: PixelRect,
    pub flip: SpriteFlip,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TmxMap {
    pub width: u32,
    pub height: u32,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tile_layers: Vec<TileLayer>,
    pub object_groups: Vec<ObjectGroup>,
    pub tilesets: Vec<Tileset>,
}

impl TmxMap {
    pub fn pixel_width(&self) -> u32 {
        self.width * self.tile_width
    }

    pub fn pixel_height(&self) -> u32 {
        self.height * self.tile_height
    }

    pub fn tile_layer(&self, name: &str) -> Option<&TileLayer> {
        self.tile_layers.iter().find(|layer| layer.name == name)
    }

    pub fn objects(&self) -> impl Iterator<Item = &MapObject> {
        self.object_groups
            .iter()
            .flat_map(|group| group.objects.iter())
    }

    pub fn tileset_for_gid(&self, gid: u32) -> Option<&Tileset> {
        let gid = strip_flip_flags(gid);
        if gid == 0 {
            return None;
        }
        self.tilesets
            .iter()
            .filter(|tileset| tileset.first_gid <= gid)
            .max_by_key(|tileset| tileset.first_gid)
            .filter(|tileset| tileset.contains_gid(gid))
    }

    /// Image region for a raw gid (flip flags honoured), `None` for empty or unknown tiles.
    pub fn tile_image(&self, raw_gid: u32) -> Option<TileImage> {
        let gid = strip_flip_flags(raw_gid);
        let tileset = self.tileset_for_gid(gid)?;
        let (path, source) = tileset.local_image(gid - tileset.first_gid)?;
        Some(TileImage {
            path,
            source,
            flip: flip_of(raw_gid),
        })
    }

    pub fn animation_for(&self, gid: u32) -> Option<&[AnimationFrame]> {
        let gid = strip_flip_flags(gid);
        let tileset = self.tileset_for_gid(gid)?;
        tileset
            .animations
            .get(&(gid - tileset.first_gid))
            .map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet_tileset(first_gid: u32) -> Tileset {
        Tileset {
            first_gid,
            name: "dungeon".to_string(),
            tile_width: 16,
            tile_height: 16,
            tile_count: 40,
            columns: 10,
            spacing: 0,
            margin: 0,
            image: Some(TilesetImage {
                path: PathBuf::from("tiles.png"),
                width: 160,
                height: 64,
            }),
            tile_images: HashMap::new(),
            animations: HashMap::new(),
        }
    }

    fn map_with(tilesets: Vec<Tileset>) -> TmxMap {
        TmxMap {
            width: 4,
            height: 4,
            tile_width: 16,
            tile_height: 16,
            tile_layers: Vec::new(),
            object_groups: Vec::new(),
            tilesets,
        }
    }

    #[test]
    fn strip_flip_flags_keeps_tile_id() {
        let raw = 12 | FLIPPED_HORIZONTALLY_FLAG | FLIPPED_DIAGONALLY_FLAG;
        assert_eq!(strip_flip_flags(raw), 12);
        let flip = flip_of(raw);
        assert!(flip.horizontal && flip.diagonal && !flip.vertical);
    }

    #[test]
    fn tile_image_resolves_sheet_region() {
        let map = map_with(vec![sheet_tileset(1)]);
        let image = map.tile_image(13).expect("tile image");
        assert_eq!(image.path, PathBuf::from("tiles.png"));
        assert_eq!(image.source, PixelRect::new(32, 16, 16, 16));
    }

    #[test]
    fn tile_image_picks_tileset_by_first_gid() {
        let mut second = sheet_tileset(41);
        second.image = Some(TilesetImage {
            path: PathBuf::from("second.png"),
            width: 160,
            height: 64,
        });
        let map = map_with(vec![sheet_tileset(1), second]);
        let image = map.tile_image(41).expect("tile image");
        assert_eq!(image.path, PathBuf::from("second.png"));
        assert_eq!(image.source, PixelRect::new(0, 0, 16, 16));
        assert!(map.tile_image(0).is_none());
        assert!(map.tile_image(500).is_none());
    }

    #[test]
    fn raw_gid_outside_layer_is_empty() {
        let layer = TileLayer {
            name: "Collision".to_string(),
            width: 2,
            height: 1,
            visible: true,
            gids: vec![0, 5],
        };
        assert_eq!(layer.raw_gid_at(1, 0), 5);
        assert_eq!(layer.raw_gid_at(2, 0), 0);
        assert_eq!(layer.raw_gid_at(0, 3), 0);
    }

    #[test]
    fn property_values_convert_between_forms() {
        assert_eq!(PropertyValue::String(" 3 ".to_string()).as_i64(), Some(3));
        assert_eq!(PropertyValue::Float(2.0).as_i64(), Some(2));
        assert_eq!(PropertyValue::Bool(true).to_text(), "true");
        assert_eq!(PropertyValue::Int(25).as_f64(), Some(25.0));
    }
}
