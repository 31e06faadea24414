use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use roxmltree::{Document, Node};
use thiserror::Error;
use tracing::{debug, warn};

use super::types::{
    strip_flip_flags, AnimationFrame, MapObject, ObjectGroup, PropertyValue, TileLayer, Tileset,
    TilesetImage, TmxMap,
};

#[derive(Debug, Error)]
pub enum TmxError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed XML in {path} at {line}:{column}: {message}")]
    Xml {
        path: PathBuf,
        line: u32,
        column: u32,
        message: String,
    },
    #[error("{path}: root element must be <{expected}>, found <{found}>")]
    InvalidRoot {
        path: PathBuf,
        expected: &'static str,
        found: String,
    },
    #[error("{path}:{line}: <{element}> is missing attribute `{attribute}`")]
    MissingAttribute {
        path: PathBuf,
        line: u32,
        element: String,
        attribute: &'static str,
    },
    #[error("{path}:{line}: invalid value `{value}` for `{attribute}` on <{element}>")]
    InvalidValue {
        path: PathBuf,
        line: u32,
        element: String,
        attribute: &'static str,
        value: String,
    },
    #[error("{path}: layer `{layer}` uses unsupported encoding `{encoding}`; save the map as CSV")]
    UnsupportedEncoding {
        path: PathBuf,
        layer: String,
        encoding: String,
    },
    #[error("{path}: layer `{layer}` has {actual} tiles, expected {expected}")]
    TileCountMismatch {
        path: PathBuf,
        layer: String,
        expected: usize,
        actual: usize,
    },
}

impl TmxMap {
    pub fn load(path: &Path) -> Result<TmxMap, TmxError> {
        let raw = read_to_string(path)?;
        let map = Self::parse_str(&raw, path)?;
        debug!(
            path = %path.display(),
            width = map.width,
            height = map.height,
            tile_layers = map.tile_layers.len(),
            object_groups = map.object_groups.len(),
            tilesets = map.tilesets.len(),
            "tmx_loaded"
        );
        Ok(map)
    }

    /// Parses map XML. `path` locates external tilesets and images and labels errors.
    pub fn parse_str(raw: &str, path: &Path) -> Result<TmxMap, TmxError> {
        let doc = parse_document(raw, path)?;
        let cx = ParseContext { path, doc: &doc };
        let root = doc.root_element();
        if root.tag_name().name() != "map" {
            return Err(TmxError::InvalidRoot {
                path: path.to_path_buf(),
                expected: "map",
                found: root.tag_name().name().to_string(),
            });
        }

        let mut map = TmxMap {
            width: cx.required(root, "width")?,
            height: cx.required(root, "height")?,
            tile_width: cx.required(root, "tilewidth")?,
            tile_height: cx.required(root, "tileheight")?,
            tile_layers: Vec::new(),
            object_groups: Vec::new(),
            tilesets: Vec::new(),
        };

        let base_dir = parent_dir(path);
        for child in root.children().filter(|node| node.is_element()) {
            match child.tag_name().name() {
                "tileset" => map.tilesets.push(cx.tileset_reference(child, &base_dir)?),
                _ => cx.collect_layers(child, &mut map, true)?,
            }
        }
        map.tilesets.sort_by_key(|tileset| tileset.first_gid);
        Ok(map)
    }
}

fn read_to_string(path: &Path) -> Result<String, TmxError> {
    fs::read_to_string(path).map_err(|source| TmxError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_document<'a>(raw: &'a str, path: &Path) -> Result<Document<'a>, TmxError> {
    Document::parse(raw).map_err(|error| TmxError::Xml {
        path: path.to_path_buf(),
        line: error.pos().row,
        column: error.pos().col,
        message: error.to_string(),
    })
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

struct ParseContext<'p, 'd, 'input> {
    path: &'p Path,
    doc: &'d Document<'input>,
}

impl ParseContext<'_, '_, '_> {
    fn line_of(&self, node: Node<'_, '_>) -> u32 {
        self.doc.text_pos_at(node.range().start).row
    }

    fn required<T: FromStr>(&self, node: Node<'_, '_>, attribute: &'static str) -> Result<T, TmxError> {
        let raw = node
            .attribute(attribute)
            .ok_or_else(|| TmxError::MissingAttribute {
                path: self.path.to_path_buf(),
                line: self.line_of(node),
                element: node.tag_name().name().to_string(),
                attribute,
            })?;
        self.parse_value(node, attribute, raw)
    }

    fn optional<T: FromStr>(
        &self,
        node: Node<'_, '_>,
        attribute: &'static str,
    ) -> Result<Option<T>, TmxError> {
        node.attribute(attribute)
            .map(|raw| self.parse_value(node, attribute, raw))
            .transpose()
    }

    fn parse_value<T: FromStr>(
        &self,
        node: Node<'_, '_>,
        attribute: &'static str,
        raw: &str,
    ) -> Result<T, TmxError> {
        raw.trim().parse::<T>().map_err(|_| TmxError::InvalidValue {
            path: self.path.to_path_buf(),
            line: self.line_of(node),
            element: node.tag_name().name().to_string(),
            attribute,
            value: raw.to_string(),
        })
    }

    /// Walks layers, recursing into `<group>` so grouped layers keep document order.
    fn collect_layers(
        &self,
        node: Node<'_, '_>,
        map: &mut TmxMap,
        parent_visible: bool,
    ) -> Result<(), TmxError> {
        let visible = parent_visible && node.attribute("visible") != Some("0");
        match node.tag_name().name() {
            "layer" => map.tile_layers.push(self.tile_layer(node, visible)?),
            "objectgroup" => map.object_groups.push(self.object_group(node, visible)?),
            "group" => {
                for child in node.children().filter(|child| child.is_element()) {
                    self.collect_layers(child, map, visible)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn tile_layer(&self, node: Node<'_, '_>, visible: bool) -> Result<TileLayer, TmxError> {
        let name = node.attribute("name").unwrap_or_default().to_string();
        let width: u32 = self.required(node, "width")?;
        let height: u32 = self.required(node, "height")?;
        let expected = (width as usize) * (height as usize);

        let gids = match node
            .children()
            .find(|child| child.has_tag_name("data"))
        {
            Some(data) => self.layer_data(data, &name)?,
            None => vec![0; expected],
        };
        if gids.len() != expected {
            return Err(TmxError::TileCountMismatch {
                path: self.path.to_path_buf(),
                layer: name,
                expected,
                actual: gids.len(),
            });
        }
        Ok(TileLayer {
            name,
            width,
            height,
            visible,
            gids,
        })
    }

    fn layer_data(&self, data: Node<'_, '_>, layer: &str) -> Result<Vec<u32>, TmxError> {
        match data.attribute("encoding") {
            Some("csv") => {
                let text = data.text().unwrap_or_default();
                text.split(',')
                    .map(str::trim)
                    .filter(|entry| !entry.is_empty())
                    .map(|entry| self.parse_value(data, "csv", entry))
                    .collect()
            }
            None => data
                .children()
                .filter(|child| child.has_tag_name("tile"))
                .map(|tile| self.optional::<u32>(tile, "gid").map(|gid| gid.unwrap_or(0)))
                .collect(),
            Some(other) => Err(TmxError::UnsupportedEncoding {
                path: self.path.to_path_buf(),
                layer: layer.to_string(),
                encoding: other.to_string(),
            }),
        }
    }

    fn object_group(&self, node: Node<'_, '_>, visible: bool) -> Result<ObjectGroup, TmxError> {
        let objects = node
            .children()
            .filter(|child| child.has_tag_name("object"))
            .map(|object| self.object(object))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ObjectGroup {
            name: node.attribute("name").unwrap_or_default().to_string(),
            visible,
            objects,
        })
    }

    fn object(&self, node: Node<'_, '_>) -> Result<MapObject, TmxError> {
        let properties = self.properties(node)?;
        let gid = self.optional::<u32>(node, "gid")?.map(strip_flip_flags);
        let width = self.optional(node, "width")?.unwrap_or(0.0);
        let height = self.optional(node, "height")?.unwrap_or(0.0);
        let mut y: f32 = self.optional(node, "y")?.unwrap_or(0.0);
        if gid.is_some() {
            // Tile objects are anchored at their bottom-left corner.
            y -= height;
        }

        let object_type = properties
            .get("obj_type")
            .map(PropertyValue::to_text)
            .or_else(|| node.attribute("type").map(str::to_string))
            .or_else(|| node.attribute("class").map(str::to_string))
            .unwrap_or_default();
        let name = properties
            .get("obj_name")
            .map(PropertyValue::to_text)
            .or_else(|| node.attribute("name").map(str::to_string))
            .unwrap_or_default();

        Ok(MapObject {
            id: self.optional(node, "id")?.unwrap_or(0),
            name,
            object_type,
            x: self.optional(node, "x")?.unwrap_or(0.0),
            y,
            width,
            height,
            gid,
            properties,
        })
    }

    fn properties(&self, node: Node<'_, '_>) -> Result<BTreeMap<String, PropertyValue>, TmxError> {
        let mut properties = BTreeMap::new();
        let Some(container) = node
            .children()
            .find(|child| child.has_tag_name("properties"))
        else {
            return Ok(properties);
        };
        for property in container
            .children()
            .filter(|child| child.has_tag_name("property"))
        {
            let name: String = self.required(property, "name")?;
            let raw = property
                .attribute("value")
                .or_else(|| property.text())
                .unwrap_or_default();
            let value = match property.attribute("type").unwrap_or("string") {
                "int" | "object" => PropertyValue::Int(self.parse_value(property, "value", raw)?),
                "float" => PropertyValue::Float(self.parse_value(property, "value", raw)?),
                "bool" => PropertyValue::Bool(raw.trim() == "true" || raw.trim() == "1"),
                _ => PropertyValue::String(raw.to_string()),
            };
            properties.insert(name, value);
        }
        Ok(properties)
    }

    fn tileset_reference(&self, node: Node<'_, '_>, base_dir: &Path) -> Result<Tileset, TmxError> {
        let first_gid: u32 = self.required(node, "firstgid")?;
        match node.attribute("source") {
            Some(source) => load_external_tileset(&base_dir.join(source), first_gid),
            None => self.tileset_body(node, first_gid, base_dir),
        }
    }

    fn tileset_body(
        &self,
        node: Node<'_, '_>,
        first_gid: u32,
        base_dir: &Path,
    ) -> Result<Tileset, TmxError> {
        let mut tileset = Tileset {
            first_gid,
            name: node.attribute("name").unwrap_or_default().to_string(),
            tile_width: self.required(node, "tilewidth")?,
            tile_height: self.required(node, "tileheight")?,
            tile_count: self.optional(node, "tilecount")?.unwrap_or(0),
            columns: self.optional(node, "columns")?.unwrap_or(0),
            spacing: self.optional(node, "spacing")?.unwrap_or(0),
            margin: self.optional(node, "margin")?.unwrap_or(0),
            image: None,
            tile_images: HashMap::new(),
            animations: HashMap::new(),
        };

        for child in node.children().filter(|child| child.is_element()) {
            match child.tag_name().name() {
                "image" => tileset.image = Some(self.image(child, base_dir)?),
                "tile" => {
                    let local_id: u32 = self.required(child, "id")?;
                    if let Some(image) = child.children().find(|n| n.has_tag_name("image")) {
                        tileset
                            .tile_images
                            .insert(local_id, self.image(image, base_dir)?);
                    }
                    if let Some(animation) = child.children().find(|n| n.has_tag_name("animation")) {
                        let frames = self.animation_frames(animation)?;
                        if !frames.is_empty() {
                            tileset.animations.insert(local_id, frames);
                        }
                    }
                }
                _ => {}
            }
        }

        if tileset.tile_count == 0 {
            tileset.tile_count = infer_tile_count(&tileset);
        }
        Ok(tileset)
    }

    fn image(&self, node: Node<'_, '_>, base_dir: &Path) -> Result<TilesetImage, TmxError> {
        let source: String = self.required(node, "source")?;
        Ok(TilesetImage {
            path: base_dir.join(source),
            width: self.optional(node, "width")?.unwrap_or(0),
            height: self.optional(node, "height")?.unwrap_or(0),
        })
    }

    fn animation_frames(&self, node: Node<'_, '_>) -> Result<Vec<AnimationFrame>, TmxError> {
        node.children()
            .filter(|child| child.has_tag_name("frame"))
            .map(|frame| -> Result<AnimationFrame, TmxError> {
                Ok(AnimationFrame {
                    tile_id: self.required(frame, "tileid")?,
                    duration_ms: self.required(frame, "duration")?,
                })
            })
            .collect()
    }
}

fn load_external_tileset(path: &Path, first_gid: u32) -> Result<Tileset, TmxError> {
    let raw = read_to_string(path)?;
    let doc = parse_document(&raw, path)?;
    let cx = ParseContext { path, doc: &doc };
    let root = doc.root_element();
    if root.tag_name().name() != "tileset" {
        return Err(TmxError::InvalidRoot {
            path: path.to_path_buf(),
            expected: "tileset",
            found: root.tag_name().name().to_string(),
        });
    }
    cx.tileset_body(root, first_gid, &parent_dir(path))
}

fn infer_tile_count(tileset: &Tileset) -> u32 {
    if let Some(image) = &tileset.image {
        let stride_x = (tileset.tile_width + tileset.spacing).max(1);
        let stride_y = (tileset.tile_height + tileset.spacing).max(1);
        let usable_w = image.width.saturating_sub(tileset.margin) + tileset.spacing;
        let usable_h = image.height.saturating_sub(tileset.margin) + tileset.spacing;
        let count = (usable_w / stride_x) * (usable_h / stride_y);
        if count > 0 {
            return count;
        }
    }
    let highest = tileset.tile_images.keys().copied().max();
    match highest {
        Some(id) => id + 1,
        None => {
            warn!(tileset = tileset.name.as_str(), "tmx_tileset_has_no_tiles");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::PixelRect;

    const SMALL_MAP: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<map version="1.10" orientation="orthogonal" width="3" height="2" tilewidth="16" tileheight="16">
  <tileset firstgid="1" name="dungeon" tilewidth="16" tileheight="16" tilecount="8" columns="4">
    <image source="tiles/dungeon.png" width="64" height="32"/>
    <tile id="5">
      <animation>
        <frame tileid="5" duration="150"/>
        <frame tileid="6" duration="150"/>
      </animation>
    </tile>
  </tileset>
  <layer id="1" name="Background" width="3" height="2">
    <data encoding="csv">
1,2,3,
4,5,6
</data>
  </layer>
  <group name="walls">
    <layer id="2" name="Collision" width="3" height="2" visible="0">
      <data>
        <tile gid="0"/><tile gid="2147483650"/><tile/>
        <tile/><tile/><tile gid="7"/>
      </data>
    </layer>
  </group>
  <objectgroup id="3" name="Objects">
    <object id="1" name="spawn" type="spawn" x="20" y="24"/>
    <object id="2" name="door" gid="67" x="32" y="48" width="16" height="16">
      <properties>
        <property name="obj_type" value="door"/>
        <property name="required_key" value="golden"/>
        <property name="key_count" type="int" value="2"/>
      </properties>
    </object>
    <object id="3" class="trap" x="8.5" y="4">
      <properties>
        <property name="damage" type="float" value="12.5"/>
        <property name="note">multi
line</property>
      </properties>
    </object>
  </objectgroup>
</map>
"#;

    fn parse(raw: &str) -> Result<TmxMap, TmxError> {
        TmxMap::parse_str(raw, Path::new("/game/maps/test.tmx"))
    }

    #[test]
    fn parses_dimensions_and_layers() {
        let map = parse(SMALL_MAP).expect("parse");
        assert_eq!((map.width, map.height), (3, 2));
        assert_eq!((map.pixel_width(), map.pixel_height()), (48, 32));
        let background = map.tile_layer("Background").expect("background");
        assert_eq!(background.gids, vec![1, 2, 3, 4, 5, 6]);
        let collision = map.tile_layer("Collision").expect("collision");
        assert!(!collision.visible);
        assert_eq!(strip_flip_flags(collision.raw_gid_at(1, 0)), 2);
        assert_eq!(collision.raw_gid_at(2, 1), 7);
        assert_eq!(collision.raw_gid_at(2, 0), 0);
    }

    #[test]
    fn object_type_prefers_obj_type_property() {
        let map = parse(SMALL_MAP).expect("parse");
        let objects: Vec<_> = map.objects().collect();
        assert_eq!(objects.len(), 3);
        assert_eq!(objects[0].object_type, "spawn");
        assert_eq!(objects[1].object_type, "door");
        assert_eq!(objects[1].property_text("required_key").as_deref(), Some("golden"));
        assert_eq!(objects[1].property_i64("key_count"), Some(2));
        assert_eq!(objects[2].object_type, "trap");
        assert_eq!(objects[2].property_f32("damage"), Some(12.5));
        assert_eq!(objects[2].property_text("note").as_deref(), Some("multi\nline"));
    }

    #[test]
    fn tile_objects_are_moved_up_by_their_height() {
        let map = parse(SMALL_MAP).expect("parse");
        let door = map.objects().nth(1).expect("door");
        assert_eq!(door.gid, Some(67));
        assert_eq!(door.y, 32.0);
        let spawn = map.objects().next().expect("spawn");
        assert_eq!(spawn.y, 24.0);
    }

    #[test]
    fn tileset_image_paths_resolve_against_map_dir() {
        let map = parse(SMALL_MAP).expect("parse");
        let image = map.tile_image(6).expect("tile image");
        assert_eq!(image.path, PathBuf::from("/game/maps/tiles/dungeon.png"));
        assert_eq!(image.source, PixelRect::new(16, 16, 16, 16));
        let frames = map.animation_for(6).expect("animation");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].tile_id, 6);
    }

    #[test]
    fn base64_layers_are_rejected() {
        let raw = r#"<map width="1" height="1" tilewidth="16" tileheight="16">
  <layer name="Collision" width="1" height="1"><data encoding="base64">AQAAAA==</data></layer>
</map>"#;
        let error = parse(raw).expect_err("base64 must fail");
        assert!(matches!(error, TmxError::UnsupportedEncoding { .. }));
    }

    #[test]
    fn short_layer_data_is_a_count_mismatch() {
        let raw = r#"<map width="2" height="2" tilewidth="16" tileheight="16">
  <layer name="Collision" width="2" height="2"><data encoding="csv">1,0,1</data></layer>
</map>"#;
        match parse(raw) {
            Err(TmxError::TileCountMismatch {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_map_attribute_reports_name() {
        let raw = r#"<map width="2" tilewidth="16" tileheight="16"></map>"#;
        match parse(raw) {
            Err(TmxError::MissingAttribute { attribute, .. }) => assert_eq!(attribute, "height"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn malformed_xml_reports_position() {
        let error = parse("<map width=\"1\"").expect_err("malformed");
        assert!(matches!(error, TmxError::Xml { line: 1, .. }));
    }

    #[test]
    fn external_tileset_is_loaded_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tsx = r#"<?xml version="1.0"?>
<tileset name="props" tilewidth="16" tileheight="16" tilecount="2" columns="0">
  <tile id="0"><image source="props/torch.png" width="16" height="16"/></tile>
  <tile id="1"><image source="props/ladder.png" width="16" height="32"/></tile>
</tileset>"#;
        fs::write(dir.path().join("props.tsx"), tsx).expect("write tsx");
        let tmx = r#"<map width="1" height="1" tilewidth="16" tileheight="16">
  <tileset firstgid="40" source="props.tsx"/>
  <layer name="Background" width="1" height="1"><data encoding="csv">41</data></layer>
</map>"#;
        let map_path = dir.path().join("level.tmx");
        fs::write(&map_path, tmx).expect("write tmx");

        let map = TmxMap::load(&map_path).expect("load");
        let image = map.tile_image(41).expect("ladder");
        assert_eq!(image.path, dir.path().join("props/ladder.png"));
        assert_eq!(image.source, PixelRect::new(0, 0, 16, 32));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let error = TmxMap::load(&dir.path().join("nope.tmx")).expect_err("missing");
        assert!(matches!(error, TmxError::Io { .. }));
    }
}
