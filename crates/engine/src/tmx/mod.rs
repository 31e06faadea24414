//! Tiled TMX/TSX map loading.

mod animation;
mod parser;
mod types;

pub use animation::TileAnimator;
pub use parser::TmxError;
pub use types::{
    flip_of, strip_flip_flags, AnimationFrame, MapObject, ObjectGroup, PropertyValue, TileImage,
    TileLayer, Tileset, TilesetImage, TmxMap, FLIPPED_DIAGONALLY_FLAG,
    FLIPPED_HORIZONTALLY_FLAG, FLIPPED_VERTICALLY_FLAG, FLIP_FLAGS_MASK,
};
