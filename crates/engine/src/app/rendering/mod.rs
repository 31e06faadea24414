mod draw;
mod raster;
mod renderer;
mod text;

pub use draw::{Color, DrawCommand, DrawList, SpriteFlip, SpriteRef, TextAlign};
pub use renderer::{Renderer, Viewport};
pub use text::{glyph_advance, text_height, text_width};
