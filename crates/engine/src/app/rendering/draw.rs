use std::path::PathBuf;

use crate::app::geometry::PixelRect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Tiled-style flip flags; diagonal swaps the axes before the other flips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SpriteFlip {
    pub horizontal: bool,
    pub vertical: bool,
    pub diagonal: bool,
}

/// An image on disk plus an optional source region. Relative paths resolve
/// against the renderer's asset root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SpriteRef {
    pub path: PathBuf,
    pub source: Option<PixelRect>,
    pub flip: SpriteFlip,
}

impl SpriteRef {
    pub fn whole(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: None,
            flip: SpriteFlip::default(),
        }
    }

    pub fn region(path: impl Into<PathBuf>, source: PixelRect) -> Self {
        Self {
            path: path.into(),
            source: Some(source),
            flip: SpriteFlip::default(),
        }
    }

    pub fn flipped(mut self, flip: SpriteFlip) -> Self {
        self.flip = flip;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    /// `x` is the horizontal center of the text.
    Center,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear(Color),
    FillRect {
        rect: PixelRect,
        color: Color,
    },
    OutlineRect {
        rect: PixelRect,
        color: Color,
        thickness: i32,
    },
    VerticalGradient {
        rect: PixelRect,
        top: Color,
        bottom: Color,
    },
    Sprite {
        sprite: SpriteRef,
        dest: PixelRect,
        fallback: Option<Color>,
    },
    Text {
        text: String,
        x: i32,
        y: i32,
        scale: i32,
        color: Color,
        align: TextAlign,
    },
}

/// Screen-space draw commands for one frame, executed in order.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn clear_to(&mut self, color: Color) {
        self.push(DrawCommand::Clear(color));
    }

    pub fn fill_rect(&mut self, rect: PixelRect, color: Color) {
        self.push(DrawCommand::FillRect { rect, color });
    }

    pub fn outline_rect(&mut self, rect: PixelRect, color: Color, thickness: i32) {
        self.push(DrawCommand::OutlineRect {
            rect,
            color,
            thickness,
        });
    }

    pub fn sprite(&mut self, sprite: SpriteRef, dest: PixelRect, fallback: Option<Color>) {
        self.push(DrawCommand::Sprite {
            sprite,
            dest,
            fallback,
        });
    }

    pub fn text(&mut self, text: impl Into<String>, x: i32, y: i32, scale: i32, color: Color) {
        self.push(DrawCommand::Text {
            text: text.into(),
            x,
            y,
            scale,
            color,
            align: TextAlign::Left,
        });
    }

    pub fn text_centered(
        &mut self,
        text: impl Into<String>,
        center_x: i32,
        y: i32,
        scale: i32,
        color: Color,
    ) {
        self.push(DrawCommand::Text {
            text: text.into(),
            x: center_x,
            y,
            scale,
            color,
            align: TextAlign::Center,
        });
    }
}
