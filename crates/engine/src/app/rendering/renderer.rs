use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Error, Pixels, SurfaceTexture};
use tracing::warn;
use winit::window::Window;

use super::draw::{Color, DrawCommand, DrawList, SpriteRef};
use super::raster::{Canvas, LoadedSprite};

const CLEAR_COLOR: Color = Color::rgb(0, 0, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Window-backed software renderer executing a [`DrawList`] per frame.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
    asset_root: PathBuf,
    sprite_cache: SpriteCache,
}

impl Renderer {
    pub fn new(window: Arc<Window>, asset_root: PathBuf) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
            asset_root,
            sprite_cache: SpriteCache::default(),
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub fn render(&mut self, draw_list: &DrawList) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }
        let frame = self.pixels.frame_mut();
        let mut canvas = Canvas::new(frame, self.viewport.width, self.viewport.height);
        canvas.clear(CLEAR_COLOR);
        execute_draw_list(
            &mut canvas,
            draw_list,
            &mut self.sprite_cache,
            &self.asset_root,
        );
        self.pixels.render()
    }
}

pub(crate) fn execute_draw_list(
    canvas: &mut Canvas<'_>,
    draw_list: &DrawList,
    sprite_cache: &mut SpriteCache,
    asset_root: &Path,
) {
    for command in draw_list.commands() {
        match command {
            DrawCommand::Clear(color) => canvas.clear(*color),
            DrawCommand::FillRect { rect, color } => canvas.fill_rect(*rect, *color),
            DrawCommand::OutlineRect {
                rect,
                color,
                thickness,
            } => canvas.outline_rect(*rect, *color, *thickness),
            DrawCommand::VerticalGradient { rect, top, bottom } => {
                canvas.vertical_gradient(*rect, *top, *bottom)
            }
            DrawCommand::Sprite {
                sprite,
                dest,
                fallback,
            } => match sprite_cache.get_or_load(sprite, asset_root) {
                Some(loaded) => canvas.blit(loaded, sprite.source, sprite.flip, *dest),
                None => {
                    if let Some(color) = fallback {
                        canvas.fill_rect(*dest, *color);
                    }
                }
            },
            DrawCommand::Text {
                text,
                x,
                y,
                scale,
                color,
                align,
            } => canvas.text(text, *x, *y, *scale, *color, *align),
        }
    }
}

/// Decoded images keyed by resolved path. Failed loads are cached as `None`
/// and reported once.
#[derive(Default)]
pub(crate) struct SpriteCache {
    loaded: HashMap<PathBuf, Option<LoadedSprite>>,
    warned_paths: HashSet<PathBuf>,
}

impl SpriteCache {
    fn get_or_load(&mut self, sprite: &SpriteRef, asset_root: &Path) -> Option<&LoadedSprite> {
        let resolved = if sprite.path.is_absolute() {
            sprite.path.clone()
        } else {
            asset_root.join(&sprite.path)
        };
        if !self.loaded.contains_key(&resolved) {
            let loaded = match load_sprite_rgba(&resolved) {
                Ok(loaded) => Some(loaded),
                Err(reason) => {
                    warn_sprite_load_once(&mut self.warned_paths, &resolved, &reason);
                    None
                }
            };
            self.loaded.insert(resolved.clone(), loaded);
        }
        self.loaded.get(&resolved).and_then(Option::as_ref)
    }
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}

fn warn_sprite_load_once(warned_paths: &mut HashSet<PathBuf>, path: &Path, reason: &str) {
    if !warned_paths.insert(path.to_path_buf()) {
        return;
    }
    warn!(
        path = %path.display(),
        reason = reason,
        "renderer_sprite_load_failed_using_placeholder"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::geometry::PixelRect;

    #[test]
    fn missing_sprite_draws_fallback_color() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut draw_list = DrawList::new();
        draw_list.sprite(
            SpriteRef::whole("does/not/exist.png"),
            PixelRect::new(0, 0, 2, 2),
            Some(Color::rgb(0, 150, 255)),
        );
        let mut frame = vec![0u8; 2 * 2 * 4];
        let mut cache = SpriteCache::default();
        {
            let mut canvas = Canvas::new(&mut frame, 2, 2);
            execute_draw_list(&mut canvas, &draw_list, &mut cache, dir.path());
        }
        assert_eq!(&frame[0..4], &[0, 150, 255, 255]);
        assert_eq!(cache.warned_paths.len(), 1);
    }

    #[test]
    fn failed_load_is_cached_and_skipped_without_fallback() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut draw_list = DrawList::new();
        draw_list.clear_to(Color::rgb(5, 5, 5));
        draw_list.sprite(
            SpriteRef::whole("missing.png"),
            PixelRect::new(0, 0, 1, 1),
            None,
        );
        let mut frame = vec![0u8; 4];
        let mut cache = SpriteCache::default();
        {
            let mut canvas = Canvas::new(&mut frame, 1, 1);
            execute_draw_list(&mut canvas, &draw_list, &mut cache, dir.path());
            execute_draw_list(&mut canvas, &draw_list, &mut cache, dir.path());
        }
        assert_eq!(&frame[0..4], &[5, 5, 5, 255]);
        assert_eq!(cache.loaded.len(), 1);
    }
}
