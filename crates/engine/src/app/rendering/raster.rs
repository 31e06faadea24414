use crate::app::geometry::PixelRect;

use super::draw::{Color, SpriteFlip, TextAlign};
use super::text::{for_each_text_pixel, text_width};

pub(crate) struct LoadedSprite {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) rgba: Vec<u8>,
}

impl LoadedSprite {
    fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width as i32, self.height as i32)
    }

    fn pixel(&self, x: i32, y: i32) -> [u8; 4] {
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.rgba[offset],
            self.rgba[offset + 1],
            self.rgba[offset + 2],
            self.rgba[offset + 3],
        ]
    }
}

/// RGBA8 frame buffer view with clipped, alpha-blended drawing.
pub(crate) struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width as i32, self.height as i32)
    }

    pub(crate) fn clear(&mut self, color: Color) {
        let color = color.to_array();
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color);
        }
    }

    pub(crate) fn blend_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if color[3] == 0 || x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let Some(dst) = self.frame.get_mut(offset..offset + 4) else {
            return;
        };
        if color[3] == 255 {
            dst.copy_from_slice(&color);
            return;
        }
        let alpha = u32::from(color[3]);
        let inverse = 255 - alpha;
        for channel in 0..3 {
            let blended = (u32::from(color[channel]) * alpha + u32::from(dst[channel]) * inverse) / 255;
            dst[channel] = blended as u8;
        }
        dst[3] = 255;
    }

    pub(crate) fn fill_rect(&mut self, rect: PixelRect, color: Color) {
        let Some(clipped) = rect.intersection(&self.bounds()) else {
            return;
        };
        let color = color.to_array();
        for y in clipped.top()..clipped.bottom() {
            for x in clipped.left()..clipped.right() {
                self.blend_pixel(x, y, color);
            }
        }
    }

    pub(crate) fn outline_rect(&mut self, rect: PixelRect, color: Color, thickness: i32) {
        let t = thickness.max(1).min(rect.w / 2).min(rect.h / 2).max(1);
        self.fill_rect(PixelRect::new(rect.x, rect.y, rect.w, t), color);
        self.fill_rect(PixelRect::new(rect.x, rect.bottom() - t, rect.w, t), color);
        self.fill_rect(PixelRect::new(rect.x, rect.y + t, t, rect.h - 2 * t), color);
        self.fill_rect(
            PixelRect::new(rect.right() - t, rect.y + t, t, rect.h - 2 * t),
            color,
        );
    }

    pub(crate) fn vertical_gradient(&mut self, rect: PixelRect, top: Color, bottom: Color) {
        let Some(clipped) = rect.intersection(&self.bounds()) else {
            return;
        };
        let span = (rect.h - 1).max(1) as f32;
        for y in clipped.top()..clipped.bottom() {
            let t = (y - rect.y) as f32 / span;
            let lerp = |a: u8, b: u8| (f32::from(a) + (f32::from(b) - f32::from(a)) * t) as u8;
            let color = [
                lerp(top.r, bottom.r),
                lerp(top.g, bottom.g),
                lerp(top.b, bottom.b),
                lerp(top.a, bottom.a),
            ];
            for x in clipped.left()..clipped.right() {
                self.blend_pixel(x, y, color);
            }
        }
    }

    /// Nearest-neighbour scaled blit of `source` (or the whole sprite) into `dest`.
    pub(crate) fn blit(
        &mut self,
        sprite: &LoadedSprite,
        source: Option<PixelRect>,
        flip: SpriteFlip,
        dest: PixelRect,
    ) {
        let source = match source {
            Some(region) if region.intersection(&sprite.bounds()) == Some(region) => region,
            Some(_) => return,
            None => sprite.bounds(),
        };
        if source.is_empty() || dest.is_empty() {
            return;
        }
        let Some(clipped) = dest.intersection(&self.bounds()) else {
            return;
        };
        let (src_w, src_h) = if flip.diagonal {
            (source.h, source.w)
        } else {
            (source.w, source.h)
        };
        for y in clipped.top()..clipped.bottom() {
            let mut v = ((y - dest.y) as i64 * src_h as i64 / dest.h as i64) as i32;
            if flip.vertical {
                v = src_h - 1 - v;
            }
            for x in clipped.left()..clipped.right() {
                let mut u = ((x - dest.x) as i64 * src_w as i64 / dest.w as i64) as i32;
                if flip.horizontal {
                    u = src_w - 1 - u;
                }
                let (sx, sy) = if flip.diagonal { (v, u) } else { (u, v) };
                let pixel = sprite.pixel(source.x + sx, source.y + sy);
                self.blend_pixel(x, y, pixel);
            }
        }
    }

    pub(crate) fn text(
        &mut self,
        text: &str,
        x: i32,
        y: i32,
        scale: i32,
        color: Color,
        align: TextAlign,
    ) {
        let origin_x = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - text_width(text, scale) / 2,
        };
        let color = color.to_array();
        for_each_text_pixel(text, origin_x, y, scale, |px, py| {
            self.blend_pixel(px, py, color);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel_at(frame: &[u8], width: u32, x: usize, y: usize) -> [u8; 4] {
        let offset = (y * width as usize + x) * 4;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    #[test]
    fn fill_rect_is_clipped_to_frame() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut canvas = Canvas::new(&mut frame, 4, 4);
        canvas.fill_rect(PixelRect::new(-2, -2, 4, 4), Color::rgb(255, 0, 0));
        assert_eq!(pixel_at(&frame, 4, 1, 1), [255, 0, 0, 255]);
        assert_eq!(pixel_at(&frame, 4, 2, 2), [0, 0, 0, 0]);
    }

    #[test]
    fn translucent_fill_blends_with_background() {
        let mut frame = vec![0u8; 4];
        let mut canvas = Canvas::new(&mut frame, 1, 1);
        canvas.clear(Color::rgb(200, 200, 200));
        canvas.fill_rect(PixelRect::new(0, 0, 1, 1), Color::rgba(0, 0, 0, 128));
        let value = pixel_at(&frame, 1, 0, 0)[0];
        assert!((98..=101).contains(&value), "blended value {value}");
    }

    #[test]
    fn blit_scales_nearest_neighbour_and_skips_transparent() {
        let sprite = LoadedSprite {
            width: 2,
            height: 1,
            rgba: vec![10, 20, 30, 255, 0, 0, 0, 0],
        };
        let mut frame = vec![0u8; 4 * 4 * 2];
        let mut canvas = Canvas::new(&mut frame, 4, 2);
        canvas.clear(Color::rgb(1, 1, 1));
        canvas.blit(&sprite, None, SpriteFlip::default(), PixelRect::new(0, 0, 4, 2));
        assert_eq!(pixel_at(&frame, 4, 1, 1), [10, 20, 30, 255]);
        assert_eq!(pixel_at(&frame, 4, 3, 0), [1, 1, 1, 255]);
    }

    #[test]
    fn horizontal_flip_mirrors_source() {
        let sprite = LoadedSprite {
            width: 2,
            height: 1,
            rgba: vec![255, 0, 0, 255, 0, 255, 0, 255],
        };
        let mut frame = vec![0u8; 2 * 4];
        let mut canvas = Canvas::new(&mut frame, 2, 1);
        let flip = SpriteFlip {
            horizontal: true,
            ..SpriteFlip::default()
        };
        canvas.blit(&sprite, None, flip, PixelRect::new(0, 0, 2, 1));
        assert_eq!(pixel_at(&frame, 2, 0, 0), [0, 255, 0, 255]);
        assert_eq!(pixel_at(&frame, 2, 1, 0), [255, 0, 0, 255]);
    }

    #[test]
    fn source_region_outside_sprite_draws_nothing() {
        let sprite = LoadedSprite {
            width: 1,
            height: 1,
            rgba: vec![9, 9, 9, 255],
        };
        let mut frame = vec![0u8; 4];
        let mut canvas = Canvas::new(&mut frame, 1, 1);
        canvas.blit(
            &sprite,
            Some(PixelRect::new(0, 0, 4, 4)),
            SpriteFlip::default(),
            PixelRect::new(0, 0, 1, 1),
        );
        assert_eq!(pixel_at(&frame, 1, 0, 0), [0, 0, 0, 0]);
    }
}
