#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Vec2) -> f32 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// Integer rectangle in world units.
///
/// Float coordinates are truncated toward zero on construction, overlap is
/// strict, and empty rectangles never overlap anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl PixelRect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_world(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            x: x as i32,
            y: y as i32,
            w: w as i32,
            h: h as i32,
        }
    }

    pub const fn left(&self) -> i32 {
        self.x
    }

    pub const fn top(&self) -> i32 {
        self.y
    }

    pub const fn right(&self) -> i32 {
        self.x + self.w
    }

    pub const fn bottom(&self) -> i32 {
        self.y + self.h
    }

    pub const fn is_empty(&self) -> bool {
        self.w <= 0 || self.h <= 0
    }

    /// Grows the rectangle by `dw`/`dh` in total around its center.
    pub const fn inflate(&self, dw: i32, dh: i32) -> Self {
        Self {
            x: self.x - dw / 2,
            y: self.y - dh / 2,
            w: self.w + dw,
            h: self.h + dh,
        }
    }

    pub const fn overlaps(&self, other: &PixelRect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub const fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Overlapping region, or `None` when the rectangles do not overlap.
    pub fn intersection(&self, other: &PixelRect) -> Option<PixelRect> {
        if !self.overlaps(other) {
            return None;
        }
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        Some(PixelRect::new(x, y, right - x, bottom - y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_world_truncates_toward_zero() {
        let rect = PixelRect::from_world(3.9, 16.2, 10.0, 8.7);
        assert_eq!(rect, PixelRect::new(3, 16, 10, 8));
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let a = PixelRect::new(0, 0, 16, 16);
        let b = PixelRect::new(16, 0, 16, 16);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&PixelRect::new(15, 15, 16, 16)));
    }

    #[test]
    fn empty_rect_never_overlaps() {
        let a = PixelRect::new(0, 0, 16, 16);
        assert!(!a.overlaps(&PixelRect::new(4, 4, 0, 8)));
        assert!(!PixelRect::new(4, 4, 8, 0).overlaps(&a));
    }

    #[test]
    fn inflate_keeps_center() {
        let rect = PixelRect::new(32, 48, 16, 16).inflate(8, 8);
        assert_eq!(rect, PixelRect::new(28, 44, 24, 24));
        let wide = PixelRect::new(10, 10, 24, 24).inflate(16, 16);
        assert_eq!(wide, PixelRect::new(2, 2, 40, 40));
    }

    #[test]
    fn intersection_clips_to_shared_area() {
        let a = PixelRect::new(0, 0, 20, 20);
        let b = PixelRect::new(10, 5, 20, 5);
        assert_eq!(a.intersection(&b), Some(PixelRect::new(10, 5, 10, 5)));
        assert_eq!(a.intersection(&PixelRect::new(40, 40, 2, 2)), None);
    }

    #[test]
    fn distance_is_euclidean() {
        let d = Vec2::new(0.0, 0.0).distance(Vec2::new(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-6);
    }
}
