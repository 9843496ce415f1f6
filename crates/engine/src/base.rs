use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

pub const TILE_SIZE_PX: i32 = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Vector {
    pub x: i32,
    pub y: i32,
}

impl Vector {
    pub const ZERO: Vector = Vector { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Vector {
    type Output = Vector;

    fn add(self, rhs: Vector) -> Vector {
        Vector::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vector {
    type Output = Vector;

    fn sub(self, rhs: Vector) -> Vector {
        Vector::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl AddAssign for Vector {
    fn add_assign(&mut self, rhs: Vector) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl SubAssign for Vector {
    fn sub_assign(&mut self, rhs: Vector) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Neg for Vector {
    type Output = Vector;

    fn neg(self) -> Vector {
        Vector::new(-self.x, -self.y)
    }
}

impl Mul<i32> for Vector {
    type Output = Vector;

    fn mul(self, rhs: i32) -> Vector {
        Vector::new(self.x * rhs, self.y * rhs)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointF {
    pub x: f32,
    pub y: f32,
}

impl PointF {
    pub const ZERO: PointF = PointF { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extents {
    pub width: i32,
    pub height: i32,
}

impl Extents {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Inclusive integer rectangle: `right()`/`bottom()` name the last covered
/// column/row, so a 1x1 rect has `left == right`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub top_left: Vector,
    pub size: Extents,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            top_left: Vector::new(x, y),
            size: Extents::new(width, height),
        }
    }

    pub fn left(&self) -> i32 {
        self.top_left.x
    }

    pub fn top(&self) -> i32 {
        self.top_left.y
    }

    pub fn right(&self) -> i32 {
        self.top_left.x + self.size.width - 1
    }

    pub fn bottom(&self) -> i32 {
        self.top_left.y + self.size.height - 1
    }

    pub fn bottom_left(&self) -> Vector {
        Vector::new(self.left(), self.bottom())
    }

    pub fn is_valid(&self) -> bool {
        self.size.width > 0 && self.size.height > 0
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.left() > other.right()
            || self.right() < other.left()
            || self.top() > other.bottom()
            || self.bottom() < other.top())
    }

    pub fn contains_point(&self, point: Vector) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }

    pub fn translated(&self, offset: Vector) -> Rect {
        Rect {
            top_left: self.top_left + offset,
            size: self.size,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    pub fn to_unit(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

/// Decoded RGBA image, rows top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl Image {
    pub fn new(width: u32, height: u32, pixels: Vec<Color>) -> Self {
        assert_eq!(
            pixels.len(),
            width as usize * height as usize,
            "image pixel count must match its dimensions"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        Self::new(width, height, vec![color; width as usize * height as usize])
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Color {
        self.pixels[y as usize * self.width as usize + x as usize]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        let width = self.width as usize;
        self.pixels[y as usize * width + x as usize] = color;
    }
}

pub fn tiles_to_pixels(tiles: i32) -> i32 {
    tiles * TILE_SIZE_PX
}

pub fn pixels_to_tiles(pixels: i32) -> i32 {
    pixels / TILE_SIZE_PX
}

pub fn tile_vector_to_pixel_vector(tiles: Vector) -> Vector {
    Vector::new(tiles_to_pixels(tiles.x), tiles_to_pixels(tiles.y))
}

pub fn tile_extents_to_pixel_extents(tiles: Extents) -> Extents {
    Extents::new(tiles_to_pixels(tiles.width), tiles_to_pixels(tiles.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inclusive_edges_follow_size() {
        let rect = Rect::new(2, 3, 4, 5);
        assert_eq!(rect.right(), 5);
        assert_eq!(rect.bottom(), 7);
        assert_eq!(rect.bottom_left(), Vector::new(2, 7));
    }

    #[test]
    fn touching_rects_do_not_intersect() {
        let a = Rect::new(0, 0, 2, 2);
        let b = Rect::new(2, 0, 2, 2);
        let c = Rect::new(1, 1, 2, 2);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
        assert!(b.intersects(&c));
    }

    #[test]
    fn contains_point_is_inclusive() {
        let rect = Rect::new(0, 0, 640, 480);
        assert!(rect.contains_point(Vector::new(639, 479)));
        assert!(!rect.contains_point(Vector::new(640, 0)));
        assert!(!rect.contains_point(Vector::new(-1, 10)));
    }

    #[test]
    fn tile_pixel_conversions_use_eight_pixel_tiles() {
        assert_eq!(tiles_to_pixels(3), 24);
        assert_eq!(pixels_to_tiles(17), 2);
        assert_eq!(
            tile_vector_to_pixel_vector(Vector::new(1, -2)),
            Vector::new(8, -16)
        );
    }
}
