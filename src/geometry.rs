//! Map-space rectangles and vector helpers.
//!
//! Gameplay runs in map space: pixels, origin at the top-left of the map,
//! y growing downward (the same orientation as the CSV layers). Rendering
//! flips y when converting to Bevy world coordinates.

use bevy::prelude::*;

/// Size of a single map tile in pixels.
pub const TILE_SIZE: f32 = 64.0;

/// Axis-aligned collision rectangle in map space.
///
/// `x`/`y` are the top-left corner. Hitboxes are distinct from (and usually
/// smaller than) the sprite drawn for an entity.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Hitbox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Hitbox {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        Self::new(
            center.x - size.x / 2.0,
            center.y - size.y / 2.0,
            size.x,
            size.y,
        )
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn set_left(&mut self, left: f32) {
        self.x = left;
    }

    pub fn set_right(&mut self, right: f32) {
        self.x = right - self.w;
    }

    pub fn set_top(&mut self, top: f32) {
        self.y = top;
    }

    pub fn set_bottom(&mut self, bottom: f32) {
        self.y = bottom - self.h;
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.w, self.h)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn set_center(&mut self, center: Vec2) {
        self.x = center.x - self.w / 2.0;
        self.y = center.y - self.h / 2.0;
    }

    /// Grow (positive) or shrink (negative) the rectangle around its center.
    pub fn inflate(&self, dx: f32, dy: f32) -> Self {
        Self::from_center(self.center(), Vec2::new(self.w + dx, self.h + dy))
    }

    /// Strict intersection test: rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Hitbox) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Map tile containing the center of this rectangle.
    pub fn center_tile(&self) -> (i32, i32) {
        let c = self.center();
        (
            (c.x / TILE_SIZE).floor() as i32,
            (c.y / TILE_SIZE).floor() as i32,
        )
    }
}

/// Distance from `from` to `to` and the unit vector pointing there.
/// Coincident points give a zero direction.
pub fn distance_direction(from: Vec2, to: Vec2) -> (f32, Vec2) {
    let delta = to - from;
    (delta.length(), delta.normalize_or_zero())
}

/// Convert a map-space point into Bevy world space. Draw depth grows with
/// map y so that lower sprites are drawn over higher ones.
pub fn map_to_world(pos: Vec2, base_z: f32) -> Vec3 {
    Vec3::new(pos.x, -pos.y, base_z + pos.y * 0.001)
}

/// Top-left pixel of a map cell.
pub fn cell_origin(col: usize, row: usize) -> Vec2 {
    Vec2::new(col as f32 * TILE_SIZE, row as f32 * TILE_SIZE)
}
