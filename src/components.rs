use bevy::prelude::*;

// ---------------------------------------------------------------------------
// Motion
// ---------------------------------------------------------------------------

/// Intended movement for this frame. Zero when the entity stands still.
/// Normalized in place by the movement step.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveDirection(pub Vec2);

/// Which way a character looks. Map space: `Up` is negative y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Facing {
    /// Unit vector in map space.
    pub fn vector(&self) -> Vec2 {
        match self {
            Facing::Up => Vec2::new(0.0, -1.0),
            Facing::Down => Vec2::new(0.0, 1.0),
            Facing::Left => Vec2::new(-1.0, 0.0),
            Facing::Right => Vec2::new(1.0, 0.0),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Facing::Up => "up",
            Facing::Down => "down",
            Facing::Left => "left",
            Facing::Right => "right",
        }
    }
}

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

/// Static hitbox that movable entities cannot enter.
#[derive(Component, Debug)]
pub struct Obstacle;

/// Size of the drawn sprite, centred on the entity's hitbox.
#[derive(Component, Debug, Clone, Copy)]
pub struct VisualSize(pub Vec2);
