//! Free movement with axis-separated collision against static obstacles.
//!
//! An entity moves horizontally first and is pushed out of anything it now
//! overlaps along x only; then the same happens vertically. Resolving one
//! axis at a time keeps entities sliding along walls instead of snagging on
//! corners.

use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use crate::components::{MoveDirection, VisualSize};
use crate::geometry::{Hitbox, map_to_world};
use crate::plugins::telemetry::GameSet;

/// Base draw depth for characters and tiles.
pub const ACTOR_Z: f32 = 10.0;

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            sync_transform_to_hitbox.in_set(GameSet::Presentation),
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Move `hitbox` by `direction * speed`, resolving collisions axis by axis.
///
/// `direction` is normalized in place (zero stays zero). When several
/// obstacles overlap on the same axis they are applied in slice order, so
/// the last one wins.
pub fn move_and_collide(
    hitbox: &mut Hitbox,
    direction: &mut Vec2,
    speed: f32,
    obstacles: &[Hitbox],
) {
    *direction = direction.normalize_or_zero();

    hitbox.x += direction.x * speed;
    resolve_collisions(hitbox, *direction, Axis::Horizontal, obstacles);

    hitbox.y += direction.y * speed;
    resolve_collisions(hitbox, *direction, Axis::Vertical, obstacles);
}

/// Push `hitbox` out of every overlapping obstacle along `axis`, against the
/// direction of travel.
pub fn resolve_collisions(hitbox: &mut Hitbox, direction: Vec2, axis: Axis, obstacles: &[Hitbox]) {
    for obstacle in obstacles {
        if !obstacle.overlaps(hitbox) {
            continue;
        }
        match axis {
            Axis::Horizontal => {
                if direction.x > 0.0 {
                    hitbox.set_right(obstacle.left());
                }
                if direction.x < 0.0 {
                    hitbox.set_left(obstacle.right());
                }
            }
            Axis::Vertical => {
                if direction.y > 0.0 {
                    hitbox.set_bottom(obstacle.top());
                }
                if direction.y < 0.0 {
                    hitbox.set_top(obstacle.bottom());
                }
            }
        }
    }
}

/// Keep each drawn entity centred on its hitbox.
#[allow(clippy::type_complexity)]
#[span_fn]
fn sync_transform_to_hitbox(
    mut query: Query<(&Hitbox, &mut Transform), (With<VisualSize>, Changed<Hitbox>)>,
) {
    for (hitbox, mut transform) in &mut query {
        transform.translation = map_to_world(hitbox.center(), ACTOR_Z);
    }
}

/// Convenience for systems that keep the direction in a component.
pub fn step(hitbox: &mut Hitbox, direction: &mut MoveDirection, speed: f32, obstacles: &[Hitbox]) {
    move_and_collide(hitbox, &mut direction.0, speed, obstacles);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
