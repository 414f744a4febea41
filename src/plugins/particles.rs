//! Short-lived visual effects: hit sparks, death smoke, debris, spell flashes.
//!
//! A particle plays its animation once and despawns after the last frame.

use bevy::prelude::*;
use micromegas_tracing::prelude::*;
use rand::Rng;

use crate::components::VisualSize;
use crate::events::{DeathParticlesRequested, TileDestroyed};
use crate::geometry::{Hitbox, TILE_SIZE, map_to_world};
use crate::plugins::level::LevelEntity;
use crate::plugins::sprites::{Animator, PARTICLE_SHEET, SpriteSheetError, SpriteSheetLibrary};
use crate::plugins::telemetry::GameSet;

pub const PARTICLE_ANIMATION_SPEED: f32 = 0.15;

/// Particles draw above characters.
pub const EFFECT_Z: f32 = 20.0;

const PARTICLE_COLOR: Color = Color::srgba(1.0, 0.9, 0.6, 0.8);

pub struct ParticlePlugin;

impl Plugin for ParticlePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, animate_particles.in_set(GameSet::Effects));
        app.add_observer(on_particles_requested);
        app.add_observer(on_death_particles);
        app.add_observer(on_tile_destroyed);
    }
}

#[derive(Component, Debug)]
pub struct Particle;

/// Play `effect` once, centred on `position` (map space).
#[derive(Event, Debug, Clone, Copy)]
pub struct ParticlesRequested {
    pub effect: &'static str,
    pub position: Vec2,
    pub flip_x: bool,
}

impl ParticlesRequested {
    pub fn new(effect: &'static str, position: Vec2) -> Self {
        Self {
            effect,
            position,
            flip_x: false,
        }
    }
}

/// The four debris variants: two animations, each optionally mirrored.
pub fn random_destroy_variant(rng: &mut impl Rng) -> (&'static str, bool) {
    let effect = if rng.gen_bool(0.5) { "destroy1" } else { "destroy2" };
    (effect, rng.gen_bool(0.5))
}

pub fn particle_bundle(
    effect: &str,
    position: Vec2,
    flip_x: bool,
    library: &SpriteSheetLibrary,
) -> Result<impl Bundle, SpriteSheetError> {
    library.frames(PARTICLE_SHEET, effect)?;
    let size = Vec2::splat(TILE_SIZE);
    let mut sprite = library.sprite(PARTICLE_SHEET, effect, size, PARTICLE_COLOR);
    sprite.flip_x = flip_x;

    Ok((
        Particle,
        LevelEntity,
        Animator::new(PARTICLE_SHEET, effect, PARTICLE_ANIMATION_SPEED),
        Hitbox::from_center(position, size),
        VisualSize(size),
        sprite,
        Transform::from_translation(map_to_world(position, EFFECT_Z)),
    ))
}

#[span_fn]
fn animate_particles(
    mut commands: Commands,
    library: Res<SpriteSheetLibrary>,
    mut query: Query<(Entity, &mut Animator), With<Particle>>,
) {
    for (entity, mut animator) in &mut query {
        let count = library.frame_count(&animator.sheet, &animator.current);
        if animator.advance(count) {
            commands.entity(entity).despawn();
        }
    }
}

fn on_particles_requested(
    trigger: On<ParticlesRequested>,
    mut commands: Commands,
    library: Res<SpriteSheetLibrary>,
) {
    let request = *trigger.event();
    match particle_bundle(request.effect, request.position, request.flip_x, &library) {
        Ok(bundle) => {
            commands.spawn(bundle);
        }
        Err(e) => warn!("particle skipped: {e}"),
    }
}

fn on_death_particles(trigger: On<DeathParticlesRequested>, mut commands: Commands) {
    let request = trigger.event();
    commands.trigger(ParticlesRequested::new(
        request.monster.death_effect(),
        request.position,
    ));
}

fn on_tile_destroyed(trigger: On<TileDestroyed>, mut commands: Commands) {
    let position = trigger.event().position;
    let mut rng = rand::thread_rng();
    for _ in 0..rng.gen_range(3..=6) {
        let (effect, flip_x) = random_destroy_variant(&mut rng);
        commands.trigger(ParticlesRequested {
            effect,
            position,
            flip_x,
        });
    }
}
