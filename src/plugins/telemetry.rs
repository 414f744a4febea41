//! Frame ordering and frame-level telemetry.
//!
//! Gameplay systems are grouped into [`GameSet`]s that run in a fixed,
//! chained order each frame, and only while the level is being played.
//! Presentation runs last and is never gated.

use bevy::prelude::*;
use micromegas_tracing::prelude::{fmetric, imetric, span_scope};

use crate::app_state::PlayingState;
use crate::plugins::enemies::Enemy;

#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameSet {
    Input,
    Player,
    Enemies,
    Effects,
    EnemyAi,
    Combat,
    Level,
    Presentation,
}

pub struct TelemetryPlugin;

impl Plugin for TelemetryPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(
            Update,
            (
                GameSet::Input,
                GameSet::Player,
                GameSet::Enemies,
                GameSet::Effects,
                GameSet::EnemyAi,
                GameSet::Combat,
                GameSet::Level,
            )
                .chain()
                .run_if(in_state(PlayingState::Playing)),
        );
        app.configure_sets(Update, GameSet::Presentation.after(GameSet::Level));
        app.add_systems(Last, frame_telemetry);
    }
}

fn frame_telemetry(time: Res<Time>, enemies: Query<(), With<Enemy>>) {
    span_scope!("frame");
    let dt_ms = time.delta_secs_f64() * 1000.0;
    fmetric!("frame_time_ms", "ms", dt_ms);
    imetric!("enemies_alive", "count", enemies.iter().count() as u64);
}
