pub mod ai;
pub mod app_state;
pub mod components;
pub mod data;
pub mod events;
pub mod geometry;
pub mod plugins;
pub mod resources;
pub mod stats;

use bevy::prelude::*;
use bevy_asset_loader::prelude::*;
use bevy_kira_audio::AudioPlugin;
use micromegas_tracing::prelude::*;

use app_state::{AppState, PlayingState};
use plugins::audio::GameAudioPlugin;
use plugins::camera::CameraPlugin;
use plugins::combat::CombatPlugin;
use plugins::enemies::EnemyPlugin;
use plugins::hud::HudPlugin;
use plugins::level::LevelPlugin;
use plugins::movement::MovementPlugin;
use plugins::particles::ParticlePlugin;
use plugins::player::PlayerPlugin;
use plugins::sprites::SpriteSheetPlugin;
use plugins::telemetry::TelemetryPlugin;
use plugins::upgrade::UpgradePlugin;
use plugins::victory::VictoryPlugin;
use resources::{AudioAssets, GameStats, LevelConfig};

/// The whole game: simulation, presentation, audio and asset loading.
pub struct AdventurePlugin;

impl Plugin for AdventurePlugin {
    fn build(&self, app: &mut App) {
        // State machine (StatesPlugin comes from DefaultPlugins)
        app.init_state::<AppState>();
        app.add_sub_state::<PlayingState>();

        app.add_plugins(AudioPlugin);

        app.add_plugins(GameplayPlugin);
        app.add_plugins(CameraPlugin);
        app.add_plugins(HudPlugin);
        app.add_plugins(GameAudioPlugin);
        app.add_plugins(VictoryPlugin);

        app.add_systems(OnEnter(AppState::InGame), init_game_session);
        app.add_systems(OnExit(AppState::Victory), cleanup_game_session);

        // Missing audio is not fatal: the game runs silent.
        app.add_loading_state(
            LoadingState::new(AppState::Loading)
                .continue_to_state(AppState::InGame)
                .on_failure_continue_to_state(AppState::InGame)
                .load_collection::<AudioAssets>(),
        );
    }
}

/// Everything that runs the level without a window: frame ordering, sprite
/// metadata, movement, player, enemies, particles, combat, level and the
/// upgrade menu. Expects the states to be registered by the caller.
pub struct GameplayPlugin;

impl Plugin for GameplayPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LevelConfig>();

        app.add_plugins(TelemetryPlugin);
        app.add_plugins(SpriteSheetPlugin);
        app.add_plugins(MovementPlugin);
        app.add_plugins(PlayerPlugin);
        app.add_plugins(EnemyPlugin);
        app.add_plugins(ParticlePlugin);
        app.add_plugins(CombatPlugin);
        app.add_plugins(LevelPlugin);
        app.add_plugins(UpgradePlugin);
    }
}

/// Fresh session totals on every start, including replays from the victory screen.
#[span_fn]
fn init_game_session(mut commands: Commands, existing: Option<Res<GameStats>>) {
    if existing.is_none() {
        commands.insert_resource(GameStats::default());
    }
}

/// Drop the totals once the victory screen has shown them.
#[span_fn]
fn cleanup_game_session(mut commands: Commands) {
    commands.remove_resource::<GameStats>();
}
