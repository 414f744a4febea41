//! Building, resetting and leaving a level.

mod common;

use adventure::app_state::{AppState, PlayingState};
use adventure::geometry::{Hitbox, TILE_SIZE};
use adventure::plugins::combat::{Attackable, TargetKind};
use adventure::plugins::enemies::Enemy;
use adventure::plugins::level::LevelEntity;
use adventure::plugins::player::Player;
use adventure::resources::{GameStats, LevelConfig};
use bevy::prelude::*;
use common::*;

fn count<C: Component>(app: &mut App) -> usize {
    app.world_mut().query::<&C>().iter(app.world()).count()
}

#[test]
fn shipped_level_builds() {
    let mut app = game_app(LevelConfig::default());

    assert_eq!(playing_state(&app), Some(PlayingState::Playing));
    assert_eq!(count::<Player>(&mut app), 1);
    assert_eq!(count::<Enemy>(&mut app), 5);
    let doors = app
        .world_mut()
        .query::<&Attackable>()
        .iter(app.world())
        .filter(|a| a.0 == TargetKind::Door)
        .count();
    assert_eq!(doors, 1);
}

#[test]
fn death_rebuilds_the_level() {
    let config = write_level(
        "death_reset",
        &[("entities", 1, 1, 167), ("entities", 5, 3, 33), ("key", 4, 1, 0)],
    );
    let mut app = game_app(config);
    let before = count::<LevelEntity>(&mut app);

    {
        let mut player = player_mut(&mut app);
        player.gold = 900;
        player.health = 0.0;
        player.alive = false;
    }
    app.update();
    app.update();
    assert_ne!(playing_state(&app), Some(PlayingState::Playing));
    run_until_playing(&mut app);

    let player = player(&mut app);
    assert!(player.alive);
    assert_eq!(player.gold, 0);
    assert_eq!(player.health, player.stats.health.value);
    assert_eq!(count::<Player>(&mut app), 1);
    assert_eq!(count::<Enemy>(&mut app), 1);
    assert_eq!(count::<LevelEntity>(&mut app), before);
    assert_eq!(app.world().resource::<GameStats>().deaths, 1);
}

#[test]
fn reaching_the_exit_wins() {
    let config = write_level("exit_win", &[("entities", 1, 1, 167)]);
    let mut app = game_app(config);

    {
        let mut hitbox = app
            .world_mut()
            .query_filtered::<&mut Hitbox, With<Player>>()
            .single_mut(app.world_mut())
            .unwrap();
        hitbox.set_center(Vec2::new(5.5 * TILE_SIZE, 3.5 * TILE_SIZE));
    }
    frames(&mut app, 3);

    assert_eq!(app_state(&app), AppState::Victory);
    assert_eq!(playing_state(&app), None);
    assert_eq!(count::<LevelEntity>(&mut app), 0);
}

#[test]
fn missing_map_exits_with_error() {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(bevy::state::app::StatesPlugin);
    app.init_state::<AppState>();
    app.add_sub_state::<PlayingState>();
    app.insert_resource(LevelConfig {
        map_dir: "does/not/exist".into(),
        ..default()
    });
    app.insert_resource(adventure::data::GameData::default());
    app.add_plugins(adventure::GameplayPlugin);
    app.world_mut()
        .resource_mut::<NextState<AppState>>()
        .set(AppState::InGame);
    app.update();

    assert!(app.should_exit().is_some_and(|exit| exit.is_error()));
    assert_eq!(count::<Player>(&mut app), 0);
}
