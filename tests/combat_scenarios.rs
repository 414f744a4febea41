//! Attacks against keys, doors and enemies in a running level.

mod common;

use adventure::components::Facing;
use adventure::events::TileDestroyed;
use adventure::plugins::combat::{Attackable, TargetKind};
use adventure::plugins::enemies::Enemy;
use adventure::resources::GameStats;
use bevy::prelude::*;
use common::*;

#[derive(Resource, Default)]
struct Destroyed(Vec<TargetKind>);

fn record_destroyed(app: &mut App) {
    app.init_resource::<Destroyed>();
    app.add_observer(|trigger: On<TileDestroyed>, mut destroyed: ResMut<Destroyed>| {
        destroyed.0.push(trigger.event().kind);
    });
}

fn targets_of(app: &mut App, kind: TargetKind) -> usize {
    app.world_mut()
        .query::<&Attackable>()
        .iter(app.world())
        .filter(|a| a.0 == kind)
        .count()
}

/// Player at (2,2) facing right, `code` placed on `layer` right next to them.
fn app_with_target(name: &str, layer: &str, code: i32) -> App {
    let config = write_level(name, &[("entities", 2, 2, 167), (layer, 3, 2, code)]);
    let mut app = game_app(config);
    record_destroyed(&mut app);
    player_mut(&mut app).status.facing = Facing::Right;
    app
}

#[test]
fn key_is_picked_up_once_per_swing() {
    let mut app = app_with_target("key_once", "key", 0);
    assert_eq!(targets_of(&mut app, TargetKind::Keys), 1);

    swing(&mut app);

    assert_eq!(targets_of(&mut app, TargetKind::Keys), 0);
    assert_eq!(player(&mut app).keys, 1);
    assert_eq!(app.world().resource::<Destroyed>().0, vec![TargetKind::Keys]);
    assert_eq!(app.world().resource::<GameStats>().keys_collected, 1);
}

#[test]
fn door_needs_exactly_three_keys() {
    let mut app = app_with_target("door_keys", "door", 0);

    player_mut(&mut app).keys = 2;
    swing(&mut app);
    assert_eq!(targets_of(&mut app, TargetKind::Door), 1);
    assert!(app.world().resource::<Destroyed>().0.is_empty());

    player_mut(&mut app).keys = 3;
    swing(&mut app);
    assert_eq!(targets_of(&mut app, TargetKind::Door), 0);
    assert_eq!(app.world().resource::<Destroyed>().0, vec![TargetKind::Door]);
    assert_eq!(player(&mut app).keys, 3);
}

#[test]
fn gated_key_costs_two_thousand_gold() {
    let mut app = app_with_target("gated_key", "key1", 0);

    player_mut(&mut app).gold = 1999;
    swing(&mut app);
    assert_eq!(targets_of(&mut app, TargetKind::GatedKey), 1);
    assert_eq!(player(&mut app).gold, 1999);

    player_mut(&mut app).gold = 2500;
    swing(&mut app);
    assert_eq!(targets_of(&mut app, TargetKind::GatedKey), 0);
    let player = player(&mut app);
    assert_eq!(player.gold, 500);
    assert_eq!(player.keys, 1);
}

#[test]
fn killing_an_enemy_awards_its_gold() {
    let mut app = app_with_target("enemy_gold", "entities", 29);
    {
        let mut enemy = app
            .world_mut()
            .query::<&mut Enemy>()
            .single_mut(app.world_mut())
            .unwrap();
        enemy.health = 10.0;
    }

    swing(&mut app);

    let enemies = app
        .world_mut()
        .query::<&Enemy>()
        .iter(app.world())
        .count();
    assert_eq!(enemies, 0);
    assert_eq!(player(&mut app).gold, 160);
    let stats = app.world().resource::<GameStats>();
    assert_eq!(stats.enemies_slain, 1);
    assert_eq!(stats.gold_earned, 160);
}

#[test]
fn weapon_hit_lands_once_per_swing() {
    let mut app = app_with_target("enemy_once", "entities", 29);

    swing(&mut app);

    let enemy = app
        .world_mut()
        .query::<&Enemy>()
        .single(app.world())
        .unwrap();
    // Slime starts at 70; one sword hit deals 10 + 15.
    assert_eq!(enemy.health, 45.0);
}

#[test]
fn adjacent_enemy_hurts_once_per_invulnerability_window() {
    let config = write_level(
        "enemy_attack",
        &[("entities", 2, 2, 167), ("entities", 3, 2, 29)],
    );
    let mut app = game_app(config);

    frames(&mut app, 20);

    let player = player(&mut app);
    assert_eq!(player.health, 95.0);
    assert!(!player.vulnerable);
}
