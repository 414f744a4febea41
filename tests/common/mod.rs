//! Shared harness: a headless app running the gameplay plugins on a small
//! generated level with a fixed 16ms frame.

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use adventure::GameplayPlugin;
use adventure::app_state::{AppState, PlayingState};
use adventure::data::GameData;
use adventure::plugins::player::{Player, PlayerInput};
use adventure::resources::{GameStats, LevelConfig};
use bevy::prelude::*;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;

pub const FRAME: Duration = Duration::from_millis(16);
pub const WIDTH: usize = 7;
pub const HEIGHT: usize = 5;

const LAYERS: [&str; 7] = [
    "floorblocks",
    "entities",
    "trees",
    "key",
    "key1",
    "door",
    "cave",
];

/// Ring of boundary blocks around a 5x3 room.
fn boundary() -> Vec<Vec<i32>> {
    (0..HEIGHT)
        .map(|row| {
            (0..WIDTH)
                .map(|col| {
                    if row == 0 || row == HEIGHT - 1 || col == 0 || col == WIDTH - 1 {
                        395
                    } else {
                        -1
                    }
                })
                .collect()
        })
        .collect()
}

fn to_csv(grid: &[Vec<i32>]) -> String {
    grid.iter()
        .map(|row| {
            row.iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write a level into a fresh temp directory. `cells` are
/// `(layer, col, row, code)`; the boundary ring is always present.
pub fn write_level(name: &str, cells: &[(&str, usize, usize, i32)]) -> LevelConfig {
    let dir: PathBuf = std::env::temp_dir().join(format!(
        "adventure_{name}_{}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();

    for layer in LAYERS {
        let mut grid = if layer == "floorblocks" {
            boundary()
        } else {
            vec![vec![-1; WIDTH]; HEIGHT]
        };
        for (l, col, row, code) in cells {
            if *l == layer {
                grid[*row][*col] = *code;
            }
        }
        std::fs::write(dir.join(format!("level_0_{layer}.csv")), to_csv(&grid)).unwrap();
    }

    LevelConfig {
        map_dir: dir,
        map_prefix: "level_0".to_string(),
        exit_tiles: vec![(5, 3)],
        data_path: PathBuf::from("does/not/exist.ron"),
    }
}

pub fn playing_state(app: &App) -> Option<PlayingState> {
    app.world()
        .get_resource::<State<PlayingState>>()
        .map(|s| *s.get())
}

pub fn app_state(app: &App) -> AppState {
    *app.world().resource::<State<AppState>>().get()
}

/// Update until the level is being played.
pub fn run_until_playing(app: &mut App) {
    for _ in 0..10 {
        if playing_state(app) == Some(PlayingState::Playing) {
            return;
        }
        app.update();
    }
    panic!("level never reached Playing: {:?}", playing_state(app));
}

pub fn game_app(config: LevelConfig) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    app.add_plugins(StatesPlugin);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(FRAME));
    app.init_state::<AppState>();
    app.add_sub_state::<PlayingState>();
    app.insert_resource(config);
    app.insert_resource(GameData::default());
    app.init_resource::<GameStats>();
    app.add_plugins(GameplayPlugin);

    app.world_mut()
        .resource_mut::<NextState<AppState>>()
        .set(AppState::InGame);
    run_until_playing(&mut app);
    app
}

pub fn frames(app: &mut App, n: usize) {
    for _ in 0..n {
        app.update();
    }
}

pub fn set_input(app: &mut App, input: PlayerInput) {
    *app.world_mut().resource_mut::<PlayerInput>() = input;
}

pub fn player_mut(app: &mut App) -> Mut<'_, Player> {
    app.world_mut()
        .query::<&mut Player>()
        .single_mut(app.world_mut())
        .unwrap()
}

pub fn player(app: &mut App) -> Player {
    app.world_mut()
        .query::<&Player>()
        .single(app.world())
        .unwrap()
        .clone()
}

/// Press attack for one frame, then release and let the swing run out.
pub fn swing(app: &mut App) {
    set_input(
        app,
        PlayerInput {
            attack: true,
            ..default()
        },
    );
    app.update();
    set_input(app, PlayerInput::default());
    frames(app, 25);
}
