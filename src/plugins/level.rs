//! Level loading, building, resetting and the end condition.
//!
//! A level is a stack of CSV layers sharing one grid. Each non-empty cell
//! becomes an entity; every entity that belongs to the level carries
//! [`LevelEntity`] so that a reset can throw the whole level away at once.

use std::collections::HashMap;

use bevy::prelude::*;
use micromegas_tracing::prelude::*;
use thiserror::Error;

use crate::app_state::{AppState, PlayingState};
use crate::components::{Obstacle, VisualSize};
use crate::data::{GameData, MonsterKind};
use crate::geometry::{Hitbox, TILE_SIZE, cell_origin, map_to_world};
use crate::plugins::combat::{ActiveWeapon, Attackable, TargetKind};
use crate::plugins::enemies::enemy_bundle;
use crate::plugins::movement::ACTOR_Z;
use crate::plugins::player::{Player, player_bundle};
use crate::plugins::sprites::SpriteSheetLibrary;
use crate::plugins::telemetry::GameSet;
use crate::resources::{GameStats, LevelConfig};

pub struct LevelPlugin;

impl Plugin for LevelPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, load_game_data);
        app.add_systems(
            OnEnter(PlayingState::Building),
            (build_level, start_playing.after(build_level)),
        );
        app.add_systems(OnEnter(PlayingState::Resetting), reset_level);
        app.add_systems(
            Update,
            (check_player_alive, check_exit.after(check_player_alive)).in_set(GameSet::Level),
        );
        app.add_systems(OnExit(AppState::InGame), cleanup_level);
    }
}

/// Code marking the player's start cell in the entities layer.
pub const PLAYER_SPAWN_CODE: i32 = 167;

const GROUND_Z: f32 = 0.0;
const DECOR_Z: f32 = 1.0;

const GROUND_COLOR: Color = Color::srgb(0.36, 0.55, 0.3);
const TREE_COLOR: Color = Color::srgb(0.13, 0.35, 0.15);
const KEY_COLOR: Color = Color::srgb(0.95, 0.8, 0.2);
const GATED_KEY_COLOR: Color = Color::srgb(0.9, 0.45, 0.1);
const DOOR_COLOR: Color = Color::srgb(0.45, 0.3, 0.15);
const CAVE_COLOR: Color = Color::srgb(0.2, 0.2, 0.22);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum MapError {
    #[error("Failed to read layer '{path}': {details}")]
    Read { path: String, details: String },

    #[error("Layer '{layer}' row {row} col {col}: '{value}' is not a tile code")]
    BadCell {
        layer: &'static str,
        row: usize,
        col: usize,
        value: String,
    },

    #[error("Layer '{layer}' is {found:?} cells, expected {expected:?}")]
    SizeMismatch {
        layer: &'static str,
        found: (usize, usize),
        expected: (usize, usize),
    },

    #[error("No player start (code 167) in the entities layer")]
    NoPlayer,
}

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Boundary,
    Entities,
    Trees,
    Keys,
    GatedKey,
    Door,
    Cave,
}

impl Layer {
    pub const ALL: [Layer; 7] = [
        Layer::Boundary,
        Layer::Entities,
        Layer::Trees,
        Layer::Keys,
        Layer::GatedKey,
        Layer::Door,
        Layer::Cave,
    ];

    /// Suffix of the layer's CSV file.
    pub fn file_stem(&self) -> &'static str {
        match self {
            Layer::Boundary => "floorblocks",
            Layer::Entities => "entities",
            Layer::Trees => "trees",
            Layer::Keys => "key",
            Layer::GatedKey => "key1",
            Layer::Door => "door",
            Layer::Cave => "cave",
        }
    }
}

/// Parse one CSV layer. Blank lines are skipped; `-1` is an empty cell.
pub fn parse_layer(layer: Layer, text: &str) -> Result<Vec<Vec<i32>>, MapError> {
    let mut rows = Vec::new();
    for (row, line) in text.lines().filter(|l| !l.trim().is_empty()).enumerate() {
        let cells = line
            .split(',')
            .enumerate()
            .map(|(col, cell)| {
                cell.trim().parse::<i32>().map_err(|_| MapError::BadCell {
                    layer: layer.file_stem(),
                    row,
                    col,
                    value: cell.trim().to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        rows.push(cells);
    }
    Ok(rows)
}

/// All layers of one level, sharing the same dimensions.
#[derive(Resource, Debug, Clone, Default)]
pub struct LevelMap {
    pub width: usize,
    pub height: usize,
    layers: HashMap<Layer, Vec<Vec<i32>>>,
}

impl LevelMap {
    pub fn load(config: &LevelConfig) -> Result<Self, MapError> {
        span_scope!("level_load");
        let mut sources = Vec::new();
        for layer in Layer::ALL {
            let path = config.layer_path(layer.file_stem());
            let text = std::fs::read_to_string(&path).map_err(|e| MapError::Read {
                path: path.display().to_string(),
                details: e.to_string(),
            })?;
            sources.push((layer, text));
        }
        Self::from_layers(sources.iter().map(|(layer, text)| (*layer, text.as_str())))
    }

    /// Build from in-memory CSV text. Layers not given are treated as empty.
    pub fn from_layers<'a>(
        sources: impl IntoIterator<Item = (Layer, &'a str)>,
    ) -> Result<Self, MapError> {
        let mut map = LevelMap::default();
        for (layer, text) in sources {
            let grid = parse_layer(layer, text)?;
            let height = grid.len();
            let width = grid.iter().map(Vec::len).max().unwrap_or(0);
            if map.layers.is_empty() {
                map.width = width;
                map.height = height;
            } else if (width, height) != (map.width, map.height) {
                return Err(MapError::SizeMismatch {
                    layer: layer.file_stem(),
                    found: (width, height),
                    expected: (map.width, map.height),
                });
            }
            map.layers.insert(layer, grid);
        }
        Ok(map)
    }

    /// Non-empty cells of `layer` as `(col, row, code)`.
    pub fn cells(&self, layer: Layer) -> impl Iterator<Item = (usize, usize, i32)> + '_ {
        self.layers.get(&layer).into_iter().flat_map(|grid| {
            grid.iter().enumerate().flat_map(|(row, cells)| {
                cells
                    .iter()
                    .enumerate()
                    .filter(|(_, code)| **code != -1)
                    .map(move |(col, code)| (col, row, *code))
            })
        })
    }

    /// Map size in pixels.
    pub fn pixel_size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32) * TILE_SIZE
    }
}

// ---------------------------------------------------------------------------
// Placement
// ---------------------------------------------------------------------------

/// What a map cell turns into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Boundary(Vec2),
    Player(Vec2),
    Monster(MonsterKind, Vec2),
    Tree(Vec2),
    Target(TargetKind, Vec2),
    Cave(Vec2),
}

/// Translate every non-empty cell into a placement, in layer order.
pub fn plan_level(map: &LevelMap) -> Result<Vec<Placement>, MapError> {
    let mut plan = Vec::new();
    for layer in Layer::ALL {
        for (col, row, code) in map.cells(layer) {
            let origin = cell_origin(col, row);
            let placement = match layer {
                Layer::Boundary => Placement::Boundary(origin),
                Layer::Entities if code == PLAYER_SPAWN_CODE => Placement::Player(origin),
                Layer::Entities => Placement::Monster(MonsterKind::from_spawn_code(code), origin),
                Layer::Trees => Placement::Tree(origin),
                Layer::Keys => Placement::Target(TargetKind::Keys, origin),
                Layer::GatedKey => Placement::Target(TargetKind::GatedKey, origin),
                Layer::Door => Placement::Target(TargetKind::Door, origin),
                Layer::Cave => Placement::Cave(origin),
            };
            plan.push(placement);
        }
    }
    if !plan.iter().any(|p| matches!(p, Placement::Player(_))) {
        return Err(MapError::NoPlayer);
    }
    Ok(plan)
}

/// Trees stand one tile taller than their cell, rooted in it.
pub fn tree_rect(origin: Vec2) -> Hitbox {
    Hitbox::new(origin.x, origin.y - TILE_SIZE, TILE_SIZE, TILE_SIZE * 2.0)
}

// ---------------------------------------------------------------------------
// Marker components
// ---------------------------------------------------------------------------

/// Belongs to the current level; despawned on reset and on leaving the game.
#[derive(Component, Debug)]
pub struct LevelEntity;

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

fn load_game_data(
    mut commands: Commands,
    config: Res<LevelConfig>,
    existing: Option<Res<GameData>>,
) {
    if existing.is_some() {
        return;
    }
    let data = match GameData::load_or_default(&config.data_path) {
        Ok(data) => data,
        Err(e) => {
            error!("{e}; using built-in tables");
            GameData::default()
        }
    };
    commands.insert_resource(data);
}

fn spawn_tile(commands: &mut Commands, rect: Hitbox, hitbox: Hitbox, color: Color) -> Entity {
    commands
        .spawn((
            LevelEntity,
            Obstacle,
            hitbox,
            VisualSize(rect.size()),
            Sprite::from_color(color, rect.size()),
            Transform::from_translation(map_to_world(rect.center(), ACTOR_Z)),
        ))
        .id()
}

#[span_fn]
fn build_level(
    mut commands: Commands,
    config: Res<LevelConfig>,
    data: Res<GameData>,
    library: Res<SpriteSheetLibrary>,
    mut active_weapon: ResMut<ActiveWeapon>,
    mut exit: MessageWriter<AppExit>,
) {
    let loaded = LevelMap::load(&config).and_then(|map| {
        let plan = plan_level(&map)?;
        Ok((map, plan))
    });
    let (map, plan) = match loaded {
        Ok(loaded) => loaded,
        Err(e) => {
            error!("level load failed: {e}");
            exit.write(AppExit::error());
            return;
        }
    };
    let offsets = &data.hitbox_offsets;
    active_weapon.0 = None;

    let size = map.pixel_size();
    commands.spawn((
        LevelEntity,
        Sprite::from_color(GROUND_COLOR, size),
        Transform::from_translation(map_to_world(size / 2.0, GROUND_Z).with_z(GROUND_Z)),
    ));

    let mut enemies = 0;
    for placement in plan {
        match placement {
            Placement::Boundary(origin) => {
                let rect = Hitbox::new(origin.x, origin.y, TILE_SIZE, TILE_SIZE);
                commands.spawn((LevelEntity, Obstacle, rect.inflate(0.0, offsets.invisible)));
            }
            Placement::Player(origin) => match player_bundle(origin, &data, &library) {
                Ok(bundle) => {
                    commands.spawn((bundle, LevelEntity));
                }
                Err(e) => error!("player not spawned: {e}"),
            },
            Placement::Monster(kind, origin) => {
                match enemy_bundle(kind, origin, &data, &library) {
                    Ok(bundle) => {
                        commands.spawn((bundle, LevelEntity));
                        enemies += 1;
                    }
                    Err(e) => error!("{} not spawned: {e}", kind.name()),
                }
            }
            Placement::Tree(origin) => {
                let rect = tree_rect(origin);
                spawn_tile(&mut commands, rect, rect.inflate(0.0, offsets.trees), TREE_COLOR);
            }
            Placement::Target(kind, origin) => {
                let rect = Hitbox::new(origin.x, origin.y, TILE_SIZE, TILE_SIZE);
                let (offset, color) = match kind {
                    TargetKind::Keys => (offsets.keys, KEY_COLOR),
                    TargetKind::GatedKey => (offsets.key1, GATED_KEY_COLOR),
                    _ => (offsets.door, DOOR_COLOR),
                };
                let entity = spawn_tile(&mut commands, rect, rect.inflate(0.0, offset), color);
                commands.entity(entity).insert(Attackable(kind));
            }
            Placement::Cave(origin) => {
                let rect = Hitbox::new(origin.x, origin.y, TILE_SIZE, TILE_SIZE);
                commands.spawn((
                    LevelEntity,
                    Sprite::from_color(CAVE_COLOR, rect.size()),
                    Transform::from_translation(
                        map_to_world(rect.center(), DECOR_Z).with_z(DECOR_Z),
                    ),
                ));
            }
        }
    }

    info!("level built: {}x{} tiles, {enemies} enemies", map.width, map.height);
    imetric!("level_enemies", "count", enemies as u64);
    commands.insert_resource(map);
}

fn start_playing(mut next_state: ResMut<NextState<PlayingState>>) {
    next_state.set(PlayingState::Playing);
}

/// Throw the level away and build it again from scratch.
fn reset_level(
    mut commands: Commands,
    query: Query<Entity, With<LevelEntity>>,
    stats: Option<ResMut<GameStats>>,
    mut next_state: ResMut<NextState<PlayingState>>,
) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
    if let Some(mut stats) = stats {
        stats.deaths += 1;
        imetric!("deaths", "count", u64::from(stats.deaths));
    }
    info!("level reset");
    next_state.set(PlayingState::Building);
}

fn check_player_alive(
    players: Query<&Player>,
    mut next_state: ResMut<NextState<PlayingState>>,
) {
    if players.iter().any(|p| !p.alive) {
        next_state.set(PlayingState::Resetting);
    }
}

fn check_exit(
    config: Res<LevelConfig>,
    players: Query<(&Player, &Hitbox)>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    for (player, hitbox) in &players {
        if player.alive && config.is_exit(hitbox.center_tile()) {
            info!("exit reached at {:?}", hitbox.center_tile());
            next_state.set(AppState::Victory);
        }
    }
}

fn cleanup_level(mut commands: Commands, query: Query<Entity, With<LevelEntity>>) {
    for entity in &query {
        commands.entity(entity).despawn();
    }
    commands.remove_resource::<LevelMap>();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
