use std::path::PathBuf;

use bevy::prelude::*;
use bevy_asset_loader::prelude::*;
use bevy_kira_audio::AudioSource;

// ---------------------------------------------------------------------------
// Level config
// ---------------------------------------------------------------------------

/// Where the level comes from and where it ends.
#[derive(Resource, Debug, Clone)]
pub struct LevelConfig {
    /// Directory holding the `<prefix>_<layer>.csv` files.
    pub map_dir: PathBuf,
    pub map_prefix: String,
    /// Reaching any of these map tiles (col, row) wins the game.
    pub exit_tiles: Vec<(i32, i32)>,
    /// Optional RON override for the gameplay tables.
    pub data_path: PathBuf,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            map_dir: PathBuf::from("assets/level"),
            map_prefix: "level_0".to_string(),
            exit_tiles: vec![(20, 7), (21, 7)],
            data_path: PathBuf::from("assets/data/game_data.ron"),
        }
    }
}

impl LevelConfig {
    pub fn layer_path(&self, layer: &str) -> PathBuf {
        self.map_dir
            .join(format!("{}_{}.csv", self.map_prefix, layer))
    }

    pub fn is_exit(&self, tile: (i32, i32)) -> bool {
        self.exit_tiles.contains(&tile)
    }
}

// ---------------------------------------------------------------------------
// Game stats
// ---------------------------------------------------------------------------

/// Totals for the whole session. Survive level resets, shown on the end screen.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct GameStats {
    pub enemies_slain: u32,
    pub deaths: u32,
    pub keys_collected: u32,
    pub gold_earned: u64,
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

#[derive(AssetCollection, Resource)]
pub struct AudioAssets {
    #[asset(path = "audio/main.ogg")]
    pub main_theme: Handle<AudioSource>,
    #[asset(path = "audio/attack/sword.wav")]
    pub sword: Handle<AudioSource>,
    #[asset(path = "audio/attack/hit.wav")]
    pub hit: Handle<AudioSource>,
    #[asset(path = "audio/attack/death.wav")]
    pub death: Handle<AudioSource>,
    #[asset(path = "audio/attack/heal.wav")]
    pub heal: Handle<AudioSource>,
    #[asset(path = "audio/attack/fireball.wav")]
    pub flame: Handle<AudioSource>,
    #[asset(path = "audio/enemies/fireball.wav")]
    pub enemy_fireball: Handle<AudioSource>,
    #[asset(path = "audio/enemies/slash.wav")]
    pub enemy_slash: Handle<AudioSource>,
    #[asset(path = "audio/enemies/claw.wav")]
    pub enemy_claw: Handle<AudioSource>,
}
