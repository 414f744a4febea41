//! Sprite sheet metadata and frame animation.
//!
//! Each sheet is described by a JSON sidecar under `assets/sprites/` listing
//! its grid and named frame ranges. A PNG beside the JSON is optional: without
//! one, entities are drawn as coloured quads but still animate, so frame
//! counts keep driving gameplay (an enemy's attack cycle, a particle's life).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bevy::prelude::*;
use micromegas_tracing::prelude::*;
use thiserror::Error;

use crate::data::MonsterKind;
use crate::plugins::telemetry::GameSet;

/// Directory scanned for `<sheet>.json` / `<sheet>.png` pairs.
pub const SPRITE_DIR: &str = "assets/sprites";

/// Sheet name for the shared particle effects.
pub const PARTICLE_SHEET: &str = "particles";
pub const PLAYER_SHEET: &str = "player";

pub struct SpriteSheetPlugin;

impl Plugin for SpriteSheetPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SpriteSheetLibrary>()
            .add_systems(Startup, load_sprite_sheets)
            .add_systems(Update, sync_atlas_frames.in_set(GameSet::Presentation));
    }
}

#[derive(Debug, Error)]
pub enum SpriteSheetError {
    #[error("Failed to read '{path}': {details}")]
    Read { path: String, details: String },

    #[error("Failed to parse '{path}': {details}")]
    Parse { path: String, details: String },

    #[error("Unknown sprite sheet '{0}'")]
    UnknownSheet(String),

    #[error("Sheet '{sheet}' has no frames for animation '{animation}'")]
    MissingAnimation { sheet: String, animation: String },
}

// ---------------------------------------------------------------------------
// JSON metadata
// ---------------------------------------------------------------------------

/// Deserialized from the JSON sidecar of each sprite sheet.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct SpriteSheetMeta {
    pub frame_size: [u32; 2],
    pub columns: u32,
    pub rows: u32,
    pub animations: HashMap<String, AnimationRange>,
}

/// A contiguous range of frames in the sprite sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct AnimationRange {
    pub start: usize,
    pub count: usize,
}

impl SpriteSheetMeta {
    /// Lay animations out back to back, one row of `columns` frames after another.
    pub fn from_counts(frame_size: [u32; 2], columns: u32, counts: &[(&str, usize)]) -> Self {
        let mut animations = HashMap::new();
        let mut start = 0;
        for (key, count) in counts {
            animations.insert(key.to_string(), AnimationRange { start, count: *count });
            start += count;
        }
        let columns = columns.max(1);
        let rows = (start as u32).div_ceil(columns).max(1);
        Self {
            frame_size,
            columns,
            rows,
            animations,
        }
    }

    pub fn read(path: &Path) -> Result<Self, SpriteSheetError> {
        let text = std::fs::read_to_string(path).map_err(|e| SpriteSheetError::Read {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| SpriteSheetError::Parse {
            path: path.display().to_string(),
            details: e.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Every loaded sheet, keyed by name.
#[derive(Resource, Default)]
pub struct SpriteSheetLibrary {
    pub sheets: HashMap<String, CharacterSheet>,
}

#[derive(Debug, Clone)]
pub struct CharacterSheet {
    /// Present only when a PNG accompanies the metadata.
    pub atlas: Option<(Handle<Image>, Handle<TextureAtlasLayout>)>,
    pub meta: SpriteSheetMeta,
}

impl SpriteSheetLibrary {
    pub fn insert(&mut self, name: &str, meta: SpriteSheetMeta) {
        self.sheets
            .insert(name.to_string(), CharacterSheet { atlas: None, meta });
    }

    /// Read `<dir>/<name>.json`, and the PNG beside it when both it and an
    /// asset server are available.
    pub fn load(
        &mut self,
        name: &str,
        dir: &Path,
        graphics: Option<(&AssetServer, &mut Assets<TextureAtlasLayout>)>,
    ) -> Result<(), SpriteSheetError> {
        let meta = SpriteSheetMeta::read(&dir.join(format!("{name}.json")))?;

        let png = dir.join(format!("{name}.png"));
        let atlas = match graphics {
            Some((asset_server, layouts)) if png.exists() => {
                let image: Handle<Image> = asset_server.load(format!("sprites/{name}.png"));
                let layout = TextureAtlasLayout::from_grid(
                    UVec2::new(meta.frame_size[0], meta.frame_size[1]),
                    meta.columns,
                    meta.rows,
                    None,
                    None,
                );
                Some((image, layouts.add(layout)))
            }
            _ => None,
        };

        self.sheets
            .insert(name.to_string(), CharacterSheet { atlas, meta });
        Ok(())
    }

    /// Frame range of `animation` in `sheet`. Empty ranges count as missing.
    pub fn frames(&self, sheet: &str, animation: &str) -> Result<AnimationRange, SpriteSheetError> {
        let entry = self
            .sheets
            .get(sheet)
            .ok_or_else(|| SpriteSheetError::UnknownSheet(sheet.to_string()))?;
        entry
            .meta
            .animations
            .get(animation)
            .copied()
            .filter(|range| range.count > 0)
            .ok_or_else(|| SpriteSheetError::MissingAnimation {
                sheet: sheet.to_string(),
                animation: animation.to_string(),
            })
    }

    /// Number of frames, or zero when the animation is missing.
    pub fn frame_count(&self, sheet: &str, animation: &str) -> usize {
        self.frames(sheet, animation).map(|r| r.count).unwrap_or(0)
    }

    /// Sprite showing the first frame of `animation`, or a plain quad of
    /// `fallback` colour when the sheet has no image.
    pub fn sprite(&self, sheet: &str, animation: &str, size: Vec2, fallback: Color) -> Sprite {
        let Some(entry) = self.sheets.get(sheet) else {
            return Sprite::from_color(fallback, size);
        };
        match (&entry.atlas, entry.meta.animations.get(animation)) {
            (Some((image, layout)), Some(range)) => Sprite {
                image: image.clone(),
                texture_atlas: Some(TextureAtlas {
                    layout: layout.clone(),
                    index: range.start,
                }),
                custom_size: Some(size),
                ..default()
            },
            _ => Sprite::from_color(fallback, size),
        }
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Fractional frame counter over the current animation.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Animator {
    pub sheet: String,
    pub current: String,
    pub frame_index: f32,
    pub speed: f32,
}

impl Animator {
    pub fn new(sheet: &str, animation: &str, speed: f32) -> Self {
        Self {
            sheet: sheet.to_string(),
            current: animation.to_string(),
            frame_index: 0.0,
            speed,
        }
    }

    /// Switch animation without touching the frame counter.
    pub fn play(&mut self, animation: &str) {
        if self.current != animation {
            self.current = animation.to_string();
        }
    }

    /// Step forward over an animation of `count` frames. Returns true when the
    /// counter ran past the last frame and wrapped to the start.
    pub fn advance(&mut self, count: usize) -> bool {
        self.frame_index += self.speed;
        if self.frame_index >= count as f32 {
            self.frame_index = 0.0;
            true
        } else {
            false
        }
    }

    pub fn frame(&self) -> usize {
        self.frame_index as usize
    }
}

/// Alpha for an entity blinking during its invulnerability window.
pub fn flicker_alpha(now: Duration) -> f32 {
    if (now.as_millis() as f32).sin() >= 0.0 {
        1.0
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Sheets the game needs: the player, one per monster, and the particles.
pub fn sheet_names() -> Vec<&'static str> {
    let mut names = vec![PLAYER_SHEET, PARTICLE_SHEET];
    names.extend(MonsterKind::ALL.iter().map(|kind| kind.name()));
    names
}

#[span_fn]
pub fn load_sprite_sheets(
    mut library: ResMut<SpriteSheetLibrary>,
    asset_server: Option<Res<AssetServer>>,
    mut layouts: Option<ResMut<Assets<TextureAtlasLayout>>>,
) {
    let dir = PathBuf::from(SPRITE_DIR);
    for name in sheet_names() {
        let graphics = match (asset_server.as_deref(), layouts.as_deref_mut()) {
            (Some(server), Some(layouts)) => Some((server, layouts)),
            _ => None,
        };
        match library.load(name, &dir, graphics) {
            Ok(()) => info!("sprite sheet loaded: {name}"),
            Err(e) => warn!("sprite sheet unavailable: {e}"),
        }
    }
}

/// Point each atlas sprite at its animator's current frame.
#[span_fn]
fn sync_atlas_frames(
    library: Res<SpriteSheetLibrary>,
    mut query: Query<(&Animator, &mut Sprite), Changed<Animator>>,
) {
    for (animator, mut sprite) in &mut query {
        let Some(atlas) = &mut sprite.texture_atlas else {
            continue;
        };
        let Ok(range) = library.frames(&animator.sheet, &animator.current) else {
            continue;
        };
        atlas.index = range.start + animator.frame().min(range.count - 1);
    }
}
