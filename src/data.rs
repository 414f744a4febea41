//! Immutable gameplay tables: weapons, spells, monsters and hitbox offsets.
//!
//! Loaded once at startup into the [`GameData`] resource and read by
//! reference everywhere else. The canonical values live in
//! `GameData::default()`; `assets/data/game_data.ron` may override them.

use std::collections::BTreeMap;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stats::StatSheet;

/// Errors raised while loading the game data file.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Failed to read '{path}': {details}")]
    ReadError { path: String, details: String },

    #[error("Parse error in '{path}': {details}")]
    ParseError { path: String, details: String },

    #[error("No stat block for monster '{0}'")]
    MissingMonster(&'static str),

    #[error("Table '{0}' must not be empty")]
    EmptyTable(&'static str),
}

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MonsterKind {
    Spirit,
    Slime,
    Raccoon,
    Cyclops,
    Flam,
    Tengu,
}

impl MonsterKind {
    pub const ALL: [MonsterKind; 6] = [
        MonsterKind::Spirit,
        MonsterKind::Slime,
        MonsterKind::Raccoon,
        MonsterKind::Cyclops,
        MonsterKind::Flam,
        MonsterKind::Tengu,
    ];

    /// Monster spawned by an entities-layer code. Unknown codes fall back to spirit.
    pub fn from_spawn_code(code: i32) -> Self {
        match code {
            27 => MonsterKind::Raccoon,
            29 => MonsterKind::Slime,
            33 => MonsterKind::Cyclops,
            34 => MonsterKind::Flam,
            35 => MonsterKind::Tengu,
            _ => MonsterKind::Spirit,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MonsterKind::Spirit => "spirit",
            MonsterKind::Slime => "slime",
            MonsterKind::Raccoon => "raccoon",
            MonsterKind::Cyclops => "cyclops",
            MonsterKind::Flam => "flam",
            MonsterKind::Tengu => "tengu",
        }
    }

    /// Particle effect played when this monster dies.
    pub fn death_effect(&self) -> &'static str {
        match self {
            MonsterKind::Spirit | MonsterKind::Flam => "smoke_orange",
            MonsterKind::Slime => "smoke",
            MonsterKind::Raccoon | MonsterKind::Cyclops | MonsterKind::Tengu => "nova",
        }
    }
}

/// Hit effect a monster's attack leaves on the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackType {
    Slash,
    Claw,
}

impl AttackType {
    pub fn effect(&self) -> &'static str {
        match self {
            AttackType::Slash => "slash",
            AttackType::Claw => "claw",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponKind {
    Sword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MagicKind {
    Flame,
    Heal,
}

impl MagicKind {
    pub fn name(&self) -> &'static str {
        match self {
            MagicKind::Flame => "flame",
            MagicKind::Heal => "heal",
        }
    }
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponData {
    pub kind: WeaponKind,
    pub damage: f32,
    /// Hitbox size of the swing.
    pub size: [f32; 2],
    /// How far the swing overlaps the player's sprite on the facing side.
    pub inset: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MagicData {
    pub kind: MagicKind,
    pub strength: f32,
    pub cost: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterStats {
    pub health: f32,
    pub gold: u32,
    pub damage: f32,
    pub attack_type: AttackType,
    pub speed: f32,
    pub resistance: f32,
    pub attack_radius: f32,
    pub notice_radius: f32,
}

/// Hitbox inflation per entity type, applied to the sprite rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitboxOffsets {
    pub player: [f32; 2],
    pub enemy: f32,
    pub trees: f32,
    pub invisible: f32,
    pub keys: f32,
    pub key1: f32,
    pub door: f32,
    pub cave: f32,
}

impl Default for HitboxOffsets {
    fn default() -> Self {
        Self {
            player: [-6.0, -26.0],
            enemy: -10.0,
            trees: -100.0,
            invisible: -30.0,
            keys: -30.0,
            key1: -30.0,
            door: -30.0,
            cave: 0.0,
        }
    }
}

/// All static gameplay configuration.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameData {
    pub weapons: Vec<WeaponData>,
    /// Ordered: the player cycles through spells in this order.
    pub spells: Vec<MagicData>,
    pub monsters: BTreeMap<MonsterKind, MonsterStats>,
    pub hitbox_offsets: HitboxOffsets,
    pub player_stats: StatSheet,
}

impl Default for GameData {
    fn default() -> Self {
        let monster = |health, gold, damage, attack_type, speed, attack_radius, notice_radius| {
            MonsterStats {
                health,
                gold,
                damage,
                attack_type,
                speed,
                resistance: 3.0,
                attack_radius,
                notice_radius,
            }
        };

        let mut monsters = BTreeMap::new();
        monsters.insert(
            MonsterKind::Spirit,
            monster(100.0, 150, 10.0, AttackType::Slash, 2.0, 50.0, 360.0),
        );
        monsters.insert(
            MonsterKind::Slime,
            monster(70.0, 160, 5.0, AttackType::Slash, 3.0, 50.0, 350.0),
        );
        monsters.insert(
            MonsterKind::Raccoon,
            monster(300.0, 300, 20.0, AttackType::Claw, 2.0, 110.0, 350.0),
        );
        monsters.insert(
            MonsterKind::Cyclops,
            monster(300.0, 300, 20.0, AttackType::Claw, 2.0, 100.0, 350.0),
        );
        monsters.insert(
            MonsterKind::Flam,
            monster(200.0, 300, 20.0, AttackType::Claw, 2.0, 110.0, 350.0),
        );
        monsters.insert(
            MonsterKind::Tengu,
            monster(300.0, 300, 20.0, AttackType::Claw, 2.0, 100.0, 350.0),
        );

        Self {
            weapons: vec![WeaponData {
                kind: WeaponKind::Sword,
                damage: 15.0,
                size: [48.0, 48.0],
                inset: 8.0,
            }],
            spells: vec![
                MagicData {
                    kind: MagicKind::Flame,
                    strength: 5.0,
                    cost: 20.0,
                },
                MagicData {
                    kind: MagicKind::Heal,
                    strength: 20.0,
                    cost: 10.0,
                },
            ],
            monsters,
            hitbox_offsets: HitboxOffsets::default(),
            player_stats: StatSheet::default(),
        }
    }
}

impl GameData {
    pub fn monster(&self, kind: MonsterKind) -> Option<&MonsterStats> {
        self.monsters.get(&kind)
    }

    pub fn weapon(&self, index: usize) -> Option<&WeaponData> {
        self.weapons.get(index)
    }

    pub fn spell(&self, index: usize) -> Option<&MagicData> {
        self.spells.get(index)
    }

    /// Parse and validate a RON document. `origin` only labels errors.
    pub fn from_ron_str(text: &str, origin: &str) -> Result<Self, DataError> {
        let data: GameData = ron::from_str(text).map_err(|e| DataError::ParseError {
            path: origin.to_string(),
            details: e.to_string(),
        })?;
        data.validate()?;
        Ok(data)
    }

    /// Load from a RON file. A missing file yields the canonical tables.
    pub fn load_or_default(path: &Path) -> Result<Self, DataError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| DataError::ReadError {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
        Self::from_ron_str(&text, &path.display().to_string())
    }

    fn validate(&self) -> Result<(), DataError> {
        if self.weapons.is_empty() {
            return Err(DataError::EmptyTable("weapons"));
        }
        if self.spells.is_empty() {
            return Err(DataError::EmptyTable("spells"));
        }
        for kind in MonsterKind::ALL {
            if !self.monsters.contains_key(&kind) {
                return Err(DataError::MissingMonster(kind.name()));
            }
        }
        Ok(())
    }
}
