//! The player character: input, status, cooldowns and resource pools.

use std::time::Duration;

use bevy::prelude::*;
use micromegas_tracing::prelude::*;

use crate::components::{Facing, MoveDirection, Obstacle, VisualSize};
use crate::data::{GameData, MagicData, WeaponData};
use crate::events::{CommandHost, PlayerHost};
use crate::geometry::{Hitbox, TILE_SIZE, map_to_world};
use crate::plugins::movement::{ACTOR_Z, step};
use crate::plugins::sprites::{
    Animator, PLAYER_SHEET, SpriteSheetError, SpriteSheetLibrary, flicker_alpha,
};
use crate::plugins::telemetry::GameSet;
use crate::stats::StatSheet;

pub const ATTACK_COOLDOWN: Duration = Duration::from_millis(300);
pub const MAGIC_SWITCH_COOLDOWN: Duration = Duration::from_millis(200);
pub const INVULNERABILITY: Duration = Duration::from_millis(500);

/// Frames advanced per update for characters.
pub const CHARACTER_ANIMATION_SPEED: f32 = 0.1;

const PLAYER_COLOR: Color = Color::srgb(0.25, 0.55, 0.95);

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PlayerInput>();
        app.add_systems(Update, read_player_input.in_set(GameSet::Input));
        app.add_systems(Update, update_player.in_set(GameSet::Player));
        app.add_systems(Update, flicker_player.in_set(GameSet::Presentation));
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Activity {
    #[default]
    Moving,
    Idle,
    Attacking,
}

/// Facing combined with what the player is doing: twelve animation states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PlayerStatus {
    pub facing: Facing,
    pub activity: Activity,
}

impl PlayerStatus {
    pub fn animation_key(&self) -> String {
        match self.activity {
            Activity::Moving => self.facing.name().to_string(),
            Activity::Idle => format!("{}_idle", self.facing.name()),
            Activity::Attacking => format!("{}_attack", self.facing.name()),
        }
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Keys held this frame.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub attack: bool,
    pub magic: bool,
    pub switch_magic: bool,
}

impl PlayerInput {
    pub fn from_keyboard(keyboard: &ButtonInput<KeyCode>) -> Self {
        Self {
            up: keyboard.pressed(KeyCode::KeyW),
            down: keyboard.pressed(KeyCode::KeyS),
            left: keyboard.pressed(KeyCode::KeyA),
            right: keyboard.pressed(KeyCode::KeyD),
            attack: keyboard.pressed(KeyCode::Space),
            magic: keyboard.pressed(KeyCode::ControlLeft),
            switch_magic: keyboard.pressed(KeyCode::KeyE),
        }
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

#[derive(Component, Debug, Clone)]
pub struct Player {
    pub stats: StatSheet,
    pub health: f32,
    pub energy: f32,
    pub gold: u32,
    pub keys: u32,
    pub status: PlayerStatus,
    pub alive: bool,

    pub vulnerable: bool,
    pub hurt_time: Duration,

    pub attacking: bool,
    pub attack_time: Duration,

    pub weapon_index: usize,
    pub magic_index: usize,
    pub can_switch_magic: bool,
    pub magic_switch_time: Duration,
}

impl Player {
    pub fn new(stats: StatSheet) -> Self {
        Self {
            health: stats.health.value,
            energy: stats.energy.value,
            stats,
            gold: 0,
            keys: 0,
            status: PlayerStatus::default(),
            alive: true,
            vulnerable: true,
            hurt_time: Duration::ZERO,
            attacking: false,
            attack_time: Duration::ZERO,
            weapon_index: 0,
            magic_index: 0,
            can_switch_magic: true,
            magic_switch_time: Duration::ZERO,
        }
    }

    /// Apply held keys. Movement is locked while an attack is in progress;
    /// weapon and magic share the same attack guard.
    pub fn handle_input(
        &mut self,
        input: &PlayerInput,
        direction: &mut Vec2,
        now: Duration,
        spells: &[MagicData],
        host: &mut impl PlayerHost,
    ) {
        if !self.attacking {
            if input.up {
                direction.y = -1.0;
                self.status.facing = Facing::Up;
            } else if input.down {
                direction.y = 1.0;
                self.status.facing = Facing::Down;
            } else {
                direction.y = 0.0;
            }

            if input.left {
                direction.x = -1.0;
                self.status.facing = Facing::Left;
            } else if input.right {
                direction.x = 1.0;
                self.status.facing = Facing::Right;
            } else {
                direction.x = 0.0;
            }
        }

        if input.attack && !self.attacking {
            self.attacking = true;
            self.attack_time = now;
            host.create_attack();
        }

        if input.magic && !self.attacking {
            self.attacking = true;
            self.attack_time = now;
            if let Some(spell) = spells.get(self.magic_index) {
                host.create_magic(spell.kind, spell.strength + self.stats.magic.value, spell.cost);
            }
        }

        if input.switch_magic && self.can_switch_magic && !spells.is_empty() {
            self.can_switch_magic = false;
            self.magic_switch_time = now;
            self.magic_index = (self.magic_index + 1) % spells.len();
        }
    }

    pub fn cooldowns(&mut self, now: Duration, host: &mut impl PlayerHost) {
        if self.attacking && now.saturating_sub(self.attack_time) >= ATTACK_COOLDOWN {
            self.attacking = false;
            host.destroy_attack();
        }

        if !self.can_switch_magic
            && now.saturating_sub(self.magic_switch_time) >= MAGIC_SWITCH_COOLDOWN
        {
            self.can_switch_magic = true;
        }

        if !self.vulnerable && now.saturating_sub(self.hurt_time) >= INVULNERABILITY {
            self.vulnerable = true;
        }
    }

    /// Derive the activity half of the status from motion and attack state.
    pub fn refresh_status(&mut self, direction: &mut Vec2) {
        if !self.attacking {
            if *direction != Vec2::ZERO {
                self.status.activity = Activity::Moving;
            } else if self.status.activity == Activity::Moving {
                self.status.activity = Activity::Idle;
            }
        }

        if self.attacking {
            *direction = Vec2::ZERO;
            self.status.activity = Activity::Attacking;
        } else if self.status.activity == Activity::Attacking {
            self.status.activity = Activity::Moving;
        }
    }

    pub fn recover_energy(&mut self) {
        let cap = self.stats.energy.value;
        if self.energy < cap {
            self.energy = (self.energy + 0.01 * self.stats.magic.value).min(cap);
        } else {
            self.energy = cap;
        }
    }

    pub fn weapon_damage(&self, weapons: &[WeaponData]) -> f32 {
        let weapon = weapons.get(self.weapon_index).map(|w| w.damage).unwrap_or(0.0);
        self.stats.attack.value + weapon
    }

    pub fn magic_damage(&self, spells: &[MagicData]) -> f32 {
        let spell = spells.get(self.magic_index).map(|s| s.strength).unwrap_or(0.0);
        self.stats.magic.value + spell
    }

    /// Take a hit. Ignored while invulnerable; returns whether it landed.
    pub fn receive_damage(&mut self, amount: f32, now: Duration) -> bool {
        if !self.vulnerable {
            return false;
        }
        self.health -= amount;
        self.vulnerable = false;
        self.hurt_time = now;
        if self.health <= 0.0 {
            self.health = 0.0;
            self.alive = false;
        }
        true
    }

    pub fn spend_energy(&mut self, cost: f32) -> bool {
        if self.energy >= cost {
            self.energy -= cost;
            true
        } else {
            false
        }
    }

    /// Spend `cost` energy to restore `strength` health, capped at the health stat.
    pub fn heal(&mut self, strength: f32, cost: f32) -> bool {
        if !self.spend_energy(cost) {
            return false;
        }
        self.health = (self.health + strength).min(self.stats.health.value);
        true
    }
}

// ---------------------------------------------------------------------------
// Spawning
// ---------------------------------------------------------------------------

/// Everything the player entity starts with, placed in the map cell whose
/// top-left corner is `origin`.
pub fn player_bundle(
    origin: Vec2,
    data: &GameData,
    library: &SpriteSheetLibrary,
) -> Result<impl Bundle, SpriteSheetError> {
    let player = Player::new(data.player_stats.clone());
    let key = player.status.animation_key();
    library.frames(PLAYER_SHEET, &key)?;

    let rect = Hitbox::new(origin.x, origin.y, TILE_SIZE, TILE_SIZE);
    let [dx, dy] = data.hitbox_offsets.player;
    let hitbox = rect.inflate(dx, dy);

    Ok((
        player,
        hitbox,
        MoveDirection::default(),
        Animator::new(PLAYER_SHEET, &key, CHARACTER_ANIMATION_SPEED),
        VisualSize(rect.size()),
        library.sprite(PLAYER_SHEET, &key, rect.size(), PLAYER_COLOR),
        Transform::from_translation(map_to_world(hitbox.center(), ACTOR_Z)),
    ))
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

fn read_player_input(keyboard: Option<Res<ButtonInput<KeyCode>>>, mut input: ResMut<PlayerInput>) {
    if let Some(keyboard) = keyboard {
        *input = PlayerInput::from_keyboard(&keyboard);
    }
}

/// Per frame: input, cooldowns, status, animation, movement, energy.
#[allow(clippy::type_complexity)]
#[span_fn]
fn update_player(
    mut commands: Commands,
    time: Res<Time>,
    input: Res<PlayerInput>,
    data: Res<GameData>,
    library: Res<SpriteSheetLibrary>,
    obstacles: Query<&Hitbox, (With<Obstacle>, Without<Player>)>,
    mut query: Query<(&mut Player, &mut Hitbox, &mut MoveDirection, &mut Animator)>,
) {
    let now = time.elapsed();
    let obstacles: Vec<Hitbox> = obstacles.iter().copied().collect();
    let mut host = CommandHost::new(&mut commands);

    for (mut player, mut hitbox, mut direction, mut animator) in &mut query {
        player.handle_input(&input, &mut direction.0, now, &data.spells, &mut host);
        player.cooldowns(now, &mut host);
        player.refresh_status(&mut direction.0);

        animator.play(&player.status.animation_key());
        let count = library.frame_count(&animator.sheet, &animator.current);
        animator.advance(count);

        let speed = player.stats.speed.value;
        step(&mut hitbox, &mut direction, speed, &obstacles);
        player.recover_energy();
    }
}

#[span_fn]
fn flicker_player(time: Res<Time>, mut query: Query<(&Player, &mut Sprite)>) {
    for (player, mut sprite) in &mut query {
        let alpha = if player.vulnerable {
            1.0
        } else {
            flicker_alpha(time.elapsed())
        };
        sprite.color.set_alpha(alpha);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
