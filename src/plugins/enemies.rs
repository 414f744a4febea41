//! Enemies: perception, pursuit, attacks, damage intake and death.

use std::time::Duration;

use bevy::prelude::*;
use micromegas_tracing::prelude::*;
use thiserror::Error;

use crate::ai::{EnemyStatus, next_status};
use crate::components::{MoveDirection, Obstacle, VisualSize};
use crate::data::{DataError, GameData, MonsterKind, MonsterStats};
use crate::events::{CommandHost, EnemyAttacked, EnemyHost, EnemyKilled};
use crate::geometry::{Hitbox, TILE_SIZE, distance_direction, map_to_world};
use crate::plugins::combat::{Attackable, TargetKind};
use crate::plugins::movement::{ACTOR_Z, step};
use crate::plugins::player::{CHARACTER_ANIMATION_SPEED, Player};
use crate::plugins::sprites::{Animator, SpriteSheetError, SpriteSheetLibrary, flicker_alpha};
use crate::plugins::telemetry::GameSet;

pub const ENEMY_ATTACK_COOLDOWN: Duration = Duration::from_millis(400);
pub const ENEMY_INVINCIBILITY: Duration = Duration::from_millis(300);

pub struct EnemyPlugin;

impl Plugin for EnemyPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, update_enemies.in_set(GameSet::Enemies));
        app.add_systems(Update, enemy_ai.in_set(GameSet::EnemyAi));
        app.add_systems(Update, flicker_enemies.in_set(GameSet::Presentation));
    }
}

/// Why a character could not be spawned.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error(transparent)]
    Sprite(#[from] SpriteSheetError),

    #[error(transparent)]
    Data(#[from] DataError),
}

// ---------------------------------------------------------------------------
// Enemy
// ---------------------------------------------------------------------------

#[derive(Component, Debug, Clone)]
pub struct Enemy {
    pub kind: MonsterKind,
    pub stats: MonsterStats,
    pub health: f32,
    pub status: EnemyStatus,

    pub can_attack: bool,
    pub attack_time: Duration,

    pub vulnerable: bool,
    pub hit_time: Duration,
}

impl Enemy {
    pub fn new(kind: MonsterKind, stats: MonsterStats) -> Self {
        Self {
            kind,
            health: stats.health,
            stats,
            status: EnemyStatus::Idle,
            can_attack: true,
            attack_time: Duration::ZERO,
            vulnerable: true,
            hit_time: Duration::ZERO,
        }
    }

    /// Re-evaluate status from the distance to the player. Returns true when
    /// the enemy just switched into `Attack` (its animation restarts).
    pub fn update_status(&mut self, distance: f32) -> bool {
        let next = next_status(distance, &self.stats, self.can_attack);
        let entered_attack = next == EnemyStatus::Attack && self.status != EnemyStatus::Attack;
        self.status = next;
        entered_attack
    }

    /// Act on the current status. Returns true when an attack was made.
    pub fn act(
        &mut self,
        toward_player: Vec2,
        direction: &mut Vec2,
        now: Duration,
        host: &mut impl EnemyHost,
    ) -> bool {
        match self.status {
            EnemyStatus::Attack => {
                self.attack_time = now;
                host.damage_player(self.stats.damage, self.stats.attack_type);
                true
            }
            EnemyStatus::Move => {
                *direction = toward_player;
                false
            }
            EnemyStatus::Idle => {
                *direction = Vec2::ZERO;
                false
            }
        }
    }

    /// Knockback while recovering from a hit.
    pub fn hit_reaction(&self, direction: &mut Vec2) {
        if !self.vulnerable {
            *direction *= -self.stats.resistance;
        }
    }

    /// Called when the current animation wraps around.
    pub fn on_animation_cycle(&mut self) {
        if self.status == EnemyStatus::Attack {
            self.can_attack = false;
        }
    }

    pub fn cooldowns(&mut self, now: Duration) {
        if !self.can_attack && now.saturating_sub(self.attack_time) >= ENEMY_ATTACK_COOLDOWN {
            self.can_attack = true;
        }
        if !self.vulnerable && now.saturating_sub(self.hit_time) >= ENEMY_INVINCIBILITY {
            self.vulnerable = true;
        }
    }

    /// Take `amount` damage unless still invincible from the previous hit.
    /// Returns whether the hit landed.
    pub fn take_damage(
        &mut self,
        amount: f32,
        toward_player: Vec2,
        direction: &mut Vec2,
        now: Duration,
    ) -> bool {
        if !self.vulnerable {
            return false;
        }
        *direction = toward_player;
        self.health -= amount;
        self.hit_time = now;
        self.vulnerable = false;
        true
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Report this enemy's death to the scene.
    pub fn die(&self, position: Vec2, host: &mut impl EnemyHost) {
        host.trigger_death_particles(position, self.kind);
        host.add_gold(self.stats.gold);
    }
}

fn fallback_color(kind: MonsterKind) -> Color {
    match kind {
        MonsterKind::Spirit => Color::srgb(0.85, 0.55, 0.2),
        MonsterKind::Slime => Color::srgb(0.3, 0.8, 0.35),
        MonsterKind::Raccoon => Color::srgb(0.5, 0.45, 0.4),
        MonsterKind::Cyclops => Color::srgb(0.6, 0.25, 0.6),
        MonsterKind::Flam => Color::srgb(0.95, 0.3, 0.15),
        MonsterKind::Tengu => Color::srgb(0.8, 0.15, 0.25),
    }
}

/// Enemy entity components for a monster in the cell at `origin`.
pub fn enemy_bundle(
    kind: MonsterKind,
    origin: Vec2,
    data: &GameData,
    library: &SpriteSheetLibrary,
) -> Result<impl Bundle, SpawnError> {
    let stats = data
        .monster(kind)
        .cloned()
        .ok_or(DataError::MissingMonster(kind.name()))?;
    let enemy = Enemy::new(kind, stats);
    let key = enemy.status.animation_key();
    library.frames(kind.name(), key)?;

    let rect = Hitbox::new(origin.x, origin.y, TILE_SIZE, TILE_SIZE);
    let hitbox = rect.inflate(0.0, data.hitbox_offsets.enemy);

    Ok((
        enemy,
        Attackable(TargetKind::Enemy),
        hitbox,
        MoveDirection::default(),
        Animator::new(kind.name(), key, CHARACTER_ANIMATION_SPEED),
        VisualSize(rect.size()),
        library.sprite(kind.name(), key, rect.size(), fallback_color(kind)),
        Transform::from_translation(map_to_world(hitbox.center(), ACTOR_Z)),
    ))
}

// ---------------------------------------------------------------------------
// Systems
// ---------------------------------------------------------------------------

/// Per frame: knockback, move, animate, cooldowns, death.
#[allow(clippy::type_complexity)]
#[span_fn]
fn update_enemies(
    mut commands: Commands,
    time: Res<Time>,
    library: Res<SpriteSheetLibrary>,
    obstacles: Query<&Hitbox, (With<Obstacle>, Without<Enemy>)>,
    mut query: Query<(
        Entity,
        &mut Enemy,
        &mut Hitbox,
        &mut MoveDirection,
        &mut Animator,
    )>,
) {
    let now = time.elapsed();
    let obstacles: Vec<Hitbox> = obstacles.iter().copied().collect();

    for (entity, mut enemy, mut hitbox, mut direction, mut animator) in &mut query {
        enemy.hit_reaction(&mut direction.0);
        let speed = enemy.stats.speed;
        step(&mut hitbox, &mut direction, speed, &obstacles);

        let count = library.frame_count(&animator.sheet, &animator.current);
        if animator.advance(count) {
            enemy.on_animation_cycle();
        }

        enemy.cooldowns(now);

        if enemy.is_dead() {
            commands.entity(entity).despawn();
            enemy.die(hitbox.center(), &mut CommandHost::new(&mut commands));
            commands.trigger(EnemyKilled {
                monster: enemy.kind,
            });
            info!("enemy_killed: {}", enemy.kind.name());
        }
    }
}

/// Pick each enemy's status from the player's position and act on it.
#[allow(clippy::type_complexity)]
#[span_fn]
fn enemy_ai(
    mut commands: Commands,
    time: Res<Time>,
    player: Query<&Hitbox, (With<Player>, Without<Enemy>)>,
    mut enemies: Query<(&mut Enemy, &Hitbox, &mut MoveDirection, &mut Animator)>,
) {
    let Ok(player_hitbox) = player.single() else {
        return;
    };
    let now = time.elapsed();
    let target = player_hitbox.center();
    let mut host = CommandHost::new(&mut commands);
    let mut attacks = Vec::new();

    for (mut enemy, hitbox, mut direction, mut animator) in &mut enemies {
        let (distance, toward_player) = distance_direction(hitbox.center(), target);
        if enemy.update_status(distance) {
            animator.frame_index = 0.0;
        }
        animator.play(enemy.status.animation_key());

        if enemy.act(toward_player, &mut direction.0, now, &mut host) {
            attacks.push(enemy.kind);
        }
    }

    for monster in attacks {
        commands.trigger(EnemyAttacked { monster });
    }
}

#[span_fn]
fn flicker_enemies(time: Res<Time>, mut query: Query<(&Enemy, &mut Sprite)>) {
    for (enemy, mut sprite) in &mut query {
        let alpha = if enemy.vulnerable {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::AttackType;
    use crate::events::testing::{HostCall, RecordingHost};

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn enemy(kind: MonsterKind) -> Enemy {
        let data = GameData::default();
        Enemy::new(kind, data.monster(kind).cloned().unwrap())
    }

    #[test]
    fn entering_attack_is_reported_once() {
        let mut e = enemy(MonsterKind::Spirit);
        assert!(e.update_status(30.0));
        assert!(!e.update_status(30.0));
        assert_eq!(e.status, EnemyStatus::Attack);

        e.update_status(500.0);
        assert_eq!(e.status, EnemyStatus::Idle);
        assert!(e.update_status(30.0));
    }

    #[test]
    fn attack_damages_player_every_frame() {
        let mut e = enemy(MonsterKind::Spirit);
        let mut host = RecordingHost::default();
        let mut dir = Vec2::ZERO;
        e.update_status(10.0);
        assert!(e.act(Vec2::X, &mut dir, ms(100), &mut host));
        assert!(e.act(Vec2::X, &mut dir, ms(116), &mut host));
        assert_eq!(
            host.calls,
            vec![
                HostCall::DamagePlayer(10.0, AttackType::Slash),
                HostCall::DamagePlayer(10.0, AttackType::Slash),
            ]
        );
        assert_eq!(e.attack_time, ms(116));
    }

    #[test]
    fn move_steers_toward_player_and_idle_stops() {
        let mut e = enemy(MonsterKind::Slime);
        let mut host = RecordingHost::default();
        let mut dir = Vec2::ZERO;

        e.update_status(200.0);
        e.act(Vec2::new(0.0, 1.0), &mut dir, ms(0), &mut host);
        assert_eq!(dir, Vec2::new(0.0, 1.0));

        e.update_status(1000.0);
        e.act(Vec2::new(0.0, 1.0), &mut dir, ms(0), &mut host);
        assert_eq!(dir, Vec2::ZERO);
        assert!(host.calls.is_empty());
    }

    #[test]
    fn finished_attack_cycle_starts_cooldown() {
        let mut e = enemy(MonsterKind::Raccoon);
        let mut host = RecordingHost::default();
        let mut dir = Vec2::ZERO;
        e.update_status(50.0);
        e.act(Vec2::X, &mut dir, ms(1000), &mut host);
        e.on_animation_cycle();
        assert!(!e.can_attack);

        e.update_status(50.0);
        assert_eq!(e.status, EnemyStatus::Move);

        e.cooldowns(ms(1399));
        assert!(!e.can_attack);
        e.cooldowns(ms(1400));
        assert!(e.can_attack);
    }

    #[test]
    fn idle_cycle_does_not_block_attacks() {
        let mut e = enemy(MonsterKind::Raccoon);
        e.on_animation_cycle();
        assert!(e.can_attack);
    }

    #[test]
    fn damage_twice_within_window_lands_once() {
        let mut e = enemy(MonsterKind::Spirit);
        let mut dir = Vec2::ZERO;
        assert!(e.take_damage(25.0, Vec2::X, &mut dir, ms(0)));
        assert!(!e.take_damage(25.0, Vec2::X, &mut dir, ms(200)));
        assert_eq!(e.health, 75.0);

        e.cooldowns(ms(300));
        assert!(e.take_damage(25.0, Vec2::X, &mut dir, ms(300)));
        assert_eq!(e.health, 50.0);
    }

    #[test]
    fn knockback_flips_direction_while_invincible() {
        let mut e = enemy(MonsterKind::Spirit);
        let mut dir = Vec2::ZERO;
        e.take_damage(1.0, Vec2::new(1.0, 0.0), &mut dir, ms(0));
        e.hit_reaction(&mut dir);
        assert_eq!(dir, Vec2::new(-3.0, 0.0));

        e.cooldowns(ms(300));
        let mut dir = Vec2::new(1.0, 0.0);
        e.hit_reaction(&mut dir);
        assert_eq!(dir, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn death_reports_particles_and_gold() {
        let mut e = enemy(MonsterKind::Slime);
        let mut host = RecordingHost::default();
        let mut dir = Vec2::ZERO;
        e.take_damage(70.0, Vec2::X, &mut dir, ms(0));
        assert!(e.is_dead());
        e.die(Vec2::new(5.0, 6.0), &mut host);
        assert_eq!(
            host.calls,
            vec![
                HostCall::DeathParticles(Vec2::new(5.0, 6.0), MonsterKind::Slime),
                HostCall::AddGold(160),
            ]
        );
    }

    #[test]
    fn bundle_requires_idle_frames() {
        use crate::plugins::sprites::SpriteSheetMeta;

        let data = GameData::default();
        let mut library = SpriteSheetLibrary::default();
        library.insert(
            "tengu",
            SpriteSheetMeta::from_counts([64, 64], 4, &[("move", 4), ("attack", 4)]),
        );
        assert!(matches!(
            enemy_bundle(MonsterKind::Tengu, Vec2::ZERO, &data, &library),
            Err(SpawnError::Sprite(_))
        ));

        library.insert(
            "tengu",
            SpriteSheetMeta::from_counts([64, 64], 4, &[("idle", 4), ("move", 4), ("attack", 4)]),
        );
        assert!(enemy_bundle(MonsterKind::Tengu, Vec2::ZERO, &data, &library).is_ok());
    }
}
