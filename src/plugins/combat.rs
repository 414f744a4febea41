//! Attack hitboxes and everything they can hit: enemies, keys and the door.
//!
//! Also hosts the scene side of the player and enemy callbacks: damage to the
//! player, gold, weapon swings and spells.

use std::collections::HashSet;

use bevy::prelude::*;
use micromegas_tracing::prelude::*;
use rand::Rng;

use crate::components::{Facing, MoveDirection};
use crate::data::{GameData, MagicKind, WeaponData};
use crate::events::{
    AttackEnded, AttackRequested, EnemyHit, EnemyKilled, GoldAwarded, MagicCast, PlayerDamaged,
    SpellFired, TileDestroyed, WeaponSwung,
};
use crate::geometry::{Hitbox, TILE_SIZE, distance_direction, map_to_world};
use crate::plugins::enemies::Enemy;
use crate::plugins::level::LevelEntity;
use crate::plugins::particles::{EFFECT_Z, ParticlesRequested, particle_bundle};
use crate::plugins::player::Player;
use crate::plugins::sprites::SpriteSheetLibrary;
use crate::plugins::telemetry::GameSet;
use crate::resources::GameStats;

/// Gold a gated key costs to break.
pub const GATED_KEY_PRICE: u32 = 2000;
/// The door opens only with exactly this many keys.
pub const KEYS_TO_OPEN_DOOR: u32 = 3;

const FLAME_COUNT: i32 = 5;
const WEAPON_COLOR: Color = Color::srgba(0.85, 0.85, 0.9, 0.7);

pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ActiveWeapon>();
        app.add_systems(Update, resolve_combat.in_set(GameSet::Combat));
        app.add_observer(on_player_damaged);
        app.add_observer(on_gold_awarded);
        app.add_observer(on_attack_requested);
        app.add_observer(on_attack_ended);
        app.add_observer(on_magic_cast);
        app.add_observer(count_kills);
        app.add_observer(count_keys);
    }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// What happens when an attack hitbox overlaps this entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// Always breakable; grants a key.
    Keys,
    /// Breakable for [`GATED_KEY_PRICE`] gold; grants a key.
    GatedKey,
    /// Breakable only while holding [`KEYS_TO_OPEN_DOOR`] keys.
    Door,
    Enemy,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Attackable(pub TargetKind);

/// Selects the damage formula used against enemies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackKind {
    Weapon,
    Magic(MagicKind),
}

#[derive(Component, Debug, Clone, Copy)]
pub struct AttackHitbox(pub AttackKind);

/// The weapon swing currently on screen, if any.
#[derive(Resource, Debug, Default)]
pub struct ActiveWeapon(pub Option<Entity>);

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// A tile was broken and must be removed.
    Destroyed {
        target: Entity,
        kind: TargetKind,
        position: Vec2,
    },
    /// An enemy was struck; its own invincibility decides whether it counts.
    EnemyStruck { target: Entity, attack: AttackKind },
}

/// Test every attack against every target and apply the tile rules to the
/// player. A tile broken by one attack is skipped by the rest.
pub fn resolve_attacks(
    attacks: &[(AttackKind, Hitbox)],
    targets: &[(Entity, TargetKind, Hitbox)],
    player: &mut Player,
) -> Vec<Outcome> {
    let mut consumed = HashSet::new();
    let mut outcomes = Vec::new();

    for (attack, attack_box) in attacks {
        for (target, kind, target_box) in targets {
            if consumed.contains(target) || !attack_box.overlaps(target_box) {
                continue;
            }
            let destroyed = match kind {
                TargetKind::Keys => {
                    player.keys += 1;
                    true
                }
                TargetKind::GatedKey => {
                    if player.gold >= GATED_KEY_PRICE {
                        player.gold -= GATED_KEY_PRICE;
                        player.keys += 1;
                        true
                    } else {
                        false
                    }
                }
                TargetKind::Door => player.keys == KEYS_TO_OPEN_DOOR,
                TargetKind::Enemy => {
                    outcomes.push(Outcome::EnemyStruck {
                        target: *target,
                        attack: *attack,
                    });
                    false
                }
            };
            if destroyed {
                consumed.insert(*target);
                outcomes.push(Outcome::Destroyed {
                    target: *target,
                    kind: *kind,
                    position: target_box.center(),
                });
            }
        }
    }
    outcomes
}

/// Damage an attack of `kind` deals, from the player's stats.
pub fn attack_damage(player: &Player, kind: AttackKind, data: &GameData) -> f32 {
    match kind {
        AttackKind::Weapon => player.weapon_damage(&data.weapons),
        AttackKind::Magic(_) => player.magic_damage(&data.spells),
    }
}

/// Swing hitbox placed on the `facing` side of the player's drawn rectangle,
/// overlapping it by the weapon's inset. The box is sized from the weapon
/// table rather than from a weapon sprite, so it sits flush against the
/// player tile instead of trailing back along the facing axis.
pub fn weapon_hitbox(player_center: Vec2, facing: Facing, weapon: &WeaponData) -> Hitbox {
    let size = Vec2::from(weapon.size);
    let reach = match facing {
        Facing::Left | Facing::Right => (TILE_SIZE + size.x) / 2.0 - weapon.inset,
        Facing::Up | Facing::Down => (TILE_SIZE + size.y) / 2.0 - weapon.inset,
    };
    Hitbox::from_center(player_center + facing.vector() * reach, size)
}

/// Where the `i`-th flame lands, before jitter.
pub fn flame_position(player_center: Vec2, facing: Facing, i: i32) -> Vec2 {
    player_center + facing.vector() * (i as f32 * TILE_SIZE)
}

#[span_fn]
fn resolve_combat(
    mut commands: Commands,
    time: Res<Time>,
    data: Res<GameData>,
    attacks: Query<(&AttackHitbox, &Hitbox)>,
    targets: Query<(Entity, &Attackable, &Hitbox)>,
    mut players: Query<(&mut Player, &Hitbox)>,
    mut enemies: Query<(&mut Enemy, &Hitbox, &mut MoveDirection)>,
) {
    let attacks: Vec<(AttackKind, Hitbox)> = attacks.iter().map(|(a, hb)| (a.0, *hb)).collect();
    if attacks.is_empty() {
        return;
    }
    let Ok((mut player, player_box)) = players.single_mut() else {
        return;
    };
    let targets: Vec<(Entity, TargetKind, Hitbox)> =
        targets.iter().map(|(e, a, hb)| (e, a.0, *hb)).collect();
    let now = time.elapsed();
    let player_center = player_box.center();

    for outcome in resolve_attacks(&attacks, &targets, &mut player) {
        match outcome {
            Outcome::Destroyed {
                target,
                kind,
                position,
            } => {
                commands.entity(target).despawn();
                commands.trigger(TileDestroyed { kind, position });
                info!("tile_destroyed: {kind:?} keys={}", player.keys);
            }
            Outcome::EnemyStruck { target, attack } => {
                let Ok((mut enemy, enemy_box, mut direction)) = enemies.get_mut(target) else {
                    continue;
                };
                let amount = attack_damage(&player, attack, &data);
                let (_, toward_player) = distance_direction(enemy_box.center(), player_center);
                if enemy.take_damage(amount, toward_player, &mut direction.0, now) {
                    commands.trigger(EnemyHit);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Host observers
// ---------------------------------------------------------------------------

fn on_player_damaged(
    trigger: On<PlayerDamaged>,
    mut commands: Commands,
    time: Res<Time>,
    mut players: Query<(&mut Player, &Hitbox)>,
) {
    let hit = trigger.event();
    let Ok((mut player, hitbox)) = players.single_mut() else {
        return;
    };
    if player.receive_damage(hit.amount, time.elapsed()) {
        commands.trigger(ParticlesRequested::new(
            hit.attack_type.effect(),
            hitbox.center(),
        ));
        if !player.alive {
            info!("player_died");
        }
    }
}

fn on_gold_awarded(
    trigger: On<GoldAwarded>,
    mut players: Query<&mut Player>,
    stats: Option<ResMut<GameStats>>,
) {
    let amount = trigger.event().amount;
    for mut player in &mut players {
        player.gold = player.gold.saturating_add(amount);
    }
    if let Some(mut stats) = stats {
        stats.gold_earned += u64::from(amount);
    }
}

fn on_attack_requested(
    _trigger: On<AttackRequested>,
    mut commands: Commands,
    data: Res<GameData>,
    mut active: ResMut<ActiveWeapon>,
    players: Query<(&Player, &Hitbox)>,
) {
    if active.0.is_some() {
        return;
    }
    let Ok((player, hitbox)) = players.single() else {
        return;
    };
    let Some(weapon) = data.weapon(player.weapon_index) else {
        warn!("no weapon at index {}", player.weapon_index);
        return;
    };

    let swing = weapon_hitbox(hitbox.center(), player.status.facing, weapon);
    let entity = commands
        .spawn((
            AttackHitbox(AttackKind::Weapon),
            swing,
            LevelEntity,
            Sprite::from_color(WEAPON_COLOR, swing.size()),
            Transform::from_translation(map_to_world(swing.center(), EFFECT_Z)),
        ))
        .id();
    active.0 = Some(entity);
    commands.trigger(WeaponSwung);
}

fn on_attack_ended(
    _trigger: On<AttackEnded>,
    mut commands: Commands,
    mut active: ResMut<ActiveWeapon>,
) {
    if let Some(entity) = active.0.take() {
        commands.entity(entity).try_despawn();
    }
}

fn on_magic_cast(
    trigger: On<MagicCast>,
    mut commands: Commands,
    library: Res<SpriteSheetLibrary>,
    mut players: Query<(&mut Player, &Hitbox)>,
) {
    let cast = *trigger.event();
    let Ok((mut player, hitbox)) = players.single_mut() else {
        return;
    };
    let center = hitbox.center();

    match cast.style {
        MagicKind::Heal => {
            if !player.heal(cast.strength, cast.cost) {
                return;
            }
            commands.trigger(ParticlesRequested::new("aura", center));
            commands.trigger(ParticlesRequested::new(
                "heal",
                center + Vec2::new(0.0, -60.0),
            ));
        }
        MagicKind::Flame => {
            if !player.spend_energy(cast.cost) {
                return;
            }
            let facing = player.status.facing;
            let jitter = TILE_SIZE / 3.0;
            let mut rng = rand::thread_rng();
            for i in 1..=FLAME_COUNT {
                let offset = Vec2::new(
                    rng.gen_range(-jitter..=jitter),
                    rng.gen_range(-jitter..=jitter),
                );
                let position = flame_position(center, facing, i) + offset;
                match particle_bundle("flame", position, false, &library) {
                    Ok(bundle) => {
                        commands.spawn((
                            bundle,
                            AttackHitbox(AttackKind::Magic(MagicKind::Flame)),
                        ));
                    }
                    Err(e) => {
                        error!("flame skipped: {e}");
                        break;
                    }
                }
            }
        }
    }
    commands.trigger(SpellFired { style: cast.style });
}

// ---------------------------------------------------------------------------
// Session stats
// ---------------------------------------------------------------------------

fn count_kills(_trigger: On<EnemyKilled>, stats: Option<ResMut<GameStats>>) {
    if let Some(mut stats) = stats {
        stats.enemies_slain += 1;
        imetric!("enemies_slain", "count", u64::from(stats.enemies_slain));
    }
}

fn count_keys(trigger: On<TileDestroyed>, stats: Option<ResMut<GameStats>>) {
    if !matches!(trigger.event().kind, TargetKind::Keys | TargetKind::GatedKey) {
        return;
    }
    if let Some(mut stats) = stats {
        stats.keys_collected += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::WeaponKind;
    use crate::stats::StatSheet;

    fn player() -> Player {
        Player::new(StatSheet::default())
    }

    fn tile(col: f32, row: f32) -> Hitbox {
        Hitbox::new(col * TILE_SIZE, row * TILE_SIZE, TILE_SIZE, TILE_SIZE)
    }

    fn swing_over(target: &Hitbox) -> (AttackKind, Hitbox) {
        (AttackKind::Weapon, target.inflate(-10.0, -10.0))
    }

    /// Distinct live entity ids; the resolver only compares them.
    fn entities<const N: usize>() -> [Entity; N] {
        let mut world = World::new();
        std::array::from_fn(|_| world.spawn_empty().id())
    }

    #[test]
    fn keys_tile_always_breaks() {
        let [key] = entities();
        let mut p = player();
        let target = tile(2.0, 2.0);
        let out = resolve_attacks(&[swing_over(&target)], &[(key, TargetKind::Keys, target)], &mut p);
        assert_eq!(p.keys, 1);
        assert!(matches!(out[..], [Outcome::Destroyed { kind: TargetKind::Keys, .. }]));
    }

    #[test]
    fn gated_key_needs_full_price() {
        let [key1] = entities();
        let target = tile(0.0, 0.0);
        let targets = [(key1, TargetKind::GatedKey, target)];

        let mut poor = player();
        poor.gold = 1999;
        assert!(resolve_attacks(&[swing_over(&target)], &targets, &mut poor).is_empty());
        assert_eq!(poor.gold, 1999);
        assert_eq!(poor.keys, 0);

        let mut rich = player();
        rich.gold = 2000;
        let out = resolve_attacks(&[swing_over(&target)], &targets, &mut rich);
        assert_eq!(out.len(), 1);
        assert_eq!(rich.gold, 0);
        assert_eq!(rich.keys, 1);
    }

    #[test]
    fn door_needs_exactly_three_keys() {
        let [door] = entities();
        let target = tile(5.0, 5.0);
        let targets = [(door, TargetKind::Door, target)];

        let mut p = player();
        p.keys = 2;
        assert!(resolve_attacks(&[swing_over(&target)], &targets, &mut p).is_empty());

        p.keys = 3;
        let out = resolve_attacks(&[swing_over(&target)], &targets, &mut p);
        assert_eq!(out.len(), 1);
        assert_eq!(p.keys, 3);

        p.keys = 4;
        assert!(resolve_attacks(&[swing_over(&target)], &targets, &mut p).is_empty());
    }

    #[test]
    fn a_tile_is_consumed_once_per_frame() {
        let [key] = entities();
        let target = tile(1.0, 1.0);
        let attacks = [
            swing_over(&target),
            (AttackKind::Magic(MagicKind::Flame), target),
        ];
        let mut p = player();
        let out = resolve_attacks(&attacks, &[(key, TargetKind::Keys, target)], &mut p);
        assert_eq!(out.len(), 1);
        assert_eq!(p.keys, 1);
    }

    #[test]
    fn one_attack_can_hit_several_targets() {
        let [key, enemy] = entities();
        let a = tile(0.0, 0.0);
        let b = tile(1.0, 0.0);
        let attack = (AttackKind::Weapon, Hitbox::new(32.0, 16.0, 64.0, 32.0));
        let mut p = player();
        let out = resolve_attacks(
            &[attack],
            &[(key, TargetKind::Keys, a), (enemy, TargetKind::Enemy, b)],
            &mut p,
        );
        assert_eq!(out.len(), 2);
        assert!(out.contains(&Outcome::EnemyStruck {
            target: enemy,
            attack: AttackKind::Weapon
        }));
    }

    #[test]
    fn touching_is_not_a_hit() {
        let [key] = entities();
        let target = tile(1.0, 0.0);
        let attack = (AttackKind::Weapon, tile(0.0, 0.0));
        let mut p = player();
        let out = resolve_attacks(&[attack], &[(key, TargetKind::Keys, target)], &mut p);
        assert!(out.is_empty());
    }

    #[test]
    fn damage_formulas_use_player_stats() {
        let data = GameData::default();
        let p = player();
        assert_eq!(attack_damage(&p, AttackKind::Weapon, &data), 25.0);
        assert_eq!(attack_damage(&p, AttackKind::Magic(MagicKind::Flame), &data), 9.0);
    }

    #[test]
    fn weapon_sits_on_the_facing_side() {
        let sword = WeaponData {
            kind: WeaponKind::Sword,
            damage: 15.0,
            size: [48.0, 48.0],
            inset: 8.0,
        };
        let center = Vec2::new(100.0, 100.0);
        let body = Hitbox::from_center(center, Vec2::splat(TILE_SIZE));

        let right = weapon_hitbox(center, Facing::Right, &sword);
        assert_eq!(right.left(), body.right() - 8.0);
        assert_eq!(right.center().y, center.y);

        let up = weapon_hitbox(center, Facing::Up, &sword);
        assert_eq!(up.bottom(), body.top() + 8.0);
        assert_eq!(up.center().x, center.x);
    }

    #[test]
    fn flames_step_one_tile_at_a_time() {
        let c = Vec2::new(200.0, 200.0);
        assert_eq!(flame_position(c, Facing::Left, 1), Vec2::new(136.0, 200.0));
        assert_eq!(flame_position(c, Facing::Down, 5), Vec2::new(200.0, 520.0));
    }
}
