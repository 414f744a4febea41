//! Gameplay events and the host capabilities the player and enemies call into.
//!
//! Player and enemy logic never touch the scene directly. They call the
//! [`PlayerHost`] / [`EnemyHost`] traits; in the running game those are backed
//! by [`CommandHost`], which turns each call into an observer event.

use bevy::prelude::*;

use crate::data::{AttackType, MagicKind, MonsterKind};
use crate::plugins::combat::TargetKind;

// ---------------------------------------------------------------------------
// Host requests
// ---------------------------------------------------------------------------

/// An enemy attack landed on the player (subject to player vulnerability).
#[derive(Event, Debug, Clone, Copy)]
pub struct PlayerDamaged {
    pub amount: f32,
    pub attack_type: AttackType,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct DeathParticlesRequested {
    pub position: Vec2,
    pub monster: MonsterKind,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct GoldAwarded {
    pub amount: u32,
}

/// Spawn the weapon swing for the current attack.
#[derive(Event, Debug, Clone, Copy)]
pub struct AttackRequested;

/// Remove the weapon swing once the attack cooldown runs out.
#[derive(Event, Debug, Clone, Copy)]
pub struct AttackEnded;

#[derive(Event, Debug, Clone, Copy)]
pub struct MagicCast {
    pub style: MagicKind,
    pub strength: f32,
    pub cost: f32,
}

// ---------------------------------------------------------------------------
// Notifications (audio, stats)
// ---------------------------------------------------------------------------

#[derive(Event, Debug, Clone, Copy)]
pub struct WeaponSwung;

#[derive(Event, Debug, Clone, Copy)]
pub struct SpellFired {
    pub style: MagicKind,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct EnemyAttacked {
    pub monster: MonsterKind,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct EnemyHit;

#[derive(Event, Debug, Clone, Copy)]
pub struct EnemyKilled {
    pub monster: MonsterKind,
}

#[derive(Event, Debug, Clone, Copy)]
pub struct TileDestroyed {
    pub kind: TargetKind,
    pub position: Vec2,
}

// ---------------------------------------------------------------------------
// Host traits
// ---------------------------------------------------------------------------

/// Scene capabilities an enemy may use.
pub trait EnemyHost {
    fn damage_player(&mut self, amount: f32, attack_type: AttackType);
    fn trigger_death_particles(&mut self, position: Vec2, monster: MonsterKind);
    fn add_gold(&mut self, amount: u32);
}

/// Scene capabilities the player may use.
pub trait PlayerHost {
    fn create_attack(&mut self);
    fn destroy_attack(&mut self);
    fn create_magic(&mut self, style: MagicKind, strength: f32, cost: f32);
}

/// Host backed by `Commands`: every call becomes a triggered event.
pub struct CommandHost<'a, 'w, 's> {
    commands: &'a mut Commands<'w, 's>,
}

impl<'a, 'w, 's> CommandHost<'a, 'w, 's> {
    pub fn new(commands: &'a mut Commands<'w, 's>) -> Self {
        Self { commands }
    }
}

impl EnemyHost for CommandHost<'_, '_, '_> {
    fn damage_player(&mut self, amount: f32, attack_type: AttackType) {
        self.commands.trigger(PlayerDamaged {
            amount,
            attack_type,
        });
    }

    fn trigger_death_particles(&mut self, position: Vec2, monster: MonsterKind) {
        self.commands
            .trigger(DeathParticlesRequested { position, monster });
    }

    fn add_gold(&mut self, amount: u32) {
        self.commands.trigger(GoldAwarded { amount });
    }
}

impl PlayerHost for CommandHost<'_, '_, '_> {
    fn create_attack(&mut self) {
        self.commands.trigger(AttackRequested);
    }

    fn destroy_attack(&mut self) {
        self.commands.trigger(AttackEnded);
    }

    fn create_magic(&mut self, style: MagicKind, strength: f32, cost: f32) {
        self.commands.trigger(MagicCast {
            style,
            strength,
            cost,
        });
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum HostCall {
        DamagePlayer(f32, AttackType),
        DeathParticles(Vec2, MonsterKind),
        AddGold(u32),
        CreateAttack,
        DestroyAttack,
        CreateMagic(MagicKind, f32, f32),
    }

    /// Records every host call in order.
    #[derive(Default)]
    pub struct RecordingHost {
        pub calls: Vec<HostCall>,
    }

    impl RecordingHost {
        pub fn count(&self, pred: impl Fn(&HostCall) -> bool) -> usize {
            self.calls.iter().filter(|c| pred(c)).count()
        }
    }

    impl EnemyHost for RecordingHost {
        fn damage_player(&mut self, amount: f32, attack_type: AttackType) {
            self.calls.push(HostCall::DamagePlayer(amount, attack_type));
        }

        fn trigger_death_particles(&mut self, position: Vec2, monster: MonsterKind) {
            self.calls.push(HostCall::DeathParticles(position, monster));
        }

        fn add_gold(&mut self, amount: u32) {
            self.calls.push(HostCall::AddGold(amount));
        }
    }

    impl PlayerHost for RecordingHost {
        fn create_attack(&mut self) {
            self.calls.push(HostCall::CreateAttack);
        }

        fn destroy_attack(&mut self) {
            self.calls.push(HostCall::DestroyAttack);
        }

        fn create_magic(&mut self, style: MagicKind, strength: f32, cost: f32) {
            self.calls.push(HostCall::CreateMagic(style, strength, cost));
        }
    }
}
