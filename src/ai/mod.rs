//! Enemy perception: which behaviour an enemy picks this frame.
//!
//! Status is recomputed from scratch every frame. It depends only on the
//! distance to the player, the enemy's radii and whether its attack is ready;
//! the previous status matters only for resetting the attack animation.

use crate::data::MonsterStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EnemyStatus {
    #[default]
    Idle,
    Move,
    Attack,
}

impl EnemyStatus {
    /// Animation key for this status.
    pub fn animation_key(&self) -> &'static str {
        match self {
            EnemyStatus::Idle => "idle",
            EnemyStatus::Move => "move",
            EnemyStatus::Attack => "attack",
        }
    }
}

/// Pick a status for an enemy `distance` pixels from the player.
pub fn next_status(distance: f32, stats: &MonsterStats, can_attack: bool) -> EnemyStatus {
    if distance <= stats.attack_radius && can_attack {
        EnemyStatus::Attack
    } else if distance <= stats.notice_radius {
        EnemyStatus::Move
    } else {
        EnemyStatus::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{GameData, MonsterKind};

    fn spirit() -> MonsterStats {
        GameData::default()
            .monster(MonsterKind::Spirit)
            .cloned()
            .unwrap()
    }

    #[test]
    fn in_attack_radius_and_ready_attacks() {
        assert_eq!(next_status(40.0, &spirit(), true), EnemyStatus::Attack);
    }

    #[test]
    fn attack_radius_is_inclusive() {
        assert_eq!(next_status(50.0, &spirit(), true), EnemyStatus::Attack);
    }

    #[test]
    fn cooling_down_enemy_pursues_instead() {
        assert_eq!(next_status(40.0, &spirit(), false), EnemyStatus::Move);
    }

    #[test]
    fn within_notice_radius_moves() {
        assert_eq!(next_status(200.0, &spirit(), true), EnemyStatus::Move);
        assert_eq!(next_status(360.0, &spirit(), true), EnemyStatus::Move);
    }

    #[test]
    fn far_away_idles() {
        assert_eq!(next_status(360.5, &spirit(), true), EnemyStatus::Idle);
    }

    #[test]
    fn animation_keys() {
        assert_eq!(EnemyStatus::Idle.animation_key(), "idle");
        assert_eq!(EnemyStatus::Move.animation_key(), "move");
        assert_eq!(EnemyStatus::Attack.animation_key(), "attack");
    }
}
