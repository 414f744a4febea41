//! Player stat ledger: current value, cap and escalating gold cost per stat.

use serde::{Deserialize, Serialize};

/// Value multiplier applied by one purchase.
pub const UPGRADE_VALUE_FACTOR: f32 = 1.2;
/// Cost multiplier applied by one purchase.
pub const UPGRADE_COST_FACTOR: f32 = 1.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    Health,
    Energy,
    Attack,
    Magic,
    Speed,
}

impl StatKind {
    /// Display and menu order.
    pub const ALL: [StatKind; 5] = [
        StatKind::Health,
        StatKind::Energy,
        StatKind::Attack,
        StatKind::Magic,
        StatKind::Speed,
    ];

    pub fn index(&self) -> usize {
        match self {
            StatKind::Health => 0,
            StatKind::Energy => 1,
            StatKind::Attack => 2,
            StatKind::Magic => 3,
            StatKind::Speed => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            StatKind::Health => "health",
            StatKind::Energy => "energy",
            StatKind::Attack => "attack",
            StatKind::Magic => "magic",
            StatKind::Speed => "speed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatLine {
    pub value: f32,
    pub max: f32,
    pub cost: f32,
}

impl StatLine {
    pub fn new(value: f32, max: f32, cost: f32) -> Self {
        Self { value, max, cost }
    }

    pub fn can_purchase(&self, gold: u32) -> bool {
        gold as f32 >= self.cost && self.value < self.max
    }
}

/// The five upgradable stats, indexed by [`StatKind`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatSheet {
    pub health: StatLine,
    pub energy: StatLine,
    pub attack: StatLine,
    pub magic: StatLine,
    pub speed: StatLine,
}

impl Default for StatSheet {
    fn default() -> Self {
        Self {
            health: StatLine::new(100.0, 300.0, 100.0),
            energy: StatLine::new(60.0, 140.0, 100.0),
            attack: StatLine::new(10.0, 20.0, 100.0),
            magic: StatLine::new(4.0, 10.0, 100.0),
            speed: StatLine::new(5.0, 10.0, 100.0),
        }
    }
}

impl StatSheet {
    pub fn line(&self, kind: StatKind) -> &StatLine {
        match kind {
            StatKind::Health => &self.health,
            StatKind::Energy => &self.energy,
            StatKind::Attack => &self.attack,
            StatKind::Magic => &self.magic,
            StatKind::Speed => &self.speed,
        }
    }

    pub fn line_mut(&mut self, kind: StatKind) -> &mut StatLine {
        match kind {
            StatKind::Health => &mut self.health,
            StatKind::Energy => &mut self.energy,
            StatKind::Attack => &mut self.attack,
            StatKind::Magic => &mut self.magic,
            StatKind::Speed => &mut self.speed,
        }
    }

    pub fn value(&self, kind: StatKind) -> f32 {
        self.line(kind).value
    }

    /// Buy one upgrade of `kind`. Returns false (changing nothing) when the
    /// player cannot afford it or the stat is already at its cap.
    ///
    /// Gold is whole: the fractional cost is rounded to the nearest gold
    /// when deducted, while the stored cost keeps growing unrounded.
    pub fn purchase(&mut self, kind: StatKind, gold: &mut u32) -> bool {
        let line = self.line_mut(kind);
        if !line.can_purchase(*gold) {
            return false;
        }

        *gold = gold.saturating_sub(line.cost.round() as u32);
        line.value *= UPGRADE_VALUE_FACTOR;
        line.cost *= UPGRADE_COST_FACTOR;
        line.value = line.value.min(line.max);
        true
    }
}
