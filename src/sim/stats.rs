//! Derived player stats
//!
//! Multipliers are always rebuilt from the full permanent/equipment/passive
//! state. Nothing here is incremental, so calling `derive_stats` twice gives
//! the same answer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::consts::{PLAYER_BASE_CRIT_DAMAGE, PLAYER_BASE_CRIT_RATE, PLAYER_BASE_HP};
use crate::persistence::PermanentLevels;
use crate::tuning::{ItemDef, PassiveKind};

/// Lowest allowed cooldown multiplier
pub const MIN_COOLDOWN_MULT: f32 = 0.2;

/// Passive levels keyed by archetype (ordered for stable iteration)
pub type PassiveLevels = BTreeMap<PassiveKind, u32>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Multipliers {
    pub damage: f32,
    pub cooldown: f32,
    pub move_speed: f32,
    pub magnet: f32,
    pub area: f32,
    pub bullet_speed: f32,
    pub duration: f32,
    pub gain: f32,
}

impl Default for Multipliers {
    fn default() -> Self {
        Self {
            damage: 1.0,
            cooldown: 1.0,
            move_speed: 1.0,
            magnet: 1.0,
            area: 1.0,
            bullet_speed: 1.0,
            duration: 1.0,
            gain: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedStats {
    pub max_hp: f32,
    pub multipliers: Multipliers,
    pub crit_rate: f32,
    pub crit_damage: f32,
    /// Fraction of max HP restored per regen pulse
    pub regen: f32,
}

impl Default for DerivedStats {
    fn default() -> Self {
        derive_stats(&PermanentLevels::default(), &[], &PassiveLevels::new())
    }
}

/// Recompute every derived stat from scratch
pub fn derive_stats(
    permanent: &PermanentLevels,
    items: &[&ItemDef],
    passives: &PassiveLevels,
) -> DerivedStats {
    let mut m = Multipliers::default();
    let mut flat_hp = permanent.base_hp as f32 * 10.0;
    let mut hp_pct = 0.0;
    let mut crit_rate = PLAYER_BASE_CRIT_RATE;
    let mut crit_damage = PLAYER_BASE_CRIT_DAMAGE;
    let mut regen = 0.0;

    m.damage += 0.05 * permanent.base_damage as f32;
    m.gain += 0.10 * permanent.gold_gain as f32;
    m.move_speed += 0.05 * permanent.move_speed as f32;
    m.magnet += 0.10 * permanent.magnet_range as f32;

    for item in items {
        let s = &item.stats;
        flat_hp += s.hp;
        m.damage += s.damage;
        m.move_speed += s.speed;
        m.cooldown -= s.cooldown;
        crit_rate += s.crit;
        crit_damage += s.crit_damage;
    }

    for (&kind, &level) in passives {
        let def = kind.def();
        let lvl = level.min(def.max_level) as f32;
        let s = &def.per_level;
        m.area += s.area * lvl;
        m.bullet_speed += s.bullet_speed * lvl;
        m.cooldown -= s.cooldown * lvl;
        m.magnet += s.magnet * lvl;
        m.duration += s.duration * lvl;
        m.move_speed += s.move_speed * lvl;
        m.gain += s.gain * lvl;
        hp_pct += s.max_hp * lvl;
        regen += s.regen * lvl;
    }

    m.cooldown = m.cooldown.max(MIN_COOLDOWN_MULT);

    DerivedStats {
        max_hp: ((PLAYER_BASE_HP + flat_hp) * (1.0 + hp_pct)).floor(),
        multipliers: m,
        crit_rate,
        crit_damage,
        regen,
    }
}
