//! Experience, level-ups and the upgrade draft
//!
//! A level-up offers exactly three options. Ready evolutions are offered
//! first, the rest are drawn by weight from the candidate pool without
//! replacement, and any shortfall is padded with minor rewards.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::effects::LabelStyle;
use super::state::{Player, World};
use super::stats::{DerivedStats, PassiveLevels, derive_stats};
use super::weapon::{LEVEL_UP_POOL, Weapon, WeaponKind};
use crate::consts::{MAX_PASSIVE_SLOTS, MAX_WEAPON_SLOTS, UPGRADE_CHOICES, XP_GROWTH};
use crate::persistence::{PermanentLevels, PersistedProfile};
use crate::tuning::{EVOLUTIONS, EvolutionRecipe, ItemDef, PassiveKind, evolution_for};

/// Draft weight of something the player does not own yet
pub const NEW_WEIGHT: u32 = 5;
/// Draft weight of a level on something already owned
pub const UPGRADE_WEIGHT: u32 = 1;
pub const FALLBACK_HEAL: f32 = 30.0;
pub const FALLBACK_SCORE: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReward {
    Chicken,
    GoldBag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UpgradeKind {
    /// New weapon, or the next level of an owned one
    Weapon { weapon: WeaponKind },
    Evolution { base: WeaponKind, result: WeaponKind },
    Passive { passive: PassiveKind },
    Fallback { reward: FallbackReward },
}

/// One choice on the level-up screen, self-describing for the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeOption {
    pub id: String,
    pub kind: UpgradeKind,
    pub title: String,
    pub description: String,
    pub is_new: bool,
    /// Name of the item that completes this one's evolution recipe
    pub evolution_pair: Option<String>,
    /// Whether that partner is already owned
    pub evolution_owned: bool,
}

/// What the player is carrying this run
#[derive(Debug, Clone, Default)]
pub struct Loadout {
    pub weapons: Vec<Weapon>,
    pub passives: PassiveLevels,
    pub permanent: PermanentLevels,
    pub items: Vec<&'static ItemDef>,
}

impl Loadout {
    /// Fresh run loadout: the profile's starting weapon and no passives
    pub fn from_profile(profile: &PersistedProfile) -> Self {
        Self {
            weapons: vec![Weapon::new(profile.starting_weapon())],
            passives: PassiveLevels::new(),
            permanent: profile.permanent,
            items: profile.equipped_items(),
        }
    }

    pub fn derived_stats(&self) -> DerivedStats {
        derive_stats(&self.permanent, &self.items, &self.passives)
    }

    pub fn weapon(&self, kind: WeaponKind) -> Option<&Weapon> {
        self.weapons.iter().find(|w| w.kind == kind)
    }

    pub fn passive_level(&self, kind: PassiveKind) -> u32 {
        self.passives.get(&kind).copied().unwrap_or(0)
    }

    /// Base weapon maxed and catalyst passive owned
    pub fn evolution_ready(&self, recipe: &EvolutionRecipe) -> bool {
        self.weapon(recipe.base).is_some_and(Weapon::is_max_level)
            && self.passive_level(recipe.passive) >= 1
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    kind: UpgradeKind,
    weight: u32,
}

/// Everything the weighted draw may pick from, in a stable order
fn candidates(loadout: &Loadout) -> Vec<Candidate> {
    let mut out = Vec::new();
    let weapon_room = loadout.weapons.len() < MAX_WEAPON_SLOTS;
    let passive_room = loadout.passives.len() < MAX_PASSIVE_SLOTS;

    for kind in LEVEL_UP_POOL {
        let weight = match loadout.weapon(kind) {
            Some(w) if !w.is_max_level() => UPGRADE_WEIGHT,
            Some(_) => continue,
            None if weapon_room => NEW_WEIGHT,
            None => continue,
        };
        out.push(Candidate {
            kind: UpgradeKind::Weapon { weapon: kind },
            weight,
        });
    }
    // Owned weapons outside the draft pool (a starting katana) still level up
    for w in &loadout.weapons {
        if !LEVEL_UP_POOL.contains(&w.kind) && !w.is_max_level() {
            out.push(Candidate {
                kind: UpgradeKind::Weapon { weapon: w.kind },
                weight: UPGRADE_WEIGHT,
            });
        }
    }

    for kind in PassiveKind::all() {
        let level = loadout.passive_level(kind);
        let weight = if level == 0 {
            if !passive_room {
                continue;
            }
            NEW_WEIGHT
        } else if level < kind.def().max_level {
            UPGRADE_WEIGHT
        } else {
            continue;
        };
        out.push(Candidate {
            kind: UpgradeKind::Passive { passive: kind },
            weight,
        });
    }
    out
}

/// Roulette-wheel pick over integer weights
pub(crate) fn pick_weighted(weights: &[u32], rng: &mut impl Rng) -> Option<usize> {
    let total: u32 = weights.iter().sum();
    if total == 0 {
        return None;
    }
    let mut roll = rng.random_range(0..total);
    for (i, &w) in weights.iter().enumerate() {
        if roll < w {
            return Some(i);
        }
        roll -= w;
    }
    Some(weights.len() - 1)
}

fn describe(kind: UpgradeKind, loadout: &Loadout) -> UpgradeOption {
    match kind {
        UpgradeKind::Weapon { weapon } => {
            let owned = loadout.weapon(weapon);
            let recipe = evolution_for(weapon);
            UpgradeOption {
                id: weapon.id().to_string(),
                kind,
                title: weapon.name().to_string(),
                description: match owned {
                    Some(w) => format!("Upgrade to Lv {}", w.level + 1),
                    None => "New Weapon!".to_string(),
                },
                is_new: owned.is_none(),
                evolution_pair: recipe.map(|r| r.passive.def().name.to_string()),
                evolution_owned: recipe.is_some_and(|r| loadout.passive_level(r.passive) > 0),
            }
        }
        UpgradeKind::Passive { passive } => {
            let def = passive.def();
            let level = loadout.passive_level(passive);
            let recipe = EVOLUTIONS.iter().find(|r| r.passive == passive);
            UpgradeOption {
                id: passive.id().to_string(),
                kind,
                title: def.name.to_string(),
                description: format!("Lv {}: {}", level + 1, def.description),
                is_new: level == 0,
                evolution_pair: recipe.map(|r| r.base.name().to_string()),
                evolution_owned: recipe.is_some_and(|r| loadout.weapon(r.base).is_some()),
            }
        }
        UpgradeKind::Evolution { result, .. } => UpgradeOption {
            id: format!("evo_{}", result.id()),
            kind,
            title: result.name().to_string(),
            description: result.description().to_string(),
            is_new: true,
            evolution_pair: None,
            evolution_owned: false,
        },
        UpgradeKind::Fallback { reward } => UpgradeOption {
            // Filled in by the caller, which knows the slot
            id: String::new(),
            kind,
            title: match reward {
                FallbackReward::Chicken => "Delicious Chicken",
                FallbackReward::GoldBag => "Bag of Gold",
            }
            .to_string(),
            description: format!("Recover {FALLBACK_HEAL} HP & +{FALLBACK_SCORE} Score"),
            is_new: false,
            evolution_pair: None,
            evolution_owned: false,
        },
    }
}

/// Build the three level-up choices
pub fn generate_options(loadout: &Loadout, rng: &mut impl Rng) -> Vec<UpgradeOption> {
    let mut options = Vec::with_capacity(UPGRADE_CHOICES);

    for recipe in EVOLUTIONS.iter().filter(|r| loadout.evolution_ready(r)) {
        if options.len() == UPGRADE_CHOICES {
            break;
        }
        let kind = UpgradeKind::Evolution {
            base: recipe.base,
            result: recipe.result,
        };
        options.push(describe(kind, loadout));
    }

    let mut pool = candidates(loadout);
    let mut weights: Vec<u32> = pool.iter().map(|c| c.weight).collect();
    while options.len() < UPGRADE_CHOICES {
        let Some(idx) = pick_weighted(&weights, rng) else {
            break;
        };
        let picked = pool.remove(idx);
        weights.remove(idx);
        options.push(describe(picked.kind, loadout));
    }

    while options.len() < UPGRADE_CHOICES {
        let reward = if rng.random::<f32>() < 0.5 {
            FallbackReward::Chicken
        } else {
            FallbackReward::GoldBag
        };
        let mut option = describe(UpgradeKind::Fallback { reward }, loadout);
        option.id = format!("fallback_{}", options.len());
        options.push(option);
    }

    options
}

pub fn level_up_ready(player: &Player) -> bool {
    player.xp >= player.max_xp as f32
}

/// Spend one level's worth of XP. The remainder carries over.
pub fn grant_level(player: &mut Player) {
    player.xp -= player.max_xp as f32;
    player.max_xp = (player.max_xp as f32 * XP_GROWTH).floor() as u32;
    player.level += 1;
    player.hp = player.max_hp();
    log::info!("Level up: {} (next at {} xp)", player.level, player.max_xp);
}

/// Apply a chosen option. Returns false if it no longer fits the loadout.
pub fn apply_upgrade(option: &UpgradeOption, loadout: &mut Loadout, world: &mut World) -> bool {
    match option.kind {
        UpgradeKind::Evolution { base, result } => {
            let Some(idx) = loadout.weapons.iter().position(|w| w.kind == base) else {
                log::warn!("Cannot evolve {}: not owned", base.name());
                return false;
            };
            loadout.weapons.remove(idx);
            world.retire_projectiles(base);
            loadout.weapons.push(Weapon::new(result));
            log::info!("{} evolved into {}", base.name(), result.name());
            true
        }
        UpgradeKind::Weapon { weapon } => {
            if let Some(owned) = loadout.weapons.iter_mut().find(|w| w.kind == weapon) {
                return owned.upgrade();
            }
            if loadout.weapons.len() >= MAX_WEAPON_SLOTS {
                log::warn!("No free weapon slot for {}", weapon.name());
                return false;
            }
            loadout.weapons.push(Weapon::new(weapon));
            log::debug!("Acquired {}", weapon.name());
            true
        }
        UpgradeKind::Passive { passive } => {
            let level = loadout.passives.entry(passive).or_insert(0);
            if *level >= passive.def().max_level {
                return false;
            }
            *level += 1;
            let stats = loadout.derived_stats();
            world.player.apply_stats(stats);
            log::debug!("{} now level {}", passive.def().name, loadout.passive_level(passive));
            true
        }
        UpgradeKind::Fallback { reward } => {
            world.player.heal(FALLBACK_HEAL);
            world.player.score += FALLBACK_SCORE;
            let pos = world.player.pos - Vec2::new(0.0, 20.0);
            match reward {
                FallbackReward::Chicken => world.spawn_label(pos, "+30 HP", LabelStyle::Heal),
                FallbackReward::GoldBag => world.spawn_label(pos, "+500 Pts", LabelStyle::Notice),
            }
            true
        }
    }
}
