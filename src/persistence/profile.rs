//! Meta-progression profile: currency, high score, permanent upgrades and
//! equipped items

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sim::weapon::WeaponKind;
use crate::tuning::{ItemDef, PermanentStat, SlotType, find_item, starting_weapon_for};

/// Purchased level per permanent stat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PermanentLevels {
    pub base_damage: u32,
    pub base_hp: u32,
    pub gold_gain: u32,
    pub move_speed: u32,
    pub magnet_range: u32,
}

impl PermanentLevels {
    pub fn get(&self, stat: PermanentStat) -> u32 {
        match stat {
            PermanentStat::BaseDamage => self.base_damage,
            PermanentStat::BaseHp => self.base_hp,
            PermanentStat::GoldGain => self.gold_gain,
            PermanentStat::MoveSpeed => self.move_speed,
            PermanentStat::MagnetRange => self.magnet_range,
        }
    }

    fn get_mut(&mut self, stat: PermanentStat) -> &mut u32 {
        match stat {
            PermanentStat::BaseDamage => &mut self.base_damage,
            PermanentStat::BaseHp => &mut self.base_hp,
            PermanentStat::GoldGain => &mut self.gold_gain,
            PermanentStat::MoveSpeed => &mut self.move_speed,
            PermanentStat::MagnetRange => &mut self.magnet_range,
        }
    }
}

/// Everything that survives between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedProfile {
    pub gold: u64,
    pub high_score: u64,
    #[serde(rename = "permanentStats")]
    pub permanent: PermanentLevels,
    #[serde(rename = "equippedItems")]
    pub equipped: BTreeMap<SlotType, String>,
}

impl Default for PersistedProfile {
    fn default() -> Self {
        let equipped = [
            (SlotType::Weapon, "kunai"),
            (SlotType::Necklace, "neck_trendy"),
            (SlotType::Glove, "glove_leather"),
            (SlotType::Belt, "belt_army"),
            (SlotType::Boots, "boot_prosthetic"),
        ]
        .into_iter()
        .map(|(slot, id)| (slot, id.to_string()))
        .collect();

        Self {
            gold: 0,
            high_score: 0,
            permanent: PermanentLevels::default(),
            equipped,
        }
    }
}

/// Partially-present record as read from storage
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct StoredProfile {
    gold: Option<u64>,
    high_score: Option<u64>,
    permanent_stats: Option<PermanentLevels>,
    equipped_items: Option<BTreeMap<String, String>>,
}

impl PersistedProfile {
    /// Overlay a stored record onto this one field by field.
    /// Nested maps are merged, not replaced.
    pub(crate) fn merge(mut self, stored: StoredProfile) -> Self {
        if let Some(gold) = stored.gold {
            self.gold = gold;
        }
        if let Some(high_score) = stored.high_score {
            self.high_score = high_score;
        }
        if let Some(permanent) = stored.permanent_stats {
            self.permanent = permanent;
        }
        if let Some(equipped) = stored.equipped_items {
            for (key, item) in equipped {
                match SlotType::from_key(&key) {
                    Some(slot) => {
                        self.equipped.insert(slot, item);
                    }
                    None => log::warn!("Ignoring unknown equipment slot {key:?}"),
                }
            }
        }
        self
    }

    pub fn level(&self, stat: PermanentStat) -> u32 {
        self.permanent.get(stat)
    }

    /// Price of the next level, or None when maxed
    pub fn upgrade_cost(&self, stat: PermanentStat) -> Option<u64> {
        let level = self.level(stat);
        (level < stat.config().max_level).then(|| stat.cost_at(level))
    }

    /// Spend currency on the next level of `stat`. Returns false when maxed
    /// or unaffordable.
    pub fn purchase_upgrade(&mut self, stat: PermanentStat) -> bool {
        let Some(cost) = self.upgrade_cost(stat) else {
            return false;
        };
        if self.gold < cost {
            return false;
        }
        self.gold -= cost;
        *self.permanent.get_mut(stat) += 1;
        log::info!("Purchased {:?} level {} for {}", stat, self.level(stat), cost);
        true
    }

    /// Equip an item into its own slot. Unknown ids are refused.
    pub fn equip(&mut self, item_id: &str) -> bool {
        let Some(item) = find_item(item_id) else {
            log::warn!("Cannot equip unknown item {item_id}");
            return false;
        };
        self.equipped.insert(item.slot, item.id.to_string());
        true
    }

    /// Resolve equipped ids against the item table, skipping unknown ones
    pub fn equipped_items(&self) -> Vec<&'static ItemDef> {
        self.equipped
            .values()
            .filter_map(|id| {
                let item = find_item(id);
                if item.is_none() {
                    log::warn!("Skipping unknown equipped item {id}");
                }
                item
            })
            .collect()
    }

    /// Weapon a run starts with, from the equipped weapon item
    pub fn starting_weapon(&self) -> WeaponKind {
        match self.equipped.get(&SlotType::Weapon) {
            Some(id) => starting_weapon_for(id).unwrap_or_else(|| {
                log::warn!("No starting weapon for item {id}, using pistol");
                WeaponKind::Pistol
            }),
            None => WeaponKind::Pistol,
        }
    }

    /// Bank a finished run. Returns true on a new high score.
    pub fn record_run(&mut self, score: u64, gold: u64) -> bool {
        self.gold += gold;
        if score > self.high_score {
            self.high_score = score;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_loadout() {
        let profile = PersistedProfile::default();
        assert_eq!(profile.equipped.len(), 5);
        assert_eq!(profile.starting_weapon(), WeaponKind::Pistol);
        assert_eq!(profile.equipped_items().len(), 5);
    }

    #[test]
    fn test_purchase_spends_and_caps() {
        let mut profile = PersistedProfile {
            gold: 1300,
            ..Default::default()
        };
        assert!(profile.purchase_upgrade(PermanentStat::BaseDamage));
        assert_eq!(profile.gold, 800);
        assert!(profile.purchase_upgrade(PermanentStat::BaseDamage));
        assert_eq!(profile.gold, 50);
        assert_eq!(profile.level(PermanentStat::BaseDamage), 2);
        assert!(!profile.purchase_upgrade(PermanentStat::BaseDamage));

        profile.permanent.move_speed = 20;
        profile.gold = u64::MAX / 2;
        assert_eq!(profile.upgrade_cost(PermanentStat::MoveSpeed), None);
        assert!(!profile.purchase_upgrade(PermanentStat::MoveSpeed));
    }

    #[test]
    fn test_katana_start_and_unknown_fallback() {
        let mut profile = PersistedProfile::default();
        assert!(profile.equip("katana"));
        assert_eq!(profile.starting_weapon(), WeaponKind::Katana);

        profile.equipped.insert(SlotType::Weapon, "laser".to_string());
        assert_eq!(profile.starting_weapon(), WeaponKind::Pistol);
        assert_eq!(profile.equipped_items().len(), 4);
        assert!(!profile.equip("laser"));
    }

    #[test]
    fn test_record_run() {
        let mut profile = PersistedProfile::default();
        assert!(profile.record_run(300, 40));
        assert!(!profile.record_run(200, 10));
        assert_eq!(profile.high_score, 300);
        assert_eq!(profile.gold, 50);
    }
}
