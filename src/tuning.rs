//! Data-driven game balance
//!
//! Static tables the simulation reads but never mutates: enemy archetypes,
//! equipment, passives, permanent upgrades, evolution recipes and the wave
//! schedule. Lookups by string id return `Option` so a bad id in a save file
//! degrades to a skipped effect instead of a crash.

use serde::{Deserialize, Serialize};

use crate::sim::weapon::WeaponKind;

// === Enemies ===

/// Enemy archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    Basic,
    Tank,
    Speedy,
    EliteShooter,
    Poisoner,
    Boss,
}

/// Per-archetype multipliers over the base enemy stats
#[derive(Debug, Clone, Copy)]
pub struct EnemyArchetype {
    pub kind: EnemyKind,
    pub hp_mult: f32,
    pub speed_mult: f32,
    pub size_mult: f32,
    pub mass: f32,
    /// Score awarded on kill
    pub score: u64,
    /// Tint for renderers (0xRRGGBB)
    pub color: u32,
}

#[rustfmt::skip]
pub const ENEMY_ARCHETYPES: [EnemyArchetype; 6] = [
    EnemyArchetype { kind: EnemyKind::Basic, hp_mult: 1.0, speed_mult: 1.0, size_mult: 1.0, mass: 1.0, score: 10, color: 0xe74c3c },
    EnemyArchetype { kind: EnemyKind::Tank, hp_mult: 3.0, speed_mult: 0.6, size_mult: 1.5, mass: 10.0, score: 30, color: 0x8e44ad },
    EnemyArchetype { kind: EnemyKind::Speedy, hp_mult: 0.5, speed_mult: 1.6, size_mult: 0.8, mass: 0.8, score: 5, color: 0xf1c40f },
    EnemyArchetype { kind: EnemyKind::EliteShooter, hp_mult: 1.5, speed_mult: 0.8, size_mult: 1.2, mass: 2.0, score: 25, color: 0x3498db },
    EnemyArchetype { kind: EnemyKind::Poisoner, hp_mult: 1.0, speed_mult: 1.3, size_mult: 1.0, mass: 1.0, score: 15, color: 0x2ecc71 },
    EnemyArchetype { kind: EnemyKind::Boss, hp_mult: 50.0, speed_mult: 0.4, size_mult: 5.0, mass: 100.0, score: 5000, color: 0xc0392b },
];

impl EnemyKind {
    pub fn archetype(self) -> &'static EnemyArchetype {
        match self {
            EnemyKind::Basic => &ENEMY_ARCHETYPES[0],
            EnemyKind::Tank => &ENEMY_ARCHETYPES[1],
            EnemyKind::Speedy => &ENEMY_ARCHETYPES[2],
            EnemyKind::EliteShooter => &ENEMY_ARCHETYPES[3],
            EnemyKind::Poisoner => &ENEMY_ARCHETYPES[4],
            EnemyKind::Boss => &ENEMY_ARCHETYPES[5],
        }
    }

    pub fn is_boss(self) -> bool {
        self == EnemyKind::Boss
    }
}

// === Equipment ===

/// Equipment slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotType {
    Weapon,
    Necklace,
    Glove,
    Belt,
    Boots,
}

impl SlotType {
    pub const ALL: [SlotType; 5] = [
        SlotType::Weapon,
        SlotType::Necklace,
        SlotType::Glove,
        SlotType::Belt,
        SlotType::Boots,
    ];

    /// Storage key, as written by serde
    pub fn key(self) -> &'static str {
        match self {
            SlotType::Weapon => "weapon",
            SlotType::Necklace => "necklace",
            SlotType::Glove => "glove",
            SlotType::Belt => "belt",
            SlotType::Boots => "boots",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
    Unique,
}

/// Stat deltas granted by an equipped item
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ItemStats {
    /// Flat max HP
    pub hp: f32,
    /// Additive damage fraction
    pub damage: f32,
    /// Additive move speed fraction
    pub speed: f32,
    /// Cooldown reduction fraction
    pub cooldown: f32,
    /// Flat crit chance
    pub crit: f32,
    /// Added crit multiplier
    pub crit_damage: f32,
}

impl ItemStats {
    pub const NONE: ItemStats = ItemStats {
        hp: 0.0,
        damage: 0.0,
        speed: 0.0,
        cooldown: 0.0,
        crit: 0.0,
        crit_damage: 0.0,
    };
}

#[derive(Debug, Clone, Copy)]
pub struct ItemDef {
    pub id: &'static str,
    pub slot: SlotType,
    pub name: &'static str,
    pub rarity: Rarity,
    pub stats: ItemStats,
    pub description: &'static str,
}

#[rustfmt::skip]
pub static ITEMS: &[ItemDef] = &[
    ItemDef { id: "neck_metal", slot: SlotType::Necklace, name: "Metal Neckguard", rarity: Rarity::Legendary, stats: ItemStats { hp: 50.0, damage: 0.1, ..ItemStats::NONE }, description: "+10% Damage. +50 HP." },
    ItemDef { id: "neck_bone", slot: SlotType::Necklace, name: "Bone Pendant", rarity: Rarity::Epic, stats: ItemStats { cooldown: 0.1, speed: 0.1, ..ItemStats::NONE }, description: "Cooldown -10%, Speed +10%." },
    ItemDef { id: "neck_emerald", slot: SlotType::Necklace, name: "Emerald Necklace", rarity: Rarity::Rare, stats: ItemStats { hp: 100.0, ..ItemStats::NONE }, description: "+100 HP." },
    ItemDef { id: "neck_trendy", slot: SlotType::Necklace, name: "Trendy Charm", rarity: Rarity::Legendary, stats: ItemStats { cooldown: 0.3, damage: 0.15, ..ItemStats::NONE }, description: "Cooldown -30%. ATK +15%." },
    ItemDef { id: "glove_army", slot: SlotType::Glove, name: "Army Gloves", rarity: Rarity::Epic, stats: ItemStats { damage: 0.2, ..ItemStats::NONE }, description: "+20% Damage." },
    ItemDef { id: "glove_shiny", slot: SlotType::Glove, name: "Shiny Wristguard", rarity: Rarity::Rare, stats: ItemStats { damage: 0.1, crit: 0.05, ..ItemStats::NONE }, description: "+10% Damage, Crit Rate +5%." },
    ItemDef { id: "glove_leather", slot: SlotType::Glove, name: "Fingerless Gloves", rarity: Rarity::Legendary, stats: ItemStats { damage: 0.15, crit: 0.2, crit_damage: 1.0, ..ItemStats::NONE }, description: "Crit Rate +20%, Crit Dmg +100%." },
    ItemDef { id: "glove_protective", slot: SlotType::Glove, name: "Protective Gloves", rarity: Rarity::Epic, stats: ItemStats { hp: 50.0, damage: 0.1, ..ItemStats::NONE }, description: "+50 HP, +10% Damage." },
    ItemDef { id: "belt_army", slot: SlotType::Belt, name: "Army Belt", rarity: Rarity::Legendary, stats: ItemStats { hp: 100.0, damage: 0.1, ..ItemStats::NONE }, description: "+100 HP, +10% Damage." },
    ItemDef { id: "belt_energy", slot: SlotType::Belt, name: "Energy Belt", rarity: Rarity::Rare, stats: ItemStats { damage: 0.1, hp: 20.0, ..ItemStats::NONE }, description: "+20 HP, +10% Damage." },
    ItemDef { id: "belt_leather", slot: SlotType::Belt, name: "Broad Waistguard", rarity: Rarity::Epic, stats: ItemStats { hp: 200.0, ..ItemStats::NONE }, description: "+200 HP." },
    ItemDef { id: "belt_sensor", slot: SlotType::Belt, name: "Waist Sensor", rarity: Rarity::Legendary, stats: ItemStats { speed: 0.2, hp: 50.0, ..ItemStats::NONE }, description: "Speed +20%, +50 HP." },
    ItemDef { id: "boot_army", slot: SlotType::Boots, name: "Army Boots", rarity: Rarity::Epic, stats: ItemStats { speed: 0.1, cooldown: 0.05, ..ItemStats::NONE }, description: "Cooldown -5%, Speed +10%." },
    ItemDef { id: "boot_energy", slot: SlotType::Boots, name: "Energy Runners", rarity: Rarity::Rare, stats: ItemStats { damage: 0.1, ..ItemStats::NONE }, description: "+10% Damage." },
    ItemDef { id: "boot_prosthetic", slot: SlotType::Boots, name: "Prosthetic Legs", rarity: Rarity::Legendary, stats: ItemStats { speed: 0.3, hp: 50.0, ..ItemStats::NONE }, description: "Speed +30%, +50 HP." },
    ItemDef { id: "boot_thick", slot: SlotType::Boots, name: "High Boots", rarity: Rarity::Epic, stats: ItemStats { hp: 100.0, speed: 0.1, ..ItemStats::NONE }, description: "+100 HP, Speed +10%." },
    ItemDef { id: "kunai", slot: SlotType::Weapon, name: "Kunai", rarity: Rarity::Common, stats: ItemStats::NONE, description: "Auto-aim." },
    ItemDef { id: "katana", slot: SlotType::Weapon, name: "Katana", rarity: Rarity::Epic, stats: ItemStats { damage: 0.2, ..ItemStats::NONE }, description: "Blade waves." },
];

pub fn find_item(id: &str) -> Option<&'static ItemDef> {
    ITEMS.iter().find(|item| item.id == id)
}

/// Starting weapon granted by an equipped weapon item
pub fn starting_weapon_for(item_id: &str) -> Option<WeaponKind> {
    match item_id {
        "kunai" => Some(WeaponKind::Pistol),
        "katana" => Some(WeaponKind::Katana),
        _ => None,
    }
}

// === Passives ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassiveKind {
    HighPowerFuel,
    Sneakers,
    EnergyDrink,
    FitnessGuide,
    OilBarrel,
    ExoSkeleton,
    SuperMagnet,
    HeFuel,
    AmmoThruster,
    EnergyCube,
}

/// Stat deltas granted per passive level
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PassiveStats {
    pub area: f32,
    pub bullet_speed: f32,
    /// Cooldown reduction fraction
    pub cooldown: f32,
    /// Max HP percentage
    pub max_hp: f32,
    pub magnet: f32,
    pub duration: f32,
    pub move_speed: f32,
    pub gain: f32,
    /// Percent of max HP healed every regen interval
    pub regen: f32,
}

impl PassiveStats {
    pub const NONE: PassiveStats = PassiveStats {
        area: 0.0,
        bullet_speed: 0.0,
        cooldown: 0.0,
        max_hp: 0.0,
        magnet: 0.0,
        duration: 0.0,
        move_speed: 0.0,
        gain: 0.0,
        regen: 0.0,
    };
}

#[derive(Debug, Clone, Copy)]
pub struct PassiveDef {
    pub kind: PassiveKind,
    pub name: &'static str,
    pub description: &'static str,
    pub max_level: u32,
    pub rarity: Rarity,
    pub per_level: PassiveStats,
}

#[rustfmt::skip]
pub static PASSIVES: &[PassiveDef] = &[
    PassiveDef { kind: PassiveKind::HighPowerFuel, name: "High Power Fuel", description: "Increases all weapon range by 10%.", max_level: 5, rarity: Rarity::Common, per_level: PassiveStats { area: 0.10, ..PassiveStats::NONE } },
    PassiveDef { kind: PassiveKind::Sneakers, name: "Sneakers", description: "Increases Movement Speed by 10%.", max_level: 5, rarity: Rarity::Common, per_level: PassiveStats { move_speed: 0.10, ..PassiveStats::NONE } },
    PassiveDef { kind: PassiveKind::EnergyDrink, name: "Energy Drink", description: "Restores 1% HP every 5s & increases Speed by 5%.", max_level: 5, rarity: Rarity::Rare, per_level: PassiveStats { regen: 0.01, move_speed: 0.05, ..PassiveStats::NONE } },
    PassiveDef { kind: PassiveKind::FitnessGuide, name: "Fitness Guide", description: "Increases Max HP by 20%.", max_level: 5, rarity: Rarity::Rare, per_level: PassiveStats { max_hp: 0.20, ..PassiveStats::NONE } },
    PassiveDef { kind: PassiveKind::OilBarrel, name: "Oil Barrel", description: "Increases Gold Gain by 10%.", max_level: 5, rarity: Rarity::Unique, per_level: PassiveStats { gain: 0.10, ..PassiveStats::NONE } },
    PassiveDef { kind: PassiveKind::ExoSkeleton, name: "Exo Skeleton", description: "Increases Weapon Duration by 10%.", max_level: 5, rarity: Rarity::Unique, per_level: PassiveStats { duration: 0.10, ..PassiveStats::NONE } },
    PassiveDef { kind: PassiveKind::SuperMagnet, name: "Super Magnet", description: "Increases item loot range by 50%.", max_level: 5, rarity: Rarity::Unique, per_level: PassiveStats { magnet: 0.5, ..PassiveStats::NONE } },
    PassiveDef { kind: PassiveKind::HeFuel, name: "HE Fuel", description: "Increases all weapon blast radius by 15%.", max_level: 5, rarity: Rarity::Unique, per_level: PassiveStats { area: 0.15, ..PassiveStats::NONE } },
    PassiveDef { kind: PassiveKind::AmmoThruster, name: "Ammo Thruster", description: "Increases bullet speed by 10%.", max_level: 5, rarity: Rarity::Unique, per_level: PassiveStats { bullet_speed: 0.10, ..PassiveStats::NONE } },
    PassiveDef { kind: PassiveKind::EnergyCube, name: "Energy Cube", description: "Reduces cooldown by 8%.", max_level: 5, rarity: Rarity::Unique, per_level: PassiveStats { cooldown: 0.08, ..PassiveStats::NONE } },
];

impl PassiveKind {
    pub fn def(self) -> &'static PassiveDef {
        // PASSIVES is declared in enum order
        &PASSIVES[self as usize]
    }

    pub fn all() -> impl Iterator<Item = PassiveKind> {
        PASSIVES.iter().map(|p| p.kind)
    }

    /// Stable identifier, matching the serialized form
    pub fn id(self) -> &'static str {
        match self {
            PassiveKind::HighPowerFuel => "high_power_fuel",
            PassiveKind::Sneakers => "sneakers",
            PassiveKind::EnergyDrink => "energy_drink",
            PassiveKind::FitnessGuide => "fitness_guide",
            PassiveKind::OilBarrel => "oil_barrel",
            PassiveKind::ExoSkeleton => "exo_skeleton",
            PassiveKind::SuperMagnet => "super_magnet",
            PassiveKind::HeFuel => "he_fuel",
            PassiveKind::AmmoThruster => "ammo_thruster",
            PassiveKind::EnergyCube => "energy_cube",
        }
    }
}

// === Permanent upgrades ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermanentStat {
    BaseDamage,
    BaseHp,
    GoldGain,
    MoveSpeed,
    MagnetRange,
}

#[derive(Debug, Clone, Copy)]
pub struct UpgradeConfig {
    pub stat: PermanentStat,
    pub base_cost: u64,
    pub growth_rate: f64,
    pub max_level: u32,
}

#[rustfmt::skip]
pub const PERMANENT_UPGRADES: [UpgradeConfig; 5] = [
    UpgradeConfig { stat: PermanentStat::BaseDamage, base_cost: 500, growth_rate: 1.5, max_level: 50 },
    UpgradeConfig { stat: PermanentStat::BaseHp, base_cost: 500, growth_rate: 1.5, max_level: 50 },
    UpgradeConfig { stat: PermanentStat::GoldGain, base_cost: 1000, growth_rate: 1.3, max_level: 20 },
    UpgradeConfig { stat: PermanentStat::MoveSpeed, base_cost: 300, growth_rate: 1.2, max_level: 20 },
    UpgradeConfig { stat: PermanentStat::MagnetRange, base_cost: 300, growth_rate: 1.2, max_level: 20 },
];

impl PermanentStat {
    pub fn config(self) -> &'static UpgradeConfig {
        &PERMANENT_UPGRADES[self as usize]
    }

    /// Currency needed to go from `level` to `level + 1`
    pub fn cost_at(self, level: u32) -> u64 {
        let cfg = self.config();
        (cfg.base_cost as f64 * cfg.growth_rate.powi(level as i32)).floor() as u64
    }
}

// === Evolutions ===

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvolutionRecipe {
    pub base: WeaponKind,
    pub passive: PassiveKind,
    pub result: WeaponKind,
}

#[rustfmt::skip]
pub const EVOLUTIONS: [EvolutionRecipe; 2] = [
    EvolutionRecipe { base: WeaponKind::Molotov, passive: PassiveKind::HeFuel, result: WeaponKind::Inferno },
    EvolutionRecipe { base: WeaponKind::Guardian, passive: PassiveKind::EnergyCube, result: WeaponKind::Destroyer },
];

pub fn evolution_for(base: WeaponKind) -> Option<&'static EvolutionRecipe> {
    EVOLUTIONS.iter().find(|r| r.base == base)
}

// === Waves ===

/// One segment of the spawn schedule
#[derive(Debug, Clone, Copy)]
pub struct WaveSegment {
    /// Segment applies while elapsed minutes < this bound
    pub until_minute: f32,
    pub spawn_interval: f32,
    /// Archetype weights, summing to 1.0
    pub composition: &'static [(EnemyKind, f32)],
    pub title: &'static str,
}

#[rustfmt::skip]
pub static WAVE_SCHEDULE: &[WaveSegment] = &[
    WaveSegment { until_minute: 1.0, spawn_interval: 1.5, composition: &[(EnemyKind::Basic, 1.0)], title: "Wave 1: Survive!" },
    WaveSegment { until_minute: 3.0, spawn_interval: 0.8, composition: &[(EnemyKind::Speedy, 0.3), (EnemyKind::Basic, 0.7)], title: "Wave 2: Speed Demons" },
    WaveSegment { until_minute: 5.0, spawn_interval: 0.4, composition: &[(EnemyKind::Tank, 0.4), (EnemyKind::Speedy, 0.3), (EnemyKind::Basic, 0.3)], title: "Wave 3: Heavy Armor" },
    WaveSegment {
        until_minute: 8.0,
        spawn_interval: 0.2,
        composition: &[(EnemyKind::EliteShooter, 0.3), (EnemyKind::Poisoner, 0.2), (EnemyKind::Tank, 0.2), (EnemyKind::Speedy, 0.3)],
        title: "Wave 4: Chaos",
    },
];

/// Elapsed minutes at which the boss phase begins
pub const BOSS_MINUTE: f32 = 8.0;
pub const BOSS_WARNING_SECS: f32 = 3.0;
