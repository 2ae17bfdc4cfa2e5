//! Weapons: per-archetype stat tables, cooldown timing and fire patterns
//!
//! A `Weapon` never touches world state directly. Everything it needs
//! (targets, spawning, striking) goes through the `GameContext` capability
//! trait, which the world implements and tests can fake.

use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::projectile::{Behavior, ExpireEffect, ProjectileSpec};
use super::stats::Multipliers;
use crate::angle_to_dir;
use crate::consts::MAX_WEAPON_LEVEL;

/// Stun applied by every lightning link
pub const LIGHTNING_STUN: f32 = 0.5;
/// Damage kept per chain link
pub const CHAIN_DECAY: f32 = 0.8;
/// Height the first bolt drops from
const SKY_BOLT_HEIGHT: f32 = 400.0;
const PISTOL_SPREAD: f32 = 0.15;
const BOOMERANG_SPREAD: f32 = 0.3;
const FIRE_ZONE_INTERVAL: f32 = 0.5;
const FLASK_GRAVITY: f32 = 400.0;
const FLASK_LIFETIME: f32 = 0.8;
const BRICK_GRAVITY: f32 = 1500.0;
const BRICK_LIFT: f32 = -600.0;
const BRICK_HAND_OFFSET: f32 = -40.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    Pistol,
    Lightning,
    Boomerang,
    Molotov,
    Guardian,
    Brick,
    Soccer,
    Rocket,
    Katana,
    Inferno,
    Destroyer,
}

/// Weapons that can be rolled at level-up
pub const LEVEL_UP_POOL: [WeaponKind; 8] = [
    WeaponKind::Pistol,
    WeaponKind::Lightning,
    WeaponKind::Boomerang,
    WeaponKind::Molotov,
    WeaponKind::Guardian,
    WeaponKind::Brick,
    WeaponKind::Soccer,
    WeaponKind::Rocket,
];

/// Stat block for one weapon level.
///
/// `area` is archetype specific: a size multiplier for thrown objects, a
/// radius in pixels for zones/orbits/blasts, the chain reach for lightning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponStats {
    pub damage: f32,
    pub area: f32,
    pub speed: f32,
    /// Projectile or zone lifetime in seconds
    pub duration: f32,
    /// Seconds between volleys
    pub cooldown: f32,
    pub amount: u32,
}

const fn ws(
    damage: f32,
    area: f32,
    speed: f32,
    duration: f32,
    cooldown: f32,
    amount: u32,
) -> WeaponStats {
    WeaponStats {
        damage,
        area,
        speed,
        duration,
        cooldown,
        amount,
    }
}

const INF: f32 = f32::INFINITY;

const PISTOL: [WeaponStats; 5] = [
    ws(12.0, 1.0, 300.0, 2.0, 1.2, 1),
    ws(24.0, 1.0, 300.0, 2.0, 1.2, 1),
    ws(48.0, 1.0, 300.0, 2.0, 1.2, 1),
    ws(96.0, 1.0, 300.0, 2.0, 1.2, 1),
    ws(192.0, 1.0, 300.0, 2.0, 1.2, 1),
];
const LIGHTNING: [WeaponStats; 5] = [
    ws(18.0, 150.0, 0.0, 0.2, 2.25, 2),
    ws(22.0, 150.0, 0.0, 0.2, 2.25, 3),
    ws(27.0, 150.0, 0.0, 0.2, 2.25, 4),
    ws(31.0, 150.0, 0.0, 0.2, 2.25, 5),
    ws(36.0, 150.0, 0.0, 0.2, 2.25, 6),
];
const BOOMERANG: [WeaponStats; 5] = [
    ws(24.0, 1.0, 280.0, 2.0, 1.8, 1),
    ws(24.0, 1.0, 280.0, 2.0, 1.8, 2),
    ws(48.0, 1.0, 280.0, 2.0, 1.8, 2),
    ws(48.0, 1.2, 280.0, 2.0, 1.8, 2),
    ws(60.0, 1.5, 280.0, 2.0, 1.8, 2),
];
const MOLOTOV: [WeaponStats; 5] = [
    ws(6.0, 60.0, 210.0, 3.0, 3.75, 2),
    ws(8.0, 60.0, 210.0, 3.0, 3.75, 3),
    ws(9.0, 60.0, 210.0, 3.0, 3.75, 4),
    ws(11.0, 60.0, 210.0, 3.0, 3.75, 5),
    ws(12.0, 60.0, 210.0, 3.0, 3.75, 6),
];
const GUARDIAN: [WeaponStats; 5] = [
    ws(5.0, 80.0, 3.0, 4.0, 3.0, 2),
    ws(6.0, 80.0, 3.5, 4.0, 3.0, 3),
    ws(7.0, 80.0, 4.0, 4.0, 3.0, 4),
    ws(9.0, 80.0, 4.5, 4.0, 3.0, 5),
    // Permanent orbit
    ws(9.0, 80.0, 5.0, INF, 0.0, 6),
];
const BRICK: [WeaponStats; 5] = [
    ws(20.0, 1.0, 0.0, 3.0, 1.5, 1),
    ws(30.0, 1.2, 0.0, 3.0, 1.5, 1),
    ws(40.0, 1.4, 0.0, 3.0, 1.5, 1),
    ws(50.0, 1.6, 0.0, 3.0, 1.5, 1),
    ws(60.0, 1.8, 0.0, 3.0, 1.5, 1),
];
const SOCCER: [WeaponStats; 5] = [
    ws(25.0, 1.0, 350.0, 5.0, 3.0, 1),
    ws(30.0, 1.0, 400.0, 5.0, 3.0, 1),
    ws(35.0, 1.0, 450.0, 5.0, 3.0, 1),
    ws(40.0, 1.0, 500.0, 5.0, 3.0, 1),
    ws(45.0, 1.0, 550.0, 5.0, 3.0, 1),
];
const ROCKET: [WeaponStats; 5] = [
    ws(30.0, 80.0, 420.0, 3.0, 3.75, 1),
    ws(40.0, 100.0, 420.0, 3.0, 3.75, 1),
    ws(50.0, 120.0, 420.0, 3.0, 3.75, 1),
    ws(60.0, 140.0, 420.0, 3.0, 3.75, 1),
    ws(70.0, 160.0, 420.0, 3.0, 3.75, 1),
];
// amount = slash directions
const KATANA: [WeaponStats; 5] = [
    ws(25.0, 1.0, 400.0, 0.8, 1.0, 1),
    ws(25.0, 1.0, 400.0, 0.8, 1.0, 2),
    ws(25.0, 1.0, 400.0, 0.8, 1.0, 3),
    ws(25.0, 1.0, 400.0, 0.8, 1.0, 4),
    ws(50.0, 1.0, 400.0, 0.8, 1.0, 4),
];
const INFERNO: [WeaponStats; 1] = [ws(20.0, 120.0, 400.0, 5.0, 1.5, 2)];
const DESTROYER: [WeaponStats; 1] = [ws(30.0, 150.0, 6.0, INF, 0.0, 4)];

impl WeaponKind {
    /// Stable identifier, matching the serialized form
    pub fn id(self) -> &'static str {
        match self {
            WeaponKind::Pistol => "pistol",
            WeaponKind::Lightning => "lightning",
            WeaponKind::Boomerang => "boomerang",
            WeaponKind::Molotov => "molotov",
            WeaponKind::Guardian => "guardian",
            WeaponKind::Brick => "brick",
            WeaponKind::Soccer => "soccer",
            WeaponKind::Rocket => "rocket",
            WeaponKind::Katana => "katana",
            WeaponKind::Inferno => "inferno",
            WeaponKind::Destroyer => "destroyer",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WeaponKind::Pistol => "Kunai",
            WeaponKind::Lightning => "Lightning Emitter",
            WeaponKind::Boomerang => "Boomerang",
            WeaponKind::Molotov => "Molotov",
            WeaponKind::Guardian => "Guardian",
            WeaponKind::Brick => "Brick",
            WeaponKind::Soccer => "Soccer Ball",
            WeaponKind::Rocket => "Rocket",
            WeaponKind::Katana => "Katana",
            WeaponKind::Inferno => "INFERNO",
            WeaponKind::Destroyer => "DESTROYER",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            WeaponKind::Pistol => "Weak & slow starting weapon. Pierces one enemy.",
            WeaponKind::Lightning => "Strikes random enemies with chain lightning.",
            WeaponKind::Boomerang => "Throws a boomerang that returns.",
            WeaponKind::Molotov => "Throws a fire bomb that burns an area.",
            WeaponKind::Guardian => "Spins around the player.",
            WeaponKind::Brick => "Throws a heavy brick upwards.",
            WeaponKind::Soccer => "Bounces between enemies.",
            WeaponKind::Rocket => "Explodes on impact.",
            WeaponKind::Katana => "Shoots blade waves. Slice through enemies.",
            WeaponKind::Inferno => "Evolved Molotov. Hellfire consumes everything.",
            WeaponKind::Destroyer => "Evolved Guardian. A vortex of destruction.",
        }
    }

    fn table(self) -> &'static [WeaponStats] {
        match self {
            WeaponKind::Pistol => &PISTOL,
            WeaponKind::Lightning => &LIGHTNING,
            WeaponKind::Boomerang => &BOOMERANG,
            WeaponKind::Molotov => &MOLOTOV,
            WeaponKind::Guardian => &GUARDIAN,
            WeaponKind::Brick => &BRICK,
            WeaponKind::Soccer => &SOCCER,
            WeaponKind::Rocket => &ROCKET,
            WeaponKind::Katana => &KATANA,
            WeaponKind::Inferno => &INFERNO,
            WeaponKind::Destroyer => &DESTROYER,
        }
    }

    pub fn max_level(self) -> u32 {
        (self.table().len() as u32).min(MAX_WEAPON_LEVEL)
    }

    pub fn is_evolved(self) -> bool {
        matches!(self, WeaponKind::Inferno | WeaponKind::Destroyer)
    }

    /// Stat block for `level`, clamped into the table
    pub fn stats_at(self, level: u32) -> WeaponStats {
        let table = self.table();
        let idx = (level.max(1) as usize - 1).min(table.len() - 1);
        table[idx]
    }
}

/// Enemy handle valid for the current tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyRef {
    /// Index into the world's enemy list
    pub slot: usize,
    pub id: u32,
    pub pos: Vec2,
}

/// What a weapon may ask of the world
pub trait GameContext {
    fn player_pos(&self) -> Vec2;
    fn multipliers(&self) -> Multipliers;
    /// Spawn a projectile (player multipliers applied by the world), returning its id
    fn spawn_projectile(&mut self, origin: Vec2, dir: Vec2, spec: ProjectileSpec) -> u32;
    fn projectile_alive(&self, id: u32) -> bool;
    /// Position of the enemy closest to the player
    fn nearest_enemy(&self) -> Option<Vec2>;
    /// Boss if near, else nearest in the movement cone, else nearest
    fn best_target(&self, origin: Vec2) -> Option<Vec2>;
    fn random_visible_enemy(&mut self) -> Option<EnemyRef>;
    /// Closest active enemy within `radius` of `from` that is not in `visited`
    fn nearest_unvisited(&self, from: Vec2, radius: f32, visited: &[u32]) -> Option<EnemyRef>;
    /// Direct hit (damage + stun) outside the projectile path
    fn strike(&mut self, target: EnemyRef, damage: f32, stun: f32);
    fn lightning_arc(&mut self, from: Vec2, to: Vec2);
    /// Uniform in [0, 1)
    fn random(&mut self) -> f32;
}

/// An equipped weapon
#[derive(Debug, Clone)]
pub struct Weapon {
    pub kind: WeaponKind,
    pub level: u32,
    pub stats: WeaponStats,
    /// Seconds until the next volley
    pub cooldown_timer: f32,
    /// Live orbiting projectile ids (guardian family)
    orbiters: Vec<u32>,
}

impl Weapon {
    pub fn new(kind: WeaponKind) -> Self {
        Self {
            kind,
            level: 1,
            stats: kind.stats_at(1),
            cooldown_timer: 0.0,
            orbiters: Vec::new(),
        }
    }

    pub fn is_max_level(&self) -> bool {
        self.level >= self.kind.max_level()
    }

    /// Step to the next table row. Returns false at max level.
    pub fn upgrade(&mut self) -> bool {
        if self.is_max_level() {
            return false;
        }
        self.level += 1;
        self.stats = self.kind.stats_at(self.level);
        log::debug!("{} upgraded to level {}", self.kind.name(), self.level);
        true
    }

    pub fn orbiter_count(&self) -> usize {
        self.orbiters.len()
    }

    /// Orbiters never expire and respawn without waiting
    fn is_permanent(&self) -> bool {
        self.stats.duration.is_infinite()
    }

    pub fn update(&mut self, dt: f32, ctx: &mut impl GameContext) {
        if matches!(self.kind, WeaponKind::Guardian | WeaponKind::Destroyer) {
            self.update_orbiters(dt, ctx);
            return;
        }

        self.cooldown_timer -= dt;
        if self.cooldown_timer <= 0.0 {
            self.fire(ctx);
            self.cooldown_timer = self.stats.cooldown * ctx.multipliers().cooldown;
        }
    }

    fn fire(&mut self, ctx: &mut impl GameContext) {
        match self.kind {
            WeaponKind::Pistol => self.fire_pistol(ctx),
            WeaponKind::Lightning => self.fire_lightning(ctx),
            WeaponKind::Boomerang => self.fire_boomerang(ctx),
            WeaponKind::Molotov => self.fire_flasks(ctx, 10.0, -200.0),
            WeaponKind::Inferno => self.fire_flasks(ctx, 15.0, -300.0),
            WeaponKind::Brick => self.fire_brick(ctx),
            WeaponKind::Soccer => self.fire_soccer(ctx),
            WeaponKind::Rocket => self.fire_rocket(ctx),
            WeaponKind::Katana => self.fire_katana(ctx),
            WeaponKind::Guardian | WeaponKind::Destroyer => self.spawn_orbiters(ctx),
        }
    }

    fn fire_pistol(&self, ctx: &mut impl GameContext) {
        let origin = ctx.player_pos();
        let Some(target) = ctx.nearest_enemy() else {
            return;
        };
        let base = crate::dir_to_angle(target - origin);
        let s = self.stats;
        let center = (s.amount as f32 - 1.0) / 2.0;
        for i in 0..s.amount {
            let angle = base + (i as f32 - center) * PISTOL_SPREAD;
            let spec =
                ProjectileSpec::new(self.kind, s.damage, s.speed, 10.0, s.duration).pierce(1);
            ctx.spawn_projectile(origin, angle_to_dir(angle), spec);
        }
    }

    fn fire_lightning(&self, ctx: &mut impl GameContext) {
        let Some(first) = ctx.random_visible_enemy() else {
            return;
        };
        ctx.lightning_arc(first.pos - Vec2::new(0.0, SKY_BOLT_HEIGHT), first.pos);

        let mut damage = (self.stats.damage * ctx.multipliers().damage).floor().max(1.0);
        ctx.strike(first, damage, LIGHTNING_STUN);

        let mut visited = vec![first.id];
        let mut current = first;
        let mut links_left = self.stats.amount.saturating_sub(1);
        damage = (damage * CHAIN_DECAY).floor();

        while links_left > 0 && damage >= 1.0 {
            let Some(next) = ctx.nearest_unvisited(current.pos, self.stats.area, &visited) else {
                break;
            };
            ctx.lightning_arc(current.pos, next.pos);
            ctx.strike(next, damage, LIGHTNING_STUN);
            visited.push(next.id);
            damage = (damage * CHAIN_DECAY).floor();
            current = next;
            links_left -= 1;
        }
    }

    fn fire_boomerang(&self, ctx: &mut impl GameContext) {
        let origin = ctx.player_pos();
        let dir = match ctx.best_target(origin) {
            Some(target) => (target - origin).normalize_or(Vec2::X),
            None => angle_to_dir(ctx.random() * TAU),
        };
        let s = self.stats;
        let start = -BOOMERANG_SPREAD * (s.amount as f32 - 1.0) / 2.0;
        for i in 0..s.amount {
            let offset = start + i as f32 * BOOMERANG_SPREAD;
            let spec = ProjectileSpec::new(self.kind, s.damage, s.speed, 16.0 * s.area, s.duration)
                .behavior(Behavior::Boomerang { returning: false });
            ctx.spawn_projectile(origin, Vec2::from_angle(offset).rotate(dir), spec);
        }
    }

    /// Molotov family: arcing flasks that leave a fire zone where they land
    fn fire_flasks(&self, ctx: &mut impl GameContext, size: f32, lift: f32) {
        let origin = ctx.player_pos();
        let s = self.stats;
        for _ in 0..s.amount {
            let dir = angle_to_dir(ctx.random() * TAU);
            let zone = ExpireEffect::Zone {
                damage: s.damage,
                size: s.area,
                duration: s.duration,
                interval: FIRE_ZONE_INTERVAL,
            };
            // The flask itself is harmless
            let spec = ProjectileSpec::new(self.kind, 0.0, s.speed, size, FLASK_LIFETIME)
                .behavior(Behavior::Gravity { gravity: FLASK_GRAVITY })
                .lift(lift)
                .on_expire(zone);
            ctx.spawn_projectile(origin, dir, spec);
        }
    }

    fn fire_brick(&self, ctx: &mut impl GameContext) {
        let origin = ctx.player_pos() + Vec2::new(0.0, BRICK_HAND_OFFSET);
        let s = self.stats;
        let spec = ProjectileSpec::new(self.kind, s.damage, 0.0, 16.0 * s.area, s.duration)
            .behavior(Behavior::Gravity { gravity: BRICK_GRAVITY })
            .lift(BRICK_LIFT);
        ctx.spawn_projectile(origin, Vec2::ZERO, spec);
    }

    fn fire_soccer(&self, ctx: &mut impl GameContext) {
        let origin = ctx.player_pos();
        let dir = match ctx.best_target(origin) {
            Some(target) => (target - origin).normalize_or(Vec2::X),
            None => {
                let raw = Vec2::new(ctx.random() - 0.5, ctx.random() - 0.5);
                raw.normalize_or(Vec2::X)
            }
        };
        let s = self.stats;
        let spec = ProjectileSpec::new(self.kind, s.damage, s.speed, 14.0, s.duration)
            .bounces(3 + self.level);
        ctx.spawn_projectile(origin, dir, spec);
    }

    fn fire_rocket(&self, ctx: &mut impl GameContext) {
        let origin = ctx.player_pos();
        let Some(target) = ctx.best_target(origin) else {
            return;
        };
        let s = self.stats;
        let blast = ExpireEffect::Explosion {
            damage: s.damage,
            size: s.area,
        };
        let spec = ProjectileSpec::new(self.kind, s.damage, s.speed, 24.0, s.duration)
            .pierce(1)
            .on_expire(blast);
        ctx.spawn_projectile(origin, (target - origin).normalize_or(Vec2::X), spec);
    }

    fn fire_katana(&self, ctx: &mut impl GameContext) {
        let origin = ctx.player_pos();
        let front = ctx
            .nearest_enemy()
            .map(|t| (t - origin).normalize_or(Vec2::X))
            .unwrap_or(Vec2::X);
        let directions = [
            front,
            -front,
            Vec2::new(front.y, -front.x),
            Vec2::new(-front.y, front.x),
        ];
        let s = self.stats;
        for dir in directions.iter().take(s.amount as usize) {
            let spec = ProjectileSpec::new(self.kind, s.damage, s.speed, 24.0 * s.area, s.duration);
            ctx.spawn_projectile(origin, *dir, spec);
        }
    }

    /// Guardian family: keep `amount` orbiters alive
    fn update_orbiters(&mut self, dt: f32, ctx: &mut impl GameContext) {
        self.orbiters.retain(|id| ctx.projectile_alive(*id));

        let permanent = self.is_permanent();
        let missing = self.orbiters.len() < self.stats.amount as usize;
        if missing && (permanent || self.cooldown_timer <= 0.0) {
            if permanent {
                self.spawn_orbiters(ctx);
            } else if self.orbiters.is_empty() {
                // Timed cycle: wait for the whole set to expire, then respawn all
                self.spawn_orbiters(ctx);
                self.cooldown_timer = self.stats.cooldown * ctx.multipliers().cooldown;
            }
        } else if !permanent {
            self.cooldown_timer -= dt;
        }
    }

    fn spawn_orbiters(&mut self, ctx: &mut impl GameContext) {
        let s = self.stats;
        let have = self.orbiters.len();
        let wanted = s.amount as usize;
        if have >= wanted {
            return;
        }
        let size = if self.kind == WeaponKind::Destroyer { 20.0 } else { 12.0 };
        let spacing = TAU / s.amount as f32;
        let origin = ctx.player_pos();
        for idx in have..wanted {
            let orbit = Behavior::Orbit {
                angle: idx as f32 * spacing,
                radius: s.area,
                angular_speed: s.speed,
            };
            let spec =
                ProjectileSpec::new(self.kind, s.damage, 0.0, size, s.duration).behavior(orbit);
            let id = ctx.spawn_projectile(origin, Vec2::ZERO, spec);
            self.orbiters.push(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::projectile::Depletion;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    /// Minimal world: a list of enemies and a record of everything spawned
    struct FakeContext {
        player: Vec2,
        mults: Multipliers,
        enemies: Vec<(u32, Vec2, f32)>,
        spawned: Vec<(Vec2, Vec2, ProjectileSpec)>,
        alive: Vec<u32>,
        strikes: Vec<(u32, f32)>,
        arcs: usize,
        next_id: u32,
        rng: Pcg32,
    }

    impl FakeContext {
        fn new() -> Self {
            Self {
                player: Vec2::ZERO,
                mults: Multipliers::default(),
                enemies: Vec::new(),
                spawned: Vec::new(),
                alive: Vec::new(),
                strikes: Vec::new(),
                arcs: 0,
                next_id: 1,
                rng: Pcg32::seed_from_u64(7),
            }
        }

        fn enemy_ref(&self, slot: usize) -> EnemyRef {
            let (id, pos, _) = self.enemies[slot];
            EnemyRef { slot, id, pos }
        }
    }

    impl GameContext for FakeContext {
        fn player_pos(&self) -> Vec2 {
            self.player
        }

        fn multipliers(&self) -> Multipliers {
            self.mults
        }

        fn spawn_projectile(&mut self, origin: Vec2, dir: Vec2, spec: ProjectileSpec) -> u32 {
            let id = self.next_id;
            self.next_id += 1;
            self.spawned.push((origin, dir, spec));
            self.alive.push(id);
            id
        }

        fn projectile_alive(&self, id: u32) -> bool {
            self.alive.contains(&id)
        }

        fn nearest_enemy(&self) -> Option<Vec2> {
            self.enemies
                .iter()
                .map(|(_, p, _)| *p)
                .min_by(|a, b| {
                    a.distance_squared(self.player)
                        .total_cmp(&b.distance_squared(self.player))
                })
        }

        fn best_target(&self, _origin: Vec2) -> Option<Vec2> {
            self.nearest_enemy()
        }

        fn random_visible_enemy(&mut self) -> Option<EnemyRef> {
            if self.enemies.is_empty() {
                return None;
            }
            let slot = self.rng.random_range(0..self.enemies.len());
            Some(self.enemy_ref(slot))
        }

        fn nearest_unvisited(&self, from: Vec2, radius: f32, visited: &[u32]) -> Option<EnemyRef> {
            self.enemies
                .iter()
                .enumerate()
                .filter(|(_, (id, pos, _))| {
                    !visited.contains(id) && pos.distance_squared(from) < radius * radius
                })
                .min_by(|a, b| {
                    a.1.1
                        .distance_squared(from)
                        .total_cmp(&b.1.1.distance_squared(from))
                })
                .map(|(slot, _)| self.enemy_ref(slot))
        }

        fn strike(&mut self, target: EnemyRef, damage: f32, _stun: f32) {
            self.enemies[target.slot].2 -= damage;
            self.strikes.push((target.id, damage));
        }

        fn lightning_arc(&mut self, _from: Vec2, _to: Vec2) {
            self.arcs += 1;
        }

        fn random(&mut self) -> f32 {
            self.rng.random()
        }
    }

    #[test]
    fn test_stats_follow_table() {
        let mut w = Weapon::new(WeaponKind::Pistol);
        assert_eq!(w.stats.damage, 12.0);
        for expected in [24.0, 48.0, 96.0, 192.0] {
            assert!(w.upgrade());
            assert_eq!(w.stats.damage, expected);
        }
        assert!(w.is_max_level());
        assert!(!w.upgrade());
        assert_eq!(w.level, 5);
    }

    #[test]
    fn test_evolved_weapons_start_maxed() {
        let w = Weapon::new(WeaponKind::Inferno);
        assert!(w.is_max_level());
        assert!(WeaponKind::Destroyer.is_evolved());
        assert!(!WeaponKind::Guardian.is_evolved());
    }

    #[test]
    fn test_cooldown_uses_elapsed_time_and_multiplier() {
        let mut ctx = FakeContext::new();
        ctx.mults.cooldown = 0.5;
        ctx.enemies.push((1, Vec2::new(100.0, 0.0), 100.0));
        let mut w = Weapon::new(WeaponKind::Pistol);

        // Ready immediately, then every 1.2 * 0.5 seconds
        w.update(0.1, &mut ctx);
        assert_eq!(ctx.spawned.len(), 1);
        assert!((w.cooldown_timer - 0.6).abs() < 0.0001);

        w.update(0.5, &mut ctx);
        assert_eq!(ctx.spawned.len(), 1);
        w.update(0.15, &mut ctx);
        assert_eq!(ctx.spawned.len(), 2);

        let (origin, dir, spec) = &ctx.spawned[0];
        assert_eq!(*origin, Vec2::ZERO);
        assert!((dir.x - 1.0).abs() < 0.0001);
        assert_eq!(spec.depletion, Depletion::Pierce(1));
    }

    #[test]
    fn test_pistol_and_rocket_need_a_target() {
        let mut ctx = FakeContext::new();
        let mut pistol = Weapon::new(WeaponKind::Pistol);
        let mut rocket = Weapon::new(WeaponKind::Rocket);
        pistol.update(0.1, &mut ctx);
        rocket.update(0.1, &mut ctx);
        assert!(ctx.spawned.is_empty());

        // Boomerang throws blind
        let mut boomerang = Weapon::new(WeaponKind::Boomerang);
        boomerang.update(0.1, &mut ctx);
        assert_eq!(ctx.spawned.len(), 1);
    }

    #[test]
    fn test_rocket_carries_explosion() {
        let mut ctx = FakeContext::new();
        ctx.enemies.push((1, Vec2::new(0.0, 200.0), 100.0));
        let mut rocket = Weapon::new(WeaponKind::Rocket);
        rocket.update(0.1, &mut ctx);
        let spec = &ctx.spawned[0].2;
        assert_eq!(spec.on_expire, Some(ExpireEffect::Explosion { damage: 30.0, size: 80.0 }));
    }

    #[test]
    fn test_molotov_flasks_leave_zones() {
        let mut ctx = FakeContext::new();
        let mut w = Weapon::new(WeaponKind::Molotov);
        w.upgrade();
        w.update(0.1, &mut ctx);
        assert_eq!(ctx.spawned.len(), 3);
        for (_, _, spec) in &ctx.spawned {
            assert_eq!(spec.damage, 0.0);
            assert_eq!(spec.lift, Some(-200.0));
            assert!(matches!(spec.behavior, Behavior::Gravity { .. }));
            assert!(matches!(spec.on_expire, Some(ExpireEffect::Zone { damage, .. }) if damage == 8.0));
        }
    }

    #[test]
    fn test_katana_directions_grow_with_level() {
        let mut ctx = FakeContext::new();
        ctx.enemies.push((1, Vec2::new(50.0, 0.0), 100.0));
        let mut w = Weapon::new(WeaponKind::Katana);
        w.update(0.1, &mut ctx);
        assert_eq!(ctx.spawned.len(), 1);

        ctx.spawned.clear();
        for _ in 0..3 {
            w.upgrade();
        }
        w.cooldown_timer = 0.0;
        w.update(0.1, &mut ctx);
        let dirs: Vec<Vec2> = ctx.spawned.iter().map(|(_, d, _)| *d).collect();
        assert_eq!(dirs.len(), 4);
        assert!((dirs[1] + Vec2::X).length() < 0.0001);
    }

    #[test]
    fn test_guardian_cycle() {
        let mut ctx = FakeContext::new();
        let mut w = Weapon::new(WeaponKind::Guardian);
        w.update(0.1, &mut ctx);
        assert_eq!(w.orbiter_count(), 2);
        assert_eq!(ctx.spawned.len(), 2);

        // One expires: nothing respawns while the other is still up
        ctx.alive.remove(0);
        w.update(0.1, &mut ctx);
        assert_eq!(w.orbiter_count(), 1);
        assert_eq!(ctx.spawned.len(), 2);

        // All gone but cooldown still running
        ctx.alive.clear();
        w.update(0.1, &mut ctx);
        assert_eq!(ctx.spawned.len(), 2);

        // Run out the cooldown
        for _ in 0..40 {
            w.update(0.1, &mut ctx);
        }
        assert_eq!(ctx.spawned.len(), 4);
        assert_eq!(w.orbiter_count(), 2);
    }

    #[test]
    fn test_guardian_max_level_is_permanent_and_self_heals() {
        let mut ctx = FakeContext::new();
        let mut w = Weapon::new(WeaponKind::Guardian);
        while w.upgrade() {}
        w.update(0.016, &mut ctx);
        assert_eq!(w.orbiter_count(), 6);
        assert!(ctx.spawned.iter().all(|(_, _, s)| s.lifetime.is_infinite()));

        let lost = ctx.alive.remove(2);
        assert!(!ctx.projectile_alive(lost));
        w.update(0.016, &mut ctx);
        assert_eq!(w.orbiter_count(), 6);
        assert_eq!(ctx.spawned.len(), 7);
    }

    #[test]
    fn test_lightning_chain_decays_damage() {
        let mut ctx = FakeContext::new();
        // Line of enemies 100px apart, all within chain reach of a neighbour
        for i in 0..8 {
            ctx.enemies.push((i + 1, Vec2::new(i as f32 * 100.0, 0.0), 1000.0));
        }
        let mut w = Weapon::new(WeaponKind::Lightning);
        while w.upgrade() {}
        w.update(0.1, &mut ctx);

        let damages: Vec<f32> = ctx.strikes.iter().map(|(_, d)| *d).collect();
        assert!(damages.len() <= 6);
        assert!(damages.len() >= 4);
        assert_eq!(damages[0], 36.0);
        for pair in damages.windows(2) {
            assert_eq!(pair[1], (pair[0] * 0.8).floor());
        }
        let mut ids: Vec<u32> = ctx.strikes.iter().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), damages.len());
    }

    #[test]
    fn test_lightning_chain_stops_without_neighbours() {
        let mut ctx = FakeContext::new();
        ctx.enemies.push((1, Vec2::new(50.0, 0.0), 100.0));
        ctx.enemies.push((2, Vec2::new(900.0, 0.0), 100.0));
        let mut w = Weapon::new(WeaponKind::Lightning);
        w.update(0.1, &mut ctx);
        assert_eq!(ctx.strikes.len(), 1);
        assert_eq!(ctx.strikes[0].1, 18.0);
    }
}
