//! Run state and core simulation types
//!
//! `World` owns every entity collection of a run, the pools they are
//! recycled through and the per-frame spatial index. Entities are marked
//! inactive during a frame and compacted back into their pools at the end
//! of it, so indices stay stable while systems iterate.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::effects::{
    DamageLabel, LabelStyle, LightningArc, ParticleField, POISON_DAMAGE, PoisonZone,
};
use super::enemy::{Enemy, EnemyKind, EnemyShot, separation_offset};
use super::pickup::{Pickup, PickupKind};
use super::pool::{ObjectPool, recycle_inactive, release_all};
use super::projectile::{Behavior, EnemyProjectile, ExpireEffect, Projectile, ProjectileSpec};
use super::spatial::{Rect, SpatialIndex};
use super::stats::{DerivedStats, Multipliers};
use super::weapon::{EnemyRef, GameContext, WeaponKind};
use crate::circles_overlap;
use crate::consts::*;
use crate::settings::Settings;

/// Bosses inside this range always win targeting
pub const BOSS_TARGET_RANGE: f32 = 2000.0;
/// cos(45°): enemies inside this cone around the movement direction are preferred
pub const TARGET_CONE_COS: f32 = 0.707;
/// Seconds between regeneration pulses
pub const REGEN_INTERVAL: f32 = 5.0;
/// Rocket blasts linger for a single hit window
pub const EXPLOSION_LIFETIME: f32 = 0.1;
const NUKE_DAMAGE: f32 = 99_999.0;

const ENEMY_POOL_PREWARM: usize = 128;
const PROJECTILE_POOL_PREWARM: usize = 128;
const PICKUP_POOL_PREWARM: usize = 64;
const LABEL_POOL_PREWARM: usize = 32;

const BLAST_COLOR: u32 = 0xf97316;
const CRATE_COLOR: u32 = 0xfbbf24;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, no run yet
    Start,
    Playing,
    /// Manual pause or pending level-up choice
    Paused,
    GameOver,
}

/// The player character
#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub hp: f32,
    /// Fractional because pickups are scaled by the gain multiplier
    pub xp: f32,
    pub max_xp: u32,
    pub level: u32,
    pub score: u64,
    pub stats: DerivedStats,
    /// Invulnerability left after a hit
    pub hit_flash: f32,
    regen_timer: f32,
}

impl Player {
    pub fn new(stats: DerivedStats) -> Self {
        Self {
            pos: Vec2::ZERO,
            hp: stats.max_hp,
            xp: 0.0,
            max_xp: PLAYER_BASE_MAX_XP,
            level: 1,
            score: 0,
            stats,
            hit_flash: 0.0,
            regen_timer: 0.0,
        }
    }

    pub fn max_hp(&self) -> f32 {
        self.stats.max_hp
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    pub fn speed(&self) -> f32 {
        PLAYER_BASE_SPEED * self.stats.multipliers.move_speed
    }

    pub fn magnet_radius(&self) -> f32 {
        PLAYER_BASE_MAGNET * self.stats.multipliers.magnet
    }

    pub fn heal(&mut self, amount: f32) {
        self.hp = (self.hp + amount).min(self.max_hp());
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.hp = (self.hp - amount).clamp(0.0, self.max_hp());
    }

    /// Experience from a gem, scaled by the gain multiplier
    pub fn add_xp(&mut self, amount: f32) {
        self.xp += amount * self.stats.multipliers.gain;
    }

    /// Swap in recomputed stats. A larger max HP keeps the current HP fraction.
    pub fn apply_stats(&mut self, stats: DerivedStats) {
        let old_max = self.max_hp();
        let fraction = if old_max > 0.0 { self.hp / old_max } else { 1.0 };
        self.stats = stats;
        if self.max_hp() > old_max {
            self.hp = self.max_hp() * fraction;
        }
        self.hp = self.hp.min(self.max_hp());
    }

    /// Movement, hit flash and regeneration for one step
    pub fn update(&mut self, movement: Vec2, dt: f32) {
        self.pos += movement * self.speed() * dt;

        if self.hit_flash > 0.0 {
            self.hit_flash = (self.hit_flash - dt).max(0.0);
        }

        if self.stats.regen > 0.0 {
            self.regen_timer += dt;
            if self.regen_timer >= REGEN_INTERVAL {
                self.regen_timer -= REGEN_INTERVAL;
                self.heal(self.max_hp() * self.stats.regen);
            }
        }
    }
}

/// Everything alive in one run
pub struct World {
    /// Accumulated simulation seconds
    pub time: f32,
    pub viewport: Vec2,
    /// Movement input for the current step (length <= 1)
    pub movement: Vec2,
    pub player: Player,
    pub enemies: Vec<Enemy>,
    pub projectiles: Vec<Projectile>,
    pub enemy_bullets: Vec<EnemyProjectile>,
    pub pickups: Vec<Pickup>,
    pub poison_zones: Vec<PoisonZone>,
    /// Visual only
    pub particles: ParticleField,
    pub labels: Vec<DamageLabel>,
    pub arcs: Vec<LightningArc>,
    /// Currency collected this run, banked on game over
    pub run_gold: u64,
    pub kills: u32,
    /// Set when the boss dies, consumed by the wave director
    pub(crate) boss_defeated: bool,
    pub(crate) index: SpatialIndex<usize>,
    pub(crate) rng: Pcg32,
    enemy_pool: ObjectPool<Enemy>,
    projectile_pool: ObjectPool<Projectile>,
    pickup_pool: ObjectPool<Pickup>,
    label_pool: ObjectPool<DamageLabel>,
    show_labels: bool,
    next_id: u32,
    shots: Vec<EnemyShot>,
    near: Vec<usize>,
    near_pos: Vec<Vec2>,
}

impl World {
    pub fn new(settings: &Settings, seed: u64, stats: DerivedStats) -> Self {
        let viewport = settings.viewport();
        let player = Player::new(stats);
        Self {
            time: 0.0,
            viewport,
            movement: Vec2::ZERO,
            index: SpatialIndex::new(Rect::centered(player.pos, viewport)),
            player,
            enemies: Vec::new(),
            projectiles: Vec::new(),
            enemy_bullets: Vec::new(),
            pickups: Vec::new(),
            poison_zones: Vec::new(),
            particles: ParticleField::new(settings.particle_budget()),
            labels: Vec::new(),
            arcs: Vec::new(),
            run_gold: 0,
            kills: 0,
            boss_defeated: false,
            rng: Pcg32::seed_from_u64(seed),
            enemy_pool: ObjectPool::prewarmed(Enemy::new, Enemy::reset, ENEMY_POOL_PREWARM),
            projectile_pool: ObjectPool::prewarmed(
                Projectile::new,
                Projectile::reset,
                PROJECTILE_POOL_PREWARM,
            ),
            pickup_pool: ObjectPool::prewarmed(Pickup::new, Pickup::reset, PICKUP_POOL_PREWARM),
            label_pool: ObjectPool::prewarmed(
                DamageLabel::new,
                DamageLabel::reset,
                LABEL_POOL_PREWARM,
            ),
            show_labels: settings.damage_labels,
            next_id: 1,
            shots: Vec::new(),
            near: Vec::new(),
            near_pos: Vec::new(),
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn active_enemies(&self) -> usize {
        self.enemies.iter().filter(|e| e.active).count()
    }

    pub fn boss_alive(&self) -> bool {
        self.enemies.iter().any(|e| e.active && e.kind.is_boss())
    }

    pub fn spawn_enemy(&mut self, kind: EnemyKind, pos: Vec2, hp_scale: f32) -> u32 {
        let id = self.next_entity_id();
        let mut enemy = self.enemy_pool.acquire();
        enemy.spawn(id, kind, pos, hp_scale, self.time);
        self.enemies.push(enemy);
        id
    }

    pub fn spawn_pickup(&mut self, kind: PickupKind, pos: Vec2, value: f32, vel: Vec2) {
        let mut pickup = self.pickup_pool.acquire();
        pickup.spawn(kind, pos, value);
        pickup.vel = vel;
        self.pickups.push(pickup);
    }

    pub fn spawn_label(&mut self, pos: Vec2, text: &str, style: LabelStyle) {
        if !self.show_labels {
            return;
        }
        let mut label = self.label_pool.acquire();
        label.spawn(pos, text, style, &mut self.rng);
        self.labels.push(label);
    }

    /// Rebuild the spatial index over active enemies, centred on the player.
    /// The root covers twice the viewport in each direction.
    pub fn rebuild_index(&mut self) {
        self.index.reset(Rect::centered(self.player.pos, self.viewport));
        for (slot, enemy) in self.enemies.iter().enumerate() {
            if enemy.active {
                self.index.insert(enemy.bounds(), slot);
            }
        }
    }

    /// Advance the clock and move the player
    pub fn step_player(&mut self, dt: f32) {
        self.time += dt;
        self.player.update(self.movement, dt);
    }

    pub fn update_enemies(&mut self, dt: f32) {
        let player = self.player.pos;
        let time = self.time;
        let mut shots = std::mem::take(&mut self.shots);
        let mut near = std::mem::take(&mut self.near);
        let mut near_pos = std::mem::take(&mut self.near_pos);

        for slot in 0..self.enemies.len() {
            if !self.enemies[slot].active {
                continue;
            }
            let (pos, radius) = (self.enemies[slot].pos, self.enemies[slot].radius);

            near.clear();
            self.index.query_into(&Rect::around(pos, radius * 3.0), &mut near);
            near_pos.clear();
            near_pos.extend(
                near.iter()
                    .filter(|&&other| other != slot && self.enemies[other].active)
                    .map(|&other| self.enemies[other].pos),
            );
            let push = separation_offset(pos, radius, &near_pos, dt);

            let enemy = &mut self.enemies[slot];
            enemy.pos += push;
            enemy.update(player, dt, time, &mut shots);
        }

        for shot in shots.drain(..) {
            self.enemy_bullets.push(EnemyProjectile::new(shot.origin, shot.angle, shot.size));
        }

        self.shots = shots;
        self.near = near;
        self.near_pos = near_pos;
    }

    /// Age poison puddles and tick the player standing in them.
    /// Poison ignores the hit-flash window.
    pub fn update_poison(&mut self, dt: f32) {
        let mut ticks = 0;
        for zone in &mut self.poison_zones {
            zone.life -= dt;
            if zone.is_alive()
                && circles_overlap(zone.pos, zone.radius(), self.player.pos, PLAYER_RADIUS)
                && zone.try_tick(self.time)
            {
                ticks += 1;
            }
        }
        for _ in 0..ticks {
            self.hurt_player(POISON_DAMAGE, true);
        }
        self.poison_zones.retain(PoisonZone::is_alive);
    }

    pub fn update_projectiles(&mut self, dt: f32) {
        let owner = self.player.pos;
        let mut expired = Vec::new();
        for p in &mut self.projectiles {
            if let Some(effect) = p.update(dt, owner) {
                expired.push((p.source, p.pos, effect));
            }
        }
        for (source, pos, effect) in expired {
            self.spawn_expire_effect(source, pos, effect);
        }
    }

    pub fn update_pickups(&mut self, dt: f32) {
        let player = self.player.pos;
        let magnet = self.player.magnet_radius();
        for pickup in &mut self.pickups {
            pickup.update(player, magnet, dt);
        }
    }

    /// Particles, labels, arcs and enemy bullets
    pub fn update_effects(&mut self, dt: f32) {
        self.particles.update(dt);
        for label in &mut self.labels {
            label.update(dt);
        }
        for arc in &mut self.arcs {
            arc.life -= dt;
        }
        self.arcs.retain(|a| a.life > 0.0);
        for bullet in &mut self.enemy_bullets {
            bullet.update(dt);
        }
    }

    /// Turn an ended projectile's follow-up into a stationary damage zone
    pub fn spawn_expire_effect(&mut self, source: WeaponKind, pos: Vec2, effect: ExpireEffect) {
        let spec = match effect {
            ExpireEffect::Zone {
                damage,
                size,
                duration,
                interval,
            } => ProjectileSpec::new(source, damage, 0.0, size, duration)
                .behavior(Behavior::stationary(interval)),
            ExpireEffect::Explosion { damage, size } => {
                self.particles.burst(pos, BLAST_COLOR, &mut self.rng);
                // Infinite interval: each enemy is hit once
                ProjectileSpec::new(source, damage, 0.0, size, EXPLOSION_LIFETIME)
                    .behavior(Behavior::stationary(f32::INFINITY))
            }
        };
        self.spawn_projectile(pos, Vec2::ZERO, spec);
    }

    /// Drop a removed weapon's live projectiles without follow-up effects
    pub fn retire_projectiles(&mut self, source: WeaponKind) {
        for p in self.projectiles.iter_mut().filter(|p| p.active && p.source == source) {
            p.active = false;
        }
    }

    /// Apply damage to the player. Returns false when the hit was absorbed
    /// by the hit-flash window.
    pub fn hurt_player(&mut self, amount: f32, ignore_flash: bool) -> bool {
        if self.player.is_dead() || (!ignore_flash && self.player.hit_flash > 0.0) {
            return false;
        }
        self.player.take_damage(amount);
        self.player.hit_flash = PLAYER_HIT_FLASH;
        let pos = self.player.pos - Vec2::new(0.0, 20.0);
        self.spawn_label(pos, &format!("-{amount}"), LabelStyle::PlayerHit);
        true
    }

    /// Score, effects and loot for an enemy that just died
    pub fn on_enemy_killed(&mut self, slot: usize) {
        let (kind, pos) = {
            let e = &self.enemies[slot];
            (e.kind, e.pos)
        };
        let arch = kind.archetype();
        self.kills += 1;
        self.player.score += arch.score;
        self.particles.burst(pos, arch.color, &mut self.rng);

        if kind == EnemyKind::Poisoner {
            if self.poison_zones.len() >= MAX_POISON_ZONES {
                self.poison_zones.remove(0);
            }
            self.poison_zones.push(PoisonZone::new(pos));
        }

        if kind.is_boss() {
            log::info!("Boss defeated at {:.1}s", self.time);
            self.boss_defeated = true;
            self.enemy_bullets.clear();
            self.spawn_label(pos, "VICTORY!", LabelStyle::Notice);
        }

        self.drop_loot(kind, pos);
    }

    fn drop_loot(&mut self, kind: EnemyKind, pos: Vec2) {
        let heavy_drop = matches!(kind, EnemyKind::EliteShooter | EnemyKind::Tank);
        if kind.is_boss() || (heavy_drop && self.rng.random::<f32>() < 0.3) {
            self.spawn_pickup(PickupKind::Chest, pos, 1.0, Vec2::ZERO);
        } else if kind == EnemyKind::EliteShooter && self.rng.random::<f32>() < 0.3 {
            self.spawn_pickup(PickupKind::WeaponCrate, pos, 1.0, Vec2::ZERO);
        } else if self.rng.random::<f32>() < 0.1 {
            self.spawn_pickup(PickupKind::Gold, pos, 10.0, Vec2::ZERO);
        } else if self.rng.random::<f32>() < 0.05 {
            self.spawn_pickup(PickupKind::Potion, pos, 20.0, Vec2::ZERO);
        } else {
            self.spawn_pickup(PickupKind::Experience, pos, 10.0, Vec2::ZERO);
        }
    }

    /// Effect of touching a pickup
    pub fn collect_pickup(&mut self, kind: PickupKind, pos: Vec2, value: f32) {
        let above_player = self.player.pos - Vec2::new(0.0, 20.0);
        match kind {
            PickupKind::Experience => self.player.add_xp(value),
            PickupKind::Gold => {
                let amount = (value * self.player.stats.multipliers.gain).floor() as u64;
                self.run_gold += amount;
                self.spawn_label(above_player, &format!("+{amount}G"), LabelStyle::Notice);
            }
            PickupKind::Potion => {
                self.player.heal(value);
                self.spawn_label(above_player, &format!("+{value}"), LabelStyle::Heal);
            }
            PickupKind::Chest => {
                let roll: f32 = self.rng.random();
                if roll < 1.0 / 3.0 {
                    self.player.xp += self.player.max_xp as f32;
                    self.spawn_label(above_player, "MAX XP!", LabelStyle::Notice);
                } else if roll < 2.0 / 3.0 {
                    self.player.hp = self.player.max_hp();
                    self.spawn_label(above_player, "FULL HEAL!", LabelStyle::Heal);
                } else {
                    self.nuke();
                    self.spawn_label(above_player, "NUKE!", LabelStyle::Notice);
                }
            }
            PickupKind::WeaponCrate => {
                self.particles.burst(pos, CRATE_COLOR, &mut self.rng);
                let roll: f32 = self.rng.random();
                let pop = Vec2::new((self.rng.random::<f32>() - 0.5) * 200.0, -300.0);
                if roll < 0.2 {
                    self.spawn_pickup(PickupKind::Magnet, pos, 1.0, pop);
                } else if roll < 0.5 {
                    self.spawn_pickup(PickupKind::Potion, pos, 50.0, pop);
                } else {
                    self.spawn_pickup(PickupKind::Gold, pos, 500.0, pop);
                }
            }
            PickupKind::Magnet => {
                for p in &mut self.pickups {
                    if p.active && p.kind == PickupKind::Experience {
                        p.magnetize();
                    }
                }
                self.spawn_label(above_player, "MAGNET FIELD!", LabelStyle::Notice);
            }
        }
    }

    /// Kill every non-boss enemy through the normal death path
    pub fn nuke(&mut self) {
        for slot in 0..self.enemies.len() {
            let enemy = &mut self.enemies[slot];
            if !enemy.active || enemy.kind.is_boss() {
                continue;
            }
            if enemy.take_damage(NUKE_DAMAGE) {
                let pos = enemy.pos;
                self.spawn_label(pos, "9999", LabelStyle::Critical);
                self.on_enemy_killed(slot);
            }
        }
    }

    /// Closest active enemy to `pos`, optionally skipping one slot
    pub fn nearest_enemy_to(&self, pos: Vec2, exclude: Option<usize>) -> Option<EnemyRef> {
        self.enemies
            .iter()
            .enumerate()
            .filter(|(slot, e)| e.active && Some(*slot) != exclude)
            .min_by(|a, b| a.1.pos.distance_squared(pos).total_cmp(&b.1.pos.distance_squared(pos)))
            .map(|(slot, e)| EnemyRef { slot, id: e.id, pos: e.pos })
    }

    fn enemy_ref(&self, slot: usize) -> EnemyRef {
        let e = &self.enemies[slot];
        EnemyRef { slot, id: e.id, pos: e.pos }
    }

    /// Return everything inactive to its pool. Runs once at the end of a frame,
    /// after the last index lookup.
    pub fn compact(&mut self) {
        recycle_inactive(&mut self.enemies, &mut self.enemy_pool, |e| e.active);
        recycle_inactive(&mut self.projectiles, &mut self.projectile_pool, |p| p.active);
        recycle_inactive(&mut self.pickups, &mut self.pickup_pool, |p| p.active);
        recycle_inactive(&mut self.labels, &mut self.label_pool, |l| l.active);
        self.enemy_bullets.retain(|b| b.active);
    }

    /// Release every pooled entity and drop transient state
    pub fn clear(&mut self) {
        release_all(&mut self.enemies, &mut self.enemy_pool);
        release_all(&mut self.projectiles, &mut self.projectile_pool);
        release_all(&mut self.pickups, &mut self.pickup_pool);
        release_all(&mut self.labels, &mut self.label_pool);
        self.enemy_bullets.clear();
        self.poison_zones.clear();
        self.arcs.clear();
        self.particles.clear();
        self.index.clear();
    }
}

impl GameContext for World {
    fn player_pos(&self) -> Vec2 {
        self.player.pos
    }

    fn multipliers(&self) -> Multipliers {
        self.player.stats.multipliers
    }

    fn spawn_projectile(&mut self, origin: Vec2, dir: Vec2, spec: ProjectileSpec) -> u32 {
        let spec = spec.scaled(&self.player.stats.multipliers);
        let id = self.next_entity_id();
        let mut projectile = self.projectile_pool.acquire();
        projectile.launch(id, origin, dir, spec, self.player.pos);
        self.projectiles.push(projectile);
        id
    }

    fn projectile_alive(&self, id: u32) -> bool {
        self.projectiles.iter().any(|p| p.active && p.id == id)
    }

    fn nearest_enemy(&self) -> Option<Vec2> {
        self.nearest_enemy_to(self.player.pos, None).map(|e| e.pos)
    }

    fn best_target(&self, origin: Vec2) -> Option<Vec2> {
        let boss = self.enemies.iter().find(|e| e.active && e.kind.is_boss());
        let range_sq = BOSS_TARGET_RANGE * BOSS_TARGET_RANGE;
        if let Some(boss) = boss.filter(|b| b.pos.distance_squared(origin) < range_sq) {
            return Some(boss.pos);
        }

        let heading = self.movement.normalize_or_zero();
        let mut nearest: Option<(f32, Vec2)> = None;
        let mut in_cone: Option<(f32, Vec2)> = None;
        for enemy in self.enemies.iter().filter(|e| e.active) {
            let to = enemy.pos - origin;
            let dist_sq = to.length_squared();
            if nearest.is_none_or(|(best, _)| dist_sq < best) {
                nearest = Some((dist_sq, enemy.pos));
            }
            if heading != Vec2::ZERO && dist_sq > 0.0 {
                let facing = to.dot(heading) / dist_sq.sqrt();
                if facing > TARGET_CONE_COS && in_cone.is_none_or(|(best, _)| dist_sq < best) {
                    in_cone = Some((dist_sq, enemy.pos));
                }
            }
        }
        in_cone.or(nearest).map(|(_, pos)| pos)
    }

    fn random_visible_enemy(&mut self) -> Option<EnemyRef> {
        let half = self.viewport / 2.0;
        let center = self.player.pos;
        let visible: Vec<usize> = self
            .enemies
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                let d = e.pos - center;
                e.active && d.x.abs() < half.x && d.y.abs() < half.y
            })
            .map(|(slot, _)| slot)
            .collect();
        if visible.is_empty() {
            return None;
        }
        let slot = visible[self.rng.random_range(0..visible.len())];
        Some(self.enemy_ref(slot))
    }

    fn nearest_unvisited(&self, from: Vec2, radius: f32, visited: &[u32]) -> Option<EnemyRef> {
        let reach_sq = radius * radius;
        self.index
            .query(&Rect::around(from, radius))
            .into_iter()
            .filter(|&slot| {
                let e = &self.enemies[slot];
                e.active && !visited.contains(&e.id) && e.pos.distance_squared(from) < reach_sq
            })
            .min_by(|&a, &b| {
                let da = self.enemies[a].pos.distance_squared(from);
                let db = self.enemies[b].pos.distance_squared(from);
                da.total_cmp(&db)
            })
            .map(|slot| self.enemy_ref(slot))
    }

    fn strike(&mut self, target: EnemyRef, damage: f32, stun: f32) {
        let Some(enemy) = self.enemies.get_mut(target.slot) else {
            return;
        };
        if !enemy.active || enemy.id != target.id {
            return;
        }
        enemy.apply_stun(stun);
        let died = enemy.take_damage(damage);
        let pos = enemy.pos - Vec2::new(0.0, 10.0);
        self.spawn_label(pos, &format!("{damage}"), LabelStyle::Chain);
        if died {
            self.on_enemy_killed(target.slot);
        }
    }

    fn lightning_arc(&mut self, from: Vec2, to: Vec2) {
        self.arcs.push(LightningArc::new(from, to));
    }

    fn random(&mut self) -> f32 {
        self.rng.random()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(&Settings::default(), 12345, DerivedStats::default())
    }

    #[test]
    fn test_proportional_heal_on_max_hp_increase() {
        let mut player = Player::new(DerivedStats::default());
        player.hp = 50.0;
        let bigger = DerivedStats {
            max_hp: 120.0,
            ..DerivedStats::default()
        };
        player.apply_stats(bigger);
        assert!((player.hp - 60.0).abs() < 0.001);

        let smaller = DerivedStats {
            max_hp: 40.0,
            ..DerivedStats::default()
        };
        player.apply_stats(smaller);
        assert_eq!(player.hp, 40.0);
    }

    #[test]
    fn test_player_hit_flash_blocks_followup_damage() {
        let mut w = world();
        assert!(w.hurt_player(5.0, false));
        assert!(!w.hurt_player(5.0, false));
        assert_eq!(w.player.hp, 95.0);

        // Poison ignores the window
        assert!(w.hurt_player(2.0, true));
        assert_eq!(w.player.hp, 93.0);

        for _ in 0..13 {
            w.step_player(1.0 / 60.0);
        }
        assert!(w.hurt_player(5.0, false));
    }

    #[test]
    fn test_player_hp_never_negative() {
        let mut w = world();
        w.hurt_player(500.0, false);
        assert_eq!(w.player.hp, 0.0);
        assert!(w.player.is_dead());
    }

    #[test]
    fn test_regen_pulse() {
        let stats = DerivedStats {
            regen: 0.02,
            ..DerivedStats::default()
        };
        let mut player = Player::new(stats);
        player.hp = 50.0;
        for _ in 0..299 {
            player.update(Vec2::ZERO, 1.0 / 60.0);
        }
        assert_eq!(player.hp, 50.0);
        for _ in 0..2 {
            player.update(Vec2::ZERO, 1.0 / 60.0);
        }
        assert!((player.hp - 52.0).abs() < 0.001);
    }

    #[test]
    fn test_best_target_prefers_boss_then_cone() {
        let mut w = world();
        w.spawn_enemy(EnemyKind::Basic, Vec2::new(-50.0, 0.0), 1.0);
        w.spawn_enemy(EnemyKind::Basic, Vec2::new(200.0, 0.0), 1.0);
        assert_eq!(w.best_target(Vec2::ZERO), Some(Vec2::new(-50.0, 0.0)));

        w.movement = Vec2::X;
        assert_eq!(w.best_target(Vec2::ZERO), Some(Vec2::new(200.0, 0.0)));

        w.spawn_enemy(EnemyKind::Boss, Vec2::new(0.0, 1500.0), 1.0);
        assert_eq!(w.best_target(Vec2::ZERO), Some(Vec2::new(0.0, 1500.0)));
    }

    #[test]
    fn test_boss_always_drops_chest() {
        let mut w = world();
        w.spawn_enemy(EnemyKind::Boss, Vec2::new(30.0, 0.0), 1.0);
        assert!(w.enemies[0].take_damage(1.0e9));
        w.on_enemy_killed(0);
        assert!(w.boss_defeated);
        assert_eq!(w.pickups.len(), 1);
        assert_eq!(w.pickups[0].kind, PickupKind::Chest);
        assert_eq!(w.player.score, 5000);
    }

    #[test]
    fn test_poisoner_leaves_capped_puddles() {
        let mut w = world();
        for i in 0..(MAX_POISON_ZONES + 5) {
            w.spawn_enemy(EnemyKind::Poisoner, Vec2::new(i as f32 * 500.0, 1000.0), 1.0);
        }
        for slot in 0..w.enemies.len() {
            w.enemies[slot].take_damage(1000.0);
            w.on_enemy_killed(slot);
        }
        assert_eq!(w.poison_zones.len(), MAX_POISON_ZONES);
        assert_eq!(w.kills as usize, MAX_POISON_ZONES + 5);
    }

    #[test]
    fn test_gold_scaled_by_gain() {
        let mut w = world();
        w.player.stats.multipliers.gain = 1.5;
        w.collect_pickup(PickupKind::Gold, Vec2::ZERO, 10.0);
        assert_eq!(w.run_gold, 15);
        w.collect_pickup(PickupKind::Experience, Vec2::ZERO, 10.0);
        assert!((w.player.xp - 15.0).abs() < 0.001);
    }

    #[test]
    fn test_nuke_spares_boss() {
        let mut w = world();
        w.spawn_enemy(EnemyKind::Boss, Vec2::new(0.0, -400.0), 1.0);
        w.spawn_enemy(EnemyKind::Tank, Vec2::new(100.0, 0.0), 1.0);
        w.spawn_enemy(EnemyKind::Basic, Vec2::new(-100.0, 0.0), 1.0);
        w.nuke();
        assert_eq!(w.active_enemies(), 1);
        assert!(w.boss_alive());
        assert_eq!(w.kills, 2);
    }

    #[test]
    fn test_magnet_pulls_every_gem() {
        let mut w = world();
        w.spawn_pickup(PickupKind::Experience, Vec2::new(900.0, 0.0), 10.0, Vec2::ZERO);
        w.spawn_pickup(PickupKind::Gold, Vec2::new(900.0, 0.0), 10.0, Vec2::ZERO);
        w.collect_pickup(PickupKind::Magnet, Vec2::ZERO, 1.0);
        assert!(w.pickups[0].magnetized);
        assert!(!w.pickups[1].magnetized);
    }

    #[test]
    fn test_compact_returns_to_pools() {
        let mut w = world();
        w.spawn_enemy(EnemyKind::Basic, Vec2::ZERO, 1.0);
        w.spawn_enemy(EnemyKind::Basic, Vec2::new(50.0, 0.0), 1.0);
        let before = w.enemy_pool.available();
        w.enemies[0].take_damage(100.0);
        w.compact();
        assert_eq!(w.enemies.len(), 1);
        assert_eq!(w.enemy_pool.available(), before + 1);

        w.clear();
        assert!(w.enemies.is_empty());
        assert_eq!(w.enemy_pool.available(), before + 2);
    }

    #[test]
    fn test_chain_lookup_skips_visited() {
        let mut w = world();
        let a = w.spawn_enemy(EnemyKind::Basic, Vec2::new(0.0, 100.0), 1.0);
        let b = w.spawn_enemy(EnemyKind::Basic, Vec2::new(50.0, 100.0), 1.0);
        w.spawn_enemy(EnemyKind::Basic, Vec2::new(400.0, 100.0), 1.0);
        w.rebuild_index();

        let next = w.nearest_unvisited(Vec2::new(0.0, 100.0), 150.0, &[a]);
        assert_eq!(next.map(|e| e.id), Some(b));
        assert_eq!(w.nearest_unvisited(Vec2::new(50.0, 100.0), 150.0, &[a, b]), None);
    }

    #[test]
    fn test_explosion_hits_once_per_enemy() {
        let mut w = world();
        w.spawn_expire_effect(
            WeaponKind::Rocket,
            Vec2::ZERO,
            ExpireEffect::Explosion { damage: 30.0, size: 80.0 },
        );
        let blast = &w.projectiles[0];
        assert!(blast.is_zone());
        assert!((blast.max_life - EXPLOSION_LIFETIME).abs() < 0.0001);
        let mut blast = blast.clone();
        blast.mark_zone_hit(9, 0.0);
        assert!(!blast.zone_ready(9, 1000.0));
    }
}
