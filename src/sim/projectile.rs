//! Player projectiles and enemy bullets
//!
//! Motion is selected by a closed `Behavior` enum. Follow-up effects that fire
//! when a projectile goes away (fire pools, rocket blasts) are plain
//! `ExpireEffect` descriptors the world turns into new projectiles.

use glam::Vec2;
use rustc_hash::FxHashMap;

use super::spatial::Rect;
use super::stats::Multipliers;
use super::weapon::WeaponKind;
use crate::angle_to_dir;
use crate::consts::{ENEMY_BULLET_DAMAGE, ENEMY_BULLET_LIFETIME};

/// Boomerangs turn around after this fraction of their lifetime
pub const BOOMERANG_RETURN_AT: f32 = 0.4;
pub const BOOMERANG_RETURN_SPEED: f32 = 1.5;
/// Boomerangs vanish once this close to the player on the way back
pub const BOOMERANG_CATCH_DISTANCE: f32 = 10.0;

/// How a projectile moves
#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    Linear,
    /// Out, then home back onto the player
    Boomerang { returning: bool },
    /// Circle the player at a fixed radius
    Orbit { angle: f32, radius: f32, angular_speed: f32 },
    /// Parabolic throw (screen y grows downward)
    Gravity { gravity: f32 },
    /// Damage zone; each enemy is hit at most once per `interval`
    Stationary { interval: f32, last_hit: FxHashMap<u32, f32> },
    /// Linear, retargets on hit while bounces remain
    Bounce,
}

impl Behavior {
    pub fn stationary(interval: f32) -> Self {
        Behavior::Stationary {
            interval,
            last_hit: FxHashMap::default(),
        }
    }
}

/// Hit budget. Pierce and bounce never coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depletion {
    Pierce(u32),
    Bounces(u32),
    Unlimited,
}

/// Effect spawned where a projectile ends
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExpireEffect {
    /// Lingering tick-damage zone
    Zone {
        damage: f32,
        size: f32,
        duration: f32,
        interval: f32,
    },
    /// One-shot blast
    Explosion { damage: f32, size: f32 },
}

/// What a projectile does after resolving a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    Continue,
    Retarget,
    Spent,
}

/// Launch parameters, before player multipliers
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectileSpec {
    pub source: WeaponKind,
    pub damage: f32,
    pub speed: f32,
    /// Diameter
    pub size: f32,
    pub lifetime: f32,
    pub behavior: Behavior,
    pub depletion: Depletion,
    pub on_expire: Option<ExpireEffect>,
    /// Initial vertical velocity replacing the aimed one
    pub lift: Option<f32>,
}

impl ProjectileSpec {
    pub fn new(source: WeaponKind, damage: f32, speed: f32, size: f32, lifetime: f32) -> Self {
        Self {
            source,
            damage,
            speed,
            size,
            lifetime,
            behavior: Behavior::Linear,
            depletion: Depletion::Unlimited,
            on_expire: None,
            lift: None,
        }
    }

    pub fn behavior(mut self, behavior: Behavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn pierce(mut self, count: u32) -> Self {
        self.depletion = Depletion::Pierce(count);
        self
    }

    pub fn bounces(mut self, count: u32) -> Self {
        self.behavior = Behavior::Bounce;
        self.depletion = Depletion::Bounces(count);
        self
    }

    pub fn on_expire(mut self, effect: ExpireEffect) -> Self {
        self.on_expire = Some(effect);
        self
    }

    pub fn lift(mut self, vy: f32) -> Self {
        self.lift = Some(vy);
        self
    }

    /// Apply the player's damage/duration/area/bullet-speed multipliers
    pub fn scaled(mut self, m: &Multipliers) -> Self {
        self.damage *= m.damage;
        if self.lifetime.is_finite() {
            self.lifetime *= m.duration;
        }
        self.size *= m.area;
        if self.speed > 0.0 {
            self.speed *= m.bullet_speed;
        }
        self
    }
}

/// A player-owned projectile
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: u32,
    pub source: WeaponKind,
    pub active: bool,
    pub pos: Vec2,
    pub vel: Vec2,
    pub speed: f32,
    pub damage: f32,
    /// Diameter
    pub size: f32,
    /// Seconds alive
    pub life: f32,
    pub max_life: f32,
    pub behavior: Behavior,
    pub depletion: Depletion,
    pub on_expire: Option<ExpireEffect>,
    /// Enemies this projectile may not hit again
    pub struck: Vec<u32>,
}

impl Default for Projectile {
    fn default() -> Self {
        Self::new()
    }
}

impl Projectile {
    pub fn new() -> Self {
        Self {
            id: 0,
            source: WeaponKind::Pistol,
            active: false,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            speed: 0.0,
            damage: 0.0,
            size: 0.0,
            life: 0.0,
            max_life: 0.0,
            behavior: Behavior::Linear,
            depletion: Depletion::Unlimited,
            on_expire: None,
            struck: Vec::new(),
        }
    }

    /// Pool reset hook; keeps the `struck` allocation
    pub fn reset(&mut self) {
        let mut struck = std::mem::take(&mut self.struck);
        struck.clear();
        *self = Self::new();
        self.struck = struck;
    }

    pub fn launch(&mut self, id: u32, origin: Vec2, dir: Vec2, spec: ProjectileSpec, owner: Vec2) {
        self.id = id;
        self.source = spec.source;
        self.active = true;
        self.pos = origin;
        self.speed = spec.speed;
        self.vel = dir * spec.speed;
        if let Some(vy) = spec.lift {
            self.vel.y = vy;
        }
        self.damage = spec.damage;
        self.size = spec.size;
        self.life = 0.0;
        self.max_life = spec.lifetime;
        self.behavior = spec.behavior;
        self.depletion = spec.depletion;
        self.on_expire = spec.on_expire;
        self.struck.clear();

        if let Behavior::Orbit { angle, radius, .. } = self.behavior {
            self.vel = Vec2::ZERO;
            self.pos = owner + angle_to_dir(angle) * radius;
        }
        if matches!(self.behavior, Behavior::Stationary { .. }) {
            self.vel = Vec2::ZERO;
        }
    }

    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    pub fn bounds(&self) -> Rect {
        Rect::around(self.pos, self.radius())
    }

    pub fn is_zone(&self) -> bool {
        matches!(self.behavior, Behavior::Stationary { .. })
    }

    pub fn is_orbit(&self) -> bool {
        matches!(self.behavior, Behavior::Orbit { .. })
    }

    /// Straight and arcing shots never hit the same enemy twice
    pub fn remembers_hits(&self) -> bool {
        matches!(self.behavior, Behavior::Linear | Behavior::Gravity { .. })
    }

    pub fn has_struck(&self, enemy: u32) -> bool {
        self.struck.contains(&enemy)
    }

    /// Whether a zone may damage `enemy` at sim time `now`
    pub fn zone_ready(&self, enemy: u32, now: f32) -> bool {
        match &self.behavior {
            Behavior::Stationary { interval, last_hit } => {
                last_hit.get(&enemy).is_none_or(|t| now - t >= *interval)
            }
            _ => true,
        }
    }

    pub fn mark_zone_hit(&mut self, enemy: u32, now: f32) {
        if let Behavior::Stationary { last_hit, .. } = &mut self.behavior {
            last_hit.insert(enemy, now);
        }
    }

    /// Consume hit budget for a hit on `enemy`
    pub fn register_hit(&mut self, enemy: u32) -> HitOutcome {
        let remember = self.remembers_hits();
        match &mut self.depletion {
            Depletion::Pierce(left) => {
                *left = left.saturating_sub(1);
                self.struck.push(enemy);
                if *left == 0 {
                    HitOutcome::Spent
                } else {
                    HitOutcome::Continue
                }
            }
            Depletion::Bounces(left) => {
                *left = left.saturating_sub(1);
                // Only the last victim is excluded so it can be hit again later
                self.struck.clear();
                self.struck.push(enemy);
                if *left == 0 {
                    HitOutcome::Spent
                } else {
                    HitOutcome::Retarget
                }
            }
            Depletion::Unlimited => {
                if remember {
                    self.struck.push(enemy);
                }
                HitOutcome::Continue
            }
        }
    }

    /// Head for `target`, or turn around when there is none
    pub fn redirect(&mut self, target: Option<Vec2>) {
        let dir = target.map(|t| (t - self.pos).normalize_or_zero()).unwrap_or(Vec2::ZERO);
        if dir == Vec2::ZERO {
            self.vel = -self.vel;
        } else {
            self.vel = dir * self.speed;
        }
    }

    /// Deactivate, handing back the expire effect exactly once
    pub fn deactivate(&mut self) -> Option<ExpireEffect> {
        if !self.active {
            return None;
        }
        self.active = false;
        self.on_expire.take()
    }

    /// Advance motion. `owner` is the player position. Returns the expire
    /// effect if the projectile ended during this step.
    pub fn update(&mut self, dt: f32, owner: Vec2) -> Option<ExpireEffect> {
        if !self.active {
            return None;
        }

        self.life += dt;
        if self.life >= self.max_life {
            return self.deactivate();
        }

        match &mut self.behavior {
            Behavior::Linear | Behavior::Bounce => self.pos += self.vel * dt,
            Behavior::Boomerang { returning } => {
                if !*returning && self.life >= self.max_life * BOOMERANG_RETURN_AT {
                    *returning = true;
                }
                if *returning {
                    let to_owner = owner - self.pos;
                    let dist = to_owner.length();
                    if dist < BOOMERANG_CATCH_DISTANCE {
                        return self.deactivate();
                    }
                    self.vel = to_owner / dist * self.speed * BOOMERANG_RETURN_SPEED;
                }
                self.pos += self.vel * dt;
            }
            Behavior::Orbit {
                angle,
                radius,
                angular_speed,
            } => {
                *angle += *angular_speed * dt;
                self.pos = owner + angle_to_dir(*angle) * *radius;
            }
            Behavior::Gravity { gravity } => {
                self.vel.y += *gravity * dt;
                self.pos += self.vel * dt;
            }
            Behavior::Stationary { .. } => {}
        }
        None
    }
}

/// Bullet fired by an enemy at the player
#[derive(Debug, Clone, PartialEq)]
pub struct EnemyProjectile {
    pub active: bool,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Diameter
    pub size: f32,
    pub damage: f32,
    pub life: f32,
    pub max_life: f32,
}

impl EnemyProjectile {
    pub fn new(origin: Vec2, angle: f32, size: f32) -> Self {
        // Big boss bullets travel slower
        let speed = if size > 10.0 { 150.0 } else { 200.0 };
        Self {
            active: true,
            pos: origin,
            vel: angle_to_dir(angle) * speed,
            size,
            damage: ENEMY_BULLET_DAMAGE,
            life: 0.0,
            max_life: ENEMY_BULLET_LIFETIME,
        }
    }

    pub fn update(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        self.pos += self.vel * dt;
        self.life += dt;
        if self.life >= self.max_life {
            self.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn launched(spec: ProjectileSpec, dir: Vec2) -> Projectile {
        let mut p = Projectile::new();
        p.launch(1, Vec2::ZERO, dir, spec, Vec2::ZERO);
        p
    }

    #[test]
    fn test_linear_moves_and_expires() {
        let spec = ProjectileSpec::new(WeaponKind::Pistol, 10.0, 100.0, 10.0, 1.0);
        let mut p = launched(spec, Vec2::X);
        assert!(p.update(0.5, Vec2::ZERO).is_none());
        assert!((p.pos.x - 50.0).abs() < 0.001);
        p.update(0.6, Vec2::ZERO);
        assert!(!p.active);
    }

    #[test]
    fn test_expire_effect_fires_once() {
        let effect = ExpireEffect::Explosion { damage: 30.0, size: 80.0 };
        let spec =
            ProjectileSpec::new(WeaponKind::Rocket, 30.0, 100.0, 24.0, 0.1).on_expire(effect);
        let mut p = launched(spec, Vec2::X);
        assert_eq!(p.update(0.2, Vec2::ZERO), Some(effect));
        assert_eq!(p.deactivate(), None);
        assert_eq!(p.update(0.2, Vec2::ZERO), None);
    }

    #[test]
    fn test_boomerang_comes_back() {
        let spec = ProjectileSpec::new(WeaponKind::Boomerang, 24.0, 280.0, 16.0, 2.0)
            .behavior(Behavior::Boomerang { returning: false });
        let mut p = launched(spec, Vec2::X);
        let mut max_x: f32 = 0.0;
        let mut steps = 0;
        while p.active && steps < 200 {
            p.update(0.01, Vec2::ZERO);
            max_x = max_x.max(p.pos.x);
            steps += 1;
        }
        assert!(!p.active);
        assert!(max_x > 200.0);
        // Caught before lifetime ran out
        assert!(p.life < 2.0);
        assert!(p.pos.length() < BOOMERANG_CATCH_DISTANCE + 5.0);
    }

    #[test]
    fn test_orbit_follows_owner() {
        let orbit = Behavior::Orbit {
            angle: 0.0,
            radius: 80.0,
            angular_speed: 3.0,
        };
        let spec = ProjectileSpec::new(WeaponKind::Guardian, 5.0, 0.0, 12.0, 4.0).behavior(orbit);
        let mut p = launched(spec, Vec2::ZERO);
        let owner = Vec2::new(100.0, 50.0);
        for _ in 0..10 {
            p.update(0.05, owner);
            assert!((p.pos.distance(owner) - 80.0).abs() < 0.01);
        }
    }

    #[test]
    fn test_gravity_arc_rises_then_falls() {
        let spec = ProjectileSpec::new(WeaponKind::Molotov, 0.0, 0.0, 10.0, 2.0)
            .behavior(Behavior::Gravity { gravity: 400.0 })
            .lift(-200.0);
        let mut p = launched(spec, Vec2::X);
        p.update(0.1, Vec2::ZERO);
        assert!(p.pos.y < 0.0);
        for _ in 0..15 {
            p.update(0.1, Vec2::ZERO);
        }
        assert!(p.vel.y > 0.0);
    }

    #[test]
    fn test_zone_interval_per_target() {
        let spec = ProjectileSpec::new(WeaponKind::Molotov, 6.0, 0.0, 60.0, 3.0)
            .behavior(Behavior::stationary(0.5));
        let mut p = launched(spec, Vec2::ZERO);
        assert!(p.zone_ready(1, 0.0));
        p.mark_zone_hit(1, 0.0);
        assert!(!p.zone_ready(1, 0.3));
        assert!(p.zone_ready(2, 0.3));
        assert!(p.zone_ready(1, 0.5));
        p.update(1.0, Vec2::new(500.0, 0.0));
        assert_eq!(p.pos, Vec2::ZERO);
    }

    #[test]
    fn test_scaled_leaves_infinite_lifetime() {
        let m = Multipliers {
            damage: 2.0,
            duration: 1.5,
            area: 1.2,
            bullet_speed: 1.1,
            ..Multipliers::default()
        };
        let spec =
            ProjectileSpec::new(WeaponKind::Guardian, 5.0, 0.0, 10.0, f32::INFINITY).scaled(&m);
        assert!(spec.lifetime.is_infinite());
        assert!((spec.damage - 10.0).abs() < 0.001);
        assert!((spec.size - 12.0).abs() < 0.001);
        assert_eq!(spec.speed, 0.0);

        let spec = ProjectileSpec::new(WeaponKind::Pistol, 12.0, 300.0, 10.0, 2.0).scaled(&m);
        assert!((spec.lifetime - 3.0).abs() < 0.001);
        assert!((spec.speed - 330.0).abs() < 0.01);
    }

    #[test]
    fn test_pierce_and_bounce_budgets() {
        let piercing = ProjectileSpec::new(WeaponKind::Pistol, 1.0, 1.0, 1.0, 1.0).pierce(2);
        let mut p = launched(piercing, Vec2::X);
        assert_eq!(p.register_hit(10), HitOutcome::Continue);
        assert!(p.has_struck(10));
        assert_eq!(p.register_hit(11), HitOutcome::Spent);

        let bouncing = ProjectileSpec::new(WeaponKind::Soccer, 1.0, 100.0, 1.0, 5.0).bounces(2);
        let mut b = launched(bouncing, Vec2::X);
        assert_eq!(b.register_hit(3), HitOutcome::Retarget);
        b.redirect(None);
        assert!(b.vel.x < 0.0);
        b.redirect(Some(Vec2::new(0.0, 50.0)));
        assert!((b.vel - Vec2::new(0.0, 100.0)).length() < 0.001);
        assert_eq!(b.register_hit(4), HitOutcome::Spent);
        assert!(!b.has_struck(3));
    }

    #[test]
    fn test_enemy_bullet_speed_by_size() {
        let small = EnemyProjectile::new(Vec2::ZERO, 0.0, 10.0);
        let big = EnemyProjectile::new(Vec2::ZERO, 0.0, 24.0);
        assert!((small.vel.length() - 200.0).abs() < 0.01);
        assert!((big.vel.length() - 150.0).abs() < 0.01);

        let mut b = small;
        for _ in 0..41 {
            b.update(0.1);
        }
        assert!(!b.active);
    }
}
