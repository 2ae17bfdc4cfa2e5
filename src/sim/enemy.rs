//! Enemy entity and per-archetype AI

use std::f32::consts::TAU;

use glam::Vec2;

use super::spatial::Rect;
use crate::consts::*;
use crate::dir_to_angle;
pub use crate::tuning::EnemyKind;

/// Elite shooters stop closing in at this range
pub const SHOOTER_KEEP_DISTANCE: f32 = 300.0;
pub const SHOOTER_INTERVAL: f32 = 2.0;
/// Angular gap between the three bullets of a volley
pub const SHOOTER_SPREAD: f32 = 0.2;
pub const SHOOTER_BULLET_SIZE: f32 = 10.0;

pub const BOSS_RING_INTERVAL: f32 = 3.0;
pub const BOSS_RING_BULLETS: usize = 16;
pub const BOSS_BULLET_SIZE: f32 = 24.0;

/// Observable lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyState {
    Active,
    Stunned,
    Dead,
}

/// A bullet an enemy wants fired this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyShot {
    pub origin: Vec2,
    pub angle: f32,
    pub size: f32,
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub id: u32,
    pub kind: EnemyKind,
    pub active: bool,
    pub pos: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    pub speed: f32,
    pub radius: f32,
    pub mass: f32,
    /// Velocity imparted by hits, decays with friction
    pub knockback: Vec2,
    /// Post-hit invulnerability (seconds left)
    pub hit_flash: f32,
    /// Stun time left
    pub stun: f32,
    /// Sim time of the last volley
    pub last_shot: f32,
}

impl Default for Enemy {
    fn default() -> Self {
        Self::new()
    }
}

impl Enemy {
    pub fn new() -> Self {
        Self {
            id: 0,
            kind: EnemyKind::Basic,
            active: false,
            pos: Vec2::ZERO,
            hp: 0.0,
            max_hp: 0.0,
            speed: 0.0,
            radius: ENEMY_BASE_RADIUS,
            mass: 1.0,
            knockback: Vec2::ZERO,
            hit_flash: 0.0,
            stun: 0.0,
            last_shot: 0.0,
        }
    }

    /// Pool reset hook
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Bring a pooled instance to life with archetype stats scaled by difficulty
    pub fn spawn(&mut self, id: u32, kind: EnemyKind, pos: Vec2, hp_scale: f32, time: f32) {
        let arch = kind.archetype();
        self.id = id;
        self.kind = kind;
        self.active = true;
        self.pos = pos;
        self.max_hp = ENEMY_BASE_HP * arch.hp_mult * hp_scale;
        self.hp = self.max_hp;
        self.speed = ENEMY_BASE_SPEED * arch.speed_mult;
        self.radius = ENEMY_BASE_RADIUS * arch.size_mult;
        self.mass = arch.mass;
        self.knockback = Vec2::ZERO;
        self.hit_flash = 0.0;
        self.stun = 0.0;
        self.last_shot = time;
    }

    pub fn is_heavy(&self) -> bool {
        self.mass >= HEAVY_MASS
    }

    pub fn state(&self) -> EnemyState {
        if !self.active {
            EnemyState::Dead
        } else if self.stun > 0.0 {
            EnemyState::Stunned
        } else {
            EnemyState::Active
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::around(self.pos, self.radius)
    }

    /// Subtract HP. Returns true only on the hit that kills.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.active {
            return false;
        }
        self.hp = (self.hp - amount).max(0.0);
        self.hit_flash = ENEMY_HIT_FLASH;
        if self.hp <= 0.0 {
            self.active = false;
            return true;
        }
        false
    }

    pub fn apply_knockback(&mut self, force: Vec2) {
        if self.is_heavy() {
            return;
        }
        self.knockback += force / self.mass;
    }

    pub fn apply_stun(&mut self, duration: f32) {
        if self.is_heavy() {
            return;
        }
        self.stun = self.stun.max(duration);
    }

    /// Advance timers, knockback and archetype movement. Attacks are appended to `shots`.
    pub fn update(&mut self, player: Vec2, dt: f32, time: f32, shots: &mut Vec<EnemyShot>) {
        if !self.active {
            return;
        }

        if self.hit_flash > 0.0 {
            self.hit_flash = (self.hit_flash - dt).max(0.0);
        }

        if self.knockback.x.abs() > 1.0 || self.knockback.y.abs() > 1.0 {
            self.pos += self.knockback * dt;
            self.knockback -= self.knockback * (KNOCKBACK_FRICTION * dt).min(1.0);
        } else {
            self.knockback = Vec2::ZERO;
        }

        if self.stun > 0.0 {
            self.stun = (self.stun - dt).max(0.0);
            return;
        }

        // Being pushed
        if self.knockback.length() >= KNOCKBACK_PUSHED_SPEED {
            return;
        }

        let to_player = player - self.pos;
        let dist = to_player.length();

        match self.kind {
            EnemyKind::EliteShooter => {
                if dist > SHOOTER_KEEP_DISTANCE {
                    self.chase(to_player, dist, dt);
                }
                if time - self.last_shot >= SHOOTER_INTERVAL {
                    self.last_shot = time;
                    let aim = dir_to_angle(to_player);
                    for offset in [-SHOOTER_SPREAD, 0.0, SHOOTER_SPREAD] {
                        shots.push(EnemyShot {
                            origin: self.pos,
                            angle: aim + offset,
                            size: SHOOTER_BULLET_SIZE,
                        });
                    }
                }
            }
            EnemyKind::Boss => {
                self.chase(to_player, dist, dt);
                if time - self.last_shot >= BOSS_RING_INTERVAL {
                    self.last_shot = time;
                    // Rotate each ring so successive rings interleave
                    let phase = time % TAU;
                    let step = TAU / BOSS_RING_BULLETS as f32;
                    for i in 0..BOSS_RING_BULLETS {
                        shots.push(EnemyShot {
                            origin: self.pos,
                            angle: phase + i as f32 * step,
                            size: BOSS_BULLET_SIZE,
                        });
                    }
                }
            }
            _ => self.chase(to_player, dist, dt),
        }
    }

    fn chase(&mut self, to_player: Vec2, dist: f32, dt: f32) {
        if dist > 0.0 {
            self.pos += to_player / dist * self.speed * dt;
        }
    }
}

/// Push away from overlapping neighbours, scaled by overlap depth
pub fn separation_offset(pos: Vec2, radius: f32, neighbors: &[Vec2], dt: f32) -> Vec2 {
    let reach = radius * 2.0;
    let mut push = Vec2::ZERO;
    for &other in neighbors {
        let delta = pos - other;
        let dist = delta.length();
        if dist > 0.0 && dist < reach {
            push += delta / dist * ((reach - dist) / reach) * SEPARATION_FORCE * dt;
        }
    }
    push
}
