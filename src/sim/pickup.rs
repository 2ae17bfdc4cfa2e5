//! Loot pickups (gems, gold, potions, crates, chests, magnets)

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{MAGNET_ACCEL, MAGNET_START_SPEED, PICKUP_FRICTION, PICKUP_RADIUS};

/// Pop velocity below this is dropped to zero
const REST_SPEED: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    Experience,
    Gold,
    Potion,
    WeaponCrate,
    Chest,
    /// Pulls every XP gem on the field
    Magnet,
}

#[derive(Debug, Clone)]
pub struct Pickup {
    pub active: bool,
    pub kind: PickupKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub value: f32,
    pub magnetized: bool,
    /// Current homing speed while magnetized
    pub magnet_speed: f32,
}

impl Default for Pickup {
    fn default() -> Self {
        Self::new()
    }
}

impl Pickup {
    pub fn new() -> Self {
        Self {
            active: false,
            kind: PickupKind::Experience,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            value: 0.0,
            magnetized: false,
            magnet_speed: 0.0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn spawn(&mut self, kind: PickupKind, pos: Vec2, value: f32) {
        self.active = true;
        self.kind = kind;
        self.pos = pos;
        self.vel = Vec2::ZERO;
        self.value = value;
        self.magnetized = false;
        self.magnet_speed = 0.0;
    }

    pub fn radius(&self) -> f32 {
        PICKUP_RADIUS
    }

    pub fn magnetize(&mut self) {
        if !self.magnetized {
            self.magnetized = true;
            self.magnet_speed = MAGNET_START_SPEED;
        }
    }

    pub fn update(&mut self, player: Vec2, magnet_radius: f32, dt: f32) {
        if !self.active {
            return;
        }

        if !self.magnetized
            && self.kind == PickupKind::Experience
            && self.pos.distance(player) <= magnet_radius
        {
            self.magnetize();
        }

        if self.magnetized {
            let to_player = player - self.pos;
            let dist = to_player.length();
            self.magnet_speed += MAGNET_ACCEL * dt;
            if dist > 0.0 {
                let dir = to_player / dist;
                self.vel = dir * self.magnet_speed;
                self.pos += dir * (self.magnet_speed * dt).min(dist);
            }
        } else if self.vel != Vec2::ZERO {
            self.pos += self.vel * dt;
            self.vel -= self.vel * (PICKUP_FRICTION * dt).min(1.0);
            if self.vel.length() < REST_SPEED {
                self.vel = Vec2::ZERO;
            }
        }
    }
}
