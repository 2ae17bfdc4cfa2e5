//! Bullet Heaven - simulation core for a top-down survival auto-shooter
//!
//! Core modules:
//! - `sim`: Fixed-step simulation (entities, weapons, combat, waves, progression)
//! - `tuning`: Data-driven game balance (archetypes, items, passives, recipes)
//! - `persistence`: Profile load/save with merge-onto-defaults
//! - `settings`: Run configuration (viewport, quality, seed)

pub mod persistence;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use persistence::{PersistedProfile, Storage};
pub use settings::{QualityPreset, Settings};
pub use sim::{GameEvent, GamePhase, Simulation};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest real frame delta fed into the accumulator
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Player defaults
    pub const PLAYER_BASE_HP: f32 = 100.0;
    pub const PLAYER_BASE_SPEED: f32 = 300.0;
    pub const PLAYER_BASE_MAGNET: f32 = 150.0;
    pub const PLAYER_BASE_MAX_XP: u32 = 100;
    pub const PLAYER_BASE_CRIT_RATE: f32 = 0.1;
    pub const PLAYER_BASE_CRIT_DAMAGE: f32 = 1.5;
    /// Player hitbox radius (sprite is 40px wide)
    pub const PLAYER_RADIUS: f32 = 20.0;
    /// Invulnerability window after taking a hit
    pub const PLAYER_HIT_FLASH: f32 = 0.2;
    /// XP curve growth per level
    pub const XP_GROWTH: f32 = 1.2;

    /// Enemy defaults (scaled per archetype)
    pub const ENEMY_BASE_HP: f32 = 10.0;
    pub const ENEMY_BASE_SPEED: f32 = 100.0;
    pub const ENEMY_BASE_RADIUS: f32 = 16.0;
    /// Mass at or above which knockback and stun are ignored
    pub const HEAVY_MASS: f32 = 50.0;
    pub const ENEMY_HIT_FLASH: f32 = 0.08;
    pub const KNOCKBACK_FRICTION: f32 = 5.0;
    /// Knockback speed above which AI movement is skipped
    pub const KNOCKBACK_PUSHED_SPEED: f32 = 50.0;
    pub const SEPARATION_FORCE: f32 = 300.0;
    pub const CONTACT_DAMAGE: f32 = 5.0;

    /// Enemy bullets
    pub const ENEMY_BULLET_DAMAGE: f32 = 5.0;
    pub const ENEMY_BULLET_LIFETIME: f32 = 4.0;

    /// Pickups
    pub const PICKUP_RADIUS: f32 = 4.0;
    pub const MAGNET_START_SPEED: f32 = 400.0;
    pub const MAGNET_ACCEL: f32 = 800.0;
    pub const PICKUP_FRICTION: f32 = 5.0;

    /// Run-wide limits
    pub const MAX_WEAPON_SLOTS: usize = 4;
    pub const MAX_PASSIVE_SLOTS: usize = 6;
    pub const MAX_WEAPON_LEVEL: u32 = 5;
    pub const MAX_POISON_ZONES: usize = 30;
    pub const UPGRADE_CHOICES: usize = 3;

    /// Spatial index node capacity before splitting
    pub const QUADTREE_CAPACITY: usize = 4;
    /// Extra reach added to collision queries (enemies move after the index is built)
    pub const QUERY_MARGIN: f32 = 24.0;
}

/// Unit vector for an angle in radians
#[inline]
pub fn angle_to_dir(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}

/// Angle of a direction vector in radians
#[inline]
pub fn dir_to_angle(dir: Vec2) -> f32 {
    dir.y.atan2(dir.x)
}

/// Whether two circles overlap (strict)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let reach = ra + rb;
    a.distance_squared(b) < reach * reach
}
