//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (entity vectors; hash maps only for keyed lookup,
//!   never iterated)
//! - No rendering or platform dependencies

pub mod collision;
pub mod effects;
pub mod enemy;
pub mod events;
pub mod pickup;
pub mod pool;
pub mod progression;
pub mod projectile;
pub mod spatial;
pub mod state;
pub mod stats;
pub mod tick;
pub mod wave;
pub mod weapon;

pub use events::{GameEvent, StatsSnapshot};
pub use progression::{Loadout, UpgradeKind, UpgradeOption};
pub use state::{GamePhase, Player, World};
pub use stats::{DerivedStats, Multipliers};
pub use tick::{FrameClock, MovementSource, Simulation};
pub use wave::{DirectorState, WaveDirector};
pub use weapon::{Weapon, WeaponKind};
