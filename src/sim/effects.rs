//! Short-lived effects: particles, floating damage labels, lightning arcs
//! and poison puddles
//!
//! Particles and labels are cosmetic. Poison zones hurt the player.

use glam::Vec2;
use rand::Rng;

use crate::angle_to_dir;

pub const PARTICLE_DECAY: f32 = 2.0;
pub const PARTICLES_PER_BURST: usize = 4;

pub const LABEL_LIFETIME: f32 = 0.8;
pub const LABEL_GRAVITY: f32 = 1000.0;

pub const ARC_LIFETIME: f32 = 0.15;

pub const POISON_SIZE: f32 = 120.0;
pub const POISON_DURATION: f32 = 4.0;
pub const POISON_DAMAGE: f32 = 2.0;
pub const POISON_INTERVAL: f32 = 0.5;

/// Visual particle (not gameplay-affecting)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub active: bool,
    pub pos: Vec2,
    pub vel: Vec2,
    /// 1.0 at spawn, fades to 0.0
    pub life: f32,
    pub color: u32,
}

impl Particle {
    const DEAD: Particle = Particle {
        active: false,
        pos: Vec2::ZERO,
        vel: Vec2::ZERO,
        life: 0.0,
        color: 0,
    };

    pub fn update(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        self.pos += self.vel * dt;
        self.life -= PARTICLE_DECAY * dt;
        if self.life <= 0.0 {
            self.active = false;
        }
    }
}

/// Fixed-size particle buffer; bursts are dropped once it is full
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<Particle>,
}

impl ParticleField {
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: vec![Particle::DEAD; capacity],
        }
    }

    pub fn burst(&mut self, pos: Vec2, color: u32, rng: &mut impl Rng) {
        let mut remaining = PARTICLES_PER_BURST;
        for p in self.particles.iter_mut().filter(|p| !p.active) {
            if remaining == 0 {
                break;
            }
            let angle = rng.random::<f32>() * std::f32::consts::TAU;
            let speed = rng.random_range(100.0f32..200.0);
            *p = Particle {
                active: true,
                pos,
                vel: angle_to_dir(angle) * speed,
                life: 1.0,
                color,
            };
            remaining -= 1;
        }
    }

    pub fn update(&mut self, dt: f32) {
        for p in &mut self.particles {
            p.update(dt);
        }
    }

    pub fn clear(&mut self) {
        self.particles.fill(Particle::DEAD);
    }

    pub fn active(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.active)
    }
}

/// How a floating label should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStyle {
    Damage,
    Critical,
    Chain,
    Heal,
    PlayerHit,
    Notice,
}

/// Floating combat text that hops up and falls
#[derive(Debug, Clone)]
pub struct DamageLabel {
    pub active: bool,
    pub pos: Vec2,
    pub vel: Vec2,
    pub text: String,
    pub style: LabelStyle,
    pub life: f32,
}

impl Default for DamageLabel {
    fn default() -> Self {
        Self::new()
    }
}

impl DamageLabel {
    pub fn new() -> Self {
        Self {
            active: false,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            text: String::new(),
            style: LabelStyle::Damage,
            life: 0.0,
        }
    }

    /// Pool reset hook; keeps the text buffer
    pub fn reset(&mut self) {
        self.active = false;
        self.text.clear();
        self.life = 0.0;
        self.vel = Vec2::ZERO;
    }

    pub fn spawn(&mut self, pos: Vec2, text: &str, style: LabelStyle, rng: &mut impl Rng) {
        self.active = true;
        self.pos = pos;
        self.text.clear();
        self.text.push_str(text);
        self.style = style;
        self.life = LABEL_LIFETIME;
        let mut hop = -300.0 - rng.random::<f32>() * 100.0;
        if style == LabelStyle::Critical {
            hop -= 100.0;
        }
        self.vel = Vec2::new((rng.random::<f32>() - 0.5) * 100.0, hop);
    }

    pub fn update(&mut self, dt: f32) {
        if !self.active {
            return;
        }
        self.vel.y += LABEL_GRAVITY * dt;
        self.pos += self.vel * dt;
        self.life -= dt;
        if self.life <= 0.0 {
            self.active = false;
        }
    }
}

/// One visible lightning hop
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightningArc {
    pub from: Vec2,
    pub to: Vec2,
    pub life: f32,
}

impl LightningArc {
    pub fn new(from: Vec2, to: Vec2) -> Self {
        Self {
            from,
            to,
            life: ARC_LIFETIME,
        }
    }
}

/// Puddle left by a dead poisoner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoisonZone {
    pub pos: Vec2,
    /// Diameter
    pub size: f32,
    pub life: f32,
    /// Sim time of the last tick on the player
    pub last_tick: Option<f32>,
}

impl PoisonZone {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            size: POISON_SIZE,
            life: POISON_DURATION,
            last_tick: None,
        }
    }

    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }

    /// Whether a damage tick is due at `now`; records it if so
    pub fn try_tick(&mut self, now: f32) -> bool {
        if self.last_tick.is_none_or(|t| now - t >= POISON_INTERVAL) {
            self.last_tick = Some(now);
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_burst_respects_capacity() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut field = ParticleField::new(6);
        field.burst(Vec2::ZERO, 0xffffff, &mut rng);
        field.burst(Vec2::ZERO, 0xffffff, &mut rng);
        assert_eq!(field.active().count(), 6);

        // Fades out after half a second at decay 2.0
        for _ in 0..40 {
            field.update(0.016);
        }
        assert_eq!(field.active().count(), 0);
    }

    #[test]
    fn test_crit_label_hops_higher() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut label = DamageLabel::new();
        label.spawn(Vec2::ZERO, "99", LabelStyle::Critical, &mut rng);
        assert!(label.vel.y <= -400.0);
        assert_eq!(label.text, "99");

        for _ in 0..60 {
            label.update(0.016);
        }
        assert!(!label.active);
        label.reset();
        assert!(label.text.is_empty());
    }

    #[test]
    fn test_poison_ticks_on_interval() {
        let mut zone = PoisonZone::new(Vec2::ZERO);
        assert!(zone.try_tick(0.0));
        assert!(!zone.try_tick(0.3));
        assert!(zone.try_tick(0.5));
    }
}
