//! Wave director: timed spawn schedule and the boss phase
//!
//! Spawning -> Warning -> BossActive -> Victory. Regular spawns stop for good
//! once the boss phase begins.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;

use super::effects::LabelStyle;
use super::events::GameEvent;
use super::state::World;
use crate::angle_to_dir;
use crate::tuning::{BOSS_MINUTE, BOSS_WARNING_SECS, EnemyKind, WAVE_SCHEDULE, WaveSegment};

/// Distance outside the visible area at which enemies appear
const SPAWN_MARGIN: f32 = 50.0;
/// Boss appears this far above the top edge
const BOSS_SPAWN_MARGIN: f32 = 100.0;
const BOSS_TITLE: &str = "WARNING: BOSS APPROACHING";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DirectorState {
    Spawning,
    Warning { remaining: f32 },
    BossActive,
    Victory,
}

/// HP multiplier for regular spawns after `minutes` of play
pub fn hp_scale(minutes: f32) -> f32 {
    1.0 + 0.8 * minutes
}

/// Extra boss HP multiplier on top of its archetype
pub fn boss_hp_scale(minutes: f32) -> f32 {
    1.0 + 1.5 * minutes
}

/// Active schedule segment, or None once the boss phase is due
pub fn segment_at(minutes: f32) -> Option<(usize, &'static WaveSegment)> {
    WAVE_SCHEDULE.iter().enumerate().find(|(_, seg)| minutes < seg.until_minute)
}

/// Spawn ring radius: just beyond the viewport corners
pub fn spawn_radius(viewport: Vec2) -> f32 {
    viewport.length() / 2.0 + SPAWN_MARGIN
}

fn pick_kind(composition: &[(EnemyKind, f32)], roll: f32) -> EnemyKind {
    let mut acc = 0.0;
    for &(kind, weight) in composition {
        acc += weight;
        if roll < acc {
            return kind;
        }
    }
    composition.last().map_or(EnemyKind::Basic, |&(kind, _)| kind)
}

#[derive(Debug, Clone)]
pub struct WaveDirector {
    state: DirectorState,
    spawn_timer: f32,
    /// Last announced schedule segment
    segment: Option<usize>,
}

impl Default for WaveDirector {
    fn default() -> Self {
        Self::new()
    }
}

impl WaveDirector {
    pub fn new() -> Self {
        Self {
            state: DirectorState::Spawning,
            spawn_timer: 0.0,
            segment: None,
        }
    }

    pub fn state(&self) -> DirectorState {
        self.state
    }

    pub fn update(&mut self, dt: f32, world: &mut World, events: &mut Vec<GameEvent>) {
        let minutes = world.time / 60.0;
        match self.state {
            DirectorState::Spawning => {
                if minutes >= BOSS_MINUTE {
                    log::info!("Boss warning at {:.1}s", world.time);
                    self.state = DirectorState::Warning {
                        remaining: BOSS_WARNING_SECS,
                    };
                    events.push(GameEvent::WaveAnnounced {
                        title: BOSS_TITLE.to_string(),
                    });
                    events.push(GameEvent::BossWarning {
                        seconds: BOSS_WARNING_SECS,
                    });
                    return;
                }
                let Some((idx, segment)) = segment_at(minutes) else {
                    return;
                };
                if self.segment != Some(idx) {
                    self.segment = Some(idx);
                    log::info!("{}", segment.title);
                    events.push(GameEvent::WaveAnnounced {
                        title: segment.title.to_string(),
                    });
                }

                self.spawn_timer += dt;
                if self.spawn_timer >= segment.spawn_interval {
                    self.spawn_timer = 0.0;
                    spawn_regular(world, segment, minutes);
                }
            }
            DirectorState::Warning { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.state = DirectorState::Warning { remaining };
                    return;
                }
                let max_hp = spawn_boss(world, minutes);
                self.state = DirectorState::BossActive;
                events.push(GameEvent::BossSpawned { max_hp });
            }
            DirectorState::BossActive => {
                if world.boss_defeated {
                    self.state = DirectorState::Victory;
                    log::info!("Victory with score {}", world.player.score);
                    events.push(GameEvent::Victory {
                        score: world.player.score,
                    });
                }
            }
            DirectorState::Victory => {}
        }
    }
}

fn spawn_regular(world: &mut World, segment: &WaveSegment, minutes: f32) {
    let angle = world.rng.random::<f32>() * TAU;
    let roll: f32 = world.rng.random();
    let kind = pick_kind(segment.composition, roll);
    let pos = world.player.pos + angle_to_dir(angle) * spawn_radius(world.viewport);
    let id = world.spawn_enemy(kind, pos, hp_scale(minutes));
    log::debug!("Spawned {:?} #{} at {:.0},{:.0}", kind, id, pos.x, pos.y);
}

/// Place the boss above the visible area. Returns its max HP.
fn spawn_boss(world: &mut World, minutes: f32) -> f32 {
    let pos = world.player.pos - Vec2::new(0.0, world.viewport.y / 2.0 + BOSS_SPAWN_MARGIN);
    let id = world.spawn_enemy(EnemyKind::Boss, pos, boss_hp_scale(minutes));
    let max_hp = world
        .enemies
        .iter()
        .find(|e| e.id == id)
        .map_or(0.0, |e| e.max_hp);
    world.spawn_label(pos, "BOSS!", LabelStyle::Notice);
    log::info!("Boss spawned with {max_hp:.0} HP");
    max_hp
}
