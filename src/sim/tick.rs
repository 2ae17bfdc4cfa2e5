//! Top-level run driver
//!
//! `Simulation` owns one run's world, loadout and wave director, advances them
//! in a fixed per-step order and exposes the small command surface a frontend
//! needs. Everything here is single-threaded; the only outside inputs are the
//! movement source and upgrade selections made while paused.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::collision::resolve_collisions;
use super::events::{GameEvent, StatsSnapshot};
use super::progression::{self, Loadout, UpgradeOption};
use super::state::{GamePhase, World};
use super::wave::WaveDirector;
use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::persistence::{MemoryStorage, PersistedProfile, Storage, load_profile, save_profile};
use crate::settings::Settings;

/// Supplies the player's desired movement once per step
pub trait MovementSource {
    fn movement(&mut self) -> Vec2;
}

impl<F: FnMut() -> Vec2> MovementSource for F {
    fn movement(&mut self) -> Vec2 {
        self()
    }
}

/// Standing still
struct Idle;

impl MovementSource for Idle {
    fn movement(&mut self) -> Vec2 {
        Vec2::ZERO
    }
}

/// Converts real frame time into whole fixed steps
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    accumulator: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a real frame delta and return how many steps to run.
    /// Leftover debt beyond the substep cap is dropped.
    pub fn advance(&mut self, real_dt: f32) -> u32 {
        self.accumulator += real_dt.clamp(0.0, MAX_FRAME_DT);
        let mut steps = 0;
        while self.accumulator >= SIM_DT && steps < MAX_SUBSTEPS {
            self.accumulator -= SIM_DT;
            steps += 1;
        }
        if steps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(SIM_DT);
        }
        steps
    }

    /// Forget accumulated time (after start or resume)
    pub fn rebase(&mut self) {
        self.accumulator = 0.0;
    }

    pub fn pending(&self) -> f32 {
        self.accumulator
    }
}

pub struct Simulation {
    settings: Settings,
    /// Derives one world seed per run
    seeder: Pcg32,
    world: World,
    loadout: Loadout,
    director: WaveDirector,
    profile: PersistedProfile,
    storage: Box<dyn Storage>,
    movement: Box<dyn MovementSource>,
    events: Vec<GameEvent>,
    /// Choices offered at the last level-up, until one is applied
    pending_options: Option<Vec<UpgradeOption>>,
    phase: GamePhase,
    last_stats: Option<StatsSnapshot>,
    clock: FrameClock,
}

impl Simulation {
    /// New simulation with in-memory profile storage
    pub fn new(settings: Settings, seed: u64) -> Self {
        Self::with_storage(settings, seed, Box::new(MemoryStorage::default()))
    }

    /// New simulation whose profile is loaded from (and saved to) `storage`
    pub fn with_storage(settings: Settings, seed: u64, storage: Box<dyn Storage>) -> Self {
        let profile = load_profile(storage.as_ref());
        let mut seeder = Pcg32::seed_from_u64(seed);
        let loadout = Loadout::from_profile(&profile);
        let world = World::new(&settings, seeder.random(), loadout.derived_stats());
        Self {
            settings,
            seeder,
            world,
            loadout,
            director: WaveDirector::new(),
            profile,
            storage,
            movement: Box::new(Idle),
            events: Vec::new(),
            pending_options: None,
            phase: GamePhase::Start,
            last_stats: None,
            clock: FrameClock::new(),
        }
    }

    pub fn with_movement(mut self, source: impl MovementSource + 'static) -> Self {
        self.movement = Box::new(source);
        self
    }

    pub fn set_movement(&mut self, source: impl MovementSource + 'static) {
        self.movement = Box::new(source);
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn loadout(&self) -> &Loadout {
        &self.loadout
    }

    pub fn profile(&self) -> &PersistedProfile {
        &self.profile
    }

    /// Meta progression edits (shop, equipment) between runs.
    /// Call `save` afterwards to persist them.
    pub fn profile_mut(&mut self) -> &mut PersistedProfile {
        &mut self.profile
    }

    pub fn save(&mut self) {
        if let Err(e) = save_profile(self.storage.as_mut(), &self.profile) {
            log::warn!("Failed to save profile: {e}");
        }
    }

    pub fn pending_options(&self) -> Option<&[UpgradeOption]> {
        self.pending_options.as_deref()
    }

    /// Take every event queued since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn set_phase(&mut self, phase: GamePhase) {
        if self.phase != phase {
            log::debug!("Phase {:?} -> {:?}", self.phase, phase);
            self.phase = phase;
            self.events.push(GameEvent::PhaseChanged(phase));
        }
    }

    /// Begin a fresh run. Ignored while a run is in progress.
    pub fn start(&mut self) {
        if !matches!(self.phase, GamePhase::Start | GamePhase::GameOver) {
            return;
        }
        self.world.clear();
        self.loadout = Loadout::from_profile(&self.profile);
        self.world = World::new(&self.settings, self.seeder.random(), self.loadout.derived_stats());
        self.director = WaveDirector::new();
        self.pending_options = None;
        self.last_stats = None;
        self.clock.rebase();
        log::info!(
            "Run started with {} ({} items equipped)",
            self.loadout.weapons.first().map_or("nothing", |w| w.kind.name()),
            self.loadout.items.len()
        );
        self.set_phase(GamePhase::Playing);
        self.emit_stats();
    }

    /// End the run: bank currency, record the score and save the profile.
    /// Safe to call more than once; only the first call has an effect.
    pub fn stop(&mut self) {
        if matches!(self.phase, GamePhase::Start | GamePhase::GameOver) {
            return;
        }
        let score = self.world.player.score;
        let gold = self.world.run_gold;
        if self.profile.record_run(score, gold) {
            log::info!("New high score: {score}");
        }
        log::info!(
            "Game over at {:.1}s: score {score}, {gold} gold, {} kills",
            self.world.time,
            self.world.kills
        );
        self.save();

        self.world.clear();
        self.pending_options = None;
        self.events.push(GameEvent::RunEnded {
            score,
            gold,
            high_score: self.profile.high_score,
        });
        self.set_phase(GamePhase::GameOver);
    }

    /// Flip between playing and paused. Refused while an upgrade is pending.
    pub fn toggle_pause(&mut self) {
        match self.phase {
            GamePhase::Playing => self.set_phase(GamePhase::Paused),
            GamePhase::Paused => self.resume(),
            _ => {}
        }
    }

    pub fn resume(&mut self) {
        if self.phase != GamePhase::Paused || self.pending_options.is_some() {
            return;
        }
        self.clock.rebase();
        self.set_phase(GamePhase::Playing);
    }

    /// Apply one of the pending level-up choices and resume play
    pub fn apply_upgrade(&mut self, option: &UpgradeOption) -> bool {
        let offered = self
            .pending_options
            .as_ref()
            .is_some_and(|options| options.contains(option));
        if !offered {
            log::warn!("Ignoring upgrade {} that was not offered", option.id);
            return false;
        }
        let applied = progression::apply_upgrade(option, &mut self.loadout, &mut self.world);
        if applied {
            log::info!("Chose {}", option.title);
        }
        self.pending_options = None;
        self.resume();
        self.emit_stats();
        applied
    }

    /// Advance by real elapsed time using fixed steps.
    /// Returns the number of steps run.
    pub fn frame(&mut self, real_dt: f32) -> u32 {
        if self.phase != GamePhase::Playing {
            return 0;
        }
        let steps = self.clock.advance(real_dt);
        for i in 0..steps {
            if self.phase != GamePhase::Playing {
                // Level-up or death mid-frame: drop the remaining steps
                self.clock.rebase();
                return i;
            }
            self.update(SIM_DT);
        }
        steps
    }

    /// One simulation step
    pub fn update(&mut self, dt: f32) {
        if self.phase != GamePhase::Playing {
            return;
        }
        let world = &mut self.world;
        let mut movement = self.movement.movement();
        if movement.length_squared() > 1.0 {
            movement = movement.normalize();
        }
        world.movement = movement;
        world.step_player(dt);

        world.rebuild_index();
        for weapon in &mut self.loadout.weapons {
            weapon.update(dt, world);
        }

        world.update_enemies(dt);
        world.update_poison(dt);
        world.update_projectiles(dt);
        world.update_pickups(dt);
        world.update_effects(dt);

        resolve_collisions(world);

        if world.player.is_dead() {
            self.stop();
            return;
        }

        self.director.update(dt, &mut self.world, &mut self.events);
        self.world.compact();

        if progression::level_up_ready(&self.world.player) {
            self.level_up();
        }
        self.emit_stats();
    }

    fn level_up(&mut self) {
        progression::grant_level(&mut self.world.player);
        let options = progression::generate_options(&self.loadout, &mut self.world.rng);
        log::debug!(
            "Offering {}",
            options.iter().map(|o| o.id.as_str()).collect::<Vec<_>>().join(", ")
        );
        self.events.push(GameEvent::LevelUp {
            options: options.clone(),
        });
        self.pending_options = Some(options);
        self.set_phase(GamePhase::Paused);
    }

    /// Queue a HUD snapshot if anything visible changed
    fn emit_stats(&mut self) {
        let snapshot = StatsSnapshot::capture(&self.world);
        if self.last_stats.as_ref() != Some(&snapshot) {
            self.last_stats = Some(snapshot.clone());
            self.events.push(GameEvent::Stats(snapshot));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::EnemyKind;
    use crate::sim::pickup::PickupKind;
    use crate::sim::progression::UpgradeKind;
    use crate::sim::weapon::WeaponKind;
    use crate::tuning::PassiveKind;

    fn playing(seed: u64) -> Simulation {
        let mut sim = Simulation::new(Settings::default(), seed);
        sim.start();
        sim.drain_events();
        sim
    }

    fn level_ups(events: &[GameEvent]) -> Vec<&Vec<UpgradeOption>> {
        events
            .iter()
            .filter_map(|e| match e {
                GameEvent::LevelUp { options } => Some(options),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_frame_clock_caps_substeps() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(SIM_DT * 0.5), 0);
        assert_eq!(clock.advance(SIM_DT * 0.6), 1);
        // Clamped to MAX_FRAME_DT = 6 steps at 60 Hz
        assert_eq!(clock.advance(10.0), 6);
        clock.rebase();
        assert_eq!(clock.pending(), 0.0);
    }

    #[test]
    fn test_start_emits_playing() {
        let mut sim = Simulation::new(Settings::default(), 12345);
        assert_eq!(sim.phase(), GamePhase::Start);
        sim.update(SIM_DT);
        assert_eq!(sim.world().time, 0.0);

        sim.start();
        assert_eq!(sim.phase(), GamePhase::Playing);
        let events = sim.drain_events();
        assert!(events.contains(&GameEvent::PhaseChanged(GamePhase::Playing)));
        assert!(events.iter().any(|e| matches!(e, GameEvent::Stats(_))));
        assert_eq!(sim.loadout().weapons[0].kind, WeaponKind::Pistol);
    }

    #[test]
    fn test_determinism() {
        let mut a =
            Simulation::new(Settings::default(), 99999).with_movement(|| Vec2::new(1.0, 0.5));
        let mut b =
            Simulation::new(Settings::default(), 99999).with_movement(|| Vec2::new(1.0, 0.5));
        a.start();
        b.start();
        for _ in 0..600 {
            a.update(SIM_DT);
            b.update(SIM_DT);
        }
        assert_eq!(a.world().player.pos, b.world().player.pos);
        assert_eq!(a.world().active_enemies(), b.world().active_enemies());
        assert_eq!(a.world().kills, b.world().kills);
        assert_eq!(a.drain_events(), b.drain_events());
    }

    #[test]
    fn test_movement_is_normalized() {
        let mut sim = playing(1).with_movement(|| Vec2::new(3.0, 4.0));
        sim.update(SIM_DT);
        let moved = sim.world().player.pos.length();
        let expected = sim.world().player.speed() * SIM_DT;
        assert!((moved - expected).abs() < 1e-3);
    }

    #[test]
    fn test_pause_stops_time() {
        let mut sim = playing(12345);
        sim.update(SIM_DT);
        let t = sim.world().time;

        sim.toggle_pause();
        assert_eq!(sim.phase(), GamePhase::Paused);
        sim.update(SIM_DT);
        assert_eq!(sim.frame(0.05), 0);
        assert_eq!(sim.world().time, t);

        sim.toggle_pause();
        assert_eq!(sim.phase(), GamePhase::Playing);
        sim.update(SIM_DT);
        assert!(sim.world().time > t);
    }

    #[test]
    fn test_frame_runs_fixed_steps() {
        let mut sim = playing(7);
        assert_eq!(sim.frame(SIM_DT * 3.5), 3);
        assert!((sim.world().time - SIM_DT * 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_pistol_single_hit() {
        let mut sim = playing(12345);
        sim.world.player.stats.crit_rate = 0.0;
        sim.world.spawn_enemy(EnemyKind::Basic, Vec2::new(200.0, 0.0), 100.0);
        let start_hp = sim.world.enemies[0].hp;

        // First volley fires on the first step; the next waits out the cooldown
        for _ in 0..45 {
            sim.update(SIM_DT);
        }
        let expected = (12.0 * sim.world.player.stats.multipliers.damage).floor();
        let enemy = &sim.world.enemies[0];
        assert!(enemy.active);
        assert_eq!(start_hp - enemy.hp, expected);
        assert!(sim.world.projectiles.is_empty());
    }

    #[test]
    fn test_xp_level_up_pauses_with_three_options() {
        let mut sim = playing(12345);
        sim.world.player.stats.multipliers.gain = 1.0;
        sim.world.player.xp = 90.0;
        sim.world.player.hp = 40.0;
        let pos = sim.world.player.pos;
        sim.world.spawn_pickup(PickupKind::Experience, pos, 20.0, Vec2::ZERO);

        sim.update(SIM_DT);

        let p = &sim.world().player;
        assert_eq!(p.level, 2);
        assert!((p.xp - 10.0).abs() < 1e-4);
        assert_eq!(p.max_xp, 120);
        assert_eq!(p.hp, p.max_hp());
        assert_eq!(sim.phase(), GamePhase::Paused);

        let events = sim.drain_events();
        let offers = level_ups(&events);
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].len(), 3);
        assert!(events.contains(&GameEvent::PhaseChanged(GamePhase::Paused)));
    }

    #[test]
    fn test_pending_choice_blocks_resume() {
        let mut sim = playing(12345);
        sim.world.player.xp = sim.world.player.max_xp as f32;
        sim.update(SIM_DT);
        assert_eq!(sim.phase(), GamePhase::Paused);

        sim.toggle_pause();
        sim.resume();
        assert_eq!(sim.phase(), GamePhase::Paused);

        let option = sim.pending_options().map(|o| o[0].clone());
        let Some(option) = option else {
            panic!("level-up should leave options pending");
        };
        assert!(sim.apply_upgrade(&option));
        assert_eq!(sim.phase(), GamePhase::Playing);
        assert!(sim.pending_options().is_none());

        // Second use of the same option is refused
        assert!(!sim.apply_upgrade(&option));
    }

    #[test]
    fn test_evolution_offered_only_when_ready() {
        let mut sim = playing(12345);
        while sim.loadout.weapons[0].upgrade() {}
        sim.world.player.xp = sim.world.player.max_xp as f32;
        sim.update(SIM_DT);
        let options = sim.pending_options().map(|o| o.to_vec()).unwrap_or_default();
        assert!(options.iter().all(|o| !matches!(o.kind, UpgradeKind::Evolution { .. })));

        let mut sim = playing(12345);
        sim.loadout.weapons = vec![crate::sim::weapon::Weapon::new(WeaponKind::Molotov)];
        while sim.loadout.weapons[0].upgrade() {}
        sim.loadout.passives.insert(PassiveKind::HeFuel, 1);
        sim.world.player.xp = sim.world.player.max_xp as f32;
        sim.update(SIM_DT);
        let options = sim.pending_options().map(|o| o.to_vec()).unwrap_or_default();
        let evo = options.iter().find(|o| matches!(o.kind, UpgradeKind::Evolution { .. }));
        let Some(evo) = evo.cloned() else {
            panic!("evolution should be offered");
        };
        assert!(sim.apply_upgrade(&evo));
        assert_eq!(sim.loadout().weapons.len(), 1);
        assert_eq!(sim.loadout().weapons[0].kind, WeaponKind::Inferno);
    }

    #[test]
    fn test_death_ends_run_once_and_saves() {
        let mut sim = playing(12345);
        sim.world.run_gold = 42;
        sim.world.player.score = 1000;
        sim.world.player.hp = 0.0;

        sim.update(SIM_DT);
        assert_eq!(sim.phase(), GamePhase::GameOver);
        sim.stop();
        sim.update(SIM_DT);

        let events = sim.drain_events();
        let ended: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, GameEvent::RunEnded { .. }))
            .collect();
        assert_eq!(ended.len(), 1);
        assert_eq!(
            ended[0],
            &GameEvent::RunEnded {
                score: 1000,
                gold: 42,
                high_score: 1000
            }
        );
        assert_eq!(sim.profile().gold, 42);
        assert_eq!(sim.world().active_enemies(), 0);

        let saved = load_profile(sim.storage.as_ref());
        assert_eq!(saved.high_score, 1000);
        assert_eq!(saved.gold, 42);
    }

    #[test]
    fn test_restart_after_game_over() {
        let mut sim = playing(12345);
        for _ in 0..120 {
            sim.update(SIM_DT);
        }
        sim.stop();
        sim.start();
        assert_eq!(sim.phase(), GamePhase::Playing);
        assert_eq!(sim.world().time, 0.0);
        assert_eq!(sim.world().player.level, 1);
        assert_eq!(sim.world().active_enemies(), 0);
    }

    #[test]
    fn test_profile_loaded_from_storage() {
        let stored = r#"{"gold": 900, "highScore": 50, "equippedItems": {"weapon": "katana"}}"#;
        let storage = MemoryStorage::with_contents(stored);
        let mut sim = Simulation::with_storage(Settings::default(), 1, Box::new(storage));
        assert_eq!(sim.profile().gold, 900);
        sim.start();
        assert_eq!(sim.loadout().weapons[0].kind, WeaponKind::Katana);
    }
}
