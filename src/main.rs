//! Bullet Heaven headless driver
//!
//! Plays one scripted run against the simulation core: the player circles the
//! spawn point, every level-up takes the first offered option, and the run
//! ends on death or after the time limit. Usage:
//!
//! `bullet-heaven [settings.json] [profile.json] [seconds]`

use std::path::PathBuf;

use bullet_heaven::consts::SIM_DT;
use bullet_heaven::persistence::FileStorage;
use bullet_heaven::{GameEvent, GamePhase, Settings, Simulation};
use glam::Vec2;
use rand::random;

const DEFAULT_RUN_SECONDS: f32 = 600.0;
/// Radians per step of the scripted circle
const CIRCLE_RATE: f32 = 0.01;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Bullet Heaven (headless) starting...");

    let mut args = std::env::args().skip(1);
    let settings_path = PathBuf::from(args.next().unwrap_or_else(|| "settings.json".to_string()));
    let profile_path = PathBuf::from(args.next().unwrap_or_else(|| "profile.json".to_string()));
    let run_seconds = args
        .next()
        .and_then(|s| s.parse::<f32>().ok())
        .unwrap_or(DEFAULT_RUN_SECONDS);

    let settings = Settings::load(&settings_path);
    let seed = settings.seed.unwrap_or_else(random);
    log::info!("Seed {seed}, quality {}", settings.quality.as_str());

    let mut angle = 0.0_f32;
    let circle = move || {
        angle += CIRCLE_RATE;
        Vec2::from_angle(angle)
    };
    let storage = FileStorage::new(profile_path);
    let mut sim = Simulation::with_storage(settings, seed, Box::new(storage)).with_movement(circle);
    log::info!(
        "Profile: {} gold, high score {}",
        sim.profile().gold,
        sim.profile().high_score
    );

    sim.start();
    let max_frames = (run_seconds / SIM_DT) as u64;
    for _ in 0..max_frames {
        sim.frame(SIM_DT);
        for event in sim.drain_events() {
            report(&event);
        }

        if let Some(choice) = sim.pending_options().and_then(|o| o.first()).cloned() {
            sim.apply_upgrade(&choice);
        }
        if sim.phase() == GamePhase::GameOver {
            break;
        }
    }

    if sim.phase() != GamePhase::GameOver {
        log::info!("Time limit reached");
        sim.stop();
        for event in sim.drain_events() {
            report(&event);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Headless driver is native only
}

fn report(event: &GameEvent) {
    match event {
        GameEvent::Stats(_) => {}
        GameEvent::LevelUp { options } => {
            let titles: Vec<&str> = options.iter().map(|o| o.title.as_str()).collect();
            log::info!("Level up! Options: {}", titles.join(" | "));
        }
        GameEvent::WaveAnnounced { title } => log::info!("{title}"),
        GameEvent::BossSpawned { max_hp } => log::info!("Boss arrived with {max_hp:.0} HP"),
        GameEvent::Victory { score } => log::info!("Boss defeated! Score {score}"),
        GameEvent::RunEnded {
            score,
            gold,
            high_score,
        } => {
            println!("Run over: score {score}, gold {gold}, high score {high_score}");
        }
        other => log::debug!("{other:?}"),
    }
}
