use echoforest::autoplay::Autoplayer;
use echoforest::config::{GameConfig, DEFAULT_CONFIG_PATH};
use echoforest::core::audio::LoggingAudio;
use echoforest::core::clock::{Clock, ManualClock};
use echoforest::core::visual::LoggingVisual;
use echoforest::game::judgment::SessionStats;
use echoforest::game::session::{GameSession, SessionEvent};
use log::{error, info, LevelFilter};
use serde::Serialize;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

/// Simulated seconds the driver waits on the game-over screen before resuming.
const RESUME_DELAY_SECS: f64 = 2.0;

#[derive(Debug, Serialize)]
struct RunReport {
    generated_at: String,
    config_path: String,
    seed: u64,
    policy: String,
    system_bpm: f64,
    main_bpm: f64,
    simulated_secs: f64,
    frames: u64,
    monsters_alive: usize,
    trust_failures: u32,
    stats: SessionStats,
}

fn main() -> Result<(), Box<dyn Error>> {
    // --- Logging Setup ---
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .filter_module("echoforest::game::timing", LevelFilter::Info)
        .filter_module("echoforest::game::turn", LevelFilter::Info)
        .filter_module("echoforest::core::audio", LevelFilter::Warn)
        .init();

    info!("Headless session starting...");

    // --- Configuration ---
    let config_path = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = match GameConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config '{}': {}", config_path.display(), e);
            return Err(e.into());
        }
    };
    let seed = *config.session.seed.get_or_insert_with(rand::random::<u64>);
    let driver = config.driver.clone();
    info!("Seed {} ({} s at {} fps)", seed, driver.duration_secs, driver.frame_rate);

    // --- Session ---
    let mut session = GameSession::new(config.session, LoggingAudio::new(config.sounds), LoggingVisual);
    let mut player = Autoplayer::new(seed.wrapping_add(1), driver.slip_chance);
    let clock = ManualClock::new(0.0);
    session.start(clock.now());

    // --- Main Loop ---
    let dt = 1.0 / driver.frame_rate as f64;
    let frames = (driver.duration_secs * driver.frame_rate as f64).ceil() as u64;
    let mut resume_at: Option<f64> = None;
    for _ in 0..frames {
        let now = clock.advance(dt);
        if resume_at.is_some_and(|t| now >= t) {
            session.resume(now);
            resume_at = None;
        }
        for (command, source) in player.plan(&session, now) {
            session.queue_command(command, source, now);
        }
        for event in session.update(now, dt as f32) {
            match event {
                SessionEvent::GameOver => {
                    info!("Game over at {:.2}s, resuming in {:.0}s", now, RESUME_DELAY_SECS);
                    resume_at = Some(now + RESUME_DELAY_SECS);
                }
                SessionEvent::Escaped(id) => info!("{} escaped at {:.2}s", id, now),
                _ => {}
            }
        }
    }

    // --- Report ---
    let report = RunReport {
        generated_at: chrono::Utc::now().to_rfc3339(),
        config_path: config_path.display().to_string(),
        seed,
        policy: session.selector().policy().to_string(),
        system_bpm: session.clock().system_bpm(),
        main_bpm: session.clock().main_bpm(),
        simulated_secs: clock.now(),
        frames,
        monsters_alive: session.roster().len(),
        trust_failures: session.meter().failure_count(),
        stats: session.stats().clone(),
    };
    let json = serde_json::to_string_pretty(&report)?;
    match &driver.report_path {
        Some(path) => {
            fs::write(path, &json)?;
            info!("Report written to '{}'.", path);
        }
        None => println!("{}", json),
    }

    info!(
        "Session finished: {} hits ({:.0}% perfect), {} misses, {} defeated.",
        report.stats.hits(),
        report.stats.perfect_ratio() * 100.0,
        report.stats.misses(),
        report.stats.defeated
    );
    Ok(())
}
