use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use bomber_bot::config::{BotConfig, SimConfig};
use bomber_bot::game::arena::Arena;
use bomber_bot::game::constants::sim::DT;
use bomber_bot::game::systems::ai::{BotId, BotManager};
use bomber_bot::metrics::DecisionMetrics;

/// Stable per-run bot ids so a seed reproduces the whole match
fn bot_id(seed: u64, index: usize) -> BotId {
    Uuid::from_u128(((seed as u128) << 64) | index as u128)
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Bomber Bot v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let bot_config = BotConfig::load_or_default();
    bot_config.validate().context("invalid bot configuration")?;
    let sim_config = SimConfig::load_or_default();
    sim_config.validate().context("invalid simulation configuration")?;
    info!("Bot config: {}", serde_json::to_string(&bot_config)?);
    info!("Sim config: {}", serde_json::to_string(&sim_config)?);

    let metrics = Arc::new(DecisionMetrics::new());
    let mut manager = BotManager::new(bot_config, metrics.clone());
    let mut arena = Arena::new(&sim_config);
    info!(
        width = sim_config.width,
        height = sim_config.height,
        crates = arena.tiles().crate_count(),
        "arena generated"
    );

    for index in 0..sim_config.bots {
        let id = bot_id(sim_config.seed, index);
        if arena.spawn_bot(id).is_none() {
            warn!(index, "no spawn point left");
            continue;
        }
        manager.register_bot(id, sim_config.seed.wrapping_add(index as u64 + 1));
    }

    let total_frames = (sim_config.seconds / DT).ceil() as u64;
    let started = Instant::now();
    let mut frames = 0u64;

    while frames < total_frames {
        let frame_start = Instant::now();

        let outputs = manager.update(|id| arena.view(id), DT);
        for (id, output) in &outputs {
            if let Some(mut handle) = arena.actuator(*id) {
                output.apply(&mut handle);
            }
        }

        let events = arena.step(DT);
        for id in &events.eliminated {
            manager.unregister_bot(*id);
            metrics.record_elimination();
        }

        metrics.record_frame_time(frame_start.elapsed());
        frames += 1;

        if sim_config.bots > 1 && arena.alive_count() <= 1 {
            info!(frames, "one bot or fewer left standing");
            break;
        }
        if manager.is_empty() {
            break;
        }
    }

    info!(
        frames,
        simulated_secs = frames as f32 * DT,
        elapsed_ms = started.elapsed().as_millis() as u64,
        survivors = arena.alive_count(),
        explored = arena.tiles().explored_count(),
        crates_left = arena.tiles().crate_count(),
        "simulation finished"
    );

    println!("{}", metrics.to_prometheus());
    println!("{}", serde_json::to_string_pretty(&metrics.snapshot())?);

    Ok(())
}
