//! Headless GEARZ simulation.
//!
//! Generates a seeded world, drives the engine for a number of ticks with a
//! stream of random host events, saves and resumes halfway through, then
//! prints driver totals and the engine counters in Prometheus text format.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use rand::rngs::StdRng;
use rand::seq::IteratorRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use gearz_core::{AgentId, SkillKind, Tick};
use gearz_host::{HostConfig, TickDriver, WorldGen, hooks, telemetry};

fn print_usage() {
    println!("gearz-sim [seed] [ticks] [config.toml]");
    println!("  seed    world and event seed (default 42)");
    println!("  ticks   ticks to simulate (default 5000)");
    println!("  config  host config in TOML (default: built-in Standard profile)");
}

fn parse_u64(value: Option<&String>, label: &str, default: u64) -> Result<u64> {
    match value {
        Some(raw) => raw.parse::<u64>().with_context(|| format!("invalid {label}: {raw}")),
        None => Ok(default),
    }
}

fn load_config(path: Option<&String>) -> Result<HostConfig> {
    match path {
        Some(path) => {
            let path = PathBuf::from(path);
            HostConfig::from_file(&path).with_context(|| format!("loading {}", path.display()))
        }
        None => Ok(HostConfig::default()),
    }
}

fn random_agent(rng: &mut StdRng, driver: &TickDriver, world: &gearz_host::WorldSnapshot) -> Option<AgentId> {
    world
        .agents
        .keys()
        .filter(|id| driver.component(**id).is_some())
        .copied()
        .choose(rng)
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        return Ok(());
    }
    let seed = parse_u64(args.get(1), "seed", 42)?;
    let ticks = parse_u64(args.get(2), "ticks", 5_000)?;
    if ticks == 0 {
        bail!("ticks must be > 0");
    }
    let config = load_config(args.get(3))?;
    telemetry::init(config.log_format, &config.log_filter).context("installing log subscriber")?;

    let mut world = WorldGen::default().generate(seed);
    let mut driver = TickDriver::new(config.clone(), world.catalog.clone())?;
    driver.track_agents(&world);
    let mut rng = StdRng::seed_from_u64(seed ^ 0x9e37_79b9);
    info!(seed, ticks, agents = world.agents.len(), items = world.items.len(), "Simulation starting");

    let save_at: Tick = ticks / 2;
    let mut next_agent_id = world.agents.keys().map(|id| id.0).max().unwrap_or(0) + 1;

    for tick in 1..=ticks {
        if rng.gen_bool(0.02) {
            if let Some(agent) = random_agent(&mut rng, &driver, &world) {
                let kind = if rng.gen_bool(0.5) { SkillKind::Shooting } else { SkillKind::Melee };
                driver.push_event(hooks::on_skill_change(agent, kind, rng.gen_range(0..=20)));
            }
        }
        if rng.gen_bool(0.002) {
            if let Some(agent) = random_agent(&mut rng, &driver, &world) {
                driver.push_event(hooks::on_destroyed(agent));
            }
        }
        if rng.gen_bool(0.002) {
            let agent = gearz_core::Agent::new(AgentId(next_agent_id))
                .with_skill(SkillKind::Shooting, rng.gen_range(0..=20))
                .with_skill(SkillKind::Melee, rng.gen_range(0..=20));
            next_agent_id += 1;
            driver.push_event(hooks::on_spawn(agent));
        }
        if tick == ticks * 3 / 4 {
            driver.push_event(hooks::on_preference_change(rng.gen_range(-1.0..=1.0)));
        }

        driver.step(&mut world, tick);

        if tick == save_at {
            let saved = driver.engine().cache_timestamps(tick).to_json()?;
            let before = driver.stats();
            info!(tick, bytes = saved.len(), "Saved cache timestamps, resuming in a fresh driver");
            let mut resumed = TickDriver::new(config.clone(), world.catalog.clone())?;
            resumed.track_agents(&world);
            resumed.push_event(hooks::on_game_loaded(Some(&saved)));
            println!("before resume: {before:?}");
            driver = resumed;
        }
    }

    println!("after resume:  {:?}", driver.stats());
    print!("{}", driver.engine().counters().snapshot().to_prometheus());
    Ok(())
}
