// CLI entry point for the orbital simulation's control server.
//
// Builds a universe factory from the flags (namer, optional config file,
// autopilot on start), attaches a progress listener to every universe it
// creates, starts the HTTP server and blocks until SIGINT/SIGTERM (or the
// workers exit), then runs the orderly shutdown. See `server.rs` for the
// endpoint list.
//
// Usage:
//   spacectl [--host H] [--port P] [--seed S] [--realtime] [--hz N]
//            [--workers N] [--autopilot] [--namer catalog|minimal]
//            [--config universe.json]
//
// Logging is controlled by `RUST_LOG` (default `info`); progress lines are
// emitted at `debug`.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use space_control::{ControlConfig, progress, start_control};
use space_namer::{CatalogNamer, MinimalNamer, Namer};
use space_sim::{Universe, UniverseConfig};
use tracing::info;
use tracing_subscriber::prelude::*;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum NamerKind {
    Catalog,
    Minimal,
}

#[derive(Parser, Debug)]
#[command(name = "spacectl", about = "HTTP control server for the orbital simulation")]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, default_value_t = 42, allow_negative_numbers = true)]
    seed: i64,
    /// Advance the simulation on a wall clock; `/step` then only reports time.
    #[arg(long)]
    realtime: bool,
    /// Realtime step rate (1..=240).
    #[arg(long, default_value_t = 60)]
    hz: u32,
    #[arg(long, default_value_t = 4)]
    workers: usize,
    /// Engage the autopilot in every new universe.
    #[arg(long)]
    autopilot: bool,
    #[arg(long, value_enum, default_value_t = NamerKind::Catalog)]
    namer: NamerKind,
    /// Universe config JSON; defaults are used when absent.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let universe_config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("reading universe config {}", path.display()))?;
            UniverseConfig::from_json(&json)
                .with_context(|| format!("loading universe config {}", path.display()))?
        }
        None => UniverseConfig::default(),
    };

    let namer_kind = args.namer;
    let autopilot = args.autopilot;
    let factory = move |seed: i64| {
        let namer: Box<dyn Namer> = match namer_kind {
            NamerKind::Catalog => Box::new(CatalogNamer::default()),
            NamerKind::Minimal => Box::new(MinimalNamer),
        };
        let mut universe = Universe::generate(namer, seed, universe_config.clone());
        if autopilot {
            universe.set_autopilot(true);
        }
        let designation = universe.system_designation();
        universe.add_step_listener(progress::listener(designation));
        universe
    };

    let config = ControlConfig {
        host: args.host,
        port: args.port,
        seed: args.seed,
        realtime: args.realtime,
        realtime_hz: args.hz,
        workers: args.workers,
        ..ControlConfig::default()
    };
    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
        .context("installing signal handler")?;

    let (handle, addr) = start_control(config, factory).context("control server failed to start")?;
    info!(%addr, "spacectl ready; press Ctrl+C to stop");

    handle.run_until(&running);
    Ok(())
}
