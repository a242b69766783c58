//! aistx: run an AIS fleet simulation
//!
//! Usage: `aistx [config.yaml]`
//!
//! Without an argument the configuration search path is used (see
//! `AistxConfig::load`). `aistx --example-config` prints a default
//! configuration.

use std::path::Path;
use std::process::ExitCode;

use aistx_sim::config::AistxConfig;
use aistx_sim::emitter::{Emitter, ShutdownMode};
use aistx_sim::fleet::{load_fleet, FleetState};
use aistx_sim::logging::init_logging;
use aistx_sim::orchestrator::Orchestrator;
use aistx_sim::sink::build_sink;
use aistx_sim::SimResult;
use tracing::{error, info};

fn run(config: AistxConfig) -> SimResult<()> {
    let vessels = load_fleet(Path::new(&config.fleet_file))?;
    let fleet = FleetState::from_vessels(vessels)?;

    let sample_rate =
        config.radio.gmsk.symbol_rate * config.radio.gmsk.samples_per_symbol as f64;
    let sink = build_sink(&config.sink, sample_rate)?;
    let emitter = Emitter::spawn(sink, &config.emission)?;
    let mut sim = Orchestrator::new(fleet, emitter, &config)?;

    let sim_cfg = &config.simulation;
    let duration = if sim_cfg.duration_s > 0.0 { sim_cfg.duration_s } else { f64::INFINITY };
    let summary = sim.run_for(duration, sim_cfg.tick_interval_s, sim_cfg.time_scale, &|| true)?;

    let (fleet, _sink, stats) = sim.shutdown(ShutdownMode::Drain)?;
    info!(
        vessels = fleet.len(),
        ticks = summary.ticks,
        transmissions = fleet.total_transmissions(),
        sent = stats.sent,
        dropped = stats.dropped_full + stats.dropped_retries,
        failed = stats.failed,
        "simulation complete"
    );
    Ok(())
}

fn main() -> ExitCode {
    let arg = std::env::args().nth(1);
    if arg.as_deref() == Some("--example-config") {
        print!("{}", AistxConfig::example_yaml());
        return ExitCode::SUCCESS;
    }

    let loaded = match &arg {
        Some(path) => AistxConfig::load_from(Path::new(path)),
        None => AistxConfig::load(),
    };
    let config = match loaded.and_then(|c| c.validate().map(|_| c)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("aistx: {e}");
            return ExitCode::from(2);
        }
    };

    init_logging(&config.logging);
    info!(version = env!("CARGO_PKG_VERSION"), fleet = %config.fleet_file, "aistx starting");

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "aistx failed");
            ExitCode::FAILURE
        }
    }
}
