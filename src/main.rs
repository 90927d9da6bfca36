//! `packsim [CONFIG_PATH]` — run the packaging-line simulator.
//!
//! Operator lines go to stdout, diagnostics to stderr (filter with
//! `RUST_LOG`). Runs until interrupted unless `max_cycles` is configured.

use std::path::PathBuf;
use std::process::ExitCode;

use packsim::{SimConfig, SimulatorBuilder, StopSignal, ThreadSleeper};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match SimConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "cannot load configuration");
            return ExitCode::FAILURE;
        }
    };
    info!(
        endpoint = %config.endpoint,
        interval_s = config.interval_seconds,
        devices = config.devices,
        "configuration loaded"
    );

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "simulator failed");
            ExitCode::FAILURE
        }
    }
}

fn run_single(config: &SimConfig) -> packsim::Result<()> {
    let mut sim = SimulatorBuilder::from_config(config).build()?;
    let mut out = std::io::stdout();
    sim.banner(&mut out);
    sim.run(&StopSignal::new(), &mut ThreadSleeper::default(), &mut out);
    Ok(())
}

#[cfg(not(feature = "async"))]
fn run(config: &SimConfig) -> packsim::Result<()> {
    if config.devices > 1 {
        tracing::warn!(
            devices = config.devices,
            "running several devices needs the `async` feature; starting one"
        );
    }
    run_single(config)
}

#[cfg(feature = "async")]
fn run(config: &SimConfig) -> packsim::Result<()> {
    if config.devices == 1 {
        return run_single(config);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let fleet = packsim::Fleet::from_config(config)?;
    let stats = runtime.block_on(fleet.run_until_ctrl_c())?;

    let total = stats
        .iter()
        .fold(packsim::CycleStats::default(), |acc, s| acc.merge(s));
    info!(devices = stats.len(), stats = %total, "fleet stopped");
    Ok(())
}
