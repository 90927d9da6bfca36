//! Several simulated devices running side by side (feature `async`).
//!
//! Each device keeps its own blocking loop and runs on the Tokio blocking
//! thread pool via [`tokio::task::spawn_blocking`]. Devices share nothing but
//! a [`StopSignal`], so the order in which their records reach the backend is
//! unspecified.
//!
//! # Example
//!
//! ```no_run
//! use packsim::{Fleet, SimConfig};
//!
//! #[tokio::main]
//! async fn main() -> packsim::Result<()> {
//!     let config = SimConfig { devices: 4, ..SimConfig::default() };
//!     let stats = Fleet::from_config(&config)?.run_until_ctrl_c().await?;
//!     println!("{} devices stopped", stats.len());
//!     Ok(())
//! }
//! ```

use std::io::{self, Write};

use rand::rngs::StdRng;
use rand::Rng;

use crate::config::SimConfig;
use crate::driver::{CycleStats, Simulator, StopSignal, ThreadSleeper};
use crate::error::{Result, SimError};
use crate::generator::{Clock, SystemClock};
use crate::transmitter::{Transmitter, Transport};
use crate::SimulatorBuilder;

fn stdout_writer() -> Box<dyn Write> {
    Box::new(io::stdout())
}

// ---------------------------------------------------------------------------
// Fleet
// ---------------------------------------------------------------------------

/// A group of independent simulators sharing one stop signal.
pub struct Fleet<T = Transmitter, R = StdRng, C = SystemClock> {
    simulators: Vec<Simulator<T, R, C>>,
    output: fn() -> Box<dyn Write>,
}

impl Fleet {
    /// Build one HTTP-backed simulator per configured device.
    ///
    /// Devices are named `device-1`, `device-2`, ... When a seed is set,
    /// device `i` is seeded with `seed + i` so every device produces a
    /// different but reproducible stream.
    pub fn from_config(config: &SimConfig) -> Result<Self> {
        config.validate()?;
        let prefix_lines = config.devices > 1;

        let mut simulators = Vec::with_capacity(config.devices);
        for index in 0..config.devices {
            let sim = SimulatorBuilder::from_config(config)
                .device_id(format!("device-{}", index + 1))
                .seed(config.seed.map(|s| s.wrapping_add(index as u64)))
                .prefix_lines(prefix_lines)
                .build()?;
            simulators.push(sim);
        }
        Ok(Self::new(simulators))
    }
}

impl<T, R, C> Fleet<T, R, C>
where
    T: Transport + Send + 'static,
    R: Rng + Send + 'static,
    C: Clock + Send + 'static,
{
    pub fn new(simulators: Vec<Simulator<T, R, C>>) -> Self {
        Self {
            simulators,
            output: stdout_writer,
        }
    }

    /// Send operator lines somewhere other than stdout.
    pub fn with_output(mut self, output: fn() -> Box<dyn Write>) -> Self {
        self.output = output;
        self
    }

    pub fn len(&self) -> usize {
        self.simulators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.simulators.is_empty()
    }

    /// Run every device until `stop` is raised (or each hits its cycle
    /// bound). Returns per-device stats in device order.
    pub async fn run(self, stop: StopSignal) -> Result<Vec<CycleStats>> {
        let output = self.output;
        let handles: Vec<_> = self
            .simulators
            .into_iter()
            .map(|mut sim| {
                let stop = stop.clone();
                tokio::task::spawn_blocking(move || {
                    let mut out = output();
                    sim.banner(&mut out);
                    sim.run(&stop, &mut ThreadSleeper::default(), &mut out)
                })
            })
            .collect();

        let mut stats = Vec::with_capacity(handles.len());
        for handle in handles {
            let device_stats = handle
                .await
                .map_err(|e| SimError::Task(format!("device task join error: {e}")))?;
            stats.push(device_stats);
        }
        Ok(stats)
    }

    /// Like [`run`](Self::run), with the stop signal raised on Ctrl-C.
    pub async fn run_until_ctrl_c(self) -> Result<Vec<CycleStats>> {
        let stop = StopSignal::new();
        let watcher = stop.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("interrupt received, stopping devices");
                    watcher.stop();
                }
                Err(e) => tracing::warn!(error = %e, "cannot listen for Ctrl-C"),
            }
        });
        self.run(stop).await
    }
}
