//! IoT packaging-line simulator.
//!
//! Pretends to be a device on a packaging line: every few seconds it makes up
//! a product record (barcode, weight, price, expiry), POSTs it as JSON to a
//! verification backend and prints what the backend said. About one record in
//! ten carries a barcode prefix the backend should reject, and expiry dates
//! range from two months in the past to a year ahead, so a backend under test
//! sees a steady mix of passes and failures.
//!
//! # Quick start
//!
//! ```no_run
//! use packsim::{Simulator, StopSignal, ThreadSleeper};
//! use std::time::Duration;
//!
//! let mut sim = Simulator::builder()
//!     .endpoint("http://localhost:3000/verify")
//!     .interval(Duration::from_secs(5))
//!     .max_cycles(Some(3))
//!     .build()
//!     .unwrap();
//!
//! let stats = sim.run(&StopSignal::new(), &mut ThreadSleeper::default(), &mut std::io::stdout());
//! println!("{stats}");
//! ```

pub mod config;
pub mod driver;
pub mod error;
#[cfg(feature = "async")]
pub mod fleet;
pub mod generator;
pub mod models;
pub mod transmitter;

pub use config::SimConfig;
pub use driver::{CycleReport, CycleStats, Simulator, Sleeper, StopSignal, ThreadSleeper};
pub use error::{Result, SimError};
#[cfg(feature = "async")]
pub use fleet::Fleet;
pub use generator::{Clock, FixedClock, RecordGenerator, SystemClock};
pub use models::{ProductRecord, Verdict};
pub use transmitter::{Outcome, Transmitter, Transport};

use std::time::Duration;

// ---------------------------------------------------------------------------
// SimulatorBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing an HTTP-backed [`Simulator`].
///
/// Use [`Simulator::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](SimulatorBuilder::build).
#[derive(Debug, Clone)]
pub struct SimulatorBuilder {
    endpoint: String,
    interval: Duration,
    timeout: Option<Duration>,
    seed: Option<u64>,
    max_cycles: Option<u64>,
    device_id: String,
    prefix_lines: bool,
}

impl Default for SimulatorBuilder {
    fn default() -> Self {
        Self {
            endpoint: config::DEFAULT_ENDPOINT.to_string(),
            interval: Duration::from_secs(config::DEFAULT_INTERVAL_SECS),
            timeout: Some(Duration::from_secs(config::DEFAULT_TIMEOUT_SECS)),
            seed: None,
            max_cycles: None,
            device_id: config::DEFAULT_DEVICE_ID.to_string(),
            prefix_lines: false,
        }
    }
}

impl SimulatorBuilder {
    /// Start from a loaded [`SimConfig`].
    ///
    /// `devices` is ignored here; running more than one device is the job
    /// of the `fleet` module (feature `async`).
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            interval: config.interval(),
            timeout: config.timeout(),
            seed: config.seed,
            max_cycles: config.max_cycles,
            ..Self::default()
        }
    }

    /// Set the verification endpoint.
    ///
    /// Defaults to `http://localhost:3000/verify`.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the pause between cycles. Defaults to 5 seconds.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the per-request timeout. `None` disables it. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Seed the record generator for reproducible output.
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Stop after a fixed number of cycles.
    pub fn max_cycles(mut self, max_cycles: Option<u64>) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    /// Name the device in logs and prefixed output. Defaults to `device-1`.
    pub fn device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = device_id.into();
        self
    }

    /// Prefix every output line with the device id.
    pub fn prefix_lines(mut self, prefix_lines: bool) -> Self {
        self.prefix_lines = prefix_lines;
        self
    }

    /// Build the simulator, validating the endpoint and creating the HTTP
    /// client.
    pub fn build(self) -> Result<Simulator> {
        let transport = Transmitter::new(&self.endpoint, self.timeout)?;
        let generator = match self.seed {
            Some(seed) => RecordGenerator::seeded(seed),
            None => RecordGenerator::new(),
        };
        Ok(
            Simulator::new(self.device_id, generator, transport, self.interval)
                .with_max_cycles(self.max_cycles)
                .with_prefix_lines(self.prefix_lines),
        )
    }
}

impl Simulator {
    /// Create a new builder for an HTTP-backed simulator.
    pub fn builder() -> SimulatorBuilder {
        SimulatorBuilder::default()
    }
}
