//! The device loop: generate, send, report, sleep, repeat.
//!
//! [`Simulator::run_cycle`] performs exactly one cycle and can be called on
//! its own. [`Simulator::run`] drives it until a [`StopSignal`] is raised or
//! the optional cycle bound is reached. Sleeping goes through the [`Sleeper`]
//! trait so tests can run many cycles without waiting.

use crate::generator::{Clock, RecordGenerator, SystemClock};
use crate::models::ProductRecord;
use crate::transmitter::{Outcome, Transmitter, Transport};
use rand::rngs::StdRng;
use rand::Rng;
use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const SEPARATOR: &str = "-------------------------------------------";

// ---------------------------------------------------------------------------
// StopSignal
// ---------------------------------------------------------------------------

/// Shared flag that asks one or more running simulators to stop.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Sleepers
// ---------------------------------------------------------------------------

/// Waits between cycles.
pub trait Sleeper {
    /// Wait for `duration`, returning early if `stop` is raised.
    fn sleep(&mut self, duration: Duration, stop: &StopSignal);
}

/// Blocks the current thread, checking the stop signal every `slice`.
#[derive(Debug, Clone, Copy)]
pub struct ThreadSleeper {
    slice: Duration,
}

impl ThreadSleeper {
    pub fn new(slice: Duration) -> Self {
        Self { slice }
    }
}

impl Default for ThreadSleeper {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration, stop: &StopSignal) {
        let deadline = Instant::now() + duration;
        loop {
            if stop.is_stopped() {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            std::thread::sleep((deadline - now).min(self.slice));
        }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Everything that happened in one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// 1-based cycle number.
    pub cycle: u64,
    pub record: ProductRecord,
    pub outcome: Outcome,
}

/// Running tally of outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles: u64,
    pub passed: u64,
    pub failed: u64,
    pub unexpected: u64,
    pub connection_errors: u64,
    pub errors: u64,
}

impl CycleStats {
    pub fn record(&mut self, outcome: &Outcome) {
        self.cycles += 1;
        match outcome {
            Outcome::Pass(_) => self.passed += 1,
            Outcome::Fail(_) => self.failed += 1,
            Outcome::Unexpected { .. } => self.unexpected += 1,
            Outcome::ConnectionError(_) => self.connection_errors += 1,
            Outcome::Error(_) => self.errors += 1,
        }
    }

    /// Sum of two tallies, used to aggregate a fleet.
    pub fn merge(&self, other: &CycleStats) -> CycleStats {
        CycleStats {
            cycles: self.cycles + other.cycles,
            passed: self.passed + other.passed,
            failed: self.failed + other.failed,
            unexpected: self.unexpected + other.unexpected,
            connection_errors: self.connection_errors + other.connection_errors,
            errors: self.errors + other.errors,
        }
    }
}

impl fmt::Display for CycleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycles={} pass={} fail={} unexpected={} connection_errors={} errors={}",
            self.cycles,
            self.passed,
            self.failed,
            self.unexpected,
            self.connection_errors,
            self.errors
        )
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// One simulated packaging-line device.
///
/// Built with [`Simulator::builder()`](crate::SimulatorBuilder) for the real
/// HTTP transport, or with [`Simulator::new`] around any [`Transport`].
pub struct Simulator<T = Transmitter, R = StdRng, C = SystemClock> {
    device_id: String,
    generator: RecordGenerator<R, C>,
    transport: T,
    interval: Duration,
    max_cycles: Option<u64>,
    prefix_lines: bool,
    stats: CycleStats,
}

impl<T: Transport, R: Rng, C: Clock> Simulator<T, R, C> {
    pub fn new(
        device_id: impl Into<String>,
        generator: RecordGenerator<R, C>,
        transport: T,
        interval: Duration,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            generator,
            transport,
            interval,
            max_cycles: None,
            prefix_lines: false,
            stats: CycleStats::default(),
        }
    }

    /// Stop [`run`](Self::run) after this many cycles. `Some(0)` runs none.
    pub fn with_max_cycles(mut self, max_cycles: Option<u64>) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    /// Prefix every output line with `[device_id]`.
    pub fn with_prefix_lines(mut self, prefix_lines: bool) -> Self {
        self.prefix_lines = prefix_lines;
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Print the start-up lines.
    pub fn banner(&self, out: &mut dyn Write) {
        self.emit(out, "IoT Device Simulator: STARTED");
        self.emit(
            out,
            &format!("Sending data to: {}", self.transport.destination()),
        );
    }

    /// Run a single generate, send, report cycle.
    ///
    /// Never fails: transport problems come back as an [`Outcome`] and
    /// output errors are logged.
    pub fn run_cycle(&mut self, out: &mut dyn Write) -> CycleReport {
        let cycle = self.stats.cycles + 1;
        let span = tracing::info_span!("cycle", device = %self.device_id, cycle);
        let _enter = span.enter();

        let record = self.generator.generate();
        self.emit(out, "");
        self.emit(out, SEPARATOR);
        self.emit(out, &format!("Generated Data: {}", record));

        let outcome = self.transport.send(&record);
        log_outcome(&record, &outcome);
        self.emit(out, &outcome.to_string());

        self.stats.record(&outcome);
        CycleReport {
            cycle,
            record,
            outcome,
        }
    }

    /// Cycle until `stop` is raised or the cycle bound is hit.
    ///
    /// The interval is slept in full after every cycle, regardless of how
    /// long the cycle itself took.
    pub fn run(
        &mut self,
        stop: &StopSignal,
        sleeper: &mut dyn Sleeper,
        out: &mut dyn Write,
    ) -> CycleStats {
        tracing::info!(
            device = %self.device_id,
            destination = %self.transport.destination(),
            interval = ?self.interval,
            "simulator running"
        );

        while !stop.is_stopped() && !self.cycle_bound_reached() {
            self.run_cycle(out);
            if self.cycle_bound_reached() {
                break;
            }
            sleeper.sleep(self.interval, stop);
        }

        tracing::info!(device = %self.device_id, stats = %self.stats, "simulator stopped");
        self.stats
    }

    fn emit(&self, out: &mut dyn Write, line: &str) {
        for part in line.split('\n') {
            let result = if self.prefix_lines && !part.is_empty() {
                writeln!(out, "[{}] {}", self.device_id, part)
            } else {
                writeln!(out, "{}", part)
            };
            if let Err(e) = result {
                tracing::warn!(device = %self.device_id, error = %e, "failed to write report line");
                return;
            }
        }
        if let Err(e) = out.flush() {
            tracing::warn!(device = %self.device_id, error = %e, "failed to flush report output");
        }
    }

    fn cycle_bound_reached(&self) -> bool {
        self.max_cycles.is_some_and(|max| self.stats.cycles >= max)
    }
}

fn log_outcome(record: &ProductRecord, outcome: &Outcome) {
    match outcome {
        Outcome::Pass(_) | Outcome::Fail(_) => {
            let verdict = outcome.verdict().unwrap_or_default();
            tracing::info!(
                outcome = outcome.label(),
                barcode = %record.barcode,
                status = verdict.status.as_deref().unwrap_or(""),
                reason = verdict.reason().unwrap_or(""),
                "backend verdict"
            );
        }
        Outcome::Unexpected { status, .. } => {
            tracing::warn!(outcome = outcome.label(), status = *status, "unexpected response");
        }
        Outcome::ConnectionError(e) => {
            tracing::warn!(outcome = outcome.label(), error = %e, "backend unreachable");
        }
        Outcome::Error(e) => {
            tracing::warn!(outcome = outcome.label(), error = %e, "cycle failed");
        }
    }
}
