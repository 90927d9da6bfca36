//! Synthetic packaging-record generator.
//!
//! Produces one [`ProductRecord`] per call from an owned random source and
//! clock. Both are injectable so tests can pin the output with a seeded
//! [`StdRng`] and a [`FixedClock`].

use crate::config;
use crate::models::ProductRecord;
use chrono::{DateTime, Local, SecondsFormat};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ---------------------------------------------------------------------------
// Clocks
// ---------------------------------------------------------------------------

/// Source of "now" for expiry computation.
pub trait Clock {
    fn now(&self) -> DateTime<Local>;
}

/// The local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock frozen at a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Local>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// RecordGenerator
// ---------------------------------------------------------------------------

/// Generates randomized product records.
pub struct RecordGenerator<R = StdRng, C = SystemClock> {
    rng: R,
    clock: C,
}

impl RecordGenerator<StdRng, SystemClock> {
    /// Generator seeded from OS entropy, reading the local wall clock.
    pub fn new() -> Self {
        Self::with_parts(StdRng::from_entropy(), SystemClock)
    }

    /// Reproducible generator: the same seed yields the same barcodes,
    /// weights, prices and expiry offsets.
    pub fn seeded(seed: u64) -> Self {
        Self::with_parts(StdRng::seed_from_u64(seed), SystemClock)
    }
}

impl Default for RecordGenerator<StdRng, SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng, C: Clock> RecordGenerator<R, C> {
    pub fn with_parts(rng: R, clock: C) -> Self {
        Self { rng, clock }
    }

    /// Produce one record.
    ///
    /// Draw order is fixed (prefix, digits, weight, mrp, expiry offset) so a
    /// given seed always maps to the same sequence of records.
    pub fn generate(&mut self) -> ProductRecord {
        let invalid = self.rng.gen_bool(config::INVALID_BARCODE_PROBABILITY);
        let prefix = if invalid {
            config::INVALID_PREFIX
        } else {
            config::VALID_PREFIX
        };

        let mut barcode = String::with_capacity(config::BARCODE_LEN);
        barcode.push_str(prefix);
        barcode.push_str(&random_digits(&mut self.rng, config::BARCODE_RANDOM_DIGITS));

        let weight = round2(self.rng.gen_range(config::WEIGHT_RANGE));
        let mrp = round2(self.rng.gen_range(config::MRP_RANGE));

        let offset_days = self.rng.gen_range(config::EXPIRY_OFFSET_DAYS);
        let expiry = self.clock.now() + chrono::Duration::days(offset_days);

        ProductRecord {
            barcode,
            weight,
            mrp,
            expiry: format_expiry(&expiry),
        }
    }
}

// ---------------------------------------------------------------------------
// Free-standing helpers
// ---------------------------------------------------------------------------

/// Round to two decimal places, halves away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// ISO-8601 timestamp with milliseconds and the local UTC offset.
pub fn format_expiry(at: &DateTime<Local>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, false)
}

/// `count` independent uniform decimal digits.
fn random_digits<R: Rng>(rng: &mut R, count: usize) -> String {
    (0..count)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}
