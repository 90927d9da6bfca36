use crate::config;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ProductRecord — one packaged item as read off the line
// ---------------------------------------------------------------------------

/// A synthetic packaging record, created fresh for every cycle.
///
/// Serializes to `{"barcode": string, "weight": number, "mrp": number,
/// "expiry": string}`, which is the body the verification endpoint expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub barcode: String,
    pub weight: f64,
    pub mrp: f64,
    pub expiry: String,
}

impl ProductRecord {
    /// Whether the barcode carries the prefix the backend accepts.
    pub fn has_valid_prefix(&self) -> bool {
        self.barcode.starts_with(config::VALID_PREFIX)
    }
}

impl fmt::Display for ProductRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{barcode: {}, weight: {}, mrp: {}, expiry: {}}}",
            self.barcode, self.weight, self.mrp, self.expiry
        )
    }
}
