use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Verdict — typed view over a verification response body
// ---------------------------------------------------------------------------

/// What the backend said about a record.
///
/// Every field is optional: the simulator surfaces whatever JSON the backend
/// returns, and this view only picks out the well-known keys for logging.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Verdict {
    pub status: Option<String>,
    pub reason: Option<String>,
    pub qr_data: Option<String>,
}

impl Verdict {
    /// Extract the known fields from a response body.
    ///
    /// Returns `None` when the body is not a JSON object.
    pub fn from_body(body: &serde_json::Value) -> Option<Self> {
        if !body.is_object() {
            return None;
        }
        serde_json::from_value(body.clone()).ok()
    }

    /// The reason string, if present and non-empty.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref().filter(|r| !r.is_empty())
    }
}
