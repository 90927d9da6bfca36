//! HTTP delivery of product records to the verification endpoint.
//!
//! One synchronous `POST` per record. Whatever happens on the wire is folded
//! into an [`Outcome`] so the driver loop never has to deal with errors.

use crate::config;
use crate::error::{Result, SimError};
use crate::models::{ProductRecord, Verdict};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Result of delivering one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// HTTP 200: the backend accepted the record. Carries the parsed body.
    Pass(serde_json::Value),
    /// HTTP 400: the backend rejected the record. Carries the parsed body.
    Fail(serde_json::Value),
    /// Any other status. Carries the raw response text.
    Unexpected { status: u16, body: String },
    /// The endpoint could not be reached (refused, DNS, timeout).
    ConnectionError(String),
    /// Anything else that went wrong: unparseable body, broken stream, etc.
    Error(String),
}

impl Outcome {
    /// Short lowercase label, used as a log field.
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Pass(_) => "pass",
            Outcome::Fail(_) => "fail",
            Outcome::Unexpected { .. } => "unexpected",
            Outcome::ConnectionError(_) => "connection_error",
            Outcome::Error(_) => "error",
        }
    }

    /// Whether the backend answered at all.
    pub fn is_response(&self) -> bool {
        matches!(
            self,
            Outcome::Pass(_) | Outcome::Fail(_) | Outcome::Unexpected { .. }
        )
    }

    /// Typed view over the body of a `Pass` or `Fail`.
    pub fn verdict(&self) -> Option<Verdict> {
        match self {
            Outcome::Pass(body) | Outcome::Fail(body) => Verdict::from_body(body),
            _ => None,
        }
    }

    /// Classify a failed exchange.
    pub fn from_error(err: &SimError) -> Self {
        match err {
            SimError::Http(e) if e.is_connect() || e.is_timeout() => {
                Outcome::ConnectionError(e.to_string())
            }
            other => Outcome::Error(other.to_string()),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Pass(body) => write!(f, "Server Response (PASS): {}", body),
            Outcome::Fail(body) => write!(f, "Server Response (FAIL): {}", body),
            Outcome::Unexpected { status, body } => {
                write!(f, "Unexpected Server Response [Code: {}]: {}", status, body)
            }
            Outcome::ConnectionError(_) => write!(
                f,
                "CONNECTION ERROR: Could not connect to the backend.\n   \
                 Please make sure the verification server is running."
            ),
            Outcome::Error(msg) => write!(f, "An unexpected error occurred: {}", msg),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Something that can deliver a record and report what happened.
pub trait Transport {
    fn send(&self, record: &ProductRecord) -> Outcome;

    /// Human-readable destination, shown in the start banner.
    fn destination(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Transmitter
// ---------------------------------------------------------------------------

/// Posts records as JSON to a fixed endpoint using a blocking HTTP client.
pub struct Transmitter {
    endpoint: String,
    client: Client,
}

impl Transmitter {
    /// Create a transmitter for `endpoint`.
    ///
    /// `timeout` bounds each request end to end; `None` waits indefinitely.
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self> {
        config::validate_endpoint(endpoint)?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("packsim/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Post one record and classify the response by status code.
    ///
    /// Transport failures and unparseable 200/400 bodies are returned as
    /// errors; use [`Transport::send`] to have them folded into an
    /// [`Outcome`].
    pub fn post(&self, record: &ProductRecord) -> Result<Outcome> {
        tracing::debug!(endpoint = %self.endpoint, barcode = %record.barcode, "posting record");

        let resp = self.client.post(&self.endpoint).json(record).send()?;
        let status = resp.status();

        let outcome = match status {
            StatusCode::OK => Outcome::Pass(resp.json()?),
            StatusCode::BAD_REQUEST => Outcome::Fail(resp.json()?),
            other => Outcome::Unexpected {
                status: other.as_u16(),
                body: resp.text()?,
            },
        };
        Ok(outcome)
    }
}

impl Transport for Transmitter {
    fn send(&self, record: &ProductRecord) -> Outcome {
        match self.post(record) {
            Ok(outcome) => outcome,
            Err(e) => Outcome::from_error(&e),
        }
    }

    fn destination(&self) -> &str {
        &self.endpoint
    }
}
