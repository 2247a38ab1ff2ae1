use std::fmt;

use serde::Serialize;

/// Failures surfaced by a browser automation provider.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    #[error("browser provider could not be started: {0}")]
    Launch(String),
    #[error("timed out waiting for {0}")]
    Timeout(String),
    #[error("no element matches `{0}`")]
    NoSuchElement(String),
    #[error("driver error: {0}")]
    Driver(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("disclaimer handshake failed for {council}: {reason}")]
    HandshakeFailure { council: String, reason: String },
    #[error("navigation timed out: {0}")]
    NavigationTimeout(String),
    #[error("expected control not found: {0}")]
    SelectorNotFound(String),
    #[error("portal redirected back to its disclaimer")]
    DisclaimerRedirect,
    #[error("browser provider unavailable: {0}")]
    FatalProviderFailure(String),
    #[error("portal error: {0}")]
    Portal(String),
    #[error("invalid search: {0}")]
    InvalidQuery(String),
}

impl ScanError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, ScanError::FatalProviderFailure(_))
    }
}

impl From<BrowserError> for ScanError {
    fn from(value: BrowserError) -> Self {
        match value {
            BrowserError::Launch(reason) => ScanError::FatalProviderFailure(reason),
            BrowserError::Timeout(what) => ScanError::NavigationTimeout(what),
            BrowserError::NoSuchElement(selector) => ScanError::SelectorNotFound(selector),
            BrowserError::Driver(reason) => ScanError::Portal(reason),
        }
    }
}

/// The smallest piece of work a failure is charged to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ScanUnit {
    Handshake,
    Page(u32),
    Week(String),
    Detail(String),
}

impl fmt::Display for ScanUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanUnit::Handshake => write!(f, "handshake"),
            ScanUnit::Page(n) => write!(f, "page {}", n),
            ScanUnit::Week(label) => write!(f, "week {}", label),
            ScanUnit::Detail(url) => write!(f, "detail {}", url),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitFailure {
    pub unit: ScanUnit,
    pub reason: String,
}

impl UnitFailure {
    pub fn new(unit: ScanUnit, error: &ScanError) -> Self {
        UnitFailure {
            unit,
            reason: error.to_string(),
        }
    }
}
