//! Structured errors returned by the lab report download endpoint
//!
//! The server refuses a report for two business reasons and says so in a
//! JSON body: the tests are not complete yet (`report_locked`) or the bill
//! is not fully paid (`partial_payment_restriction`). Each gets its own
//! message instead of a generic download failure.

use serde::Deserialize;
use thiserror::Error;

use core_kernel::PortError;

const REPORT_LOCKED: &str = "report_locked";
const PARTIAL_PAYMENT_RESTRICTION: &str = "partial_payment_restriction";

/// Business reasons a report download is refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportAccessError {
    #[error("Report locked{}", suffix(.message))]
    ReportLocked { message: Option<String> },

    #[error("Partial payment restriction{}", suffix(.message))]
    PartialPaymentRestriction { message: Option<String> },
}

fn suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {}", m))
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl ReportAccessError {
    /// Wire code
    pub fn code(&self) -> &'static str {
        match self {
            ReportAccessError::ReportLocked { .. } => REPORT_LOCKED,
            ReportAccessError::PartialPaymentRestriction { .. } => PARTIAL_PAYMENT_RESTRICTION,
        }
    }

    /// Message shown to the user
    pub fn user_message(&self) -> &'static str {
        match self {
            ReportAccessError::ReportLocked { .. } => {
                "The report is locked until all tests in this request are completed."
            }
            ReportAccessError::PartialPaymentRestriction { .. } => {
                "The report cannot be downloaded until the bill is fully paid."
            }
        }
    }

    /// Decodes a structured error body; `None` when the body is not one
    pub fn from_error_body(body: &[u8]) -> Option<Self> {
        let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
        let code = [parsed.error.as_deref(), parsed.code.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|c| c.eq_ignore_ascii_case(REPORT_LOCKED) || c.eq_ignore_ascii_case(PARTIAL_PAYMENT_RESTRICTION))?;

        let message = parsed.message;
        if code.eq_ignore_ascii_case(REPORT_LOCKED) {
            Some(ReportAccessError::ReportLocked { message })
        } else {
            Some(ReportAccessError::PartialPaymentRestriction { message })
        }
    }
}

/// Failure of a report download
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Access(#[from] ReportAccessError),

    #[error(transparent)]
    Remote(#[from] PortError),
}
