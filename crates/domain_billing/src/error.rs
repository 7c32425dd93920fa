//! Billing domain errors

use thiserror::Error;

use core_kernel::{Money, PatientId, PortError};

use crate::entry::BillingCategory;
use crate::report::{ReportAccessError, ReportError};

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// A category amount below zero was entered
    #[error("Negative {category} amount: {amount}")]
    NegativeAmount {
        category: BillingCategory,
        amount: Money,
    },

    /// A category amount above its outstanding balance was entered
    #[error("{category} amount {entered} exceeds outstanding {outstanding}")]
    AmountExceedsOutstanding {
        category: BillingCategory,
        entered: Money,
        outstanding: Money,
    },

    /// Nothing is owed
    #[error("Nothing to pay")]
    NothingToPay,

    /// A partial payment with every category at zero
    #[error("Payment breakdown is empty")]
    EmptyPayment,

    /// A submitted amount that is not strictly positive
    #[error("Invalid payment amount: {0}")]
    InvalidAmount(Money),

    /// A charge request failed validation
    #[error("Invalid charge: {0}")]
    InvalidCharge(String),

    /// The patient is not among the loaded records
    #[error("Patient not loaded: {0}")]
    PatientNotLoaded(PatientId),

    /// The billing API call failed
    #[error("Billing API error: {0}")]
    Remote(#[from] PortError),

    /// The server refused a report download
    #[error("Report access denied: {0}")]
    ReportAccess(#[from] ReportAccessError),
}

impl From<ReportError> for BillingError {
    fn from(error: ReportError) -> Self {
        match error {
            ReportError::Access(access) => BillingError::ReportAccess(access),
            ReportError::Remote(port) => BillingError::Remote(port),
        }
    }
}

impl BillingError {
    /// Returns true for errors raised locally before any request was sent
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BillingError::NegativeAmount { .. }
                | BillingError::AmountExceedsOutstanding { .. }
                | BillingError::NothingToPay
                | BillingError::EmptyPayment
                | BillingError::InvalidAmount(_)
                | BillingError::InvalidCharge(_)
        )
    }

    /// Short message suitable for a toast or status line
    pub fn user_message(&self) -> String {
        match self {
            BillingError::NegativeAmount { category, .. } => {
                format!("The {} amount cannot be negative.", category)
            }
            BillingError::AmountExceedsOutstanding {
                category,
                outstanding,
                ..
            } => format!(
                "The {} amount cannot exceed the outstanding {}.",
                category, outstanding
            ),
            BillingError::NothingToPay => "This patient has no outstanding balance.".to_string(),
            BillingError::EmptyPayment => "Enter an amount for at least one category.".to_string(),
            BillingError::InvalidAmount(_) => "Payment amount must be greater than zero.".to_string(),
            BillingError::InvalidCharge(message) => message.clone(),
            BillingError::PatientNotLoaded(_) => {
                "Patient not found. Refresh the patient list and try again.".to_string()
            }
            BillingError::Remote(port) => port.user_message(),
            BillingError::ReportAccess(access) => access.user_message().to_string(),
        }
    }
}
