//! Payment values
//!
//! Prepared payments produced by the recorder and the request bodies sent
//! to the billing API.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{CoreError, Money, PatientId};

use crate::entry::BillingCategory;

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash at the counter
    #[default]
    Cash,
    /// Credit or debit card
    Card,
    /// UPI transfer
    Upi,
    /// Net banking
    NetBanking,
    /// Cheque
    Cheque,
    /// Settled by an insurer
    Insurance,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 6] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Upi,
        PaymentMethod::NetBanking,
        PaymentMethod::Cheque,
        PaymentMethod::Insurance,
    ];

    /// Wire label
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::NetBanking => "net_banking",
            PaymentMethod::Cheque => "cheque",
            PaymentMethod::Insurance => "insurance",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| CoreError::unknown_label("payment method", s.trim()))
    }
}

/// Whether a payment settles everything or only part of it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Full,
    Partial,
}

/// Per-category amounts entered by the user; blank fields are `None`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PartialPaymentInput {
    pub consultation: Option<Money>,
    pub registration: Option<Money>,
    pub service: Option<Money>,
}

impl PartialPaymentInput {
    /// Entered amount for one category
    pub fn get(&self, category: BillingCategory) -> Option<Money> {
        match category {
            BillingCategory::Consultation => self.consultation,
            BillingCategory::Registration => self.registration,
            BillingCategory::Service => self.service,
        }
    }
}

/// Validated per-category split of a partial payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PaymentBreakdown {
    pub consultation: Money,
    pub registration: Money,
    pub service: Money,
}

impl PaymentBreakdown {
    pub fn get(&self, category: BillingCategory) -> Money {
        match category {
            BillingCategory::Consultation => self.consultation,
            BillingCategory::Registration => self.registration,
            BillingCategory::Service => self.service,
        }
    }

    pub(crate) fn set(&mut self, category: BillingCategory, amount: Money) {
        match category {
            BillingCategory::Consultation => self.consultation = amount,
            BillingCategory::Registration => self.registration = amount,
            BillingCategory::Service => self.service = amount,
        }
    }

    pub fn total(&self) -> Money {
        self.consultation + self.registration + self.service
    }
}

/// A full payment ready to submit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullPayment {
    pub amount: Money,
}

/// A partial payment ready to submit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialPayment {
    pub amount: Money,
    pub breakdown: PaymentBreakdown,
}

/// Body of `POST /billing/record-payment`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPaymentRequest {
    pub patient_id: PatientId,
    pub amount: Money,
    pub payment_method: PaymentMethod,
    pub payment_type: PaymentType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Body of `POST /billing/record-partial-payment`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPartialPaymentRequest {
    pub patient_id: PatientId,
    pub payments: PaymentBreakdown,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}
