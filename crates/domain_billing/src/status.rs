//! Canonical patient billing status and its screen labels

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::CoreError;

/// Screen a status label is rendered on
///
/// The notification popup and the consultation billing list word some
/// statuses differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    PendingBillsNotification,
    #[default]
    ConsultationBilling,
}

impl FromStr for Screen {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "notification" | "pending_bills_notification" | "pending-bills" => {
                Ok(Screen::PendingBillsNotification)
            }
            "billing" | "consultation_billing" | "consultation-billing" => {
                Ok(Screen::ConsultationBilling)
            }
            _ => Err(CoreError::unknown_label("screen", s.trim())),
        }
    }
}

/// Patient billing status, declared most urgent first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingStatus {
    RegistrationFeeRequired,
    ConsultationFeeRequired,
    ConsultationPending,
    ConsultationPartial,
    RegistrationPending,
    RegistrationPartial,
    ServicePending,
    ServicePartial,
    PendingPayment,
    AllPaid,
}

impl BillingStatus {
    /// Label shown on `screen`
    pub fn label(&self, screen: Screen) -> &'static str {
        use BillingStatus::*;
        match (self, screen) {
            (RegistrationFeeRequired, _) => "Registration Fee Required",
            (ConsultationFeeRequired, _) => "Consultation Fee Required",
            (ConsultationPending | ConsultationPartial, Screen::PendingBillsNotification) => {
                "Consultation Fee Pending"
            }
            (ConsultationPending, Screen::ConsultationBilling) => "Consultation Pending Payment",
            (ConsultationPartial, Screen::ConsultationBilling) => "Consultation Partial Payment",
            (RegistrationPending, _) => "Registration Fee Pending",
            (RegistrationPartial, Screen::PendingBillsNotification) => "Registration Fee Pending",
            (RegistrationPartial, Screen::ConsultationBilling) => "Registration Partial Payment",
            (ServicePending, _) => "Service Charges Pending",
            (ServicePartial, _) => "Service Charges Partial",
            (PendingPayment, _) => "Pending Payment",
            (AllPaid, _) => "All Paid",
        }
    }

    /// True for every status except `AllPaid`
    pub fn requires_payment(&self) -> bool {
        !matches!(self, BillingStatus::AllPaid)
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            BillingStatus::RegistrationFeeRequired => "registration_fee_required",
            BillingStatus::ConsultationFeeRequired => "consultation_fee_required",
            BillingStatus::ConsultationPending => "consultation_pending",
            BillingStatus::ConsultationPartial => "consultation_partial",
            BillingStatus::RegistrationPending => "registration_pending",
            BillingStatus::RegistrationPartial => "registration_partial",
            BillingStatus::ServicePending => "service_pending",
            BillingStatus::ServicePartial => "service_partial",
            BillingStatus::PendingPayment => "pending_payment",
            BillingStatus::AllPaid => "all_paid",
        }
    }
}

impl fmt::Display for BillingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label(Screen::ConsultationBilling))
    }
}
