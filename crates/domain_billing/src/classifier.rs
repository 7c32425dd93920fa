//! Billing status classification
//!
//! Maps a patient's billing entries to one [`BillingStatus`] plus an
//! outstanding-balance breakdown, and decides whether a follow-up billing
//! request is still unpaid. Classification is pure: it never fails, takes
//! "now" as an argument, and does not depend on entry order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use core_kernel::{CoreError, Money};

use crate::entry::{BillingCategory, BillingEntry, EntryStatus};
use crate::patient::Patient;
use crate::request::BillingRequest;
use crate::status::BillingStatus;

/// Which consultation entries count when deciding consultation status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationScope {
    /// Every consultation entry counts
    #[default]
    AnyEntry,
    /// Entries issued by the assigned doctor; the first consultation entry
    /// when none of them match
    AssignedDoctor,
}

impl FromStr for ConsultationScope {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "any" | "any_entry" => Ok(ConsultationScope::AnyEntry),
            "assigned_doctor" | "doctor" => Ok(ConsultationScope::AssignedDoctor),
            _ => Err(CoreError::unknown_label("consultation scope", s.trim())),
        }
    }
}

/// Outstanding balance per category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutstandingBalance {
    pub consultation: Money,
    pub registration: Money,
    pub service: Money,
    pub total: Money,
}

impl OutstandingBalance {
    /// Sums the remaining balance of each entry into its category
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a BillingEntry>) -> Self {
        let mut balance = Self::default();
        for entry in entries {
            let remaining = entry.remaining_balance();
            match entry.category() {
                Some(BillingCategory::Consultation) => balance.consultation += remaining,
                Some(BillingCategory::Registration) => balance.registration += remaining,
                Some(BillingCategory::Service) => balance.service += remaining,
                None => continue,
            }
        }
        balance.total = balance.consultation + balance.registration + balance.service;
        balance
    }

    /// Outstanding amount for one category
    pub fn for_category(&self, category: BillingCategory) -> Money {
        match category {
            BillingCategory::Consultation => self.consultation,
            BillingCategory::Registration => self.registration,
            BillingCategory::Service => self.service,
        }
    }

    pub fn is_settled(&self) -> bool {
        self.total.is_zero()
    }
}

/// Flags derived alongside the status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BillingFlags {
    pub is_new_patient: bool,
    pub has_unpaid_consultation: bool,
    pub has_unpaid_registration: bool,
    pub has_unpaid_services: bool,
}

/// Result of classifying one patient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingSummary {
    pub status: BillingStatus,
    pub outstanding: OutstandingBalance,
    pub flags: BillingFlags,
}

/// Patient and billing-request classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct BillingStatusClassifier {
    scope: ConsultationScope,
}

impl BillingStatusClassifier {
    pub fn new(scope: ConsultationScope) -> Self {
        Self { scope }
    }

    pub fn scope(&self) -> ConsultationScope {
        self.scope
    }

    /// Classifies a patient at `now`
    pub fn classify_patient(&self, patient: &Patient, now: DateTime<Utc>) -> BillingSummary {
        let entries = &patient.billing;
        let outstanding = OutstandingBalance::from_entries(entries);
        let consultations = self.scoped_consultations(patient);

        let has_registration = entries
            .iter()
            .any(|e| e.category() == Some(BillingCategory::Registration));

        let consultation = worst_status(consultations.iter().copied());
        let registration = worst_status(in_category(entries, BillingCategory::Registration));
        let service = worst_status(in_category(entries, BillingCategory::Service));

        let flags = BillingFlags {
            is_new_patient: patient.is_new_patient(now),
            has_unpaid_consultation: is_outstanding(consultation),
            has_unpaid_registration: is_outstanding(registration),
            has_unpaid_services: is_outstanding(service),
        };

        let status = if flags.is_new_patient && !has_registration {
            BillingStatus::RegistrationFeeRequired
        } else if entries.is_empty() || consultations.is_empty() {
            BillingStatus::ConsultationFeeRequired
        } else if let Some(status) = pending_status(consultation, registration, service) {
            status
        } else if entries
            .iter()
            .all(|e| e.normalized_status() == EntryStatus::Paid)
        {
            BillingStatus::AllPaid
        } else {
            BillingStatus::PendingPayment
        };

        BillingSummary {
            status,
            outstanding,
            flags,
        }
    }

    /// Outstanding breakdown for a patient
    pub fn outstanding(&self, patient: &Patient) -> OutstandingBalance {
        OutstandingBalance::from_entries(&patient.billing)
    }

    /// Returns true if a follow-up billing request still needs payment
    ///
    /// A request without billing entries is unpaid unless its status says it
    /// was settled.
    pub fn is_request_unpaid(&self, request: &BillingRequest) -> bool {
        let entry_unpaid = request
            .billing
            .iter()
            .any(|e| e.normalized_status().is_outstanding());
        let remaining_due = request.remaining.map(|r| r.is_positive()).unwrap_or(false);
        let totals_due = matches!((request.total, request.paid), (Some(total), Some(paid)) if total > paid);
        let missing_billing = request.billing.is_empty() && !request.request_status().is_settled();

        entry_unpaid || remaining_due || totals_due || missing_billing
    }

    /// Amount still owed on a request
    pub fn request_outstanding(&self, request: &BillingRequest) -> Money {
        if let Some(remaining) = request.remaining {
            return remaining.max_zero();
        }
        if let (Some(total), Some(paid)) = (request.total, request.paid) {
            return total.saturating_sub(paid);
        }
        request
            .billing
            .iter()
            .map(BillingEntry::remaining_balance)
            .sum()
    }

    fn scoped_consultations<'a>(&self, patient: &'a Patient) -> Vec<&'a BillingEntry> {
        let all: Vec<&BillingEntry> =
            in_category(&patient.billing, BillingCategory::Consultation).collect();

        match self.scope {
            ConsultationScope::AnyEntry => all,
            ConsultationScope::AssignedDoctor => {
                let assigned = patient.assigned_doctor_id();
                let matching: Vec<&BillingEntry> = all
                    .iter()
                    .copied()
                    .filter(|e| assigned.is_some() && e.doctor() == assigned)
                    .collect();
                if matching.is_empty() {
                    all.into_iter().take(1).collect()
                } else {
                    matching
                }
            }
        }
    }
}

/// Classifies a patient with the default consultation scope
pub fn classify_patient(patient: &Patient, now: DateTime<Utc>) -> BillingSummary {
    BillingStatusClassifier::default().classify_patient(patient, now)
}

fn in_category(
    entries: &[BillingEntry],
    category: BillingCategory,
) -> impl Iterator<Item = &BillingEntry> {
    entries.iter().filter(move |e| e.category() == Some(category))
}

/// Least-paid status among `entries`; `None` when there are none
fn worst_status<'a>(entries: impl Iterator<Item = &'a BillingEntry>) -> Option<EntryStatus> {
    entries.map(BillingEntry::normalized_status).min()
}

fn is_outstanding(status: Option<EntryStatus>) -> bool {
    status.map(|s| s.is_outstanding()).unwrap_or(false)
}

fn pending_status(
    consultation: Option<EntryStatus>,
    registration: Option<EntryStatus>,
    service: Option<EntryStatus>,
) -> Option<BillingStatus> {
    match (consultation, registration, service) {
        (Some(EntryStatus::Unpaid), _, _) => Some(BillingStatus::ConsultationPending),
        (Some(EntryStatus::Partial), _, _) => Some(BillingStatus::ConsultationPartial),
        (_, Some(EntryStatus::Unpaid), _) => Some(BillingStatus::RegistrationPending),
        (_, Some(EntryStatus::Partial), _) => Some(BillingStatus::RegistrationPartial),
        (_, _, Some(EntryStatus::Unpaid)) => Some(BillingStatus::ServicePending),
        (_, _, Some(EntryStatus::Partial)) => Some(BillingStatus::ServicePartial),
        _ => None,
    }
}
