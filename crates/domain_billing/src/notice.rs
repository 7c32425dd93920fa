//! Pending-bills notice
//!
//! After login the front desk sees one summary of everyone who still owes
//! money. Whether that notice was already shown is part of the session,
//! and the session ends at logout.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

use core_kernel::{BillingRequestId, Money, PatientId, UserId};

use crate::classifier::{BillingStatusClassifier, OutstandingBalance};
use crate::patient::Patient;
use crate::request::BillingRequest;
use crate::status::{BillingStatus, Screen};

/// A patient who still owes money
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingPatient {
    pub patient_id: PatientId,
    pub name: String,
    pub status: BillingStatus,
    pub label: &'static str,
    pub outstanding: OutstandingBalance,
}

/// A follow-up request that still owes money
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingRequest {
    pub request_id: BillingRequestId,
    pub name: String,
    pub test_type: Option<String>,
    pub outstanding: Money,
}

/// Everything unpaid at one point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingBillsDigest {
    pub patients: Vec<PendingPatient>,
    pub requests: Vec<PendingRequest>,
    pub total_outstanding: Money,
    pub generated_at: DateTime<Utc>,
}

impl PendingBillsDigest {
    /// Collects unpaid patients and requests, largest balance first
    pub fn build(
        classifier: &BillingStatusClassifier,
        patients: &[Patient],
        requests: &[BillingRequest],
        now: DateTime<Utc>,
    ) -> Self {
        let mut pending_patients: Vec<PendingPatient> = patients
            .iter()
            .filter_map(|patient| {
                let summary = classifier.classify_patient(patient, now);
                summary.status.requires_payment().then(|| PendingPatient {
                    patient_id: patient.id.clone(),
                    name: patient.name.clone(),
                    status: summary.status,
                    label: summary.status.label(Screen::PendingBillsNotification),
                    outstanding: summary.outstanding,
                })
            })
            .collect();
        pending_patients.sort_by(|a, b| by_balance_then_name(a.outstanding.total, &a.name, b.outstanding.total, &b.name));

        let mut pending_requests: Vec<PendingRequest> = requests
            .iter()
            .filter(|request| classifier.is_request_unpaid(request))
            .map(|request| PendingRequest {
                request_id: request.id.clone(),
                name: request.display_name(),
                test_type: request.test_type.clone(),
                outstanding: classifier.request_outstanding(request),
            })
            .collect();
        pending_requests.sort_by(|a, b| by_balance_then_name(a.outstanding, &a.name, b.outstanding, &b.name));

        let total_outstanding = pending_patients
            .iter()
            .map(|p| p.outstanding.total)
            .chain(pending_requests.iter().map(|r| r.outstanding))
            .sum();

        Self {
            patients: pending_patients,
            requests: pending_requests,
            total_outstanding,
            generated_at: now,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.patients.is_empty() && self.requests.is_empty()
    }

    /// One-line summary, e.g. "3 patients and 1 follow-up bill pending (₹2450.00)"
    pub fn headline(&self) -> String {
        if self.is_empty() {
            return "No pending bills".to_string();
        }
        format!(
            "{} {} and {} follow-up {} pending ({})",
            self.patients.len(),
            plural(self.patients.len(), "patient", "patients"),
            self.requests.len(),
            plural(self.requests.len(), "bill", "bills"),
            self.total_outstanding
        )
    }
}

fn by_balance_then_name(a_total: Money, a_name: &str, b_total: Money, b_name: &str) -> Ordering {
    b_total
        .cmp(&a_total)
        .then_with(|| a_name.to_lowercase().cmp(&b_name.to_lowercase()))
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}

/// A logged-in user's session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: UserId,
    pub started_at: DateTime<Utc>,
    pending_notice_shown: bool,
}

impl Session {
    pub fn new(user: UserId, started_at: DateTime<Utc>) -> Self {
        Self {
            user,
            started_at,
            pending_notice_shown: false,
        }
    }

    pub fn pending_notice_shown(&self) -> bool {
        self.pending_notice_shown
    }
}

/// Session lifecycle: set at login, cleared at logout
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    current: Option<Session>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a session; replaces any previous one
    pub fn login(&mut self, user: UserId, now: DateTime<Utc>) -> &Session {
        tracing::info!(user = %user, "Session started");
        self.current.insert(Session::new(user, now))
    }

    /// Ends the session
    pub fn logout(&mut self) {
        if let Some(session) = self.current.take() {
            tracing::info!(user = %session.user, "Session ended");
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    /// True once per session, until the notice is marked as shown
    pub fn should_show_pending_notice(&self) -> bool {
        self.current
            .as_ref()
            .map(|s| !s.pending_notice_shown)
            .unwrap_or(false)
    }

    pub fn mark_pending_notice_shown(&mut self) {
        if let Some(session) = self.current.as_mut() {
            session.pending_notice_shown = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{BillingEntry, EntryType};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    fn owing(id: &str, name: &str, amount: i64) -> Patient {
        Patient::new(PatientId::new(id), name)
            .with_created_at(now() - Duration::days(3))
            .with_entry(BillingEntry::new(EntryType::Consultation, Money::from_major(amount)))
    }

    #[test]
    fn test_digest_orders_by_balance_then_name() {
        let paid = Patient::new(PatientId::new("p0"), "Paid Up")
            .with_created_at(now() - Duration::days(3))
            .with_entry(
                BillingEntry::new(EntryType::Consultation, Money::from_major(500))
                    .with_paid(Money::from_major(500)),
            );
        let patients = vec![owing("p1", "zoya", 300), owing("p2", "Anil", 300), owing("p3", "Bela", 900), paid];
        let requests = vec![BillingRequest::new("r1".into()).with_status("Billing Generated")];

        let digest = PendingBillsDigest::build(&BillingStatusClassifier::default(), &patients, &requests, now());

        let names: Vec<&str> = digest.patients.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Bela", "Anil", "zoya"]);
        assert_eq!(digest.requests.len(), 1);
        assert_eq!(digest.total_outstanding, Money::from_major(1500));
        assert_eq!(digest.patients[0].label, "Consultation Fee Pending");
        assert_eq!(digest.headline(), "3 patients and 1 follow-up bill pending (₹1500.00)");
    }

    #[test]
    fn test_notice_shown_once_per_session() {
        let mut context = SessionContext::new();
        assert!(!context.should_show_pending_notice());

        context.login(UserId::new("reception-1"), now());
        assert!(context.should_show_pending_notice());
        context.mark_pending_notice_shown();
        assert!(!context.should_show_pending_notice());

        context.logout();
        assert!(context.current().is_none());
        context.login(UserId::new("reception-1"), now());
        assert!(context.should_show_pending_notice());
    }
}
