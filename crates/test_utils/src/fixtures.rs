//! Pre-built Test Fixtures
//!
//! Provides ready-to-use patients and billing requests for the scenarios
//! the front desk sees every day. All timestamps are relative to
//! [`ClockFixtures::now`] so tests never depend on the wall clock.

use chrono::{DateTime, Duration, TimeZone, Utc};
use core_kernel::{BillingRequestId, DoctorId, FixedClock, Money, PatientId};
use domain_billing::{BillingEntry, BillingRequest, EntryType, Patient};

/// Fixture for temporal test data
pub struct ClockFixtures;

impl ClockFixtures {
    /// The fixed "now" used across the suite (Jun 10, 2024, 12:00 UTC)
    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    /// A clock pinned at [`Self::now`]
    pub fn clock() -> FixedClock {
        FixedClock::new(Self::now())
    }

    /// A timestamp `hours` before [`Self::now`]
    pub fn hours_ago(hours: i64) -> DateTime<Utc> {
        Self::now() - Duration::hours(hours)
    }
}

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    pub fn patient_id() -> PatientId {
        PatientId::new("665f1c2ab9e4a1d3c0a10001")
    }

    pub fn doctor_id() -> DoctorId {
        DoctorId::new("665f1c2ab9e4a1d3c0d00001")
    }

    pub fn other_doctor_id() -> DoctorId {
        DoctorId::new("665f1c2ab9e4a1d3c0d00002")
    }

    pub fn request_id() -> BillingRequestId {
        BillingRequestId::new("665f1c2ab9e4a1d3c0f00001")
    }
}

/// Fixture for patients
pub struct PatientFixtures;

impl PatientFixtures {
    /// Registered 1 hour ago, nothing billed yet
    pub fn new_without_billing() -> Patient {
        Patient::new(IdFixtures::patient_id(), "Priya Sharma")
            .with_created_at(ClockFixtures::hours_ago(1))
    }

    /// Registered 30 hours ago, nothing billed yet
    pub fn established_without_billing() -> Patient {
        Patient::new(IdFixtures::patient_id(), "Rahul Verma")
            .with_created_at(ClockFixtures::hours_ago(30))
    }

    /// Consultation of ₹850 fully paid
    pub fn fully_paid_consultation() -> Patient {
        Self::established_without_billing().with_entry(
            BillingEntry::new(EntryType::Consultation, Money::from_major(850))
                .with_paid(Money::from_major(850))
                .with_status("paid")
                .with_doctor(IdFixtures::doctor_id()),
        )
    }

    /// Consultation of ₹500 with ₹200 paid
    pub fn partial_consultation() -> Patient {
        Self::established_without_billing().with_entry(
            BillingEntry::new(EntryType::Consultation, Money::from_major(500))
                .with_paid(Money::from_major(200))
                .with_doctor(IdFixtures::doctor_id()),
        )
    }

    /// Paid consultation and registration, unpaid service charges
    pub fn unpaid_services() -> Patient {
        Self::established_without_billing()
            .with_entry(
                BillingEntry::new(EntryType::Consultation, Money::from_major(500))
                    .with_paid(Money::from_major(500)),
            )
            .with_entry(
                BillingEntry::new(EntryType::Registration, Money::from_major(200))
                    .with_paid(Money::from_major(200)),
            )
            .with_entry(
                BillingEntry::new(EntryType::Service, Money::from_major(350))
                    .with_description("Dressing"),
            )
    }
}

/// Fixture for follow-up billing requests
pub struct RequestFixtures;

impl RequestFixtures {
    /// "Billing Generated" with no billing object attached
    pub fn billing_generated_without_billing() -> BillingRequest {
        BillingRequest::new(IdFixtures::request_id()).with_status("Billing Generated")
    }

    /// A lab test billed and paid in full
    pub fn paid_lab_test() -> BillingRequest {
        BillingRequest::new(BillingRequestId::new("665f1c2ab9e4a1d3c0f00002"))
            .with_status("Paid")
            .with_totals(Money::from_major(1200), Money::from_major(1200))
            .with_entry(
                BillingEntry::new(EntryType::Test, Money::from_major(1200))
                    .with_paid(Money::from_major(1200)),
            )
    }

    /// Wire document with a single-object `billing` field
    pub fn single_object_json() -> serde_json::Value {
        serde_json::json!({
            "_id": "665f1c2ab9e4a1d3c0f00003",
            "patient": {"_id": "665f1c2ab9e4a1d3c0a10001", "name": "Priya Sharma", "phone": "9876500001"},
            "testType": "CBC",
            "status": "billing_pending",
            "billing": {"type": "test", "amount": 650, "paidAmount": 0, "status": "pending"}
        })
    }
}
