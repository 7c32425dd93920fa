//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else. Patient names are random so list ordering
//! tests cannot pass by accident.

use chrono::{DateTime, Duration, Utc};
use core_kernel::{BillingRequestId, DoctorId, Money, PatientId};
use domain_billing::{BillingEntry, BillingRequest, EntryType, Patient, PatientRef};
use fake::faker::name::en::Name;
use fake::Fake;

use crate::fixtures::ClockFixtures;

/// Builder for constructing test patients
pub struct TestPatientBuilder {
    id: PatientId,
    name: String,
    created_at: Option<DateTime<Utc>>,
    assigned_doctor: Option<DoctorId>,
    billing: Vec<BillingEntry>,
}

impl Default for TestPatientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPatientBuilder {
    /// Creates an established patient (registered 10 days before the fixed now)
    pub fn new() -> Self {
        Self {
            id: PatientId::new(format!("p-{}", (1000..9999).fake::<u32>())),
            name: Name().fake(),
            created_at: Some(ClockFixtures::now() - Duration::days(10)),
            assigned_doctor: None,
            billing: Vec::new(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = PatientId::new(id);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Registered `hours` before the fixed now
    pub fn registered_hours_ago(mut self, hours: i64) -> Self {
        self.created_at = Some(ClockFixtures::hours_ago(hours));
        self
    }

    /// Drops the creation timestamp
    pub fn without_created_at(mut self) -> Self {
        self.created_at = None;
        self
    }

    pub fn assigned_to(mut self, doctor_id: DoctorId) -> Self {
        self.assigned_doctor = Some(doctor_id);
        self
    }

    pub fn consultation(self, amount: i64, paid: i64) -> Self {
        self.entry(EntryType::Consultation, amount, paid)
    }

    pub fn registration(self, amount: i64, paid: i64) -> Self {
        self.entry(EntryType::Registration, amount, paid)
    }

    pub fn service(self, amount: i64, paid: i64) -> Self {
        self.entry(EntryType::Service, amount, paid)
    }

    /// Consultation issued by `doctor_id`
    pub fn consultation_by(mut self, doctor_id: DoctorId, amount: i64, paid: i64) -> Self {
        self.billing.push(
            BillingEntry::new(EntryType::Consultation, Money::from_major(amount))
                .with_paid(Money::from_major(paid))
                .with_doctor(doctor_id),
        );
        self
    }

    pub fn entry(mut self, entry_type: EntryType, amount: i64, paid: i64) -> Self {
        self.billing.push(
            BillingEntry::new(entry_type, Money::from_major(amount)).with_paid(Money::from_major(paid)),
        );
        self
    }

    pub fn with_entry(mut self, entry: BillingEntry) -> Self {
        self.billing.push(entry);
        self
    }

    pub fn build(self) -> Patient {
        let mut patient = Patient::new(self.id, self.name);
        patient.created_at = self.created_at;
        if let Some(doctor_id) = self.assigned_doctor {
            patient = patient.with_assigned_doctor(doctor_id);
        }
        patient.billing = self.billing;
        patient
    }
}

/// Builder for constructing follow-up billing requests
pub struct TestBillingRequestBuilder {
    request: BillingRequest,
}

impl Default for TestBillingRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestBillingRequestBuilder {
    pub fn new() -> Self {
        let mut request =
            BillingRequest::new(BillingRequestId::new(format!("r-{}", (1000..9999).fake::<u32>())));
        request.patient_name = Some(Name().fake());
        Self { request }
    }

    pub fn for_patient(mut self, patient: &Patient) -> Self {
        self.request.patient = Some(PatientRef::Id(patient.id.clone()));
        self.request.patient_name = Some(patient.name.clone());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.request.status = Some(status.into());
        self
    }

    pub fn totals(mut self, total: i64, paid: i64) -> Self {
        self.request.total = Some(Money::from_major(total));
        self.request.paid = Some(Money::from_major(paid));
        self
    }

    pub fn remaining(mut self, remaining: i64) -> Self {
        self.request.remaining = Some(Money::from_major(remaining));
        self
    }

    pub fn test(mut self, amount: i64, paid: i64) -> Self {
        self.request.billing.push(
            BillingEntry::new(EntryType::Test, Money::from_major(amount)).with_paid(Money::from_major(paid)),
        );
        self
    }

    pub fn build(self) -> BillingRequest {
        self.request
    }
}
