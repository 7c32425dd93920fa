//! Patient records as served by the clinic API

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{DoctorId, PatientId};

use crate::entry::{BillingEntry, DoctorRef};
use crate::lenient;

/// How long after creation a patient still counts as new
pub const NEW_PATIENT_WINDOW_HOURS: i64 = 24;

/// A patient with embedded billing entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(rename = "_id")]
    pub id: PatientId,
    #[serde(default, deserialize_with = "lenient::string_or_empty")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::u32_opt")]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient::text_opt")]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form address; some records carry a structured document
    #[serde(default)]
    pub address: Option<serde_json::Value>,
    /// Hospital-issued identifier shown on receipts
    #[serde(default)]
    pub uh_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::datetime_opt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assigned_doctor: Option<DoctorRef>,
    #[serde(default, deserialize_with = "lenient::vec_or_empty")]
    pub billing: Vec<BillingEntry>,
}

impl Patient {
    /// Creates a patient without billing entries
    pub fn new(id: PatientId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            age: None,
            gender: None,
            phone: None,
            email: None,
            address: None,
            uh_id: None,
            created_at: None,
            assigned_doctor: None,
            billing: Vec::new(),
        }
    }

    /// Sets the creation timestamp
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Sets the assigned doctor
    pub fn with_assigned_doctor(mut self, doctor_id: DoctorId) -> Self {
        self.assigned_doctor = Some(DoctorRef::Id(doctor_id));
        self
    }

    /// Appends a billing entry
    pub fn with_entry(mut self, entry: BillingEntry) -> Self {
        self.billing.push(entry);
        self
    }

    /// Returns the assigned doctor's id, if any
    pub fn assigned_doctor_id(&self) -> Option<&DoctorId> {
        self.assigned_doctor.as_ref().map(DoctorRef::id)
    }

    /// Returns true if the patient was created within the new-patient window
    ///
    /// A record without a creation time counts as new, so the registration
    /// fee is never silently waived.
    pub fn is_new_patient(&self, now: DateTime<Utc>) -> bool {
        match self.created_at {
            Some(created_at) => now - created_at <= Duration::hours(NEW_PATIENT_WINDOW_HOURS),
            None => true,
        }
    }

    /// Sanitizes every billing entry; returns how many were rewritten
    pub fn sanitize(&mut self) -> usize {
        let rewritten = self.billing.iter_mut().map(BillingEntry::sanitize).filter(|changed| *changed).count();
        if rewritten > 0 {
            tracing::debug!(patient_id = %self.id, rewritten, "Sanitized patient billing entries");
        }
        rewritten
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_new_patient_window() {
        let patient = Patient::new(PatientId::new("p1"), "Meera");

        assert!(patient.clone().with_created_at(now() - Duration::hours(1)).is_new_patient(now()));
        assert!(patient.clone().with_created_at(now() - Duration::hours(24)).is_new_patient(now()));
        assert!(!patient.clone().with_created_at(now() - Duration::hours(30)).is_new_patient(now()));
    }

    #[test]
    fn test_missing_created_at_counts_as_new() {
        let patient = Patient::new(PatientId::new("p1"), "Meera");
        assert!(patient.is_new_patient(now()));
    }

    #[test]
    fn test_deserialize_with_null_billing_and_embedded_doctor() {
        let patient: Patient = serde_json::from_str(
            r#"{"_id": "p9", "name": "Ravi", "age": "41", "uhId": "UH-0009",
                "createdAt": "2024-06-01T08:30:00.000Z",
                "assignedDoctor": {"_id": "d7", "name": "Dr. Iyer"},
                "billing": null}"#,
        )
        .unwrap();

        assert_eq!(patient.age, Some(41));
        assert_eq!(patient.uh_id.as_deref(), Some("UH-0009"));
        assert_eq!(patient.assigned_doctor_id(), Some(&DoctorId::new("d7")));
        assert!(patient.billing.is_empty());
        assert!(!patient.is_new_patient(now()));
    }
}
