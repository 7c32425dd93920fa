//! Follow-up and lab-test billing requests
//!
//! The `billing` field of a request arrives as a single object, an array,
//! or null depending on which endpoint produced it. It is decoded into
//! [`BillingShape`] and flattened to a list immediately, so nothing
//! downstream branches on the wire shape.

use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{BillingRequestId, Money, PatientId};

use crate::entry::BillingEntry;
use crate::lenient;

/// Wire shape of a request's `billing` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BillingShape {
    Many(Vec<BillingEntry>),
    One(Box<BillingEntry>),
}

impl BillingShape {
    /// Flattens either shape into a list of entries
    pub fn into_entries(self) -> Vec<BillingEntry> {
        match self {
            BillingShape::Many(entries) => entries,
            BillingShape::One(entry) => vec![*entry],
        }
    }
}

/// Patient reference on a request: a bare id or an embedded document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatientRef {
    Id(PatientId),
    Embedded {
        #[serde(rename = "_id")]
        id: PatientId,
        #[serde(default)]
        name: Option<String>,
        #[serde(default, deserialize_with = "lenient::text_opt")]
        phone: Option<String>,
    },
}

impl PatientRef {
    pub fn id(&self) -> &PatientId {
        match self {
            PatientRef::Id(id) => id,
            PatientRef::Embedded { id, .. } => id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            PatientRef::Id(_) => None,
            PatientRef::Embedded { name, .. } => name.as_deref(),
        }
    }
}

/// Normalized request status
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestStatus {
    NoPayments,
    BillingPending,
    BillingGenerated,
    Pending,
    Paid,
    Completed,
    Other(String),
}

impl RequestStatus {
    /// Parses a free-text status; casing, underscores and hyphens are ignored
    pub fn parse(label: &str) -> Self {
        let normalized: String = label
            .trim()
            .chars()
            .map(|c| if c == '_' || c == '-' { ' ' } else { c.to_ascii_lowercase() })
            .collect();
        let normalized = normalized.split_whitespace().collect::<Vec<_>>().join(" ");

        match normalized.as_str() {
            "no payments" | "no payment" => RequestStatus::NoPayments,
            "billing pending" => RequestStatus::BillingPending,
            "billing generated" => RequestStatus::BillingGenerated,
            "pending" => RequestStatus::Pending,
            "paid" => RequestStatus::Paid,
            "completed" => RequestStatus::Completed,
            _ => RequestStatus::Other(label.trim().to_string()),
        }
    }

    /// Returns true for statuses that mean the request was settled
    pub fn is_settled(&self) -> bool {
        matches!(self, RequestStatus::Paid | RequestStatus::Completed)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStatus::NoPayments => f.write_str("No Payments"),
            RequestStatus::BillingPending => f.write_str("Billing Pending"),
            RequestStatus::BillingGenerated => f.write_str("Billing Generated"),
            RequestStatus::Pending => f.write_str("Pending"),
            RequestStatus::Paid => f.write_str("Paid"),
            RequestStatus::Completed => f.write_str("Completed"),
            RequestStatus::Other(label) => f.write_str(label),
        }
    }
}

/// Request as it appears on the wire
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBillingRequest {
    #[serde(rename = "_id")]
    id: BillingRequestId,
    #[serde(default)]
    patient: Option<PatientRef>,
    #[serde(default)]
    patient_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text_opt")]
    patient_phone: Option<String>,
    #[serde(default)]
    test_type: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient::money_opt")]
    total: Option<Money>,
    #[serde(default, deserialize_with = "lenient::money_opt")]
    paid: Option<Money>,
    #[serde(default, deserialize_with = "lenient::money_opt")]
    remaining: Option<Money>,
    #[serde(default)]
    billing: Option<BillingShape>,
}

/// A follow-up or lab-test request with its billing entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawBillingRequest", rename_all = "camelCase")]
pub struct BillingRequest {
    #[serde(rename = "_id")]
    pub id: BillingRequestId,
    pub patient: Option<PatientRef>,
    pub patient_name: Option<String>,
    pub patient_phone: Option<String>,
    pub test_type: Option<String>,
    pub status: Option<String>,
    pub total: Option<Money>,
    pub paid: Option<Money>,
    pub remaining: Option<Money>,
    pub billing: Vec<BillingEntry>,
}

impl From<RawBillingRequest> for BillingRequest {
    fn from(raw: RawBillingRequest) -> Self {
        Self {
            id: raw.id,
            patient: raw.patient,
            patient_name: raw.patient_name,
            patient_phone: raw.patient_phone,
            test_type: raw.test_type,
            status: raw.status,
            total: raw.total,
            paid: raw.paid,
            remaining: raw.remaining,
            billing: raw.billing.map(BillingShape::into_entries).unwrap_or_default(),
        }
    }
}

impl BillingRequest {
    /// Creates a request without billing entries
    pub fn new(id: BillingRequestId) -> Self {
        Self {
            id,
            patient: None,
            patient_name: None,
            patient_phone: None,
            test_type: None,
            status: None,
            total: None,
            paid: None,
            remaining: None,
            billing: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_totals(mut self, total: Money, paid: Money) -> Self {
        self.total = Some(total);
        self.paid = Some(paid);
        self
    }

    pub fn with_entry(mut self, entry: BillingEntry) -> Self {
        self.billing.push(entry);
        self
    }

    /// Normalized status; a missing label reads as "No Payments"
    pub fn request_status(&self) -> RequestStatus {
        self.status
            .as_deref()
            .map(RequestStatus::parse)
            .unwrap_or(RequestStatus::NoPayments)
    }

    /// Name to show in lists: the explicit name, the embedded patient's name,
    /// or the patient id
    pub fn display_name(&self) -> String {
        self.patient_name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| self.patient.as_ref().and_then(|p| p.name().map(str::to_string)))
            .or_else(|| self.patient.as_ref().map(|p| p.id().to_string()))
            .unwrap_or_else(|| "Unknown patient".to_string())
    }

    /// Sanitizes every billing entry; returns how many were rewritten
    pub fn sanitize(&mut self) -> usize {
        self.billing
            .iter_mut()
            .map(BillingEntry::sanitize)
            .filter(|changed| *changed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryType;

    #[test]
    fn test_single_object_billing_is_flattened() {
        let request: BillingRequest = serde_json::from_str(
            r#"{"_id": "r1", "status": "Billing Generated",
                "billing": {"type": "test", "amount": 1200, "paidAmount": 0}}"#,
        )
        .unwrap();

        assert_eq!(request.billing.len(), 1);
        assert_eq!(request.billing[0].entry_type, EntryType::Test);
        assert_eq!(request.request_status(), RequestStatus::BillingGenerated);
    }

    #[test]
    fn test_array_and_null_billing() {
        let many: BillingRequest = serde_json::from_str(
            r#"{"_id": "r2", "billing": [{"amount": 100}, {"amount": 200}]}"#,
        )
        .unwrap();
        assert_eq!(many.billing.len(), 2);

        let none: BillingRequest = serde_json::from_str(r#"{"_id": "r3", "billing": null}"#).unwrap();
        assert!(none.billing.is_empty());
    }

    #[test]
    fn test_status_normalization() {
        assert_eq!(RequestStatus::parse("BILLING_PENDING"), RequestStatus::BillingPending);
        assert_eq!(RequestStatus::parse("no-payments"), RequestStatus::NoPayments);
        assert_eq!(RequestStatus::parse(" Completed "), RequestStatus::Completed);
        assert!(RequestStatus::parse("paid").is_settled());
        assert_eq!(RequestStatus::parse("on hold"), RequestStatus::Other("on hold".to_string()));
    }

    #[test]
    fn test_display_name_falls_back_to_embedded_patient() {
        let request: BillingRequest = serde_json::from_str(
            r#"{"_id": "r4", "patient": {"_id": "p1", "name": "Lakshmi", "phone": 9876543210}}"#,
        )
        .unwrap();
        assert_eq!(request.display_name(), "Lakshmi");
        assert_eq!(request.patient.as_ref().map(PatientRef::id), Some(&PatientId::new("p1")));
    }
}
