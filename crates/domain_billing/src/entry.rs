//! Billing entries
//!
//! One line item attached to a patient or a follow-up request. Entries
//! arrive with free-text type and status fields; this module normalizes them
//! into closed enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::{CoreError, DoctorId, EntryId, Money};

use crate::lenient;

/// Kind of charge an entry represents
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum EntryType {
    /// Doctor consultation fee
    Consultation,
    /// One-time registration fee for new patients
    Registration,
    /// Service charges (procedures, dressings, ...)
    Service,
    /// Laboratory test
    Test,
    /// Medication
    Medication,
    /// Anything the clinic API sends that we do not recognize
    #[default]
    Unknown,
    /// Unrecognized label, kept verbatim
    Other(String),
}

impl EntryType {
    /// Parses a free-text type label, ignoring case and surrounding space
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "" => EntryType::Unknown,
            "consultation" | "consultation fee" | "consultation_fee" => EntryType::Consultation,
            "registration" | "registration fee" | "registration_fee" => EntryType::Registration,
            "service" | "services" | "service charge" | "service charges" | "service_charges" => {
                EntryType::Service
            }
            "test" | "lab" | "lab test" => EntryType::Test,
            "medication" | "medicine" | "pharmacy" => EntryType::Medication,
            _ => EntryType::Other(label.trim().to_string()),
        }
    }

    /// Returns the wire label
    pub fn as_str(&self) -> &str {
        match self {
            EntryType::Consultation => "consultation",
            EntryType::Registration => "registration",
            EntryType::Service => "service",
            EntryType::Test => "test",
            EntryType::Medication => "medication",
            EntryType::Unknown => "",
            EntryType::Other(label) => label,
        }
    }
}

impl From<String> for EntryType {
    fn from(label: String) -> Self {
        EntryType::parse(&label)
    }
}

impl From<Option<String>> for EntryType {
    fn from(label: Option<String>) -> Self {
        label.map(EntryType::from).unwrap_or_default()
    }
}

impl From<EntryType> for String {
    fn from(entry_type: EntryType) -> Self {
        entry_type.as_str().to_string()
    }
}

/// Normalized payment state of a single entry
///
/// `Unpaid -> Partial -> Paid`; `Paid` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Unpaid,
    Partial,
    Paid,
}

impl EntryStatus {
    /// Returns true if moving from `self` to `next` is a legal payment step
    pub fn can_transition_to(&self, next: EntryStatus) -> bool {
        match (self, next) {
            (EntryStatus::Paid, EntryStatus::Paid) => true,
            (EntryStatus::Paid, _) => false,
            (EntryStatus::Partial, EntryStatus::Unpaid) => false,
            _ => true,
        }
    }

    /// Applies a transition, rejecting anything that would remove a payment
    pub fn transition(self, next: EntryStatus) -> Result<EntryStatus, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::invalid_transition(self, next))
        }
    }

    /// Returns true unless the entry is fully paid
    pub fn is_outstanding(&self) -> bool {
        !matches!(self, EntryStatus::Paid)
    }
}

/// The three categories that carry an outstanding balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCategory {
    Consultation,
    Registration,
    Service,
}

impl BillingCategory {
    pub const ALL: [BillingCategory; 3] = [
        BillingCategory::Consultation,
        BillingCategory::Registration,
        BillingCategory::Service,
    ];
}

impl fmt::Display for BillingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BillingCategory::Consultation => "consultation",
            BillingCategory::Registration => "registration",
            BillingCategory::Service => "service",
        };
        f.write_str(name)
    }
}

/// A doctor reference: either a bare id or a populated document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DoctorRef {
    Id(DoctorId),
    Embedded {
        #[serde(rename = "_id")]
        id: DoctorId,
        #[serde(default)]
        name: Option<String>,
    },
}

impl DoctorRef {
    /// Returns the referenced doctor's id
    pub fn id(&self) -> &DoctorId {
        match self {
            DoctorRef::Id(id) => id,
            DoctorRef::Embedded { id, .. } => id,
        }
    }

    /// Returns the doctor's name when the reference was populated
    pub fn name(&self) -> Option<&str> {
        match self {
            DoctorRef::Id(_) => None,
            DoctorRef::Embedded { name, .. } => name.as_deref(),
        }
    }
}

impl From<DoctorId> for DoctorRef {
    fn from(id: DoctorId) -> Self {
        DoctorRef::Id(id)
    }
}

/// One billing line item
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingEntry {
    /// Entry id, when the API assigned one
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntryId>,
    /// Charge type
    #[serde(rename = "type", default)]
    pub entry_type: EntryType,
    /// Billed amount
    #[serde(default, deserialize_with = "lenient::money_or_zero")]
    pub amount: Money,
    /// Amount paid so far
    #[serde(default, deserialize_with = "lenient::money_or_zero")]
    pub paid_amount: Money,
    /// Raw status label as sent by the API
    #[serde(default)]
    pub status: Option<String>,
    /// Precomputed remainder, when the API sends one
    ///
    /// Informational only. Balances are always derived from `amount` and
    /// `paid_amount`.
    #[serde(default, deserialize_with = "lenient::money_opt")]
    pub remaining: Option<Money>,
    /// Doctor who issued the bill
    #[serde(default)]
    pub doctor_id: Option<DoctorRef>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default, deserialize_with = "lenient::datetime_opt")]
    pub paid_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::text_opt")]
    pub paid_by: Option<String>,
}

impl BillingEntry {
    /// Creates an unpaid entry
    pub fn new(entry_type: EntryType, amount: Money) -> Self {
        Self {
            entry_type,
            amount,
            ..Default::default()
        }
    }

    /// Sets the amount paid so far
    pub fn with_paid(mut self, paid_amount: Money) -> Self {
        self.paid_amount = paid_amount;
        self
    }

    /// Sets the raw status label
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Sets the issuing doctor
    pub fn with_doctor(mut self, doctor_id: DoctorId) -> Self {
        self.doctor_id = Some(DoctorRef::Id(doctor_id));
        self
    }

    /// Sets the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the precomputed remainder
    pub fn with_remaining(mut self, remaining: Money) -> Self {
        self.remaining = Some(remaining);
        self
    }

    /// Billed amount, floored at zero
    pub fn effective_amount(&self) -> Money {
        self.amount.max_zero()
    }

    /// Paid amount, floored at zero and capped at the billed amount
    pub fn effective_paid(&self) -> Money {
        let paid = self.paid_amount.max_zero();
        let amount = self.effective_amount();
        if paid > amount {
            amount
        } else {
            paid
        }
    }

    fn status_label_is_paid(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| {
                let s = s.trim();
                s.eq_ignore_ascii_case("paid") || s.eq_ignore_ascii_case("completed")
            })
            .unwrap_or(false)
    }

    /// Normalizes the entry to `Paid`, `Partial` or `Unpaid`
    ///
    /// Anything that is neither explicitly paid nor partially paid is
    /// `Unpaid`, including missing status and zero amounts.
    pub fn normalized_status(&self) -> EntryStatus {
        if self.status_label_is_paid() {
            return EntryStatus::Paid;
        }

        let amount = self.effective_amount();
        let paid = self.effective_paid();

        if amount.is_positive() && paid >= amount {
            EntryStatus::Paid
        } else if paid.is_positive() && paid < amount {
            EntryStatus::Partial
        } else {
            EntryStatus::Unpaid
        }
    }

    /// Balance still owed on this entry, never negative
    ///
    /// Bounded by `amount - paid_amount` so the balance always agrees with
    /// the normalized status.
    pub fn remaining_balance(&self) -> Money {
        if self.normalized_status() == EntryStatus::Paid {
            return Money::zero();
        }
        self.effective_amount().saturating_sub(self.effective_paid())
    }

    /// Category this entry counts towards, if any
    ///
    /// Consultation wins over the other categories when the description
    /// mentions a consultation.
    pub fn category(&self) -> Option<BillingCategory> {
        let described_as_consultation = self
            .description
            .as_deref()
            .map(|d| d.to_ascii_lowercase().contains("consultation"))
            .unwrap_or(false);

        if self.entry_type == EntryType::Consultation || described_as_consultation {
            Some(BillingCategory::Consultation)
        } else if self.entry_type == EntryType::Registration {
            Some(BillingCategory::Registration)
        } else if self.entry_type == EntryType::Service {
            Some(BillingCategory::Service)
        } else {
            None
        }
    }

    /// Returns the issuing doctor's id, if any
    pub fn doctor(&self) -> Option<&DoctorId> {
        self.doctor_id.as_ref().map(DoctorRef::id)
    }

    /// Rewrites negative or overpaid amounts into their effective values
    ///
    /// A precomputed `remaining` that disagrees with the amounts is replaced
    /// by the derived balance. Returns true if anything changed.
    pub fn sanitize(&mut self) -> bool {
        let amount = self.effective_amount();
        let paid = self.effective_paid();
        let remaining = self.remaining.map(|_| self.remaining_balance());
        let changed = amount != self.amount || paid != self.paid_amount || remaining != self.remaining;

        if changed {
            tracing::debug!(
                entry_id = ?self.id,
                amount = %self.amount,
                paid_amount = %self.paid_amount,
                remaining = ?self.remaining,
                "Sanitized degenerate billing entry"
            );
            self.amount = amount;
            self.paid_amount = paid;
            self.remaining = remaining;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn consultation(amount: i64, paid: i64) -> BillingEntry {
        BillingEntry::new(EntryType::Consultation, Money::from_major(amount))
            .with_paid(Money::from_major(paid))
    }

    #[test]
    fn test_entry_type_parse_is_case_insensitive() {
        assert_eq!(EntryType::parse(" Consultation "), EntryType::Consultation);
        assert_eq!(EntryType::parse("SERVICE"), EntryType::Service);
        assert_eq!(EntryType::parse("xray"), EntryType::Other("xray".to_string()));
        assert_eq!(EntryType::parse(""), EntryType::Unknown);
    }

    #[test]
    fn test_status_label_wins() {
        let entry = consultation(500, 0).with_status("Completed");
        assert_eq!(entry.normalized_status(), EntryStatus::Paid);
        assert!(entry.remaining_balance().is_zero());
    }

    #[test]
    fn test_amount_based_normalization() {
        assert_eq!(consultation(850, 850).normalized_status(), EntryStatus::Paid);
        assert_eq!(consultation(500, 200).normalized_status(), EntryStatus::Partial);
        assert_eq!(consultation(500, 0).with_status("No payments").normalized_status(), EntryStatus::Unpaid);
        assert_eq!(consultation(0, 0).normalized_status(), EntryStatus::Unpaid);
    }

    #[test]
    fn test_remaining_is_derived_from_amounts() {
        let stale = consultation(500, 200).with_remaining(Money::from_major(250));
        assert_eq!(stale.remaining_balance(), Money::from_major(300));

        let computed = consultation(500, 200);
        assert_eq!(computed.remaining_balance(), Money::from_major(300));
    }

    #[test]
    fn test_zero_remaining_on_unpaid_entry_still_owes() {
        let entry = consultation(500, 0).with_remaining(Money::zero());
        assert_eq!(entry.normalized_status(), EntryStatus::Unpaid);
        assert_eq!(entry.remaining_balance(), Money::from_major(500));
    }

    #[test]
    fn test_sanitize_caps_inflated_remaining() {
        let mut entry = consultation(500, 0).with_remaining(Money::from_major(5000));
        assert!(entry.sanitize());
        assert_eq!(entry.remaining, Some(Money::from_major(500)));
        assert_eq!(entry.remaining_balance(), Money::from_major(500));

        let mut negative = consultation(500, 100).with_remaining(Money::from_major(-20));
        assert!(negative.sanitize());
        assert_eq!(negative.remaining, Some(Money::from_major(400)));
    }

    #[test]
    fn test_overpayment_reads_as_paid() {
        let entry = consultation(500, 700);
        assert_eq!(entry.effective_paid(), Money::from_major(500));
        assert_eq!(entry.normalized_status(), EntryStatus::Paid);
    }

    #[test]
    fn test_sanitize_clamps_negative_values() {
        let mut entry = BillingEntry::new(EntryType::Service, Money::new(dec!(-10)))
            .with_paid(Money::new(dec!(-5)));
        assert!(entry.sanitize());
        assert!(entry.amount.is_zero());
        assert!(entry.paid_amount.is_zero());
        assert!(!entry.sanitize());
    }

    #[test]
    fn test_description_marks_consultation() {
        let entry = BillingEntry::new(EntryType::Service, Money::from_major(300))
            .with_description("Follow-up Consultation");
        assert_eq!(entry.category(), Some(BillingCategory::Consultation));
    }

    #[test]
    fn test_paid_is_terminal() {
        assert!(EntryStatus::Unpaid.can_transition_to(EntryStatus::Partial));
        assert!(EntryStatus::Partial.can_transition_to(EntryStatus::Paid));
        assert!(EntryStatus::Paid.transition(EntryStatus::Partial).is_err());
        assert!(EntryStatus::Partial.transition(EntryStatus::Unpaid).is_err());
    }

    #[test]
    fn test_deserialize_wire_entry() {
        let entry: BillingEntry = serde_json::from_str(
            r#"{"_id": "e1", "type": "Consultation", "amount": 850, "paidAmount": null,
                "status": "no payments", "doctorId": {"_id": "d1", "name": "Dr. Rao"}}"#,
        )
        .unwrap();
        assert_eq!(entry.entry_type, EntryType::Consultation);
        assert!(entry.paid_amount.is_zero());
        assert_eq!(entry.doctor(), Some(&DoctorId::new("d1")));
        assert_eq!(entry.normalized_status(), EntryStatus::Unpaid);
    }
}
