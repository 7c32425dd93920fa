//! Property-Based Test Generators
//!
//! Provides proptest strategies for billing data, including the degenerate
//! shapes the clinic API is known to send (negative amounts, overpayments,
//! inconsistent status labels).

use chrono::{DateTime, Duration, Utc};
use core_kernel::{DoctorId, Money, PatientId};
use domain_billing::{BillingEntry, EntryType, Patient};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Amounts in paise between 0 and ₹50,000
pub fn amount_strategy() -> impl Strategy<Value = Money> {
    (0i64..5_000_000i64).prop_map(|paise| Money::new(Decimal::new(paise, 2)))
}

/// Strictly positive amounts
pub fn positive_amount_strategy() -> impl Strategy<Value = Money> {
    (1i64..5_000_000i64).prop_map(|paise| Money::new(Decimal::new(paise, 2)))
}

/// Amounts that may be negative
pub fn signed_amount_strategy() -> impl Strategy<Value = Money> {
    (-100_000i64..5_000_000i64).prop_map(|paise| Money::new(Decimal::new(paise, 2)))
}

pub fn entry_type_strategy() -> impl Strategy<Value = EntryType> {
    prop_oneof![
        3 => Just(EntryType::Consultation),
        2 => Just(EntryType::Registration),
        3 => Just(EntryType::Service),
        1 => Just(EntryType::Test),
        1 => Just(EntryType::Medication),
        1 => Just(EntryType::Unknown),
    ]
}

/// Status labels as the API spells them
pub fn status_label_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("paid".to_string())),
        Just(Some("Completed".to_string())),
        Just(Some("pending".to_string())),
        Just(Some("No payments".to_string())),
        Just(Some("no payments".to_string())),
        Just(Some("partial".to_string())),
    ]
}

/// A well-formed entry: amounts non-negative, paid never above amount
pub fn billing_entry_strategy() -> impl Strategy<Value = BillingEntry> {
    (entry_type_strategy(), amount_strategy(), 0u32..=100u32, status_label_strategy()).prop_map(
        |(entry_type, amount, paid_percent, status)| {
            let paid = Money::new(amount.amount() * Decimal::from(paid_percent) / Decimal::from(100));
            let mut entry = BillingEntry::new(entry_type, amount).with_paid(paid);
            entry.status = status;
            entry
        },
    )
}

/// Any entry, including negative amounts and overpayments
pub fn degenerate_entry_strategy() -> impl Strategy<Value = BillingEntry> {
    (
        entry_type_strategy(),
        signed_amount_strategy(),
        signed_amount_strategy(),
        status_label_strategy(),
        proptest::option::of(signed_amount_strategy()),
    )
        .prop_map(|(entry_type, amount, paid, status, remaining)| {
            let mut entry = BillingEntry::new(entry_type, amount).with_paid(paid);
            entry.status = status;
            entry.remaining = remaining;
            entry
        })
}

/// A patient created up to 72 hours before `now`, with up to 8 entries
pub fn patient_strategy(now: DateTime<Utc>) -> impl Strategy<Value = Patient> {
    (
        "[a-f0-9]{24}",
        "[A-Z][a-z]{2,10}",
        proptest::option::of(0i64..72i64),
        proptest::option::of(prop_oneof![Just("d1"), Just("d2")]),
        proptest::collection::vec(degenerate_entry_strategy(), 0..8),
    )
        .prop_map(move |(id, name, hours_ago, doctor, billing)| {
            let mut patient = Patient::new(PatientId::new(id), name);
            patient.created_at = hours_ago.map(|h| now - Duration::hours(h));
            if let Some(doctor) = doctor {
                patient = patient.with_assigned_doctor(DoctorId::new(doctor));
            }
            patient.billing = billing;
            patient
        })
}
