//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use core_kernel::Money;
use domain_billing::{BillingStatus, BillingSummary, Patient, Screen};

/// Asserts that two Money values are equal, printing both in rupees
pub fn assert_money_eq(actual: Money, expected: Money) {
    assert_eq!(
        actual, expected,
        "Money mismatch: actual={}, expected={}",
        actual, expected
    );
}

/// Asserts that a summary carries `expected`, naming both screen labels on failure
pub fn assert_status(summary: &BillingSummary, expected: BillingStatus) {
    assert_eq!(
        summary.status,
        expected,
        "Expected '{}' / '{}', got '{}' / '{}'",
        expected.label(Screen::PendingBillsNotification),
        expected.label(Screen::ConsultationBilling),
        summary.status.label(Screen::PendingBillsNotification),
        summary.status.label(Screen::ConsultationBilling),
    );
}

/// Asserts that the outstanding breakdown is non-negative and adds up
///
/// # Panics
///
/// Panics if any category is negative or the total differs from the sum
pub fn assert_outstanding_consistent(summary: &BillingSummary) {
    let o = &summary.outstanding;
    for (name, amount) in [
        ("consultation", o.consultation),
        ("registration", o.registration),
        ("service", o.service),
        ("total", o.total),
    ] {
        assert!(!amount.is_negative(), "Negative {} outstanding: {}", name, amount);
    }
    assert_money_eq(o.total, o.consultation + o.registration + o.service);
}

/// Asserts that a patient has no outstanding balance in any category
pub fn assert_patient_settled(patient: &Patient) {
    let outstanding: Vec<String> = patient
        .billing
        .iter()
        .filter(|e| e.category().is_some() && !e.remaining_balance().is_zero())
        .map(|e| format!("{} {}", e.entry_type.as_str(), e.remaining_balance()))
        .collect();
    assert!(
        outstanding.is_empty(),
        "Patient {} still owes: {}",
        patient.id,
        outstanding.join(", ")
    );
}
