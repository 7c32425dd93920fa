//! Comprehensive tests for domain_billing

use proptest::prelude::*;

use core_kernel::{Money, PatientId};

use domain_billing::{
    BillingCategory, BillingEntry, BillingError, BillingRequest, BillingStatus,
    BillingStatusClassifier, ConsultationScope, EntryStatus, EntryType, PartialPaymentInput,
    Patient, Screen, classify_patient,
};
use domain_billing::ports::mock::MockBillingPort;
use domain_billing::PaymentRecorder;

use test_utils::{
    ClockFixtures, IdFixtures, PatientFixtures, RequestFixtures, TestBillingRequestBuilder,
    TestPatientBuilder, assert_money_eq, assert_outstanding_consistent, assert_status,
    billing_entry_strategy, degenerate_entry_strategy, patient_strategy,
};

use std::sync::Arc;

// ============================================================================
// Classification Scenario Tests
// ============================================================================

mod classification_tests {
    use super::*;

    #[test]
    fn test_established_patient_without_billing_needs_consultation_fee() {
        let summary = classify_patient(&PatientFixtures::established_without_billing(), ClockFixtures::now());
        assert_status(&summary, BillingStatus::ConsultationFeeRequired);
        assert!(!summary.flags.is_new_patient);
    }

    #[test]
    fn test_new_patient_without_billing_needs_registration_fee() {
        let summary = classify_patient(&PatientFixtures::new_without_billing(), ClockFixtures::now());
        assert_status(&summary, BillingStatus::RegistrationFeeRequired);
        assert!(summary.flags.is_new_patient);
    }

    #[test]
    fn test_fully_paid_consultation_is_all_paid() {
        let summary = classify_patient(&PatientFixtures::fully_paid_consultation(), ClockFixtures::now());
        assert_status(&summary, BillingStatus::AllPaid);
        assert!(summary.outstanding.total.is_zero());
    }

    #[test]
    fn test_partial_consultation() {
        let patient = PatientFixtures::partial_consultation();
        assert_eq!(patient.billing[0].normalized_status(), EntryStatus::Partial);

        let summary = classify_patient(&patient, ClockFixtures::now());
        assert_status(&summary, BillingStatus::ConsultationPartial);
        assert_money_eq(summary.outstanding.consultation, Money::from_major(300));
        assert!(summary.status.label(Screen::ConsultationBilling).contains("Consultation"));
        assert!(summary.status.label(Screen::PendingBillsNotification).contains("Pending"));
    }

    #[test]
    fn test_unpaid_services_after_paid_fees() {
        let summary = classify_patient(&PatientFixtures::unpaid_services(), ClockFixtures::now());
        assert_status(&summary, BillingStatus::ServicePending);
        assert!(summary.flags.has_unpaid_services);
        assert_money_eq(summary.outstanding.total, Money::from_major(350));
    }

    #[test]
    fn test_new_patient_with_registration_moves_on_to_consultation() {
        let patient = TestPatientBuilder::new()
            .registered_hours_ago(2)
            .registration(200, 200)
            .build();
        assert_status(&classify_patient(&patient, ClockFixtures::now()), BillingStatus::ConsultationFeeRequired);
    }

    #[test]
    fn test_new_patient_check_wins_over_unpaid_consultation() {
        let patient = TestPatientBuilder::new()
            .registered_hours_ago(3)
            .consultation(500, 0)
            .build();
        assert_status(&classify_patient(&patient, ClockFixtures::now()), BillingStatus::RegistrationFeeRequired);
    }

    #[test]
    fn test_missing_created_at_reads_as_new() {
        let patient = TestPatientBuilder::new().without_created_at().consultation(500, 500).build();
        assert_status(&classify_patient(&patient, ClockFixtures::now()), BillingStatus::RegistrationFeeRequired);
    }

    #[test]
    fn test_consultation_priority_over_registration_and_services() {
        let patient = TestPatientBuilder::new()
            .service(300, 0)
            .registration(200, 0)
            .consultation(500, 100)
            .build();

        let summary = classify_patient(&patient, ClockFixtures::now());
        assert_status(&summary, BillingStatus::ConsultationPartial);
        assert!(summary.flags.has_unpaid_consultation);
        assert!(summary.flags.has_unpaid_registration);
        assert!(summary.flags.has_unpaid_services);
        assert_money_eq(summary.outstanding.total, Money::from_major(900));
    }

    #[test]
    fn test_unpaid_beats_partial_within_category() {
        let patient = TestPatientBuilder::new()
            .consultation(500, 500)
            .service(300, 100)
            .service(200, 0)
            .build();
        assert_status(&classify_patient(&patient, ClockFixtures::now()), BillingStatus::ServicePending);
    }

    #[test]
    fn test_status_label_paid_overrides_amounts() {
        let patient = TestPatientBuilder::new()
            .with_entry(
                BillingEntry::new(EntryType::Consultation, Money::from_major(500)).with_status("PAID"),
            )
            .build();
        let summary = classify_patient(&patient, ClockFixtures::now());
        assert_status(&summary, BillingStatus::AllPaid);
        assert!(summary.outstanding.total.is_zero());
    }

    #[test]
    fn test_zero_amount_consultation_is_unpaid() {
        let patient = TestPatientBuilder::new().consultation(0, 0).build();
        assert_status(&classify_patient(&patient, ClockFixtures::now()), BillingStatus::ConsultationPending);
    }

    #[test]
    fn test_assigned_doctor_scope_ignores_other_doctors_bills() {
        let patient = TestPatientBuilder::new()
            .assigned_to(IdFixtures::doctor_id())
            .consultation_by(IdFixtures::doctor_id(), 500, 500)
            .consultation_by(IdFixtures::other_doctor_id(), 700, 0)
            .build();

        let scoped = BillingStatusClassifier::new(ConsultationScope::AssignedDoctor);
        let summary = scoped.classify_patient(&patient, ClockFixtures::now());
        assert_status(&summary, BillingStatus::PendingPayment);
        assert_money_eq(summary.outstanding.consultation, Money::from_major(700));

        assert_status(&classify_patient(&patient, ClockFixtures::now()), BillingStatus::ConsultationPending);
    }

    #[test]
    fn test_classification_ignores_entry_order() {
        let forward = TestPatientBuilder::new()
            .consultation(500, 200)
            .registration(100, 0)
            .service(250, 250)
            .build();
        let mut reversed = forward.clone();
        reversed.billing.reverse();

        assert_eq!(
            classify_patient(&forward, ClockFixtures::now()),
            classify_patient(&reversed, ClockFixtures::now())
        );
    }
}

// ============================================================================
// Wire Decoding Tests
// ============================================================================

mod decoding_tests {
    use super::*;

    #[test]
    fn test_patient_list_with_degenerate_entries() {
        let patients: Vec<Patient> = serde_json::from_str(
            r#"[
                {"_id": "p1", "name": "Asha", "createdAt": "2024-05-01T09:00:00Z",
                 "billing": [{"type": "CONSULTATION", "amount": "500", "paidAmount": 650}]},
                {"_id": "p2", "name": null, "billing": null},
                {"_id": "p3", "name": "Imran", "createdAt": "2024-05-01T09:00:00Z",
                 "billing": [{"type": "service", "amount": -40, "paidAmount": -5, "status": "No payments"}]}
            ]"#,
        )
        .unwrap();

        assert_eq!(patients.len(), 3);
        assert_eq!(patients[0].billing[0].normalized_status(), EntryStatus::Paid);
        assert!(patients[1].billing.is_empty());
        assert_eq!(patients[1].name, "");

        let mut degenerate = patients[2].clone();
        assert_eq!(degenerate.sanitize(), 1);
        assert!(degenerate.billing[0].amount.is_zero());
        assert!(degenerate.billing[0].remaining_balance().is_zero());
    }

    #[test]
    fn test_malformed_amounts_degrade_instead_of_failing_the_list() {
        let patients: Vec<Patient> = serde_json::from_str(
            r#"[
                {"_id": "p1", "name": "Asha", "createdAt": "2024-05-01T09:00:00Z",
                 "billing": [{"type": "consultation", "amount": "", "paidAmount": 0}]},
                {"_id": "p2", "name": "Imran", "createdAt": "2024-05-01T09:00:00Z",
                 "billing": [{"type": "consultation", "amount": 500, "paidAmount": "unknown", "remaining": "n/a"}]}
            ]"#,
        )
        .unwrap();

        assert_eq!(patients.len(), 2);
        assert!(patients[0].billing[0].amount.is_zero());
        assert_eq!(patients[1].billing[0].remaining, None);
        assert_money_eq(patients[1].billing[0].remaining_balance(), Money::from_major(500));

        let requests: Vec<BillingRequest> = serde_json::from_str(
            r#"[
                {"_id": "r1", "status": "Billing Generated", "total": "abc", "paid": 0},
                {"_id": "r2", "status": "Paid", "total": 300, "paid": 300}
            ]"#,
        )
        .unwrap();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].total, None);
        assert_eq!(requests[0].paid, Some(Money::zero()));
        assert!(BillingStatusClassifier::default().is_request_unpaid(&requests[0]));
        assert!(!BillingStatusClassifier::default().is_request_unpaid(&requests[1]));
    }

    #[test]
    fn test_request_single_object_billing() {
        let request: BillingRequest = serde_json::from_value(RequestFixtures::single_object_json()).unwrap();

        assert_eq!(request.billing.len(), 1);
        assert_eq!(request.display_name(), "Priya Sharma");
        assert_eq!(request.test_type.as_deref(), Some("CBC"));
        assert!(BillingStatusClassifier::default().is_request_unpaid(&request));
    }
}

// ============================================================================
// Billing Request Tests
// ============================================================================

mod request_tests {
    use super::*;

    #[test]
    fn test_billing_generated_without_billing_is_unpaid() {
        let classifier = BillingStatusClassifier::default();
        assert!(classifier.is_request_unpaid(&RequestFixtures::billing_generated_without_billing()));
    }

    #[test]
    fn test_paid_request_is_not_unpaid() {
        let classifier = BillingStatusClassifier::default();
        let request = RequestFixtures::paid_lab_test();
        assert!(!classifier.is_request_unpaid(&request));
        assert!(classifier.request_outstanding(&request).is_zero());
    }

    #[test]
    fn test_completed_request_without_billing_is_paid() {
        let request = TestBillingRequestBuilder::new().status("completed").build();
        assert!(!BillingStatusClassifier::default().is_request_unpaid(&request));
    }

    #[test]
    fn test_totals_or_remaining_mark_request_unpaid() {
        let classifier = BillingStatusClassifier::default();

        let by_totals = TestBillingRequestBuilder::new().status("Paid").totals(1000, 600).test(1000, 1000).build();
        assert!(classifier.is_request_unpaid(&by_totals));
        assert_money_eq(classifier.request_outstanding(&by_totals), Money::from_major(400));

        let by_remaining = TestBillingRequestBuilder::new().status("Paid").remaining(50).test(1000, 1000).build();
        assert!(classifier.is_request_unpaid(&by_remaining));
    }
}

// ============================================================================
// Payment Recorder Validation Tests
// ============================================================================

mod recorder_tests {
    use super::*;

    fn recorder() -> PaymentRecorder {
        PaymentRecorder::new(Arc::new(MockBillingPort::new()), BillingStatusClassifier::default())
    }

    #[test]
    fn test_partial_payment_across_categories() {
        let patient = TestPatientBuilder::new()
            .consultation(500, 200)
            .registration(200, 0)
            .service(300, 0)
            .build();

        let payment = recorder()
            .prepare_partial_payment(
                &patient,
                &PartialPaymentInput {
                    consultation: Some(Money::from_major(300)),
                    registration: None,
                    service: Some(Money::from_major(100)),
                },
            )
            .unwrap();

        assert_money_eq(payment.amount, Money::from_major(400));
        assert_money_eq(payment.breakdown.registration, Money::zero());
    }

    #[test]
    fn test_partial_payment_for_settled_category_is_rejected() {
        let patient = TestPatientBuilder::new().consultation(500, 500).service(300, 0).build();

        let result = recorder().prepare_partial_payment(
            &patient,
            &PartialPaymentInput {
                registration: Some(Money::from_major(1)),
                ..Default::default()
            },
        );

        match result {
            Err(BillingError::AmountExceedsOutstanding { category, outstanding, .. }) => {
                assert_eq!(category, BillingCategory::Registration);
                assert!(outstanding.is_zero());
            }
            other => panic!("expected AmountExceedsOutstanding, got {:?}", other),
        }
    }

    #[test]
    fn test_full_payment_ignores_lab_tests() {
        let patient = TestPatientBuilder::new()
            .consultation(500, 500)
            .entry(EntryType::Test, 900, 0)
            .build();
        assert!(matches!(recorder().prepare_full_payment(&patient), Err(BillingError::NothingToPay)));
    }

    #[test]
    fn test_stale_zero_remaining_does_not_hide_an_unpaid_consultation() {
        let mut patient = TestPatientBuilder::new().consultation(500, 0).build();
        patient.billing[0].remaining = Some(Money::zero());

        let summary = classify_patient(&patient, ClockFixtures::now());
        assert_eq!(summary.status, BillingStatus::ConsultationPending);
        assert_money_eq(summary.outstanding.consultation, Money::from_major(500));

        let payment = recorder().prepare_full_payment(&patient).unwrap();
        assert_money_eq(payment.amount, Money::from_major(500));
    }

    #[test]
    fn test_inflated_remaining_does_not_allow_overpayment() {
        let mut patient = TestPatientBuilder::new().consultation(500, 0).build();
        patient.billing[0].remaining = Some(Money::from_major(5000));
        patient.sanitize();

        let result = recorder().prepare_partial_payment(
            &patient,
            &PartialPaymentInput {
                consultation: Some(Money::from_major(5000)),
                ..Default::default()
            },
        );

        match result {
            Err(BillingError::AmountExceedsOutstanding { category, outstanding, .. }) => {
                assert_eq!(category, BillingCategory::Consultation);
                assert_money_eq(outstanding, Money::from_major(500));
            }
            other => panic!("expected AmountExceedsOutstanding, got {:?}", other),
        }
    }

    #[test]
    fn test_full_payment_for_unknown_patient_id_still_validates_locally() {
        let patient = Patient::new(PatientId::new("ghost"), "Ghost");
        let err = recorder().prepare_full_payment(&patient).unwrap_err();
        assert!(err.is_validation());
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #[test]
    fn prop_normalization_follows_amounts(entry in billing_entry_strategy()) {
        let amount = entry.effective_amount();
        let paid = entry.effective_paid();
        let status = entry.normalized_status();

        if amount.is_positive() && paid >= amount {
            prop_assert_eq!(status, EntryStatus::Paid);
        }
        if paid.is_positive() && paid < amount && entry.status.as_deref().map(|s| !s.eq_ignore_ascii_case("paid") && !s.eq_ignore_ascii_case("completed")).unwrap_or(true) {
            prop_assert_eq!(status, EntryStatus::Partial);
        }
    }

    #[test]
    fn prop_classification_is_deterministic(patient in patient_strategy(ClockFixtures::now())) {
        let now = ClockFixtures::now();
        prop_assert_eq!(classify_patient(&patient, now), classify_patient(&patient, now));
    }

    #[test]
    fn prop_outstanding_consistent(patient in patient_strategy(ClockFixtures::now())) {
        let summary = classify_patient(&patient, ClockFixtures::now());
        assert_outstanding_consistent(&summary);
    }

    #[test]
    fn prop_empty_billing_requires_a_fee(mut patient in patient_strategy(ClockFixtures::now())) {
        patient.billing.clear();
        let status = classify_patient(&patient, ClockFixtures::now()).status;
        prop_assert!(matches!(
            status,
            BillingStatus::ConsultationFeeRequired | BillingStatus::RegistrationFeeRequired
        ));
    }

    #[test]
    fn prop_all_paid_means_nothing_outstanding(patient in patient_strategy(ClockFixtures::now())) {
        let summary = classify_patient(&patient, ClockFixtures::now());
        if summary.status == BillingStatus::AllPaid {
            prop_assert!(summary.outstanding.total.is_zero());
        }
    }

    #[test]
    fn prop_entry_balance_never_exceeds_amount_minus_paid(entry in degenerate_entry_strategy()) {
        let balance = entry.remaining_balance();
        prop_assert!(!balance.is_negative());
        prop_assert!(balance <= entry.effective_amount().saturating_sub(entry.effective_paid()));
        if entry.normalized_status().is_outstanding() && entry.effective_amount().is_positive() {
            prop_assert!(balance.is_positive());
        }
    }

    #[test]
    fn prop_sanitize_is_idempotent(entry in degenerate_entry_strategy()) {
        let mut once = entry.clone();
        once.sanitize();
        let mut twice = once.clone();
        prop_assert!(!twice.sanitize());
        prop_assert_eq!(once.normalized_status(), entry.normalized_status());
        prop_assert_eq!(once.remaining_balance(), entry.remaining_balance());
    }

    #[test]
    fn prop_partial_payment_never_exceeds_outstanding(
        patient in patient_strategy(ClockFixtures::now()),
        consultation in 0i64..60_000i64,
        service in 0i64..60_000i64,
    ) {
        let recorder = PaymentRecorder::new(Arc::new(MockBillingPort::new()), BillingStatusClassifier::default());
        let outstanding = recorder.classifier().outstanding(&patient);
        let entered = PartialPaymentInput {
            consultation: Some(Money::from_major(consultation)),
            registration: None,
            service: Some(Money::from_major(service)),
        };

        if let Ok(payment) = recorder.prepare_partial_payment(&patient, &entered) {
            for category in BillingCategory::ALL {
                prop_assert!(payment.breakdown.get(category) <= outstanding.for_category(category));
            }
            prop_assert!(payment.amount.is_positive());
        }
    }
}
