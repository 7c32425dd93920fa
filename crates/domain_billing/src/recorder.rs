//! Payment recording workflow
//!
//! Validation is pure and runs against the classifier's outstanding
//! breakdown; submission is the only I/O. A rejected or failed payment never
//! mutates local state: callers re-fetch the patient instead.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::{Money, PatientId};

use crate::classifier::BillingStatusClassifier;
use crate::entry::BillingCategory;
use crate::error::BillingError;
use crate::patient::Patient;
use crate::payment::{
    FullPayment, PartialPayment, PartialPaymentInput, PaymentBreakdown, PaymentMethod,
    PaymentType, RecordPartialPaymentRequest, RecordPaymentRequest,
};
use crate::ports::BillingPort;

/// Validates and submits payments
#[derive(Clone)]
pub struct PaymentRecorder {
    port: Arc<dyn BillingPort>,
    classifier: BillingStatusClassifier,
}

impl PaymentRecorder {
    pub fn new(port: Arc<dyn BillingPort>, classifier: BillingStatusClassifier) -> Self {
        Self { port, classifier }
    }

    pub fn classifier(&self) -> &BillingStatusClassifier {
        &self.classifier
    }

    /// Prepares a payment of everything the patient owes
    pub fn prepare_full_payment(&self, patient: &Patient) -> Result<FullPayment, BillingError> {
        let outstanding = self.classifier.outstanding(patient);
        if outstanding.total.is_zero() {
            return Err(BillingError::NothingToPay);
        }
        Ok(FullPayment {
            amount: outstanding.total,
        })
    }

    /// Validates entered category amounts against what is outstanding
    ///
    /// Amounts are never clamped: a negative value or one above the
    /// category's outstanding balance is rejected.
    pub fn prepare_partial_payment(
        &self,
        patient: &Patient,
        entered: &PartialPaymentInput,
    ) -> Result<PartialPayment, BillingError> {
        let outstanding = self.classifier.outstanding(patient);
        if outstanding.total.is_zero() {
            return Err(BillingError::NothingToPay);
        }

        let mut breakdown = PaymentBreakdown::default();
        for category in BillingCategory::ALL {
            let Some(amount) = entered.get(category) else {
                continue;
            };
            if amount.is_negative() {
                return Err(BillingError::NegativeAmount { category, amount });
            }
            let available = outstanding.for_category(category);
            if amount > available {
                return Err(BillingError::AmountExceedsOutstanding {
                    category,
                    entered: amount,
                    outstanding: available,
                });
            }
            breakdown.set(category, amount);
        }

        let amount = breakdown.total();
        if amount.is_zero() {
            return Err(BillingError::EmptyPayment);
        }
        Ok(PartialPayment { amount, breakdown })
    }

    /// Submits a single-amount payment
    #[instrument(skip_all, fields(patient_id = %patient_id, amount = %amount))]
    pub async fn submit_payment(
        &self,
        patient_id: &PatientId,
        amount: Money,
        method: PaymentMethod,
        notes: Option<String>,
        payment_type: PaymentType,
    ) -> Result<Patient, BillingError> {
        if !amount.is_positive() {
            return Err(BillingError::InvalidAmount(amount));
        }

        let request = RecordPaymentRequest {
            patient_id: patient_id.clone(),
            amount,
            payment_method: method,
            payment_type,
            notes,
        };

        match self.port.record_payment(&request).await {
            Ok(patient) => {
                info!(method = %method, ?payment_type, "Payment recorded");
                Ok(patient)
            }
            Err(e) => {
                warn!(error = %e, "Failed to record payment");
                Err(e.into())
            }
        }
    }

    /// Submits a payment split across categories
    #[instrument(skip_all, fields(patient_id = %patient_id, amount = %partial.amount))]
    pub async fn submit_partial_breakdown(
        &self,
        patient_id: &PatientId,
        partial: &PartialPayment,
        method: PaymentMethod,
        notes: Option<String>,
    ) -> Result<Patient, BillingError> {
        if !partial.amount.is_positive() {
            return Err(BillingError::EmptyPayment);
        }

        let request = RecordPartialPaymentRequest {
            patient_id: patient_id.clone(),
            payments: partial.breakdown,
            payment_method: method,
            notes,
        };

        match self.port.record_partial_payment(&request).await {
            Ok(patient) => {
                info!(
                    method = %method,
                    consultation = %partial.breakdown.consultation,
                    registration = %partial.breakdown.registration,
                    service = %partial.breakdown.service,
                    "Partial payment recorded"
                );
                Ok(patient)
            }
            Err(e) => {
                warn!(error = %e, "Failed to record partial payment");
                Err(e.into())
            }
        }
    }

    /// Pays everything the patient owes
    pub async fn record_full_payment(
        &self,
        patient: &Patient,
        method: PaymentMethod,
        notes: Option<String>,
    ) -> Result<Patient, BillingError> {
        let payment = self.prepare_full_payment(patient)?;
        self.submit_payment(&patient.id, payment.amount, method, notes, PaymentType::Full)
            .await
    }

    /// Pays the entered category amounts
    pub async fn record_partial_payment(
        &self,
        patient: &Patient,
        entered: &PartialPaymentInput,
        method: PaymentMethod,
        notes: Option<String>,
    ) -> Result<Patient, BillingError> {
        let payment = self.prepare_partial_payment(patient, entered)?;
        self.submit_partial_breakdown(&patient.id, &payment, method, notes)
            .await
    }
}
