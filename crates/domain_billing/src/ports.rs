//! Billing Domain Ports
//!
//! This module defines the port the billing domain needs from the clinic's
//! billing API, so the desk and recorder can run against the HTTP adapter
//! in production and an in-memory mock in tests.
//!
//! # Architecture
//!
//! - **HTTP Adapter** (`infra_http`): calls the clinic REST API
//! - **Mock Adapter** (`mock` feature): stores patients and requests in memory
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_billing::ports::BillingPort;
//! use std::sync::Arc;
//!
//! pub struct FrontDesk {
//!     port: Arc<dyn BillingPort>,
//! }
//!
//! impl FrontDesk {
//!     pub async fn patients(&self) -> Result<Vec<Patient>, PortError> {
//!         self.port.fetch_patients().await
//!     }
//! }
//! ```

use async_trait::async_trait;

use core_kernel::{DomainPort, PatientId, PortError, TestRequestId};

use crate::charges::{ConsultationFeeRequest, RegistrationFeeRequest, ServiceChargesRequest};
use crate::invoice::Invoice;
use crate::patient::Patient;
use crate::payment::{RecordPartialPaymentRequest, RecordPaymentRequest};
use crate::report::ReportError;
use crate::request::BillingRequest;

/// Port for the clinic billing API
#[async_trait]
pub trait BillingPort: DomainPort {
    /// Lists all patients with their billing entries
    async fn fetch_patients(&self) -> Result<Vec<Patient>, PortError>;

    /// Lists follow-up and lab-test billing requests
    async fn fetch_billing_requests(&self) -> Result<Vec<BillingRequest>, PortError>;

    /// Bills a consultation fee
    async fn create_consultation_fee(
        &self,
        request: &ConsultationFeeRequest,
    ) -> Result<Patient, PortError>;

    /// Bills a registration fee, optionally with service charges
    async fn create_registration_fee(
        &self,
        request: &RegistrationFeeRequest,
    ) -> Result<Patient, PortError>;

    /// Bills itemized service charges
    async fn create_service_charges(
        &self,
        request: &ServiceChargesRequest,
    ) -> Result<Patient, PortError>;

    /// Records a full or partial payment; returns the updated patient
    async fn record_payment(&self, request: &RecordPaymentRequest) -> Result<Patient, PortError>;

    /// Records a payment split across categories; returns the updated patient
    async fn record_partial_payment(
        &self,
        request: &RecordPartialPaymentRequest,
    ) -> Result<Patient, PortError>;

    /// Generates an invoice for a patient
    async fn generate_invoice(&self, patient_id: &PatientId) -> Result<Invoice, PortError>;

    /// Downloads a lab report PDF
    async fn download_report(&self, request_id: &TestRequestId) -> Result<Vec<u8>, ReportError>;
}

/// Mock implementation for testing
///
/// Stores patients and requests in memory and applies payments the way the
/// billing API does, so desk and recorder tests can observe the effect of a
/// re-fetch.
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tokio::sync::{Mutex, RwLock};

    use core_kernel::Money;

    use crate::entry::{BillingCategory, BillingEntry, EntryType};
    use crate::payment::{PaymentBreakdown, PaymentMethod};
    use crate::report::ReportAccessError;

    /// Operations observed by the mock, in call order
    #[derive(Debug, Clone, PartialEq)]
    pub enum MockCall {
        FetchPatients,
        FetchBillingRequests,
        ConsultationFee(ConsultationFeeRequest),
        RegistrationFee(RegistrationFeeRequest),
        ServiceCharges(ServiceChargesRequest),
        RecordPayment(RecordPaymentRequest),
        RecordPartialPayment(RecordPartialPaymentRequest),
        GenerateInvoice(PatientId),
        DownloadReport(TestRequestId),
    }

    /// In-memory mock implementation of BillingPort
    #[derive(Debug, Default)]
    pub struct MockBillingPort {
        patients: RwLock<Vec<Patient>>,
        requests: RwLock<Vec<BillingRequest>>,
        reports: RwLock<HashMap<TestRequestId, Result<Vec<u8>, ReportAccessError>>>,
        calls: RwLock<Vec<MockCall>>,
        fetch_delays: Mutex<VecDeque<Duration>>,
        offline: AtomicBool,
    }

    impl MockBillingPort {
        /// Creates an empty mock port
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with patients
        pub fn with_patients(patients: Vec<Patient>) -> Self {
            Self {
                patients: RwLock::new(patients),
                ..Self::default()
            }
        }

        /// Replaces the stored billing requests
        pub async fn set_requests(&self, requests: Vec<BillingRequest>) {
            *self.requests.write().await = requests;
        }

        /// Replaces the stored patients
        pub async fn set_patients(&self, patients: Vec<Patient>) {
            *self.patients.write().await = patients;
        }

        /// Stores a report, or the access error returned for it
        pub async fn set_report(
            &self,
            id: TestRequestId,
            report: Result<Vec<u8>, ReportAccessError>,
        ) {
            self.reports.write().await.insert(id, report);
        }

        /// Makes every subsequent call fail with a connection error
        pub fn set_offline(&self, offline: bool) {
            self.offline.store(offline, Ordering::SeqCst);
        }

        /// Queues a delay for the next fetch; the fetch reads its data
        /// before sleeping, so a delayed fetch returns stale data
        pub async fn push_fetch_delay(&self, delay: Duration) {
            self.fetch_delays.lock().await.push_back(delay);
        }

        /// Calls observed so far
        pub async fn calls(&self) -> Vec<MockCall> {
            self.calls.read().await.clone()
        }

        /// Stored patient, as the server currently sees it
        pub async fn patient(&self, id: &PatientId) -> Option<Patient> {
            self.patients.read().await.iter().find(|p| &p.id == id).cloned()
        }

        async fn enter(&self, call: MockCall) -> Result<(), PortError> {
            self.calls.write().await.push(call);
            if self.offline.load(Ordering::SeqCst) {
                return Err(PortError::connection("mock billing API is offline"));
            }
            Ok(())
        }

        async fn delay(&self) {
            let delay = self.fetch_delays.lock().await.pop_front();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
        }

        async fn update_patient<F>(&self, id: &PatientId, update: F) -> Result<Patient, PortError>
        where
            F: FnOnce(&mut Patient) -> Result<(), PortError>,
        {
            let mut patients = self.patients.write().await;
            let patient = patients
                .iter_mut()
                .find(|p| &p.id == id)
                .ok_or_else(|| PortError::not_found("Patient", id))?;
            update(patient)?;
            Ok(patient.clone())
        }
    }

    impl DomainPort for MockBillingPort {}

    /// Applies `amount` to the outstanding entries of `categories`, in order
    fn apply_payment(
        entries: &mut [BillingEntry],
        categories: &[BillingCategory],
        amount: Money,
        method: PaymentMethod,
    ) -> Result<(), PortError> {
        let outstanding: Money = entries
            .iter()
            .filter(|e| e.category().map(|c| categories.contains(&c)).unwrap_or(false))
            .map(BillingEntry::remaining_balance)
            .sum();
        if amount > outstanding {
            return Err(PortError::validation(format!(
                "Payment {} exceeds outstanding {}",
                amount, outstanding
            )));
        }

        let mut left = amount;
        for category in categories {
            for entry in entries.iter_mut().filter(|e| e.category() == Some(*category)) {
                if left.is_zero() {
                    return Ok(());
                }
                let remaining = entry.remaining_balance();
                if remaining.is_zero() {
                    continue;
                }
                let applied = if left < remaining { left } else { remaining };
                entry.paid_amount = entry.effective_paid() + applied;
                entry.remaining = Some(remaining.saturating_sub(applied));
                entry.status = Some(if applied == remaining { "paid" } else { "partial" }.to_string());
                entry.payment_method = Some(method.to_string());
                left = left.saturating_sub(applied);
            }
        }
        Ok(())
    }

    fn apply_breakdown(
        entries: &mut [BillingEntry],
        breakdown: &PaymentBreakdown,
        method: PaymentMethod,
    ) -> Result<(), PortError> {
        for category in BillingCategory::ALL {
            let amount = breakdown.get(category);
            if amount.is_positive() {
                apply_payment(entries, &[category], amount, method)?;
            }
        }
        Ok(())
    }

    #[async_trait]
    impl BillingPort for MockBillingPort {
        async fn fetch_patients(&self) -> Result<Vec<Patient>, PortError> {
            self.enter(MockCall::FetchPatients).await?;
            let snapshot = self.patients.read().await.clone();
            self.delay().await;
            Ok(snapshot)
        }

        async fn fetch_billing_requests(&self) -> Result<Vec<BillingRequest>, PortError> {
            self.enter(MockCall::FetchBillingRequests).await?;
            let snapshot = self.requests.read().await.clone();
            self.delay().await;
            Ok(snapshot)
        }

        async fn create_consultation_fee(
            &self,
            request: &ConsultationFeeRequest,
        ) -> Result<Patient, PortError> {
            self.enter(MockCall::ConsultationFee(request.clone())).await?;
            self.update_patient(&request.patient_id, |patient| {
                let mut entry = BillingEntry::new(EntryType::Consultation, request.amount)
                    .with_doctor(request.doctor_id.clone())
                    .with_status("pending");
                entry.description = request.notes.clone();
                patient.billing.push(entry);
                Ok(())
            })
            .await
        }

        async fn create_registration_fee(
            &self,
            request: &RegistrationFeeRequest,
        ) -> Result<Patient, PortError> {
            self.enter(MockCall::RegistrationFee(request.clone())).await?;
            self.update_patient(&request.patient_id, |patient| {
                patient.billing.push(
                    BillingEntry::new(EntryType::Registration, request.registration_fee)
                        .with_status("pending"),
                );
                if request.service_charges.is_positive() {
                    patient.billing.push(
                        BillingEntry::new(EntryType::Service, request.service_charges)
                            .with_description("Registration service charges")
                            .with_status("pending"),
                    );
                }
                Ok(())
            })
            .await
        }

        async fn create_service_charges(
            &self,
            request: &ServiceChargesRequest,
        ) -> Result<Patient, PortError> {
            self.enter(MockCall::ServiceCharges(request.clone())).await?;
            self.update_patient(&request.patient_id, |patient| {
                for service in &request.services {
                    let mut entry = BillingEntry::new(EntryType::Service, service.amount)
                        .with_description(service.name.clone())
                        .with_status("pending");
                    if let Some(doctor_id) = &request.doctor_id {
                        entry = entry.with_doctor(doctor_id.clone());
                    }
                    patient.billing.push(entry);
                }
                Ok(())
            })
            .await
        }

        async fn record_payment(&self, request: &RecordPaymentRequest) -> Result<Patient, PortError> {
            self.enter(MockCall::RecordPayment(request.clone())).await?;
            self.update_patient(&request.patient_id, |patient| {
                apply_payment(
                    &mut patient.billing,
                    &BillingCategory::ALL,
                    request.amount,
                    request.payment_method,
                )
            })
            .await
        }

        async fn record_partial_payment(
            &self,
            request: &RecordPartialPaymentRequest,
        ) -> Result<Patient, PortError> {
            self.enter(MockCall::RecordPartialPayment(request.clone())).await?;
            self.update_patient(&request.patient_id, |patient| {
                apply_breakdown(&mut patient.billing, &request.payments, request.payment_method)
            })
            .await
        }

        async fn generate_invoice(&self, patient_id: &PatientId) -> Result<Invoice, PortError> {
            self.enter(MockCall::GenerateInvoice(patient_id.clone())).await?;
            let patient = self
                .patient(patient_id)
                .await
                .ok_or_else(|| PortError::not_found("Patient", patient_id))?;

            let invoice = serde_json::json!({
                "invoiceNumber": format!("INV-{}", patient.id),
                "patient": {"_id": patient.id, "name": patient.name, "uhId": patient.uh_id},
                "items": patient.billing,
            });
            serde_json::from_value(invoice).map_err(|e| PortError::transformation(e.to_string()))
        }

        async fn download_report(&self, request_id: &TestRequestId) -> Result<Vec<u8>, ReportError> {
            self.enter(MockCall::DownloadReport(request_id.clone())).await?;
            match self.reports.read().await.get(request_id) {
                Some(Ok(bytes)) => Ok(bytes.clone()),
                Some(Err(access)) => Err(ReportError::Access(access.clone())),
                None => Err(ReportError::Remote(PortError::not_found("TestRequest", request_id))),
            }
        }
    }
}
