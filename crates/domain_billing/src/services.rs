//! Billing desk service
//!
//! The desk owns the patients and billing requests last loaded from the
//! billing API and runs every front-desk operation against them. Loaded
//! data is only ever replaced by a fetch; payments and charges are sent to
//! the API and followed by a re-fetch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use core_kernel::{Clock, Money, PatientId, TestRequestId};

use crate::charges::{ConsultationFeeRequest, RegistrationFeeRequest, ServiceChargesRequest};
use crate::classifier::{BillingFlags, BillingStatusClassifier, BillingSummary};
use crate::error::BillingError;
use crate::invoice::Invoice;
use crate::notice::{PendingBillsDigest, SessionContext};
use crate::patient::Patient;
use crate::payment::{PartialPaymentInput, PaymentMethod};
use crate::ports::BillingPort;
use crate::recorder::PaymentRecorder;
use crate::request::BillingRequest;
use crate::status::{BillingStatus, Screen};

/// Issues increasing tickets for fetches of one resource
#[derive(Debug, Default)]
pub struct GenerationGuard {
    issued: AtomicU64,
}

impl GenerationGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next ticket
    pub fn issue(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Outcome of a refresh that reached the API successfully
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// The result replaced loaded data; holds the number of records
    Applied(usize),
    /// A newer fetch already landed; the result was dropped
    Superseded,
}

#[derive(Debug)]
struct Loaded<T> {
    items: Vec<T>,
    generation: u64,
    loaded_at: Option<DateTime<Utc>>,
}

impl<T> Default for Loaded<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            generation: 0,
            loaded_at: None,
        }
    }
}

impl<T> Loaded<T> {
    /// Replaces the items if `ticket` is newer than what is loaded
    fn apply(&mut self, ticket: u64, items: Vec<T>, now: DateTime<Utc>) -> Refresh {
        if ticket <= self.generation {
            return Refresh::Superseded;
        }
        self.generation = ticket;
        self.loaded_at = Some(now);
        self.items = items;
        Refresh::Applied(self.items.len())
    }
}

/// One row of a patient list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientStatusRow {
    pub patient_id: PatientId,
    pub name: String,
    pub uh_id: Option<String>,
    pub status: BillingStatus,
    pub label: &'static str,
    pub outstanding: Money,
    pub flags: BillingFlags,
}

/// Front-desk billing service
pub struct BillingDesk {
    port: Arc<dyn BillingPort>,
    clock: Arc<dyn Clock>,
    recorder: PaymentRecorder,
    patients: RwLock<Loaded<Patient>>,
    requests: RwLock<Loaded<BillingRequest>>,
    patient_fetches: GenerationGuard,
    request_fetches: GenerationGuard,
}

impl BillingDesk {
    /// Creates a desk with nothing loaded
    pub fn new(
        port: Arc<dyn BillingPort>,
        clock: Arc<dyn Clock>,
        classifier: BillingStatusClassifier,
    ) -> Self {
        Self {
            recorder: PaymentRecorder::new(port.clone(), classifier),
            port,
            clock,
            patients: RwLock::new(Loaded::default()),
            requests: RwLock::new(Loaded::default()),
            patient_fetches: GenerationGuard::new(),
            request_fetches: GenerationGuard::new(),
        }
    }

    pub fn classifier(&self) -> &BillingStatusClassifier {
        self.recorder.classifier()
    }

    pub fn recorder(&self) -> &PaymentRecorder {
        &self.recorder
    }

    /// Reloads patients from the billing API
    ///
    /// Overlapping refreshes are allowed; a result is applied only if no
    /// fetch issued after it has landed already.
    ///
    /// # Errors
    ///
    /// Returns the remote error if the fetch fails. Previously loaded
    /// patients stay in place.
    pub async fn refresh_patients(&self) -> Result<Refresh, BillingError> {
        let ticket = self.patient_fetches.issue();
        debug!(ticket, "Fetching patients");

        let mut patients = self.port.fetch_patients().await.map_err(|e| {
            warn!(ticket, error = %e, "Patient fetch failed; keeping loaded data");
            BillingError::from(e)
        })?;
        for patient in &mut patients {
            patient.sanitize();
        }

        let outcome = self.patients.write().await.apply(ticket, patients, self.clock.now());
        match outcome {
            Refresh::Applied(count) => debug!(ticket, count, "Patients loaded"),
            Refresh::Superseded => warn!(ticket, "Discarded superseded patient fetch"),
        }
        Ok(outcome)
    }

    /// Reloads follow-up billing requests from the billing API
    pub async fn refresh_requests(&self) -> Result<Refresh, BillingError> {
        let ticket = self.request_fetches.issue();
        debug!(ticket, "Fetching billing requests");

        let mut requests = self.port.fetch_billing_requests().await.map_err(|e| {
            warn!(ticket, error = %e, "Billing request fetch failed; keeping loaded data");
            BillingError::from(e)
        })?;
        for request in &mut requests {
            request.sanitize();
        }

        let outcome = self.requests.write().await.apply(ticket, requests, self.clock.now());
        match outcome {
            Refresh::Applied(count) => debug!(ticket, count, "Billing requests loaded"),
            Refresh::Superseded => warn!(ticket, "Discarded superseded billing request fetch"),
        }
        Ok(outcome)
    }

    /// Reloads patients and requests concurrently
    pub async fn refresh_all(&self) -> Result<(), BillingError> {
        let (patients, requests) = tokio::join!(self.refresh_patients(), self.refresh_requests());
        patients?;
        requests?;
        Ok(())
    }

    /// Loaded patients
    pub async fn patients(&self) -> Vec<Patient> {
        self.patients.read().await.items.clone()
    }

    /// Loaded billing requests
    pub async fn requests(&self) -> Vec<BillingRequest> {
        self.requests.read().await.items.clone()
    }

    /// When patients were last loaded
    pub async fn patients_loaded_at(&self) -> Option<DateTime<Utc>> {
        self.patients.read().await.loaded_at
    }

    /// Loaded patient by id
    pub async fn patient(&self, id: &PatientId) -> Result<Patient, BillingError> {
        self.patients
            .read()
            .await
            .items
            .iter()
            .find(|p| &p.id == id)
            .cloned()
            .ok_or_else(|| BillingError::PatientNotLoaded(id.clone()))
    }

    /// Classification of one loaded patient
    pub async fn summary_for(&self, id: &PatientId) -> Result<BillingSummary, BillingError> {
        let patient = self.patient(id).await?;
        Ok(self.classifier().classify_patient(&patient, self.clock.now()))
    }

    /// Classified rows for a patient list, most urgent first, then by name
    pub async fn statuses(&self, screen: Screen) -> Vec<PatientStatusRow> {
        let now = self.clock.now();
        let classifier = self.classifier();

        let mut rows: Vec<PatientStatusRow> = self
            .patients
            .read()
            .await
            .items
            .iter()
            .map(|patient| {
                let summary = classifier.classify_patient(patient, now);
                PatientStatusRow {
                    patient_id: patient.id.clone(),
                    name: patient.name.clone(),
                    uh_id: patient.uh_id.clone(),
                    status: summary.status,
                    label: summary.status.label(screen),
                    outstanding: summary.outstanding.total,
                    flags: summary.flags,
                }
            })
            .collect();

        rows.sort_by(|a, b| {
            a.status
                .cmp(&b.status)
                .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        });
        rows
    }

    /// Unpaid patients and requests among the loaded data
    pub async fn pending_digest(&self) -> PendingBillsDigest {
        let patients = self.patients.read().await;
        let requests = self.requests.read().await;
        PendingBillsDigest::build(self.classifier(), &patients.items, &requests.items, self.clock.now())
    }

    /// The pending-bills digest, if the session has not seen it yet
    ///
    /// Returns `None` without touching the session until both patients and
    /// requests have been loaded. Once they have, the notice is marked as
    /// shown even when the digest is empty.
    pub async fn pending_notice(&self, session: &mut SessionContext) -> Option<PendingBillsDigest> {
        if !session.should_show_pending_notice() {
            return None;
        }
        let loaded = self.patients.read().await.loaded_at.is_some()
            && self.requests.read().await.loaded_at.is_some();
        if !loaded {
            debug!("Pending notice deferred until billing data is loaded");
            return None;
        }
        session.mark_pending_notice_shown();

        let digest = self.pending_digest().await;
        (!digest.is_empty()).then_some(digest)
    }

    /// Pays a loaded patient's full outstanding balance
    ///
    /// # Arguments
    ///
    /// * `patient_id` - Must be among the loaded patients
    /// * `method` - How the patient paid
    /// * `notes` - Free-text note stored with the payment
    ///
    /// # Returns
    ///
    /// The patient as returned by the billing API
    pub async fn record_full_payment(
        &self,
        patient_id: &PatientId,
        method: PaymentMethod,
        notes: Option<String>,
    ) -> Result<Patient, BillingError> {
        let patient = self.patient(patient_id).await?;
        let updated = self.recorder.record_full_payment(&patient, method, notes).await?;
        self.reload_after_mutation().await;
        Ok(updated)
    }

    /// Pays per-category amounts for a loaded patient
    pub async fn record_partial_payment(
        &self,
        patient_id: &PatientId,
        entered: &PartialPaymentInput,
        method: PaymentMethod,
        notes: Option<String>,
    ) -> Result<Patient, BillingError> {
        let patient = self.patient(patient_id).await?;
        let updated = self
            .recorder
            .record_partial_payment(&patient, entered, method, notes)
            .await?;
        self.reload_after_mutation().await;
        Ok(updated)
    }

    /// Bills a consultation fee
    pub async fn create_consultation_fee(
        &self,
        request: &ConsultationFeeRequest,
    ) -> Result<Patient, BillingError> {
        request.validate()?;
        let patient = self.port.create_consultation_fee(request).await?;
        info!(patient_id = %request.patient_id, doctor_id = %request.doctor_id, amount = %request.amount, "Consultation fee billed");
        self.reload_after_mutation().await;
        Ok(patient)
    }

    /// Bills a registration fee
    pub async fn create_registration_fee(
        &self,
        request: &RegistrationFeeRequest,
    ) -> Result<Patient, BillingError> {
        request.validate()?;
        let patient = self.port.create_registration_fee(request).await?;
        info!(patient_id = %request.patient_id, amount = %request.amount, "Registration fee billed");
        self.reload_after_mutation().await;
        Ok(patient)
    }

    /// Bills itemized service charges
    pub async fn create_service_charges(
        &self,
        request: &ServiceChargesRequest,
    ) -> Result<Patient, BillingError> {
        request.validate()?;
        let patient = self.port.create_service_charges(request).await?;
        info!(
            patient_id = %request.patient_id,
            services = request.services.len(),
            amount = %request.total(),
            "Service charges billed"
        );
        self.reload_after_mutation().await;
        Ok(patient)
    }

    /// Generates an invoice
    pub async fn generate_invoice(&self, patient_id: &PatientId) -> Result<Invoice, BillingError> {
        let invoice = self.port.generate_invoice(patient_id).await?;
        info!(patient_id = %patient_id, invoice_number = ?invoice.invoice_number, "Invoice generated");
        Ok(invoice)
    }

    /// Downloads a lab report
    pub async fn download_report(&self, request_id: &TestRequestId) -> Result<Vec<u8>, BillingError> {
        match self.port.download_report(request_id).await {
            Ok(bytes) => {
                debug!(request_id = %request_id, bytes = bytes.len(), "Report downloaded");
                Ok(bytes)
            }
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "Report download refused");
                Err(e.into())
            }
        }
    }

    /// Re-fetches patients after a mutation; a failure leaves the old data
    /// visible and does not undo the mutation
    async fn reload_after_mutation(&self) {
        if let Err(e) = self.refresh_patients().await {
            warn!(error = %e, "Reload after mutation failed");
        }
    }
}
