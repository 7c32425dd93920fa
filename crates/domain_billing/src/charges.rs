//! Charge creation requests
//!
//! Receptionists bill a patient through three endpoints: consultation fee,
//! registration fee (optionally bundled with service charges), and itemized
//! service charges. Each request validates itself before it is sent.

use serde::{Deserialize, Serialize};

use core_kernel::{DoctorId, Money, PatientId};

use crate::error::BillingError;

/// Body of `POST /billing/consultation-fee`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsultationFeeRequest {
    pub patient_id: PatientId,
    pub doctor_id: DoctorId,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ConsultationFeeRequest {
    pub fn new(patient_id: PatientId, doctor_id: DoctorId, amount: Money) -> Self {
        Self {
            patient_id,
            doctor_id,
            amount,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn validate(&self) -> Result<(), BillingError> {
        if !self.amount.is_positive() {
            return Err(BillingError::InvalidCharge(
                "Consultation fee must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Body of `POST /billing/registration-fee`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationFeeRequest {
    pub patient_id: PatientId,
    pub registration_fee: Money,
    pub service_charges: Money,
    /// Sum of the two fees
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl RegistrationFeeRequest {
    /// Builds the request; `amount` is always the sum of both fees
    pub fn new(patient_id: PatientId, registration_fee: Money, service_charges: Money) -> Self {
        Self {
            patient_id,
            registration_fee,
            service_charges,
            amount: registration_fee + service_charges,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn validate(&self) -> Result<(), BillingError> {
        if self.registration_fee.is_negative() || self.service_charges.is_negative() {
            return Err(BillingError::InvalidCharge(
                "Registration fee and service charges cannot be negative".to_string(),
            ));
        }
        if self.amount != self.registration_fee + self.service_charges {
            return Err(BillingError::InvalidCharge(
                "Registration amount must equal the sum of its fees".to_string(),
            ));
        }
        if !self.amount.is_positive() {
            return Err(BillingError::InvalidCharge(
                "Registration amount must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// One itemized service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCharge {
    pub name: String,
    pub amount: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServiceCharge {
    pub fn new(name: impl Into<String>, amount: Money) -> Self {
        Self {
            name: name.into(),
            amount,
            description: None,
        }
    }
}

/// Body of `POST /billing/service-charges`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceChargesRequest {
    pub patient_id: PatientId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<DoctorId>,
    pub services: Vec<ServiceCharge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ServiceChargesRequest {
    pub fn new(patient_id: PatientId, services: Vec<ServiceCharge>) -> Self {
        Self {
            patient_id,
            doctor_id: None,
            services,
            notes: None,
        }
    }

    pub fn with_doctor(mut self, doctor_id: DoctorId) -> Self {
        self.doctor_id = Some(doctor_id);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Total of all services
    pub fn total(&self) -> Money {
        self.services.iter().map(|s| s.amount).sum()
    }

    pub fn validate(&self) -> Result<(), BillingError> {
        if self.services.is_empty() {
            return Err(BillingError::InvalidCharge(
                "At least one service is required".to_string(),
            ));
        }
        for service in &self.services {
            if service.name.trim().is_empty() {
                return Err(BillingError::InvalidCharge("Service name is required".to_string()));
            }
            if !service.amount.is_positive() {
                return Err(BillingError::InvalidCharge(format!(
                    "Amount for '{}' must be greater than zero",
                    service.name.trim()
                )));
            }
        }
        Ok(())
    }
}
