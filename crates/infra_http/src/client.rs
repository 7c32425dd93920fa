//! reqwest-backed implementation of `BillingPort`

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use core_kernel::{DomainPort, PatientId, PortError, TestRequestId};
use domain_billing::{
    BillingPort, BillingRequest, ConsultationFeeRequest, Invoice, Patient,
    RecordPartialPaymentRequest, RecordPaymentRequest, RegistrationFeeRequest, ReportAccessError,
    ReportError, ServiceChargesRequest,
};

use crate::config::HttpClientConfig;
use crate::envelope;
use crate::errors;

/// API paths, relative to the configured base URL
pub mod endpoints {
    pub const PATIENTS: &str = "/patients";
    pub const FOLLOWUPS: &str = "/followups";
    pub const CONSULTATION_FEE: &str = "/billing/consultation-fee";
    pub const REGISTRATION_FEE: &str = "/billing/registration-fee";
    pub const SERVICE_CHARGES: &str = "/billing/service-charges";
    pub const RECORD_PAYMENT: &str = "/billing/record-payment";
    pub const RECORD_PARTIAL_PAYMENT: &str = "/billing/record-partial-payment";
    pub const GENERATE_INVOICE: &str = "/billing/generate-invoice";

    pub fn download_report(request_id: &str) -> String {
        format!("/test-requests/download-report/{}", request_id)
    }
}

/// Header carrying a per-request correlation id
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// HTTP client for the clinic billing API
///
/// One client is shared by all operations; reqwest pools connections
/// internally.
///
/// # Example
///
/// ```rust,ignore
/// let client = HttpBillingClient::new(
///     HttpClientConfig::new("https://clinic.example.com/api").with_token(token),
/// )?;
/// let patients = client.fetch_patients().await?;
/// ```
#[derive(Debug, Clone)]
pub struct HttpBillingClient {
    config: HttpClientConfig,
    client: Client,
}

impl HttpBillingClient {
    pub fn new(config: HttpClientConfig) -> Result<Self, PortError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| PortError::Internal {
                message: "Failed to build HTTP client".to_string(),
                source: Some(Box::new(e)),
            })?;

        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, self.url(path))
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());

        match &self.config.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, operation: &str, builder: RequestBuilder) -> Result<Response, PortError> {
        builder.send().await.map_err(|e| {
            let mapped = errors::from_transport(operation, self.config.timeout(), e);
            warn!(operation, error = %mapped, "Billing API request failed");
            mapped
        })
    }

    async fn body(operation: &str, response: Response) -> Result<Vec<u8>, PortError> {
        response
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| PortError::Connection {
                message: format!("{}: response body was interrupted", operation),
                source: Some(Box::new(e)),
            })
    }

    /// Sends a request and decodes a JSON document from a success response
    async fn call<T: DeserializeOwned>(
        &self,
        operation: &str,
        builder: RequestBuilder,
        keys: &[&str],
        entity: (&str, &str),
    ) -> Result<T, PortError> {
        let response = self.send(operation, builder).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = Self::body(operation, response).await?;

        if !status.is_success() {
            let err = errors::from_status(status, &headers, &body, entity.0, entity.1);
            warn!(operation, status = status.as_u16(), error = %err, "Billing API returned an error");
            return Err(err);
        }

        debug!(operation, status = status.as_u16(), bytes = body.len(), "Billing API response");
        envelope::decode(&body, keys)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        keys: &[&str],
        entity: &str,
    ) -> Result<T, PortError> {
        self.call(operation, self.request(Method::GET, path), keys, (entity, ""))
            .await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        body: &B,
        keys: &[&str],
        patient_id: &PatientId,
    ) -> Result<T, PortError> {
        self.call(
            operation,
            self.request(Method::POST, path).json(body),
            keys,
            ("Patient", patient_id.as_str()),
        )
        .await
    }
}

fn is_json(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.to_ascii_lowercase().contains("json"))
}

impl DomainPort for HttpBillingClient {}

#[async_trait]
impl BillingPort for HttpBillingClient {
    async fn fetch_patients(&self) -> Result<Vec<Patient>, PortError> {
        self.get("fetch_patients", endpoints::PATIENTS, envelope::PATIENTS, "Patient list")
            .await
    }

    async fn fetch_billing_requests(&self) -> Result<Vec<BillingRequest>, PortError> {
        self.get(
            "fetch_billing_requests",
            endpoints::FOLLOWUPS,
            envelope::REQUESTS,
            "Billing request list",
        )
        .await
    }

    async fn create_consultation_fee(
        &self,
        request: &ConsultationFeeRequest,
    ) -> Result<Patient, PortError> {
        self.post(
            "create_consultation_fee",
            endpoints::CONSULTATION_FEE,
            request,
            envelope::PATIENT,
            &request.patient_id,
        )
        .await
    }

    async fn create_registration_fee(
        &self,
        request: &RegistrationFeeRequest,
    ) -> Result<Patient, PortError> {
        self.post(
            "create_registration_fee",
            endpoints::REGISTRATION_FEE,
            request,
            envelope::PATIENT,
            &request.patient_id,
        )
        .await
    }

    async fn create_service_charges(
        &self,
        request: &ServiceChargesRequest,
    ) -> Result<Patient, PortError> {
        self.post(
            "create_service_charges",
            endpoints::SERVICE_CHARGES,
            request,
            envelope::PATIENT,
            &request.patient_id,
        )
        .await
    }

    async fn record_payment(&self, request: &RecordPaymentRequest) -> Result<Patient, PortError> {
        self.post(
            "record_payment",
            endpoints::RECORD_PAYMENT,
            request,
            envelope::PATIENT,
            &request.patient_id,
        )
        .await
    }

    async fn record_partial_payment(
        &self,
        request: &RecordPartialPaymentRequest,
    ) -> Result<Patient, PortError> {
        self.post(
            "record_partial_payment",
            endpoints::RECORD_PARTIAL_PAYMENT,
            request,
            envelope::PATIENT,
            &request.patient_id,
        )
        .await
    }

    async fn generate_invoice(&self, patient_id: &PatientId) -> Result<Invoice, PortError> {
        self.post(
            "generate_invoice",
            endpoints::GENERATE_INVOICE,
            &json!({ "patientId": patient_id }),
            envelope::INVOICE,
            patient_id,
        )
        .await
    }

    async fn download_report(&self, request_id: &TestRequestId) -> Result<Vec<u8>, ReportError> {
        let operation = "download_report";
        let builder = self.request(Method::GET, &endpoints::download_report(request_id.as_str()));
        let response = self.send(operation, builder).await?;

        let status = response.status();
        let headers = response.headers().clone();
        let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
        let json_body = is_json(content_type);
        let body = Self::body(operation, response).await?;

        if !status.is_success() {
            if let Some(access) = ReportAccessError::from_error_body(&body) {
                warn!(request_id = %request_id, code = access.code(), "Report download refused");
                return Err(access.into());
            }
            let err = errors::from_status(status, &headers, &body, "Report", request_id.as_str());
            warn!(request_id = %request_id, status = status.as_u16(), error = %err, "Report download failed");
            return Err(err.into());
        }

        // Some deployments answer refusals with 200 and a JSON body.
        if json_body {
            if let Some(access) = ReportAccessError::from_error_body(&body) {
                warn!(request_id = %request_id, code = access.code(), "Report download refused");
                return Err(access.into());
            }
            return Err(PortError::transformation("Expected a PDF report, received JSON").into());
        }

        debug!(request_id = %request_id, bytes = body.len(), "Report downloaded");
        Ok(body)
    }
}
