//! Mapping of transport failures and HTTP statuses to `PortError`

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::Deserialize;

use core_kernel::PortError;

const DEFAULT_RETRY_AFTER_SECS: u64 = 60;
const SERVICE_NAME: &str = "clinic billing API";

#[derive(Debug, Default, Deserialize)]
struct ServerError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    field: Option<String>,
}

impl ServerError {
    fn parse(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    fn text(&self) -> Option<String> {
        self.message
            .as_deref()
            .or(self.error.as_deref())
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
    }
}

/// Maps a reqwest failure that happened before a status was received
pub fn from_transport(operation: &str, timeout: Duration, err: reqwest::Error) -> PortError {
    if err.is_timeout() {
        PortError::Timeout {
            operation: operation.to_string(),
            duration_ms: timeout.as_millis() as u64,
        }
    } else if err.is_connect() {
        PortError::Connection {
            message: format!("Could not reach the {}", SERVICE_NAME),
            source: Some(Box::new(err)),
        }
    } else {
        PortError::Internal {
            message: format!("{} failed", operation),
            source: Some(Box::new(err)),
        }
    }
}

/// Maps a non-success status and its body
pub fn from_status(
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
    entity_type: &str,
    id: &str,
) -> PortError {
    let server = ServerError::parse(body);

    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => PortError::Validation {
            message: server
                .text()
                .unwrap_or_else(|| "The request was rejected".to_string()),
            field: server.field,
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::unauthorized(
            server.text().unwrap_or_else(|| status.to_string()),
        ),
        StatusCode::NOT_FOUND => PortError::not_found(entity_type, id),
        StatusCode::CONFLICT => PortError::Conflict {
            message: server.text().unwrap_or_else(|| status.to_string()),
        },
        StatusCode::TOO_MANY_REQUESTS => PortError::RateLimited {
            retry_after_secs: retry_after(headers),
        },
        s if s.is_server_error() => PortError::ServiceUnavailable {
            service: format!("{} ({})", SERVICE_NAME, s.as_u16()),
        },
        s => PortError::internal(format!(
            "Unexpected status {}: {}",
            s.as_u16(),
            server.text().unwrap_or_default()
        )),
    }
}

fn retry_after(headers: &HeaderMap) -> u64 {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}
