use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::detect::field_model::Field;
use crate::mapping::mapping_model::{FieldSuggestion, Mapping, Profile};
use crate::selector::locator::Locator;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Connection refused, DNS failure, TLS error ...
    #[error("transport failure: {0}")]
    Transport(String),

    /// No response within the configured timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-2xx status
    #[error("service returned HTTP {0}")]
    Status(u16),

    /// Body did not have the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),

    /// No service configured (offline mode)
    #[error("no suggestion service configured")]
    Unavailable,
}

/// Batch request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestMappingsRequest {
    pub fields: Vec<Field>,
    pub profile: Profile,
    pub context: String,
}

/// On-demand single-field request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestFieldRequest {
    pub field: Field,
    pub nearby_fields: Vec<Field>,
    pub profile: Profile,
    pub context: String,
}

/// Profile extracted from a company page by the import endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ImportedProfile {
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub context: String,
}

/// Remote AI mapping service. Treated as untrusted: every method may fail,
/// and callers decide how to degrade.
pub trait MappingService {
    fn suggest_mappings(&self, request: &SuggestMappingsRequest)
    -> Result<Vec<Mapping>, ServiceError>;

    fn suggest_field(&self, request: &SuggestFieldRequest) -> Result<FieldSuggestion, ServiceError>;
}

// ============================================================================
// HTTP backend
// ============================================================================

pub struct HttpMappingService {
    base_url: String,
    timeout: Duration,
    client: reqwest::blocking::Client,
}

impl HttpMappingService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("formpilot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn map_send_error(&self, e: reqwest::Error) -> ServiceError {
        if e.is_timeout() {
            ServiceError::Timeout(self.timeout)
        } else {
            ServiceError::Transport(e.to_string())
        }
    }

    fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<Value, ServiceError> {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Status(status.as_u16()));
        }

        response
            .json::<Value>()
            .map_err(|e| ServiceError::Malformed(e.to_string()))
    }

    /// Import a profile and company context from a public web page.
    pub fn import_from_url(&self, url: &str) -> Result<ImportedProfile, ServiceError> {
        let body = serde_json::json!({ "url": url });
        let value = self.post_json("/formpilot/import-from-url", &body)?;
        serde_json::from_value(value).map_err(|e| ServiceError::Malformed(e.to_string()))
    }

    /// Report completed fills to the usage counter. Only call with consent.
    pub fn record_fill(&self, count: usize) -> Result<(), ServiceError> {
        let body = serde_json::json!({ "count": count, "consent": true });
        self.post_json("/prodway/record-fill", &body).map(|_| ())
    }

    pub fn health(&self) -> Result<bool, ServiceError> {
        let response = self
            .client
            .get(self.endpoint("/formpilot/health"))
            .send()
            .map_err(|e| self.map_send_error(e))?;
        if !response.status().is_success() {
            return Err(ServiceError::Status(response.status().as_u16()));
        }
        let value: Value = response
            .json()
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;
        Ok(value["status"].as_str() == Some("ok"))
    }
}

impl MappingService for HttpMappingService {
    fn suggest_mappings(
        &self,
        request: &SuggestMappingsRequest,
    ) -> Result<Vec<Mapping>, ServiceError> {
        let body = self.post_json("/formpilot/suggest-mappings", request)?;
        parse_mappings_response(&body)
    }

    fn suggest_field(&self, request: &SuggestFieldRequest) -> Result<FieldSuggestion, ServiceError> {
        let body = self.post_json("/formpilot/suggest-field", request)?;
        parse_field_suggestion(&body)
    }
}

// ============================================================================
// Offline backend
// ============================================================================

/// Stand-in when no service is configured; every call fails so callers take
/// their fallback path.
pub struct UnavailableService;

impl MappingService for UnavailableService {
    fn suggest_mappings(&self, _: &SuggestMappingsRequest) -> Result<Vec<Mapping>, ServiceError> {
        Err(ServiceError::Unavailable)
    }

    fn suggest_field(&self, _: &SuggestFieldRequest) -> Result<FieldSuggestion, ServiceError> {
        Err(ServiceError::Unavailable)
    }
}

// ============================================================================
// Response parsing (lenient per entry, strict on overall shape)
// ============================================================================

/// Parse `{"mappings": [...]}` (or a bare array). Entries that cannot be
/// read are dropped; a body of the wrong shape is an error.
pub fn parse_mappings_response(body: &Value) -> Result<Vec<Mapping>, ServiceError> {
    let entries = match body {
        Value::Array(items) => items,
        Value::Object(obj) => obj
            .get("mappings")
            .and_then(Value::as_array)
            .ok_or_else(|| ServiceError::Malformed("missing 'mappings' array".into()))?,
        _ => return Err(ServiceError::Malformed("expected object or array".into())),
    };

    Ok(entries.iter().filter_map(parse_mapping_entry).collect())
}

fn parse_mapping_entry(entry: &Value) -> Option<Mapping> {
    let obj = entry.as_object()?;

    let index = match obj.get("index") {
        Some(Value::Number(n)) => n.as_u64().map(|i| i as usize),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };

    let selector = obj
        .get("selector")
        .filter(|v| !v.is_null())
        .and_then(|v| serde_json::from_value::<Locator>(v.clone()).ok());

    if index.is_none() && selector.is_none() {
        return None;
    }

    let value = scalar_to_string(obj.get("value")?)?;

    Some(Mapping {
        index,
        selector,
        value,
    })
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn parse_field_suggestion(body: &Value) -> Result<FieldSuggestion, ServiceError> {
    let obj = body
        .as_object()
        .ok_or_else(|| ServiceError::Malformed("expected object".into()))?;

    let value = match obj.get("value") {
        None | Some(Value::Null) => None,
        Some(v) => Some(
            scalar_to_string(v)
                .ok_or_else(|| ServiceError::Malformed("'value' is not a scalar".into()))?,
        ),
    }
    .filter(|v| !v.is_empty());

    let reasoning = obj
        .get("reasoning")
        .and_then(Value::as_str)
        .unwrap_or("")
        .trim()
        .to_string();

    Ok(FieldSuggestion { value, reasoning })
}
