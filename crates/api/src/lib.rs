//! Parameter event API client.
//!
//! The backend exposes one endpoint per pipeline parameter,
//! `POST {base}/api/parameters/{id}/event`, and dispatches on the `type`
//! member of the JSON body:
//!
//! - `{"type":"fetchFiles"}` answers `{"files":[...]}`
//! - `{"type":"fetchFile","file":{...}}` makes that file the parameter's value
//!
//! [`ParameterEventClient`] wraps a configured `reqwest::Client` and implements
//! [`RemoteResourceService`] on top of those two events.
//!
//! # Example
//!
//! ```ignore
//! use fileselect_api::{ClientSettings, ParameterEventClient};
//!
//! let client = ParameterEventClient::new(&ClientSettings::new("http://localhost:8000"))?;
//! let files = client.list_resources(ParameterId::new(7)).await?;
//! ```

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use fileselect_types::{ParameterId, RemoteResourceService, ResourceDescriptor, ServiceError};
use fileselect_util::{redact_sensitive, truncate_for_summary};
use reqwest::{Client, Response, Url, header};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Hostnames allowed for local development regardless of scheme.
const LOCALHOST_DOMAINS: &[&str] = &["localhost", "127.0.0.1"];

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ERROR_BODY_LIMIT: usize = 160;

/// Connection settings for [`ParameterEventClient`].
#[derive(Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
}

impl ClientSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_token(mut self, api_token: Option<String>) -> Self {
        self.api_token = api_token;
        self
    }
}

#[derive(Debug, Clone)]
/// Thin wrapper around a configured `reqwest::Client` for the event endpoint.
pub struct ParameterEventClient {
    base_url: Url,
    http: Client,
    user_agent: String,
}

impl ParameterEventClient {
    /// Build a client with JSON headers, the optional bearer token and the
    /// configured timeout. The base URL is validated first.
    pub fn new(settings: &ClientSettings) -> Result<Self> {
        let base_url = validate_base_url(&settings.base_url)?;

        let mut default_headers = header::HeaderMap::new();
        if let Some(api_token) = &settings.api_token {
            let authorization_header_value = format!("Bearer {}", api_token);
            default_headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&authorization_header_value).context("invalid API token")?,
            );
        }
        default_headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(default_headers)
            .timeout(settings.timeout)
            .build()
            .context("build http client")?;

        Ok(Self {
            base_url,
            http,
            user_agent: format!("fileselect/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn event_url(&self, parameter_id: ParameterId) -> Result<Url, ServiceError> {
        self.base_url
            .join(&format!("api/parameters/{}/event", parameter_id))
            .map_err(|error| ServiceError::Network(format!("invalid event URL: {error}")))
    }

    /// POST one event body and return the response once its status is known
    /// to be a success.
    async fn post_event(&self, parameter_id: ParameterId, body: &Value) -> Result<Response, ServiceError> {
        let url = self.event_url(parameter_id)?;
        debug!(%url, %parameter_id, event = body["type"].as_str().unwrap_or_default(), "posting parameter event");

        let response = self
            .http
            .post(url)
            .header(header::USER_AGENT, &self.user_agent)
            .json(body)
            .send()
            .await
            .map_err(|error| ServiceError::Network(redact_sensitive(&error.to_string())))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = if text.trim().is_empty() {
            status.canonical_reason().unwrap_or("request failed").to_string()
        } else {
            truncate_for_summary(&redact_sensitive(&text), ERROR_BODY_LIMIT)
        };
        Err(ServiceError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileListResponse {
    #[serde(default)]
    files: Vec<Value>,
}

#[async_trait]
impl RemoteResourceService for ParameterEventClient {
    async fn list_resources(&self, parameter_id: ParameterId) -> Result<Vec<ResourceDescriptor>, ServiceError> {
        let response = self.post_event(parameter_id, &json!({ "type": "fetchFiles" })).await?;
        let text = response
            .text()
            .await
            .map_err(|error| ServiceError::Network(redact_sensitive(&error.to_string())))?;
        let payload: FileListResponse =
            serde_json::from_str(&text).map_err(|error| ServiceError::InvalidResponse(error.to_string()))?;

        let total = payload.files.len();
        let descriptors: Vec<ResourceDescriptor> = payload
            .files
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match ResourceDescriptor::from_value(entry) {
                Ok(descriptor) => Some(descriptor),
                Err(error) => {
                    warn!(%parameter_id, index, %error, "skipping malformed file entry");
                    None
                }
            })
            .collect();
        debug!(%parameter_id, item_count = descriptors.len(), skipped = total - descriptors.len(), "file list received");
        Ok(descriptors)
    }

    async fn materialize_resource(&self, parameter_id: ParameterId, descriptor: &ResourceDescriptor) -> Result<(), ServiceError> {
        let body = json!({ "type": "fetchFile", "file": descriptor.to_value() });
        self.post_event(parameter_id, &body).await?;
        debug!(%parameter_id, name = descriptor.name(), "file materialized");
        Ok(())
    }
}

/// Validate that a base URL is acceptable for use by the client.
///
/// Rules:
/// - `localhost` or `127.0.0.1`: any scheme is allowed
/// - otherwise: scheme must be HTTPS
///
/// The returned URL always ends with `/` so relative joins keep any path
/// prefix.
pub fn validate_base_url(base: &str) -> Result<Url> {
    let trimmed = base.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let parsed_base_url = Url::parse(&normalized).map_err(|e| anyhow!("Invalid API base URL '{}': {}", base, e))?;

    let host_name = parsed_base_url
        .host_str()
        .ok_or_else(|| anyhow!("API base URL must include a host"))?;

    if LOCALHOST_DOMAINS
        .iter()
        .any(|&allowed| host_name.eq_ignore_ascii_case(allowed))
    {
        return Ok(parsed_base_url);
    }

    if parsed_base_url.scheme() != "https" {
        return Err(anyhow!(
            "API base URL must use https for non-localhost hosts; got '{}://'",
            parsed_base_url.scheme()
        ));
    }

    Ok(parsed_base_url)
}
