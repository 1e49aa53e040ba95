/// Profile client — the single point of entry for calls to the student profiling API.
///
/// Every submission is one POST. A non-2xx status comes back as a normal
/// [`Response`]; only failures that prevent a response from arriving are
/// errors. Nothing is retried.
use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, ACCEPT, CONTENT_TYPE};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Url};
use tracing::{debug, warn};

use crate::config::Config;
use crate::endpoint::Endpoint;
use crate::errors::ClientError;
use crate::models::{
    ChallengesRequest, FullProfileRequest, GoalsRequest, JsonRequest, MeansRequest,
    StrengthsRequest,
};
use crate::payload::{FormPart, Payload};
use crate::response::Response;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// The full profile runs every generator server side and is much slower.
pub const FULL_PROFILE_TIMEOUT_SECS: u64 = 120;
const APPLICATION_JSON: &str = "application/json";

#[derive(Debug, Clone)]
pub struct ProfileClient {
    client: Client,
    base_url: String,
    default_timeout: Duration,
    full_profile_timeout: Duration,
}

impl ProfileClient {
    /// `base_url` is the API root, e.g. `http://localhost:8000/api/v1`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let base_url = normalize_base_url(base_url.into())?;
        let client = Client::builder()
            .build()
            .map_err(|e| ClientError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            default_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            full_profile_timeout: Duration::from_secs(FULL_PROFILE_TIMEOUT_SECS),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Ok(Self::new(config.api_base_url.clone())?
            .with_default_timeout(Duration::from_secs(config.timeout_secs))
            .with_full_profile_timeout(Duration::from_secs(config.full_profile_timeout_secs)))
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_full_profile_timeout(mut self, timeout: Duration) -> Self {
        self.full_profile_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// Sends `payload` to `endpoint` and captures whatever comes back.
    ///
    /// A payload carrying file content is always sent as multipart, even when
    /// `as_multipart` is false. `timeout` falls back to the client default.
    pub async fn submit(
        &self,
        endpoint: Endpoint,
        payload: &Payload,
        as_multipart: bool,
        timeout: Option<Duration>,
    ) -> Result<Response, ClientError> {
        let url = self.url_for(endpoint);
        let timeout = timeout.unwrap_or(self.default_timeout);
        let multipart = as_multipart || payload.has_bytes();

        let request = self
            .client
            .post(&url)
            .header(ACCEPT, APPLICATION_JSON)
            .timeout(timeout);

        let request = if multipart {
            request.multipart(build_form(payload)?)
        } else {
            request
                .header(CONTENT_TYPE, APPLICATION_JSON)
                .json(&payload.to_json()?)
        };

        debug!(
            "POST {url} ({}, {} fields, timeout {}s)",
            if multipart { "multipart" } else { "json" },
            payload.len(),
            timeout.as_secs_f32()
        );

        let response = match request.send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("{endpoint} submission failed before a response arrived: {e}");
                return Err(ClientError::Transport(e));
            }
        };

        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response.text().await?;

        debug!("{endpoint} responded with status {status} ({} bytes)", body.len());

        Ok(Response::new(status, headers, body))
    }

    pub fn is_successful(response: &Response) -> bool {
        response.is_successful()
    }

    pub fn error_detail(response: &Response) -> String {
        response.error_detail()
    }

    /// Submits a typed request as JSON to the endpoint it belongs to.
    pub async fn submit_json<R: JsonRequest>(
        &self,
        request: &R,
        timeout: Option<Duration>,
    ) -> Result<Response, ClientError> {
        let payload = request.to_payload()?;
        self.submit(R::ENDPOINT, &payload, false, timeout).await
    }

    pub async fn strengths(&self, request: &StrengthsRequest) -> Result<Response, ClientError> {
        self.submit_json(request, None).await
    }

    pub async fn challenges(&self, request: &ChallengesRequest) -> Result<Response, ClientError> {
        self.submit_json(request, None).await
    }

    pub async fn goals(&self, request: &GoalsRequest) -> Result<Response, ClientError> {
        self.submit_json(request, None).await
    }

    pub async fn means(&self, request: &MeansRequest) -> Result<Response, ClientError> {
        self.submit_json(request, None).await
    }

    /// Multipart submission; uses the full-profile timeout unless one is given.
    pub async fn full_profile(
        &self,
        request: &FullProfileRequest,
        timeout: Option<Duration>,
    ) -> Result<Response, ClientError> {
        let timeout = timeout.unwrap_or(self.full_profile_timeout);
        self.submit(Endpoint::FullProfile, &request.to_payload(), true, Some(timeout))
            .await
    }
}

fn normalize_base_url(raw: String) -> Result<String, ClientError> {
    let invalid = |reason: String| ClientError::InvalidBaseUrl {
        url: raw.clone(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }

    Ok(raw.trim().trim_end_matches('/').to_string())
}

fn build_form(payload: &Payload) -> Result<Form, ClientError> {
    payload
        .form_parts()?
        .into_iter()
        .try_fold(Form::new(), |form, part| -> Result<Form, ClientError> {
            match part {
                FormPart::Text { name, value } => Ok(form.text(name, value)),
                FormPart::File { name, attachment } => {
                    let file = Part::bytes(attachment.content.to_vec())
                        .file_name(attachment.filename)
                        .mime_str(&attachment.mime)
                        .map_err(|_| {
                            ClientError::invalid_field(
                                &name,
                                format!("invalid MIME type '{}'", attachment.mime),
                            )
                        })?;
                    Ok(form.part(name, file))
                }
            }
        })
}

/// Flattens headers into lower-cased names; repeated headers are joined with ", ".
fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut out: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        out.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    out
}
