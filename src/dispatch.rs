//! Forwards a CI event to the dynamic deploy service

use reqwest::{Client, Url, header::CONTENT_TYPE, redirect};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::config::DeployConfig;
use crate::error::{DeployError, Result};
use crate::webhook::{DeployEvent, EventEnvelope, QueryParams};

pub const CONTENT_TYPE_JSON: &str = "application/json;charset=utf-8";
pub const DEPLOY_OK: &str = "OK";

const ADD_PATH: &str = "/add";
const MAX_LOGGED_BODY_LEN: usize = 500;

/// The single POST sent to the deploy service
#[derive(Debug, Clone, PartialEq)]
pub struct DeployRequest {
    pub url: String,
    pub body: Value,
    pub query_params: QueryParams,
}

impl DeployRequest {
    /// JSON text sent as the request body, pretty-printed
    pub fn body_text(&self) -> String {
        format!("{:#}", self.body)
    }
}

/// Target endpoint for a configured base URL
pub fn deploy_url(base_url: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), ADD_PATH)
}

/// Classify the envelope and turn it into a deploy request. No I/O happens here.
pub fn build_request(base_url: &str, envelope: &EventEnvelope) -> Result<DeployRequest> {
    let event = envelope.classify()?;

    if let DeployEvent::PullRequest(pr) = &event {
        info!(
            "Pull request #{} ({}) from branch '{}'",
            pr.number,
            pr.action.as_deref().unwrap_or("unknown action"),
            pr.pull_request.head.r#ref
        );
    }

    Ok(DeployRequest {
        url: deploy_url(base_url),
        body: envelope.payload.clone(),
        query_params: event.query_params(),
    })
}

/// Keep response bodies readable in the job log
fn truncate_for_log(text: &str) -> String {
    if text.chars().count() > MAX_LOGGED_BODY_LEN {
        let head: String = text.chars().take(MAX_LOGGED_BODY_LEN).collect();
        format!("{}... (truncated)", head)
    } else {
        text.to_string()
    }
}

pub struct Dispatcher {
    client: Client,
    endpoint: String,
    dry_run: bool,
}

impl Dispatcher {
    /// Validate the endpoint and build the HTTP client. Fails before any network access.
    pub fn new(config: &DeployConfig) -> Result<Self> {
        let endpoint = config.endpoint()?;
        let parsed = Url::parse(endpoint).map_err(|e| {
            DeployError::ConfigError(format!("Invalid deploy endpoint '{}': {}", endpoint, e))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DeployError::ConfigError(format!(
                "Deploy endpoint '{}' must be an http(s) URL",
                endpoint
            )));
        }

        // 3xx from the deploy service is a failure, never followed
        let client = Client::builder()
            .timeout(config.timeout()?)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| DeployError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            dry_run: false,
        })
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn build_request(&self, envelope: &EventEnvelope) -> Result<DeployRequest> {
        build_request(&self.endpoint, envelope)
    }

    /// POST the request and wait for the deploy service to answer.
    /// Any 2xx status is success; everything else is returned as an error.
    pub async fn send(&self, request: &DeployRequest) -> Result<String> {
        let body = request.body_text();

        if self.dry_run {
            info!(
                "[DRY_RUN] Would POST {} with params {:?}",
                request.url, request.query_params
            );
            return Ok(DEPLOY_OK.to_string());
        }

        info!("Posting event to {}", request.url);
        let response = self
            .client
            .post(&request.url)
            .query(&request.query_params)
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!("Deploy request to {} failed: {}", request.url, e);
                DeployError::RequestFailed(e)
            })?;

        // Only the status decides the outcome; the body is read for the log.
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|e| format!("<unreadable body: {}>", e));

        if !status.is_success() {
            let text = truncate_for_log(&text);
            error!("Deploy endpoint responded with {}: {}", status, text);
            return Err(DeployError::BadStatus { status, body: text });
        }

        info!("response: {} {}", status, truncate_for_log(&text));
        Ok(DEPLOY_OK.to_string())
    }

    /// Forward one event: build the request, send it, and report the outcome.
    pub async fn dispatch(&self, envelope: &EventEnvelope) -> Result<String> {
        info!("event name: {}", envelope.name);
        debug!("event payload:\n{:#}", envelope.payload);

        let request = self.build_request(envelope)?;
        self.send(&request).await
    }
}
