//! Webhook event structures
//!
//! The envelope is what the CI host hands us: the event name plus the raw JSON
//! payload. Only `pull_request` payloads are given a typed shape; everything
//! else is forwarded untouched.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::error::{DeployError, Result};

pub const PULL_REQUEST_EVENT: &str = "pull_request";

/// Query parameters attached to the deploy request, in a stable order
pub type QueryParams = BTreeMap<String, String>;

/// Event name and payload delivered by the triggering CI event
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope {
    pub name: String,
    pub payload: Value,
}

impl EventEnvelope {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// Envelope with an empty `{}` payload
    pub fn empty(name: impl Into<String>) -> Self {
        Self::new(name, Value::Object(Map::new()))
    }

    pub fn is_pull_request(&self) -> bool {
        self.name == PULL_REQUEST_EVENT
    }

    /// Parse the payload into the shape this event name calls for.
    pub fn classify(&self) -> Result<DeployEvent> {
        if !self.payload.is_object() {
            return Err(DeployError::MalformedEvent {
                event: self.name.clone(),
                message: "payload is not a JSON object".to_string(),
            });
        }

        if !self.is_pull_request() {
            return Ok(DeployEvent::Other {
                name: self.name.clone(),
            });
        }

        let event = PullRequestEvent::deserialize(&self.payload).map_err(|e| {
            DeployError::MalformedEvent {
                event: self.name.clone(),
                message: e.to_string(),
            }
        })?;
        Ok(DeployEvent::PullRequest(event))
    }
}

/// An envelope after its payload has been recognised
#[derive(Debug, Clone, PartialEq)]
pub enum DeployEvent {
    PullRequest(PullRequestEvent),
    Other { name: String },
}

impl DeployEvent {
    /// Query parameters for the deploy service. Only pull requests carry any.
    pub fn query_params(&self) -> QueryParams {
        match self {
            DeployEvent::PullRequest(pr) => pr.query_params(),
            DeployEvent::Other { .. } => QueryParams::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PullRequestEvent {
    pub number: u64,
    pub action: Option<String>,
    pub pull_request: PullRequest,
}

impl PullRequestEvent {
    /// Directory name the deploy service checks the PR out into, e.g. `pr007`
    pub fn dirname(&self) -> String {
        format!("pr{:03}", self.number)
    }

    pub fn query_params(&self) -> QueryParams {
        let head = &self.pull_request.head;
        QueryParams::from([
            ("origin".to_string(), head.repo.clone_url.clone()),
            ("branch".to_string(), head.r#ref.clone()),
            ("dirname".to_string(), self.dirname()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PullRequest {
    pub head: PrRef,
    pub base: Option<PrRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PrRef {
    pub r#ref: String,
    pub repo: PrRepo,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PrRepo {
    pub clone_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pr_payload(number: u64) -> Value {
        json!({
            "action": "opened",
            "number": number,
            "pull_request": {
                "base": { "ref": "main", "repo": { "clone_url": "https://example.com/repo.git" } },
                "head": { "ref": "feature-x", "repo": { "clone_url": "https://example.com/repo.git" } }
            }
        })
    }

    #[test]
    fn pull_request_params() {
        let envelope = EventEnvelope::new("pull_request", pr_payload(7));
        let params = envelope.classify().unwrap().query_params();

        assert_eq!(
            params,
            QueryParams::from([
                ("origin".into(), "https://example.com/repo.git".into()),
                ("branch".into(), "feature-x".into()),
                ("dirname".into(), "pr007".into()),
            ])
        );
    }

    #[test]
    fn dirname_widens_past_three_digits() {
        let envelope = EventEnvelope::new("pull_request", pr_payload(1234));
        let params = envelope.classify().unwrap().query_params();
        assert_eq!(params["dirname"], "pr1234");
    }

    #[test]
    fn other_events_have_no_params() {
        for name in ["push", "release", "workflow_dispatch", ""] {
            let envelope = EventEnvelope::new(name, pr_payload(7));
            let event = envelope.classify().unwrap();
            assert_eq!(event, DeployEvent::Other { name: name.into() });
            assert!(event.query_params().is_empty());
        }
    }

    #[test]
    fn missing_head_is_malformed() {
        let payload = json!({
            "number": 3,
            "pull_request": { "base": { "ref": "main", "repo": { "clone_url": "x" } } }
        });
        let err = EventEnvelope::new("pull_request", payload)
            .classify()
            .unwrap_err();

        match err {
            DeployError::MalformedEvent { event, message } => {
                assert_eq!(event, "pull_request");
                assert!(message.contains("head"), "unexpected message: {}", message);
            }
            other => panic!("expected malformed event, got {:?}", other),
        }
    }

    #[test]
    fn missing_number_is_malformed() {
        let mut payload = pr_payload(1);
        payload.as_object_mut().unwrap().remove("number");
        let err = EventEnvelope::new("pull_request", payload)
            .classify()
            .unwrap_err();
        assert!(matches!(err, DeployError::MalformedEvent { .. }));
    }

    #[test]
    fn base_is_optional() {
        let mut payload = pr_payload(5);
        payload["pull_request"]
            .as_object_mut()
            .unwrap()
            .remove("base");
        let event = EventEnvelope::new("pull_request", payload)
            .classify()
            .unwrap();
        assert!(matches!(event, DeployEvent::PullRequest(ref pr) if pr.pull_request.base.is_none()));
    }

    #[test]
    fn non_object_payload_is_malformed() {
        let err = EventEnvelope::new("push", json!([1, 2, 3]))
            .classify()
            .unwrap_err();
        assert!(matches!(err, DeployError::MalformedEvent { .. }));
    }
}
