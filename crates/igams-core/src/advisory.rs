//! Advisory Bridge — optional free-text elaboration from an external service.
//!
//! The bridge is opaque: it receives `{metrics, issues, signals}` and answers
//! with a JSON object. Every failure mode (disabled, transport error, timeout,
//! non-2xx, malformed body, explicit `error` key) collapses into
//! [`Advisory::Unavailable`]; none of them touch the structured results.

use crate::config::AdvisoryConfig;
use crate::issues::Issue;
use crate::metrics::DailyMetrics;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Request / outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryRequest {
    pub metrics: DailyMetrics,
    pub issues: Vec<Issue>,
    pub signals: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Advisory {
    Available { response: serde_json::Value },
    Unavailable { reason: String },
}

impl Advisory {
    pub fn is_available(&self) -> bool {
        matches!(self, Advisory::Available { .. })
    }
}

#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("advisory service is disabled")]
    Disabled,

    #[error("advisory transport failed: {0}")]
    Transport(String),

    #[error("advisory service returned HTTP {0}")]
    Status(u16),

    #[error("advisory response is malformed: {0}")]
    Malformed(String),

    #[error("advisory service reported an error: {0}")]
    Remote(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeInfo {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

// ---------------------------------------------------------------------------
// AdvisoryBridge
// ---------------------------------------------------------------------------

pub trait AdvisoryBridge: Send + Sync {
    fn request(&self, req: &AdvisoryRequest) -> Result<serde_json::Value, AdvisoryError>;

    fn describe(&self) -> BridgeInfo;
}

/// Call the bridge and fold any failure into `Advisory::Unavailable`.
pub fn consult(bridge: &dyn AdvisoryBridge, req: &AdvisoryRequest) -> Advisory {
    match bridge.request(req) {
        Ok(response) => Advisory::Available { response },
        Err(AdvisoryError::Disabled) => {
            debug!("advisory bridge disabled; returning structured results only");
            Advisory::Unavailable {
                reason: AdvisoryError::Disabled.to_string(),
            }
        }
        Err(e) => {
            warn!(error = %e, "advisory bridge degraded");
            Advisory::Unavailable {
                reason: e.to_string(),
            }
        }
    }
}

/// Accept only a JSON object without an `error` key.
pub fn interpret_body(body: &str) -> Result<serde_json::Value, AdvisoryError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| AdvisoryError::Malformed(e.to_string()))?;
    let Some(map) = value.as_object() else {
        return Err(AdvisoryError::Malformed(
            "expected a JSON object".to_string(),
        ));
    };
    if let Some(err) = map.get("error") {
        let message = match err {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        return Err(AdvisoryError::Remote(message));
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// DisabledBridge
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledBridge;

impl AdvisoryBridge for DisabledBridge {
    fn request(&self, _req: &AdvisoryRequest) -> Result<serde_json::Value, AdvisoryError> {
        Err(AdvisoryError::Disabled)
    }

    fn describe(&self) -> BridgeInfo {
        BridgeInfo {
            configured: false,
            endpoint: None,
            model: None,
        }
    }
}

// ---------------------------------------------------------------------------
// HttpAdvisoryBridge
// ---------------------------------------------------------------------------

/// Blocking HTTP client with a bounded timeout. Call from a blocking context
/// (e.g. `spawn_blocking`), never directly on an async executor thread.
pub struct HttpAdvisoryBridge {
    client: reqwest::blocking::Client,
    endpoint: String,
    token: Option<String>,
    model: Option<String>,
}

impl HttpAdvisoryBridge {
    pub fn new(
        endpoint: impl Into<String>,
        timeout: Duration,
        token: Option<String>,
        model: Option<String>,
    ) -> Result<Self, AdvisoryError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdvisoryError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token,
            model,
        })
    }
}

impl AdvisoryBridge for HttpAdvisoryBridge {
    fn request(&self, req: &AdvisoryRequest) -> Result<serde_json::Value, AdvisoryError> {
        let mut builder = self.client.post(&self.endpoint).json(req);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        let response = builder
            .send()
            .map_err(|e| AdvisoryError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(AdvisoryError::Status(status.as_u16()));
        }
        let body = response
            .text()
            .map_err(|e| AdvisoryError::Transport(e.to_string()))?;
        interpret_body(&body)
    }

    fn describe(&self) -> BridgeInfo {
        BridgeInfo {
            configured: true,
            endpoint: Some(self.endpoint.clone()),
            model: self.model.clone(),
        }
    }
}

/// Select the bridge implementation for a config. A disabled or incomplete
/// config yields [`DisabledBridge`].
pub fn bridge_from_config(cfg: &AdvisoryConfig) -> Box<dyn AdvisoryBridge> {
    if !cfg.enabled {
        return Box::new(DisabledBridge);
    }
    let Some(endpoint) = cfg.endpoint.as_deref().filter(|e| !e.is_empty()) else {
        warn!("advisory enabled without an endpoint; bridge disabled");
        return Box::new(DisabledBridge);
    };
    let token = std::env::var(&cfg.api_key_env)
        .ok()
        .filter(|t| !t.is_empty());
    match HttpAdvisoryBridge::new(
        endpoint,
        Duration::from_secs(cfg.timeout_secs.max(1)),
        token,
        cfg.model.clone(),
    ) {
        Ok(bridge) => Box::new(bridge),
        Err(e) => {
            warn!(error = %e, "failed to build advisory client; bridge disabled");
            Box::new(DisabledBridge)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> AdvisoryRequest {
        AdvisoryRequest {
            metrics: DailyMetrics::empty(),
            issues: vec![],
            signals: vec!["time_overrun_ratio".to_string()],
        }
    }

    fn http_bridge(url: String) -> HttpAdvisoryBridge {
        HttpAdvisoryBridge::new(url, Duration::from_secs(5), None, Some("advisor".into())).unwrap()
    }

    #[test]
    fn request_serializes_contract_shape() {
        let json = serde_json::to_value(request()).unwrap();
        assert!(json["metrics"].is_object());
        assert!(json["issues"].is_array());
        assert_eq!(json["signals"][0], "time_overrun_ratio");
    }

    #[test]
    fn available_response_is_passed_through() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/advise")
            .match_header("content-type", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"analysis":"Split the long review step."}"#)
            .create();

        let bridge = http_bridge(format!("{}/advise", server.url()));
        let advisory = consult(&bridge, &request());
        mock.assert();
        match advisory {
            Advisory::Available { response } => {
                assert_eq!(response["analysis"], "Split the long review step.")
            }
            other => panic!("expected available, got {other:?}"),
        }
    }

    #[test]
    fn bearer_token_is_sent_when_configured() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/advise")
            .match_header("authorization", "Bearer secret-token")
            .with_status(200)
            .with_body("{}")
            .create();
        let bridge = HttpAdvisoryBridge::new(
            format!("{}/advise", server.url()),
            Duration::from_secs(5),
            Some("secret-token".to_string()),
            None,
        )
        .unwrap();
        assert!(consult(&bridge, &request()).is_available());
        mock.assert();
    }

    #[test]
    fn server_error_degrades_to_unavailable() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("POST", "/advise").with_status(500).create();
        let bridge = http_bridge(format!("{}/advise", server.url()));
        assert_eq!(
            consult(&bridge, &request()),
            Advisory::Unavailable {
                reason: "advisory service returned HTTP 500".to_string()
            }
        );
    }

    #[test]
    fn error_payload_degrades_to_unavailable() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/advise")
            .with_status(200)
            .with_body(r#"{"error":"AI service not configured"}"#)
            .create();
        let bridge = http_bridge(format!("{}/advise", server.url()));
        let advisory = consult(&bridge, &request());
        assert!(
            matches!(advisory, Advisory::Unavailable { ref reason } if reason.contains("not configured"))
        );
    }

    #[test]
    fn malformed_body_degrades_to_unavailable() {
        let mut server = mockito::Server::new();
        let _mock = server
            .mock("POST", "/advise")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create();
        let bridge = http_bridge(format!("{}/advise", server.url()));
        assert!(!consult(&bridge, &request()).is_available());
    }

    #[test]
    fn unreachable_endpoint_degrades_to_unavailable() {
        let bridge = http_bridge("http://127.0.0.1:9/advise".to_string());
        assert!(!consult(&bridge, &request()).is_available());
    }

    #[test]
    fn interpret_body_rejects_non_objects() {
        assert!(matches!(
            interpret_body("[1,2]"),
            Err(AdvisoryError::Malformed(_))
        ));
        assert!(matches!(
            interpret_body(r#"{"error":{"code":7}}"#),
            Err(AdvisoryError::Remote(ref m)) if m.contains("7")
        ));
        assert!(interpret_body(r#"{"recommendation":{}}"#).is_ok());
    }

    #[test]
    fn disabled_config_yields_disabled_bridge() {
        let bridge = bridge_from_config(&AdvisoryConfig::default());
        assert!(!bridge.describe().configured);
        assert_eq!(
            consult(bridge.as_ref(), &request()),
            Advisory::Unavailable {
                reason: "advisory service is disabled".to_string()
            }
        );
    }

    #[test]
    fn enabled_config_describes_endpoint() {
        let cfg = AdvisoryConfig {
            enabled: true,
            endpoint: Some("http://localhost:9000/advise".to_string()),
            model: Some("advisor-large".to_string()),
            ..AdvisoryConfig::default()
        };
        let info = bridge_from_config(&cfg).describe();
        assert!(info.configured);
        assert_eq!(info.endpoint.as_deref(), Some("http://localhost:9000/advise"));
        assert_eq!(info.model.as_deref(), Some("advisor-large"));
    }

    #[test]
    fn advisory_serializes_with_status_tag() {
        let json = serde_json::to_value(Advisory::Unavailable {
            reason: "x".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "unavailable");
        assert_eq!(json["reason"], "x");
    }
}
