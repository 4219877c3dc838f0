//! Relays a single tool-call record to a Langfuse-compatible tracing backend.
//!
//! Runs as a best-effort hook after another tool has already done its work, so
//! nothing in here is allowed to fail loudly: every path ends in a
//! [`ForwardOutcome`] and the caller decides to ignore it.

use crate::error::TraceError;
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use url::Url;
use uuid::Uuid;

pub const DEFAULT_TRACE_HOST: &str = "http://localhost:3000";
const FORWARD_TIMEOUT: Duration = Duration::from_secs(5);
const INGESTION_PATH: &str = "api/public/ingestion";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceConfig {
    pub host: String,
    pub public_key: String,
    pub secret_key: String,
    pub session_id: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl TraceConfig {
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// `None` unless both keys are present and non-blank.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let public_key = non_blank(lookup("LANGFUSE_PUBLIC_KEY"))?;
        let secret_key = non_blank(lookup("LANGFUSE_SECRET_KEY"))?;
        let host = non_blank(lookup("LANGFUSE_HOST")).unwrap_or_else(|| DEFAULT_TRACE_HOST.to_string());

        Some(Self {
            host,
            public_key,
            secret_key,
            session_id: non_blank(lookup("LANGFUSE_SESSION_ID")),
        })
    }

    pub fn ingestion_url(&self) -> Result<Url, TraceError> {
        let base = Url::parse(&format!("{}/", self.host.trim_end_matches('/')))?;
        Ok(base.join(INGESTION_PATH)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolCallEvent {
    pub tool_name: String,
    pub input: Value,
    pub output: Value,
    pub success: bool,
    pub error: Option<String>,
    pub session_id: Option<String>,
    pub tool_use_id: Option<String>,
}

fn string_field(record: &Value, key: &str) -> Option<String> {
    record
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

impl ToolCallEvent {
    /// Reads the fields a post-tool hook delivers; anything missing gets a neutral default.
    pub fn from_record(record: &Value) -> Self {
        let output = record
            .get("tool_response")
            .cloned()
            .unwrap_or_else(|| json!({}));
        let error = output
            .get("stderr")
            .and_then(Value::as_str)
            .filter(|stderr| !stderr.is_empty())
            .map(str::to_string);

        Self {
            tool_name: string_field(record, "tool_name").unwrap_or_else(|| "unknown".to_string()),
            input: record.get("tool_input").cloned().unwrap_or_else(|| json!({})),
            output,
            success: error.is_none(),
            error,
            session_id: string_field(record, "session_id"),
            tool_use_id: string_field(record, "tool_use_id"),
        }
    }

    /// Record's own session, then the configured one, then one derived from `now`.
    pub fn resolve_session_id(&self, config: &TraceConfig, now: DateTime<Utc>) -> String {
        self.session_id
            .clone()
            .or_else(|| config.session_id.clone())
            .unwrap_or_else(|| format!("session-{}", now.format("%Y%m%d-%H%M%S")))
    }
}

/// Ingestion batch with one trace and one span describing the tool call.
pub fn build_batch(event: &ToolCallEvent, session_id: &str, now: DateTime<Utc>) -> Value {
    let timestamp = now.to_rfc3339();
    let trace_id = Uuid::new_v4().to_string();
    let name = format!("tool:{}", event.tool_name);
    let metadata = json!({
        "source": "post-tool-hook",
        "tool_name": event.tool_name,
        "tool_use_id": event.tool_use_id,
        "session_id": session_id,
        "success": event.success,
    });

    json!({
        "batch": [
            {
                "id": Uuid::new_v4().to_string(),
                "timestamp": timestamp,
                "type": "trace-create",
                "body": {
                    "id": trace_id,
                    "timestamp": timestamp,
                    "name": name,
                    "sessionId": session_id,
                    "input": event.input,
                    "output": event.output,
                    "metadata": metadata,
                }
            },
            {
                "id": Uuid::new_v4().to_string(),
                "timestamp": timestamp,
                "type": "span-create",
                "body": {
                    "id": Uuid::new_v4().to_string(),
                    "traceId": trace_id,
                    "name": name,
                    "startTime": timestamp,
                    "endTime": timestamp,
                    "input": event.input,
                    "output": event.output,
                    "level": if event.success { "DEFAULT" } else { "ERROR" },
                    "statusMessage": event.error,
                    "metadata": metadata,
                }
            }
        ]
    })
}

pub struct TraceForwarder {
    config: TraceConfig,
    client: Client,
}

impl TraceForwarder {
    pub fn new(config: TraceConfig) -> Result<Self, TraceError> {
        let client = Client::builder().timeout(FORWARD_TIMEOUT).build()?;
        Ok(Self { config, client })
    }

    pub fn send(&self, event: &ToolCallEvent) -> Result<(), TraceError> {
        let now = Utc::now();
        let session_id = event.resolve_session_id(&self.config, now);
        let url = self.config.ingestion_url()?;

        let response = self
            .client
            .post(url)
            .basic_auth(&self.config.public_key, Some(&self.config.secret_key))
            .json(&build_batch(event, &session_id, now))
            .send()?;

        if !response.status().is_success() {
            return Err(TraceError::BackendResponse(response.status().to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForwardOutcome {
    EmptyInput,
    MalformedInput,
    NotConfigured,
    Sent,
    Failed(String),
}

/// Parses `raw` and forwards it when `config` is present. Never panics, never errors.
pub fn forward_record(raw: &str, config: Option<TraceConfig>) -> ForwardOutcome {
    let raw = raw.trim();
    if raw.is_empty() {
        return ForwardOutcome::EmptyInput;
    }

    let record: Value = match serde_json::from_str(raw) {
        Ok(value @ Value::Object(_)) => value,
        Ok(_) | Err(_) => return ForwardOutcome::MalformedInput,
    };

    let Some(config) = config else {
        return ForwardOutcome::NotConfigured;
    };

    let event = ToolCallEvent::from_record(&record);
    match TraceForwarder::new(config).and_then(|forwarder| forwarder.send(&event)) {
        Ok(()) => ForwardOutcome::Sent,
        Err(error) => {
            debug!(error = %error, tool = %event.tool_name, "trace forwarding failed");
            ForwardOutcome::Failed(error.to_string())
        }
    }
}
