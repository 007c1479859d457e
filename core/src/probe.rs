//! HTTP probing of the target API during exploration.
//!
//! Every probe returns a structured JSON value, success or not; network
//! failures become data the model can react to instead of run errors.

use crate::errors::{AgentError, AgentResult};
use reqwest::{Method, Url};
use serde_json::{json, Map, Value};
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Issues bounded HTTP requests against the exploration target.
pub struct HttpProbe {
    client: reqwest::Client,
    base: Url,
}

impl HttpProbe {
    pub fn new(target_url: &str) -> AgentResult<Self> {
        let base = Url::parse(target_url)
            .map_err(|e| AgentError::ExecutionError(format!("invalid target url: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(PROBE_TIMEOUT)
            .build()
            .map_err(|e| AgentError::ExecutionError(format!("http client: {e}")))?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Perform one probe. The returned value is either
    /// `{success, status, statusText, headers, body}` or
    /// `{success: false, error}`.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        headers: Option<&Map<String, Value>>,
        body: Option<&Value>,
    ) -> Value {
        let method = match method.to_uppercase().as_str() {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "PATCH" => Method::PATCH,
            other => {
                return json!({
                    "success": false,
                    "error": format!("Unsupported method: {other}"),
                })
            }
        };

        let url = match self.base.join(path) {
            Ok(u) => u,
            Err(e) => {
                return json!({
                    "success": false,
                    "error": format!("invalid path {path:?}: {e}"),
                })
            }
        };

        let mut builder = self.client.request(method, url);
        if let Some(headers) = headers {
            for (name, value) in headers {
                match value.as_str() {
                    Some(value) => builder = builder.header(name, value),
                    None => {
                        return json!({
                            "success": false,
                            "error": format!("header {name:?} must be a string value"),
                        })
                    }
                }
            }
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => {
                return json!({
                    "success": false,
                    "error": e.to_string(),
                })
            }
        };

        let status = response.status();
        let status_text = status.canonical_reason().unwrap_or("").to_string();
        let mut header_map = Map::new();
        for (name, value) in response.headers() {
            header_map.insert(
                name.to_string(),
                Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            );
        }

        let text = response.text().await.unwrap_or_default();
        // Prefer a parsed JSON body; fall back to the raw text.
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        json!({
            "success": true,
            "status": status.as_u16(),
            "statusText": status_text,
            "headers": header_map,
            "body": body,
        })
    }
}
