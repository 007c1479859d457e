/// Model provider implementations.
///
/// The only backend Mimic ships is the Anthropic Messages API over HTTP;
/// the `ModelBackend` trait keeps the loop independent of it.
use crate::errors::{ProviderError, ProviderResult};
use crate::traits::{ContentBlock, ModelBackend, ModelRequest, ModelResponse, StopReason, Tool};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

/// Anthropic provider using the HTTP Messages API.
pub struct AnthropicProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl AnthropicProvider {
    /// Create a provider with the default endpoint.
    pub fn new(api_key: String, timeout_secs: u64) -> ProviderResult<Self> {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT.to_string(), timeout_secs)
    }

    /// Create a provider against a custom endpoint (mock servers in tests).
    pub fn with_endpoint(
        api_key: String,
        endpoint: String,
        timeout_secs: u64,
    ) -> ProviderResult<Self> {
        if api_key.is_empty() {
            return Err(ProviderError::AuthenticationError(
                "missing Anthropic API key (set ANTHROPIC_API_KEY or config)".to_string(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(ProviderError::ReqwestError)?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }

    /// Serialize our tool specs into the wire `input_schema` shape.
    fn tool_payload(tools: &[Tool]) -> Vec<serde_json::Value> {
        tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "input_schema": {
                        "type": "object",
                        "properties": t.parameters.properties,
                        "required": t.parameters.required,
                    },
                })
            })
            .collect()
    }
}

#[async_trait]
impl ModelBackend for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn complete(&self, request: ModelRequest) -> ProviderResult<ModelResponse> {
        let mut payload = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "messages": request.messages,
        });
        if let Some(system) = &request.system_prompt {
            payload["system"] = json!(system);
        }
        if let Some(tools) = &request.tools {
            if !tools.is_empty() {
                payload["tools"] = json!(Self::tool_payload(tools));
            }
        }

        let response = self
            .client
            .post(format!("{}/messages", self.endpoint))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::ReqwestError(e)
                }
            })?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ProviderError::AuthenticationError(format!(
                "API rejected credentials (status {})",
                status
            )));
        }
        if status.as_u16() == 429 {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "(no body)".into());
            return Err(ProviderError::ApiError(format!(
                "API request failed with status {}: {}",
                status, body
            )));
        }

        let body = response
            .json::<serde_json::Value>()
            .await
            .map_err(ProviderError::ReqwestError)?;

        let content: Vec<ContentBlock> = serde_json::from_value(
            body.get("content")
                .cloned()
                .ok_or_else(|| ProviderError::InvalidResponse("missing content".to_string()))?,
        )
        .map_err(|e| ProviderError::InvalidResponse(format!("bad content blocks: {e}")))?;

        let stop_reason = match body.get("stop_reason").and_then(|s| s.as_str()) {
            Some("end_turn") => StopReason::EndTurn,
            Some("max_tokens") => StopReason::MaxTokens,
            Some("tool_use") => StopReason::ToolUse,
            _ => StopReason::Unknown,
        };

        Ok(ModelResponse {
            content,
            stop_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::ToolParameters;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn rejects_empty_api_key() {
        let result = AnthropicProvider::new(String::new(), 60);
        assert!(matches!(
            result,
            Err(ProviderError::AuthenticationError(_))
        ));
    }

    #[test]
    fn tool_payload_builds_input_schema() {
        let mut properties = HashMap::new();
        properties.insert(
            "path".to_string(),
            json!({"type": "string", "description": "API path"}),
        );
        let tool = Tool {
            name: "make_http_request".into(),
            description: "Probe the target API".into(),
            parameters: ToolParameters {
                required: vec!["path".into()],
                properties,
            },
        };

        let payload = AnthropicProvider::tool_payload(&[tool]);
        assert_eq!(payload.len(), 1);
        assert_eq!(payload[0]["name"], "make_http_request");
        assert_eq!(payload[0]["input_schema"]["type"], "object");
        assert_eq!(payload[0]["input_schema"]["required"][0], "path");
        assert!(payload[0]["input_schema"]["properties"]["path"].is_object());
    }

    #[test]
    fn response_content_deserializes_tool_use() {
        let body = json!([
            {"type": "text", "text": "Let me check."},
            {"type": "tool_use", "id": "toolu_1", "name": "make_http_request",
             "input": {"method": "GET", "path": "/api/books"}}
        ]);
        let content: Vec<ContentBlock> = serde_json::from_value(body).unwrap();
        assert_eq!(content.len(), 2);
        match &content[1] {
            ContentBlock::ToolUse { name, input, .. } => {
                assert_eq!(name, "make_http_request");
                assert_eq!(input["path"], "/api/books");
            }
            _ => panic!("expected tool_use block"),
        }
    }
}
