use super::traits::*;
use crate::config::ApiSettings;
use crate::error::PraiError;
use serde_json::Value;
use std::time::Duration;

/// Client for the assistant service's `POST /chat` route.
pub struct HttpChatBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpChatBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: normalize_base_url(base_url.into()),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, PraiError> {
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    pub fn from_settings(api: &ApiSettings) -> Result<Self, PraiError> {
        let backend = Self::new(api.base_url.clone());
        match api.timeout_secs {
            Some(secs) if secs > 0 => backend.with_timeout(Duration::from_secs(secs)),
            _ => Ok(backend),
        }
    }

    pub fn chat_url(&self) -> String {
        format!("{}/chat", self.base_url)
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

/// Non-empty string at `reply`, if any.
fn extract_reply(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    value
        .get("reply")
        .and_then(Value::as_str)
        .filter(|reply| !reply.is_empty())
        .map(str::to_string)
}

#[async_trait::async_trait]
impl ChatBackend for HttpChatBackend {
    async fn chat(&self, request: &ChatRequest) -> ChatOutcome {
        let url = self.chat_url();

        let resp = match self.client.post(&url).json(request).send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!("Chat backend unreachable at {}: {}", url, e);
                return ChatOutcome::Unreachable {
                    reason: e.to_string(),
                };
            }
        };

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!("Chat backend returned {} for {}", status, url);
            return ChatOutcome::RouteUnavailable {
                status: status.as_u16(),
            };
        }

        // An unreadable body counts as a reply without content.
        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Failed to read chat backend response: {}", e);
                return ChatOutcome::EmptyReply;
            }
        };

        match extract_reply(&body) {
            Some(reply) => {
                tracing::debug!("Chat backend replied for client {}", request.client_id);
                ChatOutcome::Reply(reply)
            }
            None => {
                tracing::warn!("Chat backend response had no usable 'reply' field");
                ChatOutcome::EmptyReply
            }
        }
    }
}
