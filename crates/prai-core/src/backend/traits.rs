use serde::{Deserialize, Serialize};

/// Used when the service answered 2xx without a usable `reply`.
pub const FALLBACK_EMPTY_REPLY: &str =
    "Thanks \u{2014} I\u{2019}ve received your message. The AI engine will reply here once connected.";

/// Used when the service answered with a non-success status.
pub const FALLBACK_ROUTE_UNAVAILABLE: &str = "Your backend responded, but the /chat route isn\u{2019}t set up yet. I\u{2019}ll echo your message for now.";

/// Used when the service could not be reached at all.
pub const FALLBACK_UNREACHABLE: &str = "I couldn\u{2019}t reach the backend. I\u{2019}ll keep your message saved to this client. Once the AI endpoint is live, I\u{2019}ll reply here.";

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub client_id: String,
    pub message: String,
}

impl ChatRequest {
    pub fn new(client_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            message: message.into(),
        }
    }
}

/// How one call to the assistant service turned out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatOutcome {
    /// 2xx with a non-empty `reply` string.
    Reply(String),
    /// 2xx, but the body had no usable `reply`.
    EmptyReply,
    /// The service answered with a non-success status.
    RouteUnavailable { status: u16 },
    /// Transport failure, including timeouts.
    Unreachable { reason: String },
}

impl ChatOutcome {
    /// Text of the assistant message this outcome produces.
    pub fn into_content(self) -> String {
        match self {
            ChatOutcome::Reply(text) => text,
            ChatOutcome::EmptyReply => FALLBACK_EMPTY_REPLY.to_string(),
            ChatOutcome::RouteUnavailable { .. } => FALLBACK_ROUTE_UNAVAILABLE.to_string(),
            ChatOutcome::Unreachable { .. } => FALLBACK_UNREACHABLE.to_string(),
        }
    }
}

/// The assistant service. Implementations classify every failure into a
/// [`ChatOutcome`] instead of returning an error.
#[async_trait::async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> ChatOutcome;
}
