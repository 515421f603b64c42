//! WebSocket message types for the venue's public channels.

use crate::error::{WsError, WsResult};
use serde::{Deserialize, Serialize};

/// Channel/instrument pair used in subscribe requests and push headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionArg {
    pub channel: String,
    #[serde(rename = "instId")]
    pub inst_id: String,
}

/// Outgoing operation request.
#[derive(Debug, Clone, Serialize)]
pub struct WsRequest {
    pub op: String,
    pub args: Vec<SubscriptionArg>,
}

impl WsRequest {
    /// Create a subscribe request.
    pub fn subscribe(channel: impl Into<String>, inst_id: impl Into<String>) -> Self {
        Self {
            op: "subscribe".to_string(),
            args: vec![SubscriptionArg {
                channel: channel.into(),
                inst_id: inst_id.into(),
            }],
        }
    }
}

/// Control message (`{"event": ...}`): subscribe ack, error, notice.
#[derive(Debug, Clone, Deserialize)]
pub struct EventMessage {
    pub event: String,
    #[serde(default)]
    pub arg: Option<SubscriptionArg>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(rename = "connId", default)]
    pub conn_id: Option<String>,
}

impl EventMessage {
    pub fn is_subscribe_ack(&self) -> bool {
        self.event == "subscribe"
    }

    pub fn is_error(&self) -> bool {
        self.event == "error"
    }
}

/// Data push for a subscribed channel.
#[derive(Debug, Clone, Deserialize)]
pub struct PushMessage {
    pub arg: SubscriptionArg,
    /// "snapshot" or "update" on book channels; absent on fixed-depth channels.
    #[serde(default)]
    pub action: Option<String>,
    pub data: Vec<serde_json::Value>,
}

/// Incoming WebSocket message.
#[derive(Debug, Clone)]
pub enum WsMessage {
    /// Control message.
    Event(EventMessage),
    /// Channel data.
    Push(PushMessage),
    /// Text keep-alive reply ("pong").
    Pong,
}

impl WsMessage {
    /// Parse a text frame.
    pub fn parse(text: &str) -> WsResult<Self> {
        if text == "pong" {
            return Ok(Self::Pong);
        }

        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| WsError::ParseError(format!("{e}: {text}")))?;

        if value.get("event").is_some() {
            Ok(Self::Event(serde_json::from_value(value)?))
        } else if value.get("data").is_some() {
            Ok(Self::Push(serde_json::from_value(value)?))
        } else {
            Err(WsError::ParseError(format!("Unrecognized message: {text}")))
        }
    }
}
