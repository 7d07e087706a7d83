//! Wire contract for the frame channel.
//!
//! One outbound message type (the subscribe directive) and a tagged union of
//! inbound messages keyed by `type`. Payloads are JSON text frames.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a capture channel.
pub type ChannelId = i64;

/// Errors raised while decoding inbound payloads.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid image payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Messages sent to the frame service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ChannelCommand {
    /// Switch this connection's subscription to `channel_id`.
    Subscribe { channel_id: ChannelId },
}

impl ChannelCommand {
    /// Serialize to the JSON text sent over the socket.
    pub fn to_json(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Messages received from the frame service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    /// Latest sampled still for a channel.
    Frame {
        channel_id: ChannelId,
        /// Base64-encoded still image (JPEG from the producer).
        #[serde(alias = "image_payload")]
        image_base64: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },
    /// Acknowledges a subscribe directive.
    SubscriptionConfirmed {
        channel_id: ChannelId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },
    /// Detection alert. Consumed by the alert review page, not the editor.
    Alert {
        channel_id: ChannelId,
        #[serde(default)]
        channel_name: String,
        #[serde(default)]
        alert_type: String,
        #[serde(default)]
        confidence: f32,
        /// JSON-encoded list of detected objects.
        #[serde(default)]
        detected_objects: String,
        #[serde(default)]
        image_base64: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },
    /// Acknowledges an alert-feed connection.
    AlertSubscriptionConfirmed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timestamp: Option<String>,
    },
}

impl StreamMessage {
    /// Decode one inbound text payload.
    pub fn decode(text: &str) -> ProtocolResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encode for sending (used by the relay server and tests).
    pub fn to_json(&self) -> ProtocolResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Channel this message refers to, if any.
    pub fn channel_id(&self) -> Option<ChannelId> {
        match self {
            StreamMessage::Frame { channel_id, .. }
            | StreamMessage::SubscriptionConfirmed { channel_id, .. }
            | StreamMessage::Alert { channel_id, .. } => Some(*channel_id),
            StreamMessage::AlertSubscriptionConfirmed { .. } => None,
        }
    }

    /// Build a frame message from raw image bytes.
    pub fn frame(channel_id: ChannelId, image: &[u8], timestamp: Option<String>) -> Self {
        StreamMessage::Frame {
            channel_id,
            image_base64: encode_image(image),
            timestamp,
        }
    }
}

/// Decode a base64 image payload into raw encoded-image bytes.
pub fn decode_image(payload: &str) -> ProtocolResult<Vec<u8>> {
    Ok(STANDARD.decode(payload.trim())?)
}

/// Encode raw image bytes as a base64 payload.
pub fn encode_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
