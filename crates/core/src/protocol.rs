// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway wire protocol.
//!
//! JSON text frames tagged by `type`:
//! - Client sends `connection_init`, then `start`/`stop` per topic
//! - Server acknowledges, pushes `data` per topic, and sends `ka` keep-alives

use serde::{Deserialize, Serialize};

use crate::graphql::GraphqlRequest;
use crate::topic::Topic;

/// Frames sent from client to gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    /// First frame on a new connection; carries the bearer credential.
    ConnectionInit { payload: InitPayload },

    /// Start streaming a topic. Data frames follow without acknowledgement.
    Start { id: String, payload: StartPayload },

    /// Stop streaming a topic.
    Stop { id: String },
}

/// Payload of `connection_init`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitPayload {
    #[serde(rename = "Authorization")]
    pub authorization: String,
}

/// Payload of `start`: the subscription request, JSON-encoded as a string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StartPayload {
    pub data: String,
}

/// Frames sent from gateway to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// Handshake accepted.
    ConnectionAck {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<AckPayload>,
    },

    /// Handshake rejected.
    ConnectionError {
        #[serde(default)]
        payload: serde_json::Value,
    },

    /// Keep-alive. Never surfaced past the connection.
    Ka,

    /// Topic registered on the gateway side.
    StartAck { id: String },

    /// An event for a topic.
    Data { id: String, payload: DataPayload },

    /// The gateway finished a topic's stream.
    Complete { id: String },

    /// An error, for one topic when `id` is present.
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        #[serde(default)]
        payload: serde_json::Value,
    },
}

/// Optional payload of `connection_ack`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AckPayload {
    /// Window in which the gateway promises to send at least a `ka`.
    #[serde(
        rename = "connectionTimeoutMs",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub connection_timeout_ms: Option<u64>,
}

/// Payload of `data`: a GraphQL response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataPayload {
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<serde_json::Value>,
}

impl ClientFrame {
    /// Creates a `connection_init` frame.
    pub fn connection_init(authorization: impl Into<String>) -> Self {
        ClientFrame::ConnectionInit {
            payload: InitPayload {
                authorization: authorization.into(),
            },
        }
    }

    /// Creates a `start` frame for a topic's subscription request.
    pub fn start(topic: &Topic, request: &GraphqlRequest) -> Result<Self, serde_json::Error> {
        Ok(ClientFrame::Start {
            id: topic.wire_id(),
            payload: StartPayload {
                data: request.to_json()?,
            },
        })
    }

    /// Creates a `stop` frame.
    pub fn stop(topic: &Topic) -> Self {
        ClientFrame::Stop {
            id: topic.wire_id(),
        }
    }

    /// Serializes the frame to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the frame from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerFrame {
    /// Creates a `connection_ack` frame.
    pub fn ack(connection_timeout_ms: Option<u64>) -> Self {
        ServerFrame::ConnectionAck {
            payload: connection_timeout_ms.map(|ms| AckPayload {
                connection_timeout_ms: Some(ms),
            }),
        }
    }

    /// Creates a `data` frame carrying `data` for a topic.
    pub fn data(topic: &Topic, data: serde_json::Value) -> Self {
        ServerFrame::Data {
            id: topic.wire_id(),
            payload: DataPayload {
                data,
                errors: Vec::new(),
            },
        }
    }

    /// Creates a `complete` frame.
    pub fn complete(topic: &Topic) -> Self {
        ServerFrame::Complete {
            id: topic.wire_id(),
        }
    }

    /// Creates an `error` frame for a topic.
    pub fn error(topic: &Topic, message: impl Into<String>) -> Self {
        ServerFrame::Error {
            id: Some(topic.wire_id()),
            payload: serde_json::json!({ "errors": [{ "message": message.into() }] }),
        }
    }

    /// Serializes the frame to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the frame from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
