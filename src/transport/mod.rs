//! Transport layer for notification publishing
//!
//! [`BrokerSession`] is the seam between the publisher logic and the MQTT
//! client library. Production code drives a rumqttc event loop through
//! [`mqtt::RumqttSession`]; tests inject a mock session instead.

use bytes::Bytes;

pub mod mqtt;

/// Content type carried in the PUBLISH properties of every notification
pub const NOTIFICATION_CONTENT_TYPE: &str = "application/json";

/// A reason code returned by the broker in CONNACK or PUBACK
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrokerAck {
    pub code: u8,
    /// Reason string property, when the broker sent one
    pub reason_string: Option<String>,
}

impl BrokerAck {
    pub fn success() -> Self {
        Self {
            code: 0,
            reason_string: None,
        }
    }

    pub fn with_code(code: u8) -> Self {
        Self {
            code,
            reason_string: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == 0
    }
}

/// One QoS 1 message, never retained
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub topic: String,
    pub payload: Bytes,
    pub content_type: String,
}

impl OutgoingMessage {
    pub fn notification(topic: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            topic: topic.into(),
            payload: payload.into(),
            content_type: NOTIFICATION_CONTENT_TYPE.to_string(),
        }
    }
}

/// A single broker session: one connect, at most one publish, one disconnect
///
/// Implementations report broker refusals as a [`BrokerAck`] with a non-zero
/// code and reserve `Err` for transport failures.
#[async_trait::async_trait]
pub trait BrokerSession: Send {
    /// Open the network connection, send CONNECT and wait for CONNACK
    async fn connect(&mut self) -> Result<BrokerAck, mqtt::MqttError>;

    /// Send one QoS 1 PUBLISH and wait for its PUBACK
    async fn publish(&mut self, message: &OutgoingMessage) -> Result<BrokerAck, mqtt::MqttError>;

    /// Send DISCONNECT; a session that never connected returns immediately
    async fn disconnect(&mut self) -> Result<(), mqtt::MqttError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_message_content_type() {
        let message = OutgoingMessage::notification("origin/a/wis2/x/data", b"{}".to_vec());
        assert_eq!(message.content_type, "application/json");
        assert_eq!(message.payload, Bytes::from_static(b"{}"));
    }

    #[test]
    fn test_broker_ack() {
        assert!(BrokerAck::success().is_success());
        assert!(!BrokerAck::with_code(16).is_success());
    }
}
