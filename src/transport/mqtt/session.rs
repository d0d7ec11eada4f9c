//! rumqttc-backed broker session
//!
//! The client handle only queues requests; nothing reaches the network until
//! the event loop is polled. Each operation here queues its request and then
//! polls until the matching acknowledgement shows up.

use super::connection::{ConnectionFactory, MqttError};
use super::reason::{connack_code, puback_code};
use crate::config::{BrokerSection, Credentials};
use crate::error::PublishResult;
use crate::mqtt_span;
use crate::transport::{BrokerAck, BrokerSession, OutgoingMessage};
use async_trait::async_trait;
use rumqttc::v5::mqttbytes::v5::{Packet, PublishProperties};
use rumqttc::v5::mqttbytes::QoS;
use rumqttc::v5::{AsyncClient, ConnectionError, Event, EventLoop, StateError};
use rumqttc::Outgoing;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, trace, Instrument};

/// Request channel capacity; a session sends at most three requests
const REQUEST_CHANNEL_CAPACITY: usize = 10;

/// Upper bound on waiting for CONNACK or PUBACK
pub const ACK_TIMEOUT: Duration = Duration::from_secs(30);

pub struct RumqttSession {
    client: AsyncClient,
    event_loop: EventLoop,
    ack_timeout: Duration,
    connected: bool,
}

impl RumqttSession {
    /// Prepare a session for the configured broker without touching the network
    pub fn open(broker: &BrokerSection, credentials: &Credentials) -> PublishResult<Self> {
        let (endpoint, options) = ConnectionFactory::session_options(broker, credentials)?;
        debug!(endpoint = %endpoint, "Prepared MQTT session");

        let (client, event_loop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);
        Ok(Self {
            client,
            event_loop,
            ack_timeout: ACK_TIMEOUT,
            connected: false,
        })
    }

    pub fn with_ack_timeout(mut self, ack_timeout: Duration) -> Self {
        self.ack_timeout = ack_timeout;
        self
    }
}

#[async_trait]
impl BrokerSession for RumqttSession {
    async fn connect(&mut self) -> Result<BrokerAck, MqttError> {
        let event_loop = &mut self.event_loop;
        let ack = timeout(
            self.ack_timeout,
            async move {
                loop {
                    match event_loop.poll().await {
                        Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                            return Ok(BrokerAck {
                                code: connack_code(connack.code),
                                reason_string: connack.properties.and_then(|p| p.reason_string),
                            });
                        }
                        Ok(event) => trace!(?event, "Event while waiting for CONNACK"),
                        // The refusal carries no properties, so no reason string
                        Err(ConnectionError::ConnectionRefused(code)) => {
                            return Ok(BrokerAck::with_code(connack_code(code)));
                        }
                        Err(e) => return Err(MqttError::ConnectionFailed(Box::new(e))),
                    }
                }
            }
            .instrument(mqtt_span!(operation = "connect")),
        )
        .await
        .map_err(|_| MqttError::Timeout {
            waiting_for: "CONNACK",
            timeout: self.ack_timeout,
        })??;

        self.connected = ack.is_success();
        Ok(ack)
    }

    async fn publish(&mut self, message: &OutgoingMessage) -> Result<BrokerAck, MqttError> {
        let properties = PublishProperties {
            content_type: Some(message.content_type.clone()),
            ..Default::default()
        };

        self.client
            .publish_with_properties(
                message.topic.clone(),
                QoS::AtLeastOnce,
                false,
                message.payload.clone(),
                properties,
            )
            .await
            .map_err(|e| MqttError::PublishFailed(Box::new(e)))?;

        let event_loop = &mut self.event_loop;
        let connected = &mut self.connected;
        timeout(
            self.ack_timeout,
            async move {
                loop {
                    match event_loop.poll().await {
                        Ok(Event::Incoming(Packet::PubAck(puback))) => {
                            return Ok(BrokerAck {
                                code: puback_code(puback.reason),
                                reason_string: puback.properties.and_then(|p| p.reason_string),
                            });
                        }
                        Ok(event) => trace!(?event, "Event while waiting for PUBACK"),
                        // rumqttc raises failed PUBACKs as state errors and drops
                        // the network, so there is nothing left to disconnect
                        Err(ConnectionError::MqttState(StateError::PubAckFail { reason })) => {
                            *connected = false;
                            return Ok(BrokerAck::with_code(puback_code(reason)));
                        }
                        Err(e) => {
                            *connected = false;
                            return Err(MqttError::PublishFailed(Box::new(e)));
                        }
                    }
                }
            }
            .instrument(mqtt_span!(operation = "publish", topic = %message.topic)),
        )
        .await
        .map_err(|_| MqttError::Timeout {
            waiting_for: "PUBACK",
            timeout: self.ack_timeout,
        })?
    }

    async fn disconnect(&mut self) -> Result<(), MqttError> {
        // Polling without a live connection would dial the broker again
        if !self.connected {
            return Ok(());
        }
        self.connected = false;

        self.client
            .disconnect()
            .await
            .map_err(|e| MqttError::DisconnectFailed(Box::new(e)))?;

        let event_loop = &mut self.event_loop;
        timeout(
            self.ack_timeout,
            async move {
                loop {
                    match event_loop.poll().await {
                        Ok(Event::Outgoing(Outgoing::Disconnect)) => return Ok(()),
                        Ok(event) => trace!(?event, "Event while disconnecting"),
                        Err(e) => return Err(MqttError::DisconnectFailed(Box::new(e))),
                    }
                }
            }
            .instrument(mqtt_span!(operation = "disconnect")),
        )
        .await
        .map_err(|_| MqttError::Timeout {
            waiting_for: "DISCONNECT",
            timeout: self.ack_timeout,
        })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PublishError;

    fn credentials() -> Credentials {
        Credentials {
            username: "user".to_string(),
            password: "pass".to_string(),
        }
    }

    #[tokio::test]
    async fn test_open_does_not_dial() {
        // Nothing listens on this port; open must still succeed
        let broker = BrokerSection::new("tcp://127.0.0.1:1");
        let session = RumqttSession::open(&broker, &credentials()).unwrap();
        assert!(!session.connected);
    }

    #[tokio::test]
    async fn test_open_rejects_unsupported_scheme() {
        let broker = BrokerSection::new("http://127.0.0.1:1883");
        let result = RumqttSession::open(&broker, &credentials());
        assert!(matches!(result, Err(PublishError::Transport(MqttError::UnsupportedScheme(_)))));
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        let broker = BrokerSection::new("tcp://127.0.0.1:1");
        let mut session = RumqttSession::open(&broker, &credentials())
            .unwrap()
            .with_ack_timeout(Duration::from_secs(5));

        let result = session.connect().await;
        assert!(matches!(
            result,
            Err(MqttError::ConnectionFailed(_)) | Err(MqttError::Timeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_disconnect_without_connect_is_noop() {
        let broker = BrokerSection::new("tcp://127.0.0.1:1");
        let mut session = RumqttSession::open(&broker, &credentials()).unwrap();
        assert!(session.disconnect().await.is_ok());
    }
}
