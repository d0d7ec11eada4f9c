//! Mock implementations for testing
//!
//! Provides a scripted [`BrokerSession`] so publisher flows can be exercised
//! without an MQTT broker.

use crate::transport::mqtt::MqttError;
use crate::transport::{BrokerAck, BrokerSession, OutgoingMessage};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// A session operation recorded by [`MockSession`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCall {
    Connect,
    Publish(String),
    Disconnect,
}

/// Which step a [`MockSession`] should never finish
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockStep {
    Connect,
    Publish,
    Disconnect,
}

/// Mock broker session for testing
///
/// Clones share their recorded history, so a test can keep one handle and give
/// the other to a publisher.
#[derive(Debug, Clone, Default)]
pub struct MockSession {
    pub connack: BrokerAck,
    pub puback_code: u8,
    pub fail_connect: bool,
    pub fail_publish: bool,
    pub fail_disconnect: bool,
    pub hang_on: Option<MockStep>,
    calls: Arc<Mutex<Vec<SessionCall>>>,
    published: Arc<Mutex<Vec<OutgoingMessage>>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing_connect(mut self, code: u8, reason: Option<&str>) -> Self {
        self.connack = BrokerAck {
            code,
            reason_string: reason.map(str::to_string),
        };
        self
    }

    pub fn with_puback(mut self, code: u8) -> Self {
        self.puback_code = code;
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    pub fn failing_publish(mut self) -> Self {
        self.fail_publish = true;
        self
    }

    pub fn failing_disconnect(mut self) -> Self {
        self.fail_disconnect = true;
        self
    }

    pub fn hanging(mut self, step: MockStep) -> Self {
        self.hang_on = Some(step);
        self
    }

    pub async fn calls(&self) -> Vec<SessionCall> {
        self.calls.lock().await.clone()
    }

    pub async fn published(&self) -> Vec<OutgoingMessage> {
        self.published.lock().await.clone()
    }

    async fn hang_if(&self, step: MockStep) {
        if self.hang_on == Some(step) {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl BrokerSession for MockSession {
    async fn connect(&mut self) -> Result<BrokerAck, MqttError> {
        self.calls.lock().await.push(SessionCall::Connect);
        self.hang_if(MockStep::Connect).await;

        if self.fail_connect {
            return Err(MqttError::ConnectionFailed(
                "mock connection failure".to_string().into(),
            ));
        }
        Ok(self.connack.clone())
    }

    async fn publish(&mut self, message: &OutgoingMessage) -> Result<BrokerAck, MqttError> {
        self.calls
            .lock()
            .await
            .push(SessionCall::Publish(message.topic.clone()));
        self.hang_if(MockStep::Publish).await;

        if self.fail_publish {
            return Err(MqttError::PublishFailed(
                "mock publish failure".to_string().into(),
            ));
        }
        self.published.lock().await.push(message.clone());
        Ok(BrokerAck::with_code(self.puback_code))
    }

    async fn disconnect(&mut self) -> Result<(), MqttError> {
        self.calls.lock().await.push(SessionCall::Disconnect);
        self.hang_if(MockStep::Disconnect).await;

        if self.fail_disconnect {
            return Err(MqttError::DisconnectFailed(
                "mock disconnect failure".to_string().into(),
            ));
        }
        Ok(())
    }
}
