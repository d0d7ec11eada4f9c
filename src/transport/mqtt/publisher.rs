//! Connect, publish once, disconnect
//!
//! [`Publisher`] owns one [`BrokerSession`] and walks it through the
//! lifecycle in [`state`](super::state). Every network await is raced against
//! the shared [`CancelToken`] so an interrupt aborts promptly. Nothing is
//! retried.

use super::connection::MqttError;
use super::reason::{connect_reason, publish_reason};
use super::state::{PublisherEvent, PublisherState, StateMachine};
use crate::cancel::CancelToken;
use crate::error::error_chain;
use crate::transport::{BrokerAck, BrokerSession, OutgoingMessage};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// How long a normal disconnect may take
pub const DISCONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Disconnect budget once cancellation was requested
pub const CANCELLED_DISCONNECT_GRACE: Duration = Duration::from_millis(500);

/// Outcome of a publish the broker answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub topic: String,
    pub ack: BrokerAck,
    /// Human-readable text for `ack.code`
    pub reason: &'static str,
}

impl PublishReport {
    pub fn accepted(&self) -> bool {
        self.ack.is_success()
    }
}

pub struct Publisher<S: BrokerSession> {
    session: S,
    cancel: CancelToken,
    state: PublisherState,
}

impl<S: BrokerSession> Publisher<S> {
    pub fn new(session: S, cancel: CancelToken) -> Self {
        Self {
            session,
            cancel,
            state: PublisherState::Idle,
        }
    }

    pub fn state(&self) -> &PublisherState {
        &self.state
    }

    /// Connect, publish `message`, and always attempt a disconnect
    pub async fn publish_once(
        &mut self,
        message: &OutgoingMessage,
    ) -> Result<PublishReport, MqttError> {
        let outcome = match self.connect().await {
            Ok(()) => self.publish(message).await,
            Err(e) => Err(e),
        };
        self.disconnect().await;
        outcome
    }

    /// Open the session; a refused CONNACK becomes [`MqttError::ConnectionRefused`]
    pub async fn connect(&mut self) -> Result<(), MqttError> {
        self.apply(PublisherEvent::ConnectStarted)?;

        match until_cancelled(&self.cancel, "connect", self.session.connect()).await {
            Ok(ack) if ack.is_success() => {
                self.apply(PublisherEvent::ConnAckAccepted)?;
                info!("Connected to broker");
                Ok(())
            }
            Ok(ack) => {
                let reason = ack
                    .reason_string
                    .unwrap_or_else(|| connect_reason(ack.code).to_string());
                let error = MqttError::ConnectionRefused {
                    code: ack.code,
                    reason,
                };
                self.fail(&error);
                Err(error)
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Publish one message at QoS 1
    ///
    /// A non-zero PUBACK is logged as a warning and reported, not returned as
    /// an error. Only transport failures and cancellation are errors.
    pub async fn publish(&mut self, message: &OutgoingMessage) -> Result<PublishReport, MqttError> {
        self.apply(PublisherEvent::PublishStarted)?;
        info!(
            topic = %message.topic,
            bytes = message.payload.len(),
            "Publishing notification"
        );

        match until_cancelled(&self.cancel, "publish", self.session.publish(message)).await {
            Ok(ack) => {
                let reason = publish_reason(ack.code);
                if ack.is_success() {
                    info!(topic = %message.topic, "Publish acknowledged");
                } else {
                    warn!(
                        topic = %message.topic,
                        code = ack.code,
                        reason,
                        broker_reason = ack.reason_string.as_deref().unwrap_or(""),
                        "Broker did not accept publish"
                    );
                }
                Ok(PublishReport {
                    topic: message.topic.clone(),
                    ack,
                    reason,
                })
            }
            Err(e) => {
                self.fail(&e);
                Err(e)
            }
        }
    }

    /// Best-effort disconnect; failures are logged and swallowed
    pub async fn disconnect(&mut self) {
        let budget = if self.cancel.is_cancelled() {
            CANCELLED_DISCONNECT_GRACE
        } else {
            DISCONNECT_TIMEOUT
        };

        match timeout(budget, self.session.disconnect()).await {
            Ok(Ok(())) => debug!("Disconnected from broker"),
            Ok(Err(e)) => warn!(error = %error_chain(&e), "Disconnect failed"),
            Err(_) => warn!(timeout = ?budget, "Disconnect timed out"),
        }

        if let Ok(next) = StateMachine::next(&self.state, PublisherEvent::Disconnected) {
            self.state = next;
        }
    }

    fn apply(&mut self, event: PublisherEvent) -> Result<(), MqttError> {
        let next = StateMachine::next(&self.state, event)?;
        debug!(from = %self.state, to = %next, "Publisher state change");
        self.state = next;
        Ok(())
    }

    fn fail(&mut self, error: &MqttError) {
        if let Ok(next) = StateMachine::next(&self.state, PublisherEvent::Failed(error.to_string())) {
            self.state = next;
        }
    }
}

async fn until_cancelled<T, F>(
    cancel: &CancelToken,
    operation: &'static str,
    work: F,
) -> Result<T, MqttError>
where
    F: Future<Output = Result<T, MqttError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            warn!(operation, "Cancelled while waiting on broker");
            Err(MqttError::Cancelled { operation })
        }
        result = work => result,
    }
}
