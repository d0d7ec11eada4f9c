//! Publisher lifecycle states and the pure transition function
//!
//! One invocation walks `Idle -> Connecting -> Connected -> Publishing ->
//! Disconnected`. Any non-terminal state may drop to `Failed`. Both
//! `Disconnected` and `Failed` are terminal.

use super::connection::MqttError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublisherState {
    Idle,
    Connecting,
    Connected,
    Publishing,
    Disconnected,
    Failed(String),
}

impl PublisherState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed(_))
    }
}

impl fmt::Display for PublisherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Publishing => write!(f, "publishing"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Failed(reason) => write!(f, "failed ({reason})"),
        }
    }
}

/// Things that move the publisher between states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublisherEvent {
    ConnectStarted,
    ConnAckAccepted,
    PublishStarted,
    Disconnected,
    Failed(String),
}

impl fmt::Display for PublisherEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectStarted => write!(f, "connect-started"),
            Self::ConnAckAccepted => write!(f, "connack-accepted"),
            Self::PublishStarted => write!(f, "publish-started"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Failed(_) => write!(f, "failed"),
        }
    }
}

pub struct StateMachine;

impl StateMachine {
    /// Next state after `event`, or an error for a transition that cannot happen (pure function)
    pub fn next(
        current: &PublisherState,
        event: PublisherEvent,
    ) -> Result<PublisherState, MqttError> {
        use PublisherEvent as E;
        use PublisherState as S;

        match (current, event) {
            (S::Idle, E::ConnectStarted) => Ok(S::Connecting),
            (S::Connecting, E::ConnAckAccepted) => Ok(S::Connected),
            (S::Connected, E::PublishStarted) => Ok(S::Publishing),
            (S::Connected | S::Publishing, E::Disconnected) => Ok(S::Disconnected),
            (state, E::Failed(reason)) if !state.is_terminal() => Ok(S::Failed(reason)),
            (state, event) => Err(MqttError::InvalidTransition {
                from: state.to_string(),
                event: event.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut state = PublisherState::Idle;
        for event in [
            PublisherEvent::ConnectStarted,
            PublisherEvent::ConnAckAccepted,
            PublisherEvent::PublishStarted,
            PublisherEvent::Disconnected,
        ] {
            state = StateMachine::next(&state, event).unwrap();
        }
        assert_eq!(state, PublisherState::Disconnected);
        assert!(state.is_terminal());
    }

    #[test]
    fn test_failure_from_any_live_state() {
        for state in [
            PublisherState::Idle,
            PublisherState::Connecting,
            PublisherState::Connected,
            PublisherState::Publishing,
        ] {
            let next =
                StateMachine::next(&state, PublisherEvent::Failed("boom".to_string())).unwrap();
            assert_eq!(next, PublisherState::Failed("boom".to_string()));
        }
    }

    #[test]
    fn test_terminal_states_reject_events() {
        let failed = PublisherState::Failed("x".to_string());
        assert!(StateMachine::next(&failed, PublisherEvent::Disconnected).is_err());
        assert!(StateMachine::next(&failed, PublisherEvent::Failed("y".to_string())).is_err());
        assert!(
            StateMachine::next(&PublisherState::Disconnected, PublisherEvent::ConnectStarted)
                .is_err()
        );
    }

    #[test]
    fn test_publish_requires_connection() {
        assert!(StateMachine::next(&PublisherState::Idle, PublisherEvent::PublishStarted).is_err());
        assert!(
            StateMachine::next(&PublisherState::Connecting, PublisherEvent::PublishStarted)
                .is_err()
        );
        assert!(
            StateMachine::next(&PublisherState::Publishing, PublisherEvent::PublishStarted)
                .is_err()
        );
    }

    #[test]
    fn test_connected_can_disconnect_without_publishing() {
        let next =
            StateMachine::next(&PublisherState::Connected, PublisherEvent::Disconnected).unwrap();
        assert_eq!(next, PublisherState::Disconnected);
    }

    #[test]
    fn test_invalid_transition_error_names_both_sides() {
        let err = StateMachine::next(&PublisherState::Idle, PublisherEvent::ConnAckAccepted)
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains("idle"));
        assert!(text.contains("connack-accepted"));
    }
}
