//! Publisher workflow tests against the in-crate mock session
//!
//! These cover the connect / publish / disconnect sequence, reason code
//! handling and cancellation without a broker.

use std::time::Duration;
use wispub::cancel::CancelToken;
use wispub::commands::publish_with_session;
use wispub::config::RunOptions;
use wispub::testing::{MockSession, MockStep, SessionCall};
use wispub::transport::mqtt::{MqttError, PublisherState};
use wispub::transport::OutgoingMessage;
use wispub::{PreparedNotification, PublishError, Publisher};

fn prepared() -> PreparedNotification {
    PreparedNotification {
        topic: "origin/a/wis2/center/data/core/weather".to_string(),
        payload: br#"{"type":"Feature"}"#.to_vec(),
    }
}

#[tokio::test]
async fn test_publish_sends_exactly_one_message() {
    let session = MockSession::new();

    let report = publish_with_session(
        &prepared(),
        session.clone(),
        CancelToken::new(),
        RunOptions::default(),
    )
    .await
    .unwrap();

    assert!(report.accepted());
    assert_eq!(report.topic, "origin/a/wis2/center/data/core/weather");

    let published = session.published().await;
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].topic, "origin/a/wis2/center/data/core/weather");
    assert_eq!(published[0].content_type, "application/json");
}

#[tokio::test]
async fn test_puback_reason_codes_are_interpreted() {
    for (code, expected) in [
        (16u8, "no subscribers"),
        (135, "not authorized"),
        (151, "quota exceeded"),
        (0x95, "packet too large"),
        (3, "Unknown"),
    ] {
        let session = MockSession::new().with_puback(code);
        let report = publish_with_session(
            &prepared(),
            session,
            CancelToken::new(),
            RunOptions::default(),
        )
        .await
        .unwrap();

        assert!(!report.accepted());
        assert_eq!(report.reason, expected, "code {code}");
    }
}

#[tokio::test]
async fn test_connect_refusal_stops_before_publish() {
    let session = MockSession::new().refusing_connect(0x87, None);

    let err = publish_with_session(
        &prepared(),
        session.clone(),
        CancelToken::new(),
        RunOptions::default(),
    )
    .await
    .unwrap_err();

    match err {
        PublishError::Transport(MqttError::ConnectionRefused { code, reason }) => {
            assert_eq!(code, 0x87);
            assert_eq!(reason, "not authorized");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(session.published().await.is_empty());
}

#[tokio::test]
async fn test_disconnect_follows_publish_failure() {
    let session = MockSession::new().failing_publish();
    let message = OutgoingMessage::notification("a/b/c", b"{}".to_vec());
    let mut publisher = Publisher::new(session.clone(), CancelToken::new());

    assert!(publisher.publish_once(&message).await.is_err());
    assert_eq!(
        session.calls().await,
        vec![
            SessionCall::Connect,
            SessionCall::Publish("a/b/c".to_string()),
            SessionCall::Disconnect,
        ]
    );
}

#[tokio::test]
async fn test_interrupt_cancels_hanging_connect() {
    let session = MockSession::new().hanging(MockStep::Connect);
    let cancel = CancelToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        publish_with_session(&prepared(), session.clone(), cancel, RunOptions::default()),
    )
    .await
    .expect("cancellation should end the publish promptly");

    let err = result.unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(
        session.calls().await,
        vec![SessionCall::Connect, SessionCall::Disconnect]
    );
}

#[tokio::test]
async fn test_publisher_state_after_refusal() {
    let mut publisher = Publisher::new(
        MockSession::new().refusing_connect(0x86, Some("bad password")),
        CancelToken::new(),
    );

    let err = publisher.connect().await.unwrap_err();
    assert!(err.to_string().contains("bad password"));
    assert!(matches!(publisher.state(), PublisherState::Failed(_)));

    publisher.disconnect().await;
    assert!(matches!(publisher.state(), PublisherState::Failed(_)));
}
