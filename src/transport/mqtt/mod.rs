//! MQTT v5 publishing for WIS 2.0 notifications
//!
//! The module separates pure decisions from I/O the same way throughout:
//!
//! - [`connection`] - broker URL resolution and session options (pure)
//! - [`tls`] - rustls trust configuration
//! - [`reason`] - reason code descriptions (pure)
//! - [`state`] - publisher lifecycle transitions (pure)
//! - [`session`] - rumqttc event loop driver (I/O)
//! - [`publisher`] - connect / publish / disconnect orchestration
//!
//! # Usage
//!
//! ```rust,no_run
//! use wispub::cancel::CancelToken;
//! use wispub::config::BrokerSection;
//! use wispub::transport::mqtt::{Publisher, RumqttSession};
//! use wispub::transport::OutgoingMessage;
//!
//! # tokio_test::block_on(async {
//! let broker = BrokerSection::new("ssl://globalbroker.example.org");
//! let credentials = broker.credentials()?;
//! let session = RumqttSession::open(&broker, &credentials)?;
//!
//! let mut publisher = Publisher::new(session, CancelToken::new());
//! let message = OutgoingMessage::notification("origin/a/wis2/center/data", b"{}".to_vec());
//! publisher.publish_once(&message).await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # });
//! ```

pub mod connection;
pub mod publisher;
pub mod reason;
pub mod session;
pub mod state;
pub mod tls;

pub use connection::{BrokerEndpoint, BrokerScheme, ConnectionFactory, MqttError};
pub use publisher::{PublishReport, Publisher};
pub use reason::{connect_reason, publish_reason};
pub use session::RumqttSession;
pub use state::{PublisherEvent, PublisherState, StateMachine};
