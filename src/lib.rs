//! wispub - WIS 2.0 notification publisher
//!
//! Builds WIS 2.0 notification messages for data products and publishes them,
//! or pre-built WCMP2 metadata records, to an MQTT v5 broker.
//!
//! # Overview
//!
//! - [`notification`] - message construction, integrity digest, MIME
//!   inference, JSON encoding and property merging
//! - [`transport`] - broker URL resolution, TLS trust, and the connect /
//!   publish / disconnect workflow
//! - [`config`] - immutable settings built from CLI flags and an optional TOML file
//! - [`cancel`] - cancellation token shared with the interrupt handler
//! - [`commands`] - dry-run and publish flows behind the CLI
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use wispub::config::DataRequest;
//! use wispub::notification::{Encoder, MessageBuilder};
//! use std::path::PathBuf;
//! use url::Url;
//!
//! let request = DataRequest {
//!     input: PathBuf::from("/data/obs.bufr"),
//!     topic: "origin/a/wis2/us-ssec/data/core/weather/surface-based-observations/synop".to_string(),
//!     download_url: Url::parse("https://example.org/obs.bufr").unwrap(),
//!     mime_type: None,
//!     metadata_id: None,
//!     temporal: None,
//!     data_domain: None,
//! };
//!
//! let message = MessageBuilder::build(&request).unwrap();
//! let body = Encoder::encode(&message).unwrap();
//! println!("{}", String::from_utf8_lossy(&body));
//! ```

pub mod cancel;
pub mod commands;
pub mod config;
pub mod error;
pub mod notification;
pub mod observability;
pub mod testing;
pub mod transport;

pub use cancel::CancelToken;
pub use commands::PreparedNotification;
pub use error::{PublishError, PublishResult};
pub use notification::{Encoder, MessageBuilder, NotificationMessage};
pub use transport::mqtt::{ConnectionFactory, PublishReport, Publisher};
