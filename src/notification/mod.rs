//! WIS 2.0 notification messages
//!
//! This module turns a product file plus caller metadata into the canonical
//! notification document and its JSON encoding.
//!
//! - [`builder`] - reads the file and assembles a [`NotificationMessage`]
//! - [`encode`] - indented JSON output and `properties` merging
//! - [`integrity`] - streamed SHA-512 digest and length
//! - [`mime`] - content type inference
//! - [`temporal`] - `datetime` / `start_datetime`+`end_datetime` handling
//! - [`topics`] - `data_id` derivation and fixed topics
//! - [`metadata`] - pass-through WCMP2 metadata records

pub mod builder;
pub mod encode;
pub mod integrity;
pub mod message;
pub mod metadata;
pub mod mime;
pub mod temporal;
pub mod topics;

pub use builder::MessageBuilder;
pub use encode::{Encoder, ExtraProperties};
pub use integrity::{ContentDigest, Integrity};
pub use message::{Link, NotificationMessage, Properties};
pub use metadata::load_metadata_record;
pub use mime::mime_type_for;
pub use temporal::TemporalExtent;
pub use topics::{data_id, metadata_topic};
