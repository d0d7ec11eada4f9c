//! WIS 2.0 notification message types
//!
//! The JSON field names here are the wire schema subscribers parse, so they
//! are fixed by `serde` attributes rather than by the Rust field names.

use super::integrity::Integrity;
use super::temporal::TemporalExtent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Conformance class every data notification declares
pub const CONFORMS_TO_CORE: &str = "http://wis.wmo.int/spec/wnm/1/conf/core";

/// GeoJSON discriminator for the document shape
pub const FEATURE_TYPE: &str = "Feature";

/// Relation of the single download link
pub const CANONICAL_REL: &str = "canonical";

/// A data availability notification
///
/// # Examples
/// ```
/// use wispub::notification::{Integrity, Link, NotificationMessage, Properties};
///
/// let msg = NotificationMessage::feature(
///     Properties {
///         data_id: "center/data/f.bin".to_string(),
///         pubtime: "2024-01-01T00:00:00.000000000Z".to_string(),
///         integrity: Integrity::sha512("AAAA".to_string()),
///         metadata_id: None,
///         temporal: None,
///     },
///     Link::canonical("http://example/data/f.bin", "application/octet-stream", 10),
/// );
/// assert_eq!(msg.links.len(), 1);
/// assert!(msg.geometry.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationMessage {
    /// Fresh UUID v4 per message
    pub id: Uuid,
    #[serde(rename = "conformsTo")]
    pub conforms_to: Vec<String>,
    #[serde(rename = "type")]
    pub kind: String,
    /// Always serialized; `null` for non-spatial products
    pub geometry: Option<Value>,
    pub properties: Properties,
    pub links: Vec<Link>,
}

impl NotificationMessage {
    /// Non-spatial feature with a new identifier and one download link
    pub fn feature(properties: Properties, link: Link) -> Self {
        Self {
            id: Uuid::new_v4(),
            conforms_to: vec![CONFORMS_TO_CORE.to_string()],
            kind: FEATURE_TYPE.to_string(),
            geometry: None,
            properties,
            links: vec![link],
        }
    }

    /// The download link subscribers should fetch
    pub fn canonical_link(&self) -> Option<&Link> {
        self.links.iter().find(|link| link.rel == CANONICAL_REL)
    }
}

/// Notification metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Properties {
    /// Topic minus routing prefix, plus file name
    pub data_id: String,
    /// Message construction time, UTC
    pub pubtime: String,
    pub integrity: Integrity,
    /// Previously registered metadata record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_id: Option<String>,
    /// `datetime` or `start_datetime`/`end_datetime`, never both
    #[serde(flatten)]
    pub temporal: Option<TemporalExtent>,
}

/// Download location descriptor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub href: String,
    pub rel: String,
    #[serde(rename = "type")]
    pub media_type: String,
    /// Content length in bytes
    pub length: u64,
}

impl Link {
    pub fn canonical(href: impl Into<String>, media_type: impl Into<String>, length: u64) -> Self {
        Self {
            href: href.into(),
            rel: CANONICAL_REL.to_string(),
            media_type: media_type.into(),
            length,
        }
    }
}
