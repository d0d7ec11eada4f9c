//! Assemble a notification message from a product file
//!
//! One read pass over the file yields both the digest and the length; the
//! rest is pure derivation from the request.

use super::integrity::digest_file;
use super::message::{Link, NotificationMessage, Properties};
use super::mime::mime_type_for;
use super::topics::data_id;
use crate::config::DataRequest;
use crate::error::{PublishError, PublishResult};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::debug;

/// Format of `properties.pubtime`, nanosecond precision in UTC
pub const PUBTIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

/// Builds data notification messages
pub struct MessageBuilder;

impl MessageBuilder {
    /// Build a message for `request`, stamped with the current time
    pub fn build(request: &DataRequest) -> PublishResult<NotificationMessage> {
        Self::build_at(request, Utc::now())
    }

    /// Build a message with an explicit publication time
    pub fn build_at(
        request: &DataRequest,
        pubtime: DateTime<Utc>,
    ) -> PublishResult<NotificationMessage> {
        let file_name = base_name(&request.input)?;
        let data_id = data_id(&request.topic, file_name)?;

        let digest = digest_file(&request.input)?;

        let media_type = match request.mime_type.as_deref().map(str::trim) {
            Some(explicit) if !explicit.is_empty() => explicit.to_string(),
            _ => mime_type_for(&request.input).to_string(),
        };

        debug!(
            data_id = %data_id,
            length = digest.length,
            media_type = %media_type,
            "Computed notification content"
        );

        let properties = Properties {
            data_id,
            pubtime: format_pubtime(pubtime),
            integrity: digest.integrity,
            metadata_id: request
                .metadata_id
                .as_ref()
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
            temporal: request.temporal,
        };

        Ok(NotificationMessage::feature(
            properties,
            Link::canonical(request.download_url.as_str(), media_type, digest.length),
        ))
    }
}

pub fn format_pubtime(at: DateTime<Utc>) -> String {
    at.format(PUBTIME_FORMAT).to_string()
}

fn base_name(path: &Path) -> PublishResult<&str> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            PublishError::validation(format!(
                "input path {} has no usable file name",
                path.display()
            ))
        })
}
