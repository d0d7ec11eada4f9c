//! What each CLI command does once its flags are resolved
//!
//! A command first prepares a [`PreparedNotification`] (topic plus payload
//! bytes). In dry-run mode it is printed: topic on stderr, body on stdout.
//! Otherwise it is published once through a [`Publisher`]. A dry run needs
//! no broker settings at all.

use crate::cancel::CancelToken;
use crate::config::{BrokerSection, DataRequest, MetadataRequest, RunOptions};
use crate::error::{PublishError, PublishResult};
use crate::notification::{load_metadata_record, Encoder, ExtraProperties, MessageBuilder};
use crate::publish_span;
use crate::transport::mqtt::{PublishReport, Publisher, RumqttSession};
use crate::transport::{BrokerSession, OutgoingMessage};
use serde_json::Value;
use std::io::Write;
use tracing::{debug, info, Instrument};

/// An encoded notification and where it goes
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedNotification {
    pub topic: String,
    pub payload: Vec<u8>,
}

impl PreparedNotification {
    /// Build and encode a data notification
    pub fn data(request: &DataRequest) -> PublishResult<Self> {
        let message = MessageBuilder::build(request)?;

        let extra = data_domain_properties(request.data_domain.as_deref());
        let payload = Encoder::encode_with_properties(&message, extra.as_ref())?;

        info!(
            id = %message.id,
            data_id = %message.properties.data_id,
            "Built data notification"
        );
        Ok(Self {
            topic: request.topic.clone(),
            payload,
        })
    }

    /// Load a metadata record to publish unchanged
    pub fn metadata(request: &MetadataRequest) -> PublishResult<Self> {
        let payload = load_metadata_record(&request.input)?;
        info!(input = %request.input.display(), "Loaded metadata record");
        Ok(Self {
            topic: request.topic.clone(),
            payload,
        })
    }

    /// Dry-run output: topic line on `err`, body plus newline on `out`
    pub fn write_dry_run<O: Write, E: Write>(&self, out: &mut O, err: &mut E) -> PublishResult<()> {
        writeln!(err, "{}", self.topic).map_err(|e| PublishError::io("write", "<stderr>", e))?;
        out.write_all(&self.payload)
            .and_then(|()| out.write_all(b"\n"))
            .and_then(|()| out.flush())
            .map_err(|e| PublishError::io("write", "<stdout>", e))
    }

    pub fn to_message(&self) -> OutgoingMessage {
        OutgoingMessage::notification(self.topic.clone(), self.payload.clone())
    }
}

/// `{"dataDomain": domain}` for a non-blank domain
pub fn data_domain_properties(domain: Option<&str>) -> Option<ExtraProperties> {
    let domain = domain.map(str::trim).filter(|d| !d.is_empty())?;
    let mut extra = ExtraProperties::new();
    extra.insert("dataDomain".to_string(), Value::String(domain.to_string()));
    Some(extra)
}

/// Publish through an already prepared session
pub async fn publish_with_session<S: BrokerSession>(
    prepared: &PreparedNotification,
    session: S,
    cancel: CancelToken,
    options: RunOptions,
) -> PublishResult<PublishReport> {
    if cancel.is_cancelled() {
        return Err(PublishError::cancelled("publish setup"));
    }

    let message = prepared.to_message();
    if options.verbose {
        debug!(
            payload = %String::from_utf8_lossy(&message.payload),
            "Notification payload"
        );
    }

    let mut publisher = Publisher::new(session, cancel);
    let span = publish_span!(topic = %prepared.topic);
    let report = publisher.publish_once(&message).instrument(span).await?;
    Ok(report)
}

/// Resolve credentials, open a session to `broker` and publish
pub async fn publish(
    prepared: &PreparedNotification,
    broker: &BrokerSection,
    cancel: CancelToken,
    options: RunOptions,
) -> PublishResult<PublishReport> {
    let credentials = broker.credentials()?;
    let session = RumqttSession::open(broker, &credentials)?;
    info!(broker = %broker.url, "Connecting to broker");
    publish_with_session(prepared, session, cancel, options).await
}
