//! Broker URL resolution and session options
//!
//! This module turns a [`BrokerSection`] into everything rumqttc needs to open
//! a session: host, port, plain or TLS transport, and MQTT v5 options. It
//! performs no network I/O; the TCP dial happens on the first event loop poll
//! inside [`RumqttSession::connect`](super::session::RumqttSession).

use super::tls::build_tls_config;
use crate::config::{BrokerSection, Credentials, TlsOptions};
use crate::error::PublishResult;
use rumqttc::v5::MqttOptions;
use rumqttc::{TlsConfiguration, Transport as RumqttcTransport};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::{Host, Url};

pub const DEFAULT_TCP_PORT: u16 = 1883;
pub const DEFAULT_SSL_PORT: u16 = 8883;

/// Largest packet we accept from the broker
const MAX_INCOMING_PACKET_SIZE: u32 = 256 * 1024;

/// MQTT transport errors
#[derive(Debug, Error)]
pub enum MqttError {
    #[error("Invalid broker URL: {0}")]
    InvalidBrokerUrl(String),
    #[error("Unsupported broker URL scheme '{0}', expected tcp or ssl")]
    UnsupportedScheme(String),
    #[error("Connection failed")]
    ConnectionFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Connection refused by broker [code={code}]: {reason}")]
    ConnectionRefused { code: u8, reason: String },
    #[error("Publishing failed")]
    PublishFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Disconnect failed")]
    DisconnectFailed(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("Timed out after {timeout:?} waiting for {waiting_for}")]
    Timeout {
        waiting_for: &'static str,
        timeout: Duration,
    },
    #[error("Invalid publisher transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },
    #[error("Operation cancelled during {operation}")]
    Cancelled { operation: &'static str },
}

/// Broker URL schemes we can dial
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrokerScheme {
    /// Plain TCP
    Tcp,
    /// TLS over TCP
    Ssl,
}

impl BrokerScheme {
    pub fn parse(scheme: &str) -> Result<Self, MqttError> {
        match scheme.to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "ssl" => Ok(Self::Ssl),
            other => Err(MqttError::UnsupportedScheme(other.to_string())),
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            Self::Tcp => DEFAULT_TCP_PORT,
            Self::Ssl => DEFAULT_SSL_PORT,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Ssl => "ssl",
        }
    }
}

/// A resolved broker address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerEndpoint {
    pub scheme: BrokerScheme,
    pub host: String,
    pub port: u16,
}

impl fmt::Display for BrokerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.parse::<IpAddr>().map_or(false, |ip| ip.is_ipv6()) {
            write!(f, "{}://[{}]:{}", self.scheme.as_str(), self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", self.scheme.as_str(), self.host, self.port)
        }
    }
}

/// Builds session options from broker configuration (pure apart from reading the CA file)
pub struct ConnectionFactory;

impl ConnectionFactory {
    /// Parse a broker URL, validating the scheme and filling in the default port
    pub fn resolve(broker_url: &str) -> Result<BrokerEndpoint, MqttError> {
        let url = Url::parse(broker_url.trim())
            .map_err(|_| MqttError::InvalidBrokerUrl(broker_url.to_string()))?;

        // Scheme first so nothing else is looked at for unsupported URLs
        let scheme = BrokerScheme::parse(url.scheme())?;

        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            _ => return Err(MqttError::InvalidBrokerUrl(broker_url.to_string())),
        };

        Ok(BrokerEndpoint {
            scheme,
            host,
            port: url.port().unwrap_or_else(|| scheme.default_port()),
        })
    }

    /// Transport for an endpoint: plain for `tcp`, rustls for `ssl`
    pub fn transport(
        endpoint: &BrokerEndpoint,
        tls: &TlsOptions,
    ) -> PublishResult<RumqttcTransport> {
        match endpoint.scheme {
            BrokerScheme::Tcp => {
                if tls.ca_cert.is_some() || tls.insecure {
                    warn!("TLS options are ignored for plain tcp:// brokers");
                }
                Ok(RumqttcTransport::Tcp)
            }
            BrokerScheme::Ssl => {
                let config = build_tls_config(tls)?;
                Ok(RumqttcTransport::Tls(TlsConfiguration::Rustls(config)))
            }
        }
    }

    /// Full MQTT v5 options for one clean-start session
    pub fn session_options(
        broker: &BrokerSection,
        credentials: &Credentials,
    ) -> PublishResult<(BrokerEndpoint, MqttOptions)> {
        let endpoint = Self::resolve(&broker.url)?;
        let transport = Self::transport(&endpoint, &broker.tls)?;
        let client_id = effective_client_id(&broker.client_id);

        debug!(
            endpoint = %endpoint,
            client_id = %client_id,
            keep_alive_secs = broker.keep_alive_secs,
            "Configuring MQTT session"
        );

        let mut options = MqttOptions::new(client_id, endpoint.host.clone(), endpoint.port);
        options.set_transport(transport);
        options.set_credentials(&credentials.username, &credentials.password);
        options.set_keep_alive(Duration::from_secs(broker.keep_alive_secs));
        options.set_clean_start(true);
        options.set_max_packet_size(Some(MAX_INCOMING_PACKET_SIZE));

        Ok((endpoint, options))
    }
}

/// Use the configured client id, or generate a unique one
pub fn effective_client_id(configured: &str) -> String {
    let configured = configured.trim();
    if configured.is_empty() {
        format!("wispub-{}", &uuid::Uuid::new_v4().simple().to_string()[..12])
    } else {
        configured.to_string()
    }
}
