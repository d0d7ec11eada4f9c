//! rustls client configuration for `ssl://` brokers

use crate::config::{ConfigError, TlsOptions};
use crate::error::PublishResult;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, WebPkiSupportedAlgorithms};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Build a client config from the platform trust store plus an optional CA file
///
/// With `insecure` set, server certificates are not verified at all.
pub fn build_tls_config(options: &TlsOptions) -> PublishResult<Arc<ClientConfig>> {
    if options.insecure {
        warn!("TLS certificate verification is disabled for this broker connection");
        let config = ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(SkipServerVerification::new()))
            .with_no_client_auth();
        return Ok(Arc::new(config));
    }

    let mut roots = system_roots();
    if let Some(ca_path) = &options.ca_cert {
        let added = add_ca_file(&mut roots, ca_path)?;
        debug!(path = %ca_path.display(), added, "Added CA certificates");
    }

    if roots.is_empty() {
        warn!("No trusted root certificates available; TLS handshakes will fail");
    }

    let config = ClientConfig::builder()
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(Arc::new(config))
}

fn system_roots() -> RootCertStore {
    let mut roots = RootCertStore::empty();
    match rustls_native_certs::load_native_certs() {
        Ok(certs) => {
            let (added, ignored) = roots.add_parsable_certificates(certs);
            debug!(added, ignored, "Loaded platform root certificates");
        }
        Err(e) => warn!(error = %e, "Could not load platform root certificates"),
    }
    roots
}

/// Append every certificate in a PEM file; a file without one is an error
fn add_ca_file(roots: &mut RootCertStore, path: &Path) -> Result<usize, ConfigError> {
    let file = File::open(path).map_err(|source| ConfigError::CaCertRead {
        path: path.to_path_buf(),
        source,
    })?;

    let certs = rustls_pemfile::certs(&mut BufReader::new(file))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| ConfigError::CaCertRead {
            path: path.to_path_buf(),
            source,
        })?;

    let (added, _) = roots.add_parsable_certificates(certs);
    if added == 0 {
        return Err(ConfigError::CaCertInvalid {
            path: path.to_path_buf(),
        });
    }
    Ok(added)
}

/// Verifier for `--insecure`: skips chain and hostname checks only
///
/// Handshake signatures are still checked against the presented certificate.
#[derive(Debug)]
struct SkipServerVerification {
    algorithms: WebPkiSupportedAlgorithms,
}

impl SkipServerVerification {
    fn new() -> Self {
        Self {
            algorithms: rustls::crypto::ring::default_provider().signature_verification_algorithms,
        }
    }
}

impl ServerCertVerifier for SkipServerVerification {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PublishError;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_ca_file() {
        let options = TlsOptions {
            ca_cert: Some(PathBuf::from("/no/such/ca.pem")),
            insecure: false,
        };
        let result = build_tls_config(&options);
        assert!(matches!(
            result,
            Err(PublishError::Config(ConfigError::CaCertRead { .. }))
        ));
    }

    #[test]
    fn test_ca_file_without_certificates() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "this is not a PEM certificate").unwrap();

        let options = TlsOptions {
            ca_cert: Some(file.path().to_path_buf()),
            insecure: false,
        };
        let result = build_tls_config(&options);
        assert!(matches!(
            result,
            Err(PublishError::Config(ConfigError::CaCertInvalid { .. }))
        ));
    }

    #[test]
    fn test_insecure_ignores_ca_file() {
        let options = TlsOptions {
            ca_cert: Some(PathBuf::from("/no/such/ca.pem")),
            insecure: true,
        };
        assert!(build_tls_config(&options).is_ok());
    }

    #[test]
    fn test_default_options_build() {
        assert!(build_tls_config(&TlsOptions::default()).is_ok());
    }

    #[test]
    fn test_insecure_verifier_advertises_schemes() {
        let schemes = SkipServerVerification::new().supported_verify_schemes();
        assert!(schemes.contains(&SignatureScheme::ED25519));
        assert!(schemes.contains(&SignatureScheme::RSA_PSS_SHA256));
        assert_eq!(
            schemes,
            rustls::crypto::ring::default_provider()
                .signature_verification_algorithms
                .supported_schemes()
        );
    }
}
