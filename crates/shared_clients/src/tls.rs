//! rustls client settings for the Postgres sslmodes.
//!
//! `require` encrypts without trusting the peer, `verify-ca` checks the chain
//! against the trusted roots and `verify-full` also checks the host name.
//! Handshake signatures are verified in every mode.

use components::ProbeFailure;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::{ring, verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{
    CertificateError, ClientConfig, DigitallySignedStruct, Error as TlsError, RootCertStore,
    SignatureScheme,
};
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificateCheck {
    /// Any certificate is accepted.
    None,
    /// The chain must end at a trusted root.
    Chain,
    /// Chain plus a certificate issued for the host name.
    ChainAndHostname,
}

impl CertificateCheck {
    pub fn for_sslmode(sslmode: &str) -> Self {
        match sslmode {
            "verify-full" => Self::ChainAndHostname,
            "verify-ca" => Self::Chain,
            _ => Self::None,
        }
    }
}

/// Builds the client configuration for `check`. Trusted roots come from the
/// PEM file at `root_cert` or, without one, from the bundled Mozilla set.
pub fn client_config(
    check: CertificateCheck,
    root_cert: Option<&Path>,
) -> Result<ClientConfig, ProbeFailure> {
    let provider = Arc::new(ring::default_provider());

    let verifier: Arc<dyn ServerCertVerifier> = match check {
        CertificateCheck::None => Arc::new(AcceptAnyCertificate {
            provider: provider.clone(),
        }) as Arc<dyn ServerCertVerifier>,
        CertificateCheck::Chain | CertificateCheck::ChainAndHostname => {
            let roots = root_store(root_cert)?;
            let webpki =
                WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider.clone())
                    .build()
                    .map_err(|e| ProbeFailure::other(format!("Invalid TLS trust roots: {e}")))?;
            if check == CertificateCheck::ChainAndHostname {
                webpki as Arc<dyn ServerCertVerifier>
            } else {
                Arc::new(IgnoreHostname(webpki)) as Arc<dyn ServerCertVerifier>
            }
        }
    };

    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ProbeFailure::other(format!("TLS setup failed: {e}")))?
        .dangerous()
        .with_custom_certificate_verifier(verifier)
        .with_no_client_auth();
    Ok(config)
}

fn root_store(root_cert: Option<&Path>) -> Result<RootCertStore, ProbeFailure> {
    let mut roots = RootCertStore::empty();
    match root_cert {
        None => roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned()),
        Some(path) => {
            let unreadable = |e: &dyn std::fmt::Display| {
                ProbeFailure::other(format!("Cannot read {}: {e}", path.display()))
            };
            for cert in CertificateDer::pem_file_iter(path).map_err(|e| unreadable(&e))? {
                let cert = cert.map_err(|e| unreadable(&e))?;
                roots.add(cert).map_err(|e| unreadable(&e))?;
            }
        }
    }

    if roots.is_empty() {
        return Err(ProbeFailure::other(format!(
            "No trusted certificates in {}",
            root_cert.map(|p| p.display().to_string()).unwrap_or_default()
        )));
    }
    Ok(roots)
}

#[derive(Debug)]
struct AcceptAnyCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Full chain verification that tolerates a certificate issued for another
/// name. The name is only compared once the chain has been accepted.
#[derive(Debug)]
struct IgnoreHostname(Arc<WebPkiServerVerifier>);

impl ServerCertVerifier for IgnoreHostname {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, TlsError> {
        match self
            .0
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
        {
            Err(TlsError::InvalidCertificate(err)) if is_name_mismatch(&err) => {
                Ok(ServerCertVerified::assertion())
            }
            other => other,
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        self.0.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, TlsError> {
        self.0.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.supported_verify_schemes()
    }
}

fn is_name_mismatch(err: &CertificateError) -> bool {
    matches!(
        err,
        CertificateError::NotValidForName | CertificateError::NotValidForNameContext { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn sslmodes_map_to_checks() {
        assert_eq!(CertificateCheck::for_sslmode("require"), CertificateCheck::None);
        assert_eq!(CertificateCheck::for_sslmode("prefer"), CertificateCheck::None);
        assert_eq!(CertificateCheck::for_sslmode("verify-ca"), CertificateCheck::Chain);
        assert_eq!(
            CertificateCheck::for_sslmode("verify-full"),
            CertificateCheck::ChainAndHostname
        );
    }

    #[test]
    fn verifying_modes_build_from_bundled_roots() {
        for check in [
            CertificateCheck::None,
            CertificateCheck::Chain,
            CertificateCheck::ChainAndHostname,
        ] {
            assert!(client_config(check, None).is_ok(), "{check:?}");
        }
    }

    #[test]
    fn missing_root_file_is_reported() {
        let err = client_config(
            CertificateCheck::Chain,
            Some(Path::new("/nonexistent/root.crt")),
        )
        .expect_err("missing file");
        assert!(err.detail.starts_with("Cannot read /nonexistent/root.crt"), "{}", err.detail);
    }

    #[test]
    fn root_file_without_certificates_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"not a certificate\n").expect("write");

        let err = client_config(CertificateCheck::ChainAndHostname, Some(file.path()))
            .expect_err("empty roots");
        assert!(err.detail.starts_with("No trusted certificates in"), "{}", err.detail);
    }

    #[test]
    fn only_name_errors_are_tolerated_under_verify_ca() {
        assert!(is_name_mismatch(&CertificateError::NotValidForName));
        assert!(!is_name_mismatch(&CertificateError::UnknownIssuer));
        assert!(!is_name_mismatch(&CertificateError::Expired));
    }
}
