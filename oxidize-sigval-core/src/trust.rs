//! Validation context and the certificate path validator seam
//!
//! X.509 path building and revocation checking are delegated to a
//! collaborator behind [`CertificatePathValidator`]. This module defines
//! that seam plus [`ValidationContext`], the bundle of validation-time
//! material (extra certificates, embedded OCSP responses and CRLs, the
//! validation moment, revocation policy) that travels from the document
//! into the collaborator.

use crate::certstore::{CertificateStore, SimpleCertificateStore};
use crate::error::Result;
use chrono::{DateTime, Utc};
use thiserror::Error;
use x509_cert::Certificate;

/// How the path validator must treat missing revocation information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevocationMode {
    /// Missing revocation info is tolerated
    #[default]
    SoftFail,
    /// Certificates that declare revocation endpoints must come with
    /// matching revocation data
    HardFail,
    /// Every certificate in the path must come with revocation data
    Require,
}

/// Material available to the certificate path validator for one validation
#[derive(Default)]
pub struct ValidationContext {
    /// Additional untrusted certificates usable for path building
    pub extra_certs: SimpleCertificateStore,
    /// DER-encoded OCSP responses embedded in the document or signature
    pub ocsps: Vec<Vec<u8>>,
    /// DER-encoded CRLs embedded in the document or signature
    pub crls: Vec<Vec<u8>>,
    /// Point in time at which the path must validate; `None` means "now"
    pub moment: Option<DateTime<Utc>>,
    /// Whether the validator may fetch revocation data over the network
    pub allow_fetching: bool,
    /// Revocation policy
    pub revocation_mode: RevocationMode,
}

impl ValidationContext {
    /// Creates an empty context with fetching allowed and soft-fail
    /// revocation handling
    pub fn new() -> Self {
        Self {
            allow_fetching: true,
            ..Self::default()
        }
    }

    /// Adds an untrusted certificate for path building
    pub fn add_cert(&mut self, cert: Certificate) -> Result<()> {
        self.extra_certs.register(cert)
    }

    /// Adds a DER-encoded OCSP response
    pub fn add_ocsp(&mut self, der: Vec<u8>) {
        self.ocsps.push(der);
    }

    /// Adds a DER-encoded CRL
    pub fn add_crl(&mut self, der: Vec<u8>) {
        self.crls.push(der);
    }
}

/// Key usage the signer certificate must have been issued for.
///
/// The default policy requires non-repudiation and no particular extended
/// key usage; anything beyond that is the collaborator's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyUsagePolicy {
    /// Required key usage bits, by RFC 5280 name
    pub key_usage: Vec<String>,
    /// Required extended key usage OIDs
    pub extended_key_usage: Vec<String>,
}

impl KeyUsagePolicy {
    /// The default signing policy: non-repudiation, no EKU constraints
    pub fn non_repudiation() -> Self {
        Self {
            key_usage: vec!["non_repudiation".to_string()],
            extended_key_usage: Vec::new(),
        }
    }
}

impl Default for KeyUsagePolicy {
    fn default() -> Self {
        Self::non_repudiation()
    }
}

/// Failure modes of certificate path validation.
///
/// The split mirrors what the CMS verifier needs to classify: an invalid
/// certificate and a failed path build both leave the signer untrusted,
/// revocation is reported separately.
#[derive(Error, Debug)]
pub enum PathValidationFailure {
    /// The signer certificate itself is unacceptable (expired, wrong key
    /// usage, malformed)
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// A certificate in the path has been revoked
    #[error("certificate revoked: {0}")]
    Revoked(String),

    /// No path to a trust anchor could be built
    #[error("path building failed: {0}")]
    PathBuilding(String),

    /// A candidate path failed validation
    #[error("path validation failed: {0}")]
    PathValidation(String),
}

/// Certificate path validation collaborator.
///
/// Implementations build and validate a path from the signer to a trust
/// anchor, honoring the context's moment, revocation mode and fetch switch.
/// On success they return the validation path from the trust anchor down to
/// the signer (the signer is the last element).
pub trait CertificatePathValidator {
    /// Validates the signer for the requested usage
    fn validate_usage(
        &self,
        signer: &Certificate,
        intermediates: &[Certificate],
        context: &ValidationContext,
        policy: &KeyUsagePolicy,
    ) -> std::result::Result<Vec<Certificate>, PathValidationFailure>;
}
