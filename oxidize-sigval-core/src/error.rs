//! Error types for signature validation

use crate::objects::ObjectId;
use thiserror::Error;

/// Result type for validation operations
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Errors that can occur while validating a signed PDF
///
/// Cryptographic failures (digest mismatch, bad signature) and trust failures
/// (untrusted or revoked certificates) are *not* errors: they are reported
/// through the fields of the returned status records. This enum covers the
/// fatal conditions only.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Malformed PDF structure: missing required keys, wrong types
    #[error("invalid PDF structure: {0}")]
    Structural(String),

    /// An indirect object is not defined in the revision being inspected
    #[error("object {0} is not available in this revision")]
    UndefinedObject(ObjectId),

    /// CMS/PKCS#7 structure problem (missing pieces, wrong content type)
    #[error("CMS structure error: {0}")]
    Cms(String),

    /// Low-level ASN.1 encoding or decoding failure
    #[error("ASN.1 error: {0}")]
    Asn1(#[from] der::Error),

    /// Signature-level validation error (empty field, bad signer set, ...)
    #[error("signature validation error: {0}")]
    Signature(String),

    /// A construct the validator has deliberately not implemented.
    /// Reported distinctly from bugs so callers can decline gracefully.
    #[error("not supported: {0}")]
    Unsupported(String),

    /// The signature field has no `/V` entry
    #[error("signature is empty")]
    EmptySignature,

    /// A mandatory seed value constraint was violated.
    /// Caught by the orchestrator and reported as `seed_value_ok = false`.
    #[error("seed value constraint violated: {0}")]
    SeedValue(String),

    /// The signer certificate does not meet the certificate constraints
    #[error("unacceptable signer: {0}")]
    UnacceptableSigner(String),
}

/// A post-signature modification that cannot be justified by any
/// allow-listed update pattern.
///
/// This is deliberately *not* a [`ValidationError`] variant: it only travels
/// through the revision diff walk and is caught by the diff driver, which
/// coerces the offending revision to `ModificationLevel::Other`. It never
/// reaches the orchestrator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("suspicious modification: {0}")]
pub struct SuspiciousModification(pub String);
