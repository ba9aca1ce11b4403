//! CMS/PKCS#7 signature verification
//!
//! This module decodes nothing from the PDF itself: it receives an already
//! parsed [`SignedData`] and answers the cryptographic questions - is the
//! message digest intact, does the signature verify over the signed
//! attributes, and what does the certificate path validator make of the
//! signer. Failures of those checks are reported through the fields of
//! [`SignatureStatus`]; only structural problems and unsupported
//! constructs surface as errors.

use crate::certstore::IssuerSerial;
use crate::error::{Result, ValidationError};
use crate::trust::{
    CertificatePathValidator, KeyUsagePolicy, PathValidationFailure, ValidationContext,
};
use chrono::{DateTime, Utc};
use cms::cert::CertificateChoices;
use cms::content_info::ContentInfo;
use cms::signed_data::{SignedData, SignerIdentifier, SignerInfo};
use const_oid::ObjectIdentifier;
use der::asn1::{Any, GeneralizedTime, Int, OctetString, SetOfVec, UtcTime};
use der::{Decode, Encode, Sequence};
use rsa::pkcs1v15::{Signature as RsaSignature, VerifyingKey};
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};
use spki::DecodePublicKey;
use tracing::warn;
use x509_cert::attr::Attribute;
use x509_cert::Certificate;

/// OID of the CMS SignedData content type
pub const OID_SIGNED_DATA: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");

const OID_MESSAGE_DIGEST: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.4");
const OID_SIGNING_TIME: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.5");
const OID_TIMESTAMP_TOKEN: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.2.14");
const OID_ADOBE_REVINFO_ARCHIVAL: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113583.1.1.8");

/// The RSA-based signature mechanisms this validator supports
pub const SUPPORTED_MECHANISMS: [&str; 5] = [
    "rsassa_pkcs1v15",
    "sha1_rsa",
    "sha256_rsa",
    "sha384_rsa",
    "sha512_rsa",
];

/// Outcome of validating one CMS signature
///
/// `intact` and `valid` are independent: a signature can embed the right
/// digest but fail RSA verification, and vice versa. `trusted`, `revoked`
/// and `usage_ok` reflect what the certificate path validator concluded;
/// they are only meaningful when `valid` is true.
#[derive(Debug, Clone)]
pub struct SignatureStatus {
    /// The embedded message digest matches the digest of the signed data
    pub intact: bool,
    /// The cryptographic signature verifies
    pub valid: bool,
    /// A path from the signer to a trust anchor validated
    pub trusted: bool,
    /// The signer certificate has been revoked
    pub revoked: bool,
    /// The signer certificate was issued for the requested key usage
    pub usage_ok: bool,
    /// The signer's certificate
    pub signing_cert: Certificate,
    /// The other certificates included in the CMS blob
    pub ca_chain: Vec<Certificate>,
    /// Signature mechanism, in asn1crypto-style lowercase naming
    pub pkcs7_signature_mechanism: String,
    /// Message digest algorithm, lowercase
    pub md_algorithm: String,
    /// Validation path from the trust anchor down to the signer
    pub validation_path: Option<Vec<Certificate>>,
}

impl SignatureStatus {
    /// Status fields for the summary string
    pub fn summary_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        if self.trusted {
            fields.push("TRUSTED".to_string());
        } else if self.revoked {
            fields.push("REVOKED".to_string());
        } else {
            fields.push("UNTRUSTED".to_string());
        }
        if self.usage_ok {
            fields.push("USAGE_OK".to_string());
        }
        fields
    }

    /// One-line classification of the signature
    pub fn summary(&self) -> String {
        if self.intact && self.valid {
            format!("INTACT:{}", self.summary_fields().join(","))
        } else {
            "INVALID".to_string()
        }
    }
}

/// Validates a CMS signature and classifies the signer's trust status.
///
/// When `raw_digest` is `None` the digest is computed over the encapsulated
/// content; for detached PDF signatures the caller passes the digest it
/// computed over the byte range.
///
/// # Errors
///
/// Returns an error for structural CMS problems (no certificates, missing
/// signed attributes, multiple signers) and for unsupported constructs
/// (non-RSA mechanisms, subject-key-identifier SIDs). Cryptographic
/// failures do not error; they surface as `intact = false` or
/// `valid = false` on the returned status.
pub fn validate_cms_signature(
    signed_data: &SignedData,
    raw_digest: Option<&[u8]>,
    validation_context: &ValidationContext,
    validator: &dyn CertificatePathValidator,
    policy: &KeyUsagePolicy,
) -> Result<SignatureStatus> {
    let certs = certificates_in(signed_data)?;
    let signer_info = single_signer_info(signed_data)?;
    let (signing_cert, ca_chain) = partition_certs(certs, signer_info)?;

    let mechanism = mechanism_name(&signer_info.signature_algorithm.oid);
    let md_algorithm = digest_algorithm_name(&signer_info.digest_alg.oid)?;
    let signature = signer_info.signature.as_bytes();
    let signed_attrs = signer_info
        .signed_attrs
        .as_ref()
        .ok_or_else(|| ValidationError::Cms("signed attributes missing".to_string()))?;

    let computed;
    let raw_digest: &[u8] = match raw_digest {
        Some(digest) => digest,
        None => {
            let econtent = signed_data
                .encap_content_info
                .econtent
                .as_ref()
                .ok_or_else(|| {
                    ValidationError::Cms("no encapsulated content to digest".to_string())
                })?;
            computed = digest_data(md_algorithm, econtent.value())?;
            &computed
        }
    };

    let embedded_digest = find_attribute(signed_attrs, OID_MESSAGE_DIGEST).ok_or_else(|| {
        ValidationError::Signature("message digest not found in signature".to_string())
    })?;
    let embedded_digest = OctetString::from_der(&embedded_digest.to_der()?)?;
    let intact = raw_digest == embedded_digest.as_bytes();

    if !SUPPORTED_MECHANISMS.contains(&mechanism.as_str()) {
        return Err(ValidationError::Unsupported(format!(
            "signature mechanism {mechanism} is not currently supported"
        )));
    }

    let mut valid = false;
    if intact {
        // signed_attrs carries an implicit [0] tag inside SignerInfo; the
        // signature is computed over its universal SET OF encoding, so
        // re-encode before verifying
        let signed_blob = signed_attrs.to_der()?;
        let verify_md = mechanism_digest(&mechanism).unwrap_or(md_algorithm);
        valid = verify_rsa_pkcs1v15(&signing_cert, verify_md, &signed_blob, signature)?;
    }

    let (mut trusted, mut revoked, mut usage_ok) = (false, false, false);
    let mut validation_path = None;
    if valid {
        (trusted, revoked, usage_ok, validation_path) = validate_cert_usage(
            validator,
            &signing_cert,
            &ca_chain,
            validation_context,
            policy,
        );
    }

    Ok(SignatureStatus {
        intact,
        valid,
        trusted,
        revoked,
        usage_ok,
        signing_cert,
        ca_chain,
        pkcs7_signature_mechanism: mechanism,
        md_algorithm: md_algorithm.to_string(),
        validation_path,
    })
}

/// Decodes a CMS ContentInfo blob into its SignedData payload
pub fn read_signed_data(der_bytes: &[u8]) -> Result<SignedData> {
    let content_info = ContentInfo::from_der(der_bytes)
        .map_err(|e| ValidationError::Cms(format!("failed to parse ContentInfo: {e}")))?;
    if content_info.content_type != OID_SIGNED_DATA {
        return Err(ValidationError::Cms(format!(
            "expected SignedData, got OID: {}",
            content_info.content_type
        )));
    }
    let signed_data_bytes = content_info.content.to_der()?;
    SignedData::from_der(&signed_data_bytes)
        .map_err(|e| ValidationError::Cms(format!("failed to parse SignedData: {e}")))
}

fn certificates_in(signed_data: &SignedData) -> Result<Vec<Certificate>> {
    let set = signed_data
        .certificates
        .as_ref()
        .ok_or_else(|| ValidationError::Cms("no certificates in SignedData".to_string()))?;
    set.0
        .iter()
        .map(|choice| match choice {
            CertificateChoices::Certificate(cert) => Ok(cert.clone()),
            _ => Err(ValidationError::Unsupported(
                "only X.509 certificates are supported in the certificates set".to_string(),
            )),
        })
        .collect()
}

/// The single SignerInfo of a SignedData; multi-signer CMS is rejected
pub fn single_signer_info(signed_data: &SignedData) -> Result<&SignerInfo> {
    let mut iter = signed_data.signer_infos.0.iter();
    let signer_info = iter.next().ok_or_else(|| {
        ValidationError::Signature("signer_infos should contain exactly one entry".to_string())
    })?;
    if iter.next().is_some() {
        return Err(ValidationError::Signature(
            "signer_infos should contain exactly one entry".to_string(),
        ));
    }
    Ok(signer_info)
}

/// Splits the certificate set into the signer and the CA chain.
///
/// The certificates entry is a set, so the signer has to be dug out by
/// matching issuer and serial number against the SignerInfo's SID.
fn partition_certs(
    certs: Vec<Certificate>,
    signer_info: &SignerInfo,
) -> Result<(Certificate, Vec<Certificate>)> {
    let issuer_and_serial = match &signer_info.sid {
        SignerIdentifier::IssuerAndSerialNumber(ias) => ias,
        SignerIdentifier::SubjectKeyIdentifier(_) => {
            return Err(ValidationError::Unsupported(
                "can only look up certificates by issuer and serial number".to_string(),
            ))
        }
    };
    let wanted = IssuerSerial::new(&issuer_and_serial.issuer, &issuer_and_serial.serial_number)?;

    let mut signer = None;
    let mut ca_chain = Vec::new();
    for cert in certs {
        if IssuerSerial::from_cert(&cert)? == wanted {
            signer = Some(cert);
        } else {
            ca_chain.push(cert);
        }
    }
    let signer = signer.ok_or_else(|| {
        ValidationError::Signature("signer certificate not included in signature".to_string())
    })?;
    Ok((signer, ca_chain))
}

/// Runs the path validator and folds its verdict into the four trust flags
fn validate_cert_usage(
    validator: &dyn CertificatePathValidator,
    signer: &Certificate,
    intermediates: &[Certificate],
    context: &ValidationContext,
    policy: &KeyUsagePolicy,
) -> (bool, bool, bool, Option<Vec<Certificate>>) {
    match validator.validate_usage(signer, intermediates, context, policy) {
        Ok(path) => (true, false, true, Some(path)),
        Err(PathValidationFailure::InvalidCertificate(e)) => {
            warn!("invalid certificate: {e}");
            (false, false, false, None)
        }
        Err(PathValidationFailure::Revoked(_)) => (false, true, false, None),
        Err(e @ PathValidationFailure::PathBuilding(_))
        | Err(e @ PathValidationFailure::PathValidation(_)) => {
            warn!("{e}");
            (false, false, false, None)
        }
    }
}

/// Maps a signature algorithm OID to its asn1crypto-style name; unknown
/// OIDs pass through in dotted form (and then fail the mechanism allowlist)
fn mechanism_name(oid: &ObjectIdentifier) -> String {
    match oid.to_string().as_str() {
        "1.2.840.113549.1.1.1" => "rsassa_pkcs1v15".to_string(),
        "1.2.840.113549.1.1.5" => "sha1_rsa".to_string(),
        "1.2.840.113549.1.1.11" => "sha256_rsa".to_string(),
        "1.2.840.113549.1.1.12" => "sha384_rsa".to_string(),
        "1.2.840.113549.1.1.13" => "sha512_rsa".to_string(),
        other => other.to_string(),
    }
}

/// The digest a mechanism dictates, if it dictates one
fn mechanism_digest(mechanism: &str) -> Option<&'static str> {
    match mechanism {
        "sha1_rsa" => Some("sha1"),
        "sha256_rsa" => Some("sha256"),
        "sha384_rsa" => Some("sha384"),
        "sha512_rsa" => Some("sha512"),
        _ => None,
    }
}

/// Maps a digest algorithm OID to its lowercase name
pub(crate) fn digest_algorithm_name(oid: &ObjectIdentifier) -> Result<&'static str> {
    match oid.to_string().as_str() {
        "1.3.14.3.2.26" => Ok("sha1"),
        "2.16.840.1.101.3.4.2.1" => Ok("sha256"),
        "2.16.840.1.101.3.4.2.2" => Ok("sha384"),
        "2.16.840.1.101.3.4.2.3" => Ok("sha512"),
        other => Err(ValidationError::Unsupported(format!(
            "digest algorithm OID {other}"
        ))),
    }
}

/// Digests a sequence of byte chunks with the named algorithm
pub(crate) fn digest_chunks<'c>(
    algorithm: &str,
    chunks: impl IntoIterator<Item = &'c [u8]>,
) -> Result<Vec<u8>> {
    match algorithm {
        "sha1" => {
            let mut hasher = Sha1::new();
            for chunk in chunks {
                hasher.update(chunk);
            }
            Ok(hasher.finalize().to_vec())
        }
        "sha256" => {
            let mut hasher = Sha256::new();
            for chunk in chunks {
                hasher.update(chunk);
            }
            Ok(hasher.finalize().to_vec())
        }
        "sha384" => {
            let mut hasher = Sha384::new();
            for chunk in chunks {
                hasher.update(chunk);
            }
            Ok(hasher.finalize().to_vec())
        }
        "sha512" => {
            let mut hasher = Sha512::new();
            for chunk in chunks {
                hasher.update(chunk);
            }
            Ok(hasher.finalize().to_vec())
        }
        other => Err(ValidationError::Unsupported(format!(
            "message digest {other}"
        ))),
    }
}

/// Digests a single buffer with the named algorithm
pub(crate) fn digest_data(algorithm: &str, data: &[u8]) -> Result<Vec<u8>> {
    digest_chunks(algorithm, [data])
}

fn verify_rsa_pkcs1v15(
    cert: &Certificate,
    md_algorithm: &str,
    message: &[u8],
    signature_bytes: &[u8],
) -> Result<bool> {
    let spki_der = cert.tbs_certificate.subject_public_key_info.to_der()?;
    let public_key = RsaPublicKey::from_public_key_der(&spki_der)
        .map_err(|e| ValidationError::Cms(format!("failed to parse RSA public key: {e}")))?;
    let signature = match RsaSignature::try_from(signature_bytes) {
        Ok(signature) => signature,
        Err(_) => return Ok(false),
    };
    let ok = match md_algorithm {
        "sha1" => VerifyingKey::<Sha1>::new(public_key)
            .verify(message, &signature)
            .is_ok(),
        "sha256" => VerifyingKey::<Sha256>::new(public_key)
            .verify(message, &signature)
            .is_ok(),
        "sha384" => VerifyingKey::<Sha384>::new(public_key)
            .verify(message, &signature)
            .is_ok(),
        "sha512" => VerifyingKey::<Sha512>::new(public_key)
            .verify(message, &signature)
            .is_ok(),
        other => {
            return Err(ValidationError::Unsupported(format!(
                "message digest {other}"
            )))
        }
    };
    Ok(ok)
}

/// Finds the first value of a CMS attribute by OID
pub(crate) fn find_attribute(
    attrs: &SetOfVec<Attribute>,
    oid: ObjectIdentifier,
) -> Option<&Any> {
    attrs
        .iter()
        .find(|attr| attr.oid == oid)
        .and_then(|attr| attr.values.iter().next())
}

/// The self-reported `signingTime` signed attribute, if present and decodable
pub fn extract_signing_time(signer_info: &SignerInfo) -> Option<DateTime<Utc>> {
    let value = signer_info
        .signed_attrs
        .as_ref()
        .and_then(|attrs| find_attribute(attrs, OID_SIGNING_TIME))?;
    decode_asn1_time(value)
}

fn decode_asn1_time(value: &Any) -> Option<DateTime<Utc>> {
    let der_bytes = value.to_der().ok()?;
    let duration = if let Ok(t) = UtcTime::from_der(&der_bytes) {
        t.to_unix_duration()
    } else if let Ok(t) = GeneralizedTime::from_der(&der_bytes) {
        t.to_unix_duration()
    } else {
        return None;
    };
    DateTime::<Utc>::from_timestamp(duration.as_secs() as i64, duration.subsec_nanos())
}

/// The RFC 3161 timestamp token from the unsigned attributes, if any
pub fn extract_timestamp_token(signer_info: &SignerInfo) -> Result<Option<SignedData>> {
    let Some(unsigned_attrs) = signer_info.unsigned_attrs.as_ref() else {
        return Ok(None);
    };
    let Some(value) = find_attribute(unsigned_attrs, OID_TIMESTAMP_TOKEN) else {
        return Ok(None);
    };
    Ok(Some(read_signed_data(&value.to_der()?)?))
}

/// RFC 3161 TSTInfo, decoded only deep enough to recover `genTime`.
/// The trailing optional fields (accuracy, ordering, nonce, tsa,
/// extensions) are tolerated but not interpreted.
#[derive(Clone, Debug, Sequence)]
struct TstInfo {
    version: u8,
    policy: ObjectIdentifier,
    message_imprint: Any,
    serial_number: Int,
    gen_time: GeneralizedTime,
    #[asn1(optional = "true")]
    accuracy: Option<Any>,
    #[asn1(optional = "true")]
    ordering: Option<Any>,
    #[asn1(optional = "true")]
    nonce: Option<Any>,
    #[asn1(optional = "true")]
    tsa: Option<Any>,
    #[asn1(optional = "true")]
    extensions: Option<Any>,
}

/// The `genTime` of a timestamp token's TSTInfo payload
pub fn timestamp_token_gen_time(token: &SignedData) -> Result<DateTime<Utc>> {
    let econtent = token
        .encap_content_info
        .econtent
        .as_ref()
        .ok_or_else(|| ValidationError::Cms("timestamp token has no TSTInfo".to_string()))?;
    let info = TstInfo::from_der(econtent.value())
        .map_err(|e| ValidationError::Cms(format!("failed to parse TSTInfo: {e}")))?;
    let duration = info.gen_time.to_unix_duration();
    DateTime::<Utc>::from_timestamp(duration.as_secs() as i64, duration.subsec_nanos())
        .ok_or_else(|| ValidationError::Cms("genTime out of representable range".to_string()))
}

/// Adobe `RevocationInfoArchival` signed attribute payload (see the PDF
/// extension to RFC 5126): archived CRLs and OCSP responses, kept as
/// opaque DER elements.
#[derive(Clone, Debug, Sequence)]
pub struct RevocationInfoArchival {
    /// Archived CRLs
    #[asn1(context_specific = "0", tag_mode = "EXPLICIT", optional = "true")]
    pub crl: Option<Vec<Any>>,
    /// Archived OCSP responses
    #[asn1(context_specific = "1", tag_mode = "EXPLICIT", optional = "true")]
    pub ocsp: Option<Vec<Any>>,
    /// Other revocation information formats
    #[asn1(context_specific = "2", tag_mode = "EXPLICIT", optional = "true")]
    pub other_rev_info: Option<Any>,
}

/// The Adobe revocation-info-archival signed attribute, if present
pub fn extract_revocation_info(
    signer_info: &SignerInfo,
) -> Result<Option<RevocationInfoArchival>> {
    let Some(signed_attrs) = signer_info.signed_attrs.as_ref() else {
        return Ok(None);
    };
    let Some(value) = find_attribute(signed_attrs, OID_ADOBE_REVINFO_ARCHIVAL) else {
        return Ok(None);
    };
    let archival = RevocationInfoArchival::from_der(&value.to_der()?)
        .map_err(|e| ValidationError::Cms(format!("malformed revocation info: {e}")))?;
    Ok(Some(archival))
}
