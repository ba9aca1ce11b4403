//! Signature validation orchestration
//!
//! [`validate_pdf_signature`] is the standard entry point: it extracts the
//! signature dictionary from a field, checks integrity (digest, coverage,
//! modification audit), validates the CMS signature and any embedded
//! timestamp token, enforces seed value constraints, and folds everything
//! into a [`PdfSignatureStatus`]. [`validate_pdf_ltv_signature`] is the
//! long-term-validation variant: it insists on a timestamp token, validates
//! at the token's time, and sources revocation data exclusively from the
//! document (DSS) or the signature (Adobe revocation-info archival) with
//! network fetching disabled.

use crate::cms::{self, SignatureStatus};
use crate::coverage::{evaluate_signature_coverage, SignatureCoverageLevel};
use crate::diff::{evaluate_modifications, ModificationLevel};
use crate::dss::DocumentSecurityStore;
use crate::error::{Result, ValidationError};
use crate::fields::{MDPPerm, SigSeedSubFilter, SigSeedValFlags, SigSeedValueSpec};
use crate::objects::PdfDictionary;
use crate::reader::RevisionReader;
use crate::trust::{
    CertificatePathValidator, KeyUsagePolicy, RevocationMode, ValidationContext,
};
use ::cms::signed_data::{SignedData, SignerInfo};
use chrono::{DateTime, Utc};
use tracing::warn;
use x509_cert::Certificate;

/// Validity of an embedded RFC 3161 timestamp token
#[derive(Debug, Clone)]
pub struct TimestampSignatureStatus {
    /// CMS-level status of the token signature
    pub status: SignatureStatus,
    /// The token's `genTime`
    pub timestamp: DateTime<Utc>,
}

impl TimestampSignatureStatus {
    /// Status fields for the summary string
    pub fn summary_fields(&self) -> Vec<String> {
        self.status.summary_fields()
    }

    /// One-line classification of the token
    pub fn summary(&self) -> String {
        self.status.summary()
    }
}

/// The aggregate validation status of a PDF signature
#[derive(Debug, Clone)]
pub struct PdfSignatureStatus {
    /// CMS-level status (integrity, validity, trust)
    pub status: SignatureStatus,
    /// How much of the file the signature covers
    pub coverage: SignatureCoverageLevel,
    /// Classification of post-signature modifications
    pub modification_level: ModificationLevel,
    /// Whether the seed value constraints were satisfied
    pub seed_value_ok: bool,
    /// Whether the modifications fall within the signer's `/DocMDP`
    /// permissions
    pub docmdp_ok: bool,
    /// Reported signing time (signed attribute or timestamp token)
    pub signed_dt: Option<DateTime<Utc>>,
    /// Status of the embedded timestamp token, if any
    pub timestamp_validity: Option<TimestampSignatureStatus>,
}

impl PdfSignatureStatus {
    /// The one-bit verdict: cryptographically valid, trusted, within seed
    /// value and DocMDP constraints, and carrying a sound timestamp if it
    /// carries one at all
    pub fn bottom_line(&self) -> bool {
        let timestamp_ok = match &self.timestamp_validity {
            None => true,
            Some(ts) => ts.status.valid && ts.status.trusted,
        };
        self.status.valid
            && self.status.trusted
            && self.seed_value_ok
            && self.docmdp_ok
            && timestamp_ok
    }

    /// Status fields for the summary string
    pub fn summary_fields(&self) -> Vec<String> {
        let mut fields = self.status.summary_fields();
        match self.coverage {
            SignatureCoverageLevel::EntireFile => fields.push("UNTOUCHED".to_string()),
            SignatureCoverageLevel::EntireRevision => fields.push(format!(
                "EXTENDED_WITH_{}",
                self.modification_level.name()
            )),
            _ => fields.push("NONSTANDARD_COVERAGE".to_string()),
        }
        if self.docmdp_ok {
            if self.coverage != SignatureCoverageLevel::EntireFile {
                fields.push("ACCEPTABLE_MODIFICATIONS".to_string());
            }
        } else {
            fields.push("ILLEGAL_MODIFICATIONS".to_string());
        }
        if let Some(ts) = &self.timestamp_validity {
            fields.push(format!(
                "TIMESTAMP_TOKEN<{}>",
                ts.summary_fields().join("|")
            ));
        }
        fields
    }

    /// One-line classification of the signature
    pub fn summary(&self) -> String {
        if self.status.intact && self.status.valid {
            format!("INTACT:{}", self.summary_fields().join(","))
        } else {
            "INVALID".to_string()
        }
    }
}

/// A signature embedded in a document, with everything needed to check its
/// integrity. Lives for one validation call.
pub struct EmbeddedPdfSignature<'a> {
    reader: &'a RevisionReader,
    sig_object: &'a PdfDictionary,
    byte_range: Vec<i64>,
    contents: Vec<u8>,
    signed_data: SignedData,
    md_algorithm: String,
    signed_revision: usize,
    coverage: Option<SignatureCoverageLevel>,
    modification_level: Option<ModificationLevel>,
    raw_digest: Option<Vec<u8>>,
}

impl<'a> EmbeddedPdfSignature<'a> {
    /// Extracts and decodes the signature from a signature field's `/V`
    pub fn new(reader: &'a RevisionReader, sig_field: &PdfDictionary) -> Result<Self> {
        let value_raw = sig_field.get("V").ok_or(ValidationError::EmptySignature)?;
        let sig_ref = value_raw.as_reference().ok_or_else(|| {
            ValidationError::Structural(
                "signature value must be an indirect reference".to_string(),
            )
        })?;
        let current = reader.revision_count().checked_sub(1).ok_or_else(|| {
            ValidationError::Structural("document has no revisions".to_string())
        })?;
        let sig_object = reader.resolver(current).resolve_dict(sig_ref)?;

        let contents = sig_object
            .get_string("Contents")
            .ok_or_else(|| {
                ValidationError::Structural(
                    "signature object is not correctly formatted".to_string(),
                )
            })?
            .as_bytes()
            .to_vec();
        let byte_range = sig_object
            .get_array("ByteRange")
            .ok_or_else(|| {
                ValidationError::Structural(
                    "signature object is not correctly formatted".to_string(),
                )
            })?
            .iter()
            .map(|entry| {
                entry.as_integer().ok_or_else(|| {
                    ValidationError::Structural("/ByteRange must contain integers".to_string())
                })
            })
            .collect::<Result<Vec<i64>>>()?;

        let signed_data = cms::read_signed_data(&contents)?;
        // reject multi-signer CMS up front
        cms::single_signer_info(&signed_data)?;
        let md_algorithm = {
            let first = signed_data
                .digest_algorithms
                .iter()
                .next()
                .ok_or_else(|| {
                    ValidationError::Cms("no digest algorithms in SignedData".to_string())
                })?;
            cms::digest_algorithm_name(&first.oid)?.to_string()
        };

        // the revision this signature's object is anchored to
        let signed_revision = reader.xrefs().last_change(sig_ref).ok_or_else(|| {
            ValidationError::Structural(format!(
                "signature object {sig_ref} not present in any xref table"
            ))
        })?;

        Ok(Self {
            reader,
            sig_object,
            byte_range,
            contents,
            signed_data,
            md_algorithm,
            signed_revision,
            coverage: None,
            modification_level: None,
            raw_digest: None,
        })
    }

    /// The decoded CMS payload
    pub fn signed_data(&self) -> &SignedData {
        &self.signed_data
    }

    /// The single SignerInfo
    pub fn signer_info(&self) -> Result<&SignerInfo> {
        cms::single_signer_info(&self.signed_data)
    }

    /// The signature dictionary
    pub fn sig_object(&self) -> &PdfDictionary {
        self.sig_object
    }

    /// The raw `/Contents` bytes
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// The message digest algorithm, lowercase
    pub fn md_algorithm(&self) -> &str {
        &self.md_algorithm
    }

    /// Index of the revision the signature is anchored to
    pub fn signed_revision(&self) -> usize {
        self.signed_revision
    }

    /// The `/SubFilter` name, if present
    pub fn subfilter_name(&self) -> Option<&str> {
        self.sig_object.get_name("SubFilter")
    }

    /// The `/SubFilter`, if present and recognized
    pub fn subfilter(&self) -> Option<SigSeedSubFilter> {
        self.subfilter_name().and_then(SigSeedSubFilter::from_name)
    }

    /// The digest computed over the byte range, once computed
    pub fn raw_digest(&self) -> Option<&[u8]> {
        self.raw_digest.as_deref()
    }

    /// Coverage level, once computed
    pub fn coverage(&self) -> Option<SignatureCoverageLevel> {
        self.coverage
    }

    /// Modification level, once computed
    pub fn modification_level(&self) -> Option<ModificationLevel> {
        self.modification_level
    }

    /// The `/DocMDP` permission declared by this signature, if any
    pub fn docmdp_level(&self) -> Result<Option<MDPPerm>> {
        extract_docmdp(self.sig_object)
    }

    /// Digests the declared byte ranges of the file
    pub fn compute_digest(&mut self) -> Result<()> {
        let data = self.reader.data();
        if self.byte_range.len() % 2 != 0 {
            return Err(ValidationError::Structural(
                "/ByteRange must contain offset, length pairs".to_string(),
            ));
        }
        // arbitrary byte ranges are digestible; the coverage check is the
        // one imposing stricter shape constraints
        let mut chunks = Vec::new();
        for pair in self.byte_range.chunks(2) {
            let (offset, length) = (pair[0], pair[1]);
            let end = offset.checked_add(length);
            if offset < 0 || length < 0 || end.is_none() || end.unwrap_or(0) as usize > data.len()
            {
                return Err(ValidationError::Structural(
                    "/ByteRange exceeds document".to_string(),
                ));
            }
            chunks.push(&data[offset as usize..(offset + length) as usize]);
        }
        self.raw_digest = Some(cms::digest_chunks(&self.md_algorithm, chunks)?);
        Ok(())
    }

    /// Computes digest, coverage and modification level in one go
    pub fn compute_integrity_info(
        &mut self,
    ) -> Result<(SignatureCoverageLevel, ModificationLevel)> {
        self.compute_digest()?;
        let coverage = evaluate_signature_coverage(
            self.reader,
            &self.byte_range,
            &self.contents,
            self.signed_revision,
        )?;
        let modification_level =
            evaluate_modifications(self.reader, self.signed_revision, coverage)?;
        self.coverage = Some(coverage);
        self.modification_level = Some(modification_level);
        Ok((coverage, modification_level))
    }
}

/// Extracts the `/DocMDP` permission from a signature dictionary's
/// `/Reference` array.
///
/// All queries are raw: this has to work for historical revisions too, and
/// signature dictionaries should not contain indirect references anyway.
pub fn extract_docmdp(sig_object: &PdfDictionary) -> Result<Option<MDPPerm>> {
    let Some(refs) = sig_object.get_array("Reference") else {
        return Ok(None);
    };
    for transform in refs.iter() {
        let Some(transform) = transform.as_dict() else {
            continue;
        };
        if transform.get_name("TransformMethod") != Some("DocMDP") {
            continue;
        }
        let perm = transform
            .get_dict("TransformParams")
            .and_then(|params| params.get_int("P"))
            .and_then(MDPPerm::from_code);
        return match perm {
            Some(perm) => Ok(Some(perm)),
            None => Err(ValidationError::Signature(
                "failed to read document permissions".to_string(),
            )),
        };
    }
    Ok(None)
}

/// A document's certification signature and its declared permissions
#[derive(Debug, Clone)]
pub struct DocMDPInfo {
    /// The declared permission level
    pub permission: Option<MDPPerm>,
    /// The certification signature dictionary
    pub author_sig: PdfDictionary,
}

/// Reads the certification signature from the catalog's `/Perms` entry
pub fn read_certification_data(reader: &RevisionReader) -> Result<Option<DocMDPInfo>> {
    let current = reader.revision_count().checked_sub(1).ok_or_else(|| {
        ValidationError::Structural("document has no revisions".to_string())
    })?;
    let (_, root) = reader.root(current)?;
    let resolver = reader.resolver(current);
    let Some(perms_raw) = root.get("Perms") else {
        return Ok(None);
    };
    let perms = resolver
        .resolve_value(perms_raw)?
        .as_dict()
        .ok_or_else(|| ValidationError::Structural("/Perms is not a dictionary".to_string()))?;
    let Some(docmdp_raw) = perms.get("DocMDP") else {
        return Ok(None);
    };
    let author_sig = resolver
        .resolve_value(docmdp_raw)?
        .as_dict()
        .ok_or_else(|| ValidationError::Structural("/DocMDP is not a dictionary".to_string()))?;
    let permission = extract_docmdp(author_sig)?;
    Ok(Some(DocMDPInfo {
        permission,
        author_sig: author_sig.clone(),
    }))
}

fn docmdp_ok(modification_level: ModificationLevel, docmdp: Option<MDPPerm>) -> bool {
    !(modification_level == ModificationLevel::Other
        || docmdp
            .map(|perm| modification_level.rank() > perm.code())
            .unwrap_or(false))
}

/// Validates a PDF signature: integrity, coverage, modifications, CMS
/// signature, timestamp token and seed value constraints.
///
/// `ts_context` is the validation context for timestamp tokens; it
/// defaults to `signer_context`.
///
/// # Errors
///
/// Fatal conditions only: an empty or malformed signature field, an
/// unrecognized subfilter, unsupported mechanisms, or read errors.
/// Cryptographic, trust and seed-value failures are reported through the
/// returned status.
pub fn validate_pdf_signature(
    reader: &RevisionReader,
    sig_field: &PdfDictionary,
    validator: &dyn CertificatePathValidator,
    signer_context: &ValidationContext,
    ts_context: Option<&ValidationContext>,
) -> Result<PdfSignatureStatus> {
    let mut embedded_sig = EmbeddedPdfSignature::new(reader, sig_field)?;
    let subfilter_name = embedded_sig
        .subfilter_name()
        .ok_or_else(|| {
            ValidationError::Structural("signature has no /SubFilter".to_string())
        })?
        .to_string();
    if SigSeedSubFilter::from_name(&subfilter_name).is_none() {
        return Err(ValidationError::Unsupported(format!(
            "{subfilter_name} is not a recognized SubFilter type"
        )));
    }

    let (coverage, modification_level) = embedded_sig.compute_integrity_info()?;
    let docmdp = embedded_sig.docmdp_level()?;
    let docmdp_ok = docmdp_ok(modification_level, docmdp);

    let policy = KeyUsagePolicy::non_repudiation();
    let signed_dt_attr = cms::extract_signing_time(embedded_sig.signer_info()?);

    // an (externally) signed timestamp is its own CMS signature
    let mut timestamp_validity = None;
    let mut token_time = None;
    if let Some(token) = cms::extract_timestamp_token(embedded_sig.signer_info()?)? {
        let timestamp = cms::timestamp_token_gen_time(&token)?;
        let status = cms::validate_cms_signature(
            &token,
            None,
            ts_context.unwrap_or(signer_context),
            validator,
            &policy,
        )?;
        token_time = Some(timestamp);
        timestamp_validity = Some(TimestampSignatureStatus { status, timestamp });
    }

    let status = cms::validate_cms_signature(
        embedded_sig.signed_data(),
        embedded_sig.raw_digest(),
        signer_context,
        validator,
        &policy,
    )?;

    let timestamp_found = timestamp_validity
        .as_ref()
        .map(|ts| ts.status.valid && ts.status.trusted)
        .unwrap_or(false);
    let seed_value_ok = check_seed_value_constraints(
        reader,
        sig_field,
        &embedded_sig,
        &status.signing_cert,
        status.validation_path.as_deref(),
        timestamp_found,
    )?;

    Ok(PdfSignatureStatus {
        status,
        coverage,
        modification_level,
        seed_value_ok,
        docmdp_ok,
        signed_dt: signed_dt_attr.or(token_time),
        timestamp_validity,
    })
}

/// Which source of archived revocation information LTV validation uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevocationInfoValidationType {
    /// The Adobe revocation-info-archival signed attribute
    AdobeStyle,
    /// The document security store (PAdES-LT)
    PadesLt,
}

/// Long-term validation: validate at the embedded timestamp's time, with
/// network fetching disabled and revocation data sourced exclusively from
/// the document or signature.
///
/// `base_context` supplies trust material and other knobs; its moment,
/// fetch switch and revocation mode are overridden here.
pub fn validate_pdf_ltv_signature(
    reader: &RevisionReader,
    sig_field: &PdfDictionary,
    validation_type: RevocationInfoValidationType,
    validator: &dyn CertificatePathValidator,
    mut base_context: ValidationContext,
    force_revinfo: bool,
) -> Result<PdfSignatureStatus> {
    // certs with OCSP/CRL endpoints must come with embedded revocation data
    base_context.allow_fetching = false;
    base_context.revocation_mode = if force_revinfo {
        RevocationMode::Require
    } else {
        RevocationMode::HardFail
    };

    let mut embedded_sig = EmbeddedPdfSignature::new(reader, sig_field)?;
    let (coverage, modification_level) = embedded_sig.compute_integrity_info()?;
    let docmdp = embedded_sig.docmdp_level()?;
    let docmdp_ok = docmdp_ok(modification_level, docmdp);

    let token = cms::extract_timestamp_token(embedded_sig.signer_info()?)?.ok_or_else(|| {
        ValidationError::Signature("LTV signatures require a trusted timestamp".to_string())
    })?;
    let timestamp = cms::timestamp_token_gen_time(&token)?;
    base_context.moment = Some(timestamp);

    let context = match validation_type {
        RevocationInfoValidationType::AdobeStyle => {
            read_adobe_revocation_info(embedded_sig.signer_info()?, base_context)?
        }
        RevocationInfoValidationType::PadesLt => {
            let (_, context) = DocumentSecurityStore::read(reader, base_context)?;
            context
        }
    };

    let policy = KeyUsagePolicy::non_repudiation();
    let timestamp_validity = TimestampSignatureStatus {
        status: cms::validate_cms_signature(&token, None, &context, validator, &policy)?,
        timestamp,
    };
    let status = cms::validate_cms_signature(
        embedded_sig.signed_data(),
        embedded_sig.raw_digest(),
        &context,
        validator,
        &policy,
    )?;

    let seed_value_ok = check_seed_value_constraints(
        reader,
        sig_field,
        &embedded_sig,
        &status.signing_cert,
        status.validation_path.as_deref(),
        true,
    )?;

    Ok(PdfSignatureStatus {
        status,
        coverage,
        modification_level,
        seed_value_ok,
        docmdp_ok,
        signed_dt: Some(timestamp),
        timestamp_validity: Some(timestamp_validity),
    })
}

/// Builds a validation context from the Adobe revocation-info-archival
/// signed attribute
pub fn read_adobe_revocation_info(
    signer_info: &SignerInfo,
    mut base_context: ValidationContext,
) -> Result<ValidationContext> {
    use der::Encode;

    let archival = cms::extract_revocation_info(signer_info)?.ok_or_else(|| {
        ValidationError::Signature("no revocation info found".to_string())
    })?;
    for ocsp in archival.ocsp.iter().flatten() {
        base_context.add_ocsp(ocsp.to_der()?);
    }
    for crl in archival.crl.iter().flatten() {
        base_context.add_crl(crl.to_der()?);
    }
    Ok(base_context)
}

/// Runs the seed value enforcement; returns the `seed_value_ok` bit.
///
/// Violations are caught and logged; unsupported mandatory constraints
/// stay fatal.
fn check_seed_value_constraints(
    reader: &RevisionReader,
    sig_field: &PdfDictionary,
    embedded_sig: &EmbeddedPdfSignature<'_>,
    signing_cert: &Certificate,
    validation_path: Option<&[Certificate]>,
    timestamp_found: bool,
) -> Result<bool> {
    let Some(sv_raw) = sig_field.get("SV") else {
        return Ok(true);
    };
    let current = reader.revision_count().saturating_sub(1);
    let sv_dict = reader
        .resolver(current)
        .resolve_value(sv_raw)?
        .as_dict()
        .ok_or_else(|| ValidationError::Structural("/SV is not a dictionary".to_string()))?;
    let spec = SigSeedValueSpec::from_pdf_object(sv_dict)?;

    let revinfo_found = embedded_sig
        .signer_info()
        .and_then(|si| cms::extract_revocation_info(si))
        .map(|archival| archival.is_some())
        .unwrap_or(false);
    let audit = SeedValueAudit {
        subfilter: embedded_sig.subfilter(),
        md_algorithm: embedded_sig.md_algorithm(),
        reason: embedded_sig
            .sig_object()
            .get_string("Reason")
            .map(|s| s.to_string_lossy()),
        revinfo_found,
        timestamp_found,
        signing_cert,
        validation_path,
    };
    match enforce_seed_value_constraints(&spec, &audit) {
        Ok(()) => Ok(true),
        Err(err @ ValidationError::SeedValue(_)) => {
            warn!("{err}");
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

/// What the enforcement needs to know about the signature under audit
struct SeedValueAudit<'x> {
    subfilter: Option<SigSeedSubFilter>,
    md_algorithm: &'x str,
    reason: Option<String>,
    revinfo_found: bool,
    timestamp_found: bool,
    signing_cert: &'x Certificate,
    validation_path: Option<&'x [Certificate]>,
}

fn enforce_seed_value_constraints(
    spec: &SigSeedValueSpec,
    audit: &SeedValueAudit<'_>,
) -> Result<()> {
    if let Some(cert_constraints) = &spec.cert {
        match cert_constraints.satisfied_by(audit.signing_cert, audit.validation_path) {
            Ok(()) => {}
            Err(ValidationError::UnacceptableSigner(msg)) => {
                return Err(ValidationError::SeedValue(msg))
            }
            Err(err) => return Err(err),
        }
    }

    if spec.timestamp_required && !audit.timestamp_found {
        return Err(ValidationError::SeedValue(
            "the seed value dictionary requires a trusted timestamp, but none was found, \
             or the timestamp did not validate"
                .to_string(),
        ));
    }

    let flags = spec.flags;
    if flags.is_empty() {
        return Ok(());
    }

    if flags.intersects(SigSeedValFlags::UNSUPPORTED) {
        return Err(ValidationError::Unsupported(format!(
            "unsupported mandatory seed value items: {:?}",
            flags & SigSeedValFlags::UNSUPPORTED
        )));
    }

    if flags.contains(SigSeedValFlags::SUBFILTER) {
        if let Some(subfilters) = &spec.subfilters {
            // empty array: none of the mandated encodings is supported
            let mandated = subfilters.first().copied().ok_or_else(|| {
                ValidationError::Unsupported(
                    "the signature encodings mandated by the seed value dictionary are \
                     not supported"
                        .to_string(),
                )
            })?;
            // the standard mandates taking the first available subfilter
            if let Some(selected) = audit.subfilter {
                if mandated != selected {
                    return Err(ValidationError::SeedValue(format!(
                        "the seed value dictionary mandates subfilter '{}', but '{}' was \
                         used in the signature",
                        mandated.as_name(),
                        selected.as_name()
                    )));
                }
            }
        }
    }

    if flags.contains(SigSeedValFlags::ADD_REV_INFO) {
        if let Some(required) = spec.add_rev_info {
            if required != audit.revinfo_found {
                return Err(ValidationError::SeedValue(format!(
                    "the seed value dictionary mandates that revocation info {}be added, \
                     but it was {}found in the signature",
                    if required { "" } else { "not " },
                    if audit.revinfo_found { "" } else { "not " }
                )));
            }
            if required && audit.subfilter != Some(SigSeedSubFilter::AdobePkcs7Detached) {
                return Err(ValidationError::SeedValue(format!(
                    "the seed value dictionary mandates that Adobe-style revocation info \
                     be added; this requires subfilter '{}'",
                    SigSeedSubFilter::AdobePkcs7Detached.as_name()
                )));
            }
        }
    }

    if flags.contains(SigSeedValFlags::DIGEST_METHOD) {
        if let Some(digest_methods) = &spec.digest_methods {
            let selected = audit.md_algorithm.to_lowercase();
            if !digest_methods.contains(&selected) {
                return Err(ValidationError::SeedValue(format!(
                    "the selected message digest {selected} is not allowed by the seed \
                     value dictionary"
                )));
            }
        }
    }

    if flags.contains(SigSeedValFlags::REASONS) {
        // omission of /Reasons amounts to a prohibition here
        let must_omit = spec
            .reasons
            .as_ref()
            .map(|reasons| reasons.is_empty() || reasons == &[".".to_string()])
            .unwrap_or(true);
        match (&audit.reason, must_omit) {
            (Some(_), true) => {
                return Err(ValidationError::SeedValue(
                    "the seed value dictionary prohibits giving a reason for signing"
                        .to_string(),
                ))
            }
            (reason, false) => {
                let accepted = reason
                    .as_ref()
                    .map(|r| spec.reasons.iter().flatten().any(|allowed| allowed == r))
                    .unwrap_or(false);
                if !accepted {
                    return Err(ValidationError::SeedValue(format!(
                        "the reason for signing {:?} is not accepted by the seed value \
                         dictionary",
                        reason.as_deref().unwrap_or("")
                    )));
                }
            }
            (None, true) => {}
        }
    }

    Ok(())
}
