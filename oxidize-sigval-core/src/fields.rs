//! Signature field metadata: seed values, certificate constraints, locks
//!
//! Seed value dictionaries (`/SV`) let a document author constrain the
//! signatures a field will accept: which subfilters, which digest methods,
//! which signers. This module models those dictionaries (round-trippable to
//! and from PDF objects per Tables 234/235 in ISO 32000-1), the `/DocMDP`
//! permission ladder, field lock dictionaries, and enumeration of signature
//! fields in a form tree.

use crate::certstore::IssuerSerial;
use crate::error::{Result, ValidationError};
use crate::objects::{ObjectId, PdfArray, PdfDictionary, PdfObject};
use crate::reader::{HistoricalResolver, RevisionReader};
use bitflags::bitflags;
use der::asn1::{Ia5StringRef, PrintableStringRef, Utf8StringRef};
use der::{Decode, Encode};
use tracing::warn;
use x509_cert::name::Name;
use x509_cert::Certificate;

bitflags! {
    /// Flags for the `/Ff` entry of a seed value dictionary: which of the
    /// constraints are strictly enforced rather than advisory.
    ///
    /// Not all constraint types are supported by this validator; the
    /// unsupported ones are grouped under [`SigSeedValFlags::UNSUPPORTED`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SigSeedValFlags: u32 {
        const FILTER = 1;
        const SUBFILTER = 2;
        const V = 4;
        const REASONS = 8;
        const LEGAL_ATTESTATION = 16;
        const ADD_REV_INFO = 32;
        const DIGEST_METHOD = 64;
        const LOCK_DOCUMENT = 128;
        const APPEARANCE_FILTER = 256;
        const UNSUPPORTED = Self::LEGAL_ATTESTATION.bits()
            | Self::LOCK_DOCUMENT.bits()
            | Self::APPEARANCE_FILTER.bits();
    }
}

impl Default for SigSeedValFlags {
    fn default() -> Self {
        SigSeedValFlags::empty()
    }
}

bitflags! {
    /// Flags for the `/Ff` entry of a certificate seed value dictionary
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SigCertConstraintFlags: u32 {
        const SUBJECT = 1;
        const ISSUER = 2;
        const OID = 4;
        const SUBJECT_DN = 8;
        const RESERVED = 16;
        const KEY_USAGE = 32;
        const URL = 64;
    }
}

/// `/DocMDP` permission levels, cf. Table 254 in ISO 32000-1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MDPPerm {
    /// No changes are permitted
    NoChanges = 1,
    /// Form filling and signing are permitted
    FillForms = 2,
    /// Form filling, signing and annotation manipulation are permitted
    Annotate = 3,
}

impl MDPPerm {
    /// Decodes the `/P` value of a DocMDP transform params dictionary
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(MDPPerm::NoChanges),
            2 => Some(MDPPerm::FillForms),
            3 => Some(MDPPerm::Annotate),
            _ => None,
        }
    }

    /// The numeric `/P` value
    pub fn code(self) -> i64 {
        self as i64
    }
}

/// The signature encodings this validator recognizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigSeedSubFilter {
    /// `/adbe.pkcs7.detached`
    AdobePkcs7Detached,
    /// `/ETSI.CAdES.detached` (PAdES)
    Pades,
    /// `/ETSI.RFC3161` (document timestamps)
    EtsiRfc3161,
}

impl SigSeedSubFilter {
    /// The PDF name, without the leading slash
    pub fn as_name(self) -> &'static str {
        match self {
            SigSeedSubFilter::AdobePkcs7Detached => "adbe.pkcs7.detached",
            SigSeedSubFilter::Pades => "ETSI.CAdES.detached",
            SigSeedSubFilter::EtsiRfc3161 => "ETSI.RFC3161",
        }
    }

    /// Parses a `/SubFilter` name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "adbe.pkcs7.detached" => Some(SigSeedSubFilter::AdobePkcs7Detached),
            "ETSI.CAdES.detached" => Some(SigSeedSubFilter::Pades),
            "ETSI.RFC3161" => Some(SigSeedSubFilter::EtsiRfc3161),
            _ => None,
        }
    }
}

/// OID <-> abbreviation table for distinguished name attribute types
fn abbreviate_name_type(oid: &str) -> Option<&'static str> {
    match oid {
        "2.5.4.3" => Some("CN"),
        "2.5.4.5" => Some("SerialNumber"),
        "2.5.4.6" => Some("C"),
        "2.5.4.7" => Some("L"),
        "2.5.4.8" => Some("ST"),
        "2.5.4.10" => Some("O"),
        "2.5.4.11" => Some("OU"),
        _ => None,
    }
}

fn expand_name_type(abbrev: &str) -> Option<&'static str> {
    match abbrev {
        "CN" => Some("2.5.4.3"),
        "SERIALNUMBER" => Some("2.5.4.5"),
        "C" => Some("2.5.4.6"),
        "L" => Some("2.5.4.7"),
        "ST" => Some("2.5.4.8"),
        "O" => Some("2.5.4.10"),
        "OU" => Some("2.5.4.11"),
        _ => None,
    }
}

/// Flattens an X.509 name into (dotted OID, value) pairs.
///
/// The PDF standard wants text values here, so every attribute value is
/// rendered as a string.
pub(crate) fn name_keyval_pairs(name: &Name) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for rdn in name.0.iter() {
        for atv in rdn.0.iter() {
            let value = if let Ok(s) = Utf8StringRef::try_from(&atv.value) {
                s.as_str().to_string()
            } else if let Ok(s) = PrintableStringRef::try_from(&atv.value) {
                s.as_str().to_string()
            } else if let Ok(s) = Ia5StringRef::try_from(&atv.value) {
                s.as_str().to_string()
            } else {
                String::from_utf8_lossy(atv.value.value()).into_owned()
            };
            pairs.push((atv.oid.to_string(), value));
        }
    }
    pairs
}

/// Certificate constraints from a `/SVCert` dictionary, cf. Table 235 in
/// ISO 32000-1
#[derive(Debug, Clone)]
pub struct SigCertConstraints {
    /// Which constraints are mandatory
    pub flags: SigCertConstraintFlags,
    /// Explicit whitelist of acceptable signer certificates
    pub subjects: Option<Vec<Certificate>>,
    /// Attribute pairs (dotted OID, value) the signer's subject must carry
    pub subject_dn: Option<Vec<(String, String)>>,
    /// Acceptable issuer certificates, matched against the chain of trust
    pub issuers: Option<Vec<Certificate>>,
    /// Informational URL
    pub info_url: Option<String>,
    /// `/URLType`; the standard default is `/Browser`
    pub url_type: String,
}

impl Default for SigCertConstraints {
    fn default() -> Self {
        Self {
            flags: SigCertConstraintFlags::empty(),
            subjects: None,
            subject_dn: None,
            issuers: None,
            info_url: None,
            url_type: "Browser".to_string(),
        }
    }
}

impl SigCertConstraints {
    /// Reads a `/SVCert` dictionary
    pub fn from_pdf_object(dict: &PdfDictionary) -> Result<Self> {
        if let Some(ty) = dict.get_type() {
            if ty != "SVCert" {
                // tolerated, but worth noticing
                warn!("/SVCert dictionary has /Type {ty}, accepting anyway");
            }
        }
        let flags =
            SigCertConstraintFlags::from_bits_truncate(dict.get_int("Ff").unwrap_or(0) as u32);
        let subjects = parse_cert_array(dict, "Subject")?;
        let issuers = parse_cert_array(dict, "Issuer")?;

        let subject_dn = match dict.get_array("SubjectDN") {
            Some(arr) => {
                let mut pairs = Vec::new();
                for entry in arr.iter() {
                    let Some(dn_dict) = entry.as_dict() else { continue };
                    for key in dn_dict.keys() {
                        let Some(value) = dn_dict.get_string(key) else {
                            continue;
                        };
                        // abbreviated attribute types become OIDs; everything
                        // else is taken to be a dotted OID already
                        let oid = expand_name_type(&key.to_uppercase())
                            .map(str::to_string)
                            .unwrap_or_else(|| key.to_string());
                        pairs.push((oid, value.to_string_lossy()));
                    }
                }
                if pairs.is_empty() {
                    None
                } else {
                    pairs.sort();
                    Some(pairs)
                }
            }
            None => None,
        };

        let info_url = dict.get_string("URL").map(|s| s.to_string_lossy());
        let url_type = match (info_url.as_ref(), dict.get_name("URLType")) {
            (Some(_), Some(ty)) => ty.to_string(),
            _ => "Browser".to_string(),
        };

        Ok(Self {
            flags,
            subjects,
            subject_dn,
            issuers,
            info_url,
            url_type,
        })
    }

    /// Serializes back to a `/SVCert` dictionary
    pub fn as_pdf_object(&self) -> Result<PdfDictionary> {
        let mut result = PdfDictionary::new();
        result.insert("Type", PdfObject::name("SVCert"));
        result.insert("Ff", PdfObject::Integer(self.flags.bits() as i64));
        if let Some(subjects) = &self.subjects {
            result.insert("Subject", cert_array(subjects)?);
        }
        if let Some(subject_dn) = &self.subject_dn {
            let mut dn_dict = PdfDictionary::new();
            for (oid, value) in subject_dn {
                let key = abbreviate_name_type(oid).unwrap_or(oid.as_str());
                dn_dict.insert(key, PdfObject::string(value.as_bytes().to_vec()));
            }
            result.insert(
                "SubjectDN",
                PdfObject::Array(PdfArray(vec![PdfObject::Dictionary(dn_dict)])),
            );
        }
        if let Some(issuers) = &self.issuers {
            result.insert("Issuer", cert_array(issuers)?);
        }
        if let Some(url) = &self.info_url {
            result.insert("URL", PdfObject::string(url.as_bytes().to_vec()));
            result.insert("URLType", PdfObject::name(self.url_type.clone()));
        }
        Ok(result)
    }

    /// Checks the constraints against a signer certificate and its
    /// validation path. Assumes key usage and trust checks have passed
    /// already.
    pub fn satisfied_by(
        &self,
        signer: &Certificate,
        validation_path: Option<&[Certificate]>,
    ) -> Result<()> {
        let flags = self.flags;
        if flags.contains(SigCertConstraintFlags::SUBJECT) {
            if let Some(subjects) = &self.subjects {
                // explicit whitelist of approved signers, by issuer-serial
                let signer_key = IssuerSerial::from_cert(signer)?;
                let acceptable = subjects
                    .iter()
                    .map(IssuerSerial::from_cert)
                    .collect::<Result<Vec<_>>>()?;
                if !acceptable.contains(&signer_key) {
                    return Err(ValidationError::UnacceptableSigner(
                        "signer certificate not on SVCert whitelist".to_string(),
                    ));
                }
            }
        }
        if flags.contains(SigCertConstraintFlags::ISSUER) {
            if let Some(issuers) = &self.issuers {
                let Some(path) = validation_path else {
                    return Err(ValidationError::UnacceptableSigner(
                        "validation path not provided".to_string(),
                    ));
                };
                // every certificate in the chain except the signer itself
                let chain = &path[..path.len().saturating_sub(1)];
                let chain_keys = chain
                    .iter()
                    .map(IssuerSerial::from_cert)
                    .collect::<Result<Vec<_>>>()?;
                let matched = issuers.iter().try_fold(false, |found, issuer| {
                    Ok::<_, ValidationError>(
                        found || chain_keys.contains(&IssuerSerial::from_cert(issuer)?),
                    )
                })?;
                if !matched {
                    return Err(ValidationError::UnacceptableSigner(
                        "signer certificate cannot be traced back to approved issuer"
                            .to_string(),
                    ));
                }
            }
        }
        if flags.contains(SigCertConstraintFlags::SUBJECT_DN) {
            if let Some(required) = &self.subject_dn {
                let subject_pairs = name_keyval_pairs(&signer.tbs_certificate.subject);
                let missing = required
                    .iter()
                    .any(|pair| !subject_pairs.contains(pair));
                if missing {
                    return Err(ValidationError::UnacceptableSigner(
                        "subject does not have all required attributes".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn parse_cert_array(dict: &PdfDictionary, key: &str) -> Result<Option<Vec<Certificate>>> {
    let Some(arr) = dict.get_array(key) else {
        return Ok(None);
    };
    let mut certs = Vec::new();
    for entry in arr.iter() {
        let PdfObject::String(der_bytes) = entry else {
            return Err(ValidationError::Structural(format!(
                "/{key} entries must be byte strings"
            )));
        };
        let cert = Certificate::from_der(der_bytes.as_bytes()).map_err(|e| {
            ValidationError::Structural(format!("bad certificate in /{key}: {e}"))
        })?;
        certs.push(cert);
    }
    Ok(if certs.is_empty() { None } else { Some(certs) })
}

fn cert_array(certs: &[Certificate]) -> Result<PdfObject> {
    let mut arr = PdfArray::new();
    for cert in certs {
        arr.push(PdfObject::string(cert.to_der()?));
    }
    Ok(PdfObject::Array(arr))
}

/// A parsed seed value dictionary (`/SV`), cf. Table 234 in ISO 32000-1
#[derive(Debug, Clone, Default)]
pub struct SigSeedValueSpec {
    /// Which constraints are mandatory
    pub flags: SigSeedValFlags,
    /// Acceptable signing reasons; `["."]` prohibits giving a reason
    pub reasons: Option<Vec<String>>,
    /// Timestamp server to use when signing
    pub timestamp_server_url: Option<String>,
    /// Whether a trusted timestamp is required
    pub timestamp_required: bool,
    /// Certificate constraints
    pub cert: Option<SigCertConstraints>,
    /// Acceptable subfilters, in order of preference
    pub subfilters: Option<Vec<SigSeedSubFilter>>,
    /// Acceptable digest methods, lowercase
    pub digest_methods: Option<Vec<String>>,
    /// Whether revocation information must be embedded Adobe-style
    pub add_rev_info: Option<bool>,
}

impl SigSeedValueSpec {
    /// Reads a `/SV` dictionary
    pub fn from_pdf_object(dict: &PdfDictionary) -> Result<Self> {
        if let Some(ty) = dict.get_type() {
            if ty != "SV" {
                warn!("/SV dictionary has /Type {ty}, accepting anyway");
            }
        }
        let flags = SigSeedValFlags::from_bits_truncate(dict.get_int("Ff").unwrap_or(0) as u32);

        if let Some(filter) = dict.get_name("Filter") {
            if flags.contains(SigSeedValFlags::FILTER) && filter != "Adobe.PPKLite" {
                return Err(ValidationError::Unsupported(format!(
                    "signature handler '{filter}' is not available, only the default \
                     Adobe.PPKLite is supported"
                )));
            }
        }

        let min_version = dict.get_int("V").unwrap_or(1);
        if flags.contains(SigSeedValFlags::V) && min_version > 1 {
            return Err(ValidationError::Unsupported(format!(
                "seed value dictionary version {min_version} not supported"
            )));
        }

        let add_rev_info = dict.get_bool("AddRevInfo");

        let subfilters = dict.get_array("SubFilter").map(|arr| {
            arr.iter()
                .filter_map(|entry| match entry {
                    PdfObject::Name(name) => SigSeedSubFilter::from_name(name.as_str()),
                    _ => None,
                })
                .collect()
        });

        let digest_methods = dict.get_array("DigestMethod").map(|arr| {
            arr.iter()
                .filter_map(|entry| match entry {
                    PdfObject::String(s) => Some(s.to_string_lossy().to_lowercase()),
                    _ => None,
                })
                .collect()
        });

        let reasons = dict.get_array("Reasons").map(|arr| {
            arr.iter()
                .filter_map(|entry| match entry {
                    PdfObject::String(s) => Some(s.to_string_lossy()),
                    _ => None,
                })
                .collect()
        });

        let timestamp_dict = dict.get_dict("TimeStamp");
        let timestamp_server_url = timestamp_dict
            .and_then(|ts| ts.get_string("URL"))
            .map(|s| s.to_string_lossy());
        let timestamp_required = timestamp_dict
            .and_then(|ts| ts.get_int("Ff"))
            .unwrap_or(0)
            != 0;

        let cert = match dict.get_dict("Cert") {
            Some(cert_dict) => Some(SigCertConstraints::from_pdf_object(cert_dict)?),
            None => None,
        };

        Ok(Self {
            flags,
            reasons,
            timestamp_server_url,
            timestamp_required,
            cert,
            subfilters,
            digest_methods,
            add_rev_info,
        })
    }

    /// Serializes back to a `/SV` dictionary
    pub fn as_pdf_object(&self) -> Result<PdfDictionary> {
        let mut result = PdfDictionary::new();
        result.insert("Type", PdfObject::name("SV"));
        result.insert("Ff", PdfObject::Integer(self.flags.bits() as i64));

        if let Some(subfilters) = &self.subfilters {
            result.insert(
                "SubFilter",
                PdfObject::Array(
                    subfilters
                        .iter()
                        .map(|sf| PdfObject::name(sf.as_name()))
                        .collect(),
                ),
            );
        }
        if let Some(add_rev_info) = self.add_rev_info {
            result.insert("AddRevInfo", PdfObject::Boolean(add_rev_info));
        }
        if let Some(digest_methods) = &self.digest_methods {
            result.insert(
                "DigestMethod",
                PdfObject::Array(
                    digest_methods
                        .iter()
                        .map(|md| PdfObject::string(md.as_bytes().to_vec()))
                        .collect(),
                ),
            );
        }
        if let Some(reasons) = &self.reasons {
            result.insert(
                "Reasons",
                PdfObject::Array(
                    reasons
                        .iter()
                        .map(|reason| PdfObject::string(reason.as_bytes().to_vec()))
                        .collect(),
                ),
            );
        }
        if let Some(url) = &self.timestamp_server_url {
            let mut ts = PdfDictionary::new();
            ts.insert("URL", PdfObject::string(url.as_bytes().to_vec()));
            ts.insert(
                "Ff",
                PdfObject::Integer(if self.timestamp_required { 1 } else { 0 }),
            );
            result.insert("TimeStamp", PdfObject::Dictionary(ts));
        }
        if let Some(cert) = &self.cert {
            result.insert("Cert", PdfObject::Dictionary(cert.as_pdf_object()?));
        }
        Ok(result)
    }
}

/// `/Action` selector of a field lock dictionary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMDPAction {
    /// Lock all form fields
    All,
    /// Lock the listed fields
    Include,
    /// Lock everything except the listed fields
    Exclude,
}

impl FieldMDPAction {
    /// The PDF name, without the leading slash
    pub fn as_name(self) -> &'static str {
        match self {
            FieldMDPAction::All => "All",
            FieldMDPAction::Include => "Include",
            FieldMDPAction::Exclude => "Exclude",
        }
    }

    /// Parses an `/Action` name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "All" => Some(FieldMDPAction::All),
            "Include" => Some(FieldMDPAction::Include),
            "Exclude" => Some(FieldMDPAction::Exclude),
            _ => None,
        }
    }
}

/// A FieldMDP policy: which form fields a signature locks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMDPSpec {
    /// Lock action
    pub action: FieldMDPAction,
    /// Field names the action refers to; `None` for `/All`
    pub fields: Option<Vec<String>>,
}

impl FieldMDPSpec {
    /// Serializes the policy core (`/Action` plus `/Fields`)
    pub fn as_pdf_object(&self) -> PdfDictionary {
        let mut result = PdfDictionary::new();
        result.insert("Action", PdfObject::name(self.action.as_name()));
        if self.action != FieldMDPAction::All {
            result.insert(
                "Fields",
                PdfObject::Array(
                    self.fields
                        .iter()
                        .flatten()
                        .map(|f| PdfObject::string(f.as_bytes().to_vec()))
                        .collect(),
                ),
            );
        }
        result
    }

    /// Serializes as FieldMDP transform parameters
    pub fn as_transform_params(&self) -> PdfDictionary {
        let mut result = self.as_pdf_object();
        result.insert("Type", PdfObject::name("TransformParams"));
        result.insert("V", PdfObject::name("1.2"));
        result
    }

    /// Serializes as a signature field lock dictionary
    pub fn as_sig_field_lock(&self) -> PdfDictionary {
        let mut result = self.as_pdf_object();
        result.insert("Type", PdfObject::name("SigFieldLock"));
        result
    }

    /// Reads a field lock or transform params dictionary
    pub fn from_pdf_object(dict: &PdfDictionary) -> Result<Self> {
        let action = dict
            .get_name("Action")
            .and_then(FieldMDPAction::from_name)
            .ok_or_else(|| ValidationError::Structural("/Action is required".to_string()))?;
        let fields = if action != FieldMDPAction::All {
            let arr = dict.get_array("Fields").ok_or_else(|| {
                ValidationError::Structural(
                    "/Fields is required when /Action is not /All".to_string(),
                )
            })?;
            Some(
                arr.iter()
                    .filter_map(|entry| match entry {
                        PdfObject::String(s) => Some(s.to_string_lossy()),
                        _ => None,
                    })
                    .collect(),
            )
        } else {
            None
        };
        Ok(Self { action, fields })
    }
}

/// One signature field found in the form tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigFieldEntry {
    /// Fully qualified-enough field name (`/T`)
    pub name: String,
    /// The `/V` signature object reference, if the field is filled
    pub value: Option<ObjectId>,
    /// Reference of the field dictionary itself
    pub field_ref: ObjectId,
}

/// Enumerates signature fields in the document's form at a revision.
///
/// With `filled_status` set, only filled (`Some(true)`) or empty
/// (`Some(false)`) fields are returned.
pub fn enumerate_sig_fields(
    reader: &RevisionReader,
    revision: usize,
    filled_status: Option<bool>,
) -> Result<Vec<SigFieldEntry>> {
    let (_, root) = reader.root(revision)?;
    let resolver = reader.resolver(revision);
    let Some(acroform_raw) = root.get("AcroForm") else {
        return Ok(Vec::new());
    };
    let acroform = resolver
        .resolve_value(acroform_raw)?
        .as_dict()
        .ok_or_else(|| ValidationError::Structural("/AcroForm is not a dictionary".to_string()))?;
    let Some(fields_raw) = acroform.get("Fields") else {
        return Ok(Vec::new());
    };
    let fields = resolver
        .resolve_value(fields_raw)?
        .as_array()
        .ok_or_else(|| ValidationError::Structural("/Fields is not an array".to_string()))?;
    let mut out = Vec::new();
    enumerate_sig_fields_in(&resolver, fields, filled_status, None, &mut out)?;
    Ok(out)
}

/// Walks a `/Fields` array (recursing into `/Kids`) collecting signature
/// fields. `with_name` restricts the search to one field name; hitting a
/// non-signature field of that name is an error.
pub fn enumerate_sig_fields_in(
    resolver: &HistoricalResolver<'_>,
    field_list: &PdfArray,
    filled_status: Option<bool>,
    with_name: Option<&str>,
    out: &mut Vec<SigFieldEntry>,
) -> Result<()> {
    for field_raw in field_list.iter() {
        let Some(field_ref) = field_raw.as_reference() else {
            return Err(ValidationError::Structural(
                "field array entries must be indirect references".to_string(),
            ));
        };
        let field = resolver.resolve_dict(field_ref)?;
        // no /T means a bare widget; those do not belong in /Fields, skip
        let Some(name) = field.get_string("T") else {
            continue;
        };
        let name = name.to_string_lossy();
        if field.get_name("FT") == Some("Sig") {
            let value = field.get("V").and_then(PdfObject::as_reference);
            let filled = field.contains_key("V");
            let status_check = filled_status.map(|want| filled == want).unwrap_or(true);
            let name_check = with_name.map(|want| want == name).unwrap_or(true);
            if status_check && name_check {
                out.push(SigFieldEntry {
                    name: name.clone(),
                    value,
                    field_ref,
                });
            }
        } else if with_name == Some(name.as_str()) {
            return Err(ValidationError::Structural(format!(
                "field with name {name} exists but is not a signature field"
            )));
        }
        if let Some(kids_raw) = field.get("Kids") {
            if let Some(kids) = resolver.resolve_value(kids_raw)?.as_array() {
                enumerate_sig_fields_in(resolver, kids, filled_status, with_name, out)?;
            }
        }
    }
    Ok(())
}
