//! Builders for end-to-end validation scenarios: RSA keys, certificates,
//! CMS blobs and synthetic signed documents.

#![allow(dead_code)]

use cms::cert::{CertificateChoices, IssuerAndSerialNumber};
use cms::content_info::{CmsVersion, ContentInfo};
use cms::signed_data::{
    CertificateSet, EncapsulatedContentInfo, SignedData, SignerIdentifier, SignerInfo,
    SignerInfos,
};
use const_oid::ObjectIdentifier;
use der::asn1::{Any, BitString, GeneralizedTime, OctetString, SetOfVec};
use der::{Decode, Encode, Tag};
use oxidize_sigval::objects::{ObjectId, PdfArray, PdfDictionary, PdfObject, PdfStream};
use oxidize_sigval::reader::RevisionReader;
use oxidize_sigval::trust::{
    CertificatePathValidator, KeyUsagePolicy, PathValidationFailure, ValidationContext,
};
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::EncodePublicKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;
use x509_cert::attr::Attribute;
use x509_cert::certificate::{TbsCertificate, Version};
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::time::{Time, Validity};
use x509_cert::Certificate;

pub const OID_SIGNED_DATA: &str = "1.2.840.113549.1.7.2";
pub const OID_ID_DATA: &str = "1.2.840.113549.1.7.1";
pub const OID_MESSAGE_DIGEST: &str = "1.2.840.113549.1.9.4";
pub const OID_SIGNING_TIME: &str = "1.2.840.113549.1.9.5";
pub const OID_TIMESTAMP_TOKEN: &str = "1.2.840.113549.1.9.16.2.14";
pub const OID_TST_INFO: &str = "1.2.840.113549.1.9.16.1.4";
pub const OID_ADOBE_REVINFO: &str = "1.2.840.113583.1.1.8";
pub const OID_SHA256: &str = "2.16.840.1.101.3.4.2.1";
pub const OID_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";

/// One RSA key for the whole suite; generation is the slow part
pub fn test_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| {
        RsaPrivateKey::new(&mut rand::thread_rng(), 2048).expect("RSA key generation")
    })
}

pub fn oid(s: &str) -> ObjectIdentifier {
    ObjectIdentifier::new(s).expect("OID literal")
}

pub fn sha256(chunks: &[&[u8]]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    for chunk in chunks {
        hasher.update(chunk);
    }
    hasher.finalize().to_vec()
}

/// A certificate carrying the suite's real RSA public key
pub fn make_cert(subject: &str, issuer: &str, serial: u8) -> Certificate {
    let spki_der = RsaPublicKey::from(test_key())
        .to_public_key_der()
        .expect("SPKI encoding");
    let spki = SubjectPublicKeyInfoOwned::from_der(spki_der.as_bytes()).expect("SPKI decoding");
    let signature_algorithm = AlgorithmIdentifierOwned {
        oid: oid("1.2.840.113549.1.1.11"),
        parameters: None,
    };
    let validity = Validity {
        not_before: Time::UtcTime(
            der::asn1::UtcTime::from_unix_duration(Duration::from_secs(1_500_000_000))
                .expect("validity start"),
        ),
        not_after: Time::UtcTime(
            der::asn1::UtcTime::from_unix_duration(Duration::from_secs(2_500_000_000))
                .expect("validity end"),
        ),
    };
    Certificate {
        tbs_certificate: TbsCertificate {
            version: Version::V3,
            serial_number: SerialNumber::new(&[serial]).expect("serial"),
            signature: signature_algorithm.clone(),
            issuer: Name::from_str(issuer).expect("issuer DN"),
            validity,
            subject: Name::from_str(subject).expect("subject DN"),
            subject_public_key_info: spki,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: None,
        },
        signature_algorithm,
        signature: BitString::from_bytes(&[0u8]).expect("placeholder"),
    }
}

/// A CMS attribute with a single value
pub fn attribute(attr_oid: &str, value: Any) -> Attribute {
    let mut values = SetOfVec::new();
    values.insert(value).expect("attribute value");
    Attribute {
        oid: oid(attr_oid),
        values,
    }
}

/// Assembles and signs a single-signer SignedData, returning the
/// ContentInfo DER (what goes into `/Contents`).
pub fn build_cms(
    signer_cert: &Certificate,
    ca_chain: &[Certificate],
    message_digest: &[u8],
    econtent: Option<(&str, &[u8])>,
    extra_signed_attrs: Vec<Attribute>,
    unsigned_attrs: Vec<Attribute>,
) -> Vec<u8> {
    let mut signed_attrs: SetOfVec<Attribute> = SetOfVec::new();
    let digest_value =
        Any::encode_from(&OctetString::new(message_digest.to_vec()).expect("digest octets"))
            .expect("digest value");
    signed_attrs
        .insert(attribute(OID_MESSAGE_DIGEST, digest_value))
        .expect("message digest attribute");
    for attr in extra_signed_attrs {
        signed_attrs.insert(attr).expect("signed attribute");
    }

    // the signature is computed over the SET OF encoding of the attributes
    let signed_blob = signed_attrs.to_der().expect("signed attrs DER");
    let signing_key = SigningKey::<Sha256>::new(test_key().clone());
    let signature = signing_key.sign(&signed_blob);

    let digest_alg = AlgorithmIdentifierOwned {
        oid: oid(OID_SHA256),
        parameters: None,
    };
    let signer_info = SignerInfo {
        version: CmsVersion::V1,
        sid: SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
            issuer: signer_cert.tbs_certificate.issuer.clone(),
            serial_number: signer_cert.tbs_certificate.serial_number.clone(),
        }),
        digest_alg: digest_alg.clone(),
        signed_attrs: Some(signed_attrs),
        signature_algorithm: AlgorithmIdentifierOwned {
            oid: oid(OID_RSA_ENCRYPTION),
            parameters: None,
        },
        signature: OctetString::new(signature.to_vec()).expect("signature octets"),
        unsigned_attrs: if unsigned_attrs.is_empty() {
            None
        } else {
            let mut set = SetOfVec::new();
            for attr in unsigned_attrs {
                set.insert(attr).expect("unsigned attribute");
            }
            Some(set)
        },
    };

    let mut digest_algorithms = SetOfVec::new();
    digest_algorithms.insert(digest_alg).expect("digest algs");
    let mut cert_set = SetOfVec::new();
    cert_set
        .insert(CertificateChoices::Certificate(signer_cert.clone()))
        .expect("signer cert");
    for cert in ca_chain {
        cert_set
            .insert(CertificateChoices::Certificate(cert.clone()))
            .expect("chain cert");
    }
    let mut signer_infos = SetOfVec::new();
    signer_infos.insert(signer_info).expect("signer info");

    let (econtent_type, econtent_any) = match econtent {
        Some((type_oid, bytes)) => (
            oid(type_oid),
            Some(Any::new(Tag::OctetString, bytes.to_vec()).expect("econtent")),
        ),
        None => (oid(OID_ID_DATA), None),
    };

    let signed_data = SignedData {
        version: CmsVersion::V1,
        digest_algorithms,
        encap_content_info: EncapsulatedContentInfo {
            econtent_type,
            econtent: econtent_any,
        },
        certificates: Some(CertificateSet(cert_set)),
        crls: None,
        signer_infos: SignerInfos(signer_infos),
    };

    let content_info = ContentInfo {
        content_type: oid(OID_SIGNED_DATA),
        content: Any::encode_from(&signed_data).expect("SignedData content"),
    };
    content_info.to_der().expect("ContentInfo DER")
}

fn der_length(len: usize) -> Vec<u8> {
    if len < 128 {
        vec![len as u8]
    } else if len < 256 {
        vec![0x81, len as u8]
    } else {
        vec![0x82, (len >> 8) as u8, (len & 0xff) as u8]
    }
}

fn der_sequence(parts: &[Vec<u8>]) -> Vec<u8> {
    let content: Vec<u8> = parts.iter().flatten().copied().collect();
    let mut out = vec![0x30];
    out.extend(der_length(content.len()));
    out.extend(content);
    out
}

/// A minimal RFC 3161 TSTInfo with the given genTime
pub fn build_tst_info(gen_time_secs: u64) -> Vec<u8> {
    let algorithm = AlgorithmIdentifierOwned {
        oid: oid(OID_SHA256),
        parameters: None,
    };
    let imprint = der_sequence(&[
        algorithm.to_der().expect("imprint alg"),
        OctetString::new(vec![0u8; 32])
            .expect("imprint digest")
            .to_der()
            .expect("imprint DER"),
    ]);
    der_sequence(&[
        1u8.to_der().expect("version"),
        oid("1.2.3.4.1").to_der().expect("policy"),
        imprint,
        42u8.to_der().expect("serial"),
        GeneralizedTime::from_unix_duration(Duration::from_secs(gen_time_secs))
            .expect("genTime")
            .to_der()
            .expect("genTime DER"),
    ])
}

/// A timestamp token (as an unsigned attribute) signed by `tsa_cert`
pub fn build_timestamp_attr(tsa_cert: &Certificate, gen_time_secs: u64) -> Attribute {
    let tst_der = build_tst_info(gen_time_secs);
    let token_der = build_cms(
        tsa_cert,
        &[],
        &sha256(&[&tst_der]),
        Some((OID_TST_INFO, &tst_der)),
        Vec::new(),
        Vec::new(),
    );
    let content_info = ContentInfo::from_der(&token_der).expect("token reparse");
    attribute(
        OID_TIMESTAMP_TOKEN,
        Any::encode_from(&content_info).expect("token attr value"),
    )
}

/// `part1 <hex cms> part2` plus the matching 4-element byte range
pub fn signed_file(part1: &[u8], cms_der: &[u8], part2: &[u8]) -> (Vec<u8>, Vec<i64>) {
    let mut data = part1.to_vec();
    data.push(b'<');
    data.extend(hex::encode(cms_der).into_bytes());
    data.push(b'>');
    data.extend_from_slice(part2);
    let byte_range = vec![
        0,
        part1.len() as i64,
        (part1.len() + 2 * cms_der.len() + 2) as i64,
        part2.len() as i64,
    ];
    (data, byte_range)
}

pub fn trailer() -> PdfDictionary {
    let mut trailer = PdfDictionary::new();
    trailer.insert("Root", PdfObject::reference(1, 0));
    trailer
}

/// Builds the signed revision of a one-page document with one signature
/// field (object 5, value object 6) and optionally an empty text field
/// (object 7) and a pre-populated DSS (objects 8, 9...).
pub struct DocBuilder {
    pub subfilter: &'static str,
    pub docmdp: Option<i64>,
    pub seed_value: Option<PdfDictionary>,
    pub with_text_field: bool,
    pub dss_certs: Vec<Vec<u8>>,
    pub startxref: u64,
    pub container: (u64, u64),
}

impl Default for DocBuilder {
    fn default() -> Self {
        Self {
            subfilter: "adbe.pkcs7.detached",
            docmdp: None,
            seed_value: None,
            with_text_field: false,
            dss_certs: Vec::new(),
            startxref: 0,
            container: (0, 0),
        }
    }
}

impl DocBuilder {
    /// Returns the reader and a copy of the signature field dictionary
    pub fn build(
        &self,
        file: Vec<u8>,
        byte_range: &[i64],
        cms_der: &[u8],
    ) -> (RevisionReader, PdfDictionary) {
        let mut reader = RevisionReader::new(file);
        reader.begin_revision(trailer(), self.startxref, self.container);

        let mut catalog = PdfDictionary::new();
        catalog.insert("Type", PdfObject::name("Catalog"));
        catalog.insert("Pages", PdfObject::reference(2, 0));
        catalog.insert("AcroForm", PdfObject::reference(3, 0));
        if !self.dss_certs.is_empty() {
            catalog.insert("DSS", PdfObject::reference(8, 0));
        }
        reader
            .put_object(ObjectId::new(1, 0), PdfObject::Dictionary(catalog))
            .unwrap();

        let mut pages = PdfDictionary::new();
        pages.insert("Type", PdfObject::name("Pages"));
        pages.insert(
            "Kids",
            PdfObject::Array(PdfArray(vec![PdfObject::reference(4, 0)])),
        );
        reader
            .put_object(ObjectId::new(2, 0), PdfObject::Dictionary(pages))
            .unwrap();

        let mut page = PdfDictionary::new();
        page.insert("Type", PdfObject::name("Page"));
        page.insert("Parent", PdfObject::reference(2, 0));
        page.insert(
            "Annots",
            PdfObject::Array(PdfArray(vec![PdfObject::reference(5, 0)])),
        );
        reader
            .put_object(ObjectId::new(4, 0), PdfObject::Dictionary(page))
            .unwrap();

        let mut field_refs = vec![PdfObject::reference(5, 0)];
        if self.with_text_field {
            field_refs.push(PdfObject::reference(7, 0));
        }
        let mut acroform = PdfDictionary::new();
        acroform.insert("Fields", PdfObject::Array(PdfArray(field_refs)));
        reader
            .put_object(ObjectId::new(3, 0), PdfObject::Dictionary(acroform))
            .unwrap();

        let mut sig_field = PdfDictionary::new();
        sig_field.insert("T", PdfObject::string(b"Sig1".to_vec()));
        sig_field.insert("FT", PdfObject::name("Sig"));
        sig_field.insert("V", PdfObject::reference(6, 0));
        sig_field.insert(
            "Rect",
            PdfObject::Array(PdfArray(vec![
                PdfObject::Integer(0),
                PdfObject::Integer(0),
                PdfObject::Integer(0),
                PdfObject::Integer(0),
            ])),
        );
        if let Some(sv) = &self.seed_value {
            sig_field.insert("SV", PdfObject::Dictionary(sv.clone()));
        }
        reader
            .put_object(ObjectId::new(5, 0), PdfObject::Dictionary(sig_field.clone()))
            .unwrap();

        let mut sig_object = PdfDictionary::new();
        sig_object.insert("Type", PdfObject::name("Sig"));
        sig_object.insert("Filter", PdfObject::name("Adobe.PPKLite"));
        sig_object.insert("SubFilter", PdfObject::name(self.subfilter));
        sig_object.insert("Contents", PdfObject::string(cms_der.to_vec()));
        sig_object.insert(
            "ByteRange",
            PdfObject::Array(byte_range.iter().map(|&n| PdfObject::Integer(n)).collect()),
        );
        if let Some(perm) = self.docmdp {
            let mut params = PdfDictionary::new();
            params.insert("Type", PdfObject::name("TransformParams"));
            params.insert("P", PdfObject::Integer(perm));
            let mut transform = PdfDictionary::new();
            transform.insert("TransformMethod", PdfObject::name("DocMDP"));
            transform.insert("TransformParams", PdfObject::Dictionary(params));
            sig_object.insert(
                "Reference",
                PdfObject::Array(PdfArray(vec![PdfObject::Dictionary(transform)])),
            );
        }
        reader
            .put_object(ObjectId::new(6, 0), PdfObject::Dictionary(sig_object))
            .unwrap();

        if self.with_text_field {
            let mut text_field = PdfDictionary::new();
            text_field.insert("T", PdfObject::string(b"Comments".to_vec()));
            text_field.insert("FT", PdfObject::name("Tx"));
            reader
                .put_object(ObjectId::new(7, 0), PdfObject::Dictionary(text_field))
                .unwrap();
        }

        if !self.dss_certs.is_empty() {
            let mut cert_refs = PdfArray::new();
            for (index, cert_der) in self.dss_certs.iter().enumerate() {
                let stream_id = ObjectId::new(9 + index as u32, 0);
                cert_refs.push(PdfObject::Reference(stream_id));
                reader
                    .put_object(stream_id, PdfObject::Stream(PdfStream::new(cert_der.clone())))
                    .unwrap();
            }
            let mut dss = PdfDictionary::new();
            dss.insert("Certs", PdfObject::Array(cert_refs));
            reader
                .put_object(ObjectId::new(8, 0), PdfObject::Dictionary(dss))
                .unwrap();
        }

        (reader, sig_field)
    }
}

/// Path validator stub with a scripted verdict
pub struct StubValidator {
    pub verdict: Verdict,
}

pub enum Verdict {
    Accept,
    Revoked,
    PathBuilding,
}

impl CertificatePathValidator for StubValidator {
    fn validate_usage(
        &self,
        signer: &Certificate,
        intermediates: &[Certificate],
        _context: &ValidationContext,
        _policy: &KeyUsagePolicy,
    ) -> Result<Vec<Certificate>, PathValidationFailure> {
        match self.verdict {
            Verdict::Accept => {
                let mut path = intermediates.to_vec();
                path.push(signer.clone());
                Ok(path)
            }
            Verdict::Revoked => Err(PathValidationFailure::Revoked(
                "scripted revocation".to_string(),
            )),
            Verdict::PathBuilding => Err(PathValidationFailure::PathBuilding(
                "no path to trust anchor".to_string(),
            )),
        }
    }
}
