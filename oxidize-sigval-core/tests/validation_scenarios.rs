//! End-to-end validation scenarios over synthetic signed documents

mod common;

use common::*;
use der::asn1::Any;
use der::Encode;
use oxidize_sigval::cms::RevocationInfoArchival;
use oxidize_sigval::coverage::SignatureCoverageLevel;
use oxidize_sigval::diff::ModificationLevel;
use oxidize_sigval::fields::{SigSeedValFlags, SigSeedValueSpec, SigSeedSubFilter};
use oxidize_sigval::objects::{ObjectId, PdfDictionary, PdfObject, PdfStream};
use oxidize_sigval::trust::ValidationContext;
use oxidize_sigval::validation::{
    validate_pdf_ltv_signature, validate_pdf_signature, RevocationInfoValidationType,
};

const PART1: &[u8] = b"%PDF-1.7\nsome object definitions before the signature ";
const PART2_PLAIN: &[u8] = b"\nmore objects, the xref table, and the trailer\n%%EOF\n";
// ends in a startxref trailer so the signed revision can be verified
const PART2_ANCHORED: &[u8] = b"\nxref trailer goes here\nstartxref\n42\n%%EOF\n";

fn accept() -> StubValidator {
    StubValidator {
        verdict: Verdict::Accept,
    }
}

/// A complete single-revision document: CMS blob over the whole file
fn clean_document(
    builder: DocBuilder,
    extra_signed_attrs: Vec<x509_cert::attr::Attribute>,
    unsigned_attrs: Vec<x509_cert::attr::Attribute>,
) -> (oxidize_sigval::reader::RevisionReader, PdfDictionary) {
    let signer = make_cert("CN=Alice,O=ACME", "CN=Test CA", 1);
    let ca = make_cert("CN=Test CA", "CN=Test Root", 7);
    let digest = sha256(&[PART1, PART2_PLAIN]);
    let cms_der = build_cms(
        &signer,
        &[ca],
        &digest,
        None,
        extra_signed_attrs,
        unsigned_attrs,
    );
    let (file, byte_range) = signed_file(PART1, &cms_der, PART2_PLAIN);
    builder.build(file, &byte_range, &cms_der)
}

#[test]
fn clean_entire_file_validates() {
    let (reader, sig_field) = clean_document(DocBuilder::default(), Vec::new(), Vec::new());
    let status = validate_pdf_signature(
        &reader,
        &sig_field,
        &accept(),
        &ValidationContext::new(),
        None,
    )
    .unwrap();

    assert!(status.status.intact);
    assert!(status.status.valid);
    assert!(status.status.trusted);
    assert!(!status.status.revoked);
    assert!(status.status.usage_ok);
    assert_eq!(status.coverage, SignatureCoverageLevel::EntireFile);
    assert_eq!(status.modification_level, ModificationLevel::None);
    assert!(status.docmdp_ok);
    assert!(status.seed_value_ok);
    assert!(status.bottom_line());
    assert_eq!(status.summary(), "INTACT:TRUSTED,USAGE_OK,UNTOUCHED");
    assert_eq!(status.status.pkcs7_signature_mechanism, "rsassa_pkcs1v15");
    assert_eq!(status.status.md_algorithm, "sha256");
    assert_eq!(status.status.ca_chain.len(), 1);
}

#[test]
fn validation_is_a_pure_function_of_its_inputs() {
    let (reader, sig_field) = clean_document(DocBuilder::default(), Vec::new(), Vec::new());
    let first = validate_pdf_signature(
        &reader,
        &sig_field,
        &accept(),
        &ValidationContext::new(),
        None,
    )
    .unwrap();
    let second = validate_pdf_signature(
        &reader,
        &sig_field,
        &accept(),
        &ValidationContext::new(),
        None,
    )
    .unwrap();
    assert_eq!(first.summary(), second.summary());
    assert_eq!(first.coverage, second.coverage);
    assert_eq!(first.modification_level, second.modification_level);
    assert_eq!(first.status.intact, second.status.intact);
    assert_eq!(first.status.valid, second.status.valid);
    assert_eq!(first.signed_dt, second.signed_dt);
}

#[test]
fn tampered_byte_range_is_not_intact() {
    let signer = make_cert("CN=Alice,O=ACME", "CN=Test CA", 1);
    let digest = sha256(&[PART1, PART2_PLAIN]);
    let cms_der = build_cms(&signer, &[], &digest, None, Vec::new(), Vec::new());
    let (mut file, byte_range) = signed_file(PART1, &cms_der, PART2_PLAIN);
    // flip one covered byte after signing
    file[3] ^= 0xff;
    let (reader, sig_field) = DocBuilder::default().build(file, &byte_range, &cms_der);
    let status = validate_pdf_signature(
        &reader,
        &sig_field,
        &accept(),
        &ValidationContext::new(),
        None,
    )
    .unwrap();
    assert!(!status.status.intact);
    assert!(!status.status.valid);
    assert_eq!(status.summary(), "INVALID");
}

#[test]
fn untrusted_and_revoked_signers_are_reported() {
    let (reader, sig_field) = clean_document(DocBuilder::default(), Vec::new(), Vec::new());
    let status = validate_pdf_signature(
        &reader,
        &sig_field,
        &StubValidator {
            verdict: Verdict::PathBuilding,
        },
        &ValidationContext::new(),
        None,
    )
    .unwrap();
    assert!(status.status.valid);
    assert!(!status.status.trusted);
    assert_eq!(status.summary(), "INTACT:UNTRUSTED,UNTOUCHED");

    let status = validate_pdf_signature(
        &reader,
        &sig_field,
        &StubValidator {
            verdict: Verdict::Revoked,
        },
        &ValidationContext::new(),
        None,
    )
    .unwrap();
    assert!(status.status.revoked);
    assert!(status.summary().starts_with("INTACT:REVOKED"));
}

/// Builds a two-revision document whose signature covers exactly the first
/// revision; the closure appends the second revision's objects.
fn extended_document(
    builder: DocBuilder,
    extend: impl FnOnce(&mut oxidize_sigval::reader::RevisionReader),
) -> (oxidize_sigval::reader::RevisionReader, PdfDictionary) {
    let signer = make_cert("CN=Alice,O=ACME", "CN=Test CA", 1);
    let ca = make_cert("CN=Test CA", "CN=Test Root", 7);
    let digest = sha256(&[PART1, PART2_ANCHORED]);
    let cms_der = build_cms(&signer, &[ca], &digest, None, Vec::new(), Vec::new());
    let (mut file, byte_range) = signed_file(PART1, &cms_der, PART2_ANCHORED);
    let signed_zone = file.len() as u64;
    file.extend_from_slice(b"objects of the second revision\nstartxref\n900\n%%EOF\n");

    let mut builder = builder;
    builder.startxref = 42;
    builder.container = (4, signed_zone - 10);
    let (mut reader, sig_field) = builder.build(file, &byte_range, &cms_der);
    reader.begin_revision(trailer(), 900, (signed_zone + 2, signed_zone + 20));
    extend(&mut reader);
    (reader, sig_field)
}

#[test]
fn form_fill_under_fill_forms_permission() {
    let builder = DocBuilder {
        with_text_field: true,
        docmdp: Some(2),
        ..DocBuilder::default()
    };
    let (reader, sig_field) = extended_document(builder, |reader| {
        let mut filled = PdfDictionary::new();
        filled.insert("T", PdfObject::string(b"Comments".to_vec()));
        filled.insert("FT", PdfObject::name("Tx"));
        filled.insert("V", PdfObject::string(b"looks good".to_vec()));
        let mut ap = PdfDictionary::new();
        ap.insert("N", PdfObject::reference(20, 0));
        filled.insert("AP", PdfObject::Dictionary(ap));
        reader
            .put_object(ObjectId::new(7, 0), PdfObject::Dictionary(filled))
            .unwrap();
        reader
            .put_object(
                ObjectId::new(20, 0),
                PdfObject::Stream(PdfStream::new(b"appearance stream".to_vec())),
            )
            .unwrap();
    });

    let status = validate_pdf_signature(
        &reader,
        &sig_field,
        &accept(),
        &ValidationContext::new(),
        None,
    )
    .unwrap();
    assert!(status.status.intact && status.status.valid);
    assert_eq!(status.coverage, SignatureCoverageLevel::EntireRevision);
    assert_eq!(status.modification_level, ModificationLevel::FormFilling);
    assert!(status.docmdp_ok);
    assert!(status.bottom_line());
    assert!(status.summary().contains("EXTENDED_WITH_FORM_FILLING"));
    assert!(status.summary().contains("ACCEPTABLE_MODIFICATIONS"));
}

#[test]
fn form_fill_under_no_changes_permission_is_rejected() {
    let builder = DocBuilder {
        with_text_field: true,
        docmdp: Some(1),
        ..DocBuilder::default()
    };
    let (reader, sig_field) = extended_document(builder, |reader| {
        let mut filled = PdfDictionary::new();
        filled.insert("T", PdfObject::string(b"Comments".to_vec()));
        filled.insert("FT", PdfObject::name("Tx"));
        filled.insert("V", PdfObject::string(b"looks good".to_vec()));
        reader
            .put_object(ObjectId::new(7, 0), PdfObject::Dictionary(filled))
            .unwrap();
    });

    let status = validate_pdf_signature(
        &reader,
        &sig_field,
        &accept(),
        &ValidationContext::new(),
        None,
    )
    .unwrap();
    assert_eq!(status.modification_level, ModificationLevel::FormFilling);
    assert!(!status.docmdp_ok);
    assert!(!status.bottom_line());
    assert!(status.summary().contains("ILLEGAL_MODIFICATIONS"));
}

#[test]
fn catalog_override_is_an_illegal_modification() {
    let (reader, sig_field) = extended_document(DocBuilder::default(), |reader| {
        // the update rewrites the catalog's /Pages to a new object
        let mut catalog = PdfDictionary::new();
        catalog.insert("Type", PdfObject::name("Catalog"));
        catalog.insert("Pages", PdfObject::reference(21, 0));
        catalog.insert("AcroForm", PdfObject::reference(3, 0));
        reader
            .put_object(ObjectId::new(1, 0), PdfObject::Dictionary(catalog))
            .unwrap();
        let mut pages = PdfDictionary::new();
        pages.insert("Type", PdfObject::name("Pages"));
        pages.insert(
            "Kids",
            PdfObject::Array(oxidize_sigval::objects::PdfArray(vec![
                PdfObject::reference(4, 0),
            ])),
        );
        reader
            .put_object(ObjectId::new(21, 0), PdfObject::Dictionary(pages))
            .unwrap();
    });

    let status = validate_pdf_signature(
        &reader,
        &sig_field,
        &accept(),
        &ValidationContext::new(),
        None,
    )
    .unwrap();
    assert_eq!(status.modification_level, ModificationLevel::Other);
    assert!(!status.docmdp_ok);
    assert!(!status.bottom_line());
}

#[test]
fn embedded_timestamp_token_is_validated() {
    let tsa = make_cert("CN=Test TSA", "CN=Test CA", 9);
    let gen_time = 1_650_000_000;
    let (reader, sig_field) = clean_document(
        DocBuilder::default(),
        Vec::new(),
        vec![build_timestamp_attr(&tsa, gen_time)],
    );

    let status = validate_pdf_signature(
        &reader,
        &sig_field,
        &accept(),
        &ValidationContext::new(),
        None,
    )
    .unwrap();
    let ts = status.timestamp_validity.as_ref().expect("timestamp status");
    assert!(ts.status.intact);
    assert!(ts.status.valid);
    assert!(ts.status.trusted);
    assert_eq!(ts.timestamp.timestamp(), gen_time as i64);
    assert_eq!(status.signed_dt.unwrap().timestamp(), gen_time as i64);
    assert!(status.summary().contains("TIMESTAMP_TOKEN<TRUSTED|USAGE_OK>"));
}

#[test]
fn mandated_subfilter_mismatch_fails_seed_value_check() {
    let spec = SigSeedValueSpec {
        flags: SigSeedValFlags::SUBFILTER,
        subfilters: Some(vec![SigSeedSubFilter::AdobePkcs7Detached]),
        ..Default::default()
    };
    let builder = DocBuilder {
        subfilter: "ETSI.CAdES.detached",
        seed_value: Some(spec.as_pdf_object().unwrap()),
        ..DocBuilder::default()
    };
    let (reader, sig_field) = clean_document(builder, Vec::new(), Vec::new());

    let status = validate_pdf_signature(
        &reader,
        &sig_field,
        &accept(),
        &ValidationContext::new(),
        None,
    )
    .unwrap();
    assert!(status.status.valid);
    assert!(!status.seed_value_ok);
    assert!(!status.bottom_line());
}

#[test]
fn unknown_subfilter_is_unsupported() {
    let builder = DocBuilder {
        subfilter: "adbe.x509.rsa_sha1",
        ..DocBuilder::default()
    };
    let (reader, sig_field) = clean_document(builder, Vec::new(), Vec::new());
    let result = validate_pdf_signature(
        &reader,
        &sig_field,
        &accept(),
        &ValidationContext::new(),
        None,
    );
    assert!(matches!(
        result,
        Err(oxidize_sigval::error::ValidationError::Unsupported(_))
    ));
}

#[test]
fn empty_signature_field_is_fatal() {
    let (reader, _) = clean_document(DocBuilder::default(), Vec::new(), Vec::new());
    let mut empty_field = PdfDictionary::new();
    empty_field.insert("T", PdfObject::string(b"Sig2".to_vec()));
    empty_field.insert("FT", PdfObject::name("Sig"));
    let result = validate_pdf_signature(
        &reader,
        &empty_field,
        &accept(),
        &ValidationContext::new(),
        None,
    );
    assert!(matches!(
        result,
        Err(oxidize_sigval::error::ValidationError::EmptySignature)
    ));
}

fn revinfo_attr() -> x509_cert::attr::Attribute {
    let archival = RevocationInfoArchival {
        crl: None,
        ocsp: Some(vec![
            Any::new(der::Tag::OctetString, b"archived ocsp response".to_vec()).unwrap(),
        ]),
        other_rev_info: None,
    };
    attribute(
        OID_ADOBE_REVINFO,
        Any::encode_from(&archival).expect("archival attr"),
    )
}

#[test]
fn adobe_style_ltv_validates_with_archived_revinfo() {
    let tsa = make_cert("CN=Test TSA", "CN=Test CA", 9);
    let gen_time = 1_650_000_000u64;
    let spec = SigSeedValueSpec {
        flags: SigSeedValFlags::ADD_REV_INFO,
        add_rev_info: Some(true),
        ..Default::default()
    };
    let builder = DocBuilder {
        seed_value: Some(spec.as_pdf_object().unwrap()),
        ..DocBuilder::default()
    };
    let (reader, sig_field) = clean_document(
        builder,
        vec![revinfo_attr()],
        vec![build_timestamp_attr(&tsa, gen_time)],
    );

    let status = validate_pdf_ltv_signature(
        &reader,
        &sig_field,
        RevocationInfoValidationType::AdobeStyle,
        &accept(),
        ValidationContext::new(),
        true,
    )
    .unwrap();
    assert!(status.status.intact && status.status.valid && status.status.trusted);
    assert!(status.seed_value_ok);
    assert!(status.docmdp_ok);
    assert_eq!(status.signed_dt.unwrap().timestamp(), gen_time as i64);
    let ts = status.timestamp_validity.expect("timestamp validated");
    assert!(ts.status.valid && ts.status.trusted);
}

#[test]
fn pades_lt_ltv_reads_the_dss() {
    let tsa = make_cert("CN=Test TSA", "CN=Test CA", 9);
    let ca = make_cert("CN=Test CA", "CN=Test Root", 7);
    let gen_time = 1_650_000_000u64;
    let builder = DocBuilder {
        dss_certs: vec![ca.to_der().unwrap()],
        ..DocBuilder::default()
    };
    let (reader, sig_field) = clean_document(
        builder,
        Vec::new(),
        vec![build_timestamp_attr(&tsa, gen_time)],
    );

    let status = validate_pdf_ltv_signature(
        &reader,
        &sig_field,
        RevocationInfoValidationType::PadesLt,
        &accept(),
        ValidationContext::new(),
        false,
    )
    .unwrap();
    assert!(status.status.valid && status.status.trusted);
    assert_eq!(status.coverage, SignatureCoverageLevel::EntireFile);
    assert_eq!(status.modification_level, ModificationLevel::None);
    assert!(status.bottom_line());
}

#[test]
fn ltv_without_timestamp_is_an_error() {
    let (reader, sig_field) = clean_document(DocBuilder::default(), Vec::new(), Vec::new());
    let result = validate_pdf_ltv_signature(
        &reader,
        &sig_field,
        RevocationInfoValidationType::PadesLt,
        &accept(),
        ValidationContext::new(),
        false,
    );
    assert!(matches!(
        result,
        Err(oxidize_sigval::error::ValidationError::Signature(_))
    ));
}

#[test]
fn dss_extension_after_signing_stays_lta() {
    let ca = make_cert("CN=Test CA", "CN=Test Root", 7);
    let ca_der = ca.to_der().unwrap();
    let (reader, sig_field) = extended_document(DocBuilder::default(), move |reader| {
        // the update adds a DSS with one certificate stream
        let mut catalog = PdfDictionary::new();
        catalog.insert("Type", PdfObject::name("Catalog"));
        catalog.insert("Pages", PdfObject::reference(2, 0));
        catalog.insert("AcroForm", PdfObject::reference(3, 0));
        catalog.insert("DSS", PdfObject::reference(30, 0));
        reader
            .put_object(ObjectId::new(1, 0), PdfObject::Dictionary(catalog))
            .unwrap();
        let mut dss = PdfDictionary::new();
        dss.insert(
            "Certs",
            PdfObject::Array(oxidize_sigval::objects::PdfArray(vec![
                PdfObject::reference(31, 0),
            ])),
        );
        reader
            .put_object(ObjectId::new(30, 0), PdfObject::Dictionary(dss))
            .unwrap();
        reader
            .put_object(ObjectId::new(31, 0), PdfObject::Stream(PdfStream::new(ca_der)))
            .unwrap();
    });

    let status = validate_pdf_signature(
        &reader,
        &sig_field,
        &accept(),
        &ValidationContext::new(),
        None,
    )
    .unwrap();
    assert_eq!(status.coverage, SignatureCoverageLevel::EntireRevision);
    assert_eq!(status.modification_level, ModificationLevel::LtaUpdates);
    assert!(status.docmdp_ok);
    assert!(status.summary().contains("EXTENDED_WITH_LTA_UPDATES"));
}
