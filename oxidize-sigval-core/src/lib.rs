//! PDF signature validation and incremental-update auditing
//!
//! This crate answers one question about a signed PDF: is it intact,
//! trusted, and modified only in ways the signer authorized? It validates
//! the CMS/PKCS#7 signature payload, classifies how much of the file the
//! signature covers, audits every incremental update appended after
//! signing against a whitelist of benign modification patterns, enforces
//! seed value constraints, and reads or builds the Document Security Store
//! used for long-term validation.
//!
//! PDF syntax parsing, incremental writing and X.509 path building are
//! collaborators, not residents: the crate consumes already-decoded
//! objects through [`reader::RevisionReader`], hands certificate paths to a
//! [`trust::CertificatePathValidator`], and emits DSS updates through
//! [`dss::ObjectRegistry`].
//!
//! # Example
//!
//! ```ignore
//! use oxidize_sigval::validation::validate_pdf_signature;
//! use oxidize_sigval::trust::ValidationContext;
//!
//! let status = validate_pdf_signature(
//!     &reader,
//!     &sig_field,
//!     &my_path_validator,
//!     &ValidationContext::new(),
//!     None,
//! )?;
//! println!("{}", status.summary());
//! assert!(status.bottom_line());
//! ```

pub mod certstore;
pub mod cms;
pub mod coverage;
pub mod diff;
pub mod dss;
pub mod error;
pub mod fields;
pub mod objects;
pub mod reader;
pub mod trust;
pub mod validation;
pub mod xref;

#[cfg(test)]
pub(crate) mod testutil;

pub use certstore::{
    CertificateStore, ForkedCertificateStore, IssuerSerial, SimpleCertificateStore,
    WriteThroughCertificateStore,
};
pub use crate::cms::{validate_cms_signature, SignatureStatus};
pub use coverage::SignatureCoverageLevel;
pub use diff::{evaluate_modifications, ModificationLevel};
pub use dss::{DocumentSecurityStore, ObjectRegistry, Vri};
pub use error::{Result, SuspiciousModification, ValidationError};
pub use fields::{
    FieldMDPAction, FieldMDPSpec, MDPPerm, SigCertConstraintFlags, SigCertConstraints,
    SigSeedSubFilter, SigSeedValFlags, SigSeedValueSpec,
};
pub use objects::{ObjectId, PdfArray, PdfDictionary, PdfName, PdfObject, PdfStream, PdfString};
pub use reader::{HistoricalResolver, RevisionReader};
pub use trust::{
    CertificatePathValidator, KeyUsagePolicy, PathValidationFailure, RevocationMode,
    ValidationContext,
};
pub use validation::{
    read_certification_data, validate_pdf_ltv_signature, validate_pdf_signature, DocMDPInfo,
    EmbeddedPdfSignature, PdfSignatureStatus, RevocationInfoValidationType,
    TimestampSignatureStatus,
};
pub use xref::{RevisionXref, XrefCache};
