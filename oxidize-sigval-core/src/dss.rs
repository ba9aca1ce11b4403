//! Document Security Store (DSS) reading and construction
//!
//! The DSS (`/DSS` in the document catalog) is where a PDF archives the
//! material needed to validate its signatures long-term: certificate,
//! OCSP-response and CRL streams, plus a `/VRI` map tying subsets of those
//! to individual signatures by a hash of their `/Contents`.
//!
//! Reading feeds the material into a [`ValidationContext`]; writing goes
//! through the [`ObjectRegistry`] seam so the (external) incremental writer
//! owns object numbering. Registration deduplicates: certificates by
//! issuer-serial, OCSP and CRL streams by exact bytes, so re-registering
//! existing material returns the existing indirect reference.

use crate::certstore::IssuerSerial;
use crate::error::{Result, ValidationError};
use crate::objects::{ObjectId, PdfDictionary, PdfObject, PdfStream};
use crate::reader::RevisionReader;
use crate::trust::ValidationContext;
use der::{Decode, Encode};
use sha1::{Digest, Sha1};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use x509_cert::Certificate;
use x509_ocsp::{BasicOcspResponse, OcspResponse, OcspResponseStatus};

const ID_PKIX_OCSP_BASIC: const_oid::ObjectIdentifier =
    const_oid::ObjectIdentifier::new_unwrap("1.3.6.1.5.5.7.48.1.1");

/// Object allocation seam of the incremental PDF writer.
///
/// The DSS does not number objects itself; it asks the writer for
/// references and reports which existing objects it dirtied.
pub trait ObjectRegistry {
    /// Adds a new object, returning its reference
    fn add_object(&mut self, obj: PdfObject) -> ObjectId;
    /// Marks an existing object as updated in the next incremental write
    fn mark_update(&mut self, id: ObjectId);
}

/// Validation-related information for one signature: subsets of the DSS
/// collections, by indirect reference
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vri {
    /// Certificate stream references
    pub certs: BTreeSet<ObjectId>,
    /// OCSP response stream references
    pub ocsps: BTreeSet<ObjectId>,
    /// CRL stream references
    pub crls: BTreeSet<ObjectId>,
}

impl Vri {
    /// Merges another VRI record into this one
    pub fn merge(&mut self, other: &Vri) {
        self.certs.extend(other.certs.iter().copied());
        self.ocsps.extend(other.ocsps.iter().copied());
        self.crls.extend(other.crls.iter().copied());
    }

    /// Serializes to a `/VRI` entry dictionary
    pub fn as_pdf_object(&self) -> PdfDictionary {
        let mut dict = PdfDictionary::new();
        dict.insert("Type", PdfObject::name("VRI"));
        if !self.ocsps.is_empty() {
            dict.insert(
                "OCSP",
                PdfObject::Array(self.ocsps.iter().map(|&id| PdfObject::Reference(id)).collect()),
            );
        }
        if !self.crls.is_empty() {
            dict.insert(
                "CRL",
                PdfObject::Array(self.crls.iter().map(|&id| PdfObject::Reference(id)).collect()),
            );
        }
        dict.insert(
            "Cert",
            PdfObject::Array(self.certs.iter().map(|&id| PdfObject::Reference(id)).collect()),
        );
        dict
    }
}

/// In-memory view of a document's `/DSS` dictionary
#[derive(Debug, Clone, Default)]
pub struct DocumentSecurityStore {
    certs: HashMap<IssuerSerial, ObjectId>,
    ocsps: Vec<ObjectId>,
    crls: Vec<ObjectId>,
    ocsps_seen: HashMap<Vec<u8>, ObjectId>,
    crls_seen: HashMap<Vec<u8>, ObjectId>,
    vri_entries: BTreeMap<String, ObjectId>,
    backing: PdfDictionary,
    dss_ref: Option<ObjectId>,
}

impl DocumentSecurityStore {
    /// An empty DSS, for documents that do not have one yet
    pub fn new() -> Self {
        Self::default()
    }

    /// The `/VRI` key for a signature: the uppercase hex SHA-1 of its
    /// `/Contents` bytes (rendered in the file with a leading solidus,
    /// like every name)
    pub fn sig_content_identifier(contents: &[u8]) -> String {
        hex::encode_upper(Sha1::digest(contents))
    }

    /// The indirect reference of the `/DSS` dictionary, if it is one
    pub fn dss_ref(&self) -> Option<ObjectId> {
        self.dss_ref
    }

    /// Reads the `/DSS` of the document's current revision, folding its
    /// certificates, OCSP responses and CRLs into a fresh validation
    /// context built on `context`.
    pub fn read(
        reader: &RevisionReader,
        mut context: ValidationContext,
    ) -> Result<(Self, ValidationContext)> {
        let dss = Self::read_into(reader, &mut context, true)?;
        Ok((dss, context))
    }

    /// Reads the `/DSS` into an existing validation context. Only
    /// certificates are added; OCSP responses and CRLs are left alone.
    pub fn read_existing(
        reader: &RevisionReader,
        context: &mut ValidationContext,
    ) -> Result<Self> {
        Self::read_into(reader, context, false)
    }

    /// [`Self::read`], additionally marking the DSS dictionary as updated
    /// with the writer so it lands in the next incremental write.
    pub fn read_for_update(
        reader: &RevisionReader,
        writer: &mut dyn ObjectRegistry,
        context: ValidationContext,
    ) -> Result<(Self, ValidationContext)> {
        let (dss, context) = Self::read(reader, context)?;
        if let Some(dss_ref) = dss.dss_ref {
            writer.mark_update(dss_ref);
        }
        Ok((dss, context))
    }

    fn read_into(
        reader: &RevisionReader,
        context: &mut ValidationContext,
        include_revinfo: bool,
    ) -> Result<Self> {
        let revision = reader
            .revision_count()
            .checked_sub(1)
            .ok_or_else(|| ValidationError::Structural("document has no revisions".to_string()))?;
        let (_, root) = reader.root(revision)?;
        let resolver = reader.resolver(revision);

        let dss_raw = root
            .get("DSS")
            .ok_or_else(|| ValidationError::Structural("no /DSS found".to_string()))?;
        let dss_ref = dss_raw.as_reference();
        let dss_dict = resolver
            .resolve_value(dss_raw)?
            .as_dict()
            .ok_or_else(|| ValidationError::Structural("/DSS is not a dictionary".to_string()))?;

        let mut certs = HashMap::new();
        if let Some(cert_refs) = dss_dict.get_array("Certs") {
            for cert_raw in cert_refs.iter() {
                let (cert_ref, stream) = resolve_stream(&resolver, cert_raw, "Certs")?;
                let cert = Certificate::from_der(&stream.data).map_err(|e| {
                    ValidationError::Structural(format!("bad certificate in /DSS: {e}"))
                })?;
                certs.insert(IssuerSerial::from_cert(&cert)?, cert_ref);
                context.add_cert(cert)?;
            }
        }

        let mut ocsps = Vec::new();
        let mut ocsps_seen = HashMap::new();
        if let Some(ocsp_refs) = dss_dict.get_array("OCSPs") {
            for ocsp_raw in ocsp_refs.iter() {
                let (ocsp_ref, stream) = resolve_stream(&resolver, ocsp_raw, "OCSPs")?;
                ocsps.push(ocsp_ref);
                ocsps_seen.insert(stream.data.clone(), ocsp_ref);
                if include_revinfo {
                    context.add_ocsp(stream.data.clone());
                }
            }
        }

        let mut crls = Vec::new();
        let mut crls_seen = HashMap::new();
        if let Some(crl_refs) = dss_dict.get_array("CRLs") {
            for crl_raw in crl_refs.iter() {
                let (crl_ref, stream) = resolve_stream(&resolver, crl_raw, "CRLs")?;
                crls.push(crl_ref);
                crls_seen.insert(stream.data.clone(), crl_ref);
                if include_revinfo {
                    context.add_crl(stream.data.clone());
                }
            }
        }

        // shallow copy: VRI entries stay whatever objects they were
        let mut vri_entries = BTreeMap::new();
        if let Some(vri_dict) = dss_dict.get_dict("VRI") {
            for key in vri_dict.keys() {
                let vri_ref = vri_dict
                    .get(key)
                    .and_then(PdfObject::as_reference)
                    .ok_or_else(|| {
                        ValidationError::Structural(
                            "/VRI entries must be indirect references".to_string(),
                        )
                    })?;
                vri_entries.insert(key.to_string(), vri_ref);
            }
        }

        Ok(Self {
            certs,
            ocsps,
            crls,
            ocsps_seen,
            crls_seen,
            vri_entries,
            backing: dss_dict.clone(),
            dss_ref,
        })
    }

    /// Embeds a certificate stream, deduplicating by issuer-serial
    pub fn embed_cert(
        &mut self,
        writer: &mut dyn ObjectRegistry,
        cert: &Certificate,
    ) -> Result<ObjectId> {
        let key = IssuerSerial::from_cert(cert)?;
        if let Some(&existing) = self.certs.get(&key) {
            return Ok(existing);
        }
        let id = writer.add_object(PdfObject::Stream(PdfStream::new(cert.to_der()?)));
        self.certs.insert(key, id);
        Ok(id)
    }

    fn embed_ocsp(&mut self, writer: &mut dyn ObjectRegistry, der: &[u8]) -> ObjectId {
        if let Some(&existing) = self.ocsps_seen.get(der) {
            return existing;
        }
        let id = writer.add_object(PdfObject::Stream(PdfStream::new(der.to_vec())));
        self.ocsps_seen.insert(der.to_vec(), id);
        self.ocsps.push(id);
        id
    }

    fn embed_crl(&mut self, writer: &mut dyn ObjectRegistry, der: &[u8]) -> ObjectId {
        if let Some(&existing) = self.crls_seen.get(der) {
            return existing;
        }
        let id = writer.add_object(PdfObject::Stream(PdfStream::new(der.to_vec())));
        self.crls_seen.insert(der.to_vec(), id);
        self.crls.push(id);
        id
    }

    /// Embeds the certificates a successful basic OCSP response carries
    fn embed_certs_from_ocsp(
        &mut self,
        writer: &mut dyn ObjectRegistry,
        ocsp_der: &[u8],
    ) -> Result<Vec<ObjectId>> {
        let response = OcspResponse::from_der(ocsp_der)
            .map_err(|e| ValidationError::Cms(format!("bad OCSP response: {e}")))?;
        if response.response_status != OcspResponseStatus::Successful {
            return Ok(Vec::new());
        }
        let Some(response_bytes) = response.response_bytes else {
            return Ok(Vec::new());
        };
        if response_bytes.response_type != ID_PKIX_OCSP_BASIC {
            return Ok(Vec::new());
        }
        let basic = BasicOcspResponse::from_der(response_bytes.response.as_bytes())
            .map_err(|e| ValidationError::Cms(format!("bad basic OCSP response: {e}")))?;
        let mut ids = Vec::new();
        for cert in basic.certs.into_iter().flatten() {
            ids.push(self.embed_cert(writer, &cert)?);
        }
        Ok(ids)
    }

    /// Registers validation information for one signature.
    ///
    /// `identifier` comes from [`Self::sig_content_identifier`]; `paths`
    /// are validation paths whose certificates must be preserved (usually
    /// one for the signer, more when timestamps are involved). OCSP
    /// responses and CRLs are sourced from the validation context, and any
    /// certificates embedded in the OCSP responses are preserved too.
    pub fn register_vri(
        &mut self,
        writer: &mut dyn ObjectRegistry,
        identifier: &str,
        paths: &[Vec<Certificate>],
        context: &ValidationContext,
    ) -> Result<ObjectId> {
        let mut vri = Vri::default();
        for der in &context.ocsps {
            vri.ocsps.insert(self.embed_ocsp(writer, der));
        }
        for der in &context.crls {
            vri.crls.insert(self.embed_crl(writer, der));
        }
        for der in &context.ocsps {
            vri.certs.extend(self.embed_certs_from_ocsp(writer, der)?);
        }
        for path in paths {
            for cert in path {
                vri.certs.insert(self.embed_cert(writer, cert)?);
            }
        }
        let vri_ref = writer.add_object(PdfObject::Dictionary(vri.as_pdf_object()));
        self.vri_entries.insert(identifier.to_string(), vri_ref);
        Ok(vri_ref)
    }

    /// Serializes the store back to a `/DSS` dictionary, preserving any
    /// entries of the backing dictionary this store does not manage
    pub fn as_pdf_object(&self) -> PdfDictionary {
        let mut dict = self.backing.clone();
        let mut vri = PdfDictionary::new();
        for (name, &vri_ref) in &self.vri_entries {
            vri.insert(name.clone(), PdfObject::Reference(vri_ref));
        }
        dict.insert("VRI", PdfObject::Dictionary(vri));

        let mut cert_refs: Vec<ObjectId> = self.certs.values().copied().collect();
        cert_refs.sort();
        dict.insert(
            "Certs",
            PdfObject::Array(cert_refs.into_iter().map(PdfObject::Reference).collect()),
        );
        if !self.ocsps.is_empty() {
            dict.insert(
                "OCSPs",
                PdfObject::Array(self.ocsps.iter().map(|&id| PdfObject::Reference(id)).collect()),
            );
        }
        if !self.crls.is_empty() {
            dict.insert(
                "CRLs",
                PdfObject::Array(self.crls.iter().map(|&id| PdfObject::Reference(id)).collect()),
            );
        }
        dict
    }
}

fn resolve_stream<'a>(
    resolver: &crate::reader::HistoricalResolver<'a>,
    raw: &'a PdfObject,
    key: &str,
) -> Result<(ObjectId, &'a PdfStream)> {
    let id = raw.as_reference().ok_or_else(|| {
        ValidationError::Structural(format!("/{key} entries must be indirect references"))
    })?;
    match resolver.resolve(id)? {
        PdfObject::Stream(stream) => Ok((id, stream)),
        _ => Err(ValidationError::Structural(format!(
            "/{key} entry {id} is not a stream"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::make_cert;

    #[derive(Default)]
    struct VecRegistry {
        next: u32,
        updated: Vec<ObjectId>,
    }

    impl ObjectRegistry for VecRegistry {
        fn add_object(&mut self, _obj: PdfObject) -> ObjectId {
            self.next += 1;
            ObjectId::new(100 + self.next, 0)
        }

        fn mark_update(&mut self, id: ObjectId) {
            self.updated.push(id);
        }
    }

    #[test]
    fn test_sig_content_identifier_shape() {
        let ident = DocumentSecurityStore::sig_content_identifier(b"signature blob");
        assert_eq!(ident.len(), 40);
        assert!(ident
            .chars()
            .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c)));
        // matches a direct SHA-1 computation
        assert_eq!(ident, hex::encode_upper(Sha1::digest(b"signature blob")));
    }

    #[test]
    fn test_embed_cert_is_stable() {
        let mut dss = DocumentSecurityStore::new();
        let mut writer = VecRegistry::default();
        let cert = make_cert("CN=Alice", "CN=CA", 1);
        let first = dss.embed_cert(&mut writer, &cert).unwrap();
        let second = dss.embed_cert(&mut writer, &cert).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_embed_ocsp_and_crl_dedup_by_bytes() {
        let mut dss = DocumentSecurityStore::new();
        let mut writer = VecRegistry::default();
        let first = dss.embed_ocsp(&mut writer, b"ocsp-bytes");
        let again = dss.embed_ocsp(&mut writer, b"ocsp-bytes");
        let other = dss.embed_ocsp(&mut writer, b"different");
        assert_eq!(first, again);
        assert_ne!(first, other);

        let crl = dss.embed_crl(&mut writer, b"crl-bytes");
        let crl_again = dss.embed_crl(&mut writer, b"crl-bytes");
        assert_eq!(crl, crl_again);
    }

    #[test]
    fn test_register_vri_and_write_back() {
        let mut dss = DocumentSecurityStore::new();
        let mut writer = VecRegistry::default();
        let signer = make_cert("CN=Alice", "CN=CA", 1);
        let ca = make_cert("CN=CA", "CN=Root", 7);
        let mut context = ValidationContext::new();
        context.add_crl(b"crl payload".to_vec());

        let identifier = DocumentSecurityStore::sig_content_identifier(b"contents");
        let vri_ref = dss
            .register_vri(
                &mut writer,
                &identifier,
                &[vec![ca.clone(), signer.clone()]],
                &context,
            )
            .unwrap();

        let out = dss.as_pdf_object();
        assert_eq!(out.get_array("Certs").unwrap().len(), 2);
        assert_eq!(out.get_array("CRLs").unwrap().len(), 1);
        assert!(out.get_array("OCSPs").is_none());
        let vri = out.get_dict("VRI").unwrap();
        assert_eq!(
            vri.get(&identifier).and_then(PdfObject::as_reference),
            Some(vri_ref)
        );
    }

    #[test]
    fn test_read_round_trip() {
        use crate::objects::PdfArray;

        let cert = make_cert("CN=Alice", "CN=CA", 1);
        let cert_der = cert.to_der().unwrap();

        let mut reader = RevisionReader::new(Vec::new());
        let mut trailer = PdfDictionary::new();
        trailer.insert("Root", PdfObject::reference(1, 0));
        reader.begin_revision(trailer, 0, (0, 0));
        let mut catalog = PdfDictionary::new();
        catalog.insert("DSS", PdfObject::reference(2, 0));
        reader
            .put_object(ObjectId::new(1, 0), PdfObject::Dictionary(catalog))
            .unwrap();
        let mut dss_dict = PdfDictionary::new();
        dss_dict.insert(
            "Certs",
            PdfObject::Array(PdfArray(vec![PdfObject::reference(3, 0)])),
        );
        dss_dict.insert(
            "OCSPs",
            PdfObject::Array(PdfArray(vec![PdfObject::reference(4, 0)])),
        );
        let mut vri = PdfDictionary::new();
        vri.insert(
            DocumentSecurityStore::sig_content_identifier(b"sig"),
            PdfObject::reference(5, 0),
        );
        dss_dict.insert("VRI", PdfObject::Dictionary(vri));
        reader
            .put_object(ObjectId::new(2, 0), PdfObject::Dictionary(dss_dict))
            .unwrap();
        reader
            .put_object(
                ObjectId::new(3, 0),
                PdfObject::Stream(PdfStream::new(cert_der)),
            )
            .unwrap();
        reader
            .put_object(
                ObjectId::new(4, 0),
                PdfObject::Stream(PdfStream::new(b"not parsed on read".to_vec())),
            )
            .unwrap();
        reader
            .put_object(ObjectId::new(5, 0), PdfObject::Dictionary(PdfDictionary::new()))
            .unwrap();

        let (dss, context) = DocumentSecurityStore::read(&reader, ValidationContext::new())
            .unwrap();
        assert_eq!(dss.dss_ref(), Some(ObjectId::new(2, 0)));
        assert_eq!(context.extra_certs.len(), 1);
        assert_eq!(context.ocsps.len(), 1);
        assert_eq!(dss.vri_entries.len(), 1);

        // the existing cert keeps its reference on re-registration
        let mut dss = dss;
        let mut writer = VecRegistry::default();
        let re_embedded = dss.embed_cert(&mut writer, &cert).unwrap();
        assert_eq!(re_embedded, ObjectId::new(3, 0));

        // existing-context mode only picks up certificates
        let mut existing = ValidationContext::new();
        let dss2 = DocumentSecurityStore::read_existing(&reader, &mut existing).unwrap();
        assert_eq!(existing.extra_certs.len(), 1);
        assert!(existing.ocsps.is_empty());
        assert_eq!(dss2.ocsps.len(), 1);
    }

    #[test]
    fn test_read_without_dss_is_an_error() {
        let mut reader = RevisionReader::new(Vec::new());
        let mut trailer = PdfDictionary::new();
        trailer.insert("Root", PdfObject::reference(1, 0));
        reader.begin_revision(trailer, 0, (0, 0));
        reader
            .put_object(ObjectId::new(1, 0), PdfObject::Dictionary(PdfDictionary::new()))
            .unwrap();
        assert!(DocumentSecurityStore::read(&reader, ValidationContext::new()).is_err());
    }

    #[test]
    fn test_vri_merge() {
        let mut a = Vri::default();
        a.certs.insert(ObjectId::new(1, 0));
        let mut b = Vri::default();
        b.certs.insert(ObjectId::new(2, 0));
        b.ocsps.insert(ObjectId::new(3, 0));
        a.merge(&b);
        assert_eq!(a.certs.len(), 2);
        assert_eq!(a.ocsps.len(), 1);
    }

    #[test]
    fn test_mark_update_on_read_for_update() {
        let cert = make_cert("CN=Alice", "CN=CA", 1);
        let mut reader = RevisionReader::new(Vec::new());
        let mut trailer = PdfDictionary::new();
        trailer.insert("Root", PdfObject::reference(1, 0));
        reader.begin_revision(trailer, 0, (0, 0));
        let mut catalog = PdfDictionary::new();
        catalog.insert("DSS", PdfObject::reference(2, 0));
        reader
            .put_object(ObjectId::new(1, 0), PdfObject::Dictionary(catalog))
            .unwrap();
        let mut dss_dict = PdfDictionary::new();
        dss_dict.insert(
            "Certs",
            PdfObject::Array(crate::objects::PdfArray(vec![PdfObject::reference(3, 0)])),
        );
        reader
            .put_object(ObjectId::new(2, 0), PdfObject::Dictionary(dss_dict))
            .unwrap();
        reader
            .put_object(
                ObjectId::new(3, 0),
                PdfObject::Stream(PdfStream::new(cert.to_der().unwrap())),
            )
            .unwrap();

        let mut writer = VecRegistry::default();
        let (_, _) =
            DocumentSecurityStore::read_for_update(&reader, &mut writer, ValidationContext::new())
                .unwrap();
        assert_eq!(writer.updated, vec![ObjectId::new(2, 0)]);
    }
}
