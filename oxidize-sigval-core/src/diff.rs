//! Incremental revision audit
//!
//! A signature that covers its entire revision says nothing about the
//! incremental updates appended afterwards. This module reconstructs the
//! document object graph at the signed revision and at each later revision,
//! walks both in parallel, and accounts for every object the update wrote.
//! An object reference is acceptable only if an allow-listed modification
//! pattern explains it: catalog bookkeeping, DSS growth and new document
//! timestamps clear at [`ModificationLevel::LtaUpdates`]; filling empty form
//! fields and refreshing appearances clear at
//! [`ModificationLevel::FormFilling`]. Anything left unexplained condemns
//! the revision to [`ModificationLevel::Other`], which no `/DocMDP` setting
//! can excuse.

use crate::coverage::SignatureCoverageLevel;
use crate::error::{Result, SuspiciousModification, ValidationError};
use crate::objects::{ObjectId, PdfArray, PdfDictionary, PdfObject};
use crate::reader::{HistoricalResolver, RevisionReader};
use std::collections::{BTreeMap, HashSet};
use tracing::warn;

/// The semantic modification level of a document relative to a signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ModificationLevel {
    /// The document was not modified at all
    None,
    /// The only updates are long-term archival ones: document security
    /// store growth and new document timestamps. Adding form fields is
    /// permissible at this level, but only signature fields.
    LtaUpdates,
    /// The only updates beyond the previous level are new signatures and
    /// updates to form field values or their appearance streams
    FormFilling,
    /// Annotation manipulation on top of the previous levels.
    /// (Currently unused: annotation changes beyond what form filling
    /// needs are treated as suspicious.)
    Annotations,
    /// The document was modified in ways not on the whitelist. This always
    /// invalidates the signature, irrespective of cryptographic integrity
    /// or `/DocMDP` settings.
    Other,
}

impl ModificationLevel {
    /// The level name used in status summaries
    pub fn name(self) -> &'static str {
        match self {
            ModificationLevel::None => "NONE",
            ModificationLevel::LtaUpdates => "LTA_UPDATES",
            ModificationLevel::FormFilling => "FORM_FILLING",
            ModificationLevel::Annotations => "ANNOTATIONS",
            ModificationLevel::Other => "OTHER",
        }
    }

    /// Position on the permission ladder, comparable against
    /// [`crate::fields::MDPPerm`] codes
    pub fn rank(self) -> i64 {
        match self {
            ModificationLevel::None => 0,
            ModificationLevel::LtaUpdates => 1,
            ModificationLevel::FormFilling => 2,
            ModificationLevel::Annotations => 3,
            ModificationLevel::Other => 4,
        }
    }
}

/// Error channel of the diff walk.
///
/// `Suspicious` is the sentinel the driver catches and coerces to
/// [`ModificationLevel::Other`]; `Read` carries genuine read errors out to
/// the caller untouched.
#[derive(Debug)]
enum DiffError {
    Suspicious(SuspiciousModification),
    Read(ValidationError),
}

impl From<ValidationError> for DiffError {
    fn from(err: ValidationError) -> Self {
        DiffError::Read(err)
    }
}

fn suspicious(msg: impl Into<String>) -> DiffError {
    DiffError::Suspicious(SuspiciousModification(msg.into()))
}

type DiffResult<T> = std::result::Result<T, DiffError>;

/// Which allow-set a reference clears into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Lta,
    FormFill,
}

/// Classifies all post-signature revisions of a document.
///
/// The result is the maximum level across revisions; a suspicious
/// modification in any revision short-circuits to
/// [`ModificationLevel::Other`].
pub fn evaluate_modifications(
    reader: &RevisionReader,
    signed_revision: usize,
    coverage: SignatureCoverageLevel,
) -> Result<ModificationLevel> {
    if coverage < SignatureCoverageLevel::EntireRevision {
        return Ok(ModificationLevel::Other);
    }
    if coverage == SignatureCoverageLevel::EntireFile {
        return Ok(ModificationLevel::None);
    }

    let mut current_max = ModificationLevel::LtaUpdates;
    for revision in signed_revision + 1..reader.revision_count() {
        let audit = RevisionAudit::new(reader, signed_revision, revision);
        match audit.run() {
            Ok(level) => current_max = current_max.max(level),
            Err(DiffError::Suspicious(e)) => {
                warn!(revision, "{e}");
                return Ok(ModificationLevel::Other);
            }
            Err(DiffError::Read(e)) => return Err(e),
        }
    }
    Ok(current_max)
}

/// One revision's worth of parallel graph walking
struct RevisionAudit<'a> {
    reader: &'a RevisionReader,
    signed: HistoricalResolver<'a>,
    current: HistoricalResolver<'a>,
    /// References cleared at level LTA_UPDATES
    explained_lta: HashSet<ObjectId>,
    /// References cleared at level FORM_FILLING
    explained_formfill: HashSet<ObjectId>,
}

impl<'a> RevisionAudit<'a> {
    fn new(reader: &'a RevisionReader, signed_revision: usize, revision: usize) -> Self {
        Self {
            reader,
            signed: reader.resolver(signed_revision),
            current: reader.resolver(revision),
            explained_lta: HashSet::new(),
            explained_formfill: HashSet::new(),
        }
    }

    fn explain(&mut self, id: ObjectId, level: Level) {
        match level {
            Level::Lta => self.explained_lta.insert(id),
            Level::FormFill => self.explained_formfill.insert(id),
        };
    }

    /// Whitelists a reference only if it does not override an object that
    /// already existed in the signed revision.
    fn whitelist_if_fresh(&mut self, id: ObjectId, level: Level) -> DiffResult<()> {
        if self
            .reader
            .xrefs()
            .object_exists_at(id, self.signed.revision())
        {
            return Err(suspicious(format!("suspicious object override: {id}")));
        }
        self.explain(id, level);
        Ok(())
    }

    fn run(mut self) -> DiffResult<ModificationLevel> {
        let reader = self.reader;
        let (signed_root_ref, signed_root) = reader.root(self.signed.revision())?;
        let (current_root_ref, current_root) = reader.root(self.current.revision())?;

        // the catalog is about to be vetted, so its own object id clears
        // here; a changed id is odd but acceptable if it clobbers nothing
        if current_root_ref != signed_root_ref {
            self.whitelist_if_fresh(current_root_ref, Level::Lta)?;
        } else {
            self.explain(current_root_ref, Level::Lta);
        }

        // catalog keys other than /AcroForm and /DSS must be untouched
        compare_dicts(signed_root, current_root, &["AcroForm", "DSS"])?;

        let mut new_sigfields = HashSet::new();
        match (signed_root.get("AcroForm"), current_root.get("AcroForm")) {
            (Some(signed_raw), Some(current_raw)) => {
                let (signed_value, current_value) =
                    self.compare_values(signed_raw, current_raw, Level::Lta)?;
                let signed_acroform = as_dict(signed_value)?;
                let current_acroform = as_dict(current_value)?;
                compare_dicts(signed_acroform, current_acroform, &["Fields"])?;

                let signed_fields = signed_acroform.get("Fields").ok_or_else(|| {
                    ValidationError::Structural("/AcroForm has no /Fields".to_string())
                })?;
                let current_fields = current_acroform.get("Fields").ok_or_else(|| {
                    ValidationError::Structural("/AcroForm has no /Fields".to_string())
                })?;
                self.diff_field_tree(signed_fields, current_fields, "", &mut new_sigfields)?;
            }
            (None, None) => {}
            _ => {
                return Err(suspicious(
                    "/AcroForm was added or removed after signing",
                ))
            }
        }

        // DSS growth: references must either occur in the old DSS or be
        // fresh; removal is not allowed
        self.allow_key_update(signed_root, current_root, "DSS", Level::Lta, false)?;

        // Newly added signature fields may appear in the /Annots of any
        // page; those page updates are processed as LTA updates. Without
        // new signature fields any /Annots change falls through to the
        // xref accounting below.
        if !new_sigfields.is_empty() {
            let pages_ref = current_root
                .get("Pages")
                .and_then(PdfObject::as_reference)
                .ok_or_else(|| {
                    ValidationError::Structural(
                        "/Pages must be an indirect reference".to_string(),
                    )
                })?;
            self.walk_page_tree_annots(pages_ref, &new_sigfields)?;
        }

        // finally, every xref the revision wrote must be justified
        let new_xrefs = self
            .reader
            .xrefs()
            .explicit_refs_in_revision(self.current.revision())?;
        let mut unexplained_lta: Vec<ObjectId> = new_xrefs
            .difference(&self.explained_lta)
            .copied()
            .collect();
        unexplained_lta.sort();
        let unexplained_formfill: Vec<ObjectId> = unexplained_lta
            .iter()
            .filter(|id| !self.explained_formfill.contains(id))
            .copied()
            .collect();
        if !unexplained_formfill.is_empty() {
            let listing = unexplained_formfill
                .iter()
                .map(ObjectId::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(suspicious(format!(
                "there are unexplained xrefs in revision {}: {listing}",
                self.current.revision()
            )));
        } else if !unexplained_lta.is_empty() {
            Ok(ModificationLevel::FormFilling)
        } else {
            Ok(ModificationLevel::LtaUpdates)
        }
    }

    /// Normalizes a (signed, current) raw value pair to resolved values,
    /// applying the freshness rule when the current side's reference moved.
    fn compare_values(
        &mut self,
        signed_raw: &'a PdfObject,
        current_raw: &'a PdfObject,
        level: Level,
    ) -> DiffResult<(&'a PdfObject, &'a PdfObject)> {
        let signed_value = match signed_raw {
            PdfObject::Reference(id) => self.signed.resolve(*id)?,
            other => other,
        };
        let current_value = match current_raw {
            PdfObject::Reference(current_id) => {
                let unchanged =
                    matches!(signed_raw, PdfObject::Reference(signed_id) if signed_id == current_id);
                if unchanged {
                    // the reference is vetted by this very comparison
                    self.explain(*current_id, level);
                } else {
                    // the two disagreeing is odd but not prima facie
                    // illegal; standard freshness rules apply
                    self.whitelist_if_fresh(*current_id, level)?;
                }
                self.current.resolve(*current_id)?
            }
            other => other,
        };
        Ok((signed_value, current_value))
    }

    /// [`Self::compare_values`] for a pair of known references
    fn compare_refs(
        &mut self,
        signed_ref: ObjectId,
        current_ref: ObjectId,
        level: Level,
    ) -> DiffResult<(&'a PdfObject, &'a PdfObject)> {
        if signed_ref == current_ref {
            self.explain(current_ref, level);
        } else {
            self.whitelist_if_fresh(current_ref, level)?;
        }
        Ok((
            self.signed.resolve(signed_ref)?,
            self.current.resolve(current_ref)?,
        ))
    }

    /// Marks one dictionary key as safely updatable: all references
    /// introduced by the update clear at `level` provided they either occur
    /// in the signed version of the value or override nothing.
    fn allow_key_update(
        &mut self,
        signed_dict: &'a PdfDictionary,
        current_dict: &'a PdfDictionary,
        key: &str,
        level: Level,
        allow_removal: bool,
    ) -> DiffResult<()> {
        let (old_refs, current_value) = match (signed_dict.get(key), current_dict.get(key)) {
            (Some(_), None) => {
                if allow_removal {
                    return Ok(());
                }
                return Err(suspicious(format!(
                    "/{key} reference removed from dictionary in update"
                )));
            }
            (Some(signed_raw), Some(current_raw)) => {
                let (signed_value, current_value) =
                    self.compare_values(signed_raw, current_raw, level)?;
                let old_refs: HashSet<ObjectId> = self
                    .signed
                    .collect_indirect_refs(signed_value)?
                    .into_iter()
                    .collect();
                (old_refs, current_value)
            }
            (None, Some(current_raw)) => {
                let current_value = match current_raw {
                    PdfObject::Reference(id) => {
                        self.whitelist_if_fresh(*id, level)?;
                        self.current.resolve(*id)?
                    }
                    other => other,
                };
                (HashSet::new(), current_value)
            }
            (None, None) => return Ok(()),
        };

        for id in self.current.collect_indirect_refs(current_value)? {
            if old_refs.contains(&id) {
                // pre-existing value references may be rewritten freely
                self.explain(id, level);
            } else {
                self.whitelist_if_fresh(id, level)?;
            }
        }
        Ok(())
    }

    /// Splits a `/Fields` array into signature fields and other fields,
    /// keyed by field name. The field type is found by walking the
    /// `/Parent` chain until `/FT` turns up.
    fn split_fields(
        &self,
        resolver: &HistoricalResolver<'a>,
        fields: &'a PdfArray,
    ) -> DiffResult<(BTreeMap<String, ObjectId>, BTreeMap<String, ObjectId>)> {
        let mut sig_fields = BTreeMap::new();
        let mut other_fields = BTreeMap::new();
        for field_raw in fields.iter() {
            let Some(field_ref) = field_raw.as_reference() else {
                return Err(suspicious(
                    "form field array entries must be indirect references",
                ));
            };
            let field = resolver.resolve_dict(field_ref)?;
            let name = field
                .get_string("T")
                .map(|s| s.to_string_lossy())
                .ok_or_else(|| suspicious(format!("form field {field_ref} has no /T entry")))?;

            let mut node = field;
            let mut seen = HashSet::from([field_ref]);
            let field_type = loop {
                if let Some(ft) = node.get_name("FT") {
                    break ft;
                }
                let parent = node.get("Parent").and_then(PdfObject::as_reference);
                match parent {
                    Some(parent_ref) if seen.insert(parent_ref) => {
                        node = resolver.resolve_dict(parent_ref)?;
                    }
                    _ => {
                        return Err(DiffError::Read(ValidationError::Structural(format!(
                            "could not resolve /FT attribute for field {name}"
                        ))))
                    }
                }
            };
            if field_type == "Sig" {
                sig_fields.insert(name, field_ref);
            } else {
                other_fields.insert(name, field_ref);
            }
        }
        Ok((sig_fields, other_fields))
    }

    /// Diffs two revisions of a `/Fields` array, collecting references of
    /// newly added signature fields into `new_sigfields`.
    fn diff_field_tree(
        &mut self,
        signed_raw: &'a PdfObject,
        current_raw: &'a PdfObject,
        parent_name: &str,
        new_sigfields: &mut HashSet<ObjectId>,
    ) -> DiffResult<()> {
        let (signed_value, current_value) =
            self.compare_values(signed_raw, current_raw, Level::Lta)?;
        let signed_fields = as_array(signed_value)?;
        let current_fields = as_array(current_value)?;

        let signed = self.signed;
        let current = self.current;
        let (signed_sig, signed_other) = self.split_fields(&signed, signed_fields)?;
        let (current_sig, current_other) = self.split_fields(&current, current_fields)?;

        // fields that are not signature fields must match one-to-one
        if signed_other.keys().ne(current_other.keys()) {
            let location = if parent_name.is_empty() {
                "the form tree root".to_string()
            } else {
                format!("node '{parent_name}'")
            };
            return Err(suspicious(format!(
                "unexpected change in form hierarchy at {location}"
            )));
        }
        for (name, signed_ref) in &signed_other {
            let current_ref = current_other[name];
            let fq_name = qualify(parent_name, name);
            let (signed_field, current_field) =
                self.diff_field(*signed_ref, current_ref, Level::FormFill, &fq_name)?;
            self.diff_field_value(signed_field, current_field)?;

            // the diff check guarantees the /Kids entries agree between the
            // two revisions, so either side's raw value works here
            if let Some(kids_raw) = signed_field.get("Kids") {
                match kids_raw {
                    PdfObject::Reference(kids_ref) => {
                        // cleared at LTA: this could still be a container
                        // for document timestamps
                        self.explain(*kids_ref, Level::Lta);
                        let signed_kids = self.signed.resolve(*kids_ref)?;
                        let current_kids = self.current.resolve(*kids_ref)?;
                        self.diff_field_tree(
                            signed_kids,
                            current_kids,
                            &fq_name,
                            new_sigfields,
                        )?;
                    }
                    direct => {
                        self.diff_field_tree(direct, direct, &fq_name, new_sigfields)?;
                    }
                }
            }
        }

        // updates can add signature fields, never remove them
        if signed_sig.keys().any(|name| !current_sig.contains_key(name)) {
            return Err(suspicious("some signature fields were removed"));
        }

        for (name, &sigfield_ref) in &current_sig {
            let fq_name = qualify(parent_name, name);
            let current_field = self.current.resolve_dict(sigfield_ref)?;
            // signature values must be indirect as per ISO 32000, and
            // signature dictionaries contain only direct objects, so no
            // deep fetching is needed on the value itself
            let current_value_ref = match current_field.get("V") {
                Some(PdfObject::Reference(id)) => Some(*id),
                Some(_) => {
                    return Err(suspicious(format!(
                        "signature value of {fq_name} is not an indirect reference"
                    )))
                }
                None => None,
            };

            match signed_sig.get(name) {
                None => {
                    // new signature field: signal to the caller so new page
                    // annotations can be cleared later
                    self.whitelist_if_fresh(sigfield_ref, Level::Lta)?;
                    new_sigfields.insert(sigfield_ref);
                    if let Some(appearance) = current_field.get("AP") {
                        for id in self.current.collect_indirect_refs(appearance)? {
                            self.whitelist_if_fresh(id, Level::FormFill)?;
                        }
                    }
                }
                Some(&old_sigfield_ref) => {
                    self.explain(sigfield_ref, Level::Lta);
                    if old_sigfield_ref != sigfield_ref {
                        return Err(suspicious(
                            "object id of signature field changed between revisions",
                        ));
                    }
                    // existing signature fields: both incarnations must
                    // agree, with references clearing at LTA only
                    let (signed_field, _) =
                        self.diff_field(sigfield_ref, sigfield_ref, Level::Lta, &fq_name)?;
                    match signed_field.get("V") {
                        Some(PdfObject::Reference(signed_value_ref)) => {
                            match current_value_ref {
                                None => {
                                    return Err(suspicious(format!(
                                        "a filled-in signature in {fq_name} was deleted \
                                         between revisions"
                                    )))
                                }
                                Some(current_ref) if current_ref != *signed_value_ref => {
                                    return Err(suspicious(format!(
                                        "a filled-in signature in {fq_name} was replaced \
                                         between revisions"
                                    )))
                                }
                                // untouched filled signature: nothing to do
                                Some(_) => continue,
                            }
                        }
                        Some(_) => {
                            return Err(suspicious(format!(
                                "signature value of {fq_name} is not an indirect reference"
                            )))
                        }
                        None => {
                            if current_value_ref.is_none() {
                                continue;
                            }
                        }
                    }
                }
            }

            // the field had no value in the signed revision but has one
            // now. Appearance-less /DocTimeStamp values are LTA updates
            // (ISO 32000-2 recommends timestamps have no appearance; we
            // enforce it as a rigid rule); everything else is form filling.
            let Some(value_ref) = current_value_ref else {
                continue;
            };
            let sig_obj = self.current.resolve_dict(value_ref)?;
            let area = rect_area(current_field);
            if sig_obj.get_type() == Some("DocTimeStamp") && area == Some(0.0) {
                self.explain(value_ref, Level::Lta);
            } else {
                self.explain(value_ref, Level::FormFill);
            }
        }
        Ok(())
    }

    /// Compares one field's two incarnations. Only `/V`, `/AP` and `/AS`
    /// may differ; appearance updates clear at `level`.
    fn diff_field(
        &mut self,
        signed_ref: ObjectId,
        current_ref: ObjectId,
        level: Level,
        fq_name: &str,
    ) -> DiffResult<(&'a PdfDictionary, &'a PdfDictionary)> {
        if signed_ref != current_ref {
            return Err(suspicious(format!(
                "unexpected modification to form field structure: object id of field \
                 {fq_name} changed from {signed_ref} to {current_ref}"
            )));
        }
        let (signed_value, current_value) =
            self.compare_refs(signed_ref, current_ref, level)?;
        let signed_field = as_dict(signed_value)?;
        let current_field = as_dict(current_value)?;

        compare_dicts(signed_field, current_field, &["V", "AP", "AS"])?;
        for key in ["AP", "AS"] {
            self.allow_key_update(signed_field, current_field, key, level, true)?;
        }
        Ok((signed_field, current_field))
    }

    /// Vets a non-signature field's value: filling an empty field is
    /// acceptable (its references clear at FORM_FILLING), touching a field
    /// that was filled before signing is not.
    fn diff_field_value(
        &mut self,
        signed_field: &'a PdfDictionary,
        current_field: &'a PdfDictionary,
    ) -> DiffResult<()> {
        let current_value = current_field.get("V");
        if let Some(signed_value) = signed_field.get("V") {
            // shallow comparison plus non-whitelisting of deeper structures
            // suffices to prevent modification
            if Some(signed_value) != current_value {
                return Err(suspicious(
                    "form fields that were filled in prior to signing cannot be modified",
                ));
            }
            return Ok(());
        }
        let Some(current_value) = current_value else {
            return Ok(());
        };
        // whether form filling is *permitted* is not decided here; the
        // object ids just get reported at the appropriate level
        for id in self.current.collect_indirect_refs(current_value)? {
            self.whitelist_if_fresh(id, Level::FormFill)?;
        }
        Ok(())
    }

    /// Walks the page tree clearing `/Annots` additions that consist purely
    /// of newly added signature fields.
    fn walk_page_tree_annots(
        &mut self,
        pages_ref: ObjectId,
        new_sigfields: &HashSet<ObjectId>,
    ) -> DiffResult<()> {
        let signed_pages = self.signed.resolve_dict(pages_ref)?;
        let current_pages = self.current.resolve_dict(pages_ref)?;
        let signed_kids = resolve_kids(self.signed, signed_pages)?;
        let current_kids = resolve_kids(self.current, current_pages)?;
        // /Kids should only contain indirect refs, so direct comparison is
        // appropriate
        if signed_kids != current_kids {
            return Err(suspicious("unexpected change to page tree structure"));
        }
        for kid_raw in signed_kids.iter() {
            let Some(kid_ref) = kid_raw.as_reference() else {
                return Err(DiffError::Read(ValidationError::Structural(
                    "/Kids entries must be indirect references".to_string(),
                )));
            };
            let signed_kid = self.signed.resolve_dict(kid_ref)?;
            match signed_kid.get_type() {
                Some("Pages") => self.walk_page_tree_annots(kid_ref, new_sigfields)?,
                Some("Page") => {
                    self.vet_page_annots(kid_ref, signed_kid, new_sigfields)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn vet_page_annots(
        &mut self,
        kid_ref: ObjectId,
        signed_kid: &'a PdfDictionary,
        new_sigfields: &HashSet<ObjectId>,
    ) -> DiffResult<()> {
        let current_kid = self.current.resolve_dict(kid_ref)?;
        let Some(current_annots_raw) = current_kid.get("Annots") else {
            // no annotations, nothing to clear
            return Ok(());
        };
        let mut current_annots_ref = None;
        let current_annots_value = match current_annots_raw {
            PdfObject::Reference(id) => {
                current_annots_ref = Some(*id);
                self.current.resolve(*id)?
            }
            other => other,
        };
        let Some(current_annots) = current_annots_value.as_array().and_then(reference_set)
        else {
            return Ok(());
        };

        let mut signed_annots_ref = None;
        let signed_annots = match signed_kid.get("Annots") {
            Some(PdfObject::Reference(id)) => {
                signed_annots_ref = Some(*id);
                self.signed.resolve(*id)?.as_array().and_then(reference_set)
            }
            Some(other) => other.as_array().and_then(reference_set),
            None => Some(HashSet::new()),
        };
        let Some(signed_annots) = signed_annots else {
            return Ok(());
        };

        if !signed_annots.is_subset(&current_annots) {
            return Ok(());
        }
        let added: HashSet<ObjectId> = current_annots
            .difference(&signed_annots)
            .copied()
            .collect();
        if added.is_empty() || !added.is_subset(new_sigfields) {
            return Ok(());
        }

        // the additions are all new signature fields, so the page update is
        // cleared - provided the page dictionaries agree otherwise
        compare_dicts(signed_kid, current_kid, &["Annots"])?;
        self.explain(kid_ref, Level::Lta);
        if let Some(current_ref) = current_annots_ref {
            if signed_annots_ref == Some(current_ref) {
                self.explain(current_ref, Level::Lta);
            } else {
                // the /Annots array moved to another object id, or from a
                // direct object to an indirect one; fine as long as the new
                // id clobbers nothing
                self.whitelist_if_fresh(current_ref, Level::Lta)?;
            }
        }
        Ok(())
    }

}

fn resolve_kids<'a>(
    resolver: HistoricalResolver<'a>,
    pages: &'a PdfDictionary,
) -> DiffResult<&'a PdfArray> {
    let kids_raw = pages
        .get("Kids")
        .ok_or_else(|| ValidationError::Structural("page tree node has no /Kids".to_string()))?;
    let kids = resolver.resolve_value(kids_raw)?;
    as_array(kids)
}

fn qualify(parent_name: &str, name: &str) -> String {
    if parent_name.is_empty() {
        name.to_string()
    } else {
        format!("{parent_name}.{name}")
    }
}

fn as_dict(obj: &PdfObject) -> DiffResult<&PdfDictionary> {
    obj.as_dict().ok_or_else(|| {
        DiffError::Read(ValidationError::Structural(
            "expected a dictionary".to_string(),
        ))
    })
}

fn as_array(obj: &PdfObject) -> DiffResult<&PdfArray> {
    obj.as_array().ok_or_else(|| {
        DiffError::Read(ValidationError::Structural("expected an array".to_string()))
    })
}

fn reference_set(arr: &PdfArray) -> Option<HashSet<ObjectId>> {
    arr.iter().map(PdfObject::as_reference).collect()
}

fn rect_area(field: &PdfDictionary) -> Option<f64> {
    let rect = field.get_array("Rect")?;
    if rect.len() != 4 {
        return None;
    }
    let x1 = rect.get(0)?.as_number()?;
    let y1 = rect.get(1)?.as_number()?;
    let x2 = rect.get(2)?.as_number()?;
    let y2 = rect.get(3)?.as_number()?;
    Some((x2 - x1).abs() * (y2 - y1).abs())
}

/// Compares two dictionaries for raw equality outside the ignored keys
fn compare_dicts(
    signed_dict: &PdfDictionary,
    current_dict: &PdfDictionary,
    ignored: &[&str],
) -> DiffResult<()> {
    let signed_keys: HashSet<&str> = signed_dict
        .keys()
        .filter(|key| !ignored.contains(key))
        .collect();
    let current_keys: HashSet<&str> = current_dict
        .keys()
        .filter(|key| !ignored.contains(key))
        .collect();
    if signed_keys != current_keys {
        let mut signed_sorted: Vec<_> = signed_keys.iter().collect();
        signed_sorted.sort();
        let mut current_sorted: Vec<_> = current_keys.iter().collect();
        current_sorted.sort();
        return Err(suspicious(format!(
            "dict keys differ: {current_sorted:?} vs. {signed_sorted:?}"
        )));
    }
    for key in signed_keys {
        if signed_dict.get(key) != current_dict.get(key) {
            return Err(suspicious(format!("values for dict key /{key} differ")));
        }
    }
    Ok(())
}
