//! Revision-aware document access
//!
//! [`RevisionReader`] is the surface through which the validator sees a PDF:
//! the raw file bytes, the xref cache, and every decoded indirect object,
//! resolvable *as of a particular revision*. Objects live in a single arena
//! (`Vec<PdfObject>`); each revision maps object numbers to arena slots, and
//! historical resolution walks revisions backwards to the newest slot at or
//! before the requested revision.
//!
//! The external parser populates a reader via [`RevisionReader::begin_revision`]
//! and [`RevisionReader::put_object`]; tests build documents the same way.

use crate::error::{Result, ValidationError};
use crate::objects::{ObjectId, PdfDictionary, PdfObject};
use crate::xref::{RevisionXref, XrefCache};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct RevisionObjects {
    /// Object number -> arena slot for objects written in this revision
    table: HashMap<u32, usize>,
    /// Trailer dictionary of this revision (carries `/Root`)
    trailer: PdfDictionary,
}

/// Read access to a document across all of its incremental revisions
#[derive(Debug, Clone)]
pub struct RevisionReader {
    data: Vec<u8>,
    xrefs: XrefCache,
    arena: Vec<PdfObject>,
    revisions: Vec<RevisionObjects>,
}

impl RevisionReader {
    /// Creates a reader over the raw file bytes, with no revisions yet
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            xrefs: XrefCache::new(),
            arena: Vec::new(),
            revisions: Vec::new(),
        }
    }

    /// Opens a new incremental revision.
    ///
    /// `startxref` and `container` describe where this revision's xref
    /// anchor and container live in the file; the coverage check compares
    /// them against the signed byte range.
    pub fn begin_revision(
        &mut self,
        trailer: PdfDictionary,
        startxref: u64,
        container: (u64, u64),
    ) -> usize {
        self.revisions.push(RevisionObjects {
            table: HashMap::new(),
            trailer,
        });
        self.xrefs.push_revision(RevisionXref::new(startxref, container))
    }

    /// Stores an object in the most recently opened revision
    pub fn put_object(&mut self, id: ObjectId, obj: PdfObject) -> Result<()> {
        let rev = self
            .revisions
            .last_mut()
            .ok_or_else(|| ValidationError::Structural("no revision open".to_string()))?;
        let slot = self.arena.len();
        self.arena.push(obj);
        rev.table.insert(id.number, slot);
        self.xrefs.record(id)?;
        Ok(())
    }

    /// The raw bytes of the file
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The cross-reference cache
    pub fn xrefs(&self) -> &XrefCache {
        &self.xrefs
    }

    /// Number of incremental revisions
    pub fn revision_count(&self) -> usize {
        self.revisions.len()
    }

    /// A resolver bound to the given revision
    pub fn resolver(&self, revision: usize) -> HistoricalResolver<'_> {
        HistoricalResolver {
            reader: self,
            revision,
        }
    }

    /// The document catalog reference and dictionary as of `revision`
    pub fn root(&self, revision: usize) -> Result<(ObjectId, &PdfDictionary)> {
        let rev = self.revisions.get(revision).ok_or_else(|| {
            ValidationError::Structural(format!("revision {revision} is out of range"))
        })?;
        let root_ref = rev
            .trailer
            .get("Root")
            .and_then(PdfObject::as_reference)
            .ok_or_else(|| {
                ValidationError::Structural("trailer has no /Root reference".to_string())
            })?;
        let root = self.resolver(revision).resolve_dict(root_ref)?;
        Ok((root_ref, root))
    }

    fn lookup(&self, revision: usize, id: ObjectId) -> Option<&PdfObject> {
        self.revisions
            .iter()
            .take(revision + 1)
            .rev()
            .find_map(|rev| rev.table.get(&id.number))
            .map(|&slot| &self.arena[slot])
    }
}

/// Object resolution as of one specific revision
#[derive(Debug, Clone, Copy)]
pub struct HistoricalResolver<'a> {
    reader: &'a RevisionReader,
    revision: usize,
}

impl<'a> HistoricalResolver<'a> {
    /// The revision this resolver is bound to
    pub fn revision(&self) -> usize {
        self.revision
    }

    /// Resolves an indirect reference to its value at this revision
    pub fn resolve(&self, id: ObjectId) -> Result<&'a PdfObject> {
        self.reader
            .lookup(self.revision, id)
            .ok_or(ValidationError::UndefinedObject(id))
    }

    /// Resolves a reference and requires the result to be a dictionary
    pub fn resolve_dict(&self, id: ObjectId) -> Result<&'a PdfDictionary> {
        self.resolve(id)?.as_dict().ok_or_else(|| {
            ValidationError::Structural(format!("object {id} is not a dictionary"))
        })
    }

    /// Follows a reference if `raw` is one, otherwise returns `raw` itself
    pub fn resolve_value(&self, raw: &'a PdfObject) -> Result<&'a PdfObject> {
        match raw {
            PdfObject::Reference(id) => self.resolve(*id),
            other => Ok(other),
        }
    }

    /// Collects every indirect reference reachable from `obj` at this
    /// revision, in first-encounter order.
    ///
    /// PDF object graphs contain cycles (field `/Parent` chains, annotations
    /// pointing back at pages), so the traversal carries an explicit visited
    /// set rather than trusting the graph to be a tree.
    pub fn collect_indirect_refs(&self, obj: &PdfObject) -> Result<Vec<ObjectId>> {
        let mut found = Vec::new();
        let mut visited = std::collections::HashSet::new();
        self.collect_refs_into(obj, &mut visited, &mut found)?;
        Ok(found)
    }

    fn collect_refs_into(
        &self,
        obj: &PdfObject,
        visited: &mut std::collections::HashSet<ObjectId>,
        found: &mut Vec<ObjectId>,
    ) -> Result<()> {
        match obj {
            PdfObject::Reference(id) => {
                if visited.insert(*id) {
                    found.push(*id);
                    let resolved = self.resolve(*id)?;
                    self.collect_refs_into(resolved, visited, found)?;
                }
            }
            PdfObject::Array(arr) => {
                for item in arr.iter() {
                    self.collect_refs_into(item, visited, found)?;
                }
            }
            PdfObject::Dictionary(dict) => {
                for value in dict.0.values() {
                    self.collect_refs_into(value, visited, found)?;
                }
            }
            PdfObject::Stream(stream) => {
                for value in stream.dict.0.values() {
                    self.collect_refs_into(value, visited, found)?;
                }
            }
            _ => {}
        }
        Ok(())
    }
}
