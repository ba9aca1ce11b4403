//! Revision-aware cross-reference cache
//!
//! A PDF file grows by incremental updates: each revision appends objects and
//! a new xref section. The validator needs to answer historical questions
//! about that growth - which revision last wrote an object, which object ids
//! a given revision introduced, where each revision's xref container lives in
//! the file - without re-reading the file. [`XrefCache`] holds exactly that,
//! one [`RevisionXref`] per incremental revision in file order.

use crate::error::{Result, ValidationError};
use crate::objects::ObjectId;
use std::collections::{BTreeMap, HashSet};

/// Cross-reference data for a single incremental revision
#[derive(Debug, Clone, Default)]
pub struct RevisionXref {
    /// Objects explicitly written in this revision (number -> generation)
    written: BTreeMap<u32, u16>,
    /// Offset recorded in this revision's `startxref` trailer
    startxref: u64,
    /// Start and end offsets of this revision's xref container (table or
    /// stream), end exclusive
    container: (u64, u64),
}

impl RevisionXref {
    /// Creates xref data for one revision
    pub fn new(startxref: u64, container: (u64, u64)) -> Self {
        Self {
            written: BTreeMap::new(),
            startxref,
            container,
        }
    }

    /// Records an object as explicitly written in this revision
    pub fn record(&mut self, id: ObjectId) {
        self.written.insert(id.number, id.generation);
    }

    /// Returns true if this revision wrote the given object number
    pub fn wrote(&self, number: u32) -> bool {
        self.written.contains_key(&number)
    }
}

/// Cross-reference cache covering every revision of a document
#[derive(Debug, Clone, Default)]
pub struct XrefCache {
    revisions: Vec<RevisionXref>,
}

impl XrefCache {
    /// Creates an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a revision's xref data; returns the new revision index
    pub fn push_revision(&mut self, xref: RevisionXref) -> usize {
        self.revisions.push(xref);
        self.revisions.len() - 1
    }

    /// Records an object as written in the most recent revision
    pub fn record(&mut self, id: ObjectId) -> Result<()> {
        let rev = self
            .revisions
            .last_mut()
            .ok_or_else(|| ValidationError::Structural("no revision open".to_string()))?;
        rev.record(id);
        Ok(())
    }

    /// Number of incremental revisions in the document
    pub fn revision_count(&self) -> usize {
        self.revisions.len()
    }

    fn revision(&self, revision: usize) -> Result<&RevisionXref> {
        self.revisions.get(revision).ok_or_else(|| {
            ValidationError::Structural(format!("revision {revision} is out of range"))
        })
    }

    /// Object ids explicitly written in the given revision
    pub fn explicit_refs_in_revision(&self, revision: usize) -> Result<HashSet<ObjectId>> {
        let rev = self.revision(revision)?;
        Ok(rev
            .written
            .iter()
            .map(|(&number, &generation)| ObjectId { number, generation })
            .collect())
    }

    /// The most recent revision that wrote the given object number
    pub fn last_change(&self, id: ObjectId) -> Option<usize> {
        self.revisions
            .iter()
            .rposition(|rev| rev.wrote(id.number))
    }

    /// Returns true if any revision up to and including `revision` defined
    /// the given object number.
    ///
    /// This is the freshness test behind the diff auditor's whitelisting: a
    /// reference introduced by an update is only acceptable if it does not
    /// override an object that existed in the signed revision.
    pub fn object_exists_at(&self, id: ObjectId, revision: usize) -> bool {
        self.revisions
            .iter()
            .take(revision + 1)
            .any(|rev| rev.wrote(id.number))
    }

    /// The `startxref` value recorded for the given revision
    pub fn startxref_for_revision(&self, revision: usize) -> Result<u64> {
        Ok(self.revision(revision)?.startxref)
    }

    /// Start and end offsets of the given revision's xref container
    pub fn xref_container_info(&self, revision: usize) -> Result<(u64, u64)> {
        Ok(self.revision(revision)?.container)
    }
}
