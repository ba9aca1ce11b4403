//! Signature coverage analysis
//!
//! A PDF signature declares, through `/ByteRange`, which bytes of the file
//! it covers. That declaration has to be checked against the file itself:
//! a byte range that skips more than the signature blob, or that stops
//! short of the revision's xref container, covers less than it appears to.
//! The result is a [`SignatureCoverageLevel`], ordered from worthless to
//! airtight.

use crate::error::Result;
use crate::reader::RevisionReader;
use tracing::debug;

/// The extent to which a signature cryptographically covers a document.
///
/// This passes no judgment on whether uncovered updates are legitimate;
/// as a general rule a legitimate signature satisfies at least
/// `EntireRevision`, and the modification auditor decides the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SignatureCoverageLevel {
    /// The coverage is unclear or disconnected. In standard PDF signatures
    /// this is usually a bad sign.
    Unclear,
    /// The signature covers a contiguous block from the first byte of the
    /// file to the end of the byte range, the only gap being the signature
    /// data itself - but the signed revision is not provably covered.
    ContiguousBlockFromStart,
    /// The signature covers the entire revision it occurs in; incremental
    /// updates were added later. Expected when a file holds multiple
    /// signatures. Caution is still required.
    EntireRevision,
    /// The entire file is covered by the signature.
    EntireFile,
}

/// Classifies how much of the file the signature's byte range covers.
///
/// `contents` is the raw (hex-decoded) `/Contents` blob; its in-file
/// footprint is twice its length plus the `<>` wrappers.
pub fn evaluate_signature_coverage(
    reader: &RevisionReader,
    byte_range: &[i64],
    contents: &[u8],
    signed_revision: usize,
) -> Result<SignatureCoverageLevel> {
    let data = reader.data();

    // nonstandard byte range -> insta-fail
    if byte_range.len() != 4 || byte_range[0] != 0 {
        return Ok(SignatureCoverageLevel::Unclear);
    }
    let (len1, start2, len2) = (byte_range[1], byte_range[2], byte_range[3]);
    if len1 < 0 || start2 < 0 || len2 < 0 {
        return Ok(SignatureCoverageLevel::Unclear);
    }

    // the * 2 is the ASCII hex encoding, the + 2 the <> wrappers
    let embedded_sig_content = contents.len() as i64 * 2 + 2;
    let signed_zone_len = len1 + len2 + embedded_sig_content;
    if data.len() as i64 == signed_zone_len {
        return Ok(SignatureCoverageLevel::EntireFile);
    }

    // The byte range starts at the beginning of the file but does not reach
    // its end. First check whether the gap is fully occupied by the
    // signature content; a gap of any other shape is unexplainable.
    if start2 != len1 + embedded_sig_content {
        return Ok(SignatureCoverageLevel::Unclear);
    }
    let signed_zone_len = signed_zone_len as usize;
    if signed_zone_len > data.len() {
        return Ok(SignatureCoverageLevel::Unclear);
    }

    // Next, establish that the revision this signature is anchored to is
    // completely covered:
    // (1) the signed zone must end in the startxref marker recorded for
    //     the signed revision, and
    // (2) every xref container up to and including the signed revision must
    //     lie inside the signed zone.
    let xrefs = reader.xrefs();
    match read_startxref_at(data, signed_zone_len) {
        Some(startxref) => {
            let expected = xrefs.startxref_for_revision(signed_revision)?;
            if startxref != expected {
                debug!(
                    startxref,
                    expected, "startxref at end of signed zone points elsewhere"
                );
                return Ok(SignatureCoverageLevel::ContiguousBlockFromStart);
            }
        }
        None => return Ok(SignatureCoverageLevel::ContiguousBlockFromStart),
    }
    for revision in 0..=signed_revision {
        let (_, xref_end) = xrefs.xref_container_info(revision)?;
        if xref_end > signed_zone_len as u64 {
            return Ok(SignatureCoverageLevel::ContiguousBlockFromStart);
        }
    }

    Ok(SignatureCoverageLevel::EntireRevision)
}

/// Reads the `startxref` value of the trailer that ends at offset `end`.
///
/// The region must end (modulo trailing whitespace) with
/// `startxref <offset> %%EOF`.
pub(crate) fn read_startxref_at(data: &[u8], end: usize) -> Option<u64> {
    const KEYWORD: &[u8] = b"startxref";
    if end > data.len() {
        return None;
    }
    let window_start = end.saturating_sub(2048);
    let mut window = &data[window_start..end];

    // %%EOF, possibly followed by an end-of-line
    while let [rest @ .., last] = window {
        if last.is_ascii_whitespace() {
            window = rest;
        } else {
            break;
        }
    }
    window = window.strip_suffix(b"%%EOF")?;
    while let [rest @ .., last] = window {
        if last.is_ascii_whitespace() {
            window = rest;
        } else {
            break;
        }
    }

    // the decimal offset
    let digits_start = window
        .iter()
        .rposition(|b| !b.is_ascii_digit())
        .map(|i| i + 1)?;
    if digits_start == window.len() {
        return None;
    }
    let offset: u64 = std::str::from_utf8(&window[digits_start..])
        .ok()?
        .parse()
        .ok()?;
    window = &window[..digits_start];
    while let [rest @ .., last] = window {
        if last.is_ascii_whitespace() {
            window = rest;
        } else {
            break;
        }
    }
    window.ends_with(KEYWORD).then_some(offset)
}
