//! Referentially Compressed Multi-sequence Store: a reference sequence plus
//! an ordered, coverage-annotated set of variants.

pub mod store;

use std::io::{Read, Write};

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::coverage::Coverage;
use crate::err::{FormatError, RcmsError};
use crate::variant::{Breakpoint, Variant};
use store::StoredVariant;

const RCMS_MAGIC: &[u8; 4] = b"RCMS";
const RCMS_VERSION: u16 = 1;

/// Interface to an externally-parsed reference sequence. VCF/FASTA parsing
/// is out of scope; this is the seam a caller plugs a parsed
/// FASTA record into.
pub trait ReferenceSource {
    fn name(&self) -> &str;
    fn sequence(&self) -> &[u8];
}

/// The only provided `ReferenceSource`: an in-memory owned sequence.
#[derive(Clone, Debug)]
pub struct OwnedReference {
    name: String,
    sequence: Vec<u8>,
}

impl OwnedReference {
    pub fn new(name: impl Into<String>, sequence: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            sequence: sequence.into(),
        }
    }
}

impl ReferenceSource for OwnedReference {
    fn name(&self) -> &str {
        &self.name
    }

    fn sequence(&self) -> &[u8] {
        &self.sequence
    }
}

/// `(low_breakend asc, effective_size desc)` — insertions (most positive
/// effective size) sort before replacements before deletions at the same
/// anchor.
fn canonical_key(v: &StoredVariant) -> (u32, std::cmp::Reverse<i64>) {
    (v.position(), std::cmp::Reverse(v.effective_size()))
}

/// Compute the index permutation that visits `variants` in R's canonical
/// order, without reordering the input. Mirrors the canonical "sorted
/// view".
pub fn sorted_view(variants: &[StoredVariant]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..variants.len()).collect();
    idx.sort_by_key(|&i| canonical_key(&variants[i]));
    idx
}

/// The RCMS proper: an owned reference sequence and a canonically-ordered,
/// validated vector of variants sharing one haplotype-count domain.
#[derive(Debug)]
pub struct Rcms {
    name: String,
    sequence: Vec<u8>,
    variants: Vec<StoredVariant>,
    n_haplotypes: usize,
}

impl Rcms {
    pub fn builder(reference: impl ReferenceSource, n_haplotypes: usize) -> RcmsBuilder {
        RcmsBuilder::new(reference, n_haplotypes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    /// `|S|`.
    pub fn seq_len(&self) -> u64 {
        self.sequence.len() as u64
    }

    /// `N`, the haplotype count shared by every variant's coverage.
    pub fn n_haplotypes(&self) -> usize {
        self.n_haplotypes
    }

    pub fn variants(&self) -> &[StoredVariant] {
        &self.variants
    }

    pub fn get(&self, index: usize) -> Option<&StoredVariant> {
        self.variants.get(index)
    }

    /// Index of the first variant with `position() >= pos`, by binary
    /// search over the canonically-ordered store (`O(log n)`).
    pub fn lower_bound(&self, pos: u32) -> usize {
        self.variants.partition_point(|v| v.position() < pos)
    }

    /// Iterate over `(index, variant)` pairs whose breakpoint intersects
    /// `[range.start, range.end)`.
    pub fn range(
        &self,
        range: std::ops::Range<u32>,
    ) -> impl Iterator<Item = (usize, &StoredVariant)> {
        let start = self.lower_bound(range.start);
        self.variants[start..]
            .iter()
            .enumerate()
            .map(move |(i, v)| (start + i, v))
            .take_while(move |(_, v)| v.position() < range.end)
    }

    /// Serialize to the persisted RCMS format: magic, version,
    /// `N`, `|S|`, `S`, variant count, then per variant `low/high/kind/
    /// alt_len/alt/coverage`, trailing a CRC-32 of everything before it.
    /// The store's `name` has no wire slot and is not persisted.
    pub fn write_to<W: Write>(&self, w: &mut W) -> Result<(), FormatError> {
        let mut buf = Vec::new();
        buf.extend_from_slice(RCMS_MAGIC);
        buf.write_u16::<LittleEndian>(RCMS_VERSION)?;
        buf.write_u32::<LittleEndian>(self.n_haplotypes as u32)?;
        buf.write_u64::<LittleEndian>(self.seq_len())?;
        buf.extend_from_slice(&self.sequence);
        buf.write_u64::<LittleEndian>(self.variants.len() as u64)?;
        for variant in &self.variants {
            let bp = variant.breakpoint();
            buf.write_u32::<LittleEndian>(bp.low_breakend)?;
            buf.write_u32::<LittleEndian>(bp.high_breakend)?;
            buf.write_u8(variant.alt_kind() as u8)?;
            let alt = variant.alt_sequence();
            buf.write_u32::<LittleEndian>(alt.len() as u32)?;
            buf.extend_from_slice(alt);
            buf.extend_from_slice(&variant.coverage().to_packed_bytes());
        }
        let checksum = crc32fast::hash(&buf);
        w.write_all(&buf)?;
        w.write_u32::<LittleEndian>(checksum)?;
        Ok(())
    }

    /// Load a persisted store. Since the wire format has no name slot, the
    /// loaded store's `name()` is always `"rcms"`.
    pub fn read_from<R: Read>(r: &mut R) -> Result<Rcms, FormatError> {
        let mut buf = Vec::new();
        r.read_to_end(&mut buf)?;
        if buf.len() < 8 {
            return Err(FormatError::Malformed("truncated RCMS header".into()));
        }
        let (body, checksum_bytes) = buf.split_at(buf.len() - 4);
        if &body[0..4] != RCMS_MAGIC {
            return Err(FormatError::BadMagic {
                expected: RCMS_MAGIC,
                actual: body[0..4].to_vec(),
            });
        }
        let expected_checksum = LittleEndian::read_u32(checksum_bytes);
        let computed_checksum = crc32fast::hash(body);
        if expected_checksum != computed_checksum {
            return Err(FormatError::ChecksumMismatch {
                expected: expected_checksum,
                computed: computed_checksum,
            });
        }

        let mut cursor = &body[4..];
        let version = cursor.read_u16::<LittleEndian>()?;
        if version != RCMS_VERSION {
            return Err(FormatError::UnsupportedVersion(version));
        }
        let n_haplotypes = cursor.read_u32::<LittleEndian>()? as usize;
        let seq_len = cursor.read_u64::<LittleEndian>()? as usize;
        let mut sequence = vec![0u8; seq_len];
        cursor.read_exact(&mut sequence)?;
        let n_variants = cursor.read_u64::<LittleEndian>()?;

        let reference = OwnedReference::new("rcms", sequence);
        let mut builder = Rcms::builder(reference, n_haplotypes);
        let cov_len = n_haplotypes.div_ceil(8);
        for _ in 0..n_variants {
            let low = cursor.read_u32::<LittleEndian>()?;
            let high = cursor.read_u32::<LittleEndian>()?;
            let _kind = cursor.read_u8()?;
            let alt_len = cursor.read_u32::<LittleEndian>()? as usize;
            let mut alt = vec![0u8; alt_len];
            cursor.read_exact(&mut alt)?;
            let mut cov_bytes = vec![0u8; cov_len];
            cursor.read_exact(&mut cov_bytes)?;
            let coverage = Coverage::from_packed_bytes(n_haplotypes, &cov_bytes);
            let variant = Variant::new(Breakpoint::new(low, high), alt, coverage).ok_or_else(|| {
                FormatError::Malformed("persisted variant has unknown alt kind".into())
            })?;
            builder
                .push(variant)
                .map_err(|e| FormatError::Malformed(e.to_string()))?;
        }
        Ok(builder.build())
    }
}

/// Incremental, validating builder for [`Rcms`]. Variants must be pushed in
/// ascending canonical order (as they would come off a sorted VCF); a
/// violation is reported immediately rather than silently re-sorted, since
/// a reordering would also need to re-validate every overlap already
/// accepted.
pub struct RcmsBuilder {
    name: String,
    sequence: Vec<u8>,
    n_haplotypes: usize,
    variants: Vec<StoredVariant>,
    last_key: Option<(u32, std::cmp::Reverse<i64>)>,
    open_non_insertions: Vec<(Breakpoint, Coverage)>,
}

impl RcmsBuilder {
    pub fn new(reference: impl ReferenceSource, n_haplotypes: usize) -> Self {
        Self {
            name: reference.name().to_owned(),
            sequence: reference.sequence().to_owned(),
            n_haplotypes,
            variants: Vec::new(),
            last_key: None,
            open_non_insertions: Vec::new(),
        }
    }

    /// Validate and insert one variant. Rejects on domain mismatch,
    /// out-of-range breakpoints, order violations, and coverage-sharing
    /// overlaps between non-insertion variants.
    pub fn push(&mut self, variant: Variant) -> Result<&mut Self, RcmsError> {
        let bp = variant.breakpoint();
        if bp.low_breakend > bp.high_breakend || u64::from(bp.high_breakend) > self.seq_len() {
            return Err(RcmsError::InvalidBreakpoint {
                low: bp.low_breakend,
                high: bp.high_breakend,
                seq_len: self.seq_len(),
            });
        }
        if variant.coverage().size() != self.n_haplotypes {
            return Err(RcmsError::CoverageDomainMismatch {
                expected: self.n_haplotypes,
                actual: variant.coverage().size(),
            });
        }

        let stored = StoredVariant::classify(variant);
        let key = canonical_key(&stored);
        if let Some(last) = self.last_key {
            if key < last {
                return Err(RcmsError::OrderingViolation {
                    low: stored.position(),
                    reason: "variants must be pushed in ascending canonical order".into(),
                });
            }
        }

        if stored.alt_kind() != crate::variant::AltKind::Insertion {
            self.open_non_insertions
                .retain(|(bp, _)| bp.high_breakend > stored.position());
            for (other_bp, other_cov) in &self.open_non_insertions {
                let overlap = stored.breakpoint().low_breakend < other_bp.high_breakend
                    && stored.breakpoint().high_breakend > other_bp.low_breakend;
                if overlap && stored.coverage().and(other_cov).map(|c| c.any()).unwrap_or(false) {
                    return Err(RcmsError::OrderingViolation {
                        low: stored.position(),
                        reason:
                            "two variants sharing a coverage bit must not have overlapping spans"
                                .into(),
                    });
                }
            }
            self.open_non_insertions
                .push((stored.breakpoint(), stored.coverage().clone()));
        }

        self.last_key = Some(key);
        self.variants.push(stored);
        Ok(self)
    }

    fn seq_len(&self) -> u64 {
        self.sequence.len() as u64
    }

    pub fn build(self) -> Rcms {
        Rcms {
            name: self.name,
            sequence: self.sequence,
            variants: self.variants,
            n_haplotypes: self.n_haplotypes,
        }
    }
}

/// Wraps an [`Rcms`] with a synthetic zero-width, full-coverage root
/// variant at position 0 and sink variant at `|S|`, giving the base
/// breakpoint tree a unique root and sink.
pub struct RootedRcms<'r> {
    inner: &'r Rcms,
    root: Variant,
    sink: Variant,
}

impl<'r> RootedRcms<'r> {
    pub fn new(inner: &'r Rcms) -> Self {
        let full = Coverage::full(inner.n_haplotypes());
        let root = Variant::synthetic_anchor(0, full.clone());
        let sink = Variant::synthetic_anchor(inner.seq_len() as u32, full);
        Self { inner, root, sink }
    }

    pub fn rcms(&self) -> &'r Rcms {
        self.inner
    }

    pub fn sequence(&self) -> &[u8] {
        self.inner.sequence()
    }

    /// Number of logical entries: root + stored variants + sink.
    pub fn len(&self) -> usize {
        self.inner.variants().len() + 2
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// The logical index of the sink (last entry).
    pub fn sink_index(&self) -> usize {
        self.len() - 1
    }

    /// Materialize the logical entry at `index` (0 = root, `len()-1` =
    /// sink, everything else is `inner.variants()[index - 1]`).
    pub fn get(&self, index: usize) -> Variant {
        if index == 0 {
            self.root.clone()
        } else if index == self.sink_index() {
            self.sink.clone()
        } else {
            self.inner.variants()[index - 1].to_variant()
        }
    }
}
