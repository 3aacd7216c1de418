//! Variant records: breakpoints, alternate kinds, and the covered variant
//! type that the RCMS stores.

use crate::coverage::Coverage;

/// Half-open interval `[low_breakend, high_breakend)` on the reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Breakpoint {
    pub low_breakend: u32,
    pub high_breakend: u32,
}

/// Which end of a breakpoint a tree site refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndMarker {
    Low,
    High,
}

impl Breakpoint {
    pub fn new(low_breakend: u32, high_breakend: u32) -> Self {
        debug_assert!(low_breakend <= high_breakend);
        Self {
            low_breakend,
            high_breakend,
        }
    }

    /// `high - low`.
    pub fn breakend_span(&self) -> u32 {
        self.high_breakend - self.low_breakend
    }
}

/// Alternate-kind tag, derived from `(breakend_span, |alt_sequence|)` rather
/// than carried as an explicit field.
///
/// Ordering: insertion < replacement < deletion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AltKind {
    Insertion,
    Replacement,
    Deletion,
}

impl AltKind {
    /// Derive the kind from a breakend span and alternate sequence length.
    /// `(>0,>0) -> Replacement`, `(>0,0) -> Deletion`, `(0,>0) -> Insertion`.
    /// `(0,0)` has no variant meaning and is rejected by the caller before
    /// this is invoked (see `RcmsBuilder::push`).
    pub fn derive(breakend_span: u32, alt_len: usize) -> Option<AltKind> {
        match (breakend_span > 0, alt_len > 0) {
            (true, true) => Some(AltKind::Replacement),
            (true, false) => Some(AltKind::Deletion),
            (false, true) => Some(AltKind::Insertion),
            (false, false) => None,
        }
    }
}

/// A covered sequence variant: `(breakpoint, alt_sequence, kind, coverage)`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variant {
    breakpoint: Breakpoint,
    alt_sequence: Vec<u8>,
    kind: AltKind,
    coverage: Coverage,
}

impl Variant {
    /// Construct a variant, deriving and checking its alternate kind.
    /// Returns `None` if `(breakend_span, |alt_sequence|)` is `(0,0)`
    /// (`UnknownAltKind`): a zero-width, zero-length
    /// "variant" carries no information and is never constructed.
    pub fn new(breakpoint: Breakpoint, alt_sequence: Vec<u8>, coverage: Coverage) -> Option<Self> {
        let kind = AltKind::derive(breakpoint.breakend_span(), alt_sequence.len())?;
        Some(Self {
            breakpoint,
            alt_sequence,
            kind,
            coverage,
        })
    }

    /// Construct the synthetic, zero-width, full-coverage root/sink
    /// variants used by the rooted RCMS view. These are placed outside the
    /// `(breakend_span, |alt|) == (0,0)` rejection above because they do
    /// not represent alternate sequence at all, only anchor points.
    pub(crate) fn synthetic_anchor(position: u32, coverage: Coverage) -> Self {
        Self {
            breakpoint: Breakpoint::new(position, position),
            alt_sequence: Vec::new(),
            kind: AltKind::Insertion,
            coverage,
        }
    }

    pub fn breakpoint(&self) -> Breakpoint {
        self.breakpoint
    }

    pub fn position(&self) -> u32 {
        self.breakpoint.low_breakend
    }

    pub fn alt_sequence(&self) -> &[u8] {
        &self.alt_sequence
    }

    pub fn alt_kind(&self) -> AltKind {
        self.kind
    }

    pub fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    /// `|alt_sequence| - breakend_span`, used both for RCMS canonical
    /// ordering and as an effective-size tie-breaker.
    pub fn effective_size(&self) -> i64 {
        self.alt_sequence.len() as i64 - self.breakpoint.breakend_span() as i64
    }
}
