//! Composite variant storage: a 4-bit-encoded SNV substore plus a generic
//! substore, joined as one logical ordered view.

use std::borrow::Cow;

use crate::coverage::Coverage;
use crate::variant::{AltKind, Breakpoint, Variant};

/// A single nucleotide, 4-bit encodable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Nucleotide {
    A,
    C,
    G,
    T,
    N,
}

impl Nucleotide {
    pub fn from_base(b: u8) -> Self {
        match b.to_ascii_uppercase() {
            b'A' => Nucleotide::A,
            b'C' => Nucleotide::C,
            b'G' => Nucleotide::G,
            b'T' => Nucleotide::T,
            _ => Nucleotide::N,
        }
    }

    pub fn to_base(self) -> u8 {
        match self {
            Nucleotide::A => b'A',
            Nucleotide::C => b'C',
            Nucleotide::G => b'G',
            Nucleotide::T => b'T',
            Nucleotide::N => b'N',
        }
    }

    /// 4-bit code, matching the upper nibble convention used for packed
    /// reference sequence bytes elsewhere in the persisted format.
    pub fn to_nibble(self) -> u8 {
        match self {
            Nucleotide::A => 0b0001,
            Nucleotide::C => 0b0010,
            Nucleotide::G => 0b0100,
            Nucleotide::T => 0b1000,
            Nucleotide::N => 0b1111,
        }
    }

    pub fn from_nibble(n: u8) -> Self {
        match n {
            0b0001 => Nucleotide::A,
            0b0010 => Nucleotide::C,
            0b0100 => Nucleotide::G,
            0b1000 => Nucleotide::T,
            _ => Nucleotide::N,
        }
    }
}

/// A single-base replacement: `breakend_span == 1`, `|alt| == 1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SnvVariant {
    position: u32,
    alt: Nucleotide,
    coverage: Coverage,
}

impl SnvVariant {
    pub fn new(position: u32, alt: Nucleotide, coverage: Coverage) -> Self {
        Self {
            position,
            alt,
            coverage,
        }
    }

    pub fn position(&self) -> u32 {
        self.position
    }

    pub fn breakpoint(&self) -> Breakpoint {
        Breakpoint::new(self.position, self.position + 1)
    }

    pub fn alt(&self) -> Nucleotide {
        self.alt
    }

    pub fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    /// Materialize as a generic `Variant`, allocating its one-byte alt
    /// sequence. Used wherever uniform `Variant` access is required (the
    /// base breakpoint tree, the haplotype viewer).
    pub fn to_variant(&self) -> Variant {
        Variant::new(self.breakpoint(), vec![self.alt.to_base()], self.coverage.clone())
            .expect("an SNV always derives AltKind::Replacement")
    }
}

/// One entry of the composite store: either the compact SNV representation
/// or a generic (possibly multi-base, insertion, or deletion) variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoredVariant {
    Snv(SnvVariant),
    Generic(Variant),
}

impl StoredVariant {
    pub fn position(&self) -> u32 {
        match self {
            StoredVariant::Snv(v) => v.position(),
            StoredVariant::Generic(v) => v.position(),
        }
    }

    pub fn breakpoint(&self) -> Breakpoint {
        match self {
            StoredVariant::Snv(v) => v.breakpoint(),
            StoredVariant::Generic(v) => v.breakpoint(),
        }
    }

    pub fn alt_sequence(&self) -> Cow<'_, [u8]> {
        match self {
            StoredVariant::Snv(v) => Cow::Owned(vec![v.alt.to_base()]),
            StoredVariant::Generic(v) => Cow::Borrowed(v.alt_sequence()),
        }
    }

    pub fn alt_kind(&self) -> AltKind {
        match self {
            StoredVariant::Snv(_) => AltKind::Replacement,
            StoredVariant::Generic(v) => v.alt_kind(),
        }
    }

    pub fn coverage(&self) -> &Coverage {
        match self {
            StoredVariant::Snv(v) => v.coverage(),
            StoredVariant::Generic(v) => v.coverage(),
        }
    }

    pub fn effective_size(&self) -> i64 {
        match self {
            StoredVariant::Snv(_) => 0,
            StoredVariant::Generic(v) => v.effective_size(),
        }
    }

    /// Project to a uniform `Variant` value, allocating for the SNV case.
    pub fn to_variant(&self) -> Variant {
        match self {
            StoredVariant::Snv(v) => v.to_variant(),
            StoredVariant::Generic(v) => v.clone(),
        }
    }

    /// Classify a generic `Variant` into the compact SNV form when it
    /// qualifies (`breakend_span == 1 && |alt| == 1`), else keep it generic.
    pub fn classify(v: Variant) -> StoredVariant {
        if v.breakpoint().breakend_span() == 1 && v.alt_sequence().len() == 1 {
            StoredVariant::Snv(SnvVariant::new(
                v.position(),
                Nucleotide::from_base(v.alt_sequence()[0]),
                v.coverage().clone(),
            ))
        } else {
            StoredVariant::Generic(v)
        }
    }
}
