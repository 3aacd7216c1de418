//! Crate-wide error taxonomy.
//!
//! Construction-time errors are returned to the caller as one of the
//! `thiserror` enums below; the CLI boundary folds everything into
//! [`AppError`] so `main` can map it to the exit codes from the `search`/
//! `index` CLI surface (0 success, 2 usage, 3 input format, 4 I/O, 5
//! domain-invariant violation).

use std::process::{ExitCode, Termination};

/// Errors raised while building or mutating a coverage bit-vector.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CoverageError {
    /// Two coverages of unequal domain size were combined.
    #[error("coverage domain mismatch: {lhs} vs {rhs}")]
    DomainMismatch { lhs: usize, rhs: usize },
}

/// Errors raised while inserting into or validating an [`crate::rcms::Rcms`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RcmsError {
    #[error("invalid breakpoint [{low}, {high}) against sequence length {seq_len}")]
    InvalidBreakpoint { low: u32, high: u32, seq_len: u64 },
    #[error("coverage domain mismatch: store has N={expected}, variant has N={actual}")]
    CoverageDomainMismatch { expected: usize, actual: usize },
    #[error("ordering violation inserting variant at {low}: {reason}")]
    OrderingViolation { low: u32, reason: String },
}

/// Errors raised by matcher construction.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MatcherError {
    #[error("matcher constructed with an empty needle")]
    EmptyNeedle,
    #[error("needle of length {actual} exceeds the matcher's maximum of {max}")]
    NeedleTooLong { actual: usize, max: usize },
}

/// Errors raised while building or querying the interleaved Bloom filter
/// pre-filter.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum IbfError {
    #[error("cannot partition a sequence of length {seq_len} into bins of size {bin_size}")]
    EmptyPartition { seq_len: u64, bin_size: u64 },
    #[error("kmer size {kmer_size} does not fit in any bin of width {bin_width}")]
    KmerLargerThanBin { kmer_size: u8, bin_width: u64 },
}

/// Errors raised while loading a persisted RCMS or IBF.
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    #[error("bad magic bytes: expected {expected:?}, got {actual:?}")]
    BadMagic {
        expected: &'static [u8],
        actual: Vec<u8>,
    },
    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u16),
    #[error("checksum mismatch: expected {expected:#010x}, computed {computed:#010x}")]
    ChecksumMismatch { expected: u32, computed: u32 },
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level application error, unifying the subsystem error enums for the
/// CLI boundary and mapping each to its exit code per the CLI surface.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("usage error: {0}")]
    Usage(String),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("domain invariant violation: {0}")]
    Domain(String),
    #[error("search cancelled by sink")]
    Cancelled,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<RcmsError> for AppError {
    fn from(e: RcmsError) -> Self {
        AppError::Domain(e.to_string())
    }
}

impl From<CoverageError> for AppError {
    fn from(e: CoverageError) -> Self {
        AppError::Domain(e.to_string())
    }
}

impl From<MatcherError> for AppError {
    fn from(e: MatcherError) -> Self {
        AppError::Usage(e.to_string())
    }
}

impl From<IbfError> for AppError {
    fn from(e: IbfError) -> Self {
        AppError::Domain(e.to_string())
    }
}

impl Termination for AppError {
    fn report(self) -> ExitCode {
        let code = match &self {
            AppError::Usage(_) => 2,
            AppError::Format(_) => 3,
            AppError::Io(_) => 4,
            AppError::Domain(_) => 5,
            AppError::Cancelled => 4,
            AppError::Other(_) => 1,
        };
        ExitCode::from(code)
    }
}
