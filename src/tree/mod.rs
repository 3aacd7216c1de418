//! The polymorphic sequence tree: a base breakpoint tree over a rooted RCMS,
//! plus the composable label/view transformations layered on top of it.

pub mod base;
pub mod chunk;
pub mod coloured;
pub mod left_extend;
pub mod labelled;
pub mod merge;
pub mod prune;
pub mod seekable;
pub mod trim;
pub mod volatile;

use crate::variant::{EndMarker, Variant};

/// A site on the reference/variant axis: one end of one logical variant in
/// a rooted RCMS (index 0 = root, last = sink, everything else a stored
/// variant).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Site {
    pub variant_index: usize,
    pub end: EndMarker,
}

/// Shared contract every tree layer exposes, from the base breakpoint tree
/// up through every `labelled`/`trim`/`merge`/... wrapper: each
/// transformation is a zero-cost wrapper exposing the same
/// root/sink/next_ref/next_alt contract.
pub trait BreakpointTree {
    type Node: Clone;

    fn root(&self) -> Self::Node;
    fn is_sink(&self, node: &Self::Node) -> bool;
    fn next_ref(&self, node: &Self::Node) -> Option<Self::Node>;
    fn next_alt(&self, node: &Self::Node) -> Option<Self::Node>;
}

/// Read-only access to the underlying rooted RCMS, threaded unchanged
/// through every wrapper layer so `labelled` (and anything built on it) can
/// reach variant data regardless of how deep it sits in the pipeline.
pub trait RcmsView {
    fn reference_sequence(&self) -> &[u8];
    fn variant_at(&self, index: usize) -> Variant;
    fn sink_index(&self) -> usize;
}
