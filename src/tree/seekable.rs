//! `seekable`: augments a tree with `seek(position) -> node`. A seek
//! position is the path of ref/alt decisions from the root; replaying it
//! costs exactly the path's length, an O(depth)-on-a-path-descriptor bound.

use std::cmp::Ordering;

use crate::variant::EndMarker;

use super::base::BaseNode;
use super::{BreakpointTree, RcmsView};

/// One step of a path from the root: "take the reference child" or "take
/// the alternate child".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Ref,
    Alt,
}

/// An opaque seek position: the anchor it resolves to (for the total
/// ordering this module defines), plus the path descriptor that reaches
/// it from the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SeekPosition {
    pub anchor_index: u32,
    pub anchor_end: EndMarker,
    pub descriptor: Vec<Step>,
}

impl PartialOrd for SeekPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SeekPosition {
    /// First by anchor index, then by descriptor (shorter before longer;
    /// lexicographic within equal length).
    fn cmp(&self, other: &Self) -> Ordering {
        self.anchor_index
            .cmp(&other.anchor_index)
            .then_with(|| self.descriptor.len().cmp(&other.descriptor.len()))
            .then_with(|| {
                self.descriptor
                    .iter()
                    .map(|s| matches!(s, Step::Ref))
                    .cmp(other.descriptor.iter().map(|s| matches!(s, Step::Ref)))
            })
    }
}

pub struct Seekable<T> {
    inner: T,
}

impl<T> Seekable<T>
where
    T: BreakpointTree<Node = BaseNode> + RcmsView,
{
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// The seek position reaching `node` via `descriptor` from the root.
    pub fn position_of(&self, node: &BaseNode, descriptor: Vec<Step>) -> SeekPosition {
        SeekPosition {
            anchor_index: node.high_site.variant_index as u32,
            anchor_end: node.high_site.end,
            descriptor,
        }
    }

    /// Replay `position.descriptor` from the root.
    pub fn seek(&self, position: &SeekPosition) -> Option<BaseNode> {
        let mut node = self.inner.root();
        for step in &position.descriptor {
            node = match step {
                Step::Ref => self.inner.next_ref(&node)?,
                Step::Alt => self.inner.next_alt(&node)?,
            };
        }
        Some(node)
    }
}

impl<T> BreakpointTree for Seekable<T>
where
    T: BreakpointTree<Node = BaseNode> + RcmsView,
{
    type Node = BaseNode;

    fn root(&self) -> BaseNode {
        self.inner.root()
    }

    fn is_sink(&self, node: &BaseNode) -> bool {
        self.inner.is_sink(node)
    }

    fn next_ref(&self, node: &BaseNode) -> Option<BaseNode> {
        self.inner.next_ref(node)
    }

    fn next_alt(&self, node: &BaseNode) -> Option<BaseNode> {
        self.inner.next_alt(node)
    }
}

impl<T> RcmsView for Seekable<T>
where
    T: BreakpointTree<Node = BaseNode> + RcmsView,
{
    fn reference_sequence(&self) -> &[u8] {
        self.inner.reference_sequence()
    }

    fn variant_at(&self, index: usize) -> crate::variant::Variant {
        self.inner.variant_at(index)
    }

    fn sink_index(&self) -> usize {
        self.inner.sink_index()
    }
}
