//! `left_extend(w)`: ensures every window of size ≤ w+1 ending at a variant
//! stays visible in a node's label — needed by oblivious matchers that
//! rescan a node's full label from scratch.
//!
//! Under `LabelMode::NodeOnly` a node's own label is just its own segment,
//! so the preceding `w` symbols genuinely have to be prepended from the
//! parent. Under `LabelMode::RootPath` (what the production pipeline always
//! labels with) a node's label is already the cumulative sequence from the
//! root, so every preceding symbol is already present — prepending again
//! would duplicate bytes already in the label and corrupt every downstream
//! position. `LeftExtend` is told which mode its input was labelled in and
//! only does the prepend in the `NodeOnly` case.

use super::labelled::{LabelAccess, LabelMode};
use super::{BreakpointTree, RcmsView};

pub struct LeftExtend<T> {
    inner: T,
    window: usize,
    mode: LabelMode,
}

impl<T> LeftExtend<T>
where
    T: BreakpointTree + RcmsView,
    T::Node: LabelAccess + Clone,
{
    pub fn new(inner: T, window: usize, mode: LabelMode) -> Self {
        Self { inner, window, mode }
    }

    fn extend(&self, parent: &T::Node, child: T::Node) -> T::Node {
        match self.mode {
            LabelMode::RootPath => child,
            LabelMode::NodeOnly => {
                let parent_seq = parent.label().sequence();
                let tail_start = parent_seq.len().saturating_sub(self.window);
                let mut combined = parent_seq[tail_start..].to_vec();
                combined.extend_from_slice(child.label().sequence());
                child.with_sequence(combined)
            }
        }
    }
}

impl<T> BreakpointTree for LeftExtend<T>
where
    T: BreakpointTree + RcmsView,
    T::Node: LabelAccess + Clone,
{
    type Node = T::Node;

    fn root(&self) -> Self::Node {
        self.inner.root()
    }

    fn is_sink(&self, node: &Self::Node) -> bool {
        self.inner.is_sink(node)
    }

    fn next_ref(&self, node: &Self::Node) -> Option<Self::Node> {
        let child = self.inner.next_ref(node)?;
        Some(self.extend(node, child))
    }

    fn next_alt(&self, node: &Self::Node) -> Option<Self::Node> {
        let child = self.inner.next_alt(node)?;
        Some(self.extend(node, child))
    }
}

impl<T> RcmsView for LeftExtend<T>
where
    T: BreakpointTree + RcmsView,
    T::Node: LabelAccess + Clone,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::Coverage;
    use crate::rcms::{OwnedReference, Rcms, RootedRcms};
    use crate::tree::base::BaseTree;
    use crate::tree::labelled::{LabelMode, Labelled};
    use crate::variant::{Breakpoint, Variant};

    fn sample_rcms() -> Rcms {
        let reference = OwnedReference::new("chr_test", b"AAAACCCCCGGGGGTTTTT".to_vec());
        let mut builder = Rcms::builder(reference, 2);
        builder
            .push(Variant::new(Breakpoint::new(4, 5), vec![b'G'], Coverage::from_bits(2, [0])).unwrap())
            .unwrap();
        builder.build()
    }

    fn two_variant_rcms() -> Rcms {
        let reference = OwnedReference::new("chr_test", b"AAAACCCCCGGGGGTTTTT".to_vec());
        let mut builder = Rcms::builder(reference, 2);
        builder
            .push(Variant::new(Breakpoint::new(4, 5), vec![b'G'], Coverage::from_bits(2, [0])).unwrap())
            .unwrap();
        builder
            .push(Variant::new(Breakpoint::new(9, 10), vec![b'A'], Coverage::from_bits(2, [0])).unwrap())
            .unwrap();
        builder.build()
    }

    #[test]
    fn alt_node_gets_preceding_context_prepended_under_node_only() {
        let rcms = sample_rcms();
        let base = BaseTree::new(RootedRcms::new(&rcms));
        let labelled = Labelled::new(base, LabelMode::NodeOnly);
        let extended = LeftExtend::new(labelled, 2, LabelMode::NodeOnly);

        let root = extended.root();
        let branch = extended.next_ref(&root).unwrap();
        let alt = extended.next_alt(&branch).unwrap();
        // branch's own segment is "AAAA" (window 2 -> "AA"), alt's own
        // segment is "G".
        assert_eq!(alt.label().sequence(), b"AAG");
    }

    #[test]
    fn root_path_labels_are_passed_through_unchanged() {
        // Under RootPath the label is already the cumulative sequence from
        // the root, so left_extend must not prepend anything again.
        let rcms = sample_rcms();
        let base = BaseTree::new(RootedRcms::new(&rcms));
        let labelled = Labelled::new(base, LabelMode::RootPath);
        let extended = LeftExtend::new(labelled, 2, LabelMode::RootPath);

        let root = extended.root();
        let branch = extended.next_ref(&root).unwrap();
        let alt = extended.next_alt(&branch).unwrap();
        assert_eq!(alt.label().sequence(), b"AAAAG");
    }

    #[test]
    fn root_path_stays_duplicate_free_across_two_variants() {
        let rcms = two_variant_rcms();
        let base = BaseTree::new(RootedRcms::new(&rcms));
        let labelled = Labelled::new(base, LabelMode::RootPath);
        let extended = LeftExtend::new(labelled, 2, LabelMode::RootPath);

        let root = extended.root();
        let branch1 = extended.next_ref(&root).unwrap();
        let alt1 = extended.next_alt(&branch1).unwrap();
        let branch2 = extended.next_ref(&alt1).unwrap();
        let alt2 = extended.next_alt(&branch2).unwrap();
        // "AAAA" + "G" + "CCCC" + "A" — each segment appears exactly once.
        assert_eq!(alt2.label().sequence(), b"AAAAGCCCCA");
    }
}
