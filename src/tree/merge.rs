//! `merge`: collapses a maximal chain of single-child reference nodes into
//! one node. Expects root_path-labelled input (the canonical
//! pipeline runs `merge` last), so the surviving node's
//! label is already the cumulative concatenation — no re-concatenation is
//! needed here, only skipping.

use super::{BreakpointTree, RcmsView};

pub struct Merge<T> {
    inner: T,
}

impl<T> Merge<T>
where
    T: BreakpointTree + RcmsView,
{
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    /// A node is a merge point (has more than one child) when it still
    /// offers an alt branch, or is the sink.
    fn is_branch_point(&self, node: &T::Node) -> bool {
        self.inner.is_sink(node) || self.inner.next_alt(node).is_some()
    }
}

impl<T> BreakpointTree for Merge<T>
where
    T: BreakpointTree + RcmsView,
{
    type Node = T::Node;

    fn root(&self) -> Self::Node {
        self.inner.root()
    }

    fn is_sink(&self, node: &Self::Node) -> bool {
        self.inner.is_sink(node)
    }

    fn next_ref(&self, node: &Self::Node) -> Option<Self::Node> {
        let mut current = self.inner.next_ref(node)?;
        while !self.is_branch_point(&current) {
            current = self.inner.next_ref(&current)?;
        }
        Some(current)
    }

    fn next_alt(&self, node: &Self::Node) -> Option<Self::Node> {
        self.inner.next_alt(node)
    }
}

impl<T> RcmsView for Merge<T>
where
    T: BreakpointTree + RcmsView,
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

    #[test]
    fn merge_jumps_straight_from_root_to_the_first_branch_point() {
        let reference = OwnedReference::new("chr_test", b"AAAACCCCCGGGGGTTTTT".to_vec());
        let mut builder = Rcms::builder(reference, 2);
        builder
            .push(Variant::new(Breakpoint::new(9, 10), vec![b'X'], Coverage::from_bits(2, [0])).unwrap())
            .unwrap();
        let rcms = builder.build();

        let base = BaseTree::new(RootedRcms::new(&rcms));
        let labelled = Labelled::new(base, LabelMode::RootPath);
        let merged = Merge::new(labelled);

        let root = merged.root();
        let branch = merged.next_ref(&root).expect("must reach the first branch point");
        // Root at 0, variant's low end at 9: merge should skip the whole
        // "AAAACCCCC" run in one hop rather than stopping at the synthetic
        // root-to-variant-start boundary.
        assert_eq!(branch.label.sequence(), b"AAAACCCCC");
    }
}
