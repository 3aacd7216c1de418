//! `prune` / `prune_unsupported`: cut branches whose coverage has gone
//! empty, or that add nothing over their sibling. Both
//! preserve the set of distinct labelled sequences reachable from the root
//! by construction: a cut branch's coverage is empty (no haplotype reaches
//! it) or its label duplicates a sibling's (already represented elsewhere).

use super::coloured::Informative;
use super::labelled::LabelAccess;
use super::{BreakpointTree, RcmsView};

/// Cuts a branch once `AND` of path-coverages reaches zero.
pub struct Prune<T> {
    inner: T,
}

impl<T> Prune<T>
where
    T: BreakpointTree + RcmsView,
    T::Node: LabelAccess + Clone,
{
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T> BreakpointTree for Prune<T>
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
        self.inner.next_ref(node).filter(|c| c.label().coverage().any())
    }

    fn next_alt(&self, node: &Self::Node) -> Option<Self::Node> {
        self.inner.next_alt(node).filter(|c| c.label().coverage().any())
    }
}

impl<T> RcmsView for Prune<T>
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

/// Cuts a branch whose `coloured` flag says it adds nothing over its
/// sibling.
pub struct PruneUnsupported<T> {
    inner: T,
}

impl<T> PruneUnsupported<T>
where
    T: BreakpointTree + RcmsView,
    T::Node: Informative + Clone,
{
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T> BreakpointTree for PruneUnsupported<T>
where
    T: BreakpointTree + RcmsView,
    T::Node: Informative + Clone,
{
    type Node = T::Node;

    fn root(&self) -> Self::Node {
        self.inner.root()
    }

    fn is_sink(&self, node: &Self::Node) -> bool {
        self.inner.is_sink(node)
    }

    fn next_ref(&self, node: &Self::Node) -> Option<Self::Node> {
        self.inner.next_ref(node).filter(|c| c.informative())
    }

    fn next_alt(&self, node: &Self::Node) -> Option<Self::Node> {
        self.inner.next_alt(node).filter(|c| c.informative())
    }
}

impl<T> RcmsView for PruneUnsupported<T>
where
    T: BreakpointTree + RcmsView,
    T::Node: Informative + Clone,
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
    use crate::tree::coloured::Coloured;
    use crate::tree::labelled::{LabelMode, Labelled};
    use crate::variant::{Breakpoint, Variant};

    fn full_coverage_rcms() -> Rcms {
        let reference = OwnedReference::new("chr_test", b"AAAACCCCCGGGGGTTTTT".to_vec());
        let mut builder = Rcms::builder(reference, 2);
        builder
            .push(Variant::new(Breakpoint::new(4, 5), vec![b'G'], Coverage::full(2)).unwrap())
            .unwrap();
        builder.build()
    }

    #[test]
    fn prune_cuts_the_reference_branch_when_all_haplotypes_carry_the_variant() {
        let rcms = full_coverage_rcms();
        let base = BaseTree::new(RootedRcms::new(&rcms));
        let labelled = Labelled::new(base, LabelMode::NodeOnly);
        let pruned = Prune::new(labelled);

        let root = pruned.root();
        let branch = pruned.next_ref(&root).unwrap();
        // every haplotype takes the alt, so declining it (the ref child)
        // has empty coverage and must be pruned.
        assert!(pruned.next_ref(&branch).is_none());
        assert!(pruned.next_alt(&branch).is_some());
    }

    #[test]
    fn prune_unsupported_cuts_a_branch_identical_to_its_sibling() {
        let reference = OwnedReference::new("chr_test", b"AAAACCCCCGGGGGTTTTT".to_vec());
        let mut builder = Rcms::builder(reference, 2);
        // alt == ref base it replaces: "C" -> "C" is a no-op substitution.
        builder
            .push(Variant::new(Breakpoint::new(4, 5), vec![b'C'], Coverage::from_bits(2, [0])).unwrap())
            .unwrap();
        let rcms = builder.build();

        let base = BaseTree::new(RootedRcms::new(&rcms));
        let labelled = Labelled::new(base, LabelMode::NodeOnly);
        let coloured = Coloured::new(labelled);
        let pruned = PruneUnsupported::new(coloured);

        let root = pruned.root();
        let branch = pruned.next_ref(&root).unwrap();
        assert!(pruned.next_alt(&branch).is_none());
    }
}
