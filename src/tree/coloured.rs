//! `coloured`: marks whether a node's label actually distinguishes it from
//! its sibling at the same branch point, the signal
//! `prune_unsupported` cuts on.

use super::labelled::{Label, LabelAccess};
use super::{BreakpointTree, RcmsView};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColouredNode<N> {
    pub inner: N,
    pub informative: bool,
}

/// Exposes the `coloured` flag through any further wrapper layer, the way
/// `LabelAccess` exposes the label itself.
pub trait Informative {
    fn informative(&self) -> bool;
}

impl<N> Informative for ColouredNode<N> {
    fn informative(&self) -> bool {
        self.informative
    }
}

impl<N: LabelAccess + Clone> LabelAccess for ColouredNode<N> {
    fn label(&self) -> &Label {
        self.inner.label()
    }

    fn with_sequence(&self, sequence: Vec<u8>) -> Self {
        ColouredNode {
            inner: self.inner.with_sequence(sequence),
            informative: self.informative,
        }
    }

    fn on_alternate_path(&self) -> bool {
        self.inner.on_alternate_path()
    }
}

pub struct Coloured<T> {
    inner: T,
}

impl<T> Coloured<T>
where
    T: BreakpointTree + RcmsView,
    T::Node: LabelAccess + Clone,
{
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    fn colour(&self, parent: &T::Node, child: T::Node, sibling: Option<T::Node>) -> ColouredNode<T::Node> {
        let informative = match sibling {
            Some(sib) => sib.label().sequence() != child.label().sequence(),
            None => true,
        };
        let _ = parent;
        ColouredNode { inner: child, informative }
    }
}

impl<T> BreakpointTree for Coloured<T>
where
    T: BreakpointTree + RcmsView,
    T::Node: LabelAccess + Clone,
{
    type Node = ColouredNode<T::Node>;

    fn root(&self) -> Self::Node {
        ColouredNode {
            inner: self.inner.root(),
            informative: true,
        }
    }

    fn is_sink(&self, node: &Self::Node) -> bool {
        self.inner.is_sink(&node.inner)
    }

    fn next_ref(&self, node: &Self::Node) -> Option<Self::Node> {
        let child = self.inner.next_ref(&node.inner)?;
        let sibling = self.inner.next_alt(&node.inner);
        Some(self.colour(&node.inner, child, sibling))
    }

    fn next_alt(&self, node: &Self::Node) -> Option<Self::Node> {
        let child = self.inner.next_alt(&node.inner)?;
        let sibling = self.inner.next_ref(&node.inner);
        Some(self.colour(&node.inner, child, sibling))
    }
}

impl<T> RcmsView for Coloured<T>
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

    #[test]
    fn replacement_differing_from_reference_is_informative() {
        let rcms = sample_rcms();
        let base = BaseTree::new(RootedRcms::new(&rcms));
        let labelled = Labelled::new(base, LabelMode::NodeOnly);
        let coloured = Coloured::new(labelled);

        let root = coloured.root();
        let branch = coloured.next_ref(&root).unwrap();
        let alt = coloured.next_alt(&branch).unwrap();
        // alt_seq "G" differs from the reference base it replaces ("C").
        assert!(alt.informative);
    }
}
