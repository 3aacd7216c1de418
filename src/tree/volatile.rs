//! `volatile`: marks a tree's nodes as cheap to copy, the pre-condition
//! `chunk` and `seekable` require. [`base::BaseNode`] is
//! already `Copy`, so this layer is a pure pass-through that just carries
//! the `Copy` bound in its `where` clause.

use super::{BreakpointTree, RcmsView};

pub struct Volatile<T> {
    inner: T,
}

impl<T> Volatile<T>
where
    T: BreakpointTree + RcmsView,
    T::Node: Copy,
{
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T> BreakpointTree for Volatile<T>
where
    T: BreakpointTree + RcmsView,
    T::Node: Copy,
{
    type Node = T::Node;

    fn root(&self) -> Self::Node {
        self.inner.root()
    }

    fn is_sink(&self, node: &Self::Node) -> bool {
        self.inner.is_sink(node)
    }

    fn next_ref(&self, node: &Self::Node) -> Option<Self::Node> {
        self.inner.next_ref(node)
    }

    fn next_alt(&self, node: &Self::Node) -> Option<Self::Node> {
        self.inner.next_alt(node)
    }
}

impl<T> RcmsView for Volatile<T>
where
    T: BreakpointTree + RcmsView,
    T::Node: Copy,
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
    use crate::variant::{Breakpoint, Variant};

    #[test]
    fn volatile_delegates_every_operation() {
        let reference = OwnedReference::new("chr_test", b"AAAACCCCCGGGGGTTTTT".to_vec());
        let mut builder = Rcms::builder(reference, 2);
        builder
            .push(Variant::new(Breakpoint::new(4, 5), vec![b'G'], Coverage::from_bits(2, [0])).unwrap())
            .unwrap();
        let rcms = builder.build();
        let base = BaseTree::new(RootedRcms::new(&rcms));
        let volatile = Volatile::new(base);

        let root = volatile.root();
        assert!(!volatile.is_sink(&root));
        let child = volatile.next_ref(&root).unwrap();
        assert_eq!(child.low_site, root.high_site);
    }
}
