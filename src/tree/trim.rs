//! `trim(w)`: caps how far a label is allowed to grow past the first
//! post-branch position, to keep right-context bounded.
//!
//! Assumes its input was labelled in `root_path` mode (per the canonical
//! canonical pipeline): each step's label is expected to be a
//! monotonically growing prefix, so "characters added since the branch"
//! can be read off as the growth in label length between parent and child.

use super::coloured::Informative;
use super::labelled::{Label, LabelAccess};
use super::{BreakpointTree, RcmsView};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrimmedNode<N> {
    pub inner: N,
    post_branch_len: usize,
}

impl<N: LabelAccess + Clone> LabelAccess for TrimmedNode<N> {
    fn label(&self) -> &Label {
        self.inner.label()
    }

    fn with_sequence(&self, sequence: Vec<u8>) -> Self {
        TrimmedNode {
            inner: self.inner.with_sequence(sequence),
            post_branch_len: self.post_branch_len,
        }
    }

    fn on_alternate_path(&self) -> bool {
        self.inner.on_alternate_path()
    }
}

impl<N: Informative> Informative for TrimmedNode<N> {
    fn informative(&self) -> bool {
        self.inner.informative()
    }
}

pub struct Trim<T> {
    inner: T,
    window: usize,
}

impl<T> Trim<T>
where
    T: BreakpointTree + RcmsView,
    T::Node: LabelAccess + Clone,
{
    pub fn new(inner: T, window: usize) -> Self {
        Self { inner, window }
    }

    /// Wrap a `next_ref` child: continues growth since the parent's own
    /// most recent branch point (zero if the parent isn't on one).
    fn wrap_ref_child(&self, parent: &TrimmedNode<T::Node>, child: T::Node) -> TrimmedNode<T::Node> {
        if !child.on_alternate_path() {
            return TrimmedNode {
                inner: child,
                post_branch_len: 0,
            };
        }
        let added = self.added_len(parent, &child);
        self.cap(child, parent.post_branch_len + added)
    }

    /// Wrap a `next_alt` child: every alt descent is itself a fresh branch
    /// point, so its budget restarts here regardless of the parent's own
    /// `post_branch_len` (which may already be exhausted from an earlier,
    /// unrelated variant further up the path).
    fn wrap_alt_child(&self, parent: &TrimmedNode<T::Node>, child: T::Node) -> TrimmedNode<T::Node> {
        let added = self.added_len(parent, &child);
        self.cap(child, added)
    }

    fn added_len(&self, parent: &TrimmedNode<T::Node>, child: &T::Node) -> usize {
        let parent_len = parent.inner.label().sequence().len();
        let child_len = child.label().sequence().len();
        child_len.saturating_sub(parent_len)
    }

    fn cap(&self, child: T::Node, post_branch_len: usize) -> TrimmedNode<T::Node> {
        if post_branch_len <= self.window {
            return TrimmedNode { inner: child, post_branch_len };
        }
        let excess = post_branch_len - self.window;
        let child_len = child.label().sequence().len();
        let keep = child_len.saturating_sub(excess);
        let truncated = child.label().sequence()[..keep].to_vec();
        TrimmedNode {
            inner: child.with_sequence(truncated),
            post_branch_len: self.window,
        }
    }
}

impl<T> BreakpointTree for Trim<T>
where
    T: BreakpointTree + RcmsView,
    T::Node: LabelAccess + Clone,
{
    type Node = TrimmedNode<T::Node>;

    fn root(&self) -> Self::Node {
        TrimmedNode {
            inner: self.inner.root(),
            post_branch_len: 0,
        }
    }

    fn is_sink(&self, node: &Self::Node) -> bool {
        self.inner.is_sink(&node.inner)
    }

    fn next_ref(&self, node: &Self::Node) -> Option<Self::Node> {
        let child = self.inner.next_ref(&node.inner)?;
        Some(self.wrap_ref_child(node, child))
    }

    fn next_alt(&self, node: &Self::Node) -> Option<Self::Node> {
        let child = self.inner.next_alt(&node.inner)?;
        Some(self.wrap_alt_child(node, child))
    }
}

impl<T> RcmsView for Trim<T>
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
    use proptest::prelude::*;

    fn sample_rcms() -> Rcms {
        let reference = OwnedReference::new("chr_test", b"AAAACCCCCGGGGGTTTTT".to_vec());
        let mut builder = Rcms::builder(reference, 2);
        builder
            .push(Variant::new(Breakpoint::new(4, 4), b"TTTTTT".to_vec(), Coverage::from_bits(2, [0])).unwrap())
            .unwrap();
        builder.build()
    }

    #[test]
    fn long_insertion_is_capped_to_the_window() {
        let rcms = sample_rcms();
        let base = BaseTree::new(RootedRcms::new(&rcms));
        let labelled = Labelled::new(base, LabelMode::RootPath);
        let trimmed = Trim::new(labelled, 3);

        let root = trimmed.root();
        let branch = trimmed.next_ref(&root).unwrap();
        let alt = trimmed.next_alt(&branch).unwrap();
        // root_path so far is "AAAA", the 6-base insertion would push it to
        // 10 bytes; capped to 4 (root prefix) + 3 (window) = 7.
        assert_eq!(alt.label().sequence().len(), 7);
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
    fn second_variants_content_survives_after_the_first_branchs_budget_is_spent() {
        // A window of 1 exhausts its budget on the first alt branch alone;
        // the second branch further down the same path must still get its
        // own fresh budget rather than inheriting the first's exhausted one.
        let rcms = two_variant_rcms();
        let base = BaseTree::new(RootedRcms::new(&rcms));
        let labelled = Labelled::new(base, LabelMode::RootPath);
        let trimmed = Trim::new(labelled, 1);

        let root = trimmed.root();
        let branch1 = trimmed.next_ref(&root).unwrap();
        let alt1 = trimmed.next_alt(&branch1).unwrap();
        let branch2 = trimmed.next_ref(&alt1).unwrap();
        let alt2 = trimmed.next_alt(&branch2).unwrap();

        let label = alt2.label().sequence();
        assert!(
            label.ends_with(b"A"),
            "second variant's alt byte must not be discarded by a stale post_branch_len: {label:?}"
        );
    }

    fn rcms_with_insertion(insert_len: usize) -> Rcms {
        let reference = OwnedReference::new("chr_test", b"AAAACCCCCGGGGGTTTTT".to_vec());
        let mut builder = Rcms::builder(reference, 2);
        let alt = vec![b'T'; insert_len];
        builder
            .push(Variant::new(Breakpoint::new(4, 4), alt, Coverage::from_bits(2, [0])).unwrap())
            .unwrap();
        builder.build()
    }

    proptest! {
        /// Whatever the insertion length and window size, the post-branch
        /// portion of a trimmed label never exceeds `window` bytes: `trim`
        /// bounds right-context growth after a branch regardless of how far
        /// `prune_unsupported`/`left_extend`/`merge` have to look later in
        /// the pipeline.
        #[test]
        fn trim_never_exceeds_the_window(insert_len in 1usize..64, window in 0usize..64) {
            let rcms = rcms_with_insertion(insert_len);
            let base = BaseTree::new(RootedRcms::new(&rcms));
            let labelled = Labelled::new(base, LabelMode::RootPath);
            let trimmed = Trim::new(labelled, window);

            let root = trimmed.root();
            let branch = trimmed.next_ref(&root).unwrap();
            let alt = trimmed.next_alt(&branch).unwrap();
            let pre_branch_len = branch.label().sequence().len();
            let post_branch_len = alt.label().sequence().len().saturating_sub(pre_branch_len);
            prop_assert!(post_branch_len <= window);
        }
    }
}
