//! `chunk(k)`: partitions the reference axis into a forest of per-bin trees,
//! the unit the interleaved Bloom filter is indexed by.

use crate::variant::EndMarker;

use super::base::BaseNode;
use super::{BreakpointTree, RcmsView, Site};

/// One bin of the partition: `[start, end)` on the reference axis, widened
/// by `bin_overlap` on each side so a bin's indexed tree still sees context
/// near its boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bin {
    pub index: usize,
    pub start: u32,
    pub end: u32,
}

/// Partition `[0, seq_len)` into non-overlapping `bin_size`-wide ranges,
/// then widen each by `bin_overlap` bases on both sides for indexing.
pub fn compute_bins(seq_len: u64, bin_size: u64, bin_overlap: u64) -> Vec<Bin> {
    if bin_size == 0 || seq_len == 0 {
        return Vec::new();
    }
    let mut bins = Vec::new();
    let mut owned_start = 0u64;
    let mut index = 0usize;
    while owned_start < seq_len {
        let owned_end = (owned_start + bin_size).min(seq_len);
        let start = owned_start.saturating_sub(bin_overlap);
        let end = (owned_end + bin_overlap).min(seq_len);
        bins.push(Bin {
            index,
            start: start as u32,
            end: end as u32,
        });
        owned_start = owned_end;
        index += 1;
    }
    bins
}

/// Restricts an inner base-layer tree to a single bin: `root` fast-forwards
/// to the last breakend strictly before the bin's start (stopping one step
/// short, so the step that actually straddles `start` still runs through the
/// normal traversal and materializes its content instead of being replaced
/// by an empty root label), and `is_sink` fires as soon as the reference
/// position reaches the bin's end, in addition to the inner tree's own
/// sink. Without the start-side fast-forward, every bin would redundantly
/// re-walk the whole prefix already covered by earlier bins.
pub struct BoundedTree<T> {
    inner: T,
    start: u32,
    end: u32,
}

impl<T> BoundedTree<T>
where
    T: BreakpointTree<Node = BaseNode> + RcmsView,
{
    pub fn new(inner: T, bin: &Bin) -> Self {
        Self {
            inner,
            start: bin.start,
            end: bin.end,
        }
    }

    fn position(&self, site: Site) -> u32 {
        let v = self.inner.variant_at(site.variant_index);
        match site.end {
            EndMarker::Low => v.breakpoint().low_breakend,
            EndMarker::High => v.breakpoint().high_breakend,
        }
    }
}

impl<T> BreakpointTree for BoundedTree<T>
where
    T: BreakpointTree<Node = BaseNode> + RcmsView,
{
    type Node = BaseNode;

    fn root(&self) -> BaseNode {
        // Skip whole reference/variant steps that land entirely before
        // `start` — cheap to detect since each step's own high position is
        // known before committing to it. Stops one step short of crossing
        // `start`, rather than landing past it: the node that actually
        // straddles `start` still needs to go through the normal next_ref
        // path below so its content gets materialized instead of being
        // silently replaced by an empty root label.
        let mut node = self.inner.root();
        while let Some(next) = self.inner.next_ref(&node) {
            if self.position(next.high_site) > self.start {
                break;
            }
            node = next;
        }
        node
    }

    fn is_sink(&self, node: &BaseNode) -> bool {
        self.inner.is_sink(node) || self.position(node.high_site) >= self.end
    }

    fn next_ref(&self, node: &BaseNode) -> Option<BaseNode> {
        if self.is_sink(node) {
            return None;
        }
        self.inner.next_ref(node)
    }

    fn next_alt(&self, node: &BaseNode) -> Option<BaseNode> {
        if self.is_sink(node) {
            return None;
        }
        self.inner.next_alt(node)
    }
}

impl<T> RcmsView for BoundedTree<T>
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::Coverage;
    use crate::rcms::{OwnedReference, Rcms, RootedRcms};
    use crate::tree::base::BaseTree;
    use crate::variant::{Breakpoint, Variant};

    #[test]
    fn compute_bins_covers_the_whole_axis() {
        let bins = compute_bins(25, 10, 0);
        assert_eq!(bins.len(), 3);
        assert_eq!(bins[0], Bin { index: 0, start: 0, end: 10 });
        assert_eq!(bins[2], Bin { index: 2, start: 20, end: 25 });
    }

    #[test]
    fn compute_bins_widens_with_overlap() {
        let bins = compute_bins(25, 10, 2);
        assert_eq!(bins[1].start, 8);
        assert_eq!(bins[1].end, 22);
    }

    #[test]
    fn bounded_tree_root_fast_forwards_past_an_earlier_bins_variant() {
        let reference = OwnedReference::new("chr_test", b"AAAACCCCCGGGGGTTTTT".to_vec());
        let mut builder = Rcms::builder(reference, 2);
        builder
            .push(Variant::new(Breakpoint::new(4, 5), vec![b'G'], Coverage::from_bits(2, [0])).unwrap())
            .unwrap();
        builder
            .push(Variant::new(Breakpoint::new(9, 10), vec![b'A'], Coverage::from_bits(2, [0])).unwrap())
            .unwrap();
        let rcms = builder.build();
        let base = BaseTree::new(RootedRcms::new(&rcms));
        let bin = Bin { index: 1, start: 6, end: 19 };
        let bounded = BoundedTree::new(base, &bin);

        let root = bounded.root();
        assert!(
            bounded.position(root.high_site) <= bin.start,
            "root must stop at or before the bin start, never past it: {:?}",
            root.high_site
        );
        assert_eq!(
            root.high_site.variant_index, 1,
            "must land on the first variant's high end, one step short of crossing the bin start"
        );

        // The node that actually straddles `start` is reached through a
        // normal subsequent step, not through `root()` itself.
        let next = bounded.next_ref(&root).expect("content spanning the bin start must still be reachable");
        assert!(
            bounded.position(next.high_site) > bin.start,
            "the step following root must cross the bin start"
        );
    }

    #[test]
    fn bounded_tree_stops_at_bin_end() {
        let reference = OwnedReference::new("chr_test", b"AAAACCCCCGGGGGTTTTT".to_vec());
        let mut builder = Rcms::builder(reference, 2);
        builder
            .push(Variant::new(Breakpoint::new(4, 5), vec![b'G'], Coverage::from_bits(2, [0])).unwrap())
            .unwrap();
        let rcms = builder.build();
        let base = BaseTree::new(RootedRcms::new(&rcms));
        let bin = Bin { index: 0, start: 0, end: 3 };
        let bounded = BoundedTree::new(base, &bin);

        let root = bounded.root();
        assert!(!bounded.is_sink(&root));
        let child = bounded.next_ref(&root).expect("root to first breakend must still succeed");
        assert!(bounded.is_sink(&child), "position 4 has crossed the bin's end at 3");
        assert!(bounded.next_ref(&child).is_none());
    }
}
