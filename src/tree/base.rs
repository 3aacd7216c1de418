//! The base breakpoint tree: a state machine over a rooted RCMS's variant
//! axis. Every other tree layer wraps this one.

use crate::rcms::RootedRcms;
use crate::variant::EndMarker;

use super::{BreakpointTree, RcmsView, Site};

/// One node of the base tree: two sites bounding the node's span, plus the
/// two flags the state machine carries forward between nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BaseNode {
    pub low_site: Site,
    pub high_site: Site,
    pub from_reference: bool,
    pub on_alternate_path: bool,
}

/// The base breakpoint tree over a [`RootedRcms`]. Precomputes the globally
/// ordered list of breakend sites once, so `next_ref` can locate "the next
/// breakend strictly greater than the current one" by binary search rather
/// than a linear scan.
pub struct BaseTree<'r> {
    rooted: RootedRcms<'r>,
    events: Vec<Site>,
}

impl<'r> BaseTree<'r> {
    pub fn new(rooted: RootedRcms<'r>) -> Self {
        let mut events = Vec::with_capacity(rooted.len() * 2);
        for variant_index in 0..rooted.len() {
            events.push(Site {
                variant_index,
                end: EndMarker::Low,
            });
            events.push(Site {
                variant_index,
                end: EndMarker::High,
            });
        }
        events.sort_by(|a, b| Self::event_order(&rooted, *a, *b));
        Self { rooted, events }
    }

    fn position(rooted: &RootedRcms<'r>, site: Site) -> u32 {
        let v = rooted.get(site.variant_index);
        match site.end {
            EndMarker::Low => v.breakpoint().low_breakend,
            EndMarker::High => v.breakpoint().high_breakend,
        }
    }

    /// `(position asc, low-before-high, low-ends by descending effective
    /// size, then variant index)` — the tie-break rule for equal positions.
    fn event_order(rooted: &RootedRcms<'r>, a: Site, b: Site) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        let pa = Self::position(rooted, a);
        let pb = Self::position(rooted, b);
        if pa != pb {
            return pa.cmp(&pb);
        }
        match (a.end, b.end) {
            (EndMarker::Low, EndMarker::High) => Ordering::Less,
            (EndMarker::High, EndMarker::Low) => Ordering::Greater,
            (EndMarker::Low, EndMarker::Low) => {
                let ea = rooted.get(a.variant_index).effective_size();
                let eb = rooted.get(b.variant_index).effective_size();
                eb.cmp(&ea).then(a.variant_index.cmp(&b.variant_index))
            }
            (EndMarker::High, EndMarker::High) => a.variant_index.cmp(&b.variant_index),
        }
    }

    pub fn rooted(&self) -> &RootedRcms<'r> {
        &self.rooted
    }
}

impl<'r> BreakpointTree for BaseTree<'r> {
    type Node = BaseNode;

    fn root(&self) -> BaseNode {
        BaseNode {
            low_site: Site {
                variant_index: 0,
                end: EndMarker::Low,
            },
            high_site: Site {
                variant_index: 0,
                end: EndMarker::High,
            },
            from_reference: true,
            on_alternate_path: false,
        }
    }

    fn is_sink(&self, node: &BaseNode) -> bool {
        node.high_site.variant_index == self.rooted.sink_index()
            && node.high_site.end == EndMarker::High
    }

    fn next_ref(&self, node: &BaseNode) -> Option<BaseNode> {
        if self.is_sink(node) {
            return None;
        }
        let cur_pos = Self::position(&self.rooted, node.high_site);
        let next_rank = self
            .events
            .partition_point(|e| Self::position(&self.rooted, *e) <= cur_pos);
        let high_site = *self.events.get(next_rank)?;
        Some(BaseNode {
            low_site: node.high_site,
            high_site,
            from_reference: true,
            on_alternate_path: node.on_alternate_path,
        })
    }

    fn next_alt(&self, node: &BaseNode) -> Option<BaseNode> {
        if !node.from_reference || node.high_site.end != EndMarker::Low {
            return None;
        }
        let variant_index = node.high_site.variant_index;
        Some(BaseNode {
            low_site: node.high_site,
            high_site: Site {
                variant_index,
                end: EndMarker::High,
            },
            from_reference: false,
            on_alternate_path: true,
        })
    }
}

impl<'r> RcmsView for BaseTree<'r> {
    fn reference_sequence(&self) -> &[u8] {
        self.rooted.sequence()
    }

    fn variant_at(&self, index: usize) -> crate::variant::Variant {
        self.rooted.get(index)
    }

    fn sink_index(&self) -> usize {
        self.rooted.sink_index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::Coverage;
    use crate::rcms::{OwnedReference, Rcms, RootedRcms};
    use crate::variant::Breakpoint;

    fn sample_rcms() -> Rcms {
        let reference = OwnedReference::new("chr_test", b"AAAACCCCCGGGGGTTTTT".to_vec());
        let mut builder = Rcms::builder(reference, 4);
        builder
            .push(
                Variant::new(Breakpoint::new(4, 5), vec![b'G'], Coverage::from_bits(4, [0, 1]))
                    .unwrap(),
            )
            .unwrap();
        builder
            .push(Variant::new(Breakpoint::new(9, 9), b"TT".to_vec(), Coverage::from_bits(4, [2])).unwrap())
            .unwrap();
        builder.build()
    }

    use crate::variant::Variant;

    #[test]
    fn root_spans_the_synthetic_root_variant() {
        let rcms = sample_rcms();
        let tree = BaseTree::new(RootedRcms::new(&rcms));
        let root = tree.root();
        assert_eq!(root.low_site.variant_index, 0);
        assert_eq!(root.high_site.variant_index, 0);
        assert!(root.from_reference);
        assert!(!root.on_alternate_path);
    }

    #[test]
    fn next_ref_walks_to_the_first_variants_low_end() {
        let rcms = sample_rcms();
        let tree = BaseTree::new(RootedRcms::new(&rcms));
        let root = tree.root();
        let child = tree.next_ref(&root).expect("a reference child must exist");
        assert_eq!(child.low_site, root.high_site);
        assert_eq!(child.high_site.variant_index, 1);
        assert_eq!(child.high_site.end, EndMarker::Low);
    }

    #[test]
    fn next_alt_is_only_defined_at_a_low_end_branch_point() {
        let rcms = sample_rcms();
        let tree = BaseTree::new(RootedRcms::new(&rcms));
        let root = tree.root();
        assert!(tree.next_alt(&root).is_none());

        let branch = tree.next_ref(&root).unwrap();
        let alt = tree.next_alt(&branch).expect("a branch point must offer an alt child");
        assert_eq!(alt.low_site, branch.high_site);
        assert_eq!(alt.high_site.variant_index, branch.high_site.variant_index);
        assert_eq!(alt.high_site.end, EndMarker::High);
        assert!(!alt.from_reference);
        assert!(alt.on_alternate_path);
    }

    #[test]
    fn traversal_along_next_ref_eventually_reaches_the_sink() {
        let rcms = sample_rcms();
        let tree = BaseTree::new(RootedRcms::new(&rcms));
        let mut node = tree.root();
        let mut steps = 0;
        while !tree.is_sink(&node) {
            node = tree.next_ref(&node).expect("path must reach sink without dead-ending");
            steps += 1;
            assert!(steps < 100, "runaway traversal");
        }
        assert_eq!(node.high_site.variant_index, tree.sink_index());
    }
}
