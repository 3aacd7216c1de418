//! `labelled(mode)`: attaches a materialized sequence and an accumulated
//! haplotype coverage to every node.

use crate::coverage::Coverage;
use crate::variant::EndMarker;

use super::base::BaseNode;
use super::{BreakpointTree, RcmsView, Site};

/// A node's derived sequence and coverage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
    sequence: Vec<u8>,
    coverage: Coverage,
}

impl Label {
    pub fn sequence(&self) -> &[u8] {
        &self.sequence
    }

    pub fn coverage(&self) -> &Coverage {
        &self.coverage
    }
}

/// Whether a node's `sequence()` is just its own segment, or the
/// concatenation of every ancestor's segment from the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LabelMode {
    NodeOnly,
    RootPath,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelledNode {
    pub base: BaseNode,
    pub label: Label,
}

/// Uniform access to a node's label, implemented by every layer built on
/// top of `labelled` (`coloured`, `trim`, `left_extend`, ...) so those
/// transforms can stay generic over what sits beneath them.
pub trait LabelAccess {
    fn label(&self) -> &Label;
    fn with_sequence(&self, sequence: Vec<u8>) -> Self;
    fn on_alternate_path(&self) -> bool;
}

impl LabelAccess for LabelledNode {
    fn label(&self) -> &Label {
        &self.label
    }

    fn with_sequence(&self, sequence: Vec<u8>) -> Self {
        LabelledNode {
            base: self.base,
            label: Label {
                sequence,
                coverage: self.label.coverage.clone(),
            },
        }
    }

    fn on_alternate_path(&self) -> bool {
        self.base.on_alternate_path
    }
}

pub struct Labelled<T> {
    inner: T,
    mode: LabelMode,
}

impl<T> Labelled<T>
where
    T: BreakpointTree<Node = BaseNode> + RcmsView,
{
    pub fn new(inner: T, mode: LabelMode) -> Self {
        Self { inner, mode }
    }

    fn site_position(&self, site: Site) -> u32 {
        let v = self.inner.variant_at(site.variant_index);
        match site.end {
            EndMarker::Low => v.breakpoint().low_breakend,
            EndMarker::High => v.breakpoint().high_breakend,
        }
    }

    fn own_segment(&self, base: &BaseNode) -> Vec<u8> {
        if base.from_reference {
            let lo = self.site_position(base.low_site) as usize;
            let hi = self.site_position(base.high_site) as usize;
            self.inner.reference_sequence()[lo..hi].to_vec()
        } else {
            let v = self.inner.variant_at(base.low_site.variant_index);
            v.alt_sequence().to_vec()
        }
    }

    /// The coverage multiplier contributed by the edge from `parent` into
    /// `child`: the variant's own coverage for an alt edge, its complement
    /// for a reference edge that declined a branch point, or the full
    /// domain for a plain continuation edge.
    fn edge_coverage(&self, parent: &BaseNode, child: &BaseNode, domain: usize) -> Coverage {
        if !child.from_reference {
            self.inner.variant_at(child.low_site.variant_index).coverage().clone()
        } else if parent.from_reference && parent.high_site.end == EndMarker::Low {
            self.inner
                .variant_at(parent.high_site.variant_index)
                .coverage()
                .not()
        } else {
            Coverage::full(domain)
        }
    }

    fn child_label(&self, parent: &LabelledNode, child: BaseNode) -> LabelledNode {
        let edge_cov = self.edge_coverage(&parent.base, &child, parent.label.coverage.size());
        let coverage = parent
            .label
            .coverage
            .and(&edge_cov)
            .expect("labelled() only ever ANDs coverages sharing one haplotype domain");
        let segment = self.own_segment(&child);
        let sequence = match self.mode {
            LabelMode::NodeOnly => segment,
            LabelMode::RootPath => {
                let mut full = parent.label.sequence.clone();
                full.extend_from_slice(&segment);
                full
            }
        };
        LabelledNode {
            base: child,
            label: Label { sequence, coverage },
        }
    }
}

impl<T> BreakpointTree for Labelled<T>
where
    T: BreakpointTree<Node = BaseNode> + RcmsView,
{
    type Node = LabelledNode;

    fn root(&self) -> LabelledNode {
        let base = self.inner.root();
        let coverage = self.inner.variant_at(base.low_site.variant_index).coverage().clone();
        LabelledNode {
            base,
            label: Label {
                sequence: Vec::new(),
                coverage,
            },
        }
    }

    fn is_sink(&self, node: &LabelledNode) -> bool {
        self.inner.is_sink(&node.base)
    }

    fn next_ref(&self, node: &LabelledNode) -> Option<LabelledNode> {
        let child = self.inner.next_ref(&node.base)?;
        Some(self.child_label(node, child))
    }

    fn next_alt(&self, node: &LabelledNode) -> Option<LabelledNode> {
        let child = self.inner.next_alt(&node.base)?;
        Some(self.child_label(node, child))
    }
}

impl<T> RcmsView for Labelled<T>
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
    use crate::rcms::{OwnedReference, Rcms, RootedRcms};
    use crate::tree::base::BaseTree;
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
    fn node_only_label_is_just_the_segment() {
        let rcms = sample_rcms();
        let base = BaseTree::new(RootedRcms::new(&rcms));
        let labelled = Labelled::new(base, LabelMode::NodeOnly);

        let root = labelled.root();
        let branch = labelled.next_ref(&root).unwrap();
        assert_eq!(branch.label.sequence(), b"AAAA");
    }

    #[test]
    fn alt_edge_restricts_coverage_to_the_variant() {
        let rcms = sample_rcms();
        let base = BaseTree::new(RootedRcms::new(&rcms));
        let labelled = Labelled::new(base, LabelMode::NodeOnly);

        let root = labelled.root();
        let branch = labelled.next_ref(&root).unwrap();
        let alt = labelled.next_alt(&branch).unwrap();
        assert_eq!(alt.label.sequence(), b"G");
        assert!(alt.label.coverage().contains(0));
        assert!(!alt.label.coverage().contains(1));
    }

    #[test]
    fn declining_ref_edge_excludes_the_variants_coverage() {
        let rcms = sample_rcms();
        let base = BaseTree::new(RootedRcms::new(&rcms));
        let labelled = Labelled::new(base, LabelMode::NodeOnly);

        let root = labelled.root();
        let branch = labelled.next_ref(&root).unwrap();
        let declined = labelled.next_ref(&branch).unwrap();
        assert!(!declined.label.coverage().contains(0));
        assert!(declined.label.coverage().contains(1));
    }

    #[test]
    fn root_path_mode_concatenates_from_the_root() {
        let rcms = sample_rcms();
        let base = BaseTree::new(RootedRcms::new(&rcms));
        let labelled = Labelled::new(base, LabelMode::RootPath);

        let root = labelled.root();
        let branch = labelled.next_ref(&root).unwrap();
        let declined = labelled.next_ref(&branch).unwrap();
        assert_eq!(declined.label.sequence(), b"AAAAC");
    }
}
