//! Search orchestrator: for each needle, consults the
//! pre-filter for candidate bins, builds that bin's search tree, and runs
//! the traversal with the configured matcher, translating every match into
//! a [`Hit`].

use std::collections::HashSet;
use std::ops::ControlFlow;
use std::sync::Mutex;

use rayon::prelude::*;

use crate::coverage::Coverage;
use crate::err::AppError;
use crate::matcher::horspool::Horspool;
use crate::matcher::myers::Myers;
use crate::matcher::pigeonhole::PigeonholeMatcher;
use crate::matcher::shiftor::ShiftOr;
use crate::matcher::Matcher;
use crate::prefilter::Ibf;
use crate::rcms::RootedRcms;
use crate::traversal::{Observer, Traversal};
use crate::tree::base::BaseTree;
use crate::tree::chunk::{Bin, BoundedTree};
use crate::tree::coloured::{Coloured, ColouredNode};
use crate::tree::labelled::{LabelAccess, LabelMode, Labelled, LabelledNode};
use crate::tree::left_extend::LeftExtend;
use crate::tree::merge::Merge;
use crate::tree::prune::PruneUnsupported;
use crate::tree::trim::{Trim, TrimmedNode};
use crate::tree::volatile::Volatile;
use crate::tree::{RcmsView, Site};
use crate::variant::EndMarker;

/// Which matcher the CLI's `--matcher` flag selected.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
#[clap(rename_all = "lowercase")]
pub enum MatcherKind {
    Horspool,
    ShiftOr,
    Myers,
    Pigeonhole,
}

/// One query sequence to search for, tagged with the id reported on its hits.
pub struct Needle {
    pub id: u32,
    pub sequence: Vec<u8>,
}

/// One match, translated from tree coordinates into the external record
/// shape. `reference_begin`/`reference_end` bound the node's
/// own span on the variant axis; `label_offset` is the match end's signed
/// offset from the end of the node's (possibly trimmed) materialized label
/// — zero or negative, and exact only when the span is pure reference, since
/// content inside an alt/insertion span has no intrinsic sub-position.
#[derive(Clone, Debug, PartialEq)]
pub struct Hit {
    pub needle_id: u32,
    pub bin_id: u32,
    pub haplotype_coverage: Coverage,
    pub reference_begin: u64,
    pub reference_end: u64,
    pub label_offset: i64,
}

/// Where hits go. `emit` returning `Break` cancels the remainder of the
/// search the way a full-buffer writer or a `head -n` consumer would.
pub trait HitSink {
    fn emit(&self, hit: Hit) -> ControlFlow<(), ()>;
}

/// Collects every hit in memory, backing both tests and the `search` CLI
/// subcommand's writer.
#[derive(Default)]
pub struct VecSink {
    hits: Mutex<Vec<Hit>>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_hits(self) -> Vec<Hit> {
        self.hits.into_inner().expect("hit sink mutex poisoned")
    }
}

impl HitSink for VecSink {
    fn emit(&self, hit: Hit) -> ControlFlow<(), ()> {
        self.hits.lock().expect("hit sink mutex poisoned").push(hit);
        ControlFlow::Continue(())
    }
}

type SearchNode = TrimmedNode<ColouredNode<LabelledNode>>;
type SearchTree<'r> =
    Merge<LeftExtend<PruneUnsupported<Trim<Coloured<Labelled<Volatile<BoundedTree<BaseTree<'r>>>>>>>>>;

/// Run every needle against the RCMS, optionally pinning the rayon global
/// thread pool to `thread_count` (gated on an optional CLI argument, e.g.
/// `ThreadPoolBuilder::new().num_threads(n).build_global()`).
pub fn search(
    rooted: &RootedRcms<'_>,
    ibf: &Ibf,
    needles: &[Needle],
    matcher_kind: MatcherKind,
    max_errors: u32,
    thread_count: Option<usize>,
    sink: &(dyn HitSink + Sync),
) -> Result<(), AppError> {
    if let Some(n) = thread_count {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .map_err(|e| AppError::Domain(e.to_string()))?;
    }

    let seen: Mutex<HashSet<(u32, u64)>> = Mutex::new(HashSet::new());
    needles
        .par_iter()
        .try_for_each(|needle| search_needle(rooted, ibf, needle, matcher_kind, max_errors, &seen, sink))
}

fn search_needle(
    rooted: &RootedRcms<'_>,
    ibf: &Ibf,
    needle: &Needle,
    matcher_kind: MatcherKind,
    max_errors: u32,
    seen: &Mutex<HashSet<(u32, u64)>>,
    sink: &(dyn HitSink + Sync),
) -> Result<(), AppError> {
    let candidates = ibf.query(&needle.sequence, max_errors);
    for bin in ibf.bins().iter().filter(|b| candidates.contains(&b.index)) {
        search_bin(rooted, bin, needle, matcher_kind, max_errors, seen, sink)?;
    }
    Ok(())
}

fn search_bin(
    rooted: &RootedRcms<'_>,
    bin: &Bin,
    needle: &Needle,
    matcher_kind: MatcherKind,
    max_errors: u32,
    seen: &Mutex<HashSet<(u32, u64)>>,
    sink: &(dyn HitSink + Sync),
) -> Result<(), AppError> {
    let window = match matcher_kind {
        MatcherKind::Myers => needle.sequence.len() + max_errors as usize,
        MatcherKind::Horspool | MatcherKind::ShiftOr | MatcherKind::Pigeonhole => needle.sequence.len(),
    };
    let trim_window = window.saturating_sub(1);

    let base = BaseTree::new(RootedRcms::new(rooted.rcms()));
    let bounded = BoundedTree::new(base, bin);
    let volatile = Volatile::new(bounded);
    let labelled = Labelled::new(volatile, LabelMode::RootPath);
    let coloured = Coloured::new(labelled);
    let trimmed = Trim::new(coloured, trim_window);
    let pruned = PruneUnsupported::new(trimmed);
    let extended = LeftExtend::new(pruned, trim_window, LabelMode::RootPath);
    let tree = Merge::new(extended);

    match matcher_kind {
        MatcherKind::ShiftOr => {
            let matcher = ShiftOr::new(&needle.sequence)?;
            run_restorable(tree, matcher, needle.id, bin.index as u32, seen, sink)
        }
        MatcherKind::Horspool => {
            let needle_bytes = needle.sequence.clone();
            run_oblivious(
                tree,
                move || Horspool::new(&needle_bytes).expect("needle already validated"),
                needle.id,
                bin.index as u32,
                seen,
                sink,
            )
        }
        MatcherKind::Myers => {
            Myers::new(&needle.sequence, max_errors)?;
            let needle_bytes = needle.sequence.clone();
            run_oblivious(
                tree,
                move || Myers::new(&needle_bytes, max_errors).expect("needle already validated above"),
                needle.id,
                bin.index as u32,
                seen,
                sink,
            )
        }
        MatcherKind::Pigeonhole => {
            let needle_bytes = needle.sequence.clone();
            run_oblivious(
                tree,
                move || PigeonholeMatcher::new(&needle_bytes, max_errors).expect("needle already validated"),
                needle.id,
                bin.index as u32,
                seen,
                sink,
            )
        }
    }
}

/// Feeds a [`ShiftOr`] matcher incrementally: each visited node's label is a
/// growing (possibly trimmed) prefix of the one before it, so only the new
/// suffix since the last visited node needs feeding. `on_push`/`on_pop`
/// save and restore the matcher's bit-register — and how much of the label
/// had been fed — around an alt excursion, so backtracking to a declined
/// sibling resumes from the state the branch point actually had.
struct RestorableSession {
    matcher: ShiftOr,
    prev_len: usize,
    stack: Vec<(Vec<u64>, usize)>,
}

impl Observer<SearchNode> for RestorableSession {
    fn on_push(&mut self, _node: &SearchNode) {
        self.stack.push((self.matcher.capture(), self.prev_len));
    }

    fn on_pop(&mut self, _node: &SearchNode) {
        if let Some((state, len)) = self.stack.pop() {
            self.matcher.restore(state);
            self.prev_len = len;
        }
    }
}

impl RestorableSession {
    /// Returns match end positions local to `node`'s label.
    fn feed(&mut self, node: &SearchNode) -> Vec<usize> {
        let seq = node.label().sequence();
        let start = self.prev_len.min(seq.len());
        let mut ends = Vec::new();
        self.matcher.call(&seq[start..], &mut |local| ends.push(start + local));
        self.prev_len = seq.len();
        ends
    }
}

fn run_restorable(
    tree: SearchTree<'_>,
    matcher: ShiftOr,
    needle_id: u32,
    bin_id: u32,
    seen: &Mutex<HashSet<(u32, u64)>>,
    sink: &(dyn HitSink + Sync),
) -> Result<(), AppError> {
    let mut session = RestorableSession {
        matcher,
        prev_len: 0,
        stack: Vec::new(),
    };
    let mut driver = Traversal::new(tree);
    loop {
        let node = {
            let mut observers: Vec<&mut dyn Observer<SearchNode>> = vec![&mut session];
            driver.step(&mut observers)
        };
        let Some(node) = node else { break };
        for local_end in session.feed(&node) {
            emit_hit(driver.tree(), &node, local_end, needle_id, bin_id, seen, sink)?;
        }
    }
    Ok(())
}

/// Oblivious matchers carry no restorable state, so each visited node gets
/// a freshly constructed instance scanned over the node's whole (trimmed
/// and left-extended, hence already window-bounded) label — equivalent to
/// re-running from scratch on "parent's trailing context + this node's new
/// content" without needing push/pop bookkeeping at all.
fn run_oblivious<M, F>(
    tree: SearchTree<'_>,
    mut factory: F,
    needle_id: u32,
    bin_id: u32,
    seen: &Mutex<HashSet<(u32, u64)>>,
    sink: &(dyn HitSink + Sync),
) -> Result<(), AppError>
where
    M: Matcher,
    F: FnMut() -> M,
{
    let mut driver = Traversal::new(tree);
    loop {
        let node = driver.step(&mut []);
        let Some(node) = node else { break };
        let seq = node.label().sequence().to_vec();
        let mut matcher = factory();
        let mut ends = Vec::new();
        matcher.call(&seq, &mut |local| ends.push(local));
        for local_end in ends {
            emit_hit(driver.tree(), &node, local_end, needle_id, bin_id, seen, sink)?;
        }
    }
    Ok(())
}

fn site_position(rcms_view: &impl RcmsView, site: Site) -> u32 {
    let v = rcms_view.variant_at(site.variant_index);
    match site.end {
        EndMarker::Low => v.breakpoint().low_breakend,
        EndMarker::High => v.breakpoint().high_breakend,
    }
}

fn node_span(rcms_view: &impl RcmsView, node: &SearchNode) -> (u64, u64) {
    let base = node.inner.inner.base;
    (
        site_position(rcms_view, base.low_site) as u64,
        site_position(rcms_view, base.high_site) as u64,
    )
}

/// Deduplicates on `(needle_id, reference_begin)` — repeats of the same
/// needle finding the same starting position across different traversal
/// paths are suppressed; distinct starting positions are always reported.
fn emit_hit(
    tree: &SearchTree<'_>,
    node: &SearchNode,
    local_end: usize,
    needle_id: u32,
    bin_id: u32,
    seen: &Mutex<HashSet<(u32, u64)>>,
    sink: &(dyn HitSink + Sync),
) -> Result<(), AppError> {
    let (begin, end) = node_span(tree, node);
    let label_len = node.label().sequence().len();
    let label_offset = local_end as i64 - label_len as i64;

    {
        let mut seen_guard = seen.lock().expect("dedup set mutex poisoned");
        if !seen_guard.insert((needle_id, begin)) {
            return Ok(());
        }
    }

    let hit = Hit {
        needle_id,
        bin_id,
        haplotype_coverage: node.label().coverage().clone(),
        reference_begin: begin,
        reference_end: end,
        label_offset,
    };
    match sink.emit(hit) {
        ControlFlow::Continue(()) => Ok(()),
        ControlFlow::Break(()) => Err(AppError::Cancelled),
    }
}
