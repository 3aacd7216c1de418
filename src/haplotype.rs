//! Haplotype viewer: materializes one haplotype by replaying the RCMS's
//! variants in store order.

use crate::rcms::Rcms;

/// One contiguous span contributed to a haplotype's sequence, either a
/// reference slice or a spliced-in alternate sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Span {
    Reference { start: u64, end: u64 },
    Alternate { variant_index: usize },
}

pub struct HaplotypeViewer<'r> {
    rcms: &'r Rcms,
}

impl<'r> HaplotypeViewer<'r> {
    pub fn new(rcms: &'r Rcms) -> Self {
        Self { rcms }
    }

    /// Materialize haplotype `i`'s full sequence.
    pub fn materialize(&self, i: usize) -> Vec<u8> {
        let mut out = Vec::new();
        let mut cursor = 0u64;
        for variant in self.rcms.variants() {
            let bp = variant.breakpoint();
            if variant.coverage().contains(i) {
                out.extend_from_slice(&self.rcms.sequence()[cursor as usize..bp.low_breakend as usize]);
                out.extend_from_slice(&variant.alt_sequence());
                cursor = bp.high_breakend as u64;
            }
        }
        out.extend_from_slice(&self.rcms.sequence()[cursor as usize..]);
        out
    }

    /// Length of haplotype `i`'s sequence, without materializing it.
    pub fn haplotype_length(&self, i: usize) -> u64 {
        let mut len = 0u64;
        let mut cursor = 0u64;
        for variant in self.rcms.variants() {
            let bp = variant.breakpoint();
            if variant.coverage().contains(i) {
                len += bp.low_breakend as u64 - cursor;
                len += variant.alt_sequence().len() as u64;
                cursor = bp.high_breakend as u64;
            }
        }
        len += self.rcms.seq_len() - cursor;
        len
    }

    /// Iterate the spans that make up haplotype `i`, in order, without
    /// allocating the materialized sequence.
    pub fn iter_spans(&self, i: usize) -> impl Iterator<Item = Span> + '_ {
        let mut cursor = 0u64;
        let mut spans = Vec::new();
        for (index, variant) in self.rcms.variants().iter().enumerate() {
            let bp = variant.breakpoint();
            if variant.coverage().contains(i) {
                if bp.low_breakend as u64 > cursor {
                    spans.push(Span::Reference {
                        start: cursor,
                        end: bp.low_breakend as u64,
                    });
                }
                spans.push(Span::Alternate { variant_index: index });
                cursor = bp.high_breakend as u64;
            }
        }
        if cursor < self.rcms.seq_len() {
            spans.push(Span::Reference {
                start: cursor,
                end: self.rcms.seq_len(),
            });
        }
        spans.into_iter()
    }
}
