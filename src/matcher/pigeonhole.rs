//! Pigeonhole seed filter: splits a needle into `k+1` equal-length seeds
//! and matches each exactly, as a cheap pre-stage for a full approximate
//! matcher.

use crate::err::MatcherError;

use super::horspool::Horspool;
use super::{validate_needle, Matcher};

struct Seed {
    needle_id: usize,
    seed_offset: usize,
    pattern: Vec<u8>,
}

pub struct Pigeonhole {
    seeds: Vec<Seed>,
}

impl Pigeonhole {
    /// Build seeds for every needle, each split into `max_errors + 1`
    /// equal-length pieces. By the pigeonhole principle, any occurrence
    /// with at most `max_errors` edits must match at least one seed
    /// exactly.
    pub fn new(needles: &[Vec<u8>], max_errors: u32) -> Result<Self, MatcherError> {
        let num_seeds = (max_errors + 1) as usize;
        let mut seeds = Vec::new();
        for (needle_id, needle) in needles.iter().enumerate() {
            validate_needle(needle)?;
            let seed_len = needle.len() / num_seeds;
            if seed_len == 0 {
                return Err(MatcherError::EmptyNeedle);
            }
            for s in 0..num_seeds {
                let offset = s * seed_len;
                seeds.push(Seed {
                    needle_id,
                    seed_offset: offset,
                    pattern: needle[offset..offset + seed_len].to_vec(),
                });
            }
        }
        Ok(Self { seeds })
    }

    /// `(needle_id, seed_offset, end_position)` for every exact seed hit.
    pub fn query(&self, haystack: &[u8]) -> Vec<(usize, usize, usize)> {
        let mut hits = Vec::new();
        for seed in &self.seeds {
            let mut matcher =
                Horspool::new(&seed.pattern).expect("seeds are validated non-empty at construction");
            matcher.call(haystack, &mut |end| hits.push((seed.needle_id, seed.seed_offset, end)));
        }
        hits
    }
}

/// Adapts [`Pigeonhole`] to the single-needle [`Matcher`] contract, so the
/// CLI's `--matcher pigeonhole` selection has something to run: every seed
/// hit's end position is projected forward to where the *full* needle would
/// end if the match were gapless from that seed (an approximation — a real
/// verification stage would confirm the surrounding ≤k edits, which is out
/// of scope here).
pub struct PigeonholeMatcher {
    filter: Pigeonhole,
    needle_len: usize,
}

impl PigeonholeMatcher {
    pub fn new(needle: &[u8], max_errors: u32) -> Result<Self, MatcherError> {
        let filter = Pigeonhole::new(std::slice::from_ref(&needle.to_vec()), max_errors)?;
        Ok(Self {
            filter,
            needle_len: needle.len(),
        })
    }
}

impl Matcher for PigeonholeMatcher {
    fn window_size(&self) -> usize {
        self.needle_len
    }

    fn call(&mut self, haystack: &[u8], emit: &mut dyn FnMut(usize)) {
        for (_, seed_offset, seed_end) in self.filter.query(haystack) {
            let consumed = seed_offset + (seed_end.saturating_sub(seed_offset));
            let projected_end = seed_end + self.needle_len.saturating_sub(consumed);
            emit(projected_end.min(haystack.len()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_into_k_plus_one_seeds() {
        let filter = Pigeonhole::new(&[b"ACGTACGT".to_vec()], 1).unwrap();
        assert_eq!(filter.seeds.len(), 2);
        assert_eq!(filter.seeds[0].pattern, b"ACGT");
        assert_eq!(filter.seeds[1].pattern, b"ACGT");
    }

    #[test]
    fn query_reports_needle_and_seed_offset() {
        let filter = Pigeonhole::new(&[b"ACGT".to_vec()], 0).unwrap();
        let hits = filter.query(b"TTACGTTT");
        assert_eq!(hits, vec![(0, 0, 6)]);
    }

    #[test]
    fn rejects_needle_too_short_to_seed() {
        let err = Pigeonhole::new(&[b"A".to_vec()], 3).unwrap_err();
        assert!(matches!(err, MatcherError::EmptyNeedle));
    }

    #[test]
    fn pigeonhole_matcher_finds_an_exact_match() {
        let mut matcher = PigeonholeMatcher::new(b"ACGT", 0).unwrap();
        let mut ends = Vec::new();
        matcher.call(b"TTACGTTT", &mut |end| ends.push(end));
        assert_eq!(ends, vec![6]);
    }

    #[test]
    fn pigeonhole_matcher_window_size_is_the_needle_length() {
        let matcher = PigeonholeMatcher::new(b"ACGTACGT", 1).unwrap();
        assert_eq!(matcher.window_size(), 8);
    }

    #[test]
    fn pigeonhole_matcher_projects_past_a_seed_hit_near_the_end() {
        // With 1 allowed error the needle splits into two 4-base seeds; a
        // hit on the second seed alone must still project to a full-needle
        // end, not just the seed's own end.
        let mut matcher = PigeonholeMatcher::new(b"ACGTACGT", 1).unwrap();
        let mut ends = Vec::new();
        matcher.call(b"TTTTACGT", &mut |end| ends.push(end));
        assert!(ends.contains(&8));
    }
}
