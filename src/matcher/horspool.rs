//! Boyer-Moore-Horspool: exact matching, no stateful capture.

use crate::err::MatcherError;

use super::{validate_needle, Matcher};

const ALPHABET: usize = 256;

pub struct Horspool {
    needle: Vec<u8>,
    shift: [usize; ALPHABET],
}

impl Horspool {
    pub fn new(needle: &[u8]) -> Result<Self, MatcherError> {
        validate_needle(needle)?;
        let m = needle.len();
        let mut shift = [m; ALPHABET];
        for (i, &b) in needle[..m - 1].iter().enumerate() {
            shift[b as usize] = m - 1 - i;
        }
        Ok(Self {
            needle: needle.to_vec(),
            shift,
        })
    }
}

impl Matcher for Horspool {
    fn window_size(&self) -> usize {
        self.needle.len()
    }

    fn call(&mut self, haystack: &[u8], emit: &mut dyn FnMut(usize)) {
        let m = self.needle.len();
        if haystack.len() < m {
            return;
        }
        let mut i = 0;
        while i + m <= haystack.len() {
            let window = &haystack[i..i + m];
            if window == self.needle.as_slice() {
                emit(i + m);
            }
            if i + m == haystack.len() {
                break;
            }
            let last = haystack[i + m - 1];
            i += self.shift[last as usize];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_all_occurrences() {
        let mut m = Horspool::new(b"ana").unwrap();
        let mut ends = Vec::new();
        m.call(b"banana", &mut |e| ends.push(e));
        assert_eq!(ends, vec![4, 6]);
    }

    #[test]
    fn rejects_empty_needle() {
        assert!(matches!(Horspool::new(b""), Err(MatcherError::EmptyNeedle)));
    }

    #[test]
    fn no_match_on_short_haystack() {
        let mut m = Horspool::new(b"ACGT").unwrap();
        let mut ends = Vec::new();
        m.call(b"AC", &mut |e| ends.push(e));
        assert!(ends.is_empty());
    }
}
