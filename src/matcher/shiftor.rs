//! Shift-Or (Bitap): exact matching with a restorable bit-parallel state.

use crate::err::MatcherError;

use super::{validate_needle, Matcher, Restorable};

const WORD_BITS: usize = 64;

pub struct ShiftOr {
    needle_len: usize,
    masks: Vec<Vec<u64>>,
    register: Vec<u64>,
}

impl ShiftOr {
    pub fn new(needle: &[u8]) -> Result<Self, MatcherError> {
        validate_needle(needle)?;
        let m = needle.len();
        let word_count = m.div_ceil(WORD_BITS);
        let mut masks = vec![vec![!0u64; word_count]; 256];
        for (j, &b) in needle.iter().enumerate() {
            masks[b as usize][j / WORD_BITS] &= !(1u64 << (j % WORD_BITS));
        }
        Ok(Self {
            needle_len: m,
            masks,
            register: vec![!0u64; word_count],
        })
    }

    /// Reset to the state before any character was fed, discarding
    /// whatever the running match history was.
    pub fn reset(&mut self) {
        self.register.iter_mut().for_each(|w| *w = !0u64);
    }

    fn step(&mut self, c: u8) {
        let mut carry = 0u64;
        for word in self.register.iter_mut() {
            let new_carry = *word >> 63;
            *word = (*word << 1) | carry;
            carry = new_carry;
        }
        let mask = &self.masks[c as usize];
        for (w, m) in self.register.iter_mut().zip(mask.iter()) {
            *w |= *m;
        }
    }

    fn is_match(&self) -> bool {
        let idx = self.needle_len - 1;
        self.register[idx / WORD_BITS] & (1u64 << (idx % WORD_BITS)) == 0
    }
}

impl Matcher for ShiftOr {
    fn window_size(&self) -> usize {
        self.needle_len
    }

    fn call(&mut self, haystack: &[u8], emit: &mut dyn FnMut(usize)) {
        for (i, &c) in haystack.iter().enumerate() {
            self.step(c);
            if self.is_match() {
                emit(i + 1);
            }
        }
    }
}

impl Restorable for ShiftOr {
    type State = Vec<u64>;

    fn capture(&self) -> Self::State {
        self.register.clone()
    }

    fn restore(&mut self, state: Self::State) {
        self.register = state;
    }
}
