const WORD_BITS: usize = u64::BITS as usize;

/// Number of `u64` words needed to hold `len` bits
pub fn words_for(len: usize) -> usize {
    len.div_ceil(WORD_BITS)
}

/// Tests bit `index` in a raw word slice
#[inline]
pub fn test_bit(words: &[u64], index: usize) -> bool {
    words
        .get(index / WORD_BITS)
        .is_some_and(|w| (w >> (index % WORD_BITS)) & 1 == 1)
}

/// Fixed-width bit vector of reachable sums.
///
/// Bits at or above `len` are always zero, so shifting never lets a sum
/// larger than the tracked range leak back in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitSet {
    words: Vec<u64>,
    len: usize,
}

impl BitSet {
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; words_for(len)],
            len,
        }
    }

    pub fn as_words(&self) -> &[u64] {
        &self.words
    }

    /// Overwrites the contents with a snapshot of the same width
    pub fn copy_from(&mut self, words: &[u64]) {
        self.words.copy_from_slice(words);
    }

    pub fn set(&mut self, index: usize) {
        if index < self.len {
            self.words[index / WORD_BITS] |= 1 << (index % WORD_BITS);
        }
    }

    pub fn test(&self, index: usize) -> bool {
        index < self.len && test_bit(&self.words, index)
    }

    /// `self |= self << shift`, truncated to the width of the set
    pub fn or_shifted(&mut self, shift: usize) {
        if shift == 0 || shift >= self.len {
            return;
        }

        let word_shift = shift / WORD_BITS;
        let bit_shift = shift % WORD_BITS;

        // Walk from the top so every source word is read before it is written.
        for i in (word_shift..self.words.len()).rev() {
            let src = i - word_shift;
            let mut shifted = self.words[src] << bit_shift;
            if bit_shift != 0 && src > 0 {
                shifted |= self.words[src - 1] >> (WORD_BITS - bit_shift);
            }
            self.words[i] |= shifted;
        }

        self.mask_tail();
    }

    fn mask_tail(&mut self) {
        let rem = self.len % WORD_BITS;
        if rem != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << rem) - 1;
            }
        }
    }
}
