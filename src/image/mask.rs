//! Packed 1-bit plane used for transparency masks and selection shapes.

const WORD_BITS: usize = 64;

/// Row-major bit plane; a set bit means opaque (or inside a shape).
///
/// Padding bits past `w` in each row are kept clear so that equality is
/// structural.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BitMask {
    w: usize,
    h: usize,
    words_per_row: usize,
    bits: Vec<u64>,
}

impl BitMask {
    pub fn new(w: usize, h: usize, fill: bool) -> Self {
        let words_per_row = w.div_ceil(WORD_BITS);
        let mut mask = Self {
            w,
            h,
            words_per_row,
            bits: vec![0; words_per_row * h],
        };
        if fill {
            mask.fill(true);
        }
        mask
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        debug_assert!(x < self.w && y < self.h);
        let word = self.bits[y * self.words_per_row + x / WORD_BITS];
        (word >> (x % WORD_BITS)) & 1 == 1
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        debug_assert!(x < self.w && y < self.h);
        let word = &mut self.bits[y * self.words_per_row + x / WORD_BITS];
        let bit = 1u64 << (x % WORD_BITS);
        if value {
            *word |= bit;
        } else {
            *word &= !bit;
        }
    }

    pub fn fill(&mut self, value: bool) {
        if !value {
            self.bits.fill(0);
            return;
        }
        let tail = self.w % WORD_BITS;
        for row in self.bits.chunks_exact_mut(self.words_per_row.max(1)) {
            row.fill(u64::MAX);
            if tail != 0 {
                if let Some(last) = row.last_mut() {
                    *last = (1u64 << tail) - 1;
                }
            }
        }
    }

    /// Number of set bits.
    pub fn count_set(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_all_set(&self) -> bool {
        self.count_set() == self.w * self.h
    }
}
