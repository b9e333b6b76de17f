//! Bit-packed storage shared by phase workers.
//!
//! Words are `AtomicU64`; a field write replaces only the field's bits of
//! the containing word(s) with a compare-and-swap loop, so workers writing
//! different fields never lose each other's updates. Phase barriers provide
//! the happens-before edges, so relaxed ordering is enough.

use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, Ordering};

/// Mask of the `width` low bits.
#[inline(always)]
pub const fn low_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

#[inline(always)]
fn replace_bits(word: &AtomicU64, mask: u64, bits: u64) {
    let _ = word.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |w| {
        Some((w & !mask) | bits)
    });
}

/// A flat run of bits addressed by bit offset.
#[derive(Debug)]
pub struct BitBuffer {
    words: Vec<AtomicU64>,
    len_bits: u64,
}

impl Clone for BitBuffer {
    fn clone(&self) -> Self {
        Self {
            words: self
                .words
                .iter()
                .map(|w| AtomicU64::new(w.load(Ordering::Relaxed)))
                .collect(),
            len_bits: self.len_bits,
        }
    }
}

impl BitBuffer {
    pub fn new(len_bits: u64) -> Self {
        let words = len_bits.div_ceil(64) as usize;
        Self {
            words: (0..words).map(|_| AtomicU64::new(0)).collect(),
            len_bits,
        }
    }

    #[inline(always)]
    fn check_range(&self, offset: u64, width: u32) {
        assert!(
            (1..=64).contains(&width),
            "bit field width {width} outside 1..=64"
        );
        assert!(
            offset + u64::from(width) <= self.len_bits,
            "bit field {offset}+{width} outside buffer of {} bits",
            self.len_bits
        );
    }

    /// Reads `width` bits starting at bit `offset`.
    #[inline]
    pub fn load(&self, offset: u64, width: u32) -> u64 {
        self.check_range(offset, width);
        let word = (offset / 64) as usize;
        let bit = (offset % 64) as u32;
        let low = self.words[word].load(Ordering::Relaxed) >> bit;
        if bit + width <= 64 {
            low & low_mask(width)
        } else {
            let low_width = 64 - bit;
            let high = self.words[word + 1].load(Ordering::Relaxed) & low_mask(width - low_width);
            low | (high << low_width)
        }
    }

    /// Writes `value` into `width` bits starting at bit `offset`.
    ///
    /// # Panics
    /// When `value` does not fit in `width` bits.
    #[inline]
    pub fn store(&self, offset: u64, width: u32, value: u64) {
        self.check_range(offset, width);
        assert!(
            value <= low_mask(width),
            "value {value:#x} does not fit in {width} bits"
        );
        let word = (offset / 64) as usize;
        let bit = (offset % 64) as u32;
        if bit + width <= 64 {
            replace_bits(&self.words[word], low_mask(width) << bit, value << bit);
        } else {
            let low_width = 64 - bit;
            replace_bits(
                &self.words[word],
                low_mask(low_width) << bit,
                (value & low_mask(low_width)) << bit,
            );
            replace_bits(
                &self.words[word + 1],
                low_mask(width - low_width),
                value >> low_width,
            );
        }
    }

    pub(crate) fn digest_into(&self, hasher: &mut Sha256) {
        hasher.update(self.len_bits.to_le_bytes());
        for w in &self.words {
            hasher.update(w.load(Ordering::Relaxed).to_le_bytes());
        }
    }
}

/// `len` fields of `width` bits each, packed back to back.
#[derive(Debug, Clone)]
pub struct PackedArray {
    bits: BitBuffer,
    width: u32,
    len: usize,
}

impl PackedArray {
    /// # Panics
    /// When `width` is outside `1..=64`.
    pub fn new(len: usize, width: u32) -> Self {
        assert!((1..=64).contains(&width), "field width {width} outside 1..=64");
        Self {
            bits: BitBuffer::new(len as u64 * u64::from(width)),
            width,
            len,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn offset(&self, index: usize) -> u64 {
        assert!(
            index < self.len,
            "field {index} outside packed array of {}",
            self.len
        );
        index as u64 * u64::from(self.width)
    }

    #[inline]
    pub fn get(&self, index: usize) -> u64 {
        self.bits.load(self.offset(index), self.width)
    }

    #[inline]
    pub fn set(&self, index: usize, value: u64) {
        self.bits.store(self.offset(index), self.width, value);
    }

    pub(crate) fn digest_into(&self, hasher: &mut Sha256) {
        self.bits.digest_into(hasher);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_low_mask() {
        assert_eq!(low_mask(1), 1);
        assert_eq!(low_mask(3), 0b111);
        assert_eq!(low_mask(64), u64::MAX);
    }

    #[test]
    fn test_store_load_within_word() {
        let buf = BitBuffer::new(128);
        buf.store(5, 7, 0x55);
        assert_eq!(buf.load(5, 7), 0x55);
        assert_eq!(buf.load(0, 5), 0);
        assert_eq!(buf.load(12, 10), 0);
    }

    #[test]
    fn test_store_load_across_words() {
        let buf = BitBuffer::new(192);
        buf.store(60, 10, 0x3FF);
        assert_eq!(buf.load(60, 10), 0x3FF);
        assert_eq!(buf.load(56, 4), 0);
        assert_eq!(buf.load(70, 8), 0);
        buf.store(100, 64, u64::MAX - 1);
        assert_eq!(buf.load(100, 64), u64::MAX - 1);
    }

    #[test]
    fn test_neighbouring_fields_are_untouched() {
        let arr = PackedArray::new(20, 13);
        for i in 0..20 {
            arr.set(i, (i as u64 * 977) & low_mask(13));
        }
        arr.set(9, 0);
        for i in (0..20).filter(|&i| i != 9) {
            assert_eq!(arr.get(i), (i as u64 * 977) & low_mask(13));
        }
    }

    #[test]
    #[should_panic(expected = "does not fit")]
    fn test_oversized_value_panics() {
        let arr = PackedArray::new(2, 3);
        arr.set(0, 8);
    }

    #[test]
    #[should_panic(expected = "outside packed array")]
    fn test_out_of_range_index_panics() {
        let arr = PackedArray::new(2, 3);
        arr.get(2);
    }

    #[test]
    fn test_concurrent_writes_to_shared_words() {
        let arr = Arc::new(PackedArray::new(256, 5));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let arr = Arc::clone(&arr);
                std::thread::spawn(move || {
                    for round in 0..200u64 {
                        for i in (t..256).step_by(4) {
                            arr.set(i, (round + i as u64) % 32);
                        }
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        for i in 0..256 {
            assert_eq!(arr.get(i), (199 + i as u64) % 32);
        }
    }

    #[test]
    fn test_clone_copies_contents() {
        let arr = PackedArray::new(4, 9);
        arr.set(3, 300);
        let copy = arr.clone();
        arr.set(3, 1);
        assert_eq!(copy.get(3), 300);
    }
}
