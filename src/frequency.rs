use std::ops::{Index, IndexMut};

pub const ALPHABET_SIZE: usize = 256;

/// Occurrence count of every byte value; index = byte value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    counts: [u32; ALPHABET_SIZE],
}

impl Default for FrequencyTable {
    fn default() -> Self {
        Self {
            counts: [0; ALPHABET_SIZE],
        }
    }
}

impl FrequencyTable {
    pub fn of(bytes: &[u8]) -> Self {
        let mut table = Self::default();
        for &byte in bytes {
            table.counts[byte as usize] += 1;
        }
        table
    }

    pub fn from_counts(counts: [u32; ALPHABET_SIZE]) -> Self {
        Self { counts }
    }

    pub fn counts(&self) -> &[u32; ALPHABET_SIZE] {
        &self.counts
    }

    /// Sum of all entries, i.e. the length of the source data.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| c as u64).sum()
    }

    /// Number of symbols with a non-zero count.
    pub fn distinct(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    /// Present symbols in ascending byte order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(|(symbol, &count)| (symbol as u8, count))
    }
}

impl Index<u8> for FrequencyTable {
    type Output = u32;

    fn index(&self, symbol: u8) -> &u32 {
        &self.counts[symbol as usize]
    }
}

impl IndexMut<u8> for FrequencyTable {
    fn index_mut(&mut self, symbol: u8) -> &mut u32 {
        &mut self.counts[symbol as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_every_byte() {
        let table = FrequencyTable::of(b"aaab");
        assert_eq!(table[b'a'], 3);
        assert_eq!(table[b'b'], 1);
        assert_eq!(table.total(), 4);
        assert_eq!(table.distinct(), 2);
        assert_eq!(table.iter().collect::<Vec<_>>(), vec![(b'a', 3), (b'b', 1)]);
    }

    #[test]
    fn empty_input() {
        let table = FrequencyTable::of(&[]);
        assert!(table.is_empty());
        assert_eq!(table.total(), 0);
        assert_eq!(table.iter().count(), 0);
    }
}
