use crate::math::bit_math::{
    closest_bit_left, closest_bit_right, least_significant_bit, most_significant_bit,
};
use crate::FastMap;
use alloy_primitives::U256;

/// Three-level sparse bitmap over the 24-bit bin-id space.
///
/// A bit is set at every level along the 8/8/8 path to an id iff that bin is
/// populated. `level2` words are keyed by `id >> 8`, `level1` words by
/// `id >> 16`, and the single `level0` word indexes the `level1` keys, which
/// keeps neighbor searches bounded by the tree depth regardless of how far
/// apart populated bins are.
#[derive(Clone, Debug, Default)]
pub struct TreeIndex {
    level0: U256,
    level1: FastMap<u8, U256>,
    level2: FastMap<u16, U256>,
}

impl TreeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` is present in the index.
    pub fn contains(&self, id: u32) -> bool {
        let key2 = (id >> 8) as u16;
        self.level2
            .get(&key2)
            .is_some_and(|word| word.bit((id & 0xff) as usize))
    }

    /// Marks `id` as populated. Returns `false` if it was already present.
    pub fn add(&mut self, id: u32) -> bool {
        let key2 = (id >> 8) as u16;
        let bit2 = (id & 0xff) as u8;

        let word = self.level2.entry(key2).or_default();
        if word.bit(bit2 as usize) {
            return false;
        }
        let leaf_was_empty = word.is_zero();
        *word |= U256::ONE << bit2;

        if leaf_was_empty {
            let key1 = (id >> 16) as u8;
            let bit1 = ((id >> 8) & 0xff) as u8;
            let word = self.level1.entry(key1).or_default();
            if word.is_zero() {
                self.level0 |= U256::ONE << key1;
            }
            *word |= U256::ONE << bit1;
        }
        true
    }

    /// Clears `id` from the index, dropping parent bits that become childless.
    /// Returns `false` if it was not present.
    pub fn remove(&mut self, id: u32) -> bool {
        let key2 = (id >> 8) as u16;
        let bit2 = (id & 0xff) as u8;

        let Some(word) = self.level2.get_mut(&key2) else {
            return false;
        };
        if !word.bit(bit2 as usize) {
            return false;
        }
        *word &= !(U256::ONE << bit2);

        if word.is_zero() {
            self.level2.remove(&key2);
            let key1 = (id >> 16) as u8;
            let bit1 = ((id >> 8) & 0xff) as u8;
            if let Some(word) = self.level1.get_mut(&key1) {
                *word &= !(U256::ONE << bit1);
                if word.is_zero() {
                    self.level1.remove(&key1);
                    self.level0 &= !(U256::ONE << key1);
                }
            }
        }
        true
    }

    /// Nearest populated id strictly below `id`, or `None` when the index
    /// holds nothing in that direction. Never returns `id` itself.
    pub fn find_first_right(&self, id: u32) -> Option<u32> {
        let key2 = (id >> 8) as u16;
        let bit2 = (id & 0xff) as u8;

        // scan the probe's own leaf word first
        if let Some(word) = self.level2.get(&key2) {
            if let Some(bit) = closest_bit_right(*word, bit2) {
                return Some((id & !0xff) | bit as u32);
            }
        }

        // ascend one level: next non-empty leaf word below, then its top bit
        let key1 = (id >> 16) as u8;
        let bit1 = ((id >> 8) & 0xff) as u8;
        if let Some(word) = self.level1.get(&key1) {
            if let Some(bit) = closest_bit_right(*word, bit1) {
                let leaf = ((key1 as u32) << 8) | bit as u32;
                return self.highest_in_leaf(leaf as u16);
            }
        }

        // ascend to the root: next non-empty subtree below
        let bit0 = closest_bit_right(self.level0, key1)?;
        let word = self.level1.get(&bit0)?;
        let bit1 = most_significant_bit(*word).ok()?;
        let leaf = ((bit0 as u32) << 8) | bit1 as u32;
        self.highest_in_leaf(leaf as u16)
    }

    /// Nearest populated id strictly above `id`, or `None` when the index
    /// holds nothing in that direction. Never returns `id` itself.
    pub fn find_first_left(&self, id: u32) -> Option<u32> {
        let key2 = (id >> 8) as u16;
        let bit2 = (id & 0xff) as u8;

        if let Some(word) = self.level2.get(&key2) {
            if let Some(bit) = closest_bit_left(*word, bit2) {
                return Some((id & !0xff) | bit as u32);
            }
        }

        let key1 = (id >> 16) as u8;
        let bit1 = ((id >> 8) & 0xff) as u8;
        if let Some(word) = self.level1.get(&key1) {
            if let Some(bit) = closest_bit_left(*word, bit1) {
                let leaf = ((key1 as u32) << 8) | bit as u32;
                return self.lowest_in_leaf(leaf as u16);
            }
        }

        let bit0 = closest_bit_left(self.level0, key1)?;
        let word = self.level1.get(&bit0)?;
        let bit1 = least_significant_bit(*word).ok()?;
        let leaf = ((bit0 as u32) << 8) | bit1 as u32;
        self.lowest_in_leaf(leaf as u16)
    }

    fn highest_in_leaf(&self, key2: u16) -> Option<u32> {
        let word = self.level2.get(&key2)?;
        let bit = most_significant_bit(*word).ok()?;
        Some(((key2 as u32) << 8) | bit as u32)
    }

    fn lowest_in_leaf(&self, key2: u16) -> Option<u32> {
        let word = self.level2.get(&key2)?;
        let bit = least_significant_bit(*word).ok()?;
        Some(((key2 as u32) << 8) | bit as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_test_tree() -> TreeIndex {
        let ids = [70u32, 78, 84, 139, 240, 535, 8_388_608, 8_388_700, 16_000_000];
        let mut tree = TreeIndex::new();
        for id in ids {
            assert!(tree.add(id));
        }
        tree
    }

    // -----------------------------------------------------------------------------
    // TESTS: add / remove / contains
    // -----------------------------------------------------------------------------

    #[test]
    fn add_is_idempotent() {
        let mut tree = TreeIndex::new();
        assert!(tree.add(78));
        assert!(!tree.add(78));
        assert!(tree.contains(78));
    }

    #[test]
    fn add_remove_round_trip_restores_state() {
        let mut tree = init_test_tree();
        assert!(tree.add(100));
        assert!(tree.remove(100));

        let reference = init_test_tree();
        assert_eq!(tree.contains(100), reference.contains(100));
        assert_eq!(tree.find_first_right(139), reference.find_first_right(139));
        assert_eq!(tree.find_first_left(84), reference.find_first_left(84));
        assert_eq!(tree.level0, reference.level0);
    }

    #[test]
    fn remove_absent_id_is_a_noop() {
        let mut tree = init_test_tree();
        assert!(!tree.remove(77));
        assert!(tree.contains(78));
    }

    #[test]
    fn remove_clears_empty_parents() {
        let mut tree = TreeIndex::new();
        tree.add(16_000_000);
        assert!(tree.remove(16_000_000));
        assert_eq!(tree.level0, U256::ZERO);
        assert!(tree.level1.is_empty());
        assert!(tree.level2.is_empty());
        assert_eq!(tree.find_first_right(16_000_001), None);
    }

    // -----------------------------------------------------------------------------
    // TESTS: find_first_right (toward lower ids)
    // -----------------------------------------------------------------------------

    #[test]
    fn right_search_within_one_word() {
        let tree = init_test_tree();
        assert_eq!(tree.find_first_right(84), Some(78));
        assert_eq!(tree.find_first_right(83), Some(78));
        assert_eq!(tree.find_first_right(78), Some(70));
    }

    #[test]
    fn right_search_crosses_words() {
        let tree = init_test_tree();
        // 240 lives in word 0, 535 in word 2
        assert_eq!(tree.find_first_right(535), Some(240));
        // descend from the far end of the id space
        assert_eq!(tree.find_first_right(16_000_000), Some(8_388_700));
        assert_eq!(tree.find_first_right(8_388_608), Some(535));
    }

    #[test]
    fn right_search_never_returns_probe() {
        let tree = init_test_tree();
        assert_ne!(tree.find_first_right(70), Some(70));
        assert_eq!(tree.find_first_right(70), None);
    }

    // -----------------------------------------------------------------------------
    // TESTS: find_first_left (toward higher ids)
    // -----------------------------------------------------------------------------

    #[test]
    fn left_search_within_one_word() {
        let tree = init_test_tree();
        assert_eq!(tree.find_first_left(70), Some(78));
        assert_eq!(tree.find_first_left(71), Some(78));
        assert_eq!(tree.find_first_left(78), Some(84));
    }

    #[test]
    fn left_search_crosses_words() {
        let tree = init_test_tree();
        assert_eq!(tree.find_first_left(240), Some(535));
        assert_eq!(tree.find_first_left(535), Some(8_388_608));
        assert_eq!(tree.find_first_left(8_388_700), Some(16_000_000));
    }

    #[test]
    fn left_search_exhausts_to_none() {
        let tree = init_test_tree();
        assert_eq!(tree.find_first_left(16_000_000), None);
        assert_eq!(tree.find_first_left(16_777_215), None);
    }

    #[test]
    fn searches_on_empty_tree() {
        let tree = TreeIndex::new();
        assert_eq!(tree.find_first_right(8_388_608), None);
        assert_eq!(tree.find_first_left(8_388_608), None);
    }

    #[test]
    fn adjacent_ids_across_leaf_boundary() {
        let mut tree = TreeIndex::new();
        tree.add(255);
        tree.add(256);
        assert_eq!(tree.find_first_right(256), Some(255));
        assert_eq!(tree.find_first_left(255), Some(256));
    }

    #[test]
    fn adjacent_ids_across_level1_boundary() {
        let mut tree = TreeIndex::new();
        tree.add(65_535);
        tree.add(65_536);
        assert_eq!(tree.find_first_right(65_536), Some(65_535));
        assert_eq!(tree.find_first_left(65_535), Some(65_536));
        tree.remove(65_535);
        assert_eq!(tree.find_first_right(65_536), None);
    }
}
