//! In-memory chained hash table.
//!
//! Keys are already-hashed `u64`s; callers that need string keys hash them
//! with [`hash_word`] first and keep the original key inside the value so
//! collisions can be told apart. The bucket layout is exposed read-only
//! because the index writer serializes buckets and chains exactly as they
//! sit in memory.

pub const INITIAL_BUCKETS: usize = 2;

/// Average chain length above which the table grows.
const MAX_LOAD_FACTOR: usize = 3;
const GROWTH_FACTOR: usize = 9;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a 64 over the word's bytes. Shared by the index writer and the
/// word-table reader; both must agree for lookups to land in the right bucket.
pub fn hash_word(word: &str) -> u64 {
    let mut h = FNV_OFFSET_BASIS;
    for b in word.as_bytes() {
        h ^= u64::from(*b);
        h = h.wrapping_mul(FNV_PRIME);
    }
    h
}

/// Bucket index for `key` in a table of `num_buckets` buckets.
#[inline]
pub fn bucket_for(key: u64, num_buckets: u64) -> u64 {
    key % num_buckets
}

#[derive(Debug, Clone)]
pub struct ChainedTable<V> {
    buckets: Vec<Vec<(u64, V)>>,
    len: usize,
}

impl<V> Default for ChainedTable<V> {
    fn default() -> Self {
        Self::with_buckets(INITIAL_BUCKETS)
    }
}

impl<V> ChainedTable<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buckets(num_buckets: usize) -> Self {
        debug_assert!(num_buckets > 0, "a table needs at least one bucket");
        let num_buckets = num_buckets.max(1);
        Self { buckets: (0..num_buckets).map(|_| Vec::new()).collect(), len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    fn bucket_index(&self, key: u64) -> usize {
        bucket_for(key, self.buckets.len() as u64) as usize
    }

    /// Inserts `value` under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: u64, value: V) -> Option<V> {
        let idx = self.bucket_index(key);
        let chain = &mut self.buckets[idx];
        if let Some(slot) = chain.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        chain.push((key, value));
        self.len += 1;
        self.maybe_grow();
        None
    }

    pub fn get(&self, key: u64) -> Option<&V> {
        self.buckets[self.bucket_index(key)].iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: u64) -> Option<&mut V> {
        let idx = self.bucket_index(key);
        self.buckets[idx].iter_mut().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Buckets in order; each is its chain in insertion order.
    pub fn buckets(&self) -> impl ExactSizeIterator<Item = &[(u64, V)]> {
        self.buckets.iter().map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &V)> {
        self.buckets.iter().flat_map(|chain| chain.iter().map(|(k, v)| (*k, v)))
    }

    fn maybe_grow(&mut self) {
        if self.len / self.buckets.len() <= MAX_LOAD_FACTOR {
            return;
        }
        let new_count = self.buckets.len() * GROWTH_FACTOR;
        let old = std::mem::replace(&mut self.buckets, (0..new_count).map(|_| Vec::new()).collect());
        for (key, value) in old.into_iter().flatten() {
            let idx = self.bucket_index(key);
            self.buckets[idx].push((key, value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv_matches_reference_vectors() {
        assert_eq!(hash_word(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(hash_word("a"), 0xaf63_dc4c_8601_ec8c);
        assert_eq!(hash_word("foobar"), 0x8594_4171_f739_67e8);
    }

    #[test]
    fn insert_replaces_equal_key() {
        let mut t = ChainedTable::new();
        assert_eq!(t.insert(7, "a"), None);
        assert_eq!(t.insert(7, "b"), Some("a"));
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(7), Some(&"b"));
    }

    #[test]
    fn grows_past_load_factor_and_keeps_entries() {
        let mut t = ChainedTable::new();
        for k in 0..7u64 {
            t.insert(k, k * 10);
        }
        assert_eq!(t.num_buckets(), INITIAL_BUCKETS);
        // 8 / 2 = 4 > 3 triggers growth.
        t.insert(7, 70);
        assert_eq!(t.num_buckets(), INITIAL_BUCKETS * GROWTH_FACTOR);
        for k in 0..8u64 {
            assert_eq!(t.get(k), Some(&(k * 10)));
        }
    }

    #[test]
    fn every_entry_sits_in_its_modulo_bucket() {
        let mut t = ChainedTable::new();
        for k in [3u64, 19, 40, 41, 1000, u64::MAX] {
            t.insert(k, ());
        }
        let n = t.num_buckets() as u64;
        for (i, chain) in t.buckets().enumerate() {
            for (k, _) in chain {
                assert_eq!(bucket_for(*k, n), i as u64);
            }
        }
    }
}
