use std::collections::BTreeMap;

/// Ordered buckets keyed by slice (or edge id), preserving insertion order per bucket.
#[derive(Debug, Clone)]
pub struct Buckets<K, T> {
    buckets: BTreeMap<K, Vec<T>>,
    len: usize,
}

/// Nodes or slabs bucketed by integer z.
pub type SliceIndex<T> = Buckets<i64, T>;

impl<K: Ord, T> Default for Buckets<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, T> Buckets<K, T> {
    pub fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
            len: 0,
        }
    }

    /// Appends `item` to the bucket for `key`, creating the bucket if needed.
    pub fn insert(&mut self, item: T, key: K) {
        self.buckets.entry(key).or_default().push(item);
        self.len += 1;
    }

    /// Items in the bucket for `key`; empty for keys that were never used.
    pub fn get(&self, key: &K) -> &[T] {
        self.buckets.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.buckets.contains_key(key)
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> {
        self.buckets.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &[T])> {
        self.buckets.iter().map(|(k, v)| (k, v.as_slice()))
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_row_order() {
        let mut index: SliceIndex<usize> = SliceIndex::new();
        index.insert(10, 3);
        index.insert(11, 5);
        index.insert(12, 3);

        assert_eq!(index.get(&3), &[10, 12]);
        assert_eq!(index.get(&5), &[11]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.bucket_count(), 2);
    }

    #[test]
    fn test_missing_slice_is_empty() {
        let index: SliceIndex<usize> = SliceIndex::new();
        assert!(index.get(&-1).is_empty());
        assert!(index.get(&42).is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn test_keys_are_sorted() {
        let mut index: SliceIndex<&str> = SliceIndex::new();
        index.insert("c", 9);
        index.insert("a", 1);
        index.insert("b", 4);
        let keys: Vec<_> = index.keys().copied().collect();
        assert_eq!(keys, vec![1, 4, 9]);
        assert_eq!(index.keys().next_back(), Some(&9));
    }
}
