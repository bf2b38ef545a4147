use std::borrow::Borrow;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

/// A map where the oldest-inserted entry is evicted once `capacity`
/// entries are held.
///
/// Replacing the value of an existing key does not change its age.
#[derive(Debug)]
pub(crate) struct LimitedCache<K: Clone + Hash + Eq, V> {
    map: HashMap<K, V>,

    // first item is the oldest key
    oldest: VecDeque<K>,
    capacity: usize,
}

impl<K, V> LimitedCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a new LimitedCache holding at most `capacity` items.
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            map: HashMap::with_capacity(capacity),
            oldest: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub(crate) fn insert(&mut self, k: K, v: V) {
        match self.map.entry(k) {
            Entry::Occupied(mut old) => {
                old.insert(v);
                return;
            }
            entry @ Entry::Vacant(_) => {
                self.oldest
                    .push_back(entry.key().clone());
                entry.or_insert(v);
            }
        }

        while self.oldest.len() > self.capacity {
            if let Some(oldest_key) = self.oldest.pop_front() {
                self.map.remove(&oldest_key);
            }
        }
    }

    pub(crate) fn get<Q>(&self, k: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(k)
    }

    pub(crate) fn remove<Q>(&mut self, k: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let value = self.map.remove(k)?;
        if let Some(index) = self
            .oldest
            .iter()
            .position(|item| item.borrow() == k)
        {
            self.oldest.remove(index);
        }
        Some(value)
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    type Test = super::LimitedCache<&'static str, usize>;

    #[test]
    fn test_updates_existing_item() {
        let mut t = Test::new(3);
        t.insert("abc", 1);
        t.insert("abc", 2);

        assert_eq!(t.get("abc"), Some(&2));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_evicts_oldest_item() {
        let mut t = Test::new(3);
        t.insert("abc", 1);
        t.insert("def", 2);
        t.insert("ghi", 3);
        t.insert("jkl", 4);

        assert_eq!(t.get("abc"), None);
        assert_eq!(t.get("def"), Some(&2));
        assert_eq!(t.get("jkl"), Some(&4));
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn test_update_does_not_refresh_age() {
        let mut t = Test::new(2);
        t.insert("abc", 1);
        t.insert("def", 2);
        t.insert("abc", 3);
        t.insert("ghi", 4);

        assert_eq!(t.get("abc"), None);
        assert_eq!(t.get("def"), Some(&2));
        assert_eq!(t.get("ghi"), Some(&4));
    }

    #[test]
    fn test_remove() {
        let mut t = Test::new(3);
        t.insert("abc", 1);
        t.insert("def", 2);

        assert_eq!(t.remove("abc"), Some(1));
        assert_eq!(t.remove("abc"), None);

        t.insert("ghi", 3);
        t.insert("jkl", 4);
        assert_eq!(t.get("def"), Some(&2));
        assert_eq!(t.len(), 3);
    }
}
