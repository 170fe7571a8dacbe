use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;

use crate::hash_table::AllocError;
use crate::hash_table::HashTable;
use crate::hash_table::KeyOps;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The default hasher builder used by [`HashMap`], a fast
        /// non-cryptographic hasher.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The default hasher builder used by [`HashMap`], the standard
        /// library's `RandomState`.
        pub type DefaultHashBuilder = std::collections::hash_map::RandomState;
    } else {
        /// Uninhabited placeholder. With both the `foldhash` and `std`
        /// features disabled there is no default hasher; supply one through
        /// [`HashMap::with_hasher`].
        pub enum DefaultHashBuilder {}
    }
}

/// Bridges keys that implement `Hash + Eq` and a [`BuildHasher`] into the
/// [`KeyOps`] the underlying table expects.
///
/// Useful on its own when you want a [`HashTable`] over std-style keys
/// without the map facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuildHasherOps<S> {
    hash_builder: S,
}

impl<S> BuildHasherOps<S> {
    /// Wraps a hasher builder.
    pub fn new(hash_builder: S) -> Self {
        BuildHasherOps { hash_builder }
    }
}

impl<K, S> KeyOps<K> for BuildHasherOps<S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    #[inline(always)]
    fn eq(&self, a: &K, b: &K) -> bool {
        a == b
    }

    #[inline(always)]
    fn hash(&self, key: &K) -> u64 {
        self.hash_builder.hash_one(key)
    }
}

/// A hash map over `Hash + Eq` keys, backed by the linear-probing
/// [`HashTable`].
///
/// `HashMap<K, V, S>` is the conventional-facade counterpart to the core
/// table: key semantics come from the key type's `Hash` and `Eq` impls and a
/// configurable hasher builder `S` instead of a caller-supplied [`KeyOps`].
/// Storage, growth, and backward-shift deletion behave exactly as in the
/// underlying table.
///
/// # Examples
///
/// ```rust
/// # #[cfg(any(feature = "std", feature = "foldhash"))]
/// # {
/// use probe_hash::HashMap;
///
/// let mut map: HashMap<&str, i32> = HashMap::new();
/// map.insert("a", 1);
/// map.insert("b", 2);
///
/// assert_eq!(map.get(&"a"), Some(&1));
/// assert_eq!(map.remove(&"a"), Some(1));
/// assert_eq!(map.get(&"a"), None);
/// # }
/// ```
#[derive(Clone)]
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    table: HashTable<K, V, BuildHasherOps<S>>,
}

impl<K, V, S> Debug for HashMap<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut map = f.debug_map();
        for (k, v) in self.iter() {
            map.entry(k, v);
        }
        map.finish()
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates a new hash map with the given hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasherDefault;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use probe_hash::HashMap;
    /// #
    /// let map: HashMap<i32, i32, _> =
    ///     HashMap::with_hasher(BuildHasherDefault::<SipHasher>::default());
    /// assert!(map.is_empty());
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(1, hash_builder)
    }

    /// Creates a new hash map with at least `slots` slots and the given
    /// hasher builder.
    ///
    /// As for the underlying table, at most half of the slots can be
    /// occupied before the map reallocates.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use core::hash::BuildHasherDefault;
    /// # use siphasher::sip::SipHasher;
    /// #
    /// # use probe_hash::HashMap;
    /// #
    /// let map: HashMap<i32, i32, _> =
    ///     HashMap::with_capacity_and_hasher(64, BuildHasherDefault::<SipHasher>::default());
    /// assert_eq!(map.capacity(), 64);
    /// ```
    pub fn with_capacity_and_hasher(slots: usize, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_capacity(slots, BuildHasherOps::new(hash_builder)),
        }
    }

    /// Inserts a key/value pair, returning the previous value if the key was
    /// already present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use probe_hash::HashMap;
    ///
    /// let mut map: HashMap<i32, &str> = HashMap::new();
    /// assert_eq!(map.insert(1, "one"), None);
    /// assert_eq!(map.insert(1, "uno"), Some("one"));
    /// assert_eq!(map.len(), 1);
    /// # }
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.table.insert(key, value)
    }

    /// Fallible variant of [`insert`](HashMap::insert); returns
    /// [`AllocError`] when growing the backing storage fails.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>, AllocError> {
        self.table.try_insert(key, value)
    }

    /// Returns a reference to the value stored for `key`, if any.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use probe_hash::HashMap;
    ///
    /// let mut map: HashMap<i32, &str> = HashMap::new();
    /// map.insert(1, "one");
    /// assert_eq!(map.get(&1), Some(&"one"));
    /// assert_eq!(map.get(&2), None);
    /// # }
    /// ```
    pub fn get(&self, key: &K) -> Option<&V> {
        self.table.get(key)
    }

    /// Returns a mutable reference to the value stored for `key`, if any.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use probe_hash::HashMap;
    ///
    /// let mut map: HashMap<i32, i32> = HashMap::new();
    /// map.insert(1, 10);
    /// if let Some(value) = map.get_mut(&1) {
    ///     *value += 1;
    /// }
    /// assert_eq!(map.get(&1), Some(&11));
    /// # }
    /// ```
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.table.get_mut(key)
    }

    /// Returns `true` if the map contains an entry for `key`.
    pub fn contains_key(&self, key: &K) -> bool {
        self.table.contains_key(key)
    }

    /// Removes the entry for `key` and returns its value, if any.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use probe_hash::HashMap;
    ///
    /// let mut map: HashMap<i32, &str> = HashMap::new();
    /// map.insert(1, "one");
    /// assert_eq!(map.remove(&1), Some("one"));
    /// assert_eq!(map.remove(&1), None);
    /// # }
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.table.remove(key)
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// Returns the number of entries in the map.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no entries.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the total slot count of the backing storage.
    ///
    /// See [`HashTable::capacity`] for the relationship between slots and
    /// the number of entries that fit before a reallocation.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Removes all entries, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Returns an iterator over the map's entries, in unspecified order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator that removes and yields every entry.
    ///
    /// The map is empty afterwards even if the iterator is dropped before
    /// being exhausted.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        Drain {
            inner: self.table.drain(),
        }
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    /// Creates a new hash map using the default hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use probe_hash::HashMap;
    ///
    /// let map: HashMap<i32, i32> = HashMap::new();
    /// assert!(map.is_empty());
    /// # }
    /// ```
    pub fn new() -> Self {
        Self::with_hasher(S::default())
    }

    /// Creates a new hash map with at least `slots` slots using the default
    /// hasher builder.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # #[cfg(any(feature = "std", feature = "foldhash"))]
    /// # {
    /// use probe_hash::HashMap;
    ///
    /// let map: HashMap<i32, i32> = HashMap::with_capacity(64);
    /// assert_eq!(map.capacity(), 64);
    /// # }
    /// ```
    pub fn with_capacity(slots: usize) -> Self {
        Self::with_capacity_and_hasher(slots, S::default())
    }
}

impl<K, V, S> Default for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> PartialEq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K, V, S> Eq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = HashMap::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

/// An iterator over a map's entries.
pub struct Iter<'a, K, V> {
    inner: crate::hash_table::Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// A draining iterator over a map's entries.
pub struct Drain<'a, K, V> {
    inner: crate::hash_table::Drain<'a, K, V>,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

/// A consuming iterator over a map's entries.
pub struct IntoIter<K, V> {
    inner: crate::hash_table::IntoIter<K, V>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl<K, V, S> IntoIterator for HashMap<K, V, S> {
    type IntoIter = IntoIter<K, V>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec::Vec;
    use core::hash::BuildHasherDefault;

    use siphasher::sip::SipHasher;

    use super::*;

    type SipBuilder = BuildHasherDefault<SipHasher>;

    fn sip_map<K: Hash + Eq, V>() -> HashMap<K, V, SipBuilder> {
        HashMap::with_hasher(SipBuilder::default())
    }

    #[test]
    fn insert_get_remove() {
        let mut map = sip_map::<String, i32>();
        assert_eq!(map.insert("one".to_string(), 1), None);
        assert_eq!(map.insert("two".to_string(), 2), None);
        assert_eq!(map.get(&"one".to_string()), Some(&1));
        assert_eq!(map.insert("one".to_string(), 11), Some(1));
        assert_eq!(map.len(), 2);

        assert_eq!(map.remove(&"one".to_string()), Some(11));
        assert_eq!(map.get(&"one".to_string()), None);
        assert_eq!(map.get(&"two".to_string()), Some(&2));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn get_mut_modifies_in_place() {
        let mut map = sip_map::<u32, u32>();
        map.insert(1, 10);
        if let Some(value) = map.get_mut(&1) {
            *value += 5;
        }
        assert_eq!(map.get(&1), Some(&15));
        assert!(map.get_mut(&2).is_none());
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut map: HashMap<u32, u32, SipBuilder> =
            HashMap::with_capacity_and_hasher(4, SipBuilder::default());
        for k in 0..100 {
            map.insert(k, k * 2);
        }
        assert_eq!(map.len(), 100);
        assert!(map.capacity() >= 200);
        for k in 0..100 {
            assert_eq!(map.get(&k), Some(&(k * 2)));
        }
    }

    #[test]
    fn iter_and_drain() {
        let mut map = sip_map::<u32, u32>();
        for k in 0..10 {
            map.insert(k, k + 1);
        }
        let mut keys: Vec<u32> = map.iter().map(|(&k, _)| k).collect();
        keys.sort_unstable();
        assert_eq!(keys, (0..10).collect::<Vec<u32>>());

        let drained: Vec<(u32, u32)> = map.drain().collect();
        assert_eq!(drained.len(), 10);
        assert!(map.is_empty());
    }

    #[test]
    fn from_iter_and_extend() {
        let mut map: HashMap<u32, u32, SipBuilder> =
            [(1, 10), (2, 20)].into_iter().collect();
        map.extend([(3, 30), (2, 22)]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&2), Some(&22));
    }

    #[test]
    fn equality_ignores_order() {
        let a: HashMap<u32, u32, SipBuilder> = [(1, 10), (2, 20), (3, 30)].into_iter().collect();
        let b: HashMap<u32, u32, SipBuilder> = [(3, 30), (1, 10), (2, 20)].into_iter().collect();
        assert_eq!(a, b);

        let c: HashMap<u32, u32, SipBuilder> = [(1, 10), (2, 20)].into_iter().collect();
        assert_ne!(a, c);
    }

    #[test]
    fn clear_and_contains() {
        let mut map = sip_map::<u32, u32>();
        map.insert(5, 50);
        assert!(map.contains_key(&5));
        map.clear();
        assert!(!map.contains_key(&5));
        assert!(map.is_empty());
    }

    #[test]
    fn into_iter_yields_all() {
        let mut map = sip_map::<u32, u32>();
        for k in 0..8 {
            map.insert(k, k);
        }
        let mut entries: Vec<(u32, u32)> = map.into_iter().collect();
        entries.sort_unstable();
        assert_eq!(entries, (0..8).map(|k| (k, k)).collect::<Vec<_>>());
    }

    #[cfg(any(feature = "std", feature = "foldhash"))]
    #[test]
    fn default_hasher_construction() {
        let mut map: HashMap<u32, u32> = HashMap::new();
        map.insert(1, 2);
        assert_eq!(map.get(&1), Some(&2));

        let map: HashMap<u32, u32> = HashMap::default();
        assert!(map.is_empty());

        let map: HashMap<u32, u32> = HashMap::with_capacity(32);
        assert_eq!(map.capacity(), 32);
    }
}
