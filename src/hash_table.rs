use alloc::vec::Vec;
use core::fmt;
use core::fmt::Debug;
use core::mem;

/// Key semantics for a [`HashTable`]: an equality predicate and a hash
/// function over keys of type `K`, fixed when the table is created.
///
/// Equality must be reflexive, symmetric, and transitive, and `hash` must be
/// consistent with it: keys that compare equal must hash to the same value.
/// The table never checks this; an inconsistent pair makes entries
/// unreachable or duplicated, but cannot violate memory safety.
///
/// Implement this trait directly for a strategy type of your own, or use
/// [`FnOps`] to build one from a pair of closures.
pub trait KeyOps<K> {
    /// Returns `true` if `a` and `b` are the same key.
    fn eq(&self, a: &K, b: &K) -> bool;

    /// Hashes `key` to a 64-bit value.
    fn hash(&self, key: &K) -> u64;
}

/// A [`KeyOps`] built from an equality closure and a hash closure.
///
/// This is the plainest way to hand a table its key semantics, and the only
/// one that needs no trait impls on the key type at all.
///
/// # Examples
///
/// ```rust
/// use probe_hash::hash_table::FnOps;
/// use probe_hash::hash_table::HashTable;
///
/// // String keys comparing by content.
/// let ops = FnOps::new(
///     |a: &&str, b: &&str| a == b,
///     |key: &&str| {
///         key.bytes()
///             .fold(5381u64, |hash, byte| hash.wrapping_mul(33) ^ u64::from(byte))
///     },
/// );
/// let mut table = HashTable::with_capacity(8, ops);
/// table.insert("one", 1);
/// assert_eq!(table.get(&"one"), Some(&1));
/// ```
#[derive(Clone, Copy, Debug)]
pub struct FnOps<E, H> {
    eq: E,
    hash: H,
}

impl<E, H> FnOps<E, H> {
    /// Pairs an equality closure with a hash closure.
    pub fn new(eq: E, hash: H) -> Self {
        FnOps { eq, hash }
    }
}

impl<K, E, H> KeyOps<K> for FnOps<E, H>
where
    E: Fn(&K, &K) -> bool,
    H: Fn(&K) -> u64,
{
    #[inline(always)]
    fn eq(&self, a: &K, b: &K) -> bool {
        (self.eq)(a, b)
    }

    #[inline(always)]
    fn hash(&self, key: &K) -> u64 {
        (self.hash)(key)
    }
}

/// Error returned when the table's backing storage cannot be obtained.
///
/// Raised by [`HashTable::try_with_capacity`] when the initial allocation
/// fails, and by [`HashTable::try_insert`] when growing fails. A failed grow
/// leaves the table valid at its previous capacity with every entry intact.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AllocError {
    slots: usize,
}

impl AllocError {
    /// The slot count the failed allocation asked for.
    pub fn slots(&self) -> usize {
        self.slots
    }
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to allocate storage for {} slots", self.slots)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AllocError {}

/// Slot count of the backing storage.
///
/// Slot counts are always powers of two so the home index is a mask of the
/// hash instead of a modulo, and doubling on growth preserves that.
#[derive(Clone, Copy, PartialEq, Eq)]
struct Capacity {
    slots: usize,
}

impl From<usize> for Capacity {
    #[inline(always)]
    fn from(value: usize) -> Self {
        Capacity {
            slots: value.max(1).next_power_of_two(),
        }
    }
}

fn alloc_slots<K, V>(capacity: Capacity) -> Vec<Option<(K, V)>> {
    let mut slots = Vec::with_capacity(capacity.slots);
    slots.resize_with(capacity.slots, || None);
    slots
}

fn try_alloc_slots<K, V>(capacity: Capacity) -> Result<Vec<Option<(K, V)>>, AllocError> {
    let mut slots = Vec::new();
    slots
        .try_reserve_exact(capacity.slots)
        .map_err(|_| AllocError {
            slots: capacity.slots,
        })?;
    slots.resize_with(capacity.slots, || None);
    Ok(slots)
}

/// An open-addressing hash table using linear probing and backward-shift
/// deletion.
///
/// `HashTable<K, V, O>` stores key/value records inline in a single
/// contiguous slot array. Key equality and hashing are not taken from trait
/// impls on `K`: they are supplied as a [`KeyOps`] when the table is created
/// and every operation consults that same pair, so `K` needs no `Hash` or
/// `Eq` impl at all.
///
/// Collisions are resolved by probing forward one slot at a time with
/// wraparound. The table doubles its slot count and rehashes every entry
/// whenever more than half of the slots are occupied, which keeps probe
/// chains short and guarantees probing terminates. Removal shifts displaced
/// entries backward into the freed slot instead of leaving a tombstone, so
/// lookups never scan past the first empty slot no matter how many removals
/// came before.
///
/// The table holds no locks and no interior mutability; sharing one across
/// threads requires external serialization.
///
/// # Examples
///
/// ```rust
/// use probe_hash::hash_table::FnOps;
/// use probe_hash::hash_table::HashTable;
///
/// let ops = FnOps::new(
///     |a: &u64, b: &u64| a == b,
///     |key: &u64| key.wrapping_mul(0x9E3779B97F4A7C15),
/// );
/// let mut table = HashTable::with_capacity(16, ops);
///
/// table.insert(1, "one");
/// table.insert(2, "two");
/// assert_eq!(table.get(&1), Some(&"one"));
///
/// table.remove(&1);
/// assert_eq!(table.get(&1), None);
/// assert_eq!(table.get(&2), Some(&"two"));
/// ```
#[derive(Clone)]
pub struct HashTable<K, V, O> {
    slots: Vec<Option<(K, V)>>,
    len: usize,
    ops: O,
}

impl<K, V, O> Debug for HashTable<K, V, O>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, O> HashTable<K, V, O> {
    /// Returns the number of entries in the table.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::FnOps;
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let ops = FnOps::new(|a: &u64, b: &u64| a == b, |key: &u64| *key);
    /// let mut table = HashTable::with_capacity(8, ops);
    /// assert_eq!(table.len(), 0);
    ///
    /// table.insert(1, 10);
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table contains no entries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::FnOps;
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let ops = FnOps::new(|a: &u64, b: &u64| a == b, |key: &u64| *key);
    /// let table: HashTable<u64, u64, _> = HashTable::with_capacity(8, ops);
    /// assert!(table.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the total slot count of the backing storage.
    ///
    /// The table grows once more than half of the slots are occupied, so at
    /// most `capacity() / 2` entries fit before a reallocation. To rule out
    /// reallocation entirely, create the table with at least twice as many
    /// slots as the maximum number of entries it will ever hold.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::FnOps;
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let ops = FnOps::new(|a: &u64, b: &u64| a == b, |key: &u64| *key);
    /// let table: HashTable<u64, u64, _> = HashTable::with_capacity(16, ops);
    /// assert_eq!(table.capacity(), 16);
    /// ```
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns an iterator over all entries in storage order.
    ///
    /// The order is an artifact of slot placement: it is unspecified and
    /// changes across inserts, removals, and growth.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.slots.iter(),
        }
    }

    /// Calls `visit` for every entry, in storage order.
    ///
    /// The order is unspecified, as for [`iter`](HashTable::iter). Because
    /// `visit` runs while the table is borrowed, inserting into or removing
    /// from the table during the walk is rejected at compile time.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::FnOps;
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let ops = FnOps::new(|a: &u64, b: &u64| a == b, |key: &u64| *key);
    /// let mut table = HashTable::with_capacity(8, ops);
    /// table.insert(1, 10);
    /// table.insert(2, 20);
    ///
    /// let mut sum = 0;
    /// table.for_each(|_key, value| sum += value);
    /// assert_eq!(sum, 30);
    /// ```
    pub fn for_each(&self, mut visit: impl FnMut(&K, &V)) {
        for slot in &self.slots {
            if let Some((key, value)) = slot {
                visit(key, value);
            }
        }
    }

    /// Removes all entries, keeping the allocated capacity.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.len = 0;
    }

    /// Returns an iterator that removes and yields every entry.
    ///
    /// The table is empty afterwards even if the iterator is dropped before
    /// being exhausted.
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        let Self { slots, len, .. } = self;
        Drain {
            inner: slots.iter_mut(),
            len,
        }
    }
}

impl<K, V, O> HashTable<K, V, O>
where
    O: KeyOps<K>,
{
    /// Creates a table with at least `slots` slots, all unoccupied.
    ///
    /// The requested count is clamped to a minimum of 1 and rounded up to a
    /// power of two. Aborts the process if the allocation fails; use
    /// [`try_with_capacity`](HashTable::try_with_capacity) to handle that
    /// case instead.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::FnOps;
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let ops = FnOps::new(|a: &u64, b: &u64| a == b, |key: &u64| *key);
    /// let table: HashTable<u64, u64, _> = HashTable::with_capacity(100, ops);
    /// assert_eq!(table.capacity(), 128);
    /// ```
    pub fn with_capacity(slots: usize, ops: O) -> Self {
        Self {
            slots: alloc_slots(Capacity::from(slots)),
            len: 0,
            ops,
        }
    }

    /// Fallible variant of [`with_capacity`](HashTable::with_capacity).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::FnOps;
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let ops = FnOps::new(|a: &u64, b: &u64| a == b, |key: &u64| *key);
    /// let table: HashTable<u64, u64, _> = HashTable::try_with_capacity(16, ops).unwrap();
    /// assert_eq!(table.capacity(), 16);
    /// ```
    pub fn try_with_capacity(slots: usize, ops: O) -> Result<Self, AllocError> {
        Ok(Self {
            slots: try_alloc_slots(Capacity::from(slots))?,
            len: 0,
            ops,
        })
    }

    /// Inserts a key/value entry, returning the previous value if the key
    /// was already present.
    ///
    /// Probes from the key's home slot; the first empty slot takes the new
    /// entry, while an occupied slot holding an equal key is overwritten in
    /// place (both key and value are replaced, and the entry count does not
    /// change). If more than half of the slots are occupied afterwards, the
    /// table grows: a slot array of double the size is allocated, every
    /// entry is re-placed at the new capacity, and the old array is released
    /// only once the new one is in place. Aborts the process if that
    /// allocation fails; use [`try_insert`](HashTable::try_insert) to handle
    /// the failure instead.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::FnOps;
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let ops = FnOps::new(|a: &u64, b: &u64| a == b, |key: &u64| *key);
    /// let mut table = HashTable::with_capacity(8, ops);
    ///
    /// assert_eq!(table.insert(1, "first"), None);
    /// assert_eq!(table.insert(1, "second"), Some("first"));
    /// assert_eq!(table.len(), 1);
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let previous = self.place(key, value);
        if self.len * 2 > self.slots.len() {
            self.grow();
        }
        previous
    }

    /// Fallible variant of [`insert`](HashTable::insert).
    ///
    /// Returns [`AllocError`] when growing the table fails. Two cases exist:
    /// if the table was already over its load bound from an earlier failed
    /// grow, the grow is re-attempted up front and the entry is *not*
    /// inserted when it fails again; if the entry itself pushed the table
    /// over the bound, the entry *is* inserted and only the growth is
    /// missing. Either way the table stays valid at its previous capacity
    /// and a later successful grow restores the load bound.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::FnOps;
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let ops = FnOps::new(|a: &u64, b: &u64| a == b, |key: &u64| *key);
    /// let mut table = HashTable::with_capacity(8, ops);
    /// assert_eq!(table.try_insert(1, 10), Ok(None));
    /// assert_eq!(table.try_insert(1, 11), Ok(Some(10)));
    /// ```
    pub fn try_insert(&mut self, key: K, value: V) -> Result<Option<V>, AllocError> {
        // Placement needs a terminating probe, which needs an empty slot to
        // survive it. Over-bound states only arise from an earlier failed
        // grow; the last-empty-slot case only from tiny capacities.
        if self.len * 2 > self.slots.len() || self.len + 1 == self.slots.len() {
            self.try_grow()?;
        }
        let previous = self.place(key, value);
        if self.len * 2 > self.slots.len() {
            self.try_grow()?;
        }
        Ok(previous)
    }

    /// Returns a reference to the value stored for `key`, if any.
    ///
    /// Probes forward from the key's home slot and stops at the first empty
    /// slot: an entry for the key always lies in the contiguous occupied run
    /// that starts at its home slot, a property insert and remove both
    /// maintain.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::FnOps;
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let ops = FnOps::new(|a: &u64, b: &u64| a == b, |key: &u64| *key);
    /// let mut table = HashTable::with_capacity(8, ops);
    /// table.insert(1, 10);
    ///
    /// assert_eq!(table.get(&1), Some(&10));
    /// assert_eq!(table.get(&9), None);
    /// ```
    pub fn get(&self, key: &K) -> Option<&V> {
        let index = self.find_index(key)?;
        self.slots[index].as_ref().map(|(_, value)| value)
    }

    /// Returns a mutable reference to the value stored for `key`, if any.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::FnOps;
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let ops = FnOps::new(|a: &u64, b: &u64| a == b, |key: &u64| *key);
    /// let mut table = HashTable::with_capacity(8, ops);
    /// table.insert(1, 10);
    ///
    /// if let Some(value) = table.get_mut(&1) {
    ///     *value += 5;
    /// }
    /// assert_eq!(table.get(&1), Some(&15));
    /// ```
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let index = self.find_index(key)?;
        self.slots[index].as_mut().map(|(_, value)| value)
    }

    /// Returns `true` if an entry for `key` is present.
    pub fn contains_key(&self, key: &K) -> bool {
        self.find_index(key).is_some()
    }

    /// Removes the entry for `key` and returns its value, if any.
    ///
    /// The freed slot is repaired before returning: entries displaced past
    /// it are shifted back so that no probe chain ever crosses a stale hole.
    /// No tombstone is left behind, so lookups stay single-pass regardless
    /// of how many removals have happened.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use probe_hash::hash_table::FnOps;
    /// # use probe_hash::hash_table::HashTable;
    /// #
    /// let ops = FnOps::new(|a: &u64, b: &u64| a == b, |key: &u64| *key);
    /// let mut table = HashTable::with_capacity(8, ops);
    /// table.insert(1, 10);
    ///
    /// assert_eq!(table.remove(&1), Some(10));
    /// assert_eq!(table.remove(&1), None);
    /// ```
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let index = self.find_index(key)?;
        let (_, value) = self.slots[index].take()?;
        self.len -= 1;
        self.repair_gap(index);
        Some(value)
    }

    #[inline(always)]
    fn mask(&self) -> usize {
        self.slots.len() - 1
    }

    #[inline(always)]
    fn home_index(&self, key: &K) -> usize {
        (self.ops.hash(key) as usize) & self.mask()
    }

    /// Walks the probe chain for `key`, returning the index of the occupied
    /// slot holding an equal key, or `None` once an empty slot is reached.
    #[inline]
    fn find_index(&self, key: &K) -> Option<usize> {
        let mask = self.mask();
        let mut index = self.home_index(key);
        loop {
            match &self.slots[index] {
                Some((occupant, _)) if self.ops.eq(occupant, key) => return Some(index),
                Some(_) => index = (index + 1) & mask,
                None => return None,
            }
        }
    }

    /// Inserts or overwrites without checking the load factor.
    ///
    /// Terminates because an empty slot always exists: occupancy is at or
    /// below half before any placement.
    fn place(&mut self, key: K, value: V) -> Option<V> {
        let Self { slots, len, ops } = self;
        let mask = slots.len() - 1;
        let mut index = (ops.hash(&key) as usize) & mask;
        loop {
            match &mut slots[index] {
                Some((occupant, stored)) => {
                    if ops.eq(occupant, &key) {
                        *occupant = key;
                        return Some(mem::replace(stored, value));
                    }
                    index = (index + 1) & mask;
                }
                slot @ None => {
                    *slot = Some((key, value));
                    *len += 1;
                    return None;
                }
            }
        }
    }

    #[cold]
    #[inline(never)]
    fn grow(&mut self) {
        let doubled = self
            .slots
            .len()
            .checked_mul(2)
            .expect("slot count overflow");
        let new_slots = alloc_slots(Capacity::from(doubled));
        self.rehash_into(new_slots);
    }

    #[cold]
    #[inline(never)]
    fn try_grow(&mut self) -> Result<(), AllocError> {
        let doubled = self
            .slots
            .len()
            .checked_mul(2)
            .ok_or(AllocError { slots: usize::MAX })?;
        let new_slots = try_alloc_slots(Capacity::from(doubled))?;
        self.rehash_into(new_slots);
        Ok(())
    }

    /// Moves every live entry into `new_slots`, re-deriving placement at the
    /// new capacity.
    ///
    /// Runs only after the new allocation succeeded; the old storage is
    /// dropped here, not before, so a failed grow never loses entries.
    fn rehash_into(&mut self, new_slots: Vec<Option<(K, V)>>) {
        let old_slots = mem::replace(&mut self.slots, new_slots);
        self.len = 0;
        for slot in old_slots {
            if let Some((key, value)) = slot {
                self.place(key, value);
            }
        }
    }

    /// Closes the probe-chain hole left at `gap` by a removal.
    ///
    /// Walks the contiguous occupied run after the gap. An entry whose home
    /// slot lies circularly at or before the gap is moved back into it, and
    /// the hole reopens at that entry's old position; an entry whose home
    /// lies strictly after the gap stays put, since moving it would detach
    /// it from its own probe chain. The walk ends at the first empty slot:
    /// entries beyond it start a fresh probe run the gap cannot affect.
    fn repair_gap(&mut self, mut gap: usize) {
        let Self { slots, ops, .. } = self;
        let capacity = slots.len();
        let mask = capacity - 1;
        let mut index = (gap + 1) & mask;
        while let Some((occupant, _)) = &slots[index] {
            let home = (ops.hash(occupant) as usize) & mask;
            // Positions that wrapped around relative to `home` are shifted
            // up by one full capacity, turning the circular interval test
            // into a straight-line one.
            let shifted_gap = if gap < home { gap + capacity } else { gap };
            let shifted_index = if index < home { index + capacity } else { index };
            if shifted_gap >= home && shifted_gap <= shifted_index {
                let moved = slots[index].take();
                slots[gap] = moved;
                gap = index;
            }
            index = (index + 1) & mask;
        }
    }

    /// Walks the whole table and asserts its structural invariants: the
    /// load bound, the live-slot count, and that every entry is found at
    /// its own slot when probed from its home slot (which also rules out
    /// duplicate keys).
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        assert!(
            self.len * 2 <= self.slots.len(),
            "load factor above one half: {} entries in {} slots",
            self.len,
            self.slots.len()
        );
        let mut live = 0;
        for (index, slot) in self.slots.iter().enumerate() {
            let Some((key, _)) = slot else { continue };
            live += 1;
            assert_eq!(
                self.find_index(key),
                Some(index),
                "entry at slot {index} is unreachable from its home slot or duplicated"
            );
        }
        assert_eq!(live, self.len, "live slot count disagrees with len");
    }
}

/// An iterator over a table's entries.
pub struct Iter<'a, K, V> {
    inner: core::slice::Iter<'a, Option<(K, V)>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner
            .find_map(|slot| slot.as_ref().map(|(key, value)| (key, value)))
    }
}

/// A draining iterator over a table's entries.
pub struct Drain<'a, K, V> {
    inner: core::slice::IterMut<'a, Option<(K, V)>>,
    len: &'a mut usize,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.inner.find_map(Option::take)?;
        *self.len -= 1;
        Some(entry)
    }
}

impl<K, V> Drop for Drain<'_, K, V> {
    fn drop(&mut self) {
        for _ in self {}
    }
}

/// A consuming iterator over a table's entries.
pub struct IntoIter<K, V> {
    inner: alloc::vec::IntoIter<Option<(K, V)>>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.find_map(|slot| slot)
    }
}

impl<K, V, O> IntoIterator for HashTable<K, V, O> {
    type IntoIter = IntoIter<K, V>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.slots.into_iter(),
        }
    }
}

impl<'a, K, V, O> IntoIterator for &'a HashTable<K, V, O> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
