use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::fmt::Display;
use core::hash::BuildHasher;
use core::hash::Hasher;
use core::iter::FusedIterator;
use core::mem;

use log::debug;
use log::trace;

use crate::error::TableError;
use crate::hasher::Djb2State;

/// Smallest bucket array the table will allocate.
pub const MIN_BUCKETS: usize = 8;

/// Maximum ratio of entries to buckets. Inserting past it doubles the bucket
/// array.
pub const MAX_LOAD_FACTOR: usize = 1;

#[inline(always)]
fn max_population(buckets: usize) -> usize {
    buckets * MAX_LOAD_FACTOR
}

/// Allocates `len` empty chain heads, reporting allocation failure instead of
/// aborting.
fn alloc_heads(len: usize) -> Result<Vec<Option<usize>>, TableError> {
    let mut heads = Vec::new();
    heads
        .try_reserve_exact(len)
        .map_err(|_| TableError::BucketAlloc { buckets: len })?;
    heads.resize(len, None);
    Ok(heads)
}

struct Entry<V> {
    hash: u64,
    key: Box<[u8]>,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

impl<V> Entry<V> {
    /// Cheapest checks first: full hash, then length, then bytes.
    #[inline(always)]
    fn matches(&self, hash: u64, key: &[u8]) -> bool {
        self.hash == hash && self.key.len() == key.len() && *self.key == *key
    }
}

enum Slot<V> {
    Occupied(Entry<V>),
    Vacant { next_free: Option<usize> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Cursor {
    entry: usize,
    bucket: usize,
}

/// Outcome of walking a chain for a key.
enum Probe {
    Found(usize),
    /// Not present; carries the current tail of the chain, if any.
    Missing(Option<usize>),
}

/// Debug statistics for hash table analysis.
///
/// Available in tests or with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of entries currently in the table
    pub populated: usize,
    /// Length of the bucket array
    pub buckets: usize,
    /// Number of buckets with a non-empty chain
    pub occupied_buckets: usize,
    /// Length of the longest chain
    pub longest_chain: usize,
    /// Arena slots waiting on the free list
    pub free_slots: usize,
    /// Load factor (populated / buckets)
    pub load_factor: f64,
    /// Bucket utilization (occupied_buckets / buckets)
    pub bucket_utilization: f64,
    /// Bytes held by the bucket array, the entry arena and key copies
    pub total_bytes: usize,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} ({:.2}% load factor)",
            self.populated,
            self.buckets,
            self.load_factor * 100.0
        );
        println!(
            "Bucket Usage: {}/{} ({:.2}% utilization)",
            self.occupied_buckets,
            self.buckets,
            self.bucket_utilization * 100.0
        );
        println!("Longest chain: {}", self.longest_chain);
        println!("Free slots: {}", self.free_slots);
        println!("Total Allocated: {} bytes", self.total_bytes);
    }
}

/// A byte-keyed hash table using separate chaining.
///
/// Keys are arbitrary byte strings (zero bytes and the empty key included);
/// the table keeps its own copy of every key. Each bucket heads a
/// doubly-linked chain of the entries whose hash, masked by the bucket count,
/// selects it. Entries live in an index-linked arena, so unlinking is O(1)
/// and no link can dangle across a resize.
///
/// The bucket count is always a power of two and at least [`MIN_BUCKETS`].
/// When an insertion would push the entry count past the bucket count, the
/// bucket array doubles and every entry is re-linked using the hash stored
/// when it was inserted.
///
/// Hashing defaults to DJB2 ([`Djb2State`]). Any [`BuildHasher`] may be
/// used; keys are hashed with a single [`Hasher::write`] of their bytes.
///
/// ## Cursor iteration
///
/// Besides the borrowing [`iter`](HashTable::iter), the table carries a
/// single cursor driven by [`iter_first`](HashTable::iter_first) and
/// [`iter_next`](HashTable::iter_next). Mutating the table while a cursor
/// walk is in progress invalidates the cursor: later cursor reads are memory
/// safe but their results are unspecified until `iter_first` is called
/// again.
///
/// ## Example
///
/// ```rust
/// # use chain_hash::HashTable;
/// #
/// let mut table = HashTable::with_capacity(7)?;
/// assert_eq!(table.bucket_count(), 8);
///
/// table.set(b"just", "value1")?;
/// table.set(b"a", "value2")?;
///
/// assert_eq!(table.get(b"just"), Some(&"value1"));
/// assert_eq!(table.get(b"a"), Some(&"value2"));
/// assert_eq!(table.get(b"missing"), None);
/// # Ok::<(), chain_hash::TableError>(())
/// ```
pub struct HashTable<V, S = Djb2State> {
    buckets: Vec<Option<usize>>,
    slots: Vec<Slot<V>>,
    free_head: Option<usize>,

    populated: usize,
    mask: usize,

    cursor: Option<Cursor>,
    hash_builder: S,
}

impl<V, S> Debug for HashTable<V, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashTable")
            .field(
                "chains",
                &(0..self.buckets.len())
                    .map(|bucket| self.chain(bucket).count())
                    .collect::<Vec<_>>(),
            )
            .field("populated", &self.populated)
            .field("buckets", &self.buckets.len())
            .field("cursor", &self.cursor)
            .finish()
    }
}

impl<V> HashTable<V, Djb2State> {
    /// Creates a table with DJB2 hashing and room for at least `capacity`
    /// entries before its first resize.
    ///
    /// The bucket count is the smallest power of two not below `capacity`,
    /// with a floor of [`MIN_BUCKETS`].
    ///
    /// # Errors
    ///
    /// [`TableError::CapacityOverflow`] if that power of two does not fit in a
    /// `usize`, [`TableError::BucketAlloc`] if the bucket array cannot be
    /// allocated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let table: HashTable<u32> = HashTable::with_capacity(100)?;
    /// assert_eq!(table.bucket_count(), 128);
    ///
    /// let table: HashTable<u32> = HashTable::with_capacity(0)?;
    /// assert_eq!(table.bucket_count(), 8);
    /// # Ok::<(), chain_hash::TableError>(())
    /// ```
    pub fn with_capacity(capacity: usize) -> Result<Self, TableError> {
        Self::with_capacity_and_hasher(capacity, Djb2State)
    }
}

impl<V, S> HashTable<V, S>
where
    S: BuildHasher,
{
    /// Creates a table with room for at least `capacity` entries, hashing
    /// keys with `hash_builder`.
    ///
    /// # Errors
    ///
    /// Same as [`with_capacity`](HashTable::with_capacity).
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// # use chain_hash::hasher::Djb2State;
    /// #
    /// let table: HashTable<&str, _> = HashTable::with_capacity_and_hasher(20, Djb2State)?;
    /// assert_eq!(table.bucket_count(), 32);
    /// # Ok::<(), chain_hash::TableError>(())
    /// ```
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Result<Self, TableError> {
        let buckets = capacity
            .max(MIN_BUCKETS)
            .checked_next_power_of_two()
            .ok_or(TableError::CapacityOverflow {
                requested: capacity,
            })?;

        let heads = alloc_heads(buckets)?;
        debug!("initialized hash table with {buckets} buckets (requested {capacity})");

        Ok(Self {
            buckets: heads,
            slots: Vec::new(),
            free_head: None,
            populated: 0,
            mask: buckets - 1,
            cursor: None,
            hash_builder,
        })
    }

    #[inline]
    fn hash_key(&self, key: &[u8]) -> u64 {
        let mut hasher = self.hash_builder.build_hasher();
        hasher.write(key);
        hasher.finish()
    }

    #[inline(always)]
    fn bucket_index(&self, hash: u64) -> usize {
        (hash & self.mask as u64) as usize
    }

    fn probe(&self, hash: u64, key: &[u8]) -> Probe {
        let mut tail = None;
        let mut link = self.buckets[self.bucket_index(hash)];
        while let Some(id) = link {
            let entry = self.entry(id);
            if entry.matches(hash, key) {
                return Probe::Found(id);
            }
            tail = Some(id);
            link = entry.next;
        }

        Probe::Missing(tail)
    }

    fn find_index(&self, hash: u64, key: &[u8]) -> Option<usize> {
        match self.probe(hash, key) {
            Probe::Found(id) => Some(id),
            Probe::Missing(_) => None,
        }
    }

    /// Returns a reference to the value stored under `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(8)?;
    /// table.set(b"key\0with\0zeros", 1)?;
    ///
    /// assert_eq!(table.get(b"key\0with\0zeros"), Some(&1));
    /// assert_eq!(table.get(b"key"), None);
    /// # Ok::<(), chain_hash::TableError>(())
    /// ```
    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let hash = self.hash_key(key);
        self.find_index(hash, key).map(|id| &self.entry(id).value)
    }

    /// Returns a mutable reference to the value stored under `key`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(8)?;
    /// table.set(b"counter", 1)?;
    ///
    /// if let Some(count) = table.get_mut(b"counter") {
    ///     *count += 1;
    /// }
    /// assert_eq!(table.get(b"counter"), Some(&2));
    /// # Ok::<(), chain_hash::TableError>(())
    /// ```
    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        let hash = self.hash_key(key);
        let id = self.find_index(hash, key)?;
        Some(&mut self.entry_mut(id).value)
    }

    /// Returns `true` if an entry is stored under `key`.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        let hash = self.hash_key(key);
        self.find_index(hash, key).is_some()
    }

    /// Inserts `value` under `key`, or replaces the value already stored
    /// there.
    ///
    /// On replacement the stored key is left untouched, the entry count does
    /// not change, and the previous value is returned. A new key is copied
    /// into the table and appended to the tail of its bucket's chain, so
    /// entries sharing a bucket are kept oldest first.
    ///
    /// If the new entry would push the entry count past the bucket count, the
    /// bucket array doubles first.
    ///
    /// # Errors
    ///
    /// [`TableError::EntryAlloc`] if the entry or its key copy cannot be
    /// allocated, [`TableError::BucketAlloc`] or
    /// [`TableError::CapacityOverflow`] if a required resize fails. The table
    /// is unchanged whenever an error is returned.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(8)?;
    ///
    /// assert_eq!(table.set(b"k", "first")?, None);
    /// assert_eq!(table.set(b"k", "second")?, Some("first"));
    /// assert_eq!(table.len(), 1);
    /// assert_eq!(table.get(b"k"), Some(&"second"));
    /// # Ok::<(), chain_hash::TableError>(())
    /// ```
    pub fn set(&mut self, key: &[u8], value: V) -> Result<Option<V>, TableError> {
        let hash = self.hash_key(key);

        let mut tail = match self.probe(hash, key) {
            Probe::Found(id) => {
                trace!("updating value for {}-byte key in slot {id}", key.len());
                let old = mem::replace(&mut self.entry_mut(id).value, value);
                return Ok(Some(old));
            }
            Probe::Missing(tail) => tail,
        };

        let mut owned = Vec::new();
        owned
            .try_reserve_exact(key.len())
            .map_err(|_| TableError::EntryAlloc { key_len: key.len() })?;
        owned.extend_from_slice(key);

        if self.free_head.is_none() {
            self.slots
                .try_reserve(1)
                .map_err(|_| TableError::EntryAlloc { key_len: key.len() })?;
        }

        if self.populated + 1 > max_population(self.buckets.len()) {
            self.resize_rehash()?;
            tail = self
                .chain(self.bucket_index(hash))
                .last()
                .map(|(id, _)| id);
        }

        let id = self.claim_slot(Entry {
            hash,
            key: owned.into_boxed_slice(),
            value,
            prev: tail,
            next: None,
        });

        match tail {
            Some(tail) => self.entry_mut(tail).next = Some(id),
            None => {
                let bucket = self.bucket_index(hash);
                self.buckets[bucket] = Some(id);
            }
        }
        self.populated += 1;
        trace!(
            "inserted {}-byte key into slot {id} (bucket {})",
            key.len(),
            self.bucket_index(hash)
        );

        Ok(None)
    }

    /// Removes the entry stored under `key` and returns its value.
    ///
    /// Returns `None`, leaving the table untouched, if the key is absent. The
    /// bucket array never shrinks.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(8)?;
    /// table.set(b"k", 42)?;
    ///
    /// assert_eq!(table.unset(b"k"), Some(42));
    /// assert_eq!(table.unset(b"k"), None);
    /// assert!(table.is_empty());
    /// # Ok::<(), chain_hash::TableError>(())
    /// ```
    pub fn unset(&mut self, key: &[u8]) -> Option<V> {
        let hash = self.hash_key(key);
        let id = self.find_index(hash, key)?;

        let (prev, next) = {
            let entry = self.entry(id);
            (entry.prev, entry.next)
        };
        match prev {
            Some(prev) => self.entry_mut(prev).next = next,
            None => {
                let bucket = self.bucket_index(hash);
                self.buckets[bucket] = next;
            }
        }
        if let Some(next) = next {
            self.entry_mut(next).prev = prev;
        }

        self.populated -= 1;
        trace!("removed {}-byte key from slot {id}", key.len());

        Some(self.release_slot(id).value)
    }
}

impl<V, S> HashTable<V, S> {
    /// Returns the number of entries in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the length of the bucket array.
    ///
    /// Always a power of two, at least [`MIN_BUCKETS`]. This is also the
    /// number of entries the table holds before its next resize.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns a reference to the table's hash builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Removes every entry, keeping the bucket array at its current size.
    ///
    /// Also resets the cursor.
    pub fn clear(&mut self) {
        self.buckets.fill(None);
        self.slots.clear();
        self.free_head = None;
        self.populated = 0;
        self.cursor = None;
    }

    /// Tears the table down, passing every stored value to `destructor`.
    ///
    /// Values are handed over in bucket order, oldest first within a bucket.
    /// Key copies and the bucket array are released afterwards. Dropping the
    /// table instead simply drops the values.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(8)?;
    /// table.set(b"a", 1)?;
    /// table.set(b"b", 2)?;
    ///
    /// let mut released = Vec::new();
    /// table.teardown_with(|value| released.push(value));
    /// released.sort();
    /// assert_eq!(released, [1, 2]);
    /// # Ok::<(), chain_hash::TableError>(())
    /// ```
    pub fn teardown_with(mut self, mut destructor: impl FnMut(V)) {
        for bucket in 0..self.buckets.len() {
            let mut link = self.buckets[bucket];
            while let Some(id) = link {
                let entry = self.release_slot(id);
                link = entry.next;
                destructor(entry.value);
            }
        }
    }

    /// Returns an iterator over `(key, value)` pairs.
    ///
    /// Entries are visited bucket by bucket in index order, oldest first
    /// within a bucket. The order is stable until the table is next mutated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(8)?;
    /// table.set(b"x", 1)?;
    /// table.set(b"y", 2)?;
    ///
    /// let total: i32 = table.iter().map(|(_, value)| value).sum();
    /// assert_eq!(total, 3);
    /// # Ok::<(), chain_hash::TableError>(())
    /// ```
    pub fn iter(&self) -> Iter<'_, V, S> {
        Iter {
            table: self,
            bucket: 0,
            link: None,
            remaining: self.populated,
        }
    }

    /// Positions the cursor on the first entry.
    ///
    /// Scans the bucket array from index 0 for the first non-empty chain.
    /// Returns `false`, leaving the cursor exhausted, if the table is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(8)?;
    /// table.set(b"one", 1)?;
    /// table.set(b"two", 2)?;
    ///
    /// let mut seen = 0;
    /// let mut valid = table.iter_first();
    /// while valid {
    ///     assert!(table.iter_value().is_some());
    ///     seen += 1;
    ///     valid = table.iter_next();
    /// }
    /// assert_eq!(seen, 2);
    /// # Ok::<(), chain_hash::TableError>(())
    /// ```
    pub fn iter_first(&mut self) -> bool {
        self.cursor = if self.populated == 0 {
            None
        } else {
            self.scan_from(0)
        };
        self.cursor.is_some()
    }

    /// Advances the cursor to the next entry.
    ///
    /// Moves along the current chain, then on to the head of the next
    /// non-empty bucket. Returns `false` once every entry has been visited,
    /// and keeps returning `false` until [`iter_first`](HashTable::iter_first)
    /// is called again.
    pub fn iter_next(&mut self) -> bool {
        let Some(cursor) = self.cursor else {
            return false;
        };

        let successor = self.occupied(cursor.entry).and_then(|entry| entry.next);
        self.cursor = match successor {
            Some(entry) => Some(Cursor {
                entry,
                bucket: cursor.bucket,
            }),
            None => self.scan_from(cursor.bucket + 1),
        };
        self.cursor.is_some()
    }

    /// Returns the key under the cursor, or `None` once it is exhausted.
    pub fn iter_key(&self) -> Option<&[u8]> {
        self.cursor_entry().map(|entry| &*entry.key)
    }

    /// Returns the length of the key under the cursor, or 0 once it is
    /// exhausted.
    pub fn iter_key_len(&self) -> usize {
        self.cursor_entry().map_or(0, |entry| entry.key.len())
    }

    /// Returns the value under the cursor, or `None` once it is exhausted.
    pub fn iter_value(&self) -> Option<&V> {
        self.cursor_entry().map(|entry| &entry.value)
    }

    /// Returns a [`Display`] adapter listing the chain of every bucket.
    ///
    /// Each line reads `bucket => #slot, #slot, NULL.`. Meant as a
    /// development aid; the exact format is not stable.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::HashTable;
    /// #
    /// let mut table = HashTable::with_capacity(8)?;
    /// table.set(b"a", ())?;
    ///
    /// let dump = table.dump().to_string();
    /// assert_eq!(dump.lines().count(), 8);
    /// assert!(dump.contains("#0, NULL."));
    /// # Ok::<(), chain_hash::TableError>(())
    /// ```
    pub fn dump(&self) -> BucketDump<'_, V, S> {
        BucketDump { table: self }
    }

    fn entry(&self, id: usize) -> &Entry<V> {
        match &self.slots[id] {
            Slot::Occupied(entry) => entry,
            Slot::Vacant { .. } => unreachable!("chain links to vacant slot {id}"),
        }
    }

    fn entry_mut(&mut self, id: usize) -> &mut Entry<V> {
        match &mut self.slots[id] {
            Slot::Occupied(entry) => entry,
            Slot::Vacant { .. } => unreachable!("chain links to vacant slot {id}"),
        }
    }

    fn occupied(&self, id: usize) -> Option<&Entry<V>> {
        match self.slots.get(id) {
            Some(Slot::Occupied(entry)) => Some(entry),
            _ => None,
        }
    }

    fn cursor_entry(&self) -> Option<&Entry<V>> {
        self.cursor.and_then(|cursor| self.occupied(cursor.entry))
    }

    fn scan_from(&self, start: usize) -> Option<Cursor> {
        self.buckets
            .iter()
            .enumerate()
            .skip(start)
            .find_map(|(bucket, head)| head.map(|entry| Cursor { entry, bucket }))
    }

    fn chain(&self, bucket: usize) -> ChainIter<'_, V> {
        ChainIter {
            slots: &self.slots,
            link: self.buckets[bucket],
        }
    }

    /// Stores `entry` in a free slot.
    ///
    /// The caller must have reserved room in `slots` when the free list is
    /// empty.
    fn claim_slot(&mut self, entry: Entry<V>) -> usize {
        match self.free_head {
            Some(id) => {
                let Slot::Vacant { next_free } = self.slots[id] else {
                    unreachable!("free list links to occupied slot {id}");
                };
                self.free_head = next_free;
                self.slots[id] = Slot::Occupied(entry);
                id
            }
            None => {
                debug_assert!(self.slots.len() < self.slots.capacity());
                self.slots.push(Slot::Occupied(entry));
                self.slots.len() - 1
            }
        }
    }

    fn release_slot(&mut self, id: usize) -> Entry<V> {
        let vacant = Slot::Vacant {
            next_free: self.free_head,
        };
        match mem::replace(&mut self.slots[id], vacant) {
            Slot::Occupied(entry) => {
                self.free_head = Some(id);
                entry
            }
            Slot::Vacant { .. } => unreachable!("released vacant slot {id}"),
        }
    }

    #[cold]
    fn resize_rehash(&mut self) -> Result<(), TableError> {
        let old_len = self.buckets.len();
        let new_len = old_len
            .checked_mul(2)
            .ok_or(TableError::CapacityOverflow { requested: old_len })?;

        // Both arrays are allocated before any entry moves.
        let mut heads = alloc_heads(new_len)?;
        let mut tails = alloc_heads(new_len)?;
        let new_mask = new_len - 1;

        for bucket in 0..old_len {
            let mut link = self.buckets[bucket];
            while let Some(id) = link {
                let target = {
                    let entry = self.entry(id);
                    link = entry.next;
                    (entry.hash & new_mask as u64) as usize
                };

                let tail = tails[target];
                {
                    let entry = self.entry_mut(id);
                    entry.prev = tail;
                    entry.next = None;
                }
                match tail {
                    Some(tail) => self.entry_mut(tail).next = Some(id),
                    None => heads[target] = Some(id),
                }
                tails[target] = Some(id);
            }
        }

        self.buckets = heads;
        self.mask = new_mask;
        debug!(
            "resized hash table from {old_len} to {new_len} buckets ({} entries)",
            self.populated
        );

        Ok(())
    }

    /// Counts chains by length.
    ///
    /// Available in tests or with the `stats` feature. Index `n` of the
    /// returned vector holds the number of buckets whose chain has `n`
    /// entries; its last index is the longest chain.
    #[cfg(any(test, feature = "stats"))]
    pub fn chain_histogram(&self) -> Vec<usize> {
        let mut hist = alloc::vec![0usize];
        for bucket in 0..self.buckets.len() {
            let len = self.chain(bucket).count();
            if len >= hist.len() {
                hist.resize(len + 1, 0);
            }
            hist[len] += 1;
        }
        hist
    }

    /// Returns detailed utilization statistics for debugging.
    ///
    /// Available in tests or with the `stats` feature.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let hist = self.chain_histogram();
        let occupied_buckets = self.buckets.len() - hist[0];
        let key_bytes: usize = self.iter().map(|(key, _)| key.len()).sum();

        DebugStats {
            populated: self.populated,
            buckets: self.buckets.len(),
            occupied_buckets,
            longest_chain: hist.len() - 1,
            free_slots: self.slots.len() - self.populated,
            load_factor: self.populated as f64 / self.buckets.len() as f64,
            bucket_utilization: occupied_buckets as f64 / self.buckets.len() as f64,
            total_bytes: self.buckets.capacity() * mem::size_of::<Option<usize>>()
                + self.slots.capacity() * mem::size_of::<Slot<V>>()
                + key_bytes,
        }
    }

    /// Pretty-prints the chain-length histogram horizontally using stdout.
    ///
    /// Requires the `std` feature. Each row is one chain length.
    #[cfg(all(any(test, feature = "stats"), feature = "std"))]
    pub fn print_chain_histogram(&self) {
        let hist = self.chain_histogram();
        let max = *hist.iter().max().unwrap_or(&0);
        if max == 0 {
            println!("chain histogram: empty");
            return;
        }

        let max_bar = 60usize;
        println!(
            "chain histogram ({} entries, {} buckets):",
            self.populated,
            self.buckets.len()
        );
        for (len, &count) in hist.iter().enumerate() {
            let width = (count * max_bar).div_ceil(max);
            println!("{:>3} | {} ({})", len, "█".repeat(width), count);
        }
    }
}

struct ChainIter<'a, V> {
    slots: &'a [Slot<V>],
    link: Option<usize>,
}

impl<'a, V> Iterator for ChainIter<'a, V> {
    type Item = (usize, &'a Entry<V>);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.link?;
        let Slot::Occupied(entry) = &self.slots[id] else {
            unreachable!("chain links to vacant slot {id}");
        };
        self.link = entry.next;
        Some((id, entry))
    }
}

/// An iterator over the entries of a [`HashTable`].
///
/// This struct is created by the [`iter`] method on [`HashTable`]. It yields
/// `(&[u8], &V)` pairs bucket by bucket.
///
/// [`iter`]: HashTable::iter
pub struct Iter<'a, V, S = Djb2State> {
    table: &'a HashTable<V, S>,
    bucket: usize,
    link: Option<usize>,
    remaining: usize,
}

impl<'a, V, S> Iterator for Iter<'a, V, S> {
    type Item = (&'a [u8], &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        while self.link.is_none() {
            self.link = *self.table.buckets.get(self.bucket)?;
            self.bucket += 1;
        }

        let id = self.link?;
        let entry = self.table.entry(id);
        self.link = entry.next;
        self.remaining -= 1;
        Some((&*entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V, S> ExactSizeIterator for Iter<'_, V, S> {}

impl<V, S> FusedIterator for Iter<'_, V, S> {}

impl<'a, V, S> IntoIterator for &'a HashTable<V, S> {
    type Item = (&'a [u8], &'a V);
    type IntoIter = Iter<'a, V, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Bucket occupancy listing for a [`HashTable`].
///
/// This struct is created by the [`dump`] method on [`HashTable`].
///
/// [`dump`]: HashTable::dump
pub struct BucketDump<'a, V, S = Djb2State> {
    table: &'a HashTable<V, S>,
}

impl<V, S> Display for BucketDump<'_, V, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for bucket in 0..self.table.buckets.len() {
            write!(f, "{bucket} => ")?;
            for (id, _) in self.table.chain(bucket) {
                write!(f, "#{id}, ")?;
            }
            writeln!(f, "NULL.")?;
        }
        Ok(())
    }
}
