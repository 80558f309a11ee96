/// Errors returned by fallible [`HashTable`](crate::HashTable) operations.
///
/// Every variant is reported before the table is modified, so a failed
/// operation leaves the table exactly as it was.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    /// The requested bucket count does not fit in a `usize` once rounded up
    /// to a power of two.
    #[error("bucket count for capacity {requested} overflows usize")]
    CapacityOverflow {
        /// The capacity that was asked for.
        requested: usize,
    },
    /// The bucket array could not be allocated.
    #[error("failed to allocate {buckets} bucket slots")]
    BucketAlloc {
        /// Number of bucket slots in the failed allocation.
        buckets: usize,
    },
    /// Storage for a new entry or its key copy could not be allocated.
    #[error("failed to allocate an entry for a {key_len}-byte key")]
    EntryAlloc {
        /// Length of the key being inserted.
        key_len: usize,
    },
}
