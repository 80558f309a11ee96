use core::hash::BuildHasher;
use core::hash::Hasher;

/// Initial state of the DJB2 recurrence.
pub const DJB2_SEED: u64 = 5381;

#[inline(always)]
fn round(hash: u64, byte: u8) -> u64 {
    // hash * 33 + byte
    (hash << 5).wrapping_add(hash).wrapping_add(byte as u64)
}

#[inline]
fn djb2_continue(mut hash: u64, bytes: &[u8]) -> u64 {
    let mut chunks = bytes.chunks_exact(8);
    for chunk in &mut chunks {
        hash = round(hash, chunk[0]);
        hash = round(hash, chunk[1]);
        hash = round(hash, chunk[2]);
        hash = round(hash, chunk[3]);
        hash = round(hash, chunk[4]);
        hash = round(hash, chunk[5]);
        hash = round(hash, chunk[6]);
        hash = round(hash, chunk[7]);
    }

    for &byte in chunks.remainder() {
        hash = round(hash, byte);
    }

    hash
}

/// Hashes `key` with DJB2 ("times 33 plus addition").
///
/// Arithmetic wraps modulo 2^64. The digest depends only on the bytes of the
/// slice, so keys with embedded zero bytes hash like any other input and the
/// empty key hashes to [`DJB2_SEED`].
///
/// # Examples
///
/// ```rust
/// use chain_hash::hasher::djb2;
///
/// assert_eq!(djb2(b""), 5381);
/// assert_eq!(djb2(b"a"), 5381 * 33 + 97);
/// ```
#[inline]
pub fn djb2(key: &[u8]) -> u64 {
    djb2_continue(DJB2_SEED, key)
}

/// A streaming [`Hasher`] over the DJB2 recurrence.
///
/// Successive calls to [`write`](Hasher::write) continue the recurrence, so
/// writing a key in pieces gives the same digest as [`djb2`] over the whole
/// key.
#[derive(Debug, Clone, Copy)]
pub struct Djb2Hasher {
    state: u64,
}

impl Default for Djb2Hasher {
    fn default() -> Self {
        Self { state: DJB2_SEED }
    }
}

impl Hasher for Djb2Hasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.state
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.state = djb2_continue(self.state, bytes);
    }
}

/// The default hash builder for [`HashTable`](crate::HashTable).
///
/// Unseeded and deterministic: the same key always lands in the same bucket
/// for a given bucket count.
#[derive(Debug, Clone, Copy, Default)]
pub struct Djb2State;

impl BuildHasher for Djb2State {
    type Hasher = Djb2Hasher;

    #[inline]
    fn build_hasher(&self) -> Self::Hasher {
        Djb2Hasher::default()
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// A randomly seeded hash builder, for tables exposed to keys chosen by
        /// an adversary. Backed by `foldhash`.
        pub type RandomState = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// A randomly seeded hash builder, for tables exposed to keys chosen by
        /// an adversary. Backed by the standard library's SipHash.
        pub type RandomState = std::hash::RandomState;
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    fn reference(key: &[u8]) -> u64 {
        key.iter()
            .fold(DJB2_SEED, |h, &b| h.wrapping_mul(33).wrapping_add(b as u64))
    }

    #[test]
    fn known_digests() {
        assert_eq!(djb2(b""), 5381);
        assert_eq!(djb2(b"a"), 177670);
        assert_eq!(djb2(b"hello"), 210714636441);
        assert_eq!(djb2(b"just"), 6385381547);
        assert_eq!(djb2(b"a\0b"), 193482728);
    }

    #[test]
    fn wraps_on_long_keys() {
        let key = [b'x'; 100];
        assert_eq!(djb2(&key), 13306350410005300325);
        assert_eq!(djb2(&key), reference(&key));
    }

    #[test]
    fn chunked_walk_matches_bytewise() {
        let bytes: Vec<u8> = (0..=255u8).rev().collect();
        for len in 0..40 {
            assert_eq!(djb2(&bytes[..len]), reference(&bytes[..len]), "len {len}");
        }
    }

    #[test]
    fn zero_bytes_are_hashed() {
        assert_ne!(djb2(b"a"), djb2(b"a\0"));
        assert_ne!(djb2(b""), djb2(b"\0"));
        assert_ne!(djb2(b"\0"), djb2(b"\0\0"));
    }

    #[test]
    fn known_collisions() {
        assert_eq!(djb2(b"Ez"), djb2(b"FY"));
        assert_eq!(djb2(b"EzEzEzEzEzEzEzEz"), djb2(b"EzEzEzEzEzEzEzFY"));
        assert_eq!(djb2(b"EzEzEzEzEzEzEzEz"), 4971614465568764669);
    }

    #[test]
    fn split_writes_match_one_shot() {
        let key = b"the quick brown fox jumps over the lazy dog";
        for split in 0..key.len() {
            let mut hasher = Djb2State.build_hasher();
            hasher.write(&key[..split]);
            hasher.write(&key[split..]);
            assert_eq!(hasher.finish(), djb2(key), "split at {split}");
        }
    }

    #[cfg(any(feature = "foldhash", feature = "std"))]
    #[test]
    fn random_state_is_deterministic_per_instance() {
        let state = RandomState::default();
        let hash = |key: &[u8]| {
            let mut hasher = state.build_hasher();
            hasher.write(key);
            hasher.finish()
        };
        assert_eq!(hash(b"Ez"), hash(b"Ez"));
    }
}
