//! Unordered index: chained buckets of handles keyed by `hash & (buckets - 1)`.
//!
//! - The bucket count is a power of two and never drops below
//!   [`MIN_BUCKETS`].
//! - `capacity = floor(bucket_count * max_load_factor)`. An insert that
//!   pushes the size past capacity grows the table to hold twice the old
//!   capacity, so after every insert `len <= bucket_count * max_load_factor`.
//! - Every bucket entry stores the key hash computed at insertion, and a
//!   side table keyed by store node remembers it too. Rehashing and erasure
//!   use the stored hash and never call the hasher after insertion; lookups
//!   compare stored hashes before calling the equality predicate.
//! - Erase never shrinks the table. Memory is traded for not paying a
//!   rehash on the erase path; `rehash(0)` compacts explicitly.
//! - Chains keep insertion order until a rehash; relative order within a
//!   destination bucket is not preserved across one.

use crate::error::Error;
use crate::index::{Index, Placement};
use crate::policy::{KeyEq, KeyFetcher};
use crate::store::{Handle, NodeKey, OrderedStore};
use core::hash::{BuildHasher, Hash};
use log::debug;
use slotmap::SecondaryMap;

/// Smallest bucket count a table ever has.
pub const MIN_BUCKETS: usize = 8;

/// Smallest accepted `max_load_factor`: one entry may demand at most 2^16
/// buckets.
pub const MIN_LOAD_FACTOR: f32 = 1.0 / 65536.0;

/// Sizing knobs for hash-backed containers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct HashConfig {
    /// Requested starting bucket count; rounded up to a power of two, at
    /// least [`MIN_BUCKETS`].
    pub initial_buckets: usize,
    /// Upper bound on `len / bucket_count`.
    pub max_load_factor: f32,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            initial_buckets: MIN_BUCKETS,
            max_load_factor: 1.0,
        }
    }
}

fn check_load_factor(f: f32) -> Result<f32, Error> {
    if f.is_finite() && f >= MIN_LOAD_FACTOR {
        Ok(f)
    } else {
        Err(Error::InvalidLoadFactor)
    }
}

#[cold]
fn capacity_overflow() -> ! {
    panic!("hash table capacity overflow")
}

fn round_buckets(n: usize) -> Option<usize> {
    n.max(MIN_BUCKETS).checked_next_power_of_two()
}

fn capacity_of(buckets: usize, max_load_factor: f32) -> usize {
    (buckets as f64 * f64::from(max_load_factor)).floor() as usize
}

/// Smallest legal bucket count able to hold `n` entries, or `None` if that
/// count does not fit in `usize`.
fn buckets_for(n: usize, max_load_factor: f32) -> Option<usize> {
    let want = (n as f64 / f64::from(max_load_factor)).ceil();
    // `usize::MAX as f64` rounds up to 2^BITS, so this rejects every
    // value the cast below would saturate.
    if want >= usize::MAX as f64 {
        return None;
    }
    let mut buckets = round_buckets(want as usize)?;
    while capacity_of(buckets, max_load_factor) < n {
        buckets = buckets.checked_mul(2)?;
    }
    Some(buckets)
}

#[derive(Copy, Clone, Debug)]
struct BucketEntry {
    hash: u64,
    handle: Handle,
}

/// Hash chosen by [`Index::place`].
#[derive(Copy, Clone, Debug)]
pub struct HashSlot {
    hash: u64,
}

#[derive(Debug)]
pub struct HashIndex<F, S, E, const M: bool> {
    fetcher: F,
    hasher: S,
    eq: E,
    buckets: Vec<Vec<BucketEntry>>,
    // Hash of every indexed node, read back on detach.
    hashes: SecondaryMap<NodeKey, u64>,
    len: usize,
    max_load_factor: f32,
    initial_buckets: usize,
}

impl<F, S, E, const M: bool> HashIndex<F, S, E, M> {
    pub fn new(fetcher: F, hasher: S, eq: E) -> Self {
        Self {
            fetcher,
            hasher,
            eq,
            buckets: vec![Vec::new(); MIN_BUCKETS],
            hashes: SecondaryMap::new(),
            len: 0,
            max_load_factor: 1.0,
            initial_buckets: MIN_BUCKETS,
        }
    }

    pub fn with_config(fetcher: F, hasher: S, eq: E, config: HashConfig) -> Result<Self, Error> {
        let max_load_factor = check_load_factor(config.max_load_factor)?;
        let initial_buckets =
            round_buckets(config.initial_buckets).unwrap_or_else(|| capacity_overflow());
        Ok(Self {
            fetcher,
            hasher,
            eq,
            buckets: vec![Vec::new(); initial_buckets],
            hashes: SecondaryMap::new(),
            len: 0,
            max_load_factor,
            initial_buckets,
        })
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    pub fn key_eq(&self) -> &E {
        &self.eq
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn bucket_len(&self, bucket: usize) -> usize {
        self.buckets.get(bucket).map_or(0, Vec::len)
    }

    pub fn load_factor(&self) -> f32 {
        self.len as f32 / self.buckets.len() as f32
    }

    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    /// Entries the current table holds before the next insert grows it.
    pub fn capacity(&self) -> usize {
        capacity_of(self.buckets.len(), self.max_load_factor)
    }

    /// Change the load bound; grows immediately if the table is now over it.
    pub fn set_max_load_factor(&mut self, f: f32) -> Result<(), Error> {
        self.max_load_factor = check_load_factor(f)?;
        if self.len > self.capacity() {
            self.reserve(self.len);
        }
        Ok(())
    }

    /// Make room for `n` entries without further growth. Panics if the
    /// required bucket count overflows `usize`.
    pub fn reserve(&mut self, n: usize) {
        let want = buckets_for(n, self.max_load_factor).unwrap_or_else(|| capacity_overflow());
        if want > self.buckets.len() {
            self.rehash_to(want);
        }
    }

    /// Rebuild with at least `bucket_count` buckets, and at least enough for
    /// the current entries. May shrink.
    pub fn rehash(&mut self, bucket_count: usize) {
        let want = round_buckets(bucket_count)
            .zip(buckets_for(self.len, self.max_load_factor))
            .map(|(asked, needed)| asked.max(needed))
            .unwrap_or_else(|| capacity_overflow());
        if want != self.buckets.len() {
            self.rehash_to(want);
        }
    }

    #[inline]
    fn bucket_of(&self, hash: u64) -> usize {
        (hash as usize) & (self.buckets.len() - 1)
    }

    fn rehash_to(&mut self, count: usize) {
        debug_assert!(count.is_power_of_two());
        debug!(
            "rehash: {} -> {} buckets ({} entries)",
            self.buckets.len(),
            count,
            self.len
        );
        let old = core::mem::replace(&mut self.buckets, vec![Vec::new(); count]);
        for entry in old.into_iter().flatten() {
            let b = self.bucket_of(entry.hash);
            self.buckets[b].push(entry);
        }
    }
}

impl<F, S: BuildHasher, E, const M: bool> HashIndex<F, S, E, M> {
    /// Bucket `key` currently maps to.
    pub fn bucket<T>(&self, key: &F::Key) -> usize
    where
        F: KeyFetcher<T>,
        F::Key: Hash,
    {
        self.bucket_of(self.hasher.hash_one(key))
    }

    fn matches<'s, T>(
        &'s self,
        store: &'s OrderedStore<T>,
        key: &'s F::Key,
    ) -> impl Iterator<Item = Handle> + 's
    where
        F: KeyFetcher<T>,
        F::Key: Hash,
        E: KeyEq<F::Key>,
    {
        let hash = self.hasher.hash_one(key);
        self.buckets[self.bucket_of(hash)]
            .iter()
            .filter(move |e| {
                e.hash == hash && self.eq.eq(key, self.fetcher.fetch(store.indexed(e.handle)))
            })
            .map(|e| e.handle)
    }
}

impl<T, F, S, E, const M: bool> Index<T> for HashIndex<F, S, E, M>
where
    F: KeyFetcher<T>,
    F::Key: Hash,
    S: BuildHasher,
    E: KeyEq<F::Key>,
{
    type Key = F::Key;
    type Slot = HashSlot;

    const MULTI: bool = M;

    #[inline]
    fn key_of<'a>(&self, value: &'a T) -> &'a F::Key {
        self.fetcher.fetch(value)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn place(&self, store: &OrderedStore<T>, key: &F::Key) -> Placement<HashSlot> {
        if !M {
            if let Some(h) = self.matches(store, key).next() {
                return Placement::Occupied(h);
            }
        }
        Placement::Vacant {
            slot: HashSlot {
                hash: self.hasher.hash_one(key),
            },
            before: None,
        }
    }

    fn attach(&mut self, slot: HashSlot, handle: Handle) {
        let node = handle.node().expect("attached handle must be an element");
        self.hashes.insert(node, slot.hash);
        let b = self.bucket_of(slot.hash);
        self.buckets[b].push(BucketEntry {
            hash: slot.hash,
            handle,
        });
        self.len += 1;
        let capacity = self.capacity();
        if self.len > capacity {
            self.reserve((capacity * 2).max(self.len));
        }
    }

    fn detach(&mut self, _store: &OrderedStore<T>, handle: Handle) {
        let hash = handle
            .node()
            .and_then(|node| self.hashes.remove(node))
            .expect("detached handle must be indexed");
        let b = self.bucket_of(hash);
        let chain = &mut self.buckets[b];
        let pos = chain
            .iter()
            .position(|e| e.handle == handle)
            .expect("detached handle must be in its key's bucket");
        chain.remove(pos);
        self.len -= 1;
    }

    fn find(&self, store: &OrderedStore<T>, key: &F::Key) -> Option<Handle> {
        self.matches(store, key).next()
    }

    fn equal_handles(&self, store: &OrderedStore<T>, key: &F::Key) -> Vec<Handle> {
        self.matches(store, key).collect()
    }

    fn count(&self, store: &OrderedStore<T>, key: &F::Key) -> usize {
        self.matches(store, key).count()
    }

    fn clear(&mut self) {
        self.buckets = vec![Vec::new(); self.initial_buckets];
        self.hashes.clear();
        self.len = 0;
    }

    fn check(&self, store: &OrderedStore<T>) {
        let count = self.buckets.len();
        assert!(count >= MIN_BUCKETS && count.is_power_of_two(), "bad bucket count {count}");
        assert_eq!(self.len, store.len(), "index and store sizes differ");
        assert_eq!(
            self.buckets.iter().map(Vec::len).sum::<usize>(),
            self.len,
            "bucket chains disagree with len"
        );
        assert!(self.len <= self.capacity(), "load factor exceeded");
        assert_eq!(self.hashes.len(), self.len, "hash side table disagrees with len");
        let mut seen = hashbrown::HashSet::with_capacity(self.len);
        for (i, chain) in self.buckets.iter().enumerate() {
            for (j, e) in chain.iter().enumerate() {
                let key = self.fetcher.fetch(store.indexed(e.handle));
                assert_eq!(e.hash, self.hasher.hash_one(key), "stale stored hash");
                assert_eq!(self.bucket_of(e.hash), i, "entry in the wrong bucket");
                assert_eq!(
                    e.handle.node().and_then(|n| self.hashes.get(n)),
                    Some(&e.hash),
                    "side table hash differs from bucket entry"
                );
                assert!(seen.insert(e.handle), "handle indexed twice");
                if !M {
                    let dup = chain[j + 1..].iter().any(|o| {
                        o.hash == e.hash
                            && self.eq.eq(key, self.fetcher.fetch(store.indexed(o.handle)))
                    });
                    assert!(!dup, "equal keys in a unique index");
                }
            }
        }
    }
}
