//! Hash-backed containers: iteration follows insertion order of the
//! surviving elements.

use crate::container::Container;
use crate::error::Error;
use crate::hash_index::{HashConfig, HashIndex};
use crate::index::Index;
use crate::policy::{First, Identity, KeyFetcher, StdEq};
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// Set of unique keys.
pub type UnorderedSet<K, S = DefaultHashBuilder, E = StdEq> =
    Container<K, HashIndex<Identity, S, E, false>>;
/// Set of keys allowing equal duplicates.
pub type UnorderedMultiSet<K, S = DefaultHashBuilder, E = StdEq> =
    Container<K, HashIndex<Identity, S, E, true>>;
/// Map with unique keys.
pub type UnorderedMap<K, V, S = DefaultHashBuilder, E = StdEq> =
    Container<(K, V), HashIndex<First, S, E, false>>;
/// Map allowing equal keys.
pub type UnorderedMultiMap<K, V, S = DefaultHashBuilder, E = StdEq> =
    Container<(K, V), HashIndex<First, S, E, true>>;

impl<F: Default, S: Default, E: Default, const M: bool> Default for HashIndex<F, S, E, M> {
    fn default() -> Self {
        HashIndex::new(F::default(), S::default(), E::default())
    }
}

impl<T, F: Default, const M: bool> Container<T, HashIndex<F, DefaultHashBuilder, StdEq, M>>
where
    HashIndex<F, DefaultHashBuilder, StdEq, M>: Index<T>,
{
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    pub fn with_config(config: HashConfig) -> Result<Self, Error> {
        Self::with_parts(DefaultHashBuilder::default(), StdEq, config)
    }
}

impl<T, F: Default, S, E, const M: bool> Container<T, HashIndex<F, S, E, M>>
where
    HashIndex<F, S, E, M>: Index<T>,
{
    pub fn with_hasher(hasher: S) -> Self
    where
        E: Default,
    {
        Self::with_hasher_and_eq(hasher, E::default())
    }

    pub fn with_hasher_and_eq(hasher: S, eq: E) -> Self {
        Container::with_index(HashIndex::new(F::default(), hasher, eq))
    }

    pub fn with_parts(hasher: S, eq: E, config: HashConfig) -> Result<Self, Error> {
        HashIndex::with_config(F::default(), hasher, eq, config).map(Container::with_index)
    }

    pub fn hasher(&self) -> &S {
        self.index().hasher()
    }

    pub fn key_eq(&self) -> &E {
        self.index().key_eq()
    }

    pub fn bucket_count(&self) -> usize {
        self.index().bucket_count()
    }

    /// Number of elements chained in bucket `i`.
    pub fn bucket_len(&self, i: usize) -> usize {
        self.index().bucket_len(i)
    }

    pub fn load_factor(&self) -> f32 {
        self.index().load_factor()
    }

    pub fn max_load_factor(&self) -> f32 {
        self.index().max_load_factor()
    }

    /// Rehashes right away if the current size exceeds the new bound.
    pub fn set_max_load_factor(&mut self, f: f32) -> Result<(), Error> {
        self.index_mut().set_max_load_factor(f)
    }

    /// Grow so that `n` elements fit without another rehash.
    pub fn reserve(&mut self, n: usize) {
        self.index_mut().reserve(n);
    }

    /// Rebuild with at least `bucket_count` buckets (and enough for the
    /// current elements). The only way the table shrinks.
    pub fn rehash(&mut self, bucket_count: usize) {
        self.index_mut().rehash(bucket_count);
    }

    /// Bucket `key` maps to.
    pub fn bucket(&self, key: &F::Key) -> usize
    where
        F: KeyFetcher<T>,
        F::Key: Hash,
        S: BuildHasher,
    {
        self.index().bucket::<T>(key)
    }
}
