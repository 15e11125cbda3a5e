//! Caller-supplied collaborators: key fetchers, orderings and equality.
//!
//! Hashing uses `core::hash::BuildHasher` directly; a custom hasher is a
//! custom `BuildHasher`.

/// Extracts the key an index orders or hashes by from a stored element.
pub trait KeyFetcher<T> {
    type Key;

    fn fetch<'a>(&self, value: &'a T) -> &'a Self::Key;
}

/// Sets: the element is its own key.
#[derive(Copy, Clone, Debug, Default)]
pub struct Identity;

impl<K> KeyFetcher<K> for Identity {
    type Key = K;

    #[inline]
    fn fetch<'a>(&self, value: &'a K) -> &'a K {
        value
    }
}

/// Maps: the key is the first half of a `(key, mapped)` pair.
#[derive(Copy, Clone, Debug, Default)]
pub struct First;

impl<K, V> KeyFetcher<(K, V)> for First {
    type Key = K;

    #[inline]
    fn fetch<'a>(&self, value: &'a (K, V)) -> &'a K {
        &value.0
    }
}

/// Strict weak ordering over keys.
///
/// `less` must be irreflexive and transitive, and equivalence
/// (`!less(a, b) && !less(b, a)`) must be transitive. This is not checked.
pub trait Compare<K: ?Sized> {
    fn less(&self, a: &K, b: &K) -> bool;

    #[inline]
    fn equivalent(&self, a: &K, b: &K) -> bool {
        !self.less(a, b) && !self.less(b, a)
    }
}

/// Ordering from `K: Ord`.
#[derive(Copy, Clone, Debug, Default)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> Compare<K> for NaturalOrder {
    #[inline]
    fn less(&self, a: &K, b: &K) -> bool {
        a < b
    }
}

/// Ordering from a `(a, b) -> a < b` closure.
#[derive(Copy, Clone, Debug, Default)]
pub struct CompareFn<F>(pub F);

impl<K: ?Sized, F> Compare<K> for CompareFn<F>
where
    F: Fn(&K, &K) -> bool,
{
    #[inline]
    fn less(&self, a: &K, b: &K) -> bool {
        (self.0)(a, b)
    }
}

/// Key equality for hash indexes. Must agree with the hasher:
/// `eq(a, b)` implies `hash(a) == hash(b)`.
pub trait KeyEq<K: ?Sized> {
    fn eq(&self, a: &K, b: &K) -> bool;
}

/// Equality from `K: Eq`.
#[derive(Copy, Clone, Debug, Default)]
pub struct StdEq;

impl<K: Eq + ?Sized> KeyEq<K> for StdEq {
    #[inline]
    fn eq(&self, a: &K, b: &K) -> bool {
        a == b
    }
}

/// Equality from a closure.
#[derive(Copy, Clone, Debug, Default)]
pub struct EqFn<F>(pub F);

impl<K: ?Sized, F> KeyEq<K> for EqFn<F>
where
    F: Fn(&K, &K) -> bool,
{
    #[inline]
    fn eq(&self, a: &K, b: &K) -> bool {
        (self.0)(a, b)
    }
}
