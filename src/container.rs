//! Container: one [`OrderedStore`] plus one index strategy.
//!
//! The store owns elements and defines iteration order; the index maps keys
//! to store handles. Every public mutation keeps the two in lockstep:
//! an element and its index entry are created together and destroyed
//! together, and `index.len() == store.len()` between calls.
//!
//! Handles survive every operation except erasure of their own element and
//! `clear`/`assign`. After [`Container::swap`] a handle keeps referring to
//! the same element, which now lives in the other container.

use crate::error::Error;
use crate::index::{Index, OrderedIndex, Placement};
use crate::reentrancy::DebugReentrancy;
use crate::store::{Handle, Handles, Iter, OrderedStore};
use core::fmt;
use log::trace;

pub struct Container<T, I> {
    store: OrderedStore<T>,
    index: I,
    reentrancy: DebugReentrancy,
}

impl<T, I: Index<T>> Container<T, I> {
    /// Build around an empty index.
    pub fn with_index(index: I) -> Self {
        assert_eq!(index.len(), 0, "container index must start empty");
        Self {
            store: OrderedStore::new(),
            index,
            reentrancy: DebugReentrancy::new(),
        }
    }

    pub(crate) fn index(&self) -> &I {
        &self.index
    }

    pub(crate) fn index_mut(&mut self) -> &mut I {
        &mut self.index
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn begin(&self) -> Handle {
        self.store.begin()
    }

    pub fn end(&self) -> Handle {
        self.store.end()
    }

    pub fn first(&self) -> Option<&T> {
        self.store.get(self.store.begin()).ok()
    }

    pub fn last(&self) -> Option<&T> {
        self.store.get(self.store.last()).ok()
    }

    /// Element at `h`.
    pub fn get(&self, h: Handle) -> Result<&T, Error> {
        self.store.get(h)
    }

    /// Handle after `h`; fails on the end position.
    pub fn next(&self, h: Handle) -> Result<Handle, Error> {
        self.store.next(h)
    }

    /// Handle before `h`; `prev(end())` is the last element.
    pub fn prev(&self, h: Handle) -> Result<Handle, Error> {
        self.store.prev(h)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.store.iter()
    }

    /// Elements in `[first, last)`.
    pub fn range(&self, first: Handle, last: Handle) -> Result<Iter<'_, T>, Error> {
        self.store.range(first, last)
    }

    pub fn handles(&self) -> Handles<'_, T> {
        self.store.handles()
    }

    /// Handle of an element with an equivalent key, or `end()`.
    pub fn find(&self, key: &I::Key) -> Handle {
        let _g = self.reentrancy.enter("find");
        self.index
            .find(&self.store, key)
            .unwrap_or_else(|| self.store.end())
    }

    pub fn contains(&self, key: &I::Key) -> bool {
        let _g = self.reentrancy.enter("contains");
        self.index.find(&self.store, key).is_some()
    }

    pub fn count(&self, key: &I::Key) -> usize {
        let _g = self.reentrancy.enter("count");
        self.index.count(&self.store, key)
    }

    /// Insert `value`. Unique containers return the existing element's
    /// handle and `false` when an equivalent key is present; multi
    /// containers always insert.
    pub fn insert(&mut self, value: T) -> (Handle, bool) {
        let _g = self.reentrancy.enter("insert");
        Self::place_and_link(&mut self.store, &mut self.index, value)
    }

    /// Insert rejecting equivalent keys, whatever the container shape.
    pub fn insert_unique(&mut self, value: T) -> (Handle, bool) {
        let _g = self.reentrancy.enter("insert_unique");
        if I::MULTI {
            let key = self.index.key_of(&value);
            if let Some(h) = self.index.find(&self.store, key) {
                return (h, false);
            }
        }
        Self::place_and_link(&mut self.store, &mut self.index, value)
    }

    /// Insert with a position hint. The hint must be a valid position of
    /// this container; placement is still decided by the key.
    pub fn insert_hint(&mut self, hint: Handle, value: T) -> Result<Handle, Error> {
        self.store.position(hint)?;
        Ok(self.insert(value).0)
    }

    /// Insert every element of `iter`; returns how many were added.
    pub fn insert_iter<It: IntoIterator<Item = T>>(&mut self, iter: It) -> usize {
        let _g = self.reentrancy.enter("insert_iter");
        let mut added = 0;
        for v in iter {
            if Self::place_and_link(&mut self.store, &mut self.index, v).1 {
                added += 1;
            }
        }
        added
    }

    /// Replace the contents with `iter`. Outstanding handles become stale.
    pub fn assign<It: IntoIterator<Item = T>>(&mut self, iter: It) {
        trace!("assign: dropping {} elements", self.len());
        self.clear();
        self.insert_iter(iter);
    }

    fn place_and_link(store: &mut OrderedStore<T>, index: &mut I, value: T) -> (Handle, bool) {
        match index.place(store, index.key_of(&value)) {
            Placement::Occupied(h) => (h, false),
            Placement::Vacant { slot, before } => {
                let before = before.map(|b| b.node().expect("placement never precedes end"));
                let h = store.link_before(before, value);
                index.attach(slot, h);
                (h, true)
            }
        }
    }

    fn unlink(store: &mut OrderedStore<T>, index: &mut I, h: Handle) -> Result<T, Error> {
        store.resolve(h)?;
        index.detach(store, h);
        store.unlink(h)
    }

    /// Erase every element with an equivalent key; returns how many.
    pub fn erase_key(&mut self, key: &I::Key) -> usize {
        let _g = self.reentrancy.enter("erase_key");
        let run = self.index.equal_handles(&self.store, key);
        for &h in &run {
            Self::unlink(&mut self.store, &mut self.index, h).expect("indexed handle is live");
        }
        run.len()
    }

    /// Erase exactly the element at `h` and return the following position.
    pub fn erase(&mut self, h: Handle) -> Result<Handle, Error> {
        let _g = self.reentrancy.enter("erase");
        let next = self.store.next(h)?;
        Self::unlink(&mut self.store, &mut self.index, h)?;
        Ok(next)
    }

    /// Erase `h` and hand back its element.
    pub fn remove(&mut self, h: Handle) -> Result<T, Error> {
        let _g = self.reentrancy.enter("remove");
        Self::unlink(&mut self.store, &mut self.index, h)
    }

    /// Erase `[first, last)` and return `last`. Nothing is erased if the
    /// range is malformed.
    pub fn erase_range(&mut self, first: Handle, last: Handle) -> Result<Handle, Error> {
        let _g = self.reentrancy.enter("erase_range");
        let n = self.store.distance(first, last)?;
        let mut cur = first;
        for _ in 0..n {
            let next = self.store.next(cur)?;
            Self::unlink(&mut self.store, &mut self.index, cur)?;
            cur = next;
        }
        Ok(cur)
    }

    /// Drop all elements; the index returns to its initial shape.
    pub fn clear(&mut self) {
        trace!("clear: dropping {} elements", self.len());
        self.store.clear();
        self.index.clear();
    }

    /// Exchange contents with `other` without touching elements.
    pub fn swap(&mut self, other: &mut Self) {
        trace!("swap: {} <-> {} elements", self.len(), other.len());
        core::mem::swap(&mut self.store, &mut other.store);
        core::mem::swap(&mut self.index, &mut other.index);
    }

    /// Panic if the store and index disagree or the index is malformed.
    #[doc(hidden)]
    pub fn check_invariants(&self) {
        let _g = self.reentrancy.enter("check_invariants");
        assert_eq!(self.index.len(), self.store.len(), "index and store sizes differ");
        self.index.check(&self.store);
    }
}

impl<T, I: OrderedIndex<T>> Container<T, I> {
    /// First element whose key is not less than `key`, or `end()`.
    pub fn lower_bound(&self, key: &I::Key) -> Handle {
        let _g = self.reentrancy.enter("lower_bound");
        self.index
            .lower_bound(&self.store, key)
            .unwrap_or_else(|| self.store.end())
    }

    /// First element whose key is greater than `key`, or `end()`.
    pub fn upper_bound(&self, key: &I::Key) -> Handle {
        let _g = self.reentrancy.enter("upper_bound");
        self.index
            .upper_bound(&self.store, key)
            .unwrap_or_else(|| self.store.end())
    }

    /// `(lower_bound(key), upper_bound(key))`.
    pub fn equal_range(&self, key: &I::Key) -> (Handle, Handle) {
        (self.lower_bound(key), self.upper_bound(key))
    }

    /// An element with an equivalent key, else a neighbour of where `key`
    /// would go; `end()` only when empty.
    pub fn nearest(&self, key: &I::Key) -> Handle {
        let _g = self.reentrancy.enter("nearest");
        self.index
            .nearest(&self.store, key)
            .unwrap_or_else(|| self.store.end())
    }
}

impl<K, V, I: Index<(K, V), Key = K>> Container<(K, V), I> {
    pub fn get_value(&self, key: &K) -> Option<&V> {
        let h = self.find(key);
        self.store.get(h).ok().map(|(_, v)| v)
    }

    pub fn get_value_mut(&mut self, key: &K) -> Option<&mut V> {
        let h = self.find(key);
        self.store.get_mut(h).ok().map(|(_, v)| v)
    }

    /// Mapped value for `key`, or `KeyNotFound`.
    pub fn at(&self, key: &K) -> Result<&V, Error> {
        self.get_value(key).ok_or(Error::KeyNotFound)
    }

    /// Mutable mapped value at `h`. Keys are never exposed mutably.
    pub fn value_mut(&mut self, h: Handle) -> Result<&mut V, Error> {
        self.store.get_mut(h).map(|(_, v)| v)
    }

    /// Mapped value for `key`, inserting `default()` first if absent.
    pub fn get_or_insert_with<D: FnOnce() -> V>(&mut self, key: K, default: D) -> &mut V {
        let mut h = self.find(&key);
        if h.is_end() {
            h = self.insert_unique((key, default())).0;
        }
        self.store
            .get_mut(h)
            .map(|(_, v)| v)
            .expect("found or inserted handle is live")
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

impl<T, I: Index<T> + Default> Default for Container<T, I> {
    fn default() -> Self {
        Self::with_index(I::default())
    }
}

impl<T, I: Index<T>> Extend<T> for Container<T, I> {
    fn extend<It: IntoIterator<Item = T>>(&mut self, iter: It) {
        self.insert_iter(iter);
    }
}

impl<T, I: Index<T> + Default> FromIterator<T> for Container<T, I> {
    fn from_iter<It: IntoIterator<Item = T>>(iter: It) -> Self {
        let mut c = Self::default();
        c.insert_iter(iter);
        c
    }
}

impl<'a, T, I: Index<T>> IntoIterator for &'a Container<T, I> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T: fmt::Debug, I> fmt::Debug for Container<T, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.store.iter()).finish()
    }
}
