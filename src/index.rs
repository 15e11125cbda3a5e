//! Index strategy interface shared by the tree and hash indexes.
//!
//! An index never owns elements. It maps keys to [`Handle`]s into the
//! container's [`OrderedStore`] and reads keys back through the store when
//! it needs to compare. Insertion is split in two so the container can link
//! the store node in between:
//! 1. [`Index::place`] inspects the index and answers either with the
//!    existing handle (unique index, equal key present) or with a slot plus
//!    the store position the new element must be linked before;
//! 2. [`Index::attach`] registers the freshly linked handle at that slot.
//!
//! No mutation of the index may happen between the two calls.

use crate::store::{Handle, OrderedStore};

/// Outcome of [`Index::place`].
#[derive(Debug)]
pub enum Placement<S> {
    /// An equivalent key is already indexed and duplicates are not allowed.
    Occupied(Handle),
    /// Room for a new entry. `before` is the store position the element
    /// must precede; `None` appends.
    Vacant { slot: S, before: Option<Handle> },
}

pub trait Index<T> {
    type Key;
    /// Where a vacant placement will be attached.
    type Slot;

    /// Whether equivalent keys may coexist.
    const MULTI: bool;

    fn key_of<'a>(&self, value: &'a T) -> &'a Self::Key;

    fn len(&self) -> usize;

    fn place(&self, store: &OrderedStore<T>, key: &Self::Key) -> Placement<Self::Slot>;

    fn attach(&mut self, slot: Self::Slot, handle: Handle);

    /// Forget `handle`, matched by identity. Must run while the handle's
    /// store node is still linked.
    fn detach(&mut self, store: &OrderedStore<T>, handle: Handle);

    /// Some handle with an equivalent key; the first of the run for ordered
    /// indexes.
    fn find(&self, store: &OrderedStore<T>, key: &Self::Key) -> Option<Handle>;

    /// Every handle with an equivalent key.
    fn equal_handles(&self, store: &OrderedStore<T>, key: &Self::Key) -> Vec<Handle>;

    fn count(&self, store: &OrderedStore<T>, key: &Self::Key) -> usize {
        self.equal_handles(store, key).len()
    }

    fn clear(&mut self);

    /// Panic if the index disagrees with `store` or breaks its own invariants.
    fn check(&self, store: &OrderedStore<T>);
}

/// Indexes whose store order is key order. Bounds return `None` for the
/// end position.
pub trait OrderedIndex<T>: Index<T> {
    /// First entry whose key is not less than `key`.
    fn lower_bound(&self, store: &OrderedStore<T>, key: &Self::Key) -> Option<Handle>;

    /// First entry whose key is greater than `key`.
    fn upper_bound(&self, store: &OrderedStore<T>, key: &Self::Key) -> Option<Handle>;

    /// An entry equivalent to `key` if one exists, otherwise an in-order
    /// neighbour of the gap `key` would occupy.
    fn nearest(&self, store: &OrderedStore<T>, key: &Self::Key) -> Option<Handle>;
}
