//! Ordered Store: a doubly-linked sequence of elements living in a
//! generational arena.
//!
//! Nodes are addressed by `slotmap` keys, so a [`Handle`] stays valid for as
//! long as its own node is linked, no matter what happens to its
//! neighbours. Unlinking bumps the slot generation; a stale handle is
//! detected instead of aliasing whatever reuses the slot.
//!
//! Links: `next` is the forward chain the store walks when iterating,
//! `prev` is the back-reference used for reverse steps and O(1) unlink.
//! Both are plain keys, so there is no ownership cycle to manage.

use crate::error::Error;
use core::hash::{Hash, Hasher};
use core::sync::atomic::{AtomicU64, Ordering};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Arena key of a store node.
    pub(crate) struct NodeKey;
}

/// Identity of one store. Handles remember the store that minted them.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct StoreId(u64);

static NEXT_STORE_ID: AtomicU64 = AtomicU64::new(1);

impl StoreId {
    fn fresh() -> Self {
        StoreId(NEXT_STORE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Iterator handle: a position in an [`OrderedStore`].
///
/// A handle is either an element position or the end sentinel of its store.
/// Equality and hashing use the store identity and the position only; the
/// creation sequence number is an ordering tie-breaker for multi-key indexes.
#[derive(Copy, Clone, Debug)]
pub struct Handle {
    node: Option<NodeKey>,
    owner: StoreId,
    seq: u64,
}

impl Handle {
    fn end(owner: StoreId) -> Self {
        Handle {
            node: None,
            owner,
            seq: 0,
        }
    }

    /// True for the past-the-end sentinel.
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    /// Store this handle was obtained from.
    pub fn owner(&self) -> StoreId {
        self.owner
    }

    pub(crate) fn node(&self) -> Option<NodeKey> {
        self.node
    }

    /// Creation order within the owning store. Later inserts have larger values.
    pub(crate) fn seq(&self) -> u64 {
        self.seq
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.node == other.node
    }
}

impl Eq for Handle {}

impl Hash for Handle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.node.hash(state);
    }
}

#[derive(Debug)]
struct StoreNode<T> {
    value: T,
    seq: u64,
    prev: Option<NodeKey>,
    next: Option<NodeKey>,
}

#[derive(Debug)]
pub struct OrderedStore<T> {
    id: StoreId,
    nodes: SlotMap<NodeKey, StoreNode<T>>,
    head: Option<NodeKey>,
    tail: Option<NodeKey>,
    next_seq: u64,
}

impl<T> Default for OrderedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OrderedStore<T> {
    pub fn new() -> Self {
        Self {
            id: StoreId::fresh(),
            nodes: SlotMap::with_key(),
            head: None,
            tail: None,
            next_seq: 0,
        }
    }

    pub fn id(&self) -> StoreId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn begin(&self) -> Handle {
        self.handle_at(self.head)
    }

    pub fn end(&self) -> Handle {
        Handle::end(self.id)
    }

    /// Handle of the last element, or end when empty.
    pub fn last(&self) -> Handle {
        self.handle_at(self.tail)
    }

    fn handle_at(&self, node: Option<NodeKey>) -> Handle {
        match node {
            Some(k) => Handle {
                node: Some(k),
                owner: self.id,
                seq: self.nodes[k].seq,
            },
            None => self.end(),
        }
    }

    /// Resolve a position that may be the end sentinel.
    pub(crate) fn position(&self, h: Handle) -> Result<Option<NodeKey>, Error> {
        if h.owner != self.id {
            return Err(Error::ForeignHandle);
        }
        match h.node {
            Some(k) if !self.nodes.contains_key(k) => Err(Error::StaleHandle),
            node => Ok(node),
        }
    }

    /// Resolve a dereferenceable position.
    pub(crate) fn resolve(&self, h: Handle) -> Result<NodeKey, Error> {
        self.position(h)?.ok_or(Error::PastEnd)
    }

    pub fn get(&self, h: Handle) -> Result<&T, Error> {
        let k = self.resolve(h)?;
        Ok(&self.nodes[k].value)
    }

    pub fn get_mut(&mut self, h: Handle) -> Result<&mut T, Error> {
        let k = self.resolve(h)?;
        Ok(&mut self.nodes[k].value)
    }

    /// Element behind a handle an index holds. Index entries always refer to
    /// linked nodes; anything else is a bookkeeping bug.
    pub(crate) fn indexed(&self, h: Handle) -> &T {
        let k = h.node.expect("index entries never hold the end sentinel");
        &self
            .nodes
            .get(k)
            .expect("index entry must refer to a linked store node")
            .value
    }

    pub fn next(&self, h: Handle) -> Result<Handle, Error> {
        let k = self.resolve(h)?;
        Ok(self.handle_at(self.nodes[k].next))
    }

    pub fn prev(&self, h: Handle) -> Result<Handle, Error> {
        let prev = match self.position(h)? {
            Some(k) => self.nodes[k].prev,
            None => self.tail,
        };
        prev.map(|p| self.handle_at(Some(p)))
            .ok_or(Error::BeforeBegin)
    }

    /// Link `value` immediately before `before` (end appends).
    pub fn insert_before(&mut self, before: Handle, value: T) -> Result<Handle, Error> {
        let before = self.position(before)?;
        Ok(self.link_before(before, value))
    }

    pub fn append(&mut self, value: T) -> Handle {
        self.link_before(None, value)
    }

    pub(crate) fn link_before(&mut self, before: Option<NodeKey>, value: T) -> Handle {
        let seq = self.next_seq;
        self.next_seq += 1;
        let prev = match before {
            Some(b) => self.nodes[b].prev,
            None => self.tail,
        };
        let k = self.nodes.insert(StoreNode {
            value,
            seq,
            prev,
            next: before,
        });
        match prev {
            Some(p) => self.nodes[p].next = Some(k),
            None => self.head = Some(k),
        }
        match before {
            Some(b) => self.nodes[b].prev = Some(k),
            None => self.tail = Some(k),
        }
        Handle {
            node: Some(k),
            owner: self.id,
            seq,
        }
    }

    /// Remove the element at `h`. Only `h` is invalidated.
    pub fn unlink(&mut self, h: Handle) -> Result<T, Error> {
        let k = self.resolve(h)?;
        let node = self.nodes.remove(k).expect("resolved node is linked");
        match node.prev {
            Some(p) => self.nodes[p].next = node.next,
            None => self.head = node.next,
        }
        match node.next {
            Some(n) => self.nodes[n].prev = node.prev,
            None => self.tail = node.prev,
        }
        Ok(node.value)
    }

    /// Drop every element. All outstanding element handles become stale.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    /// Number of steps from `first` to `last`, or `InvalidRange` if `last`
    /// does not follow `first`.
    pub(crate) fn distance(&self, first: Handle, last: Handle) -> Result<usize, Error> {
        let mut cur = self.position(first)?;
        let stop = self.position(last)?;
        let mut n = 0;
        while cur != stop {
            match cur {
                Some(k) => {
                    cur = self.nodes[k].next;
                    n += 1;
                }
                None => return Err(Error::InvalidRange),
            }
        }
        Ok(n)
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            store: self,
            front: self.head,
            back: self.tail,
            remaining: self.len(),
        }
    }

    /// Elements in `[first, last)`.
    pub fn range(&self, first: Handle, last: Handle) -> Result<Iter<'_, T>, Error> {
        let remaining = self.distance(first, last)?;
        let front = self.position(first)?;
        let back = match self.position(last)? {
            Some(k) => self.nodes[k].prev,
            None => self.tail,
        };
        Ok(Iter {
            store: self,
            front,
            back,
            remaining,
        })
    }

    /// Handles of all elements in traversal order.
    pub fn handles(&self) -> Handles<'_, T> {
        Handles {
            store: self,
            cur: self.head,
        }
    }
}

/// Double-ended iterator over a span of an [`OrderedStore`].
pub struct Iter<'a, T> {
    store: &'a OrderedStore<T>,
    front: Option<NodeKey>,
    back: Option<NodeKey>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = &self.store.nodes[self.front?];
        self.front = node.next;
        self.remaining -= 1;
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = &self.store.nodes[self.back?];
        self.back = node.prev;
        self.remaining -= 1;
        Some(&node.value)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

pub struct Handles<'a, T> {
    store: &'a OrderedStore<T>,
    cur: Option<NodeKey>,
}

impl<T> Iterator for Handles<'_, T> {
    type Item = Handle;

    fn next(&mut self) -> Option<Handle> {
        let k = self.cur?;
        self.cur = self.store.nodes[k].next;
        Some(self.store.handle_at(Some(k)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<T: Clone>(s: &OrderedStore<T>) -> Vec<T> {
        s.iter().cloned().collect()
    }

    #[test]
    fn append_and_insert_before_keep_order() {
        let mut s = OrderedStore::new();
        let a = s.append('a');
        let c = s.append('c');
        s.insert_before(c, 'b').unwrap();
        s.insert_before(a, '0').unwrap();
        let end = s.end();
        s.insert_before(end, 'd').unwrap();
        assert_eq!(collect(&s), vec!['0', 'a', 'b', 'c', 'd']);
        assert_eq!(s.iter().rev().cloned().collect::<Vec<_>>(), vec!['d', 'c', 'b', 'a', '0']);
    }

    #[test]
    fn unlink_invalidates_only_its_handle() {
        let mut s = OrderedStore::new();
        let hs: Vec<_> = (0..5).map(|i| s.append(i)).collect();
        assert_eq!(s.unlink(hs[2]), Ok(2));
        assert_eq!(s.get(hs[2]), Err(Error::StaleHandle));
        for &i in &[0usize, 1, 3, 4] {
            assert_eq!(s.get(hs[i]), Ok(&(i as i32)));
        }
        assert_eq!(s.next(hs[1]).unwrap(), hs[3]);
        assert_eq!(s.prev(hs[3]).unwrap(), hs[1]);
        assert_eq!(collect(&s), vec![0, 1, 3, 4]);
    }

    #[test]
    fn unlink_head_and_tail() {
        let mut s = OrderedStore::new();
        let a = s.append(1);
        let b = s.append(2);
        let c = s.append(3);
        s.unlink(a).unwrap();
        s.unlink(c).unwrap();
        assert_eq!(s.begin(), b);
        assert_eq!(s.last(), b);
        s.unlink(b).unwrap();
        assert!(s.is_empty());
        assert!(s.begin().is_end());
        assert_eq!(s.prev(s.end()), Err(Error::BeforeBegin));
    }

    #[test]
    fn end_sentinel_errors() {
        let mut s: OrderedStore<u8> = OrderedStore::new();
        let end = s.end();
        assert_eq!(s.get(end), Err(Error::PastEnd));
        assert_eq!(s.next(end), Err(Error::PastEnd));
        assert_eq!(s.unlink(end), Err(Error::PastEnd));
    }

    #[test]
    fn foreign_handles_rejected() {
        let mut s1 = OrderedStore::new();
        let s2: OrderedStore<i32> = OrderedStore::new();
        let h = s1.append(1);
        assert_eq!(s2.get(h), Err(Error::ForeignHandle));
        assert_ne!(s1.end(), s2.end());
    }

    #[test]
    fn stale_handle_does_not_alias_reused_slot() {
        let mut s = OrderedStore::new();
        let h1 = s.append("old");
        s.unlink(h1).unwrap();
        let h2 = s.append("new");
        assert_ne!(h1, h2);
        assert_eq!(s.get(h1), Err(Error::StaleHandle));
        assert!(h2.seq() > h1.seq());
    }

    #[test]
    fn clear_invalidates_everything() {
        let mut s = OrderedStore::new();
        let h = s.append(7);
        s.clear();
        assert!(s.is_empty());
        assert_eq!(s.get(h), Err(Error::StaleHandle));
        s.append(8);
        assert_eq!(collect(&s), vec![8]);
    }

    #[test]
    fn range_and_distance() {
        let mut s = OrderedStore::new();
        let hs: Vec<_> = (0..6).map(|i| s.append(i)).collect();
        let r: Vec<_> = s.range(hs[1], hs[4]).unwrap().cloned().collect();
        assert_eq!(r, vec![1, 2, 3]);
        let back: Vec<_> = s.range(hs[1], hs[4]).unwrap().rev().cloned().collect();
        assert_eq!(back, vec![3, 2, 1]);
        assert_eq!(s.distance(hs[0], s.end()), Ok(6));
        assert_eq!(s.range(hs[4], hs[1]).err(), Some(Error::InvalidRange));
        assert_eq!(s.handles().collect::<Vec<_>>(), hs);
    }
}
