//! Ordered index: a red-black tree of handles sorted by a key comparator.
//!
//! Unique indexes reject equivalent keys at [`Index::place`]. Multi indexes
//! send equivalent keys to the right during descent, so a new entry lands
//! at the end of its equal-key run; within a run, entries are therefore in
//! creation order, which is the handle sequence number. Locating a specific
//! handle uses `(key, seq)` as a total order.
//!
//! Store order equals tree order: a new element is linked before the
//! in-order successor of its tree position.

use crate::index::{Index, OrderedIndex, Placement};
use crate::policy::{Compare, KeyFetcher};
use crate::rb_tree::{RbTree, Side, TreeKey};
use crate::store::{Handle, OrderedStore};

#[derive(Debug)]
pub struct TreeIndex<F, C, const M: bool> {
    fetcher: F,
    cmp: C,
    tree: RbTree<Handle>,
}

/// Leaf position chosen by [`Index::place`].
#[derive(Copy, Clone, Debug)]
pub struct TreeSlot {
    parent: Option<TreeKey>,
    side: Side,
}

impl<F, C, const M: bool> TreeIndex<F, C, M> {
    pub fn new(fetcher: F, cmp: C) -> Self {
        Self {
            fetcher,
            cmp,
            tree: RbTree::new(),
        }
    }

    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    fn key_at<'s, T>(&self, store: &'s OrderedStore<T>, k: TreeKey) -> &'s F::Key
    where
        F: KeyFetcher<T>,
    {
        self.fetcher.fetch(store.indexed(self.tree.item(k)))
    }

    /// Generalized bound descent. On an exact match the node becomes the
    /// candidate and descent continues toward `toward`, so the candidate ends
    /// as the first (`Left`) or last (`Right`) entry of the equal-key run.
    /// Without a match, the last node visited is a neighbour of `key`'s gap.
    fn nearest_node<T>(&self, store: &OrderedStore<T>, key: &F::Key, toward: Side) -> Option<TreeKey>
    where
        F: KeyFetcher<T>,
        C: Compare<F::Key>,
    {
        let mut cur = self.tree.root();
        let mut candidate = None;
        let mut last = None;
        while let Some(k) = cur {
            last = Some(k);
            let nk = self.key_at(store, k);
            let side = if self.cmp.less(key, nk) {
                Side::Left
            } else if self.cmp.less(nk, key) {
                Side::Right
            } else {
                candidate = Some(k);
                toward
            };
            cur = self.tree.child(k, side);
        }
        candidate.or(last)
    }

    fn lower_bound_node<T>(&self, store: &OrderedStore<T>, key: &F::Key) -> Option<TreeKey>
    where
        F: KeyFetcher<T>,
        C: Compare<F::Key>,
    {
        let n = self.nearest_node(store, key, Side::Left)?;
        if self.cmp.less(self.key_at(store, n), key) {
            self.tree.next(n)
        } else {
            Some(n)
        }
    }

    fn upper_bound_node<T>(&self, store: &OrderedStore<T>, key: &F::Key) -> Option<TreeKey>
    where
        F: KeyFetcher<T>,
        C: Compare<F::Key>,
    {
        let mut n = self.nearest_node(store, key, Side::Right);
        while let Some(k) = n {
            if self.cmp.less(key, self.key_at(store, k)) {
                break;
            }
            n = self.tree.next(k);
        }
        n
    }

    /// Tree node holding exactly `h`.
    fn locate<T>(&self, store: &OrderedStore<T>, h: Handle) -> Option<TreeKey>
    where
        F: KeyFetcher<T>,
        C: Compare<F::Key>,
    {
        let key = self.fetcher.fetch(store.indexed(h));
        let mut cur = self.tree.root();
        while let Some(k) = cur {
            let item = self.tree.item(k);
            if item == h {
                return Some(k);
            }
            let nk = self.key_at(store, k);
            let go_left = if self.cmp.less(key, nk) {
                true
            } else if self.cmp.less(nk, key) {
                false
            } else {
                h.seq() < item.seq()
            };
            cur = self
                .tree
                .child(k, if go_left { Side::Left } else { Side::Right });
        }
        None
    }

    /// First entry of `key`'s equal-key run, if any.
    fn run_start<T>(&self, store: &OrderedStore<T>, key: &F::Key) -> Option<TreeKey>
    where
        F: KeyFetcher<T>,
        C: Compare<F::Key>,
    {
        self.lower_bound_node(store, key)
            .filter(|&k| !self.cmp.less(key, self.key_at(store, k)))
    }
}

impl<T, F, C, const M: bool> Index<T> for TreeIndex<F, C, M>
where
    F: KeyFetcher<T>,
    C: Compare<F::Key>,
{
    type Key = F::Key;
    type Slot = TreeSlot;

    const MULTI: bool = M;

    #[inline]
    fn key_of<'a>(&self, value: &'a T) -> &'a F::Key {
        self.fetcher.fetch(value)
    }

    fn len(&self) -> usize {
        self.tree.len()
    }

    fn place(&self, store: &OrderedStore<T>, key: &F::Key) -> Placement<TreeSlot> {
        let mut parent = None;
        let mut side = Side::Left;
        let mut cur = self.tree.root();
        while let Some(k) = cur {
            parent = Some(k);
            let nk = self.key_at(store, k);
            side = if self.cmp.less(key, nk) {
                Side::Left
            } else if M || self.cmp.less(nk, key) {
                Side::Right
            } else {
                return Placement::Occupied(self.tree.item(k));
            };
            cur = self.tree.child(k, side);
        }
        let before = match (parent, side) {
            (None, _) => None,
            (Some(p), Side::Left) => Some(self.tree.item(p)),
            (Some(p), Side::Right) => self.tree.next(p).map(|n| self.tree.item(n)),
        };
        Placement::Vacant {
            slot: TreeSlot { parent, side },
            before,
        }
    }

    fn attach(&mut self, slot: TreeSlot, handle: Handle) {
        self.tree.attach(slot.parent, slot.side, handle);
    }

    fn detach(&mut self, store: &OrderedStore<T>, handle: Handle) {
        let k = self
            .locate(store, handle)
            .expect("detached handle must be indexed");
        let removed = self.tree.remove(k);
        debug_assert_eq!(removed, handle);
    }

    fn find(&self, store: &OrderedStore<T>, key: &F::Key) -> Option<Handle> {
        self.run_start(store, key).map(|k| self.tree.item(k))
    }

    fn equal_handles(&self, store: &OrderedStore<T>, key: &F::Key) -> Vec<Handle> {
        core::iter::successors(self.run_start(store, key), |&k| self.tree.next(k))
            .take_while(|&k| !self.cmp.less(key, self.key_at(store, k)))
            .map(|k| self.tree.item(k))
            .collect()
    }

    fn count(&self, store: &OrderedStore<T>, key: &F::Key) -> usize {
        core::iter::successors(self.run_start(store, key), |&k| self.tree.next(k))
            .take_while(|&k| !self.cmp.less(key, self.key_at(store, k)))
            .count()
    }

    fn clear(&mut self) {
        self.tree.clear();
    }

    fn check(&self, store: &OrderedStore<T>) {
        let key = |h: Handle| self.fetcher.fetch(store.indexed(h));
        // `validate` flags a neighbour pair when the later one sorts before
        // the earlier. Unique trees must also flag equivalent neighbours.
        let sorts_before = |a: &Handle, b: &Handle| {
            let (ka, kb) = (key(*a), key(*b));
            if M {
                self.cmp.less(ka, kb) || (!self.cmp.less(kb, ka) && a.seq() < b.seq())
            } else {
                !self.cmp.less(kb, ka)
            }
        };
        if let Err(e) = self.tree.validate(sorts_before) {
            panic!("red-black invariant violated: {e}");
        }
        assert_eq!(self.tree.len(), store.len(), "tree and store sizes differ");
        assert!(
            self.tree.items().into_iter().eq(store.handles()),
            "store order differs from tree order"
        );
    }
}

impl<T, F, C, const M: bool> OrderedIndex<T> for TreeIndex<F, C, M>
where
    F: KeyFetcher<T>,
    C: Compare<F::Key>,
{
    fn lower_bound(&self, store: &OrderedStore<T>, key: &F::Key) -> Option<Handle> {
        self.lower_bound_node(store, key).map(|k| self.tree.item(k))
    }

    fn upper_bound(&self, store: &OrderedStore<T>, key: &F::Key) -> Option<Handle> {
        self.upper_bound_node(store, key).map(|k| self.tree.item(k))
    }

    fn nearest(&self, store: &OrderedStore<T>, key: &F::Key) -> Option<Handle> {
        self.nearest_node(store, key, Side::Left)
            .map(|k| self.tree.item(k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{CompareFn, First, Identity, NaturalOrder};

    fn insert<T, I: Index<T>>(idx: &mut I, store: &mut OrderedStore<T>, v: T) -> (Handle, bool) {
        match idx.place(store, idx.key_of(&v)) {
            Placement::Occupied(h) => (h, false),
            Placement::Vacant { slot, before } => {
                let h = match before {
                    Some(b) => store.insert_before(b, v).unwrap(),
                    None => store.append(v),
                };
                idx.attach(slot, h);
                (h, true)
            }
        }
    }

    #[test]
    fn unique_rejects_equivalent_keys() {
        let mut store = OrderedStore::new();
        let mut idx: TreeIndex<Identity, NaturalOrder, false> = TreeIndex::new(Identity, NaturalOrder);
        let (h1, fresh) = insert(&mut idx, &mut store, 4);
        assert!(fresh);
        let (h2, fresh) = insert(&mut idx, &mut store, 4);
        assert!(!fresh);
        assert_eq!(h1, h2);
        assert_eq!(store.len(), 1);
        idx.check(&store);
    }

    #[test]
    fn store_follows_key_order() {
        let mut store = OrderedStore::new();
        let mut idx: TreeIndex<Identity, NaturalOrder, false> = TreeIndex::new(Identity, NaturalOrder);
        for v in [5, 3, 8, 1, 4, 7, 9, 2, 6, 0] {
            insert(&mut idx, &mut store, v);
            idx.check(&store);
        }
        assert_eq!(store.iter().copied().collect::<Vec<_>>(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn multi_bounds_span_the_run() {
        let mut store = OrderedStore::new();
        let mut idx: TreeIndex<Identity, NaturalOrder, true> = TreeIndex::new(Identity, NaturalOrder);
        let hs: Vec<_> = [2, 1, 2, 3, 2].into_iter().map(|v| insert(&mut idx, &mut store, v).0).collect();
        idx.check(&store);
        assert_eq!(idx.lower_bound(&store, &2), Some(hs[0]));
        assert_eq!(idx.upper_bound(&store, &2), Some(hs[3]));
        assert_eq!(idx.equal_handles(&store, &2), vec![hs[0], hs[2], hs[4]]);
        assert_eq!(idx.count(&store, &2), 3);
        assert_eq!(idx.lower_bound(&store, &4), None);
        assert_eq!(idx.upper_bound(&store, &0), Some(hs[1]));
        assert_eq!(idx.find(&store, &7), None);
    }

    #[test]
    fn bounds_between_keys() {
        let mut store = OrderedStore::new();
        let mut idx: TreeIndex<Identity, NaturalOrder, false> = TreeIndex::new(Identity, NaturalOrder);
        for v in (0..100).step_by(10) {
            insert(&mut idx, &mut store, v);
        }
        for probe in [-5, 0, 5, 10, 45, 90, 95] {
            let lb = idx.lower_bound(&store, &probe).map(|h| *store.get(h).unwrap());
            let ub = idx.upper_bound(&store, &probe).map(|h| *store.get(h).unwrap());
            let want_lb = (0..100).step_by(10).find(|&x| x >= probe);
            let want_ub = (0..100).step_by(10).find(|&x| x > probe);
            assert_eq!(lb, want_lb, "lower_bound({probe})");
            assert_eq!(ub, want_ub, "upper_bound({probe})");
        }
        let n = idx.nearest(&store, &45).map(|h| *store.get(h).unwrap());
        assert!(matches!(n, Some(40) | Some(50)));
    }

    #[test]
    fn detach_by_identity_among_duplicates() {
        let mut store = OrderedStore::new();
        let mut idx: TreeIndex<First, NaturalOrder, true> = TreeIndex::new(First, NaturalOrder);
        let a = insert(&mut idx, &mut store, (1, "x")).0;
        let b = insert(&mut idx, &mut store, (1, "x")).0;
        let c = insert(&mut idx, &mut store, (1, "x")).0;
        idx.detach(&store, b);
        store.unlink(b).unwrap();
        idx.check(&store);
        assert_eq!(idx.equal_handles(&store, &1), vec![a, c]);
    }

    #[test]
    fn custom_comparator_reverses_order() {
        let mut store = OrderedStore::new();
        let mut idx = TreeIndex::<_, _, false>::new(Identity, CompareFn(|a: &i32, b: &i32| a > b));
        for v in [3, 1, 2] {
            insert(&mut idx, &mut store, v);
        }
        idx.check(&store);
        assert_eq!(store.iter().copied().collect::<Vec<_>>(), vec![3, 2, 1]);
    }
}
