//! Tree-backed containers: iteration follows key order.

use crate::container::Container;
use crate::index::Index;
use crate::policy::{First, Identity, NaturalOrder};
use crate::tree_index::TreeIndex;

/// Set of unique keys in comparator order.
pub type OrderedSet<K, C = NaturalOrder> = Container<K, TreeIndex<Identity, C, false>>;
/// Set of keys allowing equivalents; equal keys keep insertion order.
pub type OrderedMultiSet<K, C = NaturalOrder> = Container<K, TreeIndex<Identity, C, true>>;
/// Map with unique keys in comparator order.
pub type OrderedMap<K, V, C = NaturalOrder> = Container<(K, V), TreeIndex<First, C, false>>;
/// Map allowing equivalent keys; equal keys keep insertion order.
pub type OrderedMultiMap<K, V, C = NaturalOrder> = Container<(K, V), TreeIndex<First, C, true>>;

impl<F: Default, C: Default, const M: bool> Default for TreeIndex<F, C, M> {
    fn default() -> Self {
        TreeIndex::new(F::default(), C::default())
    }
}

impl<T, F: Default, const M: bool> Container<T, TreeIndex<F, NaturalOrder, M>>
where
    TreeIndex<F, NaturalOrder, M>: Index<T>,
{
    /// Empty container ordered by `Ord`.
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }
}

impl<T, F: Default, C, const M: bool> Container<T, TreeIndex<F, C, M>>
where
    TreeIndex<F, C, M>: Index<T>,
{
    /// Empty container ordered by `cmp`.
    pub fn with_comparator(cmp: C) -> Self {
        Container::with_index(TreeIndex::new(F::default(), cmp))
    }

    pub fn comparator(&self) -> &C {
        self.index().comparator()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{Compare, CompareFn};

    #[test]
    fn scenario_unique_set_sorts() {
        let mut s: OrderedSet<i32> = OrderedSet::new();
        for k in [5, 3, 8, 1, 4, 7, 9, 2, 6, 0] {
            s.insert(k);
            s.check_invariants();
        }
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn multimap_equal_range_keeps_insertion_order() {
        let mut m: OrderedMultiMap<i32, &str> = OrderedMultiMap::new();
        for kv in [(1, "a"), (1, "b"), (2, "c"), (1, "d")] {
            m.insert(kv);
        }
        let (lo, hi) = m.equal_range(&1);
        let vals: Vec<_> = m.range(lo, hi).unwrap().map(|(_, v)| *v).collect();
        assert_eq!(vals, vec!["a", "b", "d"]);
        m.check_invariants();
    }

    #[test]
    fn reverse_comparator() {
        let mut s = OrderedSet::with_comparator(CompareFn(|a: &u8, b: &u8| a > b));
        s.extend([1u8, 9, 5]);
        assert_eq!(s.iter().copied().collect::<Vec<_>>(), vec![9, 5, 1]);
        assert!(s.comparator().less(&9, &1));
    }

    #[test]
    fn collect_into_set() {
        let s: OrderedSet<i32> = [3, 1, 3, 2].into_iter().collect();
        assert_eq!(s.len(), 3);
        let m: OrderedMultiSet<i32> = [3, 1, 3, 2].into_iter().collect();
        assert_eq!(m.len(), 4);
        assert_eq!(m.count(&3), 2);
    }
}
