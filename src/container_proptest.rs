#![cfg(test)]

// Property tests for the four container shapes kept inside the crate so
// `check_invariants` and handle internals are exercised after every step.

use crate::error::Error;
use crate::ordered::{OrderedMap, OrderedMultiMap};
use crate::store::Handle;
use crate::unordered::{UnorderedMultiMap, UnorderedSet};
use proptest::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::hash::{BuildHasher, Hasher};

#[derive(Clone, Debug)]
enum Op {
    Insert(u8, u32),
    EraseKey(u8),
    // Index into the list of live handles, reduced modulo its length.
    EraseHandle(usize),
    Find(u8),
    Bounds(u8),
    Clear,
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    let op = prop_oneof![
        6 => (0u8..16, any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        2 => (0u8..16).prop_map(Op::EraseKey),
        2 => any::<usize>().prop_map(Op::EraseHandle),
        2 => (0u8..16).prop_map(Op::Find),
        1 => (0u8..16).prop_map(Op::Bounds),
        1 => Just(Op::Clear),
    ];
    proptest::collection::vec(op, 1..120)
}

// Property: multi tree map equals a model kept as a key-stable sorted list.
// Invariants exercised after every op:
// - red-black coloring, black height and (key, creation) order;
// - iteration equals the model, so equal keys stay in insertion order;
// - every live handle still dereferences to its payload, every erased one
//   reports `StaleHandle`;
// - lower/upper bounds match the model's partition points.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_ordered_multimap_matches_model(ops in arb_ops()) {
        let mut sut: OrderedMultiMap<u8, u32> = OrderedMultiMap::new();
        let mut model: Vec<(u8, u32, Handle)> = Vec::new();
        let mut stale: Vec<Handle> = Vec::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let (h, added) = sut.insert((k, v));
                    prop_assert!(added);
                    let at = model.partition_point(|e| e.0 <= k);
                    model.insert(at, (k, v, h));
                }
                Op::EraseKey(k) => {
                    let n = sut.erase_key(&k);
                    let before = model.len();
                    stale.extend(model.iter().filter(|e| e.0 == k).map(|e| e.2));
                    model.retain(|e| e.0 != k);
                    prop_assert_eq!(n, before - model.len());
                }
                Op::EraseHandle(i) => {
                    if !model.is_empty() {
                        let (_, _, h) = model.remove(i % model.len());
                        sut.erase(h).unwrap();
                        stale.push(h);
                    }
                }
                Op::Find(k) => {
                    let h = sut.find(&k);
                    match model.iter().find(|e| e.0 == k) {
                        Some(e) => prop_assert_eq!(h, e.2),
                        None => prop_assert!(h.is_end()),
                    }
                    prop_assert_eq!(sut.count(&k), model.iter().filter(|e| e.0 == k).count());
                }
                Op::Bounds(k) => {
                    let lo = model.partition_point(|e| e.0 < k);
                    let hi = model.partition_point(|e| e.0 <= k);
                    let at = |i: usize| model.get(i).map_or(sut.end(), |e| e.2);
                    prop_assert_eq!(sut.lower_bound(&k), at(lo));
                    prop_assert_eq!(sut.upper_bound(&k), at(hi));
                }
                Op::Clear => {
                    stale.extend(model.drain(..).map(|e| e.2));
                    sut.clear();
                }
            }

            sut.check_invariants();
            let got: Vec<(u8, u32)> = sut.iter().copied().collect();
            let want: Vec<(u8, u32)> = model.iter().map(|e| (e.0, e.1)).collect();
            prop_assert_eq!(got, want);
            for e in &model {
                prop_assert_eq!(sut.get(e.2), Ok(&(e.0, e.1)));
            }
            for &h in &stale {
                prop_assert_eq!(sut.get(h), Err(Error::StaleHandle));
            }
        }
    }
}

// Property: unique tree map behaves like BTreeMap, duplicate inserts leave
// the stored value untouched.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_ordered_map_matches_btreemap(ops in arb_ops()) {
        let mut sut: OrderedMap<u8, u32> = OrderedMap::new();
        let mut model: BTreeMap<u8, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let (h, added) = sut.insert((k, v));
                    prop_assert_eq!(added, !model.contains_key(&k));
                    let stored = *model.entry(k).or_insert(v);
                    prop_assert_eq!(sut.get(h), Ok(&(k, stored)));
                }
                Op::EraseKey(k) => {
                    let n = sut.erase_key(&k);
                    prop_assert_eq!(n, usize::from(model.remove(&k).is_some()));
                }
                Op::EraseHandle(i) => {
                    if !model.is_empty() {
                        let k = *model.keys().nth(i % model.len()).unwrap();
                        let h = sut.find(&k);
                        sut.erase(h).unwrap();
                        model.remove(&k);
                    }
                }
                Op::Find(k) => {
                    prop_assert_eq!(sut.get_value(&k), model.get(&k));
                }
                Op::Bounds(k) => {
                    let lb = sut.get(sut.lower_bound(&k)).ok().map(|e| e.0);
                    let ub = sut.get(sut.upper_bound(&k)).ok().map(|e| e.0);
                    prop_assert_eq!(lb, model.range(k..).next().map(|e| *e.0));
                    prop_assert_eq!(ub, model.range(k + 1..).next().map(|e| *e.0));
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
            }
            sut.check_invariants();
            let got: Vec<(u8, u32)> = sut.iter().copied().collect();
            let want: Vec<(u8, u32)> = model.iter().map(|(k, v)| (*k, *v)).collect();
            prop_assert_eq!(got, want);
        }
    }
}

// Property: hash multimap keeps surviving elements in insertion order and
// respects the load bound after every insert. Live handles keep
// dereferencing across rehashes; erased ones report `StaleHandle`.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_unordered_multimap_matches_model(ops in arb_ops()) {
        let mut sut: UnorderedMultiMap<u8, u32> = UnorderedMultiMap::new();
        let mut model: Vec<(u8, u32, Handle)> = Vec::new();
        let mut stale: Vec<Handle> = Vec::new();

        for op in ops {
            match op {
                Op::Insert(k, v) => {
                    let (h, added) = sut.insert((k, v));
                    prop_assert!(added);
                    model.push((k, v, h));
                    prop_assert!(sut.len() as f32 <= sut.bucket_count() as f32 * sut.max_load_factor());
                }
                Op::EraseKey(k) => {
                    let before = model.len();
                    stale.extend(model.iter().filter(|e| e.0 == k).map(|e| e.2));
                    model.retain(|e| e.0 != k);
                    prop_assert_eq!(sut.erase_key(&k), before - model.len());
                }
                Op::EraseHandle(i) => {
                    if !model.is_empty() {
                        let (_, _, h) = model.remove(i % model.len());
                        sut.erase(h).unwrap();
                        stale.push(h);
                    }
                }
                Op::Find(k) | Op::Bounds(k) => {
                    let h = sut.find(&k);
                    let present = model.iter().any(|e| e.0 == k);
                    prop_assert_eq!(!h.is_end(), present);
                    if present {
                        prop_assert_eq!(sut.get(h).map(|e| e.0), Ok(k));
                    }
                    prop_assert_eq!(sut.count(&k), model.iter().filter(|e| e.0 == k).count());
                }
                Op::Clear => {
                    stale.extend(model.drain(..).map(|e| e.2));
                    sut.clear();
                }
            }
            sut.check_invariants();
            let got: Vec<(u8, u32)> = sut.iter().copied().collect();
            let want: Vec<(u8, u32)> = model.iter().map(|e| (e.0, e.1)).collect();
            prop_assert_eq!(got, want);
            for e in &model {
                prop_assert_eq!(sut.get(e.2), Ok(&(e.0, e.1)));
            }
            for &h in &stale {
                prop_assert_eq!(sut.get(h), Err(Error::StaleHandle));
            }
        }
    }
}

// Constant hasher: every key collides, stressing equality resolution and
// erase-by-identity inside a single chain.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_unordered_set_with_collisions(ops in arb_ops()) {
        let mut sut: UnorderedSet<u8, ConstBuildHasher> = UnorderedSet::with_hasher(ConstBuildHasher);
        let mut model: HashSet<u8> = HashSet::new();

        for op in ops {
            match op {
                Op::Insert(k, _) => {
                    let (_, added) = sut.insert(k);
                    prop_assert_eq!(added, model.insert(k));
                }
                Op::EraseKey(k) | Op::Bounds(k) => {
                    prop_assert_eq!(sut.erase_key(&k), usize::from(model.remove(&k)));
                }
                Op::EraseHandle(i) => {
                    if !sut.is_empty() {
                        let h = sut.handles().nth(i % sut.len()).unwrap();
                        let k = sut.remove(h).unwrap();
                        prop_assert!(model.remove(&k));
                    }
                }
                Op::Find(k) => {
                    prop_assert_eq!(sut.contains(&k), model.contains(&k));
                }
                Op::Clear => {
                    sut.clear();
                    model.clear();
                }
            }
            sut.check_invariants();
            prop_assert_eq!(sut.bucket_len(0), sut.len());
            let got: HashSet<u8> = sut.iter().copied().collect();
            prop_assert_eq!(&got, &model);
        }
    }
}
