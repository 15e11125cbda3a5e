// Handle stability suite.
//
// Handles are positions into a container's linked store. The invariants
// exercised:
// - Stability: a handle stays valid until its own element is erased,
//   whatever else is inserted or removed.
// - Identity: a handle belongs to one store; `swap` moves it along with
//   its element.
// - Staleness: an erased handle is reported, never aliased to a later
//   element in the same arena slot.
// - End sentinel: `end()` is fixed for a container and walks back to the
//   last element.
use linked_assoc::{Error, ErrorKind, OrderedMultiSet, OrderedSet};

// Test: swap exchanges contents of two tree sets.
// Assumes: handles carry their store identity, and stores move wholesale.
// Verifies: every pre-swap handle resolves through the other container.
#[test]
fn swap_keeps_handles_valid() {
    let mut a: OrderedSet<i32> = [1, 2, 3].into_iter().collect();
    let mut b: OrderedSet<i32> = [7].into_iter().collect();
    let ha: Vec<_> = a.handles().collect();
    let hb = b.begin();
    a.swap(&mut b);
    assert_eq!(a.len(), 1);
    assert_eq!(b.len(), 3);
    for (h, v) in ha.iter().zip(1..) {
        assert_eq!(b.get(*h), Ok(&v));
    }
    assert_eq!(a.get(hb), Ok(&7));
    b.check_invariants();
    a.check_invariants();
}

// Test: heavy insert/erase traffic around one held handle.
// Assumes: erase_key only unlinks elements with an equivalent key.
// Verifies: the held handle still dereferences and leads its equal-key run.
#[test]
fn handles_survive_unrelated_mutation() {
    let mut s = OrderedMultiSet::new();
    let h = s.insert(51).0;
    for k in (0..100).rev() {
        s.insert(k);
    }
    for k in (0..100).step_by(2) {
        s.erase_key(&k);
    }
    assert_eq!(s.get(h), Ok(&51));
    assert_eq!(s.count(&51), 2);
    assert_eq!(s.lower_bound(&51), h);
    assert_eq!(s.handles().next().map(|f| s.get(f).copied()), Some(Ok(1)));
}

// Test: erase then insert, likely reusing the arena slot.
// Assumes: arena slots are versioned.
// Verifies: the old handle reports StaleHandle while the new one resolves.
#[test]
fn stale_handle_never_aliases_reused_slot() {
    let mut s = OrderedSet::new();
    let h = s.insert(1).0;
    s.erase(h).unwrap();
    let h2 = s.insert(2).0;
    assert_ne!(h, h2);
    assert_eq!(s.get(h), Err(Error::StaleHandle));
    assert_eq!(s.get(h).unwrap_err().kind(), ErrorKind::OutOfRange);
    assert_eq!(s.get(h2), Ok(&2));
}

// Test: end() across inserts and a reverse walk via prev.
// Assumes: end is the store's sentinel, not an element.
// Verifies: end() is unchanged by inserts; prev walks back to begin, then BeforeBegin.
#[test]
fn end_is_stable_and_walkable_backwards() {
    let mut s: OrderedSet<i32> = [3, 1, 2].into_iter().collect();
    let end = s.end();
    s.insert(0);
    assert_eq!(s.end(), end);
    let mut back = Vec::new();
    let mut h = end;
    while let Ok(p) = s.prev(h) {
        back.push(*s.get(p).unwrap());
        h = p;
    }
    assert_eq!(back, vec![3, 2, 1, 0]);
    assert_eq!(s.prev(h), Err(Error::BeforeBegin));
}
