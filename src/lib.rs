//! linked-assoc: ordered (red-black tree) and unordered (hash bucket)
//! sets and maps, unique and multi-key, over an iterator-stable linked
//! element store.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: STL-style associative containers whose iterator handles stay
//!   valid across every mutation except erasing their own element.
//! - Layers:
//!   - OrderedStore<T>: doubly-linked sequence in a generational arena;
//!     owns elements and defines iteration order. `Handle` is a position
//!     in it.
//!   - Index strategies: `TreeIndex` (red-black tree of handles ordered by
//!     a comparator) and `HashIndex` (power-of-two chained buckets of
//!     handles). Both read keys through the store and never own elements.
//!   - Container<T, I>: one store plus one index; the eight public shapes
//!     are type aliases over it.
//!
//! Constraints
//! - Single-threaded: no internal locking; handles are plain `Copy` data.
//! - Index size equals store size after every public call; an element and
//!   its index entry are created and destroyed together.
//! - Tree containers: store order is key order, so iteration is sorted.
//!   Multi-key trees keep equal keys in insertion order.
//! - Hash containers: store order is insertion order; after every insert
//!   `len <= bucket_count * max_load_factor`. Erase never shrinks buckets.
//! - Erasure is by handle identity; equal-valued neighbours are untouched.
//!
//! Handle semantics
//! - A handle records its store's identity, its arena key and a
//!   per-store creation sequence number. The sequence number breaks ties
//!   between equivalent keys in multi-key trees and never takes part in
//!   handle equality.
//! - Dereferencing the end position, or a handle from another container,
//!   or a handle whose element was erased, is reported as an `Error`.
//!   Generational arena keys guarantee a stale handle never aliases an
//!   element inserted later into the same slot.
//! - `swap` moves stores wholesale: handles follow their elements into
//!   the other container.
//!
//! Reentrancy policy
//! - Comparators, hashers and equality predicates are user code called
//!   while an index is mid-operation. They must not call back into the
//!   same container. A debug-only guard on each public entry point panics
//!   on nested entry; release builds carry no guard state.
//!
//! Notes and non-goals
//! - No persistence and no concurrent access.
//! - Lookups take the container's key type; there is no borrowed-key
//!   (`Borrow<Q>`) lookup because comparators are defined over the key
//!   type itself.
//! - Keys are immutable after insertion; maps expose only mapped values
//!   mutably.

mod container;
mod container_proptest;
pub mod error;
pub mod hash_index;
pub mod index;
pub mod ordered;
pub mod policy;
mod rb_tree;
mod reentrancy;
pub mod store;
pub mod tree_index;
pub mod unordered;

// Public surface
pub use container::Container;
pub use error::{Error, ErrorKind};
pub use hash_index::HashConfig;
pub use ordered::{OrderedMap, OrderedMultiMap, OrderedMultiSet, OrderedSet};
pub use policy::{Compare, CompareFn, EqFn, First, Identity, KeyEq, KeyFetcher, NaturalOrder, StdEq};
pub use store::{Handle, StoreId};
pub use unordered::{UnorderedMap, UnorderedMultiMap, UnorderedMultiSet, UnorderedSet};
