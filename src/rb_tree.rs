//! Red-black tree structure over `Copy` payloads.
//!
//! This layer knows nothing about keys. Callers descend with their own
//! comparator via [`RbTree::root`] and [`RbTree::child`], then hand the
//! chosen leaf position to [`RbTree::attach`]; removal takes a node key.
//! Both restore the red-black invariants before returning:
//! - the root is black (empty children count as black leaves),
//! - no red node has a red child,
//! - every root-to-leaf path crosses the same number of black nodes.
//!
//! Nodes live in a `slotmap` arena. Each node owns its child slots and
//! keeps a plain back-key to its parent; grandparent, uncle and sibling
//! are looked up through the parent chain when needed.

use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub(crate) struct TreeKey;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Color {
    Red,
    Black,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    #[inline]
    pub(crate) fn flip(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Debug)]
struct TreeNode<P> {
    color: Color,
    parent: Option<TreeKey>,
    left: Option<TreeKey>,
    right: Option<TreeKey>,
    item: P,
}

#[derive(Debug)]
pub(crate) struct RbTree<P> {
    nodes: SlotMap<TreeKey, TreeNode<P>>,
    root: Option<TreeKey>,
}

impl<P: Copy> RbTree<P> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    pub(crate) fn root(&self) -> Option<TreeKey> {
        self.root
    }

    #[inline]
    pub(crate) fn item(&self, k: TreeKey) -> P {
        self.nodes[k].item
    }

    #[inline]
    pub(crate) fn child(&self, k: TreeKey, side: Side) -> Option<TreeKey> {
        match side {
            Side::Left => self.nodes[k].left,
            Side::Right => self.nodes[k].right,
        }
    }

    #[inline]
    fn child_slot(&mut self, k: TreeKey, side: Side) -> &mut Option<TreeKey> {
        match side {
            Side::Left => &mut self.nodes[k].left,
            Side::Right => &mut self.nodes[k].right,
        }
    }

    #[inline]
    fn is_red(&self, k: Option<TreeKey>) -> bool {
        k.is_some_and(|k| self.nodes[k].color == Color::Red)
    }

    #[inline]
    fn set_color(&mut self, k: TreeKey, color: Color) {
        self.nodes[k].color = color;
    }

    /// Side of `k` under its parent. `k` must not be the root.
    fn side_of(&self, k: TreeKey) -> Side {
        let p = self.nodes[k].parent.expect("side_of called on the root");
        if self.nodes[p].left == Some(k) {
            Side::Left
        } else {
            Side::Right
        }
    }

    fn extreme(&self, mut k: TreeKey, side: Side) -> TreeKey {
        while let Some(c) = self.child(k, side) {
            k = c;
        }
        k
    }

    pub(crate) fn first(&self) -> Option<TreeKey> {
        self.root.map(|r| self.extreme(r, Side::Left))
    }

    pub(crate) fn last(&self) -> Option<TreeKey> {
        self.root.map(|r| self.extreme(r, Side::Right))
    }

    /// In-order neighbour of `k` in direction `dir`.
    pub(crate) fn step(&self, k: TreeKey, dir: Side) -> Option<TreeKey> {
        if let Some(c) = self.child(k, dir) {
            return Some(self.extreme(c, dir.flip()));
        }
        let mut cur = k;
        while let Some(p) = self.nodes[cur].parent {
            if self.child(p, dir.flip()) == Some(cur) {
                return Some(p);
            }
            cur = p;
        }
        None
    }

    pub(crate) fn next(&self, k: TreeKey) -> Option<TreeKey> {
        self.step(k, Side::Right)
    }

    pub(crate) fn prev(&self, k: TreeKey) -> Option<TreeKey> {
        self.step(k, Side::Left)
    }

    fn replace_child(&mut self, parent: Option<TreeKey>, old: TreeKey, new: Option<TreeKey>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                if self.nodes[p].left == Some(old) {
                    self.nodes[p].left = new;
                } else {
                    debug_assert_eq!(self.nodes[p].right, Some(old));
                    self.nodes[p].right = new;
                }
            }
        }
    }

    /// Rotate `x` down toward `dir`; its child on the other side takes its place.
    fn rotate(&mut self, x: TreeKey, dir: Side) {
        let up = dir.flip();
        let y = self
            .child(x, up)
            .expect("rotation needs a child on the rising side");
        let inner = self.child(y, dir);
        *self.child_slot(x, up) = inner;
        if let Some(b) = inner {
            self.nodes[b].parent = Some(x);
        }
        let xp = self.nodes[x].parent;
        self.nodes[y].parent = xp;
        self.replace_child(xp, x, Some(y));
        *self.child_slot(y, dir) = Some(x);
        self.nodes[x].parent = Some(y);
    }

    /// Hang a new red node at the empty `side` slot of `parent` (or at the
    /// root of an empty tree) and rebalance.
    pub(crate) fn attach(&mut self, parent: Option<TreeKey>, side: Side, item: P) -> TreeKey {
        let k = self.nodes.insert(TreeNode {
            color: Color::Red,
            parent,
            left: None,
            right: None,
            item,
        });
        match parent {
            None => {
                debug_assert!(self.root.is_none(), "attach at root of a non-empty tree");
                self.root = Some(k);
            }
            Some(p) => {
                let slot = self.child_slot(p, side);
                debug_assert!(slot.is_none(), "attach over an occupied child slot");
                *slot = Some(k);
            }
        }
        self.insert_fixup(k);
        k
    }

    fn insert_fixup(&mut self, mut z: TreeKey) {
        while let Some(mut p) = self.nodes[z].parent {
            if self.nodes[p].color == Color::Black {
                break;
            }
            let g = self.nodes[p].parent.expect("a red node is never the root");
            let p_side = self.side_of(p);
            let uncle = self.child(g, p_side.flip());
            if let Some(u) = uncle.filter(|&u| self.nodes[u].color == Color::Red) {
                self.set_color(p, Color::Black);
                self.set_color(u, Color::Black);
                self.set_color(g, Color::Red);
                z = g;
                continue;
            }
            if self.side_of(z) != p_side {
                // Inner grandchild: rotate it to the outside first.
                self.rotate(p, p_side);
                core::mem::swap(&mut z, &mut p);
            }
            self.set_color(p, Color::Black);
            self.set_color(g, Color::Red);
            self.rotate(g, p_side.flip());
            break;
        }
        if let Some(r) = self.root {
            self.set_color(r, Color::Black);
        }
    }

    /// Remove node `z` and return its payload.
    ///
    /// A node with two children trades payloads with its in-order successor
    /// and the successor's node is unlinked instead, so keys of other nodes
    /// may now carry different payloads. Callers must not cache node keys
    /// across removals.
    pub(crate) fn remove(&mut self, z: TreeKey) -> P {
        let item = self.nodes[z].item;
        let target = match (self.nodes[z].left, self.nodes[z].right) {
            (Some(_), Some(r)) => {
                let s = self.extreme(r, Side::Left);
                self.nodes[z].item = self.nodes[s].item;
                s
            }
            _ => z,
        };
        self.splice_out(target);
        item
    }

    /// Unlink a node with at most one child.
    fn splice_out(&mut self, n: TreeKey) {
        let node = &self.nodes[n];
        debug_assert!(node.left.is_none() || node.right.is_none());
        let child = node.left.or(node.right);
        let parent = node.parent;
        let color = node.color;
        if let Some(c) = child {
            self.nodes[c].parent = parent;
        }
        self.replace_child(parent, n, child);
        self.nodes.remove(n);
        if color == Color::Black {
            match child {
                Some(c) if self.nodes[c].color == Color::Red => self.set_color(c, Color::Black),
                _ => self.remove_fixup(child, parent),
            }
        }
    }

    /// `x` (possibly an empty leaf under `parent`) carries an extra black.
    fn remove_fixup(&mut self, mut x: Option<TreeKey>, mut parent: Option<TreeKey>) {
        while x != self.root && !self.is_red(x) {
            let Some(p) = parent else { break };
            // An empty `x` is unambiguous: its sibling subtree holds at
            // least one black node, so the sibling slot is occupied.
            let side = if self.nodes[p].left == x {
                Side::Left
            } else {
                Side::Right
            };
            let far = side.flip();
            let mut w = self.child(p, far).expect("doubly-black node has a sibling");
            if self.nodes[w].color == Color::Red {
                self.set_color(w, Color::Black);
                self.set_color(p, Color::Red);
                self.rotate(p, side);
                w = self.child(p, far).expect("sibling survives rotation");
            }
            let near_red = self.is_red(self.child(w, side));
            let far_red = self.is_red(self.child(w, far));
            if !near_red && !far_red {
                self.set_color(w, Color::Red);
                x = Some(p);
                parent = self.nodes[p].parent;
                continue;
            }
            if !far_red {
                let n = self.child(w, side).expect("near nephew is red");
                self.set_color(n, Color::Black);
                self.set_color(w, Color::Red);
                self.rotate(w, far);
                w = self.child(p, far).expect("sibling survives rotation");
            }
            let pc = self.nodes[p].color;
            self.set_color(w, pc);
            self.set_color(p, Color::Black);
            if let Some(f) = self.child(w, far) {
                self.set_color(f, Color::Black);
            }
            self.rotate(p, side);
            x = self.root;
            break;
        }
        if let Some(x) = x {
            self.set_color(x, Color::Black);
        }
    }

    /// Payloads in order.
    pub(crate) fn items(&self) -> Vec<P> {
        let mut out = Vec::with_capacity(self.len());
        let mut cur = self.first();
        while let Some(k) = cur {
            out.push(self.nodes[k].item);
            cur = self.next(k);
        }
        out
    }

    /// Check structure, coloring and ordering. `less` is the strict order
    /// in-order neighbours must not violate. Returns the black height.
    pub(crate) fn validate(&self, less: impl Fn(&P, &P) -> bool) -> Result<usize, &'static str> {
        if let Some(r) = self.root {
            if self.nodes[r].parent.is_some() {
                return Err("root has a parent");
            }
            if self.nodes[r].color == Color::Red {
                return Err("root is red");
            }
        }
        let mut seen = 0;
        let height = self.check_subtree(self.root, &mut seen)?;
        if seen != self.nodes.len() {
            return Err("arena holds unreachable nodes");
        }
        let items = self.items();
        if items.len() != seen {
            return Err("in-order walk disagrees with node count");
        }
        if items.windows(2).any(|w| less(&w[1], &w[0])) {
            return Err("in-order walk is out of order");
        }
        Ok(height)
    }

    fn check_subtree(&self, k: Option<TreeKey>, seen: &mut usize) -> Result<usize, &'static str> {
        let Some(k) = k else { return Ok(1) };
        *seen += 1;
        let n = &self.nodes[k];
        for c in [n.left, n.right].into_iter().flatten() {
            if self.nodes[c].parent != Some(k) {
                return Err("child does not point back to its parent");
            }
            if n.color == Color::Red && self.nodes[c].color == Color::Red {
                return Err("red node has a red child");
            }
        }
        let lh = self.check_subtree(n.left, seen)?;
        let rh = self.check_subtree(n.right, seen)?;
        if lh != rh {
            return Err("black height differs between subtrees");
        }
        Ok(lh + usize::from(n.color == Color::Black))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // Multi-key descent: equal values go right, so the newest lands last in its run.
    fn insert(t: &mut RbTree<i32>, v: i32) -> TreeKey {
        let mut parent = None;
        let mut side = Side::Left;
        let mut cur = t.root();
        while let Some(k) = cur {
            parent = Some(k);
            side = if v < t.item(k) { Side::Left } else { Side::Right };
            cur = t.child(k, side);
        }
        t.attach(parent, side, v)
    }

    fn find(t: &RbTree<i32>, v: i32) -> Option<TreeKey> {
        let mut cur = t.root();
        while let Some(k) = cur {
            let x = t.item(k);
            if v == x {
                return Some(k);
            }
            cur = t.child(k, if v < x { Side::Left } else { Side::Right });
        }
        None
    }

    fn check(t: &RbTree<i32>) -> usize {
        t.validate(|a, b| a < b).unwrap()
    }

    #[test]
    fn ascending_inserts_stay_balanced() {
        let mut t = RbTree::new();
        for v in 0..1024 {
            insert(&mut t, v);
            check(&t);
        }
        assert_eq!(t.items(), (0..1024).collect::<Vec<_>>());
        // 1024 nodes: black height is bounded by log2(n + 1) + 1.
        assert!(check(&t) <= 12);
    }

    #[test]
    fn descending_inserts_stay_balanced() {
        let mut t = RbTree::new();
        for v in (0..500).rev() {
            insert(&mut t, v);
            check(&t);
        }
        assert_eq!(t.first().map(|k| t.item(k)), Some(0));
        assert_eq!(t.last().map(|k| t.item(k)), Some(499));
    }

    #[test]
    fn remove_every_other_then_rest() {
        let mut t = RbTree::new();
        for v in 0..300 {
            insert(&mut t, v);
        }
        for v in (0..300).step_by(2) {
            let k = find(&t, v).unwrap();
            assert_eq!(t.remove(k), v);
            check(&t);
        }
        assert_eq!(t.items(), (1..300).step_by(2).collect::<Vec<_>>());
        for v in (1..300).step_by(2).rev() {
            let k = find(&t, v).unwrap();
            assert_eq!(t.remove(k), v);
            check(&t);
        }
        assert_eq!(t.len(), 0);
        assert!(t.root().is_none());
    }

    #[test]
    fn removing_root_with_two_children_moves_successor_up() {
        let mut t = RbTree::new();
        for v in [5, 3, 8, 1, 4, 7, 9] {
            insert(&mut t, v);
        }
        let root = t.root().unwrap();
        let v = t.item(root);
        assert_eq!(t.remove(root), v);
        check(&t);
        assert!(!t.items().contains(&v));
        assert_eq!(t.len(), 6);
    }

    #[test]
    fn step_walks_both_directions() {
        let mut t = RbTree::new();
        for v in [50, 20, 80, 10, 30, 70, 90, 25, 35] {
            insert(&mut t, v);
        }
        let mut back = Vec::new();
        let mut cur = t.last();
        while let Some(k) = cur {
            back.push(t.item(k));
            cur = t.prev(k);
        }
        assert_eq!(back, vec![90, 80, 70, 50, 35, 30, 25, 20, 10]);
    }

    #[test]
    fn duplicates_keep_insertion_order_within_run() {
        // Payload = key * 100 + arrival, ordered by key only.
        let mut t: RbTree<(i32, i32)> = RbTree::new();
        for (i, key) in [2, 1, 2, 3, 2, 1].into_iter().enumerate() {
            let mut parent = None;
            let mut side = Side::Left;
            let mut cur = t.root();
            while let Some(k) = cur {
                parent = Some(k);
                side = if key < t.item(k).0 { Side::Left } else { Side::Right };
                cur = t.child(k, side);
            }
            t.attach(parent, side, (key, i as i32));
        }
        t.validate(|a, b| a.0 < b.0).unwrap();
        assert_eq!(
            t.items(),
            vec![(1, 1), (1, 5), (2, 0), (2, 2), (2, 4), (3, 3)]
        );
    }

    #[test]
    fn validate_flags_broken_coloring() {
        let mut t = RbTree::new();
        for v in 0..8 {
            insert(&mut t, v);
        }
        let r = t.root().unwrap();
        t.set_color(r, Color::Red);
        assert_eq!(t.validate(|a, b| a < b), Err("root is red"));
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
        // Random inserts and removals keep all invariants and match a sorted model.
        #[test]
        fn prop_matches_sorted_model(ops in proptest::collection::vec((any::<bool>(), 0i32..40), 1..200)) {
            let mut t = RbTree::new();
            let mut model: Vec<i32> = Vec::new();
            for (ins, v) in ops {
                if ins {
                    insert(&mut t, v);
                    let at = model.partition_point(|&x| x <= v);
                    model.insert(at, v);
                } else if let Some(k) = find(&t, v) {
                    prop_assert_eq!(t.remove(k), v);
                    let at = model.iter().position(|&x| x == v).unwrap();
                    model.remove(at);
                } else {
                    prop_assert!(!model.contains(&v));
                }
                prop_assert!(t.validate(|a, b| a < b).is_ok());
                prop_assert_eq!(t.items(), model.clone());
            }
        }
    }
}
