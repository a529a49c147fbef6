// Copyright 2016 Amanieu d'Antras
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Red-black tree ordered by integer sort keys.

use crate::adapter::{Adapter, NodeAdapter};
use crate::chain::Chain;
use crate::error::{Error, Result};
use crate::key::RBKey;
use crate::link::{Color, NodePtr};
use crate::search::{FnSearch, RBSearch, SearchStep};
use core::cmp::Ordering;
use core::fmt;
use core::iter::FromIterator;
use log::{debug, trace, warn};

// Where a value belongs in the tree.
pub(crate) enum Slot {
    // An equal value is already stored.
    Occupied,
    // The value would become a child of `parent` (the root if null).
    Vacant { parent: NodePtr, left: bool },
}

#[inline]
unsafe fn set_child(parent: NodePtr, left: bool, child: NodePtr, root: &mut NodePtr) {
    if parent.is_null() {
        *root = child;
    } else if left {
        parent.set_left(child);
    } else {
        parent.set_right(child);
    }
}

// =============================================================================
// RBTree
// =============================================================================

/// A red-black tree ordered by the integer sort key of its values.
///
/// The adapter decides how values are held: `NodeAdapter<T>` moves each
/// value into a node allocated by the tree, while `LinkedAdapter<K>` (see
/// `LinkedRBTree`) stores `Rc<K>` values which carry their own link and
/// stay threaded in key order.
///
/// Values with equal sort keys may coexist as long as they are not equal to
/// each other. Inserting a value equal to one already present does nothing.
///
/// The tree is not synchronized; it cannot be shared between threads.
pub struct RBTree<A: Adapter> {
    root: NodePtr,
    min: NodePtr,
    max: NodePtr,
    len: usize,
    adapter: A,
}

impl<A: Adapter> RBTree<A> {
    /// Creates an empty `RBTree`.
    #[inline]
    pub fn new(adapter: A) -> RBTree<A> {
        RBTree {
            root: NodePtr::null(),
            min: NodePtr::null(),
            max: NodePtr::null(),
            len: 0,
            adapter,
        }
    }

    /// Returns the number of values in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the tree is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.root.is_null()
    }

    #[inline]
    pub(crate) fn root_ptr(&self) -> NodePtr {
        self.root
    }

    #[inline]
    pub(crate) unsafe fn value_of(&self, node: NodePtr) -> &A::Value {
        &*self.adapter.get_value(node.0)
    }

    #[inline]
    pub(crate) fn value_opt(&self, node: NodePtr) -> Option<&A::Value> {
        if node.is_null() {
            None
        } else {
            Some(unsafe { self.value_of(node) })
        }
    }

    /// Returns the value with the smallest key.
    #[inline]
    pub fn min(&self) -> Option<&A::Value> {
        self.value_opt(self.min)
    }

    /// Returns the value with the largest key.
    #[inline]
    pub fn max(&self) -> Option<&A::Value> {
        self.value_opt(self.max)
    }

    /// Returns the value at the root of the tree.
    ///
    /// This is mostly useful for debugging and for seeding searches.
    #[inline]
    pub fn root(&self) -> Option<&A::Value> {
        self.value_opt(self.root)
    }

    // -------------------------------------------------------------------------
    // Lookup
    // -------------------------------------------------------------------------

    pub(crate) fn find_node(&self, key: i64, value: &A::Value) -> NodePtr {
        let mut x = self.root;
        unsafe {
            while !x.is_null() {
                match key.cmp(&x.key()) {
                    Ordering::Less => x = x.left(),
                    Ordering::Greater => x = x.right(),
                    Ordering::Equal => return self.find_collision(x, key, value),
                }
            }
        }
        NodePtr::null()
    }

    // Every node holding `key` lies in the subtree of the first such node met
    // on the way down from the root, so the search can stay inside it.
    unsafe fn find_collision(&self, x: NodePtr, key: i64, value: &A::Value) -> NodePtr {
        if x.is_null() {
            return NodePtr::null();
        }
        match x.key().cmp(&key) {
            Ordering::Less => self.find_collision(x.right(), key, value),
            Ordering::Greater => self.find_collision(x.left(), key, value),
            Ordering::Equal => {
                if self.value_of(x) == value {
                    return x;
                }
                let found = self.find_collision(x.left(), key, value);
                if found.is_null() {
                    self.find_collision(x.right(), key, value)
                } else {
                    found
                }
            }
        }
    }

    fn nearest_node(&self, key: i64) -> NodePtr {
        let mut x = self.root;
        let mut last = NodePtr::null();
        unsafe {
            while !x.is_null() {
                last = x;
                match key.cmp(&x.key()) {
                    Ordering::Less => x = x.left(),
                    Ordering::Greater => x = x.right(),
                    Ordering::Equal => return x,
                }
            }
        }
        last
    }

    /// Returns a value with the given sort key.
    ///
    /// If several values share the key then an arbitrary one is returned.
    pub fn find(&self, key: i64) -> Option<&A::Value> {
        let x = self.nearest_node(key);
        if !x.is_null() && unsafe { x.key() } == key {
            self.value_opt(x)
        } else {
            None
        }
    }

    /// Returns the stored value equal to `value`, telling apart values which
    /// share a sort key.
    #[inline]
    pub fn get(&self, value: &A::Value) -> Option<&A::Value> {
        self.value_opt(self.find_node(value.value(), value))
    }

    /// Returns `true` if a value equal to `value` is stored in the tree.
    #[inline]
    pub fn contains(&self, value: &A::Value) -> bool {
        !self.find_node(value.value(), value).is_null()
    }

    /// Returns the last value visited by a binary search for `key`: either a
    /// value with that key or the value next to which `key` would be
    /// inserted.
    ///
    /// Returns `None` only if the tree is empty.
    #[inline]
    pub fn get_nearest(&self, key: i64) -> Option<&A::Value> {
        self.value_opt(self.nearest_node(key))
    }

    /// Returns the value following `value` in key order.
    ///
    /// Returns `None` if `value` is the maximum or is not in the tree.
    pub fn next(&self, value: &A::Value) -> Option<&A::Value> {
        let node = self.find_node(value.value(), value);
        if node.is_null() {
            None
        } else {
            self.value_opt(NodePtr(unsafe { A::Chain::next(node.0) }))
        }
    }

    /// Returns the value preceding `value` in key order.
    ///
    /// Returns `None` if `value` is the minimum or is not in the tree.
    pub fn prev(&self, value: &A::Value) -> Option<&A::Value> {
        let node = self.find_node(value.value(), value);
        if node.is_null() {
            None
        } else {
            self.value_opt(NodePtr(unsafe { A::Chain::prev(node.0) }))
        }
    }

    /// Walks down the tree from the root, letting `descriptor` decide at
    /// each node whether to stop or which child to continue with.
    ///
    /// The walk takes at most as many steps as the tree is high. Moving
    /// towards a missing child ends the search with `None`.
    ///
    /// On a `LinkedRBTree` prefer navigating from a stored value through
    /// `LinkedRBKey` (`next`, `prev`, `left`, `right`, `parent`), which
    /// costs O(1) per step and needs no descriptor.
    pub fn search<S>(&self, descriptor: &mut S) -> Option<&A::Value>
    where
        S: RBSearch<A::Value> + ?Sized,
    {
        let mut x = self.root;
        unsafe {
            while !x.is_null() {
                let left = self.value_opt(x.left());
                let right = self.value_opt(x.right());
                match descriptor.step(self.value_of(x), left, right) {
                    SearchStep::Current => return Some(self.value_of(x)),
                    SearchStep::Left => return left,
                    SearchStep::Right => return right,
                    SearchStep::GoLeft => x = x.left(),
                    SearchStep::GoRight => x = x.right(),
                    SearchStep::Abort => return None,
                }
            }
        }
        None
    }

    /// Same as `search`, with a closure as the descriptor.
    #[inline]
    pub fn search_by<F>(&self, step: F) -> Option<&A::Value>
    where
        F: FnMut(&A::Value, Option<&A::Value>, Option<&A::Value>) -> SearchStep,
    {
        self.search(&mut FnSearch(step))
    }

    // -------------------------------------------------------------------------
    // Insertion
    // -------------------------------------------------------------------------

    /// Finds where a value with the given key belongs. A key equal to an
    /// existing one sorts after it, once the whole run of equal keys has
    /// been checked for an equal value.
    pub(crate) fn locate(&self, key: i64, value: &A::Value) -> Slot {
        let mut x = self.root;
        if x.is_null() {
            return Slot::Vacant {
                parent: NodePtr::null(),
                left: false,
            };
        }
        let mut checked_collisions = false;
        unsafe {
            loop {
                let go_left = match key.cmp(&x.key()) {
                    Ordering::Less => true,
                    Ordering::Greater => false,
                    Ordering::Equal => {
                        if !checked_collisions {
                            let existing = self.find_collision(x, key, value);
                            if !existing.is_null() {
                                return Slot::Occupied;
                            }
                            debug!("key collision on {}, storing after existing values", key);
                            checked_collisions = true;
                        }
                        false
                    }
                };
                let child = if go_left { x.left() } else { x.right() };
                if child.is_null() {
                    return Slot::Vacant {
                        parent: x,
                        left: go_left,
                    };
                }
                x = child;
            }
        }
    }

    // Hangs `node` (with its key already cached) at a vacant slot and
    // restores the red-black properties.
    pub(crate) unsafe fn attach(&mut self, node: NodePtr, parent: NodePtr, left: bool) {
        node.reset(parent);
        if parent.is_null() {
            self.root = node;
            self.min = node;
            self.max = node;
        } else if left {
            parent.set_left(node);
            if parent == self.min {
                self.min = node;
            }
        } else {
            parent.set_right(node);
            if parent == self.max {
                self.max = node;
            }
        }
        self.len += 1;
        A::Chain::inserted(node.0);
        self.balance_insert(node);
    }

    /// Inserts an owned pointer. Returns `Ok(false)` if an equal value is
    /// already present, and hands the pointer back if the adapter refuses it.
    pub(crate) fn insert_pointer(
        &mut self,
        ptr: A::Pointer,
    ) -> core::result::Result<bool, A::Pointer> {
        let (key, slot) = {
            let value = self.adapter.value(&ptr);
            let key = value.value();
            (key, self.locate(key, value))
        };
        let (parent, left) = match slot {
            Slot::Occupied => {
                trace!("value with key {} is already present", key);
                return Ok(false);
            }
            Slot::Vacant { parent, left } => (parent, left),
        };
        let link = self.adapter.acquire(ptr)?;
        unsafe {
            let node = NodePtr(link);
            node.set_key(key);
            self.attach(node, parent, left);
        }
        Ok(true)
    }

    unsafe fn balance_insert(&mut self, node: NodePtr) {
        let mut x = node;
        loop {
            let parent = x.parent();
            if parent.is_null() {
                x.set_color(Color::Black);
                return;
            }
            if parent.is_black() {
                return;
            }

            // A red parent is never the root, so the grandparent exists.
            let grandparent = x.grandparent();
            let uncle = x.uncle();
            if uncle.is_red() {
                parent.set_color(Color::Black);
                uncle.set_color(Color::Black);
                grandparent.set_color(Color::Red);
                x = grandparent;
                continue;
            }

            let top;
            if parent.is_left() {
                if x.is_right() {
                    parent.rotate_left(&mut self.root);
                    top = x;
                } else {
                    top = parent;
                }
                grandparent.rotate_right(&mut self.root);
            } else {
                if x.is_left() {
                    parent.rotate_right(&mut self.root);
                    top = x;
                } else {
                    top = parent;
                }
                grandparent.rotate_left(&mut self.root);
            }
            top.set_color(Color::Black);
            grandparent.set_color(Color::Red);
            return;
        }
    }

    // -------------------------------------------------------------------------
    // Removal
    // -------------------------------------------------------------------------

    /// Exchanges the tree positions (and colors) of two nodes. Root, minimum
    /// and maximum follow the positions.
    pub(crate) unsafe fn swap(&mut self, a: NodePtr, b: NodePtr) {
        if a == b {
            return;
        }
        if a.parent() == b {
            return self.swap(b, a);
        }

        let a_parent = a.parent();
        let a_left = a.left();
        let a_right = a.right();
        let a_is_left = a.is_left();
        let b_parent = b.parent();
        let b_left = b.left();
        let b_right = b.right();
        let b_is_left = b.is_left();

        let a_color = a.color();
        a.set_color(b.color());
        b.set_color(a_color);

        if b_parent == a {
            // b moves up into a's slot and a hangs below it on b's old side.
            set_child(a_parent, a_is_left, b, &mut self.root);
            b.set_parent(a_parent);
            if b_is_left {
                b.set_left(a);
                b.set_right(a_right);
                if !a_right.is_null() {
                    a_right.set_parent(b);
                }
            } else {
                b.set_right(a);
                b.set_left(a_left);
                if !a_left.is_null() {
                    a_left.set_parent(b);
                }
            }
            a.set_parent(b);
        } else {
            set_child(a_parent, a_is_left, b, &mut self.root);
            set_child(b_parent, b_is_left, a, &mut self.root);
            b.set_parent(a_parent);
            a.set_parent(b_parent);
            b.set_left(a_left);
            b.set_right(a_right);
            if !a_left.is_null() {
                a_left.set_parent(b);
            }
            if !a_right.is_null() {
                a_right.set_parent(b);
            }
        }
        a.set_left(b_left);
        a.set_right(b_right);
        if !b_left.is_null() {
            b_left.set_parent(a);
        }
        if !b_right.is_null() {
            b_right.set_parent(a);
        }

        if self.min == a {
            self.min = b;
        } else if self.min == b {
            self.min = a;
        }
        if self.max == a {
            self.max = b;
        } else if self.max == b {
            self.max = a;
        }
    }

    // Takes `node` out of the tree and the chain. The link itself is left for
    // the caller to reset or reuse.
    pub(crate) unsafe fn detach(&mut self, node: NodePtr) {
        if !node.left().is_null() && !node.right().is_null() {
            let successor = node.right().first_child();
            self.swap(node, successor);
        }
        if node == self.min {
            self.min = node.next();
        }
        if node == self.max {
            self.max = node.prev();
        }
        self.balance_delete(node);
        A::Chain::removed(node.0);
        self.len -= 1;
    }

    pub(crate) unsafe fn remove_node(&mut self, node: NodePtr) -> A::Pointer {
        self.detach(node);
        node.unlink();
        self.adapter.release(node.0)
    }

    // `x` has at most one child here.
    unsafe fn balance_delete(&mut self, x: NodePtr) {
        let child = if x.left().is_null() {
            x.right()
        } else {
            x.left()
        };
        if !child.is_null() {
            // A lone child is red below a black node: it takes x's place and
            // its black.
            child.set_parent(x.parent());
            x.replace_in_parent(child, &mut self.root);
            child.set_color(Color::Black);
            return;
        }
        if x.is_root() {
            self.root = NodePtr::null();
            return;
        }
        if x.is_black() {
            self.fix_double_black(x);
        }
        x.replace_in_parent(NodePtr::null(), &mut self.root);
    }

    // `node` is a black leaf still attached to the tree: removing it would
    // leave its path one black node short.
    unsafe fn fix_double_black(&mut self, node: NodePtr) {
        let mut x = node;
        while !x.is_root() {
            let parent = x.parent();
            let x_is_left = parent.left() == x;
            let mut sibling = if x_is_left {
                parent.right()
            } else {
                parent.left()
            };

            if sibling.is_red() {
                sibling.set_color(Color::Black);
                parent.set_color(Color::Red);
                if x_is_left {
                    parent.rotate_left(&mut self.root);
                    sibling = parent.right();
                } else {
                    parent.rotate_right(&mut self.root);
                    sibling = parent.left();
                }
            }

            if sibling.left_is_black() && sibling.right_is_black() {
                sibling.set_color(Color::Red);
                if parent.is_red() {
                    parent.set_color(Color::Black);
                    return;
                }
                x = parent;
                continue;
            }

            if x_is_left {
                if sibling.right_is_black() {
                    sibling.left().set_color(Color::Black);
                    sibling.set_color(Color::Red);
                    sibling.rotate_right(&mut self.root);
                    sibling = parent.right();
                }
                sibling.set_color(parent.color());
                parent.set_color(Color::Black);
                sibling.right().set_color(Color::Black);
                parent.rotate_left(&mut self.root);
            } else {
                if sibling.left_is_black() {
                    sibling.right().set_color(Color::Black);
                    sibling.set_color(Color::Red);
                    sibling.rotate_left(&mut self.root);
                    sibling = parent.left();
                }
                sibling.set_color(parent.color());
                parent.set_color(Color::Black);
                sibling.left().set_color(Color::Black);
                parent.rotate_right(&mut self.root);
            }
            return;
        }
    }

    /// Removes the value equal to `value` from the tree.
    ///
    /// Returns `false` if no such value is stored.
    #[inline]
    pub fn remove(&mut self, value: &A::Value) -> bool {
        self.take(value).is_some()
    }

    /// Removes the value equal to `value` from the tree and returns it.
    pub fn take(&mut self, value: &A::Value) -> Option<A::Pointer> {
        let node = self.find_node(value.value(), value);
        if node.is_null() {
            None
        } else {
            Some(unsafe { self.remove_node(node) })
        }
    }

    // Moves a node whose value changed its sort key to its new position.
    // If an equal value already sits there the node is dropped instead.
    pub(crate) unsafe fn reposition(&mut self, node: NodePtr) -> bool {
        self.detach(node);
        let (key, slot) = {
            let value = self.value_of(node);
            let key = value.value();
            (key, self.locate(key, value))
        };
        match slot {
            Slot::Occupied => {
                debug!("value re-keyed to {} collides with an equal value, dropping it", key);
                node.unlink();
                drop(self.adapter.release(node.0));
                false
            }
            Slot::Vacant { parent, left } => {
                trace!("re-keying value from {} to {}", node.key(), key);
                node.set_key(key);
                self.attach(node, parent, left);
                true
            }
        }
    }

    // -------------------------------------------------------------------------
    // Bulk operations
    // -------------------------------------------------------------------------

    /// Returns `true` if every value in `values` is stored in the tree.
    pub fn contains_all<'v, I>(&self, values: I) -> bool
    where
        I: IntoIterator<Item = &'v A::Value>,
        A::Value: 'v,
    {
        values.into_iter().all(|value| self.contains(value))
    }

    /// Removes every value in `values`. Returns `true` if anything was
    /// removed.
    pub fn remove_all<'v, I>(&mut self, values: I) -> bool
    where
        I: IntoIterator<Item = &'v A::Value>,
        A::Value: 'v,
    {
        let mut changed = false;
        for value in values {
            changed |= self.remove(value);
        }
        changed
    }

    /// Not supported: always returns `Error::Unsupported`.
    pub fn retain_all<'v, I>(&mut self, _values: I) -> Result<bool>
    where
        I: IntoIterator<Item = &'v A::Value>,
        A::Value: 'v,
    {
        warn!("retain_all called on a red-black tree");
        Err(Error::Unsupported("retain_all"))
    }

    /// Gets an iterator over the values in the tree, in ascending key order.
    #[inline]
    pub fn iter(&self) -> Iter<'_, A> {
        Iter {
            head: self.min,
            tail: self.max,
            tree: self,
        }
    }

    #[inline]
    fn clear_recurse(&mut self, current: NodePtr) {
        if !current.is_null() {
            unsafe {
                self.clear_recurse(current.left());
                self.clear_recurse(current.right());
                current.unlink();
                drop(self.adapter.release(current.0));
            }
        }
    }

    /// Removes all values from the tree.
    ///
    /// Every value is released: owned values are dropped and linked values
    /// get their link reset so that they can join another tree.
    pub fn clear(&mut self) {
        if self.root.is_null() {
            return;
        }
        trace!("clearing {} values", self.len);
        let root = self.root;
        self.root = NodePtr::null();
        self.min = NodePtr::null();
        self.max = NodePtr::null();
        self.len = 0;
        self.clear_recurse(root);
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        use alloc::vec::Vec;
        unsafe {
            if self.root.is_null() {
                assert_eq!(self.len, 0);
                assert!(self.min.is_null());
                assert!(self.max.is_null());
                return;
            }
            assert!(self.root.parent().is_null());
            assert_eq!(self.root.color(), Color::Black);

            let mut in_order = Vec::new();
            check_subtree(self.root, &mut in_order);
            assert_eq!(in_order.len(), self.len);
            assert_eq!(self.min, self.root.first_child());
            assert_eq!(self.max, self.root.last_child());
            for pair in in_order.windows(2) {
                assert!(pair[0].key() <= pair[1].key());
            }

            let mut x = self.min;
            let mut count = 0;
            while !x.is_null() {
                assert_eq!(x, in_order[count]);
                let next = NodePtr(A::Chain::next(x.0));
                if !next.is_null() {
                    assert_eq!(NodePtr(A::Chain::prev(next.0)), x);
                }
                x = next;
                count += 1;
            }
            assert_eq!(count, self.len);
            assert!(NodePtr(A::Chain::prev(self.min.0)).is_null());
        }
    }
}

// Checks parent links, ordering and coloring below `node`; returns its black
// height.
#[cfg(test)]
unsafe fn check_subtree(node: NodePtr, in_order: &mut alloc::vec::Vec<NodePtr>) -> usize {
    if node.is_null() {
        return 1;
    }
    let left = node.left();
    let right = node.right();
    if !left.is_null() {
        assert_eq!(left.parent(), node);
        assert!(left.key() <= node.key());
    }
    if !right.is_null() {
        assert_eq!(right.parent(), node);
        assert!(right.key() >= node.key());
    }
    if node.is_red() {
        assert!(left.is_black() && right.is_black());
    }
    let left_height = check_subtree(left, in_order);
    in_order.push(node);
    let right_height = check_subtree(right, in_order);
    assert_eq!(left_height, right_height);
    left_height + if node.is_black() { 1 } else { 0 }
}

// =============================================================================
// Owned values
// =============================================================================

impl<T: RBKey, C: Chain> RBTree<NodeAdapter<T, C>> {
    /// Inserts a value into the tree.
    ///
    /// Returns `false` (and drops `value`) if an equal value is already
    /// present.
    #[inline]
    pub fn add(&mut self, value: T) -> bool {
        // NodeAdapter never refuses a value.
        self.insert_pointer(value).unwrap_or(false)
    }

    /// Inserts every value from `values`. Returns `true` if anything was
    /// inserted.
    pub fn add_all<I: IntoIterator<Item = T>>(&mut self, values: I) -> bool {
        let mut changed = false;
        for value in values {
            changed |= self.add(value);
        }
        changed
    }

    /// Moves a value whose sort key was changed in place (through interior
    /// mutability) back to its correct position.
    ///
    /// The value is located by the key it had when it was inserted,
    /// `stale_key`, and by equality with `value`. Returns `false` if it could
    /// not be found, or if it now collides with an equal value, in which case
    /// it is dropped from the tree.
    pub fn change_value(&mut self, stale_key: i64, value: &T) -> bool {
        let node = self.find_node(stale_key, value);
        if node.is_null() {
            return false;
        }
        unsafe { self.reposition(node) }
    }
}

impl<T: RBKey, C: Chain> Extend<T> for RBTree<NodeAdapter<T, C>> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.add_all(iter);
    }
}

impl<T: RBKey, C: Chain> FromIterator<T> for RBTree<NodeAdapter<T, C>> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = RBTree::new(NodeAdapter::new());
        tree.add_all(iter);
        tree
    }
}

// Release every value if the tree is dropped
impl<A: Adapter> Drop for RBTree<A> {
    #[inline]
    fn drop(&mut self) {
        self.clear();
    }
}

impl<'a, A: Adapter + 'a> IntoIterator for &'a RBTree<A> {
    type Item = &'a A::Value;
    type IntoIter = Iter<'a, A>;

    #[inline]
    fn into_iter(self) -> Iter<'a, A> {
        self.iter()
    }
}

impl<A: Adapter + Default> Default for RBTree<A> {
    fn default() -> RBTree<A> {
        RBTree::new(A::default())
    }
}

impl<A: Adapter> fmt::Debug for RBTree<A>
where
    A::Value: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

// =============================================================================
// Iter
// =============================================================================

/// An iterator over references to the values of a `RBTree`, in key order.
pub struct Iter<'a, A: Adapter + 'a> {
    head: NodePtr,
    tail: NodePtr,
    tree: &'a RBTree<A>,
}

impl<'a, A: Adapter + 'a> Iterator for Iter<'a, A> {
    type Item = &'a A::Value;

    #[inline]
    fn next(&mut self) -> Option<&'a A::Value> {
        if self.head.is_null() {
            None
        } else {
            let head = self.head;
            if head == self.tail {
                self.head = NodePtr::null();
                self.tail = NodePtr::null();
            } else {
                self.head = NodePtr(unsafe { A::Chain::next(head.0) });
            }
            Some(unsafe { self.tree.value_of(head) })
        }
    }
}

impl<'a, A: Adapter + 'a> DoubleEndedIterator for Iter<'a, A> {
    #[inline]
    fn next_back(&mut self) -> Option<&'a A::Value> {
        if self.tail.is_null() {
            None
        } else {
            let tail = self.tail;
            if self.head == tail {
                self.head = NodePtr::null();
                self.tail = NodePtr::null();
            } else {
                self.tail = NodePtr(unsafe { A::Chain::prev(tail.0) });
            }
            Some(unsafe { self.tree.value_of(tail) })
        }
    }
}

impl<'a, A: Adapter + 'a> Clone for Iter<'a, A> {
    #[inline]
    fn clone(&self) -> Iter<'a, A> {
        Iter {
            head: self.head,
            tail: self.tail,
            tree: self.tree,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::RBTree;
    use crate::adapter::NodeAdapter;
    use crate::chain::Threaded;
    use crate::error::Error;
    use crate::key::RBKey;
    use crate::link::{Color, NodePtr};
    use crate::search::{RBSearch, SearchStep};
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;
    use std::cell::Cell;
    use std::rc::Rc;
    use std::vec::Vec;

    type IntTree = RBTree<NodeAdapter<i32>>;

    fn init_logging() {
        let _ = simplelog::TestLogger::init(simplelog::LevelFilter::Trace, simplelog::Config::default());
    }

    fn keys<A: crate::adapter::Adapter>(t: &RBTree<A>) -> Vec<i64> {
        t.iter().map(|x| x.value()).collect()
    }

    // A value whose identity is its name, so several can share a key.
    #[derive(Debug)]
    struct Item {
        key: Cell<i64>,
        name: &'static str,
    }
    impl Item {
        fn new(key: i64, name: &'static str) -> Item {
            Item {
                key: Cell::new(key),
                name,
            }
        }
    }
    impl PartialEq for Item {
        fn eq(&self, other: &Item) -> bool {
            self.name == other.name
        }
    }
    impl Eq for Item {}
    impl RBKey for Item {
        fn value(&self) -> i64 {
            self.key.get()
        }
    }

    #[test]
    fn test_insert_scenario() {
        let mut t = IntTree::default();
        assert!(t.is_empty());
        for &k in &[6, 1, 5, 3, 4, 2, 9, 8, 0, 7] {
            assert!(t.add(k));
            t.check_invariants();
        }
        assert_eq!(t.len(), 10);
        assert_eq!(keys(&t), (0..10).collect::<Vec<_>>());
        assert_eq!(unsafe { t.root.color() }, Color::Black);
        assert_eq!(t.min(), Some(&0));
        assert_eq!(t.max(), Some(&9));
        assert!(t.root().is_some());
    }

    #[test]
    fn test_remove_scenario() {
        let mut t: IntTree = [6, 1, 5, 3, 4, 2, 9, 8, 0, 7].iter().cloned().collect();
        for &k in &[6, 9, 4, 2, 5, 1, 0] {
            assert!(t.remove(&k));
            assert!(!t.contains(&k));
            t.check_invariants();
        }
        assert_eq!(t.len(), 3);
        assert_eq!(keys(&t), [3, 7, 8]);
        assert_eq!(t.min(), Some(&3));
        assert_eq!(t.max(), Some(&8));
    }

    #[test]
    fn test_insert_remove_random() {
        let mut rng = XorShiftRng::seed_from_u64(0x5eed);
        let mut values = (0..50_000).collect::<Vec<i32>>();
        values.shuffle(&mut rng);

        let mut t = IntTree::default();
        for (i, &v) in values.iter().enumerate() {
            assert!(t.add(v));
            if i % 5_000 == 0 {
                t.check_invariants();
            }
        }
        t.check_invariants();
        assert_eq!(t.len(), 50_000);

        values.shuffle(&mut rng);
        let (removed, kept) = values.split_at(25_000);
        for (i, v) in removed.iter().enumerate() {
            assert!(t.remove(v));
            if i % 1_000 == 0 {
                t.check_invariants();
            }
        }
        t.check_invariants();
        assert_eq!(t.len(), 25_000);
        assert!(removed.iter().all(|v| !t.contains(v)));
        assert!(kept.iter().all(|v| t.contains(v)));
    }

    #[test]
    fn test_small_random_sequences() {
        let mut rng = XorShiftRng::seed_from_u64(7);
        for _ in 0..50 {
            let mut t = IntTree::default();
            let mut expected = Vec::new();
            for _ in 0..200 {
                let v = rng.gen_range(0..64);
                if rng.gen_bool(0.6) {
                    assert_eq!(t.add(v), !expected.contains(&v));
                    if !expected.contains(&v) {
                        expected.push(v);
                    }
                } else {
                    let present = expected.iter().position(|&x| x == v);
                    assert_eq!(t.remove(&v), present.is_some());
                    if let Some(i) = present {
                        expected.remove(i);
                    }
                }
                t.check_invariants();
            }
            expected.sort();
            assert_eq!(t.iter().cloned().collect::<Vec<_>>(), expected);
        }
    }

    #[test]
    fn test_order_independence() {
        let mut rng = XorShiftRng::seed_from_u64(99);
        let mut values = (0..500).collect::<Vec<i32>>();
        let a: IntTree = values.iter().cloned().collect();
        values.shuffle(&mut rng);
        let mut b: IntTree = values.iter().cloned().collect();
        b.add(1_000);
        b.remove(&1_000);
        assert_eq!(keys(&a), keys(&b));
    }

    #[test]
    fn test_duplicate() {
        let mut t = IntTree::default();
        assert!(t.add(5));
        assert!(!t.add(5));
        assert_eq!(t.len(), 1);
        t.check_invariants();
    }

    #[test]
    fn test_remove_absent() {
        let mut t: IntTree = (0..10).collect();
        assert!(!t.remove(&42));
        assert!(t.take(&42).is_none());
        assert_eq!(t.len(), 10);
        assert_eq!(t.take(&4), Some(4));
        assert_eq!(t.len(), 9);
        t.check_invariants();

        let mut empty = IntTree::default();
        assert!(!empty.remove(&1));
    }

    #[test]
    fn test_collisions() {
        init_logging();
        let mut t = RBTree::new(NodeAdapter::<Item>::new());
        assert!(t.add(Item::new(5, "a")));
        assert!(t.add(Item::new(5, "b")));
        assert!(t.add(Item::new(3, "c")));
        assert!(t.add(Item::new(5, "d")));
        assert!(!t.add(Item::new(5, "b")));
        assert_eq!(t.len(), 4);
        t.check_invariants();

        // Equal keys keep their insertion order.
        assert_eq!(
            t.iter().map(|x| x.name).collect::<Vec<_>>(),
            ["c", "a", "b", "d"]
        );
        assert_eq!(t.get(&Item::new(5, "b")).map(|x| x.name), Some("b"));
        assert_eq!(t.get(&Item::new(5, "e")).map(|x| x.name), None);
        assert_eq!(t.find(5).map(|x| x.value()), Some(5));
        assert!(t.find(4).is_none());

        assert_eq!(t.next(&Item::new(5, "a")).map(|x| x.name), Some("b"));
        assert_eq!(t.prev(&Item::new(5, "a")).map(|x| x.name), Some("c"));

        assert!(t.remove(&Item::new(5, "a")));
        assert!(!t.contains(&Item::new(5, "a")));
        assert!(t.contains(&Item::new(5, "b")));
        assert!(t.contains(&Item::new(5, "d")));
        t.check_invariants();
    }

    #[test]
    fn test_collisions_random() {
        const NAMES: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];
        // Equal items must share a key, so the key is a function of the name;
        // every key is shared by two names.
        fn key_of(name: &str) -> i64 {
            i64::from(name.as_bytes()[0] - b'a') % 4
        }
        let mut rng = XorShiftRng::seed_from_u64(3);
        let mut t = RBTree::new(NodeAdapter::<Item>::new());
        let mut present: Vec<&str> = Vec::new();
        for _ in 0..2_000 {
            let name = NAMES[rng.gen_range(0..NAMES.len())];
            let item = Item::new(key_of(name), name);
            let stored = present.iter().position(|&n| n == name);
            if rng.gen_bool(0.5) {
                assert_eq!(t.add(item), stored.is_none());
                if stored.is_none() {
                    present.push(name);
                }
            } else {
                assert_eq!(t.remove(&item), stored.is_some());
                if let Some(i) = stored {
                    present.remove(i);
                }
            }
            t.check_invariants();
            assert_eq!(t.len(), present.len());
            for &n in &NAMES {
                assert_eq!(t.contains(&Item::new(key_of(n), n)), present.contains(&n));
            }
        }
    }

    #[test]
    fn test_neighbors() {
        let t: IntTree = [10, 20, 30].iter().cloned().collect();
        assert_eq!(t.next(&20), Some(&30));
        assert_eq!(t.prev(&20), Some(&10));
        assert_eq!(t.next(&30), None);
        assert_eq!(t.prev(&10), None);
        assert_eq!(t.next(&25), None);
    }

    #[test]
    fn test_get_nearest() {
        let t: IntTree = (0..10).map(|x| x * 10).collect();
        assert_eq!(t.get_nearest(40), Some(&40));
        let near = *t.get_nearest(41).unwrap();
        assert!(near == 40 || near == 50);
        assert_eq!(t.get_nearest(-100), Some(&0));
        assert_eq!(t.get_nearest(1_000), Some(&90));
        assert_eq!(IntTree::default().get_nearest(1), None);
    }

    // Records the largest value not above `limit`. Always ends with `Abort`
    // once it falls off the tree, so the answer is read from the descriptor.
    struct Floor {
        limit: i64,
        best: Option<i64>,
    }
    impl RBSearch<i32> for Floor {
        fn step(&mut self, current: &i32, left: Option<&i32>, right: Option<&i32>) -> SearchStep {
            let key = current.value();
            if key == self.limit {
                return SearchStep::Current;
            }
            if key < self.limit {
                self.best = Some(key);
                if right.is_some() {
                    SearchStep::GoRight
                } else {
                    SearchStep::Abort
                }
            } else if left.is_some() {
                SearchStep::GoLeft
            } else {
                SearchStep::Abort
            }
        }
    }

    #[test]
    fn test_search() {
        let t: IntTree = (0..100).map(|x| x * 2).collect();

        let mut floor = Floor {
            limit: 51,
            best: None,
        };
        assert_eq!(t.search(&mut floor), None);
        assert_eq!(floor.best, Some(50));

        let mut exact = Floor {
            limit: 64,
            best: None,
        };
        assert_eq!(t.search(&mut exact), Some(&64));

        let found = t.search_by(|cur, _, _| match 120.cmp(cur) {
            core::cmp::Ordering::Less => SearchStep::GoLeft,
            core::cmp::Ordering::Equal => SearchStep::Current,
            core::cmp::Ordering::Greater => SearchStep::GoRight,
        });
        assert_eq!(found, Some(&120));

        // Descending into a missing child ends the search.
        assert_eq!(t.search_by(|_, _, _| SearchStep::GoLeft), None);
        assert_eq!(t.search_by(|_, _, _| SearchStep::Abort), None);

        let root = *t.root().unwrap();
        let left = t.search_by(|_, _, _| SearchStep::Left).cloned();
        let right = t.search_by(|_, _, _| SearchStep::Right).cloned();
        assert!(left.unwrap() < root);
        assert!(right.unwrap() > root);
        assert_eq!(IntTree::default().search_by(|_, _, _| SearchStep::Current), None);
    }

    #[test]
    fn test_iter() {
        let t: IntTree = (0..10).map(|x| x * 10).collect();
        assert_eq!(format!("{:?}", t), "{0, 10, 20, 30, 40, 50, 60, 70, 80, 90}");
        assert_eq!(
            (&t).into_iter().rev().cloned().collect::<Vec<_>>(),
            [90, 80, 70, 60, 50, 40, 30, 20, 10, 0]
        );

        let mut it = t.iter();
        assert_eq!(it.next(), Some(&0));
        assert_eq!(it.next_back(), Some(&90));
        let rest = it.clone().cloned().collect::<Vec<_>>();
        assert_eq!(rest, [10, 20, 30, 40, 50, 60, 70, 80]);
        assert_eq!(it.count(), 8);

        assert_eq!(IntTree::default().iter().next(), None);
    }

    #[test]
    fn test_bulk() {
        let mut t = IntTree::default();
        assert!(t.add_all(vec![3, 1, 2]));
        assert!(!t.add_all(vec![1, 2]));
        assert!(t.contains_all(&[1, 2, 3]));
        assert!(!t.contains_all(&[1, 4]));
        assert_eq!(t.retain_all(&[1]), Err(Error::Unsupported("retain_all")));
        assert_eq!(t.len(), 3);
        assert!(t.remove_all(&[1, 4]));
        assert!(!t.remove_all(&[4]));
        t.extend(vec![7, 8]);
        assert_eq!(keys(&t), [2, 3, 7, 8]);
        t.clear();
        assert!(t.is_empty());
        assert_eq!(t.len(), 0);
        assert_eq!(t.min(), None);
        t.check_invariants();
        assert!(t.add(1));
        t.check_invariants();
    }

    #[test]
    fn test_change_value() {
        init_logging();
        let mut t = RBTree::new(NodeAdapter::<Item>::new());
        for &(k, name) in [(1, "a"), (2, "b"), (3, "c"), (4, "d")].iter() {
            t.add(Item::new(k, name));
        }
        t.get(&Item::new(2, "b")).unwrap().key.set(10);
        // The tree still uses the cached key until told otherwise.
        assert!(!t.contains(&Item::new(10, "b")));
        assert!(t.change_value(2, &Item::new(10, "b")));
        t.check_invariants();
        assert_eq!(t.iter().map(|x| x.name).collect::<Vec<_>>(), ["a", "c", "d", "b"]);
        assert!(t.contains(&Item::new(10, "b")));
        assert_eq!(t.max().map(|x| x.name), Some("b"));

        assert!(!t.change_value(2, &Item::new(10, "b")));
        assert!(!t.change_value(1, &Item::new(1, "z")));
    }

    #[test]
    fn test_threaded_owned() {
        let mut rng = XorShiftRng::seed_from_u64(11);
        let mut t = RBTree::new(NodeAdapter::<i32, Threaded>::new());
        let mut values = (0..1_000).collect::<Vec<i32>>();
        values.shuffle(&mut rng);
        for &v in &values {
            t.add(v);
        }
        t.check_invariants();
        values.shuffle(&mut rng);
        for v in &values[..600] {
            assert!(t.remove(v));
            t.check_invariants();
        }
        assert_eq!(t.len(), 400);
        let first = *t.min().unwrap();
        assert_eq!(t.prev(&first), None);
        assert!(t.next(&first).unwrap() > &first);
    }

    #[test]
    fn test_swap() {
        let mut t: IntTree = (0..15).collect();
        unsafe {
            let root = t.root;
            let child = root.left();
            let far = root.right().last_child();

            // Parent and child, in either order, then two unrelated nodes.
            t.swap(root, child);
            assert_eq!(t.root, child);
            assert_eq!(root.parent(), child);
            t.swap(root, child);
            assert_eq!(t.root, root);
            t.check_invariants();

            t.swap(child, root);
            t.swap(child, root);
            t.check_invariants();

            let max = t.max;
            assert_eq!(max, far);
            t.swap(child, far);
            assert_eq!(t.max, child);
            t.swap(child, far);
            assert_eq!(t.max, far);
            t.check_invariants();
        }
    }

    #[test]
    fn test_drop_releases_values() {
        struct Tracked {
            key: i64,
            _token: Rc<()>,
        }
        impl PartialEq for Tracked {
            fn eq(&self, other: &Tracked) -> bool {
                self.key == other.key
            }
        }
        impl Eq for Tracked {}
        impl RBKey for Tracked {
            fn value(&self) -> i64 {
                self.key
            }
        }

        let token = Rc::new(());
        {
            let mut t = RBTree::new(NodeAdapter::<Tracked>::new());
            for key in 0..20 {
                t.add(Tracked {
                    key,
                    _token: token.clone(),
                });
            }
            assert_eq!(Rc::strong_count(&token), 21);
            assert!(!t.add(Tracked {
                key: 3,
                _token: token.clone(),
            }));
            assert_eq!(Rc::strong_count(&token), 21);
            t.remove(&Tracked {
                key: 3,
                _token: token.clone(),
            });
            assert_eq!(Rc::strong_count(&token), 20);
        }
        assert_eq!(Rc::strong_count(&token), 1);
    }

    #[test]
    fn test_empty_tree() {
        let t = IntTree::default();
        assert!(t.is_empty());
        assert_eq!(t.min(), None);
        assert_eq!(t.max(), None);
        assert_eq!(t.root(), None);
        assert_eq!(t.find(0), None);
        assert!(!t.contains(&0));
        assert_eq!(format!("{:?}", t), "{}");
        assert!(unsafe { NodePtr::null().is_black() });
    }
}
