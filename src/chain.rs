// Copyright 2016 Amanieu d'Antras
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Strategies for finding in-order neighbors.
//!
//! A tree either walks its structure to find the successor and predecessor of
//! a node (`Unthreaded`), or keeps every node threaded into a doubly linked
//! list in key order (`Threaded`), which makes both lookups O(1) at the cost
//! of two extra pointer updates per insertion and removal.

use crate::link::{Link, NodePtr};

/// Hooks run by a `RBTree` around structural changes to keep an in-order
/// chain up to date.
///
/// # Safety
///
/// `next` and `prev` must return the in-order successor and predecessor of a
/// linked node (or null at the extremes) at every point where the tree calls
/// them.
pub unsafe trait Chain {
    /// Called after `node` has been attached as a leaf of the tree, before
    /// the tree is rebalanced.
    unsafe fn inserted(node: *const Link);

    /// Called after `node` has been detached from the tree, before its link
    /// is reset.
    unsafe fn removed(node: *const Link);

    /// Returns the in-order successor of `node`, or null.
    unsafe fn next(node: *const Link) -> *const Link;

    /// Returns the in-order predecessor of `node`, or null.
    unsafe fn prev(node: *const Link) -> *const Link;
}

/// Neighbors are found by walking the tree: O(log n) per step.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unthreaded;

unsafe impl Chain for Unthreaded {
    #[inline]
    unsafe fn inserted(_node: *const Link) {}

    #[inline]
    unsafe fn removed(_node: *const Link) {}

    #[inline]
    unsafe fn next(node: *const Link) -> *const Link {
        NodePtr(node).next().0
    }

    #[inline]
    unsafe fn prev(node: *const Link) -> *const Link {
        NodePtr(node).prev().0
    }
}

/// Nodes are threaded into a doubly linked list in key order: O(1) per step.
#[derive(Clone, Copy, Debug, Default)]
pub struct Threaded;

unsafe impl Chain for Threaded {
    // A new leaf sits directly next to its parent in key order: a left child
    // precedes its parent, a right child follows it.
    unsafe fn inserted(node: *const Link) {
        let node = NodePtr(node);
        let parent = node.parent();
        if parent.is_null() {
            link_between(node, NodePtr::null(), NodePtr::null());
        } else if parent.left() == node {
            link_between(node, parent.chain_prev(), parent);
        } else {
            link_between(node, parent, parent.chain_next());
        }
    }

    unsafe fn removed(node: *const Link) {
        let node = NodePtr(node);
        let prev = node.chain_prev();
        let next = node.chain_next();
        if !prev.is_null() {
            prev.set_chain_next(next);
        }
        if !next.is_null() {
            next.set_chain_prev(prev);
        }
        node.set_chain_next(NodePtr::null());
        node.set_chain_prev(NodePtr::null());
    }

    #[inline]
    unsafe fn next(node: *const Link) -> *const Link {
        NodePtr(node).chain_next().0
    }

    #[inline]
    unsafe fn prev(node: *const Link) -> *const Link {
        NodePtr(node).chain_prev().0
    }
}

#[inline]
unsafe fn link_between(node: NodePtr, prev: NodePtr, next: NodePtr) {
    if !prev.is_null() {
        prev.set_chain_next(node);
    }
    if !next.is_null() {
        next.set_chain_prev(node);
    }
    node.set_chain_next(next);
    node.set_chain_prev(prev);
}
