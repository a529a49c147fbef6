// Copyright 2016 Amanieu d'Antras
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Tree links and the structural primitives used by the balancing code.

use core::cell::Cell;
use core::fmt;
use core::ptr;

// =============================================================================
// Color
// =============================================================================

/// Color of a node in a red-black tree.
///
/// Missing children are always treated as `Black`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    /// A red node. A red node never has a red child.
    Red,
    /// A black node. Every path from a node to a missing child passes
    /// through the same number of black nodes.
    Black,
}

// =============================================================================
// Link
// =============================================================================

/// Link that allows an object to be placed into a `RBTree`.
///
/// Owned trees allocate a link next to each value. Linked keys embed a
/// `Link` directly, which is what lets them navigate to their neighbors
/// without going through the tree.
pub struct Link {
    left: Cell<NodePtr>,
    right: Cell<NodePtr>,
    parent: Cell<NodePtr>,
    next: Cell<NodePtr>,
    prev: Cell<NodePtr>,
    color: Cell<Color>,
    key: Cell<i64>,
}

impl Link {
    /// Creates a new, unlinked `Link`.
    #[inline]
    pub const fn new() -> Link {
        Link {
            left: Cell::new(NodePtr(ptr::null())),
            right: Cell::new(NodePtr(ptr::null())),
            parent: Cell::new(UNLINKED_MARKER),
            next: Cell::new(NodePtr(ptr::null())),
            prev: Cell::new(NodePtr(ptr::null())),
            color: Cell::new(Color::Red),
            key: Cell::new(0),
        }
    }

    /// Checks whether the `Link` is currently part of a tree.
    #[inline]
    pub fn is_linked(&self) -> bool {
        self.parent.get() != UNLINKED_MARKER
    }

    /// Returns the color of the node, or `None` if the link is not in a tree.
    #[inline]
    pub fn color(&self) -> Option<Color> {
        if self.is_linked() {
            Some(self.color.get())
        } else {
            None
        }
    }

    /// Returns the sort key cached by the tree when the object was inserted
    /// (or last re-synced), or `None` if the link is not in a tree.
    #[inline]
    pub fn cached_key(&self) -> Option<i64> {
        if self.is_linked() {
            Some(self.key.get())
        } else {
            None
        }
    }

    #[inline]
    pub(crate) fn as_ptr(&self) -> NodePtr {
        NodePtr(self)
    }
}

// Provide an implementation of Clone which simply initializes the new link as
// unlinked. This allows structs containing a link to derive Clone.
impl Clone for Link {
    #[inline]
    fn clone(&self) -> Link {
        Link::new()
    }
}

impl Default for Link {
    #[inline]
    fn default() -> Link {
        Link::new()
    }
}

// Provide an implementation of Debug so that structs containing a link can
// still derive Debug.
impl fmt::Debug for Link {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_linked() {
            write!(f, "linked")
        } else {
            write!(f, "unlinked")
        }
    }
}

// =============================================================================
// NodePtr
// =============================================================================

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) struct NodePtr(pub(crate) *const Link);

// Stored in the parent slot of a link that is not part of any tree. A real
// parent is either null (the root) or a properly aligned link.
const UNLINKED_MARKER: NodePtr = NodePtr(1 as *const Link);

impl NodePtr {
    #[inline]
    pub(crate) fn null() -> NodePtr {
        NodePtr(ptr::null())
    }

    #[inline]
    pub(crate) fn is_null(self) -> bool {
        self.0.is_null()
    }

    #[inline]
    pub(crate) unsafe fn parent(self) -> NodePtr {
        (*self.0).parent.get()
    }

    #[inline]
    pub(crate) unsafe fn left(self) -> NodePtr {
        (*self.0).left.get()
    }

    #[inline]
    pub(crate) unsafe fn right(self) -> NodePtr {
        (*self.0).right.get()
    }

    #[inline]
    pub(crate) unsafe fn color(self) -> Color {
        (*self.0).color.get()
    }

    #[inline]
    pub(crate) unsafe fn key(self) -> i64 {
        (*self.0).key.get()
    }

    #[inline]
    pub(crate) unsafe fn chain_next(self) -> NodePtr {
        (*self.0).next.get()
    }

    #[inline]
    pub(crate) unsafe fn chain_prev(self) -> NodePtr {
        (*self.0).prev.get()
    }

    #[inline]
    pub(crate) unsafe fn set_parent(self, parent: NodePtr) {
        (*self.0).parent.set(parent);
    }

    #[inline]
    pub(crate) unsafe fn set_left(self, left: NodePtr) {
        (*self.0).left.set(left);
    }

    #[inline]
    pub(crate) unsafe fn set_right(self, right: NodePtr) {
        (*self.0).right.set(right);
    }

    #[inline]
    pub(crate) unsafe fn set_color(self, color: Color) {
        (*self.0).color.set(color);
    }

    #[inline]
    pub(crate) unsafe fn set_key(self, key: i64) {
        (*self.0).key.set(key);
    }

    #[inline]
    pub(crate) unsafe fn set_chain_next(self, next: NodePtr) {
        (*self.0).next.set(next);
    }

    #[inline]
    pub(crate) unsafe fn set_chain_prev(self, prev: NodePtr) {
        (*self.0).prev.set(prev);
    }

    /// Prepares a fresh leaf: red, no children, attached under `parent`.
    #[inline]
    pub(crate) unsafe fn reset(self, parent: NodePtr) {
        self.set_parent(parent);
        self.set_left(NodePtr::null());
        self.set_right(NodePtr::null());
        self.set_chain_next(NodePtr::null());
        self.set_chain_prev(NodePtr::null());
        self.set_color(Color::Red);
    }

    #[inline]
    pub(crate) unsafe fn unlink(self) {
        self.set_left(NodePtr::null());
        self.set_right(NodePtr::null());
        self.set_chain_next(NodePtr::null());
        self.set_chain_prev(NodePtr::null());
        self.set_parent(UNLINKED_MARKER);
    }

    // -------------------------------------------------------------------------
    // Structural queries
    // -------------------------------------------------------------------------

    #[inline]
    pub(crate) unsafe fn is_root(self) -> bool {
        self.parent().is_null()
    }

    #[inline]
    pub(crate) unsafe fn is_left(self) -> bool {
        let parent = self.parent();
        !parent.is_null() && parent.left() == self
    }

    #[inline]
    pub(crate) unsafe fn is_right(self) -> bool {
        let parent = self.parent();
        !parent.is_null() && parent.right() == self
    }

    #[inline]
    pub(crate) unsafe fn has_child(self) -> bool {
        !self.left().is_null() || !self.right().is_null()
    }

    /// Null nodes count as black.
    #[inline]
    pub(crate) unsafe fn is_black(self) -> bool {
        self.is_null() || self.color() == Color::Black
    }

    #[inline]
    pub(crate) unsafe fn is_red(self) -> bool {
        !self.is_black()
    }

    #[inline]
    pub(crate) unsafe fn left_is_black(self) -> bool {
        self.left().is_black()
    }

    #[inline]
    pub(crate) unsafe fn right_is_black(self) -> bool {
        self.right().is_black()
    }

    #[inline]
    pub(crate) unsafe fn grandparent(self) -> NodePtr {
        let parent = self.parent();
        if parent.is_null() {
            NodePtr::null()
        } else {
            parent.parent()
        }
    }

    #[inline]
    pub(crate) unsafe fn sibling(self) -> NodePtr {
        let parent = self.parent();
        if parent.is_null() {
            NodePtr::null()
        } else if parent.left() == self {
            parent.right()
        } else {
            parent.left()
        }
    }

    #[inline]
    pub(crate) unsafe fn uncle(self) -> NodePtr {
        let parent = self.parent();
        if parent.is_null() {
            NodePtr::null()
        } else {
            parent.sibling()
        }
    }

    // -------------------------------------------------------------------------
    // In-order traversal by tree position
    // -------------------------------------------------------------------------

    #[inline]
    pub(crate) unsafe fn first_child(self) -> NodePtr {
        if self.is_null() {
            NodePtr::null()
        } else {
            let mut x = self;
            while !x.left().is_null() {
                x = x.left();
            }
            x
        }
    }

    #[inline]
    pub(crate) unsafe fn last_child(self) -> NodePtr {
        if self.is_null() {
            NodePtr::null()
        } else {
            let mut x = self;
            while !x.right().is_null() {
                x = x.right();
            }
            x
        }
    }

    pub(crate) unsafe fn next(self) -> NodePtr {
        if !self.right().is_null() {
            self.right().first_child()
        } else {
            let mut x = self;
            loop {
                if x.parent().is_null() {
                    return NodePtr::null();
                }
                if x.is_left() {
                    return x.parent();
                }
                x = x.parent();
            }
        }
    }

    pub(crate) unsafe fn prev(self) -> NodePtr {
        if !self.left().is_null() {
            self.left().last_child()
        } else {
            let mut x = self;
            loop {
                if x.parent().is_null() {
                    return NodePtr::null();
                }
                if x.is_right() {
                    return x.parent();
                }
                x = x.parent();
            }
        }
    }

    // -------------------------------------------------------------------------
    // Restructuring
    // -------------------------------------------------------------------------

    /// Points whatever referenced `self` from above (its parent, or the root
    /// slot) at `new` instead. `self`'s own parent pointer is untouched.
    #[inline]
    pub(crate) unsafe fn replace_in_parent(self, new: NodePtr, root: &mut NodePtr) {
        let parent = self.parent();
        if parent.is_null() {
            *root = new;
        } else if parent.left() == self {
            parent.set_left(new);
        } else {
            parent.set_right(new);
        }
    }

    pub(crate) unsafe fn rotate_left(self, root: &mut NodePtr) {
        let y = self.right();
        self.set_right(y.left());
        if !self.right().is_null() {
            self.right().set_parent(self);
        }
        y.set_parent(self.parent());
        self.replace_in_parent(y, root);
        y.set_left(self);
        self.set_parent(y);
    }

    pub(crate) unsafe fn rotate_right(self, root: &mut NodePtr) {
        let y = self.left();
        self.set_left(y.right());
        if !self.left().is_null() {
            self.left().set_parent(self);
        }
        y.set_parent(self.parent());
        self.replace_in_parent(y, root);
        y.set_right(self);
        self.set_parent(y);
    }
}

// =============================================================================
// Tests
// =============================================================================
