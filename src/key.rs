// Copyright 2016 Amanieu d'Antras
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Capabilities a value needs in order to be stored in a tree.

use crate::link::{Color, Link, NodePtr};
use alloc::rc::Rc;

/// A value that can be stored in a `RBTree`.
///
/// The tree is ordered by the integer returned from `value`. Distinct values
/// may share a sort key; such collisions are told apart using `Eq`, so
/// `Eq` (and `Hash`, if implemented) must describe the identity of the value
/// and not only its key. Values which are equal must also return the same
/// key: lookups only compare values whose keys match.
///
/// The key may change while the value is stored (through interior
/// mutability). The tree keeps using the key it cached at insertion until
/// `change_value` is called for that value.
pub trait RBKey: Eq {
    /// Returns the sort key of this value.
    fn value(&self) -> i64;
}

macro_rules! impl_rbkey_for_int {
    ($($t:ty)*) => {
        $(
            impl RBKey for $t {
                #[inline]
                fn value(&self) -> i64 {
                    i64::from(*self)
                }
            }
        )*
    };
}

impl_rbkey_for_int!(i8 i16 i32 i64 u8 u16 u32);

/// A value which carries its own `Link` and can therefore be placed in a
/// `LinkedRBTree`.
///
/// Once inserted, the value can reach its tree neighbors directly through the
/// link in O(1), without access to the tree. A value can be part of at most
/// one tree at a time; its link is reset when it is removed so that it may be
/// inserted into another tree afterwards.
///
/// In most cases you do not need to implement this trait manually: the
/// `linked_rbkey!` macro will generate the implementation for a given type
/// and its link field.
///
/// # Safety
///
/// `link` must always return a reference to the same `Link` stored inside
/// `self`, and passing a pointer to that link to `from_link` must return a
/// pointer to `self`.
pub unsafe trait LinkedRBKey: RBKey + Sized {
    /// Gets the link embedded in this value.
    fn link(&self) -> &Link;

    /// Gets a pointer to the value containing the given link.
    ///
    /// # Safety
    ///
    /// `link` must point to the link of a live value of this type.
    unsafe fn from_link(link: *const Link) -> *const Self;

    /// Returns `true` if the value is currently stored in a tree.
    #[inline]
    fn is_linked(&self) -> bool {
        self.link().is_linked()
    }

    /// Returns the next value in key order, or `None` at the maximum or if
    /// the value is not in a tree.
    #[inline]
    fn next(&self) -> Option<Rc<Self>> {
        related(self, NodePtr::chain_next)
    }

    /// Returns the previous value in key order, or `None` at the minimum or
    /// if the value is not in a tree.
    #[inline]
    fn prev(&self) -> Option<Rc<Self>> {
        related(self, NodePtr::chain_prev)
    }

    /// Returns the left child of this value's node.
    #[inline]
    fn left(&self) -> Option<Rc<Self>> {
        related(self, NodePtr::left)
    }

    /// Returns the right child of this value's node.
    #[inline]
    fn right(&self) -> Option<Rc<Self>> {
        related(self, NodePtr::right)
    }

    /// Returns the parent of this value's node.
    #[inline]
    fn parent(&self) -> Option<Rc<Self>> {
        related(self, NodePtr::parent)
    }

    /// Returns `true` if this value's node has a left child.
    #[inline]
    fn has_left(&self) -> bool {
        self.link().is_linked() && unsafe { !self.link().as_ptr().left().is_null() }
    }

    /// Returns `true` if this value's node has a right child.
    #[inline]
    fn has_right(&self) -> bool {
        self.link().is_linked() && unsafe { !self.link().as_ptr().right().is_null() }
    }

    /// Returns `true` if this value's node has a parent.
    #[inline]
    fn has_parent(&self) -> bool {
        self.link().is_linked() && unsafe { !self.link().as_ptr().is_root() }
    }

    /// Returns `true` if the value is the root of the tree it is stored in.
    #[inline]
    fn is_root(&self) -> bool {
        self.link().is_linked() && unsafe { self.link().as_ptr().is_root() }
    }

    /// Returns `true` if the value is stored in a tree and its node has no
    /// children.
    #[inline]
    fn is_leaf(&self) -> bool {
        self.link().is_linked() && unsafe { !self.link().as_ptr().has_child() }
    }

    /// Returns the color of this value's node, or `None` if it is not in a
    /// tree.
    #[inline]
    fn color(&self) -> Option<Color> {
        self.link().color()
    }
}

// Every linked `LinkedRBKey` is owned by a `LinkedRBTree` through an `Rc`, so
// taking an extra strong reference keeps the neighbor alive independently of
// the tree.
#[inline]
fn related<K: LinkedRBKey>(key: &K, relation: unsafe fn(NodePtr) -> NodePtr) -> Option<Rc<K>> {
    let link = key.link();
    if !link.is_linked() {
        return None;
    }
    unsafe {
        let node = relation(link.as_ptr());
        if node.is_null() {
            None
        } else {
            let raw = K::from_link(node.0);
            Rc::increment_strong_count(raw);
            Some(Rc::from_raw(raw))
        }
    }
}
