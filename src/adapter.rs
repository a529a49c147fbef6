// Copyright 2016 Amanieu d'Antras
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use crate::chain::{Chain, Threaded, Unthreaded};
use crate::key::{LinkedRBKey, RBKey};
use crate::link::Link;
use alloc::boxed::Box;
use alloc::rc::Rc;
use core::fmt;
use core::marker::PhantomData;
use core::ptr;

/// Trait for an adapter which maps values stored in a `RBTree` to the `Link`
/// the tree threads through them.
///
/// `Value` is the type the tree orders and hands out references to.
/// `Pointer` is the owned form in which values enter and leave the tree.
/// `Chain` selects how in-order neighbors are found.
///
/// Two adapters are provided: `NodeAdapter`, where the tree allocates a node
/// holding the value next to its link, and `LinkedAdapter`, where the value is
/// an `Rc` of a type that embeds its own link.
///
/// # Safety
///
/// A link returned by `acquire` must stay at the same address until it is
/// passed back to `release`, and `get_value` must return the value that owns
/// that link.
pub unsafe trait Adapter {
    /// Value type stored in the tree.
    type Value: RBKey;

    /// Owned pointer type which is inserted into and removed from the tree.
    type Pointer;

    /// In-order neighbor strategy.
    type Chain: Chain;

    /// Gets the value an owned pointer refers to.
    fn value<'a>(&self, ptr: &'a Self::Pointer) -> &'a Self::Value;

    /// Converts an owned pointer into a link that can be attached to the
    /// tree. The pointer is handed back if it cannot be attached.
    fn acquire(&self, ptr: Self::Pointer) -> Result<*const Link, Self::Pointer>;

    /// Converts a detached link back into the owned pointer it came from.
    ///
    /// # Safety
    ///
    /// `link` must have been returned by `acquire` and not yet released.
    unsafe fn release(&self, link: *const Link) -> Self::Pointer;

    /// Gets the value that owns the given link.
    ///
    /// # Safety
    ///
    /// `link` must have been returned by `acquire` and not yet released.
    unsafe fn get_value(&self, link: *const Link) -> *const Self::Value;
}

// =============================================================================
// NodeAdapter
// =============================================================================

// The link is the first field so that a link pointer is also a node pointer.
#[repr(C)]
struct Node<T> {
    link: Link,
    value: T,
}

/// Adapter for trees which own their values: each value is moved into a
/// heap-allocated node next to its link.
pub struct NodeAdapter<T, C = Unthreaded>(PhantomData<fn() -> (T, C)>);

impl<T, C> NodeAdapter<T, C> {
    /// Creates a new `NodeAdapter`.
    #[inline]
    pub const fn new() -> NodeAdapter<T, C> {
        NodeAdapter(PhantomData)
    }
}

impl<T, C> Clone for NodeAdapter<T, C> {
    #[inline]
    fn clone(&self) -> NodeAdapter<T, C> {
        NodeAdapter::new()
    }
}

impl<T, C> Default for NodeAdapter<T, C> {
    #[inline]
    fn default() -> NodeAdapter<T, C> {
        NodeAdapter::new()
    }
}

impl<T, C> fmt::Debug for NodeAdapter<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("NodeAdapter")
    }
}

unsafe impl<T: RBKey, C: Chain> Adapter for NodeAdapter<T, C> {
    type Value = T;
    type Pointer = T;
    type Chain = C;

    #[inline]
    fn value<'a>(&self, ptr: &'a T) -> &'a T {
        ptr
    }

    #[inline]
    fn acquire(&self, value: T) -> Result<*const Link, T> {
        let node = Box::into_raw(Box::new(Node {
            link: Link::new(),
            value,
        }));
        Ok(node as *const Link)
    }

    #[inline]
    unsafe fn release(&self, link: *const Link) -> T {
        let node = *Box::from_raw(link as *mut Node<T>);
        node.value
    }

    #[inline]
    unsafe fn get_value(&self, link: *const Link) -> *const T {
        ptr::addr_of!((*(link as *const Node<T>)).value)
    }
}

// =============================================================================
// LinkedAdapter
// =============================================================================

/// Adapter for trees of `Rc<K>` where `K` embeds its own `Link`.
///
/// Values are threaded in key order, and a value which is already linked
/// into a tree is refused.
pub struct LinkedAdapter<K>(PhantomData<fn() -> K>);

impl<K> LinkedAdapter<K> {
    /// Creates a new `LinkedAdapter`.
    #[inline]
    pub const fn new() -> LinkedAdapter<K> {
        LinkedAdapter(PhantomData)
    }
}

impl<K> Clone for LinkedAdapter<K> {
    #[inline]
    fn clone(&self) -> LinkedAdapter<K> {
        LinkedAdapter::new()
    }
}

impl<K> Default for LinkedAdapter<K> {
    #[inline]
    fn default() -> LinkedAdapter<K> {
        LinkedAdapter::new()
    }
}

impl<K> fmt::Debug for LinkedAdapter<K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("LinkedAdapter")
    }
}

unsafe impl<K: LinkedRBKey> Adapter for LinkedAdapter<K> {
    type Value = K;
    type Pointer = Rc<K>;
    type Chain = Threaded;

    #[inline]
    fn value<'a>(&self, ptr: &'a Rc<K>) -> &'a K {
        ptr
    }

    #[inline]
    fn acquire(&self, ptr: Rc<K>) -> Result<*const Link, Rc<K>> {
        if ptr.link().is_linked() {
            return Err(ptr);
        }
        let raw = Rc::into_raw(ptr);
        Ok(unsafe { (*raw).link() as *const Link })
    }

    #[inline]
    unsafe fn release(&self, link: *const Link) -> Rc<K> {
        Rc::from_raw(K::from_link(link))
    }

    #[inline]
    unsafe fn get_value(&self, link: *const Link) -> *const K {
        K::from_link(link)
    }
}
