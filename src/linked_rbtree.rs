// Copyright 2016 Amanieu d'Antras
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Threaded red-black tree of values which carry their own link.
//!
//! A `LinkedRBTree` stores `Rc<K>` where `K` embeds a `Link`. Besides the
//! usual tree pointers the link holds the next and previous value in key
//! order, so that a stored value can step to its neighbors in O(1) through
//! `LinkedRBKey::next` and `LinkedRBKey::prev` without touching the tree.

use crate::adapter::LinkedAdapter;
use crate::error::{Error, Result};
use crate::key::LinkedRBKey;
use crate::rbtree::RBTree;
use alloc::rc::Rc;
use log::debug;

/// A red-black tree of `Rc<K>` values threaded in key order.
pub type LinkedRBTree<K> = RBTree<LinkedAdapter<K>>;

impl<K: LinkedRBKey> RBTree<LinkedAdapter<K>> {
    /// Inserts a value into the tree.
    ///
    /// Returns `Ok(false)` if an equal value is already present, and
    /// `Error::AlreadyLinked` if `value` is stored in this or another tree.
    pub fn add(&mut self, value: Rc<K>) -> Result<bool> {
        self.insert_pointer(value).map_err(|value| {
            debug!("refusing value with key {}: already linked", value.value());
            Error::AlreadyLinked
        })
    }

    /// Inserts every value from `values`, stopping at the first one which is
    /// refused. Returns `Ok(true)` if anything was inserted.
    pub fn add_all<I: IntoIterator<Item = Rc<K>>>(&mut self, values: I) -> Result<bool> {
        let mut changed = false;
        for value in values {
            changed |= self.add(value)?;
        }
        Ok(changed)
    }

    /// Returns `true` if `value` itself (not merely an equal value) is
    /// stored in this tree.
    pub fn holds(&self, value: &K) -> bool {
        let link = value.link();
        if !link.is_linked() {
            return false;
        }
        let mut x = link.as_ptr();
        unsafe {
            while !x.parent().is_null() {
                x = x.parent();
            }
        }
        x == self.root_ptr()
    }

    /// Moves a stored value whose sort key was changed in place back to its
    /// correct position.
    ///
    /// Returns `false` if `value` is not stored in this tree, or if it now
    /// collides with an equal value, in which case it is removed.
    pub fn change_value(&mut self, value: &K) -> bool {
        if !self.holds(value) {
            return false;
        }
        unsafe { self.reposition(value.link().as_ptr()) }
    }

    /// Removes `value` itself from the tree and returns the tree's reference
    /// to it.
    ///
    /// Unlike `take`, this does not search by key and equality, so it works
    /// even if the sort key was changed without calling `change_value`.
    pub fn unlink(&mut self, value: &K) -> Option<Rc<K>> {
        if !self.holds(value) {
            return None;
        }
        Some(unsafe { self.remove_node(value.link().as_ptr()) })
    }
}
