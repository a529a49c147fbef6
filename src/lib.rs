// Copyright 2016 Amanieu d'Antras
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Red-black trees ordered by integer sort keys.
//!
//! Values stored in a tree implement `RBKey`, which maps each value to an
//! `i64` sort key. Distinct values may share a key; they are told apart by
//! `Eq`, and a value equal to one already in the tree is not inserted twice.
//!
//! Two flavors of tree are provided:
//!
//! - `RBTree<NodeAdapter<T>>` owns its values. Each one is moved into a node
//!   allocated by the tree.
//! - `LinkedRBTree<K>` stores `Rc<K>` where `K` embeds a `Link`. Stored values
//!   can reach their neighbors in key order (and their tree parent and
//!   children) directly, without access to the tree. A value belongs to at
//!   most one tree at a time.
//!
//! Lookups, insertions and removals take O(log n). Trees are single-threaded.
//!
//! # Example
//!
//! ```
//! use rbkey_tree::{NodeAdapter, RBTree};
//!
//! let mut tree = RBTree::new(NodeAdapter::<i32>::new());
//! for x in &[6, 1, 5, 3] {
//!     tree.add(*x);
//! }
//! assert!(!tree.add(5));
//! assert!(tree.remove(&6));
//! assert_eq!(tree.iter().cloned().collect::<Vec<_>>(), [1, 3, 5]);
//! assert_eq!(tree.next(&3), Some(&5));
//! ```
//!
//! # Linked values
//!
//! ```
//! #[macro_use]
//! extern crate rbkey_tree;
//! use rbkey_tree::{Link, LinkedRBKey, LinkedRBTree, RBKey};
//! use std::rc::Rc;
//!
//! struct Timer {
//!     link: Link,
//!     deadline: i64,
//! }
//! linked_rbkey!(Timer { link });
//!
//! impl PartialEq for Timer {
//!     fn eq(&self, other: &Timer) -> bool {
//!         self.deadline == other.deadline
//!     }
//! }
//! impl Eq for Timer {}
//! impl RBKey for Timer {
//!     fn value(&self) -> i64 {
//!         self.deadline
//!     }
//! }
//!
//! fn main() {
//!     let mut timers = LinkedRBTree::default();
//!     let soon = Rc::new(Timer { link: Link::new(), deadline: 10 });
//!     let later = Rc::new(Timer { link: Link::new(), deadline: 20 });
//!     timers.add(later.clone()).unwrap();
//!     timers.add(soon.clone()).unwrap();
//!
//!     // Neighbors are reachable from the value itself.
//!     assert!(Rc::ptr_eq(&soon.next().unwrap(), &later));
//!
//!     // A value can only be in one tree at a time.
//!     let mut other = LinkedRBTree::default();
//!     assert!(other.add(soon.clone()).is_err());
//!     timers.remove(&soon);
//!     assert!(other.add(soon.clone()).unwrap());
//! }
//! ```

#![warn(missing_docs)]
#![no_std]

#[cfg(test)]
#[macro_use]
extern crate std;

extern crate alloc;

// Re-exported for use by macros
#[doc(hidden)]
pub use memoffset as __memoffset;

/// Unsafe macro to get a raw pointer to an outer object from a pointer to one
/// of its fields.
///
/// # Examples
///
/// ```
/// # #[macro_use] extern crate rbkey_tree;
/// # fn main() {
/// struct S { x: u32, y: u32 };
/// let container = S { x: 1, y: 2 };
/// let field = &container.y;
/// let container2: *const S = unsafe { container_of!(field, S, y) };
/// assert_eq!(&container as *const _, container2);
/// # }
/// ```
///
/// # Safety
///
/// This is unsafe because it assumes that the given expression is a valid
/// pointer to the specified field of some container type.
#[macro_export]
macro_rules! container_of {
    ($ptr:expr, $container:path, $field:ident) => {
        ($ptr as *const _ as *const u8).sub($crate::__memoffset::offset_of!($container, $field))
            as *const $container
    };
}

/// Macro to implement `LinkedRBKey` for a type with a `Link` field.
///
/// The type must also implement `RBKey`.
///
/// # Examples
///
/// ```
/// #[macro_use]
/// extern crate rbkey_tree;
/// use rbkey_tree::{Link, RBKey};
///
/// #[derive(PartialEq, Eq)]
/// struct Id(u32);
///
/// struct Job {
///     id: Id,
///     link: Link,
/// }
/// linked_rbkey!(Job { link });
///
/// impl PartialEq for Job {
///     fn eq(&self, other: &Job) -> bool { self.id == other.id }
/// }
/// impl Eq for Job {}
/// impl RBKey for Job {
///     fn value(&self) -> i64 { i64::from(self.id.0) }
/// }
/// # fn main() {}
/// ```
#[macro_export]
macro_rules! linked_rbkey {
    ($container:path { $field:ident }) => {
        unsafe impl $crate::LinkedRBKey for $container {
            #[inline]
            fn link(&self) -> &$crate::Link {
                &self.$field
            }
            #[inline]
            unsafe fn from_link(link: *const $crate::Link) -> *const Self {
                $crate::container_of!(link, $container, $field)
            }
        }
    };
    ($container:path { $field:ident, }) => {
        $crate::linked_rbkey!($container { $field });
    };
}

mod adapter;
pub mod chain;
mod error;
mod key;
mod link;
pub mod linked_rbtree;
pub mod rbtree;
pub mod search;

pub use crate::adapter::{Adapter, LinkedAdapter, NodeAdapter};
pub use crate::chain::{Chain, Threaded, Unthreaded};
pub use crate::error::{Error, Result};
pub use crate::key::{LinkedRBKey, RBKey};
pub use crate::link::{Color, Link};
pub use crate::linked_rbtree::LinkedRBTree;
pub use crate::rbtree::RBTree;
pub use crate::search::{FnSearch, RBSearch, SearchStep};
