// Copyright 2016 Amanieu d'Antras
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! Caller-guided descent through a tree.

/// Decision returned by a `RBSearch` descriptor at each visited node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SearchStep {
    /// Finish with the value at the current node.
    Current,
    /// Finish with the value of the current node's left child.
    Left,
    /// Finish with the value of the current node's right child.
    Right,
    /// Continue the search at the left child.
    GoLeft,
    /// Continue the search at the right child.
    GoRight,
    /// Stop without a result.
    Abort,
}

/// A search descriptor consulted at every node visited by `RBTree::search`.
///
/// The descriptor sees the value at the current node and the values of its
/// children, and decides where the search goes next. Since it is called by
/// mutable reference it can keep state across steps, for example the best
/// candidate seen so far in a closest-match query.
///
/// Choosing `Left`/`Right` or `GoLeft`/`GoRight` towards a missing child ends
/// the search without a result.
pub trait RBSearch<T: ?Sized> {
    /// Decides the next step of the search at one node.
    fn step(&mut self, current: &T, left: Option<&T>, right: Option<&T>) -> SearchStep;
}

/// Wraps a closure as a `RBSearch` descriptor.
///
/// `RBTree::search_by` builds one of these; it is public so that closures can
/// also be stored and passed where a descriptor type is expected.
pub struct FnSearch<F>(pub F);

impl<T: ?Sized, F> RBSearch<T> for FnSearch<F>
where
    F: FnMut(&T, Option<&T>, Option<&T>) -> SearchStep,
{
    #[inline]
    fn step(&mut self, current: &T, left: Option<&T>, right: Option<&T>) -> SearchStep {
        (self.0)(current, left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::{FnSearch, RBSearch, SearchStep};

    #[test]
    fn test_fn_search() {
        let mut calls = 0;
        let mut s = FnSearch(|cur: &i32, left: Option<&i32>, _right: Option<&i32>| {
            calls += 1;
            match left {
                Some(l) if *l < *cur => SearchStep::GoLeft,
                _ => SearchStep::Current,
            }
        });
        assert_eq!(s.step(&5, Some(&3), None), SearchStep::GoLeft);
        assert_eq!(s.step(&5, None, Some(&7)), SearchStep::Current);
        drop(s);
        assert_eq!(calls, 2);
    }
}
