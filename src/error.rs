// Copyright 2016 Amanieu d'Antras
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

/// Result type for tree operations which can be refused.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors raised by tree operations.
///
/// Looking up or removing an absent value is not an error: those operations
/// return `false` or `None`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The value already carries a link into a tree and cannot be inserted
    /// into another one until it is removed.
    #[error("value is already linked into a tree")]
    AlreadyLinked,

    /// The operation is not supported by this collection.
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
}
