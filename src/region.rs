//! Try regions.
//!
//! ```no_run
//! use uwucatch::{throw, ALL_EXCEPTIONS};
//!
//! let outcome = uwucatch::r#try(|| {
//!     throw!(1, "disk {} is full", "sda");
//! })
//! .catch(2, |_| "two")
//! .catch(1, |exception| {
//!     assert_eq!(exception.message(), Some("disk sda is full"));
//!     "one"
//! })
//! .catch(ALL_EXCEPTIONS, |_| "anything else")
//! .end();
//!
//! assert_eq!(outcome, "one");
//! ```
//!
//! Catch clauses are tried in order and the first one matching the active
//! exception runs; the rest are skipped. Handlers run after the region's
//! resumption point is gone, so throwing from a handler goes to the next
//! enclosing region. If no clause matched, [`Region::end`] rethrows, and so
//! does dropping a region that was never ended.

#[cfg(test)]
mod tests;

use core::mem;

use crate::control_flow::NodeKind;
use crate::propagate::{self, Site, ALL_EXCEPTIONS};
use crate::state::{self, Exception};

enum Outcome<R> {
    Completed(R),
    Raised,
    Handled(R),
    /// Consumed by `catch` or `end`.
    Taken,
}

/// A try region whose body has finished running, waiting for its catch
/// clauses and [`end`](Region::end).
#[must_use = "a region must be ended with `end`"]
pub struct Region<R> {
    outcome: Outcome<R>,
}

/// Runs `body` as a try region.
pub fn r#try<R>(body: impl FnOnce() -> R) -> Region<R> {
    let outcome = match propagate::guarded(NodeKind::Region, body) {
        Ok(value) => Outcome::Completed(value),
        Err(site) => {
            trace!(%site, "exception raised in try region");
            Outcome::Raised
        }
    };
    Region { outcome }
}

impl<R> Region<R> {
    /// Handles the raised exception with `handler` if `code` matches it and
    /// no earlier clause did.
    pub fn catch(mut self, code: i32, handler: impl FnOnce(&Exception) -> R) -> Self {
        match self.take() {
            Outcome::Raised if propagate::catch_matches(code) => {
                let exception = state::current();
                trace!(code = exception.code(), clause = code, "caught");
                Region {
                    outcome: Outcome::Handled(handler(&exception)),
                }
            }
            outcome => Region { outcome },
        }
    }

    /// Shorthand for a clause with [`ALL_EXCEPTIONS`].
    pub fn catch_all(self, handler: impl FnOnce(&Exception) -> R) -> Self {
        self.catch(ALL_EXCEPTIONS, handler)
    }

    /// Whether the body threw and no clause has handled it yet.
    pub fn is_unhandled(&self) -> bool {
        matches!(self.outcome, Outcome::Raised)
    }

    /// Leaves the region.
    ///
    /// Completed and handled regions clear the exception state and return
    /// their value. Otherwise the exception is rethrown from here.
    #[track_caller]
    pub fn end(mut self) -> R {
        match self.take() {
            Outcome::Completed(value) | Outcome::Handled(value) => {
                state::clear();
                value
            }
            Outcome::Raised => propagate::rethrow(),
            Outcome::Taken => unreachable!("region outcome taken twice"),
        }
    }

    fn take(&mut self) -> Outcome<R> {
        mem::replace(&mut self.outcome, Outcome::Taken)
    }
}

impl<R> Drop for Region<R> {
    fn drop(&mut self) {
        // Rethrowing while already unwinding would abort, so a region dropped
        // by an unwind leaves the exception in place instead.
        if matches!(self.outcome, Outcome::Raised) && !std::thread::panicking() {
            trace!("unhandled try region dropped without `end`");
            propagate::rethrow_at(Site::caller());
        }
    }
}
