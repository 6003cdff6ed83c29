//! Throwing, rethrowing and catching.
//!
//! Transferring control to a resumption point is an unwind: [`throw`] and
//! [`rethrow`] raise an [`Unwinding`] payload naming the head of the calling
//! thread's control flow stack with [`panic::resume_unwind`] (which skips the
//! panic hook), and the region that owns that resumption point intercepts it
//! in [`guarded`]. Everything between the throw site and that region is
//! unwound, so none of the guarded code after the throw runs. Payloads that
//! are not ours are passed on untouched.
//!
//! The payload carries its own copy of the exception, which the receiving
//! region reinstates: destructors in the unwound frames may run regions of
//! their own, and those clear the thread's state when they end.
//!
//! With an empty stack, the exception is uncaught and goes to the
//! [termination policy](crate::termination).


use core::any::Any;
use core::fmt;
use core::panic::Location;
use std::panic::{self, AssertUnwindSafe};

use crate::control_flow::{self, ControlFlowNode, NodeKind, ResumptionPoint};
use crate::state::{self, Exception, NO_EXCEPTION};
use crate::termination;

/// The catch-all sentinel: a catch clause with this code matches any active
/// exception.
pub const ALL_EXCEPTIONS: i32 = 0;

/// Where an exception was thrown or rethrown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Site {
    file: &'static str,
    line: u32,
    module: Option<&'static str>,
}

impl Site {
    pub const fn new(file: &'static str, line: u32, module: &'static str) -> Self {
        Self {
            file,
            line,
            module: Some(module),
        }
    }

    /// The location of the caller, as far as `#[track_caller]` reaches.
    #[track_caller]
    pub fn caller() -> Self {
        let location = Location::caller();
        Self {
            file: location.file(),
            line: location.line(),
            module: None,
        }
    }

    pub fn file(&self) -> &'static str {
        self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn module(&self) -> Option<&'static str> {
        self.module
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)?;
        if let Some(module) = self.module {
            write!(f, ": {module}")?;
        }
        Ok(())
    }
}

/// The unwind payload carrying control to a resumption point.
#[derive(Debug)]
struct Unwinding {
    target: ResumptionPoint,
    site: Site,
    exception: Exception,
}

/// Whether an unwind payload is one of our control transfers rather than a
/// panic.
pub(crate) fn is_transfer(payload: &(dyn Any + Send)) -> bool {
    payload.is::<Unwinding>()
}

/// Throws `code` with a formatted message, never returning to the caller.
///
/// Prefer the [`throw!`](crate::throw!) macro, which also records the module.
///
/// # Panics
///
/// Panics if `code` is [`NO_EXCEPTION`], which is reserved.
#[track_caller]
pub fn throw(code: i32, message: Option<fmt::Arguments<'_>>) -> ! {
    throw_at(code, message, Site::caller())
}

/// Like [`throw`], with an explicit throw site.
#[cold]
pub fn throw_at(code: i32, message: Option<fmt::Arguments<'_>>, site: Site) -> ! {
    assert_ne!(
        code, NO_EXCEPTION,
        "exception code {NO_EXCEPTION} is reserved for \"no exception\""
    );
    let _span = trace_span!("throw", code, %site).entered();

    state::set(code, message);
    transfer(site)
}

/// Raises the active exception again, unchanged, to the nearest enclosing
/// region.
///
/// # Panics
///
/// Panics if the calling thread has no active exception.
#[track_caller]
pub fn rethrow() -> ! {
    rethrow_at(Site::caller())
}

/// Like [`rethrow`], with an explicit site.
#[cold]
pub fn rethrow_at(site: Site) -> ! {
    let code = state::with_current(Exception::code);
    assert_ne!(code, NO_EXCEPTION, "rethrow without an active exception");
    let _span = trace_span!("rethrow", code, %site).entered();

    transfer(site)
}

/// Whether a catch clause for `code` handles the calling thread's active
/// exception.
pub fn catch_matches(code: i32) -> bool {
    code == ALL_EXCEPTIONS || state::with_current(|exception| exception.code() == code)
}

fn transfer(site: Site) -> ! {
    match control_flow::head() {
        Some(head) => {
            trace!(point = %head.resumption_point, kind = ?head.kind, "transferring control");
            panic::resume_unwind(Box::new(Unwinding {
                target: head.resumption_point,
                site,
                exception: state::current(),
            }))
        }
        None => {
            let exception = state::take();
            termination::on_uncaught(&exception, &site).enforce(exception)
        }
    }
}

/// Runs `body` with a fresh node of `kind` linked as the head of the
/// control flow stack.
///
/// Returns the site of the throw if an exception was transferred to that
/// node, with the exception reinstated as the thread's state. The node is
/// already popped when this returns, on every path.
pub(crate) fn guarded<R>(kind: NodeKind, body: impl FnOnce() -> R) -> Result<R, Site> {
    let node = ControlFlowNode::new(kind);
    let point = node.resumption_point();

    let outcome = {
        let _guard = control_flow::push(&node);
        panic::catch_unwind(AssertUnwindSafe(body))
    };

    match outcome {
        Ok(value) => Ok(value),
        Err(payload) => match payload.downcast::<Unwinding>() {
            Ok(unwinding) if unwinding.target == point => {
                trace!(%point, "resumed");
                let Unwinding { site, exception, .. } = *unwinding;
                state::restore(exception);
                Err(site)
            }
            Ok(unwinding) => panic::resume_unwind(unwinding),
            Err(payload) => panic::resume_unwind(payload),
        },
    }
}
