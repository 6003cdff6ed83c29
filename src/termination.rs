//! What happens to exceptions nobody catches.
//!
//! An uncaught exception on the main thread ends the process, with the
//! exception code as exit status. On any other thread it only ends that
//! thread, and whoever joins it gets the code.
//!
//! [`on_uncaught`] only decides (and reports). The decision is carried out
//! by a driver: either [`run`] or [`thread::spawn`](crate::thread::spawn),
//! which install a boundary that receives the exception as an [`Uncaught`]
//! value, or, when there is no boundary at all, by the throw itself.


use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::panic;

use crate::control_flow::{self, NodeKind};
use crate::propagate::{self, Site};
use crate::state::{self, Exception};
use crate::stdext::{self, diagnostic};

/// The identity of a native thread, as reported by `pthread_self`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadIdentity(usize);

impl ThreadIdentity {
    pub fn current() -> Self {
        ThreadIdentity(stdext::pthread_self())
    }
}

impl fmt::Display for ThreadIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// pthread_self never returns 0.
const UNDESIGNATED: usize = 0;

static MAIN_THREAD: AtomicUsize = AtomicUsize::new(UNDESIGNATED);

/// Records `thread` as the main thread for the termination policy.
///
/// Meant to be called once during startup, before other threads throw.
/// Without it, the thread the Rust runtime named `main` is the main thread.
pub fn designate_main_thread(thread: ThreadIdentity) {
    debug!(%thread, "designating main thread");
    MAIN_THREAD.store(thread.0, Ordering::Release);
}

pub fn main_thread() -> Option<ThreadIdentity> {
    match MAIN_THREAD.load(Ordering::Acquire) {
        UNDESIGNATED => None,
        id => Some(ThreadIdentity(id)),
    }
}

pub fn is_main_thread() -> bool {
    match main_thread() {
        Some(main) => main == ThreadIdentity::current(),
        None => std::thread::current().name() == Some("main"),
    }
}

/// The outcome of an uncaught exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Exit the whole process with `code`.
    Process { code: i32 },
    /// End the calling thread, handing `code` to its joiner.
    Thread { code: i32 },
}

impl Termination {
    pub fn code(self) -> i32 {
        match self {
            Termination::Process { code } | Termination::Thread { code } => code,
        }
    }

    /// Carries out the termination on the calling thread.
    ///
    /// A terminating thread unwinds with an [`Uncaught`] payload, which a
    /// plain `std::thread` joiner can downcast.
    pub fn enforce(self, exception: Exception) -> ! {
        match self {
            Termination::Process { code } => std::process::exit(code),
            Termination::Thread { .. } => panic::resume_unwind(Box::new(Uncaught {
                exception,
                termination: self,
            })),
        }
    }
}

/// Decides what an uncaught exception with `code` terminates on the calling
/// thread, without reporting anything.
pub fn decide(code: i32) -> Termination {
    if is_main_thread() {
        Termination::Process { code }
    } else {
        Termination::Thread { code }
    }
}

/// Decides what an uncaught `exception` thrown at `site` terminates, and
/// reports it on stderr.
#[instrument(level = "debug", skip(exception), fields(code = exception.code()))]
pub fn on_uncaught(exception: &Exception, site: &Site) -> Termination {
    let code = exception.code();
    let message = exception.message().unwrap_or("(no message)");

    let termination = decide(code);
    if let Termination::Process { .. } = termination {
        error!(code, msg = message, %site, "uncaught exception on the main thread");
        if cfg!(debug_assertions) {
            diagnostic!("{site}: {message} (code {code})");
        } else {
            diagnostic!("{message} (code {code})");
        }
    } else {
        let thread = ThreadIdentity::current();
        error!(code, msg = message, %site, %thread, "uncaught exception on a worker thread");
        if cfg!(debug_assertions) {
            diagnostic!("thread {thread}: {site}: {message} (code {code})");
        } else {
            diagnostic!("thread {thread}: {message} (code {code})");
        }
    }
    termination
}

/// An exception that reached a boundary without being caught.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uncaught {
    exception: Exception,
    termination: Termination,
}

impl Uncaught {
    pub fn code(&self) -> i32 {
        self.exception.code()
    }

    pub fn message(&self) -> Option<&str> {
        self.exception.message()
    }

    pub fn exception(&self) -> &Exception {
        &self.exception
    }

    pub fn termination(&self) -> Termination {
        self.termination
    }

    pub fn into_exception(self) -> Exception {
        self.exception
    }

    /// Carries out the termination this exception was decided to cause.
    pub fn enforce(self) -> ! {
        self.termination.enforce(self.exception)
    }
}

impl fmt::Display for Uncaught {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uncaught exception: {}", self.exception)
    }
}

impl std::error::Error for Uncaught {}

/// Runs `f` under a boundary that turns an uncaught exception into `Err`
/// instead of terminating anything.
///
/// This is a top-level driver: it intercepts every exception `f` lets out,
/// even when an enclosing try region would have caught it. The exception is
/// reported as uncaught only when nothing encloses the boundary; nested, the
/// `Err` is left to the caller. Either way the calling thread's exception
/// state is cleared before this returns.
pub fn catch_uncaught<R>(f: impl FnOnce() -> R) -> crate::Result<R> {
    propagate::guarded(NodeKind::Boundary, f).map_err(|site| {
        let exception = state::take();
        let termination = if boundary_is_outermost() {
            on_uncaught(&exception, &site)
        } else {
            trace!(code = exception.code(), "boundary is nested, not reporting");
            decide(exception.code())
        };
        Uncaught {
            exception,
            termination,
        }
    })
}

/// Whether a boundary that just intercepted an exception has no node
/// enclosing it.
pub(crate) fn boundary_is_outermost() -> bool {
    control_flow::head().is_none()
}

/// Runs `f` as a top-level driver: an uncaught exception terminates the
/// process (on the main thread) or the calling thread.
pub fn run<R>(f: impl FnOnce() -> R) -> R {
    catch_uncaught(f).unwrap_or_else(|uncaught| uncaught.enforce())
}
