//! try/throw/catch with an integer code and a formatted message.
//!
//! Each thread has its own exception state and its own stack of resumption
//! points, one per active try region. Throwing stores the code and message
//! and unwinds to the innermost region on the same thread, which pops its
//! resumption point and runs the first matching catch clause. Nothing
//! crosses threads.
//!
//! ```no_run
//! use uwucatch::throw;
//!
//! fn open(path: &str) {
//!     throw!(2, "no such file: {path}");
//! }
//!
//! uwucatch::r#try(|| open("meow.txt"))
//!     .catch(2, |exception| {
//!         assert_eq!(exception.code(), 2);
//!         assert_eq!(exception.message(), Some("no such file: meow.txt"));
//!     })
//!     .end();
//! ```
//!
//! An exception that escapes every region ends the process when thrown on the
//! main thread, and only the throwing thread otherwise; see [`termination`].
//!
//! Resumption is implemented with unwinding, so the crate needs
//! `panic = "unwind"`.

#[macro_use]
extern crate tracing;

mod stdext;

pub mod control_flow;
pub mod propagate;
pub mod region;
pub mod state;
pub mod termination;
pub mod thread;

pub use propagate::{catch_matches, rethrow, rethrow_at, throw, throw_at, Site, ALL_EXCEPTIONS};
pub use region::{r#try, Region};
pub use state::{current as current_exception, Exception, NO_EXCEPTION};
pub use termination::{
    catch_uncaught, designate_main_thread, run, Termination, ThreadIdentity, Uncaught,
};

pub type Result<T, E = Uncaught> = core::result::Result<T, E>;

/// Throws an exception from the current location.
///
/// ```no_run
/// # use uwucatch::throw;
/// # let (errno, path) = (2, "x");
/// throw!(errno, "cannot open {path}");
/// ```
#[macro_export]
macro_rules! throw {
    ($code:expr $(,)?) => {
        $crate::throw_at($code, ::core::option::Option::None, $crate::site!())
    };
    ($code:expr, $($arg:tt)+) => {
        $crate::throw_at(
            $code,
            ::core::option::Option::Some(::core::format_args!($($arg)+)),
            $crate::site!(),
        )
    };
}

/// Rethrows the active exception from the current location.
#[macro_export]
macro_rules! rethrow {
    () => {
        $crate::rethrow_at($crate::site!())
    };
}

/// The [`Site`] of the macro invocation.
#[macro_export]
macro_rules! site {
    () => {
        $crate::Site::new(::core::file!(), ::core::line!(), ::core::module_path!())
    };
}
